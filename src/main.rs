use clap::error::ErrorKind;
use clap::Parser;

use ptyscript::cli::Args;
use ptyscript::config::{ConfigFile, SessionConfig};
use ptyscript::error::{EXIT_OK, EXIT_USAGE};
use ptyscript::session;

/// Load the config file named by `--config`, or the default one.
///
/// An explicit file must load; a broken default file only warns.
fn load_config_file(args: &Args) -> ConfigFile {
    match ConfigFile::load(args.config.as_deref()) {
        Ok(file) => file,
        Err(e) if args.config.is_some() => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_USAGE);
        }
        Err(e) => {
            eprintln!("Warning: {}", e);
            eprintln!("Using default settings.");
            ConfigFile::default()
        }
    }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(EXIT_USAGE);
        }
    };

    let file = load_config_file(&args);
    let shell_env = std::env::var("SHELL").ok();
    let config = match SessionConfig::resolve(&args, &file, shell_env.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(EXIT_USAGE);
        }
    };

    match session::run(&config) {
        Ok(stats) => {
            log::debug!("session ended: {:?}", stats);
            std::process::exit(EXIT_OK);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}
