//! CLI argument parsing with clap.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Run an interactive shell inside a pseudo-terminal, optionally keeping a transcript
#[derive(Parser, Debug)]
#[command(name = "ptyscript")]
#[command(version, about = "Run a shell in a pseudo-terminal and record its output", long_about = None)]
#[command(disable_help_flag = true)]
pub struct Args {
    /// Shell to spawn (default: $SHELL or /bin/bash)
    #[arg(short, long)]
    pub shell: Option<PathBuf>,

    /// Initial number of terminal rows
    #[arg(short = 'h', long)]
    pub rows: Option<u16>,

    /// Initial number of terminal columns
    #[arg(short = 'w', long)]
    pub cols: Option<u16>,

    /// Write a transcript of everything the shell prints to FILE
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// TERM value exported to the shell (default: inherited)
    #[arg(short, long)]
    pub term: Option<String>,

    /// Working directory for the shell
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dump relayed bytes as hex to stderr
    #[arg(long)]
    pub debug: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["ptyscript"]);
        assert!(args.shell.is_none());
        assert!(args.rows.is_none());
        assert!(args.cols.is_none());
        assert!(args.output.is_none());
        assert!(args.term.is_none());
        assert!(args.dir.is_none());
        assert!(args.config.is_none());
        assert!(!args.debug);
    }

    #[test]
    fn test_args_geometry_short_flags() {
        let args = Args::parse_from(["ptyscript", "-h", "30", "-w", "100"]);
        assert_eq!(args.rows, Some(30));
        assert_eq!(args.cols, Some(100));
    }

    #[test]
    fn test_args_geometry_long_flags() {
        let args = Args::parse_from(["ptyscript", "--rows", "50", "--cols", "132"]);
        assert_eq!(args.rows, Some(50));
        assert_eq!(args.cols, Some(132));
    }

    #[test]
    fn test_args_zero_geometry_accepted() {
        let args = Args::parse_from(["ptyscript", "-h", "0", "-w", "0"]);
        assert_eq!(args.rows, Some(0));
        assert_eq!(args.cols, Some(0));
    }

    #[test]
    fn test_args_invalid_rows_rejected() {
        assert!(Args::try_parse_from(["ptyscript", "-h", "tall"]).is_err());
        assert!(Args::try_parse_from(["ptyscript", "-w", "-3"]).is_err());
        assert!(Args::try_parse_from(["ptyscript", "--rows", "70000"]).is_err());
    }

    #[test]
    fn test_args_shell_option() {
        let args = Args::parse_from(["ptyscript", "--shell", "/bin/sh"]);
        assert_eq!(args.shell, Some(PathBuf::from("/bin/sh")));

        let args = Args::parse_from(["ptyscript", "-s", "/bin/zsh"]);
        assert_eq!(args.shell, Some(PathBuf::from("/bin/zsh")));
    }

    #[test]
    fn test_args_transcript_option() {
        let args = Args::parse_from(["ptyscript", "-o", "typescript"]);
        assert_eq!(args.output, Some(PathBuf::from("typescript")));
    }

    #[test]
    fn test_args_term_and_dir() {
        let args = Args::parse_from(["ptyscript", "-t", "vt100", "-d", "/tmp"]);
        assert_eq!(args.term.as_deref(), Some("vt100"));
        assert_eq!(args.dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_args_unknown_flag_rejected() {
        assert!(Args::try_parse_from(["ptyscript", "--bogus"]).is_err());
    }

    #[test]
    fn test_args_long_help() {
        let err = Args::try_parse_from(["ptyscript", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
