//! Configuration handling for ptyscript.
//!
//! Settings come from three places, highest priority first: command-line
//! flags, the `[session]` table of `~/.config/ptyscript/config.toml` (or a
//! custom path), and the environment. The result is a [`SessionConfig`] that is
//! built once and never mutated afterwards.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::pty::PtySize;

/// Shell used when neither flags, config nor `$SHELL` name one.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub session: SessionSection,
}

#[derive(Debug, Deserialize, Default)]
pub struct SessionSection {
    pub shell: Option<PathBuf>,
    pub rows: Option<u16>,
    pub cols: Option<u16>,
    pub transcript: Option<PathBuf>,
    pub term: Option<String>,
    pub dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Load configuration from a file path.
    ///
    /// With no explicit path the default location is tried and a missing file
    /// yields the default config. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_path(), false),
        };

        if !required && !path.exists() {
            return Ok(ConfigFile::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse { path, source: e })
    }
}

/// Errors that can occur while resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("shell path is empty")]
    EmptyShell,

    #[error("invalid arguments: {0}")]
    Args(String),
}

/// Resolved, immutable settings for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub shell: PathBuf,
    pub size: PtySize,
    pub transcript: Option<PathBuf>,
    /// Exported as `TERM` to the shell when set.
    pub term: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub debug: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            size: PtySize::default(),
            transcript: None,
            term: None,
            working_dir: None,
            debug: false,
        }
    }
}

impl SessionConfig {
    /// Merge CLI flags, config file and environment into one value.
    pub fn resolve(
        args: &Args,
        file: &ConfigFile,
        env_shell: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let section = &file.session;
        let defaults = PtySize::default();

        let shell = select_shell(
            args.shell.as_deref().or(section.shell.as_deref()),
            env_shell,
        );
        if shell.as_os_str().is_empty() {
            return Err(ConfigError::EmptyShell);
        }

        let size = PtySize {
            rows: args.rows.or(section.rows).unwrap_or(defaults.rows),
            cols: args.cols.or(section.cols).unwrap_or(defaults.cols),
        };
        // Passed through as requested; the kernel accepts a 0x0 window.
        if let Some(warning) = geometry_warning(size) {
            eprintln!("Warning: {}", warning);
        }

        Ok(Self {
            shell,
            size,
            transcript: args.output.clone().or_else(|| section.transcript.clone()),
            term: args.term.clone().or_else(|| section.term.clone()),
            working_dir: args.dir.clone().or_else(|| section.dir.clone()),
            debug: args.debug,
        })
    }
}

/// Warning text for a window with zero rows or columns, if any.
pub fn geometry_warning(size: PtySize) -> Option<String> {
    if size.rows == 0 || size.cols == 0 {
        Some(format!(
            "zero terminal geometry requested: {}x{}",
            size.rows, size.cols
        ))
    } else {
        None
    }
}

/// Select shell based on priority:
/// 1. Explicit choice (CLI flag or config file)
/// 2. $SHELL environment variable
/// 3. /bin/bash
pub fn select_shell(explicit: Option<&Path>, env_shell: Option<&str>) -> PathBuf {
    if let Some(shell) = explicit {
        return shell.to_path_buf();
    }

    match env_shell {
        Some(shell) if !shell.is_empty() => PathBuf::from(shell),
        _ => PathBuf::from(DEFAULT_SHELL),
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("ptyscript").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/ptyscript/config.toml")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["ptyscript"];
        full.extend_from_slice(argv);
        Args::parse_from(full)
    }

    #[test]
    fn test_select_shell_explicit_wins() {
        let shell = select_shell(Some(Path::new("/bin/fish")), Some("/bin/zsh"));
        assert_eq!(shell, PathBuf::from("/bin/fish"));
    }

    #[test]
    fn test_select_shell_env_fallback() {
        let shell = select_shell(None, Some("/bin/zsh"));
        assert_eq!(shell, PathBuf::from("/bin/zsh"));
    }

    #[test]
    fn test_select_shell_default() {
        assert_eq!(select_shell(None, None), PathBuf::from(DEFAULT_SHELL));
        assert_eq!(select_shell(None, Some("")), PathBuf::from(DEFAULT_SHELL));
    }

    #[test]
    fn test_resolve_defaults() {
        let config = SessionConfig::resolve(&args(&[]), &ConfigFile::default(), None).unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.size.rows, 25);
        assert_eq!(config.size.cols, 80);
    }

    #[test]
    fn test_resolve_cli_overrides_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            [session]
            shell = "/bin/zsh"
            rows = 40
            cols = 120
            transcript = "/tmp/from-file"
            "#,
        )
        .unwrap();
        let config = SessionConfig::resolve(
            &args(&["-s", "/bin/sh", "-h", "30", "-o", "/tmp/from-cli"]),
            &file,
            Some("/bin/ksh"),
        )
        .unwrap();

        assert_eq!(config.shell, PathBuf::from("/bin/sh"));
        assert_eq!(config.size.rows, 30);
        assert_eq!(config.size.cols, 120);
        assert_eq!(config.transcript, Some(PathBuf::from("/tmp/from-cli")));
    }

    #[test]
    fn test_resolve_file_overrides_env() {
        let file: ConfigFile = toml::from_str("[session]\nshell = \"/bin/dash\"\n").unwrap();
        let config = SessionConfig::resolve(&args(&[]), &file, Some("/bin/ksh")).unwrap();
        assert_eq!(config.shell, PathBuf::from("/bin/dash"));
    }

    #[test]
    fn test_resolve_zero_geometry_passes_through() {
        let config =
            SessionConfig::resolve(&args(&["-h", "0", "-w", "0"]), &ConfigFile::default(), None)
                .unwrap();
        assert_eq!(config.size, PtySize { rows: 0, cols: 0 });
    }

    #[test]
    fn test_geometry_warning_only_for_zero_dimension() {
        assert_eq!(
            geometry_warning(PtySize { rows: 0, cols: 0 }).as_deref(),
            Some("zero terminal geometry requested: 0x0")
        );
        assert!(geometry_warning(PtySize { rows: 24, cols: 0 }).is_some());
        assert!(geometry_warning(PtySize { rows: 0, cols: 80 }).is_some());
        assert!(geometry_warning(PtySize::default()).is_none());
    }

    #[test]
    fn test_resolve_empty_shell_rejected() {
        let file: ConfigFile = toml::from_str("[session]\nshell = \"\"\n").unwrap();
        let result = SessionConfig::resolve(&args(&[]), &file, Some("/bin/zsh"));
        assert!(matches!(result, Err(ConfigError::EmptyShell)));
    }

    #[test]
    fn test_load_missing_explicit_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigFile::load(Some(dir.path().join("nope.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_load_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nrows = \"many\"").unwrap();
        let result = ConfigFile::load(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\nterm = \"vt100\"\ndir = \"/tmp\"").unwrap();
        let loaded = ConfigFile::load(Some(file.path())).unwrap();
        assert_eq!(loaded.session.term.as_deref(), Some("vt100"));
        assert_eq!(loaded.session.dir, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = default_path();
        assert!(path.ends_with("ptyscript/config.toml"));
    }
}
