//! Command-line arguments and the optional config file.
//!
//! Precedence, highest first: CLI flags (and their env vars), then
//! `$XDG_CONFIG_HOME/ai-prism/config.toml`, then built-in defaults.
//! A missing or unparsable config file is never fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use prism_core::types::GuidelinesPreference;
use serde::Deserialize;

/// Backend used when neither the CLI nor the config file names one.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Request timeout used when the config file does not set `timeout_secs`.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Command-line arguments for `prism`.
#[derive(Parser, Debug)]
#[command(name = "prism")]
#[command(about = "Terminal client for AI-Prism document review")]
#[command(version)]
pub struct Cli {
    /// Word document (.docx) to upload and review
    pub document: Option<PathBuf>,

    /// Guidelines document uploaded alongside the review document
    #[arg(short, long)]
    pub guidelines: Option<PathBuf>,

    /// Which guidelines the analysis applies: both, new_only, old_only
    #[arg(short, long, default_value = "both", value_parser = parse_preference)]
    pub preference: GuidelinesPreference,

    /// Base URL of the analysis backend
    #[arg(short, long, env = "PRISM_SERVER")]
    pub server: Option<String>,

    /// Reopen the last session instead of uploading
    #[arg(long, conflicts_with = "document")]
    pub resume: bool,
}

fn parse_preference(raw: &str) -> Result<GuidelinesPreference, String> {
    match raw {
        "both" => Ok(GuidelinesPreference::Both),
        "new_only" | "new" => Ok(GuidelinesPreference::NewOnly),
        "old_only" | "old" => Ok(GuidelinesPreference::OldOnly),
        other => Err(format!(
            "unknown preference '{other}' (expected both, new_only or old_only)"
        )),
    }
}

/// Keys accepted in `config.toml`. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub theme: Option<String>,
    pub download_dir: Option<PathBuf>,
}

/// Effective settings after merging the CLI over the config file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub timeout: Duration,
    /// Explicit theme name; when `None` the persisted dark-mode flag decides.
    pub theme: Option<String>,
    pub download_dir: PathBuf,
    pub document: Option<PathBuf>,
    pub guidelines: Option<PathBuf>,
    pub preference: GuidelinesPreference,
    pub resume: bool,
}

impl Settings {
    pub fn merge(cli: Cli, file: FileConfig) -> Self {
        Self {
            server_url: cli
                .server
                .or(file.server_url)
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_owned()),
            timeout: Duration::from_secs(file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            theme: file.theme,
            download_dir: file.download_dir.unwrap_or_else(|| PathBuf::from(".")),
            document: cli.document,
            guidelines: cli.guidelines,
            preference: cli.preference,
            resume: cli.resume,
        }
    }
}

/// Returns the path to the prism config file.
///
/// Prefers `$XDG_CONFIG_HOME/ai-prism/config.toml`; falls back to
/// `~/.config/ai-prism/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("ai-prism").join("config.toml")
}

/// Directory for the preference database and log files.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".prism"))
        .join("ai-prism")
}

/// Loads the config file at `path`.
///
/// Returns defaults if the file does not exist or cannot be parsed. Parse
/// errors are logged, never raised.
pub fn load_file_config(path: &Path) -> FileConfig {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return FileConfig::default(),
    };
    parse_file_config(&raw).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "config parse error, using defaults");
        FileConfig::default()
    })
}

fn parse_file_config(raw: &str) -> Result<FileConfig, toml::de::Error> {
    toml::from_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("prism").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn cli_flags_override_the_file() {
        let file = parse_file_config(
            r#"
            server_url = "http://review.internal:8000"
            timeout_secs = 30
            theme = "light"
            "#,
        )
        .unwrap();
        let settings = Settings::merge(
            cli(&["report.docx", "--server", "http://localhost:9000", "-p", "new_only"]),
            file,
        );
        assert_eq!(settings.server_url, "http://localhost:9000");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.theme.as_deref(), Some("light"));
        assert_eq!(settings.preference, GuidelinesPreference::NewOnly);
        assert_eq!(settings.document, Some(PathBuf::from("report.docx")));
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let settings = Settings::merge(cli(&[]), FileConfig::default());
        assert_eq!(settings.server_url, DEFAULT_SERVER_URL);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(settings.preference, GuidelinesPreference::Both);
        assert_eq!(settings.download_dir, PathBuf::from("."));
        assert!(settings.theme.is_none());
    }

    #[test]
    fn malformed_file_is_an_error_not_a_panic() {
        assert!(parse_file_config("server_url = [").is_err());
        assert!(parse_file_config("unknown_key = 1").is_ok());
    }

    #[test]
    fn unknown_preference_is_rejected() {
        assert!(Cli::try_parse_from(["prism", "-p", "newest"]).is_err());
        assert!(Cli::try_parse_from(["prism", "--resume", "a.docx"]).is_err());
    }
}
