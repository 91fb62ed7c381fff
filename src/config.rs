//! Client configuration: built-in defaults, an optional JSON file, then CLI flags.

use crate::model::ClientConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// On-disk settings. Every field is optional; absent fields fall through to defaults.
///
/// ```json
/// { "base_url": "http://media-box:5000", "request_timeout": "5m", "download_dir": "/tmp/out" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_url: Option<String>,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    #[serde(with = "humantime_serde")]
    pub upload_timeout: Option<Duration>,
    pub download_dir: Option<PathBuf>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub request_timeout: Option<Duration>,
    pub download_dir: Option<PathBuf>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("imageauto").join("config.json"))
}

/// Read the config file.
///
/// An explicitly named file must exist. The default location is optional.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(FileConfig::default()),
        },
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let cfg: FileConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(cfg)
}

/// Merge flags over file values over defaults.
pub fn resolve(file: FileConfig, flags: Overrides) -> ClientConfig {
    ClientConfig {
        base_url: flags
            .base_url
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        request_timeout: flags
            .request_timeout
            .or(file.request_timeout)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        upload_timeout: file.upload_timeout.unwrap_or(DEFAULT_UPLOAD_TIMEOUT),
        user_agent: format!("imageauto-cli/{}", env!("CARGO_PKG_VERSION")),
        download_dir: flags.download_dir.or(file.download_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let cfg = resolve(FileConfig::default(), Overrides::default());
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.request_timeout, Duration::from_secs(300));
        assert_eq!(cfg.upload_timeout, Duration::from_secs(600));
        assert!(cfg.user_agent.starts_with("imageauto-cli/"));
        assert_eq!(cfg.download_dir, None);
    }

    #[test]
    fn flags_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"base_url":"http://file:5000","request_timeout":"2m","upload_timeout":"15m"}}"#
        )
        .unwrap();

        let loaded = load(Some(file.path())).unwrap();
        assert_eq!(loaded.request_timeout, Some(Duration::from_secs(120)));

        let cfg = resolve(
            loaded,
            Overrides {
                base_url: Some("http://flag:9000".into()),
                ..Default::default()
            },
        );
        assert_eq!(cfg.base_url, "http://flag:9000");
        assert_eq!(cfg.request_timeout, Duration::from_secs(120));
        assert_eq!(cfg.upload_timeout, Duration::from_secs(900));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"base_urll":"typo"}}"#).unwrap();
        assert!(load(Some(file.path())).is_err());
    }
}
