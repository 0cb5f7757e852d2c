use crate::error::AppError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const STATUS_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const TOAST_TTL: Duration = Duration::from_millis(2500);
pub const HOOK_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const AGENT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const EXECUTE_WAIT: Duration = Duration::from_secs(15);
pub const STATUS_WAIT: Duration = Duration::from_secs(10);
pub const DEFAULT_SERVER_PORT: u16 = 8000;
pub const INIT_DATA_HEADER: &str = "X-Init-Data";

/// Resolve the app data directory: ~/.pcremote/
pub fn app_dir() -> Result<PathBuf, AppError> {
    let home = dirs::home_dir().ok_or(AppError::HomeDirNotFound)?;
    Ok(home.join(".pcremote"))
}

/// ~/.pcremote/config.json
pub fn settings_path() -> Result<PathBuf, AppError> {
    Ok(app_dir()?.join("config.json"))
}

/// Connection settings for one session.
///
/// Built once at startup and never mutated; reconfiguring means building a new
/// value and a new client from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    init_data: String,
}

impl ClientConfig {
    pub fn new(base_url: &str, init_data: impl Into<String>) -> Result<Self, AppError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            init_data: init_data.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Opaque session token, forwarded verbatim in the `X-Init-Data` header.
    pub fn init_data(&self) -> &str {
        &self.init_data
    }
}

/// Parse and normalise a server base URL. Only absolute http(s) URLs are accepted;
/// the path always ends with `/` so endpoint paths can be appended.
pub fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let trimmed = raw.trim();
    let invalid = |reason: &str| AppError::InvalidUrl {
        url: trimmed.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// The single persisted setting.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Settings {
    /// Load from ~/.pcremote/config.json; a missing file yields defaults.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(&settings_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    pub fn save(&self) -> Result<PathBuf, AppError> {
        let path = settings_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Validate and store a base URL in normalised form.
    pub fn set_base_url(&mut self, raw: &str) -> Result<(), AppError> {
        let url = parse_base_url(raw)?;
        self.base_url = Some(url.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let url = parse_base_url("https://pc.example.com/app").unwrap();
        assert_eq!(url.as_str(), "https://pc.example.com/app/");
        assert_eq!(
            url.join("claude/pending").unwrap().as_str(),
            "https://pc.example.com/app/claude/pending"
        );
    }

    #[test]
    fn base_url_rejects_other_schemes() {
        let err = parse_base_url("ftp://pc.example.com").unwrap_err();
        assert!(matches!(err, AppError::InvalidUrl { .. }));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn client_config_keeps_token_verbatim() {
        let cfg = ClientConfig::new(" http://localhost:8000 ", "query_id=1&hash=abc").unwrap();
        assert_eq!(cfg.base_url().as_str(), "http://localhost:8000/");
        assert_eq!(cfg.init_data(), "query_id=1&hash=abc");
    }

    #[test]
    fn settings_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert_eq!(Settings::load_from(&path).unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.set_base_url("http://10.0.0.5:8000").unwrap();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.base_url.as_deref(), Some("http://10.0.0.5:8000/"));
    }

    #[test]
    fn invalid_url_is_not_stored() {
        let mut settings = Settings::default();
        assert!(settings.set_base_url("localhost").is_err());
        assert_eq!(settings.base_url, None);
    }
}
