//! Application configuration.
//!
//! # File format
//!
//! ```json
//! {
//!   "telegramToken": "123456:ABC...",
//!   "trelloApiKey": "...",
//!   "trelloToken": "...",
//!   "adminUsers": [11111111],
//!   "pollInterval": 10000,
//!   "saveInterval": 60,
//!   "actionLimit": 50,
//!   "channels": []
//! }
//! ```
//!
//! `channels` is owned by the channel store and ignored here.
//!
//! # Environment Variables
//!
//! - `BOARD_RELAY_CONFIG`: config file path when `--config` is not given
//! - `TELEGRAM_BOT_TOKEN`: overrides `telegramToken`
//! - `TRELLO_API_KEY`: overrides `trelloApiKey`
//! - `TRELLO_TOKEN`: overrides `trelloToken`
//! - `BOARD_RELAY_POLL_INTERVAL_MS`: overrides `pollInterval`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};

/// Environment variable for the config file path.
pub const CONFIG_PATH_ENV: &str = "BOARD_RELAY_CONFIG";

/// Environment variable for the Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable for the Trello API key.
pub const TRELLO_KEY_ENV: &str = "TRELLO_API_KEY";

/// Environment variable for the Trello member token.
pub const TRELLO_TOKEN_ENV: &str = "TRELLO_TOKEN";

/// Environment variable for the poll interval in milliseconds.
pub const POLL_INTERVAL_ENV: &str = "BOARD_RELAY_POLL_INTERVAL_MS";

const LOCAL_CONFIG_FILE: &str = "config.json";
const APP_DIR: &str = "board-relay";

const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
const DEFAULT_SAVE_INTERVAL_SECS: u64 = 60;
const DEFAULT_ACTION_LIMIT: u32 = 50;
const DEFAULT_TRELLO_API_URL: &str = "https://api.trello.com/1";

/// Runtime settings for the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub telegram_token: String,
    pub trello_api_key: String,
    pub trello_token: String,
    /// Telegram user ids allowed to change subscriptions. Empty allows all.
    pub admin_users: Vec<u64>,
    /// Milliseconds between poll cycles.
    pub poll_interval: u64,
    /// Seconds between periodic binding saves; 0 disables them.
    pub save_interval: u64,
    /// Actions requested per board fetch.
    pub action_limit: u32,
    pub trello_api_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            trello_api_key: String::new(),
            trello_token: String::new(),
            admin_users: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL_MS,
            save_interval: DEFAULT_SAVE_INTERVAL_SECS,
            action_limit: DEFAULT_ACTION_LIMIT,
            trello_api_url: DEFAULT_TRELLO_API_URL.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config file and applies environment overrides.
    ///
    /// A missing file yields defaults, so a deployment can be configured
    /// from the environment alone.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(raw) => Self::from_json(path, &raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    fn from_json(path: &Path, raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overrides settings from `lookup`, which maps variable names to values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(TELEGRAM_TOKEN_ENV) {
            self.telegram_token = token;
        }
        if let Some(key) = non_empty(TRELLO_KEY_ENV) {
            self.trello_api_key = key;
        }
        if let Some(token) = non_empty(TRELLO_TOKEN_ENV) {
            self.trello_token = token;
        }
        if let Some(raw) = non_empty(POLL_INTERVAL_ENV) {
            match raw.trim().parse() {
                Ok(ms) => self.poll_interval = ms,
                Err(_) => warn!(value = %raw, "ignoring unparseable {}", POLL_INTERVAL_ENV),
            }
        }
    }

    /// Checks that the relay can start with these settings.
    pub fn validate(&self) -> Result<()> {
        if self.telegram_token.trim().is_empty() {
            return Err(ConfigError::Missing("telegramToken"));
        }
        if self.trello_api_key.trim().is_empty() {
            return Err(ConfigError::Missing("trelloApiKey"));
        }
        if self.trello_token.trim().is_empty() {
            return Err(ConfigError::Missing("trelloToken"));
        }
        if self.poll_interval == 0 {
            return Err(ConfigError::Invalid {
                key: "pollInterval",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.action_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "actionLimit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !self.trello_api_url.starts_with("http://") && !self.trello_api_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                key: "trelloApiUrl",
                reason: format!("not an http(s) url: {}", self.trello_api_url),
            });
        }
        Ok(())
    }

    /// Time between poll cycles.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }

    /// Time between periodic saves, or `None` when disabled.
    pub fn save_interval(&self) -> Option<Duration> {
        (self.save_interval > 0).then(|| Duration::from_secs(self.save_interval))
    }

    /// Whether the user may change subscriptions.
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_users.is_empty() || self.admin_users.contains(&user_id)
    }
}

/// Picks the config file path.
///
/// In order: the explicit path, `BOARD_RELAY_CONFIG`, `./config.json` if
/// it exists, then `<config dir>/board-relay/config.json`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    resolve_with(
        explicit,
        std::env::var(CONFIG_PATH_ENV).ok(),
        Path::new(LOCAL_CONFIG_FILE),
        dirs::config_dir(),
    )
}

fn resolve_with(
    explicit: Option<&Path>,
    from_env: Option<String>,
    local: &Path,
    config_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = from_env.filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(path);
    }
    if local.exists() {
        return local.to_path_buf();
    }
    config_dir
        .map(|dir| dir.join(APP_DIR).join(LOCAL_CONFIG_FILE))
        .unwrap_or_else(|| local.to_path_buf())
}

/// Loads `.env.local`, falling back to `.env`, from the working directory.
///
/// Variables already set in the environment win.
pub fn load_env_files() {
    match dotenvy::from_filename(".env.local").or_else(|_| dotenvy::dotenv()) {
        Ok(path) => debug!(path = %path.display(), "loaded env file"),
        Err(_) => debug!("no env file found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn valid() -> AppConfig {
        AppConfig {
            telegram_token: "123:abc".into(),
            trello_api_key: "key".into(),
            trello_token: "token".into(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.save_interval(), Some(Duration::from_secs(60)));
        assert_eq!(config.action_limit, 50);
        assert_eq!(config.trello_api_url, "https://api.trello.com/1");
    }

    #[test]
    fn test_parse_camel_case_and_ignore_channels() {
        let raw = r#"{
            "telegramToken": "t",
            "trelloApiKey": "k",
            "trelloToken": "tt",
            "adminUsers": [42],
            "pollInterval": 2500,
            "saveInterval": 0,
            "channels": [{"channelId": "1", "boardId": "b"}]
        }"#;
        let config = AppConfig::from_json(Path::new("config.json"), raw).unwrap();

        assert_eq!(config.telegram_token, "t");
        assert_eq!(config.admin_users, vec![42]);
        assert_eq!(config.poll_interval(), Duration::from_millis(2500));
        assert_eq!(config.save_interval(), None);
        assert_eq!(config.action_limit, 50);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ nope").unwrap();

        assert!(matches!(AppConfig::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[
            (TELEGRAM_TOKEN_ENV, "from-env"),
            (TRELLO_KEY_ENV, ""),
            (POLL_INTERVAL_ENV, "750"),
        ]));

        assert_eq!(config.telegram_token, "from-env");
        assert_eq!(config.trello_api_key, "");
        assert_eq!(config.poll_interval, 750);
    }

    #[test]
    fn test_env_override_bad_interval_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[(POLL_INTERVAL_ENV, "soon")]));
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_validate() {
        assert!(valid().validate().is_ok());

        let mut config = valid();
        config.trello_token.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("trelloToken"))));

        let mut config = valid();
        config.poll_interval = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "pollInterval", .. })
        ));

        let mut config = valid();
        config.trello_api_url = "ftp://example".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_admin() {
        let mut config = valid();
        assert!(config.is_admin(7));

        config.admin_users = vec![1, 2];
        assert!(config.is_admin(2));
        assert!(!config.is_admin(7));
    }

    #[test]
    fn test_resolve_order() {
        let dir = tempdir().unwrap();
        let local = dir.path().join("config.json");
        let cfg_dir = Some(dir.path().join("xdg"));

        let explicit = PathBuf::from("/etc/relay.json");
        assert_eq!(
            resolve_with(Some(&explicit), Some("/env.json".into()), &local, cfg_dir.clone()),
            explicit
        );
        assert_eq!(
            resolve_with(None, Some("/env.json".into()), &local, cfg_dir.clone()),
            PathBuf::from("/env.json")
        );
        assert_eq!(
            resolve_with(None, None, &local, cfg_dir.clone()),
            dir.path().join("xdg/board-relay/config.json")
        );

        fs::write(&local, "{}").unwrap();
        assert_eq!(resolve_with(None, None, &local, cfg_dir), local);
    }
}
