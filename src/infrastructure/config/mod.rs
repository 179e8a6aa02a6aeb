//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::errors::ConfigError;
use crate::infrastructure::modules::loader::{DEFAULT_EXCLUDE_PATTERN, DEFAULT_EXTENSIONS};
use crate::infrastructure::modules::LoadOptions;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    #[serde(default)]
    pub modules: ModulesConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    #[serde(default)]
    pub adapter: AdapterKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    #[default]
    Discord,
    Console,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ModulesConfig {
    pub commands_dir: PathBuf,
    pub events_dir: PathBuf,
    pub recursive: bool,
    pub extensions: Vec<String>,
    pub exclude_pattern: String,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            commands_dir: PathBuf::from("./modules/commands"),
            events_dir: PathBuf::from("./modules/events"),
            recursive: true,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            exclude_pattern: DEFAULT_EXCLUDE_PATTERN.to_string(),
        }
    }
}

impl ModulesConfig {
    pub fn load_options(&self) -> Result<LoadOptions, ConfigError> {
        LoadOptions::default()
            .recursive(self.recursive)
            .with_extensions(&self.extensions)
            .with_exclude_pattern(&self.exclude_pattern)
    }
}

/// Files consulted when a credential is not in the environment
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SecretsConfig {
    pub token_file: PathBuf,
    pub client_id_file: PathBuf,
    pub guild_id_file: PathBuf,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            token_file: PathBuf::from("/run/secrets/discord_token"),
            client_id_file: PathBuf::from("/run/secrets/discord_client_id"),
            guild_id_file: PathBuf::from("/run/secrets/discord_guild_id"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "dispatch-bot".to_string(),
                adapter: AdapterKind::Discord,
            },
            modules: ModulesConfig::default(),
            secrets: SecretsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment variables override file values
    fn apply_env(&mut self) {
        if let Ok(adapter) = std::env::var("BOT_ADAPTER") {
            match adapter.as_str() {
                "console" => self.bot.adapter = AdapterKind::Console,
                "discord" => self.bot.adapter = AdapterKind::Discord,
                other => tracing::warn!("Ignoring unknown BOT_ADAPTER: {}", other),
            }
        }

        if let Ok(level) = std::env::var("BOT_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(dir) = std::env::var("COMMANDS_DIR") {
            self.modules.commands_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("EVENTS_DIR") {
            self.modules.events_dir = PathBuf::from(dir);
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Platform credentials
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub token: Option<String>,
    pub client_id: Option<String>,
    pub guild_id: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("client_id", &self.client_id)
            .field("guild_id", &self.guild_id)
            .finish()
    }
}

impl Credentials {
    /// Read `TOKEN`, `CLIENT_ID` and `GUILD_ID`, falling back to the secret files
    pub fn resolve(secrets: &SecretsConfig) -> Self {
        Self {
            token: resolve_value("TOKEN", &secrets.token_file),
            client_id: resolve_value("CLIENT_ID", &secrets.client_id_file),
            guild_id: resolve_value("GUILD_ID", &secrets.guild_id_file),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.token = Some(token);
        }
        self
    }

    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField("TOKEN".to_string()))
    }
}

fn resolve_value(var: &str, fallback: &Path) -> Option<String> {
    let value = match std::env::var(var) {
        Ok(value) => value,
        Err(_) => std::fs::read_to_string(fallback).ok()?,
    };
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        assert!(yaml.contains("commands-dir"));
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.bot.adapter, AdapterKind::Discord);
        assert!(parsed.modules.recursive);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = serde_yaml::from_str("bot:\n  name: test\n  adapter: console\n").unwrap();
        assert_eq!(parsed.bot.adapter, AdapterKind::Console);
        assert_eq!(parsed.modules.events_dir, PathBuf::from("./modules/events"));
        assert_eq!(parsed.secrets.token_file, PathBuf::from("/run/secrets/discord_token"));
        assert!(parsed.modules.load_options().is_ok());
    }

    #[test]
    fn test_secret_file_fallback_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("guild");
        std::fs::write(&file, "  12345\n").unwrap();

        assert_eq!(resolve_value("DISPATCH_BOT_TEST_UNSET_VAR", &file), Some("12345".to_string()));
        assert_eq!(resolve_value("DISPATCH_BOT_TEST_UNSET_VAR", &dir.path().join("missing")), None);
    }

    #[test]
    fn test_blank_secret_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("token");
        std::fs::write(&file, "\n").unwrap();
        assert_eq!(resolve_value("DISPATCH_BOT_TEST_UNSET_VAR_2", &file), None);
    }

    #[test]
    fn test_token_override_and_redaction() {
        let creds = Credentials::default().with_token(Some("secret".to_string()));
        assert_eq!(creds.require_token().unwrap(), "secret");
        assert!(!format!("{:?}", creds).contains("secret"));
        assert!(Credentials::default().with_token(Some(" ".to_string())).require_token().is_err());
    }
}
