use thiserror::Error;
use url::Url;

use super::parser::{Config, DictionaryConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Config {
    /// Checks the Slack credentials. Only the `serve` path talks to Slack,
    /// so `migrate` and `ask` run without them.
    pub fn validate_slack(&self) -> Result<(), ConfigError> {
        if self.slack.verification_token.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "slack.verification_token cannot be empty".to_string(),
            ));
        }

        if self.slack.bot_token.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "slack.bot_token cannot be empty".to_string(),
            ));
        }

        if self.slack.bot_id.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "slack.bot_id cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = Url::parse(&self.slack.api_base_url) {
            return Err(ConfigError::InvalidConfig(format!(
                "slack.api_base_url is not a valid url: {e}"
            )));
        }

        if self.database.connection_string().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database connection string cannot be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        match &self.dictionary {
            DictionaryConfig::None => {}
            DictionaryConfig::File { path } => {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidConfig(
                        "dictionary.path cannot be empty".to_string(),
                    ));
                }
            }
            DictionaryConfig::Http { url } => {
                if let Err(e) = Url::parse(url) {
                    return Err(ConfigError::InvalidConfig(format!(
                        "dictionary.url is not a valid url: {e}"
                    )));
                }
            }
        }

        Ok(())
    }
}
