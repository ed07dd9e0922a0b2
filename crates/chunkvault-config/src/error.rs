use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse config file: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("invalid value for {key}: {message}")]
  Invalid { key: String, message: String },
}

impl ConfigError {
  pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Invalid {
      key: key.into(),
      message: message.into(),
    }
  }
}
