use thiserror::Error;

/// Application level error carrying a message and an optional boxed source.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Error {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            source: None,
        }
    }

    pub fn with_source(
        message: &str, source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self {
            message: message.to_string(),
            source: Some(source),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source("I/O error", Box::new(err))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::with_source("Configuration error", Box::new(err))
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Error::with_source("Failed to install logger", Box::new(err))
    }
}
