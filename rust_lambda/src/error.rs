use aws_sdk_cloudwatchlogs::error::BuildError;
use thiserror::Error;

/// Configuration problems. Any of these fails the invocation before a record is read.
#[derive(Debug, Error, PartialEq)]
pub(crate) enum ConfigError {
    #[error("LOG_GROUP is not set")]
    MissingLogGroup,

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Invalid log stream format: {0:?}")]
    InvalidStreamFormat(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Failures talking to CloudWatch Logs.
#[derive(Debug, Error)]
pub(crate) enum SinkError {
    #[error("CloudWatch Logs request failed: {0}")]
    Api(#[from] aws_sdk_cloudwatchlogs::Error),

    #[error("Failed to build log event: {0}")]
    Build(#[from] BuildError),
}
