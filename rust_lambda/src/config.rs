use std::fmt::Write;

use chrono::{DateTime, Utc};
use figment::{Figment, providers::Env};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ConfigError;
use crate::log_level::LogLevel;

/// Hourly buckets, e.g. `2023-06-15/1000`.
pub(crate) const DEFAULT_STREAM_FORMAT: &str = "%Y-%m-%d/%H00";

/// Keys whose values are typed. Free-form strings are read with `Env::var`
/// instead, since `Env::raw` would reparse `007` as a number or `[%Y]` as an array.
const TYPED_ENV_KEYS: &[&str] = &["LOG_LEVEL", "CREATE_LOG_GROUP"];

/// Maximum length of a CloudWatch log stream name.
pub(crate) const MAX_STREAM_NAME_CHARS: usize = 512;

/// Typed part of the environment. Keys arrive lowercased from `Env::raw`.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    #[serde(default)]
    log_level: LogLevel,
    #[serde(default = "default_true", deserialize_with = "deserialize_flag")]
    create_log_group: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    /// Threshold for this invocation's diagnostics.
    pub log_level: LogLevel,
    pub log_group: String,
    /// strftime pattern applied to the invocation time to name the stream.
    pub log_stream_format: String,
    pub create_log_group: bool,
}

impl Config {
    pub(crate) fn from_env() -> Result<Config, ConfigError> {
        let env: EnvConfig = Figment::new()
            .merge(Env::raw().only(TYPED_ENV_KEYS))
            .extract()?;

        let log_group = raw_var("LOG_GROUP").ok_or(ConfigError::MissingLogGroup)?;

        Ok(Config {
            log_level: env.log_level,
            log_group,
            log_stream_format: raw_var("LOG_STREAM_FORMAT")
                .unwrap_or_else(|| DEFAULT_STREAM_FORMAT.to_string()),
            create_log_group: env.create_log_group,
        })
    }

    /// Formats `now` into a log stream name.
    ///
    /// Unknown strftime items are reported as an error rather than a panic, and
    /// names CloudWatch would refuse (empty, longer than 512 characters, or
    /// containing `:` or `*`) are rejected up front.
    pub(crate) fn stream_name(&self, now: DateTime<Utc>) -> Result<String, ConfigError> {
        let invalid = || ConfigError::InvalidStreamFormat(self.log_stream_format.clone());

        let mut name = String::new();
        write!(name, "{}", now.format(&self.log_stream_format)).map_err(|_| invalid())?;

        if name.is_empty()
            || name.chars().count() > MAX_STREAM_NAME_CHARS
            || name.contains([':', '*'])
        {
            return Err(invalid());
        }
        Ok(name)
    }
}

fn default_true() -> bool {
    true
}

/// Verbatim value of `name`, or `None` when unset or blank.
fn raw_var(name: &str) -> Option<String> {
    Env::var(name).filter(|value| !value.trim().is_empty())
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_u64() != Some(0)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got '{other}'"
            ))),
        },
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, got {other}"
        ))),
    }
}
