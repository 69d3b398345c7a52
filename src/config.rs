use crate::{
    envelope::{DEFAULT_INDEX, DEFAULT_SOURCETYPE},
    error::RuntimeError,
};
use std::{str::FromStr, time::Duration};

/// `Config` holds the process-wide settings, read once at start-up.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// HTTP Event Collector endpoint
    pub hec_url: String,
    /// Secrets Manager id of the collector token
    pub hec_token_secret_id: String,
    /// `index` attached to every event
    pub index: String,
    /// `sourcetype` attached to every event
    pub sourcetype: String,
    /// Maximum number of events per request
    pub batch_size: usize,
    /// Timeout of one collector request
    pub hec_timeout: Duration,
    /// Timeout of one object retrieval
    pub fetch_timeout: Duration,
    /// Whether the collector TLS certificate is verified
    pub verify_tls: bool,
    /// Stop the invocation at the first failed object
    pub fail_fast: bool,
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Config, RuntimeError> {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let batch_size: usize = parse(&lookup, "HEC_BATCH_SIZE", 100)?;
        if batch_size == 0 {
            return Err(RuntimeError::Config(
                "HEC_BATCH_SIZE must be greater than zero".into(),
            ));
        }

        Ok(Config {
            hec_url: required(&lookup, "SPLUNK_HEC_URL")?,
            hec_token_secret_id: required(&lookup, "SPLUNK_HEC_TOKEN")?,
            index: lookup("SPLUNK_HEC_INDEX").unwrap_or_else(|| DEFAULT_INDEX.into()),
            sourcetype: lookup("SPLUNK_HEC_SOURCETYPE")
                .unwrap_or_else(|| DEFAULT_SOURCETYPE.into()),
            batch_size,
            hec_timeout: Duration::from_secs(parse(&lookup, "HEC_TIMEOUT_SECS", 90)?),
            fetch_timeout: Duration::from_secs(parse(&lookup, "S3_FETCH_TIMEOUT_SECS", 300)?),
            verify_tls: flag(&lookup, "HEC_TLS_VERIFY", true)?,
            fail_fast: flag(&lookup, "FAIL_FAST", true)?,
        })
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String, RuntimeError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RuntimeError::Config(format!("missing environment variable {name}")))
}

fn parse<F, T>(lookup: &F, name: &str, default: T) -> Result<T, RuntimeError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| RuntimeError::Config(format!("invalid value for {name}: {value}"))),
        None => Ok(default),
    }
}

fn flag<F>(lookup: &F, name: &str, default: bool) -> Result<bool, RuntimeError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(RuntimeError::Config(format!(
                "invalid value for {name}: {v}"
            ))),
        },
    }
}
