use std::{str::FromStr, time::Duration};

use crate::{AppError, AppResult};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_ERROR_ROOM_KEY: &str = "error:error";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// Unset means registrations live only in memory and indexing/search are not mounted.
    pub database_url: Option<String>,
    pub relay_timeout: Duration,
    pub storage_timeout: Duration,
    /// Target ratio of tags to words in an indexed message.
    pub tag_density: f64,
    /// Untagged messages shorter than this are not worth indexing.
    pub min_words: usize,
    pub result_limit: usize,
    pub error_room_key: String,
    pub error_room_url: Option<String>,
    pub ignored_senders: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            database_url: None,
            relay_timeout: Duration::from_secs(10),
            storage_timeout: Duration::from_secs(5),
            tag_density: 0.1,
            min_words: 5,
            result_limit: 50,
            error_room_key: DEFAULT_ERROR_ROOM_KEY.to_owned(),
            error_room_url: None,
            ignored_senders: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Config> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Config> {
        let defaults = Config::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        Ok(Config {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: var("DATABASE_URL"),
            relay_timeout: var("RELAY_TIMEOUT_SECS")
                .map(|v| parse::<u64>("RELAY_TIMEOUT_SECS", &v).map(Duration::from_secs))
                .transpose()?
                .unwrap_or(defaults.relay_timeout),
            storage_timeout: var("STORAGE_TIMEOUT_SECS")
                .map(|v| parse::<u64>("STORAGE_TIMEOUT_SECS", &v).map(Duration::from_secs))
                .transpose()?
                .unwrap_or(defaults.storage_timeout),
            tag_density: var("TAG_DENSITY")
                .map(|v| parse::<f64>("TAG_DENSITY", &v))
                .transpose()?
                .unwrap_or(defaults.tag_density),
            min_words: var("MIN_WORDS")
                .map(|v| parse("MIN_WORDS", &v))
                .transpose()?
                .unwrap_or(defaults.min_words),
            result_limit: var("RESULT_LIMIT")
                .map(|v| parse_positive("RESULT_LIMIT", &v))
                .transpose()?
                .unwrap_or(defaults.result_limit),
            error_room_key: var("ERROR_ROOM_KEY").unwrap_or(defaults.error_room_key),
            error_room_url: var("ERROR_ROOM_URL"),
            ignored_senders: var("IGNORED_SENDERS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> AppResult<T> {
    value
        .parse()
        .map_err(|_| AppError::Config(format!("{key} has invalid value {value:?}")))
}

fn parse_positive(key: &str, value: &str) -> AppResult<usize> {
    match parse(key, value)? {
        0 => Err(AppError::Config(format!("{key} must be at least 1"))),
        n => Ok(n),
    }
}
