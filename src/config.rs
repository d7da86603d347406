//! Environment configuration
//!
//! ```text
//! STATUS_BIND=127.0.0.1:3030
//! STATUS_DB_PATH=status.db          # ":memory:" keeps everything in process
//! STATUS_MIRROR_PATH=status.json    # empty disables the legacy mirror
//! STATUS_DEBOUNCE_MS=100
//! STATUS_HEARTBEAT_SECS=30
//! STATUS_MAX_SUBSCRIBERS=1024
//! STATUS_SUBSCRIBER_BUFFER=16
//! STATUS_WATCH_STORE=false
//! ```
//!
//! Client side (`status-watch`): `STATUS_URL`, `STATUS_POLL_SECS`.

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::client::ReconnectPolicy;

/// Value of `STATUS_DB_PATH` selecting the in-memory store
pub const MEMORY_STORE: &str = ":memory:";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {var}={value:?}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    /// `None` selects the in-memory store
    pub db_path: Option<PathBuf>,
    pub mirror_path: Option<PathBuf>,
    pub debounce: Duration,
    pub heartbeat: Duration,
    pub max_subscribers: usize,
    pub subscriber_buffer: usize,
    pub watch_store: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3030)),
            db_path: Some(PathBuf::from("status.db")),
            mirror_path: Some(PathBuf::from("status.json")),
            debounce: Duration::from_millis(100),
            heartbeat: Duration::from_secs(30),
            max_subscribers: 1024,
            subscriber_buffer: 16,
            watch_store: false,
        }
    }
}

impl Config {
    /// Config with an in-memory store and no mirror
    pub fn in_memory() -> Self {
        Self {
            db_path: None,
            mirror_path: None,
            ..Default::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        let db_path = match lookup("STATUS_DB_PATH") {
            Some(path) if path.trim() == MEMORY_STORE => None,
            Some(path) if !path.trim().is_empty() => Some(resolve(&current_dir, path.trim())),
            _ => defaults.db_path.map(|p| resolve(&current_dir, p)),
        };
        let mirror_path = match lookup("STATUS_MIRROR_PATH") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(resolve(&current_dir, path.trim())),
            None => defaults.mirror_path.map(|p| resolve(&current_dir, p)),
        };

        let config = Self {
            bind: parse(&lookup, "STATUS_BIND")?.unwrap_or(defaults.bind),
            db_path,
            mirror_path,
            debounce: parse(&lookup, "STATUS_DEBOUNCE_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.debounce),
            heartbeat: parse(&lookup, "STATUS_HEARTBEAT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.heartbeat),
            max_subscribers: parse(&lookup, "STATUS_MAX_SUBSCRIBERS")?
                .unwrap_or(defaults.max_subscribers),
            subscriber_buffer: parse(&lookup, "STATUS_SUBSCRIBER_BUFFER")?
                .unwrap_or(defaults.subscriber_buffer),
            watch_store: parse_flag(&lookup, "STATUS_WATCH_STORE")?.unwrap_or(defaults.watch_store),
        };

        if config.heartbeat.is_zero() {
            return Err(ConfigError {
                var: "STATUS_HEARTBEAT_SECS",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if config.subscriber_buffer == 0 {
            return Err(ConfigError {
                var: "STATUS_SUBSCRIBER_BUFFER",
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(config)
    }
}

/// Configuration of the `status-watch` client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub url: String,
    pub policy: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3030".to_string(),
            policy: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut policy = defaults.policy;
        if let Some(secs) = parse::<u64, _>(&lookup, "STATUS_POLL_SECS")? {
            policy = policy.with_poll_interval(Duration::from_secs(secs));
        }

        Ok(Self {
            url: lookup("STATUS_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.url),
            policy,
        })
    }
}

fn resolve(current_dir: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        current_dir.join(path)
    }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse::<T>().map(Some).map_err(|e| ConfigError {
                var,
                value: value.clone(),
                reason: e.to_string(),
            })
        }
        _ => Ok(None),
    }
}

fn parse_flag<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError {
                var,
                value: v,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}
