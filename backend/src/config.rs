//! Process configuration, read from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::repository::{DEFAULT_KEY_PREFIX, DEFAULT_STORE_TIMEOUT};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Redis { url: String, key_prefix: String },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub store: StoreBackend,
    pub store_timeout: Duration,
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let listen_addr = parse(
            "LISTEN_ADDR",
            lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        )?;

        let store = match lookup("TASK_STORE").as_deref() {
            None | Some("redis") => StoreBackend::Redis {
                url: lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
                key_prefix: lookup("TASK_KEY_PREFIX")
                    .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "TASK_STORE",
                    value: other.to_string(),
                    reason: "expected `redis` or `memory`".to_string(),
                })
            }
        };

        let store_timeout = match lookup("STORE_TIMEOUT_SECS") {
            Some(raw) => seconds("STORE_TIMEOUT_SECS", raw)?,
            None => DEFAULT_STORE_TIMEOUT,
        };
        let request_timeout = lookup("REQUEST_TIMEOUT_SECS")
            .map(|raw| seconds("REQUEST_TIMEOUT_SECS", raw))
            .transpose()?;

        Ok(Self {
            listen_addr,
            store,
            store_timeout,
            request_timeout,
        })
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}

fn seconds(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    let secs: u64 = parse(var, value)?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(
            config.store,
            StoreBackend::Redis {
                url: "redis://127.0.0.1:6379".into(),
                key_prefix: "task:".into(),
            }
        );
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("LISTEN_ADDR", "127.0.0.1:9000"),
            ("TASK_STORE", "memory"),
            ("STORE_TIMEOUT_SECS", "2"),
            ("REQUEST_TIMEOUT_SECS", "30"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.store_timeout, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn rejects_bad_values() {
        let err = load(&[("LISTEN_ADDR", "nowhere")]).unwrap_err();
        assert!(err.to_string().contains("LISTEN_ADDR"));

        let err = load(&[("TASK_STORE", "mongo")]).unwrap_err();
        assert!(err.to_string().contains("TASK_STORE"));

        assert!(load(&[("STORE_TIMEOUT_SECS", "0")]).is_err());
        assert!(load(&[("REQUEST_TIMEOUT_SECS", "soon")]).is_err());
    }
}
