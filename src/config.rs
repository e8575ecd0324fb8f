//! Environment-driven configuration
//!
//! ## Variables
//! - `HOST` / `PORT`: bind address (default `0.0.0.0:3000`)
//! - `STATIC_DIR`: directory served for non-API paths (default `public`)
//! - `RELAY_HEARTBEAT_SECS`: WebSocket ping interval (default 30)
//! - `REGISTRATION_GROUPS`: comma-separated group ids (default `group-1`..`group-6`)
//! - `USERS_PER_GROUP`: capacity of each group (default 50)
//! - `RELAY_JWT_SECRET`: session signing secret, min 32 chars (generated if unset)
//! - `RELAY_TOKEN_TTL`: access token lifetime in seconds, 1..=one year (default 3600)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Longest accepted access token lifetime (one year)
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Configuration errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// HTTP / WebSocket server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub heartbeat_interval_secs: u64,
}

impl ServerConfig {
    /// Ping interval as a `Duration`
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    /// `host:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: PathBuf::from("public"),
            heartbeat_interval_secs: 30,
        }
    }
}

/// Registration service settings
#[derive(Debug, Clone)]
pub struct RegistrationConfig {
    pub group_ids: Vec<String>,
    pub users_per_group: usize,
    pub jwt_secret: Option<String>,
    pub token_ttl_secs: i64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            group_ids: (1..=6).map(|i| format!("group-{}", i)).collect(),
            users_per_group: 50,
            jwt_secret: None,
            token_ttl_secs: 3600,
        }
    }
}

/// Complete relay configuration
#[derive(Debug, Clone, Default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub registration: RegistrationConfig,
}

impl RelayConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("HOST") {
            let host = host.trim().to_string();
            if host.is_empty() {
                return Err(ConfigError::Empty("HOST"));
            }
            config.server.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT")? {
            config.server.port = port;
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.server.static_dir = PathBuf::from(dir.trim());
        }
        if let Some(secs) = parse_var(&lookup, "RELAY_HEARTBEAT_SECS")? {
            config.server.heartbeat_interval_secs = secs;
        }

        if let Some(groups) = lookup("REGISTRATION_GROUPS") {
            let group_ids: Vec<String> = groups
                .split(',')
                .map(|g| g.trim())
                .filter(|g| !g.is_empty())
                .map(|g| g.to_string())
                .collect();
            if group_ids.is_empty() {
                return Err(ConfigError::Empty("REGISTRATION_GROUPS"));
            }
            config.registration.group_ids = group_ids;
        }
        if let Some(capacity) = parse_var::<_, usize>(&lookup, "USERS_PER_GROUP")? {
            if capacity == 0 {
                return Err(ConfigError::InvalidValue {
                    name: "USERS_PER_GROUP",
                    value: "0".to_string(),
                });
            }
            config.registration.users_per_group = capacity;
        }
        if let Some(secret) = lookup("RELAY_JWT_SECRET") {
            config.registration.jwt_secret = Some(secret.trim().to_string());
        }
        if let Some(ttl) = parse_var::<_, i64>(&lookup, "RELAY_TOKEN_TTL")? {
            if ttl <= 0 || ttl > MAX_TOKEN_TTL_SECS {
                return Err(ConfigError::InvalidValue {
                    name: "RELAY_TOKEN_TTL",
                    value: ttl.to_string(),
                });
            }
            config.registration.token_ttl_secs = ttl;
        }

        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RelayConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.heartbeat_interval(), Duration::from_secs(30));
        assert_eq!(config.registration.group_ids.len(), 6);
        assert_eq!(config.registration.users_per_group, 50);
        assert!(config.registration.jwt_secret.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("STATIC_DIR", "/srv/www"),
            ("REGISTRATION_GROUPS", "alpha, beta,,gamma"),
            ("USERS_PER_GROUP", "10"),
        ]))
        .unwrap();

        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.server.static_dir, PathBuf::from("/srv/www"));
        assert_eq!(config.registration.group_ids, vec!["alpha", "beta", "gamma"]);
        assert_eq!(config.registration.users_per_group, 10);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = RelayConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn test_empty_group_list_rejected() {
        let err =
            RelayConfig::from_lookup(lookup_from(&[("REGISTRATION_GROUPS", " , ")])).unwrap_err();
        assert_eq!(err, ConfigError::Empty("REGISTRATION_GROUPS"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = RelayConfig::from_lookup(lookup_from(&[("USERS_PER_GROUP", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "USERS_PER_GROUP", .. }));
    }

    #[test]
    fn test_token_ttl_bounds() {
        for raw in ["0", "-60"] {
            let err = RelayConfig::from_lookup(lookup_from(&[("RELAY_TOKEN_TTL", raw)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidValue {
                    name: "RELAY_TOKEN_TTL",
                    value: raw.to_string()
                }
            );
        }

        let huge = i64::MAX.to_string();
        let err = RelayConfig::from_lookup(lookup_from(&[("RELAY_TOKEN_TTL", huge.as_str())])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "RELAY_TOKEN_TTL", .. }));

        let config = RelayConfig::from_lookup(lookup_from(&[("RELAY_TOKEN_TTL", "86400")])).unwrap();
        assert_eq!(config.registration.token_ttl_secs, 86400);
    }
}
