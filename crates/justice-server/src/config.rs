use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JUSTICE_JWT_SECRET is unset or still a placeholder")]
    InsecureSecret,

    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bootstrap_admin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JUSTICE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::InsecureSecret);
        }

        let host = lookup("JUSTICE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("JUSTICE_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| "5000".into());
        let port: u16 = port.parse().map_err(|_| ConfigError::Invalid {
            key: "JUSTICE_PORT",
            value: port.clone(),
        })?;

        let raw_addr = format!("{}:{}", host, port);
        let addr: SocketAddr = raw_addr.parse().map_err(|_| ConfigError::Invalid {
            key: "JUSTICE_HOST",
            value: host.clone(),
        })?;

        let db_path: PathBuf = lookup("JUSTICE_DB_PATH")
            .unwrap_or_else(|| "justice.db".into())
            .into();

        let token_ttl_hours = match lookup("JUSTICE_TOKEN_TTL_HOURS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(hours) if hours > 0 => hours,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "JUSTICE_TOKEN_TTL_HOURS",
                        value: raw,
                    });
                }
            },
            None => 72,
        };

        let bootstrap_admin = lookup("JUSTICE_BOOTSTRAP_ADMIN").filter(|name| !name.trim().is_empty());

        Ok(Self {
            addr,
            db_path,
            jwt_secret,
            token_ttl_hours,
            bootstrap_admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("JUSTICE_JWT_SECRET", "a-long-random-value")]).unwrap();
        assert_eq!(cfg.addr, "0.0.0.0:5000".parse().unwrap());
        assert_eq!(cfg.db_path, PathBuf::from("justice.db"));
        assert_eq!(cfg.token_ttl_hours, 72);
        assert!(cfg.bootstrap_admin.is_none());
    }

    #[test]
    fn placeholder_or_missing_secret_is_rejected() {
        assert!(matches!(config(&[]), Err(ConfigError::InsecureSecret)));
        assert!(matches!(
            config(&[("JUSTICE_JWT_SECRET", "dev-secret-change-me")]),
            Err(ConfigError::InsecureSecret)
        ));
    }

    #[test]
    fn port_falls_back_to_plain_port_var() {
        let cfg = config(&[("JUSTICE_JWT_SECRET", "x9"), ("PORT", "8080")]).unwrap();
        assert_eq!(cfg.addr.port(), 8080);

        let cfg = config(&[
            ("JUSTICE_JWT_SECRET", "x9"),
            ("PORT", "8080"),
            ("JUSTICE_PORT", "9090"),
        ])
        .unwrap();
        assert_eq!(cfg.addr.port(), 9090);
    }

    #[test]
    fn bad_numbers_are_errors() {
        assert!(config(&[("JUSTICE_JWT_SECRET", "x9"), ("JUSTICE_PORT", "http")]).is_err());
        assert!(config(&[("JUSTICE_JWT_SECRET", "x9"), ("JUSTICE_TOKEN_TTL_HOURS", "0")]).is_err());
    }
}
