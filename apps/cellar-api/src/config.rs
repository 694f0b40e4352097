use cellar_core::CoreError;
use std::{net::IpAddr, str::FromStr};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime settings read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: IpAddr,
    pub port: u16,
    /// In-memory storage is used when unset.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub seed_demo: bool,
    pub log_level: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            host: parse_or(get("CELLAR_HOST"), "CELLAR_HOST", DEFAULT_HOST.parse().ok())?,
            port: parse_or(get("CELLAR_PORT"), "CELLAR_PORT", Some(DEFAULT_PORT))?,
            database_url: get("DATABASE_URL"),
            db_max_connections: match parse_or(
                get("CELLAR_DB_MAX_CONNECTIONS"),
                "CELLAR_DB_MAX_CONNECTIONS",
                Some(DEFAULT_DB_MAX_CONNECTIONS),
            )? {
                0 => {
                    return Err(CoreError::Configuration(
                        "CELLAR_DB_MAX_CONNECTIONS must be at least 1".into(),
                    ));
                }
                n => n,
            },
            seed_demo: match get("CELLAR_SEED_DEMO") {
                None => false,
                Some(raw) => parse_flag(&raw).ok_or_else(|| {
                    CoreError::Configuration(format!(
                        "CELLAR_SEED_DEMO must be true or false, got '{raw}'"
                    ))
                })?,
            },
            log_level: get("CELLAR_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: Option<T>) -> Result<T, CoreError> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| CoreError::Configuration(format!("Invalid value for {key}: '{raw}'"))),
        None => default.ok_or_else(|| CoreError::Configuration(format!("{key} is required"))),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, CoreError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.host.to_string(), "0.0.0.0");
        assert_eq!(s.port, 3000);
        assert_eq!(s.database_url, None);
        assert_eq!(s.db_max_connections, 5);
        assert!(!s.seed_demo);
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("CELLAR_HOST", "127.0.0.1"),
            ("CELLAR_PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/cellar"),
            ("CELLAR_SEED_DEMO", "TRUE"),
            ("CELLAR_LOG_LEVEL", "debug"),
        ])
        .unwrap();
        assert_eq!(s.port, 8080);
        assert_eq!(s.database_url.as_deref(), Some("postgres://localhost/cellar"));
        assert!(s.seed_demo);
        assert_eq!(s.log_level, "debug");
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        let s = settings(&[("DATABASE_URL", "   ")]).unwrap();
        assert_eq!(s.database_url, None);
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        for pairs in [
            [("CELLAR_PORT", "eighty")],
            [("CELLAR_HOST", "not-an-ip")],
            [("CELLAR_SEED_DEMO", "maybe")],
            [("CELLAR_DB_MAX_CONNECTIONS", "0")],
        ] {
            match settings(&pairs) {
                Err(CoreError::Configuration(_)) => {}
                other => panic!("Expected Configuration error for {:?}, got {:?}", pairs, other),
            }
        }
    }
}
