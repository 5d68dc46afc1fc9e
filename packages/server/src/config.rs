use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::domains::lobby::machines::HostPolicy;
use crate::kernel::LobbySettings;

/// Where restaurant candidates come from.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateSource {
    /// External search/recommendation service.
    Service(String),
    /// Local JSON catalog, for development and demos.
    Catalog(PathBuf),
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
    pub candidate_source: CandidateSource,
    pub max_candidates: usize,
    pub candidate_timeout_secs: u64,
    pub host_migration: bool,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let candidate_source = match (var("CANDIDATE_SERVICE_URL"), var("RESTAURANT_CATALOG_PATH")) {
            (Some(url), _) => CandidateSource::Service(url),
            (None, Some(path)) => CandidateSource::Catalog(PathBuf::from(path)),
            (None, None) => {
                bail!("Either CANDIDATE_SERVICE_URL or RESTAURANT_CATALOG_PATH must be set")
            }
        };

        Ok(Self {
            database_url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            jwt_secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: var("JWT_ISSUER").unwrap_or_else(|| "lobby-server".to_string()),
            allowed_origins: var("ALLOWED_ORIGINS")
                .map(|origins| parse_list(&origins))
                .unwrap_or_default(),
            candidate_source,
            max_candidates: var("MAX_CANDIDATES")
                .unwrap_or_else(|| "20".to_string())
                .parse()
                .context("MAX_CANDIDATES must be a valid number")?,
            candidate_timeout_secs: var("CANDIDATE_TIMEOUT_SECS")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("CANDIDATE_TIMEOUT_SECS must be a valid number")?,
            host_migration: var("HOST_MIGRATION")
                .map(|v| parse_flag(&v))
                .transpose()
                .context("HOST_MIGRATION must be true or false")?
                .unwrap_or(false),
            rate_limit_per_second: var("RATE_LIMIT_PER_SECOND")
                .unwrap_or_else(|| "10".to_string())
                .parse()
                .context("RATE_LIMIT_PER_SECOND must be a valid number")?,
            rate_limit_burst: var("RATE_LIMIT_BURST")
                .unwrap_or_else(|| "20".to_string())
                .parse()
                .context("RATE_LIMIT_BURST must be a valid number")?,
        })
    }

    pub fn candidate_timeout(&self) -> Duration {
        Duration::from_secs(self.candidate_timeout_secs)
    }

    pub fn lobby_settings(&self) -> LobbySettings {
        LobbySettings {
            max_candidates: self.max_candidates,
            candidate_timeout: self.candidate_timeout(),
            host_policy: if self.host_migration {
                HostPolicy::OldestRemaining
            } else {
                HostPolicy::Fixed
            },
        }
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("not a boolean: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/lobby"),
        ("JWT_SECRET", "secret"),
        ("RESTAURANT_CATALOG_PATH", "catalog.json"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.jwt_issuer, "lobby-server");
        assert!(config.allowed_origins.is_empty());
        assert_eq!(config.max_candidates, 20);
        assert_eq!(config.candidate_timeout(), Duration::from_secs(10));
        assert!(!config.host_migration);
        assert_eq!((config.rate_limit_per_second, config.rate_limit_burst), (10, 20));
        assert_eq!(
            config.candidate_source,
            CandidateSource::Catalog(PathBuf::from("catalog.json"))
        );
        assert_eq!(config.lobby_settings().host_policy, HostPolicy::Fixed);
    }

    #[test]
    fn test_service_url_wins_over_catalog() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("CANDIDATE_SERVICE_URL", "http://ranker/candidates"));

        let config = load(&pairs).unwrap();
        assert_eq!(
            config.candidate_source,
            CandidateSource::Service("http://ranker/candidates".to_string())
        );
    }

    #[test]
    fn test_missing_candidate_source_fails() {
        let result = load(&REQUIRED[..2]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_secret_fails() {
        let result = load(&[
            ("DATABASE_URL", "postgres://localhost/lobby"),
            ("RESTAURANT_CATALOG_PATH", "catalog.json"),
        ]);
        assert!(result.unwrap_err().to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("ALLOWED_ORIGINS", "https://a.example, https://b.example,"),
            ("HOST_MIGRATION", "true"),
            ("MAX_CANDIDATES", "8"),
            ("CANDIDATE_TIMEOUT_SECS", "3"),
        ]);

        let config = load(&pairs).unwrap();
        assert_eq!(config.allowed_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.lobby_settings().host_policy, HostPolicy::OldestRemaining);
        assert_eq!(config.lobby_settings().max_candidates, 8);
        assert_eq!(config.lobby_settings().candidate_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_bad_flag_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("HOST_MIGRATION", "maybe"));
        assert!(load(&pairs).is_err());
    }
}
