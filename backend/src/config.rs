//! Service settings loaded via OrthoConfig from `SEGMENTS_*` variables,
//! configuration files or command-line flags.

use std::net::SocketAddr;
use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_MEMBERSHIP_TTL_YEARS, ExpiryPolicy};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REPORTS_DIR: &str = "reports";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_MIN_IDLE: u32 = 1;

/// Runtime configuration for the segments service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SEGMENTS")]
pub struct AppSettings {
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Socket address for the HTTP listener.
    pub bind_addr: Option<String>,
    pub pool_max_size: Option<u32>,
    pub pool_min_idle: Option<u32>,
    /// Directory receiving generated CSV reports.
    pub reports_dir: Option<PathBuf>,
    /// Default membership lifetime in years of 365 days.
    pub default_ttl_years: Option<u32>,
    /// Apply embedded migrations on startup; defaults to true.
    pub run_migrations: Option<bool>,
}

/// A setting held a value that cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {key}: {message}")]
pub struct SettingsError {
    pub key: &'static str,
    pub message: String,
}

impl AppSettings {
    /// Database URL with surrounding whitespace removed; blank counts as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError {
            key: "bind_addr",
            message: format!("{raw:?}: {err}"),
        })
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    pub fn pool_min_idle(&self) -> u32 {
        self.pool_min_idle.unwrap_or(DEFAULT_POOL_MIN_IDLE)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.reports_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORTS_DIR))
    }

    pub fn default_ttl_years(&self) -> u32 {
        self.default_ttl_years
            .unwrap_or(DEFAULT_MEMBERSHIP_TTL_YEARS)
    }

    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    /// Expiry policy for additions without an explicit expiration time.
    pub fn expiry_policy(&self) -> Result<ExpiryPolicy, SettingsError> {
        match self.default_ttl_years() {
            0 => Err(SettingsError {
                key: "default_ttl_years",
                message: "must be at least one year".to_owned(),
            }),
            years => Ok(ExpiryPolicy::from_years(years)),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use chrono::TimeDelta;
    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 7] = [
        "SEGMENTS_DATABASE_URL",
        "SEGMENTS_BIND_ADDR",
        "SEGMENTS_POOL_MAX_SIZE",
        "SEGMENTS_POOL_MIN_IDLE",
        "SEGMENTS_REPORTS_DIR",
        "SEGMENTS_DEFAULT_TTL_YEARS",
        "SEGMENTS_RUN_MIGRATIONS",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("segments-backend")])
            .expect("config should load")
    }

    fn env_with(overrides: &[(&'static str, &str)]) -> Vec<(&'static str, Option<String>)> {
        KEYS.iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| (*value).to_owned());
                (*key, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();

        assert!(settings.database_url().is_none());
        assert_eq!(
            settings.bind_addr().expect("default address parses"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal address")
        );
        assert_eq!(settings.pool_max_size(), 10);
        assert_eq!(settings.pool_min_idle(), 1);
        assert_eq!(settings.reports_dir(), PathBuf::from("reports"));
        assert_eq!(settings.default_ttl_years(), 100);
        assert!(settings.run_migrations());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("SEGMENTS_DATABASE_URL", "postgres://localhost/segments"),
            ("SEGMENTS_BIND_ADDR", "127.0.0.1:9000"),
            ("SEGMENTS_POOL_MAX_SIZE", "4"),
            ("SEGMENTS_REPORTS_DIR", "/tmp/segment-reports"),
            ("SEGMENTS_DEFAULT_TTL_YEARS", "2"),
            ("SEGMENTS_RUN_MIGRATIONS", "false"),
        ]));

        let settings = load_from_empty_args();

        assert_eq!(settings.database_url(), Some("postgres://localhost/segments"));
        assert_eq!(
            settings.bind_addr().expect("address parses").port(),
            9000
        );
        assert_eq!(settings.pool_max_size(), 4);
        assert_eq!(settings.reports_dir(), PathBuf::from("/tmp/segment-reports"));
        assert_eq!(
            settings.expiry_policy().expect("valid ttl").default_ttl(),
            TimeDelta::days(2 * 365)
        );
        assert!(!settings.run_migrations());
    }

    #[rstest]
    #[case::unset(None, true)]
    #[case::enabled(Some("true"), true)]
    #[case::disabled(Some("false"), false)]
    fn migrations_run_unless_disabled(#[case] raw: Option<&str>, #[case] expected: bool) {
        let overrides: Vec<(&'static str, &str)> = raw
            .map(|value| vec![("SEGMENTS_RUN_MIGRATIONS", value)])
            .unwrap_or_default();
        let _guard = lock_env(env_with(&overrides));

        assert_eq!(load_from_empty_args().run_migrations(), expected);
    }

    #[rstest]
    fn malformed_bind_addr_names_its_key() {
        let _guard = lock_env(env_with(&[("SEGMENTS_BIND_ADDR", "not-an-address")]));
        let err = load_from_empty_args()
            .bind_addr()
            .expect_err("invalid address rejected");
        assert_eq!(err.key, "bind_addr");
    }

    #[rstest]
    fn zero_ttl_is_rejected() {
        let _guard = lock_env(env_with(&[("SEGMENTS_DEFAULT_TTL_YEARS", "0")]));
        let err = load_from_empty_args()
            .expiry_policy()
            .expect_err("zero ttl rejected");
        assert_eq!(err.key, "default_ttl_years");
    }
}
