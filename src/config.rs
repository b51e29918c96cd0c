//! Service configuration — environment variables, CLI args, defaults

use sqlx::postgres::PgConnectOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Where the PostGIS connection settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseSettings {
    /// A full `postgres://` URL
    Url(String),
    /// Discrete `DB_*` variables
    Parts {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: String,
    },
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match self {
            Self::Url(url) => PgConnectOptions::from_str(url)
                .map_err(|e| ConfigError::Invalid("DATABASE_URL", e.to_string())),
            Self::Parts {
                host,
                port,
                database,
                user,
                password,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(database)
                .username(user)
                .password(password)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid {0}: {1}")]
    Invalid(&'static str, String),
}

/// Basin Atlas configuration
#[derive(Debug, Clone)]
pub struct AtlasConfig {
    pub database: DatabaseSettings,
    /// Bind address (e.g., "0.0.0.0:5000")
    pub bind_address: String,
    /// Directory holding `wells.geojson`, `tr_json.json` and `rigs.csv`
    pub data_dir: PathBuf,
    /// Allowed CORS origins; `None` allows any origin
    pub cors_origins: Option<Vec<String>>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    /// Server-side `statement_timeout` applied to every session
    pub statement_timeout: Duration,
    /// Upper bound for the `radius` query parameter, in miles
    pub max_radius_miles: f64,
    /// Rig rows must have `first_date` strictly after this string
    pub rig_cutoff_date: String,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::Url(String::new()),
            bind_address: "0.0.0.0:5000".to_string(),
            data_dir: PathBuf::from("."),
            cors_origins: None,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(10),
            statement_timeout: Duration::from_secs(30),
            max_radius_miles: 100.0,
            rig_cutoff_date: "2022-01-01".to_string(),
        }
    }
}

/// Values supplied on the command line; they win over the environment.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
}

impl AtlasConfig {
    /// Load configuration from the process environment with CLI overrides.
    pub fn from_env(cli: CliOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(cli, |key| std::env::var(key).ok())
    }

    /// Same as [`AtlasConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(
        cli: CliOverrides,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Database: CLI URL > DATABASE_URL > DB_* parts
        config.database = match cli.database_url.or_else(|| var("DATABASE_URL")) {
            Some(url) if !url.is_empty() => DatabaseSettings::Url(url),
            _ => {
                let host = var("DB_HOST").ok_or(ConfigError::Missing("DATABASE_URL or DB_HOST"))?;
                let port = match var("DB_PORT") {
                    Some(p) => p
                        .parse()
                        .map_err(|_| ConfigError::Invalid("DB_PORT", p.clone()))?,
                    None => 5432,
                };
                let password = var("DB_PWD").unwrap_or_else(|| {
                    warn!("DB_PWD not set, connecting without a password");
                    String::new()
                });
                DatabaseSettings::Parts {
                    host,
                    port,
                    database: var("DB_NAME").ok_or(ConfigError::Missing("DB_NAME"))?,
                    user: var("DB_USER").ok_or(ConfigError::Missing("DB_USER"))?,
                    password,
                }
            }
        };

        // Bind address: CLI --bind-address > --port > env
        if let Some(addr) = cli.bind_address {
            config.bind_address = addr;
        } else if let Some(p) = cli.port {
            config.bind_address = format!("0.0.0.0:{p}");
        } else if let Some(addr) = var("ATLAS_BIND_ADDRESS") {
            config.bind_address = addr;
        }

        if let Some(dir) = cli.data_dir.or_else(|| var("ATLAS_DATA_DIR").map(PathBuf::from)) {
            config.data_dir = dir;
        }

        if let Some(origins) = var("ATLAS_CORS_ORIGINS") {
            let list: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty() && *o != "*")
                .map(String::from)
                .collect();
            if !list.is_empty() {
                config.cors_origins = Some(list);
            }
        }

        // Optional numeric overrides from env
        if let Some(v) = var("ATLAS_MAX_CONNECTIONS") {
            config.max_connections = parse_positive("ATLAS_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = var("ATLAS_ACQUIRE_TIMEOUT_SECS") {
            config.acquire_timeout = Duration::from_secs(parse_positive("ATLAS_ACQUIRE_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = var("ATLAS_STATEMENT_TIMEOUT_SECS") {
            config.statement_timeout =
                Duration::from_secs(parse_positive("ATLAS_STATEMENT_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = var("ATLAS_MAX_RADIUS_MILES") {
            match v.parse::<f64>() {
                Ok(n) if n.is_finite() && n > 0.0 => config.max_radius_miles = n,
                _ => return Err(ConfigError::Invalid("ATLAS_MAX_RADIUS_MILES", v)),
            }
        }
        if let Some(v) = var("ATLAS_RIG_CUTOFF_DATE") {
            config.rig_cutoff_date = v;
        }

        Ok(config)
    }
}

fn parse_positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(n) if n > T::default() => Ok(n),
        _ => Err(ConfigError::Invalid(key, raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_database_from_parts() {
        let config = AtlasConfig::from_lookup(
            CliOverrides::default(),
            lookup(&[
                ("DB_HOST", "db.internal"),
                ("DB_NAME", "basins"),
                ("DB_USER", "reader"),
                ("DB_PWD", "s3cret"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.database,
            DatabaseSettings::Parts {
                host: "db.internal".into(),
                port: 5432,
                database: "basins".into(),
                user: "reader".into(),
                password: "s3cret".into(),
            }
        );
        assert_eq!(config.bind_address, "0.0.0.0:5000");
        assert!(config.cors_origins.is_none());
        assert_eq!(config.rig_cutoff_date, "2022-01-01");
    }

    #[test]
    fn test_cli_url_wins() {
        let cli = CliOverrides {
            database_url: Some("postgres://u:p@cli/db".into()),
            port: Some(8088),
            ..CliOverrides::default()
        };
        let config = AtlasConfig::from_lookup(
            cli,
            lookup(&[("DATABASE_URL", "postgres://u:p@env/db"), ("ATLAS_BIND_ADDRESS", "127.0.0.1:1")]),
        )
        .unwrap();

        assert_eq!(config.database, DatabaseSettings::Url("postgres://u:p@cli/db".into()));
        assert_eq!(config.bind_address, "0.0.0.0:8088");
        assert!(config.database.connect_options().is_ok());
    }

    #[test]
    fn test_missing_database_settings() {
        let err = AtlasConfig::from_lookup(CliOverrides::default(), lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_numeric_overrides() {
        let config = AtlasConfig::from_lookup(
            CliOverrides::default(),
            lookup(&[
                ("DATABASE_URL", "postgres://localhost/basins"),
                ("ATLAS_MAX_CONNECTIONS", "4"),
                ("ATLAS_STATEMENT_TIMEOUT_SECS", "5"),
                ("ATLAS_MAX_RADIUS_MILES", "25"),
                ("ATLAS_CORS_ORIGINS", "http://localhost:3000, https://maps.example.com"),
            ]),
        )
        .unwrap();

        assert_eq!(config.max_connections, 4);
        assert_eq!(config.statement_timeout, Duration::from_secs(5));
        assert!((config.max_radius_miles - 25.0).abs() < f64::EPSILON);
        assert_eq!(
            config.cors_origins,
            Some(vec!["http://localhost:3000".to_string(), "https://maps.example.com".to_string()])
        );
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        for (key, value) in [
            ("ATLAS_MAX_CONNECTIONS", "0"),
            ("ATLAS_ACQUIRE_TIMEOUT_SECS", "soon"),
            ("ATLAS_MAX_RADIUS_MILES", "-1"),
            ("DB_PORT", "99999"),
        ] {
            let err = AtlasConfig::from_lookup(
                CliOverrides::default(),
                lookup(&[
                    ("DB_HOST", "h"),
                    ("DB_NAME", "n"),
                    ("DB_USER", "u"),
                    (key, value),
                ]),
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(k, _) if k == key), "{key}={value}");
        }
    }
}
