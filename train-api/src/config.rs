//! Service configuration from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheKeys;
use crate::ingest::SyncConfig;
use crate::store::S3Config;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Where snapshot objects are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    S3(S3Config),
    /// A directory laid out like the bucket, for development
    Local { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_address: IpAddr,
    pub listen_port: u16,
    /// Token clients must present as `Authorization: Token <token>`.
    pub authorization_token: String,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.listen_port)
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub object_prefix: String,
    pub cache_key_prefix: String,
    pub cache_key_delimiter: String,
    pub cache_max_entries: u64,
    pub refresh_interval: Duration,
    /// `None` when timeouts are disabled.
    pub refresh_timeout: Option<Duration>,
    pub max_concurrent_downloads: usize,
    pub snapshot_dump_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let server = ServerConfig {
            listen_address: env.parse_or("LISTEN_ADDRESS", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            listen_port: env.parse_or("LISTEN_PORT", 3000)?,
            authorization_token: env.required("AUTHORIZATION_TOKEN")?,
        };

        let source = match env.get("DARWIN_LOCAL_DIR") {
            Some(dir) => SourceConfig::Local { dir: dir.into() },
            None => SourceConfig::S3(S3Config {
                region: env.get_or("DARWIN_S3_REGION", "eu-west-1"),
                bucket: env.get_or("DARWIN_S3_BUCKET", "darwin.xmltimetable"),
                access_key: env.required("DARWIN_S3_ACCESS_KEY")?,
                secret_key: env.required("DARWIN_S3_SECRET_KEY")?,
            }),
        };

        let refresh_interval = env.parse_or("REFRESH_INTERVAL_SECS", 3600u64)?;
        if refresh_interval == 0 {
            return Err(ConfigError::Invalid {
                name: "REFRESH_INTERVAL_SECS",
                value: "0".into(),
                reason: "must be positive".into(),
            });
        }
        let refresh_timeout = env.parse_or("REFRESH_TIMEOUT_SECS", 900u64)?;

        Ok(Self {
            server,
            source,
            object_prefix: env.get_or("DARWIN_S3_OBJECT_PREFIX", "PPTimetable"),
            cache_key_prefix: env.get_or("CACHE_KEY_PREFIX", "train"),
            cache_key_delimiter: env.get_or("CACHE_KEY_DELIMITER", ":"),
            cache_max_entries: env.parse_or("CACHE_MAX_ENTRIES", 1024)?,
            refresh_interval: Duration::from_secs(refresh_interval),
            refresh_timeout: (refresh_timeout > 0).then(|| Duration::from_secs(refresh_timeout)),
            max_concurrent_downloads: env.parse_or("MAX_CONCURRENT_DOWNLOADS", 4)?,
            snapshot_dump_dir: env.get("SNAPSHOT_DUMP_DIR").map(PathBuf::from),
        })
    }

    pub fn cache_keys(&self) -> CacheKeys {
        CacheKeys::new(&self.cache_key_prefix, &self.cache_key_delimiter)
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::default()
            .with_object_prefix(&self.object_prefix)
            .with_max_concurrent_downloads(self.max_concurrent_downloads)
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(value) = self.get(name) else {
            return Ok(default);
        };
        match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("AUTHORIZATION_TOKEN", "secret"),
        ("DARWIN_S3_ACCESS_KEY", "access"),
        ("DARWIN_S3_SECRET_KEY", "key"),
    ];

    #[test]
    fn defaults() {
        let config = config(MINIMAL).unwrap();
        assert_eq!(config.server.socket_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(config.server.authorization_token, "secret");
        assert_eq!(
            config.source,
            SourceConfig::S3(S3Config {
                region: "eu-west-1".into(),
                bucket: "darwin.xmltimetable".into(),
                access_key: "access".into(),
                secret_key: "key".into(),
            })
        );
        assert_eq!(config.object_prefix, "PPTimetable");
        assert_eq!(config.cache_keys(), CacheKeys::new("train", ":"));
        assert_eq!(config.cache_max_entries, 1024);
        assert_eq!(config.refresh_interval, Duration::from_secs(3600));
        assert_eq!(config.refresh_timeout, Some(Duration::from_secs(900)));
        assert_eq!(config.max_concurrent_downloads, 4);
        assert_eq!(config.snapshot_dump_dir, None);
    }

    #[test]
    fn token_is_required() {
        assert_eq!(
            config(&[("DARWIN_LOCAL_DIR", "/data")]).unwrap_err(),
            ConfigError::Missing("AUTHORIZATION_TOKEN")
        );
        assert_eq!(
            config(&[("AUTHORIZATION_TOKEN", "  "), ("DARWIN_LOCAL_DIR", "/data")]).unwrap_err(),
            ConfigError::Missing("AUTHORIZATION_TOKEN")
        );
    }

    #[test]
    fn s3_credentials_required_without_local_dir() {
        assert_eq!(
            config(&[("AUTHORIZATION_TOKEN", "t")]).unwrap_err(),
            ConfigError::Missing("DARWIN_S3_ACCESS_KEY")
        );

        let local = config(&[("AUTHORIZATION_TOKEN", "t"), ("DARWIN_LOCAL_DIR", "/data")]).unwrap();
        assert_eq!(
            local.source,
            SourceConfig::Local {
                dir: PathBuf::from("/data")
            }
        );
    }

    #[test]
    fn overrides() {
        let mut vars = MINIMAL.to_vec();
        vars.extend([
            ("LISTEN_ADDRESS", "127.0.0.1"),
            ("LISTEN_PORT", "8080"),
            ("CACHE_KEY_PREFIX", "prod"),
            ("CACHE_KEY_DELIMITER", "/"),
            ("REFRESH_TIMEOUT_SECS", "0"),
            ("MAX_CONCURRENT_DOWNLOADS", "8"),
            ("SNAPSHOT_DUMP_DIR", "/tmp/dumps"),
            ("DARWIN_S3_OBJECT_PREFIX", "Other"),
        ]);
        let config = config(&vars).unwrap();

        assert_eq!(config.server.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.cache_keys().key(&["ns", "x"]), "prod/ns/x");
        assert_eq!(config.refresh_timeout, None);
        assert_eq!(config.snapshot_dump_dir, Some(PathBuf::from("/tmp/dumps")));

        let sync = config.sync_config();
        assert_eq!(sync.object_prefix, "Other");
        assert_eq!(sync.max_concurrent_downloads, 8);
    }

    #[test]
    fn invalid_numbers() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("LISTEN_PORT", "http"));
        assert!(matches!(
            config(&vars).unwrap_err(),
            ConfigError::Invalid {
                name: "LISTEN_PORT",
                ..
            }
        ));

        let mut vars = MINIMAL.to_vec();
        vars.push(("REFRESH_INTERVAL_SECS", "0"));
        assert!(matches!(
            config(&vars).unwrap_err(),
            ConfigError::Invalid {
                name: "REFRESH_INTERVAL_SECS",
                ..
            }
        ));
    }
}
