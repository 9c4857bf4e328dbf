//! JSON configuration loading and validation.
//!
//! The file layout mirrors the deployed `config.json` format, so field
//! names (including `indlecon`) are fixed.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use deadpool_redis::{Pool, PoolConfig, Runtime};
use serde::Deserialize;
use zeroize::ZeroizeOnDrop;

/// Service-wide maxima applied to create requests.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Limits {
    #[serde(rename = "ttl")]
    pub max_ttl: i64,
    #[serde(rename = "times")]
    pub max_times: i64,
}

/// Connection parameters for the Redis store.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisCfg {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default)]
    pub db: i64,
    #[serde(default)]
    pub timeout: i64,
    #[serde(default)]
    pub password: String,
    /// Minimum idle connections; validated for config compatibility.
    /// The deadpool pool exposes a single size knob, bounded by `maxcon`.
    #[serde(default)]
    pub indlecon: usize,
    #[serde(default)]
    pub maxcon: usize,
}

fn default_network() -> String {
    "tcp".into()
}

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub timeout: i64,
    #[serde(default)]
    pub secure: bool,
    /// 64 hex chars decoding to the 32-byte service key.
    #[serde(default)]
    pub key: String,
    pub settings: Limits,
    pub redis: RedisCfg,
}

/// The process-wide 32-byte symmetric key, wiped on drop.
#[derive(ZeroizeOnDrop)]
pub struct ServiceKey(Vec<u8>);

impl ServiceKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Config {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let cfg: Config = serde_json::from_str(&data).context("parse config JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.timeout < 1 {
            bail!("invalid timeout value");
        }
        if self.port < 1 {
            bail!("port should be positive");
        }
        if self.settings.max_ttl < 1 {
            bail!("ttl setting should be positive");
        }
        if self.settings.max_times < 1 {
            bail!("times setting should be positive");
        }
        let key = hex::decode(&self.key).context("can not decode secret key")?;
        if key.len() != 32 {
            bail!("secret key must decode to 32 bytes, got {}", key.len());
        }
        self.redis.validate()
    }

    /// Decode the hex service key. [`Config::load`] has already checked
    /// the format.
    pub fn service_key(&self) -> Result<ServiceKey> {
        let key = hex::decode(&self.key).context("can not decode secret key")?;
        Ok(ServiceKey(key))
    }

    pub fn limits(&self) -> Limits {
        self.settings
    }

    /// Listen address string for the TCP listener.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn handle_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout as u64)
    }
}

impl RedisCfg {
    fn validate(&self) -> Result<()> {
        if self.timeout < 1 {
            bail!("invalid redis timeout value");
        }
        if self.indlecon < 1 || self.maxcon < 1 {
            bail!("invalid redis connections settings");
        }
        if self.db < 0 {
            bail!("invalid db number");
        }
        if self.network != "tcp" && self.network != "unix" {
            bail!("unsupported redis network: {}", self.network);
        }
        Ok(())
    }

    /// Connection URL for the redis client.
    pub fn url(&self) -> String {
        match self.network.as_str() {
            "unix" if self.password.is_empty() => {
                format!("redis+unix://{}?db={}", self.host, self.db)
            }
            "unix" => format!(
                "redis+unix://{}?db={}&pass={}",
                self.host, self.db, self.password
            ),
            _ if self.password.is_empty() => {
                format!("redis://{}:{}/{}", self.host, self.port, self.db)
            }
            _ => format!(
                "redis://:{}@{}:{}/{}",
                self.password, self.host, self.port, self.db
            ),
        }
    }

    /// Build the connection pool. Checkouts are recycled with a PING, so
    /// a stale connection is never handed to a request.
    pub fn create_pool(&self) -> Result<Pool> {
        let timeout = Duration::from_secs(self.timeout as u64);
        let mut pool_cfg = PoolConfig::new(self.maxcon);
        pool_cfg.timeouts.wait = Some(timeout);
        pool_cfg.timeouts.create = Some(timeout);
        pool_cfg.timeouts.recycle = Some(timeout);

        let mut cfg = deadpool_redis::Config::from_url(self.url());
        cfg.pool = Some(pool_cfg);
        cfg.create_pool(Some(Runtime::Tokio1))
            .context("create redis pool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        format!(
            r#"{{
                "host": "127.0.0.1",
                "port": 8080,
                "timeout": 30,
                "secure": false,
                "key": "{}",
                "settings": {{"ttl": 604800, "times": 1000}},
                "redis": {{
                    "host": "127.0.0.1",
                    "port": 6379,
                    "network": "tcp",
                    "db": 0,
                    "timeout": 5,
                    "password": "",
                    "indlecon": 1,
                    "maxcon": 10
                }}
            }}"#,
            "ab".repeat(32)
        )
    }

    fn parse(body: &str) -> Result<Config> {
        let cfg: Config = serde_json::from_str(body)?;
        cfg.validate()?;
        Ok(cfg)
    }

    #[test]
    fn parses_valid_config() {
        let cfg = parse(&sample()).unwrap();
        assert_eq!(cfg.addr(), "127.0.0.1:8080");
        assert_eq!(cfg.limits().max_ttl, 604_800);
        assert_eq!(cfg.limits().max_times, 1_000);
        assert_eq!(cfg.handle_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.service_key().unwrap().as_bytes().len(), 32);
    }

    #[test]
    fn rejects_bad_service_key() {
        let body = sample().replace(&"ab".repeat(32), "not-hex");
        assert!(parse(&body).is_err());
        let body = sample().replace(&"ab".repeat(32), "abcd");
        assert!(parse(&body).is_err());
    }

    #[test]
    fn rejects_non_positive_numbers() {
        assert!(parse(&sample().replace(r#""timeout": 30"#, r#""timeout": 0"#)).is_err());
        assert!(parse(&sample().replace(r#""ttl": 604800"#, r#""ttl": 0"#)).is_err());
        assert!(parse(&sample().replace(r#""times": 1000"#, r#""times": 0"#)).is_err());
        assert!(parse(&sample().replace(r#""maxcon": 10"#, r#""maxcon": 0"#)).is_err());
        assert!(parse(&sample().replace(r#""db": 0"#, r#""db": -1"#)).is_err());
    }

    #[test]
    fn rejects_unknown_network() {
        assert!(parse(&sample().replace(r#""network": "tcp""#, r#""network": "udp""#)).is_err());
    }

    #[test]
    fn builds_redis_url() {
        let cfg = parse(&sample()).unwrap();
        assert_eq!(cfg.redis.url(), "redis://127.0.0.1:6379/0");

        let with_pass = sample().replace(r#""password": """#, r#""password": "hush""#);
        let cfg = parse(&with_pass).unwrap();
        assert_eq!(cfg.redis.url(), "redis://:hush@127.0.0.1:6379/0");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(Config::load(Path::new("/definitely/not/here.json")).is_err());
    }
}
