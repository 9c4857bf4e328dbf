#![allow(dead_code)]

use deadpool_redis::redis::cmd;
use deadpool_redis::{Config as RedisPoolConfig, Pool, Runtime};

use vanish_server::config::Config;

/// Test database URL; database 15 keeps test records away from real data.
pub fn redis_url() -> String {
    std::env::var("VANISH_TEST_REDIS_URL")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379/15".into())
}

/// Pool handle without a liveness check. Pool creation is lazy, so this
/// works even when no store is running (for tests that never touch it).
pub fn lazy_pool() -> Pool {
    RedisPoolConfig::from_url(redis_url())
        .create_pool(Some(Runtime::Tokio1))
        .expect("create test pool")
}

/// Pool handle verified with a PING, or `None` when the store is not
/// reachable; callers skip in that case.
pub async fn redis_pool() -> Option<Pool> {
    let pool = RedisPoolConfig::from_url(redis_url())
        .create_pool(Some(Runtime::Tokio1))
        .ok()?;
    let mut conn = pool.get().await.ok()?;
    let pong: String = cmd("PING").query_async(&mut conn).await.ok()?;
    (pong == "PONG").then_some(pool)
}

/// Parsed service configuration matching the example file shape.
pub fn test_config(secure: bool) -> Config {
    let body = format!(
        r#"{{
            "host": "127.0.0.1",
            "port": 8080,
            "timeout": 30,
            "secure": {secure},
            "key": "{}",
            "settings": {{"ttl": 604800, "times": 1000}},
            "redis": {{
                "host": "127.0.0.1",
                "port": 6379,
                "network": "tcp",
                "db": 15,
                "timeout": 5,
                "password": "",
                "indlecon": 1,
                "maxcon": 10
            }}
        }}"#,
        "ab".repeat(32)
    );
    serde_json::from_str(&body).expect("parse test config")
}

/// The 32-byte service key matching [`test_config`].
pub fn service_key() -> Vec<u8> {
    hex::decode("ab".repeat(32)).unwrap()
}
