pub mod config;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod server;
pub mod store;

use std::sync::Arc;

use deadpool_redis::Pool;

use crate::config::{Limits, ServiceKey};

/// Program name used on pages, logs and the version endpoint.
pub const NAME: &str = "Vanish";

/// Shared application state threaded through axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    /// The 32-byte service key mixed with user passwords by the codec.
    pub key: Arc<ServiceKey>,
    /// Maximum acceptable TTL and read count for create requests.
    pub limits: Limits,
    /// Whether generated share URLs use the https scheme.
    pub secure: bool,
}

/// Build metadata shown by `--version` and the version endpoint.
/// Revision and build date come from the build environment when set.
pub fn version_text() -> String {
    format!(
        "{NAME}\nVersion: {}\nRevision: {}\nBuild date: {}",
        env!("CARGO_PKG_VERSION"),
        option_env!("VANISH_REVISION").unwrap_or("unknown"),
        option_env!("VANISH_BUILD_DATE").unwrap_or("unknown"),
    )
}

pub use server::{router, run};
