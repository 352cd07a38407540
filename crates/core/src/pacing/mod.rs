//! Request pacing between catalog scans.
//!
//! The resolver calls [`Pacer::pace`] after each artist's album listing so a
//! long batch of lookups stays under the catalog's quota. The policy is a
//! parameter: a token bucket in production, no-op or recording in tests.

mod token_bucket;

pub use token_bucket::{TokenBucket, TokenBucketPacer};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Pacing policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Disable pacing entirely.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Units of work allowed per window.
    #[serde(default = "default_requests_per_window")]
    pub requests_per_window: u32,

    /// Window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_requests_per_window() -> u32 {
    1
}

fn default_window_ms() -> u64 {
    1000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            requests_per_window: default_requests_per_window(),
            window_ms: default_window_ms(),
        }
    }
}

/// A pacing policy.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until the next unit of catalog work is allowed.
    async fn pace(&self);
}

/// Pacer that never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn pace(&self) {}
}

/// Build the pacer described by the configuration.
pub fn create_pacer(config: &PacingConfig) -> Arc<dyn Pacer> {
    if !config.enabled || config.requests_per_window == 0 || config.window_ms == 0 {
        return Arc::new(NoPacing);
    }
    Arc::new(TokenBucketPacer::new(
        config.requests_per_window,
        std::time::Duration::from_millis(config.window_ms),
    ))
}
