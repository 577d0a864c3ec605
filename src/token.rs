//! Process-wide OAuth token cache.
//!
//! The remote account holds one token no matter how many local workers
//! use it, so the cache is a singleton service shared by every client
//! instance rather than per-instance state. The whole check-and-refresh
//! runs inside a single critical section, so concurrent callers hitting
//! an expired token trigger exactly one refresh.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::OcrError;

/// Safety margin required before the recorded expiry. A token closer
/// than this to expiring is refreshed rather than served.
const EXPIRY_MARGIN: Duration = Duration::from_secs(3600);

/// Expiry assumed when the token endpoint omits `expires_in`
/// (Baidu tokens last 30 days).
const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(2_592_000);

/// A freshly issued token as returned by the token endpoint.
#[derive(Debug, Clone)]
pub struct FreshToken {
    /// The access token value
    pub access_token: String,
    /// Seconds until expiry, if the service reported one
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: SystemTime,
}

/// Thread-safe cache of the current access token and its expiry.
///
/// Dependency-injected: every client holds an `Arc<TokenCache>`, with
/// [`TokenCache::global`] providing the process-wide instance that all
/// production clients share.
#[derive(Debug, Default)]
pub struct TokenCache {
    state: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// Create an empty cache. Prefer [`TokenCache::global`] outside of
    /// tests; a separate cache means a separate token lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache shared by all stage instances.
    pub fn global() -> &'static Arc<TokenCache> {
        static GLOBAL: OnceLock<Arc<TokenCache>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(TokenCache::new()))
    }

    /// Return the cached token, refreshing it first when absent or
    /// within the expiry margin.
    ///
    /// `refresh` is invoked while the cache lock is held; a failed
    /// refresh leaves the cache unchanged so the next caller retries
    /// from scratch.
    pub fn get_or_refresh<F>(&self, refresh: F) -> Result<String, OcrError>
    where
        F: FnOnce() -> Result<FreshToken, OcrError>,
    {
        let mut state = self.state.lock();
        let now = SystemTime::now();

        if let Some(cached) = state.as_ref() {
            if now + EXPIRY_MARGIN < cached.expires_at {
                debug!("reusing cached Baidu access token");
                return Ok(cached.value.clone());
            }
        }

        let fresh = refresh()?;
        let expires_in = fresh
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_EXPIRES_IN);
        info!(expires_in_secs = expires_in.as_secs(), "refreshed Baidu access token");

        let value = fresh.access_token;
        *state = Some(CachedToken {
            value: value.clone(),
            expires_at: now + expires_in,
        });
        Ok(value)
    }
}
