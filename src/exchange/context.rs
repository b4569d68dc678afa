//! Process-wide state handed to adapters.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::signing::{Credentials, EpochNanos, NonceSource, Signer, SigningScheme};
use super::transport::{Request, Transport};
use super::SourceMode;
use crate::domain::{BalanceMap, ConstraintStore, MemoryRegistry, Pair, Registry};
use crate::error::{ExchangeError, Result};

/// A response body with the wall-clock times taken around the call.
#[derive(Debug, Clone)]
pub struct Timed {
    pub body: String,
    pub before: DateTime<Utc>,
    pub after: DateTime<Utc>,
}

/// Registries and maps shared by every adapter in the process.
///
/// Built once at startup and cloned (cheaply) into each adapter; nothing is
/// torn down until the process exits.
#[derive(Clone)]
pub struct Shared {
    pub registry: Arc<dyn Registry>,
    pub constraints: Arc<ConstraintStore>,
    pub balances: Arc<BalanceMap>,
    pub nonce: Arc<dyn NonceSource>,
}

impl Shared {
    /// Fresh in-memory state with an epoch-nanosecond nonce source.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            registry: Arc::new(MemoryRegistry::new()),
            constraints: Arc::new(ConstraintStore::new()),
            balances: Arc::new(BalanceMap::new()),
            nonce: Arc::new(EpochNanos::new()),
        }
    }

    #[must_use]
    pub fn with_nonce(mut self, nonce: Arc<dyn NonceSource>) -> Self {
        self.nonce = nonce;
        self
    }
}

/// Everything an adapter needs besides shared state.
#[derive(Clone)]
pub struct AdapterContext {
    pub shared: Shared,
    pub transport: Arc<dyn Transport>,
    pub source: SourceMode,
    pub credentials: Option<Credentials>,
    /// Overrides the adapter's default API base URL.
    pub api_url: Option<String>,
}

impl AdapterContext {
    #[must_use]
    pub fn new(shared: Shared, transport: Arc<dyn Transport>, source: SourceMode) -> Self {
        Self {
            shared,
            transport,
            source,
            credentials: None,
            api_url: None,
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: Option<String>) -> Self {
        self.api_url = api_url;
        self
    }

    /// A signer for `scheme`, when both credential parts are configured.
    #[must_use]
    pub fn signer(&self, scheme: SigningScheme) -> Option<Signer> {
        self.credentials
            .clone()
            .map(|credentials| Signer::new(scheme, credentials, Arc::clone(&self.shared.nonce)))
    }

    /// The exchange-local symbol for `pair`, or `UnknownSymbol` when the
    /// pair was never listed for `exchange`.
    pub fn pair_symbol(&self, exchange: &'static str, pair: &Pair) -> std::result::Result<String, ExchangeError> {
        self.shared
            .constraints
            .symbol_for_pair(exchange, pair)
            .ok_or_else(|| ExchangeError::UnknownSymbol {
                exchange,
                pair: pair.to_string(),
            })
    }

    /// Send `request`, stamping the time on either side of the call.
    pub async fn timed_send(&self, request: Request) -> Result<Timed> {
        let before = Utc::now();
        let body = self.transport.send(request).await?;
        let after = Utc::now();
        Ok(Timed { body, before, after })
    }

    /// This worker's external IP, or an empty string when unknown.
    pub async fn worker_ip(&self) -> String {
        self.transport.external_ip().await.unwrap_or_default()
    }
}
