//! Exchange adapter factory.
//!
//! Provides [`ExchangeFactory`] for building adapters from configuration.
//! `json_file` entries are seeded from their snapshot before the adapter is
//! handed out.

use std::sync::Arc;

use tracing::info;

use super::{AdapterContext, Exchange, ExchangeKind, Shared, SourceMode, Transport};
use crate::adapter::{bitfinex::BitfinexClient, kraken::KrakenClient, liquid::LiquidClient};
use crate::config::{Config, ExchangeConfig};
use crate::domain::ReferenceSnapshot;
use crate::error::{ConfigError, Result};

/// Builds exchange adapters. All methods are static.
pub struct ExchangeFactory;

impl ExchangeFactory {
    /// Build the adapter for one configured exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if a `json_file` entry has no snapshot or the
    /// snapshot cannot be read.
    pub fn create(
        config: &ExchangeConfig,
        shared: &Shared,
        transport: Arc<dyn Transport>,
    ) -> Result<Arc<dyn Exchange>> {
        if config.source == SourceMode::JsonFile {
            let path = config.snapshot.as_ref().ok_or(ConfigError::MissingField {
                field: "exchanges.snapshot",
            })?;
            let snapshot = ReferenceSnapshot::load(path)?;
            let (coins, pairs) =
                snapshot.seed(config.name.as_str(), shared.registry.as_ref(), &shared.constraints);
            info!(exchange = %config.name, coins, pairs, path = %path.display(), "Loaded reference snapshot");
        }

        let ctx = AdapterContext::new(shared.clone(), transport, config.source)
            .with_credentials(config.credentials.clone())
            .with_api_url(config.api_url.clone());

        let exchange: Arc<dyn Exchange> = match config.name {
            ExchangeKind::Bitfinex => Arc::new(BitfinexClient::new(ctx)),
            ExchangeKind::Kraken => Arc::new(KrakenClient::new(ctx)),
            ExchangeKind::Liquid => Arc::new(LiquidClient::new(ctx)),
        };
        Ok(exchange)
    }

    /// Build every configured exchange, in configuration order.
    ///
    /// # Errors
    ///
    /// Fails on the first exchange that cannot be built.
    pub fn create_all(
        config: &Config,
        shared: &Shared,
        transport: &Arc<dyn Transport>,
    ) -> Result<Vec<Arc<dyn Exchange>>> {
        config
            .exchanges
            .iter()
            .map(|exchange| Self::create(exchange, shared, Arc::clone(transport)))
            .collect()
    }
}
