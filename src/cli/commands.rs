//! Command handlers.
//!
//! Every handler builds its adapters from configuration, runs the
//! operations it needs sequentially and prints the outcome.

use std::sync::Arc;

use rust_decimal::Decimal;
use tabled::Tabled;
use tracing::info;

use super::output;
use super::{BookArgs, OrderArgs};
use crate::config::Config;
use crate::domain::{Order, OrderId, Pair};
use crate::error::{ConfigError, ExchangeError, Result};
use crate::exchange::{
    Exchange, ExchangeFactory, ExchangeKind, HttpTransport, Shared, SourceMode, Transport,
};

#[derive(Tabled)]
struct CoinRow {
    #[tabled(rename = "Exchange")]
    exchange: &'static str,
    #[tabled(rename = "Coin")]
    code: String,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Tx Fee")]
    tx_fee: Decimal,
    #[tabled(rename = "Withdraw")]
    withdraw: bool,
    #[tabled(rename = "Deposit")]
    deposit: bool,
    #[tabled(rename = "Confirmations")]
    confirmation: u32,
    #[tabled(rename = "Listed")]
    listed: bool,
}

#[derive(Tabled)]
struct PairRow {
    #[tabled(rename = "Exchange")]
    exchange: &'static str,
    #[tabled(rename = "Pair")]
    pair: String,
    #[tabled(rename = "Symbol")]
    symbol: String,
    #[tabled(rename = "Maker")]
    maker_fee: Decimal,
    #[tabled(rename = "Taker")]
    taker_fee: Decimal,
    #[tabled(rename = "Lot")]
    lot_size: Decimal,
    #[tabled(rename = "Tick")]
    price_filter: Decimal,
    #[tabled(rename = "Listed")]
    listed: bool,
}

#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "Side")]
    side: &'static str,
    #[tabled(rename = "Rate")]
    rate: Decimal,
    #[tabled(rename = "Quantity")]
    quantity: Decimal,
}

#[derive(Tabled)]
struct BalanceRow {
    #[tabled(rename = "Coin")]
    code: String,
    #[tabled(rename = "Free")]
    free: String,
}

/// Adapters built for one command, sharing one registry.
struct Session {
    shared: Shared,
    exchanges: Vec<Arc<dyn Exchange>>,
}

impl Session {
    fn open(config: &Config, only: Option<ExchangeKind>) -> Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(
            config.network.ip_echo_url.clone(),
            config.network.timeout(),
        )?);
        let shared = Shared::in_memory();

        let exchanges = match only {
            Some(kind) => {
                let entry = config.exchange(kind).ok_or_else(|| ConfigError::InvalidValue {
                    field: "exchange",
                    reason: format!("{kind} is not configured"),
                })?;
                vec![ExchangeFactory::create(entry, &shared, transport)?]
            }
            None => ExchangeFactory::create_all(config, &shared, &transport)?,
        };
        Ok(Self { shared, exchanges })
    }

    /// Open a session for one exchange and sync its reference data.
    async fn synced(config: &Config, kind: ExchangeKind) -> Result<(Self, Arc<dyn Exchange>)> {
        let session = Self::open(config, Some(kind))?;
        let exchange = Arc::clone(&session.exchanges[0]);
        let pb = output::spinner(&format!("Syncing {} reference data", exchange.name()));
        exchange.get_coins_data().await;
        exchange.get_pairs_data().await;
        output::spinner_done(&pb);
        Ok((session, exchange))
    }

    /// Resolve `BASE/QUOTE` against the registry.
    fn pair(&self, exchange: &'static str, text: &str) -> Result<Pair> {
        let unknown = || ExchangeError::UnknownSymbol {
            exchange,
            pair: text.to_string(),
        };
        let (base, quote) = text.split_once('/').ok_or_else(unknown)?;
        let registry = &self.shared.registry;
        let base = registry.lookup_coin(base).ok_or_else(unknown)?;
        let quote = registry.lookup_coin(quote).ok_or_else(unknown)?;
        Ok(registry.lookup_pair(&base, &quote).ok_or_else(unknown)?)
    }
}

/// Validate configuration offline.
pub fn check(config: &Config) -> Result<()> {
    output::section("Configuration");
    output::key_value("Log level", &config.logging.level);
    output::key_value("Log format", &config.logging.format);
    output::key_value("IP echo", &config.network.ip_echo_url);

    output::section("Exchanges");
    for exchange in &config.exchanges {
        let source = match exchange.source {
            SourceMode::ExchangeApi => "exchange_api",
            SourceMode::JsonFile => "json_file",
        };
        output::key_value(exchange.name.as_str(), source);
        if exchange.credentials.is_none() {
            output::warn(&format!("{}: no API credentials, private calls disabled", exchange.name));
        }
    }
    println!();
    output::ok("Configuration is valid");
    Ok(())
}

/// Sync and list coin constraints.
pub async fn coins(config: &Config, only: Option<ExchangeKind>) -> Result<()> {
    let session = Session::open(config, only)?;
    let mut rows = Vec::new();
    for exchange in &session.exchanges {
        let pb = output::spinner(&format!("Syncing {} coins", exchange.name()));
        exchange.get_coins_data().await;
        output::spinner_done(&pb);
        rows.extend(
            session
                .shared
                .constraints
                .coins_for(exchange.name())
                .into_iter()
                .map(|c| CoinRow {
                    exchange: exchange.name(),
                    code: c.coin.code().to_string(),
                    symbol: c.ex_symbol,
                    tx_fee: c.tx_fee,
                    withdraw: c.withdraw,
                    deposit: c.deposit,
                    confirmation: c.confirmation,
                    listed: c.listed,
                }),
        );
    }
    output::section("Coins");
    output::table(rows);
    Ok(())
}

/// Sync and list pair constraints.
pub async fn pairs(config: &Config, only: Option<ExchangeKind>) -> Result<()> {
    let session = Session::open(config, only)?;
    let mut rows = Vec::new();
    for exchange in &session.exchanges {
        let pb = output::spinner(&format!("Syncing {} pairs", exchange.name()));
        exchange.get_coins_data().await;
        exchange.get_pairs_data().await;
        output::spinner_done(&pb);
        rows.extend(
            session
                .shared
                .constraints
                .pairs_for(exchange.name())
                .into_iter()
                .map(|c| PairRow {
                    exchange: exchange.name(),
                    pair: c.pair.to_string(),
                    symbol: c.ex_symbol,
                    maker_fee: c.maker_fee,
                    taker_fee: c.taker_fee,
                    lot_size: c.lot_size,
                    price_filter: c.price_filter,
                    listed: c.listed,
                }),
        );
    }
    output::section("Pairs");
    output::table(rows);
    Ok(())
}

/// Fetch and print one order-book snapshot.
pub async fn book(config: &Config, args: &BookArgs) -> Result<()> {
    let (session, exchange) = Session::synced(config, args.exchange).await?;
    let pair = session.pair(exchange.name(), &args.pair)?;
    let maker = exchange.order_book(&pair).await?;

    output::section(&format!("{} {}", exchange.name(), pair));
    output::key_value("Latency", format!("{} ms", maker.latency().num_milliseconds()));
    let worker_ip = match maker.worker_ip() {
        "" => "unknown",
        ip => ip,
    };
    output::key_value("Worker IP", worker_ip);

    let asks = maker.asks().iter().take(args.depth).rev().map(|l| LevelRow {
        side: "ask",
        rate: l.rate(),
        quantity: l.quantity(),
    });
    let bids = maker.bids().iter().take(args.depth).map(|l| LevelRow {
        side: "bid",
        rate: l.rate(),
        quantity: l.quantity(),
    });
    output::table(asks.chain(bids).collect());
    Ok(())
}

/// Refresh and print free balances.
pub async fn balances(config: &Config, only: Option<ExchangeKind>) -> Result<()> {
    let session = Session::open(config, only)?;
    for exchange in &session.exchanges {
        let pb = output::spinner(&format!("Fetching {} balances", exchange.name()));
        exchange.get_coins_data().await;
        exchange.update_all_balances().await;
        output::spinner_done(&pb);
    }
    let rows = session
        .shared
        .balances
        .snapshot()
        .into_iter()
        .map(|(code, free)| BalanceRow {
            code,
            free: output::amount(free),
        })
        .collect();
    output::section("Balances");
    output::table(rows);
    Ok(())
}

fn order_for(session: &Session, exchange: &dyn Exchange, args: &OrderArgs) -> Result<Order> {
    let pair = session.pair(exchange.name(), &args.pair)?;
    Ok(Order::placed(
        OrderId::new(args.order_id.clone()),
        pair,
        args.side,
        args.rate,
        args.quantity,
        String::new(),
    ))
}

/// Poll and print an order's status.
pub async fn status(config: &Config, args: &OrderArgs) -> Result<()> {
    let (session, exchange) = Session::synced(config, args.exchange).await?;
    let mut order = order_for(&session, exchange.as_ref(), args)?;
    exchange.order_status(&mut order).await?;

    output::section(&format!("Order {}", args.order_id));
    output::key_value("Status", order.status);
    output::key_value("Executed", format!("{} / {}", order.deal_quantity, order.quantity));
    output::key_value("Deal rate", order.deal_rate);
    Ok(())
}

/// Request cancellation of an order.
pub async fn cancel(config: &Config, args: &OrderArgs) -> Result<()> {
    let (session, exchange) = Session::synced(config, args.exchange).await?;
    let mut order = order_for(&session, exchange.as_ref(), args)?;
    exchange.cancel_order(&mut order).await?;

    info!(exchange = exchange.name(), order_id = %args.order_id, "Cancel acknowledged");
    output::ok(&format!("Cancel requested for {} (now {})", args.order_id, order.status));
    Ok(())
}
