//! Command-line interface definitions.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::domain::OrderSide;
use crate::exchange::ExchangeKind;

/// Coinbridge - uniform access to cryptocurrency exchange REST APIs.
#[derive(Parser, Debug)]
#[command(name = "coinbridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the configuration file without touching the network
    Check,

    /// Sync and list coins with their per-exchange constraints
    Coins(ExchangeArg),

    /// Sync and list pairs with their per-exchange constraints
    Pairs(ExchangeArg),

    /// Fetch one order-book snapshot
    Book(BookArgs),

    /// Refresh and show free balances
    Balances(ExchangeArg),

    /// Poll the status of a placed order
    Status(OrderArgs),

    /// Request cancellation of a placed order
    Cancel(OrderArgs),
}

/// Optional exchange filter; every configured exchange when absent.
#[derive(Parser, Debug)]
pub struct ExchangeArg {
    /// Exchange name (bitfinex, kraken, liquid)
    #[arg(short, long)]
    pub exchange: Option<ExchangeKind>,
}

#[derive(Parser, Debug)]
pub struct BookArgs {
    /// Exchange name
    pub exchange: ExchangeKind,

    /// Pair as BASE/QUOTE, for example BTC/USD
    pub pair: String,

    /// Levels to print per side
    #[arg(long, default_value_t = 10)]
    pub depth: usize,
}

#[derive(Parser, Debug)]
pub struct OrderArgs {
    /// Exchange name
    pub exchange: ExchangeKind,

    /// Pair as BASE/QUOTE
    pub pair: String,

    /// Exchange-assigned order id
    pub order_id: String,

    /// Side the order was placed on
    #[arg(long, default_value = "buy")]
    pub side: OrderSide,

    /// Requested limit price
    #[arg(long)]
    pub rate: Decimal,

    /// Requested quantity
    #[arg(long)]
    pub quantity: Decimal,
}
