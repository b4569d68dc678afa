//! Kraken REST client implementing [`Exchange`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::types::{
    AddOrderResult, AssetInfo, AssetPair, Balances, CancelResult, Depth, Envelope, OrderInfo,
    QueryOrders,
};
use super::{
    API_URL, COIN_DEFAULTS, DEFAULT_LISTED, DEFAULT_MAKER_FEE, DEFAULT_TAKER_FEE, DEPTH_COUNT, NAME,
};
use crate::domain::{Coin, FillReport, Maker, Order, OrderId, OrderSide, Pair, PairConstraint, VenueState};
use crate::error::{ExchangeError, Result};
use crate::exchange::normalize::{decode, number, parse_decimal, step_from_decimals, value_text};
use crate::exchange::signing::{params, Params};
use crate::exchange::{AdapterContext, Exchange, Method, Request, Signer, SigningScheme, SourceMode};

pub const SCHEME: SigningScheme = SigningScheme::QueryHmac {
    key_param: "apikey",
    signature_header: "apisign",
};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Kraken adapter.
pub struct KrakenClient {
    ctx: AdapterContext,
    base_url: String,
    signer: Option<Signer>,
}

impl KrakenClient {
    #[must_use]
    pub fn new(ctx: AdapterContext) -> Self {
        let base_url = ctx.api_url.clone().unwrap_or_else(|| API_URL.to_string());
        let signer = ctx.signer(SCHEME);
        Self {
            ctx,
            base_url,
            signer,
        }
    }

    fn signer(&self) -> std::result::Result<&Signer, ExchangeError> {
        self.signer
            .as_ref()
            .ok_or(ExchangeError::MissingCredentials { exchange: NAME })
    }

    async fn public<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let body = self.ctx.transport.send(Request::get(&url, query)).await?;
        open_envelope(operation, &body)
    }

    async fn private<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        params: Params,
    ) -> Result<(T, String)> {
        let request = self.signer()?.sign(Method::Get, &self.base_url, path, params)?;
        let body = self.ctx.transport.send(request).await?;
        let result = open_envelope(operation, &body)?;
        Ok((result, body))
    }

    async fn sync_coins(&self) -> Result<usize> {
        let assets: std::collections::HashMap<String, AssetInfo> =
            self.public("GetCoinsData", "/public/Assets", &[]).await?;
        let shared = &self.ctx.shared;

        let mut listed = 0;
        for (key, asset) in &assets {
            let coin = match self.ctx.source {
                SourceMode::ExchangeApi => Some(shared.registry.register_coin(&asset.altname, "")),
                SourceMode::JsonFile => shared
                    .constraints
                    .coin_by_symbol(NAME, key)
                    .or_else(|| shared.constraints.coin_by_symbol(NAME, &asset.altname)),
            };
            let Some(coin) = coin else {
                continue;
            };

            shared.constraints.list_coin(NAME, coin, key, &COIN_DEFAULTS);
            listed += 1;
        }
        Ok(listed)
    }

    async fn sync_pairs(&self) -> Result<usize> {
        let pairs: std::collections::HashMap<String, AssetPair> =
            self.public("GetPairsData", "/public/AssetPairs", &[]).await?;
        let shared = &self.ctx.shared;

        let mut listed = 0;
        // Dark-pool variants (`XXBTZUSD.d`) share their base market's data.
        for (key, data) in pairs.iter().filter(|(key, _)| !key.contains('.')) {
            let pair = match self.ctx.source {
                SourceMode::ExchangeApi => {
                    let base = shared.constraints.coin_by_symbol(NAME, &data.base);
                    let quote = shared.constraints.coin_by_symbol(NAME, &data.quote);
                    match (base, quote) {
                        (Some(base), Some(quote)) => shared.registry.register_pair(&base, &quote),
                        _ => {
                            debug!(exchange = NAME, symbol = %key, "Pair coins not registered");
                            continue;
                        }
                    }
                }
                SourceMode::JsonFile => match shared.constraints.pair_by_symbol(NAME, key) {
                    Some(pair) => pair,
                    None => continue,
                },
            };

            shared.constraints.set_pair(
                NAME,
                PairConstraint {
                    pair,
                    ex_symbol: key.clone(),
                    maker_fee: first_tier_fee(&data.fees_maker).unwrap_or(DEFAULT_MAKER_FEE),
                    taker_fee: first_tier_fee(&data.fees).unwrap_or(DEFAULT_TAKER_FEE),
                    lot_size: step_from_decimals(data.lot_decimals),
                    price_filter: step_from_decimals(data.pair_decimals),
                    listed: DEFAULT_LISTED,
                },
            );
            listed += 1;
        }
        Ok(listed)
    }

    async fn fetch_balances(&self) -> Result<Vec<(Coin, Decimal)>> {
        let (balances, _): (Balances, _) =
            self.private("UpdateAllBalances", "/private/Balance", Params::new()).await?;

        let mut out = Vec::new();
        for (symbol, amount) in &balances {
            let free = number(NAME, "balance", amount)?;
            if let Some(coin) = self.ctx.shared.constraints.coin_by_symbol(NAME, symbol) {
                out.push((coin, free));
            }
        }
        Ok(out)
    }

    async fn limit_order(&self, side: OrderSide, pair: &Pair, quantity: Decimal, rate: Decimal) -> Result<Order> {
        self.signer()?;
        let symbol = self.ctx.pair_symbol(NAME, pair)?;
        let (result, body): (AddOrderResult, _) = self
            .private(
                "LimitOrder",
                "/private/AddOrder",
                params(json!({
                    "pair": symbol,
                    "type": side.as_wire(),
                    "ordertype": "limit",
                    "price": rate.to_string(),
                    "volume": quantity.to_string(),
                })),
            )
            .await?;

        let txid = result.txid.into_iter().next().ok_or_else(|| ExchangeError::Malformed {
            exchange: NAME,
            operation: "LimitOrder",
            reason: "response carries no txid".into(),
        })?;

        info!(exchange = NAME, order_id = %txid, pair = %pair, side = %side, %quantity, %rate, "Order placed");
        Ok(Order::placed(OrderId::new(txid), pair.clone(), side, rate, quantity, body))
    }
}

/// Unwrap the `{"error", "result"}` envelope. A non-empty error list is a
/// rejection; a missing result is malformed.
fn open_envelope<T: DeserializeOwned>(operation: &'static str, body: &str) -> Result<T> {
    let envelope: Envelope<T> = decode(NAME, operation, body)?;
    if !envelope.error.is_empty() {
        return Err(ExchangeError::Rejected {
            exchange: NAME,
            operation,
            message: envelope.error.join(", "),
        }
        .into());
    }
    envelope.result.ok_or_else(|| {
        ExchangeError::Malformed {
            exchange: NAME,
            operation,
            reason: "envelope carries no result".into(),
        }
        .into()
    })
}

/// Fee of the lowest-volume tier, converted from percent to a fraction.
fn first_tier_fee(tiers: &[Vec<Value>]) -> Option<Decimal> {
    let percent = parse_decimal(&value_text(tiers.first()?.get(1)?)?)?;
    Some(percent / HUNDRED)
}

fn venue_state(status: &str) -> VenueState {
    match status {
        "pending" | "open" => VenueState::Live,
        "closed" => VenueState::Done,
        "canceled" => VenueState::Cancelled,
        _ => VenueState::Unrecognized,
    }
}

fn fill_report(info: &OrderInfo) -> Result<FillReport> {
    let volume = number(NAME, "vol", &info.vol)?;
    let executed = number(NAME, "vol_exec", &info.vol_exec)?;
    Ok(FillReport {
        state: venue_state(&info.status),
        remaining: volume - executed,
        executed,
        average_rate: parse_decimal(&info.price).filter(|r| !r.is_zero()),
    })
}

fn is_unknown_order(e: &crate::error::Error) -> bool {
    matches!(
        e.as_exchange(),
        Some(ExchangeError::Rejected { message, .. }) if message.contains("Unknown order")
    )
}

#[async_trait]
impl Exchange for KrakenClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source(&self) -> SourceMode {
        self.ctx.source
    }

    async fn get_coins_data(&self) {
        match self.sync_coins().await {
            Ok(count) => info!(exchange = NAME, count, "Coins synced"),
            Err(e) => warn!(exchange = NAME, error = %e, "Coin sync failed"),
        }
    }

    async fn get_pairs_data(&self) {
        match self.sync_pairs().await {
            Ok(count) => info!(exchange = NAME, count, "Pairs synced"),
            Err(e) => warn!(exchange = NAME, error = %e, "Pair sync failed"),
        }
    }

    async fn order_book(&self, pair: &Pair) -> Result<Maker> {
        let symbol = self.ctx.pair_symbol(NAME, pair)?;
        let worker_ip = self.ctx.worker_ip().await;
        let url = format!("{}/public/Depth", self.base_url);
        let request = Request::get(&url, &[("pair", symbol.as_str()), ("count", DEPTH_COUNT)]);
        let timed = self.ctx.timed_send(request).await?;

        let depth: Depth = open_envelope("OrderBook", &timed.body)?;
        let book = depth.into_values().next().ok_or_else(|| ExchangeError::Malformed {
            exchange: NAME,
            operation: "OrderBook",
            reason: format!("no depth entry for {symbol}"),
        })?;
        let (bids, asks) = book.to_levels(NAME)?;

        Ok(Maker::new(bids, asks, timed.before, timed.after, worker_ip))
    }

    async fn update_all_balances(&self) {
        if self.signer.is_none() {
            warn!(exchange = NAME, "API key or secret key is missing, skipping balance update");
            return;
        }
        match self.fetch_balances().await {
            Ok(balances) => {
                for (coin, free) in &balances {
                    self.ctx.shared.balances.set(coin.code(), *free);
                }
                debug!(exchange = NAME, count = balances.len(), "Balances updated");
            }
            Err(e) => warn!(exchange = NAME, error = %e, "Balance update failed"),
        }
    }

    async fn limit_buy(&self, pair: &Pair, quantity: Decimal, rate: Decimal) -> Result<Order> {
        self.limit_order(OrderSide::Buy, pair, quantity, rate).await
    }

    async fn limit_sell(&self, pair: &Pair, quantity: Decimal, rate: Decimal) -> Result<Order> {
        self.limit_order(OrderSide::Sell, pair, quantity, rate).await
    }

    async fn order_status(&self, order: &mut Order) -> Result<()> {
        self.signer()?;
        let id = order.require_id()?.to_string();
        let not_found = || ExchangeError::OrderNotFound {
            exchange: NAME,
            order_id: id.clone(),
        };

        let (orders, body): (QueryOrders, _) = match self
            .private("OrderStatus", "/private/QueryOrders", params(json!({ "txid": id })))
            .await
        {
            Err(e) if is_unknown_order(&e) => return Err(not_found().into()),
            other => other?,
        };
        let info = orders.get(&id).ok_or_else(not_found)?;

        let report = fill_report(info)?;
        let status = order.apply_report(&report)?;
        order.status_message = Some(body);
        debug!(exchange = NAME, order_id = %id, status = %status, "Order status refreshed");
        Ok(())
    }

    async fn cancel_order(&self, order: &mut Order) -> Result<()> {
        self.signer()?;
        let id = order.require_id()?.to_string();
        let (result, body): (CancelResult, _) = self
            .private("CancelOrder", "/private/CancelOrder", params(json!({ "txid": id })))
            .await?;

        if result.count == 0 && !result.pending {
            return Err(ExchangeError::Rejected {
                exchange: NAME,
                operation: "CancelOrder",
                message: "no order cancelled".into(),
            }
            .into());
        }
        order.mark_canceling(body)?;
        info!(exchange = NAME, order_id = %id, "Cancel requested");
        Ok(())
    }

    async fn withdraw(&self, coin: &Coin, quantity: Decimal, _address: &str, _tag: &str) -> bool {
        debug!(exchange = NAME, coin = %coin, %quantity, "Withdrawals are not supported");
        false
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        Err(ExchangeError::Unsupported {
            exchange: NAME,
            operation: "ListOrders",
        }
        .into())
    }

    async fn cancel_all_orders(&self) -> Result<()> {
        Err(ExchangeError::Unsupported {
            exchange: NAME,
            operation: "CancelAllOrders",
        }
        .into())
    }
}
