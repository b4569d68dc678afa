//! Bitfinex REST client implementing [`Exchange`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, info, warn};

use super::types::{AccountFees, ApiMessage, Balance, ConfMap, OrderBook, OrderResponse, SymbolDetail};
use super::{API_URL, COIN_DEFAULTS, DEFAULT_LOT_SIZE, DEFAULT_MAKER_FEE, DEFAULT_TAKER_FEE, NAME, QUOTES};
use crate::domain::symbol::split_concatenated;
use crate::domain::{Coin, FillReport, Maker, Order, OrderId, OrderSide, Pair, PairConstraint, VenueState};
use crate::error::{ExchangeError, Result};
use crate::exchange::normalize::{
    decode, number, parse_decimal, step_from_decimals, text_levels, value_text,
};
use crate::exchange::signing::{params, Params};
use crate::exchange::{AdapterContext, Exchange, Method, Request, Signer, SigningScheme, SourceMode};

/// Currency maps fetched during coin discovery. The first maps exchange
/// symbols to display codes, the second exchange symbols to names.
const CONF_SYMBOLS: &str = "pub:map:currency:sym";
const CONF_LABELS: &str = "pub:map:currency:label";

/// Header-HMAC signing as Bitfinex's v1 API expects it.
pub const SCHEME: SigningScheme = SigningScheme::HeaderHmac {
    key_header: "X-BFX-APIKEY",
    payload_header: "X-BFX-PAYLOAD",
    signature_header: "X-BFX-SIGNATURE",
};

/// Bitfinex adapter.
pub struct BitfinexClient {
    ctx: AdapterContext,
    base_url: String,
    signer: Option<Signer>,
}

impl BitfinexClient {
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

    async fn public(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        self.ctx.transport.send(Request::get(&url, &[])).await
    }

    /// Signed POST. Bitfinex error bodies (`{"message": ...}`) become
    /// `Rejected`.
    async fn private(&self, operation: &'static str, path: &str, params: Params) -> Result<String> {
        let request = self.signer()?.sign(Method::Post, &self.base_url, path, params)?;
        let body = self.ctx.transport.send(request).await?;
        if let Some(message) = rejection(&body) {
            return Err(ExchangeError::Rejected {
                exchange: NAME,
                operation,
                message,
            }
            .into());
        }
        Ok(body)
    }

    fn coin_for_symbol(&self, symbol: &str) -> Option<Coin> {
        let shared = &self.ctx.shared;
        shared
            .constraints
            .coin_by_symbol(NAME, symbol)
            .or_else(|| match self.ctx.source {
                SourceMode::ExchangeApi => shared.registry.lookup_coin(symbol),
                SourceMode::JsonFile => None,
            })
    }

    fn set_coin(&self, coin: Coin, ex_symbol: &str) {
        self.ctx
            .shared
            .constraints
            .list_coin(NAME, coin, ex_symbol, &COIN_DEFAULTS);
    }

    async fn fetch_conf(&self, field: &str) -> Result<ConfMap> {
        let body = self.public(&format!("/v2/conf/{field}")).await?;
        Ok(decode(NAME, "GetCoinsData", &body)?)
    }

    async fn sync_coins(&self) -> Result<usize> {
        let mut seen = 0;

        // Display codes first: `ALG` trades as `ALGO`, `UST` as `USDT`.
        for entry in self.fetch_conf(CONF_SYMBOLS).await?.into_iter().flatten() {
            let [ex_symbol, code, ..] = entry.as_slice() else {
                continue;
            };
            let coin = match self.ctx.source {
                SourceMode::ExchangeApi => Some(self.ctx.shared.registry.register_coin(code, "")),
                SourceMode::JsonFile => self.ctx.shared.constraints.coin_by_symbol(NAME, ex_symbol),
            };
            if let Some(coin) = coin {
                self.set_coin(coin, ex_symbol);
                seen += 1;
            }
        }

        for entry in self.fetch_conf(CONF_LABELS).await?.into_iter().flatten() {
            let [ex_symbol, name, ..] = entry.as_slice() else {
                continue;
            };
            let coin = match self.ctx.source {
                SourceMode::ExchangeApi => self
                    .ctx
                    .shared
                    .constraints
                    .coin_by_symbol(NAME, ex_symbol)
                    .unwrap_or_else(|| self.ctx.shared.registry.register_coin(ex_symbol, name)),
                SourceMode::JsonFile => match self.ctx.shared.constraints.coin_by_symbol(NAME, ex_symbol) {
                    Some(coin) => coin,
                    None => continue,
                },
            };
            self.set_coin(coin, ex_symbol);
            seen += 1;
        }

        Ok(seen)
    }

    /// Overwrite `tx_fee` for every known coin that has a withdraw fee.
    /// Needs credentials; skipped without them.
    async fn sync_withdraw_fees(&self) -> Result<usize> {
        if self.signer.is_none() {
            warn!(exchange = NAME, "API key or secret key is missing, keeping default withdraw fees");
            return Ok(0);
        }
        let body = self.private("GetCoinsData", "/v1/account_fees", Params::new()).await?;
        let fees: AccountFees = decode(NAME, "GetCoinsData", &body)?;

        let mut updated = 0;
        for (symbol, value) in &fees.withdraw {
            let Some(fee) = value_text(value).as_deref().and_then(parse_decimal) else {
                warn!(exchange = NAME, symbol = %symbol, value = %value, "Unparsable withdraw fee");
                continue;
            };
            let Some(coin) = self.ctx.shared.constraints.coin_by_symbol(NAME, symbol) else {
                continue;
            };
            if self
                .ctx
                .shared
                .constraints
                .update_coin(NAME, &coin, |c| c.tx_fee = fee)
            {
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn sync_pairs(&self) -> Result<usize> {
        let body = self.public("/v1/symbols_details").await?;
        let details: Vec<SymbolDetail> = decode(NAME, "GetPairsData", &body)?;

        let mut listed = 0;
        for detail in &details {
            let pair = match self.ctx.source {
                SourceMode::ExchangeApi => {
                    let Some((base, quote)) = split_concatenated(&detail.pair, QUOTES) else {
                        debug!(exchange = NAME, symbol = %detail.pair, "No known quote suffix");
                        continue;
                    };
                    let (Some(base), Some(quote)) =
                        (self.coin_for_symbol(base), self.coin_for_symbol(quote))
                    else {
                        debug!(exchange = NAME, symbol = %detail.pair, "Pair coins not registered");
                        continue;
                    };
                    self.ctx.shared.registry.register_pair(&base, &quote)
                }
                SourceMode::JsonFile => match self.ctx.shared.constraints.pair_by_symbol(NAME, &detail.pair) {
                    Some(pair) => pair,
                    None => continue,
                },
            };

            let constraints = &self.ctx.shared.constraints;
            let (maker_fee, taker_fee, lot_size) = constraints
                .pair(NAME, &pair)
                .map_or((DEFAULT_MAKER_FEE, DEFAULT_TAKER_FEE, DEFAULT_LOT_SIZE), |c| {
                    (c.maker_fee, c.taker_fee, c.lot_size)
                });
            constraints.set_pair(
                NAME,
                PairConstraint {
                    pair,
                    ex_symbol: detail.pair.clone(),
                    maker_fee,
                    taker_fee,
                    lot_size,
                    price_filter: step_from_decimals(detail.price_precision),
                    listed: true,
                },
            );
            listed += 1;
        }
        Ok(listed)
    }

    async fn fetch_balances(&self) -> Result<Vec<(Coin, Decimal)>> {
        let body = self.private("UpdateAllBalances", "/v1/balances", Params::new()).await?;
        let balances: Vec<Balance> = decode(NAME, "UpdateAllBalances", &body)?;

        let mut out = Vec::new();
        for balance in balances.iter().filter(|b| b.wallet == "exchange") {
            let free = number(NAME, "available", &balance.available)?;
            if let Some(coin) = self.ctx.shared.constraints.coin_by_symbol(NAME, &balance.currency) {
                out.push((coin, free));
            }
        }
        Ok(out)
    }

    async fn limit_order(&self, side: OrderSide, pair: &Pair, quantity: Decimal, rate: Decimal) -> Result<Order> {
        self.signer()?;
        let symbol = self.ctx.pair_symbol(NAME, pair)?;
        let body = self
            .private(
                "LimitOrder",
                "/v1/order/new",
                params(json!({
                    "symbol": symbol,
                    "amount": quantity.to_string(),
                    "price": rate.to_string(),
                    "side": side.as_wire(),
                    "type": "exchange limit",
                })),
            )
            .await?;

        let response: OrderResponse = decode(NAME, "LimitOrder", &body)?;
        let id = response.order_id().ok_or_else(|| ExchangeError::Malformed {
            exchange: NAME,
            operation: "LimitOrder",
            reason: "response carries no order id".into(),
        })?;

        info!(exchange = NAME, order_id = id, pair = %pair, side = %side, %quantity, %rate, "Order placed");
        Ok(Order::placed(OrderId::new(id.to_string()), pair.clone(), side, rate, quantity, body))
    }

    fn numeric_id(order: &Order) -> Result<u64> {
        let id = order.require_id()?;
        id.as_str().parse().map_err(|_| {
            ExchangeError::OrderNotFound {
                exchange: NAME,
                order_id: id.to_string(),
            }
            .into()
        })
    }
}

/// The `message` of a Bitfinex error body.
fn rejection(body: &str) -> Option<String> {
    serde_json::from_str::<ApiMessage>(body).ok().map(|m| m.message)
}

fn venue_state(response: &OrderResponse) -> VenueState {
    if response.is_cancelled {
        VenueState::Cancelled
    } else if response.is_live {
        VenueState::Live
    } else {
        VenueState::Done
    }
}

#[async_trait]
impl Exchange for BitfinexClient {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source(&self) -> SourceMode {
        self.ctx.source
    }

    async fn get_coins_data(&self) {
        match self.sync_coins().await {
            Ok(count) => info!(exchange = NAME, count, "Coins synced"),
            Err(e) => {
                warn!(exchange = NAME, error = %e, "Coin sync failed");
                return;
            }
        }
        match self.sync_withdraw_fees().await {
            Ok(count) => debug!(exchange = NAME, count, "Withdraw fees updated"),
            Err(e) => warn!(exchange = NAME, error = %e, "Withdraw fee sync failed"),
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
        let url = format!("{}/v1/book/{}", self.base_url, symbol);
        let timed = self.ctx.timed_send(Request::get(&url, &[])).await?;

        if let Some(message) = rejection(&timed.body) {
            return Err(ExchangeError::Rejected {
                exchange: NAME,
                operation: "OrderBook",
                message,
            }
            .into());
        }
        let book: OrderBook = decode(NAME, "OrderBook", &timed.body)?;
        let bids = text_levels(NAME, book.bids.iter().map(|e| (e.price.as_str(), e.amount.as_str())))?;
        let asks = text_levels(NAME, book.asks.iter().map(|e| (e.price.as_str(), e.amount.as_str())))?;

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
        let id = Self::numeric_id(order)?;
        let body = self
            .private("OrderStatus", "/v1/order/status", params(json!({ "order_id": id })))
            .await
            .map_err(|e| match e.as_exchange() {
                Some(ExchangeError::Rejected { message, .. })
                    if message.to_ascii_lowercase().contains("no such order") =>
                {
                    ExchangeError::OrderNotFound {
                        exchange: NAME,
                        order_id: id.to_string(),
                    }
                    .into()
                }
                _ => e,
            })?;

        let response: OrderResponse = decode(NAME, "OrderStatus", &body)?;
        if response.order_id().is_none() {
            return Err(ExchangeError::OrderNotFound {
                exchange: NAME,
                order_id: id.to_string(),
            }
            .into());
        }

        let report = FillReport {
            state: venue_state(&response),
            remaining: number(NAME, "remaining_amount", &response.remaining_amount)?,
            executed: number(NAME, "executed_amount", &response.executed_amount)?,
            average_rate: parse_decimal(&response.avg_execution_price).filter(|r| !r.is_zero()),
        };
        let status = order.apply_report(&report)?;
        order.status_message = Some(body);
        debug!(exchange = NAME, order_id = id, status = %status, "Order status refreshed");
        Ok(())
    }

    async fn cancel_order(&self, order: &mut Order) -> Result<()> {
        self.signer()?;
        let id = Self::numeric_id(order)?;
        let body = self
            .private("CancelOrder", "/v1/order/cancel", params(json!({ "order_id": id })))
            .await?;

        let response: OrderResponse = decode(NAME, "CancelOrder", &body)?;
        if response.order_id().is_none() {
            return Err(ExchangeError::Rejected {
                exchange: NAME,
                operation: "CancelOrder",
                message: "cancel not acknowledged".into(),
            }
            .into());
        }
        order.mark_canceling(body)?;
        info!(exchange = NAME, order_id = id, "Cancel requested");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_reads_message_bodies_only() {
        assert_eq!(rejection(r#"{"message":"Unknown symbol"}"#).as_deref(), Some("Unknown symbol"));
        assert_eq!(rejection(r#"{"id":1,"is_live":true}"#), None);
        assert_eq!(rejection("[]"), None);
    }

    #[test]
    fn cancelled_flag_wins_over_live() {
        let response: OrderResponse =
            serde_json::from_str(r#"{"id":5,"is_live":true,"is_cancelled":true}"#).unwrap();
        assert_eq!(venue_state(&response), VenueState::Cancelled);
    }

    #[test]
    fn order_id_prefers_order_id_field_and_ignores_zero() {
        let both: OrderResponse = serde_json::from_str(r#"{"id":1,"order_id":2}"#).unwrap();
        assert_eq!(both.order_id(), Some(2));
        let zero: OrderResponse = serde_json::from_str(r#"{"id":0}"#).unwrap();
        assert_eq!(zero.order_id(), None);
    }
}
