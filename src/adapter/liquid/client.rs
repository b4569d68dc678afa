//! Liquid REST client implementing [`Exchange`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::types::{AccountBalance, OrderResponse, PriceLevels, Product};
use super::{API_URL, COIN_DEFAULTS, DEFAULT_LOT_SIZE, DEFAULT_PRICE_FILTER, NAME};
use crate::domain::{Coin, FillReport, Maker, Order, OrderId, OrderSide, Pair, PairConstraint, VenueState};
use crate::error::{ExchangeError, Result};
use crate::exchange::normalize::{decode, number, parse_decimal, raw_levels, value_text};
use crate::exchange::signing::{params, Params};
use crate::exchange::{AdapterContext, Exchange, Method, Request, Signer, SigningScheme, SourceMode};

pub const SCHEME: SigningScheme = SigningScheme::CompactToken {
    auth_header: "X-Quoine-Auth",
    extra_headers: &[("X-Quoine-API-Version", "2")],
};

/// Liquid adapter.
pub struct LiquidClient {
    ctx: AdapterContext,
    base_url: String,
    signer: Option<Signer>,
}

impl LiquidClient {
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

    async fn products(&self, operation: &'static str) -> Result<Vec<Product>> {
        let url = format!("{}/products", self.base_url);
        let body = self.ctx.transport.send(Request::get(&url, &[])).await?;
        Ok(decode(NAME, operation, &body)?)
    }

    async fn private(&self, operation: &'static str, method: Method, path: &str, params: Params) -> Result<String> {
        let request = self.signer()?.sign(method, &self.base_url, path, params)?;
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

    fn resolve_coin(&self, code: &str) -> Option<Coin> {
        match self.ctx.source {
            SourceMode::ExchangeApi => Some(self.ctx.shared.registry.register_coin(code, "")),
            SourceMode::JsonFile => self.ctx.shared.constraints.coin_by_symbol(NAME, code),
        }
    }

    /// Coins come from the product list: both legs of every product.
    async fn sync_coins(&self) -> Result<usize> {
        let products = self.products("GetCoinsData").await?;

        let mut listed = 0;
        for product in &products {
            for code in [&product.quoted_currency, &product.base_currency] {
                if let Some(coin) = self.resolve_coin(code) {
                    self.ctx
                        .shared
                        .constraints
                        .list_coin(NAME, coin, code, &COIN_DEFAULTS);
                    listed += 1;
                }
            }
        }
        Ok(listed)
    }

    async fn sync_pairs(&self) -> Result<usize> {
        let products = self.products("GetPairsData").await?;
        let shared = &self.ctx.shared;

        let mut listed = 0;
        for product in &products {
            let Some(product_id) = value_text(&product.id) else {
                debug!(exchange = NAME, code = %product.currency_pair_code, "Product without id");
                continue;
            };
            let pair = match self.ctx.source {
                SourceMode::ExchangeApi => {
                    let base = shared.constraints.coin_by_symbol(NAME, &product.base_currency);
                    let quote = shared.constraints.coin_by_symbol(NAME, &product.quoted_currency);
                    match (base, quote) {
                        (Some(base), Some(quote)) => shared.registry.register_pair(&base, &quote),
                        _ => {
                            debug!(exchange = NAME, code = %product.currency_pair_code, "Pair coins not registered");
                            continue;
                        }
                    }
                }
                SourceMode::JsonFile => match shared
                    .constraints
                    .pair_by_symbol(NAME, &product_id)
                    .or_else(|| shared.constraints.pair_by_symbol(NAME, &product.currency_pair_code))
                {
                    Some(pair) => pair,
                    None => continue,
                },
            };

            shared.constraints.set_pair(
                NAME,
                PairConstraint {
                    pair,
                    ex_symbol: product_id,
                    maker_fee: product_fee(&product.maker_fee),
                    taker_fee: product_fee(&product.taker_fee),
                    lot_size: DEFAULT_LOT_SIZE,
                    price_filter: DEFAULT_PRICE_FILTER,
                    listed: !product.disabled,
                },
            );
            listed += 1;
        }
        Ok(listed)
    }

    async fn fetch_balances(&self) -> Result<Vec<(Coin, Decimal)>> {
        let body = self
            .private("UpdateAllBalances", Method::Get, "/accounts/balance", Params::new())
            .await?;
        let balances: Vec<AccountBalance> = decode(NAME, "UpdateAllBalances", &body)?;

        let mut out = Vec::new();
        for balance in &balances {
            let free = number(NAME, "balance", &balance.balance)?;
            if let Some(coin) = self.ctx.shared.constraints.coin_by_symbol(NAME, &balance.currency) {
                out.push((coin, free));
            }
        }
        Ok(out)
    }

    async fn limit_order(&self, side: OrderSide, pair: &Pair, quantity: Decimal, rate: Decimal) -> Result<Order> {
        self.signer()?;
        let product_id = self.ctx.pair_symbol(NAME, pair)?;
        let body = self
            .private(
                "LimitOrder",
                Method::Post,
                "/orders/",
                params(json!({
                    "order_type": "limit",
                    "product_id": product_id,
                    "side": side.as_wire(),
                    "quantity": quantity.to_string(),
                    "price": rate.to_string(),
                })),
            )
            .await?;

        let response: OrderResponse = decode(NAME, "LimitOrder", &body)?;
        info!(exchange = NAME, order_id = response.id, pair = %pair, side = %side, %quantity, %rate, "Order placed");
        Ok(Order::placed(
            OrderId::new(response.id.to_string()),
            pair.clone(),
            side,
            rate,
            quantity,
            body,
        ))
    }
}

/// Error text from `{"message": ...}` or `{"errors": {...}}` bodies.
fn rejection(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    if let Some(message) = object.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    object.get("errors").map(Value::to_string)
}

fn is_missing_order(e: &crate::error::Error) -> bool {
    matches!(
        e.as_exchange(),
        Some(ExchangeError::Rejected { message, .. }) if message.to_ascii_lowercase().contains("not found")
    )
}

/// Fee as sent in product data, already a fraction. Zero when absent.
fn product_fee(value: &Value) -> Decimal {
    value_text(value)
        .as_deref()
        .and_then(parse_decimal)
        .unwrap_or(Decimal::ZERO)
}

fn venue_state(status: &str) -> VenueState {
    match status {
        "live" | "partially_filled" => VenueState::Live,
        "filled" => VenueState::Done,
        "cancelled" => VenueState::Cancelled,
        _ => VenueState::Unrecognized,
    }
}

fn fill_report(response: &OrderResponse) -> Result<FillReport> {
    let quantity = number(NAME, "quantity", &response.quantity)?;
    let filled = number(NAME, "filled_quantity", &response.filled_quantity)?;
    Ok(FillReport {
        state: venue_state(&response.status),
        remaining: quantity - filled,
        executed: filled,
        average_rate: value_text(&response.average_price)
            .as_deref()
            .and_then(parse_decimal)
            .filter(|r| !r.is_zero()),
    })
}

#[async_trait]
impl Exchange for LiquidClient {
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
        let product_id = self.ctx.pair_symbol(NAME, pair)?;
        let worker_ip = self.ctx.worker_ip().await;
        let url = format!("{}/products/{}/price_levels", self.base_url, product_id);
        let timed = self.ctx.timed_send(Request::get(&url, &[])).await?;

        if let Some(message) = rejection(&timed.body) {
            return Err(ExchangeError::Rejected {
                exchange: NAME,
                operation: "OrderBook",
                message,
            }
            .into());
        }
        let levels: PriceLevels = decode(NAME, "OrderBook", &timed.body)?;
        let bids = raw_levels(NAME, &levels.buy_price_levels)?;
        let asks = raw_levels(NAME, &levels.sell_price_levels)?;

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

        let body = match self
            .private("OrderStatus", Method::Get, &format!("/orders/{id}"), Params::new())
            .await
        {
            Err(e) if is_missing_order(&e) => return Err(not_found().into()),
            other => other?,
        };

        let response: OrderResponse = decode(NAME, "OrderStatus", &body)?;
        if response.id.to_string() != id {
            return Err(not_found().into());
        }

        let report = fill_report(&response)?;
        let status = order.apply_report(&report)?;
        order.status_message = Some(body);
        debug!(exchange = NAME, order_id = %id, status = %status, "Order status refreshed");
        Ok(())
    }

    async fn cancel_order(&self, order: &mut Order) -> Result<()> {
        self.signer()?;
        let id = order.require_id()?.to_string();
        let body = self
            .private("CancelOrder", Method::Put, &format!("/orders/{id}/cancel"), Params::new())
            .await?;

        decode::<OrderResponse>(NAME, "CancelOrder", &body)?;
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
