// Exchange client implementations and the gateway seam

pub mod coinbase_rest;
pub mod coinbase_ws;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TradingResult;

pub use coinbase_rest::CoinbaseRestClient;
pub use coinbase_ws::{CoinbaseFeedClient, TickerEvent};

/// Last-trade price for a product
#[derive(Debug, Clone)]
pub struct Ticker {
    pub price: Decimal,
    pub time: DateTime<Utc>,
}

/// Exchange account balance snapshot. Superseded wholesale by the next
/// fetch, never patched incrementally.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    pub currency: String,
    pub available: Decimal,
    pub hold: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A market order submission. `client_oid` is an idempotency key: a fresh
/// UUID per submission attempt, retries included, so the exchange can
/// deduplicate without this ever serving as a business identifier.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub client_oid: Uuid,
    pub product_id: String,
    pub side: OrderSide,
    /// Quote-currency amount to spend (BUY orders)
    pub funds: Option<Decimal>,
    /// Base-currency size to sell (SELL orders)
    pub size: Option<Decimal>,
}

impl OrderRequest {
    pub fn market_buy(product_id: &str, funds: Decimal) -> Self {
        Self {
            client_oid: Uuid::new_v4(),
            product_id: product_id.to_string(),
            side: OrderSide::Buy,
            funds: Some(funds),
            size: None,
        }
    }

    pub fn market_sell(product_id: &str, size: Decimal) -> Self {
        Self {
            client_oid: Uuid::new_v4(),
            product_id: product_id.to_string(),
            side: OrderSide::Sell,
            funds: None,
            size: Some(size),
        }
    }
}

/// Result of an order submission. Ordinary rejections (insufficient
/// funds, size below product minimum) come back as `filled: false`;
/// only transport-level faults surface as errors.
#[derive(Debug, Clone)]
pub struct OrderOutcome {
    pub filled: bool,
    pub fill_price: Option<Decimal>,
}

impl OrderOutcome {
    pub fn rejected() -> Self {
        Self {
            filled: false,
            fill_price: None,
        }
    }
}

/// The exchange surface the trading core depends on. Implementations are
/// stateless with respect to trading decisions and safe to call from a
/// read-only monitor concurrently with the session.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Fetch the current last-trade price for a product
    async fn ticker(&self, product_id: &str) -> TradingResult<Ticker>;

    /// List all account balances
    async fn list_accounts(&self) -> TradingResult<Vec<Account>>;

    /// Fetch a single account by id
    async fn get_account(&self, id: &str) -> TradingResult<Account>;

    /// Submit a market order
    async fn submit_order(&self, request: &OrderRequest) -> TradingResult<OrderOutcome>;
}

#[async_trait]
impl<G: ExchangeGateway + ?Sized> ExchangeGateway for std::sync::Arc<G> {
    async fn ticker(&self, product_id: &str) -> TradingResult<Ticker> {
        (**self).ticker(product_id).await
    }

    async fn list_accounts(&self) -> TradingResult<Vec<Account>> {
        (**self).list_accounts().await
    }

    async fn get_account(&self, id: &str) -> TradingResult<Account> {
        (**self).get_account(id).await
    }

    async fn submit_order(&self, request: &OrderRequest) -> TradingResult<OrderOutcome> {
        (**self).submit_order(request).await
    }
}
