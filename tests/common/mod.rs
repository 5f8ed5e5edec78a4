// Common test utilities and helpers

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::time::Duration;

use swing_trading_bot::{
    Account, ExchangeGateway, OrderOutcome, OrderRequest, Ticker, TradeConfig, TradingError,
    TradingResult,
};

/// Trade configuration with the default percentages and a tolerance
/// band wide enough for the scripted prices
pub fn create_test_trade_config() -> TradeConfig {
    TradeConfig {
        product_id: "BTC-GBP".to_string(),
        trading_currency: "GBP".to_string(),
        crypto_currency: "BTC".to_string(),
        interval_ms: 10,
        percent_of_available: dec!(25),
        dip_percent: dec!(2),
        up_trend_percent: dec!(2),
        stop_loss_percent: dec!(2.5),
        profit_percent: dec!(5),
        price_range: dec!(0.5),
        minimum_starting_balance: dec!(5),
        price_decimals: 3,
    }
}

pub fn account(currency: &str, available: Decimal) -> Account {
    Account {
        id: format!("{}-account", currency.to_lowercase()),
        currency: currency.to_string(),
        available,
        hold: Decimal::ZERO,
    }
}

/// Starting balances for most session tests: funded trading account,
/// empty crypto account
pub fn starting_accounts() -> Vec<Account> {
    vec![account("GBP", dec!(500)), account("BTC", Decimal::ZERO)]
}

/// Scripted exchange double. Ticker prices are consumed from a queue
/// (the last one repeats); each filled order swaps in the next queued
/// account set, standing in for the exchange settling the trade.
pub struct MockGateway {
    prices: Mutex<VecDeque<Decimal>>,
    accounts: Mutex<Vec<Account>>,
    accounts_after_fill: Mutex<VecDeque<Vec<Account>>>,
    order_outcomes: Mutex<VecDeque<TradingResult<OrderOutcome>>>,
    submitted: Mutex<Vec<OrderRequest>>,
    failing_refreshes: Mutex<u32>,
    ticker_delay: Option<Duration>,
}

impl MockGateway {
    pub fn new(accounts: Vec<Account>, opening_price: Decimal) -> Self {
        Self {
            prices: Mutex::new(VecDeque::from([opening_price])),
            accounts: Mutex::new(accounts),
            accounts_after_fill: Mutex::new(VecDeque::new()),
            order_outcomes: Mutex::new(VecDeque::new()),
            submitted: Mutex::new(Vec::new()),
            failing_refreshes: Mutex::new(0),
            ticker_delay: None,
        }
    }

    /// Stall every ticker fetch, keeping an evaluation in flight long
    /// enough for reentrancy tests
    pub fn with_ticker_delay(mut self, delay: Duration) -> Self {
        self.ticker_delay = Some(delay);
        self
    }

    pub fn push_price(&self, price: Decimal) {
        self.prices.lock().unwrap().push_back(price);
    }

    /// Queue the outcome for the next order submission; unqueued
    /// submissions fill with no reported execution price
    pub fn queue_order_outcome(&self, outcome: TradingResult<OrderOutcome>) {
        self.order_outcomes.lock().unwrap().push_back(outcome);
    }

    /// Queue the account balances the exchange reports after the next
    /// filled order
    pub fn queue_accounts_after_fill(&self, accounts: Vec<Account>) {
        self.accounts_after_fill.lock().unwrap().push_back(accounts);
    }

    /// Make the next `count` balance listings fail at transport level
    pub fn fail_next_refreshes(&self, count: u32) {
        *self.failing_refreshes.lock().unwrap() = count;
    }

    pub fn submitted_orders(&self) -> Vec<OrderRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExchangeGateway for MockGateway {
    async fn ticker(&self, _product_id: &str) -> TradingResult<Ticker> {
        if let Some(delay) = self.ticker_delay {
            tokio::time::sleep(delay).await;
        }

        let mut prices = self.prices.lock().unwrap();
        let price = if prices.len() > 1 {
            prices.pop_front().expect("queue checked non-empty")
        } else {
            *prices.front().expect("mock gateway has no scripted price")
        };

        Ok(Ticker {
            price,
            time: Utc::now(),
        })
    }

    async fn list_accounts(&self) -> TradingResult<Vec<Account>> {
        {
            let mut failing = self.failing_refreshes.lock().unwrap();
            if *failing > 0 {
                *failing -= 1;
                return Err(TradingError::ApiConnection(
                    "scripted refresh failure".to_string(),
                ));
            }
        }

        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn get_account(&self, id: &str) -> TradingResult<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|account| account.id == id)
            .cloned()
            .ok_or_else(|| TradingError::AccountNotFound(id.to_string()))
    }

    async fn submit_order(&self, request: &OrderRequest) -> TradingResult<OrderOutcome> {
        self.submitted.lock().unwrap().push(request.clone());

        let outcome = self
            .order_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(OrderOutcome {
                filled: true,
                fill_price: None,
            }));

        if let Ok(outcome) = &outcome {
            if outcome.filled {
                if let Some(next) = self.accounts_after_fill.lock().unwrap().pop_front() {
                    *self.accounts.lock().unwrap() = next;
                }
            }
        }

        outcome
    }
}
