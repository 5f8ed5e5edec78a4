// Trading session: scheduler, evaluation glue and the reentrancy guard
//
// One session owns the gateway, state machine, account tracker and
// earnings ledger behind a single async mutex. The scheduler fires
// `tick` at a fixed interval; a tick that arrives while an evaluation
// (including its order submission and balance refresh) is still in
// flight takes the try_lock miss and is skipped, never queued.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::clients::{ExchangeGateway, OrderRequest};
use crate::config::TradeConfig;
use crate::core::accounts::AccountTracker;
use crate::core::earnings::EarningsLedger;
use crate::core::state_machine::SwingTrader;
use crate::core::thresholds::{ThresholdCalculator, ThresholdSet};
use crate::core::types::{TradeSignal, TradingState};
use crate::error::{TradingError, TradingResult};

/// What a single scheduler tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// An evaluation was already in flight
    Skipped,
    /// No band matched, or a recoverable fault deferred the evaluation
    Held,
    /// The observation became the new anchor after a completed cycle
    Anchored,
    Bought,
    BuyRejected,
    Sold,
    SellRejected,
}

/// Read-only view of the session published after every evaluation.
/// Observers receive it through a watch channel and can never reach the
/// trading state itself.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: TradingState,
    pub thresholds: ThresholdSet,
    pub anchor_price: Decimal,
    pub buy_price: Option<Decimal>,
    pub last_price: Option<Decimal>,
    pub trading_available: Decimal,
    pub crypto_available: Decimal,
    pub initial_funds: Decimal,
    pub total_earnings: Decimal,
    pub cycles_completed: u32,
    pub updated_at: DateTime<Utc>,
}

pub struct TradingSession<G> {
    inner: Arc<Mutex<SessionInner<G>>>,
    interval: Duration,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

struct SessionInner<G> {
    gateway: G,
    trade: TradeConfig,
    trader: SwingTrader,
    accounts: AccountTracker,
    ledger: EarningsLedger,
    // A SELL filled but its realized delta is not yet recorded; settled
    // on the next successful balance refresh
    settlement_due: bool,
    last_price: Option<Decimal>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<G: ExchangeGateway> TradingSession<G> {
    /// Establish a session: fetch balances, verify the account
    /// preconditions and anchor the first threshold set on the opening
    /// market price. Every failure here aborts the session.
    pub async fn start(gateway: G, trade: TradeConfig) -> TradingResult<Self> {
        let mut accounts = AccountTracker::new(
            &trade.trading_currency,
            &trade.crypto_currency,
            trade.percent_of_available,
            trade.price_decimals,
        );
        accounts.refresh(&gateway).await?;

        let available = accounts.trading_available();
        if available < trade.minimum_starting_balance {
            return Err(TradingError::InsufficientStartingBalance {
                required: trade.minimum_starting_balance,
                available,
            });
        }

        let opening = gateway.ticker(&trade.product_id).await?;
        info!("opening price for {}: {}", trade.product_id, opening.price);

        let calculator = ThresholdCalculator::from_config(&trade);
        let trader = SwingTrader::new(calculator, trade.price_range, opening.price);
        let ledger = EarningsLedger::new(available);

        let thresholds = trader.thresholds();
        info!(
            "session ready: buying at {} (dip) or {} (upward trend), {} +/- tolerance",
            thresholds.dip, thresholds.upward_trend, trade.price_range
        );

        let interval = Duration::from_millis(trade.interval_ms);
        let snapshot = SessionSnapshot {
            state: trader.state(),
            thresholds,
            anchor_price: trader.anchor_price(),
            buy_price: None,
            last_price: None,
            trading_available: available,
            crypto_available: accounts.crypto_available(),
            initial_funds: ledger.initial_funds(),
            total_earnings: ledger.total(),
            cycles_completed: 0,
            updated_at: Utc::now(),
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(snapshot);

        Ok(Self {
            inner: Arc::new(Mutex::new(SessionInner {
                gateway,
                trade,
                trader,
                accounts,
                ledger,
                settlement_due: false,
                last_price: None,
                snapshot_tx,
            })),
            interval,
            snapshot_rx,
        })
    }

    /// Subscribe to the read-only session snapshots
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Run one evaluation, unless one is already in flight
    pub async fn tick(&self) -> TradingResult<TickOutcome> {
        let Ok(mut inner) = self.inner.try_lock() else {
            debug!("evaluation in flight; tick skipped");
            return Ok(TickOutcome::Skipped);
        };
        inner.evaluate_once().await
    }

    /// Drive evaluations at the configured interval until a fatal error.
    /// Recoverable faults are logged and retried on the next tick with
    /// no backoff. Stopping the future stops the scheduler; in-flight
    /// orders are exchange-side commitments and are not cancelled.
    pub async fn run(&self) -> TradingResult<()> {
        let mut ticks = interval(self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticks.tick().await;
            match self.tick().await {
                Ok(outcome) => debug!("tick outcome: {:?}", outcome),
                Err(e) if e.is_fatal() => {
                    error!("fatal {} error, stopping session: {}", e.category(), e);
                    return Err(e);
                }
                Err(e) => warn!("tick failed ({}), retrying next tick: {}", e.category(), e),
            }
        }
    }
}

impl<G: ExchangeGateway> SessionInner<G> {
    async fn evaluate_once(&mut self) -> TradingResult<TickOutcome> {
        let result = self.evaluate_inner().await;
        self.publish_snapshot();
        result
    }

    async fn evaluate_inner(&mut self) -> TradingResult<TickOutcome> {
        // Stale balances must not size orders; catch up before deciding
        // anything. A refresh left stale by an earlier failure lands here
        // on the next tick.
        if self.accounts.is_stale() {
            match self.accounts.refresh(&self.gateway).await {
                Ok(()) => self.settle_if_due(),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("balance refresh failed, holding evaluation: {}", e);
                    return Ok(TickOutcome::Held);
                }
            }
        }

        let price = match self.gateway.ticker(&self.trade.product_id).await {
            Ok(ticker) => ticker.price,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("ticker fetch failed: {}", e);
                return Ok(TickOutcome::Held);
            }
        };
        self.last_price = Some(price);

        let anchoring = self.trader.reanchor_pending();
        match self.trader.observe_price(price) {
            TradeSignal::Hold if anchoring => Ok(TickOutcome::Anchored),
            TradeSignal::Hold => {
                debug!(
                    "{} at {}: next operation {}",
                    self.trade.product_id,
                    price,
                    self.trader.state()
                );
                Ok(TickOutcome::Held)
            }
            TradeSignal::Buy => self.execute_buy(price).await,
            TradeSignal::Sell => self.execute_sell(price).await,
        }
    }

    async fn execute_buy(&mut self, price: Decimal) -> TradingResult<TickOutcome> {
        let funds = self.accounts.fund_amount();
        if funds <= Decimal::ZERO {
            warn!(
                "no available {} to fund a BUY, holding",
                self.trade.trading_currency
            );
            return Ok(TickOutcome::BuyRejected);
        }

        // The balance funding this cycle, captured before the order so
        // the realized delta anchors to it
        let cycle_start = self.accounts.trading_available();

        let request = OrderRequest::market_buy(&self.trade.product_id, funds);
        info!(
            "submitting market BUY of {} {} at observed price {}",
            funds, self.trade.trading_currency, price
        );

        let outcome = match self.gateway.submit_order(&request).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("BUY submission failed, retrying next tick: {}", e);
                return Ok(TickOutcome::BuyRejected);
            }
        };

        if !outcome.filled {
            warn!("BUY order not filled, retrying next tick");
            return Ok(TickOutcome::BuyRejected);
        }

        let fill_price = outcome.fill_price.unwrap_or(price);
        self.ledger.open_cycle(cycle_start);
        self.trader.on_buy_filled(fill_price);
        self.refresh_after_transition().await;
        Ok(TickOutcome::Bought)
    }

    async fn execute_sell(&mut self, price: Decimal) -> TradingResult<TickOutcome> {
        let size = self.accounts.crypto_available();
        if size <= Decimal::ZERO {
            warn!(
                "no {} available to sell, holding",
                self.trade.crypto_currency
            );
            return Ok(TickOutcome::SellRejected);
        }

        let request = OrderRequest::market_sell(&self.trade.product_id, size);
        info!(
            "submitting market SELL of {} {} at observed price {}",
            size, self.trade.crypto_currency, price
        );

        let outcome = match self.gateway.submit_order(&request).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("SELL submission failed, retrying next tick: {}", e);
                return Ok(TickOutcome::SellRejected);
            }
        };

        if !outcome.filled {
            warn!("SELL order not filled, retrying next tick");
            return Ok(TickOutcome::SellRejected);
        }

        // The position is gone regardless of what the refresh below
        // does, so the transition happens first and settlement waits
        // for a fresh balance.
        self.trader.on_sell_filled();
        self.settlement_due = true;
        self.refresh_after_transition().await;
        Ok(TickOutcome::Sold)
    }

    async fn refresh_after_transition(&mut self) {
        match self.accounts.refresh(&self.gateway).await {
            Ok(()) => self.settle_if_due(),
            Err(e) => {
                self.accounts.mark_stale();
                warn!("balance refresh failed after fill, retrying next tick: {}", e);
            }
        }
    }

    fn settle_if_due(&mut self) {
        if !self.settlement_due {
            return;
        }
        if let Some(delta) = self.ledger.settle(self.accounts.trading_available()) {
            info!(
                "cycle closed: realized {} {}, total earnings {} {} over {} cycles",
                delta,
                self.trade.trading_currency,
                self.ledger.total(),
                self.trade.trading_currency,
                self.ledger.cycles_completed()
            );
        }
        self.settlement_due = false;
    }

    fn publish_snapshot(&self) {
        let snapshot = SessionSnapshot {
            state: self.trader.state(),
            thresholds: self.trader.thresholds(),
            anchor_price: self.trader.anchor_price(),
            buy_price: self.trader.buy_price(),
            last_price: self.last_price,
            trading_available: self.accounts.trading_available(),
            crypto_available: self.accounts.crypto_available(),
            initial_funds: self.ledger.initial_funds(),
            total_earnings: self.ledger.total(),
            cycles_completed: self.ledger.cycles_completed(),
            updated_at: Utc::now(),
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}
