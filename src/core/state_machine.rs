// Two-state trading decision engine
//
// Holds the current cycle state, the anchor price and the threshold set
// derived from it. `observe_price` is the only decision entry point and
// never performs I/O; the session owns order submission and reports the
// outcome back through the fill callbacks, which are the only state
// transitions.

use rust_decimal::Decimal;
use tracing::info;

use crate::core::thresholds::{ThresholdCalculator, ThresholdSet};
use crate::core::types::{TradeSignal, TradingState};

#[derive(Debug)]
pub struct SwingTrader {
    calculator: ThresholdCalculator,
    price_range: Decimal,
    state: TradingState,
    anchor_price: Decimal,
    thresholds: ThresholdSet,
    buy_price: Option<Decimal>,
    // Set after a SELL fill: the next observed price becomes the new
    // anchor and is not traded on, mirroring session start
    reanchor_pending: bool,
}

impl SwingTrader {
    /// Construct at session start, anchored on the opening market price
    pub fn new(calculator: ThresholdCalculator, price_range: Decimal, opening_price: Decimal) -> Self {
        let thresholds = calculator.compute(opening_price);
        Self {
            calculator,
            price_range,
            state: TradingState::AwaitingBuy,
            anchor_price: opening_price,
            thresholds,
            buy_price: None,
            reanchor_pending: false,
        }
    }

    /// Evaluate one price observation and decide whether to trade.
    ///
    /// Band precedence is deterministic: dip before upward trend while
    /// awaiting a BUY, profit before stop loss while awaiting a SELL.
    /// At most one signal per observation; state never changes here.
    pub fn observe_price(&mut self, price: Decimal) -> TradeSignal {
        if self.reanchor_pending {
            self.reanchor(price);
            return TradeSignal::Hold;
        }

        match self.state {
            TradingState::AwaitingBuy => {
                if self.within_band(self.thresholds.dip, price)
                    || self.within_band(self.thresholds.upward_trend, price)
                {
                    TradeSignal::Buy
                } else {
                    TradeSignal::Hold
                }
            }
            TradingState::AwaitingSell => {
                if self.within_band(self.thresholds.profit, price)
                    || self.within_band(self.thresholds.stop_loss, price)
                {
                    TradeSignal::Sell
                } else {
                    TradeSignal::Hold
                }
            }
        }
    }

    /// A BUY filled: hold the asset, re-anchor thresholds at the fill price
    pub fn on_buy_filled(&mut self, fill_price: Decimal) {
        self.state = TradingState::AwaitingSell;
        self.buy_price = Some(fill_price);
        self.anchor_price = fill_price;
        self.thresholds = self.calculator.compute(fill_price);
        info!(
            "BUY filled at {}: selling at {} (profit) or {} (stop loss)",
            fill_price, self.thresholds.profit, self.thresholds.stop_loss
        );
    }

    /// A SELL filled: back to the BUY side. The next cycle is a fresh
    /// search, so the anchor is the next observed market price rather
    /// than the sell price.
    pub fn on_sell_filled(&mut self) {
        self.state = TradingState::AwaitingBuy;
        self.buy_price = None;
        self.reanchor_pending = true;
    }

    fn reanchor(&mut self, price: Decimal) {
        self.anchor_price = price;
        self.thresholds = self.calculator.compute(price);
        self.reanchor_pending = false;
        info!(
            "re-anchored at {}: buying at {} (dip) or {} (upward trend)",
            price, self.thresholds.dip, self.thresholds.upward_trend
        );
    }

    // Symmetric tolerance band: t - range <= p <= t + range
    fn within_band(&self, threshold: Decimal, price: Decimal) -> bool {
        price >= threshold - self.price_range && price <= threshold + self.price_range
    }

    pub fn state(&self) -> TradingState {
        self.state
    }

    pub fn thresholds(&self) -> ThresholdSet {
        self.thresholds
    }

    pub fn anchor_price(&self) -> Decimal {
        self.anchor_price
    }

    pub fn buy_price(&self) -> Option<Decimal> {
        self.buy_price
    }

    pub fn reanchor_pending(&self) -> bool {
        self.reanchor_pending
    }
}
