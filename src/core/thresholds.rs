// Threshold derivation from an anchor price
//
// Pure decimal arithmetic: repeated percentage math on binary floats
// drifts across cycles and corrupts the long-run earnings total, so
// every price here is a rust_decimal::Decimal rounded exactly once.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::config::TradeConfig;

/// The four target prices derived from one anchor. Always replaced as a
/// whole when the anchor moves, never mutated field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdSet {
    /// Buy when the price has dropped this far below the anchor
    pub dip: Decimal,
    /// Buy when the price has risen this far above the anchor
    pub upward_trend: Decimal,
    /// Sell at a gain
    pub profit: Decimal,
    /// Sell at a bounded loss
    pub stop_loss: Decimal,
}

/// Stateless calculator holding the configured percentages and the
/// product's price precision.
#[derive(Debug, Clone)]
pub struct ThresholdCalculator {
    dip_percent: Decimal,
    up_trend_percent: Decimal,
    stop_loss_percent: Decimal,
    profit_percent: Decimal,
    price_decimals: u32,
}

impl ThresholdCalculator {
    pub fn new(
        dip_percent: Decimal,
        up_trend_percent: Decimal,
        stop_loss_percent: Decimal,
        profit_percent: Decimal,
        price_decimals: u32,
    ) -> Self {
        Self {
            dip_percent,
            up_trend_percent,
            stop_loss_percent,
            profit_percent,
            price_decimals,
        }
    }

    pub fn from_config(trade: &TradeConfig) -> Self {
        Self::new(
            trade.dip_percent,
            trade.up_trend_percent,
            trade.stop_loss_percent,
            trade.profit_percent,
            trade.price_decimals,
        )
    }

    /// Derive the full threshold set from an anchor price
    pub fn compute(&self, anchor: Decimal) -> ThresholdSet {
        ThresholdSet {
            dip: self.round(anchor - percent_of(anchor, self.dip_percent)),
            upward_trend: self.round(anchor + percent_of(anchor, self.up_trend_percent)),
            profit: self.round(anchor + percent_of(anchor, self.profit_percent)),
            stop_loss: self.round(anchor - percent_of(anchor, self.stop_loss_percent)),
        }
    }

    // Rounded once to the product's price increment, half away from zero
    fn round(&self, price: Decimal) -> Decimal {
        price.round_dp_with_strategy(self.price_decimals, RoundingStrategy::MidpointAwayFromZero)
    }
}

fn percent_of(price: Decimal, percent: Decimal) -> Decimal {
    price * percent / dec!(100)
}
