// Common types used across the trading core

/// Which side of the cycle the bot is waiting to execute. Exactly one
/// value is active at any instant; transitions happen only through the
/// state machine's fill callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingState {
    /// Holding the trading currency, watching for a dip or upward trend
    AwaitingBuy,
    /// Holding the crypto asset, watching for profit or stop-loss
    AwaitingSell,
}

impl TradingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingState::AwaitingBuy => "BUY",
            TradingState::AwaitingSell => "SELL",
        }
    }
}

impl std::fmt::Display for TradingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of evaluating one price observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}
