// Core trading logic modules

pub mod accounts;
pub mod earnings;
pub mod session;
pub mod state_machine;
pub mod thresholds;
pub mod types;

// Re-export commonly used types
pub use accounts::AccountTracker;
pub use earnings::EarningsLedger;
pub use session::{SessionSnapshot, TickOutcome, TradingSession};
pub use state_machine::SwingTrader;
pub use thresholds::{ThresholdCalculator, ThresholdSet};
pub use types::{TradeSignal, TradingState};
