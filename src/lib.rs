// Swing Trading Bot Library
//
// A buy-low/sell-high trading bot: polls a market price, buys on a dip
// or confirmed upward trend, sells at a profit threshold or stop loss,
// and tracks realized earnings across cycles.

pub mod clients;
pub mod config;
pub mod core;
pub mod error; // Unified error handling
pub mod monitor; // Read-only price and session displays

// Re-export core trading types
pub use crate::core::{
    AccountTracker, EarningsLedger, SessionSnapshot, SwingTrader, ThresholdCalculator,
    ThresholdSet, TickOutcome, TradeSignal, TradingSession, TradingState,
};

// Re-export error types
pub use error::{TradingError, TradingResult};

// Re-export client types
pub use clients::{
    Account, CoinbaseFeedClient, CoinbaseRestClient, ExchangeGateway, OrderOutcome, OrderRequest,
    OrderSide, Ticker, TickerEvent,
};

// Re-export configuration
pub use config::{ApiConfig, Config, TradeConfig};
