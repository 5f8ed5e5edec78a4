// Configuration management for the swing trading bot

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{TradingError, TradingResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    pub trade: TradeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub passphrase: String,
    #[serde(default = "default_rest_url")]
    pub rest_url: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeConfig {
    /// Market to trade on, e.g. "BTC-GBP"
    pub product_id: String,
    /// Currency used to fund purchases, e.g. "GBP"
    pub trading_currency: String,
    /// Asset being traded, e.g. "BTC"
    pub crypto_currency: String,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_percent_of_available")]
    pub percent_of_available: Decimal,
    #[serde(default = "default_dip_percent")]
    pub dip_percent: Decimal,
    #[serde(default = "default_up_trend_percent")]
    pub up_trend_percent: Decimal,
    #[serde(default = "default_stop_loss_percent")]
    pub stop_loss_percent: Decimal,
    #[serde(default = "default_profit_percent")]
    pub profit_percent: Decimal,
    /// Tolerance added to either side of each threshold when matching
    #[serde(default = "default_price_range")]
    pub price_range: Decimal,
    #[serde(default = "default_minimum_starting_balance")]
    pub minimum_starting_balance: Decimal,
    /// Decimal places of the product's minimum price increment
    #[serde(default = "default_price_decimals")]
    pub price_decimals: u32,
}

// Default value functions
fn default_rest_url() -> String {
    "https://api.pro.coinbase.com".to_string()
}
fn default_ws_url() -> String {
    "wss://ws-feed.pro.coinbase.com".to_string()
}
fn default_interval_ms() -> u64 {
    1000
}
fn default_percent_of_available() -> Decimal {
    dec!(25)
}
fn default_dip_percent() -> Decimal {
    dec!(2)
}
fn default_up_trend_percent() -> Decimal {
    dec!(2)
}
fn default_stop_loss_percent() -> Decimal {
    dec!(2.5)
}
fn default_profit_percent() -> Decimal {
    dec!(5)
}
fn default_price_range() -> Decimal {
    Decimal::ZERO
}
fn default_minimum_starting_balance() -> Decimal {
    dec!(5)
}
fn default_price_decimals() -> u32 {
    3
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            secret: String::new(),
            passphrase: String::new(),
            rest_url: default_rest_url(),
            ws_url: default_ws_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            trade: TradeConfig {
                product_id: "BTC-GBP".to_string(),
                trading_currency: "GBP".to_string(),
                crypto_currency: "BTC".to_string(),
                interval_ms: default_interval_ms(),
                percent_of_available: default_percent_of_available(),
                dip_percent: default_dip_percent(),
                up_trend_percent: default_up_trend_percent(),
                stop_loss_percent: default_stop_loss_percent(),
                profit_percent: default_profit_percent(),
                price_range: default_price_range(),
                minimum_starting_balance: default_minimum_starting_balance(),
                price_decimals: default_price_decimals(),
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, apply environment overrides
    /// for API credentials and validate the result
    pub fn from_file<P: AsRef<Path>>(path: P) -> TradingResult<Self> {
        let path_ref = path.as_ref();
        if !path_ref.exists() {
            return Err(TradingError::ConfigNotFound(
                path_ref.display().to_string(),
            ));
        }

        let content =
            fs::read_to_string(path_ref).map_err(|e| TradingError::FileRead(e.to_string()))?;

        let mut config: Config = toml::from_str(&content)?;
        config.api.resolve_env();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> TradingResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TradingError::Internal(format!("TOML serialize error: {}", e)))?;

        fs::write(path, content).map_err(|e| TradingError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> TradingResult<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> TradingResult<()> {
        let trade = &self.trade;

        if trade.product_id.is_empty() {
            return Err(TradingError::ConfigValidation(
                "product_id must not be empty".to_string(),
            ));
        }

        if trade.trading_currency.is_empty() || trade.crypto_currency.is_empty() {
            return Err(TradingError::ConfigValidation(
                "trading_currency and crypto_currency must not be empty".to_string(),
            ));
        }

        if trade.interval_ms == 0 {
            return Err(TradingError::ConfigValidation(
                "interval_ms must be greater than 0".to_string(),
            ));
        }

        if trade.percent_of_available <= Decimal::ZERO
            || trade.percent_of_available > dec!(100)
        {
            return Err(TradingError::ConfigValidation(
                "percent_of_available must be between 0 and 100".to_string(),
            ));
        }

        for (name, value) in [
            ("dip_percent", trade.dip_percent),
            ("up_trend_percent", trade.up_trend_percent),
            ("stop_loss_percent", trade.stop_loss_percent),
            ("profit_percent", trade.profit_percent),
        ] {
            if value < Decimal::ZERO {
                return Err(TradingError::ConfigValidation(format!(
                    "{} must be non-negative",
                    name
                )));
            }
        }

        if trade.price_range < Decimal::ZERO {
            return Err(TradingError::ConfigValidation(
                "price_range must be non-negative".to_string(),
            ));
        }

        if trade.minimum_starting_balance < Decimal::ZERO {
            return Err(TradingError::ConfigValidation(
                "minimum_starting_balance must be non-negative".to_string(),
            ));
        }

        Ok(())
    }
}

impl ApiConfig {
    /// Fill credentials from the environment when the file leaves them
    /// blank, matching the exchange's conventional variable names
    pub fn resolve_env(&mut self) {
        if self.key.is_empty() {
            if let Ok(key) = std::env::var("COINBASE_KEY") {
                self.key = key;
            }
        }
        if self.secret.is_empty() {
            if let Ok(secret) = std::env::var("COINBASE_SECRET") {
                self.secret = secret;
            }
        }
        if self.passphrase.is_empty() {
            if let Ok(passphrase) = std::env::var("COINBASE_PASSPHRASE") {
                self.passphrase = passphrase;
            }
        }
    }

    /// Check whether API credentials are present
    pub fn has_credentials(&self) -> bool {
        !self.key.is_empty() && !self.secret.is_empty() && !self.passphrase.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_configuration() {
        let config = Config::default();
        assert_eq!(config.trade.interval_ms, 1000);
        assert_eq!(config.trade.percent_of_available, dec!(25));
        assert_eq!(config.trade.dip_percent, dec!(2));
        assert_eq!(config.trade.up_trend_percent, dec!(2));
        assert_eq!(config.trade.stop_loss_percent, dec!(2.5));
        assert_eq!(config.trade.profit_percent, dec!(5));
        assert_eq!(config.trade.price_range, Decimal::ZERO);
        assert_eq!(config.trade.price_decimals, 3);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = Config::default();
        config.trade.interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(TradingError::ConfigValidation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_percent() {
        let mut config = Config::default();
        config.trade.dip_percent = dec!(-1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_percent_of_available_over_100() {
        let mut config = Config::default();
        config.trade.percent_of_available = dec!(150);
        assert!(config.validate().is_err());
    }
}
