// Account snapshot tracking
//
// Balances are refreshed wholesale from the exchange after every state
// transition and at session start; a snapshot is never patched in place.
// While a refresh has failed the tracker is stale and the session must
// not size orders from it.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::clients::{Account, ExchangeGateway};
use crate::error::{TradingError, TradingResult};

#[derive(Debug)]
pub struct AccountTracker {
    trading_currency: String,
    crypto_currency: String,
    percent_of_available: Decimal,
    price_decimals: u32,
    trading: Option<Account>,
    crypto: Option<Account>,
    stale: bool,
}

impl AccountTracker {
    pub fn new(
        trading_currency: &str,
        crypto_currency: &str,
        percent_of_available: Decimal,
        price_decimals: u32,
    ) -> Self {
        Self {
            trading_currency: trading_currency.to_string(),
            crypto_currency: crypto_currency.to_string(),
            percent_of_available,
            price_decimals,
            trading: None,
            crypto: None,
            stale: true,
        }
    }

    /// Fetch all balances and select the configured trading and crypto
    /// accounts. Either currency missing from the response signals a
    /// misconfigured session and is an error.
    pub async fn refresh<G: ExchangeGateway + ?Sized>(&mut self, gateway: &G) -> TradingResult<()> {
        let accounts = gateway.list_accounts().await?;

        let trading = select_currency(&accounts, &self.trading_currency)
            .ok_or_else(|| TradingError::AccountNotFound(self.trading_currency.clone()))?;
        let crypto = select_currency(&accounts, &self.crypto_currency)
            .ok_or_else(|| TradingError::AccountNotFound(self.crypto_currency.clone()))?;

        self.trading = Some(trading);
        self.crypto = Some(crypto);
        self.stale = false;
        Ok(())
    }

    /// Mark the cached snapshots as outdated after a failed refresh
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Quote-currency amount to spend on the next BUY: the configured
    /// percentage of the available trading balance, at price precision
    pub fn fund_amount(&self) -> Decimal {
        (self.trading_available() * self.percent_of_available / dec!(100))
            .round_dp_with_strategy(self.price_decimals, RoundingStrategy::ToZero)
    }

    pub fn trading_available(&self) -> Decimal {
        self.trading
            .as_ref()
            .map(|account| account.available)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn crypto_available(&self) -> Decimal {
        self.crypto
            .as_ref()
            .map(|account| account.available)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn trading_account(&self) -> Option<&Account> {
        self.trading.as_ref()
    }

    pub fn crypto_account(&self) -> Option<&Account> {
        self.crypto.as_ref()
    }
}

fn select_currency(accounts: &[Account], currency: &str) -> Option<Account> {
    accounts
        .iter()
        .find(|account| account.currency == currency)
        .cloned()
}
