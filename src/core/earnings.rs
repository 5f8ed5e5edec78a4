// Realized earnings accounting
//
// Each completed BUY->SELL cycle realizes the difference between the
// trading-currency balance after the SELL fill and the balance captured
// immediately before that cycle's BUY. Anchoring every delta to its own
// cycle keeps the running total from drifting the way a subtraction
// against the session-opening balance would.

use rust_decimal::Decimal;

/// Append-only ledger of realized cycle deltas for the process lifetime
#[derive(Debug)]
pub struct EarningsLedger {
    initial_funds: Decimal,
    open_cycle: Option<Decimal>,
    total: Decimal,
    cycles_completed: u32,
}

impl EarningsLedger {
    /// `initial_funds` is the trading-currency balance at session start,
    /// captured once and kept for display only
    pub fn new(initial_funds: Decimal) -> Self {
        Self {
            initial_funds,
            open_cycle: None,
            total: Decimal::ZERO,
            cycles_completed: 0,
        }
    }

    /// Record the trading-currency balance immediately preceding a BUY.
    /// The cycle stays open until the matching SELL settles.
    pub fn open_cycle(&mut self, balance_before_buy: Decimal) {
        self.open_cycle = Some(balance_before_buy);
    }

    /// Settle the open cycle against the post-SELL balance and return the
    /// realized delta. With no open cycle this is a no-op, so settling
    /// twice never double-records.
    pub fn settle(&mut self, post_sell_balance: Decimal) -> Option<Decimal> {
        let cycle_start = self.open_cycle.take()?;
        let delta = post_sell_balance - cycle_start;
        self.total += delta;
        self.cycles_completed += 1;
        Some(delta)
    }

    pub fn has_open_cycle(&self) -> bool {
        self.open_cycle.is_some()
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn initial_funds(&self) -> Decimal {
        self.initial_funds
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }
}
