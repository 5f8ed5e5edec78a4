// Read-only displays: the live price feed and the session status block
//
// Nothing in here touches trading state; the session is observed only
// through its snapshot channel and the exchange only through the public
// market data feed.

use rust_decimal::Decimal;
use tracing::info;

use crate::clients::{CoinbaseFeedClient, TickerEvent};
use crate::core::session::SessionSnapshot;
use crate::error::TradingResult;

/// Stream the ticker channel for one product and log each trade with
/// its direction relative to the previous print. Runs until the feed
/// closes.
pub async fn run_price_monitor(ws_url: &str, product_id: &str) -> TradingResult<()> {
    let mut feed = CoinbaseFeedClient::connect(ws_url).await?;
    feed.subscribe_ticker(product_id).await?;
    info!("subscribed to {} ticker feed", product_id);

    let mut previous_price: Option<Decimal> = None;
    while let Some(event) = feed.next_ticker().await? {
        log_ticker(&event, previous_price);
        previous_price = Some(event.price);
    }

    info!("ticker feed closed");
    Ok(())
}

fn log_ticker(event: &TickerEvent, previous_price: Option<Decimal>) {
    let direction = match previous_price {
        Some(previous) if event.price > previous => "+",
        Some(previous) if event.price < previous => "-",
        _ => " ",
    };

    match (event.high_24h, event.low_24h) {
        (Some(high), Some(low)) => info!(
            "{} {} {} (24h high {}, low {})",
            event.product_id, event.price, direction, high, low
        ),
        _ => info!("{} {} {}", event.product_id, event.price, direction),
    }
}

/// Log the session status block after an evaluation, the counterpart of
/// the per-tick console display in the session's own logs
pub fn log_snapshot(snapshot: &SessionSnapshot, trading_currency: &str, crypto_currency: &str) {
    info!(
        "next operation: {} | {} available: {} | {} available: {}",
        snapshot.state,
        trading_currency,
        snapshot.trading_available,
        crypto_currency,
        snapshot.crypto_available
    );
    info!(
        "anchor {} | dip {} | upward trend {} | profit {} | stop loss {}",
        snapshot.anchor_price,
        snapshot.thresholds.dip,
        snapshot.thresholds.upward_trend,
        snapshot.thresholds.profit,
        snapshot.thresholds.stop_loss
    );
    if let Some(buy_price) = snapshot.buy_price {
        info!("holding position bought at {}", buy_price);
    }
    info!(
        "earnings: {} {} over {} cycles (started with {})",
        snapshot.total_earnings,
        trading_currency,
        snapshot.cycles_completed,
        snapshot.initial_funds
    );
}
