// State machine and threshold behavior tests

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use swing_trading_bot::{SwingTrader, ThresholdCalculator, TradeSignal, TradingState};

fn spec_calculator() -> ThresholdCalculator {
    ThresholdCalculator::new(dec!(2), dec!(2), dec!(2.5), dec!(5), 3)
}

fn spec_trader(opening_price: Decimal) -> SwingTrader {
    SwingTrader::new(spec_calculator(), dec!(0.5), opening_price)
}

#[test]
fn test_worked_example_thresholds() {
    let trader = spec_trader(dec!(100));
    let thresholds = trader.thresholds();

    assert_eq!(thresholds.dip, dec!(98));
    assert_eq!(thresholds.upward_trend, dec!(102));
    assert_eq!(thresholds.profit, dec!(105));
    assert_eq!(thresholds.stop_loss, dec!(95));
}

#[test]
fn test_worked_example_cycle() {
    let mut trader = spec_trader(dec!(100));

    // 97.6 falls inside the dip band 97.5..=98.5
    assert_eq!(trader.observe_price(dec!(97.6)), TradeSignal::Buy);

    // Fill at 98 re-anchors the sell thresholds
    trader.on_buy_filled(dec!(98));
    assert_eq!(trader.state(), TradingState::AwaitingSell);
    assert_eq!(trader.thresholds().profit, dec!(102.9));
    assert_eq!(trader.thresholds().stop_loss, dec!(95.55));

    assert_eq!(trader.observe_price(dec!(102.7)), TradeSignal::Sell);
}

#[test]
fn test_band_edges_are_inclusive() {
    let mut trader = spec_trader(dec!(100));

    assert_eq!(trader.observe_price(dec!(97.5)), TradeSignal::Buy);
    assert_eq!(trader.observe_price(dec!(98.5)), TradeSignal::Buy);
    assert_eq!(trader.observe_price(dec!(97.499)), TradeSignal::Hold);
    assert_eq!(trader.observe_price(dec!(98.501)), TradeSignal::Hold);
}

#[test]
fn test_observation_is_repeatable_until_transition() {
    // No latch: if a qualifying observation fails to turn into a fill,
    // the same price qualifies again on the next tick
    let mut trader = spec_trader(dec!(100));
    assert_eq!(trader.observe_price(dec!(97.6)), TradeSignal::Buy);
    assert_eq!(trader.observe_price(dec!(97.6)), TradeSignal::Buy);
    assert_eq!(trader.state(), TradingState::AwaitingBuy);
}

#[test]
fn test_threshold_ordering_across_configurations() {
    let anchors = [dec!(0.015), dec!(1), dec!(417.339), dec!(31250)];
    let percents = [dec!(0.5), dec!(2), dec!(5), dec!(12.5)];

    for &anchor in &anchors {
        for &percent in &percents {
            let calculator =
                ThresholdCalculator::new(percent, percent, percent, percent, 3);
            let thresholds = calculator.compute(anchor);

            assert!(thresholds.stop_loss < anchor);
            assert!(anchor < thresholds.profit);
            assert!(thresholds.dip < anchor);
            assert!(anchor < thresholds.upward_trend);
        }
    }
}

#[test]
fn test_consecutive_cycles_reanchor_independently() {
    let mut trader = spec_trader(dec!(100));

    trader.on_buy_filled(dec!(98));
    trader.on_sell_filled();
    // Anchor on a much lower market
    assert_eq!(trader.observe_price(dec!(80)), TradeSignal::Hold);
    assert_eq!(trader.anchor_price(), dec!(80));
    assert_eq!(trader.thresholds().dip, dec!(78.4));
    assert_eq!(trader.thresholds().upward_trend, dec!(81.6));

    // Second cycle trades off the fresh anchor
    assert_eq!(trader.observe_price(dec!(78.2)), TradeSignal::Buy);
    trader.on_buy_filled(dec!(78.4));
    assert_eq!(trader.thresholds().profit, dec!(82.32));
}

#[test]
fn test_stop_loss_sells_below_buy_price() {
    let mut trader = spec_trader(dec!(100));
    trader.on_buy_filled(dec!(98));

    // 95.55 is 2.5% below the fill price
    assert_eq!(trader.observe_price(dec!(95.55)), TradeSignal::Sell);
}

#[test]
fn test_no_buy_while_holding_position() {
    let mut trader = spec_trader(dec!(100));
    trader.on_buy_filled(dec!(98));

    // 96.5 sits in what would be the dip band for anchor 98, but a
    // position is held and it is outside both sell bands
    assert_eq!(trader.observe_price(dec!(96.5)), TradeSignal::Hold);
}
