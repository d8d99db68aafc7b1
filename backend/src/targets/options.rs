// =============================================================================
// Option targets: illustrative strike / premium / profit table
// =============================================================================
//
// Strikes sit on a 100-point grid around the spot price. Premiums use a flat
// time-value floor scaled by volatility and a fixed delta per profit point;
// these are rough guides for a retail dashboard, not a pricing model.
// =============================================================================

use serde::Serialize;

use crate::types::{Action, OptionKind};

const STRIKE_STEP: f64 = 100.0;
const STRIKE_SHIFT_TRIGGER: f64 = 50.0;
/// Underlying offsets from the base strike and the delta assumed at each.
const PROFIT_LADDER: [(f64, f64); 3] = [(200.0, 0.70), (300.0, 0.75), (400.0, 0.80)];
const ITM_TIME_VALUE_FLOOR: f64 = 50.0;
const ITM_TIME_VALUE_PER_VOL: f64 = 20.0;
const OTM_TIME_VALUE_FLOOR: f64 = 30.0;
const OTM_TIME_VALUE_PER_VOL: f64 = 15.0;
const MONITORING_HALF_WIDTH: f64 = 200.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitPoint {
    pub underlying_price: i64,
    pub expected_premium: f64,
    pub profit: f64,
    pub profit_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionRecommendation {
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub strike: i64,
    pub current_price: f64,
    pub entry_premium: f64,
    pub profit_points: Vec<ProfitPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySignals {
    pub call_entry: i64,
    pub put_entry: i64,
    pub monitoring_range: String,
    pub call_trigger: String,
    pub put_trigger: String,
}

/// Serialises as `{"recommendation": {...}}` or `{"entry_signals": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionTargets {
    Recommendation(OptionRecommendation),
    EntrySignals(EntrySignals),
}

/// Round to one decimal, ties to even.
fn round1(v: f64) -> f64 {
    (v * 10.0).round_ties_even() / 10.0
}

/// Nearest strike on the 100-point grid, ties to even.
pub fn base_strike(price: f64) -> f64 {
    (price / STRIKE_STEP).round_ties_even() * STRIKE_STEP
}

/// Entry premium for `kind` at `strike` with spot `price`.
fn entry_premium(kind: OptionKind, strike: f64, price: f64, volatility: f64) -> f64 {
    let intrinsic = match kind {
        OptionKind::Call => price - strike,
        OptionKind::Put => strike - price,
    };
    if intrinsic >= 0.0 {
        intrinsic + (volatility * ITM_TIME_VALUE_PER_VOL).max(ITM_TIME_VALUE_FLOOR)
    } else {
        (volatility * OTM_TIME_VALUE_PER_VOL).max(OTM_TIME_VALUE_FLOOR)
    }
}

/// Build the option table for `action` at spot `price`.
pub fn option_targets(price: f64, action: Action, volatility: f64) -> OptionTargets {
    let base = base_strike(price);

    let (kind, strike, sign) = match action {
        Action::Buy => {
            let strike = if price > base + STRIKE_SHIFT_TRIGGER {
                base + STRIKE_STEP
            } else {
                base
            };
            (OptionKind::Call, strike, 1.0)
        }
        Action::Sell => {
            let strike = if price < base - STRIKE_SHIFT_TRIGGER {
                base - STRIKE_STEP
            } else {
                base
            };
            (OptionKind::Put, strike, -1.0)
        }
        Action::Hold => return OptionTargets::EntrySignals(entry_signals(base)),
    };

    let entry = entry_premium(kind, strike, price, volatility);
    let profit_points = PROFIT_LADDER
        .iter()
        .map(|&(offset, delta)| {
            let point = base + sign * offset;
            let expected = entry + sign * (point - price) * delta;
            let profit = expected - entry;
            ProfitPoint {
                underlying_price: point as i64,
                expected_premium: round1(expected),
                profit: round1(profit),
                profit_percent: round1(profit / entry * 100.0),
            }
        })
        .collect();

    OptionTargets::Recommendation(OptionRecommendation {
        kind,
        strike: strike as i64,
        current_price: price.round_ties_even(),
        entry_premium: round1(entry),
        profit_points,
    })
}

fn entry_signals(base: f64) -> EntrySignals {
    let b = base as i64;
    let half = MONITORING_HALF_WIDTH as i64;
    let trigger = STRIKE_SHIFT_TRIGGER as i64;
    EntrySignals {
        call_entry: b,
        put_entry: b,
        monitoring_range: format!("{} - {}", b - half, b + half),
        call_trigger: format!("Buy {} CE if price crosses {}", b, b + trigger),
        put_trigger: format!("Buy {} PE if price falls below {}", b, b - trigger),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn recommendation(t: OptionTargets) -> OptionRecommendation {
        match t {
            OptionTargets::Recommendation(r) => r,
            other => panic!("expected a recommendation, got {other:?}"),
        }
    }

    #[test]
    fn base_strike_rounds_half_to_even() {
        assert_eq!(base_strike(84_449.0), 84_400.0);
        assert_eq!(base_strike(84_451.0), 84_500.0);
        assert_eq!(base_strike(84_450.0), 84_400.0);
        assert_eq!(base_strike(84_550.0), 84_600.0);
    }

    #[test]
    fn buy_call_table() {
        // base 25100 sits above the price => out-of-the-money call at the base.
        let r = recommendation(option_targets(25_060.0, Action::Buy, 1.0));
        assert_eq!(r.kind, OptionKind::Call);
        assert_eq!(r.strike, 25_100);
        assert_eq!(r.current_price, 25_060.0);
        assert_eq!(r.entry_premium, 30.0);

        let p = &r.profit_points[0];
        assert_eq!(p.underlying_price, 25_300);
        // 30 + (25300 - 25060) * 0.7 = 198
        assert_eq!(p.expected_premium, 198.0);
        assert_eq!(p.profit, 168.0);
        assert_eq!(p.profit_percent, 560.0);
    }

    #[test]
    fn sell_put_table() {
        // base 84400, price not below base - 50 => strike 84400, in the money by 0.
        let r = recommendation(option_targets(84_400.0, Action::Sell, 1.8));
        assert_eq!(r.kind, OptionKind::Put);
        assert_eq!(r.strike, 84_400);
        assert_eq!(r.entry_premium, 50.0);
        let points: Vec<i64> = r.profit_points.iter().map(|p| p.underlying_price).collect();
        assert_eq!(points, vec![84_200, 84_100, 84_000]);
        // 50 + (84400 - 84200) * 0.7 = 190
        assert_eq!(r.profit_points[0].expected_premium, 190.0);
    }

    #[test]
    fn in_the_money_call_includes_intrinsic() {
        // base 1000, price 1040 <= base + 50 => strike 1000, intrinsic 40, vol 3 => tv 60.
        let r = recommendation(option_targets(1_040.0, Action::Buy, 3.0));
        assert_eq!(r.strike, 1_000);
        assert_eq!(r.entry_premium, 100.0);
    }

    #[test]
    fn hold_entry_signals() {
        match option_targets(52_030.0, Action::Hold, 1.0) {
            OptionTargets::EntrySignals(s) => {
                assert_eq!(s.call_entry, 52_000);
                assert_eq!(s.put_entry, 52_000);
                assert_eq!(s.monitoring_range, "51800 - 52200");
                assert_eq!(s.call_trigger, "Buy 52000 CE if price crosses 52050");
                assert_eq!(s.put_trigger, "Buy 52000 PE if price falls below 51950");
            }
            other => panic!("expected entry signals, got {other:?}"),
        }
    }

    #[test]
    fn serialises_with_wrapper_key() {
        let v = serde_json::to_value(option_targets(25_000.0, Action::Buy, 1.0)).unwrap();
        assert_eq!(v["recommendation"]["type"], "CALL");
        let v = serde_json::to_value(option_targets(25_000.0, Action::Hold, 1.0)).unwrap();
        assert!(v.get("entry_signals").is_some());
    }

    proptest! {
        #[test]
        fn buy_ladder_increases(price in 1_000.0f64..100_000.0, vol in 0.0f64..8.0) {
            let r = recommendation(option_targets(price, Action::Buy, vol));
            for pair in r.profit_points.windows(2) {
                prop_assert!(pair[1].underlying_price > pair[0].underlying_price);
                prop_assert!(pair[1].expected_premium > pair[0].expected_premium);
            }
        }

        #[test]
        fn table_is_deterministic(price in 1_000.0f64..100_000.0, vol in 0.0f64..8.0) {
            prop_assert_eq!(
                option_targets(price, Action::Sell, vol),
                option_targets(price, Action::Sell, vol)
            );
        }
    }
}
