// =============================================================================
// Trend strength: four-point agreement counter
// =============================================================================
//
// One point each for:
//   * MACD line above its signal line
//   * close above SMA(short)
//   * SMA(short) above SMA(long)
//   * ADX above the trend threshold
//
// An undefined operand means the criterion does not score.
// =============================================================================

use crate::indicators::IndicatorSnapshot;

/// Raw counter in `0..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TrendStrength(u8);

impl TrendStrength {
    pub const MAX: u8 = 4;

    pub fn evaluate(snapshot: &IndicatorSnapshot, adx_threshold: f64) -> Self {
        let above = |a: Option<f64>, b: Option<f64>| matches!((a, b), (Some(a), Some(b)) if a > b);

        let score = [
            above(snapshot.macd, snapshot.macd_signal),
            above(snapshot.close, snapshot.sma_20),
            above(snapshot.sma_20, snapshot.sma_50),
            above(snapshot.adx, Some(adx_threshold)),
        ]
        .into_iter()
        .filter(|&hit| hit)
        .count();

        Self(score as u8)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    /// `raw / 4`, one of 0, 0.25, 0.5, 0.75, 1.
    pub fn normalized(self) -> f64 {
        f64::from(self.0) / f64::from(Self::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_criteria_score_four() {
        let snap = IndicatorSnapshot {
            macd: Some(2.0),
            macd_signal: Some(1.0),
            close: Some(110.0),
            sma_20: Some(105.0),
            sma_50: Some(100.0),
            adx: Some(30.0),
            ..Default::default()
        };
        let ts = TrendStrength::evaluate(&snap, 25.0);
        assert_eq!(ts.raw(), 4);
        assert_eq!(ts.normalized(), 1.0);
    }

    #[test]
    fn undefined_operands_do_not_score() {
        let snap = IndicatorSnapshot {
            macd: Some(2.0),
            macd_signal: None,
            close: Some(110.0),
            sma_20: Some(105.0),
            sma_50: None,
            adx: Some(25.0),
            ..Default::default()
        };
        let ts = TrendStrength::evaluate(&snap, 25.0);
        assert_eq!(ts.raw(), 1);
        assert_eq!(ts.normalized(), 0.25);
    }

    #[test]
    fn empty_snapshot_is_zero() {
        assert_eq!(TrendStrength::evaluate(&IndicatorSnapshot::default(), 25.0).raw(), 0);
    }
}
