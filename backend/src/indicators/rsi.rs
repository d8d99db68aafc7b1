// =============================================================================
// Relative Strength Index (RSI)
// =============================================================================
//
// Ratio of average up-move to average down-move over `period` closes, mapped
// onto 0–100:
//
//   RSI = 100 - 100 / (1 + avg_up / avg_down)
//
// Both averages start as plain means of the first `period` moves and then
// follow Wilder's recurrence  avg = (avg * (period - 1) + move) / period.
// =============================================================================

/// Running Wilder average of up-moves and down-moves.
struct WilderPair {
    up: f64,
    down: f64,
    period: f64,
}

impl WilderPair {
    fn seed(moves: &[f64]) -> Self {
        let period = moves.len() as f64;
        let up: f64 = moves.iter().filter(|m| **m > 0.0).sum();
        let down: f64 = moves.iter().filter(|m| **m < 0.0).map(|m| -m).sum();
        Self {
            up: up / period,
            down: down / period,
            period,
        }
    }

    fn push(&mut self, change: f64) {
        let keep = self.period - 1.0;
        self.up = (self.up * keep + change.max(0.0)) / self.period;
        self.down = (self.down * keep + (-change).max(0.0)) / self.period;
    }

    fn is_flat(&self) -> bool {
        self.up == 0.0 && self.down == 0.0
    }

    /// RSI for the current averages: undefined when nothing moved, 100
    /// when nothing fell.
    fn value(&self) -> Option<f64> {
        if self.is_flat() {
            return None;
        }
        let rsi = if self.down == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + self.up / self.down)
        };
        super::finite(rsi).map(|r| r.clamp(0.0, 100.0))
    }
}

/// Compute the RSI series for `closes`, aligned with the input.
///
/// The first defined value sits at index `period`.
///
/// # Edge cases
/// - `period == 0` or fewer than `period + 1` closes => all undefined
/// - Both averages zero (no movement across the window) => undefined at that
///   position; the series resumes once prices move again.
/// - A non-finite average stops the series; later positions stay undefined.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() <= period {
        return out;
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let mut avg = WilderPair::seed(&changes[..period]);

    for (idx, slot) in out.iter_mut().enumerate().skip(period) {
        if idx > period {
            avg.push(changes[idx - 1]);
        }
        match avg.value() {
            Some(v) => *slot = Some(v),
            None if avg.is_flat() => {}
            None => break,
        }
    }

    out
}
