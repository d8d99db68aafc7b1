// =============================================================================
// On-Balance Volume (OBV)
// =============================================================================
//
// Running total of volume, added on up-closes and subtracted on down-closes.
// The first bar contributes its own volume.
// =============================================================================

use super::finite;

pub fn calculate_obv(closes: &[f64], volumes: &[f64]) -> Vec<Option<f64>> {
    let n = closes.len().min(volumes.len());
    let mut out = vec![None; closes.len()];
    if n == 0 {
        return out;
    }

    let mut total = volumes[0];
    out[0] = finite(total);
    for i in 1..n {
        if closes[i] > closes[i - 1] {
            total += volumes[i];
        } else if closes[i] < closes[i - 1] {
            total -= volumes[i];
        }
        match finite(total) {
            Some(v) => out[i] = Some(v),
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_by_direction() {
        let closes = [10.0, 11.0, 11.0, 9.0];
        let volumes = [5.0, 3.0, 7.0, 2.0];
        assert_eq!(
            calculate_obv(&closes, &volumes),
            vec![Some(5.0), Some(8.0), Some(8.0), Some(6.0)]
        );
    }

    #[test]
    fn empty_input() {
        assert!(calculate_obv(&[], &[]).is_empty());
    }
}
