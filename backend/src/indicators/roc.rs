// =============================================================================
// Rate of Change (ROC)
// =============================================================================
//
// Percentage move of the close relative to the close `period` bars earlier.

use super::finite;

/// ROC series aligned with `closes`; defined from index `period`.
///
/// A zero base price leaves that position undefined.
pub fn calculate_roc(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }
    let lead = closes.len().min(period);
    std::iter::repeat(None)
        .take(lead)
        .chain(closes.iter().zip(closes.iter().skip(period)).map(|(&base, &now)| {
            if base == 0.0 {
                None
            } else {
                finite((now / base - 1.0) * 100.0)
            }
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubling_reads_one_hundred() {
        let roc = calculate_roc(&[10.0, 15.0, 20.0, 30.0], 2);
        assert_eq!(roc.len(), 4);
        assert_eq!(&roc[..2], &[None, None]);
        assert!((roc[2].unwrap_or_default() - 100.0).abs() < 1e-9);
        assert!((roc[3].unwrap_or_default() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn short_input_is_undefined() {
        let roc = calculate_roc(&[1.0, 2.0, 3.0], 14);
        assert_eq!(roc.len(), 3);
        assert!(roc.iter().all(Option::is_none));
    }

    #[test]
    fn zero_base_is_undefined() {
        let roc = calculate_roc(&[0.0, 5.0, 10.0], 1);
        assert_eq!(roc[1], None);
        assert_eq!(roc[2], Some(100.0));
    }
}
