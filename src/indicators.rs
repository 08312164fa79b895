use ta::Next;
use ta::indicators::ExponentialMovingAverage;

/// Computes the full EMA sequence for `closes`, or `None` when the series
/// is shorter than `span`. The output has the same length and alignment as
/// the input: `ema[0]` is seeded at `closes[0]` and each later value follows
/// `alpha * close + (1 - alpha) * prev` with `alpha = 2 / (span + 1)`, the
/// unadjusted smoothing, which is exactly what `ta`'s EMA produces.
pub fn ema_series(closes: &[f64], span: usize) -> Option<Vec<f64>> {
    if closes.len() < span {
        return None;
    }

    let mut ema = ExponentialMovingAverage::new(span).ok()?;
    Some(closes.iter().map(|&close| ema.next(close)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn constant_series_is_a_fixed_point() {
        for span in [2, 25, 50] {
            let closes = vec![3.75; 60];
            let ema = ema_series(&closes, span).unwrap();
            assert!(ema.iter().all(|v| (v - 3.75).abs() < EPS));
        }
    }

    #[test]
    fn output_length_matches_input() {
        let closes: Vec<f64> = (0..120).map(|i| 1.0 + i as f64 * 0.01).collect();
        assert_eq!(ema_series(&closes, 25).unwrap().len(), closes.len());
        assert_eq!(ema_series(&closes, 50).unwrap().len(), closes.len());
    }

    #[test]
    fn short_series_is_undefined() {
        let closes = vec![1.0; 24];
        assert!(ema_series(&closes, 25).is_none());
        // Independent gates: 30 bars defines EMA-25 but not EMA-50.
        let closes = vec![1.0; 30];
        assert!(ema_series(&closes, 25).is_some());
        assert!(ema_series(&closes, 50).is_none());
    }

    #[test]
    fn matches_the_unadjusted_recurrence() {
        let closes = [10.0, 11.0, 9.5, 12.0, 12.5];
        let span = 3;
        let alpha = 2.0 / (span as f64 + 1.0);

        let mut expected = vec![closes[0]];
        for &close in &closes[1..] {
            let prev = *expected.last().unwrap();
            expected.push(alpha * close + (1.0 - alpha) * prev);
        }

        let ema = ema_series(&closes, span).unwrap();
        for (got, want) in ema.iter().zip(&expected) {
            assert!((got - want).abs() < EPS, "got {got}, want {want}");
        }
    }
}
