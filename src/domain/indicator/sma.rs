//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) positions are undefined.

pub fn simple_moving_average(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; closes.len()];
    }

    let mut values = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i + 1 < window {
            values.push(None);
        } else {
            let slice = &closes[i + 1 - window..=i];
            values.push(Some(slice.iter().sum::<f64>() / window as f64));
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sma_warmup_is_undefined() {
        let closes: Vec<f64> = (1..=12).map(f64::from).collect();
        let sma = simple_moving_average(&closes, 10);
        assert_eq!(sma.len(), 12);
        assert!(sma[..9].iter().all(Option::is_none));
        assert!(sma[9..].iter().all(Option::is_some));
    }

    #[test]
    fn sma_window_one_is_identity() {
        let closes = vec![3.5, 1.25, 8.0, 0.0];
        let sma = simple_moving_average(&closes, 1);
        let unwrapped: Vec<f64> = sma.into_iter().map(Option::unwrap).collect();
        assert_eq!(unwrapped, closes);
    }

    #[test]
    fn sma_known_values() {
        let closes: Vec<f64> = (10..=25).map(f64::from).collect();
        let sma = simple_moving_average(&closes, 10);
        assert_relative_eq!(sma[9].unwrap(), 14.5);
        assert_relative_eq!(sma[15].unwrap(), 20.5);
    }

    #[test]
    fn sma_window_longer_than_series() {
        let sma = simple_moving_average(&[1.0, 2.0], 5);
        assert_eq!(sma, vec![None, None]);
    }

    #[test]
    fn sma_zero_window() {
        let sma = simple_moving_average(&[1.0, 2.0, 3.0], 0);
        assert_eq!(sma, vec![None, None, None]);
    }

    #[test]
    fn sma_empty() {
        assert!(simple_moving_average(&[], 3).is_empty());
    }
}
