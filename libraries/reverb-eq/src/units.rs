//! Decibel conversions and frequency grids
//!
//! The correction loop works in a power-ratio decibel convention:
//! `db_to_linear(db) = 10^(db / 10)` and its inverse `linear_to_db`.
//! Filter responses, on the other hand, are read in amplitude decibels
//! (`20·log10|H|`, see [`amplitude_to_db`]). The correction algorithm mixes
//! the two on purpose; do not replace one with the other.

/// Floor reported for a zero or non-finite magnitude
pub const MIN_DB: f64 = -200.0;

/// Convert power-convention decibels to a linear factor: `10^(db / 10)`
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 10.0)
}

/// Inverse of [`db_to_linear`]: `10·log10(gain)`
#[inline]
pub fn linear_to_db(gain: f64) -> f64 {
    10.0 * gain.log10()
}

/// Magnitude to amplitude decibels (`20·log10`), floored at [`MIN_DB`]
#[inline]
pub fn amplitude_to_db(magnitude: f64) -> f64 {
    if magnitude > 0.0 && magnitude.is_finite() {
        (20.0 * magnitude.log10()).max(MIN_DB)
    } else {
        MIN_DB
    }
}

/// Logarithmically spaced frequencies from `min_hz` to `max_hz` (inclusive)
///
/// Used to drive response-curve displays. Returns an empty vector for
/// `points == 0` and `[min_hz]` for `points == 1`.
pub fn log_spaced_frequencies(min_hz: f64, max_hz: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![min_hz],
        _ => {
            let ratio = (max_hz / min_hz).ln();
            let last = (points - 1) as f64;
            (0..points)
                .map(|i| min_hz * (ratio * i as f64 / last).exp())
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_convention() {
        assert!((db_to_linear(10.0) - 10.0).abs() < 1e-12);
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-12);
        assert!((linear_to_db(100.0) - 20.0).abs() < 1e-12);
        // +1 dB probe
        assert!((db_to_linear(1.0) - 1.258_925_411_794_167).abs() < 1e-12);
    }

    #[test]
    fn amplitude_convention() {
        assert!((amplitude_to_db(2.0) - 6.020_599_913_279_624).abs() < 1e-12);
        assert_eq!(amplitude_to_db(0.0), MIN_DB);
        assert_eq!(amplitude_to_db(f64::NAN), MIN_DB);
        assert_eq!(amplitude_to_db(1e-20), MIN_DB);
    }

    #[test]
    fn log_grid_endpoints() {
        let grid = log_spaced_frequencies(20.0, 20_000.0, 4);
        assert_eq!(grid.len(), 4);
        assert!((grid[0] - 20.0).abs() < 1e-9);
        assert!((grid[1] - 200.0).abs() < 1e-9);
        assert!((grid[3] - 20_000.0).abs() < 1e-6);

        assert!(log_spaced_frequencies(20.0, 20_000.0, 0).is_empty());
        assert_eq!(log_spaced_frequencies(20.0, 20_000.0, 1), vec![20.0]);
    }
}
