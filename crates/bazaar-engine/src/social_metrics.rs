//! Inequality and output measures over coin endowments.

/// Gini coefficient of `endowments`, in `[0, 1]` for non-negative input.
///
/// Small populations (fewer than 30) get the `n / (n - 1)` bias
/// correction. Fewer than two agents is perfectly equal by definition.
///
/// # Examples
///
/// ```
/// use bazaar_engine::social_metrics::get_gini;
///
/// assert_eq!(get_gini(&[5.0, 5.0, 5.0]), 0.0);
/// assert!((get_gini(&[0.0, 10.0]) - 1.0).abs() < 1e-9);
/// ```
pub fn get_gini(endowments: &[f64]) -> f64 {
    let n = endowments.len();
    if n < 2 {
        return 0.0;
    }
    let n_f = n as f64;
    let correction = if n < 30 { n_f / (n_f - 1.0) } else { 1.0 };
    let total: f64 = endowments.iter().sum();
    let mut abs_diff = 0.0;
    for &a in endowments {
        for &b in endowments {
            abs_diff += (a - b).abs();
        }
    }
    abs_diff / (2.0 * n_f * total + 1e-10) * correction
}

/// `1 - gini`.
pub fn get_equality(endowments: &[f64]) -> f64 {
    1.0 - get_gini(endowments)
}

/// Total coin in the economy.
pub fn get_productivity(endowments: &[f64]) -> f64 {
    endowments.iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_split_has_zero_gini() {
        assert_eq!(get_gini(&[3.0; 4]), 0.0);
        assert_eq!(get_equality(&[3.0; 4]), 1.0);
    }

    #[test]
    fn all_zero_is_equal() {
        assert_eq!(get_gini(&[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn one_holder_is_maximally_unequal() {
        let g = get_gini(&[0.0, 0.0, 0.0, 12.0]);
        assert!((g - 1.0).abs() < 1e-9, "gini was {g}");
    }

    #[test]
    fn large_population_skips_correction() {
        let mut e = vec![0.0; 40];
        e[0] = 40.0;
        // Uncorrected: 2 * 39 * 40 / (2 * 40 * 40) = 0.975.
        assert!((get_gini(&e) - 0.975).abs() < 1e-9);
    }

    #[test]
    fn productivity_sums() {
        assert_eq!(get_productivity(&[1.5, 2.5]), 4.0);
        assert_eq!(get_gini(&[7.0]), 0.0);
    }
}
