//! Agent utility and social welfare functions.
//!
//! Agents are rewarded with the change in their utility; the planner
//! with the change in social welfare. The market functions at the end
//! score the planner on trading liquidity and price stability instead.

use crate::social_metrics::{get_equality, get_productivity};

/// Utility concave in coin and linear in labor.
///
/// `eta` in `[0, 1]` shapes the coin term: 0 is linear, 1 is
/// logarithmic (clamped below at 1 coin so the log stays finite).
/// Each unit of labor costs `labor_coefficient`.
///
/// # Examples
///
/// ```
/// use bazaar_engine::rewards::isoelastic_coin_minus_labor;
///
/// assert_eq!(isoelastic_coin_minus_labor(10.0, 0.0, 0.0, 0.5), 9.0);
/// assert_eq!(isoelastic_coin_minus_labor(10.0, 4.0, 0.0, 0.5), 7.0);
/// ```
pub fn isoelastic_coin_minus_labor(
    coin: f64,
    labor: f64,
    isoelastic_eta: f64,
    labor_coefficient: f64,
) -> f64 {
    let coin = coin.max(0.0);
    let util_c = if isoelastic_eta == 1.0 {
        coin.max(1.0).ln()
    } else {
        (coin.powf(1.0 - isoelastic_eta) - 1.0) / (1.0 - isoelastic_eta)
    };
    util_c - labor * labor_coefficient
}

/// Utility linear in coin, decreasing as a power of labor.
pub fn coin_minus_labor_cost(
    coin: f64,
    labor: f64,
    labor_exponent: f64,
    labor_coefficient: f64,
) -> f64 {
    coin - labor.powf(labor_exponent) * labor_coefficient
}

/// Mean coin scaled by coin equality.
///
/// `equality_weight` in `[0, 1]`: 0 ignores equality, 1 multiplies
/// mean coin by full equality. Empty input is worth 0.
pub fn coin_eq_times_productivity(endowments: &[f64], equality_weight: f64) -> f64 {
    if endowments.is_empty() {
        return 0.0;
    }
    let prod = get_productivity(endowments) / endowments.len() as f64;
    let equality = equality_weight * get_equality(endowments) + (1.0 - equality_weight);
    equality * prod
}

fn inverse_income_weights(endowments: &[f64]) -> Vec<f64> {
    let raw: Vec<f64> = endowments.iter().map(|&c| 1.0 / c.max(1.0)).collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|w| w / total).collect()
}

/// Endowments averaged with weights proportional to `1 / max(coin, 1)`.
pub fn inv_income_weighted_coin_endowments(endowments: &[f64]) -> f64 {
    inverse_income_weights(endowments)
        .iter()
        .zip(endowments)
        .map(|(w, c)| w * c)
        .sum()
}

/// Utilities averaged with weights proportional to `1 / max(coin, 1)`.
pub fn inv_income_weighted_utility(endowments: &[f64], utilities: &[f64]) -> f64 {
    inverse_income_weights(endowments)
        .iter()
        .zip(utilities)
        .map(|(w, u)| w * u)
        .sum()
}

// ── Market welfare ──────────────────────────────────────────────

/// Half the agent's share of the largest balance. Zero when no agent
/// holds anything.
///
/// ```
/// use bazaar_engine::rewards::agent_reward_total;
///
/// assert_eq!(agent_reward_total(5.0, 10.0), 0.25);
/// assert_eq!(agent_reward_total(0.0, 0.0), 0.0);
/// ```
pub fn agent_reward_total(balance: f64, max_balance: f64) -> f64 {
    if max_balance <= 0.0 {
        return 0.0;
    }
    0.5 * balance / max_balance
}

/// Recent trading volume relative to the largest volume seen.
///
/// The current volume is the mean of the last two recorded steps (one
/// if only one exists). It is divided by the historical maximum, floored
/// at `base_volume`. No trading scores 0.
pub fn planner_reward_liq(volumes: &[f64], base_volume: f64) -> f64 {
    let recent = &volumes[volumes.len().saturating_sub(2)..];
    if recent.is_empty() {
        return 0.0;
    }
    let current = recent.iter().sum::<f64>() / recent.len() as f64;
    if current == 0.0 {
        return 0.0;
    }
    let max = volumes.iter().copied().fold(base_volume, f64::max);
    if max <= 0.0 {
        0.0
    } else {
        current / max
    }
}

/// Price volatility: the standard deviation of the latest `window`
/// prices relative to the largest rolling deviation seen, floored at
/// `base_std`. Fewer than `window` prices score 0.
pub fn planner_reward_stab(prices: &[f64], window: usize, base_std: f64) -> f64 {
    if window == 0 || prices.len() < window {
        return 0.0;
    }
    let stds: Vec<f64> = prices.windows(window).map(std_dev).collect();
    let current = stds.last().copied().unwrap_or(0.0);
    let max = stds.iter().copied().fold(base_std, f64::max);
    if max == 0.0 {
        0.0
    } else {
        current / max
    }
}

/// Liquidity rewarded, volatility penalized, over a two-step window.
///
/// `liq_importance` in `[0, 1]` trades the two off.
pub fn planner_reward_total(
    volumes: &[f64],
    prices: &[f64],
    base_volume: f64,
    base_std: f64,
    liq_importance: f64,
) -> f64 {
    let liq = planner_reward_liq(volumes, base_volume);
    let stab = planner_reward_stab(prices, 2, base_std);
    liq_importance * liq - (1.0 - liq_importance) * stab
}

/// Population standard deviation.
fn std_dev(xs: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    (xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt()
}
