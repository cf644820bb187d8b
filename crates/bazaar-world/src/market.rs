//! Per-step market history shared between the auction and the scenario.

use bazaar_core::Resource;

/// One entry per recorded step and resource.
///
/// The trading component appends once per step; scenarios read it for
/// planner observations and liquidity/stability rewards. Prices carry
/// forward: a step with no trade repeats the previous price (0 before
/// the first trade).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarketHistory {
    prices: [Vec<f64>; Resource::COUNT],
    volumes: [Vec<f64>; Resource::COUNT],
    demand: [u64; Resource::COUNT],
    supply: [u64; Resource::COUNT],
}

impl MarketHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one step for `resource`: the last trade price (if any
    /// trade happened) and the units traded.
    pub fn record(&mut self, resource: Resource, price: Option<f64>, volume: u64) {
        let i = resource.index();
        let carried = self.prices[i].last().copied().unwrap_or(0.0);
        self.prices[i].push(price.unwrap_or(carried));
        self.volumes[i].push(volume as f64);
    }

    /// Set the units currently bid for and offered on `resource`.
    pub fn set_depth(&mut self, resource: Resource, demand: u64, supply: u64) {
        self.demand[resource.index()] = demand;
        self.supply[resource.index()] = supply;
    }

    /// Recorded prices for `resource`, oldest first.
    pub fn prices(&self, resource: Resource) -> &[f64] {
        &self.prices[resource.index()]
    }

    /// Recorded traded units for `resource`, oldest first.
    pub fn volumes(&self, resource: Resource) -> &[f64] {
        &self.volumes[resource.index()]
    }

    /// Units currently bid for.
    pub fn demand(&self, resource: Resource) -> u64 {
        self.demand[resource.index()]
    }

    /// Units currently offered.
    pub fn supply(&self, resource: Resource) -> u64 {
        self.supply[resource.index()]
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.prices[0].len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The last `n` values of `series`, left-padded with zeros.
    pub fn window(series: &[f64], n: usize) -> Vec<f32> {
        let tail = &series[series.len().saturating_sub(n)..];
        let mut out = vec![0.0; n - tail.len()];
        out.extend(tail.iter().map(|&v| v as f32));
        out
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_carry_forward_between_trades() {
        let mut h = MarketHistory::new();
        h.record(Resource::Wood, None, 0);
        h.record(Resource::Wood, Some(7.0), 2);
        h.record(Resource::Wood, None, 0);
        assert_eq!(h.prices(Resource::Wood), &[0.0, 7.0, 7.0]);
        assert_eq!(h.volumes(Resource::Wood), &[0.0, 2.0, 0.0]);
        assert!(h.prices(Resource::Stone).is_empty());
    }

    #[test]
    fn window_pads_on_the_left() {
        assert_eq!(MarketHistory::window(&[1.0, 2.0], 4), vec![0.0, 0.0, 1.0, 2.0]);
        assert_eq!(MarketHistory::window(&[1.0, 2.0, 3.0], 2), vec![2.0, 3.0]);
        assert_eq!(MarketHistory::window(&[], 0), Vec::<f32>::new());
    }

    #[test]
    fn clear_resets_depth() {
        let mut h = MarketHistory::new();
        h.set_depth(Resource::Stone, 3, 1);
        h.record(Resource::Stone, Some(2.0), 1);
        h.clear();
        assert_eq!(h.demand(Resource::Stone), 0);
        assert!(h.is_empty());
    }
}
