//! Optional flattening of an agent observation.

use crate::mask::ACTION_MASK_KEY;
use crate::value::{AgentObs, ObsValue};

/// Key of the concatenated entry produced by [`flatten`].
pub const FLAT_KEY: &str = "flat";

/// Concatenate every entry of rank below 2 into a single `"flat"` vector.
///
/// Tensors of rank 2 or more keep their keys so spatial structure
/// survives. The `"action_mask"` entry is never folded in. The output
/// holds `"flat"` first, then the kept tensors in their original order,
/// then the mask.
///
/// # Examples
///
/// ```
/// use bazaar_obs::{flatten, AgentObs, ObsValue, FLAT_KEY};
///
/// let mut obs = AgentObs::new();
/// obs.insert("coin".into(), ObsValue::Scalar(3.0));
/// obs.insert("map".into(), ObsValue::tensor(&[1, 2], vec![0.0, 1.0]).unwrap());
/// obs.insert("inv".into(), ObsValue::Vector(vec![1.0, 2.0]));
///
/// let flat = flatten(obs);
/// assert_eq!(flat[FLAT_KEY], ObsValue::Vector(vec![3.0, 1.0, 2.0]));
/// assert!(flat.contains_key("map"));
/// ```
pub fn flatten(obs: AgentObs) -> AgentObs {
    let mut flat = Vec::new();
    let mut kept = Vec::new();
    let mut mask = None;
    for (key, value) in obs {
        if key == ACTION_MASK_KEY {
            mask = Some(value);
        } else if value.rank() >= 2 {
            kept.push((key, value));
        } else {
            value.extend_flat(&mut flat);
        }
    }

    let mut out = AgentObs::with_capacity(kept.len() + 2);
    out.insert(FLAT_KEY.to_string(), ObsValue::Vector(flat));
    out.extend(kept);
    if let Some(mask) = mask {
        out.insert(ACTION_MASK_KEY.to_string(), mask);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_is_kept_separate_and_last() {
        let mut obs = AgentObs::new();
        obs.insert(ACTION_MASK_KEY.into(), ObsValue::Vector(vec![1.0, 0.0]));
        obs.insert("time".into(), ObsValue::Scalar(0.5));
        let out = flatten(obs);
        let keys: Vec<_> = out.keys().map(String::as_str).collect();
        assert_eq!(keys, vec![FLAT_KEY, ACTION_MASK_KEY]);
        assert_eq!(out[FLAT_KEY], ObsValue::Vector(vec![0.5]));
    }

    #[test]
    fn empty_observation_yields_empty_flat() {
        let out = flatten(AgentObs::new());
        assert_eq!(out[FLAT_KEY], ObsValue::Vector(Vec::new()));
    }
}
