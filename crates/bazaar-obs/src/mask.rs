//! Action-mask assembly.
//!
//! Component masks never include a no-op slot. The assembled mask adds
//! the no-op entries the action encoding needs: one global leading slot
//! in single mode, one leading slot per subspace in multi mode. Unflattened
//! masks are a nested map from subspace name to its raw segment.

use indexmap::IndexMap;

use bazaar_core::ActionMode;

use crate::value::ObsValue;

/// Observation key the assembled mask is stored under.
pub const ACTION_MASK_KEY: &str = "action_mask";

/// One subspace's slice of an agent's mask, without a no-op slot.
#[derive(Clone, Copy, Debug)]
pub struct MaskSegment<'a> {
    /// Subspace name.
    pub name: &'a str,
    /// `1.0` for legal actions, `0.0` for illegal ones.
    pub mask: &'a [f32],
}

/// Build the `"action_mask"` value for one agent.
///
/// # Examples
///
/// ```
/// use bazaar_core::ActionMode;
/// use bazaar_obs::{assemble_mask, MaskSegment, ObsValue};
///
/// let segs = [
///     MaskSegment { name: "Gather", mask: &[1.0, 0.0] },
///     MaskSegment { name: "Build", mask: &[0.0] },
/// ];
/// assert_eq!(
///     assemble_mask(&segs, ActionMode::Single, true),
///     ObsValue::Vector(vec![1.0, 1.0, 0.0, 0.0]),
/// );
/// assert_eq!(
///     assemble_mask(&segs, ActionMode::Multi, true),
///     ObsValue::Vector(vec![1.0, 1.0, 0.0, 1.0, 0.0]),
/// );
/// ```
pub fn assemble_mask(segments: &[MaskSegment<'_>], mode: ActionMode, flatten: bool) -> ObsValue {
    if !flatten {
        let nested: IndexMap<String, ObsValue> = segments
            .iter()
            .map(|s| (s.name.to_string(), ObsValue::Vector(s.mask.to_vec())))
            .collect();
        return ObsValue::Nested(nested);
    }
    let total: usize = segments.iter().map(|s| s.mask.len()).sum();
    let mut out = Vec::with_capacity(total + segments.len() + 1);
    match mode {
        ActionMode::Single => {
            out.push(1.0);
            for s in segments {
                out.extend_from_slice(s.mask);
            }
        }
        ActionMode::Multi => {
            for s in segments {
                out.push(1.0);
                out.extend_from_slice(s.mask);
            }
        }
    }
    ObsValue::Vector(out)
}
