//! Observation values and action-mask assembly for Bazaar simulations.
//!
//! Every agent's observation is an ordered map from namespaced key to
//! [`ObsValue`]. Components and scenarios produce fragments; the
//! orchestrator merges them, attaches the `"action_mask"` entry built by
//! [`mask`], and optionally [`flatten`]s the result.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod flatten;
pub mod mask;
pub mod value;

pub use flatten::{flatten, FLAT_KEY};
pub use mask::{assemble_mask, MaskSegment, ACTION_MASK_KEY};
pub use value::{AgentObs, ObsValue, Observation};
