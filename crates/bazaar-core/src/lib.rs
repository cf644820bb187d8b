//! Core types for the Bazaar economic simulation framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace:
//! agent identifiers, action modes, resources, grid positions,
//! structured component events, and the error types surfaced by
//! construction and stepping.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod action;
pub mod error;
pub mod event;
pub mod id;
pub mod position;
pub mod resource;

pub use action::{Action, ActionMode};
pub use error::{ComponentError, ConfigError, StepError};
pub use event::{ComponentEvent, OrderSide};
pub use id::{AgentId, AgentKey, Timestep};
pub use position::{Direction, Position};
pub use resource::Resource;
