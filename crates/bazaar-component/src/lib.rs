//! Component trait, action slices and registry for Bazaar simulations.
//!
//! A [`Component`] is one independently authored behaviour: it declares
//! the action subspaces it contributes per [`AgentClass`], reports which
//! of those actions are legal, applies the legal ones against the shared
//! [`World`](bazaar_world::World) through a [`ComponentContext`], and
//! contributes observation fragments. The orchestrator composes an
//! ordered list of components into one step.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod component;
pub mod context;
pub mod registry;
pub mod slice;

pub use component::{ActionSubspace, AgentClass, Component};
pub use context::ComponentContext;
pub use registry::{parse_config, ComponentFactory, ComponentRegistry};
pub use slice::{ActionSlice, SubAction};
