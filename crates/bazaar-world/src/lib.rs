//! World state for Bazaar simulations.
//!
//! Owns everything components read and mutate during a step: the
//! [`Grid`] of tiles, the mobile [`Agent`]s with their inventories and
//! coin, and the optional [`Planner`]. Also provides the serializable
//! snapshots the dense log records.
//!
//! All mutation of quantities that must stay non-negative (inventory,
//! coin, escrow) goes through checked methods returning
//! [`ComponentError`](bazaar_core::ComponentError), so a component defect
//! surfaces as an error instead of corrupting state.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod grid;
pub mod inventory;
pub mod market;
pub mod snapshot;
pub mod world;

pub use agent::{Agent, Planner};
pub use grid::{Grid, Tile};
pub use inventory::Inventory;
pub use market::MarketHistory;
pub use snapshot::{AgentSnapshot, WorldSnapshot};
pub use world::World;
