//! Dense episode logs for Bazaar simulations.
//!
//! A [`DenseLog`] records one episode in full: agent states every step,
//! world snapshots at a fixed stride, submitted actions, rewards and the
//! events each component emitted. Logs export to JSON and carry a stable
//! FNV-1a [`fingerprint`](DenseLog::fingerprint), so two runs can be
//! checked for bit-exact determinism and, on mismatch, narrowed to the
//! first diverging step with [`first_divergence`].
//!
//! # Architecture
//!
//! - [`DenseLogRecorder`] accumulates a log while an episode runs
//! - [`DenseLog`] is the finished, immutable record
//! - [`hash`] holds the FNV-1a primitives
//! - [`compare`] locates the first divergence between two logs

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod compare;
pub mod error;
pub mod hash;
pub mod log;
pub mod recorder;

pub use compare::{first_divergence, DivergenceKind, DivergenceReport};
pub use error::ReplayError;
pub use hash::{agents_hash, world_hash};
pub use log::{DenseLog, StepEvents};
pub use recorder::DenseLogRecorder;
