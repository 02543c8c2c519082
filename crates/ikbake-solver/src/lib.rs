//! # ikbake Solver
//!
//! The baking pipeline: forward-kinematics evaluation over bone chains,
//! the per-frame CCD solving step, rotation transfer onto visible bones,
//! and the engine that drives one bake job per IK bone over a bounded
//! worker pool.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod fk;
pub mod ik;
pub mod pool;
pub mod service;
pub mod transfer;

#[cfg(test)]
mod tests;

pub use engine::{bake_bone, BakedBone};
pub use ik::{IkChain, IkChainLink};
pub use pool::{bake_all, default_max_workers};
pub use service::{BakeOptions, BakeService};
pub use transfer::ParentKey;
