//! # ikbake Motion
//!
//! Sparse keyframed motion store: per-bone rotation/translation tracks keyed
//! by integer frame number, bezier-eased interpolation, exact-value key
//! registration with curve splitting, and the deviation scan that densifies
//! key sets before baking.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bezier;
pub mod frame;
pub mod motion;

pub use bezier::Bezier;
pub use frame::{BoneFrame, Interp};
pub use motion::{BoneTrack, Motion};
