//! # ikbake Rig
//!
//! Skeleton model for the bake pipeline: bones with IK metadata and
//! the parent-chain walks the FK evaluator and CCD solver run over.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bone;
pub mod model;

pub use bone::{Bone, BoneFlags, IkLink, IkSpec};
pub use model::{BoneLinks, Model};
