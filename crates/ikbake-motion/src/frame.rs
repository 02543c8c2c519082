//! Bone keyframes

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::bezier::Bezier;

/// Easing curves for the segment that ends at a keyframe
///
/// Each key owns the curves of its *arriving* segment: interpolation between
/// key `A` and key `B` reads `B`'s curves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Interp {
    /// Easing applied to the rotation slerp
    pub rotation: Bezier,
    /// Easing applied to the translation lerp
    pub translation: Bezier,
}

/// One keyframe of a bone track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneFrame {
    /// Frame number
    pub fno: u32,
    /// Local rotation, unit quaternion
    pub rotation: Quat,
    /// Local translation offset
    pub position: Vec3,
    /// Easing of the segment arriving at this key
    pub interp: Interp,
}

impl BoneFrame {
    /// An identity frame (no rotation, no translation, linear easing)
    #[must_use]
    pub fn identity(fno: u32) -> Self {
        Self {
            fno,
            rotation: Quat::IDENTITY,
            position: Vec3::ZERO,
            interp: Interp::default(),
        }
    }

    /// A rotation-only frame
    #[must_use]
    pub fn with_rotation(fno: u32, rotation: Quat) -> Self {
        Self {
            rotation,
            ..Self::identity(fno)
        }
    }
}

impl Default for BoneFrame {
    fn default() -> Self {
        Self::identity(0)
    }
}
