//! Bone and IK metadata

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A single bone of a skeletal model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bone {
    /// Bone name, the key used by motion tracks
    pub name: String,
    /// Index into the model's bone table
    pub index: usize,
    /// Parent bone index, `None` for roots
    pub parent_index: Option<usize>,
    /// World-space rest position
    pub position: Vec3,
    /// Explicit local X axis override
    pub local_x_vector: Option<Vec3>,
    /// Twist axis; a twist-only bone cannot participate in CCD
    pub fixed_axis: Option<Vec3>,
    /// Capability flags
    pub flags: BoneFlags,
    /// IK chain definition, present when `flags.has_ik`
    pub ik: Option<IkSpec>,
}

impl Bone {
    /// Create a plain FK bone
    #[must_use]
    pub fn new(name: impl Into<String>, index: usize, parent_index: Option<usize>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            index,
            parent_index,
            position,
            local_x_vector: None,
            fixed_axis: None,
            flags: BoneFlags::default(),
            ik: None,
        }
    }

    /// Whether this bone drives an IK chain
    #[must_use]
    pub const fn has_ik(&self) -> bool {
        self.flags.has_ik && self.ik.is_some()
    }

    /// Whether this bone is twist-only (non-zero fixed axis)
    #[must_use]
    pub fn is_twist(&self) -> bool {
        self.fixed_axis.is_some_and(|axis| axis != Vec3::ZERO)
    }
}

/// Bone capability flags
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoneFlags {
    /// The bone drives an IK chain
    pub has_ik: bool,
    /// The bone is shown to (and animatable by) the user
    pub visible: bool,
    /// The bone accepts rotation keys. Carried through from the parsed
    /// model for the writer and other external consumers; the bake itself
    /// never reads it
    pub rotatable: bool,
}

impl Default for BoneFlags {
    fn default() -> Self {
        Self {
            has_ik: false,
            visible: true,
            rotatable: true,
        }
    }
}

/// IK chain definition attached to an IK bone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IkSpec {
    /// Index of the effector bone the chain pulls toward the IK bone
    pub target_index: usize,
    /// Maximum CCD iterations per frame
    pub loop_count: u32,
    /// Maximum angular step per CCD micro-rotation, radians
    pub limit_radian: f32,
    /// Chain links ordered from near-effector upward
    pub links: Vec<IkLink>,
}

/// One rotatable link of an IK chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IkLink {
    /// Index of the link bone
    pub bone_index: usize,
    /// Euler clamp box in degrees, `(min, max)` per component
    pub limit: Option<(Vec3, Vec3)>,
}

impl IkLink {
    /// An unconstrained link
    #[must_use]
    pub const fn new(bone_index: usize) -> Self {
        Self {
            bone_index,
            limit: None,
        }
    }

    /// A link clamped to an Euler box in degrees
    #[must_use]
    pub const fn with_limit(bone_index: usize, limit_min: Vec3, limit_max: Vec3) -> Self {
        Self {
            bone_index,
            limit: Some((limit_min, limit_max)),
        }
    }
}
