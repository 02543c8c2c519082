//! Rotation transfer from an IK bone onto its visible counterpart

use glam::{Quat, Vec3};
use ikbake_core::math::{round3, separate_local_qq};
use ikbake_core::QuatExt;
use ikbake_motion::Motion;
use ikbake_rig::{Bone, Model};
use serde::{Deserialize, Serialize};

/// Configurable lookup for the IK-parent bone name
///
/// Rigs following the MMD convention name the bone that carries an IK bone's
/// extra rotation by appending a literal suffix (`親`, "parent") to the IK
/// bone name. The suffix is configuration, not a hard-coded string in the
/// solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentKey {
    /// Literal suffix appended to an IK bone name
    pub suffix: String,
}

impl Default for ParentKey {
    fn default() -> Self {
        Self {
            suffix: "親".to_string(),
        }
    }
}

impl ParentKey {
    /// The conventional name of the IK-parent bone for `bone`
    #[must_use]
    pub fn parent_name(&self, bone: &str) -> String {
        format!("{bone}{}", self.suffix)
    }
}

/// Pick the bone that receives the IK bone's own rotation
///
/// A visible effector receives it directly. A hidden effector delegates to
/// the first child of the IK bone (by index) sharing the effector's rest
/// position at display precision, falling back to the effector itself.
#[must_use]
pub fn select_transferee<'a>(model: &'a Model, ik_bone: &Bone, effector: &'a Bone) -> &'a Bone {
    if effector.flags.visible {
        return effector;
    }
    for child in model.child_bones(ik_bone) {
        if round3(child.position) == round3(effector.position) {
            return child;
        }
    }
    effector
}

/// Re-express the IK bone's authored rotation on the transferee at `fno`
///
/// The IK bone's rotation composed with its IK-parent's rotation is split
/// against the transferee's local X axis; the twist is rebuilt about that
/// axis and, together with the residual swing, pre-multiplied onto the
/// transferee's key.
pub fn transfer_rotation(
    org_motion: &Motion,
    motion: &mut Motion,
    ik_name: &str,
    parent_key: &ParentKey,
    transferee: &str,
    transferee_x_axis: Vec3,
    fno: u32,
) {
    let ik_bf = org_motion.calc_bf(ik_name, fno);
    let ik_parent_bf = org_motion.calc_bf(&parent_key.parent_name(ik_name), fno);
    let ik_qq = ik_parent_bf.rotation * ik_bf.rotation;

    let parts = separate_local_qq(ik_qq, transferee_x_axis);
    tracing::debug!(
        fno,
        bone = ik_name,
        twist_degrees = parts.x.to_degree(),
        swing_degrees = parts.yz.to_degree(),
        "separated ik rotation for transfer"
    );

    let axis = if transferee_x_axis.length_squared() > f32::EPSILON {
        transferee_x_axis.normalize()
    } else {
        Vec3::X
    };
    let global_x_qq = Quat::from_axis_angle(axis, parts.x.to_degree().to_radians());

    let mut transferee_bf = motion.calc_bf(transferee, fno);
    transferee_bf.rotation = (global_x_qq * parts.yz) * transferee_bf.rotation;
    motion.regist_bf(transferee_bf, transferee, fno);
}
