//! Cyclic Coordinate Descent over an IK chain

use glam::Vec3;
use ikbake_core::{math, QuatExt};
use ikbake_motion::Motion;
use ikbake_rig::BoneLinks;
use serde::{Deserialize, Serialize};

use crate::fk;

/// Squared length under which a direction is considered degenerate
const DEGENERATE_EPS: f32 = 1e-9;
/// Micro-rotations under this angle (radians) are not worth applying
const MIN_STEP_RADIAN: f32 = 1e-4;

/// One rotatable link of a resolved IK chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IkChainLink {
    /// Link bone name
    pub name: String,
    /// Maximum angular step per CCD micro-rotation, degrees
    pub degree_limit: f32,
    /// Euler clamp box in degrees applied to the composed rotation
    pub limit: Option<(Vec3, Vec3)>,
}

/// A resolved IK chain: the effector plus its rotatable links
///
/// Links are ordered near-effector first, the way CCD visits them. Twist-only
/// bones are filtered out before the chain is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IkChain {
    /// Effector bone name, the tip the chain steers
    pub effector: String,
    /// Rotatable links, near-effector to root-most
    pub links: Vec<IkChainLink>,
}

/// Run up to `max_count` CCD passes over the chain at `fno`
///
/// Each pass visits every link, rotating it by the minimal arc that maps the
/// effector direction onto the target direction in the link's local frame,
/// clamped to the link's unit angle and Euler box. Updated keys are
/// registered on `motion` in place. Degenerate geometry (zero-length or
/// antiparallel directions) skips the link for that pass.
///
/// Convergence is judged by the caller; this function only steps.
pub fn solve_step(
    effector_links: &BoneLinks,
    motion: &mut Motion,
    fno: u32,
    target_pos: Vec3,
    chain: &IkChain,
    max_count: u32,
) {
    for _ in 0..max_count {
        for link in &chain.links {
            let (positions, mats) = fk::calc_global_mats(effector_links, motion, fno);
            let Some(&global_effector) = positions.get(&chain.effector) else {
                return;
            };
            let Some(joint_mat) = mats.get(&link.name) else {
                continue;
            };

            let inv = joint_mat.inverse();
            let local_effector = inv.transform_point3(global_effector);
            let local_target = inv.transform_point3(target_pos);
            if local_effector.length_squared() < DEGENERATE_EPS
                || local_target.length_squared() < DEGENERATE_EPS
            {
                continue;
            }

            let effector_dir = local_effector.normalize();
            let target_dir = local_target.normalize();
            let radian = effector_dir.dot(target_dir).clamp(-1.0, 1.0).acos();
            if radian < MIN_STEP_RADIAN {
                continue;
            }
            let axis = effector_dir.cross(target_dir);
            if axis.length_squared() < DEGENERATE_EPS {
                continue;
            }

            let degree = radian.to_degrees().min(link.degree_limit);
            let delta = glam::Quat::from_axis_angle(axis.normalize(), degree.to_radians());

            let mut bf = motion.calc_bf(&link.name, fno);
            let mut rotation = bf.rotation * delta;
            if let Some((limit_min, limit_max)) = link.limit {
                let euler = rotation.to_euler_degrees().clamp(limit_min, limit_max);
                rotation = math::from_euler_degrees(euler);
            }
            bf.rotation = rotation;
            motion.regist_bf(bf, &link.name, fno);
        }
    }
}
