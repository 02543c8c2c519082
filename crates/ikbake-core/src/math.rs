//! Math extensions for motion baking
//!
//! Quaternion helpers the baking pipeline needs beyond what glam ships:
//! rotation magnitudes in degrees, minimal-arc rotations, Euler conversions,
//! double-cover canonicalization, and the local-axis (swing/twist)
//! decomposition used by the rotation transfer.

use glam::{EulerRot, Quat, Vec3};

/// Below this squared length a vector or quaternion part is treated as zero
const DEGENERATE_EPS: f32 = 1e-9;

/// Extension methods on [`glam::Quat`] used throughout the bake pipeline
pub trait QuatExt {
    /// Rotation magnitude in degrees, in `[0, 180]`
    #[must_use]
    fn to_degree(self) -> f32;

    /// Euler angles in degrees, intrinsic XYZ order
    #[must_use]
    fn to_euler_degrees(self) -> Vec3;

    /// Unit quaternion with a non-negative scalar component
    #[must_use]
    fn canonicalized(self) -> Quat;
}

impl QuatExt for Quat {
    fn to_degree(self) -> f32 {
        (2.0 * self.w.abs().min(1.0).acos()).to_degrees()
    }

    fn to_euler_degrees(self) -> Vec3 {
        let (x, y, z) = self.to_euler(EulerRot::XYZ);
        Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
    }

    fn canonicalized(self) -> Quat {
        let q = self.normalize();
        if q.w < 0.0 {
            -q
        } else {
            q
        }
    }
}

/// Build a quaternion from Euler angles in degrees, intrinsic XYZ order
#[must_use]
pub fn from_euler_degrees(angles: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::XYZ,
        angles.x.to_radians(),
        angles.y.to_radians(),
        angles.z.to_radians(),
    )
}

/// Minimal rotation mapping the direction of `from` onto the direction of `to`
///
/// Degenerate inputs (zero-length vectors) yield the identity.
#[must_use]
pub fn rotation_to(from: Vec3, to: Vec3) -> Quat {
    if from.length_squared() < DEGENERATE_EPS || to.length_squared() < DEGENERATE_EPS {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(from.normalize(), to.normalize())
}

/// A rotation split along a bone's local axes
///
/// `x` is the twist about the local X axis, `yz` the residual swing
/// (`qq == x * yz`). The swing is further resolved into `y` and `z`
/// (`yz == y * z`); those two components are diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct AxisParts {
    /// Twist about the local X axis
    pub x: Quat,
    /// Component of the swing about the derived local Y axis
    pub y: Quat,
    /// Component of the swing about the derived local Z axis
    pub z: Quat,
    /// Full swing perpendicular to the local X axis
    pub yz: Quat,
}

/// Split `qq` into a twist about `local_x_axis` and the residual swing
///
/// The twist is the projection of the rotation onto the axis; the swing is
/// whatever remains, so `x * yz` recomposes `qq` exactly. The swing is then
/// resolved against the conventional local Z (−Z orthogonalized against the
/// bone axis) the same way, giving `yz == y * z`.
#[must_use]
pub fn separate_local_qq(qq: Quat, local_x_axis: Vec3) -> AxisParts {
    let x_axis = if local_x_axis.length_squared() < DEGENERATE_EPS {
        Vec3::X
    } else {
        local_x_axis.normalize()
    };

    let x = twist_about(qq, x_axis);
    let yz = x.inverse() * qq;

    let z_axis = orthogonal_z(x_axis);
    let z = twist_about(yz, z_axis);
    let y = yz * z.inverse();

    AxisParts { x, y, z, yz }
}

/// Twist component of `q` about a unit `axis`
fn twist_about(q: Quat, axis: Vec3) -> Quat {
    let proj = q.xyz().dot(axis);
    let twist = Quat::from_xyzw(axis.x * proj, axis.y * proj, axis.z * proj, q.w);
    if twist.length_squared() < DEGENERATE_EPS {
        // Pure 180-degree swing: no twist about the axis
        Quat::IDENTITY
    } else {
        twist.normalize()
    }
}

/// Conventional local Z for swing resolution, kept orthogonal to the bone axis
fn orthogonal_z(x_axis: Vec3) -> Vec3 {
    let z = Vec3::NEG_Z - x_axis * Vec3::NEG_Z.dot(x_axis);
    if z.length_squared() < DEGENERATE_EPS {
        // Bone axis is parallel to Z; any perpendicular works
        x_axis.cross(Vec3::Y).normalize()
    } else {
        z.normalize()
    }
}

/// Round each component to three decimals, the precision used for rest-pose
/// comparisons and log output
#[must_use]
pub fn round3(v: Vec3) -> Vec3 {
    Vec3::new(
        (v.x * 1000.0).round() / 1000.0,
        (v.y * 1000.0).round() / 1000.0,
        (v.z * 1000.0).round() / 1000.0,
    )
}
