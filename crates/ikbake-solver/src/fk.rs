//! Forward-kinematics evaluation over a bone chain

use std::collections::HashMap;

use glam::{Mat4, Vec3};
use ikbake_motion::Motion;
use ikbake_rig::BoneLinks;

/// Global positions of every bone in `links` at `fno`
///
/// Walks the chain root to tip, composing the rest offset from the parent
/// plus the keyed translation with the keyed rotation.
#[must_use]
pub fn calc_global_pos(links: &BoneLinks, motion: &Motion, fno: u32) -> HashMap<String, Vec3> {
    let (positions, _) = calc_global_mats(links, motion, fno);
    positions
}

/// Global positions and accumulated transforms of every bone in `links`
///
/// The matrices are what the CCD step inverts to move into a link's local
/// frame.
#[must_use]
pub fn calc_global_mats(
    links: &BoneLinks,
    motion: &Motion,
    fno: u32,
) -> (HashMap<String, Vec3>, HashMap<String, Mat4>) {
    let mut positions = HashMap::with_capacity(links.len());
    let mut mats = HashMap::with_capacity(links.len());

    let mut mat = Mat4::IDENTITY;
    let mut parent_pos = Vec3::ZERO;
    for bone in links {
        let bf = motion.calc_bf(&bone.name, fno);
        let rel = bone.position - parent_pos + bf.position;
        mat = mat * Mat4::from_translation(rel) * Mat4::from_quat(bf.rotation);
        positions.insert(bone.name.clone(), mat.transform_point3(Vec3::ZERO));
        mats.insert(bone.name.clone(), mat);
        parent_pos = bone.position;
    }

    (positions, mats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use ikbake_motion::BoneFrame;
    use ikbake_rig::{Bone, Model};

    fn chain_model() -> Model {
        Model::new(
            "chain",
            vec![
                Bone::new("root", 0, None, Vec3::ZERO),
                Bone::new("mid", 1, Some(0), Vec3::new(1.0, 0.0, 0.0)),
                Bone::new("tip", 2, Some(1), Vec3::new(2.0, 0.0, 0.0)),
            ],
        )
    }

    #[test]
    fn rest_pose_positions() {
        let model = chain_model();
        let links = model.links_to_root("tip");
        let motion = Motion::new();
        let positions = calc_global_pos(&links, &motion, 0);
        assert!((positions["root"] - Vec3::ZERO).length() < 1e-6);
        assert!((positions["mid"] - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
        assert!((positions["tip"] - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn rotation_swings_descendants() {
        let model = chain_model();
        let links = model.links_to_root("tip");
        let mut motion = Motion::new();
        let quarter = Quat::from_axis_angle(Vec3::Z, 90_f32.to_radians());
        motion.regist_bf(BoneFrame::with_rotation(0, quarter), "mid", 0);

        let positions = calc_global_pos(&links, &motion, 0);
        assert!((positions["mid"] - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert!((positions["tip"] - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn translation_keys_move_the_chain() {
        let model = chain_model();
        let links = model.links_to_root("tip");
        let mut motion = Motion::new();
        let mut bf = BoneFrame::identity(0);
        bf.position = Vec3::new(0.0, 3.0, 0.0);
        motion.regist_bf(bf, "root", 0);

        let positions = calc_global_pos(&links, &motion, 0);
        assert!((positions["tip"] - Vec3::new(2.0, 3.0, 0.0)).length() < 1e-5);
    }
}
