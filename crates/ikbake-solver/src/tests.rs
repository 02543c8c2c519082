//! End-to-end bake scenarios

use glam::{Quat, Vec3};
use ikbake_core::{math::separate_local_qq, Error, QuatExt};
use ikbake_motion::{BoneFrame, Motion};
use ikbake_rig::{Bone, IkLink, IkSpec, Model};

use crate::pool::bake_all;
use crate::service::{BakeOptions, BakeService};
use crate::{fk, transfer};

fn rot_z(degrees: f32) -> Quat {
    Quat::from_axis_angle(Vec3::Z, degrees.to_radians())
}

fn rot_y(degrees: f32) -> Quat {
    Quat::from_axis_angle(Vec3::Y, degrees.to_radians())
}

fn rot_x(degrees: f32) -> Quat {
    Quat::from_axis_angle(Vec3::X, degrees.to_radians())
}

fn translated(fno: u32, position: Vec3) -> BoneFrame {
    let mut bf = BoneFrame::identity(fno);
    bf.position = position;
    bf
}

fn options(max_workers: usize) -> BakeOptions {
    BakeOptions {
        max_workers,
        ..BakeOptions::default()
    }
}

/// root -> knee -> ankle, with a leg IK bone reaching for the ankle
fn reach_rig(link_limit: Option<(Vec3, Vec3)>) -> Model {
    let mut ik_bone = Bone::new("leg_ik", 3, Some(0), Vec3::new(1.0, 0.0, 0.0));
    ik_bone.flags.has_ik = true;
    ik_bone.ik = Some(IkSpec {
        target_index: 2,
        loop_count: 10,
        limit_radian: 4.0,
        links: vec![match link_limit {
            Some((min, max)) => IkLink::with_limit(1, min, max),
            None => IkLink::new(1),
        }],
    });
    Model::new(
        "reach",
        vec![
            Bone::new("root", 0, None, Vec3::ZERO),
            Bone::new("knee", 1, Some(0), Vec3::ZERO),
            Bone::new("ankle", 2, Some(1), Vec3::new(1.0, 0.0, 0.0)),
            ik_bone,
        ],
    )
}

fn effector_pos(model: &Model, motion: &Motion, effector: &str, fno: u32) -> Vec3 {
    let links = model.links_to_root(effector);
    fk::calc_global_pos(&links, motion, fno)[effector]
}

#[test]
fn single_link_reach_bakes_onto_the_knee() {
    let model = reach_rig(None);
    let mut motion = Motion::new();
    // The IK key drags the ankle from (1,0,0) to (0,1,0)
    motion.regist_bf(translated(0, Vec3::new(-1.0, 1.0, 0.0)), "leg_ik", 0);

    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());

    assert!(motion.get_bone_fnos("leg_ik").is_empty(), "ik track must be deleted");
    let reached = effector_pos(&model, &motion, "ankle", 0);
    assert!(
        (reached - Vec3::new(0.0, 1.0, 0.0)).length() < 0.1,
        "ankle ended at {reached}"
    );
    // The knee carries the solve as a plain FK key
    assert_eq!(motion.get_bone_fnos("knee"), vec![0]);
}

#[test]
fn euler_limit_is_honored_when_the_target_is_unreachable() {
    let mut model = reach_rig(Some((Vec3::ZERO, Vec3::new(0.0, 0.0, 90.0))));
    if let Some(ik) = model.bones[3].ik.as_mut() {
        // Small unit angle: several CCD steps walk up to the clamp boundary
        ik.limit_radian = 1.0;
    }
    let model = Model::new("reach", model.bones);
    let mut motion = Motion::new();
    // Slight bend so the very first CCD step has a usable rotation axis
    motion.regist_bf(BoneFrame::with_rotation(0, rot_z(10.0)), "knee", 0);
    // Target at (-1,0,0), behind the clamp
    motion.regist_bf(translated(0, Vec3::new(-2.0, 0.0, 0.0)), "leg_ik", 0);

    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());

    let reached = effector_pos(&model, &motion, "ankle", 0);
    assert!(
        (reached - Vec3::new(-1.0, 0.0, 0.0)).length() > 0.1,
        "the clamp makes the target unreachable"
    );
    let euler = motion.calc_bf("knee", 0).rotation.to_euler_degrees();
    assert!((euler.z - 90.0).abs() < 1e-3, "knee stopped at the clamp, got {euler}");
    assert!(euler.x.abs() < 1e-3 && euler.y.abs() < 1e-3);
}

#[test]
fn twist_links_are_excluded_and_survive_untouched() {
    let mut twist = Bone::new("twist", 1, Some(0), Vec3::ZERO);
    twist.fixed_axis = Some(Vec3::X);
    let mut ik_bone = Bone::new("leg_ik", 4, Some(0), Vec3::new(1.0, 0.0, 0.0));
    ik_bone.flags.has_ik = true;
    ik_bone.ik = Some(IkSpec {
        target_index: 3,
        loop_count: 10,
        limit_radian: 4.0,
        // Near-effector order: knee first, then the twist bone
        links: vec![IkLink::new(2), IkLink::new(1)],
    });
    let model = Model::new(
        "twisted",
        vec![
            Bone::new("root", 0, None, Vec3::ZERO),
            twist,
            Bone::new("knee", 2, Some(1), Vec3::ZERO),
            Bone::new("ankle", 3, Some(2), Vec3::new(1.0, 0.0, 0.0)),
            ik_bone,
        ],
    );

    let mut motion = Motion::new();
    motion.regist_bf(BoneFrame::with_rotation(0, rot_x(20.0)), "twist", 0);
    motion.regist_bf(translated(0, Vec3::new(-1.0, 1.0, 0.0)), "leg_ik", 0);
    let original_twist = motion.track_cloned("twist");

    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());

    assert_eq!(motion.track_cloned("twist"), original_twist, "twist track must not change");
    let reached = effector_pos(&model, &motion, "ankle", 0);
    assert!((reached - Vec3::new(0.0, 1.0, 0.0)).length() < 0.1);
    assert!(motion.has_keys("knee"), "the knee absorbs the whole solve");
}

#[test]
fn hidden_effector_hands_rotation_to_the_matching_child() {
    let mut ankle = Bone::new("ankle", 2, Some(1), Vec3::new(1.0, 0.0, 0.0));
    ankle.flags.visible = false;
    let mut ik_bone = Bone::new("leg_ik", 3, Some(0), Vec3::new(1.0, 0.0, 0.0));
    ik_bone.flags.has_ik = true;
    ik_bone.ik = Some(IkSpec {
        target_index: 2,
        loop_count: 10,
        limit_radian: 4.0,
        links: vec![IkLink::new(1)],
    });
    let toe = Bone::new("toe", 4, Some(3), Vec3::new(1.0, 0.0, 0.0));
    let model = Model::new(
        "hidden",
        vec![
            Bone::new("root", 0, None, Vec3::ZERO),
            Bone::new("knee", 1, Some(0), Vec3::ZERO),
            ankle,
            ik_bone,
            toe,
        ],
    );

    let mut motion = Motion::new();
    motion.regist_bf(BoneFrame::with_rotation(0, rot_z(30.0)), "leg_ik", 0);

    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());

    // The toe shares the ankle's rest position and is visible, so it takes
    // the IK bone's authored spin; the hidden ankle keeps no keys
    assert!(!motion.has_keys("ankle"));
    let toe_rot = motion.calc_bf("toe", 0).rotation;
    assert!(toe_rot.dot(rot_z(30.0)).abs() > 1.0 - 1e-4, "toe got {toe_rot}");
    assert!(motion.get_bone_fnos("leg_ik").is_empty());
}

#[test]
fn parent_suffix_rotation_composes_into_the_transfer() {
    let model = reach_rig(None);
    let mut motion = Motion::new();
    motion.regist_bf(BoneFrame::with_rotation(10, rot_z(20.0)), "leg_ik", 10);
    motion.regist_bf(BoneFrame::with_rotation(10, rot_y(30.0)), "leg_ik親", 10);

    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());

    let parts = separate_local_qq(rot_y(30.0) * rot_z(20.0), Vec3::X);
    let twist = Quat::from_axis_angle(Vec3::X, parts.x.to_degree().to_radians());
    let expected = twist * parts.yz;
    let got = motion.calc_bf("ankle", 10).rotation;
    assert!(got.dot(expected).abs() > 1.0 - 1e-4, "ankle got {got}, expected {expected}");
}

#[test]
fn parallel_result_matches_sequential_exactly() {
    let mut left_ik = Bone::new("left_ik", 3, Some(0), Vec3::new(1.0, 0.0, 0.0));
    left_ik.flags.has_ik = true;
    left_ik.ik = Some(IkSpec {
        target_index: 2,
        loop_count: 10,
        limit_radian: 4.0,
        links: vec![IkLink::new(1)],
    });
    let mut right_ik = Bone::new("right_ik", 6, Some(0), Vec3::new(-1.0, 0.0, 0.0));
    right_ik.flags.has_ik = true;
    right_ik.ik = Some(IkSpec {
        target_index: 5,
        loop_count: 10,
        limit_radian: 4.0,
        links: vec![IkLink::new(4)],
    });
    let model = Model::new(
        "both_legs",
        vec![
            Bone::new("root", 0, None, Vec3::ZERO),
            Bone::new("left_knee", 1, Some(0), Vec3::ZERO),
            Bone::new("left_ankle", 2, Some(1), Vec3::new(1.0, 0.0, 0.0)),
            left_ik,
            Bone::new("right_knee", 4, Some(0), Vec3::ZERO),
            Bone::new("right_ankle", 5, Some(4), Vec3::new(-1.0, 0.0, 0.0)),
            right_ik,
        ],
    );

    let mut source = Motion::new();
    source.regist_bf(translated(0, Vec3::new(-1.0, 1.0, 0.0)), "left_ik", 0);
    source.regist_bf(translated(5, Vec3::new(-1.0, -1.0, 0.0)), "left_ik", 5);
    source.regist_bf(translated(0, Vec3::new(1.0, -1.0, 0.0)), "right_ik", 0);

    let mut parallel = source.clone();
    let mut sequential = source;
    assert!(bake_all(&model, &mut parallel, &options(4)).unwrap());
    assert!(bake_all(&model, &mut sequential, &options(1)).unwrap());

    assert_eq!(parallel, sequential, "disjoint chains must bake identically");
}

#[test]
fn motion_without_ik_keys_is_untouched() {
    let model = reach_rig(None);
    let mut motion = Motion::new();
    motion.regist_bf(BoneFrame::with_rotation(0, rot_z(15.0)), "knee", 0);
    let original = motion.clone();

    assert!(bake_all(&model, &mut motion, &options(2)).unwrap());
    assert_eq!(motion, original);
}

#[test]
fn rebaking_the_output_is_a_noop() {
    let model = reach_rig(None);
    let mut motion = Motion::new();
    motion.regist_bf(translated(0, Vec3::new(-1.0, 1.0, 0.0)), "leg_ik", 0);
    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());

    let baked = motion.clone();
    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());
    assert_eq!(motion, baked, "no IK tracks remain, so nothing may change");
}

#[test]
fn zero_link_chain_is_pure_rotation_transfer() {
    let mut ik_bone = Bone::new("leg_ik", 3, Some(0), Vec3::new(1.0, 0.0, 0.0));
    ik_bone.flags.has_ik = true;
    ik_bone.ik = Some(IkSpec {
        target_index: 2,
        loop_count: 10,
        limit_radian: 4.0,
        links: Vec::new(),
    });
    let model = Model::new(
        "no_links",
        vec![
            Bone::new("root", 0, None, Vec3::ZERO),
            Bone::new("knee", 1, Some(0), Vec3::ZERO),
            Bone::new("ankle", 2, Some(1), Vec3::new(1.0, 0.0, 0.0)),
            ik_bone,
        ],
    );

    let mut motion = Motion::new();
    motion.regist_bf(BoneFrame::with_rotation(0, rot_z(45.0)), "leg_ik", 0);

    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());

    assert!(!motion.has_keys("knee"), "no links, no CCD output");
    let ankle_rot = motion.calc_bf("ankle", 0).rotation;
    assert!(ankle_rot.dot(rot_z(45.0)).abs() > 1.0 - 1e-4);
    assert!(motion.get_bone_fnos("leg_ik").is_empty());
}

#[test]
fn broken_target_index_fails_with_the_bone_name() {
    let mut model = reach_rig(None);
    if let Some(ik) = model.bones[3].ik.as_mut() {
        ik.target_index = 99;
    }
    let model = Model::new("broken", model.bones);

    let mut motion = Motion::new();
    motion.regist_bf(translated(0, Vec3::new(-1.0, 1.0, 0.0)), "leg_ik", 0);

    let err = bake_all(&model, &mut motion, &options(1)).unwrap_err();
    assert!(matches!(err, Error::IkTarget { ref bone } if bone == "leg_ik"));
}

#[test]
fn broken_link_index_fails_with_the_bone_name() {
    let mut model = reach_rig(None);
    if let Some(ik) = model.bones[3].ik.as_mut() {
        ik.links = vec![IkLink::new(42)];
    }
    let model = Model::new("broken", model.bones);

    let mut motion = Motion::new();
    motion.regist_bf(translated(0, Vec3::new(-1.0, 1.0, 0.0)), "leg_ik", 0);

    let err = bake_all(&model, &mut motion, &options(1)).unwrap_err();
    assert!(matches!(err, Error::IkLink { ref bone } if bone == "leg_ik"));
}

#[test]
fn baked_rotations_stay_unit_and_canonical() {
    let model = reach_rig(None);
    let mut motion = Motion::new();
    motion.regist_bf(translated(0, Vec3::new(-1.0, 1.0, 0.0)), "leg_ik", 0);
    motion.regist_bf(translated(8, Vec3::new(-0.5, 0.5, 0.5)), "leg_ik", 8);

    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());

    let names: Vec<String> = motion.bone_names().map(str::to_string).collect();
    for name in names {
        for (fno, bf) in motion.track(&name).unwrap() {
            assert!(
                (bf.rotation.length() - 1.0).abs() < 1e-5,
                "non-unit rotation on {name} at {fno}"
            );
            assert!(bf.rotation.w >= 0.0, "non-canonical rotation on {name} at {fno}");
        }
    }
}

#[test]
fn every_densified_frame_gets_explicit_link_keys() {
    let model = reach_rig(None);
    let mut motion = Motion::new();
    motion.regist_bf(translated(0, Vec3::new(-1.0, 1.0, 0.0)), "leg_ik", 0);
    motion.regist_bf(translated(10, Vec3::new(-1.0, -1.0, 0.0)), "leg_ik", 10);

    assert!(bake_all(&model, &mut motion, &options(1)).unwrap());

    let knee_fnos = motion.get_bone_fnos("knee");
    let ankle_fnos = motion.get_bone_fnos("ankle");
    for fno in [0, 10] {
        assert!(knee_fnos.contains(&fno), "knee missing a key at {fno}");
        assert!(ankle_fnos.contains(&fno), "transferee missing a key at {fno}");
    }
}

#[test]
fn service_runs_a_whole_bake() {
    let model = reach_rig(None);
    let mut motion = Motion::new();
    motion.regist_bf(translated(0, Vec3::new(-1.0, 1.0, 0.0)), "leg_ik", 0);

    let service = BakeService::new(options(2));
    assert!(service.execute(&model, &mut motion).unwrap());
    assert!(motion.get_bone_fnos("leg_ik").is_empty());
}

#[test]
fn transferee_selection_is_deterministic_across_equal_children() {
    let mut ankle = Bone::new("ankle", 2, Some(1), Vec3::new(1.0, 0.0, 0.0));
    ankle.flags.visible = false;
    let mut ik_bone = Bone::new("leg_ik", 3, Some(0), Vec3::new(1.0, 0.0, 0.0));
    ik_bone.flags.has_ik = true;
    ik_bone.ik = Some(IkSpec {
        target_index: 2,
        loop_count: 10,
        limit_radian: 4.0,
        links: vec![IkLink::new(1)],
    });
    let first_toe = Bone::new("toe_a", 4, Some(3), Vec3::new(1.0, 0.0, 0.0));
    let second_toe = Bone::new("toe_b", 5, Some(3), Vec3::new(1.0, 0.0, 0.0));
    let model = Model::new(
        "two_toes",
        vec![
            Bone::new("root", 0, None, Vec3::ZERO),
            Bone::new("knee", 1, Some(0), Vec3::ZERO),
            ankle,
            ik_bone,
            first_toe,
            second_toe,
        ],
    );

    let ik = model.bone("leg_ik").unwrap();
    let effector = model.bone("ankle").unwrap();
    // Lowest bone index wins among identically-positioned children
    assert_eq!(transfer::select_transferee(&model, ik, effector).name, "toe_a");
}
