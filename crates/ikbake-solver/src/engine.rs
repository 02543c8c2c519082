//! The per-IK-bone bake engine
//!
//! One bake job takes a single IK bone and rewrites the working motion so
//! the bone's chain is expressed as plain FK rotations: densify the key set,
//! solve CCD frame by frame against the snapshot of the original motion,
//! keep the best pose each frame, then move the IK bone's own rotation onto
//! the transferee and drop the IK track.

use std::collections::HashMap;

use glam::Vec3;
use ikbake_core::{Error, Result};
use ikbake_motion::{BoneFrame, Motion};
use ikbake_rig::{Bone, BoneLinks, Model};
use tracing::{debug, info};

use crate::ik::{IkChain, IkChainLink};
use crate::transfer::{self, ParentKey};
use crate::{fk, ik};

/// Rotation deviation threshold for the densify pre-pass, degrees
const DENSIFY_DEGREES: f32 = 20.0;
/// Position deviation threshold for the densify pre-pass, world units
const DENSIFY_LENGTH: f32 = 3.0;
/// An effector within this distance of the target counts as converged
const CONVERGED: f32 = 0.1;
/// Per-component distance under which the solve is considered stalled
const STALLED: f32 = 0.05;

/// What a completed bake job wrote
#[derive(Debug)]
pub struct BakedBone {
    /// The IK bone whose track was baked away
    pub ik_bone: String,
    /// Bone tracks the job registered keys on (links and transferee)
    pub written: Vec<String>,
}

/// Bake one IK bone's chain into FK rotations on the working motion
///
/// # Errors
///
/// Fails with a domain error naming the IK bone when its target or one of
/// its links references a bone missing from the model.
pub fn bake_bone(
    model: &Model,
    motion: &mut Motion,
    ik_bone: &Bone,
    parent_key: &ParentKey,
) -> Result<BakedBone> {
    let bone_name = &ik_bone.name;
    let Some(ik) = ik_bone.ik.as_ref() else {
        return Ok(BakedBone {
            ik_bone: bone_name.clone(),
            written: Vec::new(),
        });
    };

    // Step 1: add explicit keys wherever the motion deviates from linear
    info!("-- bake preparation: start [{bone_name}]");
    let fnos = motion.get_differ_fnos(0, &[bone_name], DENSIFY_DEGREES, DENSIFY_LENGTH);
    let last_fno = fnos.last().copied().unwrap_or(0);
    let mut prev_sep = 0;
    for &fno in &fnos {
        let bf = motion.calc_bf(bone_name, fno);
        motion.regist_bf(bf, bone_name, fno);

        if fno / 1000 > prev_sep && last_fno > 0 {
            info!(
                "-- frame {fno}: done ({:.3}%) [key insertion - {bone_name}]",
                f64::from(fno) / f64::from(last_fno) * 100.0
            );
            prev_sep = fno / 1000;
        }
    }
    info!("-- bake preparation: done [{bone_name}]");

    // Step 2: resolve the chains
    let target_links = model.links_to_root(bone_name);
    let effector_bone = model
        .bone_at(ik.target_index)
        .ok_or_else(|| Error::IkTarget {
            bone: bone_name.clone(),
        })?;
    let effector_name = effector_bone.name.clone();
    let effector_links = model.links_to_root(&effector_name);

    let degree_limit = ik.limit_radian.to_degrees();
    let mut chain = IkChain {
        effector: effector_name,
        links: Vec::new(),
    };
    for link in &ik.links {
        let link_bone = model.bone_at(link.bone_index).ok_or_else(|| Error::IkLink {
            bone: bone_name.clone(),
        })?;
        if link_bone.is_twist() {
            // Twist-only bones cannot steer CCD
            continue;
        }
        chain.links.push(IkChainLink {
            name: link_bone.name.clone(),
            degree_limit,
            limit: link.limit,
        });
    }

    // Step 3: where the IK bone's own rotation ends up
    let transferee = transfer::select_transferee(model, ik_bone, effector_bone);
    let transferee_name = transferee.name.clone();
    let transferee_x_axis = model.local_x_axis(&transferee_name);

    // Step 4: per-frame solve against the snapshot
    let fnos = motion.get_bone_fnos(bone_name);
    let org_motion = motion.clone();
    motion.clear_bone(bone_name);

    let last_fno = fnos.last().copied().unwrap_or(0).max(1);
    let mut prev_sep = 0;
    for &fno in &fnos {
        let target_pos = fk::calc_global_pos(&target_links, &org_motion, fno)
            .get(bone_name)
            .copied()
            .ok_or_else(|| Error::UnknownBone(bone_name.clone()))?;

        solve_frame(&effector_links, motion, &org_motion, &chain, fno, target_pos, ik.loop_count);

        transfer::transfer_rotation(
            &org_motion,
            motion,
            bone_name,
            parent_key,
            &transferee_name,
            transferee_x_axis,
            fno,
        );

        debug!("-- frame {fno}: done [bake - {bone_name}]");
        if fno / 1000 > prev_sep {
            info!(
                "-- frame {fno}: done ({:.3}%) [bake - {bone_name}]",
                f64::from(fno) / f64::from(last_fno) * 100.0
            );
            prev_sep = fno / 1000;
        }
    }
    info!("-- bake: done [{bone_name}]");

    let mut written: Vec<String> = chain.links.iter().map(|l| l.name.clone()).collect();
    if !written.contains(&transferee_name) {
        written.push(transferee_name);
    }
    Ok(BakedBone {
        ik_bone: bone_name.clone(),
        written,
    })
}

/// Converge one frame: iterate CCD, keep the best pose seen, restore it
fn solve_frame(
    effector_links: &BoneLinks,
    motion: &mut Motion,
    org_motion: &Motion,
    chain: &IkChain,
    fno: u32,
    target_pos: Vec3,
    loop_count: u32,
) {
    // Seed the working keys with the original pose; it is also the best pose
    // seen so far
    let mut best: HashMap<String, BoneFrame> = HashMap::with_capacity(chain.links.len());
    for link in &chain.links {
        let bf = org_motion.calc_bf(&link.name, fno);
        best.insert(link.name.clone(), bf.clone());
        motion.regist_bf(bf, &link.name, fno);
    }

    let mut prev_diff: Option<Vec3> = None;
    for count in 0..loop_count {
        ik::solve_step(effector_links, motion, fno, target_pos, chain, 1);
        for link in &chain.links {
            let bf = motion.calc_bf(&link.name, fno);
            motion.regist_bf(bf, &link.name, fno);
        }

        let Some(&now_pos) = fk::calc_global_pos(effector_links, motion, fno).get(&chain.effector)
        else {
            break;
        };
        let diff = target_pos - now_pos;

        // Exact repeat or a per-component standstill means CCD has nothing
        // left to give this frame
        let stalled = prev_diff == Some(diff) || diff.abs().max_element() <= STALLED;
        let improved = prev_diff.map_or(true, |prev| diff.length() < prev.length());

        if improved {
            for link in &chain.links {
                best.insert(link.name.clone(), motion.calc_bf(&link.name, fno));
            }
            if diff.length() < CONVERGED {
                debug!(fno, count, diff = diff.length(), "ik bake converged");
                break;
            }
            if stalled {
                debug!(fno, count, diff = diff.length(), "ik bake stalled");
                break;
            }
            prev_diff = Some(diff);
        } else if stalled {
            debug!(fno, count, diff = diff.length(), "ik bake stalled after regression");
            break;
        }
    }

    // Put the best pose seen back onto the working motion
    for link in &chain.links {
        if let Some(bf) = best.get(&link.name) {
            motion.regist_bf(bf.clone(), &link.name, fno);
        }
    }
}
