//! Scheduling bake jobs over a bounded worker pool
//!
//! One job per IK bone. Jobs are isolated by clone-and-merge: every job
//! works on its own clone of the input motion and reports back exactly the
//! tracks it touched, so the shared store is never mutated concurrently and
//! parallel runs are bit-identical to sequential ones.

use std::collections::HashSet;

use ikbake_core::{Error, Result};
use ikbake_motion::{BoneTrack, Motion};
use ikbake_rig::{Bone, Model};
use rayon::prelude::*;
use tracing::warn;

use crate::engine;
use crate::service::BakeOptions;
use crate::transfer::ParentKey;

/// Hard ceiling on bake worker threads
const MAX_POOL_WORKERS: usize = 5;

/// What one job hands back for merging
struct JobOutput {
    ik_bone: String,
    tracks: Vec<(String, BoneTrack)>,
}

/// The worker cap for a run: 1 in execution-saving mode, else cpu count + 4
/// capped at 32
#[must_use]
pub fn default_max_workers(exec_saving: bool) -> usize {
    if exec_saving {
        1
    } else {
        let cpus = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        (cpus + 4).min(32)
    }
}

/// Bake every eligible IK bone of the model into FK rotations
///
/// Eligible bones have an IK chain and at least one key in the motion. Jobs
/// run on a pool of `min(5, max_workers)` threads; every job runs to
/// completion and the first failure in submission order is surfaced
/// afterwards. On success the working motion holds the merged result and
/// `true` is returned.
///
/// # Errors
///
/// Returns the first job failure (domain errors naming the offending IK
/// bone), or an internal error if the pool cannot be built.
pub fn bake_all(model: &Model, motion: &mut Motion, options: &BakeOptions) -> Result<bool> {
    let targets: Vec<&Bone> = model
        .bones
        .iter()
        .filter(|bone| bone.has_ik() && motion.has_keys(&bone.name))
        .collect();
    if targets.is_empty() {
        return Ok(true);
    }

    let workers = options.max_workers.clamp(1, MAX_POOL_WORKERS);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("ik2fk-{i}"))
        .build()
        .map_err(|e| Error::Internal(e.to_string()))?;

    let source = &*motion;
    let parent_key = &options.parent_key;
    let results: Vec<Result<JobOutput>> = pool.install(|| {
        targets
            .par_iter()
            .map(|bone| run_job(model, source, bone, parent_key))
            .collect()
    });

    let mut first_err = None;
    let mut merged: HashSet<String> = HashSet::new();
    for result in results {
        match result {
            Ok(output) => {
                motion.clear_bone(&output.ik_bone);
                for (name, track) in output.tracks {
                    if !merged.insert(name.clone()) {
                        warn!("bone '{name}' written by more than one bake job; chains are not disjoint");
                    }
                    motion.insert_track(name, track);
                }
            }
            Err(e) if first_err.is_none() => first_err = Some(e),
            Err(_) => {}
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(true),
    }
}

/// Run one bake job on a private clone of the motion
fn run_job(
    model: &Model,
    source: &Motion,
    ik_bone: &Bone,
    parent_key: &ParentKey,
) -> Result<JobOutput> {
    let mut working = source.clone();
    let baked = engine::bake_bone(model, &mut working, ik_bone, parent_key)?;

    let tracks = baked
        .written
        .iter()
        .filter_map(|name| working.track_cloned(name).map(|track| (name.clone(), track)))
        .collect();
    Ok(JobOutput {
        ik_bone: baked.ik_bone,
        tracks,
    })
}
