//! The keyframed motion store

use std::collections::{BTreeSet, HashMap};

use glam::Quat;
use ikbake_core::QuatExt;
use serde::{Deserialize, Serialize};

use crate::bezier::Bezier;
use crate::frame::{BoneFrame, Interp};

/// Sparse keyframes of a single bone, ordered by frame number
pub type BoneTrack = std::collections::BTreeMap<u32, BoneFrame>;

/// A motion: per-bone sparse keyframe tracks keyed by frame number
///
/// `Clone` produces the deep snapshot the bake engine relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    tracks: HashMap<String, BoneTrack>,
}

impl Motion {
    /// An empty motion
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of bones carrying at least one key
    pub fn bone_names(&self) -> impl Iterator<Item = &str> {
        self.tracks
            .iter()
            .filter(|(_, t)| !t.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Whether the named bone has at least one explicit key
    #[must_use]
    pub fn has_keys(&self, name: &str) -> bool {
        self.tracks.get(name).is_some_and(|t| !t.is_empty())
    }

    /// The raw track of a bone, if present
    #[must_use]
    pub fn track(&self, name: &str) -> Option<&BoneTrack> {
        self.tracks.get(name)
    }

    /// Clone the track of a bone (used when merging job results)
    #[must_use]
    pub fn track_cloned(&self, name: &str) -> Option<BoneTrack> {
        self.tracks.get(name).cloned()
    }

    /// Replace the whole track of a bone
    pub fn insert_track(&mut self, name: impl Into<String>, track: BoneTrack) {
        self.tracks.insert(name.into(), track);
    }

    /// Delete a bone's track entirely; returns whether one existed
    pub fn clear_bone(&mut self, name: &str) -> bool {
        self.tracks.remove(name).is_some()
    }

    /// Sorted frame numbers carrying an explicit key for the bone
    #[must_use]
    pub fn get_bone_fnos(&self, name: &str) -> Vec<u32> {
        self.tracks
            .get(name)
            .map(|t| t.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Highest keyed frame across every track
    #[must_use]
    pub fn last_frame(&self) -> u32 {
        self.tracks
            .values()
            .filter_map(|t| t.keys().next_back().copied())
            .max()
            .unwrap_or(0)
    }

    /// Interpolated keyframe of `name` at `fno`
    ///
    /// Exact keys are cloned. Between keys the arriving key's easing curves
    /// drive a slerp/lerp from the previous key. Before the first key the
    /// previous pose is the identity at frame 0; past the last key the last
    /// key holds. Unknown bones yield the identity frame.
    #[must_use]
    pub fn calc_bf(&self, name: &str, fno: u32) -> BoneFrame {
        let Some(track) = self.tracks.get(name) else {
            return BoneFrame::identity(fno);
        };
        if track.is_empty() {
            return BoneFrame::identity(fno);
        }
        if let Some(bf) = track.get(&fno) {
            return bf.clone();
        }

        let prev = track.range(..fno).next_back().map(|(_, bf)| bf);
        let next = track.range(fno + 1..).next().map(|(_, bf)| bf);

        match (prev, next) {
            (Some(prev), Some(next)) => interpolate(prev, next, fno),
            (Some(prev), None) => BoneFrame {
                fno,
                interp: Interp::default(),
                ..prev.clone()
            },
            (None, Some(next)) => {
                let origin = BoneFrame::identity(0);
                interpolate(&origin, next, fno)
            }
            (None, None) => unreachable!("non-empty track without neighbors"),
        }
    }

    /// Insert or replace the key of `name` at `fno` with an exact value
    ///
    /// The rotation is canonicalized (unit norm, non-negative scalar). When
    /// the key lands inside an existing segment, that segment's easing
    /// curves are split at the insertion point so the surrounding motion
    /// keeps its shape. Replacing an existing key keeps the key's curves.
    pub fn regist_bf(&mut self, mut bf: BoneFrame, name: &str, fno: u32) {
        bf.fno = fno;
        bf.rotation = bf.rotation.canonicalized();

        let track = self.tracks.entry(name.to_string()).or_default();

        if let Some(existing) = track.get(&fno) {
            bf.interp = existing.interp;
            track.insert(fno, bf);
            return;
        }

        let prev_fno = track.range(..fno).next_back().map_or(0, |(&k, _)| k);
        let next_fno = track.range(fno + 1..).next().map(|(&k, _)| k);

        bf.interp = Interp::default();
        if let Some(next_fno) = next_fno {
            // t == 0 means the key lands on the segment's virtual start
            // (identity at frame 0); the successor's curve still covers the
            // whole segment and must stay as it is
            let t = (fno - prev_fno) as f32 / (next_fno - prev_fno) as f32;
            if t > 0.0 {
                if let Some(next) = track.get_mut(&next_fno) {
                    bf.interp = Interp {
                        rotation: split_or_linear(&mut next.interp.rotation, t),
                        translation: split_or_linear(&mut next.interp.translation, t),
                    };
                }
            }
        }

        track.insert(fno, bf);
    }

    /// Frames whose eased pose deviates from piecewise-linear interpolation
    /// of the explicit keys by more than the given thresholds
    ///
    /// Returns the start frame, every explicit key at or after it, and every
    /// intermediate frame whose rotation strays more than `limit_degrees` or
    /// whose translation strays more than `limit_length` from the straight
    /// line between the surrounding keys. This is the densification pre-pass
    /// of the bake: registering a key at each returned frame makes the key
    /// set fine enough to reproduce the motion within those tolerances.
    #[must_use]
    pub fn get_differ_fnos(
        &self,
        start: u32,
        names: &[&str],
        limit_degrees: f32,
        limit_length: f32,
    ) -> Vec<u32> {
        let mut out = BTreeSet::new();

        for &name in names {
            let Some(track) = self.tracks.get(name) else {
                continue;
            };
            let fnos: Vec<u32> = track.keys().copied().filter(|&f| f >= start).collect();
            if fnos.is_empty() {
                continue;
            }
            out.insert(start);
            out.extend(fnos.iter().copied());

            for pair in fnos.windows(2) {
                let (k0, k1) = (pair[0], pair[1]);
                if k1 - k0 < 2 {
                    continue;
                }
                let bf0 = &track[&k0];
                let bf1 = &track[&k1];
                for fno in k0 + 1..k1 {
                    let bf = self.calc_bf(name, fno);
                    let t = (fno - k0) as f32 / (k1 - k0) as f32;
                    let linear_rot = bf0.rotation.slerp(bf1.rotation, t);
                    let linear_pos = bf0.position.lerp(bf1.position, t);
                    let rot_diff = (bf.rotation * linear_rot.inverse()).to_degree();
                    let pos_diff = (bf.position - linear_pos).length();
                    if rot_diff > limit_degrees || pos_diff > limit_length {
                        out.insert(fno);
                    }
                }
            }
        }

        tracing::debug!(start, frames = out.len(), "deviation scan finished");
        out.into_iter().collect()
    }
}

/// Eased interpolation between two keys at `fno`
fn interpolate(prev: &BoneFrame, next: &BoneFrame, fno: u32) -> BoneFrame {
    let t = (fno - prev.fno) as f32 / (next.fno - prev.fno) as f32;
    let ry = next.interp.rotation.evaluate(t);
    let ty = next.interp.translation.evaluate(t);
    BoneFrame {
        fno,
        rotation: slerp_unit(prev.rotation, next.rotation, ry),
        position: prev.position.lerp(next.position, ty),
        interp: Interp::default(),
    }
}

/// Slerp that keeps the result on the unit sphere
fn slerp_unit(a: Quat, b: Quat, t: f32) -> Quat {
    a.slerp(b, t).normalize()
}

/// Split `curve` at `t`, keeping the trailing half in place and returning the
/// leading half; degenerate splits reset both to linear
fn split_or_linear(curve: &mut Bezier, t: f32) -> Bezier {
    match curve.split(t) {
        Some((before, after)) => {
            *curve = after;
            before
        }
        None => {
            *curve = Bezier::LINEAR;
            Bezier::LINEAR
        }
    }
}
