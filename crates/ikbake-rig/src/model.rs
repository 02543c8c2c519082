//! Skeleton model and bone-chain building

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::bone::Bone;

/// A parsed skeletal model
#[derive(Debug, Clone)]
pub struct Model {
    /// Model display name
    pub name: String,
    /// Bone table, position in the vec equals `Bone::index`
    pub bones: Vec<Bone>,
    by_name: HashMap<String, usize>,
}

impl Model {
    /// Build a model from a bone table
    ///
    /// Bone indexes are rewritten to match table order.
    #[must_use]
    pub fn new(name: impl Into<String>, mut bones: Vec<Bone>) -> Self {
        let mut by_name = HashMap::with_capacity(bones.len());
        for (i, bone) in bones.iter_mut().enumerate() {
            bone.index = i;
            by_name.insert(bone.name.clone(), i);
        }
        Self {
            name: name.into(),
            bones,
            by_name,
        }
    }

    /// Look up a bone by name
    #[must_use]
    pub fn bone(&self, name: &str) -> Option<&Bone> {
        self.by_name.get(name).map(|&i| &self.bones[i])
    }

    /// Look up a bone by index
    #[must_use]
    pub fn bone_at(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// The chain from `bone_name` up through every ancestor to its root
    ///
    /// Returned in FK evaluation order (root first, the named bone last).
    /// Unknown names yield an empty chain.
    #[must_use]
    pub fn links_to_root(&self, bone_name: &str) -> BoneLinks {
        let mut chain = Vec::new();
        let mut current = self.bone(bone_name);
        while let Some(bone) = current {
            chain.push(bone.clone());
            current = bone.parent_index.and_then(|i| self.bone_at(i));
        }
        chain.reverse();
        BoneLinks { bones: chain }
    }

    /// Direct children of `bone`, ordered by bone index
    #[must_use]
    pub fn child_bones(&self, bone: &Bone) -> Vec<&Bone> {
        self.bones
            .iter()
            .filter(|b| b.parent_index == Some(bone.index))
            .collect()
    }

    /// Effective local X axis of the named bone
    ///
    /// The explicit override wins; otherwise the direction toward the first
    /// child; otherwise +X.
    #[must_use]
    pub fn local_x_axis(&self, bone_name: &str) -> Vec3 {
        let Some(bone) = self.bone(bone_name) else {
            return Vec3::X;
        };
        if let Some(axis) = bone.local_x_vector {
            if axis != Vec3::ZERO {
                return axis.normalize();
            }
        }
        if let Some(child) = self.child_bones(bone).first() {
            let to_child = child.position - bone.position;
            if to_child.length_squared() > f32::EPSILON {
                return to_child.normalize();
            }
        }
        Vec3::X
    }
}

/// An ordered bone chain, root first
///
/// Built by [`Model::links_to_root`]; the last entry is the bone the chain
/// was requested for (the effector or the IK bone).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneLinks {
    bones: Vec<Bone>,
}

impl BoneLinks {
    /// Bones in FK evaluation order
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Bone> {
        self.bones.iter()
    }

    /// The tip of the chain
    #[must_use]
    pub fn tip(&self) -> Option<&Bone> {
        self.bones.last()
    }

    /// Number of bones in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    /// Whether the chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Whether the chain contains the named bone
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bones.iter().any(|b| b.name == name)
    }
}

impl<'a> IntoIterator for &'a BoneLinks {
    type Item = &'a Bone;
    type IntoIter = std::slice::Iter<'a, Bone>;

    fn into_iter(self) -> Self::IntoIter {
        self.bones.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm_model() -> Model {
        Model::new(
            "arm",
            vec![
                Bone::new("root", 0, None, Vec3::ZERO),
                Bone::new("shoulder", 1, Some(0), Vec3::new(0.0, 1.0, 0.0)),
                Bone::new("elbow", 2, Some(1), Vec3::new(1.0, 1.0, 0.0)),
                Bone::new("wrist", 3, Some(2), Vec3::new(2.0, 1.0, 0.0)),
            ],
        )
    }

    #[test]
    fn links_to_root_order() {
        let model = arm_model();
        let links = model.links_to_root("wrist");
        let names: Vec<&str> = links.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["root", "shoulder", "elbow", "wrist"]);
        assert_eq!(links.tip().unwrap().name, "wrist");
    }

    #[test]
    fn links_to_root_unknown_is_empty() {
        let model = arm_model();
        assert!(model.links_to_root("nope").is_empty());
    }

    #[test]
    fn child_bones_ordered_by_index() {
        let mut bones = vec![
            Bone::new("root", 0, None, Vec3::ZERO),
            Bone::new("b", 1, Some(0), Vec3::X),
            Bone::new("a", 2, Some(0), Vec3::Y),
        ];
        bones.swap(1, 2);
        let model = Model::new("m", bones);
        let root = model.bone("root").unwrap();
        let children: Vec<&str> = model.child_bones(root).iter().map(|b| b.name.as_str()).collect();
        // Table order (== index order) is preserved regardless of input order
        assert_eq!(children, ["a", "b"]);
    }

    #[test]
    fn local_x_axis_prefers_override() {
        let mut model = arm_model();
        model.bones[1].local_x_vector = Some(Vec3::new(0.0, 0.0, 2.0));
        let model = Model::new("arm", model.bones);
        assert_eq!(model.local_x_axis("shoulder"), Vec3::Z);
    }

    #[test]
    fn local_x_axis_falls_back_to_first_child() {
        let model = arm_model();
        // shoulder -> elbow points along +X
        assert!((model.local_x_axis("shoulder") - Vec3::X).length() < 1e-6);
        // leaf with no children falls back to +X
        assert_eq!(model.local_x_axis("wrist"), Vec3::X);
    }
}
