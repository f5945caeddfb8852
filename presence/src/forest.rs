//! Decision-forest presence model loaded from JSON.
//!
//! ```json
//! {
//!   "name": "pocket-v3",
//!   "trees": [
//!     { "nodes": [
//!       { "feature": 13, "threshold": 0.02, "left": 1, "right": 2 },
//!       { "with_user": false },
//!       { "with_user": true }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Node 0 is the root of each tree. A split sends values `<= threshold` to
//! `left`. The forest predicts "with user" when a strict majority of trees
//! vote for it.

use crate::model::{validate_features, PresenceModel};
use crate::{ClassifierError, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        with_user: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Every split must reference a real feature and point strictly forward,
    /// which rules out cycles.
    fn validate(&self, index: usize) -> Result<(), ClassifierError> {
        if self.nodes.is_empty() {
            return Err(ClassifierError::Model(format!("tree {index} has no nodes")));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(ClassifierError::Model(format!(
                        "tree {index} node {i}: feature {feature} out of range"
                    )));
                }
                if !threshold.is_finite() {
                    return Err(ClassifierError::Model(format!(
                        "tree {index} node {i}: threshold is not finite"
                    )));
                }
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(ClassifierError::Model(format!(
                            "tree {index} node {i}: bad child index {child}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn vote(&self, features: &[f64]) -> bool {
        let mut at = 0;
        loop {
            match self.nodes[at] {
                TreeNode::Leaf { with_user } => return with_user,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if features[feature] <= threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    #[serde(default = "default_name")]
    name: String,
    trees: Vec<DecisionTree>,
}

fn default_name() -> String {
    "forest".to_string()
}

impl ForestModel {
    pub fn new(name: impl Into<String>, trees: Vec<DecisionTree>) -> Result<Self, ClassifierError> {
        let model = Self {
            name: name.into(),
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ClassifierError> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| ClassifierError::Model(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ClassifierError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ClassifierError::Model(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.trees.is_empty() {
            return Err(ClassifierError::Model("forest has no trees".into()));
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, tree)| tree.validate(i))
    }
}

impl PresenceModel for ForestModel {
    fn predict(&self, features: &[f64]) -> Result<bool, ClassifierError> {
        validate_features(features)?;
        let positive = self.trees.iter().filter(|t| t.vote(features)).count();
        Ok(positive * 2 > self.trees.len())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One stump on `mag_var`: still windows are "left behind".
    const STUMP: &str = r#"{
        "name": "stump",
        "trees": [
            { "nodes": [
                { "feature": 13, "threshold": 0.5, "left": 1, "right": 2 },
                { "with_user": false },
                { "with_user": true }
            ] }
        ]
    }"#;

    fn features_with_mag_var(v: f64) -> [f64; FEATURE_COUNT] {
        let mut f = [0.0; FEATURE_COUNT];
        f[13] = v;
        f
    }

    fn constant_tree(with_user: bool) -> DecisionTree {
        DecisionTree {
            nodes: vec![TreeNode::Leaf { with_user }],
        }
    }

    #[test]
    fn stump_splits_on_threshold() {
        let model = ForestModel::from_json_str(STUMP).unwrap();
        assert_eq!(model.name(), "stump");
        assert_eq!(model.predict(&features_with_mag_var(0.5)), Ok(false));
        assert_eq!(model.predict(&features_with_mag_var(0.6)), Ok(true));
    }

    #[test]
    fn even_split_votes_negative() {
        let model =
            ForestModel::new("tie", vec![constant_tree(true), constant_tree(false)]).unwrap();
        assert_eq!(model.predict(&[0.0; FEATURE_COUNT]), Ok(false));
    }

    #[test]
    fn majority_wins() {
        let model = ForestModel::new(
            "m",
            vec![constant_tree(true), constant_tree(false), constant_tree(true)],
        )
        .unwrap();
        assert_eq!(model.predict(&[0.0; FEATURE_COUNT]), Ok(true));
    }

    #[test]
    fn backward_child_is_rejected() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: 0,
                    threshold: 0.0,
                    left: 0,
                    right: 1,
                },
                TreeNode::Leaf { with_user: true },
            ],
        };
        assert!(matches!(
            ForestModel::new("cyclic", vec![tree]),
            Err(ClassifierError::Model(_))
        ));
    }

    #[test]
    fn unknown_feature_is_rejected() {
        let json = STUMP.replace("\"feature\": 13", "\"feature\": 14");
        assert!(ForestModel::from_json_str(&json).is_err());
    }

    #[test]
    fn empty_forest_is_rejected() {
        assert!(ForestModel::from_json_str(r#"{ "trees": [] }"#).is_err());
    }

    #[test]
    fn non_finite_features_are_malformed() {
        let model = ForestModel::from_json_str(STUMP).unwrap();
        assert!(matches!(
            model.predict(&features_with_mag_var(f64::INFINITY)),
            Err(ClassifierError::MalformedInput(_))
        ));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, STUMP).unwrap();
        assert_eq!(ForestModel::from_json_file(&path).unwrap().tree_count(), 1);
    }
}
