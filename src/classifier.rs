use serde::Deserialize;
use thiserror::Error;
use std::path::Path;

use crate::features::{FeatureVector, FEATURE_NAMES};

/// Hard output of the flood model: 0 = clear, 1 = flooding predicted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FloodLabel {
    Clear,
    Flooded,
}

impl FloodLabel {
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(FloodLabel::Clear),
            1 => Some(FloodLabel::Flooded),
            _ => None,
        }
    }

    pub fn is_flooded(self) -> bool {
        self == FloodLabel::Flooded
    }
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("cannot read model file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse model file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("feature {name} is not a finite number")]
    NonFiniteFeature { name: &'static str },
}

/// Anything that maps the six weather/time features to a flood label.
pub trait FloodClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<FloodLabel, ClassifierError>;
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum TreeNode {
    Split { feature: usize, threshold: f64, left: usize, right: usize },
    Leaf { value: u8 },
}

#[derive(Debug, Deserialize)]
struct ForestFile {
    feature_names: Vec<String>,
    trees: Vec<Vec<TreeNode>>,
}

/// Tree ensemble exported from the training pipeline as JSON.
///
/// Each tree is a flat node array rooted at index 0, following the usual
/// decision-tree convention: a split sends `x[feature] <= threshold` to `left`.
/// The forest predicts by majority vote, a tie predicts `Clear`.
#[derive(Debug)]
pub struct ForestModel {
    trees: Vec<Vec<TreeNode>>,
}

impl ForestModel {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let model = Self::from_json(&text)?;
        log::info!("Flood model loaded from {} ({} trees)", path.as_ref().display(), model.trees.len());
        Ok(model)
    }

    pub fn from_json(text: &str) -> Result<Self, ClassifierError> {
        let file: ForestFile = serde_json::from_str(text)?;
        if file.feature_names != FEATURE_NAMES {
            return Err(ClassifierError::InvalidModel(format!(
                "expected features {:?}, model has {:?}",
                FEATURE_NAMES, file.feature_names
            )));
        }
        if file.trees.is_empty() {
            return Err(ClassifierError::InvalidModel("model has no trees".to_string()));
        }
        for (t, tree) in file.trees.iter().enumerate() {
            validate_tree(tree).map_err(|reason| ClassifierError::InvalidModel(format!("tree {}: {}", t, reason)))?;
        }
        Ok(ForestModel { trees: file.trees })
    }
}

// Children must come after their parent, so every walk from the root terminates.
fn validate_tree(nodes: &[TreeNode]) -> Result<(), String> {
    if nodes.is_empty() {
        return Err("empty tree".to_string());
    }
    for (i, node) in nodes.iter().enumerate() {
        match *node {
            TreeNode::Split { feature, threshold, left, right } => {
                if feature >= FEATURE_NAMES.len() {
                    return Err(format!("node {} splits on unknown feature {}", i, feature));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {} has a non-finite threshold", i));
                }
                for child in [left, right] {
                    if child <= i || child >= nodes.len() {
                        return Err(format!("node {} has invalid child {}", i, child));
                    }
                }
            }
            TreeNode::Leaf { value } => {
                if FloodLabel::from_class(value).is_none() {
                    return Err(format!("node {} has class {}", i, value));
                }
            }
        }
    }
    Ok(())
}

fn walk(nodes: &[TreeNode], features: &[f64; 6]) -> FloodLabel {
    let mut index = 0;
    loop {
        match nodes[index] {
            TreeNode::Split { feature, threshold, left, right } => {
                index = if features[feature] <= threshold { left } else { right };
            }
            TreeNode::Leaf { value } => return FloodLabel::from_class(value).unwrap_or(FloodLabel::Clear),
        }
    }
}

impl FloodClassifier for ForestModel {
    fn predict(&self, features: &FeatureVector) -> Result<FloodLabel, ClassifierError> {
        let values = features.values();
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(ClassifierError::NonFiniteFeature { name: FEATURE_NAMES[i] });
        }
        let flooded = self.trees.iter().filter(|tree| walk(tree, values).is_flooded()).count();
        if flooded * 2 > self.trees.len() {
            Ok(FloodLabel::Flooded)
        } else {
            Ok(FloodLabel::Clear)
        }
    }
}
