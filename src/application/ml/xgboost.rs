//! Native evaluator for XGBoost models saved with `Booster.save_model("*.json")`.
//!
//! Supports gradient-boosted trees with numerical splits and a logistic
//! objective, which is what the per-horizon direction classifiers are.

use crate::domain::errors::{ModelLoadError, PredictionError};
use crate::domain::ports::DirectionClassifier;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: Learner,
}

#[derive(Debug, Deserialize)]
struct Learner {
    gradient_booster: GradientBooster,
    learner_model_param: LearnerModelParam,
    objective: Objective,
}

#[derive(Debug, Deserialize)]
struct GradientBooster {
    name: String,
    #[serde(default)]
    model: Option<TreeEnsemble>,
}

#[derive(Debug, Deserialize)]
struct TreeEnsemble {
    trees: Vec<TreeDump>,
}

#[derive(Debug, Deserialize)]
struct TreeDump {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<u32>,
    split_conditions: Vec<f32>,
    #[serde(deserialize_with = "flags")]
    default_left: Vec<bool>,
    #[serde(default)]
    split_type: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Objective {
    name: String,
}

/// `default_left` is written as 0/1 integers by some versions and as
/// booleans by others.
fn flags<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    let raw = Vec::<Flag>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|flag| match flag {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
        .collect())
}

/// Parses `"5E-1"` as well as the bracketed `"[5E-1]"` form.
fn parse_base_score(raw: &str) -> Result<f32, String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid base_score '{}': {}", raw, e))
}

#[derive(Debug, Clone, Copy)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f32,
    default_left: bool,
}

impl Node {
    fn is_leaf(&self) -> bool {
        self.left < 0
    }
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_dump(dump: TreeDump) -> Result<Self, String> {
        let n = dump.left_children.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if dump.right_children.len() != n
            || dump.split_indices.len() != n
            || dump.split_conditions.len() != n
            || dump.default_left.len() != n
        {
            return Err("tree definition invalid: node array length mismatch".to_string());
        }
        if dump.split_type.iter().any(|&t| t != 0) {
            return Err("categorical splits are not supported".to_string());
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (left, right) = (dump.left_children[i], dump.right_children[i]);
            if left >= 0 {
                // Children are always stored after their parent; this also
                // guarantees evaluation terminates.
                let valid = |child: i32| child as usize > i && (child as usize) < n;
                if !valid(left) || !valid(right) {
                    return Err(format!("node {} has out-of-range children", i));
                }
            }
            nodes.push(Node {
                left,
                right,
                feature: dump.split_indices[i] as usize,
                threshold: dump.split_conditions[i],
                default_left: dump.default_left[i],
            });
        }
        Ok(Self { nodes })
    }

    /// Walks from the root to a leaf. NaN inputs follow the default branch.
    fn leaf_value(&self, features: &[f32]) -> f32 {
        let mut idx = 0usize;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf() {
                // Leaf values are stored in split_conditions
                return node.threshold;
            }
            let go_left = match features.get(node.feature) {
                Some(value) if !value.is_nan() => *value < node.threshold,
                _ => node.default_left,
            };
            idx = if go_left { node.left } else { node.right } as usize;
        }
    }

    fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf())
            .map(|n| n.feature)
            .max()
    }
}

/// Binary logistic gradient-boosted tree ensemble.
#[derive(Debug, Clone)]
pub struct XgbClassifier {
    trees: Vec<Tree>,
    base_margin: f32,
    n_features: usize,
}

impl XgbClassifier {
    pub fn from_json_str(raw: &str) -> Result<Self, String> {
        let file: ModelFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;
        let learner = file.learner;

        match learner.objective.name.as_str() {
            "binary:logistic" | "reg:logistic" => {}
            other => return Err(format!("unsupported objective '{}'", other)),
        }

        let num_class = learner
            .learner_model_param
            .num_class
            .as_deref()
            .unwrap_or("0")
            .parse::<u32>()
            .map_err(|e| format!("invalid num_class: {}", e))?;
        if num_class > 1 {
            return Err(format!("multi-class model ({} classes) not supported", num_class));
        }

        if learner.gradient_booster.name != "gbtree" {
            return Err(format!(
                "unsupported booster '{}'",
                learner.gradient_booster.name
            ));
        }
        let ensemble = learner
            .gradient_booster
            .model
            .ok_or_else(|| "gbtree model section missing".to_string())?;

        let trees = ensemble
            .trees
            .into_iter()
            .map(Tree::from_dump)
            .collect::<Result<Vec<_>, _>>()?;
        if trees.is_empty() {
            return Err("model contained no trees".to_string());
        }

        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(format!("base_score {} is not a probability", base_score));
        }
        let base_margin = (base_score / (1.0 - base_score)).ln();

        let n_features = trees
            .iter()
            .filter_map(Tree::max_feature)
            .max()
            .map_or(0, |max| max + 1);

        Ok(Self {
            trees,
            base_margin,
            n_features,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelLoadError> {
        if !path.exists() {
            return Err(ModelLoadError::Missing {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path).map_err(|e| ModelLoadError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let model = Self::from_json_str(&raw).map_err(|reason| ModelLoadError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        info!(
            "Loaded XGBoost classifier from {:?} ({} trees)",
            path,
            model.trees.len()
        );
        Ok(model)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Smallest input width that covers every split feature.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn margin(&self, features: &[f32]) -> f32 {
        self.trees
            .iter()
            .map(|tree| tree.leaf_value(features))
            .sum::<f32>()
            + self.base_margin
    }
}

impl DirectionClassifier for XgbClassifier {
    fn probability_up(&self, features: &[f32]) -> Result<f64, PredictionError> {
        if features.len() < self.n_features {
            return Err(PredictionError::inference(format!(
                "classifier expects {} encoder features, got {}",
                self.n_features,
                features.len()
            )));
        }
        let margin = self.margin(features);
        Ok(f64::from(1.0 / (1.0 + (-margin).exp())))
    }

    fn name(&self) -> &str {
        "XGBoost"
    }
}
