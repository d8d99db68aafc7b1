// =============================================================================
// Random-forest classifier artifact
// =============================================================================
//
// JSON layout:
//
//   {
//     "name": "rf-v3",
//     "feature_names": ["rsi", "macd", ...],          // must equal FEATURE_NAMES
//     "scaler": { "mean": [...], "scale": [...] },    // standard scaler
//     "classes": [-1, 0, 1],
//     "trees": [
//       { "nodes": [
//           { "feature": 0, "threshold": -0.41, "left": 1, "right": 2 },
//           { "value": [0.1, 0.7, 0.2] },
//           { "value": [0.0, 0.2, 0.8] }
//       ] }
//     ]
//   }
//
// Splits go left when `x <= threshold`. Leaf values are per-class weights in
// `classes` order; each tree's leaf is normalised before averaging.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::classifier::{Prediction, SignalClassifier};
use super::features::{FeatureVector, FEATURE_NAMES};

/// Standard-scaler parameters, one entry per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerParams {
    /// `(x - mean) / scale`; a zero scale only centres the value.
    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let mean = self.mean.get(i).copied().unwrap_or(0.0);
                let scale = self.scale.get(i).copied().unwrap_or(1.0);
                if scale.abs() > f64::EPSILON {
                    (f - mean) / scale
                } else {
                    f - mean
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Leaf reached by `x`, or `None` if the walk exceeds the node count
    /// (a cycle in a hand-edited artifact).
    fn leaf(&self, x: &[f64]) -> Option<&[f64]> {
        let mut idx = 0;
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx)? {
                TreeNode::Leaf { value } => return Some(value),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x.get(*feature)? <= threshold { *left } else { *right };
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub name: String,
    pub feature_names: Vec<String>,
    pub scaler: ScalerParams,
    pub classes: Vec<i8>,
    pub trees: Vec<DecisionTree>,
    #[serde(skip)]
    fingerprint: Option<String>,
}

impl RandomForest {
    /// Read, parse and validate an artifact file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read classifier artifact {}", path.display()))?;
        Self::from_slice(&bytes)
            .with_context(|| format!("invalid classifier artifact {}", path.display()))
    }

    /// Parse and validate artifact bytes, recording their SHA-256.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut forest: Self =
            serde_json::from_slice(bytes).context("failed to parse classifier artifact JSON")?;
        forest.validate()?;
        forest.fingerprint = Some(hex::encode(Sha256::digest(bytes)));
        Ok(forest)
    }

    fn validate(&self) -> Result<()> {
        let names: Vec<&str> = self.feature_names.iter().map(String::as_str).collect();
        if names != FEATURE_NAMES {
            anyhow::bail!(
                "feature order mismatch: artifact declares [{}], expected [{}]",
                names.join(", "),
                FEATURE_NAMES.join(", ")
            );
        }

        let n = FEATURE_NAMES.len();
        if self.scaler.mean.len() != n || self.scaler.scale.len() != n {
            anyhow::bail!(
                "scaler has {} means and {} scales, expected {}",
                self.scaler.mean.len(),
                self.scaler.scale.len(),
                n
            );
        }

        if self.classes.is_empty() {
            anyhow::bail!("artifact declares no classes");
        }
        for (i, c) in self.classes.iter().enumerate() {
            if !(-1..=1).contains(c) {
                anyhow::bail!("class label {} outside -1..=1", c);
            }
            if self.classes[..i].contains(c) {
                anyhow::bail!("class label {} declared twice", c);
            }
        }

        if self.trees.is_empty() {
            anyhow::bail!("artifact contains no trees");
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                anyhow::bail!("tree {} has no nodes", t);
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= n || !threshold.is_finite() {
                            anyhow::bail!("tree {} node {}: bad split on feature {}", t, i, feature);
                        }
                        if *left >= tree.nodes.len() || *right >= tree.nodes.len() {
                            anyhow::bail!("tree {} node {}: child index out of range", t, i);
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if value.len() != self.classes.len()
                            || value.iter().any(|v| !v.is_finite() || *v < 0.0)
                        {
                            anyhow::bail!("tree {} node {}: malformed leaf", t, i);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Average normalised leaf distribution over all trees.
    pub fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let x = self.scaler.transform(&features.to_array());
        let mut totals = vec![0.0; self.classes.len()];

        for (t, tree) in self.trees.iter().enumerate() {
            let leaf = tree
                .leaf(&x)
                .with_context(|| format!("tree {} did not reach a leaf", t))?;
            let sum: f64 = leaf.iter().sum();
            if sum <= 0.0 {
                anyhow::bail!("tree {} reached an empty leaf", t);
            }
            for (acc, v) in totals.iter_mut().zip(leaf) {
                *acc += v / sum;
            }
        }

        let count = self.trees.len() as f64;
        Ok(totals.into_iter().map(|v| v / count).collect())
    }
}

impl SignalClassifier for RandomForest {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let proba = self.predict_proba(features)?;
        let (best, _) = proba
            .iter()
            .enumerate()
            .fold((0usize, f64::NEG_INFINITY), |(bi, bp), (i, &p)| {
                if p > bp {
                    (i, p)
                } else {
                    (bi, bp)
                }
            });
        Ok(Prediction {
            label: self.classes[best],
            probabilities: self.classes.iter().copied().zip(proba).collect(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }
}
