use serde::Deserialize;
use std::path::Path;

use super::{read_json, Classifier, N_FEATURES};
use crate::error::ModelError;

#[derive(Debug, Deserialize)]
struct TreeJson {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct ForestJson {
    n_features: usize,
    n_classes: usize,
    classes: Option<Vec<i64>>,
    trees: Vec<TreeJson>,
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Split { feature: usize, threshold: f64, left: usize, right: usize },
    Leaf { class_idx: usize },
}

#[derive(Debug)]
struct Tree {
    nodes: Vec<Node>,
    /// Per-leaf class probabilities, indexed by `Node::Leaf::class_idx`.
    leaves: Vec<Vec<f64>>,
}

impl Tree {
    fn proba(&self, x: &[f64; N_FEATURES]) -> &[f64] {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Split { feature, threshold, left, right } => {
                    // Trained on float32 inputs; compare at that precision.
                    let v = f64::from(x[feature] as f32);
                    i = if v <= threshold { left } else { right };
                }
                Node::Leaf { class_idx } => return &self.leaves[class_idx],
            }
        }
    }
}

/// Random forest exported from the offline trainer as JSON.
#[derive(Debug)]
pub struct Forest {
    trees: Vec<Tree>,
    classes: Vec<i64>,
}

impl Forest {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw: ForestJson = read_json(path)?;
        Self::from_json(raw)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ModelError> {
        let raw: ForestJson = serde_json::from_str(text).map_err(|source| ModelError::Parse {
            path: "<inline>".to_string(),
            source,
        })?;
        Self::from_json(raw)
    }

    fn from_json(raw: ForestJson) -> Result<Self, ModelError> {
        if raw.n_features != N_FEATURES {
            return Err(ModelError::Invalid(format!(
                "forest expects {} features, service provides {}",
                raw.n_features, N_FEATURES
            )));
        }
        if raw.n_classes == 0 {
            return Err(ModelError::Invalid("forest has no classes".to_string()));
        }
        if raw.trees.is_empty() {
            return Err(ModelError::Invalid("forest has no trees".to_string()));
        }

        let classes = match raw.classes {
            Some(c) if c.len() != raw.n_classes => {
                return Err(ModelError::Invalid(format!(
                    "classes has {} entries, n_classes is {}",
                    c.len(),
                    raw.n_classes
                )))
            }
            Some(c) => c,
            None => (0..raw.n_classes as i64).collect(),
        };

        let trees = raw
            .trees
            .into_iter()
            .enumerate()
            .map(|(t, tree)| {
                build_tree(tree, raw.n_classes)
                    .map_err(|msg| ModelError::Invalid(format!("tree {}: {}", t, msg)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { trees, classes })
    }

    /// Mean of per-tree class probabilities.
    pub fn predict_proba(&self, x: &[f64; N_FEATURES]) -> Vec<f64> {
        let mut acc = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.proba(x)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|a| *a /= n);
        acc
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for Forest {
    fn predict(&self, features: &[f64; N_FEATURES]) -> Result<i64, ModelError> {
        let proba = self.predict_proba(features);
        let best = argmax(&proba);
        Ok(self.classes[best])
    }

    fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

/// First index of the maximum.
fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, x) in v.iter().enumerate() {
        if *x > v[best] {
            best = i;
        }
    }
    best
}

fn build_tree(t: TreeJson, n_classes: usize) -> Result<Tree, String> {
    let n = t.children_left.len();
    if n == 0 {
        return Err("tree has no nodes".to_string());
    }
    if t.children_right.len() != n || t.feature.len() != n || t.threshold.len() != n || t.value.len() != n {
        return Err(format!(
            "node arrays differ in length (left={}, right={}, feature={}, threshold={}, value={})",
            n,
            t.children_right.len(),
            t.feature.len(),
            t.threshold.len(),
            t.value.len()
        ));
    }

    let mut nodes = Vec::with_capacity(n);
    let mut leaves = Vec::new();
    for i in 0..n {
        let (l, r) = (t.children_left[i], t.children_right[i]);
        if l == -1 {
            let row = &t.value[i];
            if row.len() != n_classes {
                return Err(format!("leaf {} has {} class values, expected {}", i, row.len(), n_classes));
            }
            nodes.push(Node::Leaf { class_idx: leaves.len() });
            leaves.push(normalise(row));
            continue;
        }

        // Children must come after their parent so traversal always terminates.
        let child = |c: i64| -> Result<usize, String> {
            if c <= i as i64 || c >= n as i64 {
                Err(format!("node {} has out-of-order child {}", i, c))
            } else {
                Ok(c as usize)
            }
        };
        let left = child(l)?;
        let right = child(r)?;

        let feature = t.feature[i];
        if feature < 0 || feature as usize >= N_FEATURES {
            return Err(format!("node {} splits on unknown feature {}", i, feature));
        }
        nodes.push(Node::Split {
            feature: feature as usize,
            threshold: t.threshold[i],
            left,
            right,
        });
    }

    Ok(Tree { nodes, leaves })
}

fn normalise(row: &[f64]) -> Vec<f64> {
    let total: f64 = row.iter().sum();
    if total > 0.0 {
        row.iter().map(|v| v / total).collect()
    } else {
        vec![0.0; row.len()]
    }
}
