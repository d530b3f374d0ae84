//! Regression tree structures
//!
//! Nodes are stored flat with child indices, root at index 0. A split sends
//! a row left when `feature <= threshold`, matching how scikit-learn and
//! most boosting libraries export their trees.

use serde::{Deserialize, Serialize};

/// A tree node, either a split or a leaf
///
/// Split nodes have `feature >= 0`, valid `left`/`right` indices and no
/// `leaf`. Leaf nodes have `feature == -1` and carry the predicted value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub id: i32,
    pub left: i32,
    pub right: i32,
    #[serde(alias = "feature_idx")]
    pub feature: i32,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub leaf: Option<f64>,
}

impl Node {
    pub fn split(id: i32, feature: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature,
            threshold,
            leaf: None,
        }
    }

    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature < 0 || self.leaf.is_some()
    }
}

/// A single regression tree with its ensemble weight
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    pub nodes: Vec<Node>,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Leaf value reached by `features`
    ///
    /// A malformed path (index out of range, feature outside the row)
    /// yields NaN so the caller's finiteness check rejects the batch.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;
        // Bounded walk; a validated tree never revisits a node.
        for _ in 0..=self.nodes.len() {
            let Some(node) = self.nodes.get(idx) else {
                return f64::NAN;
            };

            if node.is_leaf() {
                return node.leaf.unwrap_or(f64::NAN);
            }

            let Some(&value) = features.get(node.feature as usize) else {
                return f64::NAN;
            };

            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return f64::NAN;
            }
            idx = next as usize;
        }
        f64::NAN
    }

    /// Highest feature index any split reads
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|node| !node.is_leaf())
            .map(|node| node.feature as usize)
            .max()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        if !self.weight.is_finite() {
            return Err(format!("tree weight {} is not finite", self.weight));
        }

        let len = self.nodes.len() as i32;
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(value) if value.is_finite() => {}
                    Some(value) => return Err(format!("leaf {i} has non-finite value {value}")),
                    None => return Err(format!("leaf {i} has no value")),
                }
                continue;
            }

            // Children must point forward so traversal always terminates.
            for (side, child) in [("left", node.left), ("right", node.right)] {
                if child <= i as i32 || child >= len {
                    return Err(format!("node {i} has invalid {side} child {child}"));
                }
            }
            if !node.threshold.is_finite() {
                return Err(format!("node {i} has non-finite threshold"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(
            vec![
                Node::split(0, 0, 50.0, 1, 2),
                Node::leaf(1, 100.0),
                Node::leaf(2, 200.0),
            ],
            1.0,
        )
    }

    #[test]
    fn node_kinds() {
        let split = Node::split(0, 3, 1.5, 1, 2);
        assert!(!split.is_leaf());
        let leaf = Node::leaf(1, -2.5);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf, Some(-2.5));
    }

    #[test]
    fn split_goes_left_on_equal() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[30.0]), 100.0);
        assert_eq!(tree.evaluate(&[50.0]), 100.0);
        assert_eq!(tree.evaluate(&[50.000001]), 200.0);
    }

    #[test]
    fn short_row_yields_nan() {
        let tree = Tree::new(
            vec![
                Node::split(0, 4, 1.0, 1, 2),
                Node::leaf(1, 1.0),
                Node::leaf(2, 2.0),
            ],
            1.0,
        );
        assert!(tree.evaluate(&[0.0, 0.0]).is_nan());
        assert_eq!(tree.max_feature(), Some(4));
    }

    #[test]
    fn validation_catches_bad_children_and_cycles() {
        assert!(stump().validate().is_ok());

        let out_of_range = Tree::new(
            vec![
                Node::split(0, 0, 1.0, 5, 2),
                Node::leaf(1, 1.0),
                Node::leaf(2, 2.0),
            ],
            1.0,
        );
        assert!(out_of_range.validate().is_err());

        let cycle = Tree::new(
            vec![Node::split(0, 0, 1.0, 0, 1), Node::leaf(1, 1.0)],
            1.0,
        );
        assert!(cycle.validate().is_err());

        let empty_leaf = Tree::new(
            vec![Node {
                id: 0,
                left: -1,
                right: -1,
                feature: -1,
                threshold: 0.0,
                leaf: None,
            }],
            1.0,
        );
        assert!(empty_leaf.validate().is_err());
    }

    #[test]
    fn weight_defaults_to_one() {
        let tree: Tree = serde_json::from_str(
            r#"{"nodes":[{"id":0,"left":-1,"right":-1,"feature":-1,"leaf":4.0}]}"#,
        )
        .unwrap();
        assert_eq!(tree.weight, 1.0);
        assert_eq!(tree.evaluate(&[]), 4.0);
    }
}
