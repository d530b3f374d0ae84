//! Tree ensemble regressor
//!
//! Covers both random forests (`mean` of tree outputs) and boosted
//! ensembles (`sum` of weighted tree outputs on top of a base score).

use super::tree::Tree;
use crate::errors::{LoadCoreError, Result};
use serde::{Deserialize, Serialize};

/// Supported ensemble format version
pub const ENSEMBLE_VERSION: u32 = 1;

/// How per-tree outputs are combined
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Average of weighted tree outputs (random forest)
    Mean,
    /// Sum of weighted tree outputs (gradient boosting)
    Sum,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeEnsemble {
    pub version: u32,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl TreeEnsemble {
    pub fn new(aggregation: Aggregation, base_score: f64, trees: Vec<Tree>) -> Self {
        Self {
            version: ENSEMBLE_VERSION,
            aggregation,
            base_score,
            trees,
            feature_names: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != ENSEMBLE_VERSION {
            return Err(LoadCoreError::InvalidArtifact(format!(
                "unsupported tree ensemble version {}",
                self.version
            )));
        }
        if !self.base_score.is_finite() {
            return Err(LoadCoreError::InvalidArtifact(
                "base_score is not finite".to_string(),
            ));
        }
        if self.trees.is_empty() && self.aggregation == Aggregation::Mean {
            return Err(LoadCoreError::InvalidArtifact(
                "mean ensemble needs at least one tree".to_string(),
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|e| LoadCoreError::InvalidArtifact(format!("tree {i}: {e}")))?;
        }
        Ok(())
    }

    pub fn score(&self, features: &[f64]) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.evaluate(features) * tree.weight)
            .sum();

        match self.aggregation {
            Aggregation::Sum => self.base_score + total,
            Aggregation::Mean => self.base_score + total / self.trees.len() as f64,
        }
    }

    /// Smallest row width every split can be evaluated on
    pub fn min_width(&self) -> usize {
        self.trees
            .iter()
            .filter_map(Tree::max_feature)
            .max()
            .map_or(0, |idx| idx + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tree::Node;

    fn forest() -> TreeEnsemble {
        let t1 = Tree::new(
            vec![
                Node::split(0, 0, 50.0, 1, 2),
                Node::leaf(1, 100.0),
                Node::leaf(2, 200.0),
            ],
            1.0,
        );
        let t2 = Tree::new(
            vec![
                Node::split(0, 1, 30.0, 1, 2),
                Node::leaf(1, 80.0),
                Node::leaf(2, 120.0),
            ],
            1.0,
        );
        TreeEnsemble::new(Aggregation::Mean, 0.0, vec![t1, t2])
    }

    #[test]
    fn mean_aggregation_averages_trees() {
        let model = forest();
        assert!(model.validate().is_ok());
        assert_eq!(model.score(&[30.0, 20.0]), 90.0);
        assert_eq!(model.score(&[60.0, 40.0]), 160.0);
    }

    #[test]
    fn sum_aggregation_adds_base_score() {
        let mut model = forest();
        model.aggregation = Aggregation::Sum;
        model.base_score = 5.0;
        model.trees[1].weight = 0.5;
        assert_eq!(model.score(&[30.0, 20.0]), 5.0 + 100.0 + 40.0);
    }

    #[test]
    fn min_width_reflects_deepest_feature() {
        assert_eq!(forest().min_width(), 2);
    }

    #[test]
    fn rejects_unknown_version_and_empty_forest() {
        let mut model = forest();
        model.version = 7;
        assert!(model.validate().is_err());

        let empty = TreeEnsemble::new(Aggregation::Mean, 0.0, vec![]);
        assert!(empty.validate().is_err());

        let boosted_empty = TreeEnsemble::new(Aggregation::Sum, 3.0, vec![]);
        assert!(boosted_empty.validate().is_ok());
        assert_eq!(boosted_empty.score(&[]), 3.0);
    }

    #[test]
    fn nan_from_a_tree_propagates() {
        let model = forest();
        assert!(model.score(&[10.0]).is_nan());
    }
}
