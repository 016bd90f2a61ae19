//! Feature importance
//!
//! Replays the splits of every tree of an ensemble over a dataset, and
//! attributes the reduction of the squared error on the residual fit by
//! each tree to the feature used by the split.
use crate::data::Dataset;
use crate::ensemble::Ensemble;
use crate::errors::RankevalError;
use crate::node::Node;
use crate::partition::{split_subset, NodeQueue};
use crate::utils::{assign_subset_mean, mean, subset_squared_error};
use hashbrown::HashMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Importance and usage count of every feature of a dataset.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct FeatureImportance {
    /// Sum over all the splits on a feature of the reduction of the squared
    /// error, divided by the number of instances of the dataset.
    pub importance: Vec<f64>,
    /// Number of visited nodes holding each feature.
    pub count: Vec<usize>,
}

impl FeatureImportance {
    pub fn new(n_features: usize) -> Self {
        FeatureImportance {
            importance: vec![0.; n_features],
            count: vec![0; n_features],
        }
    }

    pub fn n_features(&self) -> usize {
        self.importance.len()
    }

    /// Total number of node visits.
    pub fn total_count(&self) -> usize {
        self.count.iter().sum()
    }

    /// Importance rescaled to sum to one. Counts are left as they are.
    /// If the total importance is zero, a copy is returned unchanged.
    pub fn normalized(&self) -> Self {
        // Sum the sorted values, so the total doesn't depend on feature order.
        let mut values = self.importance.clone();
        values.sort_by(|a, b| a.total_cmp(b));
        let total: f64 = values.iter().sum();
        if total == 0. {
            return self.clone();
        }
        FeatureImportance {
            importance: self.importance.iter().map(|v| v / total).collect(),
            count: self.count.clone(),
        }
    }

    /// `(feature, importance, count)` triples, most important first.
    /// Features with equal importance are ordered by id.
    pub fn ranked(&self) -> Vec<(usize, f64, usize)> {
        let mut ranked: Vec<(usize, f64, usize)> = self
            .importance
            .iter()
            .zip(self.count.iter())
            .enumerate()
            .map(|(f, (v, c))| (f, *v, *c))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Importance and count of the features the ensemble looked at.
    pub fn to_map(&self) -> HashMap<usize, (f64, usize)> {
        self.importance
            .iter()
            .zip(self.count.iter())
            .enumerate()
            .filter(|(_, (_, c))| **c > 0)
            .map(|(f, (v, c))| (f, (*v, *c)))
            .collect()
    }

    /// Dump the importance vectors as a json object.
    pub fn json_dump(&self) -> Result<String, RankevalError> {
        serde_json::to_string(self).map_err(|e| RankevalError::UnableToWrite(e.to_string()))
    }
}

/// Process a single tree of the ensemble.
///
/// The tree fits the residual `y - y_pred`. Starting from the mean residual,
/// the working prediction of the tree is refined split after split, in breadth
/// first order, and every split credits its feature with the squared error it
/// removes. Returns the running prediction updated with this tree, and the
/// working prediction of the tree.
///
/// * `ensemble` - Ensemble, already validated against the dataset.
/// * `dataset` - Dataset to evaluate the tree on.
/// * `tree` - Index of the tree in the ensemble.
/// * `y_pred` - Prediction of the trees processed so far.
/// * `acc` - Importance and count accumulators.
pub fn tree_feature_importance(
    ensemble: &Ensemble,
    dataset: &Dataset,
    tree: usize,
    mut y_pred: Vec<f64>,
    acc: &mut FeatureImportance,
) -> (Vec<f64>, Vec<f64>) {
    let n_instances = dataset.n_instances();
    let y_target: Vec<f64> = dataset.y.iter().zip(y_pred.iter()).map(|(y, p)| y - p).collect();
    let mut y_pred_tree = vec![mean(&y_target); n_instances];

    let mut queue = NodeQueue::new(ensemble.root_of(tree), n_instances);
    let mut n_visited = 0;
    while let Some((node_idx, subset)) = queue.pop() {
        n_visited += 1;
        let node = ensemble.node(node_idx);
        acc.count[node.feature()] += 1;

        let (feature, threshold, left, right) = match *node {
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => (feature, threshold, left, right),
            // Only a root can be dequeued as a leaf, it predicts the mean residual.
            Node::Leaf { .. } => continue,
        };

        let pre_split_mse = subset_squared_error(&y_target, &y_pred_tree, &subset);

        let (left_subset, right_subset) = split_subset(subset, dataset.x.get_col(feature), threshold);
        assign_subset_mean(&y_target, &mut y_pred_tree, &left_subset);
        assign_subset_mean(&y_target, &mut y_pred_tree, &right_subset);

        let post_split_mse = subset_squared_error(&y_target, &y_pred_tree, &left_subset)
            + subset_squared_error(&y_target, &y_pred_tree, &right_subset);

        let delta_mse = pre_split_mse - post_split_mse;
        if delta_mse < 0. {
            warn!(
                "Split on feature {} at node {} of tree {} increases the squared error by {}.",
                feature, node_idx, tree, -delta_mse
            );
        }
        acc.importance[feature] += delta_mse / n_instances as f64;

        if !ensemble.is_leaf(left) {
            queue.push(left, left_subset);
        }
        if !ensemble.is_leaf(right) {
            queue.push(right, right_subset);
        }
    }

    let weight = ensemble.weight_of(tree);
    y_pred
        .iter_mut()
        .zip(y_pred_tree.iter())
        .for_each(|(p, t)| *p += t * weight);

    debug!("tree {}, weight: {}, visited nodes: {}", tree, weight, n_visited);

    (y_pred, y_pred_tree)
}

/// Evaluates the feature importance of tree ensembles on a dataset.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ImportanceEvaluator {
    /// Setting to a value (N) other than zero will result in information
    /// being logged about every N trees, and a summary at the end.
    #[serde(default = "default_log_iterations")]
    pub log_iterations: usize,
    /// Rescale the importance vector to sum to one.
    #[serde(default = "default_normalize")]
    pub normalize: bool,
}

fn default_log_iterations() -> usize {
    0
}
fn default_normalize() -> bool {
    false
}

impl Default for ImportanceEvaluator {
    fn default() -> Self {
        Self::new(default_log_iterations(), default_normalize())
    }
}

impl ImportanceEvaluator {
    /// Feature importance evaluator.
    ///
    /// * `log_iterations` - Log progress every `log_iterations` trees, zero disables logging.
    /// * `normalize` - Rescale the importance vector to sum to one.
    pub fn new(log_iterations: usize, normalize: bool) -> Self {
        ImportanceEvaluator {
            log_iterations,
            normalize,
        }
    }

    /// Set the logging frequency.
    pub fn set_log_iterations(mut self, log_iterations: usize) -> Self {
        self.log_iterations = log_iterations;
        self
    }

    /// Set whether the importance vector should be normalized.
    pub fn set_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Compute the importance and count of every feature of `dataset` for `ensemble`.
    ///
    /// Trees are processed in order, each one fitting the residual left by the
    /// previous ones. The dataset shape, and the ensemble against the dataset,
    /// are validated before any tree is processed.
    pub fn evaluate(&self, ensemble: &Ensemble, dataset: &Dataset) -> Result<FeatureImportance, RankevalError> {
        // Both have public fields, so they may have skipped their constructors.
        dataset.validate()?;
        ensemble.validate(dataset.n_features())?;

        let start = Instant::now();
        let mut acc = FeatureImportance::new(dataset.n_features());
        let mut y_pred = vec![0.; dataset.n_instances()];

        for tree in 0..ensemble.n_trees() {
            let (updated, _) = tree_feature_importance(ensemble, dataset, tree, y_pred, &mut acc);
            y_pred = updated;
            if self.log_iterations > 0 && (tree + 1) % self.log_iterations == 0 {
                info!(
                    "tree {:0?}, node visits: {:1?}, total importance: {:2?}",
                    tree,
                    acc.total_count(),
                    acc.importance.iter().sum::<f64>(),
                );
            }
        }

        if self.log_iterations > 0 {
            info!(
                "Finished evaluating {0} trees on {1} instances in {2:?}.",
                ensemble.n_trees(),
                dataset.n_instances(),
                start.elapsed()
            );
        }

        if self.normalize {
            Ok(acc.normalized())
        } else {
            Ok(acc)
        }
    }

    /// Dump the evaluator configuration as a json object.
    pub fn json_dump(&self) -> Result<String, RankevalError> {
        serde_json::to_string(self).map_err(|e| RankevalError::UnableToWrite(e.to_string()))
    }

    /// Load an evaluator configuration from a json string.
    pub fn from_json(json_str: &str) -> Result<Self, RankevalError> {
        serde_json::from_str::<ImportanceEvaluator>(json_str).map_err(|e| RankevalError::UnableToRead(e.to_string()))
    }
}

/// Compute the importance and count of every feature of `dataset` for `ensemble`,
/// with the default evaluator.
pub fn compute_feature_importance(ensemble: &Ensemble, dataset: &Dataset) -> Result<FeatureImportance, RankevalError> {
    ImportanceEvaluator::default().evaluate(ensemble, dataset)
}
