use crate::data::Matrix;
use crate::errors::RankevalError;
use crate::node::{goes_left, Node};
use hashbrown::HashMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Root and additive weight of one tree of the ensemble.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Tree {
    pub root: usize,
    pub weight: f64,
}

/// Additive ensemble of regression trees.
///
/// All nodes of all trees live in one arena, `nodes`, and each tree is
/// identified by the index of its root in that arena. A node belongs to
/// exactly one tree, and the output of the ensemble for an instance is
/// the sum over the trees of `weight * leaf value`.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Ensemble {
    pub nodes: Vec<Node>,
    pub trees: Vec<Tree>,
}

impl Ensemble {
    /// Build an ensemble from a node arena and the list of trees, checking
    /// that the trees are well formed.
    pub fn new(nodes: Vec<Node>, trees: Vec<Tree>) -> Result<Self, RankevalError> {
        let ensemble = Ensemble { nodes, trees };
        ensemble.validate_structure()?;
        Ok(ensemble)
    }

    /// Build an ensemble from the flat parallel-array encoding.
    ///
    /// * `roots` - Node id of the root of each tree.
    /// * `weights` - Additive weight of each tree.
    /// * `split_feature` - Feature id of each node.
    /// * `split_threshold` - Split threshold of each node, holds the output value for leaves.
    /// * `left_child` - Left child of each node, `None` for leaves.
    /// * `right_child` - Right child of each node, `None` for leaves.
    pub fn from_arrays(
        roots: &[usize],
        weights: &[f64],
        split_feature: &[usize],
        split_threshold: &[f64],
        left_child: &[Option<usize>],
        right_child: &[Option<usize>],
    ) -> Result<Self, RankevalError> {
        if weights.len() != roots.len() {
            return Err(RankevalError::ShapeMismatch(
                "tree weights".to_string(),
                roots.len(),
                weights.len(),
            ));
        }
        let n_nodes = split_feature.len();
        for (name, len) in [
            ("split thresholds", split_threshold.len()),
            ("left children", left_child.len()),
            ("right children", right_child.len()),
        ] {
            if len != n_nodes {
                return Err(RankevalError::ShapeMismatch(name.to_string(), n_nodes, len));
            }
        }

        let nodes = (0..n_nodes)
            .map(|i| match (left_child[i], right_child[i]) {
                (Some(left), Some(right)) => Ok(Node::Split {
                    feature: split_feature[i],
                    threshold: split_threshold[i],
                    left,
                    right,
                }),
                (None, None) => Ok(Node::Leaf {
                    feature: split_feature[i],
                    value: split_threshold[i],
                }),
                _ => Err(RankevalError::MalformedEnsemble(format!(
                    "node {} has exactly one child",
                    i
                ))),
            })
            .collect::<Result<Vec<Node>, RankevalError>>()?;

        let trees = roots
            .iter()
            .zip(weights)
            .map(|(root, weight)| Tree {
                root: *root,
                weight: *weight,
            })
            .collect();

        Self::new(nodes, trees)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_of(&self, tree: usize) -> usize {
        self.trees[tree].root
    }

    pub fn weight_of(&self, tree: usize) -> f64 {
        self.trees[tree].weight
    }

    pub fn node(&self, node: usize) -> &Node {
        &self.nodes[node]
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        self.nodes[node].is_leaf()
    }

    /// Node ids reachable from the root of a tree, in breadth first order.
    /// The ensemble is expected to be structurally valid.
    pub fn tree_nodes(&self, tree: usize) -> Vec<usize> {
        let mut ids = vec![self.root_of(tree)];
        let mut i = 0;
        while i < ids.len() {
            if let Some((left, right)) = self.nodes[ids[i]].children() {
                ids.push(left);
                ids.push(right);
            }
            i += 1;
        }
        ids
    }

    /// Check that every root and child id is in range, and that every node
    /// is reached at most once across the whole ensemble, so no node is
    /// shared between trees and no tree contains a cycle.
    pub fn validate_structure(&self) -> Result<(), RankevalError> {
        let n_nodes = self.nodes.len();
        let mut owner: HashMap<usize, usize> = HashMap::with_capacity(n_nodes);
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.root >= n_nodes {
                return Err(RankevalError::MalformedEnsemble(format!(
                    "root {} of tree {} is out of range for {} nodes",
                    tree.root, t, n_nodes
                )));
            }
            let mut stack = vec![tree.root];
            while let Some(idx) = stack.pop() {
                if let Some(other) = owner.insert(idx, t) {
                    return Err(RankevalError::MalformedEnsemble(if other == t {
                        format!("node {} is reached twice in tree {}", idx, t)
                    } else {
                        format!("node {} of tree {} already belongs to tree {}", idx, t, other)
                    }));
                }
                if let Some((left, right)) = self.nodes[idx].children() {
                    for child in [left, right] {
                        if child >= n_nodes {
                            return Err(RankevalError::MalformedEnsemble(format!(
                                "child {} of node {} is out of range for {} nodes",
                                child, idx, n_nodes
                            )));
                        }
                        stack.push(child);
                    }
                }
            }
        }
        Ok(())
    }

    /// Check that every feature the evaluation will look at is below `n_features`.
    /// These are the split features, plus the feature slot of trees whose root is a leaf.
    pub fn validate_features(&self, n_features: usize) -> Result<(), RankevalError> {
        for t in 0..self.n_trees() {
            for idx in self.tree_nodes(t) {
                let node = &self.nodes[idx];
                if (!node.is_leaf() || idx == self.root_of(t)) && node.feature() >= n_features {
                    return Err(RankevalError::FeatureOutOfRange {
                        tree: t,
                        node: idx,
                        feature: node.feature(),
                        n_features,
                    });
                }
            }
        }
        Ok(())
    }

    /// Full validation against a dataset with `n_features` features.
    pub fn validate(&self, n_features: usize) -> Result<(), RankevalError> {
        self.validate_structure()?;
        self.validate_features(n_features)
    }

    /// Id of the leaf a row of the data reaches in a tree.
    ///
    /// # Panics
    ///
    /// Panics if the ensemble is not valid for `data`, see [`Ensemble::validate`].
    pub fn apply_tree_row(&self, tree: usize, data: &Matrix<f64>, row: usize) -> usize {
        let mut node_idx = self.root_of(tree);
        while let Node::Split {
            feature,
            threshold,
            left,
            right,
        } = &self.nodes[node_idx]
        {
            node_idx = if goes_left(*data.get(row, *feature), *threshold) {
                *left
            } else {
                *right
            };
        }
        node_idx
    }

    /// Output of a single tree, unweighted, for one row of the data.
    ///
    /// # Panics
    ///
    /// Panics if the ensemble is not valid for `data`, see [`Ensemble::validate`].
    pub fn predict_tree_row(&self, tree: usize, data: &Matrix<f64>, row: usize) -> f64 {
        match self.nodes[self.apply_tree_row(tree, data, row)] {
            Node::Leaf { value, .. } => value,
            // apply_tree_row only stops on leaves.
            Node::Split { .. } => f64::NAN,
        }
    }

    /// Weighted sum of the tree outputs for one row of the data.
    ///
    /// # Panics
    ///
    /// Panics if the ensemble is not valid for `data`, see [`Ensemble::validate`].
    pub fn predict_row(&self, data: &Matrix<f64>, row: usize) -> f64 {
        self.trees
            .iter()
            .enumerate()
            .map(|(t, tree)| tree.weight * self.predict_tree_row(t, data, row))
            .sum()
    }

    fn predict_single_threaded(&self, data: &Matrix<f64>) -> Vec<f64> {
        data.index.iter().map(|i| self.predict_row(data, *i)).collect()
    }

    fn predict_parallel(&self, data: &Matrix<f64>) -> Vec<f64> {
        data.index.par_iter().map(|i| self.predict_row(data, *i)).collect()
    }

    /// Generate predictions on data using the ensemble.
    ///
    /// The matrix shape and the ensemble are validated against each other first.
    ///
    /// * `data` - Feature matrix, column major.
    /// * `parallel` - Predict rows in parallel.
    pub fn predict(&self, data: &Matrix<f64>, parallel: bool) -> Result<Vec<f64>, RankevalError> {
        if data.data.len() != data.rows * data.cols {
            return Err(RankevalError::ShapeMismatch(
                "feature matrix values".to_string(),
                data.rows * data.cols,
                data.data.len(),
            ));
        }
        self.validate(data.cols)?;
        if parallel {
            Ok(self.predict_parallel(data))
        } else {
            Ok(self.predict_single_threaded(data))
        }
    }

    /// Dump the ensemble as a json object.
    pub fn json_dump(&self) -> Result<String, RankevalError> {
        serde_json::to_string(self).map_err(|e| RankevalError::UnableToWrite(e.to_string()))
    }

    /// Load an ensemble from a json string produced by [`Ensemble::json_dump`].
    pub fn from_json(json_str: &str) -> Result<Self, RankevalError> {
        let ensemble =
            serde_json::from_str::<Ensemble>(json_str).map_err(|e| RankevalError::UnableToRead(e.to_string()))?;
        ensemble.validate_structure()?;
        Ok(ensemble)
    }
}

impl Display for Ensemble {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut r = String::new();
        for (t, tree) in self.trees.iter().enumerate() {
            r += format!("tree {} weight={}\n", t, tree.weight).as_str();
            let mut print_buffer: Vec<(usize, usize)> = vec![(tree.root, 1)];
            while let Some((idx, depth)) = print_buffer.pop() {
                let node = &self.nodes[idx];
                r += format!("{}{}:{}\n", "      ".repeat(depth), idx, node).as_str();
                if let Some((left, right)) = node.children() {
                    print_buffer.push((right, depth + 1));
                    print_buffer.push((left, depth + 1));
                }
            }
        }
        write!(f, "{}", r)
    }
}
