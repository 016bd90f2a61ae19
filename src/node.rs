use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing rule shared by every split: values equal to the threshold go left.
/// NaN values compare false and go right.
#[inline]
pub fn goes_left(value: f64, threshold: f64) -> bool {
    value <= threshold
}

/// A single node of a regression tree, addressed by its index in the
/// node arena of an [`Ensemble`](crate::ensemble::Ensemble).
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub enum Node {
    /// Internal node routing instances on `x[feature] <= threshold`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Terminal node. `feature` is the slot carried over from the flat
    /// encoding, it is only looked at when the leaf is a tree root.
    Leaf { feature: usize, value: f64 },
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// The feature stored at this node.
    pub fn feature(&self) -> usize {
        match self {
            Node::Split { feature, .. } | Node::Leaf { feature, .. } => *feature,
        }
    }

    /// Children of a split node, `None` for leaves.
    pub fn children(&self) -> Option<(usize, usize)> {
        match self {
            Node::Split { left, right, .. } => Some((*left, *right)),
            Node::Leaf { .. } => None,
        }
    }

    /// Get the path that should be traveled down, given a value.
    /// Ties go to the left child. Returns `None` on leaves.
    pub fn get_child_idx(&self, v: f64) -> Option<usize> {
        match self {
            Node::Split {
                threshold, left, right, ..
            } => Some(if goes_left(v, *threshold) { *left } else { *right }),
            Node::Leaf { .. } => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Leaf { value, .. } => write!(f, "leaf={}", value),
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => write!(f, "[{} <= {}] yes={},no={}", feature, threshold, left, right),
        }
    }
}
