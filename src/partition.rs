//! Partitioning of instance subsets while walking down a tree.
use crate::node::goes_left;
use std::collections::VecDeque;

/// Split the instances reaching a node into the ones going to the left child
/// and the ones going to the right child. The subset is consumed, both sides
/// keep the relative order of the instances.
///
/// * `subset` - Instance indices reaching the node.
/// * `column` - Values of the split feature for every instance of the dataset.
/// * `threshold` - The split value, instances equal to it go left.
pub fn split_subset(subset: Vec<usize>, column: &[f64], threshold: f64) -> (Vec<usize>, Vec<usize>) {
    subset.into_iter().partition(|i| goes_left(column[*i], threshold))
}

/// FIFO of nodes left to visit, each paired with the instances reaching it.
pub struct NodeQueue {
    queue: VecDeque<(usize, Vec<usize>)>,
}

impl NodeQueue {
    /// A queue holding only the root, reached by every instance of the dataset.
    pub fn new(root: usize, n_instances: usize) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back((root, (0..n_instances).collect()));
        NodeQueue { queue }
    }

    pub fn push(&mut self, node: usize, subset: Vec<usize>) {
        self.queue.push_back((node, subset));
    }

    pub fn pop(&mut self) -> Option<(usize, Vec<usize>)> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
