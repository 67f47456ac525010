//! Agglomerative clustering trees in scipy linkage convention.
//!
//! Leaves are numbered `0..n`. Merge `k` creates node `n + k`; its children
//! refer either to leaves or to earlier merges.

use crate::error::{Result, RiskError};
use serde::{Deserialize, Serialize};

/// One agglomeration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    /// Node id of the left child.
    pub left: usize,
    /// Node id of the right child.
    pub right: usize,
    /// Distance at which the children were joined.
    pub height: f64,
    /// Number of leaves under the new node.
    pub size: usize,
}

/// Clustering tree over labelled leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dendrogram {
    labels: Vec<String>,
    merges: Vec<Merge>,
    order: Vec<usize>,
}

impl Dendrogram {
    /// Build a tree from `n - 1` merges over `labels`.
    ///
    /// `order` is the display order of the leaves; when `None` the tree is
    /// walked left to right.
    pub fn new(labels: Vec<String>, merges: Vec<Merge>, order: Option<Vec<usize>>) -> Result<Self> {
        let n = labels.len();
        if n > 0 && merges.len() != n - 1 {
            return Err(RiskError::DimensionMismatch {
                expected: n - 1,
                actual: merges.len(),
            });
        }
        for (k, m) in merges.iter().enumerate() {
            if m.left >= n + k || m.right >= n + k {
                return Err(RiskError::InvalidParameter(format!(
                    "merge {k} references a node that does not exist yet"
                )));
            }
        }

        let mut tree = Self {
            labels,
            merges,
            order: Vec::new(),
        };
        tree.order = match order {
            Some(order) => {
                let mut seen = order.clone();
                seen.sort_unstable();
                if seen != (0..n).collect::<Vec<_>>() {
                    return Err(RiskError::InvalidParameter(
                        "leaf order is not a permutation of the leaves".to_string(),
                    ));
                }
                order
            }
            None => tree.traversal(),
        };
        Ok(tree)
    }

    /// Leaf labels in input order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Merge steps in agglomeration order.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Display order of the leaves.
    pub fn leaf_order(&self) -> &[usize] {
        &self.order
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.labels.len()
    }

    /// Id of the root node.
    pub fn root(&self) -> usize {
        (self.n_leaves() + self.merges.len()).saturating_sub(1)
    }

    /// Children of an internal node.
    pub fn children(&self, node: usize) -> Option<(usize, usize)> {
        let n = self.n_leaves();
        node.checked_sub(n)
            .and_then(|k| self.merges.get(k))
            .map(|m| (m.left, m.right))
    }

    /// Leaves under `node`, left to right.
    pub fn leaves_under(&self, node: usize) -> Vec<usize> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            match self.children(id) {
                Some((l, r)) => {
                    stack.push(r);
                    stack.push(l);
                }
                None => leaves.push(id),
            }
        }
        leaves
    }

    fn traversal(&self) -> Vec<usize> {
        if self.labels.is_empty() {
            return Vec::new();
        }
        self.leaves_under(self.root())
    }

    /// Flat cluster assignment with at most `k` clusters, obtained by undoing
    /// the last `k - 1` merges. Cluster ids are numbered by first appearance
    /// in the leaf order.
    pub fn cut(&self, k: usize) -> Vec<usize> {
        let n = self.n_leaves();
        let k = k.clamp(1, n.max(1));

        // the k roots after undoing the top k - 1 merges
        let mut roots = vec![self.root()];
        for step in 0..k.saturating_sub(1) {
            let node = n + self.merges.len() - 1 - step;
            if let Some(pos) = roots.iter().position(|&r| r == node)
                && let Some((l, r)) = self.children(node)
            {
                roots.swap_remove(pos);
                roots.push(l);
                roots.push(r);
            }
        }

        let mut assignment = vec![0; n];
        let mut by_leaf: Vec<(usize, usize)> = Vec::with_capacity(n);
        for (c, root) in roots.iter().enumerate() {
            for leaf in self.leaves_under(*root) {
                by_leaf.push((leaf, c));
            }
        }

        let position: Vec<usize> = {
            let mut pos = vec![0; n];
            for (i, &leaf) in self.order.iter().enumerate() {
                pos[leaf] = i;
            }
            pos
        };
        let mut first_seen: Vec<(usize, usize)> = roots
            .iter()
            .enumerate()
            .map(|(c, root)| {
                let first = self
                    .leaves_under(*root)
                    .iter()
                    .map(|&l| position[l])
                    .min()
                    .unwrap_or(usize::MAX);
                (first, c)
            })
            .collect();
        first_seen.sort_unstable();
        let mut renumber = vec![0; roots.len()];
        for (new_id, (_, c)) in first_seen.iter().enumerate() {
            renumber[*c] = new_id;
        }

        for (leaf, c) in by_leaf {
            assignment[leaf] = renumber[c];
        }
        assignment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("A{i}")).collect()
    }

    // ((0, 1), (2, 3)) joined at the top
    fn two_pairs() -> Dendrogram {
        Dendrogram::new(
            labels(4),
            vec![
                Merge { left: 0, right: 1, height: 0.1, size: 2 },
                Merge { left: 2, right: 3, height: 0.2, size: 2 },
                Merge { left: 4, right: 5, height: 0.9, size: 4 },
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_traversal_order() {
        let tree = two_pairs();
        assert_eq!(tree.leaf_order(), &[0, 1, 2, 3]);
        assert_eq!(tree.root(), 6);
        assert_eq!(tree.leaves_under(5), vec![2, 3]);
    }

    #[test]
    fn test_cut() {
        let tree = two_pairs();
        assert_eq!(tree.cut(1), vec![0, 0, 0, 0]);
        assert_eq!(tree.cut(2), vec![0, 0, 1, 1]);
        let four = tree.cut(4);
        let mut distinct = four.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn test_invalid_trees() {
        let bad = Dendrogram::new(
            labels(3),
            vec![
                Merge { left: 0, right: 4, height: 0.1, size: 2 },
                Merge { left: 2, right: 3, height: 0.2, size: 3 },
            ],
            None,
        );
        assert!(bad.is_err());

        let bad_order = Dendrogram::new(
            labels(2),
            vec![Merge { left: 0, right: 1, height: 0.1, size: 2 }],
            Some(vec![0, 0]),
        );
        assert!(bad_order.is_err());
    }
}
