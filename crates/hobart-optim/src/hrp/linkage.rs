//! Single-linkage agglomerative clustering stored as a flat merge table.
//!
//! Leaves are `0..n`. The `k`-th merge creates internal node `n + k`, so the
//! tree is an arena indexed by node id and the root is the last merge.

use crate::error::OptimError;
use ndarray::Array2;
use serde::Serialize;

/// One agglomeration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Merge {
    /// Smaller child node id
    pub left: usize,
    /// Larger child node id
    pub right: usize,
    /// Linkage distance at which the children merge
    pub distance: f64,
    /// Leaves under the new node
    pub size: usize,
}

/// Binary clustering tree over `n_leaves` items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkageTree {
    n_leaves: usize,
    merges: Vec<Merge>,
}

impl LinkageTree {
    /// Single-linkage clustering of a symmetric distance matrix.
    ///
    /// Built from a minimum spanning tree (Prim) whose edges are merged in
    /// increasing order of length, which yields exactly the single-linkage
    /// hierarchy.
    ///
    /// # Errors
    /// Fails for an empty, non-square or non-finite distance matrix.
    pub fn single_linkage(distance: &Array2<f64>) -> Result<Self, OptimError> {
        let n = distance.nrows();
        if n == 0 || distance.ncols() != n {
            return Err(OptimError::Mismatch(format!(
                "distance matrix of shape {:?}",
                distance.dim()
            )));
        }
        if distance.iter().any(|d| !d.is_finite()) {
            return Err(OptimError::InvalidParameter(
                "distance matrix contains non-finite entries".to_string(),
            ));
        }

        let edges = minimum_spanning_tree(distance);

        let mut parent: Vec<usize> = (0..n).collect();
        let mut node_of_root: Vec<usize> = (0..n).collect();
        let mut size = vec![1usize; n];
        let mut merges = Vec::with_capacity(n.saturating_sub(1));

        for (a, b, dist) in edges {
            let ra = find(&mut parent, a);
            let rb = find(&mut parent, b);
            let (id_a, id_b) = (node_of_root[ra], node_of_root[rb]);
            let merged = size[ra] + size[rb];

            merges.push(Merge {
                left: id_a.min(id_b),
                right: id_a.max(id_b),
                distance: dist,
                size: merged,
            });

            parent[rb] = ra;
            size[ra] = merged;
            node_of_root[ra] = n + merges.len() - 1;
        }

        Ok(Self {
            n_leaves: n,
            merges,
        })
    }

    /// Number of leaves.
    pub const fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Merge table in agglomeration order.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Id of the root node.
    pub fn root(&self) -> usize {
        if self.merges.is_empty() {
            0
        } else {
            self.n_leaves + self.merges.len() - 1
        }
    }

    /// Whether `node` is a leaf.
    pub const fn is_leaf(&self, node: usize) -> bool {
        node < self.n_leaves
    }

    /// Children of an internal node.
    pub fn children(&self, node: usize) -> Option<(usize, usize)> {
        node.checked_sub(self.n_leaves)
            .and_then(|k| self.merges.get(k))
            .map(|m| (m.left, m.right))
    }

    /// Leaves under `node`.
    pub fn size(&self, node: usize) -> usize {
        if self.is_leaf(node) {
            1
        } else {
            self.merges
                .get(node - self.n_leaves)
                .map_or(0, |m| m.size)
        }
    }

    /// Leaves in left-to-right order, so every subtree occupies a contiguous
    /// block.
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.n_leaves);
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            match self.children(node) {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => order.push(node),
            }
        }
        order
    }
}

/// Prim's algorithm on a dense matrix; edges sorted by length.
fn minimum_spanning_tree(distance: &Array2<f64>) -> Vec<(usize, usize, f64)> {
    let n = distance.nrows();
    let mut in_tree = vec![false; n];
    let mut best = vec![f64::INFINITY; n];
    let mut nearest = vec![0usize; n];
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    in_tree[0] = true;
    for j in 1..n {
        best[j] = distance[[0, j]];
    }

    for _ in 1..n {
        let next = (0..n)
            .filter(|&j| !in_tree[j])
            .min_by(|&a, &b| best[a].total_cmp(&best[b]));
        let Some(j) = next else { break };

        edges.push((nearest[j], j, best[j]));
        in_tree[j] = true;
        for k in 0..n {
            if !in_tree[k] && distance[[j, k]] < best[k] {
                best[k] = distance[[j, k]];
                nearest[k] = j;
            }
        }
    }

    edges.sort_by(|a, b| a.2.total_cmp(&b.2));
    edges
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}
