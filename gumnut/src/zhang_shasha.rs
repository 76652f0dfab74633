//! Zhang and Shasha's tree edit distance (1989), used to align small subtrees
//! exactly once the heuristics have paired their roots.
//!
//! Each subtree is linearized in postorder and addressed by 1-based offsets;
//! offset 0 stands for the empty forest. `leftmost[i - 1]` is the 0-based
//! offset of the leftmost leaf below offset `i`, so the forest strictly left
//! of node `i` ends at `leftmost[i - 1]`.

use crate::config::Comparator;
use crate::trace;
use crate::tree::{Label, NodeId, Tree};

const DELETION_COST: f64 = 1.0;
const INSERTION_COST: f64 = 1.0;

/// A subtree linearized for the dynamic program.
struct Subtree<'a, L: Label> {
    tree: &'a Tree<L>,
    /// Node ids in postorder.
    ids: Vec<NodeId>,
    leftmost: Vec<usize>,
    /// Offsets of the key roots, ascending.
    key_roots: Vec<usize>,
}

impl<'a, L: Label> Subtree<'a, L> {
    fn new(tree: &'a Tree<L>, root: NodeId) -> Self {
        let ids = tree.postorder(root);
        let offset = tree.postorder_index(ids[0]);
        let leftmost: Vec<usize> = ids
            .iter()
            .map(|&id| tree.postorder_index(tree[id].leftmost_descendant()) - offset)
            .collect();

        // The highest node sharing a leftmost leaf is that leaf's key root.
        let mut visited = vec![false; ids.len()];
        let mut key_roots = Vec::new();
        for i in (1..=ids.len()).rev() {
            let lmd = leftmost[i - 1];
            if !visited[lmd] {
                visited[lmd] = true;
                key_roots.push(i);
            }
        }
        key_roots.reverse();

        Self {
            tree,
            ids,
            leftmost,
            key_roots,
        }
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline(always)]
    fn id(&self, offset: usize) -> NodeId {
        self.ids[offset - 1]
    }

    #[inline(always)]
    fn lmd(&self, offset: usize) -> usize {
        self.leftmost[offset - 1]
    }
}

/// Exact edit distance and optimal alignment between two subtrees.
pub struct ZhangShasha<'a, L: Label, C> {
    src: Subtree<'a, L>,
    dst: Subtree<'a, L>,
    comparator: C,
    tree_dist: Vec<Vec<f64>>,
    forest_dist: Vec<Vec<f64>>,
    computed: bool,
}

impl<'a, L: Label, C: Comparator<L>> ZhangShasha<'a, L, C> {
    /// Prepare to compare the subtree of `src` rooted at `src_root` with the
    /// subtree of `dst` rooted at `dst_root`.
    pub fn new(
        src: &'a Tree<L>,
        dst: &'a Tree<L>,
        src_root: NodeId,
        dst_root: NodeId,
        comparator: C,
    ) -> Self {
        let src = Subtree::new(src, src_root);
        let dst = Subtree::new(dst, dst_root);
        let table = vec![vec![0.0; dst.len() + 1]; src.len() + 1];
        Self {
            src,
            dst,
            comparator,
            tree_dist: table.clone(),
            forest_dist: table,
            computed: false,
        }
    }

    /// The minimum cost of turning one subtree into the other.
    pub fn distance(&mut self) -> f64 {
        self.compute_tree_dist();
        self.tree_dist[self.src.len()][self.dst.len()]
    }

    /// Pairs aligned by an optimal edit script, as `(src, dst)` node ids.
    ///
    /// Only pairs the comparator allows to match are returned.
    pub fn matching_nodes(mut self) -> Vec<(NodeId, NodeId)> {
        self.compute_tree_dist();

        let mut matches = Vec::new();
        let mut tree_pairs = vec![(self.src.len(), self.dst.len())];
        // the last forest computed by compute_tree_dist is the root pair's
        let mut root_pair = true;

        while let Some((last_row, last_col)) = tree_pairs.pop() {
            if !root_pair {
                self.compute_forest_dist(last_row, last_col);
            }
            root_pair = false;

            let first_row = self.src.lmd(last_row);
            let first_col = self.dst.lmd(last_col);
            let (mut row, mut col) = (last_row, last_col);

            while row > first_row || col > first_col {
                let fd = &self.forest_dist;
                if row > first_row && fd[row - 1][col] + DELETION_COST == fd[row][col] {
                    row -= 1;
                } else if col > first_col && fd[row][col - 1] + INSERTION_COST == fd[row][col] {
                    col -= 1;
                } else {
                    let lmd_row = self.src.lmd(row);
                    let lmd_col = self.dst.lmd(col);
                    if lmd_row == first_row && lmd_col == first_col {
                        let (s, d) = (self.src.id(row), self.dst.id(col));
                        if self
                            .comparator
                            .is_matching_allowed(&self.src.tree[s], &self.dst.tree[d])
                        {
                            matches.push((s, d));
                        }
                        row -= 1;
                        col -= 1;
                    } else {
                        tree_pairs.push((row, col));
                        row = lmd_row;
                        col = lmd_col;
                    }
                }
            }
        }

        trace!(
            src_size = self.src.len(),
            dst_size = self.dst.len(),
            matches = matches.len(),
            "zhang_shasha done"
        );
        matches
    }

    fn update_cost(&self, row: usize, col: usize) -> f64 {
        let s = &self.src.tree[self.src.id(row)];
        let d = &self.dst.tree[self.dst.id(col)];
        if !self.comparator.is_matching_allowed(s, d) {
            return f64::INFINITY;
        }
        self.comparator.node_distance(s, d)
    }

    fn compute_tree_dist(&mut self) {
        if self.computed {
            return;
        }
        for i in 0..self.src.key_roots.len() {
            for j in 0..self.dst.key_roots.len() {
                self.compute_forest_dist(self.src.key_roots[i], self.dst.key_roots[j]);
            }
        }
        self.computed = true;
    }

    fn compute_forest_dist(&mut self, row: usize, col: usize) {
        let lmd_row = self.src.lmd(row);
        let lmd_col = self.dst.lmd(col);

        self.forest_dist[lmd_row][lmd_col] = 0.0;
        for r in lmd_row + 1..=row {
            self.forest_dist[r][lmd_col] = self.forest_dist[r - 1][lmd_col] + DELETION_COST;
            for c in lmd_col + 1..=col {
                self.forest_dist[lmd_row][c] = self.forest_dist[lmd_row][c - 1] + INSERTION_COST;

                let deletion = self.forest_dist[r - 1][c] + DELETION_COST;
                let insertion = self.forest_dist[r][c - 1] + INSERTION_COST;
                let r_lmd = self.src.lmd(r);
                let c_lmd = self.dst.lmd(c);
                if r_lmd == lmd_row && c_lmd == lmd_col {
                    // both prefixes are whole trees
                    let update = self.forest_dist[r - 1][c - 1] + self.update_cost(r, c);
                    let best = deletion.min(insertion).min(update);
                    self.forest_dist[r][c] = best;
                    self.tree_dist[r][c] = best;
                } else {
                    let subtree = self.forest_dist[r_lmd][c_lmd] + self.tree_dist[r][c];
                    self.forest_dist[r][c] = deletion.min(insertion).min(subtree);
                }
            }
        }
    }
}
