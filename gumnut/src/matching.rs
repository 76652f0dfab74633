//! GumTree node matching.
//!
//! Two phases, as in Falleri et al. (ASE 2014):
//! 1. Top-down: pair up the highest isomorphic subtrees.
//! 2. Bottom-up: pair the remaining inner nodes by how many of their
//!    descendants are already paired (Dice coefficient), then align small
//!    subtree pairs exactly with Zhang-Shasha.

use crate::config::{Comparator, MatchingConfig};
use crate::mapping::Mapping;
use crate::tree::{Label, NodeId, Tree};
use crate::zhang_shasha::ZhangShasha;
use crate::{debug, trace};
use core::cmp::Reverse;
use std::collections::BinaryHeap;

/// Computes a [`Mapping`] between two trees.
pub struct Matcher<'a, L: Label, C> {
    src: &'a Tree<L>,
    dst: &'a Tree<L>,
    config: &'a MatchingConfig,
    comparator: &'a C,
}

impl<'a, L: Label, C: Comparator<L>> Matcher<'a, L, C> {
    /// Create a matcher for one tree pair.
    pub fn new(
        src: &'a Tree<L>,
        dst: &'a Tree<L>,
        config: &'a MatchingConfig,
        comparator: &'a C,
    ) -> Self {
        Self {
            src,
            dst,
            config,
            comparator,
        }
    }

    /// Run both phases and return the resulting mapping.
    pub fn compute_mapping(&self) -> Mapping {
        debug!(
            src_nodes = self.src.len(),
            dst_nodes = self.dst.len(),
            "compute_mapping start"
        );

        let mut mapping = self.match_top_down();
        debug!(matched = mapping.len(), "after match_top_down");

        self.match_bottom_up(&mut mapping);
        debug!(matched = mapping.len(), "after match_bottom_up");

        mapping
    }

    /// Whether the comparator allows `s` and `d` to be paired at all.
    #[inline]
    pub fn is_matching_possible(&self, s: NodeId, d: NodeId) -> bool {
        self.comparator
            .is_matching_allowed(&self.src[s], &self.dst[d])
    }

    /// Whether the subtrees rooted at `s` and `d` are identical: same shape,
    /// matchable kinds and zero value distance all the way down.
    pub fn isomorphic(&self, s: NodeId, d: NodeId) -> bool {
        let mut pending = vec![(s, d)];
        while let Some((s, d)) = pending.pop() {
            let (ns, nd) = (&self.src[s], &self.dst[d]);
            if ns.children().len() != nd.children().len()
                || !self.is_matching_possible(s, d)
                || self.comparator.node_distance(ns, nd) != 0.0
            {
                return false;
            }
            pending.extend(ns.children().iter().copied().zip(nd.children().iter().copied()));
        }
        true
    }

    /// The legality rule every link goes through.
    ///
    /// Neither node may be linked yet. Unless the config disables the check,
    /// the parents must also be compatible: both absent (two roots), or both
    /// present and allowed to match each other.
    pub fn can_be_added(&self, mapping: &Mapping, s: NodeId, d: NodeId) -> bool {
        debug_assert!(self.is_matching_possible(s, d));
        if mapping.has_src(s) || mapping.has_dst(d) {
            return false;
        }
        if self.config.enable_matching_with_unmatchable_parents {
            return true;
        }
        match (self.src[s].parent(), self.dst[d].parent()) {
            (None, None) => true,
            (Some(ps), Some(pd)) => self.is_matching_possible(ps, pd),
            _ => false,
        }
    }

    /// Dice coefficient of the descendants of `s` and `d` under `mapping`:
    /// twice the number of descendants of `s` paired into the subtree of `d`,
    /// over the two subtree sizes.
    pub fn similarity(&self, mapping: &Mapping, s: NodeId, d: NodeId) -> f64 {
        let last = self.src[s].rightmost_descendant().index();
        let common = (s.index() + 1..=last)
            .filter_map(|i| mapping.get_dst(NodeId::new(i)))
            .filter(|&mapped| self.dst.is_in_subtree(mapped, d))
            .count();
        let total = self.src.number_of_descendants(s) + self.dst.number_of_descendants(d);
        2.0 * common as f64 / total as f64
    }

    /// Link the subtrees rooted at `s` and `d` node by node.
    ///
    /// Only valid for isomorphic subtrees: they have the same size and, ids
    /// being preorder, `s + k` corresponds to `d + k`.
    fn add_isomorphic_subtrees(&self, mapping: &mut Mapping, s: NodeId, d: NodeId) {
        debug_assert!(self.isomorphic(s, d));
        for k in 0..self.src.number_of_descendants(s) {
            mapping.link(NodeId::new(s.index() + k), NodeId::new(d.index() + k));
        }
    }

    /// Refine a freshly linked pair with the exact matcher, if both subtrees are
    /// small enough.
    fn add_optimal_mapping(&self, mapping: &mut Mapping, s: NodeId, d: NodeId) {
        let size = self
            .src
            .number_of_descendants(s)
            .max(self.dst.number_of_descendants(d));
        if size >= self.config.max_size {
            trace!(
                s = s.index(),
                d = d.index(),
                size,
                max_size = self.config.max_size,
                "skip exact matching"
            );
            return;
        }

        let pairs = ZhangShasha::new(self.src, self.dst, s, d, self.comparator).matching_nodes();
        for (ps, pd) in pairs {
            if self.can_be_added(mapping, ps, pd) {
                mapping.link(ps, pd);
            }
        }
    }

    /// The unlinked, matchable destination node most similar to `s`.
    ///
    /// Only a strictly higher similarity replaces the current best, so ties go
    /// to the lowest id and a zero similarity never yields a candidate.
    fn find_candidate(&self, mapping: &Mapping, s: NodeId) -> Option<(NodeId, f64)> {
        let mut best = None;
        let mut max_similarity = 0.0;
        for d in self.dst.ids() {
            if !self.is_matching_possible(s, d) || mapping.has_dst(d) {
                continue;
            }
            let similarity = self.similarity(mapping, s, d);
            if similarity > max_similarity {
                max_similarity = similarity;
                best = Some((d, similarity));
            }
        }
        best
    }

    /// Phase 1: top-down matching of isomorphic subtrees.
    ///
    /// Two frontiers ordered by height start at the roots. The higher frontier
    /// is opened until both peak at the same height, then every pair of that
    /// height is tested for isomorphism. Nodes left unpaired are opened and the
    /// loop goes on until no frontier reaches `min_height`.
    fn match_top_down(&self) -> Mapping {
        trace!("match_top_down start");
        let mut mapping = Mapping::with_capacity(self.src.len(), self.dst.len());
        let mut src_queue = HeightQueue::new(self.src);
        let mut dst_queue = HeightQueue::new(self.dst);
        src_queue.push(self.src.root());
        dst_queue.push(self.dst.root());

        let min_height = self.config.min_height.max(1);
        loop {
            let (src_max, dst_max) = (src_queue.peek_max(), dst_queue.peek_max());
            if src_max.max(dst_max) < min_height {
                break;
            }
            if src_max > dst_max {
                for s in src_queue.pop_batch() {
                    src_queue.open(s);
                }
                continue;
            }
            if dst_max > src_max {
                for d in dst_queue.pop_batch() {
                    dst_queue.open(d);
                }
                continue;
            }

            let src_batch = src_queue.pop_batch();
            let dst_batch = dst_queue.pop_batch();
            for &s in &src_batch {
                for &d in &dst_batch {
                    if self.isomorphic(s, d) && self.can_be_added(&mapping, s, d) {
                        trace!(
                            s = s.index(),
                            d = d.index(),
                            height = src_max,
                            "isomorphic subtrees"
                        );
                        self.add_isomorphic_subtrees(&mut mapping, s, d);
                    }
                }
            }
            for &s in &src_batch {
                if !mapping.has_src(s) {
                    src_queue.open(s);
                }
            }
            for &d in &dst_batch {
                if !mapping.has_dst(d) {
                    dst_queue.open(d);
                }
            }
        }
        mapping
    }

    /// Phase 2: bottom-up matching by similarity.
    ///
    /// Visits the source tree in postorder. An unmatched node with at least one
    /// matched child is paired with its best candidate when legal and similar
    /// enough. The roots come last and are paired whenever both are still free.
    fn match_bottom_up(&self, mapping: &mut Mapping) {
        trace!("match_bottom_up start");
        let (src_root, dst_root) = (self.src.root(), self.dst.root());

        for s in self.src.postorder(src_root) {
            if s == src_root {
                if !mapping.has_src(src_root)
                    && !mapping.has_dst(dst_root)
                    && self.is_matching_possible(src_root, dst_root)
                {
                    mapping.link(src_root, dst_root);
                    self.add_optimal_mapping(mapping, src_root, dst_root);
                }
                break;
            }

            let node = &self.src[s];
            let has_matched_child = node.children().iter().any(|&c| mapping.has_src(c));
            if mapping.has_src(s) || !has_matched_child {
                continue;
            }

            let Some((d, similarity)) = self.find_candidate(mapping, s) else {
                continue;
            };
            if !self.can_be_added(mapping, s, d) {
                trace!(s = s.index(), d = d.index(), "candidate rejected: illegal");
                continue;
            }
            if similarity < self.config.min_similarity {
                trace!(
                    s = s.index(),
                    d = d.index(),
                    similarity,
                    "candidate rejected: not similar enough"
                );
                continue;
            }

            trace!(s = s.index(), d = d.index(), similarity, "bottom_up match");
            mapping.link(s, d);
            self.add_optimal_mapping(mapping, s, d);
        }
    }
}

/// Max-priority frontier keyed by node height.
struct HeightQueue<'a, L: Label> {
    tree: &'a Tree<L>,
    heap: BinaryHeap<(usize, Reverse<NodeId>)>,
}

impl<'a, L: Label> HeightQueue<'a, L> {
    fn new(tree: &'a Tree<L>) -> Self {
        Self {
            tree,
            heap: BinaryHeap::new(),
        }
    }

    fn push(&mut self, id: NodeId) {
        self.heap.push((self.tree[id].height(), Reverse(id)));
    }

    /// Height of the highest node, 0 when empty.
    fn peek_max(&self) -> usize {
        self.heap.peek().map_or(0, |&(height, _)| height)
    }

    /// Remove every node of the maximum height, in ascending id order.
    fn pop_batch(&mut self) -> Vec<NodeId> {
        let max = self.peek_max();
        let mut batch = Vec::new();
        while let Some(&(height, Reverse(id))) = self.heap.peek()
            && height == max
        {
            self.heap.pop();
            batch.push(id);
        }
        batch.sort_unstable();
        batch
    }

    /// Push the children of `id`.
    fn open(&mut self, id: NodeId) {
        for &child in self.tree[id].children() {
            self.push(child);
        }
    }
}
