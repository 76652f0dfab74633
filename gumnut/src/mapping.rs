//! Partial bijection between the nodes of a source and a destination tree.

use crate::tree::NodeId;
use facet::Facet;

/// A bidirectional, injective mapping between source and destination nodes.
///
/// Both directions are plain vectors indexed by [`NodeId`], grown on demand,
/// so lookups are O(1). Links are never removed.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    src_to_dst: Vec<Option<NodeId>>,
    dst_to_src: Vec<Option<NodeId>>,
    len: usize,
}

impl Mapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping sized for trees of the given lengths.
    pub fn with_capacity(src_len: usize, dst_len: usize) -> Self {
        Self {
            src_to_dst: vec![None; src_len],
            dst_to_src: vec![None; dst_len],
            len: 0,
        }
    }

    /// Link `src` to `dst`.
    ///
    /// # Panics
    ///
    /// Panics if either node is already linked.
    pub fn link(&mut self, src: NodeId, dst: NodeId) {
        assert!(
            !self.has_src(src),
            "source node {src} is already linked to {:?}",
            self.get_dst(src)
        );
        assert!(
            !self.has_dst(dst),
            "destination node {dst} is already linked to {:?}",
            self.get_src(dst)
        );

        let (s, d) = (src.index(), dst.index());
        if s >= self.src_to_dst.len() {
            self.src_to_dst.resize(s + 1, None);
        }
        if d >= self.dst_to_src.len() {
            self.dst_to_src.resize(d + 1, None);
        }
        self.src_to_dst[s] = Some(dst);
        self.dst_to_src[d] = Some(src);
        self.len += 1;
    }

    /// Check if a source node is linked.
    #[inline(always)]
    pub fn has_src(&self, src: NodeId) -> bool {
        self.get_dst(src).is_some()
    }

    /// Check if a destination node is linked.
    #[inline(always)]
    pub fn has_dst(&self, dst: NodeId) -> bool {
        self.get_src(dst).is_some()
    }

    /// The destination node linked to `src`.
    #[inline(always)]
    pub fn get_dst(&self, src: NodeId) -> Option<NodeId> {
        self.src_to_dst.get(src.index()).copied().flatten()
    }

    /// The source node linked to `dst`.
    #[inline(always)]
    pub fn get_src(&self, dst: NodeId) -> Option<NodeId> {
        self.dst_to_src.get(dst.index()).copied().flatten()
    }

    /// Number of linked pairs.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if nothing is linked.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All linked pairs, in ascending source id order.
    pub fn pairs(&self) -> impl Iterator<Item = Match> + '_ {
        self.src_to_dst
            .iter()
            .enumerate()
            .filter_map(|(s, dst)| dst.map(|dst| Match::new(NodeId::new(s), dst)))
    }
}

/// One linked `(src, dst)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Facet)]
pub struct Match {
    /// Node in the source tree.
    pub src: NodeId,
    /// Node in the destination tree.
    pub dst: NodeId,
}

impl Match {
    /// Create a match.
    pub fn new(src: NodeId, dst: NodeId) -> Self {
        Self { src, dst }
    }
}
