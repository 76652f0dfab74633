//! Matching parameters and the pluggable node comparison predicates.

use crate::tree::{Label, Node};
use facet::Facet;

/// Configuration for the matching algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchingConfig {
    /// Minimum height for a node to take part in top-down matching.
    /// Lower subtrees are left for the bottom-up phase.
    pub min_height: usize,

    /// Minimum Dice coefficient for a bottom-up match.
    pub min_similarity: f64,

    /// Exact (Zhang-Shasha) refinement only runs on subtree pairs where both
    /// sides have fewer nodes than this.
    pub max_size: usize,

    /// Skip the parent compatibility part of the legality rule.
    pub enable_matching_with_unmatchable_parents: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_height: 2,
            min_similarity: 0.2,
            max_size: 100,
            enable_matching_with_unmatchable_parents: false,
        }
    }
}

impl MatchingConfig {
    /// Set [`MatchingConfig::min_height`].
    pub fn with_min_height(mut self, min_height: usize) -> Self {
        self.min_height = min_height;
        self
    }

    /// Set [`MatchingConfig::min_similarity`].
    pub fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    /// Set [`MatchingConfig::max_size`].
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set [`MatchingConfig::enable_matching_with_unmatchable_parents`].
    pub fn with_unmatchable_parents(mut self, enable: bool) -> Self {
        self.enable_matching_with_unmatchable_parents = enable;
        self
    }

    /// Reject settings the matchers cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_height == 0 {
            return Err(ConfigError::ZeroMinHeight);
        }
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(ConfigError::MinSimilarityOutOfRange {
                value: self.min_similarity,
            });
        }
        if self.max_size == 0 {
            return Err(ConfigError::ZeroMaxSize);
        }
        Ok(())
    }
}

/// Invalid [`MatchingConfig`].
#[derive(Facet, Debug, Clone, PartialEq)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum ConfigError {
    /// min_height must be at least 1
    ZeroMinHeight,

    /// min_similarity {value} is not within [0, 1]
    MinSimilarityOutOfRange { value: f64 },

    /// max_size must be at least 1
    ZeroMaxSize,
}

/// Decides which nodes may be paired and how far apart their values are.
///
/// Both methods have defaults, so implementors override only what their
/// domain needs.
pub trait Comparator<L: Label> {
    /// Whether `src` and `dst` may ever be matched to each other.
    ///
    /// Defaults to identical kinds.
    fn is_matching_allowed(&self, src: &Node<L>, dst: &Node<L>) -> bool {
        src.kind() == dst.kind()
    }

    /// Distance between the values of two matchable nodes, in `[0, 1]`.
    ///
    /// Defaults to 0 for equal canonical values and 1 otherwise.
    fn node_distance(&self, src: &Node<L>, dst: &Node<L>) -> f64 {
        if src.value() == dst.value() { 0.0 } else { 1.0 }
    }
}

impl<L: Label, C: Comparator<L> + ?Sized> Comparator<L> for &C {
    fn is_matching_allowed(&self, src: &Node<L>, dst: &Node<L>) -> bool {
        (**self).is_matching_allowed(src, dst)
    }

    fn node_distance(&self, src: &Node<L>, dst: &Node<L>) -> f64 {
        (**self).node_distance(src, dst)
    }
}

/// The default [`Comparator`]: identical kinds, value equality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefaultComparator;

impl<L: Label> Comparator<L> for DefaultComparator {}
