//! A diff session over one tree pair.

use crate::config::{Comparator, ConfigError, DefaultComparator, MatchingConfig};
use crate::mapping::{Mapping, Match};
use crate::matching::Matcher;
use crate::render::{ChangeDisplay, MatchDisplay};
use crate::script::{Change, derive_changes};
use crate::tree::{Label, Tree};
use facet::Facet;

/// Owns a source and a destination tree and diffs them on demand.
///
/// The mapping is computed at most once, on first use. The edit script is
/// computed at most once too: deriving it appends placeholders to the source
/// tree, so it is cached rather than recomputed.
pub struct Diff<L: Label, C = DefaultComparator> {
    src: Tree<L>,
    dst: Tree<L>,
    config: MatchingConfig,
    comparator: C,
    mapping: Option<Mapping>,
    changes: Option<Vec<Change>>,
}

impl<L: Label> Diff<L> {
    /// Diff two trees with the default configuration and comparator.
    pub fn new(src: Tree<L>, dst: Tree<L>) -> Self {
        Self::with_valid_config(src, dst, MatchingConfig::default(), DefaultComparator)
    }
}

impl<L: Label, C: Comparator<L>> Diff<L, C> {
    /// Diff two trees with a custom configuration and comparator.
    pub fn with_config(
        src: Tree<L>,
        dst: Tree<L>,
        config: MatchingConfig,
        comparator: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_valid_config(src, dst, config, comparator))
    }

    pub(crate) fn with_valid_config(
        src: Tree<L>,
        dst: Tree<L>,
        config: MatchingConfig,
        comparator: C,
    ) -> Self {
        Self {
            src,
            dst,
            config,
            comparator,
            mapping: None,
            changes: None,
        }
    }

    /// The source tree, including any placeholders appended by [`Diff::changes`].
    pub fn src(&self) -> &Tree<L> {
        &self.src
    }

    /// The destination tree.
    pub fn dst(&self) -> &Tree<L> {
        &self.dst
    }

    /// The configuration in use.
    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// The node mapping, computed on first call.
    pub fn mapping(&mut self) -> &Mapping {
        let Self {
            src,
            dst,
            config,
            comparator,
            mapping,
            ..
        } = self;
        mapping.get_or_insert_with(|| Matcher::new(src, dst, config, comparator).compute_mapping())
    }

    /// Matched pairs in ascending source id order.
    ///
    /// Only nodes of the original source tree are reported, never the
    /// placeholders added while deriving the edit script.
    pub fn matches(&mut self) -> Vec<Match> {
        let initial_size = self.src.initial_size();
        self.mapping()
            .pairs()
            .filter(|m| m.src.index() < initial_size)
            .collect()
    }

    /// The edit script, computed on first call.
    ///
    /// # Panics
    ///
    /// Panics if the destination root ends up unmapped, e.g. when the
    /// comparator does not allow the two roots to match.
    pub fn changes(&mut self) -> &[Change] {
        if self.changes.is_none() {
            self.mapping();
            let Self {
                src,
                dst,
                comparator,
                mapping,
                changes,
                ..
            } = self;
            if let Some(mapping) = mapping.as_mut() {
                *changes = Some(derive_changes(src, dst, mapping, comparator));
            }
        }
        self.changes.as_deref().unwrap_or_default()
    }

    /// Render a change as text.
    pub fn display_change(&self, change: Change) -> ChangeDisplay<'_, L> {
        ChangeDisplay {
            src: &self.src,
            dst: &self.dst,
            change,
        }
    }

    /// Render a match as text.
    pub fn display_match(&self, pair: Match) -> MatchDisplay<'_, L> {
        MatchDisplay {
            src: &self.src,
            dst: &self.dst,
            pair,
        }
    }

    /// Compute everything and keep only the results.
    ///
    /// # Panics
    ///
    /// Panics under the same condition as [`Diff::changes`].
    pub fn into_report(mut self) -> DiffReport {
        let changes = self.changes().to_vec();
        DiffReport {
            matches: self.matches(),
            changes,
        }
    }

    /// Give the trees back. The source tree keeps any placeholders.
    pub fn into_trees(self) -> (Tree<L>, Tree<L>) {
        (self.src, self.dst)
    }
}

/// The results of one diff session.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct DiffReport {
    /// Matched pairs in ascending source id order.
    pub matches: Vec<Match>,
    /// The edit script.
    pub changes: Vec<Change>,
}
