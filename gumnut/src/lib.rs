//! # Gumnut
//!
//! GumTree-style diffing of labeled, ordered trees.
//!
//! Named after the woody fruit of the gum tree.
//!
//! ## Algorithm Overview
//!
//! Gumnut pairs up the nodes of a source and a destination tree, then derives
//! an edit script from that pairing:
//!
//! 1. **Top-down matching**: pair the highest identical subtrees first
//!    (GumTree, Falleri et al., ASE 2014)
//! 2. **Bottom-up matching**: pair remaining inner nodes by the share of
//!    already paired descendants (Dice coefficient), refining small subtree
//!    pairs with Zhang and Shasha's exact tree edit distance (1989)
//! 3. **Edit script**: UPDATE, INSERT and DELETE operations, found by walking
//!    the destination tree breadth-first
//!
//! Trees come from any front end implementing [`NodeSource`]; [`LabeledTree`]
//! is a ready-made one.
//!
//! ## Usage
//!
//! ```
//! use gumnut::{Change, Diff, LabeledTree};
//!
//! let mut old = LabeledTree::new("list", "");
//! old.add_child(old.root, "item", "a");
//! old.add_child(old.root, "item", "c");
//!
//! let mut new = LabeledTree::new("list", "");
//! new.add_child(new.root, "item", "a");
//! new.add_child(new.root, "item", "b");
//! new.add_child(new.root, "item", "c");
//!
//! let mut diff = Diff::new(old.build(), new.build());
//! let changes = diff.changes().to_vec();
//! assert!(matches!(changes[..], [Change::Insert { position: 1, .. }]));
//! for change in changes {
//!     println!("{}", diff.display_change(change));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]

pub use indextree;

mod tracing_macros;
#[allow(unused_imports)]
use tracing_macros::{debug, trace};

mod config;
mod mapping;
/// GumTree matching algorithm
pub mod matching;
mod render;
mod script;
mod session;
mod source;
/// Tree representation and the front-end capability traits
pub mod tree;
/// Exact tree edit distance
pub mod zhang_shasha;

pub use config::{Comparator, ConfigError, DefaultComparator, MatchingConfig};
pub use mapping::{Mapping, Match};
pub use matching::Matcher;
pub use render::{
    ChangeDisplay, JsonNode, JsonTree, MatchDisplay, NodeDisplay, RenderError, TreeDump,
};
pub use script::{Change, derive_changes};
pub use session::{Diff, DiffReport};
pub use source::{LabeledTree, NodeLabel};
pub use tree::{Label, Node, NodeId, NodeSource, Tree};

use rayon::prelude::*;

/// Diff two trees with the default comparator.
///
/// # Panics
///
/// Panics if the two roots have different kinds: the destination root then
/// stays unmapped and no edit script can be derived (see [`Diff::changes`]).
///
/// # Example
///
/// ```
/// use gumnut::{LabeledTree, MatchingConfig, diff_trees};
///
/// let mut old = LabeledTree::new("root", "");
/// old.add_child(old.root, "leaf", "1");
///
/// let mut new = LabeledTree::new("root", "");
/// new.add_child(new.root, "leaf", "2");
///
/// let report = diff_trees(old.build(), new.build(), &MatchingConfig::default()).unwrap();
/// assert_eq!(report.matches.len(), 2);
/// assert_eq!(report.changes.len(), 1);
/// ```
pub fn diff_trees<L: Label>(
    src: Tree<L>,
    dst: Tree<L>,
    config: &MatchingConfig,
) -> Result<DiffReport, ConfigError> {
    Ok(Diff::with_config(src, dst, *config, DefaultComparator)?.into_report())
}

/// Diff many independent tree pairs in parallel.
///
/// Reports come back in input order.
///
/// # Panics
///
/// Panics if the comparator does not allow some pair's roots to match (see
/// [`Diff::changes`]). One such pair aborts the whole batch.
pub fn diff_all<L, C>(
    pairs: Vec<(Tree<L>, Tree<L>)>,
    config: &MatchingConfig,
    comparator: &C,
) -> Result<Vec<DiffReport>, ConfigError>
where
    L: Label + Send,
    L::Kind: Send,
    C: Comparator<L> + Sync,
{
    config.validate()?;
    debug!(pairs = pairs.len(), "diff_all start");
    Ok(pairs
        .into_par_iter()
        .map(|(src, dst)| Diff::with_valid_config(src, dst, *config, comparator).into_report())
        .collect())
}
