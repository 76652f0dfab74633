//! Edit script derivation.
//!
//! Walks the destination tree breadth-first against a finished mapping:
//! 1. Update: a mapped node whose value changed
//! 2. Insert: an unmapped node, placed under its parent's source counterpart
//! 3. Delete: every source node still unmapped at the end, in id order
//!
//! Inserted nodes are mirrored into the source tree as placeholders, so
//! children inserted later always find a mapped parent.

use crate::config::Comparator;
use crate::mapping::Mapping;
use crate::tree::{Label, NodeId, Tree};
use crate::{debug, trace};
use core::fmt;
use facet::Facet;

/// One edit operation.
///
/// Ids of `Delete` and `Update::src` refer to the source tree; ids of
/// `Insert` and `Update::dst` refer to the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Facet)]
#[repr(u8)]
pub enum Change {
    /// Remove a source node.
    Delete {
        /// The removed node in the source tree.
        src: NodeId,
    },

    /// Change the value of a mapped node.
    Update {
        /// The node in the source tree.
        src: NodeId,
        /// Its counterpart in the destination tree, carrying the new value.
        dst: NodeId,
    },

    /// Add a destination node.
    Insert {
        /// The new node in the destination tree.
        node: NodeId,
        /// Its parent in the destination tree.
        parent: NodeId,
        /// Position among the parent's children (0-indexed).
        position: usize,
    },

    /// Relocate a source node. Never produced by [`derive_changes`].
    Move {
        /// The moved node in the source tree.
        src: NodeId,
        /// New parent in the destination tree.
        parent: NodeId,
        /// New position among the parent's children.
        position: usize,
    },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Delete { src } => write!(f, "Delete(src:{src})"),
            Change::Update { src, dst } => write!(f, "Update(src:{src} -> dst:{dst})"),
            Change::Insert {
                node,
                parent,
                position,
            } => write!(f, "Insert(dst:{node} @{position} under dst:{parent})"),
            Change::Move {
                src,
                parent,
                position,
            } => write!(f, "Move(src:{src} @{position} under dst:{parent})"),
        }
    }
}

/// Collects changes, logging each one.
struct Ops {
    inner: Vec<Change>,
}

impl Ops {
    fn new() -> Self {
        Self { inner: Vec::new() }
    }

    fn push(&mut self, op: Change) {
        debug!(%op, "emit");
        self.inner.push(op);
    }

    fn into_inner(self) -> Vec<Change> {
        self.inner
    }
}

/// Derive the edit script that turns `src` into `dst` under `mapping`.
///
/// Grows `src` by one placeholder and `mapping` by one link per insertion.
///
/// # Panics
///
/// Panics if the destination root is unmapped (e.g. the roots' kinds are not
/// allowed to match): an inserted node needs a mapped parent to go under.
pub fn derive_changes<L, C>(
    src: &mut Tree<L>,
    dst: &Tree<L>,
    mapping: &mut Mapping,
    comparator: &C,
) -> Vec<Change>
where
    L: Label,
    C: Comparator<L>,
{
    trace!(matched_pairs = mapping.len(), "derive_changes start");
    let mut ops = Ops::new();

    for d in dst.bfs(dst.root()) {
        let dst_node = &dst[d];

        if let Some(s) = mapping.get_src(d) {
            debug_assert!(comparator.is_matching_allowed(&src[s], dst_node));
            if src[s].value() != dst_node.value() {
                ops.push(Change::Update { src: s, dst: d });
            }
            continue;
        }

        let Some(dst_parent) = dst_node.parent() else {
            panic!("destination root {d} is unmapped; cannot derive changes");
        };
        let src_parent = mapping
            .get_src(dst_parent)
            .unwrap_or_else(|| panic!("parent {dst_parent} of inserted node {d} is unmapped"));

        let index = dst[dst_parent]
            .children()
            .iter()
            .position(|&sibling| sibling == d)
            .unwrap_or(0);
        let position = index.min(src[src_parent].children().len());
        ops.push(Change::Insert {
            node: d,
            parent: dst_parent,
            position,
        });

        let placeholder = src.append_placeholder(src_parent, position, dst_node);
        mapping.link(placeholder, d);
    }

    for s in src.ids() {
        if !mapping.has_src(s) {
            ops.push(Change::Delete { src: s });
        }
    }

    let ops = ops.into_inner();
    debug!(
        changes = ops.len(),
        placeholders = src.len() - src.initial_size(),
        "derive_changes done"
    );
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DefaultComparator, MatchingConfig};
    use crate::matching::Matcher;
    use crate::source::LabeledTree;
    use facet_testhelpers::test;

    type T = LabeledTree<&'static str>;

    fn id(index: usize) -> NodeId {
        NodeId::new(index)
    }

    fn diff(a: &T, b: &T) -> (Vec<Change>, Tree<crate::NodeLabel<&'static str>>) {
        let (mut src, dst) = (a.build(), b.build());
        let config = MatchingConfig::default();
        let mut mapping = Matcher::new(&src, &dst, &config, &DefaultComparator).compute_mapping();
        let changes = derive_changes(&mut src, &dst, &mut mapping, &DefaultComparator);
        (changes, src)
    }

    fn list(values: &[&str]) -> T {
        let mut t = LabeledTree::new("list", "");
        for v in values {
            t.add_child(t.root, "item", *v);
        }
        t
    }

    #[test]
    fn test_no_changes() {
        let a = list(&["a", "b", "c"]);
        let (changes, src) = diff(&a, &a.clone());
        assert!(changes.is_empty(), "identical trees have no changes: {changes:?}");
        assert_eq!(src.len(), src.initial_size());
    }

    #[test]
    fn test_insert() {
        let a = list(&["a", "c"]);
        let mut b = list(&["a", "c"]);
        b.insert_child(b.root, 1, "item", "b");

        let (changes, src) = diff(&a, &b);
        assert_eq!(
            changes,
            [Change::Insert {
                node: id(2),
                parent: id(0),
                position: 1
            }]
        );
        // the placeholder sits where the inserted node goes
        assert_eq!(src[src.root()].children(), &[id(1), id(3), id(2)]);
        assert!(src.is_placeholder(id(3)));
    }

    #[test]
    fn test_append_under_inner_node() {
        let mut a = LabeledTree::new("m", "");
        let p = a.add_child(a.root, "p", "");
        a.add_child(p, "item", "a");
        a.add_child(p, "item", "b");
        let mut b = a.clone();
        b.add_child(p, "item", "c");

        let (changes, src) = diff(&a, &b);
        // position is the old child count
        assert_eq!(
            changes,
            [Change::Insert {
                node: id(4),
                parent: id(1),
                position: 2
            }]
        );
        assert_eq!(src[id(1)].children(), &[id(2), id(3), id(4)]);
    }

    #[test]
    fn test_insert_position_is_clipped_to_source_children() {
        // m(p(item:x), q(item:w, item:v)) -> m(p(item:w, item:v, item:new)),
        // with w and v paired into q
        let mut a = LabeledTree::new("m", "");
        let p = a.add_child(a.root, "p", "");
        a.add_child(p, "item", "x");
        let q = a.add_child(a.root, "q", "");
        a.add_child(q, "item", "w");
        a.add_child(q, "item", "v");

        let mut b = LabeledTree::new("m", "");
        let p = b.add_child(b.root, "p", "");
        for v in ["w", "v", "new"] {
            b.add_child(p, "item", v);
        }

        let (mut src, dst) = (a.build(), b.build());
        let mut mapping = Mapping::new();
        for (s, d) in [(0, 0), (1, 1), (4, 2), (5, 3)] {
            mapping.link(id(s), id(d));
        }
        let changes = derive_changes(&mut src, &dst, &mut mapping, &DefaultComparator);

        // index 2 among the destination siblings, but p has a single child
        assert_eq!(
            changes,
            [
                Change::Insert {
                    node: id(4),
                    parent: id(1),
                    position: 1
                },
                Change::Delete { src: id(2) },
                Change::Delete { src: id(3) },
            ]
        );
        assert_eq!(src[id(1)].children(), &[id(2), id(6)]);
        assert_eq!(mapping.get_src(id(4)), Some(id(6)));
    }

    #[test]
    fn test_delete() {
        let a = list(&["a", "b", "c"]);
        let b = list(&["a", "c"]);

        let (changes, _) = diff(&a, &b);
        assert_eq!(changes, [Change::Delete { src: id(2) }]);
    }

    #[test]
    fn test_update() {
        let a = list(&["a", "b", "c"]);
        let b = list(&["a", "B", "c"]);

        let (changes, _) = diff(&a, &b);
        assert_eq!(
            changes,
            [Change::Update {
                src: id(2),
                dst: id(2)
            }]
        );
    }

    #[test]
    fn test_insert_subtree_goes_through_placeholders() {
        let a = list(&["a"]);
        let mut b = list(&["a"]);
        let group = b.add_child(b.root, "group", "");
        b.add_child(group, "item", "x");
        b.add_child(group, "item", "y");

        let (changes, src) = diff(&a, &b);
        assert_eq!(
            changes,
            [
                Change::Insert {
                    node: id(2),
                    parent: id(0),
                    position: 1
                },
                Change::Insert {
                    node: id(3),
                    parent: id(2),
                    position: 0
                },
                Change::Insert {
                    node: id(4),
                    parent: id(2),
                    position: 1
                },
            ]
        );
        // the group placeholder receives placeholders for its own children
        assert_eq!(src[src.root()].children(), &[id(1), id(2)]);
        assert_eq!(src[id(2)].children(), &[id(3), id(4)]);
        assert!((2..5).all(|i| src.is_placeholder(id(i))));
    }

    #[test]
    fn test_deletes_in_source_id_order() {
        let mut a = list(&["a"]);
        let group = a.add_child(a.root, "group", "");
        a.add_child(group, "item", "x");
        a.add_child(a.root, "item", "z");
        let b = list(&["a"]);

        let (changes, _) = diff(&a, &b);
        assert_eq!(
            changes,
            [
                Change::Delete { src: id(2) },
                Change::Delete { src: id(3) },
                Change::Delete { src: id(4) },
            ]
        );
    }

    #[test]
    fn test_unmapped_destination_root_panics() {
        let a = LabeledTree::new("module", "");
        let b = LabeledTree::new("script", "");
        let result = std::panic::catch_unwind(|| diff(&a, &b));
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Change::Delete { src: id(3) }.to_string(), "Delete(src:3)");
        assert_eq!(
            Change::Update {
                src: id(1),
                dst: id(2)
            }
            .to_string(),
            "Update(src:1 -> dst:2)"
        );
        assert_eq!(
            Change::Insert {
                node: id(4),
                parent: id(0),
                position: 2
            }
            .to_string(),
            "Insert(dst:4 @2 under dst:0)"
        );
    }
}
