//! A ready-made [`NodeSource`] for callers that don't have a tree of their own.

use crate::tree::{Label, NodeSource, Tree};
use core::fmt;
use indextree::{Arena, NodeId as ArenaId};

/// A plain `(kind, value)` label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeLabel<K> {
    /// The node's kind.
    pub kind: K,
    /// The node's canonical value, empty when it has none.
    pub value: String,
}

impl<K> NodeLabel<K> {
    /// Create a label.
    pub fn new(kind: K, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

impl<K> Label for NodeLabel<K>
where
    K: Clone + PartialEq + fmt::Debug + fmt::Display,
{
    type Kind = K;

    fn kind(&self) -> K {
        self.kind.clone()
    }

    fn value(&self) -> String {
        self.value.clone()
    }
}

/// A mutable, `indextree`-backed tree of [`NodeLabel`]s.
///
/// Build it up with [`LabeledTree::add_child`] and friends, then freeze it
/// into a diffable [`Tree`] with [`LabeledTree::build`].
#[derive(Debug, Clone)]
pub struct LabeledTree<K> {
    arena: Arena<NodeLabel<K>>,
    /// The root node.
    pub root: ArenaId,
}

impl<K> LabeledTree<K>
where
    K: Clone + PartialEq + fmt::Debug + fmt::Display,
{
    /// Create a tree with a single root node.
    pub fn new(kind: K, value: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(NodeLabel::new(kind, value));
        Self { arena, root }
    }

    /// Append a child as the last child of `parent`.
    pub fn add_child(&mut self, parent: ArenaId, kind: K, value: impl Into<String>) -> ArenaId {
        let child = self.arena.new_node(NodeLabel::new(kind, value));
        parent.append(child, &mut self.arena);
        child
    }

    /// Insert a child at `position` among `parent`'s children.
    ///
    /// A position past the end appends.
    pub fn insert_child(
        &mut self,
        parent: ArenaId,
        position: usize,
        kind: K,
        value: impl Into<String>,
    ) -> ArenaId {
        let child = self.arena.new_node(NodeLabel::new(kind, value));
        let sibling = parent.children(&self.arena).nth(position);
        match sibling {
            Some(sibling) => sibling.insert_before(child, &mut self.arena),
            None => parent.append(child, &mut self.arena),
        }
        child
    }

    /// Replace the value of `node`.
    pub fn set_value(&mut self, node: ArenaId, value: impl Into<String>) {
        if let Some(entry) = self.arena.get_mut(node) {
            entry.get_mut().value = value.into();
        }
    }

    /// Detach `node` and its whole subtree.
    ///
    /// # Panics
    ///
    /// Panics when asked to remove the root.
    pub fn remove(&mut self, node: ArenaId) {
        assert!(node != self.root, "cannot remove the root of a LabeledTree");
        node.remove_subtree(&mut self.arena);
    }

    /// The label of `node`, if it is still part of the arena.
    pub fn get(&self, node: ArenaId) -> Option<&NodeLabel<K>> {
        self.arena
            .get(node)
            .filter(|entry| !entry.is_removed())
            .map(|entry| entry.get())
    }

    /// Freeze into a diffable [`Tree`].
    pub fn build(&self) -> Tree<NodeLabel<K>> {
        Tree::from_source(self)
    }
}

impl<K> NodeSource for LabeledTree<K>
where
    K: Clone + PartialEq + fmt::Debug + fmt::Display,
{
    type Handle = ArenaId;
    type Label = NodeLabel<K>;

    fn root(&self) -> ArenaId {
        self.root
    }

    fn children(&self, node: ArenaId) -> impl Iterator<Item = ArenaId> + '_ {
        node.children(&self.arena)
    }

    fn label(&self, node: ArenaId) -> NodeLabel<K> {
        self.arena[node].get().clone()
    }
}
