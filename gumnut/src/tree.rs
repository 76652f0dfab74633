//! Arena-backed trees carrying the structural indices the matchers rely on.
//!
//! Nodes are numbered in preorder, so the subtree rooted at `id` is exactly the
//! id range `[id, rightmost_descendant(id)]`. Containment and size checks are
//! range checks, no traversal needed.

use crate::trace;
use core::fmt;
use core::hash::Hash;
use core::ops::Index;
use facet::Facet;
use rapidhash::RapidHashSet as HashSet;
use smallvec::SmallVec;

/// Identifies a node inside one [`Tree`]'s arena.
///
/// Ids are dense and zero-based, assigned in preorder. An id is only
/// meaningful for the tree that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Facet)]
#[facet(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create an id from an arena index.
    pub fn new(index: usize) -> Self {
        assert!(
            index <= u32::MAX as usize,
            "node index {index} does not fit in a NodeId"
        );
        Self(index as u32)
    }

    /// The arena index of this id.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<NodeId> for usize {
    #[inline(always)]
    fn from(id: NodeId) -> usize {
        id.index()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the diff engine needs to know about a node supplied by a front end.
///
/// Implemented once per front end. Everything else a front end attaches to its
/// nodes (source positions, types, ...) rides along in the implementing type
/// and is never looked at by the engine.
pub trait Label: Clone {
    /// Tag identifying the node's structural category.
    type Kind: Clone + PartialEq + fmt::Debug + fmt::Display;

    /// The node's kind.
    fn kind(&self) -> Self::Kind;

    /// The node's canonical value, independent of its descendants.
    ///
    /// Empty when the node has no intrinsic content.
    fn value(&self) -> String;
}

/// A front end's tree, as seen during [`Tree::from_source`].
pub trait NodeSource {
    /// Handle to one node of the front end's tree.
    type Handle: Copy + Eq + Hash;
    /// Label type produced for every node.
    type Label: Label;

    /// The root node.
    fn root(&self) -> Self::Handle;

    /// Children of `node`, in source order.
    fn children(&self, node: Self::Handle) -> impl Iterator<Item = Self::Handle> + '_;

    /// The label of `node`.
    fn label(&self, node: Self::Handle) -> Self::Label;
}

/// One vertex of a [`Tree`].
#[derive(Debug, Clone)]
pub struct Node<L: Label> {
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
    depth: usize,
    height: usize,
    leftmost_descendant: NodeId,
    rightmost_descendant: NodeId,
    kind: L::Kind,
    value: String,
    label: L,
}

impl<L: Label> Node<L> {
    /// The parent, or `None` for the root.
    #[inline(always)]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in source order.
    #[inline(always)]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// True if the node has no children.
    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Distance from the root (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// 1 for leaves, otherwise one more than the highest child.
    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    /// The first leaf reached by repeatedly descending into the first child.
    pub fn leftmost_descendant(&self) -> NodeId {
        self.leftmost_descendant
    }

    /// The last id of this node's preorder range.
    #[inline(always)]
    pub fn rightmost_descendant(&self) -> NodeId {
        self.rightmost_descendant
    }

    /// The node's kind, as reported by its label.
    #[inline(always)]
    pub fn kind(&self) -> &L::Kind {
        &self.kind
    }

    /// The node's canonical value, as reported by its label.
    #[inline(always)]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The label the front end supplied for this node.
    pub fn label(&self) -> &L {
        &self.label
    }
}

/// An ordered tree with precomputed structural indices.
#[derive(Debug, Clone)]
pub struct Tree<L: Label> {
    nodes: Vec<Node<L>>,
    /// Postorder rank of every node, indexed by id.
    postorder: Vec<usize>,
    leaves: Vec<NodeId>,
    /// Number of nodes before any placeholder was appended.
    initial_size: usize,
}

impl<L: Label> Tree<L> {
    /// Build a tree from a front end's node source.
    ///
    /// # Panics
    ///
    /// Panics if the source is not a tree, i.e. some node is reachable through
    /// more than one path (shared or cyclic child references).
    pub fn from_source<S>(source: &S) -> Self
    where
        S: NodeSource<Label = L>,
    {
        let count = count_nodes(source);
        let mut nodes: Vec<Node<L>> = Vec::with_capacity(count);

        // Preorder walk: popping the first child first keeps every subtree
        // contiguous in id space.
        let mut stack = vec![(source.root(), None::<NodeId>, 0usize)];
        while let Some((handle, parent, depth)) = stack.pop() {
            let id = NodeId::new(nodes.len());
            let label = source.label(handle);
            nodes.push(Node {
                parent,
                children: SmallVec::new(),
                depth,
                height: 1,
                leftmost_descendant: id,
                rightmost_descendant: id,
                kind: label.kind(),
                value: label.value(),
                label,
            });
            if let Some(parent) = parent {
                nodes[parent.index()].children.push(id);
            }
            let children: SmallVec<[S::Handle; 8]> = source.children(handle).collect();
            for &child in children.iter().rev() {
                stack.push((child, Some(id), depth + 1));
            }
        }
        debug_assert_eq!(nodes.len(), count);

        // Children always have larger ids than their parent, so a reverse
        // sweep sees every child before its parent.
        for index in (0..nodes.len()).rev() {
            let Some(&last) = nodes[index].children.last() else {
                continue;
            };
            let rightmost = nodes[last.index()].rightmost_descendant;
            let height = 1 + nodes[index]
                .children
                .iter()
                .map(|child| nodes[child.index()].height)
                .max()
                .unwrap_or(0);
            let node = &mut nodes[index];
            node.rightmost_descendant = rightmost;
            node.height = height;
        }

        let leaves: Vec<NodeId> = (0..nodes.len())
            .filter(|&index| nodes[index].children.is_empty())
            .map(NodeId::new)
            .collect();

        let mut tree = Self {
            initial_size: nodes.len(),
            nodes,
            postorder: Vec::new(),
            leaves,
        };
        tree.set_leftmost_descendants();
        tree.set_postorder_ranks();
        trace!(
            nodes = tree.len(),
            leaves = tree.leaves.len(),
            "tree built"
        );
        tree
    }

    fn set_leftmost_descendants(&mut self) {
        for i in 0..self.leaves.len() {
            let leaf = self.leaves[i];
            let mut current = leaf;
            while let Some(parent) = self.nodes[current.index()].parent
                && self.nodes[parent.index()].children.first() == Some(&current)
            {
                current = parent;
                self.nodes[current.index()].leftmost_descendant = leaf;
            }
        }
    }

    fn set_postorder_ranks(&mut self) {
        let order = self.postorder(self.root());
        let mut ranks = vec![0; self.nodes.len()];
        for (rank, id) in order.into_iter().enumerate() {
            ranks[id.index()] = rank;
        }
        self.postorder = ranks;
    }

    /// The root node id (always the first id).
    #[inline(always)]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, placeholders included.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes the tree was built with, before any placeholder was appended.
    pub fn initial_size(&self) -> usize {
        self.initial_size
    }

    /// True if `id` was appended by [`Tree::append_placeholder`].
    pub fn is_placeholder(&self, id: NodeId) -> bool {
        id.index() >= self.initial_size
    }

    /// Get a node.
    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node<L> {
        &self.nodes[id.index()]
    }

    /// All node ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<L> {
        (0..self.nodes.len()).map(NodeId::new)
    }

    /// Leaf ids in preorder.
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// Rank of `id` in a postorder traversal of the whole tree.
    ///
    /// Placeholders rank after every original node, in order of appension.
    #[inline(always)]
    pub fn postorder_index(&self, id: NodeId) -> usize {
        self.postorder[id.index()]
    }

    /// Size of the subtree rooted at `id`, `id` included.
    #[inline(always)]
    pub fn number_of_descendants(&self, id: NodeId) -> usize {
        self.node(id).rightmost_descendant.index() - id.index() + 1
    }

    /// True if `id` lies in the subtree rooted at `subtree_root`.
    #[inline(always)]
    pub fn is_in_subtree(&self, id: NodeId, subtree_root: NodeId) -> bool {
        id >= subtree_root && id <= self.node(subtree_root).rightmost_descendant
    }

    /// The subtree rooted at `root`, in postorder.
    pub fn postorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.number_of_descendants(root));
        let mut stack = vec![(root, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.node(id).children.iter().rev() {
                stack.push((child, false));
            }
        }
        order
    }

    /// The subtree rooted at `root`, in preorder (following children lists, so
    /// placeholders show up where they were linked).
    pub fn preorder(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }

    /// The subtree rooted at `root`, breadth-first.
    pub fn bfs(&self, root: NodeId) -> Vec<NodeId> {
        let mut ids = vec![root];
        let mut expanded = 0;
        while expanded < ids.len() {
            let id = ids[expanded];
            expanded += 1;
            ids.extend_from_slice(&self.node(id).children);
        }
        ids
    }

    /// Append a synthetic copy of `template` as child `position` of `parent`.
    ///
    /// The copy keeps the template's label, depth, height and descendant ids
    /// and starts out with no children. Existing ids and ranges are left
    /// untouched: the new node always takes the next free id.
    ///
    /// # Panics
    ///
    /// Panics if `position` exceeds `parent`'s child count.
    pub fn append_placeholder(
        &mut self,
        parent: NodeId,
        position: usize,
        template: &Node<L>,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let mut node = template.clone();
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.postorder.push(self.postorder.len());
        self.nodes[parent.index()].children.insert(position, id);
        trace!(
            id = id.index(),
            parent = parent.index(),
            position,
            "placeholder appended"
        );
        id
    }
}

impl<L: Label> Index<NodeId> for Tree<L> {
    type Output = Node<L>;

    #[inline(always)]
    fn index(&self, id: NodeId) -> &Node<L> {
        self.node(id)
    }
}

/// Count the nodes reachable from the root, rejecting anything that is not a tree.
fn count_nodes<S: NodeSource>(source: &S) -> usize {
    let mut seen: HashSet<S::Handle> = HashSet::default();
    let mut stack = vec![source.root()];
    while let Some(handle) = stack.pop() {
        assert!(
            seen.insert(handle),
            "node source is not a tree: a node is reachable through more than one path"
        );
        stack.extend(source.children(handle));
    }
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::LabeledTree;
    use facet_testhelpers::test;

    /// root
    /// ├── a
    /// │   ├── b
    /// │   └── c
    /// └── d
    ///     └── e
    ///         └── f
    fn sample() -> Tree<crate::NodeLabel<&'static str>> {
        let mut t = LabeledTree::new("root", "");
        let a = t.add_child(t.root, "a", "1");
        t.add_child(a, "b", "2");
        t.add_child(a, "c", "3");
        let d = t.add_child(t.root, "d", "4");
        let e = t.add_child(d, "e", "5");
        t.add_child(e, "f", "6");
        t.build()
    }

    fn id(index: usize) -> NodeId {
        NodeId::new(index)
    }

    #[test]
    fn test_preorder_ids() {
        let tree = sample();
        let kinds: Vec<_> = tree.ids().map(|i| *tree[i].kind()).collect();
        assert_eq!(kinds, ["root", "a", "b", "c", "d", "e", "f"]);
        assert_eq!(tree[id(1)].children(), &[id(2), id(3)]);
        assert_eq!(tree[id(2)].parent(), Some(id(1)));
        assert_eq!(tree[tree.root()].parent(), None);
    }

    #[test]
    fn test_depth_and_height() {
        let tree = sample();
        let depths: Vec<_> = tree.ids().map(|i| tree[i].depth()).collect();
        assert_eq!(depths, [0, 1, 2, 2, 1, 2, 3]);
        let heights: Vec<_> = tree.ids().map(|i| tree[i].height()).collect();
        assert_eq!(heights, [4, 2, 1, 1, 3, 2, 1]);
    }

    #[test]
    fn test_parent_strictly_higher_than_children() {
        let tree = sample();
        for i in tree.ids() {
            let node = &tree[i];
            assert!(node.height() >= 1);
            if let Some(max_child) = node.children().iter().map(|&c| tree[c].height()).max() {
                assert!(node.height() > max_child);
            }
        }
    }

    #[test]
    fn test_descendant_ranges() {
        let tree = sample();
        assert_eq!(tree[tree.root()].rightmost_descendant(), id(6));
        assert_eq!(tree[id(1)].rightmost_descendant(), id(3));
        assert_eq!(tree[id(4)].rightmost_descendant(), id(6));
        assert_eq!(tree.number_of_descendants(tree.root()), 7);
        assert_eq!(tree.number_of_descendants(id(1)), 3);
        assert_eq!(tree.number_of_descendants(id(6)), 1);

        assert!(tree.is_in_subtree(id(3), id(1)));
        assert!(tree.is_in_subtree(id(1), id(1)));
        assert!(!tree.is_in_subtree(id(4), id(1)));
        assert!(!tree.is_in_subtree(id(0), id(1)));
    }

    #[test]
    fn test_leftmost_descendants() {
        let tree = sample();
        let lmds: Vec<_> = tree
            .ids()
            .map(|i| tree[i].leftmost_descendant().index())
            .collect();
        assert_eq!(lmds, [2, 2, 2, 3, 6, 6, 6]);
    }

    #[test]
    fn test_leaves_and_postorder() {
        let tree = sample();
        assert_eq!(tree.leaves(), &[id(2), id(3), id(6)]);

        let order: Vec<_> = tree.postorder(tree.root()).iter().map(|i| i.index()).collect();
        assert_eq!(order, [2, 3, 1, 6, 5, 4, 0]);
        for (rank, i) in tree.postorder(tree.root()).into_iter().enumerate() {
            assert_eq!(tree.postorder_index(i), rank);
        }

        let bfs: Vec<_> = tree.bfs(tree.root()).iter().map(|i| i.index()).collect();
        assert_eq!(bfs, [0, 1, 4, 2, 3, 5, 6]);
    }

    #[test]
    fn test_single_node_tree() {
        let tree = LabeledTree::new("root", "x").build();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[tree.root()].height(), 1);
        assert_eq!(tree[tree.root()].leftmost_descendant(), tree.root());
        assert_eq!(tree.leaves(), &[tree.root()]);
        assert_eq!(tree.postorder_index(tree.root()), 0);
    }

    #[test]
    fn test_append_placeholder_keeps_existing_ids() {
        let mut tree = sample();
        let template = tree[id(5)].clone();
        let placeholder = tree.append_placeholder(id(1), 1, &template);

        assert_eq!(placeholder, id(7));
        assert!(tree.is_placeholder(placeholder));
        assert!(!tree.is_placeholder(id(6)));
        assert_eq!(tree.initial_size(), 7);
        assert_eq!(tree[id(1)].children(), &[id(2), placeholder, id(3)]);
        assert_eq!(tree[placeholder].parent(), Some(id(1)));
        assert!(tree[placeholder].is_leaf());
        assert_eq!(*tree[placeholder].kind(), "e");
        // ranges computed at construction are unaffected
        assert_eq!(tree.number_of_descendants(id(1)), 3);
        assert_eq!(tree.postorder_index(placeholder), 7);

        let preorder: Vec<_> = tree.preorder(tree.root()).iter().map(|i| i.index()).collect();
        assert_eq!(preorder, [0, 1, 2, 7, 3, 4, 5, 6]);
    }

    /// A node source whose only node lists itself as its child.
    struct Cyclic;

    impl NodeSource for Cyclic {
        type Handle = u8;
        type Label = crate::NodeLabel<&'static str>;

        fn root(&self) -> u8 {
            0
        }

        fn children(&self, _node: u8) -> impl Iterator<Item = u8> + '_ {
            core::iter::once(0)
        }

        fn label(&self, _node: u8) -> Self::Label {
            crate::NodeLabel::new("loop", "")
        }
    }

    #[test]
    fn test_cyclic_source_panics() {
        let result = std::panic::catch_unwind(|| Tree::from_source(&Cyclic));
        assert!(result.is_err());
    }
}
