//! Human-readable and JSON renderings of trees, changes and matches.

use crate::mapping::Match;
use crate::script::Change;
use crate::tree::{Label, NodeId, Tree};
use core::fmt;
use facet::Facet;

/// One node as `Kind: value(postorder)`, or `None` when there is no node.
///
/// The value part is left out when the node has no value.
pub struct NodeDisplay<'a, L: Label> {
    pub(crate) tree: &'a Tree<L>,
    pub(crate) id: Option<NodeId>,
}

impl<L: Label> fmt::Display for NodeDisplay<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(id) = self.id else {
            return write!(f, "None");
        };
        let node = &self.tree[id];
        write!(f, "{}", node.kind())?;
        if !node.value().is_empty() {
            write!(f, ": {}", node.value())?;
        }
        write!(f, "({})", self.tree.postorder_index(id))
    }
}

/// A whole tree, one node per line, indented by depth.
pub struct TreeDump<'a, L: Label> {
    tree: &'a Tree<L>,
    root: NodeId,
}

impl<L: Label> fmt::Display for TreeDump<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.tree.preorder(self.root) {
            let indent = " ".repeat(self.tree[id].depth());
            writeln!(f, "{indent}{}", self.tree.display_node(id))?;
        }
        Ok(())
    }
}

impl<L: Label> Tree<L> {
    /// Render the whole tree.
    pub fn display(&self) -> TreeDump<'_, L> {
        self.display_subtree(self.root())
    }

    /// Render the subtree rooted at `root`.
    pub fn display_subtree(&self, root: NodeId) -> TreeDump<'_, L> {
        TreeDump { tree: self, root }
    }

    /// Render a single node.
    pub fn display_node(&self, id: NodeId) -> NodeDisplay<'_, L> {
        NodeDisplay {
            tree: self,
            id: Some(id),
        }
    }

    /// Render the tree as `{"root": {"type": .., "value": .., "children": [..]}}`.
    pub fn to_json(&self) -> Result<String, RenderError> {
        facet_json::to_string(&self.to_json_tree())
            .map_err(|e| RenderError::Serialize {
                message: format!("{e:?}"),
            })
    }

    /// The JSON-shaped view of this tree.
    pub fn to_json_tree(&self) -> JsonTree {
        JsonTree {
            root: self.json_node(self.root()),
        }
    }

    fn json_node(&self, id: NodeId) -> JsonNode {
        let node = &self[id];
        JsonNode {
            kind: node.kind().to_string(),
            value: (!node.value().is_empty()).then(|| node.value().to_string()),
            children: node
                .children()
                .iter()
                .map(|&child| self.json_node(child))
                .collect(),
        }
    }
}

/// JSON document for a whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct JsonTree {
    /// The root node.
    pub root: JsonNode,
}

/// JSON object for one node and its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct JsonNode {
    /// The node's kind.
    #[facet(rename = "type")]
    pub kind: String,
    /// The node's value, absent when empty.
    #[facet(default, skip_serializing_if = Option::is_none)]
    pub value: Option<String>,
    /// Children in order.
    pub children: Vec<JsonNode>,
}

/// Errors that can occur while rendering.
#[derive(Facet, Debug)]
#[facet(derive(Error))]
#[repr(u8)]
pub enum RenderError {
    /// could not serialize: {message}
    Serialize { message: String },
}

/// A [`Change`] as `Delete X`, `Update X to v`, `Insert X into Y at N` or
/// `Move X into Y at N`.
///
/// Needs both trees: deletions and updates name source nodes, insertions name
/// destination nodes.
pub struct ChangeDisplay<'a, L: Label> {
    pub(crate) src: &'a Tree<L>,
    pub(crate) dst: &'a Tree<L>,
    pub(crate) change: Change,
}

impl<L: Label> fmt::Display for ChangeDisplay<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.change {
            Change::Delete { src } => write!(f, "Delete {}", self.src.display_node(src)),
            Change::Update { src, dst } => write!(
                f,
                "Update {} to {}",
                self.src.display_node(src),
                self.dst[dst].value()
            ),
            Change::Insert {
                node,
                parent,
                position,
            } => write!(
                f,
                "Insert {} into {} at {position}",
                self.dst.display_node(node),
                self.dst.display_node(parent)
            ),
            Change::Move {
                src,
                parent,
                position,
            } => write!(
                f,
                "Move {} into {} at {position}",
                self.src.display_node(src),
                self.dst.display_node(parent)
            ),
        }
    }
}

/// A [`Match`] as `Match X to Y`.
pub struct MatchDisplay<'a, L: Label> {
    pub(crate) src: &'a Tree<L>,
    pub(crate) dst: &'a Tree<L>,
    pub(crate) pair: Match,
}

impl<L: Label> fmt::Display for MatchDisplay<'_, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Match {} to {}",
            self.src.display_node(self.pair.src),
            self.dst.display_node(self.pair.dst)
        )
    }
}
