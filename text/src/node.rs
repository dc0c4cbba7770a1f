//! The parse tree (spec.md §3, §4.6, §9 "Immutable shared nodes" / "Fragments").
//!
//! A [`Node`] is an `Arc`-backed handle so the same subtree can be referenced by both
//! the tree a parse produced and the tree a later, incremental re-parse produces (the
//! memo table hands back the same `Node` it cached rather than rebuilding it). Nodes
//! are never mutated after [`NodeBuilder::finish`] publishes them; all mutation
//! happens on the builder, mirroring the teacher's under-construction/published split
//! for its own flat AST builder.

use crate::interner::Symbol;
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug)]
enum NodeTag {
    Regular(Symbol),
    /// An anonymous carrier whose children are spliced into the parent on append and
    /// which is itself discarded; never appears in a published tree.
    Fragment,
}

#[derive(Debug)]
struct NodeData {
    tag: NodeTag,
    length: u32,
    children: SmallVec<[Node; 4]>,
}

/// A handle to a node in a parse tree. Cheap to clone (one atomic increment); clones
/// sharing the same `Arc` are the same node for identity-preserving reuse purposes.
#[derive(Debug, Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    /// A childless, tagged node with an explicit length (e.g. a single matched token).
    pub fn leaf(kind: Symbol, length: u32) -> Node {
        Node(Arc::new(NodeData {
            tag: NodeTag::Regular(kind),
            length,
            children: SmallVec::new(),
        }))
    }

    /// `None` for fragments, which carry no symbolic type of their own.
    pub fn kind(&self) -> Option<Symbol> {
        match self.0.tag {
            NodeTag::Regular(k) => Some(k),
            NodeTag::Fragment => None,
        }
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.0.tag, NodeTag::Fragment)
    }

    pub fn length(&self) -> u32 {
        self.0.length
    }

    pub fn children(&self) -> &[Node] {
        &self.0.children
    }

    pub fn child(&self, at: usize) -> Option<&Node> {
        self.0.children.get(at)
    }

    /// Navigates a path of child indices from this node.
    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let mut cur = self;
        for &i in path {
            cur = cur.child(i)?;
        }
        Some(cur)
    }

    /// The leaf covering `index` (relative to this node's start), plus the offset of
    /// `index` within that leaf. `index` must be `< self.length()`.
    pub fn leaf_node_containing(&self, index: u32) -> Option<(&Node, u32)> {
        if index >= self.0.length {
            return None;
        }
        if self.0.children.is_empty() {
            return Some((self, index));
        }
        let mut offset = 0u32;
        for child in &self.0.children {
            let child_len = child.length();
            if index < offset + child_len {
                return child.leaf_node_containing(index - offset);
            }
            offset += child_len;
        }
        None
    }

    /// Canonical S-expression form for test assertions, e.g.
    /// `(document (paragraph (emphasis delimiter text delimiter)))`.
    pub fn compact_structure(&self) -> String {
        match self.kind() {
            Some(kind) if self.0.children.is_empty() => kind.to_string(),
            Some(kind) => {
                let parts: Vec<String> =
                    self.0.children.iter().map(Node::compact_structure).collect();
                format!("({} {})", kind, parts.join(" "))
            }
            None => self
                .0
                .children
                .iter()
                .map(Node::compact_structure)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// Whether `a` and `b` are the exact same tree node, not merely structurally
    /// equal. Used by spec.md §4.6's reuse-identity assertion.
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

/// Builds a [`Node`] incrementally, applying the similarity-merge and
/// fragment-splicing rules on every append, then publishes it as an immutable `Node`.
pub struct NodeBuilder {
    tag: NodeTag,
    length: u32,
    children: SmallVec<[Node; 4]>,
}

impl NodeBuilder {
    pub fn regular(kind: Symbol) -> Self {
        Self {
            tag: NodeTag::Regular(kind),
            length: 0,
            children: SmallVec::new(),
        }
    }

    pub fn fragment() -> Self {
        Self {
            tag: NodeTag::Fragment,
            length: 0,
            children: SmallVec::new(),
        }
    }

    /// Appends `child`. A fragment child is spliced (its own children are appended one
    /// at a time, each still subject to similarity-merge); a regular child is merged
    /// with the last existing child if both are same-typed leaves, else pushed.
    pub fn append_child(&mut self, child: Node) {
        if child.is_fragment() {
            for grandchild in child.children().to_vec() {
                self.append_regular(grandchild);
            }
        } else {
            self.append_regular(child);
        }
    }

    fn append_regular(&mut self, child: Node) {
        if let Some(last) = self.children.last() {
            if let (Some(a), Some(b)) = (last.kind(), child.kind()) {
                if a == b && last.children().is_empty() && child.children().is_empty() {
                    let merged = Node::leaf(a, last.length() + child.length());
                    self.length += child.length();
                    *self.children.last_mut().unwrap() = merged;
                    return;
                }
            }
        }
        self.length += child.length();
        self.children.push(child);
    }

    /// Publishes the node with its accumulated children's summed length.
    pub fn finish(self) -> Node {
        Node(Arc::new(NodeData {
            tag: self.tag,
            length: self.length,
            children: self.children,
        }))
    }

    /// Publishes the node with an explicit length instead of the accumulated sum
    /// (spec.md §4.4: `Absorb`'s length is `A`'s length, not re-derived from children).
    pub fn finish_with_length(self, length: u32) -> Node {
        Node(Arc::new(NodeData {
            tag: self.tag,
            length,
            children: self.children,
        }))
    }
}
