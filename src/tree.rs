//! Read interface over the host page's rendered element tree.
//!
//! The tree is owned by the host and may change between any two calls, so
//! nothing here is cached. A [`NodeId`] is only meaningful for the tree that
//! produced it.

use serde::{Deserialize, Serialize};

/// Index of an element within one [`UiTree`] view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Rendered bounding box in viewport coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A zero-area box means the element is not actually on screen.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Query view over the page.
///
/// Implementors supply the primitive reads; traversal helpers are provided.
pub trait UiTree {
    /// All elements in document order.
    fn elements(&self) -> Vec<NodeId>;

    /// Lowercase tag name.
    fn tag(&self, node: NodeId) -> &str;

    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Parent element, `None` at a root.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Child elements in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Concatenated text of every text node under `node`.
    fn text_content(&self, node: NodeId) -> String;

    /// Text as the user sees it. Defaults to [`UiTree::text_content`].
    fn rendered_text(&self, node: NodeId) -> String {
        self.text_content(node)
    }

    fn rect(&self, node: NodeId) -> Rect;

    /// Element holding keyboard focus, if any.
    fn focused(&self) -> Option<NodeId>;

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Nearest element, starting at `node` itself, that satisfies `pred`.
    fn closest<F>(&self, node: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(NodeId) -> bool,
    {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if pred(n) {
                return Some(n);
            }
            cur = self.parent(n);
        }
        None
    }

    /// Nearest proper ancestor that satisfies `pred`.
    fn closest_ancestor<F>(&self, node: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(NodeId) -> bool,
    {
        self.parent(node).and_then(|p| self.closest(p, pred))
    }

    /// Every element below `node`, in document order.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).into_iter().rev());
        }
        out
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.rect(node).has_area()
    }
}
