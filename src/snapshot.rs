//! Point-in-time copy of the page's element tree.
//!
//! The runner's capture script emits one node per DOM element or text node in
//! pre-order, each naming its parent by index. Tests build the same shape with
//! [`SnapshotBuilder`].

use std::collections::HashMap;

use serde::Deserialize;

use crate::tree::{NodeId, Rect, UiTree};
use crate::Result;

/// Size given to builder elements unless overridden.
const DEFAULT_SIZE: (f64, f64) = (80.0, 24.0);

/// One captured node.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotNode {
    Element {
        parent: Option<usize>,
        tag: String,
        #[serde(default)]
        attrs: HashMap<String, String>,
        #[serde(default)]
        rect: Rect,
        /// `innerText` when the capture script recorded it.
        #[serde(default)]
        inner_text: Option<String>,
    },
    Text {
        parent: Option<usize>,
        text: String,
    },
}

impl SnapshotNode {
    fn parent(&self) -> Option<usize> {
        match self {
            SnapshotNode::Element { parent, .. } | SnapshotNode::Text { parent, .. } => *parent,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    nodes: Vec<SnapshotNode>,
    #[serde(default)]
    focused: Option<usize>,
}

/// Arena-backed [`UiTree`].
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    nodes: Vec<SnapshotNode>,
    /// All child indices (elements and text) per node, in document order.
    children: Vec<Vec<usize>>,
    /// Element indices in document order.
    order: Vec<NodeId>,
    focused: Option<NodeId>,
}

impl Snapshot {
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Decode the JSON emitted by the capture script.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_str(json)?;
        Ok(Self::from_nodes(raw.nodes, raw.focused))
    }

    /// Link a flat node list into a tree.
    ///
    /// A node whose parent index is missing, out of range, or not earlier in
    /// the list is treated as a root.
    pub fn from_nodes(nodes: Vec<SnapshotNode>, focused: Option<usize>) -> Self {
        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            match node.parent() {
                Some(p) if p < i && matches!(nodes[p], SnapshotNode::Element { .. }) => {
                    children[p].push(i)
                }
                _ => roots.push(i),
            }
        }

        let mut order = Vec::new();
        let mut stack: Vec<usize> = roots.into_iter().rev().collect();
        while let Some(i) = stack.pop() {
            if matches!(nodes[i], SnapshotNode::Element { .. }) {
                order.push(NodeId(i));
            }
            stack.extend(children[i].iter().rev().copied());
        }

        let focused = focused
            .filter(|&i| matches!(nodes.get(i), Some(SnapshotNode::Element { .. })))
            .map(NodeId);

        Self {
            nodes,
            children,
            order,
            focused,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn element(&self, node: NodeId) -> Option<(&str, &HashMap<String, String>, Rect, Option<&str>)> {
        match self.nodes.get(node.0)? {
            SnapshotNode::Element {
                tag,
                attrs,
                rect,
                inner_text,
                ..
            } => Some((tag.as_str(), attrs, *rect, inner_text.as_deref())),
            SnapshotNode::Text { .. } => None,
        }
    }

    fn collect_text(&self, index: usize, out: &mut String) {
        match &self.nodes[index] {
            SnapshotNode::Text { text, .. } => out.push_str(text),
            SnapshotNode::Element { .. } => {
                for &c in &self.children[index] {
                    self.collect_text(c, out);
                }
            }
        }
    }
}

impl UiTree for Snapshot {
    fn elements(&self) -> Vec<NodeId> {
        self.order.clone()
    }

    fn tag(&self, node: NodeId) -> &str {
        self.element(node).map(|(tag, ..)| tag).unwrap_or("")
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .and_then(|(_, attrs, ..)| attrs.get(name))
            .map(String::as_str)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let p = self.nodes.get(node.0)?.parent()?;
        // Only linked parents count; see `from_nodes`.
        self.children
            .get(p)
            .filter(|c| c.contains(&node.0))
            .map(|_| NodeId(p))
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.children
            .get(node.0)
            .map(|c| {
                c.iter()
                    .copied()
                    .filter(|&i| matches!(self.nodes[i], SnapshotNode::Element { .. }))
                    .map(NodeId)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if node.0 < self.nodes.len() {
            self.collect_text(node.0, &mut out);
        }
        out
    }

    fn rendered_text(&self, node: NodeId) -> String {
        match self.element(node) {
            Some((.., Some(inner))) => inner.to_string(),
            _ => self.text_content(node),
        }
    }

    fn rect(&self, node: NodeId) -> Rect {
        self.element(node).map(|(_, _, r, _)| r).unwrap_or_default()
    }

    fn focused(&self) -> Option<NodeId> {
        self.focused
    }
}

/// Builds synthetic pages for tests and examples.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    nodes: Vec<SnapshotNode>,
    focused: Option<usize>,
}

impl SnapshotBuilder {
    /// Append an element. It is visible (80x24) unless `.hidden()` is called.
    pub fn element(&mut self, parent: Option<NodeId>, tag: &str) -> ElementBuilder<'_> {
        let index = self.nodes.len();
        self.nodes.push(SnapshotNode::Element {
            parent: parent.map(|p| p.0),
            tag: tag.to_ascii_lowercase(),
            attrs: HashMap::new(),
            rect: Rect::new(0.0, 0.0, DEFAULT_SIZE.0, DEFAULT_SIZE.1),
            inner_text: None,
        });
        ElementBuilder {
            builder: self,
            index,
        }
    }

    /// Append a text node under `parent`.
    pub fn text(&mut self, parent: NodeId, text: &str) {
        self.nodes.push(SnapshotNode::Text {
            parent: Some(parent.0),
            text: text.to_string(),
        });
    }

    pub fn focus(&mut self, node: NodeId) {
        self.focused = Some(node.0);
    }

    pub fn build(self) -> Snapshot {
        Snapshot::from_nodes(self.nodes, self.focused)
    }
}

/// Fluent setter for the element just appended.
pub struct ElementBuilder<'a> {
    builder: &'a mut SnapshotBuilder,
    index: usize,
}

impl ElementBuilder<'_> {
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if let SnapshotNode::Element { attrs, .. } = &mut self.builder.nodes[self.index] {
            attrs.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Add a class token, keeping existing ones.
    pub fn class(mut self, class: &str) -> Self {
        if let SnapshotNode::Element { attrs, .. } = &mut self.builder.nodes[self.index] {
            let entry = attrs.entry("class".to_string()).or_default();
            if !entry.is_empty() {
                entry.push(' ');
            }
            entry.push_str(class);
        }
        self
    }

    /// Append a text child.
    pub fn text(mut self, text: &str) -> Self {
        let parent = NodeId(self.index);
        self.builder.text(parent, text);
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        if let SnapshotNode::Element { rect, .. } = &mut self.builder.nodes[self.index] {
            rect.width = width;
            rect.height = height;
        }
        self
    }

    /// Zero rendered area.
    pub fn hidden(self) -> Self {
        self.size(0.0, 0.0)
    }

    pub fn inner_text(mut self, text: &str) -> Self {
        if let SnapshotNode::Element { inner_text, .. } = &mut self.builder.nodes[self.index] {
            *inner_text = Some(text.to_string());
        }
        self
    }

    pub fn focused(mut self) -> Self {
        self.builder.focused = Some(self.index);
        self
    }

    pub fn id(self) -> NodeId {
        NodeId(self.index)
    }
}
