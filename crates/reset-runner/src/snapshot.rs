//! Captures the live DOM into a [`reset_hotkey::Snapshot`].

use eoka::Page;
use reset_hotkey::snapshot::SnapshotNode;
use reset_hotkey::{NodeId, Snapshot};
use serde::Deserialize;

use crate::{Error, Result};

/// Walks the document in pre-order.
///
/// Only the attributes the locator reads are kept. Geometry is recorded for
/// buttons and test-id elements, text only inside buttons, and `innerText` only for the nearest
/// `div` around each button; nothing else is ever read. Element handles are
/// kept on the bridge so clicks can address them by index.
const CAPTURE_JS: &str = r#"
(() => {
  const s = window.__resetHotkey || {};
  const ATTRS = ['class', 'role', 'data-state', 'data-icon', 'aria-label', 'data-testid', 'data-key', 'contenteditable', 'type'];
  const SKIP = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']);

  const contexts = new Set();
  for (const b of document.querySelectorAll('button')) {
    const d = b.parentElement && b.parentElement.closest('div');
    if (d) contexts.add(d);
  }

  const nodes = [];
  const handles = [];
  const index = new Map();
  const stack = [[document.documentElement, null, false]];
  while (stack.length) {
    const [node, parent, inButton] = stack.pop();
    if (!node) continue;
    if (node.nodeType === Node.TEXT_NODE) {
      if (inButton && node.data.trim()) nodes.push({ kind: 'text', parent, text: node.data });
      continue;
    }
    if (node.nodeType !== Node.ELEMENT_NODE || SKIP.has(node.tagName.toUpperCase())) continue;

    const i = nodes.length;
    const tag = node.tagName.toLowerCase();
    const attrs = {};
    for (const a of ATTRS) {
      const v = node.getAttribute(a);
      if (v !== null) attrs[a] = v;
    }
    const entry = { kind: 'element', parent, tag, attrs };
    if (tag === 'button' || node.hasAttribute('data-testid')) {
      const r = node.getBoundingClientRect();
      entry.rect = { x: r.x, y: r.y, width: r.width, height: r.height };
    }
    if (contexts.has(node)) entry.inner_text = node.innerText || '';
    nodes.push(entry);
    handles[i] = node;
    index.set(node, i);

    const kids = node.childNodes;
    for (let k = kids.length - 1; k >= 0; k--) {
      stack.push([kids[k], i, inButton || tag === 'button']);
    }
  }

  s.handles = handles;
  const resolve = el => (el && index.has(el)) ? index.get(el) : null;
  const keyFocus = (s.focus || []).map(resolve);
  s.focus = [];
  return JSON.stringify({ nodes, focused: resolve(document.activeElement), key_focus: keyFocus });
})()
"#;

#[derive(Debug, Deserialize)]
struct RawCapture {
    nodes: Vec<SnapshotNode>,
    focused: Option<usize>,
    #[serde(default)]
    key_focus: Vec<Option<usize>>,
}

/// A captured page plus the dispatch-time focus of each drained keystroke.
#[derive(Debug)]
pub struct Capture {
    pub snapshot: Snapshot,
    pub key_focus: Vec<Option<NodeId>>,
}

impl Capture {
    /// Focus recorded for the `i`-th drained keystroke.
    pub fn focus_of(&self, i: usize) -> Option<NodeId> {
        self.key_focus.get(i).copied().flatten()
    }
}

/// Snapshot the page.
pub async fn capture(page: &Page) -> Result<Capture> {
    let json: String = page.evaluate(CAPTURE_JS).await?;
    parse_capture(&json)
}

fn parse_capture(json: &str) -> Result<Capture> {
    let raw: RawCapture = serde_json::from_str(json)
        .map_err(|e| Error::Bridge(format!("failed to parse snapshot: {}", e)))?;
    Ok(Capture {
        snapshot: Snapshot::from_nodes(raw.nodes, raw.focused),
        key_focus: raw.key_focus.into_iter().map(|f| f.map(NodeId)).collect(),
    })
}
