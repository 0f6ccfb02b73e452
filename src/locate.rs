//! Element Locator: finds the reset control and the confirmation button.
//!
//! The host page gives no ids or events, so each search is an ordered list of
//! independent [`Strategy`] values tried first-match-wins. Structural markers
//! come before labels, labels before free text. Every search reads the tree
//! as it is right now and returns `None` when nothing qualifies; absence is
//! the common case (dialog not rendered yet, or already dismissed).

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::tree::{NodeId, Rect, UiTree};

/// A tiny selector vocabulary, enough for the host's markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `tag`
    Tag(&'static str),
    /// `.class`
    Class(&'static str),
    /// `[name="value"]`
    Attr(&'static str, &'static str),
    /// `tag[name="value"]`
    TagAttr(&'static str, &'static str, &'static str),
}

impl Marker {
    pub fn matches<T: UiTree + ?Sized>(&self, tree: &T, node: NodeId) -> bool {
        match *self {
            Marker::Tag(tag) => tree.tag(node) == tag,
            Marker::Class(class) => tree.has_class(node, class),
            Marker::Attr(name, value) => tree.attr(node, name) == Some(value),
            Marker::TagAttr(tag, name, value) => {
                tree.tag(node) == tag && tree.attr(node, name) == Some(value)
            }
        }
    }
}

pub fn matches_any<T: UiTree + ?Sized>(markers: &[Marker], tree: &T, node: NodeId) -> bool {
    markers.iter().any(|m| m.matches(tree, node))
}

/// Present only while the host shows its code editor.
pub const EDITOR_MARKERS: &[Marker] = &[
    Marker::Attr("data-key", "code-area"),
    Marker::Class("monaco-editor"),
    Marker::Attr("data-testid", "console-panel"),
];

/// The rich editor container; typing inside it may still trigger the hotkey.
pub const CODE_SURFACE: Marker = Marker::Class("monaco-editor");

const ACTIVATABLE: Marker = Marker::Tag("button");

const RESET_ICON: Marker = Marker::TagAttr("svg", "data-icon", "arrow-rotate-left");

const RESET_LABELS: &[Marker] = &[
    Marker::TagAttr("button", "aria-label", "Reset"),
    Marker::Attr("data-testid", "editor-reset-button"),
];

const MODAL_MARKERS: &[Marker] = &[
    Marker::Attr("role", "dialog"),
    Marker::Attr("data-state", "open"),
    Marker::Class("rc-dialog"),
    Marker::Class("ant-modal"),
    Marker::Class("chakra-modal__content"),
];

/// Containers whose rendered text is searched for warning phrases.
const CONTEXT_CONTAINER: Marker = Marker::Tag("div");

/// Lowercase; matched by containment.
const WARNING_PHRASES: &[&str] = &[
    "are you sure?",
    "discarded and reset to the default code",
    "reset to the default code",
];

static RESET_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(reset|revert)$").expect("static regex"));

static CONFIRM_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(reset|confirm|yes)$").expect("static regex"));

/// A located interactive element and its geometry at search time.
///
/// Valid only for the tree it came from; never keep one across ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedElement {
    pub node: NodeId,
    pub rect: Rect,
    /// Trimmed text content.
    pub label: String,
    /// Name of the strategy that found it.
    pub strategy: &'static str,
}

impl LocatedElement {
    fn at<T: UiTree + ?Sized>(tree: &T, node: NodeId, strategy: &'static str) -> Self {
        Self {
            node,
            rect: tree.rect(node),
            label: label(tree, node),
            strategy,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.rect.has_area()
    }
}

/// One independent way of finding an element.
pub trait Strategy {
    fn name(&self) -> &'static str;

    fn find<T: UiTree + ?Sized>(&self, tree: &T) -> Option<NodeId>;
}

/// Ordered strategies, first match wins.
#[derive(Debug, Clone, Copy)]
pub struct Locator<S: 'static> {
    strategies: &'static [S],
}

impl<S: Strategy> Locator<S> {
    pub const fn new(strategies: &'static [S]) -> Self {
        Self { strategies }
    }

    pub fn locate<T: UiTree + ?Sized>(&self, tree: &T) -> Option<LocatedElement> {
        self.strategies.iter().find_map(|s| {
            let node = s.find(tree)?;
            debug!(strategy = s.name(), node = node.0, "element located");
            Some(LocatedElement::at(tree, node, s.name()))
        })
    }
}

/// Ways of finding the control that starts a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStrategy {
    /// Undo-arrow icon inside a button, resolved to the button.
    IconMarker,
    /// Accessible label or test id naming the reset button.
    LabelOrTestId,
    /// First button whose text is exactly "reset" or "revert".
    ButtonText,
}

impl Strategy for ResetStrategy {
    fn name(&self) -> &'static str {
        match self {
            ResetStrategy::IconMarker => "reset-icon",
            ResetStrategy::LabelOrTestId => "reset-label",
            ResetStrategy::ButtonText => "reset-text",
        }
    }

    fn find<T: UiTree + ?Sized>(&self, tree: &T) -> Option<NodeId> {
        match self {
            ResetStrategy::IconMarker => tree.elements().into_iter().find_map(|n| {
                if !RESET_ICON.matches(tree, n) {
                    return None;
                }
                tree.closest_ancestor(n, |a| ACTIVATABLE.matches(tree, a))
            }),
            ResetStrategy::LabelOrTestId => tree
                .elements()
                .into_iter()
                .find(|&n| matches_any(RESET_LABELS, tree, n)),
            ResetStrategy::ButtonText => activatable(tree)
                .into_iter()
                .find(|&n| RESET_TEXT.is_match(&label(tree, n))),
        }
    }
}

/// Ways of finding the confirmation dialog's accept button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmStrategy {
    /// Matching button inside a modal/overlay container.
    InsideModal,
    /// Visible matching button whose surrounding block carries a warning phrase.
    WarningContext,
    /// Any visible matching button. Can hit unrelated "Yes"/"Confirm" buttons.
    LabelOnly,
}

impl Strategy for ConfirmStrategy {
    fn name(&self) -> &'static str {
        match self {
            ConfirmStrategy::InsideModal => "confirm-modal",
            ConfirmStrategy::WarningContext => "confirm-warning",
            ConfirmStrategy::LabelOnly => "confirm-label",
        }
    }

    fn find<T: UiTree + ?Sized>(&self, tree: &T) -> Option<NodeId> {
        match self {
            ConfirmStrategy::InsideModal => tree
                .elements()
                .into_iter()
                .filter(|&n| matches_any(MODAL_MARKERS, tree, n))
                .find_map(|container| {
                    tree.descendants(container).into_iter().find(|&d| {
                        ACTIVATABLE.matches(tree, d) && CONFIRM_TEXT.is_match(&label(tree, d))
                    })
                }),
            ConfirmStrategy::WarningContext => visible_activatable(tree).into_iter().find(|&n| {
                CONFIRM_TEXT.is_match(&label(tree, n)) && has_warning_context(tree, n)
            }),
            ConfirmStrategy::LabelOnly => visible_activatable(tree)
                .into_iter()
                .find(|&n| CONFIRM_TEXT.is_match(&label(tree, n))),
        }
    }
}

pub const RESET_LOCATOR: Locator<ResetStrategy> = Locator::new(&[
    ResetStrategy::IconMarker,
    ResetStrategy::LabelOrTestId,
    ResetStrategy::ButtonText,
]);

pub const CONFIRM_LOCATOR: Locator<ConfirmStrategy> = Locator::new(&[
    ConfirmStrategy::InsideModal,
    ConfirmStrategy::WarningContext,
    ConfirmStrategy::LabelOnly,
]);

/// Find the control that starts a reset.
pub fn find_reset_control<T: UiTree + ?Sized>(tree: &T) -> Option<LocatedElement> {
    RESET_LOCATOR.locate(tree)
}

/// Find the accept button of the reset confirmation dialog.
pub fn find_confirm_control<T: UiTree + ?Sized>(tree: &T) -> Option<LocatedElement> {
    CONFIRM_LOCATOR.locate(tree)
}

/// Whether the host currently shows its code editor.
pub fn is_editor_view<T: UiTree + ?Sized>(tree: &T) -> bool {
    tree.elements()
        .into_iter()
        .any(|n| matches_any(EDITOR_MARKERS, tree, n))
}

fn label<T: UiTree + ?Sized>(tree: &T, node: NodeId) -> String {
    tree.text_content(node).trim().to_string()
}

fn activatable<T: UiTree + ?Sized>(tree: &T) -> Vec<NodeId> {
    tree.elements()
        .into_iter()
        .filter(|&n| ACTIVATABLE.matches(tree, n))
        .collect()
}

fn visible_activatable<T: UiTree + ?Sized>(tree: &T) -> Vec<NodeId> {
    activatable(tree)
        .into_iter()
        .filter(|&n| tree.is_visible(n))
        .collect()
}

fn has_warning_context<T: UiTree + ?Sized>(tree: &T, node: NodeId) -> bool {
    let Some(container) = tree.closest_ancestor(node, |a| CONTEXT_CONTAINER.matches(tree, a))
    else {
        return false;
    };
    let text = tree.rendered_text(container).to_lowercase();
    WARNING_PHRASES.iter().any(|p| text.contains(p))
}
