//! Hotkey Router: decides, per keystroke, whether the reset hotkey fires and
//! whether the event is consumed.
//!
//! Ordinary typing must never be hijacked. A keystroke aimed at a text field
//! outside the code editor is ignored before the key itself is even looked
//! at, and a recognised hotkey is only consumed when a visible reset control
//! was actually clicked.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::feedback::FeedbackPresenter;
use crate::helper::Task;
use crate::locate::{self, CODE_SURFACE};
use crate::sequence::{ActivationSequencer, PageActions};
use crate::timer::TimerQueue;
use crate::tree::{NodeId, UiTree};

/// Operating system family, as far as modifier conventions go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Command is the primary modifier.
    Mac,
    Other,
}

impl Platform {
    /// Classify a `navigator.platform` string.
    pub fn from_navigator(platform: &str) -> Self {
        if platform.to_uppercase().contains("MAC") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }
}

/// Modifier keys held during a keystroke.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        meta: false,
        ctrl: false,
        shift: false,
        alt: false,
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    #[cfg(test)]
    pub const META_SHIFT: Self = Self {
        meta: true,
        shift: true,
        ..Self::NONE
    };
}

/// One keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyEvent {
    /// `KeyboardEvent.key`
    pub key: String,
    /// `KeyboardEvent.code`
    pub code: String,
    pub modifiers: Modifiers,
    /// Focused element at dispatch time. `None` falls back to the tree's
    /// current focus.
    pub focused: Option<NodeId>,
}

impl HotkeyEvent {
    pub fn new(key: impl Into<String>, code: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            code: code.into(),
            modifiers,
            focused: None,
        }
    }

    pub fn with_focus(mut self, node: NodeId) -> Self {
        self.focused = Some(node);
        self
    }
}

/// A key combination bound to the reset action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    /// Only recognised on this platform.
    pub platform: Platform,
    pub key: &'static str,
    pub code: &'static str,
}

/// Command + Backslash, macOS only.
pub const RESET_HOTKEY: Hotkey = Hotkey {
    platform: Platform::Mac,
    key: "\\",
    code: "Backslash",
};

impl Hotkey {
    pub fn matches(&self, platform: Platform, event: &HotkeyEvent) -> bool {
        platform == self.platform
            && event.modifiers.meta
            && !event.modifiers.shift
            && !event.modifiers.alt
            && (event.code == self.code || event.key == self.key)
    }
}

/// Where keyboard focus sits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusContext {
    /// Text input, text area, or content-editable element.
    pub editable: bool,
    /// Inside the host's code editor.
    pub in_code_surface: bool,
}

impl FocusContext {
    pub fn of<T: UiTree + ?Sized>(tree: &T, focused: Option<NodeId>) -> Self {
        let Some(node) = focused else {
            return Self::default();
        };
        let editable = matches!(tree.tag(node), "input" | "textarea")
            || tree.attr(node, "contenteditable") == Some("true");
        let in_code_surface = tree.closest(node, |n| CODE_SURFACE.matches(tree, n)).is_some();
        Self {
            editable,
            in_code_surface,
        }
    }

    /// Typing in an unrelated form field.
    pub fn blocks_hotkey(&self) -> bool {
        self.editable && !self.in_code_surface
    }
}

/// Why a keystroke was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Router not attached yet.
    Detached,
    /// Focus is in a text field outside the code editor.
    UnrelatedInput,
    NotHotkey,
    /// Hotkey matched but no visible reset control exists right now.
    ResetUnavailable,
}

/// Outcome of routing one keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Reset clicked; the host must prevent the default action and stop
    /// propagation.
    Consumed,
    Ignored(IgnoreReason),
}

impl Disposition {
    pub fn is_consumed(&self) -> bool {
        matches!(self, Disposition::Consumed)
    }
}

#[derive(Debug, Clone)]
pub struct HotkeyRouter {
    platform: Platform,
    hotkey: Hotkey,
}

impl HotkeyRouter {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            hotkey: RESET_HOTKEY,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether `event`, under `focus`, is an interceptable reset hotkey.
    /// Does not look for the reset control.
    pub fn classify(&self, event: &HotkeyEvent, focus: FocusContext) -> Option<IgnoreReason> {
        if focus.blocks_hotkey() {
            return Some(IgnoreReason::UnrelatedInput);
        }
        if !self.hotkey.matches(self.platform, event) {
            return Some(IgnoreReason::NotHotkey);
        }
        None
    }

    /// Route one keystroke through focus check, hotkey match, and reset.
    #[allow(clippy::too_many_arguments)]
    pub fn route<T, A>(
        &self,
        event: &HotkeyEvent,
        tree: &T,
        now: Duration,
        sequencer: &ActivationSequencer,
        presenter: &mut FeedbackPresenter,
        actions: &mut A,
        timers: &mut TimerQueue<Task>,
    ) -> Disposition
    where
        T: UiTree + ?Sized,
        A: PageActions + ?Sized,
    {
        let focus = FocusContext::of(tree, event.focused.or_else(|| tree.focused()));
        if let Some(reason) = self.classify(event, focus) {
            return Disposition::Ignored(reason);
        }

        let Some(reset) = locate::find_reset_control(tree) else {
            debug!("hotkey pressed, no reset control on page");
            return Disposition::Ignored(IgnoreReason::ResetUnavailable);
        };
        if !sequencer.begin_reset(&reset, now, actions, presenter, timers) {
            debug!(node = reset.node.0, "hotkey pressed, reset control not visible");
            return Disposition::Ignored(IgnoreReason::ResetUnavailable);
        }

        info!(strategy = reset.strategy, "reset triggered by hotkey");
        Disposition::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::tests::Recorder;
    use crate::{Snapshot, SnapshotBuilder};

    fn hotkey() -> HotkeyEvent {
        HotkeyEvent::new("\\", "Backslash", Modifiers::META)
    }

    fn editor_page() -> (SnapshotBuilder, NodeId, NodeId) {
        let mut b = Snapshot::builder();
        let body = b.element(None, "body").id();
        let editor = b.element(Some(body), "div").class("monaco-editor").id();
        (b, body, editor)
    }

    struct Harness {
        router: HotkeyRouter,
        sequencer: ActivationSequencer,
        presenter: FeedbackPresenter,
        rec: Recorder,
        timers: TimerQueue<Task>,
    }

    impl Harness {
        fn new(platform: Platform) -> Self {
            Self {
                router: HotkeyRouter::new(platform),
                sequencer: ActivationSequencer::default(),
                presenter: FeedbackPresenter::new(),
                rec: Recorder::default(),
                timers: TimerQueue::new(),
            }
        }

        fn route(&mut self, event: &HotkeyEvent, page: &Snapshot) -> Disposition {
            self.router.route(
                event,
                page,
                Duration::ZERO,
                &self.sequencer,
                &mut self.presenter,
                &mut self.rec,
                &mut self.timers,
            )
        }
    }

    #[test]
    fn platform_detection() {
        assert_eq!(Platform::from_navigator("MacIntel"), Platform::Mac);
        assert_eq!(Platform::from_navigator("macOS"), Platform::Mac);
        assert_eq!(Platform::from_navigator("Win32"), Platform::Other);
        assert_eq!(Platform::from_navigator("Linux x86_64"), Platform::Other);
    }

    #[test]
    fn hotkey_matching() {
        let mac = Platform::Mac;
        assert!(RESET_HOTKEY.matches(mac, &hotkey()));
        // key alone or code alone is enough
        assert!(RESET_HOTKEY.matches(mac, &HotkeyEvent::new("\\", "IntlBackslash", Modifiers::META)));
        assert!(RESET_HOTKEY.matches(mac, &HotkeyEvent::new("#", "Backslash", Modifiers::META)));

        assert!(!RESET_HOTKEY.matches(Platform::Other, &hotkey()));
        assert!(!RESET_HOTKEY.matches(mac, &HotkeyEvent::new("\\", "Backslash", Modifiers::NONE)));
        assert!(!RESET_HOTKEY.matches(mac, &HotkeyEvent::new("|", "Backslash", Modifiers::META_SHIFT)));
        let alt = Modifiers {
            alt: true,
            ..Modifiers::META
        };
        assert!(!RESET_HOTKEY.matches(mac, &HotkeyEvent::new("\\", "Backslash", alt)));
        assert!(!RESET_HOTKEY.matches(mac, &HotkeyEvent::new("k", "KeyK", Modifiers::META)));
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        assert!(!RESET_HOTKEY.matches(mac, &HotkeyEvent::new("\\", "Backslash", ctrl)));
    }

    #[test]
    fn focus_context() {
        let (mut b, body, editor) = editor_page();
        let input = b.element(Some(body), "input").id();
        let area = b.element(Some(body), "textarea").id();
        let rich = b.element(Some(body), "div").attr("contenteditable", "true").id();
        let not_rich = b.element(Some(body), "div").attr("contenteditable", "false").id();
        let editor_area = b.element(Some(editor), "textarea").id();
        let page = b.build();

        for node in [input, area, rich] {
            let f = FocusContext::of(&page, Some(node));
            assert!(f.editable && !f.in_code_surface && f.blocks_hotkey());
        }
        let f = FocusContext::of(&page, Some(editor_area));
        assert!(f.editable && f.in_code_surface && !f.blocks_hotkey());
        assert!(!FocusContext::of(&page, Some(not_rich)).blocks_hotkey());
        assert!(!FocusContext::of(&page, Some(editor)).blocks_hotkey());
        assert!(FocusContext::of(&page, Some(editor)).in_code_surface);
        assert_eq!(FocusContext::of(&page, None), FocusContext::default());
    }

    #[test]
    fn unrelated_input_is_never_touched() {
        let (mut b, body, _) = editor_page();
        b.element(Some(body), "button").attr("aria-label", "Reset");
        let search = b.element(Some(body), "input").focused().id();
        let page = b.build();

        let mut h = Harness::new(Platform::Mac);
        for event in [hotkey(), hotkey().with_focus(search)] {
            assert_eq!(
                h.route(&event, &page),
                Disposition::Ignored(IgnoreReason::UnrelatedInput)
            );
        }
        assert!(h.rec.triggered.is_empty());
        assert!(h.timers.is_empty());
    }

    #[test]
    fn event_focus_overrides_tree_focus() {
        let (mut b, body, editor) = editor_page();
        let reset = b.element(Some(body), "button").attr("aria-label", "Reset").id();
        b.element(Some(body), "input").focused();
        let editor_input = b.element(Some(editor), "textarea").id();
        let page = b.build();

        let mut h = Harness::new(Platform::Mac);
        let event = hotkey().with_focus(editor_input);
        assert_eq!(h.route(&event, &page), Disposition::Consumed);
        assert_eq!(h.rec.triggered, vec![reset]);
    }

    #[test]
    fn consumes_inside_code_editor() {
        let (mut b, body, editor) = editor_page();
        let reset = b.element(Some(body), "button").attr("aria-label", "Reset").id();
        b.element(Some(editor), "textarea").focused();
        let page = b.build();

        let mut h = Harness::new(Platform::Mac);
        assert_eq!(h.route(&hotkey(), &page), Disposition::Consumed);
        assert_eq!(h.rec.triggered, vec![reset]);
        assert_eq!(h.presenter.current().unwrap().text, "Reset");
        let attempts = h
            .timers
            .pending()
            .into_iter()
            .filter(|(_, t)| matches!(t, Task::ConfirmAttempt { .. }))
            .count();
        assert_eq!(attempts, 5);
    }

    #[test]
    fn missing_reset_leaves_event_alone() {
        let (b, _, _) = editor_page();
        let page = b.build();

        let mut h = Harness::new(Platform::Mac);
        assert_eq!(
            h.route(&hotkey(), &page),
            Disposition::Ignored(IgnoreReason::ResetUnavailable)
        );
        assert!(h.presenter.current().is_none());
        assert!(h.timers.is_empty());
    }

    #[test]
    fn zero_area_reset_leaves_event_alone() {
        let (mut b, body, _) = editor_page();
        b.element(Some(body), "button")
            .attr("aria-label", "Reset")
            .hidden();
        let page = b.build();

        let mut h = Harness::new(Platform::Mac);
        assert_eq!(
            h.route(&hotkey(), &page),
            Disposition::Ignored(IgnoreReason::ResetUnavailable)
        );
        assert!(h.rec.triggered.is_empty());
        assert!(h.rec.frames.is_empty());
        assert!(h.timers.is_empty());
    }

    #[test]
    fn wrong_platform_or_key() {
        let (mut b, body, _) = editor_page();
        b.element(Some(body), "button").attr("aria-label", "Reset");
        let page = b.build();

        let mut other = Harness::new(Platform::Other);
        assert_eq!(
            other.route(&hotkey(), &page),
            Disposition::Ignored(IgnoreReason::NotHotkey)
        );

        let mut mac = Harness::new(Platform::Mac);
        let plain = HotkeyEvent::new("\\", "Backslash", Modifiers::NONE);
        assert_eq!(
            mac.route(&plain, &page),
            Disposition::Ignored(IgnoreReason::NotHotkey)
        );
        assert!(other.rec.triggered.is_empty() && mac.rec.triggered.is_empty());
    }
}
