//! Lifecycle Supervisor: attaches the hotkey router once the host shows its
//! editor, and re-checks after client-side navigations.
//!
//! The host integration reports structural changes through
//! [`LifecycleSupervisor::on_mutation`] and navigations through
//! [`LifecycleSupervisor::on_navigation`]; how it detects them is its own
//! business.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::helper::Task;
use crate::locate;
use crate::timer::TimerQueue;
use crate::tree::UiTree;

/// Delay between a navigation and the editor re-check.
pub const RECHECK_DELAY: Duration = Duration::from_millis(50);

/// Client-side navigation primitive that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationKind {
    Push,
    Replace,
    Pop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Editor present; router attached by this call.
    Attached,
    /// Router was attached earlier. Nothing changed.
    AlreadyAttached,
    /// Editor not present; watching structural changes for it.
    Watching,
}

/// Tracks whether the router is attached. Attachment happens at most once.
#[derive(Debug, Default)]
pub struct LifecycleSupervisor {
    attached: bool,
    watching: bool,
}

impl LifecycleSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_watching(&self) -> bool {
        self.watching
    }

    /// Attach now if the editor is showing, otherwise start watching.
    /// Safe to call any number of times.
    pub fn init<T: UiTree + ?Sized>(&mut self, tree: &T) -> InitOutcome {
        if self.attached {
            return InitOutcome::AlreadyAttached;
        }
        if locate::is_editor_view(tree) {
            self.attach();
            return InitOutcome::Attached;
        }
        if !self.watching {
            debug!("editor not present, watching for it");
        }
        self.watching = true;
        InitOutcome::Watching
    }

    /// Structural change seen. Returns true if this attached the router.
    pub fn on_mutation<T: UiTree + ?Sized>(&mut self, tree: &T) -> bool {
        if !self.watching || self.attached {
            return false;
        }
        if !locate::is_editor_view(tree) {
            return false;
        }
        self.attach();
        true
    }

    /// Queue a re-check after a navigation.
    pub fn on_navigation(&mut self, kind: NavigationKind, now: Duration, timers: &mut TimerQueue<Task>) {
        debug!(?kind, "navigation, re-checking editor view");
        timers.schedule(now + RECHECK_DELAY, Task::Reinit);
    }

    fn attach(&mut self) {
        self.attached = true;
        self.watching = false;
        info!("editor detected, hotkey router attached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Snapshot, SnapshotBuilder};

    fn blank() -> SnapshotBuilder {
        let mut b = Snapshot::builder();
        b.element(None, "body");
        b
    }

    fn editor() -> Snapshot {
        let mut b = Snapshot::builder();
        let body = b.element(None, "body").id();
        b.element(Some(body), "div").attr("data-key", "code-area");
        b.build()
    }

    #[test]
    fn attaches_immediately_in_editor() {
        let mut s = LifecycleSupervisor::new();
        assert_eq!(s.init(&editor()), InitOutcome::Attached);
        assert!(s.is_attached());
        assert!(!s.is_watching());
    }

    #[test]
    fn repeated_init_attaches_once() {
        let mut s = LifecycleSupervisor::new();
        assert_eq!(s.init(&editor()), InitOutcome::Attached);
        assert_eq!(s.init(&editor()), InitOutcome::AlreadyAttached);
        assert_eq!(s.init(&blank().build()), InitOutcome::AlreadyAttached);
        assert!(!s.on_mutation(&editor()));
    }

    #[test]
    fn watches_until_editor_appears() {
        let mut s = LifecycleSupervisor::new();
        let page = blank().build();
        assert_eq!(s.init(&page), InitOutcome::Watching);
        assert_eq!(s.init(&page), InitOutcome::Watching);
        assert!(s.is_watching());

        assert!(!s.on_mutation(&page));
        assert!(!s.is_attached());

        assert!(s.on_mutation(&editor()));
        assert!(s.is_attached());
        assert!(!s.is_watching());
        assert!(!s.on_mutation(&editor()));
    }

    #[test]
    fn mutations_ignored_before_init() {
        let mut s = LifecycleSupervisor::new();
        assert!(!s.on_mutation(&editor()));
        assert!(!s.is_attached());
    }

    #[test]
    fn navigation_queues_recheck() {
        let mut s = LifecycleSupervisor::new();
        let mut timers = TimerQueue::new();
        s.on_navigation(NavigationKind::Push, Duration::from_millis(1000), &mut timers);
        assert_eq!(timers.next_due(), Some(Duration::from_millis(1050)));
        assert_eq!(
            timers.pop_due(Duration::from_millis(1050)).map(|(_, t)| t),
            Some(Task::Reinit)
        );
    }
}
