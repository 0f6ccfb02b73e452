//! Feedback Presenter: one transient toast at a time.
//!
//! A toast starts `pending`, flips to `confirmed` in place, fades, and is
//! removed. Its phases run on fixed timers and say nothing about whether the
//! reset actually went through. Presentation is best effort: every write
//! failure is logged and dropped.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::helper::Task;
use crate::sequence::PageActions;
use crate::timer::TimerQueue;

/// Pending indicator shown this long before switching to confirmed.
pub const CONFIRM_AFTER: Duration = Duration::from_millis(400);

/// Exit transition starts this long after creation.
pub const EXIT_AFTER: Duration = Duration::from_millis(800);

/// Removed from the page this long after creation.
pub const REMOVE_AFTER: Duration = Duration::from_millis(1020);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ToastId(pub u64);

/// Visual state of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Spinner-like indication.
    Pending,
    /// Checkmark-like indication.
    Confirmed,
    /// Fading out.
    Exiting,
}

/// Timer-driven transitions of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackStep {
    Confirm,
    Exit,
    Remove,
}

/// What the host should render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToastFrame {
    pub id: ToastId,
    pub text: String,
    pub phase: Phase,
}

/// The live toast.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackSession {
    pub id: ToastId,
    pub text: String,
    pub created_at: Duration,
    pub phase: Phase,
}

impl FeedbackSession {
    pub fn removal_at(&self) -> Duration {
        self.created_at + REMOVE_AFTER
    }

    fn frame(&self) -> ToastFrame {
        ToastFrame {
            id: self.id,
            text: self.text.clone(),
            phase: self.phase,
        }
    }
}

#[derive(Debug, Default)]
pub struct FeedbackPresenter {
    current: Option<FeedbackSession>,
    next_id: u64,
}

impl FeedbackPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&FeedbackSession> {
        self.current.as_ref()
    }

    /// Replace any live toast with a new pending one and queue its phases.
    pub fn show<A: PageActions + ?Sized>(
        &mut self,
        text: &str,
        now: Duration,
        actions: &mut A,
        timers: &mut TimerQueue<Task>,
    ) -> ToastId {
        if let Some(prev) = self.current.take() {
            if let Err(e) = actions.remove_toast(prev.id) {
                debug!(id = prev.id.0, "toast removal failed: {}", e);
            }
        }

        let id = ToastId(self.next_id);
        self.next_id += 1;
        let session = FeedbackSession {
            id,
            text: text.to_string(),
            created_at: now,
            phase: Phase::Pending,
        };
        if let Err(e) = actions.render_toast(&session.frame()) {
            debug!(id = id.0, "toast insert failed: {}", e);
        }
        let removal = session.removal_at();
        self.current = Some(session);

        for (due, step) in [
            (now + CONFIRM_AFTER, FeedbackStep::Confirm),
            (now + EXIT_AFTER, FeedbackStep::Exit),
            (removal, FeedbackStep::Remove),
        ] {
            timers.schedule(due, Task::Feedback { id, step });
        }
        id
    }

    /// Apply a queued transition. Steps for a replaced toast are ignored.
    pub fn advance<A: PageActions + ?Sized>(&mut self, id: ToastId, step: FeedbackStep, actions: &mut A) {
        let Some(session) = self.current.as_mut().filter(|s| s.id == id) else {
            return;
        };

        let result = match step {
            FeedbackStep::Confirm => {
                session.phase = Phase::Confirmed;
                actions.render_toast(&session.frame())
            }
            FeedbackStep::Exit => {
                session.phase = Phase::Exiting;
                actions.render_toast(&session.frame())
            }
            FeedbackStep::Remove => {
                self.current = None;
                actions.remove_toast(id)
            }
        };
        if let Err(e) = result {
            debug!(id = id.0, ?step, "toast update failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::tests::Recorder;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn drain(
        presenter: &mut FeedbackPresenter,
        timers: &mut TimerQueue<Task>,
        rec: &mut Recorder,
        now: Duration,
    ) {
        while let Some((_, task)) = timers.pop_due(now) {
            if let Task::Feedback { id, step } = task {
                presenter.advance(id, step, rec);
            }
        }
    }

    #[test]
    fn removal_is_queued_at_session_removal_time() {
        let mut p = FeedbackPresenter::new();
        let mut timers = TimerQueue::new();
        let mut rec = Recorder::default();

        let id = p.show("Reset", ms(500), &mut rec, &mut timers);
        let removal = p.current().unwrap().removal_at();
        assert_eq!(removal, ms(1520));
        let removes: Vec<_> = timers
            .pending()
            .into_iter()
            .filter(|(_, t)| matches!(t, Task::Feedback { step: FeedbackStep::Remove, .. }))
            .collect();
        assert_eq!(
            removes,
            vec![(removal, &Task::Feedback { id, step: FeedbackStep::Remove })]
        );
    }

    #[test]
    fn lifecycle_pending_confirmed_exit_removed() {
        let mut p = FeedbackPresenter::new();
        let mut timers = TimerQueue::new();
        let mut rec = Recorder::default();

        let id = p.show("Reset", ms(0), &mut rec, &mut timers);
        assert_eq!(p.current().unwrap().phase, Phase::Pending);
        assert_eq!(p.current().unwrap().removal_at(), REMOVE_AFTER);

        drain(&mut p, &mut timers, &mut rec, CONFIRM_AFTER);
        assert_eq!(p.current().unwrap().phase, Phase::Confirmed);

        drain(&mut p, &mut timers, &mut rec, EXIT_AFTER);
        assert_eq!(p.current().unwrap().phase, Phase::Exiting);

        drain(&mut p, &mut timers, &mut rec, REMOVE_AFTER);
        assert!(p.current().is_none());

        let phases: Vec<_> = rec.frames.iter().map(|f| f.phase).collect();
        assert_eq!(phases, vec![Phase::Pending, Phase::Confirmed, Phase::Exiting]);
        assert!(rec.frames.iter().all(|f| f.id == id && f.text == "Reset"));
        assert_eq!(rec.removed, vec![id]);
    }

    #[test]
    fn second_show_replaces_first() {
        let mut p = FeedbackPresenter::new();
        let mut timers = TimerQueue::new();
        let mut rec = Recorder::default();

        let first = p.show("first", ms(0), &mut rec, &mut timers);
        let second = p.show("second", ms(10), &mut rec, &mut timers);
        assert_ne!(first, second);
        assert_eq!(rec.removed, vec![first]);
        assert_eq!(p.current().unwrap().text, "second");

        // first toast's removal time passes; second must survive it
        drain(&mut p, &mut timers, &mut rec, REMOVE_AFTER);
        assert_eq!(p.current().unwrap().id, second);
        assert_eq!(rec.removed, vec![first]);

        drain(&mut p, &mut timers, &mut rec, ms(10) + REMOVE_AFTER);
        assert!(p.current().is_none());
        assert_eq!(rec.removed, vec![first, second]);
        assert!(rec
            .frames
            .iter()
            .filter(|f| f.id == first)
            .all(|f| f.phase == Phase::Pending));
    }

    #[test]
    fn host_failures_are_swallowed() {
        let mut p = FeedbackPresenter::new();
        let mut timers = TimerQueue::new();
        let mut rec = Recorder {
            fail_toasts: true,
            ..Default::default()
        };

        p.show("Reset", ms(0), &mut rec, &mut timers);
        p.show("Reset", ms(5), &mut rec, &mut timers);
        drain(&mut p, &mut timers, &mut rec, ms(5000));
        assert!(p.current().is_none());
        assert!(timers.is_empty());
    }
}
