//! Composition root: wires the supervisor, router, sequencer and presenter
//! around one timer queue.

use std::time::Duration;

use tracing::debug;

use crate::feedback::{FeedbackPresenter, FeedbackStep, ToastId};
use crate::hotkey::{Disposition, HotkeyEvent, HotkeyRouter, IgnoreReason, Platform};
use crate::lifecycle::{InitOutcome, LifecycleSupervisor, NavigationKind};
use crate::locate;
use crate::sequence::{ActivationSequencer, PageActions, RetrySchedule};
use crate::timer::TimerQueue;
use crate::tree::UiTree;

/// Deferred work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Look for and click the confirmation button. `attempt` indexes the
    /// retry schedule.
    ConfirmAttempt { attempt: usize },
    /// Advance a toast.
    Feedback { id: ToastId, step: FeedbackStep },
    /// Re-run the editor check after a navigation.
    Reinit,
}

/// The whole helper, driven by host events and a caller-supplied clock.
///
/// Every method takes the page as it is at call time.
pub struct ResetHelper {
    supervisor: LifecycleSupervisor,
    router: HotkeyRouter,
    sequencer: ActivationSequencer,
    presenter: FeedbackPresenter,
    timers: TimerQueue<Task>,
}

impl ResetHelper {
    pub fn new(platform: Platform) -> Self {
        Self::with_schedule(platform, RetrySchedule::default())
    }

    pub fn with_schedule(platform: Platform, schedule: RetrySchedule) -> Self {
        Self {
            supervisor: LifecycleSupervisor::new(),
            router: HotkeyRouter::new(platform),
            sequencer: ActivationSequencer::new(schedule),
            presenter: FeedbackPresenter::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn init<T: UiTree + ?Sized>(&mut self, tree: &T) -> InitOutcome {
        self.supervisor.init(tree)
    }

    /// Start over for a new document: detached, no pending tasks, no toast.
    /// The retry schedule is kept.
    pub fn reset(&mut self, platform: Platform) {
        let schedule = self.sequencer.schedule().clone();
        *self = Self::with_schedule(platform, schedule);
    }

    /// The page's structure changed.
    pub fn on_mutation<T: UiTree + ?Sized>(&mut self, tree: &T) -> bool {
        self.supervisor.on_mutation(tree)
    }

    /// The host navigated client-side.
    pub fn on_navigation(&mut self, kind: NavigationKind, now: Duration) {
        self.supervisor.on_navigation(kind, now, &mut self.timers);
    }

    /// Route a keystroke. Keystrokes before attachment are ignored.
    pub fn on_key<T, A>(
        &mut self,
        event: &HotkeyEvent,
        tree: &T,
        actions: &mut A,
        now: Duration,
    ) -> Disposition
    where
        T: UiTree + ?Sized,
        A: PageActions + ?Sized,
    {
        if !self.supervisor.is_attached() {
            return Disposition::Ignored(IgnoreReason::Detached);
        }
        self.router.route(
            event,
            tree,
            now,
            &self.sequencer,
            &mut self.presenter,
            actions,
            &mut self.timers,
        )
    }

    /// Run every task due at or before `now`, in due order. Returns how many ran.
    pub fn run_due<T, A>(&mut self, now: Duration, tree: &T, actions: &mut A) -> usize
    where
        T: UiTree + ?Sized,
        A: PageActions + ?Sized,
    {
        let mut ran = 0;
        while let Some((due, task)) = self.timers.pop_due(now) {
            debug!(?task, due_ms = due.as_millis() as u64, "running task");
            match task {
                Task::ConfirmAttempt { attempt } => {
                    ActivationSequencer::attempt_confirm(attempt, tree, actions);
                }
                Task::Feedback { id, step } => self.presenter.advance(id, step, actions),
                Task::Reinit => {
                    self.supervisor.init(tree);
                }
            }
            ran += 1;
        }
        ran
    }

    /// When the next task falls due.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_due()
    }

    /// Whether a hotkey pressed now would be consumed, focus aside.
    ///
    /// The host uses this to decide synchronously, inside its own key
    /// handler, whether to suppress the event.
    pub fn armed<T: UiTree + ?Sized>(&self, tree: &T) -> bool {
        self.supervisor.is_attached()
            && self.router.platform() == Platform::Mac
            && locate::find_reset_control(tree).is_some_and(|r| r.is_visible())
    }

    pub fn is_attached(&self) -> bool {
        self.supervisor.is_attached()
    }

    pub fn is_watching(&self) -> bool {
        self.supervisor.is_watching()
    }

    pub fn platform(&self) -> Platform {
        self.router.platform()
    }

    pub fn presenter(&self) -> &FeedbackPresenter {
        &self.presenter
    }

    pub fn timers(&self) -> &TimerQueue<Task> {
        &self.timers
    }
}
