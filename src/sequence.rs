//! Activation Sequencer: clicks located elements and drives the two-step
//! reset flow.
//!
//! The host shows its confirmation dialog some time after the reset click
//! and never says when. Instead of waiting on a signal, a fixed
//! [`RetrySchedule`] queues one confirmation attempt per offset. All of them
//! fire even after one succeeds; a dismissed dialog simply is not found.

use std::time::Duration;

use tracing::debug;

use crate::feedback::{FeedbackPresenter, ToastFrame, ToastId};
use crate::helper::Task;
use crate::locate::{self, LocatedElement};
use crate::timer::TimerQueue;
use crate::tree::UiTree;
use crate::{Error, Result};

/// Toast text shown when a reset starts.
pub const RESET_TOAST_TEXT: &str = "Reset";

/// Write interface to the host page.
///
/// Implementations may fail; callers in this crate log and move on.
pub trait PageActions {
    /// Perform the platform click on `element`.
    fn trigger(&mut self, element: &LocatedElement) -> Result<()>;

    /// Insert or update the toast described by `frame`.
    fn render_toast(&mut self, frame: &ToastFrame) -> Result<()>;

    fn remove_toast(&mut self, id: ToastId) -> Result<()>;
}

/// Offsets, measured from the reset click, at which the confirmation
/// button is looked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySchedule {
    offsets: Vec<Duration>,
}

impl RetrySchedule {
    pub const DEFAULT_MS: [u64; 5] = [100, 250, 500, 1000, 1500];

    /// Offsets must be non-empty and strictly increasing.
    pub fn new(offsets: Vec<Duration>) -> Result<Self> {
        if offsets.is_empty() {
            return Err(Error::InvalidSchedule("no offsets".into()));
        }
        if offsets.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidSchedule(format!(
                "offsets must be strictly increasing: {:?}",
                offsets
            )));
        }
        Ok(Self { offsets })
    }

    pub fn from_millis(ms: &[u64]) -> Result<Self> {
        Self::new(ms.iter().copied().map(Duration::from_millis).collect())
    }

    pub fn offsets(&self) -> &[Duration] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

impl Default for RetrySchedule {
    fn default() -> Self {
        Self {
            offsets: Self::DEFAULT_MS
                .iter()
                .copied()
                .map(Duration::from_millis)
                .collect(),
        }
    }
}

/// Clicks elements and schedules confirmation attempts.
#[derive(Debug, Clone, Default)]
pub struct ActivationSequencer {
    schedule: RetrySchedule,
}

impl ActivationSequencer {
    pub fn new(schedule: RetrySchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &RetrySchedule {
        &self.schedule
    }

    /// Click `element` if it has a non-zero rendered area.
    ///
    /// Returns whether the visibility check passed. A click the host rejects
    /// is logged and still counts; the host gives no way to tell a rejected
    /// click from one that did nothing.
    pub fn activate<A: PageActions + ?Sized>(element: &LocatedElement, actions: &mut A) -> bool {
        if !element.is_visible() {
            debug!(node = element.node.0, "skipping zero-area element");
            return false;
        }
        if let Err(e) = actions.trigger(element) {
            debug!(node = element.node.0, "trigger failed: {}", e);
        }
        true
    }

    /// Click the reset control and start the confirmation flow.
    ///
    /// On success shows a pending toast and queues one
    /// [`Task::ConfirmAttempt`] per schedule offset, measured from `now`.
    pub fn begin_reset<A: PageActions + ?Sized>(
        &self,
        reset: &LocatedElement,
        now: Duration,
        actions: &mut A,
        presenter: &mut FeedbackPresenter,
        timers: &mut TimerQueue<Task>,
    ) -> bool {
        if !Self::activate(reset, actions) {
            return false;
        }
        presenter.show(RESET_TOAST_TEXT, now, actions, timers);
        self.arm_confirmation(now, timers);
        true
    }

    /// Queue one confirmation attempt per offset.
    pub fn arm_confirmation(&self, now: Duration, timers: &mut TimerQueue<Task>) {
        for (attempt, offset) in self.schedule.offsets().iter().enumerate() {
            timers.schedule(now + *offset, Task::ConfirmAttempt { attempt });
        }
        debug!(attempts = self.schedule.len(), "confirmation attempts armed");
    }

    /// One confirmation attempt: look for the dialog button, click if present.
    pub fn attempt_confirm<T, A>(attempt: usize, tree: &T, actions: &mut A) -> bool
    where
        T: UiTree + ?Sized,
        A: PageActions + ?Sized,
    {
        let Some(confirm) = locate::find_confirm_control(tree) else {
            debug!(attempt, "no confirmation control");
            return false;
        };
        let clicked = Self::activate(&confirm, actions);
        debug!(attempt, clicked, label = %confirm.label, "confirmation attempt");
        clicked
    }
}
