//! # reset-hotkey
//!
//! Hotkey-driven reset for an in-browser code editor. On Command+Backslash the
//! helper finds the host page's "reset code" control, clicks it, keeps trying
//! to click the confirmation dialog the host shows afterwards, and flashes a
//! small toast.
//!
//! The crate is sans-IO: it reads the page through [`UiTree`], writes through
//! [`PageActions`], and never sleeps. Time is passed in by the caller and all
//! deferred work sits in a [`TimerQueue`]. `reset-runner` drives it against a
//! live Chrome page.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use reset_hotkey::{HotkeyEvent, Modifiers, Platform, ResetHelper, Snapshot};
//! # use reset_hotkey::{LocatedElement, PageActions, ToastFrame, ToastId};
//! # struct Noop;
//! # impl PageActions for Noop {
//! #     fn trigger(&mut self, _: &LocatedElement) -> reset_hotkey::Result<()> { Ok(()) }
//! #     fn render_toast(&mut self, _: &ToastFrame) -> reset_hotkey::Result<()> { Ok(()) }
//! #     fn remove_toast(&mut self, _: ToastId) -> reset_hotkey::Result<()> { Ok(()) }
//! # }
//!
//! let mut b = Snapshot::builder();
//! let body = b.element(None, "body").id();
//! b.element(Some(body), "div").class("monaco-editor");
//! let reset = b.element(Some(body), "button").attr("aria-label", "Reset").id();
//! let page = b.build();
//!
//! let mut helper = ResetHelper::new(Platform::Mac);
//! helper.init(&page);
//!
//! let event = HotkeyEvent::new("\\", "Backslash", Modifiers::META);
//! let mut actions = Noop;
//! let outcome = helper.on_key(&event, &page, &mut actions, Duration::ZERO);
//! assert!(outcome.is_consumed());
//! # let _ = reset;
//! ```

pub mod error;
pub mod feedback;
pub mod helper;
pub mod hotkey;
pub mod lifecycle;
pub mod locate;
pub mod sequence;
pub mod snapshot;
pub mod timer;
pub mod tree;

pub use error::{Error, Result};
pub use feedback::{FeedbackPresenter, FeedbackSession, FeedbackStep, Phase, ToastFrame, ToastId};
pub use helper::{ResetHelper, Task};
pub use hotkey::{Disposition, HotkeyEvent, HotkeyRouter, IgnoreReason, Modifiers, Platform};
pub use lifecycle::{InitOutcome, LifecycleSupervisor, NavigationKind};
pub use locate::{find_confirm_control, find_reset_control, LocatedElement};
pub use sequence::{ActivationSequencer, PageActions, RetrySchedule};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use timer::TimerQueue;
pub use tree::{NodeId, Rect, UiTree};
