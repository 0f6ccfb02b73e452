//! Write side: buffers the helper's clicks and toast updates, then applies
//! them to the page.
//!
//! The core calls [`PageActions`] synchronously while the page can only be
//! reached asynchronously, so commands are recorded first and flushed after
//! the helper returns. Flush failures are logged and dropped: a missed click
//! or toast must never take the driver down.

use eoka::Page;
use reset_hotkey::{LocatedElement, PageActions, ToastFrame, ToastId};
use tracing::{debug, warn};

/// Clicks the element registered at an index by the last capture.
const CLICK_JS: &str = r#"
((i) => {
  const el = window.__resetHotkey && window.__resetHotkey.handles && window.__resetHotkey.handles[i];
  if (!el || !el.isConnected) return false;
  el.click();
  return true;
})
"#;

/// Inserts or updates the toast. Only one toast element ever exists.
const RENDER_TOAST_JS: &str = r#"
((frame) => {
  try {
    const ID = '__reset-hotkey-toast';
    let el = document.getElementById(ID);
    if (el && el.dataset.toastId !== String(frame.id)) { el.remove(); el = null; }
    if (!el) {
      el = document.createElement('div');
      el.id = ID;
      el.dataset.toastId = String(frame.id);
      Object.assign(el.style, {
        position: 'fixed',
        right: '16px',
        bottom: '16px',
        zIndex: '2147483647',
        background: 'rgba(32,33,36,0.95)',
        color: 'white',
        padding: '8px 10px',
        borderRadius: '6px',
        font: '12px system-ui, -apple-system, Segoe UI, Roboto, Ubuntu, Cantarell, Noto Sans, Helvetica, Arial',
        boxShadow: '0 2px 12px rgba(0,0,0,0.3)',
      });
      document.body.appendChild(el);
    }
    const icon = frame.phase === 'pending' ? '⟳' : '✓';
    el.textContent = icon + ' ' + frame.text;
    if (frame.phase === 'exiting') {
      el.style.transition = 'opacity 200ms ease';
      el.style.opacity = '0';
    }
    return true;
  } catch (_) {
    return false;
  }
})
"#;

const REMOVE_TOAST_JS: &str = r#"
((id) => {
  const el = document.getElementById('__reset-hotkey-toast');
  if (el && el.dataset.toastId === String(id)) el.remove();
  return true;
})
"#;

/// A buffered write.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Click the element at this capture index.
    Click(usize),
    RenderToast(ToastFrame),
    RemoveToast(ToastId),
}

impl Command {
    fn script(&self) -> reset_hotkey::Result<String> {
        Ok(match self {
            Command::Click(i) => format!("{}({})", CLICK_JS, i),
            Command::RenderToast(frame) => {
                format!("{}({})", RENDER_TOAST_JS, serde_json::to_string(frame)?)
            }
            Command::RemoveToast(id) => format!("{}({})", REMOVE_TOAST_JS, id.0),
        })
    }
}

/// Records commands for a later [`CommandBuffer::flush`].
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Apply and clear every recorded command, in order.
    /// Returns how many the page accepted.
    pub async fn flush(&mut self, page: &Page) -> usize {
        let mut applied = 0;
        for command in self.commands.drain(..) {
            let script = match command.script() {
                Ok(s) => s,
                Err(e) => {
                    warn!("could not encode {:?}: {}", command, e);
                    continue;
                }
            };
            match page.evaluate::<bool>(&script).await {
                Ok(true) => applied += 1,
                Ok(false) => debug!("page declined {:?}", command),
                Err(e) => debug!("{:?} failed: {}", command, e),
            }
        }
        applied
    }
}

impl PageActions for CommandBuffer {
    fn trigger(&mut self, element: &LocatedElement) -> reset_hotkey::Result<()> {
        self.commands.push(Command::Click(element.node.0));
        Ok(())
    }

    fn render_toast(&mut self, frame: &ToastFrame) -> reset_hotkey::Result<()> {
        self.commands.push(Command::RenderToast(frame.clone()));
        Ok(())
    }

    fn remove_toast(&mut self, id: ToastId) -> reset_hotkey::Result<()> {
        self.commands.push(Command::RemoveToast(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reset_hotkey::{NodeId, Phase, Rect};

    #[test]
    fn records_in_call_order() {
        let mut buf = CommandBuffer::new();
        let el = LocatedElement {
            node: NodeId(7),
            rect: Rect::new(0.0, 0.0, 20.0, 20.0),
            label: "Reset".into(),
            strategy: "reset-label",
        };
        let frame = ToastFrame {
            id: ToastId(3),
            text: "Reset".into(),
            phase: Phase::Pending,
        };
        buf.trigger(&el).unwrap();
        buf.render_toast(&frame).unwrap();
        buf.remove_toast(ToastId(2)).unwrap();

        assert_eq!(
            buf.commands(),
            &[
                Command::Click(7),
                Command::RenderToast(frame),
                Command::RemoveToast(ToastId(2)),
            ]
        );
    }

    #[test]
    fn scripts_embed_arguments() {
        assert!(Command::Click(12).script().unwrap().ends_with("(12)"));
        assert!(Command::RemoveToast(ToastId(4))
            .script()
            .unwrap()
            .ends_with("(4)"));

        let script = Command::RenderToast(ToastFrame {
            id: ToastId(1),
            text: "Reset \"now\"".into(),
            phase: Phase::Confirmed,
        })
        .script()
        .unwrap();
        assert!(script.ends_with(r#"({"id":1,"text":"Reset \"now\"","phase":"confirmed"})"#));
    }
}
