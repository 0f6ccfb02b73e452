//! In-page bridge: records what the driver cannot observe over CDP.
//!
//! The bridge lives on `window.__resetHotkey`. It queues modifier keystrokes,
//! client-side navigations (wrapped `pushState`/`replaceState` plus
//! `popstate`) and a count of DOM changes, structural or visibility-related.
//! Key events must be suppressed synchronously, so the listener consults the
//! `armed` verdict the driver last published instead of waiting for a round
//! trip.

use eoka::Page;
use reset_hotkey::{HotkeyEvent, Modifiers, NavigationKind};
use serde::Deserialize;

use crate::{Error, Result};

/// Installs the bridge. A second install on the same document is a no-op.
const INSTALL_JS: &str = r#"
(() => {
  if (window.__resetHotkey) {
    return JSON.stringify({ installed: false, platform: navigator.platform || '' });
  }
  const state = {
    keys: [],
    navs: [],
    mutations: 0,
    armed: false,
    focus: [],
    handles: [],
  };
  window.__resetHotkey = state;

  const isHotkey = e =>
    e.metaKey && !e.shiftKey && !e.altKey && (e.code === 'Backslash' || e.key === '\\');

  const unrelatedInput = () => {
    const a = document.activeElement;
    const editable = !!a && (
      a.tagName === 'INPUT' ||
      a.tagName === 'TEXTAREA' ||
      a.getAttribute('contenteditable') === 'true'
    );
    const inEditor = !!(a && typeof a.closest === 'function' && a.closest('.monaco-editor'));
    return editable && !inEditor;
  };

  window.addEventListener('keydown', e => {
    // plain typing is never forwarded
    if (!e.metaKey && !e.ctrlKey) return;
    state.keys.push({
      info: { key: e.key, code: e.code, meta: e.metaKey, ctrl: e.ctrlKey, shift: e.shiftKey, alt: e.altKey },
      focus: document.activeElement,
    });
    if (state.armed && isHotkey(e) && !unrelatedInput()) {
      e.preventDefault();
      e.stopPropagation();
      e.stopImmediatePropagation();
    }
  }, true);

  for (const [name, kind] of [['pushState', 'push'], ['replaceState', 'replace']]) {
    const original = history[name];
    history[name] = function () {
      const result = original.apply(this, arguments);
      state.navs.push(kind);
      return result;
    };
  }
  window.addEventListener('popstate', () => state.navs.push('pop'));

  // attribute changes can show or hide the reset control without touching structure
  new MutationObserver(() => { state.mutations++; })
    .observe(document.documentElement, {
      subtree: true,
      childList: true,
      attributes: true,
      attributeFilter: ['class', 'style', 'hidden', 'aria-hidden'],
    });

  return JSON.stringify({ installed: true, platform: navigator.platform || '' });
})()
"#;

/// Hands over and clears everything queued since the last drain. The focus
/// elements of drained keys stay behind for the next snapshot to resolve.
const DRAIN_JS: &str = r#"
(() => {
  const s = window.__resetHotkey;
  if (!s) return JSON.stringify(null);
  const out = { keys: s.keys.map(k => k.info), navs: s.navs, mutations: s.mutations };
  s.focus = s.keys.map(k => k.focus);
  s.keys = [];
  s.navs = [];
  s.mutations = 0;
  return JSON.stringify(out);
})()
"#;

/// Result of installing the bridge.
#[derive(Debug, Deserialize)]
pub struct Installed {
    /// False if the document already had a bridge.
    pub installed: bool,
    /// `navigator.platform`
    pub platform: String,
}

#[derive(Debug, Deserialize)]
struct RawKey {
    key: String,
    code: String,
    #[serde(flatten)]
    modifiers: Modifiers,
}

#[derive(Debug, Deserialize)]
struct RawDrain {
    keys: Vec<RawKey>,
    navs: Vec<NavigationKind>,
    mutations: u64,
}

/// Everything the page reported since the previous drain.
#[derive(Debug, Default)]
pub struct Drained {
    /// Keystrokes in dispatch order, focus not yet resolved.
    pub keys: Vec<HotkeyEvent>,
    pub navigations: Vec<NavigationKind>,
    /// DOM changes observed.
    pub mutations: u64,
}

impl Drained {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.navigations.is_empty() && self.mutations == 0
    }
}

/// Install the bridge on the current document.
pub async fn install(page: &Page) -> Result<Installed> {
    let json: String = page.evaluate(INSTALL_JS).await?;
    parse_installed(&json)
}

/// Drain the bridge. `None` means the document has no bridge, i.e. the
/// page was replaced by a full navigation.
pub async fn drain(page: &Page) -> Result<Option<Drained>> {
    let json: String = page.evaluate(DRAIN_JS).await?;
    parse_drain(&json)
}

/// Publish whether the hotkey should be suppressed in-page.
pub async fn publish_armed(page: &Page, armed: bool) -> Result<()> {
    page.execute(&format!(
        "if (window.__resetHotkey) window.__resetHotkey.armed = {};",
        armed
    ))
    .await?;
    Ok(())
}

fn parse_installed(json: &str) -> Result<Installed> {
    serde_json::from_str(json)
        .map_err(|e| Error::Bridge(format!("failed to parse install result: {}", e)))
}

fn parse_drain(json: &str) -> Result<Option<Drained>> {
    let raw: Option<RawDrain> = serde_json::from_str(json)
        .map_err(|e| Error::Bridge(format!("failed to parse drain result: {}", e)))?;
    Ok(raw.map(|raw| Drained {
        keys: raw
            .keys
            .into_iter()
            .map(|k| HotkeyEvent::new(k.key, k.code, k.modifiers))
            .collect(),
        navigations: raw.navs,
        mutations: raw.mutations,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_script_guards_reinstall() {
        assert!(INSTALL_JS.contains("if (window.__resetHotkey)"));
        assert!(INSTALL_JS.contains("addEventListener('keydown'"));
        // capturing listener
        assert!(INSTALL_JS.contains("}, true);"));
        assert!(INSTALL_JS.contains("stopImmediatePropagation"));
    }

    #[test]
    fn install_script_counts_visibility_changes() {
        assert!(INSTALL_JS.contains("childList: true"));
        assert!(INSTALL_JS.contains("attributes: true"));
        for attr in ["'class'", "'style'", "'hidden'", "'aria-hidden'"] {
            assert!(INSTALL_JS.contains(attr), "missing {attr}");
        }
    }

    #[test]
    fn parse_install() {
        let i = parse_installed(r#"{"installed":true,"platform":"MacIntel"}"#).unwrap();
        assert!(i.installed);
        assert_eq!(i.platform, "MacIntel");
        assert!(matches!(parse_installed("{}"), Err(Error::Bridge(_))));
    }

    #[test]
    fn parse_missing_bridge() {
        assert!(parse_drain("null").unwrap().is_none());
    }

    #[test]
    fn parse_drained_events() {
        let json = r#"{
            "keys": [
                {"key": "\\", "code": "Backslash", "meta": true, "ctrl": false, "shift": false, "alt": false},
                {"key": "c", "code": "KeyC", "meta": false, "ctrl": true, "shift": false, "alt": false}
            ],
            "navs": ["push", "pop", "replace"],
            "mutations": 12
        }"#;
        let d = parse_drain(json).unwrap().unwrap();
        assert!(!d.is_empty());
        assert_eq!(d.keys.len(), 2);
        assert_eq!(d.keys[0].code, "Backslash");
        assert_eq!(d.keys[0].modifiers, Modifiers::META);
        assert!(d.keys[1].modifiers.ctrl);
        assert_eq!(d.keys[0].focused, None);
        assert_eq!(
            d.navigations,
            vec![NavigationKind::Push, NavigationKind::Pop, NavigationKind::Replace]
        );
        assert_eq!(d.mutations, 12);
    }

    #[test]
    fn empty_drain() {
        let d = parse_drain(r#"{"keys":[],"navs":[],"mutations":0}"#)
            .unwrap()
            .unwrap();
        assert!(d.is_empty());
    }
}
