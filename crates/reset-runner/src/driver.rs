use crate::actions::CommandBuffer;
use crate::bridge::{self, Drained};
use crate::config::{Config, PlatformSetting};
use crate::snapshot::{self, Capture};
use crate::Result;
use eoka::{Browser, Page};
use reset_hotkey::{Disposition, ResetHelper};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What one poll did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Keystrokes drained from the page.
    pub keys: usize,
    /// Keystrokes the helper consumed.
    pub consumed: usize,
    /// Timer tasks that ran.
    pub tasks: usize,
    /// Whether a snapshot was taken.
    pub captured: bool,
    /// Whether the bridge had to be reinstalled.
    pub reinstalled: bool,
}

/// Drives a [`ResetHelper`] against one Chrome page.
pub struct Driver {
    browser: Browser,
    page: Page,
    helper: ResetHelper,
    platform: PlatformSetting,
    commands: CommandBuffer,
    started: Instant,
    poll: Duration,
    armed: Option<bool>,
}

impl Driver {
    /// Launch Chrome, open the target and attach the helper.
    pub async fn launch(config: &Config) -> Result<Self> {
        let browser_config = &config.browser;
        let stealth = eoka::StealthConfig {
            headless: browser_config.headless,
            proxy: browser_config.proxy.clone(),
            user_agent: browser_config.user_agent.clone(),
            viewport_width: browser_config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: browser_config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            browser_config.headless, browser_config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        info!("Navigating to: {}", config.target.url);
        page.goto(&config.target.url).await?;

        let installed = bridge::install(&page).await?;
        let platform = config.platform.resolve(&installed.platform);
        info!(?platform, navigator = %installed.platform, "bridge installed");

        let mut driver = Self {
            browser,
            page,
            helper: ResetHelper::new(platform),
            platform: config.platform,
            commands: CommandBuffer::new(),
            started: Instant::now(),
            poll: Duration::from_millis(config.poll_ms),
            armed: None,
        };
        let capture = snapshot::capture(&driver.page).await?;
        let outcome = driver.helper.init(&capture.snapshot);
        debug!(?outcome, "helper initialised");
        driver.publish_armed(&capture).await;
        Ok(driver)
    }

    /// The page being driven.
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn helper(&self) -> &ResetHelper {
        &self.helper
    }

    /// Time since launch, the helper's clock.
    pub fn now(&self) -> Duration {
        self.started.elapsed()
    }

    /// Poll the page once.
    pub async fn tick(&mut self) -> Result<TickReport> {
        let mut report = TickReport::default();

        let drained = match bridge::drain(&self.page).await? {
            Some(drained) => drained,
            None => {
                // document was replaced; the old bridge went with it
                let installed = bridge::install(&self.page).await?;
                debug!(installed = installed.installed, "bridge reinstalled");
                // a new document is not in editor view until it says so
                self.helper.reset(self.platform.resolve(&installed.platform));
                report.reinstalled = true;
                self.armed = None;
                Drained::default()
            }
        };
        report.keys = drained.keys.len();

        let now = self.now();
        let due = self.helper.next_deadline().is_some_and(|d| d <= now);
        if drained.is_empty() && !due && !report.reinstalled && self.armed.is_some() {
            return Ok(report);
        }

        let capture = snapshot::capture(&self.page).await?;
        report.captured = true;
        let tree = &capture.snapshot;

        if report.reinstalled {
            let outcome = self.helper.init(tree);
            debug!(?outcome, "helper re-initialised");
        }
        for kind in &drained.navigations {
            debug!(?kind, "client-side navigation");
            self.helper.on_navigation(*kind, now);
        }
        if drained.mutations > 0 {
            self.helper.on_mutation(tree);
        }

        for (i, key) in drained.keys.into_iter().enumerate() {
            let event = match capture.focus_of(i) {
                Some(node) => key.with_focus(node),
                None => key,
            };
            match self.helper.on_key(&event, tree, &mut self.commands, now) {
                Disposition::Consumed => report.consumed += 1,
                Disposition::Ignored(reason) => {
                    debug!(key = %event.key, ?reason, "keystroke ignored")
                }
            }
        }

        report.tasks = self.helper.run_due(now, tree, &mut self.commands);

        if !self.commands.is_empty() {
            let count = self.commands.commands().len();
            let applied = self.commands.flush(&self.page).await;
            debug!("applied {}/{} commands", applied, count);
        }

        self.publish_armed(&capture).await;
        Ok(report)
    }

    /// Poll until Ctrl-C.
    pub async fn run(&mut self) -> Result<()> {
        info!("watching page (poll every {}ms)", self.poll.as_millis());
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted, stopping");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.poll) => {}
            }
            match self.tick().await {
                Ok(report) if report.consumed > 0 => {
                    info!("reset hotkey handled ({} keystroke(s))", report.consumed)
                }
                Ok(_) => {}
                Err(e) => warn!("poll failed: {}", e),
            }
        }
    }

    async fn publish_armed(&mut self, capture: &Capture) {
        let armed = self.helper.armed(&capture.snapshot);
        if self.armed == Some(armed) {
            return;
        }
        match bridge::publish_armed(&self.page, armed).await {
            Ok(()) => {
                debug!(armed, "published hotkey verdict");
                self.armed = Some(armed);
            }
            Err(e) => warn!("failed to publish hotkey verdict: {}", e),
        }
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
