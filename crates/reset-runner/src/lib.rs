//! # reset-runner
//!
//! Runs the reset hotkey helper against a live Chrome page. A small bridge
//! script inside the page records keystrokes, navigations and DOM changes;
//! the driver drains it on a short poll, feeds everything to
//! [`reset_hotkey::ResetHelper`], and applies the resulting clicks and toast
//! updates over CDP.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use reset_runner::{Config, Driver};
//!
//! # #[tokio::main]
//! # async fn main() -> reset_runner::Result<()> {
//! let config = Config::load("leetcode.yaml")?;
//! let mut driver = Driver::launch(&config).await?;
//! driver.run().await?;
//! driver.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod bridge;
mod config;
mod driver;
pub mod snapshot;

pub use config::{BrowserConfig, Config, PlatformSetting, TargetUrl, Viewport};
pub use driver::{Driver, TickReport};

/// Result type for reset-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading config or driving the page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("bridge error: {0}")]
    Bridge(String),

    #[error(transparent)]
    Core(#[from] reset_hotkey::Error),
}
