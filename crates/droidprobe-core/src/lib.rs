//! # droidprobe-core
//!
//! Core library for driving an Android app through an Appium server.
//!
//! This crate takes a test from "nothing connected" to "app on its home
//! screen" and back, tolerating whatever the device happens to show in
//! between: first-run onboarding, permission prompts, a screen left over
//! from the previous test.
//!
//! ## Modules
//!
//! - [`driver`] - The [`AutomationDriver`](driver::AutomationDriver) and
//!   [`Connector`](driver::Connector) traits consumed by everything else
//! - [`webdriver`] - W3C WebDriver/Appium HTTP backend
//! - [`locator`] - Element locators and fallback chains
//! - [`capabilities`] - Appium capabilities sent with a new session
//! - [`config`] - Layered suite configuration (defaults, file, environment)
//! - [`session`] - Session handle with phase tracking and idempotent close
//! - [`probe`] - Bounded visibility and existence queries
//! - [`dismissal`] - Onboarding and permission-dialog dismissal
//! - [`bootstrap`] - Per-test open, reset and close
//! - [`warm_up`] - Once-per-process warm-up session
//! - `testing` - Scripted fake device (with the `testing` feature)
//!
//! ## External Dependencies
//!
//! A running Appium 2 server with the UiAutomator2 driver, and an emulator or
//! device with the target app installed (or an `APP_PATH` to install from).
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use droidprobe_core::bootstrap::SessionBootstrap;
//! use droidprobe_core::config::SuiteConfig;
//! use droidprobe_core::dismissal::DismissalTable;
//! use droidprobe_core::locator::Locator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bootstrap = SessionBootstrap::remote(SuiteConfig::load()?)?;
//! let session = bootstrap.open().await?;
//!
//! let outcome = bootstrap
//!     .dismiss_transient_ui(&session, &DismissalTable::tasks_default())
//!     .await;
//! println!("cleared after {} passes", outcome.passes());
//!
//! bootstrap.reset_to_home(&session, "org.tasks").await?;
//! let home = session
//!     .probe()
//!     .is_visible(&Locator::text("My Tasks"), Duration::from_secs(10))
//!     .await;
//! println!("home screen visible: {home}");
//!
//! bootstrap.close(&session).await;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod capabilities;
pub mod config;
pub mod dismissal;
pub mod driver;
pub mod element;
pub mod locator;
pub mod probe;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod warm_up;
pub mod webdriver;
