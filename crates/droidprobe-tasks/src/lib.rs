//! # droidprobe-tasks
//!
//! Page objects for the Tasks.org Android app (`org.tasks`), built on
//! [`droidprobe_core`].
//!
//! Each page wraps a [`BasePage`](base_page::BasePage) bound to one
//! [`AutomationSession`](droidprobe_core::session::AutomationSession). Lookups
//! used right before an action wait up to 15 s and fail with
//! [`PageError::NotFound`](base_page::PageError::NotFound); visibility checks
//! wait up to 10 s and answer `false` instead of failing.
//!
//! - [`home_page`] - task list, FAB, search and sort, drawer toggle
//! - [`task_page`] - task editor
//! - [`sidebar_page`] - navigation drawer
//!
//! The end-to-end suite lives in `tests/app_suite.rs` and needs a running
//! Appium server and emulator:
//!
//! ```text
//! cargo test -p droidprobe-tasks --test app_suite -- --ignored --test-threads=1
//! ```

pub mod base_page;
pub mod home_page;
pub mod sidebar_page;
pub mod task_page;

#[cfg(test)]
mod fake_app;

pub use base_page::{BasePage, PageError};
pub use home_page::HomePage;
pub use sidebar_page::SidebarPage;
pub use task_page::TaskPage;
