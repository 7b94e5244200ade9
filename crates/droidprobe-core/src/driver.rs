//! Automation driver trait for backend-agnostic UI automation.
//!
//! This module defines the [`AutomationDriver`] trait, the capability the rest
//! of the crate consumes from a remote automation server: find an element,
//! act on it, query it, and control the target app. A [`Connector`] creates
//! drivers, one per remote session.
//!
//! The production backend is [`RemoteConnector`](crate::webdriver::RemoteConnector),
//! which speaks W3C WebDriver with the Appium extensions. Tests use the
//! scripted fake in [`testing`](crate::testing).
//!
//! # Example
//!
//! ```no_run
//! use droidprobe_core::capabilities::Capabilities;
//! use droidprobe_core::driver::Connector;
//! use droidprobe_core::locator::Locator;
//! use droidprobe_core::webdriver::RemoteConnector;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = RemoteConnector::new()?;
//! let driver = connector
//!     .connect("http://127.0.0.1:4723", &Capabilities::default())
//!     .await?;
//! let fab = driver.find_element(&Locator::accessibility_id("Create new task")).await?;
//! driver.click(&fab).await?;
//! driver.quit().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::capabilities::Capabilities;
use crate::element::{ElementHandle, ScreenSize};
use crate::locator::Locator;

/// Errors that can occur during automation driver operations.
///
/// This enum unifies errors from all backends behind a single type. The
/// element-level variants ([`NoSuchElement`](Self::NoSuchElement),
/// [`StaleElement`](Self::StaleElement)) describe absence, which callers
/// usually treat as an ordinary outcome rather than a failure.
#[derive(Error, Debug)]
pub enum DriverError {
    /// The automation endpoint could not be reached at all.
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    /// The endpoint refused to create a session with the requested capabilities.
    #[error("Session not created: {0}")]
    SessionNotCreated(String),

    /// The session no longer exists on the server.
    #[error("Invalid session: {0}")]
    InvalidSession(String),

    /// No element matched the locator.
    #[error("No such element: {0}")]
    NoSuchElement(String),

    /// The element reference is no longer attached to the UI.
    #[error("Stale element reference: {0}")]
    StaleElement(String),

    /// The backend could not interpret the locator.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A command failed with the given message.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// An operation timed out.
    #[error("Operation timed out")]
    Timeout,

    /// The backend does not implement this command.
    #[error("{0} not supported by this backend")]
    Unsupported(&'static str),

    /// An HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse a response body.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

impl DriverError {
    /// True for errors that only mean "the element is not there right now".
    pub fn is_absence(&self) -> bool {
        matches!(
            self,
            DriverError::NoSuchElement(_) | DriverError::StaleElement(_)
        )
    }

    /// True when the session itself is gone, so further commands are pointless.
    pub fn is_session_gone(&self) -> bool {
        matches!(
            self,
            DriverError::InvalidSession(_) | DriverError::Unreachable(_)
        )
    }
}

/// Trait for backend-agnostic Android UI automation.
///
/// One driver instance is bound to exactly one remote session. All element
/// methods take a handle previously returned by
/// [`find_element`](AutomationDriver::find_element) on the same driver.
///
/// Implementations are not expected to be safe for concurrent use against
/// the same session; callers serialize access.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// The remote session identifier.
    fn session_id(&self) -> &str;

    /// Find the first element matching `locator`.
    ///
    /// Returns [`DriverError::NoSuchElement`] when nothing matches within the
    /// session's implicit wait.
    async fn find_element(&self, locator: &Locator) -> Result<ElementHandle, DriverError>;

    /// Click (tap) an element.
    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError>;

    /// Clear an editable element.
    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError>;

    /// Type text into an element.
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError>;

    /// Whether the element is currently displayed.
    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError>;

    /// Press the system Back button.
    async fn back(&self) -> Result<(), DriverError>;

    /// Stop the app process.
    ///
    /// Returns `false` when the app was not running.
    async fn terminate_app(&self, app_id: &str) -> Result<bool, DriverError>;

    /// Bring the app to the foreground, launching it if needed.
    async fn activate_app(&self, app_id: &str) -> Result<(), DriverError>;

    /// Set how long element lookups block before reporting absence.
    async fn set_implicit_wait(&self, wait: Duration) -> Result<(), DriverError>;

    /// The current screen (window) size.
    async fn screen_size(&self) -> Result<ScreenSize, DriverError>;

    /// Tap at absolute screen coordinates.
    async fn tap(&self, x: i32, y: i32) -> Result<(), DriverError>;

    /// Whether the soft keyboard is showing.
    ///
    /// The default implementation reports that it is not.
    async fn is_keyboard_shown(&self) -> Result<bool, DriverError> {
        Ok(false)
    }

    /// Hide the soft keyboard.
    async fn hide_keyboard(&self) -> Result<(), DriverError> {
        Err(DriverError::Unsupported("hide_keyboard"))
    }

    /// The foreground activity name.
    async fn current_activity(&self) -> Result<String, DriverError> {
        Err(DriverError::Unsupported("current_activity"))
    }

    /// The UI hierarchy as XML.
    async fn page_source(&self) -> Result<String, DriverError> {
        Err(DriverError::Unsupported("page_source"))
    }

    /// End the remote session.
    async fn quit(&self) -> Result<(), DriverError>;
}

/// Creates drivers bound to new remote sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a session on `endpoint` with the given capabilities.
    async fn connect(
        &self,
        endpoint: &str,
        capabilities: &Capabilities,
    ) -> Result<Arc<dyn AutomationDriver>, DriverError>;
}
