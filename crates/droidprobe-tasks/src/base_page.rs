//! Actions and queries shared by every page object.

use std::sync::Arc;
use std::time::Duration;

use droidprobe_core::driver::DriverError;
use droidprobe_core::element::ElementHandle;
use droidprobe_core::locator::Locator;
use droidprobe_core::probe::NotFoundError;
use droidprobe_core::session::AutomationSession;
use thiserror::Error;
use tracing::debug;

/// How long action lookups wait for their element.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// How long visibility checks wait before answering `false`.
pub const VISIBILITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised by page actions.
#[derive(Error, Debug)]
pub enum PageError {
    /// The element to act on never showed up.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The element was found but the action failed.
    #[error("action failed: {0}")]
    Driver(#[from] DriverError),
}

/// Common lookups and actions on top of one session.
#[derive(Debug, Clone)]
pub struct BasePage {
    session: Arc<AutomationSession>,
    timeout: Duration,
    visibility_timeout: Duration,
}

impl BasePage {
    pub fn new(session: Arc<AutomationSession>) -> Self {
        Self {
            session,
            timeout: DEFAULT_TIMEOUT,
            visibility_timeout: VISIBILITY_TIMEOUT,
        }
    }

    /// Override both waits, e.g. for slow CI emulators or fast fakes.
    pub fn with_timeouts(mut self, timeout: Duration, visibility_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.visibility_timeout = visibility_timeout;
        self
    }

    pub fn session(&self) -> &Arc<AutomationSession> {
        &self.session
    }

    pub fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }

    // ------------------------------------------------------------------
    // Finders
    // ------------------------------------------------------------------

    /// Wait for a visible element matching `locator`.
    pub async fn find(&self, locator: &Locator) -> Result<ElementHandle, PageError> {
        Ok(self.session.probe().find(locator, self.timeout).await?)
    }

    pub async fn find_by_text(&self, text: &str) -> Result<ElementHandle, PageError> {
        self.find(&Locator::text(text)).await
    }

    pub async fn find_by_accessibility_id(&self, desc: &str) -> Result<ElementHandle, PageError> {
        self.find(&Locator::accessibility_id(desc)).await
    }

    /// The `EditText` showing `hint` while empty.
    pub async fn find_by_hint(&self, hint: &str) -> Result<ElementHandle, PageError> {
        self.find(&Locator::hint(hint)).await
    }

    pub async fn find_by_resource_id(&self, id: &str) -> Result<ElementHandle, PageError> {
        self.find(&Locator::resource_id(id)).await
    }

    // ------------------------------------------------------------------
    // Visibility checks
    // ------------------------------------------------------------------

    /// Whether `locator` becomes visible within `timeout`. Never fails.
    pub async fn is_visible(&self, locator: &Locator, timeout: Duration) -> bool {
        self.session.probe().is_visible(locator, timeout).await
    }

    pub async fn is_text_visible(&self, text: &str) -> bool {
        self.is_visible(&Locator::text(text), self.visibility_timeout)
            .await
    }

    pub async fn is_text_visible_within(&self, text: &str, timeout: Duration) -> bool {
        self.is_visible(&Locator::text(text), timeout).await
    }

    pub async fn is_accessibility_id_visible(&self, desc: &str) -> bool {
        self.is_visible(&Locator::accessibility_id(desc), self.visibility_timeout)
            .await
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    pub async fn click(&self, locator: &Locator) -> Result<(), PageError> {
        let element = self.find(locator).await?;
        self.session.driver().click(&element).await?;
        Ok(())
    }

    pub async fn click_by_text(&self, text: &str) -> Result<(), PageError> {
        self.click(&Locator::text(text)).await
    }

    pub async fn click_by_accessibility_id(&self, desc: &str) -> Result<(), PageError> {
        self.click(&Locator::accessibility_id(desc)).await
    }

    /// Clear the field with `hint` and type `text` into it.
    pub async fn type_into_hint(&self, hint: &str, text: &str) -> Result<(), PageError> {
        let field = self.find_by_hint(hint).await?;
        let driver = self.session.driver();
        driver.clear(&field).await?;
        driver.send_keys(&field, text).await?;
        Ok(())
    }

    /// Press the system Back button.
    pub async fn press_back(&self) -> Result<(), PageError> {
        Ok(self.session.back().await?)
    }

    /// Hide the soft keyboard if it is up. Errors are ignored.
    pub async fn hide_keyboard(&self) {
        let driver = self.session.driver();
        match driver.is_keyboard_shown().await {
            Ok(true) => {
                if let Err(e) = driver.hide_keyboard().await {
                    debug!(error = %e, "could not hide keyboard");
                }
            }
            Ok(false) => {}
            Err(e) => debug!(error = %e, "keyboard state unavailable"),
        }
    }
}
