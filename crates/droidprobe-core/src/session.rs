//! Automation session handle.
//!
//! An [`AutomationSession`] wraps one connected [`AutomationDriver`] together
//! with the configuration it was opened with and the lifecycle bookkeeping the
//! bootstrap needs:
//!
//! - the current implicit wait, so callers can suspend and restore it
//! - the [`Phase`] of the per-test state machine
//! - whether the session was already released
//!
//! Sessions are owned by the fixture that opened them and released with
//! [`close`](AutomationSession::close), which is idempotent and never fails.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::capabilities::Capabilities;
use crate::driver::{AutomationDriver, Connector, DriverError};
use crate::element::ElementHandle;
use crate::locator::Locator;
use crate::probe::StateProbe;

/// Failure to establish a session. Never retried locally.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Nothing answered at the endpoint.
    #[error("automation endpoint {endpoint} is unreachable: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: DriverError,
    },

    /// The endpoint answered but refused the session.
    #[error("automation endpoint {endpoint} rejected the session: {source}")]
    Rejected {
        endpoint: String,
        #[source]
        source: DriverError,
    },
}

impl ConnectionError {
    fn from_driver(endpoint: &str, source: DriverError) -> Self {
        let endpoint = endpoint.to_string();
        match source {
            DriverError::Unreachable(_) | DriverError::Http(_) | DriverError::Timeout => {
                ConnectionError::Unreachable { endpoint, source }
            }
            other => ConnectionError::Rejected {
                endpoint,
                source: other,
            },
        }
    }
}

/// Where a session is in the per-test lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Connected, UI state unknown.
    Connected,
    /// Clearing onboarding and permission UI.
    Dismissing,
    /// Restarting the app.
    Resetting,
    /// On the home screen, ready for a test body.
    Home,
    /// Released.
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Connected => "connected",
            Phase::Dismissing => "dismissing",
            Phase::Resetting => "resetting",
            Phase::Home => "home",
            Phase::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// One remote automation session.
pub struct AutomationSession {
    endpoint: String,
    capabilities: Capabilities,
    driver: Arc<dyn AutomationDriver>,
    implicit_wait_ms: AtomicU64,
    phase: Mutex<Phase>,
    closed: AtomicBool,
}

impl AutomationSession {
    /// Open a session through `connector`.
    pub async fn connect(
        connector: &dyn Connector,
        endpoint: &str,
        capabilities: &Capabilities,
    ) -> Result<Self, ConnectionError> {
        let span = info_span!("session_connect", endpoint = %endpoint);
        async {
            let driver = connector
                .connect(endpoint, capabilities)
                .await
                .map_err(|e| ConnectionError::from_driver(endpoint, e))?;
            info!(session_id = driver.session_id(), "session opened");
            Ok(Self::from_driver(driver, endpoint, capabilities.clone()))
        }
        .instrument(span)
        .await
    }

    /// Wrap an already connected driver.
    pub fn from_driver(
        driver: Arc<dyn AutomationDriver>,
        endpoint: impl Into<String>,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            capabilities,
            driver,
            implicit_wait_ms: AtomicU64::new(0),
            phase: Mutex::new(Phase::Connected),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        self.driver.session_id()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// The underlying driver, for direct action calls.
    pub fn driver(&self) -> &Arc<dyn AutomationDriver> {
        &self.driver
    }

    /// The implicit wait last applied through this handle.
    pub fn implicit_wait(&self) -> Duration {
        Duration::from_millis(self.implicit_wait_ms.load(Ordering::SeqCst))
    }

    /// Apply an implicit wait and remember it.
    pub async fn set_implicit_wait(&self, wait: Duration) -> Result<(), DriverError> {
        self.driver.set_implicit_wait(wait).await?;
        self.implicit_wait_ms
            .store(wait.as_millis() as u64, Ordering::SeqCst);
        Ok(())
    }

    /// Run `f` with the implicit wait set to zero, restoring it afterwards.
    ///
    /// `f` is told whether the wait is actually zero. When the server refuses
    /// the change, lookups inside `f` block for the old wait on every miss.
    pub(crate) async fn without_implicit_wait<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce(bool) -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let previous = self.implicit_wait();
        let suspended = previous.is_zero()
            || match self.set_implicit_wait(Duration::ZERO).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, wait_ms = previous.as_millis() as u64, "could not suspend implicit wait");
                    false
                }
            };
        let result = f(suspended).await;
        if suspended && !previous.is_zero() {
            if let Err(e) = self.set_implicit_wait(previous).await {
                debug!(error = %e, "could not restore implicit wait");
            }
        }
        result
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        let mut current = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        let from = *current;
        if from != Phase::Closed {
            debug!(from = %from, to = %phase, "session phase");
            *current = phase;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// A visibility/existence probe bound to this session.
    pub fn probe(&self) -> StateProbe<'_> {
        StateProbe::new(self)
    }

    /// Look an element up once, honoring the implicit wait.
    pub async fn find_element(&self, locator: &Locator) -> Result<ElementHandle, DriverError> {
        self.driver.find_element(locator).await
    }

    /// Look an element up and click it.
    pub async fn click(&self, locator: &Locator) -> Result<(), DriverError> {
        let element = self.driver.find_element(locator).await?;
        self.driver.click(&element).await
    }

    /// Press the system Back button.
    pub async fn back(&self) -> Result<(), DriverError> {
        self.driver.back().await
    }

    /// Release the remote session.
    ///
    /// Safe to call any number of times; only the first call talks to the
    /// server, and its errors (session already gone, server down) are logged
    /// and dropped.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.set_phase_closed();
        match self.driver.quit().await {
            Ok(()) => info!(session_id = self.id(), "session closed"),
            Err(e) => debug!(session_id = self.id(), error = %e, "ignoring error while closing session"),
        }
    }

    fn set_phase_closed(&self) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = Phase::Closed;
    }
}

impl Drop for AutomationSession {
    fn drop(&mut self) {
        if self.is_closed() {
            return;
        }
        warn!(session_id = self.id(), "session dropped without close; releasing in background");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let driver = self.driver.clone();
            handle.spawn(async move {
                let _ = driver.quit().await;
            });
        }
    }
}

impl fmt::Debug for AutomationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutomationSession")
            .field("id", &self.id())
            .field("endpoint", &self.endpoint)
            .field("app_package", &self.capabilities.app_package)
            .field("implicit_wait", &self.implicit_wait())
            .field("phase", &self.phase())
            .field("closed", &self.is_closed())
            .finish()
    }
}
