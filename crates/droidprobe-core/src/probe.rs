//! Bounded visibility and existence queries.
//!
//! A [`StateProbe`] polls the session for an element until it shows up or a
//! timeout elapses. Absence is an ordinary answer here:
//!
//! - [`is_visible`](StateProbe::is_visible) and [`probe`](StateProbe::probe)
//!   never fail; every driver error during polling counts as "not there yet".
//! - [`find`](StateProbe::find) and [`find_any`](StateProbe::find_any) are for
//!   call sites about to act on the element, and report [`NotFoundError`]
//!   when the timeout elapses.
//!
//! Polling runs with the session's implicit wait suspended, so the timeout
//! passed here is the only wait that applies.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::driver::DriverError;
use crate::element::ElementHandle;
use crate::locator::{Locator, LocatorChain};
use crate::session::AutomationSession;

/// Default pause between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// An action-oriented lookup timed out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("element {locator} not found after {}ms", waited.as_millis())]
pub struct NotFoundError {
    /// Rendered locator (or chain) that was searched for.
    pub locator: String,
    /// Time spent polling.
    pub waited: Duration,
    /// The last driver error seen while polling, if any.
    pub last_error: Option<String>,
}

/// Outcome of a visibility probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub visible: bool,
    /// Time consumed by the probe.
    #[serde(with = "crate::config::duration_ms")]
    pub waited: Duration,
}

/// Polling queries bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct StateProbe<'a> {
    session: &'a AutomationSession,
    poll_interval: Duration,
}

impl<'a> StateProbe<'a> {
    pub fn new(session: &'a AutomationSession) -> Self {
        Self {
            session,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Use a different pause between polls. Zero is raised to one millisecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Whether `locator` becomes visible within `timeout`.
    pub async fn is_visible(&self, locator: &Locator, timeout: Duration) -> bool {
        self.probe(locator, timeout).await.visible
    }

    /// Like [`is_visible`](Self::is_visible), also reporting the time spent.
    pub async fn probe(&self, locator: &Locator, timeout: Duration) -> ProbeResult {
        let start = Instant::now();
        let found = self.poll(std::slice::from_ref(locator), timeout).await;
        let result = ProbeResult {
            visible: found.is_ok(),
            waited: start.elapsed(),
        };
        debug!(
            locator = %locator,
            visible = result.visible,
            waited_ms = result.waited.as_millis() as u64,
            "probe"
        );
        result
    }

    /// Wait for `locator` to be visible and return its handle.
    pub async fn find(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<ElementHandle, NotFoundError> {
        self.find_in(std::slice::from_ref(locator), locator.to_string(), timeout)
            .await
    }

    /// Wait until any locator of `chain` is visible. Earlier locators win
    /// within a poll.
    pub async fn find_any(
        &self,
        chain: &LocatorChain,
        timeout: Duration,
    ) -> Result<ElementHandle, NotFoundError> {
        let locators: Vec<Locator> = chain.iter().cloned().collect();
        self.find_in(&locators, chain.to_string(), timeout).await
    }

    async fn find_in(
        &self,
        locators: &[Locator],
        rendered: String,
        timeout: Duration,
    ) -> Result<ElementHandle, NotFoundError> {
        let start = Instant::now();
        self.poll(locators, timeout)
            .await
            .map_err(|last_error| NotFoundError {
                locator: rendered,
                waited: start.elapsed(),
                last_error: last_error.map(|e| e.to_string()),
            })
    }

    /// Poll until one of `locators` is displayed or `timeout` elapses.
    ///
    /// Every attempt is cut off at the deadline, so a backend that blocks
    /// (a stuck request, an implicit wait that could not be suspended)
    /// cannot stretch the wait. The error side carries the last driver
    /// error seen.
    async fn poll(
        &self,
        locators: &[Locator],
        timeout: Duration,
    ) -> Result<ElementHandle, Option<DriverError>> {
        self.session
            .without_implicit_wait(move |_| async move {
                let start = Instant::now();
                let mut last_error = None;
                loop {
                    for locator in locators {
                        let remaining = timeout.saturating_sub(start.elapsed());
                        match tokio::time::timeout(remaining, self.attempt(locator)).await {
                            Ok(Ok(Some(element))) => return Ok(element),
                            Ok(Ok(None)) => {}
                            Ok(Err(e)) => {
                                trace!(locator = %locator, error = %e, "probe attempt failed");
                                last_error = Some(e);
                            }
                            Err(_) => {
                                trace!(locator = %locator, "probe attempt cut off at deadline");
                                last_error = Some(DriverError::Timeout);
                            }
                        }
                    }
                    let elapsed = start.elapsed();
                    if elapsed >= timeout {
                        return Err(last_error);
                    }
                    tokio::time::sleep(self.poll_interval.min(timeout - elapsed)).await;
                }
            })
            .await
    }

    async fn attempt(&self, locator: &Locator) -> Result<Option<ElementHandle>, DriverError> {
        let driver = self.session.driver();
        let element = match driver.find_element(locator).await {
            Ok(element) => element,
            Err(e) if e.is_absence() => return Ok(None),
            Err(e) => return Err(e),
        };
        match driver.is_displayed(&element).await {
            Ok(true) => Ok(Some(element)),
            Ok(false) => Ok(None),
            Err(e) if e.is_absence() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
