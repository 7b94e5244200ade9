//! Per-test session bootstrap.
//!
//! [`SessionBootstrap`] owns the suite configuration and a [`Connector`] and
//! takes a test from "no session" to "app on its home screen":
//!
//! ```text
//! open ─► (dismiss transient UI) ─► reset_to_home ─► test body ─► close
//! ```
//!
//! [`run`](SessionBootstrap::run) wraps the whole sequence and releases the
//! session on every exit path, including a panicking test body.
//!
//! # Example
//!
//! ```no_run
//! use droidprobe_core::bootstrap::SessionBootstrap;
//! use droidprobe_core::config::SuiteConfig;
//! use droidprobe_core::locator::Locator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let bootstrap = SessionBootstrap::remote(SuiteConfig::load()?)?;
//! let title_visible = bootstrap
//!     .run(|session| async move {
//!         session
//!             .probe()
//!             .is_visible(&Locator::text("My Tasks"), std::time::Duration::from_secs(10))
//!             .await
//!     })
//!     .await?;
//! assert!(title_visible);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::SuiteConfig;
use crate::dismissal::{self, BootstrapOutcome, DismissalTable};
use crate::driver::{Connector, DriverError};
use crate::session::{AutomationSession, ConnectionError, Phase};
use crate::webdriver::RemoteConnector;

/// Errors that keep a test from reaching its home screen.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// The HTTP client for the automation server could not be built.
    #[error("failed to build automation client: {0}")]
    Client(#[source] DriverError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The session opened but could not be configured.
    #[error("failed to configure session: {0}")]
    Configure(#[source] DriverError),

    /// The app could not be brought back to the foreground.
    #[error("failed to reset app to home screen: {0}")]
    Reset(#[source] DriverError),
}

/// Opens, prepares and releases automation sessions for one suite.
pub struct SessionBootstrap {
    connector: Arc<dyn Connector>,
    config: SuiteConfig,
}

impl SessionBootstrap {
    pub fn new(connector: Arc<dyn Connector>, config: SuiteConfig) -> Self {
        Self { connector, config }
    }

    /// Bootstrap against a real automation server at `config.endpoint`.
    pub fn remote(config: SuiteConfig) -> Result<Self, BootstrapError> {
        let connector = RemoteConnector::new().map_err(BootstrapError::Client)?;
        Ok(Self::new(Arc::new(connector), config))
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Open a session and apply the configured implicit wait.
    ///
    /// Connection failures are returned as-is and never retried here.
    pub async fn open(&self) -> Result<Arc<AutomationSession>, BootstrapError> {
        let session = AutomationSession::connect(
            self.connector.as_ref(),
            &self.config.endpoint,
            &self.config.capabilities,
        )
        .await?;
        let session = Arc::new(session);
        if let Err(e) = session.set_implicit_wait(self.config.implicit_wait()).await {
            session.close().await;
            return Err(BootstrapError::Configure(e));
        }
        Ok(session)
    }

    /// Clear onboarding and permission UI with the configured policy.
    pub async fn dismiss_transient_ui(
        &self,
        session: &AutomationSession,
        table: &DismissalTable,
    ) -> BootstrapOutcome {
        dismissal::dismiss_transient_ui(session, table, &self.config.dismissal).await
    }

    /// Terminate the app and launch it cold, so it opens on its home screen
    /// whatever state the previous test left behind.
    ///
    /// A failed terminate (app not running, already gone) is ignored; a
    /// failed activation is not, since the test body would run against the
    /// launcher.
    pub async fn reset_to_home(
        &self,
        session: &AutomationSession,
        app_id: &str,
    ) -> Result<(), DriverError> {
        let span = info_span!("reset_to_home", session_id = session.id(), app_id = %app_id);
        async {
            let timing = &self.config.timing;
            session.set_phase(Phase::Resetting);
            tokio::time::sleep(timing.pre_reset_delay).await;

            match session.driver().terminate_app(app_id).await {
                Ok(was_running) => debug!(was_running, "app terminated"),
                Err(e) => debug!(error = %e, "ignoring terminate failure"),
            }
            tokio::time::sleep(timing.terminate_settle).await;

            session.driver().activate_app(app_id).await?;
            tokio::time::sleep(self.config.activate_settle()).await;

            session.set_phase(Phase::Home);
            info!("app reset to home screen");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Release a session. Never fails.
    pub async fn close(&self, session: &AutomationSession) {
        session.close().await;
    }

    /// Open a session and reset the app, releasing the session if the reset
    /// fails.
    pub async fn prepare(&self) -> Result<Arc<AutomationSession>, BootstrapError> {
        let session = self.open().await?;
        if let Err(e) = self.reset_to_home(&session, self.config.app_id()).await {
            session.close().await;
            return Err(BootstrapError::Reset(e));
        }
        Ok(session)
    }

    /// Run `body` against a freshly prepared session.
    ///
    /// The session is closed after `body` completes, returns an error, or
    /// panics; a panic is then resumed on the caller.
    pub async fn run<F, Fut, T>(&self, body: F) -> Result<T, BootstrapError>
    where
        F: FnOnce(Arc<AutomationSession>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let session = self.prepare().await?;
        let outcome = tokio::spawn(body(session.clone())).await;
        session.close().await;
        match outcome {
            Ok(value) => Ok(value),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!(error = %e, "test body was cancelled");
                std::panic::resume_unwind(Box::new(e.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for SessionBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBootstrap")
            .field("endpoint", &self.config.endpoint)
            .field("ci", &self.config.ci)
            .finish_non_exhaustive()
    }
}
