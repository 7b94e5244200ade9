//! Once-per-process warm-up.
//!
//! On a freshly booted CI emulator the first launch of the app is slow and
//! may still show onboarding. [`WarmUp`] opens one throwaway session before
//! any test session, gives the app time to render, logs where it landed,
//! clears transient UI, and closes the session again.
//!
//! The warm-up runs at most once per [`WarmUp`] value, is skipped outside CI,
//! and never fails: whatever goes wrong is logged and recorded in the
//! [`WarmUpReport`] so that tests still run and recover through their own
//! per-test reset.

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::bootstrap::SessionBootstrap;
use crate::dismissal::{BootstrapOutcome, DismissalTable};
use crate::session::AutomationSession;

/// Page source characters logged for diagnosis.
const PAGE_SOURCE_EXCERPT: usize = 2000;

/// What the warm-up did. Steps that failed leave their field empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarmUpReport {
    /// Not in CI, nothing was done.
    pub skipped: bool,
    /// Foreground activity once the app had rendered.
    pub initial_activity: Option<String>,
    /// Foreground activity after dismissal.
    pub final_activity: Option<String>,
    pub outcome: Option<BootstrapOutcome>,
    /// Why no session could be opened, if so.
    pub error: Option<String>,
}

impl WarmUpReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            initial_activity: None,
            final_activity: None,
            outcome: None,
            error: None,
        }
    }

    fn empty() -> Self {
        Self {
            skipped: false,
            ..Self::skipped()
        }
    }
}

/// Init-once warm-up guard, usually held in a `static`.
///
/// ```no_run
/// use droidprobe_core::bootstrap::SessionBootstrap;
/// use droidprobe_core::config::SuiteConfig;
/// use droidprobe_core::warm_up::WarmUp;
///
/// static WARM_UP: WarmUp = WarmUp::new();
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bootstrap = SessionBootstrap::remote(SuiteConfig::load()?)?;
/// WARM_UP.ensure(&bootstrap).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct WarmUp {
    report: OnceCell<WarmUpReport>,
}

impl WarmUp {
    pub const fn new() -> Self {
        Self {
            report: OnceCell::const_new(),
        }
    }

    /// Run the warm-up if it has not run yet and return its report.
    ///
    /// Concurrent callers wait for the single run in progress.
    pub async fn ensure(&self, bootstrap: &SessionBootstrap) -> &WarmUpReport {
        self.report
            .get_or_init(|| async {
                if !bootstrap.config().ci {
                    debug!("not running in CI, skipping warm-up");
                    return WarmUpReport::skipped();
                }
                run(bootstrap).await
            })
            .await
    }

    /// Run the warm-up even outside CI, if it has not run yet.
    pub async fn force(&self, bootstrap: &SessionBootstrap) -> &WarmUpReport {
        self.report.get_or_init(|| run(bootstrap)).await
    }

    /// The report, once the warm-up has finished.
    pub fn report(&self) -> Option<&WarmUpReport> {
        self.report.get()
    }
}

async fn run(bootstrap: &SessionBootstrap) -> WarmUpReport {
    let span = info_span!("warm_up", endpoint = %bootstrap.config().endpoint);
    async {
        let timing = &bootstrap.config().timing;
        info!("warming up app on a fresh session");
        let mut report = WarmUpReport::empty();

        match bootstrap.open().await {
            Ok(session) => {
                warm_session(bootstrap, &session, &mut report).await;
                bootstrap.close(&session).await;
            }
            Err(e) => {
                warn!(error = %e, "warm-up could not open a session");
                report.error = Some(e.to_string());
            }
        }

        tokio::time::sleep(timing.warm_up_cooldown).await;
        info!(
            home = ?report.outcome.as_ref().map(BootstrapOutcome::is_home),
            "warm-up done"
        );
        report
    }
    .instrument(span)
    .await
}

async fn warm_session(
    bootstrap: &SessionBootstrap,
    session: &AutomationSession,
    report: &mut WarmUpReport,
) {
    let timing = &bootstrap.config().timing;
    debug!(wait_ms = timing.warm_up_render.as_millis() as u64, "waiting for first render");
    tokio::time::sleep(timing.warm_up_render).await;

    report.initial_activity = current_activity(session).await;
    match session.driver().page_source().await {
        Ok(source) => {
            let excerpt: String = source.chars().take(PAGE_SOURCE_EXCERPT).collect();
            debug!(page_source = %excerpt, "page source excerpt");
        }
        Err(e) => debug!(error = %e, "page source unavailable"),
    }

    let outcome = bootstrap
        .dismiss_transient_ui(session, &DismissalTable::tasks_default())
        .await;
    report.outcome = Some(outcome);

    tokio::time::sleep(timing.warm_up_post_dismiss).await;
    report.final_activity = current_activity(session).await;
}

async fn current_activity(session: &AutomationSession) -> Option<String> {
    match session.driver().current_activity().await {
        Ok(activity) => {
            info!(activity = %activity, "current activity");
            Some(activity)
        }
        Err(e) => {
            debug!(error = %e, "current activity unavailable");
            None
        }
    }
}
