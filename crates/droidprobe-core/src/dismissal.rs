//! Onboarding and permission-dialog dismissal.
//!
//! A fresh install of the app greets the user with onboarding screens and
//! runtime permission prompts; a warm one may still show a leftover dialog.
//! [`dismiss_transient_ui`] clears whatever is there by scanning an ordered
//! [`DismissalTable`] and acting on the first rule that matches, one pass at a
//! time, until a pass finds nothing or the pass budget runs out.
//!
//! The procedure is best effort. It never returns an error: a lookup that
//! fails, an element that goes stale between find and click, or a dead
//! session all count as "no match" for that rule.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::locator::Locator;
use crate::session::{AutomationSession, Phase};

/// One way of getting rid of a transient element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DismissalRule {
    /// Click the element whose text is exactly `text`.
    Label { text: String },
    /// Click the first element whose text contains `text`.
    Fragment { text: String },
    /// Tap a point given as fractions of the screen size. Only used as a
    /// fallback when no label or fragment matched.
    Coordinate { x: f64, y: f64 },
}

impl DismissalRule {
    pub fn label(text: impl Into<String>) -> Self {
        DismissalRule::Label { text: text.into() }
    }

    pub fn fragment(text: impl Into<String>) -> Self {
        DismissalRule::Fragment { text: text.into() }
    }

    pub fn coordinate(x: f64, y: f64) -> Self {
        DismissalRule::Coordinate { x, y }
    }

    /// The locator clicked for this rule, if it is not a coordinate.
    pub fn locator(&self) -> Option<Locator> {
        match self {
            DismissalRule::Label { text } => Some(Locator::text(text.as_str())),
            DismissalRule::Fragment { text } => Some(Locator::text_contains(text.as_str())),
            DismissalRule::Coordinate { .. } => None,
        }
    }
}

impl fmt::Display for DismissalRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DismissalRule::Label { text } => write!(f, "label '{text}'"),
            DismissalRule::Fragment { text } => write!(f, "fragment '{text}'"),
            DismissalRule::Coordinate { x, y } => write!(f, "tap at ({x:.2}, {y:.2})"),
        }
    }
}

/// Button labels the Tasks.org first-run flow and Android system dialogs are
/// known to use, most likely first.
const TASKS_LABELS: &[&str] = &[
    "Continue without sync",
    "OK",
    "Ok",
    "SKIP",
    "Skip",
    "GET STARTED",
    "Get started",
    "GET IT",
    "Get it",
    "CONTINUE",
    "Continue",
    "DONE",
    "Done",
    "ALLOW",
    "Allow",
    "AGREE",
    "Agree",
    "NEXT",
    "Next",
    "ACCEPT",
    "Accept",
    "BEGIN",
    "Begin",
    "START",
    "Start",
    "CLOSE",
    "Close",
];

/// Ordered, immutable list of dismissal rules.
///
/// Build one with [`tasks_default`](Self::tasks_default) or
/// [`new`](Self::new) and extend it with [`with_rule`](Self::with_rule)
/// before any session exists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DismissalTable(Vec<DismissalRule>);

impl DismissalTable {
    pub fn new(rules: Vec<DismissalRule>) -> Self {
        Self(rules)
    }

    /// The labels seen in the Tasks.org onboarding flow. No coordinate rules.
    pub fn tasks_default() -> Self {
        Self(TASKS_LABELS.iter().map(|l| DismissalRule::label(*l)).collect())
    }

    /// A copy with `rule` appended.
    pub fn with_rule(mut self, rule: DismissalRule) -> Self {
        self.0.push(rule);
        self
    }

    pub fn rules(&self) -> &[DismissalRule] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn clickable(&self) -> impl Iterator<Item = (&DismissalRule, Locator)> {
        self.0.iter().filter_map(|rule| rule.locator().map(|l| (rule, l)))
    }

    fn coordinates(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.0.iter().filter_map(|rule| match rule {
            DismissalRule::Coordinate { x, y } => Some((*x, *y)),
            _ => None,
        })
    }
}

/// Budget and pacing of the dismissal loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DismissalPolicy {
    /// Upper bound on scan passes.
    pub max_passes: u32,
    /// Pause after each click or tap, for the UI to animate.
    #[serde(with = "crate::config::duration_ms")]
    pub settle_delay: Duration,
    /// Pause once the loop ends.
    #[serde(with = "crate::config::duration_ms")]
    pub post_scan_delay: Duration,
    /// Coordinate taps are only tried in passes below this number.
    pub fallback_tap_passes: u32,
    /// When visible, the home screen is up and blind taps are skipped.
    pub home_marker: Option<Locator>,
}

impl Default for DismissalPolicy {
    fn default() -> Self {
        Self {
            max_passes: 5,
            settle_delay: Duration::from_secs(2),
            post_scan_delay: Duration::from_secs(1),
            fallback_tap_passes: 2,
            home_marker: None,
        }
    }
}

impl DismissalPolicy {
    /// Same budget with no pauses, for fakes and paused-clock tests.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            post_scan_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// One action taken by the dismissal loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Dismissal {
    Clicked { pass: u32, rule: DismissalRule },
    Tapped { pass: u32, x: i32, y: i32 },
}

/// Result of [`dismiss_transient_ui`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    /// A pass found nothing to dismiss.
    HomeReached { passes: u32, actions: Vec<Dismissal> },
    /// Every pass acted on something; the UI may still be covered.
    BudgetExhausted { passes: u32, actions: Vec<Dismissal> },
}

impl BootstrapOutcome {
    pub fn passes(&self) -> u32 {
        match self {
            BootstrapOutcome::HomeReached { passes, .. }
            | BootstrapOutcome::BudgetExhausted { passes, .. } => *passes,
        }
    }

    pub fn actions(&self) -> &[Dismissal] {
        match self {
            BootstrapOutcome::HomeReached { actions, .. }
            | BootstrapOutcome::BudgetExhausted { actions, .. } => actions,
        }
    }

    pub fn is_home(&self) -> bool {
        matches!(self, BootstrapOutcome::HomeReached { .. })
    }
}

/// Clear onboarding screens and dialogs covering the app.
///
/// Each pass clicks the first rule whose element is present, then waits
/// [`settle_delay`](DismissalPolicy::settle_delay). When no label or
/// fragment matches, the first coordinate rule is tapped instead, but only
/// during the first [`fallback_tap_passes`](DismissalPolicy::fallback_tap_passes)
/// passes and only while the home marker (if configured) is not visible.
/// A pass that takes no action ends the loop with
/// [`BootstrapOutcome::HomeReached`]; running through
/// [`max_passes`](DismissalPolicy::max_passes) ends it with
/// [`BootstrapOutcome::BudgetExhausted`].
///
/// The session's implicit wait is suspended for the duration, so a rule that
/// does not match costs one round trip. If the server refuses to suspend it,
/// every miss would block for the full wait; the scan is then skipped and
/// reported as [`BootstrapOutcome::BudgetExhausted`] after zero passes.
pub async fn dismiss_transient_ui(
    session: &AutomationSession,
    table: &DismissalTable,
    policy: &DismissalPolicy,
) -> BootstrapOutcome {
    let span = info_span!(
        "dismiss_transient_ui",
        session_id = session.id(),
        rules = table.len(),
        max_passes = policy.max_passes
    );
    async {
        session.set_phase(Phase::Dismissing);
        let outcome = session
            .without_implicit_wait(|suspended| async move {
                if !suspended {
                    warn!("implicit wait still active, skipping dismissal scan");
                    return BootstrapOutcome::BudgetExhausted {
                        passes: 0,
                        actions: Vec::new(),
                    };
                }
                run_passes(session, table, policy).await
            })
            .await;
        tokio::time::sleep(policy.post_scan_delay).await;
        match &outcome {
            BootstrapOutcome::HomeReached { passes, actions } => {
                info!(passes, dismissed = actions.len(), "transient UI cleared")
            }
            BootstrapOutcome::BudgetExhausted { passes, actions } => {
                warn!(passes, dismissed = actions.len(), "dismissal budget exhausted")
            }
        }
        outcome
    }
    .instrument(span)
    .await
}

async fn run_passes(
    session: &AutomationSession,
    table: &DismissalTable,
    policy: &DismissalPolicy,
) -> BootstrapOutcome {
    let mut actions = Vec::new();
    for pass in 0..policy.max_passes {
        let action = match click_first_match(session, table, pass).await {
            Some(action) => Some(action),
            None if pass < policy.fallback_tap_passes => fallback_tap(session, table, policy, pass).await,
            None => None,
        };
        match action {
            Some(action) => {
                actions.push(action);
                tokio::time::sleep(policy.settle_delay).await;
            }
            None => {
                return BootstrapOutcome::HomeReached {
                    passes: pass + 1,
                    actions,
                }
            }
        }
    }
    BootstrapOutcome::BudgetExhausted {
        passes: policy.max_passes,
        actions,
    }
}

async fn click_first_match(
    session: &AutomationSession,
    table: &DismissalTable,
    pass: u32,
) -> Option<Dismissal> {
    let driver = session.driver();
    for (rule, locator) in table.clickable() {
        let element = match driver.find_element(&locator).await {
            Ok(element) => element,
            Err(e) => {
                if !e.is_absence() {
                    debug!(rule = %rule, error = %e, "lookup failed");
                }
                continue;
            }
        };
        match driver.click(&element).await {
            Ok(()) => {
                info!(pass, rule = %rule, "dismissed");
                return Some(Dismissal::Clicked {
                    pass,
                    rule: rule.clone(),
                });
            }
            Err(e) => debug!(rule = %rule, error = %e, "click failed"),
        }
    }
    None
}

async fn fallback_tap(
    session: &AutomationSession,
    table: &DismissalTable,
    policy: &DismissalPolicy,
    pass: u32,
) -> Option<Dismissal> {
    let (x_fraction, y_fraction) = table.coordinates().next()?;
    if let Some(marker) = &policy.home_marker {
        if session.driver().find_element(marker).await.is_ok() {
            debug!(marker = %marker, "home marker visible, skipping fallback tap");
            return None;
        }
    }
    let driver = session.driver();
    let size = match driver.screen_size().await {
        Ok(size) => size,
        Err(e) => {
            debug!(error = %e, "screen size unavailable, skipping fallback tap");
            return None;
        }
    };
    let (x, y) = size.point_at(x_fraction, y_fraction);
    match driver.tap(x, y).await {
        Ok(()) => {
            info!(pass, x, y, "fallback tap");
            Some(Dismissal::Tapped { pass, x, y })
        }
        Err(e) => {
            debug!(error = %e, "fallback tap failed");
            None
        }
    }
}
