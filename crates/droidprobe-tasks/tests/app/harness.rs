use std::future::Future;
use std::sync::{Arc, Once, OnceLock};

use droidprobe_core::bootstrap::SessionBootstrap;
use droidprobe_core::config::SuiteConfig;
use droidprobe_core::session::AutomationSession;
use droidprobe_core::warm_up::WarmUp;
use tracing_subscriber::EnvFilter;

static CONFIG: OnceLock<SuiteConfig> = OnceLock::new();
static WARM_UP: WarmUp = WarmUp::new();
static TRACING: Once = Once::new();

fn config() -> &'static SuiteConfig {
    CONFIG.get_or_init(|| SuiteConfig::load().expect("failed to load suite configuration"))
}

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Run one test body against a freshly reset app.
///
/// Each test gets its own bootstrap (and HTTP client) because every
/// `#[tokio::test]` runs on its own runtime. The warm-up is shared and runs
/// before the first test only.
pub async fn run<F, Fut>(body: F)
where
    F: FnOnce(Arc<AutomationSession>) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    init_tracing();
    let bootstrap = SessionBootstrap::remote(config().clone())
        .expect("failed to build the automation client");
    WARM_UP.ensure(&bootstrap).await;
    bootstrap
        .run(body)
        .await
        .expect("failed to prepare an automation session");
}
