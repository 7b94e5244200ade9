//! Command-line front end for droidprobe.
//!
//! Runs the session bootstrap steps by hand against a live Appium server,
//! which is handy when a suite misbehaves on a fresh emulator.
//!
//! # Usage
//!
//! ```bash
//! # Show the effective configuration (defaults, ~/.droidprobe/config.json, env)
//! droidprobe config
//!
//! # Run the first-launch warm-up, even outside CI
//! droidprobe warm-up
//!
//! # Restart the app and leave it on its home screen
//! droidprobe reset
//!
//! # Clear onboarding screens and dialogs
//! droidprobe dismiss
//!
//! # Probe for an element; exit status 0 if visible, 1 if not
//! droidprobe check --text "My Tasks"
//! droidprobe check --desc "Create new task" -t 3000
//!
//! # Talk to a different server
//! droidprobe --endpoint http://10.0.2.2:4723 check --id org.tasks:id/fab
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use droidprobe_core::bootstrap::{BootstrapError, SessionBootstrap};
use droidprobe_core::config::{ConfigError, SuiteConfig};
use droidprobe_core::dismissal::{BootstrapOutcome, Dismissal, DismissalTable};
use droidprobe_core::locator::Locator;
use droidprobe_core::warm_up::{WarmUp, WarmUpReport};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Bootstrap and probe an Android app through an Appium server.
#[derive(Parser)]
#[command(name = "droidprobe")]
#[command(about = "Warm up, reset and probe an Android app through Appium")]
#[command(version)]
struct Cli {
    /// Appium server URL (overrides APPIUM_URL and the config file)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Use CI timings
    #[arg(long)]
    ci: bool,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Print the effective configuration
    Config,

    /// Run the one-time warm-up session
    WarmUp,

    /// Restart the app and wait for it to settle
    Reset,

    /// Dismiss onboarding screens and dialogs
    Dismiss,

    /// Check whether an element is visible
    Check {
        #[command(flatten)]
        target: Target,

        /// Timeout in milliseconds
        #[arg(short, long, default_value = "10000")]
        timeout: u64,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Match by exact text
    #[arg(long)]
    text: Option<String>,

    /// Match by resource id (e.g. org.tasks:id/fab)
    #[arg(long = "id", alias = "resource-id")]
    resource_id: Option<String>,

    /// Match by content description
    #[arg(long)]
    desc: Option<String>,
}

impl Target {
    fn locator(&self) -> Option<Locator> {
        if let Some(text) = &self.text {
            Some(Locator::text(text.as_str()))
        } else if let Some(id) = &self.resource_id {
            Some(Locator::resource_id(id.as_str()))
        } else {
            self.desc.as_deref().map(Locator::accessibility_id)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Bootstrap(BootstrapError),
    Output(serde_json::Error),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Bootstrap(_) => ExitCode::from(2),
            CliError::Config(_) | CliError::Output(_) => ExitCode::from(3),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Bootstrap(e) => write!(f, "Session error: {}", e),
            CliError::Output(e) => write!(f, "Output error: {}", e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<BootstrapError> for CliError {
    fn from(e: BootstrapError) -> Self {
        CliError::Bootstrap(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e)
    }
}

fn load_config(cli: &Cli) -> Result<SuiteConfig, CliError> {
    let mut config = SuiteConfig::load()?;
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.trim_end_matches('/').to_string();
    }
    if cli.ci {
        config.ci = true;
    }
    debug!(endpoint = %config.endpoint, ci = config.ci, "configuration loaded");
    Ok(config)
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Config => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_config(&config);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::WarmUp => {
            let bootstrap = SessionBootstrap::remote(config)?;
            let warm_up = WarmUp::new();
            let report = warm_up.force(&bootstrap).await;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(report)?);
            } else {
                print_warm_up(report);
            }
            Ok(if report.error.is_some() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            })
        }
        Command::Reset => {
            let bootstrap = SessionBootstrap::remote(config)?;
            let session = bootstrap.prepare().await?;
            let activity = session.driver().current_activity().await.ok();
            bootstrap.close(&session).await;
            if cli.format == OutputFormat::Json {
                println!(
                    "{}",
                    serde_json::json!({ "success": true, "activity": activity })
                );
            } else {
                match activity {
                    Some(activity) => eprintln!("App reset, foreground activity {}", activity),
                    None => eprintln!("App reset"),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Dismiss => {
            let bootstrap = SessionBootstrap::remote(config)?;
            let session = bootstrap.open().await?;
            let outcome = bootstrap
                .dismiss_transient_ui(&session, &DismissalTable::tasks_default())
                .await;
            bootstrap.close(&session).await;
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_outcome(&outcome);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { ref target, timeout } => {
            let Some(locator) = target.locator() else {
                return Ok(ExitCode::from(3));
            };
            let bootstrap = SessionBootstrap::remote(config)?;
            let session = bootstrap.open().await?;
            let result = session
                .probe()
                .probe(&locator, Duration::from_millis(timeout))
                .await;
            bootstrap.close(&session).await;
            if cli.format == OutputFormat::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "locator": locator.to_string(),
                        "visible": result.visible,
                        "waited_ms": result.waited.as_millis() as u64,
                    })
                );
            } else if result.visible {
                println!("{} visible", locator);
            } else {
                println!(
                    "{} not visible after {}ms",
                    locator,
                    result.waited.as_millis()
                );
            }
            Ok(if result.visible {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}

fn print_config(config: &SuiteConfig) {
    let caps = &config.capabilities;
    println!("endpoint:        {}", config.endpoint);
    println!("ci:              {}", config.ci);
    println!("device:          {}", caps.device_name);
    println!("app:             {}/{}", caps.app_package, caps.app_activity);
    if let Some(app) = &caps.app {
        println!("apk:             {}", app.display());
    }
    println!("implicit wait:   {}ms", config.implicit_wait().as_millis());
    println!("activate settle: {}ms", config.activate_settle().as_millis());
    println!("max passes:      {}", config.dismissal.max_passes);
    println!(
        "settle delay:    {}ms",
        config.dismissal.settle_delay.as_millis()
    );
}

fn print_warm_up(report: &WarmUpReport) {
    if report.skipped {
        eprintln!("Warm-up skipped");
        return;
    }
    if let Some(error) = &report.error {
        eprintln!("Warm-up could not open a session: {}", error);
        return;
    }
    if let Some(activity) = &report.initial_activity {
        println!("initial activity: {}", activity);
    }
    if let Some(outcome) = &report.outcome {
        print_outcome(outcome);
    }
    if let Some(activity) = &report.final_activity {
        println!("final activity:   {}", activity);
    }
}

fn print_outcome(outcome: &BootstrapOutcome) {
    for action in outcome.actions() {
        match action {
            Dismissal::Clicked { pass, rule } => println!("pass {}: clicked {}", pass, rule),
            Dismissal::Tapped { pass, x, y } => println!("pass {}: tapped ({}, {})", pass, x, y),
        }
    }
    let state = if outcome.is_home() {
        "home reached"
    } else {
        "budget exhausted"
    };
    println!("{} after {} pass(es)", state, outcome.passes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_prefers_text() {
        let target = Target {
            text: Some("My Tasks".into()),
            resource_id: None,
            desc: None,
        };
        assert_eq!(target.locator(), Some(Locator::text("My Tasks")));
    }

    #[test]
    fn test_target_desc() {
        let target = Target {
            text: None,
            resource_id: None,
            desc: Some("Create new task".into()),
        };
        assert_eq!(
            target.locator(),
            Some(Locator::accessibility_id("Create new task"))
        );
    }

    #[test]
    fn test_cli_rejects_two_targets() {
        let parsed = Cli::try_parse_from(["droidprobe", "check", "--text", "a", "--desc", "b"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_cli_requires_a_target() {
        assert!(Cli::try_parse_from(["droidprobe", "check"]).is_err());
    }
}
