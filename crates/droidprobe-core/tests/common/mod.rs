//! Shared test helpers for droidprobe-core integration tests.
//!
//! [`MockAppium`] wraps a wiremock server that answers the WebDriver routes a
//! bootstrap touches, so the full stack (config, connector, session,
//! dismissal, reset) can run without an emulator.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use droidprobe_core::config::{SuiteConfig, Timing};
use droidprobe_core::dismissal::DismissalPolicy;
use droidprobe_core::webdriver::ELEMENT_KEY;

pub const SESSION_ID: &str = "mock-session";

/// Fallback mocks use this priority so targeted mocks win.
const FALLBACK_PRIORITY: u8 = 10;

pub struct MockAppium {
    pub server: MockServer,
}

impl MockAppium {
    /// A server that creates sessions, accepts every command, and finds no
    /// elements.
    pub async fn start() -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ok(json!({ "sessionId": SESSION_ID, "capabilities": {} })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(session_path("/element")))
            .respond_with(error(404, "no such element", "An element could not be located"))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/session/mock-session/element/[^/]+/displayed$"))
            .respond_with(ok(json!(true)))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(session_path("/appium/device/terminate_app")))
            .respond_with(ok(json!(true)))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(session_path("/appium/device/current_activity")))
            .respond_with(ok(json!(".MainActivity")))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(session_path("/source")))
            .respond_with(ok(json!("<hierarchy/>")))
            .with_priority(FALLBACK_PRIORITY)
            .mount(&server)
            .await;

        // Everything else under the session: success with a null value.
        Mock::given(path_regex(r"^/session/mock-session(/.*)?$"))
            .respond_with(ok(Value::Null))
            .with_priority(u8::MAX)
            .mount(&server)
            .await;

        Self { server }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Make the element with exact `text` findable `times` times.
    pub async fn element_with_text(&self, text: &str, element_id: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(session_path("/element")))
            .and(body_partial_json(json!({
                "value": format!("new UiSelector().text(\"{text}\")")
            })))
            .respond_with(ok(json!({ ELEMENT_KEY: element_id })))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// Requests received so far whose path ends with `suffix`.
    pub async fn requests_to(&self, http_method: &str, suffix: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str() == http_method && r.url.path().ends_with(suffix))
            .count()
    }
}

pub fn session_path(suffix: &str) -> String {
    format!("/session/{SESSION_ID}{suffix}")
}

pub fn ok(value: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": value }))
}

pub fn error(status: u16, code: &str, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "value": { "error": code, "message": message, "stacktrace": "" }
    }))
}

/// Config pointing at `endpoint` with every pause removed.
pub fn fast_config(endpoint: &str) -> SuiteConfig {
    SuiteConfig {
        endpoint: endpoint.to_string(),
        timing: Timing {
            implicit_wait: Duration::from_secs(10),
            ..Timing::immediate()
        },
        dismissal: DismissalPolicy::immediate(),
        ..SuiteConfig::default()
    }
}
