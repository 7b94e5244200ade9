//! [`AutomationDriver`] over the W3C WebDriver HTTP protocol.
//!
//! [`RemoteConnector`] opens sessions on an Appium server with `POST /session`
//! and hands back a [`RemoteDriver`] bound to the new session id. Commands are
//! plain JSON requests under `/session/{id}`; Android-specific ones use the
//! Appium extension routes (`/appium/device/...`).
//!
//! Every response carries its payload under `value`. Failures use the W3C
//! error object (`{"value": {"error": "...", "message": "..."}}`), which is
//! mapped onto [`DriverError`] so callers can tell absence from a dead
//! session.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, trace};

use crate::capabilities::Capabilities;
use crate::driver::{AutomationDriver, Connector, DriverError};
use crate::element::{ElementHandle, ScreenSize};
use crate::locator::Locator;

/// Key under which W3C servers return element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Key used by pre-W3C (JSON Wire) servers.
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// Upper bound for a single HTTP exchange. Session creation on a cold
/// emulator routinely takes tens of seconds.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WireResponse<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct NewSession {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WindowRect {
    width: f64,
    height: f64,
}

/// Maps a W3C error code onto a [`DriverError`].
fn map_wire_error(error: WireError) -> DriverError {
    let WireError { error, message } = error;
    let detail = if message.is_empty() { error.clone() } else { message };
    match error.as_str() {
        "no such element" => DriverError::NoSuchElement(detail),
        "stale element reference" => DriverError::StaleElement(detail),
        "invalid session id" => DriverError::InvalidSession(detail),
        "session not created" => DriverError::SessionNotCreated(detail),
        "invalid selector" => DriverError::InvalidSelector(detail),
        "timeout" | "script timeout" => DriverError::Timeout,
        _ => DriverError::CommandFailed(format!("{error}: {detail}")),
    }
}

/// Maps a transport failure onto a [`DriverError`].
fn map_transport_error(url: &str, err: reqwest::Error) -> DriverError {
    if err.is_connect() {
        DriverError::Unreachable(format!("{url}: {err}"))
    } else if err.is_timeout() {
        DriverError::Timeout
    } else {
        DriverError::Http(err)
    }
}

/// Turns a status and body into the `value` payload or an error.
fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, DriverError> {
    if status.is_success() {
        return serde_json::from_str::<WireResponse<T>>(body)
            .map(|r| r.value)
            .map_err(|e| DriverError::JsonParse(format!("{e}: {}", truncate(body))));
    }
    match serde_json::from_str::<WireResponse<WireError>>(body) {
        Ok(wire) => Err(map_wire_error(wire.value)),
        Err(_) => Err(DriverError::CommandFailed(format!(
            "HTTP {status}: {}",
            truncate(body)
        ))),
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}

fn element_id(value: &Value) -> Option<String> {
    value
        .get(ELEMENT_KEY)
        .or_else(|| value.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
}

async fn send(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<Value>,
) -> Result<(StatusCode, String), DriverError> {
    let mut request = client.request(method.clone(), url);
    if method == Method::POST {
        request = request.json(&body.unwrap_or_else(|| json!({})));
    }
    let response = request
        .send()
        .await
        .map_err(|e| map_transport_error(url, e))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| map_transport_error(url, e))?;
    trace!(%status, body = %truncate(&text), "webdriver response");
    Ok((status, text))
}

// ---------------------------------------------------------------------------
// RemoteConnector
// ---------------------------------------------------------------------------

/// Opens WebDriver sessions over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteConnector {
    client: Client,
}

impl RemoteConnector {
    /// A connector with [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new() -> Result<Self, DriverError> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// A connector whose requests give up after `timeout`.
    ///
    /// Fails when the HTTP client cannot be built (no usable TLS backend or
    /// resolver).
    pub fn with_timeout(timeout: Duration) -> Result<Self, DriverError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Connector for RemoteConnector {
    #[instrument(skip(self, capabilities), fields(device = %capabilities.device_name))]
    async fn connect(
        &self,
        endpoint: &str,
        capabilities: &Capabilities,
    ) -> Result<std::sync::Arc<dyn AutomationDriver>, DriverError> {
        let endpoint = endpoint.trim_end_matches('/');
        let url = format!("{endpoint}/session");
        debug!(app = %capabilities.app_package, "requesting new session");

        let (status, body) = send(
            &self.client,
            Method::POST,
            &url,
            Some(capabilities.new_session_body()),
        )
        .await?;
        if !status.is_success() {
            return Err(match decode::<Value>(status, &body) {
                Err(DriverError::CommandFailed(msg)) => DriverError::SessionNotCreated(msg),
                Err(e) => e,
                Ok(_) => DriverError::SessionNotCreated(format!("HTTP {status}")),
            });
        }

        let created: NewSession = serde_json::from_str(&body)
            .map_err(|e| DriverError::JsonParse(format!("{e}: {}", truncate(&body))))?;
        let session_id = created
            .value
            .get("sessionId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or(created.session_id)
            .ok_or_else(|| DriverError::JsonParse("new session response has no sessionId".to_string()))?;

        debug!(session_id = %session_id, "session created");
        Ok(std::sync::Arc::new(RemoteDriver {
            client: self.client.clone(),
            base: format!("{endpoint}/session/{session_id}"),
            session_id,
        }))
    }
}

// ---------------------------------------------------------------------------
// RemoteDriver
// ---------------------------------------------------------------------------

/// One WebDriver session.
#[derive(Debug)]
pub struct RemoteDriver {
    client: Client,
    base: String,
    session_id: String,
}

impl RemoteDriver {
    /// Attach to an existing session.
    pub fn attach(client: Client, endpoint: &str, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        Self {
            client,
            base: format!("{}/session/{}", endpoint.trim_end_matches('/'), session_id),
            session_id,
        }
    }

    async fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, DriverError> {
        let url = format!("{}{}", self.base, path);
        debug!(%method, path, "webdriver command");
        let (status, text) = send(&self.client, method, &url, body).await?;
        decode(status, &text)
    }

    /// A command whose `value` is ignored (usually `null`).
    async fn execute(&self, method: Method, path: &str, body: Option<Value>) -> Result<(), DriverError> {
        self.command::<Value>(method, path, body).await.map(|_| ())
    }
}

#[async_trait]
impl AutomationDriver for RemoteDriver {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn find_element(&self, locator: &Locator) -> Result<ElementHandle, DriverError> {
        let value: Value = self
            .command(
                Method::POST,
                "/element",
                Some(json!({ "using": locator.strategy(), "value": locator.selector() })),
            )
            .await?;
        let id = element_id(&value)
            .ok_or_else(|| DriverError::JsonParse(format!("no element reference in {value}")))?;
        Ok(ElementHandle::new(id, locator.clone()))
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.execute(Method::POST, &format!("/element/{}/click", element.id), None)
            .await
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.execute(Method::POST, &format!("/element/{}/clear", element.id), None)
            .await
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.execute(
            Method::POST,
            &format!("/element/{}/value", element.id),
            Some(json!({ "text": text })),
        )
        .await
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.command(Method::GET, &format!("/element/{}/displayed", element.id), None)
            .await
    }

    async fn back(&self) -> Result<(), DriverError> {
        self.execute(Method::POST, "/back", None).await
    }

    async fn terminate_app(&self, app_id: &str) -> Result<bool, DriverError> {
        self.command(
            Method::POST,
            "/appium/device/terminate_app",
            Some(json!({ "appId": app_id })),
        )
        .await
    }

    async fn activate_app(&self, app_id: &str) -> Result<(), DriverError> {
        self.execute(
            Method::POST,
            "/appium/device/activate_app",
            Some(json!({ "appId": app_id })),
        )
        .await
    }

    async fn set_implicit_wait(&self, wait: Duration) -> Result<(), DriverError> {
        self.execute(
            Method::POST,
            "/timeouts",
            Some(json!({ "implicit": wait.as_millis() as u64 })),
        )
        .await
    }

    async fn screen_size(&self) -> Result<ScreenSize, DriverError> {
        let rect: WindowRect = self.command(Method::GET, "/window/rect", None).await?;
        Ok(ScreenSize {
            width: rect.width.round() as i32,
            height: rect.height.round() as i32,
        })
    }

    async fn tap(&self, x: i32, y: i32) -> Result<(), DriverError> {
        let actions = json!({
            "actions": [{
                "type": "pointer",
                "id": "finger1",
                "parameters": { "pointerType": "touch" },
                "actions": [
                    { "type": "pointerMove", "duration": 0, "x": x, "y": y },
                    { "type": "pointerDown", "button": 0 },
                    { "type": "pause", "duration": 100 },
                    { "type": "pointerUp", "button": 0 }
                ]
            }]
        });
        self.execute(Method::POST, "/actions", Some(actions)).await
    }

    async fn is_keyboard_shown(&self) -> Result<bool, DriverError> {
        self.command(Method::GET, "/appium/device/is_keyboard_shown", None)
            .await
    }

    async fn hide_keyboard(&self) -> Result<(), DriverError> {
        self.execute(Method::POST, "/appium/device/hide_keyboard", None)
            .await
    }

    async fn current_activity(&self) -> Result<String, DriverError> {
        self.command(Method::GET, "/appium/device/current_activity", None)
            .await
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        self.command(Method::GET, "/source", None).await
    }

    async fn quit(&self) -> Result<(), DriverError> {
        self.execute(Method::DELETE, "", None).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn session_on(server: &MockServer) -> std::sync::Arc<dyn AutomationDriver> {
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "sessionId": "abc123", "capabilities": {} }
            })))
            .mount(server)
            .await;
        RemoteConnector::new()
            .unwrap()
            .connect(&server.uri(), &Capabilities::default())
            .await
            .unwrap()
    }

    #[test]
    fn wire_errors_map_to_driver_errors() {
        let err = |code: &str| WireError {
            error: code.to_string(),
            message: "detail".to_string(),
        };
        assert!(matches!(map_wire_error(err("no such element")), DriverError::NoSuchElement(_)));
        assert!(matches!(
            map_wire_error(err("stale element reference")),
            DriverError::StaleElement(_)
        ));
        assert!(matches!(
            map_wire_error(err("invalid session id")),
            DriverError::InvalidSession(_)
        ));
        assert!(matches!(
            map_wire_error(err("session not created")),
            DriverError::SessionNotCreated(_)
        ));
        assert!(matches!(
            map_wire_error(err("invalid selector")),
            DriverError::InvalidSelector(_)
        ));
        assert!(matches!(
            map_wire_error(err("unknown error")),
            DriverError::CommandFailed(_)
        ));
    }

    #[test]
    fn element_id_accepts_both_keys() {
        assert_eq!(element_id(&json!({ ELEMENT_KEY: "e1" })).as_deref(), Some("e1"));
        assert_eq!(element_id(&json!({ "ELEMENT": "e2" })).as_deref(), Some("e2"));
        assert_eq!(element_id(&json!({})), None);
    }

    #[test]
    fn decode_reports_non_json_errors_with_status() {
        let err = decode::<Value>(StatusCode::BAD_GATEWAY, "upstream down").unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn connect_sends_always_match_capabilities() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .and(body_json(Capabilities::default().new_session_body()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "sessionId": "s-1", "capabilities": {} }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let driver = RemoteConnector::new()
            .unwrap()
            .connect(&format!("{}/", server.uri()), &Capabilities::default())
            .await
            .unwrap();
        assert_eq!(driver.session_id(), "s-1");
    }

    #[tokio::test]
    async fn connect_accepts_legacy_session_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 0, "sessionId": "legacy", "value": {}
            })))
            .mount(&server)
            .await;

        let driver = RemoteConnector::new()
            .unwrap()
            .connect(&server.uri(), &Capabilities::default())
            .await
            .unwrap();
        assert_eq!(driver.session_id(), "legacy");
    }

    #[tokio::test]
    async fn connect_rejection_is_session_not_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "value": {
                    "error": "session not created",
                    "message": "Could not find a connected Android device"
                }
            })))
            .mount(&server)
            .await;

        let err = RemoteConnector::new()
            .unwrap()
            .connect(&server.uri(), &Capabilities::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DriverError::SessionNotCreated(ref m) if m.contains("Android device")));
    }

    #[tokio::test]
    async fn short_request_timeout_surfaces_as_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "value": { "sessionId": "slow" } }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let err = RemoteConnector::with_timeout(Duration::from_millis(100))
            .unwrap()
            .connect(&server.uri(), &Capabilities::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DriverError::Timeout));
    }

    #[tokio::test]
    async fn connect_to_closed_port_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = RemoteConnector::new()
            .unwrap()
            .connect(&format!("http://127.0.0.1:{port}"), &Capabilities::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DriverError::Unreachable(_)));
    }

    #[tokio::test]
    async fn find_element_posts_strategy_and_selector() {
        let server = MockServer::start().await;
        let driver = session_on(&server).await;
        Mock::given(method("POST"))
            .and(path("/session/abc123/element"))
            .and(body_json(json!({
                "using": "-android uiautomator",
                "value": "new UiSelector().text(\"My Tasks\")"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { ELEMENT_KEY: "el-7" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let handle = driver.find_element(&Locator::text("My Tasks")).await.unwrap();
        assert_eq!(handle.id, "el-7");
    }

    #[tokio::test]
    async fn missing_element_is_no_such_element() {
        let server = MockServer::start().await;
        let driver = session_on(&server).await;
        Mock::given(method("POST"))
            .and(path("/session/abc123/element"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "value": { "error": "no such element", "message": "not found", "stacktrace": "" }
            })))
            .mount(&server)
            .await;

        let err = driver.find_element(&Locator::text("Nope")).await.unwrap_err();
        assert!(err.is_absence());
    }

    #[tokio::test]
    async fn implicit_wait_is_sent_in_milliseconds() {
        let server = MockServer::start().await;
        let driver = session_on(&server).await;
        Mock::given(method("POST"))
            .and(path("/session/abc123/timeouts"))
            .and(body_json(json!({ "implicit": 20000 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;

        driver.set_implicit_wait(Duration::from_secs(20)).await.unwrap();
    }

    #[tokio::test]
    async fn app_lifecycle_uses_appium_routes() {
        let server = MockServer::start().await;
        let driver = session_on(&server).await;
        Mock::given(method("POST"))
            .and(path("/session/abc123/appium/device/terminate_app"))
            .and(body_json(json!({ "appId": "org.tasks" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": true })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/abc123/appium/device/activate_app"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(driver.terminate_app("org.tasks").await.unwrap());
        driver.activate_app("org.tasks").await.unwrap();
    }

    #[tokio::test]
    async fn screen_size_reads_window_rect() {
        let server = MockServer::start().await;
        let driver = session_on(&server).await;
        Mock::given(method("GET"))
            .and(path("/session/abc123/window/rect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "x": 0, "y": 0, "width": 1080, "height": 2400 }
            })))
            .mount(&server)
            .await;

        let size = driver.screen_size().await.unwrap();
        assert_eq!(size, ScreenSize { width: 1080, height: 2400 });
    }

    #[tokio::test]
    async fn quit_deletes_session() {
        let server = MockServer::start().await;
        let driver = session_on(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/session/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;

        driver.quit().await.unwrap();
    }

    #[tokio::test]
    async fn dead_session_is_invalid_session() {
        let server = MockServer::start().await;
        let driver = session_on(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/session/abc123"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "value": { "error": "invalid session id", "message": "A session is either terminated or not started" }
            })))
            .mount(&server)
            .await;

        let err = driver.quit().await.unwrap_err();
        assert!(err.is_session_gone());
    }
}
