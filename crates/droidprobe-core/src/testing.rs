//! Scripted fake device for tests.
//!
//! [`FakeDevice`] models just enough of an Android app for the bootstrap,
//! probe and page-object logic to be exercised without an emulator:
//!
//! - named screens holding [`FakeElement`]s, one of them current
//! - a stack of modal dialogs; only the top dialog is visible while any exist
//! - an app process that can be terminated and reactivated
//! - elements that appear only after a delay (on the tokio clock, so paused
//!   time works)
//! - click effects (navigate, dismiss dialog, or a custom closure)
//! - fault injection (stale lookups, a dead session, an unreachable endpoint)
//!
//! Every command is recorded so tests can assert on what the code under test
//! actually did.
//!
//! # Example
//!
//! ```
//! use droidprobe_core::testing::{FakeDevice, FakeElement};
//!
//! let device = FakeDevice::new();
//! device.show(FakeElement::text("My Tasks"));
//! device.push_dialog("Continue");
//! assert!(!device.is_showing("My Tasks"));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::capabilities::Capabilities;
use crate::driver::{AutomationDriver, Connector, DriverError};
use crate::element::{ElementHandle, ScreenSize};
use crate::locator::Locator;

/// Screen the fake app starts on and returns to after a cold launch.
pub const HOME_SCREEN: &str = "home";

/// What happens when a [`FakeElement`] is clicked.
#[derive(Clone, Default)]
pub enum ClickEffect {
    /// Nothing changes.
    #[default]
    None,
    /// Switch to another screen.
    Navigate(String),
    /// Pop the top dialog.
    DismissDialog,
    /// Arbitrary change to the app state.
    Custom(Arc<dyn Fn(&mut FakeApp) + Send + Sync>),
}

impl std::fmt::Debug for ClickEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClickEffect::None => f.write_str("None"),
            ClickEffect::Navigate(screen) => write!(f, "Navigate({screen})"),
            ClickEffect::DismissDialog => f.write_str("DismissDialog"),
            ClickEffect::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One element on a fake screen.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: Option<String>,
    pub content_desc: Option<String>,
    pub resource_id: Option<String>,
    pub hint: Option<String>,
    pub class: String,
    pub displayed: bool,
    pub on_click: ClickEffect,
    appear_delay: Option<Duration>,
    appears_at: Option<Instant>,
    id: String,
}

impl FakeElement {
    fn with_class(class: &str) -> Self {
        Self {
            class: class.to_string(),
            displayed: true,
            ..Default::default()
        }
    }

    /// A `TextView` showing `text`.
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::with_class("android.widget.TextView")
        }
    }

    /// A `Button` labelled `text`.
    pub fn button(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::with_class("android.widget.Button")
        }
    }

    /// An element found by content description.
    pub fn accessibility_id(desc: &str) -> Self {
        Self {
            content_desc: Some(desc.to_string()),
            ..Self::with_class("android.view.View")
        }
    }

    /// An element found by resource id.
    pub fn resource_id(id: &str) -> Self {
        Self {
            resource_id: Some(id.to_string()),
            ..Self::with_class("android.view.View")
        }
    }

    /// An empty `EditText` with a hint.
    pub fn edit_text(hint: &str) -> Self {
        Self {
            hint: Some(hint.to_string()),
            ..Self::with_class("android.widget.EditText")
        }
    }

    /// An element of the given widget class with no text.
    pub fn widget(class: &str) -> Self {
        Self::with_class(class)
    }

    pub fn with_content_desc(mut self, desc: &str) -> Self {
        self.content_desc = Some(desc.to_string());
        self
    }

    pub fn with_resource_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn on_click(mut self, effect: ClickEffect) -> Self {
        self.on_click = effect;
        self
    }

    /// Present in the hierarchy but not displayed.
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Only becomes findable `delay` after it is placed on a screen.
    pub fn appear_after(mut self, delay: Duration) -> Self {
        self.appear_delay = Some(delay);
        self
    }

    fn is_present(&self, now: Instant) -> bool {
        self.appears_at.map_or(true, |at| now >= at)
    }

    fn label(&self) -> String {
        self.text
            .clone()
            .or_else(|| self.content_desc.clone())
            .or_else(|| self.resource_id.clone())
            .or_else(|| self.hint.clone())
            .unwrap_or_else(|| self.class.clone())
    }

    fn matches(&self, locator: &Locator) -> bool {
        match locator {
            Locator::Text(text) => self.text.as_deref() == Some(text.as_str()),
            Locator::TextContains(fragment) => self
                .text
                .as_deref()
                .is_some_and(|t| t.contains(fragment.as_str())),
            Locator::AccessibilityId(desc) => self.content_desc.as_deref() == Some(desc.as_str()),
            Locator::ResourceId(id) => self.resource_id.as_deref() == Some(id.as_str()),
            Locator::Hint(hint) => {
                self.class == "android.widget.EditText" && self.hint.as_deref() == Some(hint.as_str())
            }
            Locator::ClassInstance { .. } | Locator::XPath(_) => false,
        }
    }
}

/// Mutable state of the fake app. Exposed to [`ClickEffect::Custom`].
#[derive(Debug)]
pub struct FakeApp {
    screens: HashMap<String, Vec<FakeElement>>,
    current: String,
    dialogs: Vec<Vec<FakeElement>>,
    running: bool,
    keyboard_shown: bool,
    next_id: u64,
}

impl FakeApp {
    fn new() -> Self {
        let mut screens = HashMap::new();
        screens.insert(HOME_SCREEN.to_string(), Vec::new());
        Self {
            screens,
            current: HOME_SCREEN.to_string(),
            dialogs: Vec::new(),
            running: true,
            keyboard_shown: false,
            next_id: 1,
        }
    }

    fn stamp(&mut self, mut element: FakeElement) -> FakeElement {
        element.id = format!("00000000-0000-0000-0000-{:012}", self.next_id);
        self.next_id += 1;
        element.appears_at = element.appear_delay.map(|d| Instant::now() + d);
        element
    }

    /// The current screen name.
    pub fn current_screen(&self) -> &str {
        &self.current
    }

    /// Switch to `screen`, creating it empty if unknown.
    pub fn navigate(&mut self, screen: &str) {
        self.screens.entry(screen.to_string()).or_default();
        self.current = screen.to_string();
    }

    /// Add an element to a screen.
    pub fn add_element(&mut self, screen: &str, element: FakeElement) {
        let element = self.stamp(element);
        self.screens.entry(screen.to_string()).or_default().push(element);
    }

    /// Text typed into the `EditText` with `hint` on the current screen.
    pub fn field_text(&self, hint: &str) -> Option<String> {
        self.screens.get(&self.current).and_then(|elements| {
            elements
                .iter()
                .find(|e| e.hint.as_deref() == Some(hint))
                .and_then(|e| e.text.clone())
        })
    }

    /// Clear every `EditText` on `screen`.
    pub fn clear_fields(&mut self, screen: &str) {
        if let Some(elements) = self.screens.get_mut(screen) {
            for element in elements.iter_mut().filter(|e| e.hint.is_some()) {
                element.text = None;
            }
        }
    }

    pub fn dismiss_dialog(&mut self) {
        self.dialogs.pop();
    }

    fn visible(&self) -> &[FakeElement] {
        if !self.running {
            return &[];
        }
        match self.dialogs.last() {
            Some(dialog) => dialog,
            None => self
                .screens
                .get(&self.current)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        }
    }

    fn visible_mut(&mut self) -> Option<&mut Vec<FakeElement>> {
        if !self.running {
            return None;
        }
        match self.dialogs.last_mut() {
            Some(dialog) => Some(dialog),
            None => self.screens.get_mut(&self.current),
        }
    }

    fn find(&self, locator: &Locator) -> Result<&FakeElement, DriverError> {
        let now = Instant::now();
        let mut present = self.visible().iter().filter(|e| e.is_present(now));
        let found = match locator {
            Locator::XPath(xpath) => {
                return Err(DriverError::InvalidSelector(format!(
                    "xpath is not supported by the fake device: {xpath}"
                )))
            }
            Locator::ClassInstance { class, instance } => present
                .filter(|e| &e.class == class)
                .nth(*instance as usize),
            other => present.find(|e| e.matches(other)),
        };
        found.ok_or_else(|| DriverError::NoSuchElement(locator.to_string()))
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut FakeElement, DriverError> {
        let now = Instant::now();
        self.visible_mut()
            .and_then(|elements| {
                elements
                    .iter_mut()
                    .find(|e| e.id == id && e.is_present(now))
            })
            .ok_or_else(|| DriverError::StaleElement(id.to_string()))
    }

    fn page_source(&self) -> String {
        let mut xml = String::from("<hierarchy>");
        for element in self.visible() {
            xml.push_str(&format!(
                "<node class=\"{}\" text=\"{}\" content-desc=\"{}\"/>",
                element.class,
                element.text.as_deref().unwrap_or(""),
                element.content_desc.as_deref().unwrap_or("")
            ));
        }
        xml.push_str("</hierarchy>");
        xml
    }
}

#[derive(Debug, Default)]
struct Recorder {
    find_calls: u64,
    clicked: Vec<String>,
    taps: Vec<(i32, i32)>,
    typed: Vec<(String, String)>,
    terminated: Vec<String>,
    activated: Vec<String>,
    back_presses: u64,
    quit_calls: u64,
    sessions_opened: u64,
}

/// A fake Android device with one app installed.
pub struct FakeDevice {
    app: Mutex<FakeApp>,
    recorder: Mutex<Recorder>,
    failing_finds: Mutex<VecDeque<DriverError>>,
    dead: AtomicBool,
    refuse_activation: AtomicBool,
    refuse_implicit_wait: AtomicBool,
    honor_implicit_wait: AtomicBool,
    lookup_delay_ms: AtomicU64,
    implicit_wait_ms: AtomicU64,
    screen: ScreenSize,
}

impl FakeDevice {
    /// A device on the (empty) home screen with the app running.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            app: Mutex::new(FakeApp::new()),
            recorder: Mutex::new(Recorder::default()),
            failing_finds: Mutex::new(VecDeque::new()),
            dead: AtomicBool::new(false),
            refuse_activation: AtomicBool::new(false),
            refuse_implicit_wait: AtomicBool::new(false),
            honor_implicit_wait: AtomicBool::new(false),
            lookup_delay_ms: AtomicU64::new(0),
            implicit_wait_ms: AtomicU64::new(0),
            screen: ScreenSize {
                width: 1080,
                height: 2400,
            },
        })
    }

    fn app(&self) -> MutexGuard<'_, FakeApp> {
        self.app.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn recorder(&self) -> MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A driver bound to a new session on this device.
    pub fn driver(self: &Arc<Self>) -> Arc<dyn AutomationDriver> {
        let number = {
            let mut recorder = self.recorder();
            recorder.sessions_opened += 1;
            recorder.sessions_opened
        };
        Arc::new(FakeDriver {
            device: self.clone(),
            session_id: format!("fake-session-{number}"),
            quit: AtomicBool::new(false),
        })
    }

    /// Place an element on the current screen.
    pub fn show(&self, element: FakeElement) {
        let mut app = self.app();
        let current = app.current.clone();
        app.add_element(&current, element);
    }

    /// Place an element on a named screen.
    pub fn add_to_screen(&self, screen: &str, element: FakeElement) {
        self.app().add_element(screen, element);
    }

    /// Switch the app to a named screen.
    pub fn navigate(&self, screen: &str) {
        self.app().navigate(screen);
    }

    pub fn current_screen(&self) -> String {
        self.app().current.clone()
    }

    /// Stack a modal dialog with a single button that closes it.
    pub fn push_dialog(&self, button: &str) {
        self.push_dialog_elements(vec![
            FakeElement::button(button).on_click(ClickEffect::DismissDialog)
        ]);
    }

    /// Stack a modal dialog with arbitrary content.
    pub fn push_dialog_elements(&self, elements: Vec<FakeElement>) {
        let mut app = self.app();
        let stamped: Vec<FakeElement> = elements.into_iter().map(|e| app.stamp(e)).collect();
        app.dialogs.push(stamped);
    }

    pub fn dialog_count(&self) -> usize {
        self.app().dialogs.len()
    }

    /// Whether an element with this text or description is visible right now.
    pub fn is_showing(&self, text: &str) -> bool {
        let app = self.app();
        let now = Instant::now();
        app.visible().iter().any(|e| {
            e.displayed
                && e.is_present(now)
                && (e.text.as_deref() == Some(text) || e.content_desc.as_deref() == Some(text))
        })
    }

    pub fn is_app_running(&self) -> bool {
        self.app().running
    }

    /// Make the next `count` lookups fail as stale references.
    pub fn fail_next_finds(&self, count: usize) {
        let mut failing = self.failing_finds.lock().unwrap_or_else(|e| e.into_inner());
        for _ in 0..count {
            failing.push_back(DriverError::StaleElement("injected".to_string()));
        }
    }

    /// Make every command fail as if the server dropped the session.
    pub fn kill_session(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }

    /// Make `activate_app` fail, as when the package is not installed.
    pub fn refuse_activation(&self) {
        self.refuse_activation.store(true, Ordering::SeqCst);
    }

    /// Make `set_implicit_wait` fail from now on. The current wait stays.
    pub fn refuse_implicit_wait(&self) {
        self.refuse_implicit_wait.store(true, Ordering::SeqCst);
    }

    /// Make lookups that match nothing block for the implicit wait before
    /// failing, as UiAutomator2 does.
    pub fn honor_implicit_wait(&self) {
        self.honor_implicit_wait.store(true, Ordering::SeqCst);
    }

    /// Make every lookup take `delay` before it answers.
    pub fn delay_lookups(&self, delay: Duration) {
        self.lookup_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn implicit_wait(&self) -> Duration {
        Duration::from_millis(self.implicit_wait_ms.load(Ordering::SeqCst))
    }

    pub fn find_calls(&self) -> u64 {
        self.recorder().find_calls
    }

    /// Labels of clicked elements, in order.
    pub fn clicked(&self) -> Vec<String> {
        self.recorder().clicked.clone()
    }

    pub fn taps(&self) -> Vec<(i32, i32)> {
        self.recorder().taps.clone()
    }

    /// `(element label, text)` pairs sent with `send_keys`.
    pub fn typed(&self) -> Vec<(String, String)> {
        self.recorder().typed.clone()
    }

    pub fn terminated(&self) -> Vec<String> {
        self.recorder().terminated.clone()
    }

    pub fn activated(&self) -> Vec<String> {
        self.recorder().activated.clone()
    }

    pub fn back_presses(&self) -> u64 {
        self.recorder().back_presses
    }

    pub fn quit_calls(&self) -> u64 {
        self.recorder().quit_calls
    }

    pub fn sessions_opened(&self) -> u64 {
        self.recorder().sessions_opened
    }

    pub fn is_keyboard_shown(&self) -> bool {
        self.app().keyboard_shown
    }
}

/// One session on a [`FakeDevice`].
pub struct FakeDriver {
    device: Arc<FakeDevice>,
    session_id: String,
    quit: AtomicBool,
}

impl FakeDriver {
    fn check_alive(&self) -> Result<(), DriverError> {
        if self.device.dead.load(Ordering::SeqCst) || self.quit.load(Ordering::SeqCst) {
            return Err(DriverError::InvalidSession(self.session_id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl AutomationDriver for FakeDriver {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn find_element(&self, locator: &Locator) -> Result<ElementHandle, DriverError> {
        self.check_alive()?;
        self.device.recorder().find_calls += 1;
        let injected = self
            .device
            .failing_finds
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        if let Some(err) = injected {
            return Err(err);
        }
        let delay = Duration::from_millis(self.device.lookup_delay_ms.load(Ordering::SeqCst));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let found = {
            let app = self.device.app();
            app.find(locator)
                .map(|element| ElementHandle::new(element.id.clone(), locator.clone()))
        };
        if let Err(e) = &found {
            let wait = self.device.implicit_wait();
            if e.is_absence()
                && !wait.is_zero()
                && self.device.honor_implicit_wait.load(Ordering::SeqCst)
            {
                tokio::time::sleep(wait).await;
            }
        }
        found
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.check_alive()?;
        let (label, effect) = {
            let mut app = self.device.app();
            let found = app.element_mut(&element.id)?;
            (found.label(), found.on_click.clone())
        };
        self.device.recorder().clicked.push(label);
        let mut app = self.device.app();
        match effect {
            ClickEffect::None => {}
            ClickEffect::Navigate(screen) => app.navigate(&screen),
            ClickEffect::DismissDialog => app.dismiss_dialog(),
            ClickEffect::Custom(f) => f(&mut app),
        }
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> Result<(), DriverError> {
        self.check_alive()?;
        let mut app = self.device.app();
        let found = app.element_mut(&element.id)?;
        if found.hint.is_some() {
            found.text = None;
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> Result<(), DriverError> {
        self.check_alive()?;
        let label = {
            let mut app = self.device.app();
            let found = app.element_mut(&element.id)?;
            let mut value = found.text.take().unwrap_or_default();
            value.push_str(text);
            found.text = Some(value);
            let label = found.hint.clone().unwrap_or_else(|| found.label());
            app.keyboard_shown = true;
            label
        };
        self.device.recorder().typed.push((label, text.to_string()));
        Ok(())
    }

    async fn is_displayed(&self, element: &ElementHandle) -> Result<bool, DriverError> {
        self.check_alive()?;
        let mut app = self.device.app();
        Ok(app.element_mut(&element.id)?.displayed)
    }

    async fn back(&self) -> Result<(), DriverError> {
        self.check_alive()?;
        self.device.recorder().back_presses += 1;
        let mut app = self.device.app();
        if app.keyboard_shown {
            app.keyboard_shown = false;
        } else if !app.dialogs.is_empty() {
            app.dismiss_dialog();
        } else if app.current != HOME_SCREEN {
            app.navigate(HOME_SCREEN);
        }
        Ok(())
    }

    async fn terminate_app(&self, app_id: &str) -> Result<bool, DriverError> {
        self.check_alive()?;
        self.device.recorder().terminated.push(app_id.to_string());
        let mut app = self.device.app();
        let was_running = app.running;
        app.running = false;
        app.dialogs.clear();
        app.keyboard_shown = false;
        Ok(was_running)
    }

    async fn activate_app(&self, app_id: &str) -> Result<(), DriverError> {
        self.check_alive()?;
        self.device.recorder().activated.push(app_id.to_string());
        if self.device.refuse_activation.load(Ordering::SeqCst) {
            return Err(DriverError::CommandFailed(format!(
                "app '{app_id}' is not installed"
            )));
        }
        let mut app = self.device.app();
        if !app.running {
            app.running = true;
            app.navigate(HOME_SCREEN);
        }
        Ok(())
    }

    async fn set_implicit_wait(&self, wait: Duration) -> Result<(), DriverError> {
        self.check_alive()?;
        if self.device.refuse_implicit_wait.load(Ordering::SeqCst) {
            return Err(DriverError::CommandFailed(
                "timeouts cannot be changed".to_string(),
            ));
        }
        self.device
            .implicit_wait_ms
            .store(wait.as_millis() as u64, Ordering::SeqCst);
        Ok(())
    }

    async fn screen_size(&self) -> Result<ScreenSize, DriverError> {
        self.check_alive()?;
        Ok(self.device.screen)
    }

    async fn tap(&self, x: i32, y: i32) -> Result<(), DriverError> {
        self.check_alive()?;
        self.device.recorder().taps.push((x, y));
        Ok(())
    }

    async fn is_keyboard_shown(&self) -> Result<bool, DriverError> {
        self.check_alive()?;
        Ok(self.device.app().keyboard_shown)
    }

    async fn hide_keyboard(&self) -> Result<(), DriverError> {
        self.check_alive()?;
        let mut app = self.device.app();
        if !app.keyboard_shown {
            return Err(DriverError::CommandFailed("soft keyboard not present".to_string()));
        }
        app.keyboard_shown = false;
        Ok(())
    }

    async fn current_activity(&self) -> Result<String, DriverError> {
        self.check_alive()?;
        let app = self.device.app();
        if app.running {
            Ok(format!(".{}", app.current))
        } else {
            Ok(".Launcher".to_string())
        }
    }

    async fn page_source(&self) -> Result<String, DriverError> {
        self.check_alive()?;
        Ok(self.device.app().page_source())
    }

    async fn quit(&self) -> Result<(), DriverError> {
        self.check_alive()?;
        self.quit.store(true, Ordering::SeqCst);
        self.device.recorder().quit_calls += 1;
        Ok(())
    }
}

enum ConnectBehavior {
    Open(Arc<FakeDevice>),
    Unreachable,
    Reject(String),
}

/// [`Connector`] that opens sessions on a [`FakeDevice`], or fails.
pub struct FakeConnector {
    behavior: ConnectBehavior,
    attempts: AtomicU64,
}

impl FakeConnector {
    pub fn new(device: Arc<FakeDevice>) -> Self {
        Self {
            behavior: ConnectBehavior::Open(device),
            attempts: AtomicU64::new(0),
        }
    }

    /// Every connect fails as if nothing listens on the endpoint.
    pub fn unreachable() -> Self {
        Self {
            behavior: ConnectBehavior::Unreachable,
            attempts: AtomicU64::new(0),
        }
    }

    /// Every connect is refused with `message`.
    pub fn rejecting(message: &str) -> Self {
        Self {
            behavior: ConnectBehavior::Reject(message.to_string()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        endpoint: &str,
        _capabilities: &Capabilities,
    ) -> Result<Arc<dyn AutomationDriver>, DriverError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ConnectBehavior::Open(device) => {
                device.dead.store(false, Ordering::SeqCst);
                Ok(device.driver())
            }
            ConnectBehavior::Unreachable => Err(DriverError::Unreachable(format!(
                "connection refused: {endpoint}"
            ))),
            ConnectBehavior::Reject(message) => Err(DriverError::SessionNotCreated(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dialogs_hide_the_screen_below() {
        let device = FakeDevice::new();
        device.show(FakeElement::text("My Tasks"));
        device.push_dialog("OK");
        let driver = device.driver();

        assert!(driver.find_element(&Locator::text("My Tasks")).await.is_err());
        let ok = driver.find_element(&Locator::text("OK")).await.unwrap();
        driver.click(&ok).await.unwrap();
        assert!(driver.find_element(&Locator::text("My Tasks")).await.is_ok());
    }

    #[tokio::test]
    async fn class_instance_counts_visible_widgets() {
        let device = FakeDevice::new();
        device.show(FakeElement::widget("android.widget.ImageButton").with_content_desc("first"));
        device.show(FakeElement::widget("android.widget.ImageButton").with_content_desc("second"));
        let driver = device.driver();

        let second = driver
            .find_element(&Locator::class_instance("android.widget.ImageButton", 1))
            .await
            .unwrap();
        driver.click(&second).await.unwrap();
        assert_eq!(device.clicked(), vec!["second".to_string()]);
    }

    #[tokio::test]
    async fn xpath_is_an_invalid_selector() {
        let device = FakeDevice::new();
        let err = device
            .driver()
            .find_element(&Locator::XPath("//*".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::InvalidSelector(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_elements_appear_on_the_tokio_clock() {
        let device = FakeDevice::new();
        device.show(FakeElement::text("Synced").appear_after(Duration::from_secs(3)));
        let driver = device.driver();

        assert!(driver.find_element(&Locator::text("Synced")).await.is_err());
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(driver.find_element(&Locator::text("Synced")).await.is_ok());
    }

    #[tokio::test]
    async fn terminated_app_shows_nothing_until_activated() {
        let device = FakeDevice::new();
        device.show(FakeElement::text("My Tasks"));
        device.navigate("detail");
        let driver = device.driver();

        assert!(driver.terminate_app("org.tasks").await.unwrap());
        assert!(!driver.terminate_app("org.tasks").await.unwrap());
        assert!(driver.find_element(&Locator::text("My Tasks")).await.is_err());

        driver.activate_app("org.tasks").await.unwrap();
        assert_eq!(device.current_screen(), HOME_SCREEN);
        assert!(driver.find_element(&Locator::text("My Tasks")).await.is_ok());
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_in_order() {
        let device = FakeDevice::new();
        device.show(FakeElement::text("OK"));
        device.fail_next_finds(1);
        let driver = device.driver();

        let err = driver.find_element(&Locator::text("OK")).await.unwrap_err();
        assert!(err.is_absence());
        assert!(driver.find_element(&Locator::text("OK")).await.is_ok());
        assert_eq!(device.find_calls(), 2);
    }

    #[tokio::test]
    async fn quit_twice_reports_invalid_session() {
        let device = FakeDevice::new();
        let driver = device.driver();
        driver.quit().await.unwrap();
        assert!(matches!(
            driver.quit().await,
            Err(DriverError::InvalidSession(_))
        ));
        assert_eq!(device.quit_calls(), 1);
    }

    #[tokio::test]
    async fn typing_shows_keyboard_and_back_hides_it() {
        let device = FakeDevice::new();
        device.show(FakeElement::edit_text("Task name"));
        let driver = device.driver();

        let field = driver.find_element(&Locator::hint("Task name")).await.unwrap();
        driver.send_keys(&field, "Buy milk").await.unwrap();
        assert!(device.is_keyboard_shown());
        assert_eq!(
            device.typed(),
            vec![("Task name".to_string(), "Buy milk".to_string())]
        );

        driver.back().await.unwrap();
        assert!(!device.is_keyboard_shown());
    }
}
