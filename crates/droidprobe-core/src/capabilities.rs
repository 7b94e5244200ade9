//! Appium capability set for a new session.
//!
//! The W3C new-session payload only allows standard keys unprefixed; everything
//! Appium-specific travels under the `appium:` vendor prefix. [`Capabilities`]
//! serializes straight into that shape.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Capabilities requested when a session is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(rename = "platformName")]
    pub platform_name: String,

    #[serde(rename = "appium:automationName")]
    pub automation_name: String,

    #[serde(rename = "appium:deviceName")]
    pub device_name: String,

    /// Target app identifier.
    #[serde(rename = "appium:appPackage")]
    pub app_package: String,

    /// Entry activity launched when the session starts.
    #[serde(rename = "appium:appActivity")]
    pub app_activity: String,

    /// Keep app data between sessions.
    #[serde(rename = "appium:noReset")]
    pub no_reset: bool,

    /// Restart the app into the foreground when the session starts.
    #[serde(rename = "appium:forceAppLaunch")]
    pub force_app_launch: bool,

    /// Grant all runtime permissions on install, so permission dialogs
    /// never appear.
    #[serde(rename = "appium:autoGrantPermissions")]
    pub auto_grant_permissions: bool,

    /// Installable package; when present Appium installs it before launch.
    #[serde(rename = "appium:app", default, skip_serializing_if = "Option::is_none")]
    pub app: Option<PathBuf>,
}

impl Capabilities {
    /// Body of a W3C `POST /session` request.
    pub fn new_session_body(&self) -> Value {
        json!({
            "capabilities": {
                "alwaysMatch": self,
                "firstMatch": [{}],
            }
        })
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            platform_name: "Android".to_string(),
            automation_name: "UiAutomator2".to_string(),
            device_name: "emulator-5554".to_string(),
            app_package: "org.tasks".to_string(),
            app_activity: "com.todoroo.astrid.activity.MainActivity".to_string(),
            no_reset: true,
            force_app_launch: true,
            auto_grant_permissions: true,
            app: None,
        }
    }
}
