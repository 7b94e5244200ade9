//! Element locators and their wire representation.
//!
//! A [`Locator`] describes *what* to look for; [`Locator::strategy`] and
//! [`Locator::selector`] turn it into the `(using, value)` pair a WebDriver
//! `find element` command expects. Text-based locators are expressed as
//! UiAutomator selectors, which is what UiAutomator2 resolves fastest on
//! Compose-heavy screens.
//!
//! # Example
//!
//! ```
//! use droidprobe_core::locator::Locator;
//!
//! let ok = Locator::text("OK");
//! assert_eq!(ok.strategy(), "-android uiautomator");
//! assert_eq!(ok.selector(), r#"new UiSelector().text("OK")"#);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// How to find a single UI element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// Exact visible text.
    Text(String),
    /// Visible text containing the fragment.
    TextContains(String),
    /// Android content description.
    AccessibilityId(String),
    /// Android resource id, e.g. `org.tasks:id/fab`.
    ResourceId(String),
    /// An `EditText` whose hint matches exactly.
    Hint(String),
    /// The n-th element of a widget class, zero-based.
    ClassInstance { class: String, instance: u32 },
    /// Raw XPath expression.
    XPath(String),
}

impl Locator {
    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text(text.into())
    }

    pub fn text_contains(fragment: impl Into<String>) -> Self {
        Locator::TextContains(fragment.into())
    }

    pub fn accessibility_id(desc: impl Into<String>) -> Self {
        Locator::AccessibilityId(desc.into())
    }

    pub fn resource_id(id: impl Into<String>) -> Self {
        Locator::ResourceId(id.into())
    }

    pub fn hint(hint: impl Into<String>) -> Self {
        Locator::Hint(hint.into())
    }

    pub fn class_instance(class: impl Into<String>, instance: u32) -> Self {
        Locator::ClassInstance {
            class: class.into(),
            instance,
        }
    }

    /// The WebDriver `using` value for this locator.
    pub fn strategy(&self) -> &'static str {
        match self {
            Locator::Text(_) | Locator::TextContains(_) | Locator::ClassInstance { .. } => {
                "-android uiautomator"
            }
            Locator::AccessibilityId(_) => "accessibility id",
            Locator::ResourceId(_) => "id",
            Locator::Hint(_) | Locator::XPath(_) => "xpath",
        }
    }

    /// The WebDriver `value` for this locator.
    pub fn selector(&self) -> String {
        match self {
            Locator::Text(text) => format!("new UiSelector().text(\"{}\")", escape(text)),
            Locator::TextContains(fragment) => {
                format!("new UiSelector().textContains(\"{}\")", escape(fragment))
            }
            Locator::ClassInstance { class, instance } => format!(
                "new UiSelector().className(\"{}\").instance({})",
                escape(class),
                instance
            ),
            Locator::AccessibilityId(desc) => desc.clone(),
            Locator::ResourceId(id) => id.clone(),
            Locator::Hint(hint) => format!(
                "//android.widget.EditText[@hint={}]",
                xpath_literal(hint)
            ),
            Locator::XPath(xpath) => xpath.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Text(text) => write!(f, "text '{text}'"),
            Locator::TextContains(fragment) => write!(f, "text containing '{fragment}'"),
            Locator::AccessibilityId(desc) => write!(f, "accessibility id '{desc}'"),
            Locator::ResourceId(id) => write!(f, "resource id '{id}'"),
            Locator::Hint(hint) => write!(f, "hint '{hint}'"),
            Locator::ClassInstance { class, instance } => write!(f, "{class}[{instance}]"),
            Locator::XPath(xpath) => write!(f, "xpath {xpath}"),
        }
    }
}

/// Escapes a string for use inside a double-quoted UiSelector argument.
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Builds an XPath string literal, falling back to `concat()` when the value
/// contains both quote kinds.
fn xpath_literal(value: &str) -> String {
    if !value.contains('"') {
        format!("\"{value}\"")
    } else if !value.contains('\'') {
        format!("'{value}'")
    } else {
        let parts: Vec<String> = value
            .split('"')
            .map(|part| format!("\"{part}\""))
            .collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// An ordered list of alternative locators for the same element.
///
/// Lookups try each locator in turn and the first one that resolves wins.
/// Misses on earlier entries are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocatorChain(Vec<Locator>);

impl LocatorChain {
    pub fn new(locators: Vec<Locator>) -> Self {
        Self(locators)
    }

    /// Appends a fallback locator.
    pub fn or(mut self, locator: Locator) -> Self {
        self.0.push(locator);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locator> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Locator> for LocatorChain {
    fn from(locator: Locator) -> Self {
        Self(vec![locator])
    }
}

impl fmt::Display for LocatorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" | "))
    }
}
