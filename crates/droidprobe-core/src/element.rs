//! Element and screen types shared by every automation backend.
//!
//! These types describe what a driver hands back from a lookup. They carry no
//! behavior of their own; all interaction goes through the
//! [`AutomationDriver`](crate::driver::AutomationDriver) that produced them.

use serde::{Deserialize, Serialize};

use crate::locator::Locator;

/// A reference to one element inside a live automation session.
///
/// Handles are only meaningful for the session that produced them and may go
/// stale at any time (the element left the screen, the activity was
/// recreated). Backends report that as
/// [`DriverError::StaleElement`](crate::driver::DriverError::StaleElement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Backend element reference (the W3C `element-6066-...` value).
    pub id: String,

    /// The locator that matched this element.
    pub locator: Locator,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: id.into(),
            locator,
        }
    }
}

/// Size of the device screen in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

impl ScreenSize {
    /// Converts a screen-relative point (fractions in `0.0..=1.0`) into
    /// absolute pixel coordinates, clamped to the screen bounds.
    pub fn point_at(&self, x_fraction: f64, y_fraction: f64) -> (i32, i32) {
        let clamp = |v: f64| v.clamp(0.0, 1.0);
        let x = (f64::from(self.width) * clamp(x_fraction)).round() as i32;
        let y = (f64::from(self.height) * clamp(y_fraction)).round() as i32;
        (x.min(self.width.saturating_sub(1)).max(0), y.min(self.height.saturating_sub(1)).max(0))
    }
}
