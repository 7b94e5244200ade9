//! A fake Tasks.org for page-object tests.

use std::sync::Arc;

use droidprobe_core::capabilities::Capabilities;
use droidprobe_core::session::AutomationSession;
use droidprobe_core::testing::{ClickEffect, FakeApp, FakeDevice, FakeElement, HOME_SCREEN};

use crate::base_page::BasePage;

pub const EDITOR: &str = "editor";
pub const SIDEBAR: &str = "sidebar";
pub const SEARCH: &str = "search";

fn go(screen: &str) -> ClickEffect {
    ClickEffect::Navigate(screen.to_string())
}

fn save_task() -> ClickEffect {
    ClickEffect::Custom(Arc::new(|app: &mut FakeApp| {
        if let Some(title) = app.field_text("Task name") {
            app.add_element(HOME_SCREEN, FakeElement::text(&title));
        }
        app.clear_fields(EDITOR);
        app.navigate(HOME_SCREEN);
    }))
}

/// Home screen, task editor, navigation drawer and search, wired together
/// the way the real app navigates.
pub fn tasks_app() -> Arc<FakeDevice> {
    let device = FakeDevice::new();

    device.add_to_screen(
        HOME_SCREEN,
        FakeElement::widget("android.widget.ImageButton").on_click(go(SIDEBAR)),
    );
    device.add_to_screen(HOME_SCREEN, FakeElement::text("My Tasks"));
    device.add_to_screen(
        HOME_SCREEN,
        FakeElement::accessibility_id("Create new task")
            .with_resource_id("org.tasks:id/fab")
            .on_click(go(EDITOR)),
    );
    device.add_to_screen(
        HOME_SCREEN,
        FakeElement::resource_id("org.tasks:id/menu_search")
            .with_content_desc("Search")
            .on_click(go(SEARCH)),
    );
    device.add_to_screen(
        HOME_SCREEN,
        FakeElement::resource_id("org.tasks:id/menu_sort").with_content_desc("Sort"),
    );
    device.add_to_screen(HOME_SCREEN, FakeElement::text("There are no tasks here."));

    device.add_to_screen(EDITOR, FakeElement::edit_text("Task name"));
    device.add_to_screen(EDITOR, FakeElement::edit_text("Description"));
    device.add_to_screen(EDITOR, FakeElement::accessibility_id("Save").on_click(save_task()));
    for row in ["No due date", "No start date", "Add subtask", "Add tags", "Default list"] {
        device.add_to_screen(EDITOR, FakeElement::text(row));
    }

    device.add_to_screen(SIDEBAR, FakeElement::text("My Tasks").on_click(go(HOME_SCREEN)));
    device.add_to_screen(SIDEBAR, FakeElement::text("Filters").on_click(go("filters")));
    device.add_to_screen(SIDEBAR, FakeElement::text("Today").on_click(go("today")));
    for row in ["Recently modified", "Tags", "Places", "Local lists"] {
        device.add_to_screen(SIDEBAR, FakeElement::text(row));
    }
    device.add_to_screen(
        SIDEBAR,
        FakeElement::text("Default list").on_click(go("default_list")),
    );
    device.add_to_screen(
        SIDEBAR,
        FakeElement::accessibility_id("Close navigation menu").on_click(go(HOME_SCREEN)),
    );

    device.add_to_screen(SEARCH, FakeElement::edit_text("Search"));

    device
}

pub fn session_on(device: &Arc<FakeDevice>) -> Arc<AutomationSession> {
    Arc::new(AutomationSession::from_driver(
        device.driver(),
        "fake://",
        Capabilities::default(),
    ))
}

pub fn page_on(device: &Arc<FakeDevice>) -> BasePage {
    BasePage::new(session_on(device))
}
