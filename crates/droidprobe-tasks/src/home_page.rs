//! The main task-list screen.

use std::sync::Arc;
use std::time::Duration;

use droidprobe_core::locator::Locator;
use droidprobe_core::session::AutomationSession;

use crate::base_page::{BasePage, PageError};

/// Toolbar title on the home screen.
pub const TITLE_TEXT: &str = "My Tasks";

/// Content description of the floating "add" button.
pub const FAB_DESC: &str = "Create new task";

pub const SEARCH_BUTTON_ID: &str = "org.tasks:id/menu_search";
pub const SEARCH_BUTTON_DESC: &str = "Search";
pub const SORT_BUTTON_ID: &str = "org.tasks:id/menu_sort";

/// Shown instead of the list when there are no tasks.
pub const EMPTY_STATE_TEXT: &str = "There are no tasks here.";

/// How long a freshly saved task gets to show up in the list.
const TASK_IN_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Home screen: toolbar, task list and bottom app bar.
#[derive(Debug, Clone)]
pub struct HomePage {
    base: BasePage,
}

impl HomePage {
    pub fn new(session: Arc<AutomationSession>) -> Self {
        Self::from_base(BasePage::new(session))
    }

    pub fn from_base(base: BasePage) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    /// The navigation-drawer toggle has neither a description nor an id; it is
    /// the first image button on the screen.
    pub fn hamburger_button() -> Locator {
        Locator::class_instance("android.widget.ImageButton", 0)
    }

    pub async fn tap_fab(&self) -> Result<(), PageError> {
        self.base.click_by_accessibility_id(FAB_DESC).await
    }

    pub async fn is_home_screen_visible(&self) -> bool {
        self.base.is_text_visible(TITLE_TEXT).await
    }

    pub async fn is_fab_visible(&self) -> bool {
        self.base.is_accessibility_id_visible(FAB_DESC).await
    }

    pub async fn is_search_button_visible(&self) -> bool {
        self.base.is_accessibility_id_visible(SEARCH_BUTTON_DESC).await
    }

    pub async fn is_task_in_list(&self, title: &str) -> bool {
        self.base
            .is_text_visible_within(title, TASK_IN_LIST_TIMEOUT)
            .await
    }

    pub async fn is_empty_state_visible(&self) -> bool {
        self.base.is_text_visible(EMPTY_STATE_TEXT).await
    }

    pub async fn open_sidebar(&self) -> Result<(), PageError> {
        self.base.click(&Self::hamburger_button()).await
    }

    pub async fn tap_search_button(&self) -> Result<(), PageError> {
        self.base.click(&Locator::resource_id(SEARCH_BUTTON_ID)).await
    }

    pub async fn tap_sort_button(&self) -> Result<(), PageError> {
        self.base.click(&Locator::resource_id(SORT_BUTTON_ID)).await
    }
}
