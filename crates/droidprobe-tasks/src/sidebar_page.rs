//! The navigation drawer opened from the home screen.

use std::sync::Arc;

use droidprobe_core::session::AutomationSession;

use crate::base_page::{BasePage, PageError};

pub const MY_TASKS_TEXT: &str = "My Tasks";
pub const FILTERS_TEXT: &str = "Filters";
pub const TODAY_TEXT: &str = "Today";
pub const RECENTLY_MODIFIED_TEXT: &str = "Recently modified";
pub const TAGS_TEXT: &str = "Tags";
pub const PLACES_TEXT: &str = "Places";
pub const LOCAL_LISTS_TEXT: &str = "Local lists";
pub const DEFAULT_LIST_TEXT: &str = "Default list";
pub const CLOSE_DESC: &str = "Close navigation menu";

#[derive(Debug, Clone)]
pub struct SidebarPage {
    base: BasePage,
}

impl SidebarPage {
    pub fn new(session: Arc<AutomationSession>) -> Self {
        Self::from_base(BasePage::new(session))
    }

    pub fn from_base(base: BasePage) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    /// The drawer is open when its "My Tasks" entry is on screen.
    pub async fn is_sidebar_visible(&self) -> bool {
        self.base.is_text_visible(MY_TASKS_TEXT).await
    }

    pub async fn tap_my_tasks(&self) -> Result<(), PageError> {
        self.base.click_by_text(MY_TASKS_TEXT).await
    }

    pub async fn tap_today(&self) -> Result<(), PageError> {
        self.base.click_by_text(TODAY_TEXT).await
    }

    pub async fn tap_filters(&self) -> Result<(), PageError> {
        self.base.click_by_text(FILTERS_TEXT).await
    }

    pub async fn tap_tags(&self) -> Result<(), PageError> {
        self.base.click_by_text(TAGS_TEXT).await
    }

    pub async fn tap_default_list(&self) -> Result<(), PageError> {
        self.base.click_by_text(DEFAULT_LIST_TEXT).await
    }

    pub async fn close_sidebar(&self) -> Result<(), PageError> {
        self.base.click_by_accessibility_id(CLOSE_DESC).await
    }

    pub async fn is_today_visible(&self) -> bool {
        self.base.is_text_visible(TODAY_TEXT).await
    }

    pub async fn is_filters_visible(&self) -> bool {
        self.base.is_text_visible(FILTERS_TEXT).await
    }

    pub async fn is_recently_modified_visible(&self) -> bool {
        self.base.is_text_visible(RECENTLY_MODIFIED_TEXT).await
    }

    pub async fn is_places_visible(&self) -> bool {
        self.base.is_text_visible(PLACES_TEXT).await
    }

    pub async fn is_default_list_visible(&self) -> bool {
        self.base.is_text_visible(DEFAULT_LIST_TEXT).await
    }

    pub async fn is_local_lists_section_visible(&self) -> bool {
        self.base.is_text_visible(LOCAL_LISTS_TEXT).await
    }
}

#[cfg(test)]
mod tests {
    use droidprobe_core::testing::HOME_SCREEN;

    use super::*;
    use crate::fake_app::{page_on, tasks_app, SIDEBAR};

    #[tokio::test(start_paused = true)]
    async fn drawer_lists_navigation_entries() {
        let device = tasks_app();
        device.navigate(SIDEBAR);
        let sidebar = SidebarPage::from_base(page_on(&device));
        assert!(sidebar.is_sidebar_visible().await);
        assert!(sidebar.is_today_visible().await);
        assert!(sidebar.is_filters_visible().await);
        assert!(sidebar.is_recently_modified_visible().await);
        assert!(sidebar.is_places_visible().await);
        assert!(sidebar.is_local_lists_section_visible().await);
        assert!(sidebar.is_default_list_visible().await);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_navigate() {
        let device = tasks_app();
        let sidebar = SidebarPage::from_base(page_on(&device));

        for (tap, screen) in [("today", "today"), ("filters", "filters"), ("default", "default_list")] {
            device.navigate(SIDEBAR);
            match tap {
                "today" => sidebar.tap_today().await.unwrap(),
                "filters" => sidebar.tap_filters().await.unwrap(),
                _ => sidebar.tap_default_list().await.unwrap(),
            }
            assert_eq!(device.current_screen(), screen);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn close_returns_home() {
        let device = tasks_app();
        device.navigate(SIDEBAR);
        let sidebar = SidebarPage::from_base(page_on(&device));
        sidebar.close_sidebar().await.unwrap();
        assert_eq!(device.current_screen(), HOME_SCREEN);

        device.navigate(SIDEBAR);
        sidebar.tap_my_tasks().await.unwrap();
        assert_eq!(device.current_screen(), HOME_SCREEN);
    }
}
