//! The add/edit task screen.

use std::sync::Arc;

use droidprobe_core::session::AutomationSession;

use crate::base_page::{BasePage, PageError};

pub const TITLE_HINT: &str = "Task name";
pub const DESCRIPTION_HINT: &str = "Description";
pub const SAVE_DESC: &str = "Save";

pub const NO_DUE_DATE_TEXT: &str = "No due date";
pub const NO_START_DATE_TEXT: &str = "No start date";
pub const ADD_SUBTASK_TEXT: &str = "Add subtask";
pub const ADD_TAGS_TEXT: &str = "Add tags";
pub const DEFAULT_LIST_TEXT: &str = "Default list";

/// Task editor.
#[derive(Debug, Clone)]
pub struct TaskPage {
    base: BasePage,
}

impl TaskPage {
    pub fn new(session: Arc<AutomationSession>) -> Self {
        Self::from_base(BasePage::new(session))
    }

    pub fn from_base(base: BasePage) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BasePage {
        &self.base
    }

    /// Type the task title, then get the keyboard out of the way.
    pub async fn enter_title(&self, title: &str) -> Result<(), PageError> {
        self.base.type_into_hint(TITLE_HINT, title).await?;
        self.base.hide_keyboard().await;
        Ok(())
    }

    pub async fn enter_description(&self, text: &str) -> Result<(), PageError> {
        self.base.type_into_hint(DESCRIPTION_HINT, text).await?;
        self.base.hide_keyboard().await;
        Ok(())
    }

    /// Save and return to the list.
    pub async fn save_task(&self) -> Result<(), PageError> {
        self.base.click_by_accessibility_id(SAVE_DESC).await
    }

    pub async fn is_no_due_date_shown(&self) -> bool {
        self.base.is_text_visible(NO_DUE_DATE_TEXT).await
    }

    pub async fn is_no_start_date_shown(&self) -> bool {
        self.base.is_text_visible(NO_START_DATE_TEXT).await
    }

    pub async fn is_add_subtask_shown(&self) -> bool {
        self.base.is_text_visible(ADD_SUBTASK_TEXT).await
    }

    pub async fn is_add_tags_shown(&self) -> bool {
        self.base.is_text_visible(ADD_TAGS_TEXT).await
    }

    pub async fn is_default_list_shown(&self) -> bool {
        self.base.is_text_visible(DEFAULT_LIST_TEXT).await
    }
}
