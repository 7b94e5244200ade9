mod harness;
mod test_home;
mod test_sidebar;
mod test_task_editor;
