use droidprobe_tasks::{HomePage, TaskPage};

use super::harness::run;

#[tokio::test]
#[ignore]
async fn tc03_add_task_with_title() {
    run(|session| async move {
        let home = HomePage::new(session.clone());
        let task = TaskPage::new(session);

        home.tap_fab().await.unwrap();
        task.enter_title("TC03 Buy milk and eggs").await.unwrap();
        task.save_task().await.unwrap();

        assert!(home.is_task_in_list("TC03 Buy milk and eggs").await);
    })
    .await;
}

#[tokio::test]
#[ignore]
async fn tc04_add_task_with_description() {
    run(|session| async move {
        let home = HomePage::new(session.clone());
        let task = TaskPage::new(session);

        home.tap_fab().await.unwrap();
        task.enter_title("TC04 Prepare project report").await.unwrap();
        task.enter_description("Include charts, summary and appendix.")
            .await
            .unwrap();
        task.save_task().await.unwrap();

        assert!(home.is_task_in_list("TC04 Prepare project report").await);
    })
    .await;
}

#[tokio::test]
#[ignore]
async fn tc09_new_task_has_no_due_date() {
    run(|session| async move {
        HomePage::new(session.clone()).tap_fab().await.unwrap();
        let task = TaskPage::new(session);
        assert!(task.is_no_due_date_shown().await);
        task.base().press_back().await.unwrap();
    })
    .await;
}
