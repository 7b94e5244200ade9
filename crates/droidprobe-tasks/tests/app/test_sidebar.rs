use droidprobe_tasks::{HomePage, SidebarPage};

use super::harness::run;

#[tokio::test]
#[ignore]
async fn tc05_hamburger_opens_sidebar() {
    run(|session| async move {
        HomePage::new(session.clone()).open_sidebar().await.unwrap();
        let sidebar = SidebarPage::new(session);
        assert!(sidebar.is_sidebar_visible().await);
        sidebar.close_sidebar().await.unwrap();
    })
    .await;
}

#[tokio::test]
#[ignore]
async fn tc06_sidebar_lists_today() {
    run(|session| async move {
        HomePage::new(session.clone()).open_sidebar().await.unwrap();
        let sidebar = SidebarPage::new(session);
        assert!(
            sidebar.is_today_visible().await,
            "\"Today\" missing from the navigation drawer"
        );
    })
    .await;
}

#[tokio::test]
#[ignore]
async fn tc07_sidebar_lists_filters() {
    run(|session| async move {
        HomePage::new(session.clone()).open_sidebar().await.unwrap();
        let sidebar = SidebarPage::new(session);
        assert!(
            sidebar.is_filters_visible().await,
            "\"Filters\" missing from the navigation drawer"
        );
    })
    .await;
}

#[tokio::test]
#[ignore]
async fn tc10_sidebar_lists_default_list() {
    run(|session| async move {
        HomePage::new(session.clone()).open_sidebar().await.unwrap();
        let sidebar = SidebarPage::new(session);
        assert!(
            sidebar.is_default_list_visible().await,
            "\"Default list\" missing from the navigation drawer"
        );
    })
    .await;
}
