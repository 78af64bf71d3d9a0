use casebook::capability::MemoryCapabilityProvider;
use casebook::permission::NegotiationState;
use casebook::store::{HandleStore, SledHandleStore};
use casebook::types::{CaseStatus, PermissionState};
use casebook::{ApiError, CaseSession, SessionOptions};
use std::sync::Arc;
use tempfile::TempDir;

fn provider() -> Arc<MemoryCapabilityProvider> {
    let provider = Arc::new(MemoryCapabilityProvider::new("cases"));
    provider.add_file(
        "case-001/case-001.json",
        r#"{"version":1,"case":{"id":"case-001","status":"waiting"},"records":[]}"#,
    );
    provider.add_file(
        "case-002/case-002.json",
        r#"{"version":1,"case":{"id":"case-002","resume":"legacy notes"},"records":[]}"#,
    );
    provider.add_dir("case-003");
    provider
}

fn open_store(dir: &TempDir) -> Arc<dyn HandleStore> {
    Arc::new(SledHandleStore::open(&dir.path().join("store")).unwrap())
}

#[tokio::test]
async fn reload_restores_tree_and_statuses() {
    let temp = TempDir::new().unwrap();
    let provider = provider();
    {
        let store = open_store(&temp);
        let mut session = CaseSession::new(provider.clone(), store, SessionOptions::default());
        session.import_folder().await.unwrap();
        session
            .update_case_status("case-002.json", CaseStatus::Urgent)
            .await
            .unwrap();
    }

    // The host keeps the grant across reloads.
    provider.set_permission(PermissionState::Granted);
    let store = open_store(&temp);
    let mut session = CaseSession::new(provider.clone(), store, SessionOptions::default());
    assert_eq!(session.status_of("case-002.json"), CaseStatus::Urgent);

    assert_eq!(session.restore().await.unwrap(), NegotiationState::Granted);
    assert_eq!(provider.permission_requests(), 0);
    let snapshot = session.snapshot().unwrap();
    assert_eq!(snapshot.root().path, "cases");
    assert!(session.tree_state().is_expanded("cases"));
    assert_eq!(session.tree_state().current_dir(), Some("cases"));

    let report = session.summaries().await.unwrap();
    let ids: Vec<&str> = report.summaries.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["case-001", "case-002"]);
    assert_eq!(report.summaries[1].status, CaseStatus::Urgent);
    assert_eq!(report.summaries[1].notes.as_deref(), Some("legacy notes"));
}

#[tokio::test]
async fn denied_permission_on_reload_shows_no_tree() {
    let temp = TempDir::new().unwrap();
    let provider = provider();
    {
        let mut session =
            CaseSession::new(provider.clone(), open_store(&temp), SessionOptions::default());
        session.import_folder().await.unwrap();
    }
    provider.set_permission(PermissionState::Denied);
    let listings = provider.listing_count();

    let mut session =
        CaseSession::new(provider.clone(), open_store(&temp), SessionOptions::default());
    assert_eq!(session.restore().await.unwrap(), NegotiationState::Denied);
    assert!(session.snapshot().is_none());
    assert_eq!(provider.permission_requests(), 0);
    assert_eq!(provider.listing_count(), listings);
    assert!(matches!(
        session.refresh().await,
        Err(ApiError::NoRoot)
    ));
}

#[tokio::test]
async fn declined_prompt_is_silent() {
    let temp = TempDir::new().unwrap();
    let provider = provider();
    {
        let mut session =
            CaseSession::new(provider.clone(), open_store(&temp), SessionOptions::default());
        session.import_folder().await.unwrap();
    }
    provider.set_permission(PermissionState::Prompt);
    provider.set_request_response(PermissionState::Denied);

    let mut session =
        CaseSession::new(provider.clone(), open_store(&temp), SessionOptions::default());
    assert_eq!(session.restore().await.unwrap(), NegotiationState::Denied);
    assert_eq!(provider.permission_requests(), 1);
    assert!(session.snapshot().is_none());
}

#[tokio::test]
async fn rescan_keeps_expanded_directories_that_survive() {
    let temp = TempDir::new().unwrap();
    let provider = provider();
    let mut session =
        CaseSession::new(provider.clone(), open_store(&temp), SessionOptions::default());
    session.import_folder().await.unwrap();

    session.expand_all();
    session.click_directory("cases/case-003").unwrap();
    provider.remove("case-003");
    provider.add_dir("case-004");
    session.refresh().await.unwrap();

    let state = session.tree_state();
    assert!(state.is_expanded("cases/case-001"));
    assert!(!state.is_expanded("cases/case-003"));
    assert!(!state.is_expanded("cases/case-004"));
    assert_eq!(state.current_dir(), Some("cases"));

    session.collapse_all();
    assert!(session.tree_state().expanded().is_empty());
}
