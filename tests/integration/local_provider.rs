use casebook::capability::LocalCapabilityProvider;
use casebook::cases::aggregate;
use casebook::permission::NegotiationState;
use casebook::store::{HandleStore, SledHandleStore};
use casebook::tree::DirectoryScanner;
use casebook::types::CaseStatus;
use casebook::{ApiError, CapabilityHandle, CapabilityProvider, CaseSession, SessionOptions};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CASE_001: &str = r#"{
  "version": 1,
  "case": {
    "id": "case-001",
    "title": "Stolen bicycle",
    "crime": "theft",
    "victim": "J. Doe",
    "date": "2024-03-02",
    "notes": "",
    "status": "waiting"
  },
  "updatedAt": "2024-03-02T10:00:00Z",
  "records": [{"kind": "photo", "file": "lock.jpg", "reviewer": "desk"}]
}"#;

fn case_folder() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("case-001/photos")).unwrap();
    fs::write(temp.path().join("case-001/case-001.json"), CASE_001).unwrap();
    fs::write(temp.path().join("case-001/photos/lock.jpg"), [0xff, 0xd8]).unwrap();
    fs::create_dir(temp.path().join("case-002")).unwrap();
    temp
}

fn root_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().to_string()
}

fn store_in(dir: &TempDir) -> Arc<dyn HandleStore> {
    Arc::new(SledHandleStore::open(&dir.path().join("store")).unwrap())
}

#[tokio::test]
async fn scan_real_directory_and_read_cases() {
    let folder = case_folder();
    let provider = LocalCapabilityProvider::new().with_pick_target(folder.path());
    let root = provider.pick_directory().await.unwrap();
    assert_eq!(root.name(), root_name(folder.path()));

    let report = DirectoryScanner::new(&provider).scan(&root).await.unwrap();
    assert!(report.is_complete());
    let name = root_name(folder.path());
    assert!(report
        .root
        .find_directory(&format!("{name}/case-001/photos"))
        .is_some());

    let cases = aggregate(&provider, &report.root, 4).await;
    assert_eq!(cases.summaries.len(), 1);
    let summary = &cases.summaries[0];
    assert_eq!(summary.title.as_deref(), Some("Stolen bicycle"));
    assert_eq!(summary.folder_name, "case-001");
    assert_eq!(summary.folder_path, format!("{name}/case-001"));
    assert_eq!(summary.status, CaseStatus::Waiting);
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_loop_is_not_followed() {
    let folder = case_folder();
    std::os::unix::fs::symlink(folder.path(), folder.path().join("case-001/back")).unwrap();
    let provider = LocalCapabilityProvider::new().with_pick_target(folder.path());
    let root = provider.pick_directory().await.unwrap();
    let name = root_name(folder.path());

    let report = DirectoryScanner::new(&provider).scan(&root).await.unwrap();
    assert!(report.is_complete());
    let case_dir = report
        .root
        .find_directory(&format!("{name}/case-001"))
        .unwrap();
    assert!(case_dir.files().any(|file| file.name == "back"));
    assert!(report
        .root
        .find_directory(&format!("{name}/case-001/back"))
        .is_none());
    // root, case-001, case-001.json, photos, lock.jpg, back, case-002
    assert_eq!(report.root.node_count(), 7);

    let cases = aggregate(&provider, &report.root, 4).await;
    assert_eq!(cases.summaries.len(), 1);
    assert_eq!(cases.failure_count(), 0);
}

#[tokio::test]
async fn status_update_rewrites_file_on_disk() {
    let folder = case_folder();
    let data = TempDir::new().unwrap();
    let provider = Arc::new(
        LocalCapabilityProvider::new()
            .with_pick_target(folder.path())
            .with_confirm_on_restore(false),
    );
    let mut session = CaseSession::new(provider, store_in(&data), SessionOptions::default());
    session.import_folder().await.unwrap();

    session
        .update_case_status("case-001.json", CaseStatus::Completed)
        .await
        .unwrap();

    let raw = fs::read_to_string(folder.path().join("case-001/case-001.json")).unwrap();
    let json: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(json["case"]["status"], "completed");
    assert_eq!(json["case"]["title"], "Stolen bicycle");
    assert_eq!(json["records"][0]["reviewer"], "desk");
    assert_ne!(json["updatedAt"], "2024-03-02T10:00:00Z");
    assert_eq!(session.status_of("case-001.json"), CaseStatus::Completed);
}

#[tokio::test]
async fn new_case_file_lands_in_current_directory() {
    let folder = case_folder();
    let data = TempDir::new().unwrap();
    let provider = Arc::new(
        LocalCapabilityProvider::new()
            .with_pick_target(folder.path())
            .with_confirm_on_restore(false),
    );
    let mut session = CaseSession::new(provider, store_in(&data), SessionOptions::default());
    session.import_folder().await.unwrap();
    let name = root_name(folder.path());

    session
        .click_directory(&format!("{name}/case-002"))
        .unwrap();
    let created = session.create_case_file().await.unwrap();
    assert_eq!(created, format!("{name}/case-002/case-002.json"));

    let raw = fs::read(folder.path().join("case-002/case-002.json")).unwrap();
    let json: Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["case"]["id"], "case-002");
    assert_eq!(json["records"], Value::Array(vec![]));
    assert!(session.find_file("case-002.json").is_some());

    // A second attempt must not clobber the file.
    assert!(matches!(
        session.create_case_file().await,
        Err(ApiError::Capability(_))
    ));
}

#[tokio::test]
async fn restore_without_terminal_is_denied_when_confirmation_required() {
    let folder = case_folder();
    let data = TempDir::new().unwrap();
    {
        let provider = Arc::new(
            LocalCapabilityProvider::new()
                .with_pick_target(folder.path())
                .with_confirm_on_restore(false),
        );
        let mut session =
            CaseSession::new(provider, store_in(&data), SessionOptions::default());
        session.import_folder().await.unwrap();
    }

    let confirming = Arc::new(
        LocalCapabilityProvider::new()
            .with_confirm_on_restore(true)
            .with_interactive(false),
    );
    let mut session = CaseSession::new(confirming, store_in(&data), SessionOptions::default());
    assert_eq!(session.restore().await.unwrap(), NegotiationState::Denied);
    assert!(session.snapshot().is_none());
    drop(session);

    let trusting = Arc::new(LocalCapabilityProvider::new().with_confirm_on_restore(false));
    let mut session = CaseSession::new(trusting, store_in(&data), SessionOptions::default());
    assert_eq!(session.restore().await.unwrap(), NegotiationState::Granted);
    assert!(session.find_file("case-001.json").is_some());
}
