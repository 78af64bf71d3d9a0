use casebook::capability::{
    LocalCapabilityProvider, LocalHandle, MemoryCapabilityProvider, MemoryHandle,
};
use casebook::store::{HandleStore, RootRecord, SledHandleStore};
use casebook::types::CaseStatus;
use casebook::CapabilityProvider;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn root_handle_round_trip() {
    let store = SledHandleStore::temporary().unwrap();
    let handle = MemoryCapabilityProvider::new("cases").root_handle();

    store
        .save_root(&RootRecord::from_handle(&handle).unwrap())
        .unwrap();
    let loaded = store.load_root().unwrap().unwrap();
    assert_eq!(loaded.decode::<MemoryHandle>().unwrap(), handle);
}

#[tokio::test]
async fn local_handle_survives_reopen() {
    let data = TempDir::new().unwrap();
    let cases = TempDir::new().unwrap();
    let provider = LocalCapabilityProvider::new().with_pick_target(cases.path());
    let handle = provider.pick_directory().await.unwrap();

    {
        let store = SledHandleStore::open(data.path()).unwrap();
        store
            .save_root(&RootRecord::from_handle(&handle).unwrap())
            .unwrap();
    }

    let store = SledHandleStore::open(data.path()).unwrap();
    let restored: LocalHandle = store.load_root().unwrap().unwrap().decode().unwrap();
    assert_eq!(restored, handle);
    assert_eq!(restored.path(), handle.path());
}

#[test]
fn concurrent_status_writes_for_different_keys() {
    let store: Arc<dyn HandleStore> = Arc::new(SledHandleStore::temporary().unwrap());
    let mut workers = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&store);
        workers.push(thread::spawn(move || {
            let status = if i % 2 == 0 {
                CaseStatus::Waiting
            } else {
                CaseStatus::Completed
            };
            store
                .save_status(&format!("case-{i:03}.json"), &status)
                .unwrap();
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }

    let map = store.load_all_status().unwrap();
    assert_eq!(map.len(), 8);
    assert_eq!(map["case-000.json"], CaseStatus::Waiting);
    assert_eq!(map["case-007.json"], CaseStatus::Completed);
}

#[test]
fn unknown_status_labels_are_kept() {
    let store = SledHandleStore::temporary().unwrap();
    let custom = CaseStatus::from("archived".to_string());
    store.save_status("old.json", &custom).unwrap();
    assert_eq!(
        store.load_all_status().unwrap()["old.json"],
        CaseStatus::Other("archived".to_string())
    );
}
