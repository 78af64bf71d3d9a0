use casebook::capability::{MemoryCapabilityProvider, MemoryHandle};
use casebook::cases::aggregate;
use casebook::tree::{DirectoryNode, DirectoryScanner, Node, ScanErrorPolicy};
use casebook::types::{CaseStatus, EntryKind, PermissionState};
use std::collections::HashSet;

fn case_json(id: &str, status: &str) -> String {
    format!(
        r#"{{"version":1,"case":{{"id":"{id}","title":"Case {id}","crime":"theft","victim":"n/a","date":"2024-01-01","notes":"","status":"{status}"}},"updatedAt":"2024-01-01T00:00:00Z","records":[]}}"#
    )
}

fn granted(provider: MemoryCapabilityProvider) -> MemoryCapabilityProvider {
    provider.set_permission(PermissionState::Granted);
    provider
}

fn assert_paths_consistent(dir: &DirectoryNode<MemoryHandle>, seen: &mut HashSet<String>) {
    assert!(seen.insert(dir.path.clone()), "duplicate path {}", dir.path);
    for child in &dir.children {
        assert_eq!(child.path(), format!("{}/{}", dir.path, child.name()));
        match child {
            Node::Directory(sub) => assert_paths_consistent(sub, seen),
            Node::File(file) => assert!(seen.insert(file.path.clone())),
        }
    }
}

#[tokio::test]
async fn scan_then_aggregate_case_folder() {
    let provider = granted(MemoryCapabilityProvider::new("cases"));
    provider.add_file("case-001/case-001.json", case_json("case-001", "waiting"));
    provider.add_file("case-001/evidence.pdf", vec![0x25, 0x50, 0x44, 0x46]);

    let report = DirectoryScanner::new(&provider)
        .scan(&provider.root_handle())
        .await
        .unwrap();
    assert!(report.is_complete());

    let cases = aggregate(&provider, &report.root, 8).await;
    assert_eq!(cases.summaries.len(), 1);
    assert_eq!(cases.summaries[0].id, "case-001");
    assert_eq!(cases.summaries[0].status, CaseStatus::Waiting);
    assert_eq!(cases.summaries[0].file_name, "case-001.json");
    assert_eq!(cases.failure_count(), 0);
}

#[tokio::test]
async fn scanned_paths_are_unique_and_joined() {
    let provider = granted(MemoryCapabilityProvider::new("cases"));
    provider.add_file("a/b/c/deep.txt", "x");
    provider.add_file("a/b/other.txt", "x");
    provider.add_dir("a/empty");
    provider.add_file("z.txt", "x");

    let report = DirectoryScanner::new(&provider)
        .scan(&provider.root_handle())
        .await
        .unwrap();
    assert_eq!(report.root.path, "cases");
    let mut seen = HashSet::new();
    assert_paths_consistent(&report.root, &mut seen);
    assert_eq!(seen.len(), report.root.node_count());
}

#[tokio::test]
async fn rescanning_unchanged_tree_is_structurally_equal() {
    let provider = granted(MemoryCapabilityProvider::new("cases"));
    provider.add_file("case-001/case-001.json", case_json("case-001", "none"));
    provider.add_dir("case-002/photos");

    let scanner = DirectoryScanner::new(&provider);
    let first = scanner.scan(&provider.root_handle()).await.unwrap();
    let second = scanner.scan(&provider.root_handle()).await.unwrap();
    assert_eq!(first.root.outline(), second.root.outline());
    assert_eq!(
        first.root.outline()[0],
        ("cases".to_string(), EntryKind::Directory)
    );
}

#[tokio::test]
async fn unreadable_subtree_fails_or_is_skipped() {
    let provider = granted(MemoryCapabilityProvider::new("cases"));
    provider.add_file("good/good.json", case_json("good", "urgent"));
    provider.add_file("bad/bad.json", case_json("bad", "none"));
    provider.fail_listing("bad");

    let err = DirectoryScanner::new(&provider)
        .scan(&provider.root_handle())
        .await
        .unwrap_err();
    assert_eq!(err.path, "cases/bad");

    let report = DirectoryScanner::new(&provider)
        .with_policy(ScanErrorPolicy::Skip)
        .scan(&provider.root_handle())
        .await
        .unwrap();
    assert_eq!(report.failures.len(), 1);
    let cases = aggregate(&provider, &report.root, 8).await;
    assert_eq!(cases.summaries.len(), 1);
    assert_eq!(cases.summaries[0].status, CaseStatus::Urgent);
}

#[tokio::test]
async fn one_malformed_case_file_is_reported_not_fatal() {
    let provider = granted(MemoryCapabilityProvider::new("cases"));
    provider.add_file("case-001/case-001.json", case_json("case-001", "completed"));
    provider.add_file("case-002/case-002.json", r#"{"case": {"id": "case-002""#);
    provider.add_file("case-003/notes.json", case_json("case-003", "waiting"));

    let report = DirectoryScanner::new(&provider)
        .scan(&provider.root_handle())
        .await
        .unwrap();
    let cases = aggregate(&provider, &report.root, 2).await;
    assert_eq!(cases.summaries.len(), 1);
    assert_eq!(cases.summaries[0].id, "case-001");
    assert_eq!(cases.failure_count(), 1);
    assert_eq!(cases.failures[0].path(), "cases/case-002/case-002.json");
}
