use casebook::config::CasebookConfig;
use casebook::store::{HandleStore, SledHandleStore};
use casebook::tooling::{Cli, CliContext, Commands, StatusCommands};
use casebook::ApiError;
use clap::Parser;
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn case_folder() -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("case-001")).unwrap();
    fs::write(
        temp.path().join("case-001/case-001.json"),
        r#"{"version":1,"case":{"id":"case-001","title":"Broken window","status":null},"records":[]}"#,
    )
    .unwrap();
    fs::create_dir(temp.path().join("case-002")).unwrap();
    temp
}

fn context(data: &TempDir) -> CliContext {
    let mut config = CasebookConfig::default();
    config.permission.confirm_on_restore = false;
    let store: Arc<dyn HandleStore> =
        Arc::new(SledHandleStore::open(&data.path().join("store")).unwrap());
    CliContext::with_store(config, store).with_interactive(false)
}

fn status(command: StatusCommands) -> Commands {
    Commands::Status { command }
}

#[test]
fn parse_matrix() {
    let accepted: &[&[&str]] = &[
        &["casebook", "import", "/tmp/cases"],
        &["casebook", "tree", "--expand-all"],
        &["casebook", "cases", "--format", "json"],
        &["casebook", "open", "case-001.json"],
        &["casebook", "status", "list"],
        &["casebook", "status", "get", "case-001.json"],
        &["casebook", "new", "--dir", "cases/case-002"],
        &["casebook", "clear", "--log-output", "stderr"],
        &["casebook", "--config", "/tmp/casebook.toml", "config"],
    ];
    for args in accepted {
        assert!(Cli::try_parse_from(*args).is_ok(), "rejected {:?}", args);
    }

    let rejected: &[&[&str]] = &[
        &["casebook"],
        &["casebook", "import"],
        &["casebook", "status", "set", "case-001.json"],
        &["casebook", "open"],
        &["casebook", "frobnicate"],
    ];
    for args in rejected {
        assert!(Cli::try_parse_from(*args).is_err(), "accepted {:?}", args);
    }
}

#[tokio::test]
async fn full_command_flow() {
    let folder = case_folder();
    let data = TempDir::new().unwrap();
    let context = context(&data);
    let root = folder
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string();

    let imported = context
        .execute(&Commands::Import {
            dir: folder.path().to_path_buf(),
        })
        .await
        .unwrap();
    assert!(imported.contains(&root));
    assert!(imported.contains("case-001"));

    let set = context
        .execute(&status(StatusCommands::Set {
            file: "case-001.json".to_string(),
            status: "urgent".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(set, "case-001.json: urgent");
    let got = context
        .execute(&status(StatusCommands::Get {
            file: "case-001.json".to_string(),
        }))
        .await
        .unwrap();
    assert_eq!(got, "case-001.json: urgent");
    let listed = context.execute(&status(StatusCommands::List)).await.unwrap();
    assert!(listed.contains("case-001.json"));

    let tree = context
        .execute(&Commands::Tree {
            expand_all: true,
            expand: vec![],
        })
        .await
        .unwrap();
    assert!(tree.contains("case-001.json"));
    assert!(tree.contains("urgent"));

    let json = context
        .execute(&Commands::Cases {
            format: "json".to_string(),
        })
        .await
        .unwrap();
    let parsed: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["cases"][0]["id"], "case-001");
    assert_eq!(parsed["cases"][0]["status"], "urgent");
    assert_eq!(parsed["cases"][0]["folderName"], "case-001");
    assert_eq!(parsed["failures"].as_array().unwrap().len(), 0);

    let text = context
        .execute(&Commands::Cases {
            format: "text".to_string(),
        })
        .await
        .unwrap();
    assert!(text.contains("Broken window"));
    assert!(matches!(
        context
            .execute(&Commands::Cases {
                format: "xml".to_string()
            })
            .await,
        Err(ApiError::ConfigError(_))
    ));

    let opened = context
        .execute(&Commands::Open {
            file: "case-001.json".to_string(),
        })
        .await
        .unwrap();
    assert!(opened.contains("Broken window"));
    assert!(matches!(
        context
            .execute(&Commands::Open {
                file: "missing.json".to_string()
            })
            .await,
        Err(ApiError::CaseNotFound(_))
    ));

    let created = context
        .execute(&Commands::New {
            dir: Some(format!("{root}/case-002")),
        })
        .await
        .unwrap();
    assert_eq!(created, format!("Created {root}/case-002/case-002.json"));
    assert!(folder.path().join("case-002/case-002.json").is_file());

    context.execute(&Commands::Clear).await.unwrap();
    assert!(matches!(
        context
            .execute(&Commands::Tree {
                expand_all: false,
                expand: vec![]
            })
            .await,
        Err(ApiError::NoRoot)
    ));
}

#[tokio::test]
async fn confirmation_required_without_terminal_is_refused() {
    let folder = case_folder();
    let data = TempDir::new().unwrap();
    context(&data)
        .execute(&Commands::Import {
            dir: folder.path().to_path_buf(),
        })
        .await
        .unwrap();

    let store: Arc<dyn HandleStore> =
        Arc::new(SledHandleStore::open(&data.path().join("store")).unwrap());
    let strict = CliContext::with_store(CasebookConfig::default(), store).with_interactive(false);
    assert!(matches!(
        strict
            .execute(&Commands::Cases {
                format: "text".to_string()
            })
            .await,
        Err(ApiError::PermissionNotGranted)
    ));
}
