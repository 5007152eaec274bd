//! Persistent Store and Request Surface Tests
//!
//! A file-backed store keeps every committed batch across reopen, and the
//! JSON request surface drives the same operations end to end.

use std::fs;
use std::io::Cursor;
use std::sync::Arc;

use buidl_db::api::RequestHandler;
use buidl_db::cli::{boot, init_store, serve, Config, StoreMode};
use buidl_db::dal::DataAccess;
use buidl_db::model::{Build, USER_COLLECTION};
use buidl_db::store::{DocumentStore, MemoryStore};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn run(handler: &RequestHandler, requests: &[Value]) -> Vec<Value> {
    let input: String = requests.iter().map(|r| format!("{}\n", r)).collect();
    let mut output = Vec::new();
    serve(handler, Cursor::new(input), &mut output).unwrap();

    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

// =============================================================================
// File-backed store
// =============================================================================

#[test]
fn test_builds_and_references_survive_reopen() {
    let temp = create_temp_dir();
    let path = temp.path().join("buidl.json");

    let build_id = {
        let store = Arc::new(MemoryStore::open(&path).unwrap());
        store
            .set(USER_COLLECTION, "0xowner", serde_json::Map::new())
            .unwrap();
        let dal = DataAccess::new(store);
        dal.create_build(Build {
            builder: "0xowner".into(),
            ..Default::default()
        })
        .unwrap()
    };

    let dal = DataAccess::new(Arc::new(MemoryStore::open(&path).unwrap()));
    let build = dal.find_build_by_id(&build_id).unwrap().expect("build lost on reopen");
    assert_eq!(build.builder, "0xowner");

    let owner = dal.find_user_by_address("0xowner").unwrap().data.unwrap();
    assert!(owner.references(&build_id));
}

#[test]
fn test_failed_commit_leaves_file_unchanged() {
    let temp = create_temp_dir();
    let path = temp.path().join("buidl.json");

    let store = Arc::new(MemoryStore::open(&path).unwrap());
    store
        .set(USER_COLLECTION, "0xowner", serde_json::Map::new())
        .unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let dal = DataAccess::new(store);
    let err = dal
        .create_build(Build {
            builder: "0xghost".into(),
            ..Default::default()
        })
        .unwrap_err();
    assert_eq!(err.code(), "BUIDL_NOT_FOUND");

    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

// =============================================================================
// Request surface
// =============================================================================

#[test]
fn test_build_lifecycle_over_requests() {
    let temp = create_temp_dir();
    let seed_path = temp.path().join("seed.json");
    fs::write(
        &seed_path,
        json!({
            "users": {"0xowner": {"builds": []}, "0xc1": {"builds": []}, "0xc2": {}}
        })
        .to_string(),
    )
    .unwrap();

    let config = Config {
        mode: StoreMode::Persistent,
        data_file: Some(temp.path().join("data.json").display().to_string()),
        seed_file: Some(seed_path.display().to_string()),
        ..Config::default()
    };
    let init = init_store(&config).unwrap();
    assert_eq!(init["documents"], json!(3));

    let handler = boot(&config).unwrap();
    let created = run(
        &handler,
        &[json!({
            "op": "createBuild",
            "build": {"builder": "0xowner", "coBuilders": ["0xc1"], "name": "Dapp"}
        })],
    );
    let id = created[0]["data"]["id"].as_str().unwrap().to_string();

    let out = run(
        &handler,
        &[
            json!({"op": "updateBuild", "id": id, "patch": {"coBuilders": ["0xc2"]}}),
            json!({"op": "featureBuild", "id": id, "featured": true}),
            json!({"op": "findAllBuilds", "featured": true}),
            json!({"op": "findBuilderBuilds", "address": "0xc2"}),
            json!({"op": "findUserByAddress", "address": "0xc1"}),
        ],
    );

    assert!(out.iter().all(|r| r["status"] == "ok"), "responses: {:?}", out);
    assert_eq!(out[0]["data"]["coBuilders"], json!(["0xc2"]));
    assert_eq!(out[2]["data"][0]["id"], json!(id));
    assert_eq!(out[3]["data"][0]["name"], json!("Dapp"));
    assert_eq!(out[4]["data"]["data"]["builds"], json!([]));

    // Reboot from the data file and delete
    drop(handler);
    let handler = boot(&config).unwrap();
    let out = run(
        &handler,
        &[
            json!({"op": "deleteBuild", "id": id}),
            json!({"op": "findBuildById", "id": id}),
            json!({"op": "findUserByAddress", "address": "0xowner"}),
        ],
    );

    assert_eq!(out[0], json!({"status": "ok", "data": null}));
    assert_eq!(out[1]["data"], Value::Null);
    assert_eq!(out[2]["data"]["data"]["builds"], json!([]));
}

#[test]
fn test_request_errors_do_not_stop_serving() {
    let handler = boot(&Config {
        mode: StoreMode::Ephemeral,
        ..Config::default()
    })
    .unwrap();

    let out = run(
        &handler,
        &[
            json!({"op": "updateBuild", "id": "missing", "patch": {}}),
            json!({"op": "launchRocket"}),
            json!({"op": "createEvent", "event": {"type": "user.create", "timestamp": 1}}),
        ],
    );

    assert_eq!(out[0]["code"], json!("BUIDL_NOT_FOUND"));
    assert_eq!(out[1]["code"], json!("BUIDL_UNKNOWN_OPERATION"));
    assert_eq!(out[2]["status"], json!("ok"));
}
