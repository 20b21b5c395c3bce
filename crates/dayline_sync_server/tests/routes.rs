//! End-to-end tests of the sync routes through the transport-neutral server.

use dayline_core::OwnerId;
use dayline_sync_server::{
    HttpRequest, HttpResponse, ServerConfig, SyncServer, DELTA_PATH, PUSH_PATH, SNAPSHOT_PATH,
    STATUS_PATH,
};
use dayline_testkit::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn server() -> SyncServer {
    SyncServer::new(ServerConfig::default()).unwrap()
}

fn body(response: &HttpResponse) -> Value {
    serde_json::from_slice(&response.body).unwrap()
}

fn push(server: &SyncServer, owner: OwnerId, items: Vec<PushItem>) -> HttpResponse {
    let request = HttpRequest::new("POST", PUSH_PATH)
        .with_owner(owner)
        .with_body(serde_json::to_vec(&PushRequest::new(items)).unwrap());
    server.handle_request(&request)
}

#[test]
fn push_then_snapshot() {
    let server = server();
    let owner = OwnerId::new();

    let response = push(
        &server,
        owner,
        vec![
            PushItem::new("h1", "habit", payloads::habit("Stretch")),
            PushItem::new("m1", "mood", payloads::mood(4, &day(3))),
        ],
    );
    assert_eq!(response.status, 200);
    let results = body(&response)["results"].as_array().unwrap().clone();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["success"] == true));
    assert_eq!(results[0]["localId"], "h1");

    let snapshot = server.handle_request(&HttpRequest::new("GET", SNAPSHOT_PATH).with_owner(owner));
    assert_eq!(snapshot.status, 200);
    let snapshot = body(&snapshot);
    assert_eq!(snapshot["status"], "success");
    assert_eq!(snapshot["data"]["habits"][0]["name"], "Stretch");
    assert_eq!(snapshot["data"]["habits"][0]["id"], results[0]["serverId"]);
    assert_eq!(snapshot["data"]["moodRatings"][0]["rating"], 4);
    assert_eq!(snapshot["data"]["todos"], json!([]));
    assert!(snapshot["lastSyncTimestamp"].is_string());
}

#[test]
fn delta_from_returned_cursor() {
    let server = server();
    let owner = OwnerId::new();
    push(&server, owner, vec![PushItem::new("t1", "todo", payloads::todo("Call", &day(1)))]);

    let first = body(&server.handle_request(&HttpRequest::new("POST", DELTA_PATH).with_owner(owner)));
    assert_eq!(first["data"]["todos"].as_array().unwrap().len(), 1);
    let cursor = first["lastSyncTimestamp"].clone();

    push(&server, owner, vec![PushItem::new("n1", "note", payloads::note("Quiet day", &day(2)))]);

    let request = HttpRequest::new("POST", DELTA_PATH)
        .with_owner(owner)
        .with_body(serde_json::to_vec(&json!({ "since": cursor })).unwrap());
    let second = body(&server.handle_request(&request));
    assert!(second["data"].get("todos").is_none());
    assert_eq!(second["data"]["dailyNotes"].as_array().unwrap().len(), 1);
}

#[test]
fn item_errors_stay_inline() {
    let server = server();
    let owner = OwnerId::new();

    let response = push(
        &server,
        owner,
        vec![
            PushItem::new("x1", "sleep", json!({})),
            PushItem::new("m1", "mood", payloads::mood(9, &day(1))),
            PushItem::new("h1", "habit", payloads::habit("Walk")),
        ],
    );
    assert_eq!(response.status, 200);
    let results = body(&response)["results"].clone();
    assert_eq!(results[0]["success"], false);
    assert!(results[0]["error"].as_str().unwrap().contains("sleep"));
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[2]["success"], true);
}

#[test]
fn empty_push_rejected() {
    let response = push(&server(), OwnerId::new(), Vec::new());
    assert_eq!(response.status, 400);
    let envelope = body(&response);
    assert_eq!(envelope["status"], "error");
    assert!(envelope["error"].as_str().unwrap().contains("No items to sync"));
}

#[test]
fn oversized_push_rejected() {
    let server = SyncServer::new(ServerConfig::default().with_max_push_batch(2)).unwrap();
    let items = (0..3)
        .map(|i| PushItem::new(format!("h{i}"), "habit", payloads::habit("Walk")))
        .collect();
    assert_eq!(push(&server, OwnerId::new(), items).status, 400);
}

#[test]
fn owners_do_not_see_each_other() {
    let server = server();
    let alice = OwnerId::new();
    let bob = OwnerId::new();
    push(&server, alice, vec![PushItem::new("h1", "habit", payloads::habit("Run"))]);

    let snapshot = body(&server.handle_request(&HttpRequest::new("GET", SNAPSHOT_PATH).with_owner(bob)));
    assert_eq!(snapshot["data"]["habits"], json!([]));
}

#[test]
fn token_auth() {
    let config = ServerConfig::default().with_auth(b"integration-secret".to_vec());
    let server = SyncServer::new(config).unwrap();
    let owner = OwnerId::new();
    let token = server.context().validator().unwrap().issue(owner).unwrap();

    let ok = server.handle_request(&HttpRequest::new("GET", STATUS_PATH).with_bearer(&token));
    assert_eq!(ok.status, 200);
    assert_eq!(body(&ok)["userId"], owner.to_string());

    let no_token = server.handle_request(&HttpRequest::new("GET", STATUS_PATH).with_owner(owner));
    assert_eq!(no_token.status, 401);

    let forged = server.handle_request(&HttpRequest::new("GET", STATUS_PATH).with_bearer("AAAA"));
    assert_eq!(forged.status, 401);
    assert_eq!(body(&forged)["status"], "error");
}

#[test]
fn data_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let config = ServerConfig::default().with_database_path(temp_dir.path().join("sync.db"));
    let owner = OwnerId::new();

    {
        let server = SyncServer::new(config.clone()).unwrap();
        push(&server, owner, vec![PushItem::new("w1", "workout", payloads::workout("Legs"))]);
    }

    let server = SyncServer::new(config).unwrap();
    let snapshot = body(&server.handle_request(&HttpRequest::new("GET", SNAPSHOT_PATH).with_owner(owner)));
    assert_eq!(snapshot["data"]["workoutTemplates"][0]["name"], "Legs");
}
