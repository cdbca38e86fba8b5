#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum_test::{TestRequest, TestServer};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use task_api::config::Config;
use task_api::db::contacts::{Contact, MemoryContacts};
use task_api::db::store::MemoryStore;
use task_api::gateway::events::{GatewayMessage, ServerEvent};
use task_api::gateway::session::GatewaySession;
use task_api::AppState;

pub const ANN: &str = "usr_ann";
pub const BOB: &str = "usr_bob";
pub const CID: &str = "usr_cid";
/// Exists in the directory but has never chatted with anyone.
pub const DEE: &str = "usr_dee";

pub type Inbox = UnboundedReceiver<Arc<GatewayMessage>>;

fn contact(id: &str, name: &str) -> Contact {
    Contact {
        id: id.to_string(),
        full_name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        profile_pic: None,
    }
}

/// Fresh state: Ann has chatted with Bob and Cid; Bob and Cid with each other.
pub fn test_state() -> AppState {
    let contacts = MemoryContacts::new();
    contacts.add_user(contact(ANN, "Ann"));
    contacts.add_user(contact(BOB, "Bob"));
    contacts.add_user(contact(CID, "Cid"));
    contacts.add_user(contact(DEE, "Dee"));
    contacts.record_conversation(ANN, BOB);
    contacts.record_conversation(ANN, CID);
    contacts.record_conversation(BOB, CID);

    AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(contacts),
        Config::default(),
    )
}

pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = task_api::routes::router().with_state(state.clone());
    (app, state)
}

pub fn test_server() -> (TestServer, AppState) {
    let (app, state) = test_app();
    (TestServer::new(app).unwrap(), state)
}

/// Attach the identity headers the upstream auth layer would set.
pub fn as_user(req: TestRequest, user_id: &str) -> TestRequest {
    let name = match user_id {
        ANN => "Ann",
        BOB => "Bob",
        CID => "Cid",
        DEE => "Dee",
        other => other,
    };
    req.add_header("x-user-id", user_id.to_string())
        .add_header("x-user-name", name.to_string())
}

/// Register an in-process socket session for `user_id` and return its inbox.
pub fn connect_socket(state: &AppState, session_id: &str, user_id: &str) -> Inbox {
    let session = GatewaySession::with_id(session_id, Some(user_id.to_string()));
    let (tx, rx) = mpsc::unbounded_channel();
    state.gateway.connect(&session, tx);
    rx
}

pub fn drain(rx: &mut Inbox) -> Vec<Arc<GatewayMessage>> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// Everything queued so far except presence broadcasts.
pub fn notifications(rx: &mut Inbox) -> Vec<Arc<GatewayMessage>> {
    drain(rx)
        .into_iter()
        .filter(|m| m.event != ServerEvent::OnlineUsers)
        .collect()
}

pub fn future_date(days: i64) -> String {
    (chrono::Utc::now() + chrono::Duration::days(days)).to_rfc3339()
}

pub fn task_body(title: &str, assignees: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "description": "Something that needs doing soon",
        "assignedTo": assignees,
        "dueDate": future_date(3),
    })
}

/// Create a task as `creator` and return its id.
pub async fn create_task(server: &TestServer, creator: &str, title: &str, assignees: &[&str]) -> String {
    let resp = as_user(server.post("/api/tasks"), creator)
        .json(&task_body(title, assignees))
        .await;
    resp.assert_status(axum::http::StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    body["data"]["id"].as_str().unwrap().to_string()
}
