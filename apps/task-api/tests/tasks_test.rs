mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{as_user, connect_socket, create_task, notifications, ANN, BOB, CID, DEE};
use task_api::gateway::events::ServerEvent;
use task_api::gateway::rooms::RoomName;

// ---------------------------------------------------------------------------
// POST /api/tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_task_requires_auth() {
    let (server, _state) = common::test_server();

    let resp = server
        .post("/api/tasks")
        .json(&common::task_body("No auth", &[BOB]))
        .await;

    resp.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn create_task_notifies_assignees_and_creator_list() {
    let (server, state) = common::test_server();
    let mut ann = connect_socket(&state, "s_ann", ANN);
    let mut bob = connect_socket(&state, "s_bob", BOB);
    let mut cid = connect_socket(&state, "s_cid", CID);
    state
        .gateway
        .join_room("s_ann", RoomName::user_tasks(ANN));

    let resp = as_user(server.post("/api/tasks"), ANN)
        .json(&common::task_body("Write report", &[BOB]))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Task created successfully");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["priority"], "medium");
    assert_eq!(body["data"]["assignedBy"], ANN);
    assert_eq!(body["data"]["isOverdue"], false);
    assert!(body["data"]["id"].as_str().unwrap().starts_with("task_"));

    let got = notifications(&mut bob);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].event, ServerEvent::TaskAssigned);
    assert_eq!(
        got[0].data["message"],
        "You have been assigned a new task: Write report"
    );

    let got = notifications(&mut ann);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].event, ServerEvent::TaskCreated);

    assert!(notifications(&mut cid).is_empty());
}

#[tokio::test]
async fn create_task_rejects_strangers_without_notifying() {
    let (server, state) = common::test_server();
    let mut dee = connect_socket(&state, "s_dee", DEE);

    let resp = as_user(server.post("/api/tasks"), ANN)
        .json(&common::task_body("Sneaky", &[DEE]))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(
        body["message"],
        "You can only assign tasks to people you have chatted with"
    );
    assert!(notifications(&mut dee).is_empty());
}

#[tokio::test]
async fn create_task_validates_fields() {
    let (server, _state) = common::test_server();

    let resp = as_user(server.post("/api/tasks"), ANN)
        .json(&json!({
            "title": "ab",
            "description": "short",
            "assignedTo": [],
            "priority": "critical",
            "dueDate": "2000-01-01",
        }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["message"], "Validation failed");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["title", "description", "assignedTo", "priority", "dueDate"]);
}

#[tokio::test]
async fn duplicate_assignees_get_one_notification() {
    let (server, state) = common::test_server();
    let mut bob = connect_socket(&state, "s_bob", BOB);

    let resp = as_user(server.post("/api/tasks"), ANN)
        .json(&common::task_body("Twice", &[BOB, BOB]))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"]["assignedTo"], json!([BOB]));
    assert_eq!(notifications(&mut bob).len(), 1);
}

// ---------------------------------------------------------------------------
// GET /api/tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_tasks_filters_and_paginates() {
    let (server, _state) = common::test_server();
    create_task(&server, ANN, "Alpha task", &[BOB]).await;
    create_task(&server, ANN, "Beta task", &[CID]).await;
    create_task(&server, BOB, "Gamma task", &[CID]).await;

    let resp = as_user(server.get("/api/tasks"), ANN)
        .add_query_param("assignedBy", ANN)
        .add_query_param("sortBy", "title")
        .add_query_param("sortOrder", "asc")
        .add_query_param("limit", "1")
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    let data = &body["data"];
    assert_eq!(data["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(data["tasks"][0]["title"], "Alpha task");
    assert_eq!(data["pagination"]["totalTasks"], 2);
    assert_eq!(data["pagination"]["totalPages"], 2);
    assert_eq!(data["pagination"]["hasNext"], true);
    assert_eq!(data["pagination"]["hasPrev"], false);
    assert_eq!(data["stats"]["total"], 2);
    assert_eq!(data["stats"]["pending"], 3);
}

#[tokio::test]
async fn list_tasks_past_the_last_page_is_empty() {
    let (server, _state) = common::test_server();
    create_task(&server, ANN, "Only task", &[BOB]).await;

    let resp = as_user(server.get("/api/tasks"), ANN)
        .add_query_param("page", usize::MAX.to_string())
        .add_query_param("limit", "100")
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    let data = &body["data"];
    assert!(data["tasks"].as_array().unwrap().is_empty());
    assert_eq!(data["pagination"]["totalTasks"], 1);
    assert_eq!(data["pagination"]["hasNext"], false);
    assert_eq!(data["pagination"]["hasPrev"], true);
}

#[tokio::test]
async fn list_tasks_rejects_bad_filters() {
    let (server, _state) = common::test_server();

    let resp = as_user(server.get("/api/tasks"), ANN)
        .add_query_param("status", "done")
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["errors"][0]["field"], "status");
}

#[tokio::test]
async fn user_tasks_include_created_and_assigned() {
    let (server, _state) = common::test_server();
    create_task(&server, ANN, "Ann made this", &[CID]).await;
    create_task(&server, CID, "Bob works on this", &[BOB]).await;
    create_task(&server, CID, "Ann works on this", &[ANN]).await;

    let resp = as_user(server.get(&format!("/api/tasks/user/{BOB}")), ANN).await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"]["pagination"]["totalTasks"], 1);
    assert_eq!(body["data"]["tasks"][0]["title"], "Bob works on this");

    let resp = as_user(server.get(&format!("/api/tasks/user/{ANN}")), ANN).await;
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"]["pagination"]["totalTasks"], 2);
}

#[tokio::test]
async fn tags_and_chat_users() {
    let (server, _state) = common::test_server();
    let mut body = common::task_body("Tagged", &[BOB]);
    body["tags"] = json!(["ops", "backend"]);
    as_user(server.post("/api/tasks"), ANN)
        .json(&body)
        .await
        .assert_status(StatusCode::CREATED);

    let resp = as_user(server.get("/api/tasks/tags"), ANN).await;
    let tags: serde_json::Value = resp.json();
    assert_eq!(tags["data"], json!(["backend", "ops"]));

    let resp = as_user(server.get("/api/tasks/chat-users"), ANN).await;
    let users: serde_json::Value = resp.json();
    let names: Vec<&str> = users["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["fullName"].as_str())
        .collect();
    assert_eq!(names, vec!["Bob", "Cid"]);
}

#[tokio::test]
async fn get_unknown_task_is_not_found() {
    let (server, _state) = common::test_server();

    let resp = as_user(server.get("/api/tasks/task_missing"), ANN).await;
    resp.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["message"], "Task not found");
}

// ---------------------------------------------------------------------------
// PUT /api/tasks/{task_id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_notifies_members_including_actor() {
    let (server, state) = common::test_server();
    let task_id = create_task(&server, ANN, "Shared work", &[BOB]).await;
    let mut ann = connect_socket(&state, "s_ann", ANN);
    let mut bob = connect_socket(&state, "s_bob", BOB);

    let resp = as_user(server.put(&format!("/api/tasks/{task_id}")), BOB)
        .json(&json!({ "priority": "high" }))
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"]["priority"], "high");

    for inbox in [&mut ann, &mut bob] {
        let got = notifications(inbox);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].event, ServerEvent::TaskUpdated);
        assert_eq!(got[0].data["updatedBy"], "Bob");
        assert_eq!(got[0].data["message"], "Task \"Shared work\" has been updated");
    }
}

#[tokio::test]
async fn status_change_is_room_scoped() {
    let (server, state) = common::test_server();
    let task_id = create_task(&server, ANN, "Room scoped", &[BOB, CID]).await;
    let _ann = connect_socket(&state, "s_ann", ANN);
    let mut bob = connect_socket(&state, "s_bob", BOB);
    let mut cid = connect_socket(&state, "s_cid", CID);
    state.gateway.join_room("s_bob", RoomName::task(&task_id));

    let resp = as_user(server.put(&format!("/api/tasks/{task_id}")), ANN)
        .json(&json!({ "status": "completed" }))
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert!(body["data"]["completedAt"].is_string());

    let bob_events: Vec<ServerEvent> = notifications(&mut bob).iter().map(|m| m.event).collect();
    assert_eq!(
        bob_events,
        vec![ServerEvent::TaskUpdated, ServerEvent::TaskStatusChanged]
    );

    // Cid is an assignee but never joined the task room.
    let cid_events: Vec<ServerEvent> = notifications(&mut cid).iter().map(|m| m.event).collect();
    assert_eq!(cid_events, vec![ServerEvent::TaskUpdated]);
}

#[tokio::test]
async fn update_by_outsider_is_forbidden_and_silent() {
    let (server, state) = common::test_server();
    let task_id = create_task(&server, ANN, "Private", &[BOB]).await;
    let mut bob = connect_socket(&state, "s_bob", BOB);

    let resp = as_user(server.put(&format!("/api/tasks/{task_id}")), CID)
        .json(&json!({ "title": "Hijacked" }))
        .await;

    resp.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["message"], "Not authorized to update this task");
    assert!(notifications(&mut bob).is_empty());
}

// ---------------------------------------------------------------------------
// DELETE /api/tasks/{task_id}
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_is_creator_only() {
    let (server, state) = common::test_server();
    let task_id = create_task(&server, ANN, "Doomed", &[BOB]).await;
    let mut bob = connect_socket(&state, "s_bob", BOB);

    let resp = as_user(server.delete(&format!("/api/tasks/{task_id}")), BOB).await;
    resp.assert_status(StatusCode::FORBIDDEN);
    assert!(notifications(&mut bob).is_empty());

    let resp = as_user(server.delete(&format!("/api/tasks/{task_id}")), ANN).await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["message"], "Task deleted successfully");

    let got = notifications(&mut bob);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].event, ServerEvent::TaskDeleted);
    assert_eq!(got[0].data["taskId"], task_id.as_str());
    assert_eq!(got[0].data["deletedBy"], "Ann");

    as_user(server.get(&format!("/api/tasks/{task_id}")), ANN)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// PUT /api/tasks/{task_id}/assign
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assign_replaces_assignees_and_notifies_new_set() {
    let (server, state) = common::test_server();
    let task_id = create_task(&server, ANN, "Handoff", &[BOB]).await;
    let mut bob = connect_socket(&state, "s_bob", BOB);
    let mut cid = connect_socket(&state, "s_cid", CID);

    let resp = as_user(server.put(&format!("/api/tasks/{task_id}/assign")), ANN)
        .json(&json!({ "userIds": [CID] }))
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"]["assignedTo"], json!([CID]));
    assert_eq!(body["message"], "Task assigned successfully");

    assert!(notifications(&mut bob).is_empty());
    let got = notifications(&mut cid);
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].event, ServerEvent::TaskAssigned);
    assert_eq!(got[0].data["message"], "You have been assigned to task: Handoff");
}

#[tokio::test]
async fn assign_requires_user_ids() {
    let (server, _state) = common::test_server();
    let task_id = create_task(&server, ANN, "Handoff", &[BOB]).await;

    let resp = as_user(server.put(&format!("/api/tasks/{task_id}/assign")), ANN)
        .json(&json!({ "userIds": [] }))
        .await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["message"], "At least one user ID is required");
}

#[tokio::test]
async fn assign_by_assignee_is_forbidden() {
    let (server, _state) = common::test_server();
    let task_id = create_task(&server, ANN, "Handoff", &[BOB]).await;

    let resp = as_user(server.put(&format!("/api/tasks/{task_id}/assign")), BOB)
        .json(&json!({ "userIds": [CID] }))
        .await;

    resp.assert_status(StatusCode::FORBIDDEN);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["message"], "Only the task creator can reassign this task");
}
