//! Inbound client event dispatch.
//!
//! Every handler is synchronous and runs to completion before the socket loop
//! reads the next frame, so a session's own events are applied in order.

use chrono::Utc;

use super::audience::Audience;
use super::events::{
    AssignmentNotificationPayload, BulkUpdatedPayload, ClientEvent, ServerEvent,
    StatusChangedPayload, TypingIndicatorPayload,
};
use super::fanout::Fanout;
use super::rooms::RoomName;
use super::session::GatewaySession;

pub fn handle_client_event(fanout: &Fanout, session: &GatewaySession, event: ClientEvent) {
    let session_id = session.session_id.as_str();
    match event {
        ClientEvent::JoinTaskRoom(task_id) => {
            fanout.join_room(session_id, RoomName::task(&task_id));
            tracing::debug!(session_id, task_id = %task_id, "joined task room");
        }
        ClientEvent::LeaveTaskRoom(task_id) => {
            fanout.leave_room(session_id, &RoomName::task(&task_id));
            tracing::debug!(session_id, task_id = %task_id, "left task room");
        }
        ClientEvent::JoinUserTasksRoom => match session.user_tasks_room() {
            Some(room) => {
                fanout.join_room(session_id, room);
                tracing::debug!(session_id, "joined user tasks room");
            }
            None => tracing::debug!(session_id, "anonymous session cannot join a tasks room"),
        },
        ClientEvent::LeaveUserTasksRoom => {
            if let Some(room) = session.user_tasks_room() {
                fanout.leave_room(session_id, &room);
                tracing::debug!(session_id, "left user tasks room");
            }
        }
        ClientEvent::TaskStatusUpdate(p) => {
            let room = RoomName::task(&p.task_id);
            let payload = StatusChangedPayload {
                task_id: p.task_id,
                status: p.status,
                updated_by: p.updated_by,
                timestamp: Utc::now(),
            };
            fanout.notify_room_except(&room, session_id, ServerEvent::TaskStatusChanged, &payload);
        }
        ClientEvent::NotifyTaskAssignment(p) => {
            let audience: Audience = p.assigned_users.into_iter().collect();
            let payload = AssignmentNotificationPayload {
                message: format!("You have been assigned to task: {}", p.task_title),
                assigned_by: p.assigned_by,
                timestamp: Utc::now(),
            };
            fanout.notify_users(&audience, ServerEvent::AssignmentNotification, &payload);
        }
        ClientEvent::TaskCommentTyping(p) => {
            let room = RoomName::task(&p.task_id);
            let payload = TypingIndicatorPayload {
                task_id: p.task_id,
                user_name: p.user_name,
                is_typing: p.is_typing,
                user_id: session.user_id.clone(),
            };
            fanout.notify_room_except(&room, session_id, ServerEvent::TypingIndicator, &payload);
        }
        ClientEvent::BulkTaskUpdate(p) => {
            let timestamp = Utc::now();
            for task_id in p.task_ids {
                let room = RoomName::task(&task_id);
                let payload = BulkUpdatedPayload {
                    task_id,
                    operation: p.operation.clone(),
                    updated_by: p.updated_by.clone(),
                    timestamp,
                };
                fanout.notify_room_except(&room, session_id, ServerEvent::BulkUpdated, &payload);
            }
        }
    }
}
