//! WebSocket upgrade handler and per-connection event loop.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::AppState;

use super::events::{ClientEvent, GatewayMessage};
use super::fanout::Fanout;
use super::handler::handle_client_event;
use super::session::GatewaySession;

/// Handshake query string: `/socket?userId=<id>`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeParams {
    pub user_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/socket", get(ws_upgrade))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<HandshakeParams>,
) -> impl IntoResponse {
    let fanout = state.gateway.clone();
    ws.on_upgrade(move |socket| handle_connection(socket, fanout, params.user_id))
}

async fn handle_connection(socket: WebSocket, fanout: Arc<Fanout>, user_id: Option<String>) {
    let (ws_tx, ws_rx) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();

    let session = GatewaySession::new(user_id);
    fanout.connect(&session, tx);

    tracing::info!(
        session_id = %session.session_id,
        user_id = session.user_id.as_deref().unwrap_or("-"),
        "socket session established"
    );

    run_session(&fanout, &session, ws_tx, ws_rx, rx).await;

    fanout.disconnect(&session);

    tracing::info!(
        session_id = %session.session_id,
        user_id = session.user_id.as_deref().unwrap_or("-"),
        "socket session ended"
    );
}

/// Main session loop: apply client events and write queued notifications.
async fn run_session(
    fanout: &Fanout,
    session: &GatewaySession,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut ws_rx: SplitStream<WebSocket>,
    mut outbound: mpsc::UnboundedReceiver<Arc<GatewayMessage>>,
) {
    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => handle_client_event(fanout, session, event),
                            Err(err) => {
                                tracing::debug!(
                                    session_id = %session.session_id,
                                    %err,
                                    "ignoring malformed client frame"
                                );
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, session_id = %session.session_id, "ws read error");
                        break;
                    }
                    Some(Ok(_)) => continue,
                }
            }

            queued = outbound.recv() => {
                let Some(msg) = queued else { break };
                let json = match serde_json::to_string(msg.as_ref()) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::error!(?err, event = %msg.event, "failed to serialize outbound frame");
                        continue;
                    }
                };
                if ws_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
        }
    }
}
