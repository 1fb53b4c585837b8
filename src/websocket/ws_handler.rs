use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::progression::ProgressEvent;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Only forward events about this user.
    pub user_id: Option<Uuid>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    let events = state.engine.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, events, query.user_id))
}

fn concerns(event: &ProgressEvent, user_id: Uuid) -> bool {
    match event {
        ProgressEvent::LevelUp { user_id: id, .. }
        | ProgressEvent::CertificateIssued { user_id: id, .. } => *id == user_id,
    }
}

async fn handle_socket(
    socket: WebSocket,
    mut events: broadcast::Receiver<ProgressEvent>,
    user_filter: Option<Uuid>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Progress is server-driven; incoming frames are only drained until close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Websocket subscriber lagged behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if user_filter.is_some_and(|user_id| !concerns(&event, user_id)) {
                continue;
            }

            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::error!("Failed to encode progress event: {}", err);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Whichever side finishes first tears down the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    }
}
