//! WebSocket relay handler.
//!
//! Each connection gets two tasks: one reads relay frames from the client
//! and applies them, the other writes frames routed to this connection.
//! When either ends, the other is aborted and the connection is removed
//! together with its subscriptions.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use quizcast_shared::relay::RelayFrame;
use tokio::sync::mpsc;

use crate::{
    ui::state::AppState,
    usecase::{ConnectClientUseCase, DisconnectClientUseCase, RelayFrameUseCase},
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Create a channel for this client to receive routed frames
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let connection_id = match ConnectClientUseCase::new(state.repository.clone())
        .execute(tx)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            return;
        }
    };
    tracing::info!("Connection '{}' opened", connection_id);

    let (mut sender, mut receiver) = socket.split();

    // Spawn a task to receive frames from this client
    let recv_id = connection_id.clone();
    let relay = RelayFrameUseCase::new(state.repository.clone());
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", recv_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let frame = match RelayFrame::from_json(text.as_str()) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!("Ignoring malformed frame from '{}': {}", recv_id, e);
                            continue;
                        }
                    };
                    if let Err(e) = relay.execute(&recv_id, frame).await {
                        tracing::warn!("Rejected frame from '{}': {}", recv_id, e);
                    }
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", recv_id);
                    break;
                }
                // Ping/pong is handled by the WebSocket protocol
                _ => {}
            }
        }
    });

    // Spawn a task to forward routed frames to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    match DisconnectClientUseCase::new(state.repository.clone())
        .execute(&connection_id)
        .await
    {
        Ok(dropped) => tracing::info!(
            "Connection '{}' closed ({} subscriptions dropped)",
            connection_id,
            dropped
        ),
        Err(e) => tracing::warn!("Failed to remove connection '{}': {}", connection_id, e),
    }
}
