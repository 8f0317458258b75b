use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use signal_relay_protocol::ServerMessage;
use tokio::sync::mpsc;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Create channel for outbound messages
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // The id exists before any client frame is read
    let connection_id = state.connections.register(tx).await;
    tracing::info!("Peer connected: {}", connection_id);

    state
        .connections
        .send_to_connection(
            connection_id,
            &ServerMessage::ConnectionEstablished { connection_id },
        )
        .await;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // Frames from this connection are routed one at a time, in arrival order
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                state.router.handle_frame(connection_id, text.as_str()).await;
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!("Ignoring binary frame from {}", connection_id);
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::warn!("WebSocket error for {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }

    state.lifecycle.connection_closed(connection_id).await;

    send_task.abort();
}
