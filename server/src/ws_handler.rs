use axum::extract::ws::{Message, WebSocket};
use common::ClientId;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::protocol::{ClientEvent, ServerEvent};
use crate::room_manager::RoomManager;
use crate::web_server::WebServerState;

pub async fn handle_websocket(socket: WebSocket, state: WebServerState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(128);

    let client_id = ClientId::new(Uuid::new_v4().to_string());
    let room_manager = state.room_manager;
    room_manager.broadcaster().register(client_id.clone(), tx).await;
    info!(client_id = %client_id, "client connected");

    let send_client_id = client_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(client_id = %send_client_id, error = %e, "failed to encode event");
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_receiver.next().await {
        let text = match result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(client_id = %client_id, error = %e, "websocket error");
                break;
            }
        };

        match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => dispatch(&room_manager, &client_id, event).await,
            Err(e) => warn!(client_id = %client_id, error = %e, "ignoring malformed frame"),
        }
    }

    info!(client_id = %client_id, "client disconnected");
    room_manager.disconnect(&client_id).await;
    send_task.abort();
}

async fn dispatch(room_manager: &RoomManager, client_id: &ClientId, event: ClientEvent) {
    let result = match event {
        ClientEvent::RequestGame { mode, difficulty } => {
            room_manager.request_game(client_id, mode, difficulty).await
        }
        ClientEvent::JoinRoom { room_id } => room_manager.join_room(client_id, &room_id).await,
        ClientEvent::LeaveRoom { room_id } => {
            room_manager.leave_room(client_id, &room_id).await;
            Ok(())
        }
        ClientEvent::MakeMove { room_id, row, side } => {
            room_manager.make_move(client_id, &room_id, row, side).await;
            Ok(())
        }
        ClientEvent::LeaveWaiting => {
            room_manager.leave_waiting(client_id).await;
            Ok(())
        }
        ClientEvent::ReplayGame { room_id } => room_manager.replay_game(client_id, &room_id).await,
    };

    if let Err(e) = result {
        warn!(client_id = %client_id, error = %e, "request failed");
        room_manager.report_error(client_id, &e).await;
    }
}
