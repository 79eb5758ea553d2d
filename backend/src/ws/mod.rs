// WebSocket transport layer for live color viewers.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State as AxumState;
use axum::response::IntoResponse;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::AppState;
use crate::constants::VIEWER_QUEUE_CAPACITY;
use crate::hub::ViewerConnection;
use crate::utils::now_epoch_ms;

pub async fn ws_handler(
    AxumState(app_state): AxumState<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(mut socket: WebSocket, app_state: AppState) {
    let (tx, mut rx) = mpsc::channel::<String>(VIEWER_QUEUE_CAPACITY);
    let id = app_state.hub().register(ViewerConnection::new(tx)).await;
    info!(connection = id, "viewer connected");

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                match outbound {
                    Some(payload) => {
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            inbound = socket.next() => {
                match inbound {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(_)) => {
                        // Any viewer message asks for the current state.
                        let engine = &app_state.engine;
                        let snapshot = engine
                            .snapshot(None, engine.config().default_radius_km, now_epoch_ms())
                            .await;
                        if let Err(err) = app_state.hub().unicast(id, &snapshot).await {
                            warn!(%err, connection = id, "state reply failed");
                        }
                    }
                    Some(Err(err)) => {
                        warn!(?err, connection = id, "ws error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    app_state.hub().unregister(id).await;
    info!(connection = id, "viewer disconnected");
}
