use crate::signaling::SignalingService;
use axum::extract::ws::WebSocket;
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use switchboard_core::RoomId;
use tracing::warn;

/// `GET /ws`: joins a generated room.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(service): State<SignalingService>,
) -> Response {
    upgrade(ws, &headers, service, None)
}

/// `GET /ws/{room}`: joins (or opens) the named room.
pub async fn ws_room_handler(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    headers: HeaderMap,
    State(service): State<SignalingService>,
) -> Response {
    upgrade(ws, &headers, service, Some(RoomId::from(room)))
}

fn upgrade(
    ws: WebSocketUpgrade,
    headers: &HeaderMap,
    service: SignalingService,
    room: Option<RoomId>,
) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());
    if !service.config().is_origin_allowed(origin) {
        warn!(origin = ?origin, "Rejected websocket upgrade from disallowed origin");
        return StatusCode::FORBIDDEN.into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, service, room))
}

async fn handle_socket(socket: WebSocket, service: SignalingService, room: Option<RoomId>) {
    let (sender, receiver) = socket.split();
    service.serve_connection(sender, receiver, room).await;
}
