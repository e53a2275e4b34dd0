//! HTTP surface of the server: the signaling websocket plus a few JSON endpoints.

use crate::config::ServerConfig;
use crate::signaling::{SignalingService, ws_handler, ws_room_handler};
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use switchboard_core::{IceConfig, RoomId};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub fn app(service: SignalingService) -> Router {
    let cors = cors_layer(service.config());

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/ws/{room}", get(ws_room_handler))
        .route("/rtc-config", get(rtc_config))
        .route("/version", get(version))
        .route("/rooms/{room}/members", get(room_members))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring malformed allowed origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn rtc_config(State(service): State<SignalingService>) -> Json<IceConfig> {
    Json(service.ice_config().await)
}

async fn version() -> Json<serde_json::Value> {
    Json(json!({ "version": env!("CARGO_PKG_VERSION") }))
}

async fn room_members(
    Path(room): Path<String>,
    State(service): State<SignalingService>,
) -> Response {
    let room_id = RoomId::from(room);
    let Some(members) = service.room_members(&room_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut members: Vec<_> = members.into_iter().collect();
    members.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    Json(json!({ "room": room_id, "members": members })).into_response()
}
