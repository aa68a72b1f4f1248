use std::future::Future;
use std::path::PathBuf;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::info;

use crate::room_manager::RoomManager;
use crate::ws_handler::handle_websocket;

#[derive(Clone)]
pub struct WebServerState {
    pub room_manager: RoomManager,
}

pub fn router(state: WebServerState, static_dir: Option<PathBuf>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new().route("/ws", get(ws_upgrade_handler));
    if let Some(dir) = static_dir {
        app = app.nest_service("/ui", ServeDir::new(dir));
    }
    app.layer(cors).with_state(state)
}

pub async fn run_web_server<F>(
    listen_addr: &str,
    static_dir: Option<PathBuf>,
    state: WebServerState,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state, static_dir);

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(addr = %listen_addr, "web server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn ws_upgrade_handler(
    ws: WebSocketUpgrade,
    State(state): State<WebServerState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}
