use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use teloxide::types::Update;

use crate::{error::BotResult, event::IncomingEvent, handler::dispatch, state::AppState};

pub fn router(state: AppState) -> Router {
    Router::new().route("/", post(handle_update)).with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> BotResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    info!("Webhook server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
        .map_err(|e| anyhow::anyhow!("Webhook server failed: {}", e))?;

    info!("Webhook server stopped");
    Ok(())
}

async fn handle_update(
    State(state): State<AppState>,
    payload: Result<Json<Update>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let Json(update) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!("Rejected webhook payload: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": rejection.body_text() })),
            );
        }
    };

    let Some(event) = IncomingEvent::from_update(&update, &state.bot_username) else {
        debug!("Skipping update {} without a user message", update.id.0);
        return (StatusCode::OK, Json(json!({ "ok": true })));
    };

    match dispatch(&state, event).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))),
        Err(e) => {
            error!("Failed to handle update {}: {}", update.id.0, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
        }
    }
}
