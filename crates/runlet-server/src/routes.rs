// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP routes for the action host.
//!
//! The platform drives a host through exactly two POSTs: `/init` once
//! with the bootstrap payload, then `/run` for every invocation.
//! `/health` is a liveness probe for the surrounding infrastructure.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{Json, Response};
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use runlet_core::payload::InitRequest;
use runlet_core::response::{BufferedResponse, ResponseWriter};

use crate::state::AppState;
use crate::wire;

/// Build the host router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/init", post(init))
        .route("/run", post(run))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /init - one-shot bootstrap installing the action.
async fn init(State(state): State<AppState>, body: Bytes) -> Response {
    let writer = BufferedResponse::new();

    match serde_json::from_slice::<InitRequest>(&body) {
        Ok(request) => {
            let _ = state.loader.handle_bootstrap(request.value, &writer).await;
        }
        Err(err) => {
            // An unreadable body never reaches the loader; it is the
            // unexpected-failure path and frames the activation like one.
            error!(error = %err, "unreadable init request");
            writer.write_error(&format!("Unable to parse the init request: {}", err));
            state.markers.emit();
        }
    }

    wire::respond(&writer)
}

/// POST /run - invoke the installed action with the raw request body.
async fn run(State(state): State<AppState>, body: Bytes) -> Response {
    let writer = Arc::new(BufferedResponse::new());
    state
        .dispatcher
        .handle_invocation(body.to_vec(), writer.clone())
        .await;
    wire::respond(&writer)
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    ready: bool,
    version: &'static str,
}

/// GET /health - liveness plus lifecycle readiness.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        ready: state.lifecycle.is_ready(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
