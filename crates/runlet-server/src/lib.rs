// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runlet Server - HTTP Action Host
//!
//! Thin HTTP skin over [`runlet_core`]: an axum listener exposing the
//! platform's init/run contract plus a health probe. All lifecycle,
//! validation, and failure-handling logic lives in the core; this crate
//! only frames requests and responses and owns process concerns
//! (configuration, logging setup, shutdown).
//!
//! # Endpoints
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `POST /init` | One-shot bootstrap installing the action code |
//! | `POST /run` | Invoke the installed action with an opaque payload |
//! | `GET /health` | Liveness and lifecycle readiness |

/// Server configuration from environment variables.
pub mod config;

/// HTTP route handlers.
pub mod routes;

/// Shared handler state.
pub mod state;

/// Buffered response to wire response conversion.
pub mod wire;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
