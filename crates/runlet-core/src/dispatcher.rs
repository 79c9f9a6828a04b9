// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Invocation dispatcher.
//!
//! Executes the installed unit once per incoming request. Safe for
//! concurrent invocation: the unit slot is write-once and read without
//! locking. There is no cancellation or timeout here; a hung invocation
//! blocks its worker, and deadline enforcement belongs to the
//! surrounding host.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tracing::{error, warn};

use crate::error::{DispatchError, panic_message};
use crate::lifecycle::Lifecycle;
use crate::markers::LogMarker;
use crate::response::ResponseWriter;
use crate::unit::{DispatchKind, InstalledUnit, InvokeError};

/// Executes invocation requests against the installed unit.
pub struct Dispatcher {
    lifecycle: Arc<Lifecycle>,
    markers: Arc<dyn LogMarker>,
}

impl Dispatcher {
    /// Create a dispatcher over the shared lifecycle.
    pub fn new(lifecycle: Arc<Lifecycle>, markers: Arc<dyn LogMarker>) -> Self {
        Self { lifecycle, markers }
    }

    /// Run one invocation.
    ///
    /// The raw request body is passed through unmodified; the installed
    /// function writes its own result through the response writer, and a
    /// completion without any write is not an error. Failures of every
    /// shape become an error response and never escape. The log marker is
    /// emitted after the attempt, whatever the outcome.
    pub async fn handle_invocation(&self, body: Vec<u8>, writer: Arc<dyn ResponseWriter>) {
        match self.lifecycle.installed() {
            None => {
                let err = DispatchError::NotInitialized;
                warn!(kind = err.kind(), "invocation rejected");
                writer.write_error(&err.to_string());
            }
            Some(unit) => {
                if let Err(invoke_err) = Self::invoke(unit, body, writer.clone()).await {
                    let err = DispatchError::Invocation(user_message(&invoke_err));
                    error!(
                        kind = err.kind(),
                        error = %invoke_err,
                        detail = invoke_err.detail(),
                        "action invocation failed"
                    );
                    writer.write_error(&err.to_string());
                }
            }
        }

        // Frame the activation in the log output no matter how it went.
        self.markers.emit();
    }

    async fn invoke(
        unit: Arc<InstalledUnit>,
        body: Vec<u8>,
        writer: Arc<dyn ResponseWriter>,
    ) -> Result<(), InvokeError> {
        match unit.kind {
            DispatchKind::Immediate => {
                std::panic::catch_unwind(AssertUnwindSafe(|| {
                    unit.entry.invoke(&body, writer.as_ref())
                }))
                .unwrap_or_else(|panic| {
                    Err(InvokeError::with_detail(
                        "The action panicked",
                        panic_message(panic),
                    ))
                })
            }
            DispatchKind::Deferred => {
                // The worker is freed while the deferred result completes;
                // a panic inside the task surfaces through the join error.
                let task =
                    tokio::task::spawn_blocking(move || unit.entry.invoke(&body, writer.as_ref()));
                match task.await {
                    Ok(result) => result,
                    Err(join_err) if join_err.is_panic() => Err(InvokeError::with_detail(
                        "The action panicked",
                        panic_message(join_err.into_panic()),
                    )),
                    Err(_) => Err(InvokeError::new("The action task was cancelled")),
                }
            }
        }
    }
}

/// Caller-visible failure message. Diagnostic detail is appended only in
/// debug builds.
fn user_message(err: &InvokeError) -> String {
    match err.detail() {
        Some(detail) if cfg!(debug_assertions) => format!("{}, {}", err.message(), detail),
        _ => err.message().to_string(),
    }
}
