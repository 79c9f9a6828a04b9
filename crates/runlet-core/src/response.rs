// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Response-writer collaborator.
//!
//! The loader, the dispatcher, and the installed function itself produce
//! every outward-visible result through exactly two operations: a success
//! write (JSON body under a `{"body": ...}` envelope with a caller-chosen
//! status) and an error write (`{"error": message}` with the gateway
//! error status). How the result reaches the wire is the host's business.

use std::sync::Mutex;

use serde_json::{Value, json};

/// Status of every error response.
pub const GATEWAY_ERROR_STATUS: u16 = 502;

/// The two write operations available to the core and to installed code.
pub trait ResponseWriter: Send + Sync {
    /// Serialize `body` under the success envelope with the given status.
    fn write_success(&self, status: u16, body: Value);

    /// Serialize `message` under the error envelope with the gateway
    /// error status.
    fn write_error(&self, message: &str);
}

/// A fully serialized response, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body text.
    pub body: String,
}

/// Buffered [`ResponseWriter`].
///
/// The first write wins; later writes are ignored, matching a wire
/// response that has already started. An invocation that never writes
/// leaves the buffer empty, which the host answers as an empty 200.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    slot: Mutex<Option<WireResponse>>,
}

impl BufferedResponse {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the buffered response out, if any write happened.
    pub fn take(&self) -> Option<WireResponse> {
        self.lock().take()
    }

    /// Whether any write happened yet.
    pub fn is_written(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<WireResponse>> {
        self.slot.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn fill(&self, response: WireResponse) {
        let mut slot = self.lock();
        if slot.is_none() {
            *slot = Some(response);
        }
    }
}

impl ResponseWriter for BufferedResponse {
    fn write_success(&self, status: u16, body: Value) {
        self.fill(WireResponse {
            status,
            body: json!({ "body": body }).to_string(),
        });
    }

    fn write_error(&self, message: &str) {
        self.fill(WireResponse {
            status: GATEWAY_ERROR_STATUS,
            body: json!({ "error": message }).to_string(),
        });
    }
}
