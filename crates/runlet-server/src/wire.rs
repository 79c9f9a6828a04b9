// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Buffered response to wire response conversion.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use runlet_core::response::BufferedResponse;

/// Turn whatever was written through the buffer into the HTTP response.
///
/// An invocation that never wrote anything is a valid no-op completion
/// and answers as an empty 200.
pub fn respond(writer: &BufferedResponse) -> Response {
    match writer.take() {
        Some(wire) => {
            let status = StatusCode::from_u16(wire.status).unwrap_or(StatusCode::OK);
            (
                status,
                [(header::CONTENT_TYPE, "application/json")],
                wire.body,
            )
                .into_response()
        }
        None => StatusCode::OK.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runlet_core::response::{GATEWAY_ERROR_STATUS, ResponseWriter};

    #[test]
    fn test_success_response() {
        let writer = BufferedResponse::new();
        writer.write_success(200, serde_json::json!({"answer": 42}));

        let response = respond(&writer);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_error_response_is_gateway_error() {
        let writer = BufferedResponse::new();
        writer.write_error("nope");

        let response = respond(&writer);
        assert_eq!(response.status().as_u16(), GATEWAY_ERROR_STATUS);
    }

    #[test]
    fn test_no_write_is_empty_ok() {
        let writer = BufferedResponse::new();
        let response = respond(&writer);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_bogus_status_falls_back_to_ok() {
        let writer = BufferedResponse::new();
        writer.write_success(99, serde_json::json!(null));
        let response = respond(&writer);
        assert_eq!(response.status(), StatusCode::OK);
    }
}
