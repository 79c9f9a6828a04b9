// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The installed runnable unit and its invocation seam.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::payload::EntryPath;
use crate::response::ResponseWriter;

/// How an installed entry completes, decided once at install time from
/// the entry's declared kind. The dispatcher's hot path is a single
/// branch on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    /// Runs to completion on the calling worker before returning.
    Immediate,
    /// Driven off the calling worker and awaited; the worker is freed to
    /// interleave other work while the result completes.
    Deferred,
}

impl DispatchKind {
    /// Whether invocation yields a deferred result that must be awaited.
    pub fn is_deferred(self) -> bool {
        matches!(self, Self::Deferred)
    }
}

/// Failure surfaced by an entry invocation.
///
/// `detail` carries extra diagnostics (panic payloads, native status
/// codes). It is always logged but reaches the caller-visible message
/// only in debug builds.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InvokeError {
    message: String,
    detail: Option<String>,
}

impl InvokeError {
    /// Failure with a user-facing message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
        }
    }

    /// Failure with additional diagnostic detail.
    pub fn with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// The user-facing message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Extra diagnostic detail, if any.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

/// A resolved, callable entry point.
///
/// The entry receives the raw invocation payload and writes its own
/// result through the response writer; the dispatcher never inspects or
/// re-serializes the output. Implementations must tolerate concurrent
/// invocation.
pub trait EntryInvoke: Send + Sync {
    /// Run the entry against one invocation payload.
    fn invoke(&self, payload: &[u8], writer: &dyn ResponseWriter) -> Result<(), InvokeError>;
}

impl<F> EntryInvoke for F
where
    F: Fn(&[u8], &dyn ResponseWriter) -> Result<(), InvokeError> + Send + Sync,
{
    fn invoke(&self, payload: &[u8], writer: &dyn ResponseWriter) -> Result<(), InvokeError> {
        self(payload, writer)
    }
}

/// The runnable unit installed by a successful bootstrap.
///
/// Write-once: installed at most once per process and never replaced,
/// so it is read without locking after install.
pub struct InstalledUnit {
    /// The entry path the unit was resolved from.
    pub entry_path: EntryPath,
    /// Immediate or deferred completion.
    pub kind: DispatchKind,
    /// The callable entry itself.
    pub entry: Arc<dyn EntryInvoke>,
    /// Extraction directory of the code package; lives for the process
    /// lifetime and is the unit's working context.
    pub workdir: PathBuf,
    /// When the unit was installed.
    pub installed_at: DateTime<Utc>,
}

impl fmt::Debug for InstalledUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstalledUnit")
            .field("entry_path", &self.entry_path)
            .field("kind", &self.kind)
            .field("workdir", &self.workdir)
            .field("installed_at", &self.installed_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_kind() {
        assert!(DispatchKind::Deferred.is_deferred());
        assert!(!DispatchKind::Immediate.is_deferred());
    }

    #[test]
    fn test_invoke_error_detail() {
        let err = InvokeError::new("it broke");
        assert_eq!(err.message(), "it broke");
        assert!(err.detail().is_none());

        let err = InvokeError::with_detail("it broke", "stack: ...");
        assert_eq!(err.detail(), Some("stack: ..."));
        assert_eq!(err.to_string(), "it broke");
    }

    #[test]
    fn test_fn_entries_are_invocable() {
        fn echo(payload: &[u8], writer: &dyn ResponseWriter) -> Result<(), InvokeError> {
            writer.write_success(200, serde_json::json!(payload.len()));
            Ok(())
        }

        let entry: Arc<dyn EntryInvoke> = Arc::new(echo);
        let writer = crate::response::BufferedResponse::new();
        entry.invoke(b"12345", &writer).unwrap();
        assert_eq!(writer.take().unwrap().body, r#"{"body":5}"#);
    }
}
