// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process-wide action lifecycle state.
//!
//! The state is `Uninitialized` until a bootstrap succeeds and `Ready`
//! forever after. There is no failed terminal state: a rejected bootstrap
//! leaves the state `Uninitialized` and a later attempt may retry.
//!
//! One `Lifecycle` object owns both the bootstrap gate and the installed
//! unit; it is passed by `Arc` into the loader and the dispatcher rather
//! than living in an ambient static.

use std::sync::{Arc, OnceLock};

use tokio::sync::{Mutex, MutexGuard};

use crate::unit::InstalledUnit;

/// Owner of the lifecycle state and the installed unit.
#[derive(Debug, Default)]
pub struct Lifecycle {
    // Binary gate serializing the whole bootstrap contract. Guard drop
    // releases it on every path, panics included.
    gate: Mutex<()>,
    // Write-once slot; set exactly once, under the gate. Reads after
    // `Ready` take no lock.
    unit: OnceLock<Arc<InstalledUnit>>,
}

impl Lifecycle {
    /// Create a fresh `Uninitialized` lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the bootstrap gate. At most one bootstrap attempt runs its
    /// validation/decoding/loading logic at a time, and the `Ready` check
    /// is race-free against a competing bootstrap.
    pub(crate) async fn lock_bootstrap(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    /// Whether a runnable unit has been installed.
    pub fn is_ready(&self) -> bool {
        self.unit.get().is_some()
    }

    /// The installed unit, if the state is `Ready`.
    pub fn installed(&self) -> Option<Arc<InstalledUnit>> {
        self.unit.get().cloned()
    }

    /// Transition to `Ready`. Called exactly once, under the gate; a
    /// second call is ignored because the slot is write-once.
    pub(crate) fn install(&self, unit: Arc<InstalledUnit>) {
        let _ = self.unit.set(unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::EntryPath;
    use crate::response::ResponseWriter;
    use crate::unit::{DispatchKind, InvokeError};
    use std::path::PathBuf;

    fn test_unit(module: &str) -> Arc<InstalledUnit> {
        fn entry(_: &[u8], _: &dyn ResponseWriter) -> Result<(), InvokeError> {
            Ok(())
        }
        Arc::new(InstalledUnit {
            entry_path: EntryPath::parse(&format!("{}::Hello::run", module)).unwrap(),
            kind: DispatchKind::Immediate,
            entry: Arc::new(entry),
            workdir: PathBuf::from("/tmp/unit"),
            installed_at: chrono::Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_starts_uninitialized() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_ready());
        assert!(lifecycle.installed().is_none());
    }

    #[tokio::test]
    async fn test_install_transitions_to_ready() {
        let lifecycle = Lifecycle::new();
        lifecycle.install(test_unit("demo"));

        assert!(lifecycle.is_ready());
        let unit = lifecycle.installed().unwrap();
        assert_eq!(unit.entry_path.module, "demo");
    }

    #[tokio::test]
    async fn test_unit_is_never_replaced() {
        let lifecycle = Lifecycle::new();
        lifecycle.install(test_unit("first"));
        lifecycle.install(test_unit("second"));

        assert_eq!(lifecycle.installed().unwrap().entry_path.module, "first");
    }
}
