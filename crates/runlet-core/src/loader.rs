// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! One-time action loader.
//!
//! Validates the bootstrap payload, unpacks the code package, resolves
//! the entry through the configured resolver, and installs the resulting
//! unit. The whole contract runs under the lifecycle's bootstrap gate, so
//! exactly one attempt at a time inspects state and payload. A rejected
//! attempt never advances the state; only a successful install flips the
//! process to `Ready`, permanently.

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use futures::FutureExt;
use serde_json::json;
use tracing::{error, info};

use crate::error::{LoadError, panic_message};
use crate::lifecycle::Lifecycle;
use crate::markers::LogMarker;
use crate::package;
use crate::payload::{BootstrapPayload, EntryPath};
use crate::resolver::UnitResolver;
use crate::response::ResponseWriter;
use crate::unit::InstalledUnit;

/// Installs the runnable unit from the one-shot bootstrap payload.
pub struct Loader {
    lifecycle: Arc<Lifecycle>,
    resolver: Arc<dyn UnitResolver>,
    data_dir: PathBuf,
    markers: Arc<dyn LogMarker>,
}

impl Loader {
    /// Create a loader installing into `data_dir`.
    pub fn new(
        lifecycle: Arc<Lifecycle>,
        resolver: Arc<dyn UnitResolver>,
        data_dir: PathBuf,
        markers: Arc<dyn LogMarker>,
    ) -> Self {
        Self {
            lifecycle,
            resolver,
            data_dir,
            markers,
        }
    }

    /// Bootstrap boundary: run [`install`](Self::install) and write the
    /// outcome through the response writer.
    ///
    /// Success answers `{"ok": true}`. Every failure, a contained panic
    /// included, is logged and answered as an error response; the process
    /// keeps serving and a later bootstrap may retry.
    pub async fn handle_bootstrap(
        &self,
        payload: BootstrapPayload,
        writer: &dyn ResponseWriter,
    ) -> Option<Arc<InstalledUnit>> {
        match AssertUnwindSafe(self.install(payload)).catch_unwind().await {
            Ok(Ok(unit)) => {
                info!(
                    main = %unit.entry_path,
                    deferred = unit.kind.is_deferred(),
                    workdir = %unit.workdir.display(),
                    "action installed"
                );
                writer.write_success(200, json!({ "ok": true }));
                Some(unit)
            }
            Ok(Err(err)) => {
                error!(kind = err.kind(), error = %err, "bootstrap rejected");
                writer.write_error(&err.to_string());
                None
            }
            Err(panic) => {
                let err = LoadError::Internal(panic_message(panic));
                error!(kind = err.kind(), error = %err, "bootstrap panicked");
                writer.write_error(&err.to_string());
                self.markers.emit();
                None
            }
        }
    }

    /// Validate, unpack, resolve, and install the payload.
    ///
    /// Serialized end-to-end by the bootstrap gate; the gate is released
    /// by guard drop on every path. State only advances on `Ok`.
    pub async fn install(
        &self,
        payload: BootstrapPayload,
    ) -> Result<Arc<InstalledUnit>, LoadError> {
        let _gate = self.lifecycle.lock_bootstrap().await;

        if self.lifecycle.is_ready() {
            return Err(LoadError::AlreadyInitialized);
        }
        if payload.main.is_empty() || payload.code.is_empty() {
            return Err(LoadError::MissingFields);
        }
        if !payload.binary {
            return Err(LoadError::NotBinary);
        }
        let entry_path = EntryPath::parse(&payload.main)?;

        let workdir = package::unpack(&payload.code, &self.data_dir)?;

        let module_file = self.resolver.module_file(&entry_path.module);
        let module_path = workdir.join(&module_file);
        if !module_path.exists() {
            return Err(LoadError::ModuleNotFound(module_file));
        }

        let resolved =
            self.resolver
                .resolve(&module_path, &entry_path.type_name, &entry_path.function)?;

        let unit = Arc::new(InstalledUnit {
            entry_path,
            kind: resolved.kind,
            entry: resolved.entry,
            workdir,
            installed_at: Utc::now(),
        });
        self.lifecycle.install(unit.clone());

        Ok(unit)
    }
}
