// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared state for the HTTP handlers.

use std::path::PathBuf;
use std::sync::Arc;

use runlet_core::dispatcher::Dispatcher;
use runlet_core::lifecycle::Lifecycle;
use runlet_core::loader::Loader;
use runlet_core::markers::LogMarker;
use runlet_core::resolver::UnitResolver;

/// Everything the handlers need: the loader and dispatcher bound to one
/// shared lifecycle.
#[derive(Clone)]
pub struct AppState {
    /// One-time action loader.
    pub loader: Arc<Loader>,
    /// Invocation dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Shared lifecycle, for readiness reporting.
    pub lifecycle: Arc<Lifecycle>,
    /// Activation log marker, for the init unexpected-failure path.
    pub markers: Arc<dyn LogMarker>,
}

impl AppState {
    /// Wire up a fresh lifecycle with the given resolver and marker.
    pub fn new(
        resolver: Arc<dyn UnitResolver>,
        data_dir: PathBuf,
        markers: Arc<dyn LogMarker>,
    ) -> Self {
        let lifecycle = Arc::new(Lifecycle::new());
        let loader = Arc::new(Loader::new(
            lifecycle.clone(),
            resolver,
            data_dir,
            markers.clone(),
        ));
        let dispatcher = Arc::new(Dispatcher::new(lifecycle.clone(), markers.clone()));

        Self {
            loader,
            dispatcher,
            lifecycle,
            markers,
        }
    }
}
