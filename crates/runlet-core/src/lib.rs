// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runlet Core - Action Lifecycle Controller
//!
//! This crate is the two-phase lifecycle controller of a runlet host:
//! one-time, concurrency-guarded code loading (init) followed by repeated
//! dispatch of incoming requests into the loaded code (run).
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      HTTP host (runlet-server)                  │
//! │                    POST /init        POST /run                  │
//! └────────────────────────────────────────────────────────────────┘
//!             │                                  │
//!             ▼                                  ▼
//! ┌──────────────────────┐          ┌──────────────────────────────┐
//! │        Loader        │          │          Dispatcher          │
//! │  validate payload    │          │  read installed unit         │
//! │  unpack zip package  │──────────│  immediate / deferred branch │
//! │  resolve entry       │ installs │  contain failures            │
//! │  install unit (once) │          │  emit activation marker      │
//! └──────────────────────┘          └──────────────────────────────┘
//!             │                                  │
//!             └────────────┬─────────────────────┘
//!                          ▼
//!               ┌─────────────────────┐
//!               │      Lifecycle      │
//!               │ bootstrap gate +    │
//!               │ write-once unit     │
//!               └─────────────────────┘
//! ```
//!
//! The lifecycle is `Uninitialized → Ready`. A single gate serializes the
//! entire bootstrap contract, so exactly one of N concurrent bootstrap
//! requests can install; the rest fail with `AlreadyInitialized` or their
//! own validation error, and partial state never leaks. Invocations are
//! mutually concurrent once the unit is installed.
//!
//! # Modules
//!
//! - [`lifecycle`]: bootstrap gate and the write-once installed unit
//! - [`loader`]: one-time install state machine
//! - [`dispatcher`]: concurrent invocation shim
//! - [`payload`]: bootstrap payload and `Module::Type::Function` parsing
//! - [`package`]: base64 + zip unpacking into per-install directories
//! - [`resolver`]: resolution seam, dylib backend, mock backend
//! - [`unit`]: the installed unit and the entry invocation trait
//! - [`response`]: response-writer collaborator and buffered impl
//! - [`markers`]: activation log framing
//! - [`error`]: load and dispatch error taxonomy

#![deny(missing_docs)]

/// Invocation dispatcher.
pub mod dispatcher;

/// Error taxonomy for the bootstrap and invocation paths.
pub mod error;

/// Lifecycle state: bootstrap gate plus write-once unit slot.
pub mod lifecycle;

/// One-time action loader.
pub mod loader;

/// Activation log framing.
pub mod markers;

/// Code package unpacking.
pub mod package;

/// Bootstrap payload and entry-path parsing.
pub mod payload;

/// Module resolution backends.
pub mod resolver;

/// Response-writer collaborator.
pub mod response;

/// The installed runnable unit.
pub mod unit;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, LoadError};
pub use lifecycle::Lifecycle;
pub use loader::Loader;
pub use markers::{ACTIVATION_SENTINEL, LogMarker, StdioMarker};
pub use payload::{BootstrapPayload, EntryPath, InitRequest};
pub use response::{BufferedResponse, GATEWAY_ERROR_STATUS, ResponseWriter, WireResponse};
pub use unit::{DispatchKind, EntryInvoke, InstalledUnit, InvokeError};
