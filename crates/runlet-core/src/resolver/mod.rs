// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Module resolution backends.
//!
//! The loader resolves `Module::Type::Function` into a callable entry
//! through the [`UnitResolver`] seam; the dispatcher depends only on the
//! resolved [`EntryInvoke`](crate::unit::EntryInvoke), never on the
//! resolution mechanism. The dylib backend is the production path; the
//! mock backend keeps loader and host tests independent of platform
//! dynamic loading.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::unit::{DispatchKind, EntryInvoke};

#[cfg(any(unix, windows))]
pub mod dylib;
pub mod mock;

#[cfg(any(unix, windows))]
pub use dylib::DylibResolver;
pub use mock::MockResolver;

/// Errors from resolving an entry within a module.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// The module file exists but could not be loaded; carries the
    /// platform loader's diagnostic.
    #[error("{0}")]
    ModuleLoad(String),

    /// The module does not register the requested type.
    #[error("type \"{0}\" is not registered by the module")]
    TypeNotFound(String),

    /// The type's entry table has no entry with the requested name.
    #[error("function \"{0}\" is not exposed by the type")]
    FunctionNotFound(String),
}

/// A successfully resolved entry: the callable plus its completion kind,
/// read from the entry's declaration at resolve time.
pub struct ResolvedEntry {
    /// Immediate or deferred completion.
    pub kind: DispatchKind,
    /// The callable entry.
    pub entry: Arc<dyn EntryInvoke>,
}

impl std::fmt::Debug for ResolvedEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedEntry")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Resolution seam between the loader and the platform's dynamic-loading
/// facility.
pub trait UnitResolver: Send + Sync {
    /// On-disk file name of `module` inside the unpacked package.
    fn module_file(&self, module: &str) -> String;

    /// Resolve `type_name` and `function` within the module at
    /// `module_path`. The returned entry must stay callable for the
    /// process lifetime.
    fn resolve(
        &self,
        module_path: &Path,
        type_name: &str,
        function: &str,
    ) -> Result<ResolvedEntry, ResolveError>;
}
