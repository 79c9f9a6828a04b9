// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Mock resolver for testing.
//!
//! Resolves entries out of an in-process table instead of the platform
//! loader, so loader and host tests can install real packages without
//! shipping a compiled module.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ResolveError, ResolvedEntry, UnitResolver};
use crate::unit::{DispatchKind, EntryInvoke};

/// Mock resolver with registered entries and failure knobs.
#[derive(Default)]
pub struct MockResolver {
    entries: HashMap<(String, String, String), (DispatchKind, Arc<dyn EntryInvoke>)>,
    unloadable: HashSet<String>,
    resolve_calls: AtomicUsize,
}

impl MockResolver {
    /// Create an empty mock resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry under `module::type_name::function`.
    pub fn with_entry(
        mut self,
        module: &str,
        type_name: &str,
        function: &str,
        kind: DispatchKind,
        entry: impl EntryInvoke + 'static,
    ) -> Self {
        self.entries.insert(
            (module.to_string(), type_name.to_string(), function.to_string()),
            (kind, Arc::new(entry)),
        );
        self
    }

    /// Make `module` fail to load even though its file exists.
    pub fn with_unloadable_module(mut self, module: &str) -> Self {
        self.unloadable.insert(module.to_string());
        self
    }

    /// How many times `resolve` has been called.
    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

impl UnitResolver for MockResolver {
    fn module_file(&self, module: &str) -> String {
        format!("{}.mock", module)
    }

    fn resolve(
        &self,
        module_path: &Path,
        type_name: &str,
        function: &str,
    ) -> Result<ResolvedEntry, ResolveError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);

        let module = module_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.unloadable.contains(&module) {
            return Err(ResolveError::ModuleLoad(format!(
                "mock module \"{}\" refused to load",
                module
            )));
        }

        let has_type = self
            .entries
            .keys()
            .any(|(m, t, _)| *m == module && t == type_name);
        if !has_type {
            return Err(ResolveError::TypeNotFound(type_name.to_string()));
        }

        let key = (module, type_name.to_string(), function.to_string());
        match self.entries.get(&key) {
            Some((kind, entry)) => Ok(ResolvedEntry {
                kind: *kind,
                entry: entry.clone(),
            }),
            None => Err(ResolveError::FunctionNotFound(function.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{BufferedResponse, ResponseWriter};
    use crate::unit::InvokeError;

    fn ok_entry(_payload: &[u8], writer: &dyn ResponseWriter) -> Result<(), InvokeError> {
        writer.write_success(200, serde_json::json!({"ok": true}));
        Ok(())
    }

    #[test]
    fn test_resolves_registered_entry() {
        let resolver = MockResolver::new().with_entry(
            "demo",
            "Hello",
            "run",
            DispatchKind::Deferred,
            ok_entry,
        );

        let resolved = resolver
            .resolve(Path::new("/pkg/demo.mock"), "Hello", "run")
            .unwrap();
        assert_eq!(resolved.kind, DispatchKind::Deferred);

        let writer = BufferedResponse::new();
        resolved.entry.invoke(b"{}", &writer).unwrap();
        assert!(writer.is_written());
        assert_eq!(resolver.resolve_calls(), 1);
    }

    #[test]
    fn test_unknown_type() {
        let resolver = MockResolver::new().with_entry(
            "demo",
            "Hello",
            "run",
            DispatchKind::Immediate,
            ok_entry,
        );

        let err = resolver
            .resolve(Path::new("/pkg/demo.mock"), "Goodbye", "run")
            .unwrap_err();
        assert!(matches!(err, ResolveError::TypeNotFound(_)));
    }

    #[test]
    fn test_unknown_function() {
        let resolver = MockResolver::new().with_entry(
            "demo",
            "Hello",
            "run",
            DispatchKind::Immediate,
            ok_entry,
        );

        let err = resolver
            .resolve(Path::new("/pkg/demo.mock"), "Hello", "walk")
            .unwrap_err();
        assert!(matches!(err, ResolveError::FunctionNotFound(_)));
    }

    #[test]
    fn test_unloadable_module() {
        let resolver = MockResolver::new()
            .with_entry("demo", "Hello", "run", DispatchKind::Immediate, ok_entry)
            .with_unloadable_module("demo");

        let err = resolver
            .resolve(Path::new("/pkg/demo.mock"), "Hello", "run")
            .unwrap_err();
        assert!(matches!(err, ResolveError::ModuleLoad(_)));
    }
}
