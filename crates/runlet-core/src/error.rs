// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for the action lifecycle.

use thiserror::Error;

use crate::package::PackageError;
use crate::resolver::ResolveError;

/// Errors from the bootstrap (init) path.
///
/// Every variant is handled at the bootstrap boundary: logged with its
/// [`kind`](LoadError::kind) code and translated into an error response.
/// None of them advance the lifecycle state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// A runnable unit is already installed; it is never replaced.
    #[error("Cannot initialize the action more than once")]
    AlreadyInitialized,

    /// The payload is missing `main` or carries no code.
    #[error("Missing main/no code to execute")]
    MissingFields,

    /// Only packaged binary code is accepted, not raw source.
    #[error("Code must be a binary package (zip archive)")]
    NotBinary,

    /// `main` does not split into exactly three non-empty components.
    #[error("main required format is \"Module::Type::Function\"")]
    MalformedMain,

    /// The code field did not decode into a readable archive.
    #[error("Unable to unpack the code package: {0}")]
    PackageDecode(#[from] PackageError),

    /// The module file named by `main` is absent from the package.
    #[error("Unable to locate requested module (\"{0}\")")]
    ModuleNotFound(String),

    /// The module file exists but could not be loaded.
    #[error("Unable to load module: {0}")]
    ModuleLoad(String),

    /// The module does not export the requested type.
    #[error("Unable to locate requested type (\"{0}\")")]
    TypeNotFound(String),

    /// The type does not expose the requested function.
    #[error("Unable to locate requested function (\"{0}\")")]
    FunctionNotFound(String),

    /// A contained panic somewhere in the install path.
    #[error("Initialization failed unexpectedly: {0}")]
    Internal(String),
}

impl LoadError {
    /// Stable code for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::MissingFields => "MISSING_FIELDS",
            Self::NotBinary => "NOT_BINARY",
            Self::MalformedMain => "MALFORMED_MAIN",
            Self::PackageDecode(_) => "PACKAGE_DECODE_ERROR",
            Self::ModuleNotFound(_) => "MODULE_NOT_FOUND",
            Self::ModuleLoad(_) => "MODULE_LOAD_ERROR",
            Self::TypeNotFound(_) => "TYPE_NOT_FOUND",
            Self::FunctionNotFound(_) => "FUNCTION_NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl From<ResolveError> for LoadError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::ModuleLoad(message) => Self::ModuleLoad(message),
            ResolveError::TypeNotFound(type_name) => Self::TypeNotFound(type_name),
            ResolveError::FunctionNotFound(function) => Self::FunctionNotFound(function),
        }
    }
}

/// Errors from the invocation (run) path.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// No runnable unit is installed; nothing was executed.
    #[error("Cannot invoke an uninitialized action")]
    NotInitialized,

    /// The installed function failed, by error return or contained panic.
    #[error("Action invocation failed: {0}")]
    Invocation(String),
}

impl DispatchError {
    /// Stable code for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::Invocation(_) => "INVOCATION_FAILURE",
        }
    }
}

/// Best-effort message out of a contained panic payload.
pub(crate) fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_kinds() {
        assert_eq!(LoadError::AlreadyInitialized.kind(), "ALREADY_INITIALIZED");
        assert_eq!(LoadError::MissingFields.kind(), "MISSING_FIELDS");
        assert_eq!(LoadError::NotBinary.kind(), "NOT_BINARY");
        assert_eq!(LoadError::MalformedMain.kind(), "MALFORMED_MAIN");
        assert_eq!(LoadError::ModuleNotFound("x".to_string()).kind(), "MODULE_NOT_FOUND");
        assert_eq!(LoadError::TypeNotFound("x".to_string()).kind(), "TYPE_NOT_FOUND");
        assert_eq!(LoadError::FunctionNotFound("x".to_string()).kind(), "FUNCTION_NOT_FOUND");
    }

    #[test]
    fn test_resolve_error_mapping() {
        let err: LoadError = ResolveError::TypeNotFound("Hello".to_string()).into();
        assert!(matches!(err, LoadError::TypeNotFound(ref name) if name == "Hello"));

        let err: LoadError = ResolveError::ModuleLoad("bad elf header".to_string()).into();
        assert_eq!(err.to_string(), "Unable to load module: bad elf header");
    }

    #[test]
    fn test_dispatch_error_display() {
        assert_eq!(
            DispatchError::NotInitialized.to_string(),
            "Cannot invoke an uninitialized action"
        );
        assert_eq!(
            DispatchError::Invocation("boom".to_string()).to_string(),
            "Action invocation failed: boom"
        );
    }

    #[test]
    fn test_panic_message_downcasts() {
        assert_eq!(panic_message(Box::new("static str")), "static str");
        assert_eq!(panic_message(Box::new("owned".to_string())), "owned");
        assert_eq!(panic_message(Box::new(7_u32)), "panic with non-string payload");
    }
}
