// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Bootstrap payload and entry-path parsing.

use std::fmt;

use serde::Deserialize;

use crate::error::LoadError;

/// Wire shape of an init request: the payload arrives nested under a
/// `value` key, `{"value": {"main": ..., "binary": ..., "code": ...}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitRequest {
    /// The bootstrap payload proper.
    #[serde(default)]
    pub value: BootstrapPayload,
}

/// The one-shot bootstrap payload that supplies the runnable code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BootstrapPayload {
    /// Entry path, `Module::Type::Function`.
    #[serde(default)]
    pub main: String,
    /// Must be `true`: only packaged binary code is accepted.
    #[serde(default)]
    pub binary: bool,
    /// Base64-encoded zip archive with the module and its dependencies.
    #[serde(default)]
    pub code: String,
}

/// The three components of a `main` entry path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPath {
    /// On-disk module identifier (without the platform file extension).
    pub module: String,
    /// Action type exported by the module.
    pub type_name: String,
    /// Entry function exposed by the type.
    pub function: String,
}

impl EntryPath {
    /// Split `main` into its three components.
    ///
    /// Anything other than exactly three non-empty `::`-separated parts
    /// is rejected as [`LoadError::MalformedMain`].
    pub fn parse(main: &str) -> Result<Self, LoadError> {
        let parts: Vec<&str> = main.split("::").collect();
        match parts.as_slice() {
            [module, type_name, function]
                if !module.is_empty() && !type_name.is_empty() && !function.is_empty() =>
            {
                Ok(Self {
                    module: (*module).to_string(),
                    type_name: (*type_name).to_string(),
                    function: (*function).to_string(),
                })
            }
            _ => Err(LoadError::MalformedMain),
        }
    }
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.module, self.type_name, self.function)
    }
}
