// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared helpers for runlet-core integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::{Engine as _, engine::general_purpose};
use runlet_core::markers::LogMarker;
use runlet_core::payload::BootstrapPayload;
use runlet_core::response::ResponseWriter;
use runlet_core::unit::InvokeError;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Base64-encoded zip archive with the given files.
pub fn encoded_package(files: &[(&str, &[u8])]) -> String {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents).unwrap();
    }
    general_purpose::STANDARD.encode(writer.finish().unwrap().into_inner())
}

/// A package containing a single mock module file named `{module}.mock`.
pub fn mock_module_package(module: &str) -> String {
    encoded_package(&[(&format!("{}.mock", module), b"mock module")])
}

/// A valid bootstrap payload for the given entry path and package.
pub fn payload(main: &str, code: String) -> BootstrapPayload {
    BootstrapPayload {
        main: main.to_string(),
        binary: true,
        code,
    }
}

/// Log marker that counts emissions.
#[derive(Debug, Default)]
pub struct CountingMarker {
    emitted: AtomicUsize,
}

impl CountingMarker {
    pub fn count(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }
}

impl LogMarker for CountingMarker {
    fn emit(&self) {
        self.emitted.fetch_add(1, Ordering::SeqCst);
    }
}

/// Entry that echoes the payload back as a JSON string body.
pub fn echo_entry(payload: &[u8], writer: &dyn ResponseWriter) -> Result<(), InvokeError> {
    writer.write_success(200, serde_json::json!(String::from_utf8_lossy(payload)));
    Ok(())
}

/// Entry that fails with an error return.
pub fn failing_entry(_payload: &[u8], _writer: &dyn ResponseWriter) -> Result<(), InvokeError> {
    Err(InvokeError::new("deliberate failure"))
}

/// Entry that panics.
pub fn panicking_entry(_payload: &[u8], _writer: &dyn ResponseWriter) -> Result<(), InvokeError> {
    panic!("deliberate panic");
}

/// Entry that completes without writing anything.
pub fn silent_entry(_payload: &[u8], _writer: &dyn ResponseWriter) -> Result<(), InvokeError> {
    Ok(())
}
