// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Code package unpacking.
//!
//! The bootstrap payload carries the action as a base64-encoded zip
//! archive. Each install attempt unpacks into its own fresh directory so
//! a failed attempt can never leave a half-written tree behind for a
//! retry to trip over.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;
use uuid::Uuid;
use zip::ZipArchive;

/// Why a code package could not be unpacked.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PackageError {
    /// The code field is not valid base64.
    #[error("invalid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The decoded bytes are not a readable zip archive.
    #[error("invalid zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Filesystem failure while materializing the archive.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode `code` and extract the archive into a fresh process-unique
/// directory under `data_dir`. Returns the extraction directory, which
/// becomes the installed unit's working context.
pub fn unpack(code: &str, data_dir: &Path) -> Result<PathBuf, PackageError> {
    let bytes = general_purpose::STANDARD.decode(code.trim())?;
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let dest = data_dir.join(Uuid::new_v4().to_string());
    std::fs::create_dir_all(&dest)?;
    archive.extract(&dest)?;

    tracing::debug!(dest = %dest.display(), entries = archive.len(), "unpacked code package");

    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn zip_with_files(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unpack_extracts_files() {
        let dir = tempfile::tempdir().unwrap();
        let archive = zip_with_files(&[("libdemo.so", b"not really elf"), ("assets/config.json", b"{}")]);
        let code = general_purpose::STANDARD.encode(archive);

        let dest = unpack(&code, dir.path()).unwrap();

        assert!(dest.starts_with(dir.path()));
        assert_eq!(std::fs::read(dest.join("libdemo.so")).unwrap(), b"not really elf");
        assert_eq!(std::fs::read(dest.join("assets/config.json")).unwrap(), b"{}");
    }

    #[test]
    fn test_unpack_unique_directories() {
        let dir = tempfile::tempdir().unwrap();
        let code = general_purpose::STANDARD.encode(zip_with_files(&[("a", b"a")]));

        let first = unpack(&code, dir.path()).unwrap();
        let second = unpack(&code, dir.path()).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_unpack_rejects_bad_base64() {
        let dir = tempfile::tempdir().unwrap();
        let err = unpack("not base64!!!", dir.path()).unwrap_err();
        assert!(matches!(err, PackageError::Decode(_)));
    }

    #[test]
    fn test_unpack_rejects_non_zip_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let code = general_purpose::STANDARD.encode(b"plain text, no archive");
        let err = unpack(&code, dir.path()).unwrap_err();
        assert!(matches!(err, PackageError::Archive(_)));
    }

    #[test]
    fn test_unpack_tolerates_surrounding_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let code = format!("\n{}\n", general_purpose::STANDARD.encode(zip_with_files(&[("a", b"a")])));
        assert!(unpack(&code, dir.path()).is_ok());
    }
}
