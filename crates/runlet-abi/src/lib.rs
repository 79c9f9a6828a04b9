// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! C ABI contract between the runlet host and native action modules.
//!
//! An action module is a dynamic library shipped inside the init package.
//! For every action type it exposes, the module exports one registration
//! symbol named [`type_symbol`]`(type_name)` with the signature
//! `unsafe extern "C" fn() -> *const TypeDescriptor`. The descriptor lists
//! the callable entry points of that type; the host resolves the requested
//! function against it once, at install time.
//!
//! Entry points receive the invocation payload as a NUL-terminated JSON
//! string and a [`ResponseSink`] whose function pointers forward into the
//! host's response writer. An entry returns `0` on success and any other
//! value on failure; whatever it wrote through the sink stands either way.
//!
//! # Exporting an action type
//!
//! ```rust,ignore
//! use runlet_abi::{ENTRY_KIND_SYNC, ResponseSink, SinkHandle, TypeDescriptor, leak_descriptor};
//! use std::os::raw::c_char;
//!
//! unsafe extern "C" fn echo(payload: *const c_char, sink: *const ResponseSink) -> i32 {
//!     let Some(sink) = (unsafe { SinkHandle::from_raw(sink) }) else {
//!         return 1;
//!     };
//!     let payload = unsafe { std::ffi::CStr::from_ptr(payload) };
//!     sink.success(200, payload.to_string_lossy().as_ref());
//!     0
//! }
//!
//! // The host resolves "Echo" by looking up this export.
//! #[unsafe(no_mangle)]
//! pub extern "C" fn runlet_type_Echo() -> *const TypeDescriptor {
//!     leak_descriptor(&[("run", ENTRY_KIND_SYNC, echo)])
//! }
//! ```

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};

/// Version of the descriptor layout. The host refuses descriptors built
/// against a different version.
pub const ABI_VERSION: u32 = 1;

/// Entry completes before `invoke` returns; the host calls it inline.
pub const ENTRY_KIND_SYNC: u32 = 0;

/// Entry is driven off the calling worker and awaited by the host.
pub const ENTRY_KIND_DEFERRED: u32 = 1;

/// Prefix of type registration exports.
pub const TYPE_SYMBOL_PREFIX: &str = "runlet_type_";

/// Signature of an action entry point.
///
/// `payload` is a NUL-terminated JSON string owned by the host for the
/// duration of the call. Returns `0` on success, nonzero on failure.
pub type InvokeFn = unsafe extern "C" fn(payload: *const c_char, sink: *const ResponseSink) -> i32;

/// Signature of a type registration export.
pub type RegisterFn = unsafe extern "C" fn() -> *const TypeDescriptor;

/// Response sink handed to an entry point for the duration of one
/// invocation. The function pointers forward into the host's response
/// writer; `ctx` is host-owned and opaque to the module.
#[repr(C)]
pub struct ResponseSink {
    /// Host-owned context pointer, passed back on every write.
    pub ctx: *mut c_void,
    /// Write a success response: status code plus a JSON body.
    pub success: unsafe extern "C" fn(ctx: *mut c_void, status: u16, body_json: *const c_char),
    /// Write an error response with the given message.
    pub error: unsafe extern "C" fn(ctx: *mut c_void, message: *const c_char),
}

/// One callable entry point of an action type.
#[repr(C)]
pub struct EntryPoint {
    /// NUL-terminated entry name, matched against the function component
    /// of the action's `main`.
    pub name: *const c_char,
    /// [`ENTRY_KIND_SYNC`] or [`ENTRY_KIND_DEFERRED`].
    pub kind: u32,
    /// The entry function itself.
    pub invoke: InvokeFn,
}

/// Descriptor returned by a type registration export.
#[repr(C)]
pub struct TypeDescriptor {
    /// Must equal [`ABI_VERSION`].
    pub abi_version: u32,
    /// Pointer to `entry_count` consecutive [`EntryPoint`]s with static
    /// lifetime.
    pub entries: *const EntryPoint,
    /// Number of entries.
    pub entry_count: usize,
}

/// Registration export name for an action type.
///
/// Characters outside `[A-Za-z0-9_]` are mapped to `_` so namespaced type
/// names (for example `Demo.Hello`) still yield a linkable symbol.
pub fn type_symbol(type_name: &str) -> String {
    let sanitized: String = type_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("{}{}", TYPE_SYMBOL_PREFIX, sanitized)
}

/// Build a [`TypeDescriptor`] from `(name, kind, invoke)` triples and leak
/// it with static lifetime.
///
/// Intended for registration exports, which the host calls at most once
/// per process; the leak is the descriptor's required `'static` lifetime,
/// not a defect. Entries with a name containing an interior NUL are
/// skipped.
pub fn leak_descriptor(entries: &[(&str, u32, InvokeFn)]) -> *const TypeDescriptor {
    let built: Vec<EntryPoint> = entries
        .iter()
        .filter_map(|(name, kind, invoke)| {
            let name = CString::new(*name).ok()?;
            Some(EntryPoint {
                name: name.into_raw().cast_const(),
                kind: *kind,
                invoke: *invoke,
            })
        })
        .collect();

    let entries: &'static [EntryPoint] = Box::leak(built.into_boxed_slice());
    let descriptor = Box::new(TypeDescriptor {
        abi_version: ABI_VERSION,
        entries: entries.as_ptr(),
        entry_count: entries.len(),
    });
    Box::leak(descriptor)
}

const FALLBACK_MESSAGE: &CStr = c"<message contained an interior NUL byte>";

/// Safe wrapper around a raw [`ResponseSink`] for action authors.
pub struct SinkHandle<'a> {
    raw: &'a ResponseSink,
}

impl<'a> SinkHandle<'a> {
    /// Wrap a raw sink pointer. Returns `None` for a NULL pointer.
    ///
    /// # Safety
    ///
    /// `sink` must point to a [`ResponseSink`] that stays valid for the
    /// lifetime of the handle. The host guarantees this for the sink it
    /// passes into an entry point, for the duration of that call.
    pub unsafe fn from_raw(sink: *const ResponseSink) -> Option<Self> {
        unsafe { sink.as_ref() }.map(|raw| Self { raw })
    }

    /// Write a success response with the given status and JSON body.
    pub fn success(&self, status: u16, body_json: &str) {
        let body = CString::new(body_json).unwrap_or_else(|_| FALLBACK_MESSAGE.to_owned());
        unsafe { (self.raw.success)(self.raw.ctx, status, body.as_ptr()) };
    }

    /// Write an error response with the given message.
    pub fn error(&self, message: &str) {
        let message = CString::new(message).unwrap_or_else(|_| FALLBACK_MESSAGE.to_owned());
        unsafe { (self.raw.error)(self.raw.ctx, message.as_ptr()) };
    }
}
