// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Dynamic-library resolution backend.
//!
//! Loads the module with the platform loader (`dlopen` on unix,
//! `LoadLibraryW` on windows), resolves the type's registration export,
//! validates the descriptor, and wraps the requested entry so invocation
//! crosses the C ABI with a NUL-terminated JSON payload and a response
//! sink of C function pointers.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::path::Path;
use std::sync::Arc;

use runlet_abi::{
    ABI_VERSION, ENTRY_KIND_DEFERRED, InvokeFn, RegisterFn, ResponseSink, type_symbol,
};
use serde_json::Value;

use super::{ResolveError, ResolvedEntry, UnitResolver};
use crate::response::ResponseWriter;
use crate::unit::{DispatchKind, EntryInvoke, InvokeError};

/// Resolver backed by the platform's dynamic loader.
#[derive(Debug, Default, Clone, Copy)]
pub struct DylibResolver;

impl DylibResolver {
    /// Create the native resolver.
    pub fn new() -> Self {
        Self
    }
}

impl UnitResolver for DylibResolver {
    fn module_file(&self, module: &str) -> String {
        if cfg!(target_os = "windows") {
            format!("{}.dll", module)
        } else if cfg!(target_os = "macos") {
            format!("lib{}.dylib", module)
        } else {
            format!("lib{}.so", module)
        }
    }

    fn resolve(
        &self,
        module_path: &Path,
        type_name: &str,
        function: &str,
    ) -> Result<ResolvedEntry, ResolveError> {
        let library = Arc::new(
            Library::open(module_path).map_err(ResolveError::ModuleLoad)?,
        );

        let symbol = type_symbol(type_name);
        let register: RegisterFn = unsafe { library.get(&symbol) }
            .map_err(|_| ResolveError::TypeNotFound(type_name.to_string()))?;

        let descriptor = unsafe { register() };
        if descriptor.is_null() {
            return Err(ResolveError::ModuleLoad(format!(
                "registration export \"{}\" returned NULL",
                symbol
            )));
        }
        let descriptor = unsafe { &*descriptor };
        if descriptor.abi_version != ABI_VERSION {
            return Err(ResolveError::ModuleLoad(format!(
                "module speaks ABI version {}, host speaks {}",
                descriptor.abi_version, ABI_VERSION
            )));
        }
        if descriptor.entries.is_null() || descriptor.entry_count == 0 {
            return Err(ResolveError::FunctionNotFound(function.to_string()));
        }

        let entries =
            unsafe { std::slice::from_raw_parts(descriptor.entries, descriptor.entry_count) };
        for entry in entries {
            if entry.name.is_null() {
                continue;
            }
            let name = unsafe { CStr::from_ptr(entry.name) };
            if name.to_str() != Ok(function) {
                continue;
            }
            let kind = if entry.kind == ENTRY_KIND_DEFERRED {
                DispatchKind::Deferred
            } else {
                DispatchKind::Immediate
            };
            return Ok(ResolvedEntry {
                kind,
                entry: Arc::new(NativeEntry {
                    invoke: entry.invoke,
                    _library: library,
                }),
            });
        }

        Err(ResolveError::FunctionNotFound(function.to_string()))
    }
}

/// An entry resolved out of a loaded library. Holds the library handle so
/// the code stays mapped for the process lifetime.
struct NativeEntry {
    invoke: InvokeFn,
    _library: Arc<Library>,
}

impl EntryInvoke for NativeEntry {
    fn invoke(&self, payload: &[u8], writer: &dyn ResponseWriter) -> Result<(), InvokeError> {
        let payload = CString::new(payload)
            .map_err(|_| InvokeError::new("invocation payload contains a NUL byte"))?;

        let bridge = SinkBridge { writer };
        let sink = ResponseSink {
            ctx: &bridge as *const SinkBridge as *mut c_void,
            success: bridge_success,
            error: bridge_error,
        };

        let status = unsafe { (self.invoke)(payload.as_ptr(), &sink) };
        if status == 0 {
            Ok(())
        } else {
            Err(InvokeError::with_detail(
                "The action returned a failure status",
                format!("native entry status {}", status),
            ))
        }
    }
}

/// Stack-pinned bridge between the C sink and the response writer. Valid
/// exactly for the duration of one `invoke` call.
struct SinkBridge<'a> {
    writer: &'a dyn ResponseWriter,
}

unsafe extern "C" fn bridge_success(ctx: *mut c_void, status: u16, body: *const c_char) {
    let Some(bridge) = (unsafe { ctx.cast::<SinkBridge>().as_ref() }) else {
        return;
    };
    if body.is_null() {
        bridge.writer.write_success(status, Value::Null);
        return;
    }
    let body = unsafe { CStr::from_ptr(body) }.to_string_lossy();
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => bridge.writer.write_success(status, value),
        Err(_) => bridge
            .writer
            .write_error("The action produced a body that is not valid JSON"),
    }
}

unsafe extern "C" fn bridge_error(ctx: *mut c_void, message: *const c_char) {
    let Some(bridge) = (unsafe { ctx.cast::<SinkBridge>().as_ref() }) else {
        return;
    };
    let message = if message.is_null() {
        "The action reported an error without a message".into()
    } else {
        unsafe { CStr::from_ptr(message) }.to_string_lossy()
    };
    bridge.writer.write_error(&message);
}

/// Loaded dynamic library handle.
#[derive(Debug)]
struct Library {
    handle: *mut c_void,
    path: String,
}

// The platform handles are process-global and the loader APIs are
// thread-safe; the handle itself is never mutated after open.
unsafe impl Send for Library {}
unsafe impl Sync for Library {}

impl Library {
    /// Load a dynamic library, resolving all symbols eagerly.
    fn open(path: &Path) -> Result<Self, String> {
        let path_str = path
            .to_str()
            .ok_or_else(|| format!("non-UTF-8 module path: {:?}", path))?;
        let handle = platform::load(path_str)?;
        Ok(Self {
            handle,
            path: path_str.to_string(),
        })
    }

    /// Resolve a symbol to a function pointer of type `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure `T` matches the symbol's actual signature
    /// and that the library outlives every use of the pointer.
    unsafe fn get<T>(&self, symbol: &str) -> Result<T, String> {
        unsafe { platform::symbol(self.handle, symbol, &self.path) }
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        platform::unload(self.handle);
    }
}

#[cfg(unix)]
mod platform {
    use std::ffi::{CStr, CString};
    use std::os::raw::c_void;

    pub fn load(path: &str) -> Result<*mut c_void, String> {
        let c_path = CString::new(path).map_err(|_| format!("module path contains NUL: {}", path))?;

        // RTLD_NOW: resolve everything up front so a broken module fails
        // at install time, not mid-invocation.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(format!("{}: {}", path, last_error()));
        }
        Ok(handle)
    }

    pub unsafe fn symbol<T>(handle: *mut c_void, name: &str, path: &str) -> Result<T, String> {
        let c_name =
            CString::new(name).map_err(|_| format!("symbol name contains NUL: {}", name))?;

        unsafe {
            // Clear any stale error before the lookup.
            libc::dlerror();
            let symbol = libc::dlsym(handle, c_name.as_ptr());
            let err = libc::dlerror();
            if !err.is_null() || symbol.is_null() {
                return Err(format!("{} in {}: {}", name, path, last_error()));
            }
            Ok(std::mem::transmute_copy(&symbol))
        }
    }

    pub fn unload(handle: *mut c_void) {
        unsafe {
            libc::dlclose(handle);
        }
    }

    fn last_error() -> String {
        unsafe {
            let err = libc::dlerror();
            if err.is_null() {
                "unknown loader error".to_string()
            } else {
                CStr::from_ptr(err).to_string_lossy().into_owned()
            }
        }
    }
}

#[cfg(windows)]
mod platform {
    use std::ffi::CString;
    use std::os::raw::c_void;

    unsafe extern "system" {
        fn LoadLibraryW(filename: *const u16) -> *mut c_void;
        fn GetProcAddress(module: *mut c_void, procname: *const i8) -> *mut c_void;
        fn FreeLibrary(module: *mut c_void) -> i32;
        fn GetLastError() -> u32;
    }

    pub fn load(path: &str) -> Result<*mut c_void, String> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;

        let wide: Vec<u16> = OsStr::new(path)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let handle = unsafe { LoadLibraryW(wide.as_ptr()) };
        if handle.is_null() {
            return Err(format!("{} (error code {})", path, unsafe { GetLastError() }));
        }
        Ok(handle)
    }

    pub unsafe fn symbol<T>(handle: *mut c_void, name: &str, path: &str) -> Result<T, String> {
        let c_name =
            CString::new(name).map_err(|_| format!("symbol name contains NUL: {}", name))?;

        let symbol = unsafe { GetProcAddress(handle, c_name.as_ptr()) };
        if symbol.is_null() {
            return Err(format!(
                "{} in {} (error code {})",
                name,
                path,
                unsafe { GetLastError() }
            ));
        }
        unsafe { Ok(std::mem::transmute_copy(&symbol)) }
    }

    pub fn unload(handle: *mut c_void) {
        unsafe {
            FreeLibrary(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_file_naming() {
        let resolver = DylibResolver::new();
        let name = resolver.module_file("demo");
        if cfg!(target_os = "windows") {
            assert_eq!(name, "demo.dll");
        } else if cfg!(target_os = "macos") {
            assert_eq!(name, "libdemo.dylib");
        } else {
            assert_eq!(name, "libdemo.so");
        }
    }

    #[test]
    fn test_open_missing_library() {
        let err = Library::open(Path::new("/nonexistent/libnope.so")).unwrap_err();
        assert!(err.contains("libnope"));
    }

    #[test]
    fn test_resolve_non_library_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("libtext.so");
        std::fs::write(&path, b"definitely not a shared object").unwrap();

        let err = DylibResolver::new()
            .resolve(&path, "Hello", "run")
            .unwrap_err();
        assert!(matches!(err, ResolveError::ModuleLoad(_)));
    }
}
