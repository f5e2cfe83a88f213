//! C ABI over [`Converter`]
//!
//! Hosts that cannot link Rust directly (a Node.js or Go service loading the
//! shared library, a C server module) drive the converter through four
//! functions:
//!
//! 1. `html_md_converter_new()` builds a handle
//! 2. `html_md_convert()` converts one document into an [`HtmlMdResult`]
//! 3. `html_md_result_free()` releases the result's buffers
//! 4. `html_md_converter_free()` destroys the handle
//!
//! # String representation
//!
//! **All strings are UTF-8 bytes + length, never NUL-terminated.** Input HTML
//! is read as `html_len` bytes from `html`; output Markdown and error messages
//! come back as pointer/`_len` pairs. C code must use the length fields and
//! never call `strlen()` on them.
//!
//! # Memory management
//!
//! Rust allocates every output buffer as a `Box<[u8]>`. The caller reads it
//! and hands it back through `html_md_result_free()` exactly once; calling
//! libc `free()` on these pointers mixes allocators and is undefined
//! behavior.
//!
//! ```rust
//! use html_md_converter::ffi::*;
//! use std::{ptr, slice};
//!
//! let handle = html_md_converter_new();
//! let html = b"<h1>Hi</h1>";
//! let mut result = HtmlMdResult::default();
//!
//! unsafe { html_md_convert(handle, html.as_ptr(), html.len(), &mut result) };
//! assert_eq!(result.error_code, ERROR_SUCCESS);
//! let markdown = unsafe { slice::from_raw_parts(result.markdown, result.markdown_len) };
//! assert_eq!(markdown, b"# Hi");
//!
//! unsafe {
//!     html_md_result_free(&mut result);
//!     html_md_converter_free(handle);
//! }
//! assert!(result.markdown.is_null());
//! ```
//!
//! # Error contract
//!
//! On success `error_code` is 0 and `markdown` is non-NULL (possibly with
//! `markdown_len == 0`). On failure `error_code` is one of the `ERROR_*`
//! constants, `error_message` describes the failure and `markdown` is NULL.
//! Panics never unwind into the caller: they are caught and reported as
//! [`ERROR_INTERNAL`].
//!
//! # Thread safety
//!
//! A handle wraps an immutable [`Converter`], so one handle may be used by
//! any number of threads at once. Only `html_md_converter_free()` requires
//! that no conversion is in flight.

use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

use crate::converter::Converter;
use crate::error::ConversionError;

/// Success - no error occurred
pub const ERROR_SUCCESS: u32 = 0;

/// Input bytes are not valid for the detected charset, or the charset is unsupported
pub const ERROR_ENCODING: u32 = 2;

/// Conversion deadline exceeded
pub const ERROR_TIMEOUT: u32 = 3;

/// Input larger than the configured limit
pub const ERROR_INPUT_TOO_LARGE: u32 = 4;

/// Invalid input (NULL pointers, nesting limit exceeded)
pub const ERROR_INVALID_INPUT: u32 = 5;

/// Internal error (unexpected condition, panic caught)
pub const ERROR_INTERNAL: u32 = 99;

/// Conversion result handed to C
///
/// Populated by `html_md_convert()`, released by `html_md_result_free()`.
#[repr(C)]
#[derive(Debug)]
pub struct HtmlMdResult {
    /// Markdown (UTF-8 bytes, NOT NUL-terminated); NULL on error
    pub markdown: *mut u8,
    /// Length of markdown in bytes
    pub markdown_len: usize,
    /// 0 on success, otherwise an `ERROR_*` constant
    pub error_code: u32,
    /// Error description (UTF-8 bytes); NULL on success
    pub error_message: *mut u8,
    /// Length of error_message in bytes
    pub error_len: usize,
}

impl Default for HtmlMdResult {
    fn default() -> Self {
        Self {
            markdown: ptr::null_mut(),
            markdown_len: 0,
            error_code: ERROR_SUCCESS,
            error_message: ptr::null_mut(),
            error_len: 0,
        }
    }
}

/// Opaque converter handle
pub struct HtmlMdConverter {
    converter: Converter,
}

fn reset_result(result: &mut HtmlMdResult) {
    *result = HtmlMdResult::default();
}

fn set_error_result(result: &mut HtmlMdResult, error_code: u32, error_message: String) {
    let error_bytes = error_message.into_bytes().into_boxed_slice();
    result.error_code = error_code;
    result.error_len = error_bytes.len();
    result.error_message = Box::into_raw(error_bytes) as *mut u8;
}

fn set_success_result(result: &mut HtmlMdResult, markdown: String) {
    let markdown_bytes = markdown.into_bytes().into_boxed_slice();
    result.markdown_len = markdown_bytes.len();
    result.markdown = Box::into_raw(markdown_bytes) as *mut u8;
    result.error_code = ERROR_SUCCESS;
}

fn required_ref<'a, T>(ptr: *const T, name: &str) -> Result<&'a T, ConversionError> {
    if ptr.is_null() {
        return Err(ConversionError::InvalidInput(format!("{name} pointer is NULL")));
    }

    // SAFETY: non-NULL, and the caller guarantees it points to a live,
    // properly aligned value for the duration of the call.
    Ok(unsafe { &*ptr })
}

fn required_bytes<'a>(ptr: *const u8, len: usize, name: &str) -> Result<&'a [u8], ConversionError> {
    if len == 0 {
        return Ok(&[]);
    }

    if ptr.is_null() {
        return Err(ConversionError::InvalidInput(format!(
            "{name}_len > 0 with NULL {name} pointer"
        )));
    }

    // SAFETY: non-NULL, and the caller guarantees `len` readable bytes.
    Ok(unsafe { slice::from_raw_parts(ptr, len) })
}

fn free_buffer(ptr_field: &mut *mut u8, len_field: &mut usize) {
    if (*ptr_field).is_null() {
        return;
    }

    let raw = ptr::slice_from_raw_parts_mut(*ptr_field, *len_field);
    // SAFETY: every non-NULL buffer in a result came from `Box::into_raw` on
    // a `Box<[u8]>` of exactly this length.
    drop(unsafe { Box::from_raw(raw) });
    *ptr_field = ptr::null_mut();
    *len_field = 0;
}

/// Create a converter handle.
///
/// Returns NULL if construction panicked. Free with `html_md_converter_free()`.
#[unsafe(no_mangle)]
pub extern "C" fn html_md_converter_new() -> *mut HtmlMdConverter {
    panic::catch_unwind(|| {
        Box::into_raw(Box::new(HtmlMdConverter {
            converter: Converter::new(),
        }))
    })
    .unwrap_or(ptr::null_mut())
}

/// Convert `html_len` bytes of HTML at `html` into `result`.
///
/// The bytes are decoded as UTF-8 unless a `<meta>` charset declaration
/// says otherwise. `html` may be NULL when `html_len` is 0, which yields
/// empty Markdown. `result` is overwritten without being freed first.
///
/// # Safety
///
/// - `result` must be NULL (the call is then a no-op) or point to a writable
///   `HtmlMdResult`.
/// - `handle` must be NULL or a live handle from `html_md_converter_new()`.
/// - `html` must point to at least `html_len` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn html_md_convert(
    handle: *const HtmlMdConverter,
    html: *const u8,
    html_len: usize,
    result: *mut HtmlMdResult,
) {
    if result.is_null() {
        return;
    }

    // SAFETY: `result` was checked for NULL above.
    let result_ref = unsafe { &mut *result };
    reset_result(result_ref);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> Result<String, ConversionError> {
        let handle_ref = required_ref(handle, "converter handle")?;
        let html_bytes = required_bytes(html, html_len, "html")?;
        handle_ref.converter.convert_bytes(html_bytes, None)
    }));

    match outcome {
        Ok(Ok(markdown)) => set_success_result(result_ref, markdown),
        Ok(Err(e)) => set_error_result(result_ref, e.code(), e.to_string()),
        Err(_) => set_error_result(
            result_ref,
            ERROR_INTERNAL,
            ConversionError::Internal("panic during conversion".to_string()).to_string(),
        ),
    }
}

/// Release the buffers of a result. Idempotent; NULL is a no-op.
///
/// # Safety
///
/// `result` must be NULL or point to an `HtmlMdResult` populated by
/// `html_md_convert()` (or zeroed).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn html_md_result_free(result: *mut HtmlMdResult) {
    if result.is_null() {
        return;
    }

    // SAFETY: `result` was checked for NULL above.
    let result_ref = unsafe { &mut *result };
    free_buffer(&mut result_ref.markdown, &mut result_ref.markdown_len);
    free_buffer(&mut result_ref.error_message, &mut result_ref.error_len);
    result_ref.error_code = ERROR_SUCCESS;
}

/// Destroy a converter handle. NULL is a no-op.
///
/// # Safety
///
/// `handle` must be NULL or a handle from `html_md_converter_new()` that has
/// not been freed and has no conversion in flight.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn html_md_converter_free(handle: *mut HtmlMdConverter) {
    if handle.is_null() {
        return;
    }

    // SAFETY: created by `Box::into_raw` in `html_md_converter_new`.
    drop(unsafe { Box::from_raw(handle) });
}
