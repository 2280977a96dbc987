//! The C ABI of the native Typst compiler and the guard that owns its output.
//!
//! ```c
//! uint8_t *compile_typst(const char *input, size_t *output_len);
//! void free_typst_buffer(uint8_t *ptr);
//! ```
//!
//! Nothing outside this module touches the raw pointer. [`compile`] hands back
//! an owned `Vec<u8>` and the foreign allocation is already released by then.

use std::ffi::{CStr, c_char};
use std::ptr::NonNull;

/// A native library exposing the compile/free pair.
///
/// # Safety
///
/// `compile` must return either null or a pointer to `*out_len` initialised
/// bytes that stay valid until the same pointer is passed to `release`.
/// `release` must accept every non-null pointer produced by `compile`.
pub unsafe trait CompilerLibrary: Send + Sync {
    /// # Safety
    ///
    /// `input` must point to a NUL-terminated string and `out_len` must be
    /// valid for writes.
    unsafe fn compile(&self, input: *const c_char, out_len: *mut usize) -> *mut u8;

    /// # Safety
    ///
    /// `ptr` must have been returned by `compile` on this library and must not
    /// have been released already.
    unsafe fn release(&self, ptr: *mut u8);
}

/// An output buffer still owned by the native library.
///
/// Dropping it calls [`CompilerLibrary::release`] exactly once, on every exit
/// path including unwinding.
pub struct ForeignBuffer<'lib, L: CompilerLibrary + ?Sized> {
    library: &'lib L,
    ptr: NonNull<u8>,
    len: usize,
}

impl<'lib, L: CompilerLibrary + ?Sized> ForeignBuffer<'lib, L> {
    /// Takes ownership of a pointer returned by `library.compile`.
    /// Returns `None` for a null pointer; nothing is released in that case.
    ///
    /// # Safety
    ///
    /// `ptr` and `len` must be exactly what `library.compile` produced, and
    /// the pointer must not be released anywhere else.
    pub unsafe fn from_raw(library: &'lib L, ptr: *mut u8, len: usize) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { library, ptr, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        // SAFETY: the library contract guarantees `len` initialised bytes at
        // `ptr` until release, and release only happens in `drop`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Copies the bytes out and releases the foreign allocation.
    pub fn into_vec(self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

impl<L: CompilerLibrary + ?Sized> Drop for ForeignBuffer<'_, L> {
    fn drop(&mut self) {
        // SAFETY: `ptr` came from `compile` on this library and this is the
        // only place it is released.
        unsafe { self.library.release(self.ptr.as_ptr()) }
    }
}

/// Runs the native compiler on `input`.
///
/// Blocks for as long as the library takes. Returns `None` when the library
/// reports failure with a null pointer.
pub fn compile<L: CompilerLibrary + ?Sized>(library: &L, input: &CStr) -> Option<Vec<u8>> {
    let mut out_len: usize = 0;
    // SAFETY: `input` is NUL-terminated and `out_len` is a live local.
    let ptr = unsafe { library.compile(input.as_ptr(), &mut out_len) };
    // SAFETY: pointer and length come straight from the call above.
    let buffer = unsafe { ForeignBuffer::from_raw(library, ptr, out_len) }?;
    tracing::debug!(len = buffer.len(), "copying compiled output");
    Some(buffer.into_vec())
}

#[cfg(feature = "native")]
pub use native::NativeLibrary;

#[cfg(feature = "native")]
mod native {
    use std::ffi::c_char;

    use super::CompilerLibrary;

    #[link(name = "typst_ffi")]
    unsafe extern "C" {
        fn compile_typst(input: *const c_char, output_len: *mut usize) -> *mut u8;
        fn free_typst_buffer(ptr: *mut u8);
    }

    /// The statically linked `typst_ffi` library.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct NativeLibrary;

    // SAFETY: `typst_ffi` documents the null-or-`output_len`-bytes contract
    // and frees through `free_typst_buffer`.
    unsafe impl CompilerLibrary for NativeLibrary {
        unsafe fn compile(&self, input: *const c_char, out_len: *mut usize) -> *mut u8 {
            unsafe { compile_typst(input, out_len) }
        }

        unsafe fn release(&self, ptr: *mut u8) {
            unsafe { free_typst_buffer(ptr) }
        }
    }
}
