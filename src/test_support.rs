//! In-process stand-ins for the native compiler and the save dialog, shared by
//! the unit tests and `tests/` (through the `test-support` feature).

use std::ffi::{CStr, c_char};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::export::SavePrompt;
use crate::ffi::CompilerLibrary;
use crate::settings::ExportSettings;

/// Stands in for `typst_ffi`: hands out heap copies of a fixed output and
/// counts every compile and release.
pub struct MockLibrary {
    output: Option<Vec<u8>>,
    panics: bool,
    compiles: AtomicUsize,
    releases: AtomicUsize,
    last_input: Mutex<Option<String>>,
}

impl MockLibrary {
    pub fn returning(output: Vec<u8>) -> Self {
        Self::new(Some(output))
    }

    pub fn failing() -> Self {
        Self::new(None)
    }

    /// Panics inside `compile`, the way a crashing worker would.
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::new(None)
        }
    }

    fn new(output: Option<Vec<u8>>) -> Self {
        Self {
            output,
            panics: false,
            compiles: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            last_input: Mutex::new(None),
        }
    }

    pub fn compile_calls(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn last_input(&self) -> Option<String> {
        self.last_input.lock().unwrap().clone()
    }
}

unsafe impl CompilerLibrary for MockLibrary {
    unsafe fn compile(&self, input: *const c_char, out_len: *mut usize) -> *mut u8 {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if self.panics {
            panic!("compiler crashed");
        }
        let text = unsafe { CStr::from_ptr(input) }.to_string_lossy().into_owned();
        *self.last_input.lock().unwrap() = Some(text);

        match &self.output {
            Some(bytes) => {
                let boxed = bytes.clone().into_boxed_slice();
                unsafe { *out_len = boxed.len() };
                Box::into_raw(boxed).cast::<u8>()
            }
            None => std::ptr::null_mut(),
        }
    }

    unsafe fn release(&self, ptr: *mut u8) {
        let previous = self.releases.fetch_add(1, Ordering::SeqCst);
        assert!(previous < self.compile_calls(), "released more buffers than compiled");
        let len = self.output.as_ref().map_or(0, Vec::len);
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) });
    }
}

/// A save prompt that answers with a fixed destination, or cancels.
pub struct ScriptedPrompt {
    destination: Option<PathBuf>,
    prompts: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn choosing(path: impl Into<PathBuf>) -> Self {
        Self {
            destination: Some(path.into()),
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn cancelling() -> Self {
        Self {
            destination: None,
            prompts: AtomicUsize::new(0),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl SavePrompt for ScriptedPrompt {
    fn choose_destination(&self, _settings: &ExportSettings) -> Option<PathBuf> {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        self.destination.clone()
    }
}
