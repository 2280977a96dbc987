use std::ffi::{CStr, CString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ffi::{self, CompilerLibrary};
use crate::settings::ExportSettings;

/// Every way a compile-and-save action can end short of success.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("markup contains a NUL character at byte {position}")]
    Encoding { position: usize },

    #[error("the compiler rejected the markup")]
    Compilation,

    #[error("save cancelled")]
    Cancelled,

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("compile worker exited without a result")]
    WorkerGone,
}

impl ExportError {
    /// Cancelling the save dialog is an outcome, not a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The line shown in the status label.
    pub fn status_text(&self) -> String {
        match self {
            Self::Encoding { .. } => "Error: Failed to convert input to C string".to_string(),
            Self::Compilation | Self::WorkerGone => "Error: Compilation failed".to_string(),
            Self::Cancelled => "Save operation cancelled".to_string(),
            Self::Write { source, .. } => format!("Error: Failed to save PDF - {source}"),
        }
    }
}

/// Asks the user where the PDF should go.
pub trait SavePrompt {
    /// `None` means the user cancelled.
    fn choose_destination(&self, settings: &ExportSettings) -> Option<PathBuf>;
}

/// The platform save dialog.
#[derive(Debug, Default, Clone, Copy)]
pub struct RfdSavePrompt;

impl SavePrompt for RfdSavePrompt {
    fn choose_destination(&self, settings: &ExportSettings) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .set_title(&settings.dialog_title)
            .add_filter(&settings.filter_name, settings.extensions)
            .set_file_name(&settings.default_file_name)
            .set_can_create_directories(true);

        if let Some(dir) = &settings.default_directory {
            dialog = dialog.set_directory(dir);
        }

        dialog.save_file()
    }
}

/// Turns the editor text into the NUL-terminated string the compiler expects.
pub fn encode_markup(markup: &str) -> Result<CString, ExportError> {
    CString::new(markup).map_err(|e| ExportError::Encoding {
        position: e.nul_position(),
    })
}

/// Runs the compiler and returns an owned copy of the PDF bytes.
pub fn compile_markup<L: CompilerLibrary + ?Sized>(
    library: &L,
    input: &CStr,
) -> Result<Vec<u8>, ExportError> {
    info!(input_len = input.to_bytes().len(), "compiling markup");
    match ffi::compile(library, input) {
        Some(bytes) => {
            info!(output_len = bytes.len(), "compilation finished");
            Ok(bytes)
        }
        None => {
            warn!("compiler returned no output");
            Err(ExportError::Compilation)
        }
    }
}

/// Writes `bytes` to `path`, replacing any existing contents.
///
/// Writes go through the destination itself, so an existing file keeps its
/// permissions and symlinks are followed. If the file did not exist before and
/// the write fails, whatever was created is removed again.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let existed = path.symlink_metadata().is_ok();

    if let Err(source) = fs::write(path, bytes) {
        if !existed {
            if let Err(e) = fs::remove_file(path) {
                debug!(error = %e, "nothing to clean up after failed write");
            }
        }
        return Err(ExportError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

/// Prompts for a destination and writes `bytes` there.
pub fn save_output<P: SavePrompt + ?Sized>(
    prompt: &P,
    settings: &ExportSettings,
    bytes: &[u8],
) -> Result<PathBuf, ExportError> {
    let Some(path) = prompt.choose_destination(settings) else {
        info!("save dialog cancelled");
        return Err(ExportError::Cancelled);
    };
    debug!(path = %path.display(), "writing PDF");

    if let Err(e) = write_output(&path, bytes) {
        warn!(error = %e, "saving PDF failed");
        return Err(e);
    }
    info!(path = %path.display(), len = bytes.len(), "PDF saved");
    Ok(path)
}

/// The whole action in one synchronous call: encode, compile, copy and free,
/// prompt, write.
pub fn compile_and_export<L, P>(
    library: &L,
    prompt: &P,
    settings: &ExportSettings,
    markup: &str,
) -> Result<PathBuf, ExportError>
where
    L: CompilerLibrary + ?Sized,
    P: SavePrompt + ?Sized,
{
    let input = encode_markup(markup)?;
    let bytes = compile_markup(library, &input)?;
    save_output(prompt, settings, &bytes)
}
