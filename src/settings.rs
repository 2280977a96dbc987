use std::path::PathBuf;

pub const APP_TITLE: &str = "Typst to PDF Converter";

pub const SAMPLE_MARKUP: &str = "#set page(width: 200pt, height: 200pt)\nHello, *Typst* world!";

const PDF_EXTENSIONS: &[&str] = &["pdf"];

/// How the save dialog is presented. Built fresh at startup, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub dialog_title: String,
    pub default_file_name: String,
    pub filter_name: String,
    pub extensions: &'static [&'static str],
    pub default_directory: Option<PathBuf>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            dialog_title: "Save PDF As...".to_string(),
            default_file_name: "output.pdf".to_string(),
            filter_name: "PDF Document".to_string(),
            extensions: PDF_EXTENSIONS,
            default_directory: dirs::document_dir().or_else(dirs::home_dir),
        }
    }
}
