use std::path::Path;

use chrono::{DateTime, Local};

use crate::export::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Idle,
    Busy,
    Success,
    Cancelled,
    Error,
}

/// The single line under the button. Each action overwrites it.
#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
    pub at: Option<DateTime<Local>>,
}

impl Status {
    pub fn idle() -> Self {
        Self {
            kind: StatusKind::Idle,
            text: String::new(),
            at: None,
        }
    }

    pub fn busy(text: impl Into<String>) -> Self {
        Self::stamped(StatusKind::Busy, text.into())
    }

    pub fn saved(path: &Path) -> Self {
        Self::stamped(
            StatusKind::Success,
            format!("Success: PDF saved to {}", path.display()),
        )
    }

    pub fn failed(error: &ExportError) -> Self {
        let kind = if error.is_cancellation() {
            StatusKind::Cancelled
        } else {
            StatusKind::Error
        };
        Self::stamped(kind, error.status_text())
    }

    fn stamped(kind: StatusKind, text: String) -> Self {
        Self {
            kind,
            text,
            at: Some(Local::now()),
        }
    }

    /// Text with a `[HH:MM:SS]` prefix once an action has happened.
    pub fn display_text(&self) -> String {
        match self.at {
            Some(at) => format!("[{}] {}", at.format("%H:%M:%S"), self.text),
            None => self.text.clone(),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::idle()
    }
}
