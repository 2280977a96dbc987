//! A small desktop front-end for the native Typst compiler: edit markup,
//! press "Compile to PDF", pick where the PDF goes.

pub mod app;
pub mod export;
pub mod ffi;
pub mod settings;
pub mod status;
pub mod ui;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
