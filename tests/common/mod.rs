//! Common test utilities and helpers.
//!
//! This module provides shared functionality for all tests, including:
//! - DOCX and PDF fixture builders
//! - Custom assertions
//! - The MuPDF serialization lock

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

use std::sync::Mutex;

// MuPDF has thread-safety issues with font loading, so only one test may
// use it at a time.
pub static MUPDF_LOCK: Mutex<()> = Mutex::new(());

/// Runs `$body` while holding the global MuPDF lock.
#[macro_export]
macro_rules! with_mupdf_lock {
    ($body:expr) => {{
        let _guard = $crate::common::MUPDF_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        $body
    }};
}
