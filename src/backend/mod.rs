//! Document format adapters.

pub mod docx;
pub mod pdf;

pub use docx::{DocxDocument, DocxOutcome};
pub use pdf::MupdfDocument;
