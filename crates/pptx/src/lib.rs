//! PPTX (Office Open XML) backend for picture extraction.
//!
//! Parses .pptx files, which are ZIP archives of XML parts, into slides of
//! classified shapes, and writes back copies with the pictures removed.

pub mod document;
pub mod package;
pub mod parser;
mod rewrite;

pub use document::PptxDocument;
pub use parser::PptxParser;
