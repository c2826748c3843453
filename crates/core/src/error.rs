//! Error types for batch picture extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading presentations or running a batch.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file or directory.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// A part referenced by the package is not present in it.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// The package is readable but does not look like a presentation.
    #[error("Invalid presentation: {0}")]
    InvalidDocument(String),

    /// The source path of a batch is not a directory.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The cleaned folder resolves to the source folder, where copies would
    /// overwrite the originals.
    #[error("Cleaned folder is the input folder: {}", .0.display())]
    CleanedDirIsSource(PathBuf),

    /// The background batch thread panicked before producing a report.
    #[error("Batch worker panicked")]
    WorkerPanicked,
}
