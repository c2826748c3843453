//! Core domain types and the batch extractor that pulls embedded pictures out
//! of a folder of presentations.

pub mod batch;
pub mod document;
pub mod error;
pub mod sanitize;
pub mod types;
pub mod worker;

pub use batch::{
    claim_folder_name, discover_files, prepare_directories, process_file, run_batch, BatchEvent,
};
pub use document::{DocumentLoader, PresentationDocument};
pub use error::{Error, Result};
pub use sanitize::sanitize_stem;
pub use types::{
    BatchReport, BatchRequest, BatchStatus, ErrorPolicy, FileOutcome, FileReport, ImageContent,
    OtherShape, PictureShape, Shape, Slide,
};
pub use worker::{submit, BatchHandle};
