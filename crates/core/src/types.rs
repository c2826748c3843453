//! Domain types for presentations, batch requests and batch reports.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default name of the folder receiving extracted pictures.
pub const DEFAULT_IMAGES_DIR: &str = "extracted_images";

/// Default name of the folder receiving cleaned or copied presentations.
pub const DEFAULT_CLEANED_DIR: &str = "no_image_pptx";

/// Binary image data together with its declared content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageContent {
    /// Raw bytes of the embedded image part.
    pub bytes: Vec<u8>,

    /// MIME-like content type, e.g. `image/png`.
    pub content_type: String,
}

impl ImageContent {
    /// Create image content from bytes and a content type.
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
        }
    }

    /// File extension derived from the subtype of the content type.
    ///
    /// `image/jpeg` gives `jpeg`, `image/x-emf` gives `x-emf`. A content type
    /// without a `/` is used as a whole.
    pub fn extension(&self) -> &str {
        self.content_type
            .rsplit('/')
            .next()
            .unwrap_or(&self.content_type)
    }
}

/// A picture shape with embedded image data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureShape {
    /// Shape name as authored, if any.
    pub name: Option<String>,

    /// The embedded image.
    pub image: ImageContent,
}

/// Any non-picture slide element. Inert for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherShape {
    /// Element kind, e.g. `sp`, `graphicFrame`, or `pic` for linked pictures.
    pub kind: String,
}

/// A top-level slide element, classified once when the slide is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// An embedded picture.
    Picture(PictureShape),
    /// Anything else.
    Other(OtherShape),
}

impl Shape {
    /// Returns the picture if this shape is one.
    pub fn as_picture(&self) -> Option<&PictureShape> {
        match self {
            Shape::Picture(picture) => Some(picture),
            Shape::Other(_) => None,
        }
    }

    /// Whether this shape is an embedded picture.
    pub fn is_picture(&self) -> bool {
        matches!(self, Shape::Picture(_))
    }
}

/// A single slide with its shapes in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slide {
    /// 1-based slide number in presentation order.
    pub number: usize,

    /// Top-level shapes in document order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create an empty slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
        }
    }

    /// Append a shape.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Number of picture shapes on this slide.
    pub fn picture_count(&self) -> usize {
        self.shapes.iter().filter(|s| s.is_picture()).count()
    }
}

/// What to do when a single file cannot be opened or saved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Record the failure and move on to the next file.
    #[default]
    Continue,
    /// Stop the batch and return the error.
    Abort,
}

/// Paths and options for one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Directory scanned for presentations (non-recursive).
    pub source_dir: PathBuf,

    /// Root of the per-file picture folders.
    pub images_dir: PathBuf,

    /// Folder receiving stripped or unchanged copies.
    pub cleaned_dir: PathBuf,

    /// Handling of per-file open/save failures.
    pub error_policy: ErrorPolicy,
}

impl BatchRequest {
    /// Create a request with explicit output directories.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        images_dir: impl Into<PathBuf>,
        cleaned_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            images_dir: images_dir.into(),
            cleaned_dir: cleaned_dir.into(),
            error_policy: ErrorPolicy::default(),
        }
    }

    /// Create a request whose output directories live inside the input directory
    /// under their default names.
    pub fn for_input_dir(source_dir: impl AsRef<Path>) -> Self {
        let source_dir = source_dir.as_ref();
        Self::new(
            source_dir,
            source_dir.join(DEFAULT_IMAGES_DIR),
            source_dir.join(DEFAULT_CLEANED_DIR),
        )
    }

    /// Set the per-file error policy.
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }
}

/// Final state of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Pictures were extracted and a picture-free copy was saved.
    Stripped {
        /// Number of image files written.
        images: usize,
    },
    /// No picture could be written; the original was copied verbatim.
    CopiedUnchanged,
    /// The file could not be opened or saved.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

/// Result of processing one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// File name of the source presentation.
    pub filename: String,

    /// Final state of the file.
    #[serde(flatten)]
    pub outcome: FileOutcome,

    /// Image files successfully written.
    pub images: Vec<PathBuf>,

    /// Number of picture writes that failed.
    pub failed_writes: usize,
}

impl FileReport {
    /// Report for a file that could not be processed.
    pub fn failed(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            outcome: FileOutcome::Failed {
                reason: reason.into(),
            },
            images: Vec::new(),
            failed_writes: 0,
        }
    }

    /// Whether the file ended in the failed state.
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every discovered file was visited.
    Completed,
    /// Discovery found nothing to process.
    NoFilesFound,
}

/// Summary of a whole batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// How the batch ended.
    pub status: BatchStatus,

    /// Per-file results in processing order.
    pub files: Vec<FileReport>,
}

impl BatchReport {
    /// Report for a batch that found no files.
    pub fn no_files() -> Self {
        Self {
            status: BatchStatus::NoFilesFound,
            files: Vec::new(),
        }
    }

    /// Report for a batch that visited every file.
    pub fn completed(files: Vec<FileReport>) -> Self {
        Self {
            status: BatchStatus::Completed,
            files,
        }
    }

    /// Files that ended in the failed state.
    pub fn failed_files(&self) -> Vec<&FileReport> {
        self.files.iter().filter(|f| f.is_failed()).collect()
    }

    /// Total number of image files written across the batch.
    pub fn total_images(&self) -> usize {
        self.files.iter().map(|f| f.images.len()).sum()
    }

    /// Number of files saved as stripped copies.
    pub fn stripped_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Stripped { .. }))
            .count()
    }

    /// Number of files copied unchanged.
    pub fn copied_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.outcome == FileOutcome::CopiedUnchanged)
            .count()
    }
}
