//! Contract between the batch extractor and a presentation format backend.

use crate::{Result, Slide};
use std::path::Path;

/// An opened presentation held in memory.
pub trait PresentationDocument {
    /// Slides in presentation order.
    fn slides(&self) -> &[Slide];

    /// Remove every picture shape from every slide.
    ///
    /// Other shapes and the slide order are left as they are. Returns the
    /// number of shapes removed.
    fn remove_pictures(&mut self) -> Result<usize>;

    /// Serialize the document to `path`, replacing any existing file.
    fn save(&self, path: &Path) -> Result<()>;

    /// Total number of picture shapes across all slides.
    fn picture_count(&self) -> usize {
        self.slides().iter().map(Slide::picture_count).sum()
    }
}

/// Opens presentation files of one format.
pub trait DocumentLoader {
    /// Document type produced by this loader.
    type Document: PresentationDocument;

    /// File extension handled by this loader, without the dot.
    fn extension(&self) -> &str;

    /// Open and parse the file at `path`.
    fn open(&self, path: &Path) -> Result<Self::Document>;
}
