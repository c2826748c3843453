//! Batch extraction over a folder of presentations.
//!
//! Every discovered file ends in exactly one of two states: its pictures were
//! written to `<images>/<stem>/` and a picture-free copy was saved to the
//! cleaned folder, or it had no pictures and was copied there unchanged
//! (leaving no image folder behind).

use crate::document::{DocumentLoader, PresentationDocument};
use crate::sanitize::sanitize_stem;
use crate::{BatchReport, BatchRequest, Error, ErrorPolicy, FileOutcome, FileReport, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Progress notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// Discovery finished with at least one file.
    FilesDiscovered { count: usize },
    /// Discovery found nothing; the batch ends here.
    NoFilesFound,
    /// One picture could not be written and was skipped.
    ImageWriteFailed { path: PathBuf, error: String },
    /// A file reached its final state.
    FileProcessed(FileReport),
    /// A file could not be opened or saved.
    FileFailed { path: PathBuf, error: String },
}

/// Make sure both output directories exist and that the cleaned one is not
/// the source directory.
pub fn prepare_directories(request: &BatchRequest) -> Result<()> {
    if !request.source_dir.is_dir() {
        return Err(Error::NotADirectory(request.source_dir.clone()));
    }

    fs::create_dir_all(&request.images_dir)?;
    fs::create_dir_all(&request.cleaned_dir)?;

    if fs::canonicalize(&request.cleaned_dir)? == fs::canonicalize(&request.source_dir)? {
        return Err(Error::CleanedDirIsSource(request.cleaned_dir.clone()));
    }

    log::debug!(
        "Output directories ready: {} and {}",
        request.images_dir.display(),
        request.cleaned_dir.display()
    );
    Ok(())
}

/// List the regular files directly inside `source_dir` whose name ends with
/// `.{extension}` (case-sensitive), sorted by name.
pub fn discover_files(source_dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let suffix = format!(".{}", extension);
    let mut files = Vec::new();

    for entry in fs::read_dir(source_dir)? {
        let entry = entry?;
        if !entry.file_name().to_string_lossy().ends_with(&suffix) {
            continue;
        }

        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Extract the pictures of one file and write its cleaned counterpart.
///
/// Pictures go to `<images>/<folder>/`; [`run_batch`] picks `folder` with
/// [`claim_folder_name`] so no two files of a batch share one. Open and save
/// failures are returned; a failed picture write is reported through
/// `on_event` and only reduces the written count.
pub fn process_file<L: DocumentLoader>(
    loader: &L,
    request: &BatchRequest,
    path: &Path,
    folder: &str,
    on_event: &mut dyn FnMut(BatchEvent),
) -> Result<FileReport> {
    let filename = path
        .file_name()
        .ok_or_else(|| Error::InvalidDocument(format!("No file name in {}", path.display())))?;

    let mut document = loader.open(path)?;
    log::debug!(
        "Opened {} ({} slides, {} pictures)",
        path.display(),
        document.slides().len(),
        document.picture_count()
    );

    let image_folder = request.images_dir.join(folder);
    fs::create_dir_all(&image_folder)?;

    let mut written = Vec::new();
    let mut failed_writes = 0;

    for (slide_index, slide) in document.slides().iter().enumerate() {
        for (shape_index, shape) in slide.shapes.iter().enumerate() {
            let Some(picture) = shape.as_picture() else {
                continue;
            };

            let image_path = image_folder.join(image_filename(
                slide_index + 1,
                shape_index + 1,
                picture.image.extension(),
            ));

            match fs::write(&image_path, &picture.image.bytes) {
                Ok(()) => written.push(image_path),
                Err(e) => {
                    log::warn!("Failed to save image {}: {}", image_path.display(), e);
                    failed_writes += 1;
                    on_event(BatchEvent::ImageWriteFailed {
                        path: image_path,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    let cleaned_path = request.cleaned_dir.join(filename);
    let outcome = if written.is_empty() {
        drop(document);
        // Before the copy, so a failed copy leaves no empty folder behind.
        remove_empty_folder(&image_folder);
        fs::copy(path, &cleaned_path)?;
        FileOutcome::CopiedUnchanged
    } else {
        let removed = document.remove_pictures()?;
        log::debug!("Removed {} picture shapes from {}", removed, path.display());
        document.save(&cleaned_path)?;
        FileOutcome::Stripped {
            images: written.len(),
        }
    };

    Ok(FileReport {
        filename: filename.to_string_lossy().into_owned(),
        outcome,
        images: written,
        failed_writes,
    })
}

/// Pick the image folder name for `path` and record it in `claimed`.
///
/// The name is the sanitized stem. Stems that sanitize to a name already
/// claimed in this batch get the first free `_2`, `_3`, ... suffix, e.g.
/// `a.b.pptx` and `a_b.pptx` map to `a_b` and `a_b_2`.
pub fn claim_folder_name(path: &Path, claimed: &mut HashSet<String>) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = sanitize_stem(&stem);

    let mut name = base.clone();
    let mut counter = 2;
    while claimed.contains(&name) {
        name = format!("{}_{}", base, counter);
        counter += 1;
    }

    if name != base {
        log::warn!(
            "Image folder '{}' is already used in this batch, {} writes to '{}'",
            base,
            path.display(),
            name
        );
    }
    claimed.insert(name.clone());
    name
}

/// Remove `folder` if it is empty. Content left there by earlier runs is
/// never deleted.
fn remove_empty_folder(folder: &Path) {
    if let Err(e) = fs::remove_dir(folder) {
        log::warn!("Kept image folder {}: {}", folder.display(), e);
    }
}

/// Run a whole batch: prepare the output folders, discover the input files,
/// then process them one at a time.
///
/// A per-file failure is recorded and skipped under [`ErrorPolicy::Continue`]
/// and ends the batch with that error under [`ErrorPolicy::Abort`].
pub fn run_batch<L, F>(loader: &L, request: &BatchRequest, mut on_event: F) -> Result<BatchReport>
where
    L: DocumentLoader,
    F: FnMut(BatchEvent),
{
    prepare_directories(request)?;

    let files = discover_files(&request.source_dir, loader.extension())?;
    if files.is_empty() {
        log::warn!(
            "No .{} files found in {}",
            loader.extension(),
            request.source_dir.display()
        );
        on_event(BatchEvent::NoFilesFound);
        return Ok(BatchReport::no_files());
    }

    log::info!(
        "Found {} .{} files in {}",
        files.len(),
        loader.extension(),
        request.source_dir.display()
    );
    on_event(BatchEvent::FilesDiscovered { count: files.len() });

    let mut reports = Vec::with_capacity(files.len());
    let mut claimed = HashSet::new();
    for path in &files {
        let folder = claim_folder_name(path, &mut claimed);
        match process_file(loader, request, path, &folder, &mut on_event) {
            Ok(report) => {
                match &report.outcome {
                    FileOutcome::Stripped { images } => {
                        log::info!("{}: extracted {} images, saved stripped copy", report.filename, images)
                    }
                    _ => log::info!("{}: no images, copied unchanged", report.filename),
                }
                on_event(BatchEvent::FileProcessed(report.clone()));
                reports.push(report);
            }
            Err(e) if request.error_policy == ErrorPolicy::Abort => return Err(e),
            Err(e) => {
                log::error!("Failed to process {}: {}", path.display(), e);
                on_event(BatchEvent::FileFailed {
                    path: path.clone(),
                    error: e.to_string(),
                });
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                reports.push(FileReport::failed(filename, e.to_string()));
            }
        }
    }

    let report = BatchReport::completed(reports);
    log::info!(
        "Batch complete: {} stripped, {} copied, {} failed",
        report.stripped_count(),
        report.copied_count(),
        report.failed_files().len()
    );
    Ok(report)
}

/// Name of an extracted picture, e.g. `slide2_img5.png`.
fn image_filename(slide: usize, shape: usize, extension: &str) -> String {
    format!("slide{}_img{}.{}", slide, shape, extension)
}
