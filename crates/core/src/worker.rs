//! Running a batch off the caller's thread.
//!
//! An interactive caller submits the batch, keeps its own loop responsive,
//! and drains progress events from the returned handle.

use crate::batch::{run_batch, BatchEvent};
use crate::document::DocumentLoader;
use crate::{BatchReport, BatchRequest, Error, Result};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};

/// Handle to a batch running on a background thread.
pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    thread: JoinHandle<Result<BatchReport>>,
}

impl BatchHandle {
    /// Blocking iterator over progress events. Ends once the batch returns.
    pub fn events(&self) -> mpsc::Iter<'_, BatchEvent> {
        self.events.iter()
    }

    /// Events available right now, without blocking.
    pub fn try_events(&self) -> mpsc::TryIter<'_, BatchEvent> {
        self.events.try_iter()
    }

    /// Whether the batch thread has returned.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the batch and return its report.
    pub fn join(self) -> Result<BatchReport> {
        self.thread.join().map_err(|_| Error::WorkerPanicked)?
    }
}

/// Start `run_batch` on a dedicated thread.
///
/// Files are still processed one at a time; the thread only keeps the caller
/// free. There is no cancellation.
pub fn submit<L>(loader: L, request: BatchRequest) -> Result<BatchHandle>
where
    L: DocumentLoader + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    let thread = thread::Builder::new()
        .name("slidepics-batch".to_string())
        .spawn(move || {
            log::debug!("Batch worker started for {}", request.source_dir.display());
            run_batch(&loader, &request, |event| {
                // The caller may have dropped the receiver; the batch still finishes.
                let _ = tx.send(event);
            })
        })?;

    Ok(BatchHandle { events: rx, thread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::tests::{input_dir, FakeDocument, FakeLoader};
    use crate::{BatchStatus, FileOutcome};
    use std::path::Path;

    struct PanickingLoader;

    impl DocumentLoader for PanickingLoader {
        type Document = FakeDocument;

        fn extension(&self) -> &str {
            "pptx"
        }

        fn open(&self, _path: &Path) -> Result<FakeDocument> {
            panic!("loader exploded");
        }
    }

    #[test]
    fn test_submit_forwards_events() {
        let dir = input_dir(&[("a.pptx", "png"), ("b.pptx", "text")]);
        let request = BatchRequest::for_input_dir(dir.path());

        let handle = submit(FakeLoader, request).unwrap();
        let events: Vec<_> = handle.events().collect();
        let report = handle.join().unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], BatchEvent::FilesDiscovered { count: 2 });
        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!(report.files[0].outcome, FileOutcome::Stripped { images: 1 });
        assert_eq!(report.files[1].outcome, FileOutcome::CopiedUnchanged);
    }

    #[test]
    fn test_submit_no_files() {
        let dir = input_dir(&[]);
        let handle = submit(FakeLoader, BatchRequest::for_input_dir(dir.path())).unwrap();

        let report = handle.join().unwrap();
        assert_eq!(report.status, BatchStatus::NoFilesFound);
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let dir = input_dir(&[("a.pptx", "png")]);
        let handle = submit(PanickingLoader, BatchRequest::for_input_dir(dir.path())).unwrap();

        assert!(matches!(handle.join(), Err(Error::WorkerPanicked)));
    }
}
