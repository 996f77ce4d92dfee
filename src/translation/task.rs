/*!
 * Translation tasks and the collector that gathers them.
 *
 * A task is an immutable descriptor: which document, which value inside it,
 * the tag-protected text, and the tags to put back. Writing the result is left
 * to whatever `ResultSink` the orchestrator is given.
 */

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::documents::Locator;

use super::tags::{TagMap, TagProtector};

/// Progress observer, `(completed, total)`
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// One string to translate and where its result goes
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationTask {
    /// Document the text came from
    pub source_file: PathBuf,
    /// Position of the text inside the document
    pub locator: Locator,
    /// Tag-protected canonical text
    pub original_text: String,
    /// Placeholder id -> markup for this particular occurrence
    pub tag_map: TagMap,
}

impl TranslationTask {
    /// Build a task from raw document text, protecting its markup
    pub fn from_raw(source_file: impl Into<PathBuf>, locator: Locator, raw_text: &str) -> Self {
        let (original_text, tag_map) = TagProtector::protect(raw_text);
        Self {
            source_file: source_file.into(),
            locator,
            original_text,
            tag_map,
        }
    }

    /// Put this task's markup back into a translated template
    pub fn restore(&self, translated_template: &str) -> String {
        TagProtector::restore(translated_template, &self.tag_map)
    }
}

/// Thread-safe collector of pending tasks
pub struct TaskQueue {
    tasks: Mutex<Vec<TranslationTask>>,
    total: AtomicUsize,
    progress: Option<ProgressCallback>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            total: AtomicUsize::new(0),
            progress: None,
        }
    }

    /// Report each enqueue to `progress` as `(0, total)`
    pub fn with_progress(progress: ProgressCallback) -> Self {
        Self {
            progress: Some(progress),
            ..Self::new()
        }
    }

    /// Append a task and grow the reported total
    pub fn enqueue(&self, task: TranslationTask) {
        self.tasks.lock().push(task);
        let total = self.total.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(progress) = &self.progress {
            progress(0, total);
        }
    }

    /// Drain every pending task, in enqueue order
    pub fn take_all(&self) -> Vec<TranslationTask> {
        std::mem::take(&mut *self.tasks.lock())
    }

    /// Pending tasks
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }

    /// Tasks ever enqueued
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}
