/*!
 * Common test utilities for the gameloc test suite
 */

use anyhow::Result;
use parking_lot::Mutex;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use gameloc::documents::{Locator, ResultSink};
use gameloc::errors::DocumentError;
use gameloc::translation::{ProgressCallback, TranslationTask};

// Re-export the mock providers module
pub mod mock_providers;

/// Route library logs through the test harness, once per process
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Writes a JSON document into `dir`
pub fn create_json_file(dir: &Path, filename: &str, content: &Value) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, serde_json::to_string_pretty(content)?)?;
    Ok(file_path)
}

/// Reads a JSON document back
pub fn read_json(path: &Path) -> Result<Value> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

/// Task for `key` in a fake document, with markup protected
pub fn task(key: &str, raw_text: &str) -> TranslationTask {
    TranslationTask::from_raw("memory.json", Locator::default().key(key), raw_text)
}

/// Progress callback that records every report
pub fn progress_recorder() -> (ProgressCallback, Arc<Mutex<Vec<(usize, usize)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback: ProgressCallback = Arc::new(move |completed, total| sink.lock().push((completed, total)));
    (callback, seen)
}

/// Result sink that keeps write-backs in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    applied: Mutex<Vec<(String, String)>>,
    flushes: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// `(locator, text)` pairs in application order
    pub fn applied(&self) -> Vec<(String, String)> {
        self.applied.lock().clone()
    }

    /// Text written for `key`, if any
    pub fn text_for(&self, key: &str) -> Option<String> {
        self.applied
            .lock()
            .iter()
            .find(|(locator, _)| locator == key)
            .map(|(_, text)| text.clone())
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl ResultSink for RecordingSink {
    fn apply(&self, task: &TranslationTask, translated: &str) -> Result<(), DocumentError> {
        self.applied
            .lock()
            .push((task.locator.to_string(), translated.to_string()));
        Ok(())
    }

    fn flush(&self) -> Result<(), DocumentError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
