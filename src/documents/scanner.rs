/*!
 * Extraction of translatable strings from game data documents.
 */

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::app_config::ScanConfig;
use crate::errors::DocumentError;
use crate::file_utils::FileManager;
use crate::translation::{TaskQueue, TranslationTask};

use super::LocatorPattern;
use super::store::read_document;

/// Outcome of scanning an input path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Documents scanned
    pub files: usize,
    /// Tasks enqueued
    pub tasks: usize,
    /// Documents that could not be read or parsed
    pub skipped_files: Vec<PathBuf>,
}

/// Turns configured document fields into translation tasks
#[derive(Debug, Clone)]
pub struct ContentScanner {
    patterns: Vec<LocatorPattern>,
    skip_values: Vec<String>,
}

impl ContentScanner {
    pub fn new(patterns: Vec<LocatorPattern>, skip_values: Vec<String>) -> Self {
        Self { patterns, skip_values }
    }

    /// Parse the field patterns from configuration
    pub fn from_config(config: &ScanConfig) -> Result<Self, DocumentError> {
        let patterns = config
            .fields
            .iter()
            .map(|field| field.parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(patterns, config.skip_values.clone()))
    }

    fn is_translatable(&self, text: &str) -> bool {
        let trimmed = text.trim();
        !trimmed.is_empty() && !self.skip_values.iter().any(|skip| skip == trimmed)
    }

    /// Tasks for every matching string in one parsed document
    ///
    /// Patterns are applied in configuration order; a value reached by more
    /// than one pattern yields a single task.
    pub fn scan_document(&self, source_file: &Path, root: &Value) -> Vec<TranslationTask> {
        let mut seen = HashSet::new();
        let mut tasks = Vec::new();

        for pattern in &self.patterns {
            for (locator, text) in pattern.matches(root) {
                if !self.is_translatable(text) || !seen.insert(locator.clone()) {
                    continue;
                }
                tasks.push(TranslationTask::from_raw(source_file, locator, text));
            }
        }

        debug!("{}: {} translatable value(s)", source_file.display(), tasks.len());
        tasks
    }

    /// Scan one document into `queue`
    pub fn scan_file(&self, path: &Path, queue: &TaskQueue) -> Result<usize, DocumentError> {
        let root = read_document(path)?;
        let tasks = self.scan_document(path, &root);
        let count = tasks.len();
        for task in tasks {
            queue.enqueue(task);
        }
        Ok(count)
    }

    /// Scan a file, or every `*.json` file below a directory, into `queue`
    ///
    /// Unreadable documents are reported and skipped.
    pub fn scan_path(&self, input: &Path, queue: &TaskQueue) -> Result<ScanReport> {
        let files = FileManager::collect_inputs(input, "json")
            .with_context(|| format!("Failed to list documents under {}", input.display()))?;

        let mut report = ScanReport::default();
        for file in files {
            match self.scan_file(&file, queue) {
                Ok(count) => {
                    report.files += 1;
                    report.tasks += count;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", file.display(), e);
                    report.skipped_files.push(file);
                }
            }
        }

        info!(
            "Scanned {} document(s), {} text(s) to translate",
            report.files, report.tasks
        );
        Ok(report)
    }
}
