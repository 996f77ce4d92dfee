use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::app_config::Config;
use crate::documents::scanner::ScanReport;
use crate::documents::{ContentScanner, DocumentStore, ResultSink};
use crate::errors::TranslationError;
use crate::translation::{
    BatchOrchestrator, ProgressCallback, ProviderScheduler, RetryPolicy, RunSummary, TaskQueue,
    TranslationCache, TranslationTask,
};

// @module: Application controller for game text localization

/// Main application controller for document translation
#[derive(Clone)]
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Collect the tasks for every document under `input`
    pub fn scan(&self, input: &Path) -> Result<(Vec<TranslationTask>, ScanReport)> {
        let scanner = ContentScanner::from_config(&self.config.scan)
            .context("Invalid scan field pattern")?;
        let queue = TaskQueue::new();
        let report = scanner.scan_path(input, &queue)?;
        for skipped in &report.skipped_files {
            warn!("Skipped unreadable document {}", skipped.display());
        }
        Ok((queue.take_all(), report))
    }

    /// Scan `input` and translate it with the configured providers
    pub async fn run(&self, input: &Path, dry_run: bool) -> Result<RunSummary> {
        let scheduler = ProviderScheduler::from_config(&self.config)
            .context("Failed to set up translation providers")?;
        self.run_with_scheduler(input, Arc::new(scheduler), dry_run).await
    }

    /// Same as `run` with an explicit provider registry
    pub async fn run_with_scheduler(
        &self,
        input: &Path,
        scheduler: Arc<ProviderScheduler>,
        dry_run: bool,
    ) -> Result<RunSummary> {
        let start_time = std::time::Instant::now();
        let cache_path = self.config.effective_cache_path();

        // Scanning and cache loading read from disk; keep them off the async threads
        let this = self.clone();
        let input = input.to_path_buf();
        let load_path = cache_path.clone();
        let (tasks, report, cache) = tokio::task::spawn_blocking(move || -> Result<_> {
            let (tasks, report) = this.scan(&input)?;
            let cache = TranslationCache::load(&load_path)
                .with_context(|| format!("Failed to load translation cache {}", load_path.display()))?;
            Ok((tasks, report, cache))
        })
        .await
        .context("Document scan stopped unexpectedly")??;
        let cache = Arc::new(cache);

        if dry_run {
            return Ok(Self::dry_run_summary(&tasks, &report, &cache));
        }
        if scheduler.is_empty() {
            warn!("No translation provider is enabled, only cached texts can be applied");
        }

        let sink: Arc<dyn ResultSink> = Arc::new(DocumentStore::new());
        let orchestrator = BatchOrchestrator::new(cache.clone(), scheduler, sink)
            .with_cache_path(&cache_path)
            .with_retry_policy(RetryPolicy::new(std::time::Duration::from_millis(
                self.config.translation.common.retry_backoff_ms,
            )));

        let progress_bar = ProgressBar::new(tasks.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} texts ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Translating");

        let pb = progress_bar.clone();
        let progress: ProgressCallback = Arc::new(move |completed, total| {
            pb.set_length(total as u64);
            pb.set_position(completed as u64);
        });

        info!(
            "Translating {} text(s) from {} to {}",
            tasks.len(),
            self.config.source_language,
            self.config.target_language
        );
        let result = orchestrator
            .run(tasks, self.config.translation.common.batch_size, Some(progress))
            .await;
        progress_bar.finish_and_clear();
        let summary = result?;

        let (hits, misses, rate) = cache.stats();
        debug!("Cache: {} hit(s), {} miss(es), {:.1}% hit rate", hits, misses, rate * 100.0);

        for failure in &summary.failures {
            error!(
                "Batch {} not translated ({} attempt(s){}): {}",
                failure.batch_index + 1,
                failure.attempts,
                failure
                    .provider
                    .map(|p| format!(", last on {}", p.display_name()))
                    .unwrap_or_default(),
                failure.reason
            );
        }

        info!(
            "Done in {}: {} succeeded, {} failed, {} aborted batch(es)",
            Self::format_duration(start_time.elapsed()),
            summary.succeeded,
            summary.failures.len(),
            summary.aborted.len()
        );

        if !summary.aborted.is_empty() {
            return Err(anyhow::Error::new(TranslationError::NoProviderEnabled)
                .context(format!("{} batch(es) could not be translated", summary.aborted.len())));
        }
        Ok(summary)
    }

    fn dry_run_summary(tasks: &[TranslationTask], report: &ScanReport, cache: &TranslationCache) -> RunSummary {
        let distinct: HashSet<&str> = tasks.iter().map(|t| t.original_text.as_str()).collect();
        let cache_hit_tasks = tasks
            .iter()
            .filter(|t| cache.get(&t.original_text).is_some())
            .count();
        info!(
            "Dry run: {} document(s), {} text(s), {} distinct, {} already cached",
            report.files,
            tasks.len(),
            distinct.len(),
            cache_hit_tasks
        );
        RunSummary {
            total_tasks: tasks.len(),
            cache_hit_tasks,
            ..RunSummary::default()
        }
    }

    // Format duration in a human-readable format (HH:MM:SS)
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
