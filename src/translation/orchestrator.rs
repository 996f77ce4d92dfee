/*!
 * Batch translation orchestration.
 *
 * This module turns a list of translation tasks into concurrent provider
 * calls: identical texts are translated once, cached texts skip the network,
 * the rest is split into batches that each run as their own tokio task with
 * a bounded retry loop. Results are written through a `ResultSink`; the cache
 * and the sink are flushed once after every batch has resolved.
 */

use futures::FutureExt;
use futures::future::join_all;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::ProviderKind;
use crate::documents::ResultSink;
use crate::errors::TranslationError;
use crate::providers::ensure_count;

use super::cache::TranslationCache;
use super::scheduler::ProviderScheduler;
use super::task::{ProgressCallback, TranslationTask};

/// Attempts per batch before it is abandoned
pub const MAX_ATTEMPTS: u32 = 3;

/// Default base delay between attempts
pub const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(1000);

/// Exponential backoff between attempts of one batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(base_backoff: Duration) -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_backoff,
        }
    }

    /// Delay after failed attempt `attempt` (1-based), `None` once attempts are used up
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_attempts {
            return None;
        }
        Some(self.base_backoff * 2u32.pow(attempt - 1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_BACKOFF)
    }
}

/// A batch that used up its attempts
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    /// Zero-based batch number
    pub batch_index: usize,
    /// Provider used by the last attempt
    pub provider: Option<ProviderKind>,
    /// Attempts made
    pub attempts: u32,
    /// Last error
    pub reason: String,
}

/// What happened during a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Tasks handed to the run
    pub total_tasks: usize,
    /// Tasks answered from the cache
    pub cache_hit_tasks: usize,
    /// Batches sent to providers
    pub batches: usize,
    /// Batches translated successfully
    pub succeeded: usize,
    /// Batches abandoned after their last attempt
    pub failures: Vec<BatchFailure>,
    /// Batches abandoned because no provider was enabled
    pub aborted: Vec<usize>,
}

impl RunSummary {
    /// Every batch succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_empty()
    }
}

/// Tasks that share one canonical text
#[derive(Debug)]
struct TextGroup {
    text: String,
    tasks: Vec<TranslationTask>,
}

/// Terminal state of one batch
#[derive(Debug)]
enum BatchOutcome {
    Succeeded,
    Exhausted(BatchFailure),
    Aborted,
}

/// Serialized progress reporting
struct ProgressTracker {
    completed: Mutex<usize>,
    total: usize,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    fn new(total: usize, callback: Option<ProgressCallback>) -> Self {
        Self {
            completed: Mutex::new(0),
            total,
            callback,
        }
    }

    fn start(&self) {
        if let Some(callback) = &self.callback {
            callback(0, self.total);
        }
    }

    fn advance(&self, count: usize) {
        let mut completed = self.completed.lock();
        *completed = (*completed + count).min(self.total);
        if let Some(callback) = &self.callback {
            callback(*completed, self.total);
        }
    }
}

/// Group tasks by canonical text, keeping first-seen order
fn group_by_text(tasks: Vec<TranslationTask>) -> Vec<TextGroup> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<TextGroup> = Vec::new();

    for task in tasks {
        match positions.get(&task.original_text) {
            Some(&pos) => groups[pos].tasks.push(task),
            None => {
                positions.insert(task.original_text.clone(), groups.len());
                groups.push(TextGroup {
                    text: task.original_text.clone(),
                    tasks: vec![task],
                });
            }
        }
    }

    groups
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs translation tasks against the scheduled providers
#[derive(Clone)]
pub struct BatchOrchestrator {
    cache: Arc<TranslationCache>,
    cache_path: Option<PathBuf>,
    scheduler: Arc<ProviderScheduler>,
    sink: Arc<dyn ResultSink>,
    retry: RetryPolicy,
}

impl BatchOrchestrator {
    /// Create an orchestrator; the cache is kept in memory only until
    /// `with_cache_path` is set
    pub fn new(
        cache: Arc<TranslationCache>,
        scheduler: Arc<ProviderScheduler>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            cache,
            cache_path: None,
            scheduler,
            sink,
            retry: RetryPolicy::default(),
        }
    }

    /// Flush the cache to `path` at the end of each run
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Translate `tasks` in batches of at most `batch_size` distinct texts
    ///
    /// Provider failures never surface as an error; they are reported in the
    /// summary. Only the terminal cache or document flush can fail the run.
    pub async fn run(
        &self,
        tasks: Vec<TranslationTask>,
        batch_size: usize,
        progress: Option<ProgressCallback>,
    ) -> Result<RunSummary, TranslationError> {
        let mut summary = RunSummary {
            total_tasks: tasks.len(),
            ..RunSummary::default()
        };
        if tasks.is_empty() {
            debug!("Nothing to translate");
            return Ok(summary);
        }

        let tracker = Arc::new(ProgressTracker::new(tasks.len(), progress));
        tracker.start();

        let mut pending = Vec::new();
        let mut cached = Vec::new();
        for group in group_by_text(tasks) {
            match self.cache.get(&group.text) {
                Some(template) => {
                    summary.cache_hit_tasks += group.tasks.len();
                    cached.extend(group.tasks.into_iter().map(|task| (task, template.clone())));
                }
                None => pending.push(group),
            }
        }
        if !cached.is_empty() {
            self.write_back(cached).await;
            tracker.advance(summary.cache_hit_tasks);
        }

        if pending.is_empty() {
            info!("All {} text(s) served from the translation cache", summary.total_tasks);
        } else {
            self.run_batches(pending, batch_size.max(1), &tracker, &mut summary).await;
        }

        self.finish().await?;

        info!(
            "Translation finished: {} task(s), {} from cache, {}/{} batch(es) succeeded, {} failed, {} aborted",
            summary.total_tasks,
            summary.cache_hit_tasks,
            summary.succeeded,
            summary.batches,
            summary.failures.len(),
            summary.aborted.len()
        );
        Ok(summary)
    }

    async fn run_batches(
        &self,
        pending: Vec<TextGroup>,
        batch_size: usize,
        tracker: &Arc<ProgressTracker>,
        summary: &mut RunSummary,
    ) {
        let mut batches: Vec<Vec<TextGroup>> = Vec::new();
        let mut groups = pending.into_iter().peekable();
        while groups.peek().is_some() {
            batches.push(groups.by_ref().take(batch_size).collect());
        }
        summary.batches = batches.len();
        info!("Translating {} batch(es) of up to {} text(s)", batches.len(), batch_size);

        let task_counts: Vec<usize> = batches
            .iter()
            .map(|batch| batch.iter().map(|g| g.tasks.len()).sum())
            .collect();

        let handles = batches.into_iter().enumerate().map(|(index, batch)| {
            let this = self.clone();
            let tracker = tracker.clone();
            tokio::spawn(async move { this.run_batch(index, batch, &tracker).await })
        });

        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(BatchOutcome::Succeeded) => summary.succeeded += 1,
                Ok(BatchOutcome::Exhausted(failure)) => summary.failures.push(failure),
                Ok(BatchOutcome::Aborted) => summary.aborted.push(index),
                Err(e) => {
                    error!("Batch {} stopped unexpectedly: {}", index + 1, e);
                    tracker.advance(task_counts[index]);
                    summary.failures.push(BatchFailure {
                        batch_index: index,
                        provider: None,
                        attempts: 0,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    /// Retry loop for one batch; progress advances once, whatever the outcome
    async fn run_batch(&self, index: usize, batch: Vec<TextGroup>, tracker: &ProgressTracker) -> BatchOutcome {
        let texts: Vec<String> = batch.iter().map(|g| g.text.clone()).collect();
        let task_count: usize = batch.iter().map(|g| g.tasks.len()).sum();
        let mut attempt = 0;

        let outcome = loop {
            attempt += 1;

            let Some(slot) = self.scheduler.select() else {
                error!("Batch {}: no translation provider is enabled, giving up", index + 1);
                break BatchOutcome::Aborted;
            };
            let provider = slot.kind();

            let result = match slot.semaphore.clone().acquire_owned().await {
                Ok(_permit) => {
                    debug!(
                        "Batch {} attempt {} on {} ({} texts)",
                        index + 1,
                        attempt,
                        provider.display_name(),
                        texts.len()
                    );
                    AssertUnwindSafe(slot.provider.batch_translate(&texts))
                        .catch_unwind()
                        .await
                }
                Err(e) => Ok(Err(crate::errors::ProviderError::RequestFailed(e.to_string()))),
            };

            let reason = match result {
                Ok(Ok(translations)) => match ensure_count(texts.len(), translations) {
                    Ok(translations) => {
                        self.complete(batch, translations).await;
                        break BatchOutcome::Succeeded;
                    }
                    Err(e) => e.to_string(),
                },
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("provider panicked: {}", panic_message(payload.as_ref())),
            };

            match self.retry.delay_for_attempt(attempt) {
                Some(delay) => {
                    warn!(
                        "Batch {} attempt {}/{} on {} failed: {}, retrying in {:?}",
                        index + 1,
                        attempt,
                        self.retry.max_attempts,
                        provider.display_name(),
                        reason,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!(
                        "Batch {} failed after {} attempt(s) on {}: {}",
                        index + 1,
                        attempt,
                        provider.display_name(),
                        reason
                    );
                    break BatchOutcome::Exhausted(BatchFailure {
                        batch_index: index,
                        provider: Some(provider),
                        attempts: attempt,
                        reason,
                    });
                }
            }
        };

        tracker.advance(task_count);
        outcome
    }

    /// Cache every template and write back every member of the batch
    async fn complete(&self, batch: Vec<TextGroup>, translations: Vec<String>) {
        let mut writes = Vec::new();
        for (group, template) in batch.into_iter().zip(translations) {
            self.cache.store(&group.text, &template);
            writes.extend(group.tasks.into_iter().map(|task| (task, template.clone())));
        }
        self.write_back(writes).await;
    }

    /// Restore markup and hand each result to the sink on the blocking pool
    async fn write_back(&self, writes: Vec<(TranslationTask, String)>) {
        let sink = self.sink.clone();
        let joined = tokio::task::spawn_blocking(move || {
            for (task, template) in writes {
                let restored = task.restore(&template);
                if let Err(e) = sink.apply(&task, &restored) {
                    warn!("Skipping write-back: {}", e);
                }
            }
        })
        .await;
        if let Err(e) = joined {
            error!("Write-back stopped unexpectedly: {}", e);
        }
    }

    /// Flush the cache, then the sink, each exactly once
    async fn finish(&self) -> Result<(), TranslationError> {
        let cache = self.cache.clone();
        let cache_path = self.cache_path.clone();
        let sink = self.sink.clone();

        tokio::task::spawn_blocking(move || {
            let cache_result = match &cache_path {
                Some(path) => cache.flush(path),
                None => Ok(()),
            };
            if let Err(e) = &cache_result {
                error!("{}", e);
            }
            sink.flush()?;
            cache_result
        })
        .await
        .map_err(|e| TranslationError::Flush(e.to_string()))?
    }
}
