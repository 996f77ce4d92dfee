/*!
 * Tests for the batch orchestrator: dedup, caching, retries, progress
 */

use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

use gameloc::app_config::ProviderKind;
use gameloc::documents::ResultSink;
use gameloc::errors::DocumentError;
use gameloc::providers::Provider;
use gameloc::providers::mock::{MockBehavior, MockProvider};
use gameloc::translation::{BatchOrchestrator, MAX_ATTEMPTS, ProviderScheduler, TranslationCache, TranslationTask};

use crate::common::mock_providers::SelectiveProvider;
use crate::common::{RecordingSink, create_temp_dir, progress_recorder, task};

fn orchestrator(
    provider: Arc<dyn Provider>,
    permits: usize,
    cache: Arc<TranslationCache>,
    sink: Arc<RecordingSink>,
) -> BatchOrchestrator {
    let scheduler = ProviderScheduler::new().with_provider(provider, permits);
    BatchOrchestrator::new(cache, Arc::new(scheduler), sink as Arc<dyn ResultSink>)
}

#[tokio::test(start_paused = true)]
async fn test_run_withDuplicateTexts_shouldTranslateEachTextOnce() {
    let provider = Arc::new(MockProvider::working());
    let cache = Arc::new(TranslationCache::new());
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 4, cache.clone(), sink.clone());

    let tasks = vec![task("a", "剣"), task("b", "盾"), task("c", "剣")];
    let summary = orchestrator.run(tasks, 25, None).await.unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(provider.calls()[0].texts, vec!["剣".to_string(), "盾".to_string()]);
    assert_eq!(sink.applied().len(), 3);
    assert_eq!(sink.text_for("a"), sink.text_for("c"));
    assert_eq!(cache.len(), 2);
    assert_eq!(summary.batches, 1);
    assert_eq!(summary.succeeded, 1);
    assert!(summary.is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_run_withCachedText_shouldSkipProviderAndRestoreTags() {
    let provider = Arc::new(MockProvider::working());
    let cache = Arc::new(TranslationCache::from_entries(HashMap::from([(
        "[TAG0]炎[TAG1]の剣".to_string(),
        "[TAG0]炎[TAG1]之剑".to_string(),
    )])));
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 4, cache, sink.clone());
    let (progress, seen) = progress_recorder();

    let tasks = vec![task("name", "<b>炎</b>の剣"), task("alt", "<i>炎</i>の剣")];
    let summary = orchestrator.run(tasks, 25, Some(progress)).await.unwrap();

    assert_eq!(provider.call_count(), 0);
    assert_eq!(summary.cache_hit_tasks, 2);
    assert_eq!(summary.batches, 0);
    assert_eq!(sink.text_for("name").as_deref(), Some("<b>炎</b>之剑"));
    assert_eq!(sink.text_for("alt").as_deref(), Some("<i>炎</i>之剑"));
    assert_eq!(sink.flush_count(), 1);
    assert_eq!(*seen.lock(), vec![(0, 2), (2, 2)]);
}

#[tokio::test(start_paused = true)]
async fn test_run_withSharedCanonicalText_shouldRestoreEachTasksOwnTags() {
    let provider = Arc::new(MockProvider::working().with_translator(|t| t.replace("こんにちは", "你好")));
    let cache = Arc::new(TranslationCache::new());
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 4, cache.clone(), sink.clone());

    let first = task("first", "こんにちは<color=red>");
    let second = task("second", "こんにちは[烧伤]");
    assert_eq!(first.original_text, "こんにちは[TAG0]");
    assert_eq!(second.original_text, "こんにちは[TAG0]");

    orchestrator.run(vec![first, second], 25, None).await.unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(sink.text_for("first").as_deref(), Some("你好<color=red>"));
    assert_eq!(sink.text_for("second").as_deref(), Some("你好[烧伤]"));
    assert_eq!(cache.get("こんにちは[TAG0]").as_deref(), Some("你好[TAG0]"));
}

#[tokio::test(start_paused = true)]
async fn test_run_withSeveralBatches_shouldPairTranslationsByPosition() {
    let provider = Arc::new(MockProvider::working().with_translator(|t| format!("T({})", t)));
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 2, Arc::new(TranslationCache::new()), sink.clone());

    let tasks = (0..7).map(|i| task(&format!("k{}", i), &format!("text {}", i))).collect();
    let summary = orchestrator.run(tasks, 3, None).await.unwrap();

    assert_eq!(summary.batches, 3);
    assert_eq!(provider.call_count(), 3);
    for i in 0..7 {
        assert_eq!(sink.text_for(&format!("k{}", i)), Some(format!("T(text {})", i)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_withAlwaysFailingProvider_shouldBackOffThenGiveUp() {
    let provider = Arc::new(MockProvider::failing());
    let cache = Arc::new(TranslationCache::new());
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 4, cache.clone(), sink.clone());
    let (progress, seen) = progress_recorder();

    let start = Instant::now();
    let summary = orchestrator
        .run(vec![task("a", "x"), task("b", "y")], 25, Some(progress))
        .await
        .unwrap();
    let elapsed = start.elapsed();

    let calls = provider.calls();
    assert_eq!(calls.len(), MAX_ATTEMPTS as usize);
    let first_gap = calls[1].at - calls[0].at;
    let second_gap = calls[2].at - calls[1].at;
    assert!(first_gap >= Duration::from_millis(1000) && first_gap < Duration::from_millis(1100));
    assert!(second_gap >= Duration::from_millis(2000) && second_gap < Duration::from_millis(2100));
    // No delay after the last attempt
    assert!(elapsed < Duration::from_millis(3100));

    assert_eq!(summary.failures.len(), 1);
    let failure = &summary.failures[0];
    assert_eq!(failure.attempts, 3);
    assert_eq!(failure.provider, Some(ProviderKind::Mock));
    assert!(failure.reason.contains("500"));

    assert!(sink.applied().is_empty());
    assert!(cache.is_empty());
    assert_eq!(seen.lock().last(), Some(&(2, 2)));
    assert_eq!(sink.flush_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_withTransientFailures_shouldSucceedOnLaterAttempt() {
    let provider = Arc::new(MockProvider::working().with_script([MockBehavior::Failing, MockBehavior::WrongCount]));
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 4, Arc::new(TranslationCache::new()), sink.clone());

    let summary = orchestrator
        .run(vec![task("a", "x"), task("b", "y")], 25, None)
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 3);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(sink.applied().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_withWrongCount_shouldNotWriteAnything() {
    let provider = Arc::new(MockProvider::wrong_count());
    let cache = Arc::new(TranslationCache::new());
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 4, cache.clone(), sink.clone());

    let summary = orchestrator
        .run(vec![task("a", "x"), task("b", "y")], 25, None)
        .await
        .unwrap();

    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].reason.contains("Expected 2"));
    assert!(sink.applied().is_empty());
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_run_withPanickingProvider_shouldTreatPanicAsFailedAttempt() {
    let provider = Arc::new(MockProvider::working().with_script([MockBehavior::Panicking]));
    let scheduler = Arc::new(ProviderScheduler::new().with_provider(provider.clone(), 1));
    let sink = RecordingSink::new();
    let orchestrator = BatchOrchestrator::new(Arc::new(TranslationCache::new()), scheduler.clone(), sink.clone());

    let summary = orchestrator.run(vec![task("a", "x")], 25, None).await.unwrap();

    assert_eq!(provider.call_count(), 2);
    assert_eq!(summary.succeeded, 1);
    // The permit taken by the panicking attempt was returned
    assert_eq!(scheduler.available_permits(ProviderKind::Mock), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_run_withOneBadBatch_shouldNotAffectSiblings() {
    let provider = Arc::new(SelectiveProvider::failing_on("BAD"));
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 4, Arc::new(TranslationCache::new()), sink.clone());
    let (progress, seen) = progress_recorder();

    let tasks = vec![task("a", "good 1"), task("b", "BAD"), task("c", "good 2")];
    let summary = orchestrator.run(tasks, 1, Some(progress)).await.unwrap();

    assert_eq!(summary.batches, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].batch_index, 1);
    assert_eq!(provider.calls(), 2 + 3);
    assert_eq!(sink.text_for("a").as_deref(), Some("<good 1>"));
    assert!(sink.text_for("b").is_none());
    assert_eq!(seen.lock().last(), Some(&(3, 3)));
}

#[tokio::test(start_paused = true)]
async fn test_run_progress_shouldBeMonotonicAndEndAtTotal() {
    let provider = Arc::new(MockProvider::slow(50).with_script([MockBehavior::Failing]));
    let cache = Arc::new(TranslationCache::from_entries(HashMap::from([(
        "cached".to_string(),
        "hit".to_string(),
    )])));
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider, 2, cache, sink);
    let (progress, seen) = progress_recorder();

    let mut tasks: Vec<_> = (0..9).map(|i| task(&format!("k{}", i), &format!("t{}", i))).collect();
    tasks.push(task("c1", "cached"));
    tasks.push(task("c2", "cached"));
    tasks.push(task("d", "t0"));

    orchestrator.run(tasks, 2, Some(progress)).await.unwrap();

    let seen = seen.lock().clone();
    assert_eq!(seen.first(), Some(&(0, 12)));
    assert_eq!(seen.last(), Some(&(12, 12)));
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    assert!(seen.iter().all(|(_, total)| *total == 12));
}

#[tokio::test(start_paused = true)]
async fn test_run_shouldRespectProviderPermits() {
    let provider = Arc::new(MockProvider::slow(100));
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 2, Arc::new(TranslationCache::new()), sink);

    let tasks = (0..8).map(|i| task(&format!("k{}", i), &format!("t{}", i))).collect();
    let summary = orchestrator.run(tasks, 1, None).await.unwrap();

    assert_eq!(summary.succeeded, 8);
    assert_eq!(provider.peak_in_flight(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_shouldSpreadBatchesAcrossProviders() {
    let microsoft = Arc::new(MockProvider::slow(100).with_kind(ProviderKind::Microsoft));
    let tencent = Arc::new(MockProvider::slow(100).with_kind(ProviderKind::Tencent));
    let scheduler = ProviderScheduler::new()
        .with_provider(microsoft.clone(), 2)
        .with_provider(tencent.clone(), 2);
    let orchestrator = BatchOrchestrator::new(
        Arc::new(TranslationCache::new()),
        Arc::new(scheduler),
        RecordingSink::new(),
    );

    let tasks = (0..4).map(|i| task(&format!("k{}", i), &format!("t{}", i))).collect();
    orchestrator.run(tasks, 1, None).await.unwrap();

    assert!(microsoft.call_count() >= 1);
    assert!(tencent.call_count() >= 1);
    assert_eq!(microsoft.call_count() + tencent.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_run_withoutProviders_shouldAbortBatchesButFinishRun() {
    let sink = RecordingSink::new();
    let orchestrator = BatchOrchestrator::new(
        Arc::new(TranslationCache::new()),
        Arc::new(ProviderScheduler::new()),
        sink.clone(),
    );
    let (progress, seen) = progress_recorder();

    let tasks = vec![task("a", "x"), task("b", "y"), task("c", "z")];
    let summary = orchestrator.run(tasks, 2, Some(progress)).await.unwrap();

    assert_eq!(summary.batches, 2);
    assert_eq!(summary.aborted, vec![0, 1]);
    assert!(summary.failures.is_empty());
    assert!(!summary.is_complete());
    assert_eq!(seen.lock().last(), Some(&(3, 3)));
    assert_eq!(sink.flush_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_withDisabledProvider_shouldUseRemainingOne() {
    let microsoft = Arc::new(MockProvider::working().with_kind(ProviderKind::Microsoft));
    let baidu = Arc::new(MockProvider::working().with_kind(ProviderKind::Baidu));
    let scheduler = ProviderScheduler::new()
        .with_provider(microsoft.clone(), 10)
        .with_provider(baidu.clone(), 10);
    scheduler.set_enabled(ProviderKind::Microsoft, false);
    let orchestrator = BatchOrchestrator::new(
        Arc::new(TranslationCache::new()),
        Arc::new(scheduler),
        RecordingSink::new(),
    );

    orchestrator.run(vec![task("a", "x")], 25, None).await.unwrap();

    assert_eq!(microsoft.call_count(), 0);
    assert_eq!(baidu.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_withCachePath_shouldPersistNewTranslationsOnce() {
    let dir = create_temp_dir().unwrap();
    let cache_path = dir.path().join("cache").join("translation_cache.json");
    let cache = Arc::new(TranslationCache::new());
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(Arc::new(MockProvider::working()), 4, cache, sink.clone())
        .with_cache_path(&cache_path);

    orchestrator.run(vec![task("a", "x")], 25, None).await.unwrap();

    let reloaded = TranslationCache::load(&cache_path).unwrap();
    assert_eq!(reloaded.get("x").as_deref(), Some("[TRANSLATED] x"));
    assert_eq!(sink.flush_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_run_withNoTasks_shouldDoNothing() {
    let provider = Arc::new(MockProvider::working());
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 4, Arc::new(TranslationCache::new()), sink.clone());

    let summary = orchestrator.run(Vec::new(), 25, None).await.unwrap();

    assert_eq!(summary.total_tasks, 0);
    assert_eq!(provider.call_count(), 0);
    assert_eq!(sink.flush_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_run_withDroppedPlaceholder_shouldKeepResultWithoutMarkup() {
    let provider = Arc::new(MockProvider::working().with_translator(|t| t.replace("[TAG0]", "")));
    let cache = Arc::new(TranslationCache::new());
    let sink = RecordingSink::new();
    let orchestrator = orchestrator(provider.clone(), 4, cache.clone(), sink.clone());

    let summary = orchestrator
        .run(vec![task("name", "<b>炎</b>の剣")], 25, None)
        .await
        .unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(summary.succeeded, 1);
    assert!(summary.is_complete());
    assert_eq!(cache.get("[TAG0]炎[TAG1]の剣").as_deref(), Some("炎[TAG1]の剣"));
    assert_eq!(sink.text_for("name").as_deref(), Some("炎</b>の剣"));
}

/// Sink whose calls only succeed on the blocking pool: `Handle::block_on`
/// panics when called from a thread that is driving async tasks.
struct BlockingPoolSink {
    inner: Arc<RecordingSink>,
}

impl ResultSink for BlockingPoolSink {
    fn apply(&self, task: &TranslationTask, translated: &str) -> Result<(), DocumentError> {
        tokio::runtime::Handle::current().block_on(async {});
        self.inner.apply(task, translated)
    }

    fn flush(&self) -> Result<(), DocumentError> {
        tokio::runtime::Handle::current().block_on(async {});
        self.inner.flush()
    }
}

#[tokio::test(start_paused = true)]
async fn test_run_withBlockingSink_shouldWriteOffTheAsyncThreads() {
    let recorded = RecordingSink::new();
    let cache = Arc::new(TranslationCache::from_entries(HashMap::from([(
        "cached".to_string(),
        "hit".to_string(),
    )])));
    let scheduler = ProviderScheduler::new().with_provider(Arc::new(MockProvider::working()), 2);
    let orchestrator = BatchOrchestrator::new(
        cache,
        Arc::new(scheduler),
        Arc::new(BlockingPoolSink { inner: recorded.clone() }),
    );

    let tasks = vec![task("a", "cached"), task("b", "x"), task("c", "y")];
    let summary = orchestrator.run(tasks, 1, None).await.unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.succeeded, 2);
    assert_eq!(recorded.text_for("a").as_deref(), Some("hit"));
    assert_eq!(recorded.text_for("b").as_deref(), Some("[TRANSLATED] x"));
    assert_eq!(recorded.text_for("c").as_deref(), Some("[TRANSLATED] y"));
    assert_eq!(recorded.flush_count(), 1);
}
