/*!
 * Batch translation engine for game text.
 *
 * This module contains the machinery between scanned tasks and translated
 * documents. It is split into several submodules:
 *
 * - `tags`: Markup protection and restoration
 * - `task`: Translation tasks and the task queue
 * - `cache`: Dedup cache of translated templates
 * - `scheduler`: Provider selection and permit pools
 * - `orchestrator`: Batching, retries, write-back and progress
 */

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::orchestrator::{BatchFailure, BatchOrchestrator, MAX_ATTEMPTS, RetryPolicy, RunSummary};
pub use self::scheduler::{ProviderScheduler, ProviderSlot};
pub use self::tags::{TagMap, TagProtector};
pub use self::task::{ProgressCallback, TaskQueue, TranslationTask};

// Submodules
pub mod cache;
pub mod orchestrator;
pub mod scheduler;
pub mod tags;
pub mod task;
