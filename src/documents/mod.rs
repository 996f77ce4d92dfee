/*!
 * Game data documents.
 *
 * - `locator`: addresses of values inside a JSON document
 * - `scanner`: finds translatable strings and turns them into tasks
 * - `store`: applies translations in memory and writes documents back
 */

use crate::errors::DocumentError;
use crate::translation::TranslationTask;

pub mod locator;
pub mod scanner;
pub mod store;

pub use locator::{Locator, LocatorPattern, PatternSegment, Segment};
pub use scanner::ContentScanner;
pub use store::DocumentStore;

/// Destination for finished translations
///
/// `apply` may be called concurrently from many batches. Nothing is expected
/// to reach disk before `flush`, which the orchestrator calls once per run.
pub trait ResultSink: Send + Sync {
    /// Record `translated` as the new value for the task's locator
    fn apply(&self, task: &TranslationTask, translated: &str) -> Result<(), DocumentError>;

    /// Persist everything applied so far
    fn flush(&self) -> Result<(), DocumentError>;
}
