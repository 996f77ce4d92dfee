/*!
 * Provider scheduling.
 *
 * Each provider gets a counting semaphore sized to its concurrent request
 * budget. A batch goes to the enabled provider with the most free permits,
 * ties going to the provider registered first.
 */

use log::{debug, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Semaphore;

use crate::app_config::{Config, ProviderKind};
use crate::errors::ProviderError;
use crate::providers::{Provider, build_provider};

/// A provider and its permit pool
#[derive(Debug)]
pub struct ProviderSlot {
    pub provider: Arc<dyn Provider>,
    pub semaphore: Arc<Semaphore>,
    max_permits: usize,
    enabled: AtomicBool,
}

impl ProviderSlot {
    pub fn new(provider: Arc<dyn Provider>, max_permits: usize) -> Self {
        Self {
            provider,
            semaphore: Arc::new(Semaphore::new(max_permits)),
            max_permits,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.provider.kind()
    }

    pub fn max_permits(&self) -> usize {
        self.max_permits
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Registry of providers in priority order
#[derive(Debug, Default)]
pub struct ProviderScheduler {
    slots: Vec<Arc<ProviderSlot>>,
}

impl ProviderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider after the ones already known
    pub fn register(&mut self, provider: Arc<dyn Provider>, max_permits: usize) {
        debug!("Registering {} with {} permits", provider.kind().display_name(), max_permits);
        self.slots.push(Arc::new(ProviderSlot::new(provider, max_permits)));
    }

    /// Builder form of `register`
    pub fn with_provider(mut self, provider: Arc<dyn Provider>, max_permits: usize) -> Self {
        self.register(provider, max_permits);
        self
    }

    /// Build adapters for every enabled provider in the configuration
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let mut scheduler = Self::new();
        for provider_config in config.translation.enabled_providers() {
            let provider = build_provider(provider_config, &config.source_language, &config.target_language)?;
            scheduler.register(provider, provider_config.effective_max_concurrent_requests());
        }
        info!(
            "Scheduling across {} provider(s): {}",
            scheduler.slots.len(),
            scheduler
                .enabled_kinds()
                .iter()
                .map(|k| k.display_name())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(scheduler)
    }

    /// Enabled slot with the most free permits, earliest registered on ties
    pub fn select(&self) -> Option<Arc<ProviderSlot>> {
        let mut best: Option<&Arc<ProviderSlot>> = None;
        for slot in self.slots.iter().filter(|slot| slot.is_enabled()) {
            match best {
                Some(current) if current.available_permits() >= slot.available_permits() => {}
                _ => best = Some(slot),
            }
        }
        best.cloned()
    }

    /// Switch a provider on or off, returns false if it is not registered
    pub fn set_enabled(&self, kind: ProviderKind, enabled: bool) -> bool {
        let mut found = false;
        for slot in self.slots.iter().filter(|slot| slot.kind() == kind) {
            slot.enabled.store(enabled, Ordering::SeqCst);
            found = true;
        }
        found
    }

    /// Kinds currently eligible for selection, in priority order
    pub fn enabled_kinds(&self) -> Vec<ProviderKind> {
        self.slots
            .iter()
            .filter(|slot| slot.is_enabled())
            .map(|slot| slot.kind())
            .collect()
    }

    /// Free permits of the first slot of `kind`
    pub fn available_permits(&self, kind: ProviderKind) -> Option<usize> {
        self.slots
            .iter()
            .find(|slot| slot.kind() == kind)
            .map(|slot| slot.available_permits())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
