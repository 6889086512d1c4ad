mod config;
pub use config::RegistryConfig;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use tracing::{debug, info, instrument, warn};

use crate::error::AdapterError;
use crate::traits::{AdapterCapability, AdapterLoader};
use crate::types::{AdapterKind, AdapterStatus};

type Capability = Arc<dyn AdapterCapability>;
type PendingLoad = Shared<BoxFuture<'static, Option<Capability>>>;

/// Cache slot for one adapter kind
enum Slot {
    Idle,
    /// A load is in flight; every caller awaits this same future
    Loading(PendingLoad),
    Loaded(Capability),
    /// Last load failed; the next request retries
    Failed(String),
}

impl Slot {
    fn status(&self) -> AdapterStatus {
        match self {
            Slot::Idle => AdapterStatus::Idle,
            Slot::Loading(_) => AdapterStatus::Loading,
            Slot::Loaded(_) => AdapterStatus::Loaded,
            Slot::Failed(_) => AdapterStatus::Error,
        }
    }
}

type Slots = Arc<RwLock<HashMap<AdapterKind, Slot>>>;

/// Process-wide cache of lazily loaded adapter capabilities.
///
/// Cloning is cheap and every clone shares the same cache. The registry is
/// the only writer of the cache and of the status map; callers get read
/// access (`get_loaded_adapter`) or load-or-wait access (`get_adapter`).
#[derive(Clone)]
pub struct AdapterRegistry {
    slots: Slots,
    loaders: Arc<HashMap<AdapterKind, Arc<dyn AdapterLoader>>>,
    config: RegistryConfig,
}

impl AdapterRegistry {
    /// Create an adapter registry with no loaders
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            loaders: Arc::new(HashMap::new()),
            config,
        }
    }

    /// Registers the loader for a kind
    ///
    /// Intended for startup wiring, before the registry is shared.
    pub fn with_loader<L>(mut self, kind: AdapterKind, loader: L) -> Self
    where
        L: AdapterLoader + 'static,
    {
        Arc::make_mut(&mut self.loaders).insert(kind, Arc::new(loader));
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the capability for `kind`, loading it on first use.
    ///
    /// A loaded capability is returned without suspending. Concurrent callers
    /// share one in-flight load. Failures yield `None` and leave the kind in
    /// `error` until the next request retries.
    #[instrument(skip(self))]
    pub async fn get_adapter(&self, kind: AdapterKind) -> Option<Capability> {
        let pending = {
            let mut slots = self.write_slots();
            match slots.get(&kind) {
                Some(Slot::Loaded(capability)) => return Some(capability.clone()),
                Some(Slot::Loading(pending)) => {
                    debug!("Joining in-flight load");
                    pending.clone()
                }
                Some(Slot::Failed(reason)) => {
                    debug!("Retrying adapter load after failure: {}", reason);
                    let pending = self.start_load(kind);
                    slots.insert(kind, Slot::Loading(pending.clone()));
                    pending
                }
                Some(Slot::Idle) | None => {
                    let pending = self.start_load(kind);
                    slots.insert(kind, Slot::Loading(pending.clone()));
                    pending
                }
            }
        };

        pending.await
    }

    /// Cache read that never triggers a load
    pub fn get_loaded_adapter(&self, kind: AdapterKind) -> Option<Capability> {
        match self.read_slots().get(&kind) {
            Some(Slot::Loaded(capability)) => Some(capability.clone()),
            _ => None,
        }
    }

    /// Loads every kind concurrently; failures only show up in the status map
    pub async fn preload_adapters(&self, kinds: &[AdapterKind]) {
        let loads = kinds.iter().map(|kind| self.get_adapter(*kind));
        let loaded = join_all(loads).await.into_iter().flatten().count();
        debug!("Preloaded {}/{} adapters", loaded, kinds.len());
    }

    /// Preloads the kinds named in the registry configuration
    pub async fn preload_configured(&self) {
        let kinds = self.config.preload.clone();
        self.preload_adapters(&kinds).await;
    }

    pub fn get_adapter_status(&self, kind: AdapterKind) -> AdapterStatus {
        self.read_slots()
            .get(&kind)
            .map(Slot::status)
            .unwrap_or_default()
    }

    /// Status of every known kind, idle for kinds never requested
    pub fn get_adapters_info(&self) -> HashMap<AdapterKind, AdapterStatus> {
        let slots = self.read_slots();
        AdapterKind::ALL
            .iter()
            .map(|kind| {
                let status = slots.get(kind).map(Slot::status).unwrap_or_default();
                (*kind, status)
            })
            .collect()
    }

    /// Reason of the last failed load, if the kind is in `error`
    pub fn last_error(&self, kind: AdapterKind) -> Option<String> {
        match self.read_slots().get(&kind) {
            Some(Slot::Failed(reason)) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Spawns the load so it completes and populates the cache even when
    /// every waiting caller has gone away.
    fn start_load(&self, kind: AdapterKind) -> PendingLoad {
        let loader = self.loaders.get(&kind).cloned();
        let timeout = self.config.load_timeout;
        let slots = self.slots.clone();

        debug!("Loading {} adapter", kind);
        let task = tokio::spawn({
            let slots = slots.clone();
            async move {
                let outcome = run_load(kind, loader, timeout).await;
                let mut slots = slots.write().unwrap_or_else(PoisonError::into_inner);
                match outcome {
                    Ok(capability) => {
                        info!("Loaded {} adapter", kind);
                        slots.insert(kind, Slot::Loaded(capability.clone()));
                        Some(capability)
                    }
                    Err(e) => {
                        warn!("Adapter load failed for {}: {}", kind, e);
                        slots.insert(kind, Slot::Failed(e.to_string()));
                        None
                    }
                }
            }
        });

        async move {
            match task.await {
                Ok(capability) => capability,
                Err(e) => {
                    warn!("Adapter load task for {} aborted: {}", kind, e);
                    let mut slots = slots.write().unwrap_or_else(PoisonError::into_inner);
                    slots.insert(kind, Slot::Failed(e.to_string()));
                    None
                }
            }
        }
        .boxed()
        .shared()
    }

    fn read_slots(&self) -> RwLockReadGuard<'_, HashMap<AdapterKind, Slot>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slots(&self) -> RwLockWriteGuard<'_, HashMap<AdapterKind, Slot>> {
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_load(
    kind: AdapterKind,
    loader: Option<Arc<dyn AdapterLoader>>,
    timeout: Option<Duration>,
) -> Result<Capability, AdapterError> {
    let loader = loader.ok_or(AdapterError::MissingLoader(kind))?;
    let capability = match timeout {
        Some(budget) => tokio::time::timeout(budget, loader.load())
            .await
            .map_err(|_| AdapterError::LoadTimeout(kind))??,
        None => loader.load().await?,
    };

    if capability.kind() != kind {
        return Err(AdapterError::Load {
            kind,
            reason: format!("loader produced a {} adapter", capability.kind()),
        });
    }
    Ok(capability)
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("status", &self.get_adapters_info())
            .field("loaders", &self.loaders.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockCapability, MockLoader};

    fn registry_with(loader: MockLoader) -> AdapterRegistry {
        AdapterRegistry::default().with_loader(AdapterKind::Evm, loader)
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_load() {
        let loader = MockLoader::new(MockCapability::evm(vec![1]))
            .with_delay(Duration::from_millis(20));
        let loads = loader.load_counter();
        let registry = registry_with(loader);

        let requests = (0..8).map(|_| registry.get_adapter(AdapterKind::Evm));
        let results = join_all(requests).await;

        assert!(results.iter().all(Option::is_some));
        assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(registry.get_adapter_status(AdapterKind::Evm), AdapterStatus::Loaded);
    }

    #[tokio::test]
    async fn test_loaded_adapter_is_sync_cache_read() {
        let loader = MockLoader::new(MockCapability::evm(vec![1]));
        let loads = loader.load_counter();
        let registry = registry_with(loader);

        assert!(registry.get_loaded_adapter(AdapterKind::Evm).is_none());
        assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(registry.get_adapter_status(AdapterKind::Evm), AdapterStatus::Idle);

        let loaded = registry.get_adapter(AdapterKind::Evm).await.unwrap();
        let cached = registry.get_loaded_adapter(AdapterKind::Evm).unwrap();
        assert!(Arc::ptr_eq(&loaded, &cached));
    }

    #[tokio::test]
    async fn test_status_is_loading_while_in_flight() {
        let loader = MockLoader::new(MockCapability::evm(vec![1])).gated();
        let gate = loader.gate();
        let registry = registry_with(loader);

        let background = tokio::spawn({
            let registry = registry.clone();
            async move { registry.get_adapter(AdapterKind::Evm).await }
        });
        tokio::task::yield_now().await;
        while registry.get_adapter_status(AdapterKind::Evm) == AdapterStatus::Idle {
            tokio::task::yield_now().await;
        }
        assert_eq!(registry.get_adapter_status(AdapterKind::Evm), AdapterStatus::Loading);
        assert!(registry.get_loaded_adapter(AdapterKind::Evm).is_none());

        gate.add_permits(1);
        assert!(background.await.unwrap().is_some());
        assert_eq!(registry.get_adapter_status(AdapterKind::Evm), AdapterStatus::Loaded);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried_on_next_request() {
        let loader = MockLoader::new(MockCapability::evm(vec![1])).failing();
        let loads = loader.load_counter();
        let fail = loader.fail_switch();
        let registry = registry_with(loader);

        assert!(registry.get_adapter(AdapterKind::Evm).await.is_none());
        assert_eq!(registry.get_adapter_status(AdapterKind::Evm), AdapterStatus::Error);
        assert!(registry.last_error(AdapterKind::Evm).is_some());

        fail.store(false, std::sync::atomic::Ordering::SeqCst);
        assert!(registry.get_adapter(AdapterKind::Evm).await.is_some());
        assert_eq!(registry.get_adapter_status(AdapterKind::Evm), AdapterStatus::Loaded);
        assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert!(registry.last_error(AdapterKind::Evm).is_none());
    }

    #[tokio::test]
    async fn test_missing_loader_marks_error() {
        let registry = AdapterRegistry::default();
        assert!(registry.get_adapter(AdapterKind::Sui).await.is_none());
        assert_eq!(registry.get_adapter_status(AdapterKind::Sui), AdapterStatus::Error);
    }

    #[tokio::test]
    async fn test_preload_swallows_partial_failure() {
        let registry = AdapterRegistry::default()
            .with_loader(AdapterKind::Evm, MockLoader::new(MockCapability::evm(vec![1])))
            .with_loader(
                AdapterKind::Solana,
                MockLoader::new(MockCapability::solana(vec!["devnet"])).failing(),
            );

        registry
            .preload_adapters(&[AdapterKind::Evm, AdapterKind::Solana])
            .await;

        let info = registry.get_adapters_info();
        assert_eq!(info[&AdapterKind::Evm], AdapterStatus::Loaded);
        assert_eq!(info[&AdapterKind::Solana], AdapterStatus::Error);
        assert_eq!(info[&AdapterKind::Sui], AdapterStatus::Idle);
    }

    #[tokio::test]
    async fn test_preload_configured_kinds() {
        let config = RegistryConfig::new().with_preload(vec![AdapterKind::Evm]);
        let registry = AdapterRegistry::new(config)
            .with_loader(AdapterKind::Evm, MockLoader::new(MockCapability::evm(vec![1])));

        registry.preload_configured().await;
        assert!(registry.get_loaded_adapter(AdapterKind::Evm).is_some());
    }

    #[tokio::test]
    async fn test_load_completes_after_caller_is_dropped() {
        let loader = MockLoader::new(MockCapability::evm(vec![1]))
            .with_delay(Duration::from_millis(30));
        let loads = loader.load_counter();
        let registry = registry_with(loader);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(5), registry.get_adapter(AdapterKind::Evm)).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(registry.get_adapter_status(AdapterKind::Evm), AdapterStatus::Loaded);
        assert!(registry.get_adapter(AdapterKind::Evm).await.is_some());
        assert_eq!(loads.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_timeout_marks_error() {
        let config = RegistryConfig::new().with_load_timeout(Duration::from_millis(10));
        let registry = AdapterRegistry::new(config).with_loader(
            AdapterKind::Evm,
            MockLoader::new(MockCapability::evm(vec![1])).with_delay(Duration::from_millis(200)),
        );

        assert!(registry.get_adapter(AdapterKind::Evm).await.is_none());
        assert_eq!(registry.get_adapter_status(AdapterKind::Evm), AdapterStatus::Error);
        assert!(registry.last_error(AdapterKind::Evm).unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_mismatched_kind_is_rejected() {
        let registry = AdapterRegistry::default().with_loader(
            AdapterKind::Evm,
            MockLoader::new(MockCapability::solana(vec!["devnet"])),
        );
        assert!(registry.get_adapter(AdapterKind::Evm).await.is_none());
        assert_eq!(registry.get_adapter_status(AdapterKind::Evm), AdapterStatus::Error);
    }
}
