//! Test doubles for the external collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::error::{AdapterError, ConnectError};
use crate::traits::{
    ActiveConnection, AdapterCapability, AdapterLoader, ConnectRequest, ConnectionStore,
    ImpersonationStore, ImpersonationTarget, ModalControl, RecentWalletStore, RecentWallets,
};
use crate::types::{AdapterKind, AppChainConfig, ChainId, Connector};

pub struct MockCapability {
    kind: AdapterKind,
    chains: Vec<ChainId>,
    fail_chains: bool,
    clusters: Option<Vec<String>>,
    names: HashMap<String, String>,
    name_delays: HashMap<String, Duration>,
    name_failures: AtomicUsize,
    avatars: HashMap<String, String>,
    fail_avatars: bool,
}

impl MockCapability {
    fn with_chains(kind: AdapterKind, chains: Vec<ChainId>) -> Self {
        Self {
            kind,
            chains,
            fail_chains: false,
            clusters: None,
            names: HashMap::new(),
            name_delays: HashMap::new(),
            name_failures: AtomicUsize::new(0),
            avatars: HashMap::new(),
            fail_avatars: false,
        }
    }

    pub fn evm(chains: Vec<u64>) -> Self {
        Self::with_chains(AdapterKind::Evm, chains.into_iter().map(ChainId::Numeric).collect())
    }

    pub fn solana(clusters: Vec<&str>) -> Self {
        Self::with_chains(AdapterKind::Solana, clusters.into_iter().map(ChainId::from).collect())
    }

    pub fn with_failing_chains(mut self) -> Self {
        self.fail_chains = true;
        self
    }

    pub fn with_clusters(mut self, clusters: Vec<&str>) -> Self {
        self.clusters = Some(clusters.into_iter().map(str::to_string).collect());
        self
    }

    pub fn with_name(mut self, address: &str, name: &str) -> Self {
        self.names.insert(address.to_string(), name.to_string());
        self
    }

    pub fn with_name_delay(mut self, address: &str, delay: Duration) -> Self {
        self.name_delays.insert(address.to_string(), delay);
        self
    }

    /// The first `count` name lookups fail.
    pub fn with_name_failures(self, count: usize) -> Self {
        self.name_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_avatar(mut self, name: &str, url: &str) -> Self {
        self.avatars.insert(name.to_string(), url.to_string());
        self
    }

    pub fn with_failing_avatars(mut self) -> Self {
        self.fail_avatars = true;
        self
    }
}

#[async_trait]
impl AdapterCapability for MockCapability {
    fn kind(&self) -> AdapterKind {
        self.kind
    }

    fn get_chains(
        &self,
        _config: &AppChainConfig,
        prior: Option<&[ChainId]>,
    ) -> Result<Vec<ChainId>, AdapterError> {
        if self.fail_chains {
            return Err(AdapterError::Other("rpc unavailable".into()));
        }
        match prior {
            Some(prior) if !prior.is_empty() => Ok(prior.to_vec()),
            _ => Ok(self.chains.clone()),
        }
    }

    fn is_chain_list(&self, chains: &[ChainId]) -> bool {
        match self.kind {
            AdapterKind::Evm => chains.iter().all(ChainId::is_numeric),
            _ => chains.iter().all(ChainId::is_named),
        }
    }

    async fn get_name(&self, address: &str) -> Result<Option<String>, AdapterError> {
        if let Some(delay) = self.name_delays.get(address) {
            tokio::time::sleep(*delay).await;
        }
        let remaining = self.name_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.name_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AdapterError::Other("name service down".into()));
        }
        Ok(self.names.get(address).cloned())
    }

    async fn get_avatar(&self, name: &str) -> Result<Option<String>, AdapterError> {
        if self.fail_avatars {
            return Err(AdapterError::Other("avatar service down".into()));
        }
        Ok(self.avatars.get(name).cloned())
    }

    fn get_available_clusters(&self) -> Option<Vec<String>> {
        self.clusters.clone()
    }
}

pub struct MockLoader {
    capability: Arc<dyn AdapterCapability>,
    loads: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
}

impl MockLoader {
    pub fn new(capability: MockCapability) -> Self {
        Self {
            capability: Arc::new(capability),
            loads: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
            delay: None,
            gate: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Loads block until a permit is added to [`gate`](Self::gate).
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn gate(&self) -> Arc<Semaphore> {
        self.gate.clone().unwrap_or_else(|| Arc::new(Semaphore::new(0)))
    }

    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_switch(&self) -> Arc<AtomicBool> {
        self.fail.clone()
    }

    pub fn load_counter(&self) -> Arc<AtomicUsize> {
        self.loads.clone()
    }
}

#[async_trait]
impl AdapterLoader for MockLoader {
    async fn load(&self) -> Result<Arc<dyn AdapterCapability>, AdapterError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| AdapterError::Other(e.to_string()))?;
            permit.forget();
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("chunk failed to load").into());
        }
        Ok(self.capability.clone())
    }
}

/// Connection store whose connect outcome is scripted by the test.
pub struct MockStore {
    connectors: HashMap<AdapterKind, Vec<Connector>>,
    adapters: HashMap<AdapterKind, Arc<dyn AdapterCapability>>,
    connected: AtomicBool,
    connects_on_call: AtomicBool,
    failure: Mutex<Option<String>>,
    error: Mutex<Option<String>>,
    requests: Mutex<Vec<ConnectRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            connectors: HashMap::new(),
            adapters: HashMap::new(),
            connected: AtomicBool::new(false),
            connects_on_call: AtomicBool::new(true),
            failure: Mutex::new(None),
            error: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn with_connector(mut self, connector: Connector) -> Self {
        self.connectors
            .entry(connector.adapter)
            .or_default()
            .push(connector);
        self
    }

    pub fn with_adapter(mut self, capability: Arc<dyn AdapterCapability>) -> Self {
        self.adapters.insert(capability.kind(), capability);
        self
    }

    /// `connect` resolves but the session never goes live.
    pub fn never_connects(self) -> Self {
        self.connects_on_call.store(false, Ordering::SeqCst);
        self
    }

    /// `connect` blocks until a permit is added to [`gate`](Self::gate).
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    pub fn gate(&self) -> Arc<Semaphore> {
        self.gate.clone().unwrap_or_else(|| Arc::new(Semaphore::new(0)))
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn recover(&self) {
        self.failure.lock().unwrap().take();
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ConnectRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectionStore for MockStore {
    fn active_connection(&self) -> Option<ActiveConnection> {
        let requests = self.requests.lock().unwrap();
        let is_connected = self.connected.load(Ordering::SeqCst);
        let last = requests.last();
        if last.is_none() && !is_connected {
            return None;
        }
        Some(ActiveConnection {
            is_connected,
            address: None,
            connector_type: last.map(|r| r.connector_type.clone()).unwrap_or_default(),
        })
    }

    fn wallet_connection_error(&self) -> Option<String> {
        self.error.lock().unwrap().clone()
    }

    async fn connect(&self, request: ConnectRequest) -> Result<(), ConnectError> {
        self.requests.lock().unwrap().push(request);
        self.error.lock().unwrap().take();
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let failure = self.failure.lock().unwrap().clone();
        if let Some(message) = failure {
            *self.error.lock().unwrap() = Some(message.clone());
            return Err(ConnectError::Store(message));
        }
        if self.connects_on_call.load(Ordering::SeqCst) {
            self.connected.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn connectors(&self) -> HashMap<AdapterKind, Vec<Connector>> {
        self.connectors.clone()
    }

    fn adapter(&self, kind: AdapterKind) -> Option<Arc<dyn AdapterCapability>> {
        self.adapters.get(&kind).cloned()
    }
}

#[derive(Default)]
pub struct MockModal {
    closes: AtomicUsize,
    links: Mutex<Vec<String>>,
}

impl MockModal {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn links(&self) -> Vec<String> {
        self.links.lock().unwrap().clone()
    }
}

impl ModalControl for MockModal {
    fn close_modal(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn open_link(&self, url: &str) {
        self.links.lock().unwrap().push(url.to_string());
    }
}

#[derive(Default)]
pub struct MockImpersonation {
    targets: Mutex<Vec<(AdapterKind, ImpersonationTarget)>>,
}

impl MockImpersonation {
    pub fn targets(&self) -> Vec<(AdapterKind, ImpersonationTarget)> {
        self.targets.lock().unwrap().clone()
    }
}

impl ImpersonationStore for MockImpersonation {
    fn set_impersonated(&self, kind: AdapterKind, target: ImpersonationTarget) {
        self.targets.lock().unwrap().push((kind, target));
    }
}

pub struct MockRecent(pub Option<RecentWallets>);

impl RecentWalletStore for MockRecent {
    fn recent_connected_wallets(&self) -> Option<RecentWallets> {
        self.0.clone()
    }
}
