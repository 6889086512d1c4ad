//! Connection modal state machine.
//!
//! Drives connectors -> (network | impersonate) -> connecting and the
//! connect -> wait-for-connection -> auto-close sequence. The flow never
//! returns errors: connect failures land in [`ConnectionFlowState::last_error`]
//! and the store's own error field, and "try again" re-runs the attempt.

mod config;
mod state;

pub use config::{FlowConfig, CLEAR_CONNECTED_DELAY, CLOSE_DELAY, IMPERSONATION_WALLET};
pub use state::{ConnectionFlowState, ContentType, FlowOutcome};

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{watch, Notify};
use tokio::task::AbortHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::chains::ChainResolver;
use crate::error::ConnectError;
use crate::grouping::{self, normalize_name, GroupedConnector};
use crate::traits::{
    ConnectRequest, ConnectionStore, ImpersonationStore, ImpersonationTarget, ModalControl,
    RecentWalletStore,
};
use crate::types::{connector_type, AdapterKind, ChainId};
use crate::utils::wait_for;
use crate::{evm, solana};

/// Connector and kind of the latest attempt, replayed by `retry`
#[derive(Debug, Clone)]
struct Attempt {
    connector_name: String,
    connector_type: String,
    kind: AdapterKind,
}

struct FlowInner {
    id: Uuid,
    store: Arc<dyn ConnectionStore>,
    resolver: ChainResolver,
    modal: Arc<dyn ModalControl>,
    recent: Option<Arc<dyn RecentWalletStore>>,
    impersonation: Option<Arc<dyn ImpersonationStore>>,
    config: FlowConfig,
    state: watch::Sender<ConnectionFlowState>,
    mounted: AtomicBool,
    /// Bumped on open and teardown; attempts from an older epoch are stale
    epoch: AtomicU64,
    /// Wakes pending connects when the flow is reset
    reset_signal: Notify,
    /// Epoch of the attempt currently connecting
    in_flight: Mutex<Option<u64>>,
    /// Multi-adapter wallet waiting on the network screen
    pending_group: Mutex<Option<GroupedConnector>>,
    last_attempt: Mutex<Option<Attempt>>,
    /// Close-then-clear timer task
    timers: Mutex<Option<AbortHandle>>,
}

impl FlowInner {
    fn is_current(&self, epoch: u64) -> bool {
        self.mounted.load(Ordering::SeqCst) && self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn cancel_timers(&self) {
        if let Some(handle) = lock(&self.timers).take() {
            handle.abort();
        }
    }

    /// Claims the in-flight slot for the current epoch.
    fn begin_attempt(&self) -> Option<InFlight<'_>> {
        let mut in_flight = lock(&self.in_flight);
        if in_flight.is_some() {
            return None;
        }
        let epoch = self.epoch.load(Ordering::SeqCst);
        *in_flight = Some(epoch);
        Some(InFlight { inner: self, epoch })
    }

    /// Invalidates running attempts and frees the in-flight slot.
    fn reset(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        lock(&self.in_flight).take();
        self.reset_signal.notify_waiters();
        self.cancel_timers();
    }
}

/// Releases the in-flight slot when the attempt finishes or is dropped.
struct InFlight<'a> {
    inner: &'a FlowInner,
    epoch: u64,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut in_flight = lock(&self.inner.in_flight);
        if *in_flight == Some(self.epoch) {
            in_flight.take();
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Wires the flow to its collaborators.
pub struct FlowBuilder {
    store: Arc<dyn ConnectionStore>,
    resolver: ChainResolver,
    modal: Arc<dyn ModalControl>,
    recent: Option<Arc<dyn RecentWalletStore>>,
    impersonation: Option<Arc<dyn ImpersonationStore>>,
    config: FlowConfig,
}

impl FlowBuilder {
    pub fn with_config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_recent_wallets(mut self, recent: Arc<dyn RecentWalletStore>) -> Self {
        self.recent = Some(recent);
        self
    }

    pub fn with_impersonation(mut self, store: Arc<dyn ImpersonationStore>) -> Self {
        self.impersonation = Some(store);
        self
    }

    pub fn build(self) -> ConnectionFlow {
        let (state, _) = watch::channel(ConnectionFlowState::default());
        ConnectionFlow {
            inner: Arc::new(FlowInner {
                id: Uuid::new_v4(),
                store: self.store,
                resolver: self.resolver,
                modal: self.modal,
                recent: self.recent,
                impersonation: self.impersonation,
                config: self.config,
                state,
                mounted: AtomicBool::new(true),
                epoch: AtomicU64::new(0),
                reset_signal: Notify::new(),
                in_flight: Mutex::new(None),
                pending_group: Mutex::new(None),
                last_attempt: Mutex::new(None),
                timers: Mutex::new(None),
            }),
        }
    }
}

/// State machine behind one connection modal.
///
/// Cloning shares the same flow. At most one connect attempt runs at a time.
#[derive(Clone)]
pub struct ConnectionFlow {
    inner: Arc<FlowInner>,
}

impl ConnectionFlow {
    pub fn builder(
        store: Arc<dyn ConnectionStore>,
        resolver: ChainResolver,
        modal: Arc<dyn ModalControl>,
    ) -> FlowBuilder {
        FlowBuilder {
            store,
            resolver,
            modal,
            recent: None,
            impersonation: None,
            config: FlowConfig::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn state(&self) -> ConnectionFlowState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionFlowState> {
        self.inner.state.subscribe()
    }

    pub fn is_connecting(&self) -> bool {
        lock(&self.inner.in_flight).is_some()
    }

    /// Resets to the connectors screen; called every time the modal opens.
    pub fn open(&self) {
        self.inner.mounted.store(true, Ordering::SeqCst);
        self.inner.reset();
        lock(&self.inner.pending_group).take();
        self.inner.state.send_replace(ConnectionFlowState::default());
        debug!(flow = %self.inner.id, "Flow opened");
    }

    /// Stops timers and poll loops; results of running attempts are discarded.
    pub fn teardown(&self) {
        self.inner.mounted.store(false, Ordering::SeqCst);
        self.inner.reset();
        debug!(flow = %self.inner.id, "Flow torn down");
    }

    /// Wallets to show: grouped, filtered by the selected network, recent first.
    pub fn visible_connectors(&self) -> Vec<GroupedConnector> {
        let mut groups = grouping::group_by_kind(&self.inner.store.connectors());
        let selected = self.inner.state.borrow().selected_adapter;
        if let Some(kind) = selected {
            groups = grouping::filter_by_adapter(groups, kind);
        }
        let recent = self
            .inner
            .recent
            .as_ref()
            .and_then(|store| store.recent_connected_wallets());
        grouping::order_by_recent(groups, recent.as_ref())
    }

    /// Network tab pre-filter.
    pub fn select_adapter(&self, kind: Option<AdapterKind>) {
        self.inner.state.send_modify(|state| state.selected_adapter = kind);
    }

    /// Handles a click on a wallet card.
    #[instrument(skip_all, fields(wallet = %group.name))]
    pub async fn select_connector(&self, group: &GroupedConnector) -> FlowOutcome {
        if self.is_connecting() {
            debug!("Connect already in flight, ignoring click");
            return FlowOutcome::Ignored;
        }
        if self.state().content_type != ContentType::Connectors {
            return FlowOutcome::Ignored;
        }

        let impersonation_key = normalize_name(&self.inner.config.impersonation_wallet_name);
        if group.normalized_name() == impersonation_key {
            let name = group.name.clone();
            return self.navigate(ContentType::Impersonate, move |state| {
                state.active_connector_name = Some(name);
            });
        }

        let kind = match group.adapters.first() {
            None => {
                warn!("Wallet has no adapters");
                return FlowOutcome::Ignored;
            }
            Some(only) if !group.is_multi_adapter() => *only,
            Some(_) => {
                let preselected = self
                    .inner
                    .state
                    .borrow()
                    .selected_adapter
                    .filter(|kind| group.supports(*kind));
                match preselected {
                    Some(kind) => kind,
                    None => {
                        *lock(&self.inner.pending_group) = Some(group.clone());
                        let name = group.name.clone();
                        return self.navigate(ContentType::Network, move |state| {
                            state.active_connector_name = Some(name);
                        });
                    }
                }
            }
        };

        match group.connector_for(kind) {
            Some(connector) => {
                let attempt = Attempt {
                    connector_name: group.name.clone(),
                    connector_type: connector.connector_type.clone(),
                    kind,
                };
                self.run_attempt(attempt).await
            }
            None => {
                warn!("No {} connector for wallet", kind);
                FlowOutcome::Ignored
            }
        }
    }

    /// Picks the network for the wallet shown on the network screen.
    #[instrument(skip(self))]
    pub async fn select_network(&self, kind: AdapterKind) -> FlowOutcome {
        if self.state().content_type != ContentType::Network || self.is_connecting() {
            return FlowOutcome::Ignored;
        }
        let group = lock(&self.inner.pending_group).clone();
        let Some(group) = group else {
            return FlowOutcome::Ignored;
        };
        let Some(connector) = group.connector_for(kind) else {
            debug!("{} does not support {}", group.name, kind);
            return FlowOutcome::Ignored;
        };

        let attempt = Attempt {
            connector_name: group.name.clone(),
            connector_type: connector.connector_type.clone(),
            kind,
        };
        self.run_attempt(attempt).await
    }

    /// Flat back-stack: every secondary screen returns to connectors.
    pub fn back(&self) -> FlowOutcome {
        if self.state().content_type == ContentType::Connectors {
            return FlowOutcome::Ignored;
        }
        lock(&self.inner.pending_group).take();
        self.navigate(ContentType::Connectors, |state| {
            state.active_connector_name = None;
        })
    }

    /// "I don't have a wallet".
    pub fn show_get_wallet(&self) -> FlowOutcome {
        self.side_branch(ContentType::GetWallet)
    }

    pub fn show_about(&self) -> FlowOutcome {
        self.side_branch(ContentType::About)
    }

    /// "Learn more" on the about or get-wallet screen.
    pub fn learn_more(&self) -> FlowOutcome {
        let url = self.inner.config.about_url.clone();
        self.open_link(url)
    }

    /// "Choose wallet" on the about or get-wallet screen.
    pub fn choose_wallet(&self) -> FlowOutcome {
        let url = self.inner.config.get_wallet_url.clone();
        self.open_link(url)
    }

    /// Whether "try again" can be offered.
    pub fn can_retry(&self) -> bool {
        let state = self.state();
        let has_error =
            state.last_error.is_some() || self.inner.store.wallet_connection_error().is_some();
        has_error
            && state.selected_adapter.is_some()
            && state.active_connector_name.is_some()
            && lock(&self.inner.last_attempt).is_some()
    }

    /// Re-runs the last attempt with the same connector and adapter.
    #[instrument(skip(self))]
    pub async fn retry(&self) -> FlowOutcome {
        if self.is_connecting() || !self.can_retry() {
            return FlowOutcome::Ignored;
        }
        let attempt = lock(&self.inner.last_attempt).clone();
        match attempt {
            Some(attempt) => self.run_attempt(attempt).await,
            None => FlowOutcome::Ignored,
        }
    }

    /// Starts a read-only session for an address or name.
    ///
    /// Empty input, a running attempt or an existing connection make this a
    /// no-op. Input is not required to be a raw address.
    #[instrument(skip(self))]
    pub async fn submit_impersonation(&self, input: &str) -> FlowOutcome {
        let input = input.trim();
        if self.state().content_type != ContentType::Impersonate {
            return FlowOutcome::Ignored;
        }
        if input.is_empty() {
            debug!("Empty impersonation input");
            return FlowOutcome::Ignored;
        }
        if self.is_connecting() {
            debug!("Connect already in flight, ignoring impersonation");
            return FlowOutcome::Ignored;
        }
        let already_connected = self
            .inner
            .store
            .active_connection()
            .map(|connection| connection.is_connected)
            .unwrap_or(false);
        if already_connected {
            debug!("Wallet already connected, ignoring impersonation");
            return FlowOutcome::Ignored;
        }

        let kind = self.state().selected_adapter.unwrap_or(AdapterKind::Evm);
        let target = classify_target(kind, input);
        debug!("Impersonating {} on {}", target.as_str(), kind);
        match &self.inner.impersonation {
            Some(store) => store.set_impersonated(kind, target),
            None => warn!("No impersonation store configured"),
        }

        let address = input.to_string();
        self.inner
            .state
            .send_modify(|state| state.impersonated_address = address);

        let name = self
            .state()
            .active_connector_name
            .unwrap_or_else(|| self.inner.config.impersonation_wallet_name.clone());
        let attempt = Attempt {
            connector_name: name,
            connector_type: connector_type(kind, "impersonated"),
            kind,
        };
        self.run_attempt(attempt).await
    }

    fn side_branch(&self, target: ContentType) -> FlowOutcome {
        if self.state().content_type != ContentType::Connectors {
            return FlowOutcome::Ignored;
        }
        self.navigate(target, |_| {})
    }

    fn open_link(&self, url: String) -> FlowOutcome {
        match self.state().content_type {
            ContentType::About | ContentType::GetWallet => {
                self.inner.modal.open_link(&url);
                FlowOutcome::OpenedLink(url)
            }
            _ => FlowOutcome::Ignored,
        }
    }

    fn navigate<F>(&self, target: ContentType, update: F) -> FlowOutcome
    where
        F: FnOnce(&mut ConnectionFlowState),
    {
        self.inner.state.send_modify(|state| {
            debug!("{:?} -> {:?}", state.content_type, target);
            state.content_type = target;
            update(state);
        });
        FlowOutcome::Navigated(target)
    }

    /// Connect, wait for the store to report a live session, then schedule
    /// the modal close.
    async fn run_attempt(&self, attempt: Attempt) -> FlowOutcome {
        let Some(guard) = self.inner.begin_attempt() else {
            return FlowOutcome::Ignored;
        };
        let epoch = guard.epoch;

        *lock(&self.inner.last_attempt) = Some(attempt.clone());
        lock(&self.inner.pending_group).take();
        self.navigate(ContentType::Connecting, |state| {
            state.selected_adapter = Some(attempt.kind);
            state.active_connector_name = Some(attempt.connector_name.clone());
            state.last_error = None;
        });

        let chain_id = self.connect_chain(attempt.kind).await;
        info!(
            "Connecting {} via {} on {}",
            attempt.connector_name,
            attempt.connector_type,
            chain_id.as_ref().map(ChainId::to_string).unwrap_or_else(|| "default chain".to_string())
        );
        let result = self.connect_and_wait(&attempt, chain_id, epoch).await;
        drop(guard);

        if !self.inner.is_current(epoch) {
            debug!("Flow reset during connect, discarding result");
            return FlowOutcome::Cancelled;
        }

        match result {
            Ok(()) => {
                info!("Connected {}", attempt.connector_name);
                self.inner.state.send_modify(|state| state.is_connected = true);
                self.schedule_close(epoch);
                FlowOutcome::Connected
            }
            Err(e) => {
                error!("Connect via {} failed: {}", attempt.connector_type, e);
                let message = self
                    .inner
                    .store
                    .wallet_connection_error()
                    .unwrap_or_else(|| e.to_string());
                let shown = message.clone();
                self.inner
                    .state
                    .send_modify(|state| state.last_error = Some(shown));
                FlowOutcome::Failed(message)
            }
        }
    }

    async fn connect_and_wait(
        &self,
        attempt: &Attempt,
        chain_id: Option<ChainId>,
        epoch: u64,
    ) -> Result<(), ConnectError> {
        let request = ConnectRequest {
            connector_type: attempt.connector_type.clone(),
            chain_id,
        };
        let reset = self.inner.reset_signal.notified();
        if !self.inner.is_current(epoch) {
            return Err(ConnectError::Cancelled);
        }
        tokio::select! {
            result = self.inner.store.connect(request) => result?,
            _ = reset => return Err(ConnectError::Cancelled),
        }

        let store = self.inner.store.clone();
        let inner = self.inner.clone();
        wait_for(
            || {
                store
                    .active_connection()
                    .map(|connection| connection.is_connected)
                    .unwrap_or(false)
            },
            || !inner.is_current(epoch),
            self.inner.config.poll_interval,
            self.inner.config.connect_timeout,
        )
        .await
    }

    async fn connect_chain(&self, kind: AdapterKind) -> Option<ChainId> {
        match self.inner.config.initial_chains.get(&kind) {
            Some(chain) => Some(chain.clone()),
            None => self.inner.resolver.initial_chain(kind).await,
        }
    }

    /// Closes the modal after [`CLOSE_DELAY`] and clears `is_connected` after
    /// [`CLEAR_CONNECTED_DELAY`]. Both run in one task so they are cancelled together.
    fn schedule_close(&self, epoch: u64) {
        self.inner.cancel_timers();
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            sleep(CLOSE_DELAY).await;
            if !inner.is_current(epoch) {
                return;
            }
            inner.modal.close_modal();

            sleep(CLEAR_CONNECTED_DELAY.saturating_sub(CLOSE_DELAY)).await;
            if !inner.is_current(epoch) {
                return;
            }
            inner.state.send_modify(|state| state.is_connected = false);
            lock(&inner.timers).take();
        });
        *lock(&self.inner.timers) = Some(task.abort_handle());
    }
}

impl std::fmt::Debug for ConnectionFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionFlow")
            .field("id", &self.inner.id)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

/// Raw addresses go to the helper store as-is; anything else is a name for it to resolve.
fn classify_target(kind: AdapterKind, input: &str) -> ImpersonationTarget {
    let is_address = match kind {
        AdapterKind::Evm => evm::is_address(input),
        AdapterKind::Solana => solana::is_address(input),
        AdapterKind::Sui => false,
    };
    if is_address {
        ImpersonationTarget::RawAddress(input.to_string())
    } else {
        ImpersonationTarget::Name(input.to_string())
    }
}
