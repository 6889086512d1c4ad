//! Display name and avatar lookup for a connected address.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::error::AdapterError;
use crate::registry::AdapterRegistry;
use crate::traits::{AdapterCapability, ConnectionStore};
use crate::types::AdapterKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAvatarResult {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl NameAvatarResult {
    /// Resolved name, or the raw address, shortened for display.
    pub fn display(&self, address: &str, max_length: usize, side_chars: usize) -> String {
        abbreviate(self.name.as_deref().unwrap_or(address), max_length, side_chars)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Schedule one retry after a failed name lookup
    pub auto_retry: bool,
    pub retry_delay: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            auto_retry: false,
            retry_delay: Duration::from_secs(3),
        }
    }
}

impl IdentityConfig {
    pub fn with_auto_retry(mut self, retry_delay: Duration) -> Self {
        self.auto_retry = true;
        self.retry_delay = retry_delay;
        self
    }
}

/// Shortens `text` to `prefix...suffix` when it exceeds `max_length` chars.
pub fn abbreviate(text: &str, max_length: usize, side_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_length || side_chars * 2 >= chars.len() {
        return text.to_string();
    }
    let prefix: String = chars[..side_chars].iter().collect();
    let suffix: String = chars[chars.len() - side_chars..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Request {
    address: String,
    kind: AdapterKind,
}

struct ResolverInner {
    registry: AdapterRegistry,
    store: Option<Arc<dyn ConnectionStore>>,
    config: IdentityConfig,
    result: watch::Sender<NameAvatarResult>,
    current: Mutex<Option<Request>>,
    /// Bumped per request and on teardown; older tasks may not publish
    generation: AtomicU64,
    task: Mutex<Option<AbortHandle>>,
}

impl ResolverInner {
    /// Publishes `result` unless a newer request or teardown happened.
    fn publish(&self, generation: u64, result: NameAvatarResult) -> bool {
        self.result.send_if_modified(|current| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *current = result;
            true
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Resolves a name, then an avatar, for one address at a time.
///
/// A new request or `teardown` aborts the lookup in flight.
#[derive(Clone)]
pub struct NameAvatarResolver {
    inner: Arc<ResolverInner>,
}

impl NameAvatarResolver {
    pub fn new(registry: AdapterRegistry, config: IdentityConfig) -> Self {
        let (result, _) = watch::channel(NameAvatarResult::default());
        Self {
            inner: Arc::new(ResolverInner {
                registry,
                store: None,
                config,
                result,
                current: Mutex::new(None),
                generation: AtomicU64::new(0),
                task: Mutex::new(None),
            }),
        }
    }

    /// Prefers the adapter instance held by the connection store.
    pub fn with_store(self, store: Arc<dyn ConnectionStore>) -> Self {
        let inner = ResolverInner {
            registry: self.inner.registry.clone(),
            store: Some(store),
            config: self.inner.config.clone(),
            result: watch::channel(NameAvatarResult::default()).0,
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
            task: Mutex::new(None),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn result(&self) -> NameAvatarResult {
        self.inner.result.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NameAvatarResult> {
        self.inner.result.subscribe()
    }

    /// Starts resolving `address`; a repeat of the current request is a no-op.
    pub fn request(&self, address: &str, kind: AdapterKind) {
        let request = Request {
            address: address.to_string(),
            kind,
        };
        {
            let current = lock(&self.inner.current);
            if current.as_ref() == Some(&request) {
                return;
            }
        }
        self.start(request);
    }

    /// Manual retry of the current request; clears the error first.
    pub fn retry(&self) {
        let current = lock(&self.inner.current).clone();
        match current {
            Some(request) => self.start(request),
            None => debug!("Nothing to retry"),
        }
    }

    pub fn teardown(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.abort();
        lock(&self.inner.current).take();
    }

    fn abort(&self) {
        if let Some(handle) = lock(&self.inner.task).take() {
            handle.abort();
        }
    }

    fn start(&self, request: Request) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort();
        *lock(&self.inner.current) = Some(request.clone());
        self.inner.publish(
            generation,
            NameAvatarResult {
                is_loading: true,
                ..NameAvatarResult::default()
            },
        );

        let retries = if self.inner.config.auto_retry { 1 } else { 0 };
        let inner = self.inner.clone();
        let task = tokio::spawn(run(inner, request, generation, retries));
        *lock(&self.inner.task) = Some(task.abort_handle());
    }
}

async fn run(inner: Arc<ResolverInner>, request: Request, generation: u64, mut retries: u32) {
    loop {
        match lookup(&inner, &request).await {
            Ok((name, avatar)) => {
                let result = NameAvatarResult {
                    name,
                    avatar,
                    is_loading: false,
                    error: None,
                };
                if !inner.publish(generation, result) {
                    debug!("Dropping stale name for {}", request.address);
                }
                return;
            }
            Err(e) => {
                warn!("Name lookup for {} failed: {}", request.address, e);
                let failed = NameAvatarResult {
                    error: Some(e.to_string()),
                    ..NameAvatarResult::default()
                };
                if !inner.publish(generation, failed) || retries == 0 {
                    return;
                }
                retries -= 1;
                tokio::time::sleep(inner.config.retry_delay).await;
                inner.publish(
                    generation,
                    NameAvatarResult {
                        is_loading: true,
                        ..NameAvatarResult::default()
                    },
                );
            }
        }
    }
}

/// Name errors fail the lookup; avatar errors only drop the avatar.
async fn lookup(
    inner: &ResolverInner,
    request: &Request,
) -> Result<(Option<String>, Option<String>), AdapterError> {
    let capability: Option<Arc<dyn AdapterCapability>> =
        match inner.store.as_ref().and_then(|store| store.adapter(request.kind)) {
            Some(capability) => Some(capability),
            None => inner.registry.get_adapter(request.kind).await,
        };
    let Some(capability) = capability else {
        debug!("No {} adapter, showing raw address", request.kind);
        return Ok((None, None));
    };

    let Some(name) = capability.get_name(&request.address).await? else {
        return Ok((None, None));
    };
    let avatar = match capability.get_avatar(&name).await {
        Ok(avatar) => avatar,
        Err(e) => {
            warn!("Avatar lookup for {} failed: {}", name, e);
            None
        }
    };
    Ok((Some(name), avatar))
}
