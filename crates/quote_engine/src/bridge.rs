use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use quote_core::LocateOutcome;
use quote_logging::{quote_debug, quote_warn, BRIDGE};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

pub type TabId = u32;

/// Default number of undelivered requests a listener may queue.
pub const LISTENER_CAPACITY: usize = 8;

/// Pages a listener can never be attached to.
const RESTRICTED_PREFIXES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "chrome-search://",
    "edge://",
    "about:",
    "view-source:",
    "devtools://",
    "https://chrome.google.com/webstore",
    "https://chromewebstore.google.com",
];

pub fn is_restricted_url(url: &str) -> bool {
    let url = url.trim().to_ascii_lowercase();
    RESTRICTED_PREFIXES
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeRequest {
    ExtractText,
    ScrollToQuote { query: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocateStatus {
    Success,
    Error,
}

impl From<LocateOutcome> for LocateStatus {
    fn from(outcome: LocateOutcome) -> Self {
        match outcome {
            LocateOutcome::Found => LocateStatus::Success,
            LocateOutcome::NotFound => LocateStatus::Error,
        }
    }
}

impl From<LocateStatus> for LocateOutcome {
    fn from(status: LocateStatus) -> Self {
        match status {
            LocateStatus::Success => LocateOutcome::Found,
            LocateStatus::Error => LocateOutcome::NotFound,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    Text { text: String },
    Locate(LocateStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("no active tab")]
    NoActiveTab,
    #[error("tab {0} does not exist")]
    NoSuchTab(TabId),
    #[error("no listener registered in tab {0}")]
    NoListener(TabId),
    #[error("tab {tab} is unreachable: {reason}")]
    Unreachable { tab: TabId, reason: String },
    #[error("tab {0} dropped the request without answering")]
    NoResponse(TabId),
    #[error("tab {0} did not answer in time")]
    Timeout(TabId),
    #[error("malformed message: {0}")]
    Protocol(String),
}

/// One request in flight: a serialized payload and its single reply slot.
#[derive(Debug)]
pub struct Envelope {
    payload: String,
    reply: oneshot::Sender<String>,
}

impl Envelope {
    pub fn new(payload: impl Into<String>) -> (Self, oneshot::Receiver<String>) {
        let (reply, reply_rx) = oneshot::channel();
        (
            Self {
                payload: payload.into(),
                reply,
            },
            reply_rx,
        )
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Sends the answer. Returns false if the requester stopped waiting.
    pub fn respond(self, payload: String) -> bool {
        self.reply.send(payload).is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    ActiveTab,
    Tab(TabId),
}

#[derive(Debug)]
struct TabEntry {
    url: String,
    listener: Option<mpsc::Sender<Envelope>>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: TabId,
    active: Option<TabId>,
    tabs: HashMap<TabId, TabEntry>,
}

/// Tabs known to the privileged context and the listeners injected in them.
#[derive(Debug, Clone, Default)]
pub struct TabRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a tab and makes it the active one.
    pub fn open_tab(&self, url: impl Into<String>) -> TabId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.tabs.insert(
            id,
            TabEntry {
                url: url.into(),
                listener: None,
            },
        );
        inner.active = Some(id);
        id
    }

    pub fn activate(&self, tab: TabId) -> Result<(), BridgeError> {
        let mut inner = self.lock();
        if !inner.tabs.contains_key(&tab) {
            return Err(BridgeError::NoSuchTab(tab));
        }
        inner.active = Some(tab);
        Ok(())
    }

    pub fn close_tab(&self, tab: TabId) -> bool {
        let mut inner = self.lock();
        let removed = inner.tabs.remove(&tab).is_some();
        if inner.active == Some(tab) {
            inner.active = None;
        }
        removed
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.lock().active
    }

    /// Injects a listener into `tab`, replacing any previous one.
    ///
    /// Restricted pages refuse injection.
    pub fn attach_listener(
        &self,
        tab: TabId,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Envelope>, BridgeError> {
        let mut inner = self.lock();
        let entry = inner.tabs.get_mut(&tab).ok_or(BridgeError::NoSuchTab(tab))?;
        if is_restricted_url(&entry.url) {
            return Err(BridgeError::Unreachable {
                tab,
                reason: format!("scripts cannot be injected into {}", entry.url),
            });
        }
        let (tx, rx) = mpsc::channel(capacity.max(1));
        entry.listener = Some(tx);
        Ok(rx)
    }

    pub fn detach_listener(&self, tab: TabId) -> bool {
        self.lock()
            .tabs
            .get_mut(&tab)
            .and_then(|entry| entry.listener.take())
            .is_some()
    }

    fn route(&self, target: Target) -> Result<(TabId, mpsc::Sender<Envelope>), BridgeError> {
        let inner = self.lock();
        let tab = match target {
            Target::ActiveTab => inner.active.ok_or(BridgeError::NoActiveTab)?,
            Target::Tab(tab) => tab,
        };
        let entry = inner.tabs.get(&tab).ok_or(BridgeError::NoSuchTab(tab))?;
        match &entry.listener {
            Some(listener) => Ok((tab, listener.clone())),
            None if is_restricted_url(&entry.url) => Err(BridgeError::Unreachable {
                tab,
                reason: format!("{} does not accept messages", entry.url),
            }),
            None => Err(BridgeError::NoListener(tab)),
        }
    }
}

/// Single request, single response delivery to a document context.
#[async_trait::async_trait]
pub trait Bridge: Send + Sync {
    async fn send(
        &self,
        target: Target,
        request: BridgeRequest,
    ) -> Result<BridgeResponse, BridgeError>;
}

/// Bridge over in-process channels: an mpsc queue per listener and a oneshot
/// per request. Stateless between calls; no retries, no buffering.
#[derive(Debug, Clone)]
pub struct ChannelBridge {
    registry: TabRegistry,
    timeout: Duration,
}

impl ChannelBridge {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(registry: TabRegistry) -> Self {
        Self::with_timeout(registry, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(registry: TabRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }
}

#[async_trait::async_trait]
impl Bridge for ChannelBridge {
    async fn send(
        &self,
        target: Target,
        request: BridgeRequest,
    ) -> Result<BridgeResponse, BridgeError> {
        let (tab, listener) = self.registry.route(target)?;
        let payload =
            serde_json::to_string(&request).map_err(|err| BridgeError::Protocol(err.to_string()))?;
        let (envelope, reply_rx) = Envelope::new(payload);
        quote_debug!(ctx: BRIDGE, "sending {:?} to tab {}", request, tab);

        let exchange = async {
            listener
                .send(envelope)
                .await
                .map_err(|_| BridgeError::Unreachable {
                    tab,
                    reason: "listener is gone".to_string(),
                })?;
            reply_rx.await.map_err(|_| BridgeError::NoResponse(tab))
        };

        let raw = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                quote_warn!(ctx: BRIDGE, "tab {} did not answer within {:?}", tab, self.timeout);
                return Err(BridgeError::Timeout(tab));
            }
        };

        serde_json::from_str(&raw).map_err(|err| BridgeError::Protocol(err.to_string()))
    }
}

/// Asks `target` for its readable text.
pub async fn request_text(bridge: &dyn Bridge, target: Target) -> Result<String, BridgeError> {
    match bridge.send(target, BridgeRequest::ExtractText).await? {
        BridgeResponse::Text { text } => Ok(text),
        other => Err(BridgeError::Protocol(format!(
            "expected text response, got {other:?}"
        ))),
    }
}

/// Asks `target` to scroll to `query`.
pub async fn request_locate(
    bridge: &dyn Bridge,
    target: Target,
    query: &str,
) -> Result<LocateOutcome, BridgeError> {
    let request = BridgeRequest::ScrollToQuote {
        query: query.to_string(),
    };
    match bridge.send(target, request).await? {
        BridgeResponse::Locate(status) => Ok(status.into()),
        other => Err(BridgeError::Protocol(format!(
            "expected locate response, got {other:?}"
        ))),
    }
}
