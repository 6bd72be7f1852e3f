//! Cross-context update propagation
//!
//! After a document is applied locally, the update fans out to every other
//! live context over three redundant channels: an in-process pub/sub bus, a
//! durable pending-update marker other processes watch, and a message to an
//! embedding host when one is attached. Each channel is best-effort; one
//! failing never stops the others, and none of them can fail a sync (the
//! document is already durably applied by the time we get here).

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

use crate::document::ContentDocument;
use crate::error::{SyncError, SyncResult};
use crate::local::LocalStore;
use crate::state::epoch_ms;

/// Well-known channel name shared by all content-update notifications
pub const CHANNEL_NAME: &str = "pagesync-content";

/// Kinds of cross-context messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// A synced or locally saved document was applied
    ContentUpdated,
    /// A document was published to the remote backend
    ContentPublished,
}

/// Message fanned out to other contexts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateMessage {
    pub kind: MessageKind,
    pub content: ContentDocument,
    /// Epoch milliseconds at which the update was applied
    pub timestamp: u64,
    /// Provenance of the update (remote file id, "local-edit", ...)
    pub source: String,
}

impl UpdateMessage {
    pub fn applied(content: ContentDocument, source: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::ContentUpdated,
            content,
            timestamp: epoch_ms(),
            source: source.into(),
        }
    }

    pub fn published(content: ContentDocument, source: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::ContentPublished,
            content,
            timestamp: epoch_ms(),
            source: source.into(),
        }
    }
}

/// A single best-effort notification strategy
pub trait UpdateChannel: Send + Sync {
    fn name(&self) -> &'static str;
    fn publish(&self, message: &UpdateMessage) -> SyncResult<()>;
}

/// Outcome of one channel's publish attempt
pub struct ChannelOutcome {
    pub channel: &'static str,
    pub result: SyncResult<()>,
}

/// In-process pub/sub bus
///
/// Same-origin contexts inside this process subscribe through
/// [`Broadcaster::subscribe`]. Publishing with no listeners is a success:
/// nobody was there to miss it.
struct BusChannel {
    tx: broadcast::Sender<UpdateMessage>,
}

impl UpdateChannel for BusChannel {
    fn name(&self) -> &'static str {
        "bus"
    }

    fn publish(&self, message: &UpdateMessage) -> SyncResult<()> {
        let _ = self.tx.send(message.clone());
        Ok(())
    }
}

/// Durable pending-update marker
///
/// Other processes watching the data directory pick the marker up on their
/// next poll; writing the same value twice is harmless.
struct StorageChannel {
    local: LocalStore,
}

impl UpdateChannel for StorageChannel {
    fn name(&self) -> &'static str {
        "storage-key"
    }

    fn publish(&self, message: &UpdateMessage) -> SyncResult<()> {
        self.local.set_pending(message)
    }
}

/// Message to an embedding host
///
/// Only attached when this context runs embedded (an admin surface inside a
/// larger shell). Fails when the host side has gone away.
struct ParentChannel {
    tx: mpsc::UnboundedSender<UpdateMessage>,
}

impl UpdateChannel for ParentChannel {
    fn name(&self) -> &'static str {
        "parent"
    }

    fn publish(&self, message: &UpdateMessage) -> SyncResult<()> {
        self.tx
            .send(message.clone())
            .map_err(|_| SyncError::NotFound {
                what: "embedding host channel (receiver dropped)".to_string(),
            })
    }
}

/// Fans applied updates out across every configured channel
pub struct Broadcaster {
    bus: broadcast::Sender<UpdateMessage>,
    channels: Vec<Box<dyn UpdateChannel>>,
}

impl Broadcaster {
    /// Build the standard bus + storage-key channel pair
    pub fn new(local: LocalStore) -> Self {
        let (bus, _) = broadcast::channel(16);
        let channels: Vec<Box<dyn UpdateChannel>> = vec![
            Box::new(BusChannel { tx: bus.clone() }),
            Box::new(StorageChannel { local }),
        ];
        Self { bus, channels }
    }

    /// Attach the embedding-host channel
    pub fn with_parent(mut self, tx: mpsc::UnboundedSender<UpdateMessage>) -> Self {
        self.channels.push(Box::new(ParentChannel { tx }));
        self
    }

    /// Subscribe to the in-process bus
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateMessage> {
        self.bus.subscribe()
    }

    /// Attempt every channel, collecting outcomes instead of propagating
    ///
    /// Failures are logged and reported back for observability only.
    pub fn publish(&self, message: &UpdateMessage) -> Vec<ChannelOutcome> {
        self.channels
            .iter()
            .map(|channel| {
                let result = channel.publish(message);
                match &result {
                    Ok(()) => debug!("Broadcast on '{}' channel ok", channel.name()),
                    Err(e) => warn!("Broadcast on '{}' channel failed: {}", channel.name(), e),
                }
                ChannelOutcome {
                    channel: channel.name(),
                    result,
                }
            })
            .collect()
    }
}
