//! pagesync Core Library
//!
//! This crate keeps a static marketing site's copy in sync with a remotely
//! published content artifact. A non-technical operator edits the copy
//! elsewhere and publishes it to a cloud-drive JSON blob or a repository
//! file; this library detects the change, downloads and validates it,
//! applies it exactly once, and fans the update out to other contexts.
//!
//! # Architecture
//!
//! - `remote`: stateless gateways to the content backends (drive, github)
//! - `envelope`: the versioned transport wrapper around site content
//! - `store`: in-memory source of truth the presentation layer reads
//! - `detector`: timestamp comparison against the applied baseline
//! - `reconciler`: the timer-driven check-then-sync state machine
//! - `broadcast`: best-effort fan-out of applied updates
//! - `local`: durable key/value persistence under the data directory
//! - `config`: application configuration
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let local = LocalStore::open(config.data_dir.clone())?;
//! let content = Arc::new(ContentStore::with_local(local.clone())?);
//! let remote = backend_from_config(&config)?;
//! let broadcaster = Arc::new(Broadcaster::new(local.clone()));
//!
//! let reconciler = Reconciler::new(remote, content, local, broadcaster, &config)?;
//! reconciler.start();
//! ```

pub mod broadcast;
pub mod config;
pub mod detector;
pub mod document;
pub mod envelope;
pub mod error;
pub mod local;
pub mod reconciler;
pub mod remote;
pub mod state;
pub mod store;

pub use broadcast::{Broadcaster, MessageKind, UpdateMessage};
pub use config::{Backend, Config};
pub use document::ContentDocument;
pub use envelope::{ContentEnvelope, EXPORT_MARKER};
pub use error::{SyncError, SyncResult};
pub use local::LocalStore;
pub use reconciler::{Reconciler, SyncEvent, SyncEventKind, SyncOptions, SyncOptionsPatch};
pub use remote::{backend_from_config, DriveStore, GithubStore, RemoteFileHandle, RemoteStore};
pub use state::SyncState;
pub use store::{ContentStore, SubscriberId};
