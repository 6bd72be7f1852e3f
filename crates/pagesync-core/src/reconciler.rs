//! Sync reconciler
//!
//! The reconciler owns the check-then-sync cycle: detect that the remote
//! artifact changed, download and validate it, apply it to the content
//! store, and fan the update out to other contexts. It runs unattended on a
//! timer once started, and also serves manual "sync now" / "check now"
//! requests. Failures are never fatal to the running state; the next tick
//! always gets another chance.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::broadcast::{Broadcaster, UpdateMessage};
use crate::config::Config;
use crate::detector;
use crate::envelope;
use crate::error::SyncResult;
use crate::local::LocalStore;
use crate::remote::RemoteStore;
use crate::state::{epoch_ms, SyncState};
use crate::store::ContentStore;

/// Kinds of events the reconciler emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncEventKind {
    Checking,
    Syncing,
    Success,
    Error,
    NoUpdates,
    Started,
    Stopped,
}

/// Ephemeral event delivered to status-display subscribers
#[derive(Debug, Clone, Serialize)]
pub struct SyncEvent {
    pub kind: SyncEventKind,
    /// Epoch milliseconds at emission
    pub timestamp: u64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Runtime sync settings, derived from [`Config`]
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Whether a config-driven restart should re-arm the timer
    pub enabled: bool,
    pub interval: Duration,
    /// Total attempts per failing operation
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Known remote file id, when one has been recorded
    pub file_id: Option<String>,
    /// Display name used for name-based lookup
    pub file_name: String,
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        Self {
            enabled: config.auto_sync_enabled,
            interval: config.check_interval(),
            max_retries: config.max_retries.max(1),
            retry_delay: config.retry_delay(),
            file_id: config.drive_file_id.clone(),
            file_name: config.drive_file_name.clone(),
        }
    }
}

/// Partial settings update applied through [`Reconciler::update_config`]
#[derive(Debug, Clone, Default)]
pub struct SyncOptionsPatch {
    pub enabled: Option<bool>,
    pub interval: Option<Duration>,
    pub max_retries: Option<u32>,
    pub retry_delay: Option<Duration>,
    pub file_id: Option<String>,
    pub file_name: Option<String>,
}

impl SyncOptions {
    fn merge(&mut self, patch: SyncOptionsPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(interval) = patch.interval {
            self.interval = interval;
        }
        if let Some(max_retries) = patch.max_retries {
            self.max_retries = max_retries.max(1);
        }
        if let Some(retry_delay) = patch.retry_delay {
            self.retry_delay = retry_delay;
        }
        if let Some(file_id) = patch.file_id {
            self.file_id = Some(file_id);
        }
        if let Some(file_name) = patch.file_name {
            self.file_name = file_name;
        }
    }
}

/// What a cycle's detect-download-apply portion produced
enum Outcome {
    /// Remote is absent or not newer than the baseline
    NoUpdate,
    /// A document was applied
    Applied {
        source: String,
        modified_at: u64,
        produced_at: u64,
    },
    /// The reconciler was stopped mid-flight; the result was thrown away
    Discarded,
}

/// Latch preventing two overlapping cycles
struct FlightGuard<'a>(&'a AtomicBool);

impl<'a> FlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
            .then(|| Self(flag))
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

struct Inner {
    remote: Arc<dyn RemoteStore>,
    content: Arc<ContentStore>,
    local: LocalStore,
    broadcaster: Arc<Broadcaster>,
    options: Mutex<SyncOptions>,
    state: Mutex<SyncState>,
    events: mpsc::UnboundedSender<SyncEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<SyncEvent>>>,
    /// Single-flight latch serializing manual triggers against timer cycles
    in_flight: AtomicBool,
    running: AtomicBool,
    /// Bumped on stop; an in-flight cycle discards its result when it no
    /// longer matches the generation it started under
    generation: AtomicU64,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
}

/// Orchestrates detect, download, validate, apply on a recurring timer
#[derive(Clone)]
pub struct Reconciler {
    inner: Arc<Inner>,
}

impl Reconciler {
    /// Build a reconciler; counters restore from durable storage, the
    /// armed-timer flag always starts false.
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        content: Arc<ContentStore>,
        local: LocalStore,
        broadcaster: Arc<Broadcaster>,
        config: &Config,
    ) -> SyncResult<Self> {
        let state = local.load_sync_state()?;
        let (events, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            inner: Arc::new(Inner {
                remote,
                content,
                local,
                broadcaster,
                options: Mutex::new(SyncOptions::from(config)),
                state: Mutex::new(state),
                events,
                events_rx: Mutex::new(Some(events_rx)),
                in_flight: AtomicBool::new(false),
                running: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                shutdown: Mutex::new(None),
            }),
        })
    }

    /// Take the event receiver (can only be called once)
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<SyncEvent>> {
        self.inner.events_rx.lock().expect("events lock poisoned").take()
    }

    /// Snapshot of the current reconciler state
    pub fn state(&self) -> SyncState {
        self.inner.state.lock().expect("state lock poisoned").clone()
    }

    /// Whether the periodic timer is armed
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Current runtime settings
    pub fn options(&self) -> SyncOptions {
        self.inner.options.lock().expect("options lock poisoned").clone()
    }

    /// Arm the periodic timer and run one immediate cycle
    ///
    /// No-op if already running. Must be called from within a tokio runtime.
    pub fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            debug!("Reconciler already running, ignoring start");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        *self.inner.shutdown.lock().expect("shutdown lock poisoned") = Some(shutdown_tx);

        {
            let mut state = self.inner.state.lock().expect("state lock poisoned");
            state.is_running = true;
            self.inner.persist(&state);
        }
        let interval = self.options().interval;
        info!("Auto-sync started, checking every {:?}", interval);
        self.inner
            .emit(SyncEventKind::Started, "Auto-sync started", None);

        let inner = self.inner.clone();
        tokio::spawn(async move {
            // Immediate first cycle, then the timer cadence
            let _ = inner.run_cycle().await;

            loop {
                let interval = inner
                    .options
                    .lock()
                    .expect("options lock poisoned")
                    .interval;
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        let _ = inner.run_cycle().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Sync timer task exited");
        });
    }

    /// Disarm the timer; historical counters survive
    ///
    /// An in-flight cycle is not aborted, but its result will be discarded
    /// rather than applied.
    pub fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return;
        }

        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = self
            .inner
            .shutdown
            .lock()
            .expect("shutdown lock poisoned")
            .take()
        {
            let _ = tx.send(true);
        }

        {
            let mut state = self.inner.state.lock().expect("state lock poisoned");
            state.is_running = false;
            state.next_check = None;
            self.inner.persist(&state);
        }
        info!("Auto-sync stopped");
        self.inner
            .emit(SyncEventKind::Stopped, "Auto-sync stopped", None);
    }

    /// Run the download-and-apply portion of a cycle immediately
    ///
    /// Usable while stopped. Returns `Ok(true)` when a document was applied,
    /// `Ok(false)` when there was nothing to do or another cycle already
    /// holds the single-flight latch.
    pub async fn trigger_manual_sync(&self) -> SyncResult<bool> {
        let inner = &self.inner;
        let Some(_guard) = FlightGuard::acquire(&inner.in_flight) else {
            debug!("Another cycle is in flight, manual sync skipped");
            return Ok(false);
        };

        let generation = inner.generation.load(Ordering::SeqCst);
        let options = self.options();
        let outcome = inner.detect_and_apply(&options, generation).await;
        inner.settle(outcome, generation)
    }

    /// Run a full check-then-sync cycle immediately, outside the timer
    pub async fn force_check(&self) -> SyncResult<bool> {
        self.inner.run_cycle().await
    }

    /// Merge new settings; a running reconciler restarts so a stale timer
    /// can never keep ticking with an old interval
    pub fn update_config(&self, patch: SyncOptionsPatch) {
        let was_running = self.is_running();
        if was_running {
            self.stop();
        }

        let enabled = {
            let mut options = self.inner.options.lock().expect("options lock poisoned");
            options.merge(patch);
            options.enabled
        };

        if was_running && enabled {
            self.start();
        }
    }
}

impl Inner {
    fn emit(&self, kind: SyncEventKind, message: impl Into<String>, data: Option<serde_json::Value>) {
        let _ = self.events.send(SyncEvent {
            kind,
            timestamp: epoch_ms(),
            message: message.into(),
            data,
        });
    }

    fn persist(&self, state: &SyncState) {
        if let Err(e) = self.local.save_sync_state(state) {
            warn!("Failed to persist sync state: {}", e);
        }
    }

    /// One full check-then-sync cycle (steps 1-4)
    async fn run_cycle(&self) -> SyncResult<bool> {
        let Some(_guard) = FlightGuard::acquire(&self.in_flight) else {
            debug!("Cycle already in flight, skipping tick");
            return Ok(false);
        };

        let generation = self.generation.load(Ordering::SeqCst);
        let options = self.options.lock().expect("options lock poisoned").clone();

        let now = epoch_ms();
        let next_check = self
            .running
            .load(Ordering::SeqCst)
            .then(|| now + options.interval.as_millis() as u64);
        {
            let mut state = self.state.lock().expect("state lock poisoned");
            state.begin_check(now, next_check);
            self.persist(&state);
        }
        self.emit(SyncEventKind::Checking, "Checking for content updates", None);

        let outcome = self.detect_and_apply(&options, generation).await;
        self.settle(outcome, generation)
    }

    /// Steps 2-4: detect with retries, then download, validate, and apply
    async fn detect_and_apply(
        &self,
        options: &SyncOptions,
        generation: u64,
    ) -> SyncResult<Outcome> {
        let update = self
            .with_retries(options, "change detection", || {
                let file_id = options.file_id.clone();
                let file_name = options.file_name.clone();
                async move {
                    let baseline = self.local.baseline()?;
                    detector::has_remote_update(
                        self.remote.as_ref(),
                        file_id.as_deref(),
                        &file_name,
                        baseline,
                    )
                    .await
                }
            })
            .await?;

        let Some(handle) = update else {
            return Ok(Outcome::NoUpdate);
        };

        self.emit(
            SyncEventKind::Syncing,
            format!("Downloading update from '{}'", handle.name),
            Some(serde_json::json!({
                "file_id": handle.id,
                "modified_at": handle.modified_at,
            })),
        );

        let envelope = self
            .with_retries(options, "content download", || {
                let file_id = handle.id.clone();
                async move {
                    let raw = self.remote.download(&file_id).await?;
                    // Bad data will not improve on retry; decode failures
                    // propagate past the retry loop immediately.
                    envelope::decode(&raw)
                }
            })
            .await?;

        // A cycle that was stopped while its download was in flight must
        // not mutate anything on resolution.
        if generation != self.generation.load(Ordering::SeqCst) {
            info!("Reconciler stopped mid-cycle, discarding downloaded update");
            return Ok(Outcome::Discarded);
        }

        self.content.set(envelope.document.clone());
        self.local.set_baseline(handle.modified_at)?;
        self.broadcaster
            .publish(&UpdateMessage::applied(envelope.document, handle.id.clone()));

        Ok(Outcome::Applied {
            source: handle.id,
            modified_at: handle.modified_at,
            produced_at: envelope.produced_at,
        })
    }

    /// Record the cycle outcome in state and the event stream
    fn settle(&self, outcome: SyncResult<Outcome>, generation: u64) -> SyncResult<bool> {
        match outcome {
            Ok(Outcome::NoUpdate) => {
                self.emit(SyncEventKind::NoUpdates, "Content is up to date", None);
                Ok(false)
            }
            Ok(Outcome::Discarded) => Ok(false),
            Ok(Outcome::Applied {
                source,
                modified_at,
                produced_at,
            }) => {
                {
                    let mut state = self.state.lock().expect("state lock poisoned");
                    state.record_success(epoch_ms());
                    self.persist(&state);
                }
                info!("Applied remote content update from {}", source);
                self.emit(
                    SyncEventKind::Success,
                    "Content updated",
                    Some(serde_json::json!({
                        "source": source,
                        "modified_at": modified_at,
                        "produced_at": produced_at,
                    })),
                );
                Ok(true)
            }
            Err(e) => {
                if generation != self.generation.load(Ordering::SeqCst) {
                    debug!("Reconciler stopped mid-cycle, dropping error: {}", e);
                    return Err(e);
                }
                {
                    let mut state = self.state.lock().expect("state lock poisoned");
                    state.record_failure(e.to_string());
                    self.persist(&state);
                }
                warn!("Sync cycle failed: {}", e);
                self.emit(SyncEventKind::Error, e.to_string(), None);
                Err(e)
            }
        }
    }

    /// Run an operation up to `max_retries` total attempts
    ///
    /// Only retryable (transient) errors consume further attempts; anything
    /// else propagates immediately. Auth failures additionally get a loud
    /// log line so a silent degraded mode cannot mask misconfiguration.
    async fn with_retries<T, F, Fut>(
        &self,
        options: &SyncOptions,
        what: &str,
        mut op: F,
    ) -> SyncResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = SyncResult<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < options.max_retries => {
                    warn!(
                        "{} attempt {}/{} failed: {}, retrying in {:?}",
                        what, attempt, options.max_retries, e, options.retry_delay
                    );
                    tokio::time::sleep(options.retry_delay).await;
                }
                Err(e) => {
                    if e.is_auth() {
                        warn!("{} hit an auth failure; sync degraded until re-authentication", what);
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::MessageKind;
    use crate::document::ContentDocument;
    use crate::error::SyncError;
    use crate::remote::mock::{handle, MockRemote};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        remote: Arc<MockRemote>,
        content: Arc<ContentStore>,
        local: LocalStore,
        broadcaster: Arc<Broadcaster>,
        reconciler: Reconciler,
    }

    fn remote_envelope() -> (ContentDocument, String) {
        let mut doc = ContentDocument::default();
        doc.hero.title = "Fresh remote copy".to_string();
        let json = envelope::encode_json(&doc).unwrap();
        (doc, json)
    }

    fn fixture(remote: MockRemote) -> Fixture {
        fixture_with(remote, |_| {})
    }

    fn fixture_with(remote: MockRemote, tweak: impl FnOnce(&mut Config)) -> Fixture {
        let dir = TempDir::new().unwrap();
        let local = LocalStore::open(dir.path().to_path_buf()).unwrap();
        let content = Arc::new(ContentStore::new());
        let broadcaster = Arc::new(Broadcaster::new(local.clone()));

        let mut config = Config {
            drive_file_id: Some("f1".to_string()),
            max_retries: 3,
            retry_delay_secs: 0,
            ..Config::default()
        };
        tweak(&mut config);

        let remote = Arc::new(remote);
        let reconciler = Reconciler::new(
            remote.clone(),
            content.clone(),
            local.clone(),
            broadcaster.clone(),
            &config,
        )
        .unwrap();

        Fixture {
            _dir: dir,
            remote,
            content,
            local,
            broadcaster,
            reconciler,
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SyncEvent>) -> Vec<SyncEventKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }

    #[tokio::test]
    async fn test_first_check_applies_unconditionally() {
        let (doc, body) = remote_envelope();
        let fx = fixture(MockRemote::with_file(handle("f1", 1_000), body));

        let applied = fx.reconciler.force_check().await.unwrap();
        assert!(applied);
        assert_eq!(fx.content.get(), doc);
        assert_eq!(fx.local.baseline().unwrap(), 1_000);

        let state = fx.reconciler.state();
        assert_eq!(state.checks_performed, 1);
        assert_eq!(state.successful_syncs, 1);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_reapplying_same_timestamp_is_a_no_op() {
        let (_doc, body) = remote_envelope();
        let fx = fixture(MockRemote::with_file(handle("f1", 1_000), body));

        assert!(fx.reconciler.force_check().await.unwrap());
        let after_first = fx.content.get();

        // Remote unchanged; a second cycle must not re-apply or re-count
        assert!(!fx.reconciler.force_check().await.unwrap());
        assert_eq!(fx.content.get(), after_first);

        let state = fx.reconciler.state();
        assert_eq!(state.checks_performed, 2);
        assert_eq!(state.successful_syncs, 1);
    }

    #[tokio::test]
    async fn test_missing_remote_is_no_updates_not_error() {
        let fx = fixture(MockRemote::new());
        let mut rx = fx.reconciler.take_events().unwrap();

        let applied = fx.reconciler.force_check().await.unwrap();
        assert!(!applied);

        let kinds = drain(&mut rx);
        assert_eq!(kinds, vec![SyncEventKind::Checking, SyncEventKind::NoUpdates]);
        assert_eq!(fx.reconciler.state().failed_syncs, 0);
    }

    #[tokio::test]
    async fn test_retry_budget_is_total_attempts() {
        let (_doc, body) = remote_envelope();
        let remote = MockRemote::with_file(handle("f1", 1_000), body);
        // Fails exactly max_retries times; success would come on attempt 4
        remote.fail_downloads.store(3, Ordering::SeqCst);
        let fx = fixture(remote);

        let err = fx.reconciler.trigger_manual_sync().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(fx.remote.download_calls.load(Ordering::SeqCst), 3);
        assert_eq!(fx.content.get(), ContentDocument::default());

        let state = fx.reconciler.state();
        assert_eq!(state.failed_syncs, 1);
        assert!(state.last_error.is_some());
    }

    #[tokio::test]
    async fn test_transient_failure_recovers_within_budget() {
        let (doc, body) = remote_envelope();
        let remote = MockRemote::with_file(handle("f1", 1_000), body);
        remote.fail_downloads.store(1, Ordering::SeqCst);
        let fx = fixture(remote);

        let applied = fx.reconciler.trigger_manual_sync().await.unwrap();
        assert!(applied);
        assert_eq!(fx.remote.download_calls.load(Ordering::SeqCst), 2);
        assert_eq!(fx.content.get(), doc);
    }

    #[tokio::test]
    async fn test_validation_failure_is_not_retried() {
        let bad_body = r#"{"kind":"wrong-marker","version":1,"produced_at":5,"document":{}}"#;
        let fx = fixture(MockRemote::with_file(handle("f1", 1_000), bad_body));

        let err = fx.reconciler.force_check().await.unwrap_err();
        assert!(matches!(err, SyncError::Validation { .. }));
        // One attempt only: bad data will not improve on retry
        assert_eq!(fx.remote.download_calls.load(Ordering::SeqCst), 1);

        let state = fx.reconciler.state();
        assert_eq!(state.checks_performed, 1);
        assert_eq!(state.successful_syncs, 0);
        assert_eq!(state.failed_syncs, 1);
    }

    #[tokio::test]
    async fn test_manual_sync_usable_while_stopped() {
        let (doc, body) = remote_envelope();
        let fx = fixture(MockRemote::with_file(handle("f1", 1_000), body));

        assert!(!fx.reconciler.is_running());
        let applied = fx.reconciler.trigger_manual_sync().await.unwrap();
        assert!(applied);
        assert_eq!(fx.content.get(), doc);
        // Manual sync skips the check bookkeeping of a full cycle
        assert_eq!(fx.reconciler.state().checks_performed, 0);
    }

    #[tokio::test]
    async fn test_success_broadcasts_applied_update() {
        let (doc, body) = remote_envelope();
        let fx = fixture(MockRemote::with_file(handle("f1", 1_000), body));
        let mut bus = fx.broadcaster.subscribe();

        fx.reconciler.trigger_manual_sync().await.unwrap();

        let message = bus.recv().await.unwrap();
        assert_eq!(message.kind, MessageKind::ContentUpdated);
        assert_eq!(message.content, doc);
        assert_eq!(message.source, "f1");
    }

    #[tokio::test]
    async fn test_stop_discards_stale_results() {
        let (_doc, body) = remote_envelope();
        let remote = MockRemote::with_file(handle("f1", 1_000), body);
        *remote.download_delay.lock().unwrap() = Some(Duration::from_millis(300));
        let fx = fixture(remote);

        fx.reconciler.start();
        // Let the immediate cycle reach its in-flight download, then stop
        tokio::time::sleep(Duration::from_millis(100)).await;
        fx.reconciler.stop();
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert!(!fx.reconciler.is_running());
        assert_eq!(fx.content.get(), ContentDocument::default());
        assert_eq!(fx.local.baseline().unwrap(), 0);
        assert_eq!(fx.reconciler.state().successful_syncs, 0);
    }

    #[tokio::test]
    async fn test_start_twice_arms_one_timer() {
        let fx = fixture_with(MockRemote::new(), |config| {
            config.check_interval_secs = 3_600;
        });
        let mut rx = fx.reconciler.take_events().unwrap();

        fx.reconciler.start();
        fx.reconciler.start();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let kinds = drain(&mut rx);
        let started = kinds.iter().filter(|k| **k == SyncEventKind::Started).count();
        let checking = kinds.iter().filter(|k| **k == SyncEventKind::Checking).count();
        assert_eq!(started, 1);
        assert_eq!(checking, 1); // one immediate cycle, not two

        fx.reconciler.stop();
    }

    #[tokio::test]
    async fn test_manual_sync_skipped_while_cycle_in_flight() {
        let (_doc, body) = remote_envelope();
        let remote = MockRemote::with_file(handle("f1", 1_000), body);
        *remote.download_delay.lock().unwrap() = Some(Duration::from_millis(200));
        let fx = fixture(remote);

        let background = {
            let reconciler = fx.reconciler.clone();
            tokio::spawn(async move { reconciler.force_check().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The latch is held by the in-flight cycle
        let applied = fx.reconciler.trigger_manual_sync().await.unwrap();
        assert!(!applied);

        assert!(background.await.unwrap().unwrap());
        assert_eq!(fx.remote.download_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_config_restarts_running_timer() {
        let fx = fixture_with(MockRemote::new(), |config| {
            config.check_interval_secs = 3_600;
            config.auto_sync_enabled = true;
        });

        fx.reconciler.start();
        assert!(fx.reconciler.is_running());

        fx.reconciler.update_config(SyncOptionsPatch {
            interval: Some(Duration::from_millis(50)),
            ..SyncOptionsPatch::default()
        });

        // Restarted with the new cadence
        assert!(fx.reconciler.is_running());
        assert_eq!(fx.reconciler.options().interval, Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(180)).await;
        let state = fx.reconciler.state();
        // Immediate cycle plus at least two timer ticks
        assert!(state.checks_performed >= 3, "got {}", state.checks_performed);

        fx.reconciler.stop();
    }

    #[tokio::test]
    async fn test_update_config_disabling_stays_stopped() {
        let fx = fixture_with(MockRemote::new(), |config| {
            config.check_interval_secs = 3_600;
            config.auto_sync_enabled = true;
        });

        fx.reconciler.start();
        fx.reconciler.update_config(SyncOptionsPatch {
            enabled: Some(false),
            ..SyncOptionsPatch::default()
        });

        assert!(!fx.reconciler.is_running());
        let state = fx.reconciler.state();
        assert!(state.next_check.is_none());
    }

    #[tokio::test]
    async fn test_counters_survive_restart_but_running_does_not() {
        let (_doc, body) = remote_envelope();
        let fx = fixture(MockRemote::with_file(handle("f1", 1_000), body));

        fx.reconciler.force_check().await.unwrap();
        let state = fx.reconciler.state();
        assert_eq!(state.successful_syncs, 1);

        // A new reconciler over the same data dir restores counters
        let config = Config {
            drive_file_id: Some("f1".to_string()),
            ..Config::default()
        };
        let revived = Reconciler::new(
            fx.remote.clone(),
            fx.content.clone(),
            fx.local.clone(),
            fx.broadcaster.clone(),
            &config,
        )
        .unwrap();

        let state = revived.state();
        assert_eq!(state.successful_syncs, 1);
        assert!(!state.is_running);
        assert!(state.next_check.is_none());
    }
}
