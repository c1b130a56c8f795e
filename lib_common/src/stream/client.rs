//! # Stream Client
//!
//! The producer-facing handle. Construction selects the transport strategy
//! exactly once, `start` launches the single supervisor worker, `enqueue` is
//! fire-and-forget, and `stop` winds the worker down within a bounded wait.
//! All methods are safe to call from the simulation loop; none of them ever
//! blocks on network I/O.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use url::Url;

use super::config::StreamConfig;
use super::queue::{self, QueueReceiver, QueueSender};
use super::snapshot::Snapshot;
use super::supervisor;
use super::transport::{LogSink, Transport, WsTransport};

/// Handle to the state-streaming client.
///
/// One instance drives at most one background worker. The lifecycle is
/// construct once, `start()` once (extra calls are no-ops), any number of
/// `enqueue()` calls, `stop()` once at teardown; after `stop()` returns the
/// instance is inert and must not be reused.
pub struct StreamClient {
    config: StreamConfig,
    sender: QueueSender,
    // Consumed by the first start(); their absence marks a spent instance.
    receiver: Mutex<Option<QueueReceiver>>,
    transport: Mutex<Option<Box<dyn Transport>>>,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl StreamClient {
    /// Builds a client and selects its transport strategy.
    ///
    /// A configured endpoint that parses with a `ws`/`wss` scheme selects the
    /// real WebSocket transport; anything else (absent, unparsable, wrong
    /// scheme) selects the local log sink. The choice is made here, once,
    /// never per-message.
    pub fn new(config: StreamConfig) -> Self {
        let (sender, receiver) = queue::channel();
        let transport = select_transport(&config);
        Self {
            config,
            sender,
            receiver: Mutex::new(Some(receiver)),
            transport: Mutex::new(Some(transport)),
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }

    /// Launches the supervisor worker. Idempotent: if a worker is already
    /// running (or the instance was already stopped) this is a logged no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            log::debug!("stream client already running");
            return;
        }
        let Some(receiver) = self
            .receiver
            .lock()
            .expect("stream receiver lock poisoned")
            .take()
        else {
            // A previous start/stop cycle consumed the queue; this instance
            // is spent.
            log::warn!("stream client already shut down; ignoring start");
            self.running.store(false, Ordering::SeqCst);
            return;
        };

        let Some(transport) = self
            .transport
            .lock()
            .expect("stream transport lock poisoned")
            .take()
        else {
            log::warn!("stream client already shut down; ignoring start");
            self.running.store(false, Ordering::SeqCst);
            return;
        };
        log::info!("starting stream worker ({})", transport.describe());
        let handle = tokio::spawn(supervisor::run(
            transport,
            receiver,
            Arc::clone(&self.running),
            self.config.clone(),
        ));
        *self.worker.lock().expect("stream worker lock poisoned") = Some(handle);
    }

    /// Queues one snapshot for transmission. Fire-and-forget: never blocks,
    /// never fails, regardless of queue size or connection state.
    pub fn enqueue(&self, snapshot: Snapshot) {
        self.sender.enqueue(snapshot);
    }

    /// Winds the worker down. Idempotent and bounded.
    ///
    /// Clears the running flag, queues the shutdown sentinel to unblock a
    /// worker parked on an empty queue, then waits up to the configured stop
    /// timeout for the worker to exit. On timeout the worker is abandoned
    /// (never force-killed); it will observe the cleared flag at its next
    /// check. A concurrent `stop` finds no worker handle and returns
    /// immediately.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.sender.enqueue_shutdown();

        let handle = self
            .worker
            .lock()
            .expect("stream worker lock poisoned")
            .take();
        if let Some(handle) = handle {
            match tokio::time::timeout(self.config.stop_timeout(), handle).await {
                Ok(_) => log::info!("stream worker shut down"),
                Err(_) => log::warn!(
                    "stream worker did not stop within {}ms; abandoning it",
                    self.config.stop_timeout_ms
                ),
            }
        }
    }

    /// Whether a worker is currently supposed to be running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Maps the configured endpoint to a transport strategy. Runs once, at
/// client construction.
fn select_transport(config: &StreamConfig) -> Box<dyn Transport> {
    match config.collector_url.as_deref() {
        Some(raw) => match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "ws" | "wss") => Box::new(WsTransport::new(raw)),
            Ok(url) => {
                log::warn!(
                    "unsupported collector scheme '{}'; falling back to log sink",
                    url.scheme()
                );
                Box::new(LogSink)
            }
            Err(e) => {
                log::warn!("invalid collector url '{raw}': {e}; falling back to log sink");
                Box::new(LogSink)
            }
        },
        None => {
            log::info!("no collector configured; state records will be logged locally");
            Box::new(LogSink)
        }
    }
}
