//! # Transport Supervisor
//!
//! The background state machine that owns the connection lifecycle. One
//! supervisor task per client: it connects, drains the outbound queue while
//! the connection holds, and converts every transport failure into a
//! reconnect attempt after a fixed delay. Reconnection is unconditional and
//! unbounded for as long as the running flag is set; the producer never
//! hears about any of it.
//!
//! Shutdown is cooperative. The worker re-checks the running flag every time
//! a dequeue times out, and a shutdown sentinel on the queue unblocks a
//! worker that is parked on an empty queue, so worst-case shutdown latency
//! is one dequeue timeout plus any in-flight send.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::time::sleep;

use super::config::StreamConfig;
use super::queue::QueueReceiver;
use super::snapshot::OutboundMessage;
use super::transport::Transport;

/// Connection lifecycle states. Owned exclusively by the supervisor task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Constructed, not yet started.
    Idle,
    /// A connection attempt is in flight.
    Connecting,
    /// Connected; draining the queue and transmitting.
    Streaming,
    /// Waiting out the fixed delay before the next attempt.
    Reconnecting,
    /// The loop has exited; no further transmission occurs.
    Stopped,
}

/// Why the streaming phase ended.
enum StreamOutcome {
    /// The running flag was cleared or the shutdown sentinel arrived.
    Shutdown,
    /// A send failed; the connection must be rebuilt.
    ConnectionLost,
}

/// The supervisor loop. Runs until the running flag is cleared or the
/// shutdown sentinel is observed, then closes the transport and returns.
pub async fn run(
    mut transport: Box<dyn Transport>,
    mut queue: QueueReceiver,
    running: Arc<AtomicBool>,
    config: StreamConfig,
) {
    let mut state = ConnectionState::Idle;

    while running.load(Ordering::SeqCst) {
        transition(&mut state, ConnectionState::Connecting);
        match transport.connect().await {
            Ok(()) => {
                transition(&mut state, ConnectionState::Streaming);
                match stream(transport.as_mut(), &mut queue, &running, &config).await {
                    StreamOutcome::Shutdown => break,
                    StreamOutcome::ConnectionLost => {
                        transport.close().await;
                        transition(&mut state, ConnectionState::Reconnecting);
                        sleep(config.reconnect_delay()).await;
                    }
                }
            }
            Err(e) => {
                log::warn!(
                    "{} connect failed: {e}; retrying in {}ms",
                    transport.describe(),
                    config.reconnect_delay_ms
                );
                transition(&mut state, ConnectionState::Reconnecting);
                sleep(config.reconnect_delay()).await;
            }
        }
    }

    transport.close().await;
    transition(&mut state, ConnectionState::Stopped);
    log::info!("transport worker stopped");
}

/// Drains the queue over a live connection.
///
/// Serialization failures drop the offending record only; send failures end
/// the phase so the caller can rebuild the connection. The record whose send
/// failed is dropped, not requeued, which keeps delivery free of duplicates
/// and reordering.
async fn stream(
    transport: &mut dyn Transport,
    queue: &mut QueueReceiver,
    running: &AtomicBool,
    config: &StreamConfig,
) -> StreamOutcome {
    loop {
        if !running.load(Ordering::SeqCst) {
            return StreamOutcome::Shutdown;
        }
        match queue.dequeue(config.dequeue_timeout()).await {
            // Timed out; loop around and re-check the running flag.
            None => continue,
            Some(OutboundMessage::Shutdown) => return StreamOutcome::Shutdown,
            Some(OutboundMessage::State(snapshot)) => {
                let payload = match serde_json::to_string(&snapshot) {
                    Ok(payload) => payload,
                    Err(e) => {
                        log::warn!("dropping unserializable snapshot: {e}");
                        continue;
                    }
                };
                if let Err(e) = transport.send(payload).await {
                    log::warn!("send failed: {e}; will reconnect");
                    return StreamOutcome::ConnectionLost;
                }
            }
        }
    }
}

fn transition(state: &mut ConnectionState, next: ConnectionState) {
    if *state != next {
        log::debug!("connection state: {:?} -> {:?}", *state, next);
        *state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::queue;
    use crate::stream::snapshot::Snapshot;
    use crate::stream::transport::TransportError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory transport driven by scripted connect/send results.
    /// An exhausted script means "succeed".
    struct ScriptedTransport {
        connect_script: Mutex<VecDeque<Result<(), TransportError>>>,
        send_script: Mutex<VecDeque<Result<(), TransportError>>>,
        connects: Arc<AtomicUsize>,
        delivered: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedTransport {
        fn new(
            connect_script: Vec<Result<(), TransportError>>,
            send_script: Vec<Result<(), TransportError>>,
        ) -> (Box<Self>, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
            let connects = Arc::new(AtomicUsize::new(0));
            let delivered = Arc::new(Mutex::new(Vec::new()));
            let transport = Box::new(Self {
                connect_script: Mutex::new(connect_script.into()),
                send_script: Mutex::new(send_script.into()),
                connects: Arc::clone(&connects),
                delivered: Arc::clone(&delivered),
            });
            (transport, connects, delivered)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn connect(&mut self) -> Result<(), TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            self.connect_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(()))
        }

        async fn send(&mut self, payload: String) -> Result<(), TransportError> {
            let scripted = self.send_script.lock().unwrap().pop_front().unwrap_or(Ok(()));
            if scripted.is_ok() {
                self.delivered.lock().unwrap().push(payload);
            }
            scripted
        }

        async fn close(&mut self) {}

        fn describe(&self) -> &'static str {
            "scripted"
        }
    }

    fn fast_config() -> StreamConfig {
        StreamConfig {
            dequeue_timeout_ms: 20,
            reconnect_delay_ms: 10,
            ..StreamConfig::default()
        }
    }

    fn snap(x: i32) -> Snapshot {
        Snapshot {
            x,
            y: x * 2,
            health: 100,
            inventory: Vec::new(),
            timestamp: f64::from(x),
        }
    }

    #[tokio::test]
    async fn test_streams_snapshots_in_enqueue_order() {
        let (transport, connects, delivered) = ScriptedTransport::new(vec![], vec![]);
        let (tx, rx) = queue::channel();
        for x in 0..3 {
            tx.enqueue(snap(x));
        }
        tx.enqueue_shutdown();

        run(transport, rx, Arc::new(AtomicBool::new(true)), fast_config()).await;

        let sent = delivered.lock().unwrap().clone();
        assert_eq!(sent.len(), 3);
        for (i, payload) in sent.iter().enumerate() {
            let value: serde_json::Value = serde_json::from_str(payload).unwrap();
            assert_eq!(value["x"], i as i32);
        }
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_connects_retry_then_stream_in_order() {
        // Two refused attempts, then success: exactly three connects, and
        // everything queued while disconnected flushes in order.
        let (transport, connects, delivered) = ScriptedTransport::new(
            vec![
                Err(TransportError::Connect("refused".into())),
                Err(TransportError::Connect("refused".into())),
            ],
            vec![],
        );
        let (tx, rx) = queue::channel();
        for x in 0..3 {
            tx.enqueue(snap(x));
        }
        tx.enqueue_shutdown();

        run(transport, rx, Arc::new(AtomicBool::new(true)), fast_config()).await;

        assert_eq!(connects.load(Ordering::SeqCst), 3);
        let sent = delivered.lock().unwrap().clone();
        let xs: Vec<i64> = sent
            .iter()
            .map(|p| serde_json::from_str::<serde_json::Value>(p).unwrap()["x"]
                .as_i64()
                .unwrap())
            .collect();
        assert_eq!(xs, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_send_failure_drops_record_and_reconnects() {
        let (transport, connects, delivered) =
            ScriptedTransport::new(vec![], vec![Err(TransportError::Send("broken pipe".into()))]);
        let (tx, rx) = queue::channel();
        tx.enqueue(snap(1));
        tx.enqueue(snap(2));
        tx.enqueue_shutdown();

        run(transport, rx, Arc::new(AtomicBool::new(true)), fast_config()).await;

        // The first record is lost with the connection; the second arrives
        // on the rebuilt one. No duplicates, no reordering.
        let sent = delivered.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(value["x"], 2);
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_nothing_transmitted_after_sentinel() {
        let (transport, _connects, delivered) = ScriptedTransport::new(vec![], vec![]);
        let (tx, rx) = queue::channel();
        tx.enqueue(snap(1));
        tx.enqueue_shutdown();
        tx.enqueue(snap(2)); // queued after the sentinel; must never go out

        run(transport, rx, Arc::new(AtomicBool::new(true)), fast_config()).await;

        assert_eq!(delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cleared_flag_exits_without_connecting() {
        let (transport, connects, _delivered) = ScriptedTransport::new(vec![], vec![]);
        let (_tx, rx) = queue::channel();

        run(transport, rx, Arc::new(AtomicBool::new(false)), fast_config()).await;

        assert_eq!(connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_flag_clear_observed_at_dequeue_timeout() {
        let (transport, _connects, delivered) = ScriptedTransport::new(vec![], vec![]);
        let (tx, rx) = queue::channel();
        let running = Arc::new(AtomicBool::new(true));

        let handle = tokio::spawn(run(transport, rx, Arc::clone(&running), fast_config()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        running.store(false, Ordering::SeqCst);

        tokio::time::timeout(Duration::from_millis(500), handle)
            .await
            .expect("worker did not observe the cleared flag")
            .unwrap();
        assert!(delivered.lock().unwrap().is_empty());
        drop(tx);
    }
}
