//! # Outbound Queue
//!
//! The only data shared between the producer context and the transport
//! worker: an unbounded FIFO split into a cloneable sender half and a
//! worker-owned receiver half.
//!
//! The contract is asymmetric by design. `enqueue` must never block and never
//! fail the caller, whatever the queue size or connection state; an internal
//! fault drops the snapshot with a logged warning. `dequeue` waits up to a
//! caller-supplied timeout so the worker can periodically re-check its
//! running flag instead of parking forever on an empty queue.
//!
//! The queue is intentionally unbounded: a sustained disconnect accumulates
//! memory rather than applying backpressure to the game loop. That trade-off
//! is a documented limitation of the system, not an oversight here.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use super::snapshot::{OutboundMessage, Snapshot};

/// Creates the paired producer and worker halves of the outbound queue.
pub fn channel() -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (QueueSender { tx }, QueueReceiver { rx })
}

/// Producer half. Cheap to clone; every operation is non-blocking.
#[derive(Clone)]
pub struct QueueSender {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl QueueSender {
    /// Queues a snapshot for transmission.
    ///
    /// Never blocks and never returns an error: if the worker side is gone
    /// the snapshot is dropped and a warning is logged. Producer correctness
    /// must never depend on delivery.
    pub fn enqueue(&self, snapshot: Snapshot) {
        if self.tx.send(OutboundMessage::State(snapshot)).is_err() {
            log::warn!("failed to queue state: transport worker is gone");
        }
    }

    /// Queues the shutdown sentinel to unblock a waiting worker. Best-effort.
    pub fn enqueue_shutdown(&self) {
        let _ = self.tx.send(OutboundMessage::Shutdown);
    }
}

/// Worker half. Owned exclusively by the transport supervisor.
pub struct QueueReceiver {
    rx: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl QueueReceiver {
    /// Waits up to `wait` for the next message.
    ///
    /// Returns `None` on timeout. A closed channel (every sender dropped) is
    /// reported as `OutboundMessage::Shutdown` so the worker winds down
    /// instead of spinning on a dead queue.
    pub async fn dequeue(&mut self, wait: Duration) -> Option<OutboundMessage> {
        match timeout(wait, self.rx.recv()).await {
            Err(_) => None, // Timed out; caller re-checks its running flag.
            Ok(Some(msg)) => Some(msg),
            Ok(None) => Some(OutboundMessage::Shutdown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(x: i32) -> Snapshot {
        Snapshot {
            x,
            y: 0,
            health: 100,
            inventory: Vec::new(),
            timestamp: 0.0,
        }
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, mut rx) = channel();
        for x in 0..5 {
            tx.enqueue(snap(x));
        }
        for x in 0..5 {
            match rx.dequeue(Duration::from_millis(100)).await {
                Some(OutboundMessage::State(s)) => assert_eq!(s.x, x),
                other => panic!("expected snapshot {x}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_dequeue_times_out_on_empty_queue() {
        let (_tx, mut rx) = channel();
        let got = rx.dequeue(Duration::from_millis(20)).await;
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_closed_channel_reads_as_shutdown() {
        let (tx, mut rx) = channel();
        drop(tx);
        let got = rx.dequeue(Duration::from_millis(100)).await;
        assert_eq!(got, Some(OutboundMessage::Shutdown));
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_gone_does_not_panic() {
        let (tx, rx) = channel();
        drop(rx);
        tx.enqueue(snap(1));
        tx.enqueue_shutdown();
    }

    #[tokio::test]
    async fn test_bulk_enqueue_never_blocks() {
        // 10k snapshots with no consumer running; every enqueue must
        // return immediately.
        let (tx, mut rx) = channel();
        for x in 0..10_000 {
            tx.enqueue(snap(x));
        }
        // Spot-check that ordering survived the burst.
        match rx.dequeue(Duration::from_millis(100)).await {
            Some(OutboundMessage::State(s)) => assert_eq!(s.x, 0),
            other => panic!("expected first snapshot, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sentinel_interleaves_in_order() {
        let (tx, mut rx) = channel();
        tx.enqueue(snap(7));
        tx.enqueue_shutdown();
        assert!(matches!(
            rx.dequeue(Duration::from_millis(100)).await,
            Some(OutboundMessage::State(_))
        ));
        assert_eq!(
            rx.dequeue(Duration::from_millis(100)).await,
            Some(OutboundMessage::Shutdown)
        );
    }
}
