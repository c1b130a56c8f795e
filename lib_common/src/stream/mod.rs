//! # Real-time State-Streaming Client
//!
//! This module decouples a high-frequency local simulation loop from a remote
//! collector reachable over a persistent WebSocket connection. The producer
//! hands immutable state snapshots to a fire-and-forget queue; a single
//! background worker drains that queue and transmits each record, riding out
//! disconnects, an absent collector, and abrupt shutdown without ever
//! surfacing a failure into the game loop.
//!
//! ## Core Components:
//!
//! - **`snapshot`**: The immutable wire record (`Snapshot`) and the tagged
//!   queue message (`OutboundMessage`) including the shutdown sentinel.
//!
//! - **`queue`**: The thread-safe FIFO bridging the producer context and the
//!   transport worker. Enqueue never blocks; dequeue waits with a timeout so
//!   the worker can re-check its running flag without busy-spinning.
//!
//! - **`transport`**: The `Transport` strategy seam with two variants: a
//!   persistent WebSocket connection (`WsTransport`) and a degraded local
//!   sink (`LogSink`) used when no collector endpoint is available.
//!
//! - **`supervisor`**: The background state machine owning the
//!   connect/stream/reconnect loop and the connection lifecycle.
//!
//! - **`client`**: The producer-facing handle (`StreamClient`) with the
//!   idempotent `start`/`stop` lifecycle and the `enqueue` entry point.
//!
//! - **`cadence`**: The producer-side wall-clock send gate.
//!
//! - **`config`**: Tunable intervals and the collector endpoint.
//!
//! All failure handling lives on the worker side of the queue: connection
//! errors become reconnect attempts, serialization errors drop a single
//! record, and queue faults drop the offending snapshot. The only observable
//! failure mode from the outside is that no data arrived at the collector.

#![forbid(unsafe_code)]

/// Producer-side wall-clock throttle for snapshot production.
pub mod cadence;
/// The producer-facing client handle and lifecycle controller.
pub mod client;
/// Tunable intervals and collector endpoint configuration.
pub mod config;
/// The thread-safe FIFO between producer and transport worker.
pub mod queue;
/// The immutable state record and the queue message envelope.
pub mod snapshot;
/// The connect/stream/reconnect state machine.
pub mod supervisor;
/// Transport strategies: real WebSocket connection or local log sink.
pub mod transport;

// --- Public API Re-exports ---
// Make the primary types directly accessible.
pub use cadence::SendGate;
pub use client::StreamClient;
pub use config::StreamConfig;
pub use queue::{QueueReceiver, QueueSender};
pub use snapshot::{OutboundMessage, Snapshot};
pub use supervisor::ConnectionState;
pub use transport::{LogSink, Transport, TransportError, WsTransport};
