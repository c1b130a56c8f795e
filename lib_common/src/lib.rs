// Declare the modules to re-export
#[cfg(feature = "loggers")]
pub mod loggers; // Shared fern logging setup for the binaries
#[cfg(feature = "stream")]
pub mod stream; // Real-time state-streaming client

// Re-export the primary client surface so binaries can
// `use lib_common::{StreamClient, StreamConfig, Snapshot};`
#[cfg(feature = "stream")]
pub use stream::{SendGate, Snapshot, StreamClient, StreamConfig};
#[cfg(feature = "loggers")]
pub use loggers::setup_logging;
