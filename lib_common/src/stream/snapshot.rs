//! The immutable state record sent to the collector, and the envelope it
//! travels in on the outbound queue.

use serde::{Deserialize, Serialize};

/// One point-in-time record of producer state destined for transmission.
///
/// Serialized as a single JSON object per WebSocket text frame:
/// `{"x":..,"y":..,"health":..,"inventory":[..],"timestamp":..}`.
/// Immutable once created; the outbound queue owns it until it is consumed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Player x position, in world pixels.
    pub x: i32,
    /// Player y position, in world pixels.
    pub y: i32,
    /// Current health. 0-100 by convention; not enforced here.
    pub health: i32,
    /// Ordered item names currently held.
    pub inventory: Vec<String>,
    /// Unix seconds with sub-second precision, taken when the snapshot was built.
    pub timestamp: f64,
}

impl Snapshot {
    /// Builds a snapshot stamped with the current wall-clock time.
    pub fn now(x: i32, y: i32, health: i32, inventory: Vec<String>) -> Self {
        Self {
            x,
            y,
            health,
            inventory,
            timestamp: unix_now(),
        }
    }
}

/// Current wall-clock time as floating-point unix seconds.
pub fn unix_now() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1e6
}

/// Tagged message flowing through the outbound queue.
///
/// The `Shutdown` variant carries no payload; it exists solely to unblock a
/// worker waiting on an empty queue so it can observe the cleared running
/// flag and exit.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// A snapshot to serialize and transmit.
    State(Snapshot),
    /// Shutdown sentinel.
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_serializes_wire_fields() {
        let snap = Snapshot {
            x: 640,
            y: 360,
            health: 87,
            inventory: vec!["potion".to_string(), "berry".to_string()],
            timestamp: 1724999999.25,
        };
        let json: serde_json::Value = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["x"], 640);
        assert_eq!(json["y"], 360);
        assert_eq!(json["health"], 87);
        assert_eq!(json["inventory"][0], "potion");
        assert_eq!(json["inventory"][1], "berry");
        assert!((json["timestamp"].as_f64().unwrap() - 1724999999.25).abs() < 1e-9);
    }

    #[test]
    fn test_now_stamps_current_time() {
        let before = unix_now();
        let snap = Snapshot::now(0, 0, 100, Vec::new());
        let after = unix_now();
        assert!(snap.timestamp >= before && snap.timestamp <= after);
    }
}
