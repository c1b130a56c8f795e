//! # Synthetic Producer
//!
//! Stands in for the game loop: ticks at a fixed rate, random-walks a player
//! around a bounded arena, decays health, picks up the occasional item, and
//! feeds snapshots to the streaming client through the 0.5 s send gate —
//! exactly the way the real simulation drives it. Useful for soaking a
//! collector (run `server_collect` first) or, with `--offline`, for watching
//! the log-sink fallback behave.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use lib_common::{SendGate, Snapshot, StreamClient, StreamConfig};
use rand::Rng;
use tokio::signal;

const ARENA_W: i32 = 1280;
const ARENA_H: i32 = 720;
const HEALTH_MAX: i32 = 100;

#[derive(Parser, Debug)]
#[clap(about = "Synthetic game-loop producer for the PlayStream client", version)]
struct Args {
    /// Collector WebSocket URL
    #[clap(long, env = "PLAYSTREAM_URL", default_value = "ws://127.0.0.1:8508/ws")]
    url: String,

    /// Run without a collector; snapshots go to the log sink
    #[clap(long)]
    offline: bool,

    /// Simulation tick rate in Hz
    #[clap(long, default_value_t = 60)]
    tick_hz: u64,

    /// Stop after this many seconds (0 = run until Ctrl+C)
    #[clap(long, default_value_t = 0)]
    duration_secs: u64,

    /// Directory for log files
    #[clap(long, env = "PLAYSTREAM_LOG_DIR", default_value = "./logs")]
    log_dir: PathBuf,

    /// Logging level (trace, debug, info, warn, error)
    #[clap(long, env = "PLAYSTREAM_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Tick period for the simulation loop. Stays non-zero for any rate:
/// sub-millisecond periods are kept (whole milliseconds would round
/// down to zero above 1000 Hz), and the rate itself is clamped to a
/// range whose period survives nanosecond rounding.
fn tick_period(tick_hz: u64) -> Duration {
    Duration::from_secs_f64(1.0 / tick_hz.clamp(1, 1_000_000) as f64)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    lib_common::setup_logging("sim_player", &args.log_dir, &args.log_level)?;

    let config = if args.offline {
        StreamConfig::offline()
    } else {
        StreamConfig::with_url(args.url.clone())
    };
    let send_interval = config.send_interval();

    let client = StreamClient::new(config);
    client.start();

    let mut gate = SendGate::new(send_interval);
    let mut rng = rand::rng();

    let mut x = ARENA_W / 2;
    let mut y = ARENA_H / 2;
    let mut health = HEALTH_MAX;
    let mut inventory: Vec<String> = Vec::new();

    let mut ticker = tokio::time::interval(tick_period(args.tick_hz));
    let deadline = (args.duration_secs > 0)
        .then(|| tokio::time::Instant::now() + Duration::from_secs(args.duration_secs));

    log::info!(
        "Simulation running at {} Hz ({})",
        args.tick_hz,
        if args.offline { "offline" } else { &args.url }
    );

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                log::info!("Ctrl-C received, stopping simulation.");
                break;
            }
            _ = ticker.tick() => {
                if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                    log::info!("Run duration elapsed, stopping simulation.");
                    break;
                }

                // Random walk, clamped to the arena.
                x = (x + rng.random_range(-6..=6)).clamp(0, ARENA_W);
                y = (y + rng.random_range(-6..=6)).clamp(0, ARENA_H);

                // Slow decay with occasional pickups that heal.
                if rng.random_range(0..240) == 0 && health > 0 {
                    health -= 1;
                }
                if rng.random_range(0..600) == 0 {
                    let item = ["berry", "potion", "antidote"][rng.random_range(0..3)];
                    inventory.push(item.to_string());
                    health = (health + 5).min(HEALTH_MAX);
                    log::debug!("picked up {item}");
                }

                // Producer-side cadence: at most one snapshot per gate interval,
                // regardless of tick rate.
                if gate.ready() {
                    client.enqueue(Snapshot::now(x, y, health, inventory.clone()));
                }
            }
        }
    }

    client.stop().await;
    log::info!("Simulation stopped.");
    Ok(())
}
