//! Manual end-to-end probe: streams a short synthetic run against a live
//! collector (start `server_collect` first) and reports what was enqueued.
//! For the automated version of this flow see `tests/stream_integration.rs`.

use std::time::Duration;

use clap::Parser;
use lib_common::{SendGate, Snapshot, StreamClient, StreamConfig};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Collector WebSocket URL
    #[clap(long, default_value = "ws://127.0.0.1:8508/ws")]
    url: String,

    /// How many snapshots to stream
    #[clap(short, long, default_value_t = 10)]
    count: u32,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = StreamConfig::with_url(args.url.clone());
    let send_interval = config.send_interval();
    let client = StreamClient::new(config);
    client.start();

    let mut gate = SendGate::new(send_interval);
    let mut sent = 0u32;
    let mut x = 0;

    println!("Streaming {} snapshot(s) to {} ...", args.count, args.url);
    while sent < args.count {
        if gate.ready() {
            x += 10;
            client.enqueue(Snapshot::now(x, x / 2, 100 - (sent as i32), vec![]));
            sent += 1;
            println!("enqueued snapshot {sent}/{} (x={x})", args.count);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // Give the worker a moment to drain, then shut down within the bound.
    tokio::time::sleep(Duration::from_millis(500)).await;
    client.stop().await;
    println!("Done. Check the collector log for {sent} received frame(s).");
}
