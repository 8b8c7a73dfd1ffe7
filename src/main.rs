use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use anyhow::{Context, Result};
use clap::Parser;
use pkttrace::{
  CaptureOptions, Libtrace, Packet, SourceUri,
  capture::{CaptureEnd, capture_async},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "pkttrace")]
#[command(about = "Read packets from a libtrace URI and print one line per packet", long_about = None)]
#[command(version)]
struct Cli {
  /// Trace source, e.g. pcapfile:/tmp/dump.pcap, int:eth0, rt:host:3434
  uri: String,

  /// Stop after this many packets
  #[arg(short = 'c', long, env = "PKTTRACE_COUNT")]
  count: Option<u64>,

  /// Leading bytes of each packet to print as hex
  #[arg(long = "hex", env = "PKTTRACE_HEX", default_value_t = 16)]
  hex_bytes: usize,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(filter)
    .init();

  let uri = SourceUri::new(&cli.uri).with_context(|| format!("bad trace uri {:?}", cli.uri))?;
  let options = CaptureOptions { limit: cli.count };
  let stop = Arc::new(AtomicBool::new(false));
  let hex_bytes = cli.hex_bytes;
  let mut index = 0u64;

  let capture = capture_async(Libtrace, uri.clone(), options, stop.clone(), move |packet| {
    index += 1;
    print_packet(index, packet, hex_bytes);
  });
  tokio::pin!(capture);

  let result = tokio::select! {
    res = &mut capture => res,
    Ok(()) = tokio::signal::ctrl_c() => {
      info!("interrupted, stopping after the current packet");
      stop.store(true, Ordering::Relaxed);
      capture.await
    }
  };
  let summary = result.with_context(|| format!("reading {uri} failed"))?;

  let reason = match summary.end {
    CaptureEnd::EndOfTrace => "end of trace",
    CaptureEnd::Limit => "packet limit",
    CaptureEnd::Stopped => "interrupted",
  };
  println!(
    "--- {} packets, {} bytes ({reason})",
    summary.packets, summary.bytes
  );
  if let Some(stats) = summary.stats {
    println!("--- {stats}");
  }
  Ok(())
}

fn print_packet(index: u64, packet: &Packet<'_>, hex_bytes: usize) {
  let ts = packet.timestamp;
  print!(
    "{index:>6} {}.{:06} {} caplen={} len={}",
    ts.as_secs(),
    ts.subsec_micros(),
    packet.link_type,
    packet.capture_len,
    packet.wire_len
  );
  if hex_bytes > 0 && !packet.data.is_empty() {
    print!(" {}", hex::encode(packet.head(hex_bytes)));
  }
  println!();
}
