use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::{
  error::TraceError,
  handle::TraceHandle,
  library::TraceLibrary,
  packet::{Packet, TraceStats},
  uri::SourceUri,
};

#[derive(Debug, Error)]
pub enum CaptureError {
  #[error(transparent)]
  Trace(#[from] TraceError),
  #[error("capture thread failed: {0}")]
  Join(#[from] tokio::task::JoinError),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CaptureOptions {
  /// Stop after this many packets.
  pub limit: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureEnd {
  EndOfTrace,
  Limit,
  Stopped,
}

#[derive(Clone, Copy, Debug)]
pub struct CaptureSummary {
  pub packets: u64,
  pub bytes: u64,
  pub end: CaptureEnd,
  /// Counters read just before the handle was released, if it was.
  pub stats: Option<TraceStats>,
}

/// Read packets from `handle` until the trace ends, `options.limit` packets
/// have been seen, or `stop` is set. `stop` is checked between reads, so on a
/// live source it takes effect after the next packet arrives.
pub fn capture_blocking<L, F>(
  handle: &mut TraceHandle<L>,
  options: &CaptureOptions,
  stop: &AtomicBool,
  mut on_packet: F,
) -> Result<CaptureSummary, TraceError>
where
  L: TraceLibrary,
  F: FnMut(&Packet<'_>),
{
  let mut packets = 0u64;
  let mut bytes = 0u64;

  let end = loop {
    if stop.load(Ordering::Relaxed) {
      break CaptureEnd::Stopped;
    }
    if options.limit.is_some_and(|limit| packets >= limit) {
      break CaptureEnd::Limit;
    }
    let Some(packet) = handle.read_packet()? else {
      break CaptureEnd::EndOfTrace;
    };
    packets += 1;
    bytes += packet.capture_len as u64;
    on_packet(&packet);
  };

  debug!(uri = %handle.uri(), packets, bytes, ?end, "capture finished");
  Ok(CaptureSummary {
    packets,
    bytes,
    end,
    stats: None,
  })
}

/// Open `uri` and run `capture_blocking` on a tokio blocking thread.
///
/// The handle is opened, read and dropped on that one thread, so it never
/// crosses threads.
pub async fn capture_async<L, F>(
  library: L,
  uri: SourceUri,
  options: CaptureOptions,
  stop: Arc<AtomicBool>,
  on_packet: F,
) -> Result<CaptureSummary, CaptureError>
where
  L: TraceLibrary + Send + 'static,
  F: FnMut(&Packet<'_>) + Send + 'static,
{
  let summary = tokio::task::spawn_blocking(move || {
    let mut handle = TraceHandle::open_with(library, uri)?;
    info!(uri = %handle.uri(), "capturing");
    let mut summary = capture_blocking(&mut handle, &options, &stop, on_packet)?;
    summary.stats = handle.stats().ok();
    Ok::<_, TraceError>(summary)
  })
  .await??;
  Ok(summary)
}
