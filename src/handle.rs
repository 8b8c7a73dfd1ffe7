use std::{fmt, ptr::NonNull};

use tracing::{debug, trace, warn};

#[cfg(feature = "native")]
use crate::library::Libtrace;
use crate::{
  error::{Resource, TraceError},
  ffi::{libtrace_packet_t, libtrace_t},
  library::{Counter, TraceLibrary},
  packet::{LinkType, Packet, TraceStats, erf_to_duration, known_counter},
  uri::SourceUri,
};

#[derive(Clone, Copy)]
struct NativeHandles {
  trace: NonNull<libtrace_t>,
  packet: NonNull<libtrace_packet_t>,
}

/// An open libtrace input trace together with the packet buffer reads go into.
///
/// Both native handles are allocated by `open` and released together, packet
/// buffer first, by `close` or when the handle is dropped. The handle holds
/// raw pointers and is therefore neither `Send` nor `Sync`; open one handle
/// per thread.
pub struct TraceHandle<L: TraceLibrary> {
  uri: SourceUri,
  library: L,
  native: Option<NativeHandles>,
  started: bool,
}

#[cfg(feature = "native")]
impl TraceHandle<Libtrace> {
  /// Open `uri` (e.g. `pcapfile:/tmp/dump.pcap`, `int:eth0`, `rt:host:port`)
  /// with the system libtrace.
  pub fn open(uri: &str) -> Result<Self, TraceError> {
    Self::open_with(Libtrace, uri)
  }
}

impl<L: TraceLibrary> TraceHandle<L> {
  /// Open `uri` through `library`.
  ///
  /// Either both native handles are acquired or none are: if libtrace fails
  /// partway, whatever was already created is destroyed before the error is
  /// returned.
  pub fn open_with<U>(library: L, uri: U) -> Result<Self, TraceError>
  where
    U: TryInto<SourceUri>,
    TraceError: From<U::Error>,
  {
    let uri = uri.try_into()?;

    let Some(trace) = NonNull::new(library.create_trace(uri.as_c_str())) else {
      warn!(%uri, "trace_create returned null");
      return Err(TraceError::Allocation(Resource::Trace));
    };

    // libtrace hands back a trace even for unusable uris; the failure is in
    // its error state.
    if let Some(error) = unsafe { library.take_error(trace) } {
      warn!(%uri, %error, "trace_create failed");
      unsafe { library.destroy_trace(trace) };
      return Err(TraceError::Library { uri, error });
    }

    let Some(packet) = NonNull::new(library.create_packet()) else {
      warn!(%uri, "trace_create_packet returned null, releasing trace");
      unsafe { library.destroy_trace(trace) };
      return Err(TraceError::Allocation(Resource::Packet));
    };

    debug!(%uri, "opened trace");
    Ok(Self {
      uri,
      library,
      native: Some(NativeHandles { trace, packet }),
      started: false,
    })
  }

  pub fn uri(&self) -> &SourceUri {
    &self.uri
  }

  pub fn library(&self) -> &L {
    &self.library
  }

  pub fn is_open(&self) -> bool {
    self.native.is_some()
  }

  pub fn is_started(&self) -> bool {
    self.started
  }

  /// The native `libtrace_t`, for pass-through calls this crate doesn't wrap.
  pub fn trace_ptr(&self) -> Result<NonNull<libtrace_t>, TraceError> {
    Ok(self.native()?.trace)
  }

  /// The native `libtrace_packet_t` that reads are written into.
  pub fn packet_ptr(&self) -> Result<NonNull<libtrace_packet_t>, TraceError> {
    Ok(self.native()?.packet)
  }

  /// Release the packet buffer and then the trace. Calling it again is a no-op.
  pub fn close(&mut self) {
    let Some(native) = self.native.take() else {
      return;
    };
    self.started = false;
    unsafe {
      self.library.destroy_packet(native.packet);
      self.library.destroy_trace(native.trace);
    }
    debug!(uri = %self.uri, "closed trace");
  }

  /// `trace_start`. A no-op when already started.
  pub fn start(&mut self) -> Result<(), TraceError> {
    let native = self.native()?;
    if self.started {
      return Ok(());
    }
    let code = unsafe { self.library.start(native.trace) };
    if code < 0 {
      return Err(self.call_error("trace_start", code, native.trace));
    }
    self.started = true;
    debug!(uri = %self.uri, "started trace");
    Ok(())
  }

  /// `trace_pause`. A no-op unless started.
  pub fn pause(&mut self) -> Result<(), TraceError> {
    let native = self.native()?;
    if !self.started {
      return Ok(());
    }
    let code = unsafe { self.library.pause(native.trace) };
    if code < 0 {
      return Err(self.call_error("trace_pause", code, native.trace));
    }
    self.started = false;
    debug!(uri = %self.uri, "paused trace");
    Ok(())
  }

  /// Read the next packet into the packet buffer, starting the trace first if
  /// needed. `Ok(None)` at end of trace.
  ///
  /// On live sources this blocks until a packet arrives.
  pub fn read_packet(&mut self) -> Result<Option<Packet<'_>>, TraceError> {
    let native = self.native()?;
    if !self.started {
      self.start()?;
    }

    let code = unsafe { self.library.read_packet(native.trace, native.packet) };
    if code == 0 {
      trace!(uri = %self.uri, "end of trace");
      return Ok(None);
    }
    if code < 0 {
      return Err(self.call_error("trace_read_packet", code, native.trace));
    }

    let raw = unsafe { self.library.packet_buffer(native.packet) };
    let data: &[u8] = if raw.data.is_null() || raw.remaining == 0 {
      &[]
    } else {
      // Valid until the next read or close, both of which need `&mut self`.
      unsafe { std::slice::from_raw_parts(raw.data, raw.remaining as usize) }
    };

    let packet = unsafe {
      Packet {
        data,
        link_type: LinkType::from_raw(raw.link_type),
        capture_len: self.library.capture_length(native.packet),
        wire_len: self.library.wire_length(native.packet),
        timestamp: erf_to_duration(self.library.erf_timestamp(native.packet)),
      }
    };
    Ok(Some(packet))
  }

  pub fn stats(&self) -> Result<TraceStats, TraceError> {
    let trace = self.native()?.trace;
    let count = |counter| known_counter(unsafe { self.library.counter(trace, counter) });
    Ok(TraceStats {
      received: count(Counter::Received),
      filtered: count(Counter::Filtered),
      dropped: count(Counter::Dropped),
      accepted: count(Counter::Accepted),
    })
  }

  fn native(&self) -> Result<NativeHandles, TraceError> {
    self.native.ok_or(TraceError::UseAfterClose)
  }

  fn call_error(&self, call: &'static str, code: i32, trace: NonNull<libtrace_t>) -> TraceError {
    match unsafe { self.library.take_error(trace) } {
      Some(error) => {
        warn!(uri = %self.uri, %error, "{call} failed");
        TraceError::Library {
          uri: self.uri.clone(),
          error,
        }
      }
      None => {
        warn!(uri = %self.uri, code, "{call} failed");
        TraceError::Call { call, code }
      }
    }
  }
}

impl<L: TraceLibrary> Drop for TraceHandle<L> {
  fn drop(&mut self) {
    self.close();
  }
}

impl<L: TraceLibrary> fmt::Debug for TraceHandle<L> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TraceHandle")
      .field("uri", &self.uri)
      .field("open", &self.is_open())
      .field("started", &self.started)
      .finish()
  }
}
