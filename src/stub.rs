//! Recording `TraceLibrary` used by the unit tests.
//!
//! Handles are fake addresses that are never dereferenced. Every call is
//! appended to a shared log so tests can assert on exact native call order
//! after the handle under test has been dropped.

use std::{
  collections::VecDeque,
  ffi::CStr,
  os::raw::c_int,
  ptr::NonNull,
  sync::{Arc, Mutex, MutexGuard},
};

use crate::{
  error::LibraryError,
  ffi::{libtrace_packet_t, libtrace_t},
  library::{Counter, RawBuffer, TraceLibrary},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Call {
  CreateTrace(String),
  DestroyTrace(usize),
  CreatePacket,
  DestroyPacket(usize),
  TakeError(usize),
  Start(usize),
  Pause(usize),
  Read { trace: usize, packet: usize },
  Counter(Counter),
}

impl Call {
  pub(crate) fn is_destroy(&self) -> bool {
    matches!(self, Call::DestroyTrace(_) | Call::DestroyPacket(_))
  }
}

#[derive(Clone, Debug)]
pub(crate) struct StubPacket {
  pub data: Vec<u8>,
  pub link_type: c_int,
  pub wire_len: usize,
  pub erf: u64,
}

impl StubPacket {
  pub(crate) fn ethernet(data: &[u8], erf: u64) -> Self {
    Self {
      data: data.to_vec(),
      link_type: 2,
      wire_len: data.len(),
      erf,
    }
  }
}

#[derive(Default)]
struct StubState {
  calls: Vec<Call>,
  next_addr: usize,
  fail_trace: bool,
  fail_packet: bool,
  trace_error: Option<LibraryError>,
  start_error: Option<(c_int, Option<LibraryError>)>,
  pause_error: Option<(c_int, Option<LibraryError>)>,
  packets: VecDeque<StubPacket>,
  read_error: Option<(c_int, Option<LibraryError>)>,
  current: Option<StubPacket>,
  counters: Vec<(Counter, u64)>,
}

impl StubState {
  /// `0`, or the configured failure code after setting its error state.
  fn fail(&mut self, failure: Option<(c_int, Option<LibraryError>)>) -> c_int {
    match failure {
      Some((code, error)) => {
        self.trace_error = error;
        code
      }
      None => 0,
    }
  }
}

#[derive(Clone, Default)]
pub(crate) struct StubLibrary {
  state: Arc<Mutex<StubState>>,
}

impl StubLibrary {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  fn state(&self) -> MutexGuard<'_, StubState> {
    self.state.lock().expect("stub state lock")
  }

  pub(crate) fn failing_trace(self) -> Self {
    self.state().fail_trace = true;
    self
  }

  pub(crate) fn failing_packet(self) -> Self {
    self.state().fail_packet = true;
    self
  }

  pub(crate) fn with_trace_error(self, code: i32, problem: &str) -> Self {
    self.state().trace_error = Some(LibraryError::new(code, problem));
    self
  }

  /// Fail `trace_start` with `code`, optionally setting the trace error state.
  pub(crate) fn with_start_error(self, code: c_int, error: Option<LibraryError>) -> Self {
    self.state().start_error = Some((code, error));
    self
  }

  pub(crate) fn with_pause_error(self, code: c_int, error: Option<LibraryError>) -> Self {
    self.state().pause_error = Some((code, error));
    self
  }

  pub(crate) fn with_packets(self, packets: impl IntoIterator<Item = StubPacket>) -> Self {
    self.state().packets.extend(packets);
    self
  }

  /// Fail reads with `code` once the queued packets run out.
  pub(crate) fn with_read_error(self, code: c_int, error: Option<LibraryError>) -> Self {
    self.state().read_error = Some((code, error));
    self
  }

  pub(crate) fn with_counter(self, counter: Counter, value: u64) -> Self {
    self.state().counters.push((counter, value));
    self
  }

  pub(crate) fn calls(&self) -> Vec<Call> {
    self.state().calls.clone()
  }

  pub(crate) fn destroy_calls(&self) -> Vec<Call> {
    self.calls().into_iter().filter(Call::is_destroy).collect()
  }

  fn record(&self, call: Call) {
    self.state().calls.push(call);
  }

  fn alloc<T>(&self) -> *mut T {
    let mut state = self.state();
    state.next_addr += 0x10;
    std::ptr::without_provenance_mut(0x1000 + state.next_addr)
  }
}

// Buffers point into `current`, which is only replaced by the next read.
unsafe impl TraceLibrary for StubLibrary {
  fn create_trace(&self, uri: &CStr) -> *mut libtrace_t {
    self.record(Call::CreateTrace(uri.to_string_lossy().into_owned()));
    if self.state().fail_trace {
      return std::ptr::null_mut();
    }
    self.alloc()
  }

  unsafe fn destroy_trace(&self, trace: NonNull<libtrace_t>) {
    self.record(Call::DestroyTrace(trace.as_ptr().addr()));
  }

  fn create_packet(&self) -> *mut libtrace_packet_t {
    self.record(Call::CreatePacket);
    if self.state().fail_packet {
      return std::ptr::null_mut();
    }
    self.alloc()
  }

  unsafe fn destroy_packet(&self, packet: NonNull<libtrace_packet_t>) {
    self.record(Call::DestroyPacket(packet.as_ptr().addr()));
  }

  unsafe fn take_error(&self, trace: NonNull<libtrace_t>) -> Option<LibraryError> {
    self.record(Call::TakeError(trace.as_ptr().addr()));
    self.state().trace_error.take()
  }

  unsafe fn start(&self, trace: NonNull<libtrace_t>) -> c_int {
    self.record(Call::Start(trace.as_ptr().addr()));
    let mut state = self.state();
    let failure = state.start_error.clone();
    state.fail(failure)
  }

  unsafe fn pause(&self, trace: NonNull<libtrace_t>) -> c_int {
    self.record(Call::Pause(trace.as_ptr().addr()));
    let mut state = self.state();
    let failure = state.pause_error.clone();
    state.fail(failure)
  }

  unsafe fn read_packet(
    &self,
    trace: NonNull<libtrace_t>,
    packet: NonNull<libtrace_packet_t>,
  ) -> c_int {
    self.record(Call::Read {
      trace: trace.as_ptr().addr(),
      packet: packet.as_ptr().addr(),
    });
    let mut state = self.state();
    match state.packets.pop_front() {
      Some(next) => {
        let read = next.data.len().max(1) as c_int;
        state.current = Some(next);
        read
      }
      None => {
        let failure = state.read_error.clone();
        state.fail(failure)
      }
    }
  }

  unsafe fn packet_buffer(&self, _packet: NonNull<libtrace_packet_t>) -> RawBuffer {
    let state = self.state();
    match &state.current {
      Some(current) => RawBuffer {
        data: current.data.as_ptr(),
        link_type: current.link_type,
        remaining: current.data.len() as u32,
      },
      None => RawBuffer {
        data: std::ptr::null(),
        link_type: -1,
        remaining: 0,
      },
    }
  }

  unsafe fn capture_length(&self, _packet: NonNull<libtrace_packet_t>) -> usize {
    self.state().current.as_ref().map_or(0, |p| p.data.len())
  }

  unsafe fn wire_length(&self, _packet: NonNull<libtrace_packet_t>) -> usize {
    self.state().current.as_ref().map_or(0, |p| p.wire_len)
  }

  unsafe fn erf_timestamp(&self, _packet: NonNull<libtrace_packet_t>) -> u64 {
    self.state().current.as_ref().map_or(0, |p| p.erf)
  }

  unsafe fn counter(&self, _trace: NonNull<libtrace_t>, counter: Counter) -> u64 {
    self.record(Call::Counter(counter));
    self
      .state()
      .counters
      .iter()
      .find(|(c, _)| *c == counter)
      .map_or(u64::MAX, |(_, v)| *v)
  }
}
