//! The boundary between `TraceHandle` and the native library.
//!
//! `TraceHandle` never calls `crate::ffi` directly. It is generic over
//! `TraceLibrary`, which `Libtrace` implements over the real C symbols
//! (feature `native`) and the unit tests implement with a recording stub.

use std::{ffi::CStr, os::raw::c_int, ptr::NonNull};

use crate::{
  error::LibraryError,
  ffi::{libtrace_linktype_t, libtrace_packet_t, libtrace_t},
};

/// Result of `trace_get_packet_buffer`: link-layer start, link type and
/// number of captured bytes from that pointer.
#[derive(Clone, Copy, Debug)]
pub struct RawBuffer {
  pub data: *const u8,
  pub link_type: libtrace_linktype_t,
  pub remaining: u32,
}

/// Per-trace packet counters (`trace_get_*_packets`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
  Received,
  Filtered,
  Dropped,
  Accepted,
}

/// The libtrace calls a `TraceHandle` is built from.
///
/// Creation calls return the library's raw result; a null pointer is the
/// failure sentinel. Every other call takes handles obtained from this same
/// library.
///
/// # Safety
///
/// `TraceHandle` trusts what an implementation returns and builds safe
/// values from it, so implementers must uphold:
///
/// - `create_trace` and `create_packet` return either null or a live handle
///   that stays valid until it is passed to the matching `destroy_*` call.
/// - `packet_buffer` returns either a null `data` pointer or one to at least
///   `remaining` initialized bytes, which stay readable and unmodified until
///   the next `read_packet` or `destroy_packet` on that packet.
///
/// Callers of the `unsafe` methods must in turn pass handles that were
/// returned by `create_trace`/`create_packet` on this library and have not
/// been destroyed. After `destroy_*` the handle must not be passed again.
///
/// An implementation without `unsafe impl` is rejected:
///
/// ```compile_fail,E0200
/// use std::{ffi::CStr, os::raw::c_int, ptr::NonNull};
///
/// use pkttrace::{
///   LibraryError,
///   ffi::{libtrace_packet_t, libtrace_t},
///   library::{Counter, RawBuffer, TraceLibrary},
/// };
///
/// struct Bogus;
///
/// impl TraceLibrary for Bogus {
///   fn create_trace(&self, _uri: &CStr) -> *mut libtrace_t {
///     std::ptr::null_mut()
///   }
///   unsafe fn destroy_trace(&self, _trace: NonNull<libtrace_t>) {}
///   fn create_packet(&self) -> *mut libtrace_packet_t {
///     std::ptr::null_mut()
///   }
///   unsafe fn destroy_packet(&self, _packet: NonNull<libtrace_packet_t>) {}
///   unsafe fn take_error(&self, _trace: NonNull<libtrace_t>) -> Option<LibraryError> {
///     None
///   }
///   unsafe fn start(&self, _trace: NonNull<libtrace_t>) -> c_int {
///     0
///   }
///   unsafe fn pause(&self, _trace: NonNull<libtrace_t>) -> c_int {
///     0
///   }
///   unsafe fn read_packet(
///     &self,
///     _trace: NonNull<libtrace_t>,
///     _packet: NonNull<libtrace_packet_t>,
///   ) -> c_int {
///     1
///   }
///   unsafe fn packet_buffer(&self, _packet: NonNull<libtrace_packet_t>) -> RawBuffer {
///     RawBuffer {
///       data: 0x8 as *const u8,
///       link_type: 2,
///       remaining: 4,
///     }
///   }
///   unsafe fn capture_length(&self, _packet: NonNull<libtrace_packet_t>) -> usize {
///     4
///   }
///   unsafe fn wire_length(&self, _packet: NonNull<libtrace_packet_t>) -> usize {
///     4
///   }
///   unsafe fn erf_timestamp(&self, _packet: NonNull<libtrace_packet_t>) -> u64 {
///     0
///   }
///   unsafe fn counter(&self, _trace: NonNull<libtrace_t>, _counter: Counter) -> u64 {
///     u64::MAX
///   }
/// }
/// ```
pub unsafe trait TraceLibrary {
  fn create_trace(&self, uri: &CStr) -> *mut libtrace_t;

  unsafe fn destroy_trace(&self, trace: NonNull<libtrace_t>);

  fn create_packet(&self) -> *mut libtrace_packet_t;

  unsafe fn destroy_packet(&self, packet: NonNull<libtrace_packet_t>);

  /// Read and clear the trace's error state, `None` if no error is set.
  unsafe fn take_error(&self, trace: NonNull<libtrace_t>) -> Option<LibraryError>;

  unsafe fn start(&self, trace: NonNull<libtrace_t>) -> c_int;

  unsafe fn pause(&self, trace: NonNull<libtrace_t>) -> c_int;

  /// `0` at end of trace, negative on error, bytes read otherwise.
  unsafe fn read_packet(
    &self,
    trace: NonNull<libtrace_t>,
    packet: NonNull<libtrace_packet_t>,
  ) -> c_int;

  unsafe fn packet_buffer(&self, packet: NonNull<libtrace_packet_t>) -> RawBuffer;

  unsafe fn capture_length(&self, packet: NonNull<libtrace_packet_t>) -> usize;

  unsafe fn wire_length(&self, packet: NonNull<libtrace_packet_t>) -> usize;

  unsafe fn erf_timestamp(&self, packet: NonNull<libtrace_packet_t>) -> u64;

  /// `u64::MAX` when the format does not track this counter.
  unsafe fn counter(&self, trace: NonNull<libtrace_t>, counter: Counter) -> u64;
}

/// The system libtrace, linked by `build.rs`.
#[cfg(feature = "native")]
#[derive(Clone, Copy, Debug, Default)]
pub struct Libtrace;

#[cfg(feature = "native")]
unsafe impl TraceLibrary for Libtrace {
  fn create_trace(&self, uri: &CStr) -> *mut libtrace_t {
    unsafe { crate::ffi::trace_create(uri.as_ptr()) }
  }

  unsafe fn destroy_trace(&self, trace: NonNull<libtrace_t>) {
    unsafe { crate::ffi::trace_destroy(trace.as_ptr()) }
  }

  fn create_packet(&self) -> *mut libtrace_packet_t {
    unsafe { crate::ffi::trace_create_packet() }
  }

  unsafe fn destroy_packet(&self, packet: NonNull<libtrace_packet_t>) {
    unsafe { crate::ffi::trace_destroy_packet(packet.as_ptr()) }
  }

  unsafe fn take_error(&self, trace: NonNull<libtrace_t>) -> Option<LibraryError> {
    if !unsafe { crate::ffi::trace_is_err(trace.as_ptr()) } {
      return None;
    }
    let raw = unsafe { crate::ffi::trace_get_err(trace.as_ptr()) };
    Some(LibraryError::from_raw(&raw))
  }

  unsafe fn start(&self, trace: NonNull<libtrace_t>) -> c_int {
    unsafe { crate::ffi::trace_start(trace.as_ptr()) }
  }

  unsafe fn pause(&self, trace: NonNull<libtrace_t>) -> c_int {
    unsafe { crate::ffi::trace_pause(trace.as_ptr()) }
  }

  unsafe fn read_packet(
    &self,
    trace: NonNull<libtrace_t>,
    packet: NonNull<libtrace_packet_t>,
  ) -> c_int {
    unsafe { crate::ffi::trace_read_packet(trace.as_ptr(), packet.as_ptr()) }
  }

  unsafe fn packet_buffer(&self, packet: NonNull<libtrace_packet_t>) -> RawBuffer {
    let mut link_type: libtrace_linktype_t = -1;
    let mut remaining: u32 = 0;
    let data =
      unsafe { crate::ffi::trace_get_packet_buffer(packet.as_ptr(), &mut link_type, &mut remaining) };
    RawBuffer {
      data: data as *const u8,
      link_type,
      remaining,
    }
  }

  unsafe fn capture_length(&self, packet: NonNull<libtrace_packet_t>) -> usize {
    unsafe { crate::ffi::trace_get_capture_length(packet.as_ptr()) }
  }

  unsafe fn wire_length(&self, packet: NonNull<libtrace_packet_t>) -> usize {
    unsafe { crate::ffi::trace_get_wire_length(packet.as_ptr()) }
  }

  unsafe fn erf_timestamp(&self, packet: NonNull<libtrace_packet_t>) -> u64 {
    unsafe { crate::ffi::trace_get_erf_timestamp(packet.as_ptr()) }
  }

  unsafe fn counter(&self, trace: NonNull<libtrace_t>, counter: Counter) -> u64 {
    let trace = trace.as_ptr();
    unsafe {
      match counter {
        Counter::Received => crate::ffi::trace_get_received_packets(trace),
        Counter::Filtered => crate::ffi::trace_get_filtered_packets(trace),
        Counter::Dropped => crate::ffi::trace_get_dropped_packets(trace),
        Counter::Accepted => crate::ffi::trace_get_accepted_packets(trace),
      }
    }
  }
}
