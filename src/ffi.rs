//! Raw FFI bindings that talk directly to libtrace.
//!
//! All `unsafe extern` declarations are centralized here to contain the
//! surface area where we cross the FFI boundary. Nothing outside
//! `crate::library` calls these functions; higher-level code goes through
//! the `TraceLibrary` trait and the safe `TraceHandle` wrapper.
//!
//! The declaration set is maintained by hand against `libtrace.h`. The build
//! script can check it against an installed header (see `LIBTRACE_INCLUDE_DIR`).

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int};

/// Opaque marker type for the `libtrace_t` input trace allocated in C.
#[repr(C)]
pub struct libtrace_t {
  _private: [u8; 0],
}

/// Opaque marker type for the reusable `libtrace_packet_t` buffer.
#[repr(C)]
pub struct libtrace_packet_t {
  _private: [u8; 0],
}

/// Size of `libtrace_err_t::problem`.
pub const TRACE_ERR_PROBLEM_LEN: usize = 255;

/// Error state returned by value from `trace_get_err`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct libtrace_err_t {
  pub err_num: c_int,
  pub problem: [c_char; TRACE_ERR_PROBLEM_LEN],
}

/// `libtrace_linktype_t` is a C enum; carried as its underlying int.
pub type libtrace_linktype_t = c_int;

/// Returned by the statistics getters when the count is not known.
pub const TRACE_STAT_UNKNOWN: u64 = u64::MAX;

/// Every function below, by its C name. `build.rs` checks the same list
/// against `libtrace.h`.
pub const DECLARED_FUNCTIONS: &[&str] = include!("ffi_functions.in");

#[cfg(feature = "native")]
unsafe extern "C" {
  pub(crate) fn trace_create(uri: *const c_char) -> *mut libtrace_t;

  pub(crate) fn trace_destroy(trace: *mut libtrace_t);

  pub(crate) fn trace_create_packet() -> *mut libtrace_packet_t;

  pub(crate) fn trace_destroy_packet(packet: *mut libtrace_packet_t);

  pub(crate) fn trace_is_err(trace: *mut libtrace_t) -> bool;

  pub(crate) fn trace_get_err(trace: *mut libtrace_t) -> libtrace_err_t;

  pub(crate) fn trace_start(trace: *mut libtrace_t) -> c_int;

  pub(crate) fn trace_pause(trace: *mut libtrace_t) -> c_int;

  pub(crate) fn trace_read_packet(trace: *mut libtrace_t, packet: *mut libtrace_packet_t) -> c_int;

  pub(crate) fn trace_get_packet_buffer(
    packet: *const libtrace_packet_t,
    linktype: *mut libtrace_linktype_t,
    remaining: *mut u32,
  ) -> *mut std::ffi::c_void;

  pub(crate) fn trace_get_capture_length(packet: *const libtrace_packet_t) -> usize;

  pub(crate) fn trace_get_wire_length(packet: *const libtrace_packet_t) -> usize;

  pub(crate) fn trace_get_erf_timestamp(packet: *const libtrace_packet_t) -> u64;

  pub(crate) fn trace_get_received_packets(trace: *mut libtrace_t) -> u64;

  pub(crate) fn trace_get_filtered_packets(trace: *mut libtrace_t) -> u64;

  pub(crate) fn trace_get_dropped_packets(trace: *mut libtrace_t) -> u64;

  pub(crate) fn trace_get_accepted_packets(trace: *mut libtrace_t) -> u64;
}
