//! Safe handles over libtrace: open a URI-addressed packet trace, read
//! packets from it, and have the native resources released exactly once.
//!
//! Modules are organized by responsibility:
//! - `handle`: `TraceHandle`, owner of the native trace and packet buffer.
//! - `library`: `TraceLibrary` seam and the `Libtrace` backend (feature `native`).
//! - `capture`: blocking read loop and its tokio wrapper.
//! - `packet`: borrowed packet view, link types, timestamps, counters.
//! - `uri`: validated source URIs.
//! - `error`: error taxonomy.
//! - `ffi`: raw FFI boundary to libtrace (unsafe, only used by `library`).

pub mod capture;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod library;
pub mod packet;
pub mod uri;

#[cfg(test)]
mod stub;

pub use capture::{CaptureEnd, CaptureError, CaptureOptions, CaptureSummary};
pub use error::{ErrorCode, LibraryError, Resource, TraceError};
pub use handle::TraceHandle;
#[cfg(feature = "native")]
pub use library::Libtrace;
pub use library::TraceLibrary;
pub use packet::{LinkType, Packet, TraceStats};
pub use uri::SourceUri;
