use std::{convert::Infallible, fmt};

use thiserror::Error;

use crate::{ffi::libtrace_err_t, uri::SourceUri};

/// Which native resource libtrace refused to allocate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
  Trace,
  Packet,
}

impl Resource {
  pub fn as_str(&self) -> &'static str {
    match self {
      Resource::Trace => "trace",
      Resource::Packet => "packet",
    }
  }
}

impl fmt::Display for Resource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Error)]
pub enum TraceError {
  #[error("invalid trace uri: {reason}")]
  InvalidArgument { reason: &'static str },

  #[error("libtrace could not allocate {0}")]
  Allocation(Resource),

  #[error("trace {uri}: {error}")]
  Library { uri: SourceUri, error: LibraryError },

  #[error("{call} returned {code}")]
  Call { call: &'static str, code: i32 },

  #[error("trace handle used after close")]
  UseAfterClose,
}

impl From<Infallible> for TraceError {
  fn from(never: Infallible) -> Self {
    match never {}
  }
}

/// `TRACE_ERR_*` codes from `libtrace.h`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
  NoError,
  BadFormat,
  InitFailed,
  UnknownOption,
  NoConversion,
  BadPacket,
  OptionUnavailable,
  Unsupported,
  BadState,
  BadFilter,
  RtFailure,
  UnsupportedCompress,
  Other(i32),
}

impl ErrorCode {
  pub fn from_raw(code: i32) -> Self {
    match code {
      0 => ErrorCode::NoError,
      -1 => ErrorCode::BadFormat,
      -2 => ErrorCode::InitFailed,
      -3 => ErrorCode::UnknownOption,
      -4 => ErrorCode::NoConversion,
      -5 => ErrorCode::BadPacket,
      -6 => ErrorCode::OptionUnavailable,
      -7 => ErrorCode::Unsupported,
      -8 => ErrorCode::BadState,
      -9 => ErrorCode::BadFilter,
      -10 => ErrorCode::RtFailure,
      -11 => ErrorCode::UnsupportedCompress,
      other => ErrorCode::Other(other),
    }
  }

  fn describe(&self) -> &'static str {
    match self {
      ErrorCode::NoError => "no error",
      ErrorCode::BadFormat => "unsupported or badly formed uri",
      ErrorCode::InitFailed => "trace failed to initialise",
      ErrorCode::UnknownOption => "unknown config option",
      ErrorCode::NoConversion => "output cannot write packets of this type",
      ErrorCode::BadPacket => "corrupt or unusable packet",
      ErrorCode::OptionUnavailable => "option unsupported by this format",
      ErrorCode::Unsupported => "unsupported feature",
      ErrorCode::BadState => "illegal use of the api",
      ErrorCode::BadFilter => "failed to compile bpf filter",
      ErrorCode::RtFailure => "rt communication failure",
      ErrorCode::UnsupportedCompress => "unsupported compression format",
      ErrorCode::Other(_) => "unknown error",
    }
  }
}

/// Error state read back from a trace with `trace_get_err`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryError {
  pub code: ErrorCode,
  pub problem: String,
}

impl LibraryError {
  pub fn new(code: i32, problem: impl Into<String>) -> Self {
    Self {
      code: ErrorCode::from_raw(code),
      problem: problem.into(),
    }
  }

  #[cfg_attr(not(feature = "native"), allow(dead_code))]
  pub(crate) fn from_raw(raw: &libtrace_err_t) -> Self {
    let bytes: Vec<u8> = raw
      .problem
      .iter()
      .take_while(|&&c| c != 0)
      .map(|&c| c as u8)
      .collect();
    Self::new(raw.err_num, String::from_utf8_lossy(&bytes))
  }
}

impl fmt::Display for LibraryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.code {
      ErrorCode::Other(code) => write!(f, "{} ({code})", self.code.describe())?,
      _ => f.write_str(self.code.describe())?,
    }
    if !self.problem.is_empty() {
      write!(f, ": {}", self.problem)?;
    }
    Ok(())
  }
}

impl std::error::Error for LibraryError {}
