//! Validated trace source URIs.
//!
//! libtrace takes the URI as a C string, so anything that can't become one
//! (empty, interior NUL, not UTF-8) is rejected here before a native call
//! is made. Scheme handling (`pcap:`, `erf:`, `rt:`, `int:` ...) is left to
//! libtrace.

use std::{
  ffi::{CStr, CString, OsStr},
  fmt,
  str::FromStr,
};

use crate::error::TraceError;

/// A URI libtrace can be opened with.
///
/// Built from text only: `&str`, `String` or an `&OsStr` that is valid
/// UTF-8. Raw bytes are not a URI, even when they happen to decode:
///
/// ```compile_fail,E0277
/// use pkttrace::SourceUri;
///
/// let _ = SourceUri::try_from(b"42".as_slice());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceUri {
  text: Box<str>,
  c_uri: CString,
}

impl SourceUri {
  pub fn new(uri: &str) -> Result<Self, TraceError> {
    if uri.is_empty() {
      return Err(TraceError::InvalidArgument {
        reason: "uri is empty",
      });
    }
    let c_uri = CString::new(uri).map_err(|_| TraceError::InvalidArgument {
      reason: "uri contains interior NUL",
    })?;
    Ok(Self {
      text: uri.into(),
      c_uri,
    })
  }

  pub fn as_str(&self) -> &str {
    &self.text
  }

  /// The NUL-terminated form handed to `trace_create`.
  pub fn as_c_str(&self) -> &CStr {
    &self.c_uri
  }

  /// Scheme prefix before the first `:`, if any.
  pub fn scheme(&self) -> Option<&str> {
    self.text.split_once(':').map(|(scheme, _)| scheme)
  }
}

impl fmt::Debug for SourceUri {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("SourceUri").field(&self.text).finish()
  }
}

impl fmt::Display for SourceUri {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.text)
  }
}

impl FromStr for SourceUri {
  type Err = TraceError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::new(s)
  }
}

impl TryFrom<&str> for SourceUri {
  type Error = TraceError;

  fn try_from(value: &str) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl TryFrom<String> for SourceUri {
  type Error = TraceError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::new(&value)
  }
}

impl TryFrom<&String> for SourceUri {
  type Error = TraceError;

  fn try_from(value: &String) -> Result<Self, Self::Error> {
    Self::new(value)
  }
}

impl TryFrom<&OsStr> for SourceUri {
  type Error = TraceError;

  fn try_from(value: &OsStr) -> Result<Self, Self::Error> {
    let text = value.to_str().ok_or(TraceError::InvalidArgument {
      reason: "uri is not valid UTF-8",
    })?;
    Self::new(text)
  }
}
