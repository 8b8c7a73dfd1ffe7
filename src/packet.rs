use std::{fmt, time::Duration};

use crate::ffi::{TRACE_STAT_UNKNOWN, libtrace_linktype_t};

/// `libtrace_linktype_t` values. Unlisted values are kept as `Other`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkType {
  Unknown,
  HdlcPos,
  Ethernet,
  Atm,
  Ieee80211,
  RawIp,
  LinuxSll,
  Pflog,
  Pos,
  Ieee80211Prism,
  Aal5,
  Duck,
  Ieee80211Radio,
  LlcSnap,
  Ppp,
  Metadata,
  NonData,
  OpenBsdLoop,
  Other(i32),
}

impl LinkType {
  pub fn from_raw(raw: libtrace_linktype_t) -> Self {
    match raw {
      -1 => LinkType::Unknown,
      1 => LinkType::HdlcPos,
      2 => LinkType::Ethernet,
      3 => LinkType::Atm,
      4 => LinkType::Ieee80211,
      5 => LinkType::RawIp,
      6 => LinkType::LinuxSll,
      7 => LinkType::Pflog,
      9 => LinkType::Pos,
      12 => LinkType::Ieee80211Prism,
      13 => LinkType::Aal5,
      14 => LinkType::Duck,
      15 => LinkType::Ieee80211Radio,
      16 => LinkType::LlcSnap,
      17 => LinkType::Ppp,
      18 => LinkType::Metadata,
      19 => LinkType::NonData,
      20 => LinkType::OpenBsdLoop,
      other => LinkType::Other(other),
    }
  }
}

impl fmt::Display for LinkType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      LinkType::Unknown => "unknown",
      LinkType::HdlcPos => "hdlc-pos",
      LinkType::Ethernet => "eth",
      LinkType::Atm => "atm",
      LinkType::Ieee80211 => "802.11",
      LinkType::RawIp => "raw-ip",
      LinkType::LinuxSll => "linux-sll",
      LinkType::Pflog => "pflog",
      LinkType::Pos => "pos",
      LinkType::Ieee80211Prism => "802.11-prism",
      LinkType::Aal5 => "aal5",
      LinkType::Duck => "duck",
      LinkType::Ieee80211Radio => "radiotap",
      LinkType::LlcSnap => "llc-snap",
      LinkType::Ppp => "ppp",
      LinkType::Metadata => "metadata",
      LinkType::NonData => "non-data",
      LinkType::OpenBsdLoop => "openbsd-loop",
      LinkType::Other(raw) => return write!(f, "linktype({raw})"),
    };
    f.write_str(name)
  }
}

/// Convert a DAG ERF timestamp (32.32 fixed point seconds since the epoch)
/// to a `Duration` since the epoch.
pub fn erf_to_duration(erf: u64) -> Duration {
  let mut secs = erf >> 32;
  let frac = erf & 0xffff_ffff;
  // frac / 2^32 of a second, rounded to the nearest nanosecond.
  let mut nanos = (frac * 1_000_000_000 + (1 << 31)) >> 32;
  if nanos >= 1_000_000_000 {
    secs += 1;
    nanos -= 1_000_000_000;
  }
  Duration::new(secs, nanos as u32)
}

/// One packet as libtrace left it in the handle's packet buffer.
///
/// Borrows the `TraceHandle` mutably, so the buffer can't be overwritten by
/// another read (or released) while this view is alive.
#[derive(Debug)]
pub struct Packet<'a> {
  pub data: &'a [u8],
  pub link_type: LinkType,
  pub capture_len: usize,
  pub wire_len: usize,
  pub timestamp: Duration,
}

impl Packet<'_> {
  /// Captured bytes, up to `n`.
  pub fn head(&self, n: usize) -> &[u8] {
    &self.data[..self.data.len().min(n)]
  }

  pub fn is_truncated(&self) -> bool {
    self.capture_len < self.wire_len
  }
}

/// Counters reported by libtrace. `None` where the format does not track one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceStats {
  pub received: Option<u64>,
  pub filtered: Option<u64>,
  pub dropped: Option<u64>,
  pub accepted: Option<u64>,
}

pub(crate) fn known_counter(raw: u64) -> Option<u64> {
  (raw != TRACE_STAT_UNKNOWN).then_some(raw)
}

impl fmt::Display for TraceStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn show(v: Option<u64>) -> String {
      v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string())
    }
    write!(
      f,
      "received={} filtered={} dropped={} accepted={}",
      show(self.received),
      show(self.filtered),
      show(self.dropped),
      show(self.accepted)
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn erf_whole_and_half_seconds() {
    assert_eq!(erf_to_duration(0), Duration::ZERO);
    assert_eq!(erf_to_duration(1_700_000_000u64 << 32), Duration::from_secs(1_700_000_000));
    let half = (10u64 << 32) | 0x8000_0000;
    assert_eq!(erf_to_duration(half), Duration::new(10, 500_000_000));
  }

  #[test]
  fn erf_fraction_rounds_up_into_next_second() {
    let almost = (3u64 << 32) | 0xffff_ffff;
    assert_eq!(erf_to_duration(almost), Duration::from_secs(4));
  }

  #[test]
  fn link_type_keeps_unknown_values() {
    assert_eq!(LinkType::from_raw(2), LinkType::Ethernet);
    assert_eq!(LinkType::from_raw(15), LinkType::Ieee80211Radio);
    assert_eq!(LinkType::from_raw(-1), LinkType::Unknown);
    assert_eq!(LinkType::from_raw(8), LinkType::Other(8));
    assert_eq!(LinkType::Other(8).to_string(), "linktype(8)");
  }

  #[test]
  fn unknown_counters_are_none() {
    assert_eq!(known_counter(TRACE_STAT_UNKNOWN), None);
    assert_eq!(known_counter(7), Some(7));
    let stats = TraceStats {
      received: Some(3),
      accepted: Some(3),
      ..Default::default()
    };
    assert_eq!(stats.to_string(), "received=3 filtered=- dropped=- accepted=3");
  }
}
