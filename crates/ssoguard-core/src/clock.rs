#![forbid(unsafe_code)]

//! Time source for validity-window and certificate-lifetime checks.

use chrono::{DateTime, Utc};
use std::fmt;

/// Supplies the current instant.
///
/// Validators hold an `Arc<dyn Clock>` so tests can pin time while
/// production code reads the system clock.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// The real-time system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Parse an RFC 3339 timestamp such as `2030-01-01T00:00:00Z`.
    pub fn parse(rfc3339: &str) -> Result<Self, crate::Error> {
        parse_timestamp(rfc3339).map(Self)
    }
}

/// Parse `YYYY-MM-DDTHH:MM:SS[.fraction](Z|±HH:MM)` into UTC.
///
/// Only the uppercase `T` separator and `Z` zone are accepted, and every
/// field must be zero-padded.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, crate::Error> {
    let invalid = |why: &str| crate::Error::Other(format!("invalid timestamp {value:?}: {why}"));

    let bytes = value.as_bytes();
    if bytes.len() < 20 {
        return Err(invalid("too short"));
    }
    for (i, c) in bytes[..19].iter().enumerate() {
        let ok = match i {
            4 | 7 => *c == b'-',
            10 => *c == b'T',
            13 | 16 => *c == b':',
            _ => c.is_ascii_digit(),
        };
        if !ok {
            return Err(invalid("expected YYYY-MM-DDTHH:MM:SS"));
        }
    }

    let mut zone = &value[19..];
    if let Some(fraction) = zone.strip_prefix('.') {
        let digits = fraction.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(invalid("empty fractional seconds"));
        }
        zone = &fraction[digits..];
    }
    let offset_ok = match zone.as_bytes() {
        [b'Z'] => true,
        [sign, h1, h2, b':', m1, m2] => {
            matches!(*sign, b'+' | b'-') && [h1, h2, m1, m2].iter().all(|d| d.is_ascii_digit())
        }
        _ => false,
    };
    if !offset_ok {
        return Err(invalid("expected Z or a ±HH:MM offset"));
    }

    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| invalid(&e.to_string()))
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
