//! Utilities. OBVIOUSLY.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::ops::Deref;
use std::str::FromStr;

pub mod ser;

/// A library-local representation of a time.
///
/// Records carry their creation time as raw bytes, so this wrapper owns the
/// one and only mapping between a time and those bytes: the number of
/// microseconds since the unix epoch as a big-endian `i64`. Anything that can
/// be converted into a [DateTime<Utc>](chrono::DateTime) converts into a
/// `Timestamp`, and you can always get the underlying type via deref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The length of a timestamp in byte form.
    pub const BYTES: usize = 8;

    /// Create a new Timestamp from the current date/time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Encode this time as bytes. Sub-microsecond precision is dropped.
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        self.0.timestamp_micros().to_be_bytes()
    }

    /// Read a time back out of the bytes created by [`Timestamp::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; Self::BYTES] = bytes.try_into().map_err(|_| Error::BadLength)?;
        let micros = i64::from_be_bytes(arr);
        let datetime = DateTime::<Utc>::from_timestamp_micros(micros).ok_or(Error::RecordTimestampInvalid)?;
        Ok(Self(datetime))
    }
}

impl Deref for Timestamp {
    type Target = DateTime<Utc>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(date: DateTime<Utc>) -> Self {
        Self(date)
    }
}

impl FromStr for Timestamp {
    type Err = chrono::format::ParseError;
    fn from_str(s: &str) -> std::result::Result<Timestamp, Self::Err> {
        let datetime: DateTime<Utc> = s.parse()?;
        Ok(Timestamp(datetime))
    }
}
