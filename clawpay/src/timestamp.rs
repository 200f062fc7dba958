//! Unix timestamp utilities for payment freshness windows.
//!
//! Payment memos embed the second they were constructed, and verification
//! compares that against the claimed request time to reject stale proofs.
//! [`UnixTimestamp`] is the type used for both sides of that comparison.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

/// A Unix timestamp representing seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// # Serialization
///
/// Serialized as a stringified integer to avoid loss of precision in JSON,
/// since `JavaScript`'s `Number` type cannot safely represent all 64-bit
/// integers.
///
/// ```json
/// "1706960000"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let ts = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("timestamp must be a non-negative integer"))?;
        Ok(Self(ts))
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// # Panics
    ///
    /// Panics if the system clock is set to a time before the Unix epoch,
    /// which should never happen on properly configured systems.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("SystemTime before UNIX epoch?!?")
            .as_secs();
        Self(now)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Returns the absolute difference between two timestamps in seconds.
    ///
    /// Skew can go either way (a payer's clock may run ahead of ours), so
    /// freshness windows are symmetric.
    #[must_use]
    pub const fn abs_diff(&self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_as_string() {
        let ts = UnixTimestamp::from_secs(1_706_960_000);
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"1706960000\"");
    }

    #[test]
    fn test_deserialize_roundtrip() {
        let ts: UnixTimestamp = serde_json::from_str("\"1706960000\"").unwrap();
        assert_eq!(ts.as_secs(), 1_706_960_000);
    }

    #[test]
    fn test_deserialize_rejects_non_numeric() {
        let result: Result<UnixTimestamp, _> = serde_json::from_str("\"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_abs_diff_is_symmetric() {
        let a = UnixTimestamp::from_secs(100);
        let b = UnixTimestamp::from_secs(350);
        assert_eq!(a.abs_diff(b), 250);
        assert_eq!(b.abs_diff(a), 250);
    }
}
