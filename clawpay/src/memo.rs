//! The Clawstack payment memo wire format.
//!
//! Solana payments carry a memo instruction correlating the transfer to
//! the resource being paid for. The memo is a bit-exact external contract
//! that payer tooling must also honor:
//!
//! ```text
//! clawstack:<resourceId>:<unixTimestamp>
//! ```
//!
//! Exactly three colon-delimited ASCII fields. The namespace must equal
//! [`MEMO_NAMESPACE`], and the timestamp must be a decimal number of
//! seconds since the Unix epoch. Anything else is rejected with a
//! [`MemoFormatError`] naming the specific deviation — nothing is coerced.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::timestamp::UnixTimestamp;

/// The namespace prefix identifying a Clawstack payment memo.
pub const MEMO_NAMESPACE: &str = "clawstack";

/// A parsed and namespace-validated payment memo.
///
/// Constructed only through [`PaymentMemo::parse`] (or [`FromStr`]), so a
/// value of this type always carries the correct namespace and a numeric
/// timestamp. Whether the timestamp is *fresh* is a separate pipeline
/// concern — see [`crate::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMemo {
    /// The resource being paid for (a post id or spam-fee id).
    pub resource_id: String,
    /// The second at which the payer constructed the memo.
    pub timestamp: UnixTimestamp,
}

/// Ways a memo string can deviate from the wire format.
///
/// Each deviation is its own variant so callers (and payer tooling authors
/// debugging their integration) see exactly what was wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoFormatError {
    /// The memo did not have exactly three colon-delimited fields.
    #[error("expected 3 colon-delimited memo fields, found {0}")]
    SegmentCount(usize),
    /// The first field was not the Clawstack namespace.
    #[error("unknown memo namespace: {0:?}")]
    Namespace(String),
    /// The resource id field was empty.
    #[error("empty memo resource id")]
    EmptyResourceId,
    /// The timestamp field was not a decimal unsigned integer.
    #[error("memo timestamp is not a decimal integer: {0:?}")]
    Timestamp(String),
}

impl PaymentMemo {
    /// Creates a memo for a resource, stamped with the given time.
    pub fn new<S: Into<String>>(resource_id: S, timestamp: UnixTimestamp) -> Self {
        Self {
            resource_id: resource_id.into(),
            timestamp,
        }
    }

    /// Parses a raw memo string against the wire format.
    ///
    /// # Errors
    ///
    /// Returns a [`MemoFormatError`] describing the first deviation found.
    pub fn parse(raw: &str) -> Result<Self, MemoFormatError> {
        let fields: Vec<&str> = raw.split(':').collect();
        if fields.len() != 3 {
            return Err(MemoFormatError::SegmentCount(fields.len()));
        }
        if fields[0] != MEMO_NAMESPACE {
            return Err(MemoFormatError::Namespace(fields[0].into()));
        }
        if fields[1].is_empty() {
            return Err(MemoFormatError::EmptyResourceId);
        }
        let secs = fields[2]
            .parse::<u64>()
            .map_err(|_| MemoFormatError::Timestamp(fields[2].into()))?;
        Ok(Self {
            resource_id: fields[1].into(),
            timestamp: UnixTimestamp::from_secs(secs),
        })
    }
}

impl FromStr for PaymentMemo {
    type Err = MemoFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for PaymentMemo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MEMO_NAMESPACE}:{}:{}", self.resource_id, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_memo() {
        let memo = PaymentMemo::parse("clawstack:post-abc:1706960000").unwrap();
        assert_eq!(memo.resource_id, "post-abc");
        assert_eq!(memo.timestamp.as_secs(), 1_706_960_000);
    }

    #[test]
    fn test_display_roundtrip() {
        let memo = PaymentMemo::new("post-abc", UnixTimestamp::from_secs(1_706_960_000));
        let wire = memo.to_string();
        assert_eq!(wire, "clawstack:post-abc:1706960000");
        assert_eq!(PaymentMemo::parse(&wire).unwrap(), memo);
    }

    #[test]
    fn test_wrong_segment_count() {
        assert_eq!(
            PaymentMemo::parse("clawstack:post-abc"),
            Err(MemoFormatError::SegmentCount(2))
        );
        assert_eq!(
            PaymentMemo::parse("clawstack:post:abc:1706960000"),
            Err(MemoFormatError::SegmentCount(4))
        );
    }

    #[test]
    fn test_wrong_namespace() {
        assert_eq!(
            PaymentMemo::parse("pawstack:post-abc:1706960000"),
            Err(MemoFormatError::Namespace("pawstack".into()))
        );
        // Namespace comparison is exact, not case-insensitive.
        assert!(matches!(
            PaymentMemo::parse("Clawstack:post-abc:1706960000"),
            Err(MemoFormatError::Namespace(_))
        ));
    }

    #[test]
    fn test_non_numeric_timestamp() {
        assert_eq!(
            PaymentMemo::parse("clawstack:post-abc:soon"),
            Err(MemoFormatError::Timestamp("soon".into()))
        );
        // No sign or whitespace tolerance.
        assert!(matches!(
            PaymentMemo::parse("clawstack:post-abc: 1706960000"),
            Err(MemoFormatError::Timestamp(_))
        ));
        assert!(matches!(
            PaymentMemo::parse("clawstack:post-abc:-5"),
            Err(MemoFormatError::Timestamp(_))
        ));
    }

    #[test]
    fn test_empty_resource_id() {
        assert_eq!(
            PaymentMemo::parse("clawstack::1706960000"),
            Err(MemoFormatError::EmptyResourceId)
        );
    }
}
