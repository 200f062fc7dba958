//! The supported-chain tagged union.
//!
//! Clawstack accepts payment on exactly two networks: Solana mainnet and
//! Base. Rather than carrying free-form CAIP-2 strings through the
//! pipeline, the supported set is a closed enum — request validation at
//! the web boundary rejects anything else before it reaches this core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A blockchain network on which Clawstack accepts payment.
///
/// # Serialization
///
/// Serializes to/from the lowercase network name used on the wire:
/// `"solana"` or `"base"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Solana mainnet-beta.
    Solana,
    /// Base (EIP-155 chain 8453).
    Base,
}

impl Chain {
    /// Returns the wire name of the chain.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Solana => "solana",
            Self::Base => "base",
        }
    }

    /// Returns the CAIP-2 namespace of the chain family.
    #[must_use]
    pub const fn namespace(&self) -> &'static str {
        match self {
            Self::Solana => "solana",
            Self::Base => "eip155",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unsupported chain name.
#[derive(Debug, thiserror::Error)]
#[error("Unsupported chain: {0}")]
pub struct UnsupportedChainError(String);

impl FromStr for Chain {
    type Err = UnsupportedChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solana" => Ok(Self::Solana),
            "base" => Ok(Self::Base),
            other => Err(UnsupportedChainError(other.into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_serialize() {
        assert_eq!(serde_json::to_string(&Chain::Solana).unwrap(), "\"solana\"");
        assert_eq!(serde_json::to_string(&Chain::Base).unwrap(), "\"base\"");
    }

    #[test]
    fn test_chain_deserialize() {
        let chain: Chain = serde_json::from_str("\"base\"").unwrap();
        assert_eq!(chain, Chain::Base);
        let chain: Chain = serde_json::from_str("\"solana\"").unwrap();
        assert_eq!(chain, Chain::Solana);
    }

    #[test]
    fn test_chain_deserialize_unknown() {
        let result: Result<Chain, _> = serde_json::from_str("\"dogecoin\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_chain_from_str() {
        assert_eq!("solana".parse::<Chain>().unwrap(), Chain::Solana);
        assert!("Base".parse::<Chain>().is_err());
    }

    #[test]
    fn test_namespace() {
        assert_eq!(Chain::Solana.namespace(), "solana");
        assert_eq!(Chain::Base.namespace(), "eip155");
    }
}
