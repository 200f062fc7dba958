//! Engine configuration.
//!
//! Loads configuration from a TOML file with support for environment
//! variable expansion in string values. Variables use `$VAR` or `${VAR}`
//! syntax. This core consumes — but does not own — the deployment's
//! endpoint and address book; persistence and HTTP concerns configure
//! themselves elsewhere.
//!
//! # Example Configuration
//!
//! ```toml
//! platform_fee_bps = 1000
//! memo_expiry_secs = 300
//!
//! [solana]
//! rpc_urls = [
//!     "https://rpc.example.com/$SOLANA_RPC_KEY",
//!     "https://api.mainnet-beta.solana.com",
//! ]
//! usdc_mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
//! treasury = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM"
//!
//! [base]
//! rpc_urls = ["https://mainnet.base.org"]
//! usdc_token = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"
//! treasury = "0x5c6Df8de742863D997083Eb2bc47D0829a1EE84e"
//! split_factory = "0xaDC87646f736d6A82e9a6539cddC488b2aA07f38"
//! signer_private_key = "$CLAWPAY_SIGNER_BASE"
//! ```
//!
//! # Environment Variables
//!
//! - `CLAWPAY_CONFIG` — Path to configuration file (default: `clawpay.toml`)
//! - Secrets referenced by `$VAR` in the config file

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::verify::DEFAULT_MEMO_EXPIRY_SECS;

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Platform revenue share in basis points (default: 1000 = 10%).
    #[serde(default = "default_platform_fee_bps")]
    pub platform_fee_bps: u16,

    /// Memo freshness window in seconds (default: 300).
    #[serde(default = "default_memo_expiry_secs")]
    pub memo_expiry_secs: u64,

    /// Solana chain configuration, if payments on Solana are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solana: Option<SolanaConfig>,

    /// Base chain configuration, if payments on Base are enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<BaseConfig>,
}

/// Solana-side configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaConfig {
    /// HTTP RPC endpoints in priority order (primary first, public last).
    pub rpc_urls: Vec<String>,
    /// The USDC mint address payments must use.
    pub usdc_mint: String,
    /// The platform treasury wallet for spam deposits.
    pub treasury: String,
}

/// Base-side configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseConfig {
    /// HTTP RPC endpoints in priority order (primary first, public last).
    pub rpc_urls: Vec<String>,
    /// The USDC token contract payments must use (lowercase hex).
    pub usdc_token: String,
    /// The platform treasury wallet for spam deposits (lowercase hex).
    pub treasury: String,
    /// The split factory contract author splits deploy through.
    pub split_factory: String,
    /// Private key for the distribution signer (hex, with or without `0x`
    /// prefix). Supports `$VAR` / `${VAR}` environment expansion; left
    /// empty when the deployment never pushes distributions.
    #[serde(default)]
    pub signer_private_key: String,
}

const fn default_platform_fee_bps() -> u16 {
    1000
}

const fn default_memo_expiry_secs() -> u64 {
    DEFAULT_MEMO_EXPIRY_SECS
}

/// Errors loading engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Can not read config file {path}: {source}")]
    Io {
        /// The path that failed to load.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The file was not valid TOML for this schema.
    #[error("Can not parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl EngineConfig {
    /// Loads configuration from the path given by the `CLAWPAY_CONFIG`
    /// environment variable, falling back to `clawpay.toml` in the current
    /// directory. Missing file means defaults with no chains enabled.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var("CLAWPAY_CONFIG").unwrap_or_else(|_| "clawpay.toml".to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// After parsing, all string values with `$VAR` / `${VAR}` references
    /// are expanded from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };

        // Expand environment variables in the raw TOML string
        let expanded = expand_env_vars(&content);
        Ok(toml::from_str(&expanded)?)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            platform_fee_bps: default_platform_fee_bps(),
            memo_expiry_secs: default_memo_expiry_secs(),
            solana: None,
            base: None,
        }
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' {
            let braced = chars.peek() == Some(&'{');
            if braced {
                chars.next(); // consume '{'
            }

            let mut var_name = String::new();
            while let Some(&c) = chars.peek() {
                if braced {
                    if c == '}' {
                        chars.next();
                        break;
                    }
                } else if !c.is_ascii_alphanumeric() && c != '_' {
                    break;
                }
                var_name.push(c);
                chars.next();
            }

            if var_name.is_empty() {
                result.push('$');
                if braced {
                    result.push('{');
                }
            } else if let Ok(val) = std::env::var(&var_name) {
                result.push_str(&val);
            } else {
                // Leave unresolved variable as-is
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&var_name);
                if braced {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.platform_fee_bps, 1000);
        assert_eq!(config.memo_expiry_secs, 300);
        assert!(config.solana.is_none());
        assert!(config.base.is_none());
    }

    #[test]
    fn test_full_config_parses() {
        let config: EngineConfig = toml::from_str(
            r#"
            platform_fee_bps = 500

            [solana]
            rpc_urls = ["https://rpc.example.com", "https://api.mainnet-beta.solana.com"]
            usdc_mint = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
            treasury = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM"

            [base]
            rpc_urls = ["https://mainnet.base.org"]
            usdc_token = "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"
            treasury = "0x5c6df8de742863d997083eb2bc47d0829a1ee84e"
            split_factory = "0xadc87646f736d6a82e9a6539cddc488b2aa07f38"
            "#,
        )
        .unwrap();
        assert_eq!(config.platform_fee_bps, 500);
        let solana = config.solana.unwrap();
        assert_eq!(solana.rpc_urls.len(), 2);
        let base = config.base.unwrap();
        assert_eq!(base.signer_private_key, "");
        assert!(base.split_factory.starts_with("0x"));
    }

    #[test]
    fn test_expand_plain_and_braced_vars() {
        // SAFETY: test-local variable name, no concurrent reader cares.
        unsafe { std::env::set_var("CLAWPAY_TEST_RPC_KEY", "sk-123") };
        assert_eq!(
            expand_env_vars("https://rpc.example.com/$CLAWPAY_TEST_RPC_KEY"),
            "https://rpc.example.com/sk-123"
        );
        assert_eq!(
            expand_env_vars("key = \"${CLAWPAY_TEST_RPC_KEY}\""),
            "key = \"sk-123\""
        );
    }

    #[test]
    fn test_unresolved_vars_left_as_is() {
        assert_eq!(
            expand_env_vars("$CLAWPAY_TEST_DOES_NOT_EXIST_XYZ"),
            "$CLAWPAY_TEST_DOES_NOT_EXIST_XYZ"
        );
        assert_eq!(expand_env_vars("cost is $5"), "cost is $5");
    }
}
