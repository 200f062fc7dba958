//! Solidity interface definitions for on-chain interactions.
//!
//! Contains the minimal ABI surface needed by the payment engine:
//! - [`SplitParams`] / [`ISplitFactory`] / [`ISplitWallet`] — the external
//!   split contracts (deployment factory and deployed push-split instance)
//! - [`IERC20`] — ERC-20 `Transfer` event for payment log decoding
//!
//! The factory and wallet signatures are fixed by the external split
//! contracts and must be matched exactly for calldata to be valid.

use alloy_sol_types::sol;

sol! {
    /// Parameters describing a split: who receives, in what proportion.
    ///
    /// `allocations[i]` is `recipients[i]`'s share of `totalAllocation`.
    /// The contracts require recipients sorted ascending by address for
    /// deterministic split addressing.
    #[derive(Debug, PartialEq, Eq)]
    struct SplitParams {
        address[] recipients;
        uint256[] allocations;
        uint256 totalAllocation;
        uint16 distributionIncentive;
    }

    /// Split deployment factory.
    ///
    /// Only the surface the engine touches is declared.
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface ISplitFactory {
        event SplitCreated(address indexed split, SplitParams splitParams, address owner, address creator);
        function createSplit(SplitParams _splitParams, address _owner, address _creator) external returns (address split);
    }

    /// A deployed push-split instance.
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface ISplitWallet {
        function distribute(SplitParams _splitParams, address _token, address _distributor) external;
    }
}

sol! {
    /// Minimal ERC-20 interface: the `Transfer` event for receipt decoding.
    #[allow(missing_docs)]
    #[derive(Debug)]
    interface IERC20 {
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}
