// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! On-chain interfaces of the contracts the pipeline talks to after
//! deployment, plus the well-known constants they share.

use alloy::{
    primitives::{address, keccak256, Address, FixedBytes},
    sol,
};

/// Sentinel address Kyber contracts use for ether.
pub const KYBER_ETH_TOKEN: Address = address!("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Canonical adapter entry points registered for every exchange.
pub const MAKE_ORDER: &str = "makeOrder(address,address[6],uint256[8],bytes32,bytes,bytes,bytes)";
pub const TAKE_ORDER: &str = "takeOrder(address,address[6],uint256[8],bytes32,bytes,bytes,bytes)";
pub const CANCEL_ORDER: &str =
    "cancelOrder(address,address[6],uint256[8],bytes32,bytes,bytes,bytes)";

/// First four bytes of the keccak hash of a method signature.
pub fn selector(signature: &str) -> FixedBytes<4> {
    let hash = keccak256(signature.as_bytes());
    FixedBytes::from_slice(&hash[..4])
}

sol! {
    #[sol(rpc)]
    interface IRegistry {
        function priceSource() external view returns (address);
        function setPriceSource(address _priceSource) external;
        function mlnToken() external view returns (address);
        function setMlnToken(address _mlnToken) external;
        function nativeAsset() external view returns (address);
        function setNativeAsset(address _nativeAsset) external;
        function engine() external view returns (address);
        function setEngine(address _engine) external;
        function fundFactory() external view returns (address);
        function setFundFactory(address _fundFactory) external;

        function isFeeRegistered(address _fee) external view returns (bool);
        function registerFees(address[] _fees) external;
        function exchangeAdapterIsRegistered(address _adapter) external view returns (bool);
        function registerExchangeAdapter(
            address _exchange,
            address _adapter,
            bool _takesCustody,
            bytes4[] _sigs
        ) external;
        function assetIsRegistered(address _asset) external view returns (bool);
        function registerAsset(
            address _asset,
            string _name,
            string _symbol,
            string _url,
            uint256 _reserveMin,
            uint256[] _standards,
            bytes4[] _sigs
        ) external;

        function owner() external view returns (address);
        function transferOwnership(address _newOwner) external;
    }

    #[sol(rpc)]
    interface IKyberNetwork {
        function setKyberProxy(address _proxy) external;
        function addReserve(address _reserve, bool _add) external;
        function listPairForReserve(
            address _reserve,
            address _token,
            address _ethToken,
            bool _add
        ) external;
    }

    #[sol(rpc)]
    interface IKyberNetworkProxy {
        function setKyberNetworkContract(address _network) external;
    }

    #[sol(rpc)]
    interface IConversionRates {
        function setValidRateDurationInBlocks(uint256 _duration) external;
        function addToken(address _token) external;
        function enableTokenTrade(address _token) external;
    }

    #[sol(rpc)]
    interface IKyberReserve {
        function setContracts(address _network, address _rates, address _sanityRates) external;
    }

    #[sol(rpc)]
    interface IMatchingMarket {
        function addTokenPairWhitelist(address _base, address _quote) external;
    }

    #[sol(rpc)]
    interface IZeroExExchange {
        function registerAssetProxy(address _assetProxy) external;
    }

    #[sol(rpc)]
    interface IERC20Proxy {
        function addAuthorizedAddress(address _target) external;
    }

    #[sol(rpc)]
    interface ITestingPriceFeed {
        function update(address[] _assets, uint256[] _prices) external;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_match_known_hashes() {
        let transfer = selector("transfer(address,uint256)");
        assert_eq!(transfer.as_slice(), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn ether_sentinel_is_checksummed() {
        let text = KYBER_ETH_TOKEN.to_string();
        assert_eq!(text, "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");
    }
}
