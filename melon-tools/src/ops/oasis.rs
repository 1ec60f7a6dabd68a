// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Oasis exchange venue, a single matching market.

use alloy::{dyn_abi::DynSolValue, primitives::U256, providers::Provider};

use crate::{
    contracts::IMatchingMarket,
    core::{
        deployer::Deployer,
        manifest::OasisSection,
        resolver::{self, ContractHandle, ContractSpec},
    },
    ops::tokens::Tokens,
};

/// Obtains the matching market, whitelisting every configured trading pair
/// after a fresh deployment.
pub async fn nab_oasis<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut OasisSection,
    tokens: &Tokens,
) -> crate::Result<ContractHandle> {
    let close_time = DynSolValue::Uint(U256::from(section.conf.close_time), 256);
    let market = resolver::nab(
        deployer,
        ContractSpec::new("MatchingMarket").with_args(vec![close_time]),
        &mut section.addr,
    )
    .await?;

    if market.deployed {
        debug!(@grey, "whitelisting token pairs on the matching market");
        let instance = IMatchingMarket::new(market.address, deployer.provider());
        let quote = tokens.weth()?.address;
        for (symbol, token) in tokens.iter() {
            if symbol == "WETH" {
                continue;
            }
            deployer
                .write(
                    market.address,
                    instance
                        .addTokenPairWhitelist(token.address, quote)
                        .calldata()
                        .to_vec(),
                )
                .await?;
        }
    }
    Ok(market)
}
