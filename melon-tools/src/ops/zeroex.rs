// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! ZeroEx venue: the exchange contract and its ERC20 asset proxy.

use alloy::providers::Provider;

use crate::{
    contracts::{IERC20Proxy, IZeroExExchange},
    core::{
        deployer::Deployer,
        manifest::ZeroExSection,
        resolver::{self, ContractHandle, ContractSpec},
    },
};

#[derive(Debug, Clone)]
pub struct ZeroExVenue {
    pub exchange: ContractHandle,
    pub erc20_proxy: ContractHandle,
}

impl ZeroExVenue {
    pub fn freshly_deployed(&self) -> bool {
        self.exchange.deployed || self.erc20_proxy.deployed
    }
}

/// Obtains the ZeroEx venue, authorizing the exchange on its asset proxy
/// after a fresh deployment.
pub async fn nab_zeroex<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut ZeroExSection,
) -> crate::Result<ZeroExVenue> {
    let exchange = resolver::nab(
        deployer,
        ContractSpec::new("ZeroExExchange"),
        &mut section.addr,
    )
    .await?;
    let erc20_proxy = resolver::nab(
        deployer,
        ContractSpec::new("ERC20Proxy"),
        &mut section.addr,
    )
    .await?;

    let venue = ZeroExVenue {
        exchange,
        erc20_proxy,
    };
    if venue.freshly_deployed() {
        debug!(@grey, "authorizing the zeroex exchange on its asset proxy");
        let provider = deployer.provider();
        let exchange = IZeroExExchange::new(venue.exchange.address, provider);
        let proxy = IERC20Proxy::new(venue.erc20_proxy.address, provider);

        deployer
            .write(
                venue.exchange.address,
                exchange
                    .registerAssetProxy(venue.erc20_proxy.address)
                    .calldata()
                    .to_vec(),
            )
            .await?;
        deployer
            .write(
                venue.erc20_proxy.address,
                proxy
                    .addAuthorizedAddress(venue.exchange.address)
                    .calldata()
                    .to_vec(),
            )
            .await?;
    }
    Ok(venue)
}
