// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Kyber network venue: network, proxy, conversion rates and one reserve.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
    providers::Provider,
};

use crate::{
    contracts::{IConversionRates, IKyberNetwork, IKyberNetworkProxy, IKyberReserve, KYBER_ETH_TOKEN},
    core::{
        deployer::Deployer,
        manifest::{KyberConf, KyberSection},
        resolver::{self, ContractHandle, ContractSpec},
    },
    ops::tokens::Tokens,
};

#[derive(Debug, Clone)]
pub struct KyberVenue {
    pub network: ContractHandle,
    pub network_proxy: ContractHandle,
    pub conversion_rates: ContractHandle,
    pub reserve: ContractHandle,
}

impl KyberVenue {
    /// True when this run deployed any part of the venue, meaning the
    /// contracts still need to be pointed at each other.
    pub fn freshly_deployed(&self) -> bool {
        self.network.deployed
            || self.network_proxy.deployed
            || self.conversion_rates.deployed
            || self.reserve.deployed
    }
}

/// Obtains the Kyber venue, wiring its contracts together after a fresh
/// deployment. Adopted venues are assumed to be wired already.
pub async fn nab_kyber<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut KyberSection,
    tokens: &Tokens,
) -> crate::Result<KyberVenue> {
    let admin = DynSolValue::Address(deployer.sender());

    let conversion_rates = resolver::nab(
        deployer,
        ContractSpec::new("ConversionRates").with_args(vec![admin.clone()]),
        &mut section.addr,
    )
    .await?;
    let network = resolver::nab(
        deployer,
        ContractSpec::new("KyberNetwork").with_args(vec![admin.clone()]),
        &mut section.addr,
    )
    .await?;
    let network_proxy = resolver::nab(
        deployer,
        ContractSpec::new("KyberNetworkProxy").with_args(vec![admin.clone()]),
        &mut section.addr,
    )
    .await?;
    let reserve = resolver::nab(
        deployer,
        ContractSpec::new("KyberReserve").with_args(vec![
            DynSolValue::Address(network.address),
            DynSolValue::Address(conversion_rates.address),
            admin,
        ]),
        &mut section.addr,
    )
    .await?;

    let venue = KyberVenue {
        network,
        network_proxy,
        conversion_rates,
        reserve,
    };
    if venue.freshly_deployed() {
        wire(deployer, &venue, &section.conf, tokens).await?;
    }
    Ok(venue)
}

async fn wire<P: Provider>(
    deployer: &Deployer<P>,
    venue: &KyberVenue,
    conf: &KyberConf,
    tokens: &Tokens,
) -> crate::Result<()> {
    debug!(@grey, "wiring the kyber venue");
    let mln = tokens.mln()?.address;
    let provider = deployer.provider();
    let rates = IConversionRates::new(venue.conversion_rates.address, provider);
    let network = IKyberNetwork::new(venue.network.address, provider);
    let proxy = IKyberNetworkProxy::new(venue.network_proxy.address, provider);
    let reserve = IKyberReserve::new(venue.reserve.address, provider);

    let duration = U256::from(conf.rate_duration_blocks);
    deployer
        .write(
            venue.conversion_rates.address,
            rates.setValidRateDurationInBlocks(duration).calldata().to_vec(),
        )
        .await?;
    deployer
        .write(
            venue.conversion_rates.address,
            rates.addToken(mln).calldata().to_vec(),
        )
        .await?;
    deployer
        .write(
            venue.conversion_rates.address,
            rates.enableTokenTrade(mln).calldata().to_vec(),
        )
        .await?;

    deployer
        .write(
            venue.network.address,
            network
                .setKyberProxy(venue.network_proxy.address)
                .calldata()
                .to_vec(),
        )
        .await?;
    deployer
        .write(
            venue.network_proxy.address,
            proxy
                .setKyberNetworkContract(venue.network.address)
                .calldata()
                .to_vec(),
        )
        .await?;
    deployer
        .write(
            venue.network.address,
            network
                .addReserve(venue.reserve.address, true)
                .calldata()
                .to_vec(),
        )
        .await?;
    deployer
        .write(
            venue.reserve.address,
            reserve
                .setContracts(
                    venue.network.address,
                    venue.conversion_rates.address,
                    Address::ZERO,
                )
                .calldata()
                .to_vec(),
        )
        .await?;
    deployer
        .write(
            venue.network.address,
            network
                .listPairForReserve(venue.reserve.address, mln, KYBER_ETH_TOKEN, true)
                .calldata()
                .to_vec(),
        )
        .await?;
    Ok(())
}
