// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Price source selection.
//!
//! The testing track runs against a feed the deploy account can push prices
//! into. The kyber-price track derives prices from the deployed Kyber venue
//! and therefore requires one.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
    providers::Provider,
};

use crate::{
    contracts::ITestingPriceFeed,
    core::{
        deployer::Deployer,
        manifest::{MelonSection, Track},
        resolver::{self, ContractHandle, ContractSpec},
    },
    ops::{kyber::KyberVenue, tokens::Tokens, SystemError},
};

/// Manifest key the active price source is tracked under, whichever artifact
/// implements it.
pub const PRICE_SOURCE_KEY: &str = "PriceSource";

/// Obtains the price source for the configured track.
pub async fn nab_price_source<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut MelonSection,
    tokens: &Tokens,
    kyber: Option<&KyberVenue>,
) -> crate::Result<ContractHandle> {
    let weth = tokens.weth()?.address;

    match section.conf.track {
        Track::Testing => {
            let args = vec![
                DynSolValue::Address(weth),
                DynSolValue::Uint(U256::from(18u8), 256),
            ];
            let feed = resolver::nab(
                deployer,
                ContractSpec::new("TestingPriceFeed")
                    .with_key(PRICE_SOURCE_KEY)
                    .with_args(args),
                &mut section.addr,
            )
            .await?;

            if feed.deployed {
                seed_prices(deployer, &feed, tokens).await?;
            }
            Ok(feed)
        }
        Track::KyberPrice => {
            let venue = kyber.ok_or_else(|| {
                crate::Error::from(SystemError::MissingVenue {
                    name: "kyber".to_string(),
                })
            })?;
            let args = vec![
                DynSolValue::Address(venue.network_proxy.address),
                DynSolValue::Address(weth),
                DynSolValue::Uint(U256::from(section.conf.max_spread_percent), 256),
                DynSolValue::Uint(U256::from(section.conf.initial_update_delay_seconds), 256),
            ];
            resolver::nab(
                deployer,
                ContractSpec::new("KyberPriceFeed")
                    .with_key(PRICE_SOURCE_KEY)
                    .with_args(args),
                &mut section.addr,
            )
            .await
            .map_err(Into::into)
        }
    }
}

/// Pushes a unit price for every token so freshly deployed funds can value
/// their holdings immediately.
async fn seed_prices<P: Provider>(
    deployer: &Deployer<P>,
    feed: &ContractHandle,
    tokens: &Tokens,
) -> crate::Result<()> {
    debug!(@grey, "seeding initial prices on the testing feed");
    let unit = U256::from(1_000_000_000_000_000_000u64);
    let assets: Vec<Address> = tokens.iter().map(|(_, token)| token.address).collect();
    let prices = vec![unit; assets.len()];

    let instance = ITestingPriceFeed::new(feed.address, deployer.provider());
    deployer
        .write(
            feed.address,
            instance.update(assets, prices).calldata().to_vec(),
        )
        .await?;
    Ok(())
}
