// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! The Melon core: registry, engine, fund component factories, version,
//! exchange adapters, policies and fees.
//!
//! Registry writes are reconciling: every setter reads the current on-chain
//! value first and is skipped when nothing would change, so re-running a
//! completed deployment leaves the chain untouched.

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
    providers::Provider,
};
use futures::future::try_join_all;

use crate::{
    contracts::{selector, IRegistry, CANCEL_ORDER, MAKE_ORDER, TAKE_ORDER},
    core::{
        deployer::Deployer,
        manifest::{MelonSection, TokenConf, TokensConf},
        resolver::{self, ContractHandle, ContractSpec},
    },
    ops::{conf_address, tokens::Tokens},
    utils::color::DebugColor,
};

/// Factories for the components every fund is assembled from, in the order
/// the version contract takes them.
pub const FACTORY_NAMES: [&str; 7] = [
    "AccountingFactory",
    "FeeManagerFactory",
    "ParticipationFactory",
    "SharesFactory",
    "TradingFactory",
    "VaultFactory",
    "PolicyManagerFactory",
];

#[derive(Debug, Clone)]
pub struct Adapters {
    pub kyber: ContractHandle,
    pub oasis: ContractHandle,
    pub zeroex: ContractHandle,
    pub engine: ContractHandle,
}

#[derive(Debug, Clone)]
pub struct PoliciesAndFees {
    pub price_tolerance: ContractHandle,
    pub user_whitelist: ContractHandle,
    pub management_fee: ContractHandle,
    pub performance_fee: ContractHandle,
}

/// Everything a registry setter write needs to become a reconciling write.
pub(crate) async fn sync_pointer<P: Provider>(
    deployer: &Deployer<P>,
    registry: Address,
    what: &str,
    current: Address,
    desired: Address,
    calldata: Vec<u8>,
) -> crate::Result<()> {
    if current == desired {
        debug!(@grey, "registry {what} already points at {}", desired.debug_lavender());
        return Ok(());
    }
    deployer.write(registry, calldata).await?;
    debug!(@grey, "registry {what} set to {}", desired.debug_lavender());
    Ok(())
}

/// Obtains the registry and the engine, in that order. The engine is born
/// knowing the registry, the registry learns about the engine later in
/// [`configure_registry`].
pub async fn nab_registry_and_engine<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut MelonSection,
) -> crate::Result<(ContractHandle, ContractHandle)> {
    let owner = DynSolValue::Address(deployer.sender());
    let registry = resolver::nab(
        deployer,
        ContractSpec::new("Registry").with_args(vec![owner]),
        &mut section.addr,
    )
    .await?;

    let delay = U256::from(section.conf.engine_delay_seconds);
    let engine = resolver::nab(
        deployer,
        ContractSpec::new("Engine").with_args(vec![
            DynSolValue::Uint(delay, 256),
            DynSolValue::Address(registry.address),
        ]),
        &mut section.addr,
    )
    .await?;
    Ok((registry, engine))
}

/// Points the registry at the system's price source, tokens and engine.
pub async fn configure_registry<P: Provider>(
    deployer: &Deployer<P>,
    registry: &ContractHandle,
    price_source: &ContractHandle,
    tokens: &Tokens,
    engine: &ContractHandle,
) -> crate::Result<()> {
    let instance = IRegistry::new(registry.address, deployer.provider());
    let mln = tokens.mln()?.address;
    let weth = tokens.weth()?.address;

    sync_pointer(
        deployer,
        registry.address,
        "price source",
        instance.priceSource().call().await?,
        price_source.address,
        instance
            .setPriceSource(price_source.address)
            .calldata()
            .to_vec(),
    )
    .await?;
    sync_pointer(
        deployer,
        registry.address,
        "mln token",
        instance.mlnToken().call().await?,
        mln,
        instance.setMlnToken(mln).calldata().to_vec(),
    )
    .await?;
    sync_pointer(
        deployer,
        registry.address,
        "native asset",
        instance.nativeAsset().call().await?,
        weth,
        instance.setNativeAsset(weth).calldata().to_vec(),
    )
    .await?;
    sync_pointer(
        deployer,
        registry.address,
        "engine",
        instance.engine().call().await?,
        engine.address,
        instance.setEngine(engine.address).calldata().to_vec(),
    )
    .await?;
    Ok(())
}

/// Obtains the seven fund component factories.
pub async fn nab_factories<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut MelonSection,
) -> crate::Result<Vec<ContractHandle>> {
    let mut factories = Vec::with_capacity(FACTORY_NAMES.len());
    for name in FACTORY_NAMES {
        factories.push(resolver::nab(deployer, ContractSpec::new(name), &mut section.addr).await?);
    }
    Ok(factories)
}

/// Obtains the version contract, the public entry point for setting up funds.
pub async fn nab_version<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut MelonSection,
    factories: &[ContractHandle],
    registry: &ContractHandle,
) -> crate::Result<ContractHandle> {
    let owner = match &section.conf.version_owner {
        Some(value) => conf_address("version_owner", value)?,
        None => deployer.sender(),
    };

    let mut args: Vec<DynSolValue> = factories
        .iter()
        .map(|factory| DynSolValue::Address(factory.address))
        .collect();
    args.push(DynSolValue::Address(registry.address));
    args.push(DynSolValue::Address(owner));

    resolver::nab(
        deployer,
        ContractSpec::new("Version").with_args(args),
        &mut section.addr,
    )
    .await
    .map_err(Into::into)
}

/// Points the registry at the version contract funds are created through.
pub async fn link_fund_factory<P: Provider>(
    deployer: &Deployer<P>,
    registry: &ContractHandle,
    version: &ContractHandle,
) -> crate::Result<()> {
    let instance = IRegistry::new(registry.address, deployer.provider());
    sync_pointer(
        deployer,
        registry.address,
        "fund factory",
        instance.fundFactory().call().await?,
        version.address,
        instance
            .setFundFactory(version.address)
            .calldata()
            .to_vec(),
    )
    .await
}

/// Obtains the per-venue exchange adapters.
pub async fn nab_adapters<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut MelonSection,
) -> crate::Result<Adapters> {
    let kyber = resolver::nab(deployer, ContractSpec::new("KyberAdapter"), &mut section.addr).await?;
    let oasis = resolver::nab(
        deployer,
        ContractSpec::new("OasisDexAdapter"),
        &mut section.addr,
    )
    .await?;
    let zeroex = resolver::nab(
        deployer,
        ContractSpec::new("ZeroExV2Adapter"),
        &mut section.addr,
    )
    .await?;
    let engine = resolver::nab(
        deployer,
        ContractSpec::new("EngineAdapter"),
        &mut section.addr,
    )
    .await?;
    Ok(Adapters {
        kyber,
        oasis,
        zeroex,
        engine,
    })
}

/// Obtains the default risk policies and fees funds can opt into.
pub async fn nab_policies_and_fees<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut MelonSection,
) -> crate::Result<PoliciesAndFees> {
    let mut whitelisted = Vec::with_capacity(section.conf.user_whitelist.len());
    for value in &section.conf.user_whitelist {
        whitelisted.push(DynSolValue::Address(conf_address("user_whitelist", value)?));
    }
    let tolerance = U256::from(section.conf.price_tolerance_percent);

    let price_tolerance = resolver::nab(
        deployer,
        ContractSpec::new("PriceTolerance").with_args(vec![DynSolValue::Uint(tolerance, 256)]),
        &mut section.addr,
    )
    .await?;
    let user_whitelist = resolver::nab(
        deployer,
        ContractSpec::new("UserWhitelist").with_args(vec![DynSolValue::Array(whitelisted)]),
        &mut section.addr,
    )
    .await?;
    let management_fee = resolver::nab(
        deployer,
        ContractSpec::new("ManagementFee"),
        &mut section.addr,
    )
    .await?;
    let performance_fee = resolver::nab(
        deployer,
        ContractSpec::new("PerformanceFee"),
        &mut section.addr,
    )
    .await?;
    Ok(PoliciesAndFees {
        price_tolerance,
        user_whitelist,
        management_fee,
        performance_fee,
    })
}

/// Registers the given fees with the registry, skipping the known ones.
pub async fn register_fees<P: Provider>(
    deployer: &Deployer<P>,
    registry: &ContractHandle,
    fees: &[&ContractHandle],
) -> crate::Result<()> {
    let instance = IRegistry::new(registry.address, deployer.provider());
    let mut missing = Vec::new();
    for fee in fees {
        if !instance.isFeeRegistered(fee.address).call().await? {
            missing.push(fee.address);
        }
    }
    if missing.is_empty() {
        debug!(@grey, "all fees already registered");
        return Ok(());
    }

    info!(@grey, "registering {} fees", missing.len());
    deployer
        .write(
            registry.address,
            instance.registerFees(missing).calldata().to_vec(),
        )
        .await?;
    Ok(())
}

/// One venue to adapter pairing the registry should know about.
#[derive(Debug, Clone, Copy)]
pub struct AdapterRegistration {
    pub exchange: Address,
    pub adapter: Address,
    pub takes_custody: bool,
}

/// Registers venue adapters with the registry. Already-known adapters are
/// filtered out first, the remaining writes go out together.
pub async fn register_exchange_adapters<P: Provider>(
    deployer: &Deployer<P>,
    registry: &ContractHandle,
    registrations: &[AdapterRegistration],
) -> crate::Result<()> {
    let instance = IRegistry::new(registry.address, deployer.provider());
    let mut missing = Vec::new();
    for registration in registrations {
        if !instance
            .exchangeAdapterIsRegistered(registration.adapter)
            .call()
            .await?
        {
            missing.push(*registration);
        }
    }
    if missing.is_empty() {
        debug!(@grey, "all exchange adapters already registered");
        return Ok(());
    }

    info!(@grey, "registering {} exchange adapters", missing.len());
    let sigs = vec![selector(MAKE_ORDER), selector(TAKE_ORDER), selector(CANCEL_ORDER)];
    let writes = missing.iter().map(|registration| {
        let calldata = instance
            .registerExchangeAdapter(
                registration.exchange,
                registration.adapter,
                registration.takes_custody,
                sigs.clone(),
            )
            .calldata()
            .to_vec();
        deployer.write(registry.address, calldata)
    });
    try_join_all(writes).await?;
    Ok(())
}

/// Registers every configured token as a tradable asset, skipping the known
/// ones.
pub async fn register_assets<P: Provider>(
    deployer: &Deployer<P>,
    registry: &ContractHandle,
    tokens: &Tokens,
    conf: &TokensConf,
) -> crate::Result<()> {
    let instance = IRegistry::new(registry.address, deployer.provider());
    let mut missing: Vec<(&TokenConf, Address)> = Vec::new();
    for token in &conf.tokens {
        let handle = tokens.get(&token.symbol)?;
        if !instance.assetIsRegistered(handle.address).call().await? {
            missing.push((token, handle.address));
        }
    }
    if missing.is_empty() {
        debug!(@grey, "all assets already registered");
        return Ok(());
    }

    info!(@grey, "registering {} assets", missing.len());
    let writes = missing.iter().map(|(token, address)| {
        let calldata = instance
            .registerAsset(
                *address,
                token.display_name().to_string(),
                token.symbol.clone(),
                String::new(),
                U256::ZERO,
                vec![],
                vec![],
            )
            .calldata()
            .to_vec();
        deployer.write(registry.address, calldata)
    });
    try_join_all(writes).await?;
    Ok(())
}

/// Hands registry ownership to the configured owner, once everything else
/// is in place. A no-op when the deploy account keeps ownership.
pub async fn transfer_ownership<P: Provider>(
    deployer: &Deployer<P>,
    registry: &ContractHandle,
    new_owner: Address,
) -> crate::Result<()> {
    if new_owner == deployer.sender() {
        return Ok(());
    }
    let instance = IRegistry::new(registry.address, deployer.provider());
    if instance.owner().call().await? == new_owner {
        return Ok(());
    }

    info!(@grey, "handing registry ownership to {}", new_owner.debug_lavender());
    deployer
        .write(
            registry.address,
            instance.transferOwnership(new_owner).calldata().to_vec(),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use alloy::{
        json_abi::JsonAbi,
        primitives::{address, Bytes},
        providers::{mock::Asserter, ProviderBuilder},
    };
    use tempfile::TempDir;

    use crate::{
        core::{
            artifacts::ArtifactsConfig,
            deployer::DeployerConfig,
            manifest::TokensSection,
            submit::SubmitError,
        },
        ops::tokens::nab_tokens,
    };

    use super::*;

    const SENDER: Address = address!("0x00000000000000000000000000000000000a11ce");
    const REGISTRY: Address = address!("0x0000000000000000000000000000000000c0ffee");
    const ENGINE: Address = address!("0x000000000000000000000000000000000000beef");
    const WETH: Address = address!("0x000000000000000000000000000000000000cafe");

    fn mocked_deployer(asserter: &Asserter, config: DeployerConfig) -> Deployer<impl Provider> {
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        Deployer::new(provider, SENDER, 1, config)
    }

    fn handle(name: &str, address: Address) -> ContractHandle {
        ContractHandle {
            name: name.to_string(),
            address,
            abi: JsonAbi::default(),
            deployed: false,
        }
    }

    /// ABI-encoded `bool` word, the answer to the registry's
    /// is-registered reads.
    fn registered(yes: bool) -> Bytes {
        let mut word = [0u8; 32];
        word[31] = yes as u8;
        Bytes::from(word.to_vec())
    }

    #[test]
    fn the_version_takes_seven_factories() {
        assert_eq!(FACTORY_NAMES.len(), 7);
        assert_eq!(FACTORY_NAMES[0], "AccountingFactory");
        assert_eq!(FACTORY_NAMES[6], "PolicyManagerFactory");
    }

    #[tokio::test]
    async fn matching_pointers_are_left_alone() {
        let asserter = Asserter::new();
        let deployer = mocked_deployer(&asserter, DeployerConfig::default());

        // nothing is queued, so an attempted write would surface an error
        sync_pointer(&deployer, REGISTRY, "engine", ENGINE, ENGINE, vec![])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stale_pointers_are_rewritten() {
        let asserter = Asserter::new();
        let deployer = mocked_deployer(&asserter, DeployerConfig::default());

        // the empty transport fails the write attempt
        let err = sync_pointer(&deployer, REGISTRY, "engine", Address::ZERO, ENGINE, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Submit(SubmitError::Rpc(_))));
    }

    #[tokio::test]
    async fn registered_fees_are_not_resent() {
        let asserter = Asserter::new();
        let deployer = mocked_deployer(&asserter, DeployerConfig::default());
        let registry = handle("Registry", REGISTRY);
        let fee = handle("ManagementFee", address!("0x000000000000000000000000000000000000f0f0"));

        asserter.push_success(&registered(true));
        register_fees(&deployer, &registry, &[&fee]).await.unwrap();
    }

    #[tokio::test]
    async fn known_exchange_adapters_are_not_reregistered() {
        let asserter = Asserter::new();
        let deployer = mocked_deployer(&asserter, DeployerConfig::default());
        let registry = handle("Registry", REGISTRY);
        let registration = AdapterRegistration {
            exchange: address!("0x0000000000000000000000000000000000000e5c"),
            adapter: address!("0x000000000000000000000000000000000000ada0"),
            takes_custody: false,
        };

        asserter.push_success(&registered(true));
        register_exchange_adapters(&deployer, &registry, &[registration])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn registered_assets_are_not_reregistered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("WETH.abi"), "[]").unwrap();
        fs::write(dir.path().join("WETH.bin"), "6000").unwrap();
        let config = DeployerConfig {
            artifacts: ArtifactsConfig {
                dir: dir.path().to_path_buf(),
            },
            ..Default::default()
        };
        let asserter = Asserter::new();
        let deployer = mocked_deployer(&asserter, config);

        // a booked address adopts without touching the chain
        let mut section = TokensSection::default();
        section.conf.tokens = vec![TokenConf::new("WETH", 18)];
        section.addr.set("WETH", WETH);
        let tokens = nab_tokens(&deployer, &mut section).await.unwrap();

        let registry = handle("Registry", REGISTRY);
        asserter.push_success(&registered(true));
        register_assets(&deployer, &registry, &tokens, &section.conf)
            .await
            .unwrap();
    }
}
