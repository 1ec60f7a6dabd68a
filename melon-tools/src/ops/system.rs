// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Whole-system orchestration.
//!
//! [`deploy_system`] walks the subsystems in dependency order, deploying
//! whatever the manifest asks for and adopting the rest. The evolving
//! manifest is checkpointed to disk after every subsystem so an aborted run
//! can pick up where it stopped instead of starting over.

use std::path::{Path, PathBuf};

use alloy::providers::Provider;

use crate::{
    core::{deployer::Deployer, manifest::Manifest, resolver::ContractHandle},
    ops::{
        conf_address,
        kyber::{self, KyberVenue},
        melon::{self, AdapterRegistration, Adapters, PoliciesAndFees},
        oasis, pricefeed,
        tokens::{self, Tokens},
        zeroex::{self, ZeroExVenue},
    },
    utils::color::DebugColor,
};

/// Typed view over every contract a finished deployment consists of.
#[derive(Debug, Clone)]
pub struct DeployedSystem {
    pub tokens: Tokens,
    pub kyber: KyberVenue,
    pub oasis: ContractHandle,
    pub zeroex: ZeroExVenue,
    pub price_source: ContractHandle,
    pub registry: ContractHandle,
    pub engine: ContractHandle,
    pub factories: Vec<ContractHandle>,
    pub version: ContractHandle,
    pub adapters: Adapters,
    pub policies_and_fees: PoliciesAndFees,
}

/// Deploys or adopts the full system described by the manifest.
///
/// The returned manifest holds the address of every contract the system now
/// runs on. When `checkpoint_path` is given, that state is also flushed to
/// disk after each completed subsystem.
pub async fn deploy_system<P: Provider>(
    deployer: &Deployer<P>,
    mut manifest: Manifest,
    checkpoint_path: Option<&Path>,
) -> crate::Result<(DeployedSystem, Manifest)> {
    info!(@grey, "deploying the melon system as {}", deployer.sender().debug_lavender());

    let tokens = tokens::nab_tokens(deployer, &mut manifest.tokens).await?;
    checkpoint(&manifest, checkpoint_path)?;

    let kyber = kyber::nab_kyber(deployer, &mut manifest.kyber, &tokens).await?;
    checkpoint(&manifest, checkpoint_path)?;

    let oasis = oasis::nab_oasis(deployer, &mut manifest.oasis, &tokens).await?;
    checkpoint(&manifest, checkpoint_path)?;

    let zeroex = zeroex::nab_zeroex(deployer, &mut manifest.zeroex).await?;
    checkpoint(&manifest, checkpoint_path)?;

    let price_source =
        pricefeed::nab_price_source(deployer, &mut manifest.melon, &tokens, Some(&kyber)).await?;
    checkpoint(&manifest, checkpoint_path)?;

    let (registry, engine) = melon::nab_registry_and_engine(deployer, &mut manifest.melon).await?;
    checkpoint(&manifest, checkpoint_path)?;
    melon::configure_registry(deployer, &registry, &price_source, &tokens, &engine).await?;

    let factories = melon::nab_factories(deployer, &mut manifest.melon).await?;
    checkpoint(&manifest, checkpoint_path)?;

    let version = melon::nab_version(deployer, &mut manifest.melon, &factories, &registry).await?;
    checkpoint(&manifest, checkpoint_path)?;
    melon::link_fund_factory(deployer, &registry, &version).await?;

    let adapters = melon::nab_adapters(deployer, &mut manifest.melon).await?;
    checkpoint(&manifest, checkpoint_path)?;

    let policies_and_fees = melon::nab_policies_and_fees(deployer, &mut manifest.melon).await?;
    checkpoint(&manifest, checkpoint_path)?;

    melon::register_fees(
        deployer,
        &registry,
        &[
            &policies_and_fees.management_fee,
            &policies_and_fees.performance_fee,
        ],
    )
    .await?;

    let registrations = [
        AdapterRegistration {
            exchange: kyber.network_proxy.address,
            adapter: adapters.kyber.address,
            takes_custody: false,
        },
        AdapterRegistration {
            exchange: oasis.address,
            adapter: adapters.oasis.address,
            takes_custody: true,
        },
        AdapterRegistration {
            exchange: zeroex.exchange.address,
            adapter: adapters.zeroex.address,
            takes_custody: false,
        },
        AdapterRegistration {
            exchange: engine.address,
            adapter: adapters.engine.address,
            takes_custody: false,
        },
    ];
    melon::register_exchange_adapters(deployer, &registry, &registrations).await?;
    melon::register_assets(deployer, &registry, &tokens, &manifest.tokens.conf).await?;

    if let Some(owner) = &manifest.melon.conf.registry_owner {
        let owner = conf_address("registry_owner", owner)?;
        melon::transfer_ownership(deployer, &registry, owner).await?;
    }

    mintln!("the melon system is ready");
    let system = DeployedSystem {
        tokens,
        kyber,
        oasis,
        zeroex,
        price_source,
        registry,
        engine,
        factories,
        version,
        adapters,
        policies_and_fees,
    };
    Ok((system, manifest))
}

fn checkpoint(manifest: &Manifest, path: Option<&Path>) -> crate::Result<()> {
    if let Some(path) = path {
        manifest.save(path)?;
    }
    Ok(())
}

/// How a redeployment run picks and reworks its input manifest.
#[derive(Debug, Clone, Default)]
pub struct RedeployConfig {
    /// Pristine input manifest.
    pub deploy_in: PathBuf,
    /// Where the completed manifest, and every checkpoint on the way, goes.
    pub deploy_out: PathBuf,
    /// Start over from the pristine input instead of the previous output.
    pub redeploy_all: bool,
    /// Apply the force list even when a full redeploy was requested.
    pub force_partial: bool,
    /// Manifest slots to blank before deploying, as (category, name) pairs.
    pub force: Vec<(String, String)>,
}

/// Redeploys the system, forcing fresh deployments of the named contracts
/// and adopting everything else from the previous run.
pub async fn partial_redeploy<P: Provider>(
    deployer: &Deployer<P>,
    config: &RedeployConfig,
) -> crate::Result<(DeployedSystem, Manifest)> {
    let (source, full) = manifest_source(config);
    debug!(@grey, "loading manifest from {}", source.display());

    let mut manifest = Manifest::load(&source)?;
    if !full {
        for (category, name) in &config.force {
            manifest.blank(category, name)?;
            debug!(@grey, "forcing a redeploy of {category}/{name}");
        }
    }

    let (system, manifest) = deploy_system(deployer, manifest, Some(&config.deploy_out)).await?;
    manifest.save(&config.deploy_out)?;
    info!(@grey, "wrote the manifest to {}", config.deploy_out.display());
    Ok((system, manifest))
}

/// Picks the manifest a run starts from. A full redeploy goes back to the
/// pristine input, anything else continues from the previous output when
/// one exists.
fn manifest_source(config: &RedeployConfig) -> (PathBuf, bool) {
    let full = config.redeploy_all && !config.force_partial;
    if full || !config.deploy_out.exists() {
        (config.deploy_in.clone(), full)
    } else {
        (config.deploy_out.clone(), full)
    }
}
