// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! A lazily deployed system fixture for test environments.
//!
//! Integration suites rarely want the whole system. The fixture exposes the
//! core contracts as a dependency graph: asking for one node deploys exactly
//! its transitive dependencies, fresh for every graph instance, and repeated
//! asks reuse the first deployment.

use std::sync::Arc;

use alloy::{dyn_abi::DynSolValue, primitives::U256, providers::Provider};
use futures::FutureExt;

use crate::{
    core::{
        deployer::Deployer,
        graph::{Deps, Graph, GraphBuilder},
        resolver::{self, ContractHandle, ContractSpec},
    },
    ops::melon::FACTORY_NAMES,
};

/// Shared context the fixture graph builds against.
#[derive(Debug)]
pub struct Fixture<P> {
    deployer: Arc<Deployer<P>>,
}

impl<P> Fixture<P> {
    pub fn new(deployer: Arc<Deployer<P>>) -> Self {
        Self { deployer }
    }

    pub fn deployer(&self) -> &Deployer<P> {
        &self.deployer
    }
}

impl<P> Clone for Fixture<P> {
    fn clone(&self) -> Self {
        Self {
            deployer: self.deployer.clone(),
        }
    }
}

/// Builds the testing-track fixture graph.
///
/// Node names are the kebab-cased artifact names, except for the tokens and
/// the price source which go by their system roles: `weth`, `mln` and
/// `price-source`.
pub fn testing_fixture<P>() -> crate::Result<Graph<Fixture<P>, ContractHandle>>
where
    P: Provider + 'static,
{
    let mut builder = GraphBuilder::new()
        .node(
            "weth",
            &[],
            Box::new(|fixture: Fixture<P>, _deps: Deps<ContractHandle>| {
                async move {
                    resolver::deploy(fixture.deployer(), ContractSpec::new("WETH"))
                        .await
                        .map_err(Into::into)
                }
                .boxed()
            }),
        )
        .node(
            "mln",
            &[],
            Box::new(|fixture: Fixture<P>, _deps: Deps<ContractHandle>| {
                async move {
                    let args = vec![
                        DynSolValue::String("MLN".to_string()),
                        DynSolValue::Uint(U256::from(18u8), 8),
                        DynSolValue::String("Melon Token".to_string()),
                    ];
                    resolver::deploy(
                        fixture.deployer(),
                        ContractSpec::new("BurnableToken").with_args(args),
                    )
                    .await
                    .map_err(Into::into)
                }
                .boxed()
            }),
        )
        .node(
            "price-source",
            &["weth"],
            Box::new(|fixture: Fixture<P>, deps: Deps<ContractHandle>| {
                async move {
                    let weth = deps.get("weth")?.address;
                    let args = vec![
                        DynSolValue::Address(weth),
                        DynSolValue::Uint(U256::from(18u8), 256),
                    ];
                    resolver::deploy(
                        fixture.deployer(),
                        ContractSpec::new("TestingPriceFeed").with_args(args),
                    )
                    .await
                    .map_err(Into::into)
                }
                .boxed()
            }),
        )
        .node(
            "registry",
            &[],
            Box::new(|fixture: Fixture<P>, _deps: Deps<ContractHandle>| {
                async move {
                    let args = vec![DynSolValue::Address(fixture.deployer().sender())];
                    resolver::deploy(
                        fixture.deployer(),
                        ContractSpec::new("Registry").with_args(args),
                    )
                    .await
                    .map_err(Into::into)
                }
                .boxed()
            }),
        )
        .node(
            "engine",
            &["registry"],
            Box::new(|fixture: Fixture<P>, deps: Deps<ContractHandle>| {
                async move {
                    let registry = deps.get("registry")?.address;
                    let args = vec![
                        DynSolValue::Uint(U256::ZERO, 256),
                        DynSolValue::Address(registry),
                    ];
                    resolver::deploy(
                        fixture.deployer(),
                        ContractSpec::new("Engine").with_args(args),
                    )
                    .await
                    .map_err(Into::into)
                }
                .boxed()
            }),
        );

    let factory_nodes: Vec<String> = FACTORY_NAMES.iter().map(|name| node_name(name)).collect();
    for (artifact, node) in FACTORY_NAMES.iter().zip(&factory_nodes) {
        let artifact = *artifact;
        builder = builder.node(
            node,
            &[],
            Box::new(move |fixture: Fixture<P>, _deps: Deps<ContractHandle>| {
                async move {
                    resolver::deploy(fixture.deployer(), ContractSpec::new(artifact))
                        .await
                        .map_err(Into::into)
                }
                .boxed()
            }),
        );
    }

    let mut version_deps: Vec<&str> = factory_nodes.iter().map(String::as_str).collect();
    version_deps.push("registry");
    let factories_in_order = factory_nodes.clone();
    builder = builder.node(
        "version",
        &version_deps,
        Box::new(move |fixture: Fixture<P>, deps: Deps<ContractHandle>| {
            let factories = factories_in_order.clone();
            async move {
                let mut args = Vec::with_capacity(factories.len() + 2);
                for node in &factories {
                    args.push(DynSolValue::Address(deps.get(node)?.address));
                }
                args.push(DynSolValue::Address(deps.get("registry")?.address));
                args.push(DynSolValue::Address(fixture.deployer().sender()));
                resolver::deploy(
                    fixture.deployer(),
                    ContractSpec::new("Version").with_args(args),
                )
                .await
                .map_err(Into::into)
            }
            .boxed()
        }),
    );

    for artifact in ["KyberAdapter", "OasisDexAdapter", "ZeroExV2Adapter", "EngineAdapter"] {
        builder = builder.node(
            &node_name(artifact),
            &[],
            Box::new(move |fixture: Fixture<P>, _deps: Deps<ContractHandle>| {
                async move {
                    resolver::deploy(fixture.deployer(), ContractSpec::new(artifact))
                        .await
                        .map_err(Into::into)
                }
                .boxed()
            }),
        );
    }

    builder.build().map_err(Into::into)
}

fn node_name(artifact: &str) -> String {
    let chars: Vec<char> = artifact.chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_ascii_lowercase();
            let next_lower = i + 1 < chars.len() && chars[i + 1].is_ascii_lowercase();
            if i > 0 && (prev_lower || next_lower) {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
