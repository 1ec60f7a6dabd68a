// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Docker-backed local devnet for integration tests.

use alloy::{
    network::EthereumWallet,
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use eyre::{Result, WrapErr};
use reqwest::{header::HeaderValue, Method, Response};
use testcontainers::{
    core::{wait::HttpWaitStrategy, IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use crate::core::deployer::{self, Deployer, DeployerConfig};

/// First prefunded anvil account.
pub const DEVNET_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

const ANVIL_IMAGE_NAME: &str = "ghcr.io/foundry-rs/foundry";
const ANVIL_IMAGE_TAG: &str = "stable";
const ANVIL_PORT: u16 = 8545;

/// Manages a throwaway anvil node for deploying against.
pub struct Node {
    _container: ContainerAsync<GenericImage>,
    rpc: String,
}

impl Node {
    /// Starts an anvil devnet in the background. The node is shut down when
    /// this struct is dropped.
    pub async fn new() -> Result<Self> {
        let wait_strategy = HttpWaitStrategy::new("/")
            .with_port(ANVIL_PORT.into())
            .with_method(Method::POST)
            .with_header("Content-Type", HeaderValue::from_static("application/json"))
            .with_body(r#"{"jsonrpc":"2.0","method":"net_version","params":[],"id":1}"#)
            .with_response_matcher_async(anvil_response_matcher);
        let container = GenericImage::new(ANVIL_IMAGE_NAME, ANVIL_IMAGE_TAG)
            .with_exposed_port(ANVIL_PORT.tcp())
            .with_wait_for(WaitFor::Http(wait_strategy))
            .with_cmd(vec!["anvil --host 0.0.0.0"])
            .start()
            .await
            .wrap_err("failed to start the anvil container")?;
        let port = container
            .get_host_port_ipv4(ANVIL_PORT)
            .await
            .wrap_err("failed to get the anvil RPC port")?;
        let rpc = format!("http://localhost:{port}");
        Ok(Node {
            _container: container,
            rpc,
        })
    }

    /// The node's RPC endpoint on the host.
    pub fn rpc(&self) -> &str {
        &self.rpc
    }

    /// Creates a provider signing with the devnet account.
    pub async fn create_provider(&self) -> Result<impl Provider> {
        let signer: PrivateKeySigner = DEVNET_PRIVATE_KEY
            .parse()
            .expect("failed to parse devnet private key");
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect(self.rpc())
            .await?;
        Ok(provider)
    }

    /// Creates a deployer bound to this node, signing with the devnet
    /// account. Everything but the endpoint and keys is taken from `config`.
    pub async fn create_deployer(&self, config: DeployerConfig) -> Result<Deployer<impl Provider>> {
        let config = DeployerConfig {
            endpoint: self.rpc().to_string(),
            private_keys: vec![DEVNET_PRIVATE_KEY.to_string()],
            ..config
        };
        let deployer = deployer::connect(config).await?;
        Ok(deployer)
    }
}

async fn anvil_response_matcher(response: Response) -> bool {
    let Ok(text) = response.text().await else {
        return false;
    };
    text.contains("result")
}
