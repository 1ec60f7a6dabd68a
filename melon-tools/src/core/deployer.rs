// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Deployment environment.

use std::{fs, path::PathBuf};

use alloy::{
    network::{Ethereum, EthereumWallet, NetworkWallet},
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    signers::{
        local::{LocalSigner, PrivateKeySigner},
        Signer,
    },
};

use crate::{
    core::{artifacts::ArtifactsConfig, nonce::NonceManager},
    utils::color::DebugColor,
};

#[derive(Debug, Clone)]
pub struct DeployerConfig {
    /// JSON-RPC endpoint of the target network.
    pub endpoint: String,
    /// Re-query pending nonces on every transaction.
    pub local_chain: bool,
    /// Fall back to deployment when an adopted address has no code.
    pub verify_adopted_code: bool,
    pub artifacts: ArtifactsConfig,
    /// Encrypted keystore holding the deploy account.
    pub keystore_path: Option<PathBuf>,
    /// File holding the keystore password.
    pub keystore_password_path: Option<PathBuf>,
    /// Raw hex private keys to preload alongside the keystore.
    pub private_keys: Vec<String>,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8545".to_string(),
            local_chain: false,
            verify_adopted_code: false,
            artifacts: ArtifactsConfig::default(),
            keystore_path: None,
            keystore_password_path: None,
            private_keys: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeployerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("rpc error: {0}")]
    Rpc(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),
    #[error("signer error: {0}")]
    Signer(#[from] alloy::signers::local::LocalSignerError),

    #[error("no signing keys configured, set KEYSTORE or PRIVATE_KEYS")]
    NoKeys,
}

/// Everything a deployment run needs to reach and write the target network.
///
/// Owns the nonce counters, so exactly one value of this type must serve an
/// entire run.
#[derive(Debug)]
pub struct Deployer<P> {
    provider: P,
    sender: Address,
    chain_id: u64,
    nonces: NonceManager,
    config: DeployerConfig,
}

impl<P> Deployer<P> {
    /// Wraps an existing wallet-backed provider; [`connect`] is the usual
    /// entry point.
    pub fn new(provider: P, sender: Address, chain_id: u64, config: DeployerConfig) -> Self {
        let nonces = NonceManager::new(config.local_chain);
        Self {
            provider,
            sender,
            chain_id,
            nonces,
            config,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Account deployment transactions are sent from.
    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    pub(crate) fn nonces(&self) -> &NonceManager {
        &self.nonces
    }
}

/// Connects to the configured endpoint and assembles the signing wallet.
pub async fn connect(config: DeployerConfig) -> Result<Deployer<impl Provider>, DeployerError> {
    let chain_id = ProviderBuilder::new()
        .connect(&config.endpoint)
        .await?
        .get_chain_id()
        .await?;
    let wallet = build_wallet(&config, chain_id)?;
    let sender = NetworkWallet::<Ethereum>::default_signer_address(&wallet);
    let provider = ProviderBuilder::new()
        .wallet(wallet)
        .connect(&config.endpoint)
        .await?;

    debug!(@grey, "connected to chain {chain_id}, sender: {}", sender.debug_lavender());
    Ok(Deployer::new(provider, sender, chain_id, config))
}

fn build_wallet(config: &DeployerConfig, chain_id: u64) -> Result<EthereumWallet, DeployerError> {
    let mut signers = Vec::new();

    if let Some(keystore) = &config.keystore_path {
        let password = match &config.keystore_password_path {
            Some(path) => fs::read_to_string(path)?.trim_end().to_string(),
            None => String::new(),
        };
        let signer =
            LocalSigner::decrypt_keystore(keystore, password)?.with_chain_id(Some(chain_id));
        signers.push(signer);
    }

    for key in &config.private_keys {
        let signer = key
            .trim()
            .parse::<PrivateKeySigner>()?
            .with_chain_id(Some(chain_id));
        signers.push(signer);
    }

    let mut signers = signers.into_iter();
    let Some(default) = signers.next() else {
        return Err(DeployerError::NoKeys);
    };
    let mut wallet = EthereumWallet::new(default);
    for signer in signers {
        wallet.register_signer(signer);
    }
    Ok(wallet)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn wallet_requires_at_least_one_key() {
        let config = DeployerConfig::default();
        let err = build_wallet(&config, 1).unwrap_err();
        assert!(matches!(err, DeployerError::NoKeys));
    }

    #[test]
    fn preloaded_keys_pick_the_first_as_sender() {
        let config = DeployerConfig {
            private_keys: vec![KEY.to_string()],
            ..Default::default()
        };
        let wallet = build_wallet(&config, 1).unwrap();
        let sender = NetworkWallet::<Ethereum>::default_signer_address(&wallet);
        assert_eq!(
            format!("{sender:?}"),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        let config = DeployerConfig {
            private_keys: vec!["0x1234".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            build_wallet(&config, 1),
            Err(DeployerError::Signer(_)),
        ));
    }
}
