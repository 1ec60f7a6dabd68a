// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Deploy-or-adopt resolution of a single contract.
//!
//! [`nab`] is the idempotency primitive of the whole pipeline: a populated
//! manifest slot is adopted as-is, an absent or marked slot triggers a fresh
//! deployment whose address is written back. Running the same slot twice
//! therefore never deploys twice.

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::JsonAbi,
    primitives::Address,
    providers::Provider,
};

use crate::{
    core::{
        artifacts::{self, ArtifactsError},
        deployer::Deployer,
        link::{self, LinkError, LinkedLibrary},
        manifest::AddressBook,
        submit::{SubmitError, SubmitRequest},
    },
    utils::color::DebugColor,
};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("artifacts error: {0}")]
    Artifacts(#[from] ArtifactsError),
    #[error("link error: {0}")]
    Link(#[from] LinkError),
    #[error("submit error: {0}")]
    Submit(#[from] SubmitError),
    #[error("rpc error: {0}")]
    Rpc(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),

    #[error("manifest holds a bad address for {name}: {value:?}")]
    BadAddress { name: String, value: String },
    #[error("invalid constructor arguments for {name}: {reason}")]
    InvalidConstructor { name: String, reason: String },
    #[error("no contract address in deployment receipt for {name}")]
    NoContractAddress { name: String },
}

/// Plan for obtaining one contract.
///
/// The artifact name doubles as the manifest key unless [`with_key`] picks a
/// different one, which is how several instances of the same artifact can live
/// side by side in one manifest section.
///
/// [`with_key`]: ContractSpec::with_key
#[derive(Debug, Default)]
pub struct ContractSpec<'a> {
    name: &'a str,
    key: Option<&'a str>,
    args: Vec<DynSolValue>,
    libraries: Vec<LinkedLibrary>,
}

impl<'a> ContractSpec<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: &'a str) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_args(mut self, args: Vec<DynSolValue>) -> Self {
        self.args = args;
        self
    }

    pub fn with_libraries(mut self, libraries: Vec<LinkedLibrary>) -> Self {
        self.libraries = libraries;
        self
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Manifest key this contract is tracked under.
    pub fn key(&self) -> &str {
        self.key.unwrap_or(self.name)
    }
}

/// An on-chain contract the pipeline can hand out, freshly deployed or not.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    pub name: String,
    pub address: Address,
    pub abi: JsonAbi,
    /// Whether this run deployed the contract, as opposed to adopting an
    /// address already present in the manifest.
    pub deployed: bool,
}

/// Obtains a contract, deploying it only when the address book asks for it.
///
/// A fresh deployment records its address in `book` under the spec's key.
pub async fn nab<P: Provider>(
    deployer: &Deployer<P>,
    spec: ContractSpec<'_>,
    book: &mut AddressBook,
) -> Result<ContractHandle, ResolveError> {
    let key = spec.key().to_string();
    let artifact = artifacts::load(spec.name(), &deployer.config().artifacts)?;

    if !book.needs_deploy(&key) {
        let value = book.get(&key).unwrap_or_default();
        let address: Address = value.parse().map_err(|_| ResolveError::BadAddress {
            name: key.clone(),
            value: value.to_string(),
        })?;

        let mut adopt = true;
        if deployer.config().verify_adopted_code {
            let code = deployer.provider().get_code_at(address).await?;
            if code.is_empty() {
                warn!(@yellow, "no code at adopted address {} for {key}, redeploying", address.debug_lavender());
                adopt = false;
            }
        }
        if adopt {
            debug!(@grey, "adopted {key} at address: {}", address.debug_lavender());
            return Ok(ContractHandle {
                name: spec.name().to_string(),
                address,
                abi: artifact.abi,
                deployed: false,
            });
        }
    }

    let handle = deploy_artifact(deployer, spec, artifact).await?;
    book.set(&key, handle.address);
    Ok(handle)
}

/// Deploys a contract unconditionally, without consulting an address book.
pub async fn deploy<P: Provider>(
    deployer: &Deployer<P>,
    spec: ContractSpec<'_>,
) -> Result<ContractHandle, ResolveError> {
    let artifact = artifacts::load(spec.name(), &deployer.config().artifacts)?;
    deploy_artifact(deployer, spec, artifact).await
}

async fn deploy_artifact<P: Provider>(
    deployer: &Deployer<P>,
    spec: ContractSpec<'_>,
    artifact: artifacts::Artifact,
) -> Result<ContractHandle, ResolveError> {
    let name = spec.name().to_string();

    let bytecode = match spec.libraries.is_empty() {
        true => artifact.bytecode,
        false => link::link(&artifact.bytecode, &spec.libraries)?,
    };
    let mut init_code = artifacts::decode_bytecode(&name, &bytecode)?;
    init_code.extend(encode_constructor_args(&name, &artifact.abi, &spec.args)?);

    let receipt = deployer
        .submit(SubmitRequest::deploy(deployer.sender(), init_code))
        .await?;
    let address = receipt
        .contract_address
        .ok_or(ResolveError::NoContractAddress { name: name.clone() })?;

    info!(@grey, "deployed {name} at address: {}", address.debug_lavender());
    Ok(ContractHandle {
        name,
        address,
        abi: artifact.abi,
        deployed: true,
    })
}

fn encode_constructor_args(
    name: &str,
    abi: &JsonAbi,
    args: &[DynSolValue],
) -> Result<Vec<u8>, ResolveError> {
    let Some(constructor) = abi.constructor() else {
        if args.is_empty() {
            return Ok(Vec::new());
        }
        return Err(ResolveError::InvalidConstructor {
            name: name.to_string(),
            reason: format!("contract has no constructor, but {} args were given", args.len()),
        });
    };

    if constructor.inputs.len() != args.len() {
        return Err(ResolveError::InvalidConstructor {
            name: name.to_string(),
            reason: format!(
                "expected {} constructor args, got {}",
                constructor.inputs.len(),
                args.len(),
            ),
        });
    }
    constructor
        .abi_encode_input_raw(args)
        .map_err(|error| ResolveError::InvalidConstructor {
            name: name.to_string(),
            reason: error.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use alloy::{
        primitives::U256,
        providers::{mock::Asserter, ProviderBuilder},
    };
    use tempfile::TempDir;

    use crate::core::deployer::DeployerConfig;

    use super::*;

    const SENDER: Address = alloy::primitives::address!("0x00000000000000000000000000000000000a11ce");
    const BOOKED: &str = "0x7ed1e469fcb3ee19c0366d829e291451be638e59";

    fn write_artifact(dir: &TempDir, name: &str, abi: &str, bin: &str) {
        fs::write(dir.path().join(format!("{name}.abi")), abi).unwrap();
        fs::write(dir.path().join(format!("{name}.bin")), bin).unwrap();
    }

    fn deployer_for(dir: &TempDir) -> Deployer<impl Provider> {
        let provider = ProviderBuilder::new().connect_mocked_client(Asserter::new());
        let config = DeployerConfig {
            artifacts: crate::core::artifacts::ArtifactsConfig {
                dir: dir.path().to_path_buf(),
            },
            ..Default::default()
        };
        Deployer::new(provider, SENDER, 1, config)
    }

    #[test]
    fn key_defaults_to_the_artifact_name() {
        assert_eq!(ContractSpec::new("WETH").key(), "WETH");
        assert_eq!(ContractSpec::new("PreminedToken").with_key("EUR").key(), "EUR");
    }

    #[tokio::test]
    async fn booked_addresses_are_adopted_without_touching_the_chain() {
        let dir = TempDir::new().unwrap();
        write_artifact(&dir, "WETH", "[]", "6001600155");
        let deployer = deployer_for(&dir);

        let mut book = AddressBook::default();
        book.set("WETH", BOOKED.parse().unwrap());

        let handle = nab(&deployer, ContractSpec::new("WETH"), &mut book)
            .await
            .unwrap();
        assert!(!handle.deployed);
        assert_eq!(handle.address, BOOKED.parse::<Address>().unwrap());
    }

    #[tokio::test]
    async fn garbage_in_the_book_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_artifact(&dir, "WETH", "[]", "6001600155");
        let deployer = deployer_for(&dir);

        let mut book: AddressBook = serde_json::from_str(r#"{"WETH":"not-an-address"}"#).unwrap();

        let err = nab(&deployer, ContractSpec::new("WETH"), &mut book)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::BadAddress { .. }));
    }

    #[tokio::test]
    async fn constructor_arity_is_checked_before_sending() {
        let dir = TempDir::new().unwrap();
        let abi = r#"[{"type":"constructor","stateMutability":"nonpayable","inputs":[{"name":"supply","type":"uint256"}]}]"#;
        write_artifact(&dir, "Token", abi, "6001600155");
        let deployer = deployer_for(&dir);

        let mut book = AddressBook::default();
        let err = nab(&deployer, ContractSpec::new("Token"), &mut book)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConstructor { .. }));
    }

    #[tokio::test]
    async fn args_without_a_constructor_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_artifact(&dir, "WETH", "[]", "6001600155");
        let deployer = deployer_for(&dir);

        let spec = ContractSpec::new("WETH").with_args(vec![DynSolValue::Uint(U256::from(5), 256)]);
        let err = deploy(&deployer, spec).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConstructor { .. }));
    }

    #[tokio::test]
    async fn libraries_are_linked_before_decoding() {
        let dir = TempDir::new().unwrap();
        let unlinked = format!("73{}50", link::placeholder("SafeMath"));
        write_artifact(&dir, "Vault", "[]", &unlinked);
        let deployer = deployer_for(&dir);

        let spec = ContractSpec::new("Vault")
            .with_libraries(vec![LinkedLibrary::new("SafeMath", BOOKED)]);

        // substitution yields decodable hex, so the deploy reaches the dead
        // transport instead of failing to decode
        let err = deploy(&deployer, spec).await.unwrap_err();
        assert!(matches!(err, ResolveError::Submit(SubmitError::Rpc(_))));
    }

    #[tokio::test]
    async fn unlinked_placeholders_never_reach_the_chain() {
        let dir = TempDir::new().unwrap();
        let unlinked = format!("73{}50", link::placeholder("SafeMath"));
        write_artifact(&dir, "Vault", "[]", &unlinked);
        let deployer = deployer_for(&dir);

        let err = deploy(&deployer, ContractSpec::new("Vault")).await.unwrap_err();
        assert!(matches!(err, ResolveError::Artifacts(_)));
    }
}
