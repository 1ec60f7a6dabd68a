// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! CLI for `deploy-system`.

use std::{fs, path::PathBuf, process::ExitCode};

use clap::{error::ErrorKind, Parser};
use eyre::eyre;
use melon_tools::{
    core::{
        artifacts::ArtifactsConfig,
        deployer::{self, DeployerConfig},
    },
    ops::system::{self, RedeployConfig},
};

use crate::error::{DeploySystemError, DeploySystemResult};

mod error;
mod style;

const DEFAULT_ENDPOINT: &str = "http://localhost:8545";

#[derive(Debug, Parser)]
#[command(name = "deploy-system")]
#[command(author = "Melonport AG")]
#[command(about = "Deploys and wires the Melon contract system", long_about = None)]
#[command(version)]
struct Args {
    /// Manifest the run starts from.
    #[arg(env = "DEPLOY_IN")]
    deploy_in: PathBuf,
    /// Where the completed manifest, and every checkpoint on the way, goes.
    #[arg(env = "DEPLOY_OUT")]
    deploy_out: PathBuf,

    /// JSON-RPC endpoint of the target network.
    #[arg(short, long, env = "JSON_RPC_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
    /// Directory holding the compiled `<Name>.abi` / `<Name>.bin` artifacts.
    #[arg(long, env = "ARTIFACTS_DIR", default_value = "out")]
    artifacts_dir: PathBuf,

    /// Ignore the previous output manifest and redeploy from the pristine
    /// input.
    #[arg(long, env = "REDEPLOY_ALL")]
    redeploy_all: bool,
    /// Blank these manifest slots before deploying, forcing fresh
    /// deployments.
    #[arg(long, value_name = "CATEGORY/NAME")]
    force: Vec<String>,
    /// Apply the force list even when a full redeploy was requested.
    #[arg(long)]
    force_partial: bool,

    /// Path to an encrypted keystore holding the deploy account.
    #[arg(long, env = "KEYSTORE")]
    keystore: Option<PathBuf>,
    /// File holding the keystore password.
    #[arg(long, env = "PASSFILE")]
    passfile: Option<PathBuf>,
    /// JSON file with an array of raw hex private keys to preload.
    #[arg(long, env = "PRIVATE_KEYS")]
    private_keys: Option<PathBuf>,

    /// Re-query pending nonces on every transaction instead of counting
    /// locally.
    #[arg(long, env = "LOCAL_CHAIN")]
    local_chain: bool,
    /// Redeploy adopted contracts whose address carries no code on this
    /// network.
    #[arg(long)]
    verify_adopted_code: bool,

    /// Whether to print debug info.
    #[arg(long, env = "MLN_VERBOSE")]
    verbose: bool,
}

impl Args {
    fn deployer_config(&self) -> Result<DeployerConfig, DeploySystemError> {
        let private_keys = match &self.private_keys {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => Vec::new(),
        };
        Ok(DeployerConfig {
            endpoint: self.endpoint.clone(),
            local_chain: self.local_chain,
            verify_adopted_code: self.verify_adopted_code,
            artifacts: ArtifactsConfig {
                dir: self.artifacts_dir.clone(),
            },
            keystore_path: self.keystore.clone(),
            keystore_password_path: self.passfile.clone(),
            private_keys,
        })
    }

    fn redeploy_config(&self) -> Result<RedeployConfig, DeploySystemError> {
        let mut force = Vec::with_capacity(self.force.len());
        for entry in &self.force {
            let (category, name) = entry
                .split_once('/')
                .ok_or_else(|| eyre!("invalid force entry {entry}, expected CATEGORY/NAME"))?;
            force.push((category.to_string(), name.to_string()));
        }
        Ok(RedeployConfig {
            deploy_in: self.deploy_in.clone(),
            deploy_out: self.deploy_out.clone(),
            redeploy_all: self.redeploy_all,
            force_partial: self.force_partial,
            force,
        })
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // clap routes help and version to stdout, everything else to
            // stderr with the usage attached
            let requested = matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            );
            err.print().expect("printing usage");
            return match requested {
                true => ExitCode::SUCCESS,
                false => ExitCode::FAILURE,
            };
        }
    };

    let log_level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    simple_logger::init_with_level(log_level).expect("setting up logger");

    // Build async runtime and block on the deployment run
    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Into::into)
        .and_then(|rt| rt.block_on(run(args)));

    // Report any error and return proper exit code
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            style::print_error(&err);
            err.exit_code()
        }
    }
}

async fn run(args: Args) -> DeploySystemResult {
    let redeploy = args.redeploy_config()?;
    let deployer = deployer::connect(args.deployer_config()?).await?;
    system::partial_redeploy(&deployer, &redeploy).await?;
    Ok(())
}
