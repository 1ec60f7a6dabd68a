// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Compiled contract artifacts.
//!
//! The solidity toolchain writes one `<name>.abi` / `<name>.bin` pair per
//! contract into a single output directory. This engine only reads that
//! directory; producing it is the compiler's job.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use alloy::json_abi::JsonAbi;
use bytesize::ByteSize;

use crate::utils::format_file_size;

#[derive(Debug, Clone)]
pub struct ArtifactsConfig {
    /// Directory holding the compiler output.
    pub dir: PathBuf,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self { dir: "out".into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("abi parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing artifact for {name}: {}", .path.display())]
    Missing { name: String, path: PathBuf },
    #[error("bytecode for {name} is not valid hex: {source}")]
    InvalidBytecode {
        name: String,
        source: hex::FromHexError,
    },
}

/// ABI and unlinked creation bytecode for one compiled contract.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub abi: JsonAbi,
    /// Hex-encoded creation bytecode with any `0x` prefix and whitespace stripped.
    ///
    /// Kept as text because library placeholders are not valid hex until linked.
    pub bytecode: String,
}

pub fn load(name: &str, config: &ArtifactsConfig) -> Result<Artifact, ArtifactsError> {
    let abi_json = read_artifact(name, &config.dir.join(format!("{name}.abi")))?;
    let abi: JsonAbi = serde_json::from_str(&abi_json)?;

    let bytecode = read_artifact(name, &config.dir.join(format!("{name}.bin")))?;
    let bytecode = bytecode.trim();
    let bytecode = bytecode.strip_prefix("0x").unwrap_or(bytecode).to_string();

    let len = ByteSize::b((bytecode.len() / 2) as u64);
    debug!(@grey, "loaded {name} code: {}", format_file_size(len, ByteSize::kib(24), ByteSize::kib(48)));

    Ok(Artifact {
        name: name.to_string(),
        abi,
        bytecode,
    })
}

/// Decodes linked creation bytecode into raw bytes.
pub fn decode_bytecode(name: &str, bytecode: &str) -> Result<Vec<u8>, ArtifactsError> {
    hex::decode(bytecode).map_err(|source| ArtifactsError::InvalidBytecode {
        name: name.to_string(),
        source,
    })
}

fn read_artifact(name: &str, path: &Path) -> Result<String, ArtifactsError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(ArtifactsError::Missing {
            name: name.to_string(),
            path: path.to_path_buf(),
        }),
        Err(err) => Err(err.into()),
    }
}
