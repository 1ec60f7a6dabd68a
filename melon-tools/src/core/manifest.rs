// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Deployment manifests.
//!
//! A manifest is the JSON tree a deployment run both consumes and produces.
//! Each subsystem category holds an address book of logical contract names
//! plus the parameters that category deploys with. An address entry that is
//! absent, empty, or the literal `"DEPLOY"` marker requests a fresh
//! deployment; anything else is adopted as already deployed.

use std::{collections::BTreeMap, fs, path::Path};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Address book entry that requests a fresh deployment.
pub const DEPLOY_MARKER: &str = "DEPLOY";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown subsystem category: {0}")]
    UnknownCategory(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub tokens: TokensSection,
    pub kyber: KyberSection,
    pub oasis: OasisSection,
    pub zeroex: ZeroExSection,
    pub melon: MelonSection,
}

impl Manifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let mut contents = serde_json::to_string_pretty(self)?;
        contents.push('\n');
        fs::write(path, contents)?;
        Ok(())
    }

    /// Blanks one address slot, forcing the orchestrator to redeploy it.
    pub fn blank(&mut self, category: &str, name: &str) -> Result<(), ManifestError> {
        let book = match category {
            "tokens" => &mut self.tokens.addr,
            "kyber" => &mut self.kyber.addr,
            "oasis" => &mut self.oasis.addr,
            "zeroex" => &mut self.zeroex.addr,
            "melon" => &mut self.melon.addr,
            other => return Err(ManifestError::UnknownCategory(other.to_string())),
        };
        book.blank(name);
        Ok(())
    }
}

/// Logical contract name to address mapping for one subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook(BTreeMap<String, String>);

impl AddressBook {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// True when the entry requests a fresh deployment.
    pub fn needs_deploy(&self, name: &str) -> bool {
        match self.0.get(name) {
            None => true,
            Some(value) => value.is_empty() || value == DEPLOY_MARKER,
        }
    }

    pub fn set(&mut self, name: &str, address: Address) {
        self.0.insert(name.to_string(), address.to_string());
    }

    pub fn blank(&mut self, name: &str) {
        self.0.insert(name.to_string(), String::new());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensSection {
    pub addr: AddressBook,
    pub conf: TokensConf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KyberSection {
    pub addr: AddressBook,
    pub conf: KyberConf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OasisSection {
    pub addr: AddressBook,
    pub conf: OasisConf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZeroExSection {
    pub addr: AddressBook,
    pub conf: ZeroExConf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MelonSection {
    pub addr: AddressBook,
    pub conf: MelonConf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokensConf {
    pub tokens: Vec<TokenConf>,
}

impl Default for TokensConf {
    fn default() -> Self {
        Self {
            tokens: vec![
                TokenConf::new("WETH", 18),
                TokenConf::new("MLN", 18),
                TokenConf::new("EUR", 8),
                TokenConf::new("ZRX", 18),
                TokenConf::new("KNC", 18),
                TokenConf::new("DGX", 9),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConf {
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub name: Option<String>,
}

impl TokenConf {
    pub fn new(symbol: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            name: None,
        }
    }

    /// Long display name, defaulting to the symbol.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.symbol)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KyberConf {
    pub rate_duration_blocks: u64,
}

impl Default for KyberConf {
    fn default() -> Self {
        Self {
            rate_duration_blocks: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OasisConf {
    /// Unix timestamp after which the matching market stops accepting orders.
    pub close_time: u64,
}

impl Default for OasisConf {
    fn default() -> Self {
        Self {
            close_time: 4_102_444_800,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZeroExConf {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MelonConf {
    pub track: Track,
    pub engine_delay_seconds: u64,
    pub max_spread_percent: u64,
    pub price_tolerance_percent: u64,
    pub initial_update_delay_seconds: u64,
    pub registry_owner: Option<String>,
    pub version_owner: Option<String>,
    pub user_whitelist: Vec<String>,
}

impl Default for MelonConf {
    fn default() -> Self {
        Self {
            track: Track::Testing,
            engine_delay_seconds: 2_592_000,
            max_spread_percent: 10,
            price_tolerance_percent: 10,
            initial_update_delay_seconds: 0,
            registry_owner: None,
            version_owner: None,
            user_whitelist: Vec::new(),
        }
    }
}

/// Selects where deployed funds read their prices from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Track {
    /// A locally deployed feed whose prices are set by the deployer.
    #[default]
    #[serde(rename = "testing")]
    Testing,
    /// A feed derived from the deployed Kyber network.
    #[serde(rename = "kyber-price")]
    KyberPrice,
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    #[test]
    fn empty_manifest_gets_full_defaults() {
        let manifest: Manifest = serde_json::from_str("{}").unwrap();
        assert_eq!(manifest.tokens.conf.tokens.len(), 6);
        assert_eq!(manifest.tokens.conf.tokens[0].symbol, "WETH");
        assert_eq!(manifest.melon.conf.track, Track::Testing);
        assert_eq!(manifest.kyber.conf.rate_duration_blocks, 500);
        assert!(manifest.melon.addr.needs_deploy("Registry"));
    }

    #[test]
    fn deploy_markers_request_deployment() {
        let mut book = AddressBook::default();
        assert!(book.needs_deploy("WETH"));

        book.blank("WETH");
        assert!(book.needs_deploy("WETH"));

        book.0.insert("WETH".to_string(), DEPLOY_MARKER.to_string());
        assert!(book.needs_deploy("WETH"));

        book.set("WETH", address!("7ed1e469fcb3ee19c0366d829e291451be638e59"));
        assert!(!book.needs_deploy("WETH"));
    }

    #[test]
    fn addresses_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deploy.json");

        let mut manifest = Manifest::default();
        let addr = address!("7ed1e469fcb3ee19c0366d829e291451be638e59");
        manifest.melon.addr.set("Registry", addr);
        manifest.save(&path).unwrap();

        let reloaded = Manifest::load(&path).unwrap();
        assert!(!reloaded.melon.addr.needs_deploy("Registry"));
        assert_eq!(
            reloaded.melon.addr.get("Registry").unwrap().to_lowercase(),
            format!("{addr:?}"),
        );
    }

    #[test]
    fn blank_forces_a_single_slot() {
        let mut manifest = Manifest::default();
        let addr = address!("7ed1e469fcb3ee19c0366d829e291451be638e59");
        manifest.tokens.addr.set("WETH", addr);
        manifest.tokens.addr.set("MLN", addr);

        manifest.blank("tokens", "WETH").unwrap();
        assert!(manifest.tokens.addr.needs_deploy("WETH"));
        assert!(!manifest.tokens.addr.needs_deploy("MLN"));

        let err = manifest.blank("fees", "ManagementFee").unwrap_err();
        assert!(matches!(err, ManifestError::UnknownCategory(_)));
    }

    #[test]
    fn track_parses_both_variants() {
        let conf: MelonConf = serde_json::from_str(r#"{"track": "kyber-price"}"#).unwrap();
        assert_eq!(conf.track, Track::KyberPrice);
        let conf: MelonConf = serde_json::from_str(r#"{"track": "testing"}"#).unwrap();
        assert_eq!(conf.track, Track::Testing);
    }
}
