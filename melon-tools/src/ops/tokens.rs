// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Asset tokens the rest of the system trades and prices against.

use std::collections::BTreeMap;

use alloy::{dyn_abi::DynSolValue, primitives::U256, providers::Provider};

use crate::{
    core::{
        deployer::Deployer,
        manifest::{TokenConf, TokensSection},
        resolver::{self, ContractHandle, ContractSpec},
    },
    ops::SystemError,
};

/// The deployed token set, queryable by symbol.
#[derive(Debug, Clone)]
pub struct Tokens {
    by_symbol: BTreeMap<String, ContractHandle>,
}

impl Tokens {
    pub fn get(&self, symbol: &str) -> crate::Result<&ContractHandle> {
        self.by_symbol
            .get(symbol)
            .ok_or_else(|| SystemError::MissingToken {
                symbol: symbol.to_string(),
            })
            .map_err(Into::into)
    }

    /// Wrapped ether, the system's quote asset.
    pub fn weth(&self) -> crate::Result<&ContractHandle> {
        self.get("WETH")
    }

    /// The Melon token.
    pub fn mln(&self) -> crate::Result<&ContractHandle> {
        self.get("MLN")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContractHandle)> {
        self.by_symbol
            .iter()
            .map(|(symbol, handle)| (symbol.as_str(), handle))
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

/// Obtains every configured token, deploying only the missing ones.
pub async fn nab_tokens<P: Provider>(
    deployer: &Deployer<P>,
    section: &mut TokensSection,
) -> crate::Result<Tokens> {
    let mut by_symbol = BTreeMap::new();
    for token in &section.conf.tokens {
        let handle = resolver::nab(deployer, spec_for(token), &mut section.addr).await?;
        by_symbol.insert(token.symbol.clone(), handle);
    }
    Ok(Tokens { by_symbol })
}

/// Maps a token onto the artifact that implements it.
///
/// WETH and MLN have dedicated contracts, every other symbol is an instance
/// of the premined test token keyed by its symbol.
fn spec_for(token: &TokenConf) -> ContractSpec<'_> {
    match token.symbol.as_str() {
        "WETH" => ContractSpec::new("WETH"),
        "MLN" => ContractSpec::new("BurnableToken")
            .with_key(&token.symbol)
            .with_args(premined_args(token)),
        _ => ContractSpec::new("PreminedToken")
            .with_key(&token.symbol)
            .with_args(premined_args(token)),
    }
}

fn premined_args(token: &TokenConf) -> Vec<DynSolValue> {
    vec![
        DynSolValue::String(token.symbol.clone()),
        DynSolValue::Uint(U256::from(token.decimals), 8),
        DynSolValue::String(token.display_name().to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_map_onto_their_artifacts() {
        let weth_conf = TokenConf::new("WETH", 18);
        let weth = spec_for(&weth_conf);
        assert_eq!(weth.name(), "WETH");
        assert_eq!(weth.key(), "WETH");

        let mln_conf = TokenConf::new("MLN", 18);
        let mln = spec_for(&mln_conf);
        assert_eq!(mln.name(), "BurnableToken");
        assert_eq!(mln.key(), "MLN");

        let eur_conf = TokenConf::new("EUR", 8);
        let eur = spec_for(&eur_conf);
        assert_eq!(eur.name(), "PreminedToken");
        assert_eq!(eur.key(), "EUR");
    }
}
