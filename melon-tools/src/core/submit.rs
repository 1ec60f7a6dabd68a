// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Transaction submission.
//!
//! Every write the deployment pipeline performs goes through [`Deployer::submit`],
//! which owns gas sizing, fee selection and nonce assignment. Funneling all
//! sends through one place keeps the per-account nonce sequence gapless.

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash, TxKind, U256},
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
};

use crate::{
    core::deployer::Deployer,
    utils::color::{Color, DebugColor},
};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("rpc error: {0}")]
    Rpc(#[from] alloy::transports::RpcError<alloy::transports::TransportErrorKind>),
    #[error("tx failed to complete: {}", .tx_hash.debug_lavender())]
    FailedToComplete { tx_hash: TxHash },
    #[error(
        "not enough funds in account {} to pay for deployment\nbalance {} < {}",
        .from_address.red(),
        .balance.red(),
        format!("{} wei", .data_fee).red(),
    )]
    NotEnoughFunds {
        from_address: Address,
        balance: U256,
        data_fee: U256,
    },
    #[error("tx reverted: {}", .tx_hash.debug_red())]
    Reverted { tx_hash: TxHash },
}

/// A single transaction to be signed and sent by a [`Deployer`].
///
/// Gas is normally estimated at submit time and padded for safety. Setting an
/// explicit limit with [`with_gas_limit`] skips estimation entirely and sends
/// the given value verbatim.
///
/// [`with_gas_limit`]: SubmitRequest::with_gas_limit
#[derive(Debug, Clone)]
pub struct SubmitRequest {
    tx: TransactionRequest,
}

impl SubmitRequest {
    /// Plain value transfer.
    pub fn transfer(from: Address, to: Address, value: U256) -> Self {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(value);
        Self { tx }
    }

    /// Contract call with pre-encoded calldata.
    pub fn call(from: Address, to: Address, input: Vec<u8>) -> Self {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input);
        Self { tx }
    }

    /// Contract creation from init code.
    pub fn deploy(from: Address, code: Vec<u8>) -> Self {
        let tx = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(code);
        Self { tx }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.tx = self.tx.with_value(value);
        self
    }

    /// Sends with exactly this gas limit, skipping estimation.
    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.tx = self.tx.with_gas_limit(gas_limit);
        self
    }

    fn is_deploy(&self) -> bool {
        matches!(self.tx.to, Some(TxKind::Create))
    }
}

impl<P: Provider> Deployer<P> {
    /// Signs and sends a transaction, waiting for its receipt.
    ///
    /// Estimated gas gets 50% headroom on deployments and is doubled on calls
    /// and transfers. A failed estimation dumps the offending transaction to
    /// stderr and aborts before a nonce is assigned.
    pub async fn submit(&self, request: SubmitRequest) -> Result<TransactionReceipt, SubmitError> {
        let deploy = request.is_deploy();
        let SubmitRequest { mut tx } = request;

        let gas = match tx.gas {
            Some(gas) => gas,
            None => {
                let estimate = match self.provider().estimate_gas(tx.clone()).await {
                    Ok(estimate) => estimate,
                    Err(error) => {
                        let dump = serde_json::to_string_pretty(&tx)
                            .unwrap_or_else(|_| format!("{tx:?}"));
                        egreyln!("failed to estimate gas for transaction:\n{dump}");
                        return Err(error.into());
                    }
                };
                inflate_gas(estimate, deploy)
            }
        };
        let gas_price = self.provider().get_gas_price().await?;
        let from = tx.from.unwrap_or_else(|| self.sender());

        if deploy {
            let balance = self.provider().get_balance(from).await?;
            let data_fee = U256::from(gas) * U256::from(gas_price);
            if balance < data_fee {
                return Err(SubmitError::NotEnoughFunds {
                    from_address: from,
                    balance,
                    data_fee,
                });
            }
        }

        let _serial = self.nonces().serialize_sends().await;
        let nonce = self.nonces().next(from, self.provider()).await?;
        tx.nonce = Some(nonce);
        tx.chain_id = Some(self.chain_id());
        tx.gas = Some(gas);
        tx.max_fee_per_gas = Some(gas_price);
        tx.max_priority_fee_per_gas = Some(0);

        let pending = self.provider().send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!(@grey, "sent tx: {}", tx_hash.debug_lavender());

        let receipt = pending
            .get_receipt()
            .await
            .or(Err(SubmitError::FailedToComplete { tx_hash }))?;
        if !receipt.status() {
            return Err(SubmitError::Reverted { tx_hash });
        }

        debug!(
            @grey,
            "confirmed tx in block {}, used {}",
            receipt.block_number.unwrap_or_default(),
            format_gas(receipt.gas_used)
        );
        Ok(receipt)
    }
}

impl<P: Provider> Deployer<P> {
    /// Submits a contract call from the deploy account.
    pub async fn write(
        &self,
        to: Address,
        calldata: Vec<u8>,
    ) -> Result<TransactionReceipt, SubmitError> {
        self.submit(SubmitRequest::call(self.sender(), to, calldata))
            .await
    }
}

/// Deployments get half the estimate as headroom, everything else doubles.
fn inflate_gas(estimate: u64, deploy: bool) -> u64 {
    if deploy {
        estimate.saturating_add(estimate / 2)
    } else {
        estimate.saturating_mul(2)
    }
}

fn format_gas(gas: u64) -> String {
    let text = format!("{gas} gas");
    if gas <= 3_000_000 {
        text.mint()
    } else if gas <= 7_000_000 {
        text.yellow()
    } else {
        text.pink()
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{address, U128},
        providers::{mock::Asserter, ProviderBuilder},
    };

    use crate::core::deployer::DeployerConfig;

    use super::*;

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");

    #[test]
    fn gas_inflation_gives_deploys_half_headroom() {
        assert_eq!(inflate_gas(100, true), 150);
        assert_eq!(inflate_gas(100, false), 200);
        assert_eq!(inflate_gas(u64::MAX, false), u64::MAX);
    }

    #[test]
    fn deploy_requests_target_contract_creation() {
        let request = SubmitRequest::deploy(ALICE, vec![0x60, 0x01]);
        assert!(request.is_deploy());
        assert_eq!(request.tx.from, Some(ALICE));
        assert_eq!(request.tx.to, Some(TxKind::Create));
    }

    #[test]
    fn explicit_gas_is_kept_verbatim() {
        let request = SubmitRequest::transfer(ALICE, BOB, U256::from(1)).with_gas_limit(21_000);
        assert!(!request.is_deploy());
        assert_eq!(request.tx.gas, Some(21_000));
    }

    #[tokio::test]
    async fn funds_preflight_reads_the_paying_account() {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new().connect_mocked_client(asserter.clone());
        let deployer = Deployer::new(provider, ALICE, 1, DeployerConfig::default());

        // explicit gas skips estimation; queue the fee quote and a broke
        // balance for whatever account the preflight asks about
        asserter.push_success(&U128::from(2_000_000_000u64));
        asserter.push_success(&U256::ZERO);

        let request = SubmitRequest::deploy(BOB, vec![0x60, 0x01]).with_gas_limit(50_000);
        let err = deployer.submit(request).await.unwrap_err();
        match err {
            SubmitError::NotEnoughFunds { from_address, .. } => assert_eq!(from_address, BOB),
            err => panic!("expected missing funds, got: {err:?}"),
        }
    }
}
