use std::time::Duration;

use alloy::{
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes, TxHash},
    providers::Provider,
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use serde::Serialize;
use tokenkit_core::AppError;

use crate::{
    decoder::{self, TokenEvent},
    provider::ChainProvider,
};

/// Confirmed outcome of a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxOutcome {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub events: Vec<TokenEvent>,
}

impl TxOutcome {
    pub fn from_receipt(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            events: receipt
                .inner
                .logs()
                .iter()
                .filter_map(decoder::decode_token_log)
                .collect(),
        }
    }
}

/// How long a submitted transaction may stay unmined before the write fails.
const RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

/// Signs, submits and waits for transactions from one account.
#[derive(Clone)]
pub struct TxSender {
    provider: ChainProvider,
    from: Address,
}

impl TxSender {
    pub fn new(provider: ChainProvider, from: Address) -> Self {
        Self { provider, from }
    }

    pub fn sender(&self) -> Address {
        self.from
    }

    /// Simulate, submit, report the hash, then wait for the receipt.
    ///
    /// A receipt with a failed status is an error.
    pub async fn send_and_confirm(
        &self,
        to: Address,
        input: Bytes,
        on_submitted: &(dyn Fn(TxHash) + Send + Sync),
    ) -> Result<TransactionReceipt, AppError> {
        let tx = TransactionRequest::default()
            .with_from(self.from)
            .with_to(to)
            .with_input(input);

        // simulate first
        self.provider.call(tx.clone()).await?;

        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(%tx_hash, %to, "Transaction submitted");
        on_submitted(tx_hash);

        let receipt = self.wait_for_receipt(tx_hash).await?;
        if !receipt.status() {
            tracing::warn!(%tx_hash, "Transaction reverted");
            return Err(AppError::TransactionReverted {
                tx_hash: format!("{tx_hash:#x}"),
            });
        }

        tracing::info!(
            %tx_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(receipt)
    }

    /// Poll for the receipt of `tx_hash` at the client's poll interval.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, AppError> {
        let poll_interval = self.provider.client().poll_interval();
        let poll = async {
            loop {
                if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                    return Ok::<_, AppError>(receipt);
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(RECEIPT_TIMEOUT, poll)
            .await
            .map_err(|_| {
                AppError::Rpc(format!(
                    "no receipt for {tx_hash:#x} after {}s",
                    RECEIPT_TIMEOUT.as_secs()
                ))
            })?
    }
}
