//! Mocked-transport fixtures shared by the unit tests.

use alloy::{
    primitives::{Address, B256, Bloom, Log as PrimitiveLog, TxHash, U256, address, b256},
    providers::{Provider, ProviderBuilder, mock::Asserter},
    rpc::types::Log,
    sol_types::SolEvent,
};
use serde_json::{Value, json};

use crate::{abi::ERC20, provider::ChainProvider};

/// Anvil's first dev account.
pub(crate) const FROM: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

pub(crate) const TX_HASH: TxHash =
    b256!("00000000000000000000000000000000000000000000000000000000000000aa");

/// A provider whose responses are popped from the returned [`Asserter`] in
/// request order. No fillers, so writes go out as `eth_sendTransaction`.
pub(crate) fn mocked_provider() -> (ChainProvider, Asserter) {
    let asserter = Asserter::new();
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .connect_mocked_client(asserter.clone())
        .erased();
    (provider, asserter)
}

pub(crate) fn rpc_log<E: SolEvent>(address: Address, event: &E, log_index: u64) -> Log {
    Log {
        inner: PrimitiveLog {
            address,
            data: event.encode_log_data(),
        },
        log_index: Some(log_index),
        ..Default::default()
    }
}

pub(crate) fn transfer_log(token: Address, from: Address, to: Address, value: U256) -> Log {
    rpc_log(token, &ERC20::Transfer { from, to, value }, 0)
}

/// `eth_getTransactionReceipt` result for an EIP-1559 transaction mined in block 7.
pub(crate) fn receipt(tx_hash: TxHash, to: Address, success: bool, logs: Vec<Log>) -> Value {
    json!({
        "type": "0x2",
        "status": if success { "0x1" } else { "0x0" },
        "cumulativeGasUsed": "0x5208",
        "logs": logs,
        "logsBloom": Bloom::default(),
        "transactionHash": tx_hash,
        "transactionIndex": "0x0",
        "blockHash": B256::with_last_byte(7),
        "blockNumber": "0x7",
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x1",
        "from": FROM,
        "to": to,
        "contractAddress": null
    })
}
