use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;
use serde::Serialize;
use tokenkit_core::units::serialize_decimal;

use crate::abi::{ERC20, TokenFactory};

/// Zero address constant for mint/burn detection.
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// Decoded TokenFactory `TokenCreated` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenCreatedEvent {
    pub token_address: Address,
    pub creator: Address,
    pub name: String,
    pub symbol: String,
    #[serde(serialize_with = "serialize_decimal")]
    pub initial_supply: U256,
}

/// Token event emitted by a confirmed write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TokenEvent {
    Transfer {
        token_address: Address,
        from: Address,
        to: Address,
        #[serde(serialize_with = "serialize_decimal")]
        amount: U256,
        log_index: Option<u64>,
    },
    Mint {
        token_address: Address,
        to: Address,
        #[serde(serialize_with = "serialize_decimal")]
        amount: U256,
        log_index: Option<u64>,
    },
    Burn {
        token_address: Address,
        from: Address,
        #[serde(serialize_with = "serialize_decimal")]
        amount: U256,
        log_index: Option<u64>,
    },
    Approval {
        token_address: Address,
        owner: Address,
        spender: Address,
        #[serde(serialize_with = "serialize_decimal")]
        amount: U256,
        log_index: Option<u64>,
    },
    OwnershipTransferred {
        token_address: Address,
        previous_owner: Address,
        new_owner: Address,
        log_index: Option<u64>,
    },
    Paused {
        token_address: Address,
        account: Address,
        log_index: Option<u64>,
    },
    Unpaused {
        token_address: Address,
        account: Address,
        log_index: Option<u64>,
    },
}

/// Attempt to decode a log as a TokenFactory `TokenCreated` event.
pub fn decode_token_created(log: &Log) -> Option<TokenCreatedEvent> {
    let decoded = log.log_decode::<TokenFactory::TokenCreated>().ok()?;
    let inner = decoded.inner.data;

    Some(TokenCreatedEvent {
        token_address: inner.token,
        creator: inner.creator,
        name: inner.name,
        symbol: inner.symbol,
        initial_supply: inner.initialSupply,
    })
}

/// Attempt to decode a log as one of the token's events.
///
/// Transfer events with `from == 0x0` are classified as Mint;
/// Transfer events with `to == 0x0` are classified as Burn.
pub fn decode_token_log(log: &Log) -> Option<TokenEvent> {
    let token_address = log.address();
    let log_index = log.log_index;

    // Transfer covers most receipts
    if let Ok(decoded) = log.log_decode::<ERC20::Transfer>() {
        let d = decoded.inner.data;
        let event = if d.from == ZERO_ADDRESS {
            TokenEvent::Mint {
                token_address,
                to: d.to,
                amount: d.value,
                log_index,
            }
        } else if d.to == ZERO_ADDRESS {
            TokenEvent::Burn {
                token_address,
                from: d.from,
                amount: d.value,
                log_index,
            }
        } else {
            TokenEvent::Transfer {
                token_address,
                from: d.from,
                to: d.to,
                amount: d.value,
                log_index,
            }
        };
        return Some(event);
    }

    if let Ok(decoded) = log.log_decode::<ERC20::Approval>() {
        let d = decoded.inner.data;
        return Some(TokenEvent::Approval {
            token_address,
            owner: d.owner,
            spender: d.spender,
            amount: d.value,
            log_index,
        });
    }

    if let Ok(decoded) = log.log_decode::<ERC20::OwnershipTransferred>() {
        let d = decoded.inner.data;
        return Some(TokenEvent::OwnershipTransferred {
            token_address,
            previous_owner: d.previousOwner,
            new_owner: d.newOwner,
            log_index,
        });
    }

    if let Ok(decoded) = log.log_decode::<ERC20::Paused>() {
        return Some(TokenEvent::Paused {
            token_address,
            account: decoded.inner.data.account,
            log_index,
        });
    }

    if let Ok(decoded) = log.log_decode::<ERC20::Unpaused>() {
        return Some(TokenEvent::Unpaused {
            token_address,
            account: decoded.inner.data.account,
            log_index,
        });
    }

    None
}
