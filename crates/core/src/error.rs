use alloy::{
    contract::Error as ContractError,
    transports::{RpcError, TransportErrorKind},
};
use thiserror::Error;

/// Shared error type used across all tokenkit crates.
#[derive(Debug, Error)]
pub enum AppError {
    /// Raised before any network call is made.
    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Execution reverted: {0}")]
    Reverted(String),

    #[error("Transaction {tx_hash} reverted on-chain")]
    TransactionReverted { tx_hash: String },

    #[error("HTTP error: {0}")]
    Http(String),

    /// Message reported by the deployment service, surfaced verbatim.
    #[error("{0}")]
    Deployment(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] eyre::Error),
}

impl AppError {
    /// Whether the error was raised before anything went over the wire.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AppError::MissingPrecondition(_) | AppError::InvalidAmount(_) | AppError::Config(_)
        )
    }
}

impl From<RpcError<TransportErrorKind>> for AppError {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        if let Some(payload) = err.as_error_resp() {
            if payload.message.contains("revert") {
                return AppError::Reverted(payload.message.to_string());
            }
        }
        AppError::Rpc(err.to_string())
    }
}

impl From<ContractError> for AppError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::TransportError(e) => e.into(),
            ContractError::AbiError(e) => AppError::Decode(e.to_string()),
            other => AppError::Rpc(other.to_string()),
        }
    }
}
