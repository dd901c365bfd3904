use std::future::IntoFuture;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde::Serialize;
use tokenkit_core::{
    AppError,
    units::{format_amount, serialize_decimal},
};

use crate::{
    abi::ERC20,
    calls::TokenCall,
    provider::ChainProvider,
    tx::{TxOutcome, TxSender},
};

// ─── Snapshots ──────────────────────────────────────────────────────────────

/// A token's view-function results at one read instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenSnapshot {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(serialize_with = "serialize_decimal")]
    pub total_supply: U256,
    pub total_supply_formatted: String,
    pub owner: Address,
    pub paused: bool,
}

/// Raw view results, before formatting.
#[derive(Debug, Clone)]
pub struct TokenViews {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub owner: Address,
    pub paused: bool,
}

impl TokenSnapshot {
    pub fn from_views(address: Address, views: TokenViews) -> Self {
        Self {
            address,
            total_supply_formatted: format_amount(views.total_supply, views.decimals),
            name: views.name,
            symbol: views.symbol,
            decimals: views.decimals,
            total_supply: views.total_supply,
            owner: views.owner,
            paused: views.paused,
        }
    }
}

/// An account's balance at one read instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    pub token: Address,
    pub account: Address,
    #[serde(serialize_with = "serialize_decimal")]
    pub raw: U256,
    pub formatted: String,
}

/// An owner→spender allowance at one read instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowanceSnapshot {
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    #[serde(serialize_with = "serialize_decimal")]
    pub raw: U256,
    pub formatted: String,
}

// ─── Gateways ───────────────────────────────────────────────────────────────

/// Read-only access to token contracts.
#[async_trait]
pub trait TokenReader: Send + Sync {
    async fn decimals(&self, token: Address) -> Result<u8, AppError>;

    async fn token_snapshot(&self, token: Address) -> Result<TokenSnapshot, AppError>;

    async fn balance_of(&self, token: Address, account: Address)
    -> Result<BalanceSnapshot, AppError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<AllowanceSnapshot, AppError>;
}

/// State-changing access to token contracts.
#[async_trait]
pub trait TokenWriter: Send + Sync {
    /// Simulate, submit and confirm `call`. `on_submitted` fires once the
    /// transaction hash is known.
    async fn execute(
        &self,
        token: Address,
        call: &TokenCall,
        on_submitted: &(dyn Fn(TxHash) + Send + Sync),
    ) -> Result<TxOutcome, AppError>;
}

// ─── Client ─────────────────────────────────────────────────────────────────

/// ERC-20 client over an alloy provider.
#[derive(Clone)]
pub struct TokenClient {
    provider: ChainProvider,
    sender: Option<TxSender>,
}

impl TokenClient {
    /// A client that can only read.
    pub fn read_only(provider: ChainProvider) -> Self {
        Self {
            provider,
            sender: None,
        }
    }

    /// A client whose provider signs as `from`.
    pub fn with_signer(provider: ChainProvider, from: Address) -> Self {
        Self {
            sender: Some(TxSender::new(provider.clone(), from)),
            provider,
        }
    }

    /// Address writes are sent from, if a signer is configured.
    pub fn signer(&self) -> Option<Address> {
        self.sender.as_ref().map(TxSender::sender)
    }

    fn require_sender(&self) -> Result<&TxSender, AppError> {
        self.sender.as_ref().ok_or_else(|| {
            AppError::MissingPrecondition("no signing key configured for writes".into())
        })
    }
}

#[async_trait]
impl TokenReader for TokenClient {
    async fn decimals(&self, token: Address) -> Result<u8, AppError> {
        let erc20 = ERC20::new(token, &self.provider);
        Ok(erc20.decimals().call().await?)
    }

    async fn token_snapshot(&self, token: Address) -> Result<TokenSnapshot, AppError> {
        let erc20 = ERC20::new(token, &self.provider);

        let name = erc20.name();
        let symbol = erc20.symbol();
        let decimals = erc20.decimals();
        let total_supply = erc20.totalSupply();
        let owner = erc20.owner();
        let paused = erc20.paused();

        let (name, symbol, decimals, total_supply, owner, paused) = tokio::try_join!(
            name.call().into_future(),
            symbol.call().into_future(),
            decimals.call().into_future(),
            total_supply.call().into_future(),
            owner.call().into_future(),
            paused.call().into_future(),
        )?;

        tracing::debug!(%token, %symbol, decimals, "Read token snapshot");

        Ok(TokenSnapshot::from_views(
            token,
            TokenViews {
                name,
                symbol,
                decimals,
                total_supply,
                owner,
                paused,
            },
        ))
    }

    async fn balance_of(
        &self,
        token: Address,
        account: Address,
    ) -> Result<BalanceSnapshot, AppError> {
        let erc20 = ERC20::new(token, &self.provider);
        let decimals = erc20.decimals();
        let balance = erc20.balanceOf(account);

        let (decimals, raw) =
            tokio::try_join!(decimals.call().into_future(), balance.call().into_future())?;

        Ok(BalanceSnapshot {
            token,
            account,
            formatted: format_amount(raw, decimals),
            raw,
        })
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<AllowanceSnapshot, AppError> {
        let erc20 = ERC20::new(token, &self.provider);
        let decimals = erc20.decimals();
        let allowance = erc20.allowance(owner, spender);

        let (decimals, raw) =
            tokio::try_join!(decimals.call().into_future(), allowance.call().into_future())?;

        Ok(AllowanceSnapshot {
            token,
            owner,
            spender,
            formatted: format_amount(raw, decimals),
            raw,
        })
    }
}

#[async_trait]
impl TokenWriter for TokenClient {
    async fn execute(
        &self,
        token: Address,
        call: &TokenCall,
        on_submitted: &(dyn Fn(TxHash) + Send + Sync),
    ) -> Result<TxOutcome, AppError> {
        let sender = self.require_sender()?;
        tracing::info!(
            %token,
            function = call.function_name(),
            from = %sender.sender(),
            "Executing token call"
        );

        let receipt = sender
            .send_and_confirm(token, call.calldata(), on_submitted)
            .await?;
        Ok(TxOutcome::from_receipt(&receipt))
    }
}
