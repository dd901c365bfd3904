use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde::Serialize;
use tokenkit_core::{AppError, NetworkConfig, units::serialize_decimal};

use crate::{
    abi::TokenFactory,
    calls::FactoryCall,
    decoder::{self, TokenCreatedEvent},
    provider::ChainProvider,
    tx::{TxOutcome, TxSender},
};

/// What the factory records about one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryTokenInfo {
    pub token: Address,
    pub name: String,
    pub symbol: String,
    pub creator: Address,
    #[serde(serialize_with = "serialize_decimal")]
    pub initial_supply: U256,
    #[serde(serialize_with = "serialize_decimal")]
    pub deployed_at: U256,
}

impl FactoryTokenInfo {
    /// The factory returns an empty record for tokens it has never seen.
    pub fn is_registered(&self) -> bool {
        self.creator != Address::ZERO
    }
}

/// Whether a token is known to the factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    NotRegistered,
    /// The lookup itself failed; registration could not be determined.
    Unknown(String),
}

/// A confirmed `createToken` transaction and the token it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedToken {
    pub outcome: TxOutcome,
    pub token: TokenCreatedEvent,
}

/// Factory contract writes used by the registration and creation workflows.
#[async_trait]
pub trait FactoryRegistry: Send + Sync {
    /// Never fails: lookup errors become [`RegistrationStatus::Unknown`].
    async fn registration_status(&self, token: Address) -> RegistrationStatus;

    async fn register_token(
        &self,
        token: Address,
        name: &str,
        symbol: &str,
        on_submitted: &(dyn Fn(TxHash) + Send + Sync),
    ) -> Result<TxOutcome, AppError>;

    /// Fails with [`AppError::Decode`] when the receipt carries no
    /// `TokenCreated` event.
    async fn create_token(
        &self,
        name: &str,
        symbol: &str,
        initial_supply: U256,
        on_submitted: &(dyn Fn(TxHash) + Send + Sync),
    ) -> Result<CreatedToken, AppError>;
}

/// Client for the token factory contract.
#[derive(Clone)]
pub struct FactoryClient {
    provider: ChainProvider,
    address: Address,
    sender: Option<TxSender>,
}

impl FactoryClient {
    /// Read-only client for the network's configured factory.
    pub fn new(provider: ChainProvider, network: &NetworkConfig) -> Result<Self, AppError> {
        Ok(Self {
            provider,
            address: network.require_factory()?,
            sender: None,
        })
    }

    /// Same factory, writes signed as `from` through `provider`.
    pub fn with_signer(mut self, provider: ChainProvider, from: Address) -> Self {
        self.sender = Some(TxSender::new(provider, from));
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Address factory writes are sent from, if a signer is configured.
    pub fn signer(&self) -> Option<Address> {
        self.sender.as_ref().map(TxSender::sender)
    }

    fn require_sender(&self) -> Result<&TxSender, AppError> {
        self.sender.as_ref().ok_or_else(|| {
            AppError::MissingPrecondition("no signing key configured for factory writes".into())
        })
    }

    pub async fn all_deployed_tokens(&self) -> Result<Vec<Address>, AppError> {
        let factory = TokenFactory::new(self.address, &self.provider);
        Ok(factory.getAllDeployedTokens().call().await?)
    }

    pub async fn total_tokens_deployed(&self) -> Result<U256, AppError> {
        let factory = TokenFactory::new(self.address, &self.provider);
        Ok(factory.getTotalTokensDeployed().call().await?)
    }

    pub async fn token_info(&self, token: Address) -> Result<FactoryTokenInfo, AppError> {
        let factory = TokenFactory::new(self.address, &self.provider);
        let info = factory.getTokenInfo(token).call().await?;
        Ok(FactoryTokenInfo {
            token,
            name: info.name,
            symbol: info.symbol,
            creator: info.creator,
            initial_supply: info.initialSupply,
            deployed_at: info.deployedAt,
        })
    }
}

#[async_trait]
impl FactoryRegistry for FactoryClient {
    async fn registration_status(&self, token: Address) -> RegistrationStatus {
        match self.token_info(token).await {
            Ok(info) if info.is_registered() => RegistrationStatus::Registered,
            Ok(_) => RegistrationStatus::NotRegistered,
            Err(e) => {
                tracing::warn!(%token, error = %e, "Registration lookup failed");
                RegistrationStatus::Unknown(e.to_string())
            }
        }
    }

    async fn register_token(
        &self,
        token: Address,
        name: &str,
        symbol: &str,
        on_submitted: &(dyn Fn(TxHash) + Send + Sync),
    ) -> Result<TxOutcome, AppError> {
        let sender = self.require_sender()?;
        let call = FactoryCall::RegisterToken {
            token,
            name: name.to_string(),
            symbol: symbol.to_string(),
        };
        tracing::info!(factory = %self.address, %token, "Registering token");

        let receipt = sender
            .send_and_confirm(self.address, call.calldata(), on_submitted)
            .await?;
        Ok(TxOutcome::from_receipt(&receipt))
    }

    async fn create_token(
        &self,
        name: &str,
        symbol: &str,
        initial_supply: U256,
        on_submitted: &(dyn Fn(TxHash) + Send + Sync),
    ) -> Result<CreatedToken, AppError> {
        let sender = self.require_sender()?;
        let call = FactoryCall::CreateToken {
            name: name.to_string(),
            symbol: symbol.to_string(),
            initial_supply,
        };
        tracing::info!(factory = %self.address, %name, %symbol, "Creating token");

        let receipt = sender
            .send_and_confirm(self.address, call.calldata(), on_submitted)
            .await?;
        let token = receipt
            .inner
            .logs()
            .iter()
            .find_map(decoder::decode_token_created)
            .ok_or_else(|| {
                AppError::Decode(format!(
                    "no TokenCreated event in {:#x}",
                    receipt.transaction_hash
                ))
            })?;

        tracing::info!(token = %token.token_address, "Token created");
        Ok(CreatedToken {
            outcome: TxOutcome::from_receipt(&receipt),
            token,
        })
    }
}
