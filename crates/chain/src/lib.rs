pub mod abi;
pub mod actions;
pub mod calls;
pub mod decoder;
pub mod factory;
pub mod provider;
pub mod token;
pub mod tx;

#[cfg(test)]
mod test_support;

pub use abi::{ERC20, TokenFactory};
pub use calls::{FactoryCall, TokenCall};
pub use decoder::{TokenCreatedEvent, TokenEvent, decode_token_created, decode_token_log};
pub use factory::{
    CreatedToken, FactoryClient, FactoryRegistry, FactoryTokenInfo, RegistrationStatus,
};
pub use provider::{ChainProvider, create_provider, create_signing_provider};
pub use token::{
    AllowanceSnapshot, BalanceSnapshot, TokenClient, TokenReader, TokenSnapshot, TokenWriter,
};
pub use tx::{TxOutcome, TxSender};
