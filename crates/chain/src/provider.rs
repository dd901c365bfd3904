use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use tokenkit_core::{AppError, NetworkConfig};

/// The RPC provider type used throughout the toolkit.
///
/// Type-erased so read-only and wallet-backed providers share one client type.
pub type ChainProvider = DynProvider;

/// Create a read-only HTTP provider for the configured network.
pub fn create_provider(network: &NetworkConfig) -> eyre::Result<ChainProvider> {
    let url = network.rpc_url.parse()?;
    let provider = ProviderBuilder::new().connect_http(url);
    Ok(provider.erased())
}

/// A provider that signs with `private_key`, plus the signer's address.
pub fn create_signing_provider(
    rpc_url: &str,
    private_key: &str,
) -> Result<(ChainProvider, Address), AppError> {
    let signer: PrivateKeySigner = private_key
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid private key: {e}")))?;
    let from = signer.address();

    let url: Url = rpc_url
        .parse()
        .map_err(|e| AppError::Config(format!("invalid RPC URL `{rpc_url}`: {e}")))?;
    let provider = ProviderBuilder::new().wallet(signer).connect_http(url);

    tracing::debug!(%from, rpc = %rpc_url, "Created signing provider");
    Ok((provider.erased(), from))
}
