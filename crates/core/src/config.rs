use std::{fmt, str::FromStr};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::AppError;

/// Chains the toolkit knows defaults for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    ArbitrumSepolia,
    ArbitrumOne,
    /// Local Nitro dev node.
    Localhost,
}

/// Static defaults for one network. Resolved into a [`NetworkConfig`] at startup.
struct NetworkDefaults {
    chain_id: u64,
    rpc_url: &'static str,
    factory_address: Option<Address>,
}

impl Network {
    fn defaults(self) -> NetworkDefaults {
        match self {
            Network::ArbitrumSepolia => NetworkDefaults {
                chain_id: 421_614,
                rpc_url: "https://sepolia-rollup.arbitrum.io/rpc",
                factory_address: None,
            },
            Network::ArbitrumOne => NetworkDefaults {
                chain_id: 42_161,
                rpc_url: "https://arb1.arbitrum.io/rpc",
                factory_address: None,
            },
            Network::Localhost => NetworkDefaults {
                chain_id: 412_346,
                rpc_url: "http://localhost:8547",
                factory_address: None,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::ArbitrumSepolia => "arbitrum-sepolia",
            Network::ArbitrumOne => "arbitrum-one",
            Network::Localhost => "localhost",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arbitrum-sepolia" | "arbitrumsepolia" | "sepolia" => Ok(Network::ArbitrumSepolia),
            "arbitrum-one" | "arbitrum" | "mainnet" => Ok(Network::ArbitrumOne),
            "localhost" | "local" | "devnode" => Ok(Network::Localhost),
            other => Err(AppError::Config(format!("unknown network `{other}`"))),
        }
    }
}

/// Chain parameters resolved once and passed by reference to every client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkConfig {
    pub network: Network,
    pub chain_id: u64,
    pub rpc_url: String,
    pub factory_address: Option<Address>,
}

impl NetworkConfig {
    /// Defaults for `network`, optionally overridden.
    pub fn resolve(
        network: Network,
        rpc_url: Option<String>,
        factory_address: Option<Address>,
    ) -> Self {
        let defaults = network.defaults();
        Self {
            network,
            chain_id: defaults.chain_id,
            rpc_url: rpc_url.unwrap_or_else(|| defaults.rpc_url.to_string()),
            factory_address: factory_address.or(defaults.factory_address),
        }
    }

    /// The factory address, or a configuration error when none is known.
    pub fn require_factory(&self) -> Result<Address, AppError> {
        self.factory_address.ok_or_else(|| {
            AppError::Config(format!(
                "no factory address configured for {}; set FACTORY_ADDRESS",
                self.network
            ))
        })
    }
}

/// Global application settings loaded from environment variables.
#[derive(Clone)]
pub struct Settings {
    /// Chain the toolkit talks to.
    pub network: NetworkConfig,

    /// Base URL of the deployment service.
    pub deploy_api_url: String,

    /// Hex-encoded signing key. Write operations are unavailable without one.
    pub private_key: Option<String>,

    /// Port for the API server.
    pub api_port: u16,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("network", &self.network)
            .field("deploy_api_url", &self.deploy_api_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("api_port", &self.api_port)
            .finish()
    }
}

impl Settings {
    /// Load settings from environment variables (with optional `.env` file).
    pub fn from_env() -> eyre::Result<Self> {
        dotenvy::dotenv().ok();
        Ok(Self::from_lookup(|key| std::env::var(key).ok())?)
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let network: Network = var("NETWORK")
            .unwrap_or_else(|| "arbitrum-sepolia".into())
            .parse()?;
        let factory_address = var("FACTORY_ADDRESS")
            .map(|raw| {
                raw.parse::<Address>()
                    .map_err(|e| AppError::Config(format!("FACTORY_ADDRESS: {e}")))
            })
            .transpose()?;

        Ok(Self {
            network: NetworkConfig::resolve(network, var("RPC_URL"), factory_address),
            deploy_api_url: var("DEPLOY_API_URL").unwrap_or_else(|| "http://localhost:3001".into()),
            private_key: var("PRIVATE_KEY"),
            api_port: var("API_PORT")
                .unwrap_or_else(|| "3000".into())
                .parse()
                .map_err(|e| AppError::Config(format!("API_PORT: {e}")))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use alloy::primitives::address;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_arbitrum_sepolia() {
        let settings = settings(&[]).unwrap();
        let network = &settings.network;
        assert_eq!(network.network, Network::ArbitrumSepolia);
        assert_eq!(network.chain_id, 421_614);
        assert_eq!(network.rpc_url, "https://sepolia-rollup.arbitrum.io/rpc");
        assert_eq!(network.factory_address, None);
        assert_eq!(settings.api_port, 3000);
        assert!(settings.private_key.is_none());
    }

    #[test]
    fn overrides_take_precedence() {
        let settings = settings(&[
            ("NETWORK", "localhost"),
            ("RPC_URL", "http://127.0.0.1:9000"),
            ("FACTORY_ADDRESS", "0x00000000000000000000000000000000000000f1"),
            ("API_PORT", "8080"),
            ("PRIVATE_KEY", ""),
        ])
        .unwrap();
        let network = &settings.network;
        assert_eq!(network.chain_id, 412_346);
        assert_eq!(network.rpc_url, "http://127.0.0.1:9000");
        assert_eq!(
            network.require_factory().unwrap(),
            address!("00000000000000000000000000000000000000f1")
        );
        assert_eq!(settings.api_port, 8080);
        // blank values count as unset
        assert!(settings.private_key.is_none());
    }

    #[test]
    fn rejects_unknown_network() {
        let err = settings(&[("NETWORK", "solana")]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("solana")));
    }

    #[test]
    fn missing_factory_is_a_config_error() {
        let config = NetworkConfig::resolve(Network::ArbitrumOne, None, None);
        assert!(matches!(config.require_factory(), Err(AppError::Config(_))));
    }

    #[test]
    fn debug_redacts_private_key() {
        let settings = settings(&[("PRIVATE_KEY", "0xdeadbeef")]).unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("<redacted>"));
    }
}
