use std::fmt;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use tokenkit_core::{AppError, NetworkConfig, Stage, units::parse_amount};

/// Decimals the deployed token contract uses; only for validating input.
const DEPLOYED_TOKEN_DECIMALS: u8 = 18;

/// Metadata for a token to deploy, as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    /// Human decimal string, e.g. `"1000000"`.
    pub initial_supply: String,
    #[serde(default)]
    pub factory_address: Option<Address>,
}

/// Body of `POST /deploy-token`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    pub name: String,
    pub symbol: String,
    pub initial_supply: String,
    pub factory_address: Option<Address>,
    pub private_key: String,
    pub rpc_endpoint: String,
}

impl fmt::Debug for DeploymentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentRequest")
            .field("name", &self.name)
            .field("symbol", &self.symbol)
            .field("initial_supply", &self.initial_supply)
            .field("factory_address", &self.factory_address)
            .field("private_key", &"<redacted>")
            .field("rpc_endpoint", &self.rpc_endpoint)
            .finish()
    }
}

impl DeploymentRequest {
    /// Validate `params` and fill in the signing key, RPC endpoint and, when
    /// the params carry none, the network's factory address.
    ///
    /// Fails before anything is sent.
    pub fn prepare(
        params: TokenParams,
        private_key: Option<&str>,
        network: &NetworkConfig,
    ) -> Result<Self, AppError> {
        let private_key = private_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AppError::MissingPrecondition("a signing key is required to deploy".into())
            })?;

        let name = params.name.trim();
        if name.is_empty() {
            return Err(AppError::MissingPrecondition("token name is empty".into()));
        }
        let symbol = params.symbol.trim();
        if symbol.is_empty() {
            return Err(AppError::MissingPrecondition("token symbol is empty".into()));
        }
        parse_amount(&params.initial_supply, DEPLOYED_TOKEN_DECIMALS)?;

        Ok(Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            initial_supply: params.initial_supply.trim().to_string(),
            factory_address: params.factory_address.or(network.factory_address),
            private_key: private_key.to_string(),
            rpc_endpoint: network.rpc_url.clone(),
        })
    }
}

/// Terminal result reported by the deployment service, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub token_address: String,
    pub tx_hash: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub register_output: Option<String>,
}

impl DeploymentResult {
    /// Output of each pipeline stage the service reported on.
    pub fn stage_logs(&self) -> impl Iterator<Item = (Stage, &str)> {
        [
            (Stage::Deploying, self.deploy_output.as_deref()),
            (Stage::Initializing, self.init_output.as_deref()),
            (Stage::Registering, self.register_output.as_deref()),
        ]
        .into_iter()
        .filter_map(|(stage, output)| output.map(|o| (stage, o)))
    }
}

/// Body of a non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use tokenkit_core::Network;

    use super::*;

    fn params() -> TokenParams {
        TokenParams {
            name: " Stylus Token ".into(),
            symbol: "STY".into(),
            initial_supply: "1000000".into(),
            factory_address: None,
        }
    }

    fn network() -> NetworkConfig {
        NetworkConfig::resolve(
            Network::ArbitrumSepolia,
            None,
            Some(Address::with_last_byte(0xf1)),
        )
    }

    #[test]
    fn prepare_fills_network_defaults() {
        let request = DeploymentRequest::prepare(params(), Some("0xkey"), &network()).unwrap();
        assert_eq!(request.name, "Stylus Token");
        assert_eq!(request.factory_address, Some(Address::with_last_byte(0xf1)));
        assert_eq!(request.rpc_endpoint, "https://sepolia-rollup.arbitrum.io/rpc");
    }

    #[test]
    fn explicit_factory_overrides_network() {
        let mut params = params();
        params.factory_address = Some(Address::with_last_byte(0x02));
        let request = DeploymentRequest::prepare(params, Some("0xkey"), &network()).unwrap();
        assert_eq!(request.factory_address, Some(Address::with_last_byte(0x02)));
    }

    #[test]
    fn prepare_rejects_missing_inputs() {
        assert!(matches!(
            DeploymentRequest::prepare(params(), None, &network()),
            Err(AppError::MissingPrecondition(_))
        ));
        assert!(matches!(
            DeploymentRequest::prepare(params(), Some("  "), &network()),
            Err(AppError::MissingPrecondition(_))
        ));

        let mut bad_symbol = params();
        bad_symbol.symbol = String::new();
        assert!(matches!(
            DeploymentRequest::prepare(bad_symbol, Some("0xkey"), &network()),
            Err(AppError::MissingPrecondition(_))
        ));

        let mut bad_supply = params();
        bad_supply.initial_supply = "lots".into();
        assert!(matches!(
            DeploymentRequest::prepare(bad_supply, Some("0xkey"), &network()),
            Err(AppError::InvalidAmount(_))
        ));
    }

    #[test]
    fn request_uses_wire_field_names() {
        let request = DeploymentRequest::prepare(params(), Some("0xkey"), &network()).unwrap();
        let json = serde_json::to_value(&request).unwrap();
        for key in [
            "name",
            "symbol",
            "initialSupply",
            "factoryAddress",
            "privateKey",
            "rpcEndpoint",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(!format!("{request:?}").contains("0xkey"));
    }

    #[test]
    fn result_parses_optional_stage_logs() {
        let result: DeploymentResult = serde_json::from_str(
            r#"{"tokenAddress":"0xabc","txHash":"0xdef","success":true,"initOutput":"initialized"}"#,
        )
        .unwrap();
        assert!(result.deploy_output.is_none());
        let logs: Vec<_> = result.stage_logs().collect();
        assert_eq!(logs, vec![(Stage::Initializing, "initialized")]);
    }
}
