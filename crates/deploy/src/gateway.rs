use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tokenkit_core::AppError;

use crate::types::{DeploymentRequest, DeploymentResult, ErrorBody};

/// Compiling, activating and initializing a Stylus contract takes minutes.
const DEPLOY_TIMEOUT: Duration = Duration::from_secs(600);

/// Remote service that runs the whole deployment pipeline.
#[async_trait]
pub trait DeploymentGateway: Send + Sync {
    async fn submit(&self, request: &DeploymentRequest) -> Result<DeploymentResult, AppError>;
}

/// [`DeploymentGateway`] speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDeploymentGateway {
    client: Client,
    endpoint: Url,
}

impl HttpDeploymentGateway {
    /// Gateway for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(DEPLOY_TIMEOUT)
            .build()
            .map_err(|e| AppError::Http(e.to_string()))?;
        Self::with_client(client, base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, AppError> {
        let endpoint = Url::parse(&format!("{}/deploy-token", base_url.trim_end_matches('/')))
            .map_err(|e| {
                AppError::Config(format!("invalid deployment API URL `{base_url}`: {e}"))
            })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl DeploymentGateway for HttpDeploymentGateway {
    async fn submit(&self, request: &DeploymentRequest) -> Result<DeploymentResult, AppError> {
        tracing::info!(
            endpoint = %self.endpoint,
            name = %request.name,
            symbol = %request.symbol,
            "Submitting deployment"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Http(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Http(e.to_string()))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody { error }) => error,
                Err(_) => format!("deployment service returned {status}: {body}"),
            };
            tracing::warn!(%status, error = %message, "Deployment rejected");
            return Err(AppError::Deployment(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::Decode(format!("unexpected deployment response: {e}")))
    }
}
