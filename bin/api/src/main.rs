//! Tokenkit API Server: token reads, tracked writes and deployments for the front-end.

mod operations;
mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use std::{net::SocketAddr, sync::Arc};
use tokenkit_chain::{FactoryClient, TokenClient, create_provider, create_signing_provider};
use tokenkit_core::{AppError, Settings, telemetry};
use tokenkit_deploy::HttpDeploymentGateway;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::operations::OperationRegistry;

/// Shared application state.
pub(crate) struct AppState {
    settings: Settings,
    reader: TokenClient,
    writer: Option<TokenClient>,
    factory: Option<FactoryClient>,
    deployer: HttpDeploymentGateway,
    operations: OperationRegistry,
}

impl AppState {
    fn from_settings(settings: Settings) -> eyre::Result<Self> {
        let provider = create_provider(&settings.network)?;
        let factory = settings
            .network
            .factory_address
            .map(|_| FactoryClient::new(provider.clone(), &settings.network))
            .transpose()?;

        let (writer, factory) = match settings.private_key.as_deref() {
            Some(key) => {
                let (signing, from) = create_signing_provider(&settings.network.rpc_url, key)?;
                tracing::info!(signer = %from, "Signing key loaded");
                (
                    Some(TokenClient::with_signer(signing.clone(), from)),
                    factory.map(|f| f.with_signer(signing, from)),
                )
            }
            None => {
                tracing::warn!("No PRIVATE_KEY set, writes are disabled");
                (None, factory)
            }
        };

        Ok(Self {
            reader: TokenClient::read_only(provider),
            writer,
            factory,
            deployer: HttpDeploymentGateway::new(&settings.deploy_api_url)?,
            operations: OperationRegistry::default(),
            settings,
        })
    }

    fn writer(&self) -> Result<&TokenClient, AppError> {
        self.writer.as_ref().ok_or_else(|| {
            AppError::MissingPrecondition("no signing key configured for token writes".into())
        })
    }

    fn factory(&self) -> Result<&FactoryClient, AppError> {
        match &self.factory {
            Some(factory) => Ok(factory),
            None => Err(self.settings.network.require_factory().err().unwrap_or_else(|| {
                AppError::Config("factory client unavailable".into())
            })),
        }
    }
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/network", get(routes::get_network))
        .route("/api/v1/tokens/:address", get(routes::get_token))
        .route(
            "/api/v1/tokens/:address/balances/:account",
            get(routes::get_balance),
        )
        .route(
            "/api/v1/tokens/:address/allowances/:owner/:spender",
            get(routes::get_allowance),
        )
        .route("/api/v1/tokens/:address/calls", post(routes::start_call))
        .route(
            "/api/v1/factory/tokens",
            get(routes::list_factory_tokens).post(routes::start_creation),
        )
        .route(
            "/api/v1/factory/tokens/:address",
            get(routes::get_factory_token),
        )
        .route(
            "/api/v1/factory/tokens/:address/register",
            post(routes::start_registration),
        )
        .route("/api/v1/deployments", post(routes::start_deployment))
        .route("/api/v1/operations/:id", get(routes::get_operation))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    telemetry::init();
    let settings = Settings::from_env()?;

    tracing::info!(
        network = %settings.network.network,
        rpc = %settings.network.rpc_url,
        "Starting Tokenkit API Server"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.api_port));
    let state = Arc::new(AppState::from_settings(settings)?);
    let app = router(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
