use tokenkit_core::{AppError, OperationError, OperationTracker, Stage};

use crate::{
    gateway::DeploymentGateway,
    types::{DeploymentRequest, DeploymentResult},
};

/// Hand `request` to the deployment service and track it to completion.
///
/// The service compiles, deploys, activates, initializes and registers the
/// token in one call; the tracker stays in a deployment stage throughout.
/// Whatever a 2xx response reports, `success: false` and stage output
/// included, is settled as the result unchanged.
pub async fn deploy_token<G>(
    tracker: &OperationTracker<DeploymentResult>,
    gateway: &G,
    request: &DeploymentRequest,
) -> Result<DeploymentResult, OperationError>
where
    G: DeploymentGateway + ?Sized,
{
    let deployment = async {
        let result = gateway.submit(request).await?;
        for (stage, output) in result.stage_logs() {
            tracing::info!(%stage, output, "Deployment stage output");
        }
        if result.success {
            tracing::info!(
                token = %result.token_address,
                tx_hash = %result.tx_hash,
                "Token deployed"
            );
        } else {
            tracing::warn!(symbol = %request.symbol, "Deployment service reported failure");
        }
        Ok::<_, AppError>(result)
    };

    tracker.track(Some(Stage::Deploying), deployment).await
}
