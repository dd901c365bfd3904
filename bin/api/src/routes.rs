use std::sync::Arc;

use alloy::primitives::{Address, U256};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tokenkit_chain::{
    AllowanceSnapshot, BalanceSnapshot, FactoryRegistry, FactoryTokenInfo, RegistrationStatus,
    TokenCall, TokenReader, TokenSnapshot, actions,
};
use tokenkit_core::{AppError, NetworkConfig, OperationTracker, units::parse_amount};
use tokenkit_deploy::{DeploymentRequest, TokenParams, deploy_token};

use crate::{
    AppState,
    operations::{OperationView, Tracked},
};

// ─── Response Types ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct ApiResponse<T: Serialize> {
    success: bool,
    data: T,
}

fn json_ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

fn json_err(status: StatusCode, msg: &str) -> (StatusCode, Json<ApiResponse<String>>) {
    (
        status,
        Json(ApiResponse {
            success: false,
            data: msg.to_string(),
        }),
    )
}

/// Handler error, rendered as `{ success: false, data: message }`.
pub(crate) enum ApiError {
    App(AppError),
    NotFound(String),
    Unavailable(String),
    Internal(String),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::App(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::App(err) => {
                let status = match &err {
                    e if e.is_precondition() => StatusCode::BAD_REQUEST,
                    AppError::Reverted(_) | AppError::TransactionReverted { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    AppError::Rpc(_)
                    | AppError::Http(_)
                    | AppError::Deployment(_)
                    | AppError::Decode(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                json_err(status, &err.to_string()).into_response()
            }
            ApiError::NotFound(msg) => json_err(StatusCode::NOT_FOUND, &msg).into_response(),
            ApiError::Unavailable(msg) => {
                json_err(StatusCode::SERVICE_UNAVAILABLE, &msg).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                json_err(StatusCode::INTERNAL_SERVER_ERROR, &msg).into_response()
            }
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Serialize)]
pub(crate) struct NetworkResponse {
    #[serde(flatten)]
    network: NetworkConfig,
    signer: Option<Address>,
    deploy_endpoint: String,
}

#[derive(Serialize)]
pub(crate) struct FactoryTokensResponse {
    total: String,
    tokens: Vec<Address>,
}

#[derive(Serialize)]
pub(crate) struct FactoryTokenResponse {
    registration: RegistrationStatus,
    info: Option<FactoryTokenInfo>,
}

/// Body of every `202 Accepted`: poll `/api/v1/operations/:id` for progress.
#[derive(Serialize)]
pub(crate) struct OperationAccepted {
    id: u64,
}

fn register(state: &AppState, tracked: Tracked) -> Result<u64, ApiError> {
    state
        .operations
        .insert(tracked)
        .ok_or_else(|| ApiError::Unavailable("too many operations in flight".into()))
}

fn accepted(id: u64) -> (StatusCode, Json<ApiResponse<OperationAccepted>>) {
    (StatusCode::ACCEPTED, json_ok(OperationAccepted { id }))
}

// ─── Request Types ──────────────────────────────────────────────────────────

/// A token write with human-readable amounts, e.g.
/// `{"function": "transfer", "to": "0x…", "amount": "12.5"}`.
#[derive(Debug, Deserialize)]
#[serde(
    tag = "function",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub(crate) enum CallRequest {
    Transfer { to: Address, amount: String },
    Approve { spender: Address, amount: String },
    TransferFrom { from: Address, to: Address, amount: String },
    Mint { to: Address, amount: String },
    Burn { amount: String },
    Pause,
    Unpause,
    TransferOwnership { new_owner: Address },
}

impl CallRequest {
    fn amount(&self) -> Option<&str> {
        match self {
            CallRequest::Transfer { amount, .. }
            | CallRequest::Approve { amount, .. }
            | CallRequest::TransferFrom { amount, .. }
            | CallRequest::Mint { amount, .. }
            | CallRequest::Burn { amount } => Some(amount),
            CallRequest::Pause | CallRequest::Unpause | CallRequest::TransferOwnership { .. } => {
                None
            }
        }
    }

    /// Scale the amount by `decimals` into the call's raw shape.
    fn into_call(self, decimals: u8) -> Result<TokenCall, AppError> {
        let raw = |amount: &str| parse_amount(amount, decimals);
        Ok(match self {
            CallRequest::Transfer { to, amount } => TokenCall::Transfer {
                to,
                amount: raw(&amount)?,
            },
            CallRequest::Approve { spender, amount } => TokenCall::Approve {
                spender,
                amount: raw(&amount)?,
            },
            CallRequest::TransferFrom { from, to, amount } => TokenCall::TransferFrom {
                from,
                to,
                amount: raw(&amount)?,
            },
            CallRequest::Mint { to, amount } => TokenCall::Mint {
                to,
                amount: raw(&amount)?,
            },
            CallRequest::Burn { amount } => TokenCall::Burn {
                amount: raw(&amount)?,
            },
            CallRequest::Pause => TokenCall::Pause,
            CallRequest::Unpause => TokenCall::Unpause,
            CallRequest::TransferOwnership { new_owner } => {
                TokenCall::TransferOwnership { new_owner }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    name: String,
    symbol: String,
}

/// Factory-created tokens always have 18 decimals.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateTokenRequest {
    name: String,
    symbol: String,
    initial_supply: String,
}

impl CreateTokenRequest {
    fn validate(&self) -> Result<U256, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::MissingPrecondition("token name is required".into()));
        }
        if self.symbol.trim().is_empty() {
            return Err(AppError::MissingPrecondition("token symbol is required".into()));
        }
        parse_amount(&self.initial_supply, 18)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeployRequest {
    #[serde(flatten)]
    token: TokenParams,
    /// Overrides the server's own key for this deployment.
    #[serde(default)]
    private_key: Option<String>,
}

// ─── Handlers ───────────────────────────────────────────────────────────────

pub(crate) async fn health() -> &'static str {
    "ok"
}

/// GET /api/v1/network: resolved chain parameters.
pub(crate) async fn get_network(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<NetworkResponse>> {
    json_ok(NetworkResponse {
        network: state.settings.network.clone(),
        signer: state.writer.as_ref().and_then(|w| w.signer()),
        deploy_endpoint: state.deployer.endpoint().to_string(),
    })
}

/// GET /api/v1/tokens/:address: token metadata and supply.
pub(crate) async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(address): Path<Address>,
) -> ApiResult<TokenSnapshot> {
    Ok(json_ok(state.reader.token_snapshot(address).await?))
}

/// GET /api/v1/tokens/:address/balances/:account
pub(crate) async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path((address, account)): Path<(Address, Address)>,
) -> ApiResult<BalanceSnapshot> {
    Ok(json_ok(state.reader.balance_of(address, account).await?))
}

/// GET /api/v1/tokens/:address/allowances/:owner/:spender
pub(crate) async fn get_allowance(
    State(state): State<Arc<AppState>>,
    Path((address, owner, spender)): Path<(Address, Address, Address)>,
) -> ApiResult<AllowanceSnapshot> {
    Ok(json_ok(
        state.reader.allowance(address, owner, spender).await?,
    ))
}

/// POST /api/v1/tokens/:address/calls: start a tracked token write.
pub(crate) async fn start_call(
    State(state): State<Arc<AppState>>,
    Path(address): Path<Address>,
    Json(request): Json<CallRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let writer = state.writer()?.clone();
    let decimals = match request.amount() {
        Some(_) => state.reader.decimals(address).await?,
        None => 0,
    };
    let call = request.into_call(decimals)?;

    let tracker = Arc::new(OperationTracker::new());
    let id = register(&state, Tracked::Call(tracker.clone()))?;
    tracing::info!(id, token = %address, function = call.function_name(), "Token call accepted");

    tokio::spawn(async move {
        let _ = actions::submit_call(&tracker, &writer, address, call).await;
    });
    Ok(accepted(id))
}

/// GET /api/v1/factory/tokens: every token the factory has deployed.
pub(crate) async fn list_factory_tokens(
    State(state): State<Arc<AppState>>,
) -> ApiResult<FactoryTokensResponse> {
    let factory = state.factory()?;
    let (total, tokens): (U256, Vec<Address>) = tokio::try_join!(
        factory.total_tokens_deployed(),
        factory.all_deployed_tokens()
    )?;
    Ok(json_ok(FactoryTokensResponse {
        total: total.to_string(),
        tokens,
    }))
}

/// GET /api/v1/factory/tokens/:address: registration status and record.
pub(crate) async fn get_factory_token(
    State(state): State<Arc<AppState>>,
    Path(address): Path<Address>,
) -> ApiResult<FactoryTokenResponse> {
    let factory = state.factory()?;
    let registration = factory.registration_status(address).await;
    let info = match registration {
        RegistrationStatus::Registered => Some(factory.token_info(address).await?),
        RegistrationStatus::NotRegistered | RegistrationStatus::Unknown(_) => None,
    };
    Ok(json_ok(FactoryTokenResponse { registration, info }))
}

/// POST /api/v1/factory/tokens: create a token through the factory.
pub(crate) async fn start_creation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let factory = state.factory()?.clone();
    if factory.signer().is_none() {
        let err = AppError::MissingPrecondition("no signing key configured for writes".into());
        return Err(err.into());
    }
    let initial_supply = request.validate()?;

    let tracker = Arc::new(OperationTracker::new());
    let id = register(&state, Tracked::Creation(tracker.clone()))?;
    tracing::info!(id, symbol = %request.symbol, "Token creation accepted");

    tokio::spawn(async move {
        let _ = actions::create_token(
            &tracker,
            &factory,
            &request.name,
            &request.symbol,
            initial_supply,
        )
        .await;
    });
    Ok(accepted(id))
}

/// POST /api/v1/factory/tokens/:address/register: tracked registration.
pub(crate) async fn start_registration(
    State(state): State<Arc<AppState>>,
    Path(address): Path<Address>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let factory = state.factory()?.clone();

    let tracker = Arc::new(OperationTracker::new());
    let id = register(&state, Tracked::Registration(tracker.clone()))?;
    tracing::info!(id, token = %address, "Registration accepted");

    tokio::spawn(async move {
        let _ = actions::register_token(
            &tracker,
            &factory,
            address,
            &request.name,
            &request.symbol,
        )
        .await;
    });
    Ok(accepted(id))
}

/// POST /api/v1/deployments: hand a token to the deployment service.
pub(crate) async fn start_deployment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeployRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let key = body
        .private_key
        .as_deref()
        .or(state.settings.private_key.as_deref());
    let request = DeploymentRequest::prepare(body.token, key, &state.settings.network)?;

    let tracker = Arc::new(OperationTracker::new());
    let id = register(&state, Tracked::Deployment(tracker.clone()))?;
    tracing::info!(id, symbol = %request.symbol, "Deployment accepted");

    let gateway = state.deployer.clone();
    tokio::spawn(async move {
        let _ = deploy_token(&tracker, &gateway, &request).await;
    });
    Ok(accepted(id))
}

/// GET /api/v1/operations/:id: current state of a tracked operation.
pub(crate) async fn get_operation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<OperationView> {
    match state.operations.view(id) {
        Some(Ok(view)) => Ok(json_ok(view)),
        Some(Err(e)) => Err(ApiError::Internal(e.to_string())),
        None => Err(ApiError::NotFound(format!("operation {id} not found"))),
    }
}
