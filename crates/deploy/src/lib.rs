//! Client for the remote token deployment service.

pub mod deploy;
pub mod gateway;
pub mod types;

pub use deploy::deploy_token;
pub use gateway::{DeploymentGateway, HttpDeploymentGateway};
pub use types::{DeploymentRequest, DeploymentResult, TokenParams};
