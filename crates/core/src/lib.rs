pub mod config;
pub mod error;
pub mod operation;
pub mod telemetry;
pub mod units;

pub use config::{Network, NetworkConfig, Settings};
pub use error::AppError;
pub use operation::{
    OperationError, OperationState, OperationTracker, SettlementPolicy, Stage, Ticket,
};
