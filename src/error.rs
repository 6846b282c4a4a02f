use thiserror::Error;

use crate::infra::api::ApiError;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure taxonomy for content-interaction operations.
///
/// `Validation` and `NotAuthorized` are rejected locally before any request
/// is issued; `Remote` surfaces a transport or server failure after any
/// optimistic change has been rolled back or scheduled for reconciliation.
/// No variant is retried automatically.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not authorized")]
    NotAuthorized,

    #[error("remote request failed: {0}")]
    Remote(#[from] ApiError),
}
