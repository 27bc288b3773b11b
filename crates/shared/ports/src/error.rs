use thiserror::Error;

/// Failures surfaced by the trading API collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("rate limit exhausted, {remaining} requests left")]
    RateLimited { remaining: u32 },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("trading api unavailable: {0}")]
    Unavailable(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
