//! Error taxonomy and the soft-fail result type.
//!
//! Collaborator failures are never fatal to a resolution call: each boundary
//! degrades to an empty value and records the cause. [`Fetched`] makes that
//! degradation explicit so tests can assert it without a real network.

use thiserror::Error;

/// A failure reaching the remote CRM API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid access token")]
    Unauthorized,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("remote API error: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// The outcome of a cache-backed fetch: either a fresh (or still-valid
/// cached) value, or an empty fallback with the cause of degradation.
///
/// Callers that only want the value call [`Fetched::into_inner`]; callers
/// that care about partial schema knowledge inspect [`Fetched::cause`].
#[derive(Debug)]
pub enum Fetched<T> {
    Fresh(T),
    Degraded { fallback: T, cause: ApiError },
}

impl<T> Fetched<T> {
    pub fn into_inner(self) -> T {
        match self {
            Fetched::Fresh(v) => v,
            Fetched::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn inner(&self) -> &T {
        match self {
            Fetched::Fresh(v) => v,
            Fetched::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Fetched::Degraded { .. })
    }

    pub fn cause(&self) -> Option<&ApiError> {
        match self {
            Fetched::Fresh(_) => None,
            Fetched::Degraded { cause, .. } => Some(cause),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_exposes_fallback_and_cause() {
        let f: Fetched<Vec<u32>> = Fetched::Degraded {
            fallback: vec![],
            cause: ApiError::RateLimited,
        };
        assert!(f.is_degraded());
        assert!(matches!(f.cause(), Some(ApiError::RateLimited)));
        assert!(f.into_inner().is_empty());
    }
}
