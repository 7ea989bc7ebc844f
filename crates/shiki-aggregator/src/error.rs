//! Error types returned by the aggregation layer.

use crate::api::catalog::Operation;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure while talking to the upstream endpoint
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode upstream payload: {0}")]
    Decode(String),

    #[error("upstream GraphQL error: {0}")]
    GraphQl(String),
}

/// Error returned by every aggregation operation
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{operation} failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: TransportError,
    },

    #[error("{operation}: no anime found for id {id:?}")]
    NotFound { operation: Operation, id: String },
}

impl AggregatorError {
    pub(crate) fn transport(operation: Operation, source: TransportError) -> Self {
        AggregatorError::Transport { operation, source }
    }

    /// Whether the caller cancelled or the deadline expired
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AggregatorError::Transport {
                source: TransportError::Cancelled | TransportError::DeadlineExceeded,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
