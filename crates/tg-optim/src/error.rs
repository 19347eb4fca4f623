//! Optimizer error types.

use tg_core::TgError;
use tg_graph::GraphError;
use thiserror::Error;

/// Result type for optimizer operations.
pub type OptimResult<T> = Result<T, OptimError>;

/// Errors that end a query. None of them are retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimError {
    /// Bad query configuration; the caller may re-issue a corrected query.
    #[error("Invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Filters eliminated every candidate alloy; no search was attempted.
    #[error("No candidates survive filtering: {reason}")]
    EmptyResult { reason: String },

    /// Search ran but reached no Hardness node inside the target range.
    #[error("No feasible route: {reason}")]
    NoFeasibleRoute { reason: String },

    /// Robustness grid specification is unusable.
    #[error("Invalid grid: {reason}")]
    InvalidGrid { reason: String },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Core(#[from] TgError),
}

impl OptimError {
    pub(crate) fn invalid_query(reason: impl Into<String>) -> Self {
        OptimError::InvalidQuery {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_grid(reason: impl Into<String>) -> Self {
        OptimError::InvalidGrid {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OptimError::invalid_query("alpha must be within [0, 1]");
        assert!(err.to_string().contains("alpha"));

        let err: OptimError = GraphError::SourceCount { count: 0 }.into();
        assert!(err.to_string().contains("source"));
    }
}
