use crate::article::ArticleId;
use thiserror::Error;

/// Errors surfaced by the search core.
///
/// `IndexInconsistency` should be unreachable while mutations stay inside
/// the engine's write lock; if it ever fires, the operation is refused
/// instead of returning partial results.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("article {0} not found")]
    NotFound(ArticleId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("index inconsistency: {0}")]
    IndexInconsistency(String),
}
