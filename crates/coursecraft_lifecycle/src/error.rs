//! Error taxonomy of the lifecycle engine.
//!
//! Validation failures and business-gate refusals never travel as errors: they
//! are recovered into structured results (`StepResult::Rejected`,
//! `MutationResult::Refused`, ...). What remains here is ownership, store
//! constraint conflicts and storage faults.

use coursecraft_db::DbError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LifecycleError>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The entity is absent or belongs to someone else. Both collapse to this
    /// one signal so callers cannot probe for existence.
    #[error("not found")]
    NotFoundOrUnauthorized,

    /// Blocked by a business gate or a store constraint.
    #[error("conflict: {0}")]
    ConstraintConflict(String),

    /// The store could not complete the transaction (busy, locked, pool exhausted).
    #[error("storage temporarily unavailable: {0}")]
    TransientStorage(#[source] DbError),

    #[error("unexpected failure: {0}")]
    Unexpected(#[source] DbError),
}

impl LifecycleError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientStorage(_))
    }
}

impl From<DbError> for LifecycleError {
    fn from(err: DbError) -> Self {
        if err.is_transient() {
            return Self::TransientStorage(err);
        }
        match err {
            DbError::NotFound(_) => Self::NotFoundOrUnauthorized,
            DbError::Constraint(msg) => Self::ConstraintConflict(msg),
            other if other.is_unique_violation() => Self::ConstraintConflict(other.to_string()),
            other => Self::Unexpected(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_into_taxonomy() {
        let conflict: LifecycleError = DbError::constraint("concurrent append to modules; retry").into();
        assert!(matches!(conflict, LifecycleError::ConstraintConflict(ref m) if m.contains("retry")));

        let missing: LifecycleError = DbError::not_found("module x").into();
        assert!(matches!(missing, LifecycleError::NotFoundOrUnauthorized));

        let broken: LifecycleError = DbError::invalid_state("bad status").into();
        assert!(matches!(broken, LifecycleError::Unexpected(_)));
        assert!(!broken.is_retryable());

        let busy: LifecycleError = DbError::Sqlx(sqlx::Error::PoolTimedOut).into();
        assert!(busy.is_retryable());
    }
}
