use scribe_core::rubric::ValidationError;
use scribe_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
