use thiserror::Error;

use crate::domain::ValidationError;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Rejected before any state change
    #[error("Invalid transaction: {0}")]
    Validation(#[from] ValidationError),

    /// The in-memory change was applied but could not be written to storage
    #[error("Persistence error: {0:#}")]
    Persistence(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }

    /// True when memory holds state that storage does not.
    pub fn is_unsaved(&self) -> bool {
        matches!(
            self,
            LedgerError::Persistence(_) | LedgerError::Serialization(_)
        )
    }
}
