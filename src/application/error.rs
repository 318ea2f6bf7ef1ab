use thiserror::Error;

use crate::domain::{Rejection, SnapshotError};

#[derive(Error, Debug)]
pub enum AppError {
    /// The ledger refused the operation; nothing was saved.
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Invalid ledger snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// The rejection reason, if the ledger refused the operation.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            AppError::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}
