use library_catalog::api::BookId;
use library_catalog::CatalogError;

use crate::api::{CallerId, RejectionKind};
use crate::ledger::LendingError;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Caller {0:?} is not a librarian")]
    Unauthorized(CallerId),

    #[error("{0:?} is the last librarian and cannot be dismissed")]
    LastLibrarian(CallerId),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Lending(#[from] LendingError),

    #[error("Book {0} not found")]
    BookNotFound(BookId),

    #[error("Failed to deserialize book: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("DatabaseFailure failure {0}")]
    DatabaseFailure(#[from] tokio_postgres::Error),

    #[error("Other error {0}")]
    Other(String),
}

impl LibraryError {
    /// Classifies errors the caller caused, `None` for infrastructure failures
    pub fn rejection_kind(&self) -> Option<RejectionKind> {
        match self {
            LibraryError::Unauthorized(_) => Some(RejectionKind::Unauthorized),
            LibraryError::LastLibrarian(_) => Some(RejectionKind::LastLibrarian),
            LibraryError::Catalog(CatalogError::InvalidQuantity(_)) => {
                Some(RejectionKind::InvalidQuantity)
            }
            LibraryError::Catalog(CatalogError::InvalidIdentifier(_)) => {
                Some(RejectionKind::InvalidIdentifier)
            }
            LibraryError::Lending(LendingError::BookUnavailable(_)) => {
                Some(RejectionKind::BookUnavailable)
            }
            LibraryError::Lending(LendingError::AlreadyBorrowed(_)) => {
                Some(RejectionKind::AlreadyBorrowed)
            }
            LibraryError::Lending(LendingError::NoActiveLoan(_)) => {
                Some(RejectionKind::NoActiveLoan)
            }
            LibraryError::BookNotFound(_)
            | LibraryError::DeserializationError(_)
            | LibraryError::DatabaseFailure(_)
            | LibraryError::Other(_) => None,
        }
    }
}
