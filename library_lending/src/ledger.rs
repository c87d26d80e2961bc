use std::collections::{BTreeSet, HashMap};

use library_catalog::api::BookId;
use library_catalog::{Catalog, TitleAvailability};

use crate::api::PatronId;

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum LendingError {
    #[error("Book {0:?} is not available")]
    BookUnavailable(String),

    #[error("Book {0:?} is already borrowed by this patron")]
    AlreadyBorrowed(String),

    #[error("Patron has no active loan of {0:?}")]
    NoActiveLoan(String),
}

/// Identifiers a patron currently holds, at most one loan per identifier
pub type LoanSet = BTreeSet<BookId>;

/// Decides a borrow request from the two independently computed predicates.
/// Unavailability wins over a duplicate loan when both hold.
pub fn decide_borrow(
    title: &str,
    availability: TitleAvailability,
    already_borrowed: bool,
) -> Result<BookId, LendingError> {
    match availability {
        TitleAvailability {
            book_id: Some(book_id),
            available: true,
        } if !already_borrowed => Ok(book_id),
        TitleAvailability {
            book_id: Some(_),
            available: true,
        } => Err(LendingError::AlreadyBorrowed(title.to_string())),
        _ => Err(LendingError::BookUnavailable(title.to_string())),
    }
}

/// Per patron loan sets. Every mutation goes together with the matching catalog update.
#[derive(Debug, Default)]
pub struct LendingLedger {
    loans: HashMap<PatronId, LoanSet>,
}

impl LendingLedger {
    pub fn borrow(
        &mut self,
        catalog: &mut Catalog,
        patron_id: &str,
        title: &str,
    ) -> Result<BookId, LendingError> {
        let availability = catalog.is_available(title);
        let already_borrowed = availability
            .book_id
            .map(|book_id| self.holds(patron_id, book_id))
            .unwrap_or_default();

        let book_id = decide_borrow(title, availability, already_borrowed)?;

        catalog.decrement_availability(book_id);
        self.loans
            .entry(patron_id.to_string())
            .or_default()
            .insert(book_id);
        tracing::debug!("Patron {} borrowed book {}", patron_id, book_id);
        Ok(book_id)
    }

    /// Returns the copy of `title` held by the patron.
    /// Resolution goes through the title index only, current availability does not matter.
    pub fn return_book(
        &mut self,
        catalog: &mut Catalog,
        patron_id: &str,
        title: &str,
    ) -> Result<BookId, LendingError> {
        let book_id = catalog
            .find_by_title(title)
            .filter(|book_id| self.holds(patron_id, *book_id))
            .ok_or_else(|| LendingError::NoActiveLoan(title.to_string()))?;

        catalog.increment_availability(book_id);
        if let Some(loans) = self.loans.get_mut(patron_id) {
            loans.remove(&book_id);
        }
        tracing::debug!("Patron {} returned book {}", patron_id, book_id);
        Ok(book_id)
    }

    pub fn holds(&self, patron_id: &str, book_id: BookId) -> bool {
        self.loans
            .get(patron_id)
            .map(|loans| loans.contains(&book_id))
            .unwrap_or_default()
    }

    pub fn loans_of(&self, patron_id: &str) -> Vec<BookId> {
        self.loans
            .get(patron_id)
            .map(|loans| loans.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of outstanding loans of `book_id` across all patrons
    #[cfg(test)]
    pub fn outstanding(&self, book_id: BookId) -> usize {
        self.loans
            .values()
            .filter(|loans| loans.contains(&book_id))
            .count()
    }
}
