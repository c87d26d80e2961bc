use std::collections::HashMap;

use crate::api::{BookId, BookRecord, BookTitleAndId, RegisterBookRequest, TitleLookup};

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Quantity {0} is too low, at least two copies must be registered")]
    InvalidQuantity(i64),

    #[error("Identifier {0} is not a valid book identifier")]
    InvalidIdentifier(BookId),
}

/// Outcome of the availability check done before lending.
/// `book_id` is reported whenever the title is known, even if nothing can be lent.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TitleAvailability {
    pub book_id: Option<BookId>,
    pub available: bool,
}

/// Title index plus book records. Knows nothing about patrons.
#[derive(Debug, Default)]
pub struct Catalog {
    titles: HashMap<String, BookId>,
    books: HashMap<BookId, BookRecord>,
}

impl Catalog {
    /// Inserts or overwrites the record under `request.book_id` and points the title at it.
    /// Returns the identifier the title was previously mapped to, if it was a different one.
    pub fn register(
        &mut self,
        request: RegisterBookRequest,
    ) -> Result<Option<BookId>, CatalogError> {
        let record = BookRecord::new(request)?;
        let book_id = record.book_id;

        let previous = self
            .titles
            .insert(record.title.clone(), book_id)
            .filter(|previous_id| *previous_id != book_id);
        if let Some(previous_id) = previous {
            tracing::warn!(
                "Title {:?} moved from book {} to book {}, old record is orphaned",
                record.title,
                previous_id,
                book_id
            );
        }

        self.books.insert(book_id, record);
        Ok(previous)
    }

    pub fn find_by_title(&self, title: &str) -> Option<BookId> {
        self.titles.get(title).copied()
    }

    pub fn is_available(&self, title: &str) -> TitleAvailability {
        let book_id = self.find_by_title(title);
        let available = book_id
            .and_then(|book_id| self.books.get(&book_id))
            .map(|record| record.is_available_under(title))
            .unwrap_or_default();

        TitleAvailability { book_id, available }
    }

    pub fn lookup(&self, title: &str) -> Option<TitleLookup> {
        let TitleAvailability { book_id, available } = self.is_available(title);
        book_id.map(|book_id| TitleLookup { book_id, available })
    }

    pub fn get_book(&self, book_id: BookId) -> Option<&BookRecord> {
        self.books.get(&book_id)
    }

    pub fn list_books(&self) -> Vec<BookTitleAndId> {
        self.books
            .values()
            .map(|record| BookTitleAndId {
                book_id: record.book_id,
                title: record.title.clone(),
            })
            .collect()
    }

    /// Only called by the lending ledger after it has confirmed the loan is legal
    pub fn decrement_availability(&mut self, book_id: BookId) {
        if let Some(record) = self.books.get_mut(&book_id) {
            record.check_out();
        }
    }

    /// Only called by the lending ledger after it has confirmed the return is legal
    pub fn increment_availability(&mut self, book_id: BookId) {
        if let Some(record) = self.books.get_mut(&book_id) {
            record.check_in();
        }
    }
}
