use library_catalog::Catalog;

use crate::api::{BookId, BookRecord, BookTitleAndId, RegisterBookRequest, TitleLookup};
use crate::error::LibraryError;
use crate::ledger::LendingLedger;
use crate::library_repository::LibraryRepository;

#[derive(Default)]
struct LibraryState {
    catalog: Catalog,
    ledger: LendingLedger,
}

/// Catalog and ledger behind one lock, so each check-then-mutate sequence runs alone
#[derive(Default)]
pub struct InMemoryLibraryRepository {
    state: parking_lot::RwLock<LibraryState>,
}

#[async_trait::async_trait]
impl LibraryRepository for InMemoryLibraryRepository {
    async fn register_book(
        &self,
        request: RegisterBookRequest,
    ) -> Result<Option<BookId>, LibraryError> {
        Ok(self.state.write().catalog.register(request)?)
    }

    async fn borrow_book(&self, patron_id: &str, title: &str) -> Result<BookId, LibraryError> {
        let mut state_lock = self.state.write();
        let LibraryState { catalog, ledger } = &mut *state_lock;
        Ok(ledger.borrow(catalog, patron_id, title)?)
    }

    async fn return_book(&self, patron_id: &str, title: &str) -> Result<BookId, LibraryError> {
        let mut state_lock = self.state.write();
        let LibraryState { catalog, ledger } = &mut *state_lock;
        Ok(ledger.return_book(catalog, patron_id, title)?)
    }

    async fn get_book(&self, book_id: BookId) -> Result<BookRecord, LibraryError> {
        self.state
            .read()
            .catalog
            .get_book(book_id)
            .cloned()
            .ok_or(LibraryError::BookNotFound(book_id))
    }

    async fn lookup_title(&self, title: &str) -> Result<Option<TitleLookup>, LibraryError> {
        Ok(self.state.read().catalog.lookup(title))
    }

    async fn list_books(&self) -> Result<Vec<BookTitleAndId>, LibraryError> {
        Ok(self.state.read().catalog.list_books())
    }

    async fn get_loans(&self, patron_id: &str) -> Result<Vec<BookId>, LibraryError> {
        Ok(self.state.read().ledger.loans_of(patron_id))
    }
}
