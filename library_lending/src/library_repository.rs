pub use in_memory_library_repository::InMemoryLibraryRepository;
pub use postgres_library_repository::{
    PostgresLibraryRepository, PostgresLibraryRepositoryConfig,
};

use crate::api::{BookId, BookRecord, BookTitleAndId, RegisterBookRequest, TitleLookup};
use crate::error::LibraryError;

mod in_memory_library_repository;
mod postgres_library_repository;

/// Storage of the catalog and the loan ledger.
/// Every mutating call is atomic: it either applies completely or leaves the state untouched.
#[async_trait::async_trait]
pub trait LibraryRepository: Send + Sync {
    /// Registers or overwrites a title.
    /// Returns the identifier the title pointed at before, if it was a different one.
    async fn register_book(
        &self,
        request: RegisterBookRequest,
    ) -> Result<Option<BookId>, LibraryError>;

    async fn borrow_book(&self, patron_id: &str, title: &str) -> Result<BookId, LibraryError>;

    async fn return_book(&self, patron_id: &str, title: &str) -> Result<BookId, LibraryError>;

    async fn get_book(&self, book_id: BookId) -> Result<BookRecord, LibraryError>;

    /// Exact title lookup, `None` if the title was never registered
    async fn lookup_title(&self, title: &str) -> Result<Option<TitleLookup>, LibraryError>;

    async fn list_books(&self) -> Result<Vec<BookTitleAndId>, LibraryError>;

    /// Identifiers currently on loan to the patron, ascending
    async fn get_loans(&self, patron_id: &str) -> Result<Vec<BookId>, LibraryError>;
}
