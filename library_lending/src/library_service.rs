use std::sync::Arc;

use crate::api::{BookId, BookRecord, BookTitleAndId, RegisterBookRequest, TitleLookup};
use crate::authorization::Authorizer;
use crate::error::LibraryError;
use crate::library_repository::LibraryRepository;

/// Entry point for every library operation, puts the librarian check in front of registration
pub struct LibraryService {
    repository: Arc<dyn LibraryRepository>,
    authorizer: Arc<dyn Authorizer>,
}

impl LibraryService {
    pub fn new(repository: Arc<dyn LibraryRepository>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            repository,
            authorizer,
        }
    }

    pub async fn register_book(
        &self,
        caller_id: &str,
        request: RegisterBookRequest,
    ) -> Result<BookId, LibraryError> {
        if !self.authorizer.is_librarian(caller_id) {
            tracing::warn!("{} tried to register {:?}", caller_id, request.title);
            return Err(LibraryError::Unauthorized(caller_id.to_string()));
        }

        let book_id = request.book_id;
        let title = request.title.clone();
        self.repository.register_book(request).await?;
        tracing::info!("{} registered {:?} as book {}", caller_id, title, book_id);
        Ok(book_id)
    }

    pub async fn borrow_book(&self, patron_id: &str, title: &str) -> Result<BookId, LibraryError> {
        let result = self.repository.borrow_book(patron_id, title).await;
        match &result {
            Ok(book_id) => tracing::info!("{} borrowed {:?} ({})", patron_id, title, book_id),
            Err(err) => tracing::info!("{} could not borrow {:?}: {}", patron_id, title, err),
        }
        result
    }

    pub async fn return_book(&self, patron_id: &str, title: &str) -> Result<BookId, LibraryError> {
        let result = self.repository.return_book(patron_id, title).await;
        match &result {
            Ok(book_id) => tracing::info!("{} returned {:?} ({})", patron_id, title, book_id),
            Err(err) => tracing::info!("{} could not return {:?}: {}", patron_id, title, err),
        }
        result
    }

    pub async fn get_book(&self, book_id: BookId) -> Result<BookRecord, LibraryError> {
        self.repository.get_book(book_id).await
    }

    pub async fn lookup_title(&self, title: &str) -> Result<Option<TitleLookup>, LibraryError> {
        self.repository.lookup_title(title).await
    }

    pub async fn list_books(&self) -> Result<Vec<BookTitleAndId>, LibraryError> {
        self.repository.list_books().await
    }

    pub async fn get_loans(&self, patron_id: &str) -> Result<Vec<BookId>, LibraryError> {
        self.repository.get_loans(patron_id).await
    }
}
