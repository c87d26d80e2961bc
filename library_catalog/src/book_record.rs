use crate::api::{AvailabilityState, BookId, BookRecord, RegisterBookRequest};
use crate::catalog::CatalogError;

/// Registration only accepts quantities strictly above this value
pub const MIN_REGISTERED_QUANTITY: i64 = 1;

impl BookRecord {
    /// Validates a registration request and builds a fresh, fully available record
    pub fn new(request: RegisterBookRequest) -> Result<Self, CatalogError> {
        let RegisterBookRequest {
            book_id,
            title,
            release_year,
            quantity,
        } = request;

        if quantity <= MIN_REGISTERED_QUANTITY {
            return Err(CatalogError::InvalidQuantity(quantity));
        }
        let copies_available =
            u32::try_from(quantity).map_err(|_| CatalogError::InvalidQuantity(quantity))?;
        if !is_valid_book_id(book_id) {
            return Err(CatalogError::InvalidIdentifier(book_id));
        }

        Ok(Self {
            book_id,
            title,
            release_year,
            copies_available,
            state: AvailabilityState::Available,
        })
    }

    /// True if a copy can be handed out to someone asking for `title`.
    /// The title check catches records orphaned by a re-registration of their title.
    pub fn is_available_under(&self, title: &str) -> bool {
        self.title == title
            && self.state == AvailabilityState::Available
            && self.copies_available >= 1
    }

    /// Hands out one copy. Callers check availability first.
    pub fn check_out(&mut self) {
        debug_assert!(self.copies_available > 0, "check_out on exhausted record");
        self.copies_available = self.copies_available.saturating_sub(1);
        if self.copies_available == 0 {
            self.state = AvailabilityState::Borrowed;
        }
    }

    /// Takes one copy back. There is no upper bound on the count.
    pub fn check_in(&mut self) {
        self.copies_available = self.copies_available.saturating_add(1);
        self.state = AvailabilityState::Available;
    }
}

pub fn is_valid_book_id(book_id: BookId) -> bool {
    book_id > 0
}
