use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

pub use library_catalog::api::{
    AvailabilityState, BookId, BookRecord, BookTitleAndId, RegisterBookRequest, TitleLookup,
};

/// Identity of whoever calls the service, as vouched for by the transport
pub type CallerId = String;
/// Any caller that borrows or returns books
pub type PatronId = String;

/// Header carrying the caller identity on every request
pub const CALLER_ID_HEADER: &str = "x-caller-id";

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct CallerIdRequest {
    pub caller_id: CallerId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct LoanReceipt {
    pub book_id: BookId,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct GetAllBooksResponse {
    pub books: Vec<BookTitleAndId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct PatronLoansResponse {
    pub patron_id: PatronId,
    /// Identifiers currently on loan, in ascending order
    pub loans: Vec<BookId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct LibrariansResponse {
    /// Sorted identities holding the librarian role
    pub librarians: Vec<CallerId>,
}

/// Why a call was turned down. Every rejection leaves the library state untouched.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Apiv2Schema)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    Unauthorized,
    MissingCaller,
    InvalidQuantity,
    InvalidIdentifier,
    BookUnavailable,
    AlreadyBorrowed,
    NoActiveLoan,
    LastLibrarian,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct ErrorResponse {
    pub kind: RejectionKind,
    pub message: String,
}
