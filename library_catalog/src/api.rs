use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

/// ISBN-like identifier of a title, always positive
pub type BookId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityState {
    Available,
    Borrowed,
}

/// Catalog entry of a single title.
/// `state` is `Borrowed` exactly when `copies_available` is zero.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookRecord {
    pub book_id: BookId,
    pub title: String,
    pub release_year: i32,
    pub copies_available: u32,
    pub state: AvailabilityState,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct RegisterBookRequest {
    pub book_id: BookId,
    pub title: String,
    pub release_year: i32,
    /// Signed so that nonsense counts reach validation instead of failing to parse
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookTitleAndId {
    pub book_id: BookId,
    pub title: String,
}

/// Result of an exact-title lookup
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct TitleLookup {
    pub book_id: BookId,
    /// Whether a copy can be borrowed under this title right now
    pub available: bool,
}
