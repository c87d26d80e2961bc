pub mod api;
pub mod book_record;
pub mod catalog;

pub use catalog::{Catalog, CatalogError, TitleAvailability};
