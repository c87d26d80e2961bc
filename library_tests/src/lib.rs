//! End-to-end tests against a running `library_lending` server.
//! The server address is taken from `LIBRARY_URL`, default `http://127.0.0.1:8080`,
//! and the server must accept `librarian` as a librarian identity.

#[cfg(all(test, feature = "system_tests"))]
mod system_tests;


#[cfg(all(test, any(feature = "system_tests", feature = "load_tests")))]
pub(crate) fn library_url() -> String {
    std::env::var("LIBRARY_URL").unwrap_or("http://127.0.0.1:8080".to_string())
}

/// Identifier unlikely to collide with earlier runs against the same server
#[cfg(all(test, any(feature = "system_tests", feature = "load_tests")))]
pub(crate) fn unique_book_id() -> i64 {
    use rand::Rng;
    rand::thread_rng().gen_range(1..i64::MAX)
}
