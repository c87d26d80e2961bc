use library_lending::api::{AvailabilityState, RegisterBookRequest, RejectionKind, TitleLookup};
use library_lending::client::LibraryClient;

use crate::{library_url, unique_book_id};

const LIBRARIAN: &str = "librarian";

#[tokio::test]
/// Simple test for the catalog
/// Patron tries to register a book and gets rejected
/// Librarian registers a book
/// Gets the book, looks up its title, lists all books
async fn library_catalog_e2e_test() {
    let client = LibraryClient::new(&library_url()).expect("Failed to create client");
    let book_id = unique_book_id();
    let title = format!("Dune {}", book_id);
    let request = RegisterBookRequest {
        book_id,
        title: title.clone(),
        release_year: 1965,
        quantity: 3,
    };

    let rejected = client
        .register_book("patron", request.clone())
        .await
        .expect("Failed to register book");
    assert_eq!(rejected, Err(RejectionKind::Unauthorized));

    let rejected = client
        .register_book(
            LIBRARIAN,
            RegisterBookRequest {
                quantity: -1,
                ..request.clone()
            },
        )
        .await
        .expect("Failed to register book");
    assert_eq!(rejected, Err(RejectionKind::InvalidQuantity));

    let rejected = client
        .register_book(
            LIBRARIAN,
            RegisterBookRequest {
                quantity: 1,
                ..request.clone()
            },
        )
        .await
        .expect("Failed to register book");
    assert_eq!(rejected, Err(RejectionKind::InvalidQuantity));

    let registered = client
        .register_book(LIBRARIAN, request)
        .await
        .expect("Failed to register book");
    assert_eq!(registered, Ok(book_id));

    let record = client
        .get_book(book_id)
        .await
        .expect("Failed to get book")
        .expect("Book not found");
    assert_eq!(record.title, title);
    assert_eq!(record.copies_available, 3);
    assert_eq!(record.state, AvailabilityState::Available);

    let lookup = client
        .lookup_title(&title)
        .await
        .expect("Failed to lookup title");
    assert_eq!(
        lookup,
        Some(TitleLookup {
            book_id,
            available: true
        })
    );

    let books = client.list_books().await.expect("Failed to list books");
    assert!(books
        .iter()
        .any(|book| book.book_id == book_id && book.title == title));
}

#[tokio::test]
/// Simple test for lending
/// Registers a book
/// Borrows it, borrows again to get rejected
/// Checks loans and remaining copies
/// Returns it, returns again to get rejected
async fn library_lending_e2e_test() {
    let client = LibraryClient::new(&library_url()).expect("Failed to create client");
    let book_id = unique_book_id();
    let title = format!("Solaris {}", book_id);
    let patron = format!("patron_{}", book_id);

    client
        .register_book(
            LIBRARIAN,
            RegisterBookRequest {
                book_id,
                title: title.clone(),
                release_year: 1961,
                quantity: 2,
            },
        )
        .await
        .expect("Failed to register book")
        .expect("Registration rejected");

    // BORROW
    let borrowed = client
        .borrow_book(&patron, &title)
        .await
        .expect("Failed to borrow book");
    assert_eq!(borrowed, Ok(book_id));

    // BORROW AGAIN - rejected as the patron already holds a copy
    let borrowed = client
        .borrow_book(&patron, &title)
        .await
        .expect("Failed to borrow book");
    assert_eq!(borrowed, Err(RejectionKind::AlreadyBorrowed));

    let loans = client
        .list_loans(&patron)
        .await
        .expect("Failed to list loans");
    assert_eq!(loans, vec![book_id]);
    let record = client.get_book(book_id).await.unwrap().unwrap();
    assert_eq!(record.copies_available, 1);

    // RETURN
    let returned = client
        .return_book(&patron, &title)
        .await
        .expect("Failed to return book");
    assert_eq!(returned, Ok(book_id));

    // RETURN AGAIN - nothing left to return
    let returned = client
        .return_book(&patron, &title)
        .await
        .expect("Failed to return book");
    assert_eq!(returned, Err(RejectionKind::NoActiveLoan));

    let loans = client
        .list_loans(&patron)
        .await
        .expect("Failed to list loans");
    assert!(loans.is_empty());
    let record = client.get_book(book_id).await.unwrap().unwrap();
    assert_eq!(record.copies_available, 2);
}

#[tokio::test]
/// Librarian roster end to end
/// Patron cannot appoint, librarian appoints an assistant
/// Assistant registers a book, then gets dismissed and is rejected afterwards
async fn library_librarians_e2e_test() {
    let client = LibraryClient::new(&library_url()).expect("Failed to create client");
    let book_id = unique_book_id();
    let assistant = format!("assistant_{}", book_id);
    let request = RegisterBookRequest {
        book_id,
        title: format!("Roadside Picnic {}", book_id),
        release_year: 1972,
        quantity: 2,
    };

    let appointed = client
        .appoint_librarian("patron", &assistant)
        .await
        .expect("Failed to appoint librarian");
    assert_eq!(appointed, Err(RejectionKind::Unauthorized));

    let appointed = client
        .appoint_librarian(LIBRARIAN, &assistant)
        .await
        .expect("Failed to appoint librarian");
    assert_eq!(appointed, Ok(()));
    let librarians = client
        .list_librarians()
        .await
        .expect("Failed to list librarians");
    assert!(librarians.contains(&assistant));

    let registered = client
        .register_book(&assistant, request.clone())
        .await
        .expect("Failed to register book");
    assert_eq!(registered, Ok(book_id));

    let dismissed = client
        .dismiss_librarian(LIBRARIAN, &assistant)
        .await
        .expect("Failed to dismiss librarian");
    assert_eq!(dismissed, Ok(true));
    let dismissed = client
        .dismiss_librarian(LIBRARIAN, &assistant)
        .await
        .expect("Failed to dismiss librarian");
    assert_eq!(dismissed, Ok(false));

    let registered = client
        .register_book(&assistant, request)
        .await
        .expect("Failed to register book");
    assert_eq!(registered, Err(RejectionKind::Unauthorized));
}

#[tokio::test]
/// Patron identities with url reserved characters can still list their loans
async fn library_loans_of_unusual_patron_e2e_test() {
    let client = LibraryClient::new(&library_url()).expect("Failed to create client");
    let book_id = unique_book_id();
    let title = format!("Hard to Be a God {}", book_id);
    let patron = format!("desk/{}?#", book_id);

    client
        .register_book(
            LIBRARIAN,
            RegisterBookRequest {
                book_id,
                title: title.clone(),
                release_year: 1964,
                quantity: 2,
            },
        )
        .await
        .expect("Failed to register book")
        .expect("Registration rejected");

    let borrowed = client
        .borrow_book(&patron, &title)
        .await
        .expect("Failed to borrow book");
    assert_eq!(borrowed, Ok(book_id));

    let loans = client
        .list_loans(&patron)
        .await
        .expect("Failed to list loans");
    assert_eq!(loans, vec![book_id]);
}
