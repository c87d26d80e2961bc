use std::sync::Arc;

use actix_web::http::header::LOCATION;
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{Error, HttpRequest, HttpResponse};
use paperclip::actix::{
    api_v2_operation,
    web::{self},
};

use crate::api::{
    BookId, CallerIdRequest, ErrorResponse, GetAllBooksResponse, LibrariansResponse, LoanReceipt,
    PatronId, PatronLoansResponse, RegisterBookRequest, RejectionKind, TitleRequest,
    CALLER_ID_HEADER,
};
use crate::authorization::LibrarianRoster;
use crate::error::LibraryError;
use crate::library_service::LibraryService;

fn caller_id(request: &HttpRequest) -> Option<String> {
    request
        .headers()
        .get(CALLER_ID_HEADER)?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|caller_id| !caller_id.is_empty())
        .map(str::to_string)
}

fn status_of(kind: RejectionKind) -> StatusCode {
    match kind {
        RejectionKind::Unauthorized => StatusCode::FORBIDDEN,
        RejectionKind::MissingCaller
        | RejectionKind::InvalidQuantity
        | RejectionKind::InvalidIdentifier
        | RejectionKind::LastLibrarian => StatusCode::BAD_REQUEST,
        RejectionKind::BookUnavailable | RejectionKind::AlreadyBorrowed => StatusCode::CONFLICT,
        RejectionKind::NoActiveLoan => StatusCode::NOT_FOUND,
    }
}

fn rejection(kind: RejectionKind, message: String) -> HttpResponse {
    HttpResponse::build(status_of(kind)).json(ErrorResponse { kind, message })
}

fn missing_caller() -> HttpResponse {
    rejection(
        RejectionKind::MissingCaller,
        format!("Missing {} header", CALLER_ID_HEADER),
    )
}

fn error_response(operation: &str, err: LibraryError) -> HttpResponse {
    match err.rejection_kind() {
        Some(kind) => rejection(kind, err.to_string()),
        None => {
            tracing::error!("{} failed {}", operation, err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().finish())
}

#[api_v2_operation]
pub async fn get_all_books(service: Data<Arc<LibraryService>>) -> Result<HttpResponse, Error> {
    Ok(match service.list_books().await {
        Ok(books) => HttpResponse::Ok().json(GetAllBooksResponse { books }),
        Err(err) => error_response("Get all books", err),
    })
}

#[api_v2_operation]
pub async fn register_book(
    service: Data<Arc<LibraryService>>,
    request: HttpRequest,
    details: web::Json<RegisterBookRequest>,
) -> Result<HttpResponse, Error> {
    let caller_id = match caller_id(&request) {
        Some(caller_id) => caller_id,
        None => {
            return Ok(rejection(
                RejectionKind::Unauthorized,
                "Anonymous callers cannot register books".to_string(),
            ))
        }
    };

    Ok(
        match service.register_book(&caller_id, details.into_inner()).await {
            Ok(book_id) => HttpResponse::Ok()
                .append_header((LOCATION, format!("/api/book/{}", book_id)))
                .finish(),
            Err(err) => error_response("Register book", err),
        },
    )
}

#[api_v2_operation]
pub async fn get_book(
    service: Data<Arc<LibraryService>>,
    book_id: web::Path<BookId>,
) -> Result<HttpResponse, Error> {
    Ok(match service.get_book(book_id.into_inner()).await {
        Ok(record) => HttpResponse::Ok().json(record),
        Err(LibraryError::BookNotFound(_)) => HttpResponse::NotFound().finish(),
        Err(err) => error_response("Get book", err),
    })
}

#[api_v2_operation]
pub async fn lookup_title(
    service: Data<Arc<LibraryService>>,
    query: web::Query<TitleRequest>,
) -> Result<HttpResponse, Error> {
    Ok(match service.lookup_title(&query.title).await {
        Ok(Some(lookup)) => HttpResponse::Ok().json(lookup),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(err) => error_response("Lookup title", err),
    })
}

#[api_v2_operation]
pub async fn borrow_book(
    service: Data<Arc<LibraryService>>,
    request: HttpRequest,
    body: web::Json<TitleRequest>,
) -> Result<HttpResponse, Error> {
    let patron_id = match caller_id(&request) {
        Some(patron_id) => patron_id,
        None => return Ok(missing_caller()),
    };

    Ok(match service.borrow_book(&patron_id, &body.title).await {
        Ok(book_id) => HttpResponse::Ok().json(LoanReceipt { book_id }),
        Err(err) => error_response("Borrow book", err),
    })
}

#[api_v2_operation]
pub async fn return_book(
    service: Data<Arc<LibraryService>>,
    request: HttpRequest,
    body: web::Json<TitleRequest>,
) -> Result<HttpResponse, Error> {
    let patron_id = match caller_id(&request) {
        Some(patron_id) => patron_id,
        None => return Ok(missing_caller()),
    };

    Ok(match service.return_book(&patron_id, &body.title).await {
        Ok(book_id) => HttpResponse::Ok().json(LoanReceipt { book_id }),
        Err(err) => error_response("Return book", err),
    })
}

#[api_v2_operation]
pub async fn get_patron_loans(
    service: Data<Arc<LibraryService>>,
    patron_id: web::Path<PatronId>,
) -> Result<HttpResponse, Error> {
    let patron_id = patron_id.into_inner();
    Ok(match service.get_loans(&patron_id).await {
        Ok(loans) => HttpResponse::Ok().json(PatronLoansResponse { patron_id, loans }),
        Err(err) => error_response("Get loans", err),
    })
}

#[api_v2_operation]
pub async fn get_librarians(roster: Data<Arc<LibrarianRoster>>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(LibrariansResponse {
        librarians: roster.librarians(),
    }))
}

#[api_v2_operation]
pub async fn appoint_librarian(
    roster: Data<Arc<LibrarianRoster>>,
    request: HttpRequest,
    body: web::Json<CallerIdRequest>,
) -> Result<HttpResponse, Error> {
    let caller_id = match caller_id(&request) {
        Some(caller_id) => caller_id,
        None => return Ok(missing_caller()),
    };

    Ok(match roster.appoint(&caller_id, &body.caller_id) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => error_response("Appoint librarian", err),
    })
}

#[api_v2_operation]
pub async fn transfer_librarian(
    roster: Data<Arc<LibrarianRoster>>,
    request: HttpRequest,
    body: web::Json<CallerIdRequest>,
) -> Result<HttpResponse, Error> {
    let caller_id = match caller_id(&request) {
        Some(caller_id) => caller_id,
        None => return Ok(missing_caller()),
    };

    Ok(match roster.transfer(&caller_id, &body.caller_id) {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => error_response("Transfer librarian", err),
    })
}

#[api_v2_operation]
pub async fn dismiss_librarian(
    roster: Data<Arc<LibrarianRoster>>,
    request: HttpRequest,
    dismissed: web::Path<String>,
) -> Result<HttpResponse, Error> {
    let caller_id = match caller_id(&request) {
        Some(caller_id) => caller_id,
        None => return Ok(missing_caller()),
    };

    Ok(match roster.dismiss(&caller_id, &dismissed) {
        Ok(true) => HttpResponse::Ok().finish(),
        Ok(false) => HttpResponse::NotFound().finish(),
        Err(err) => error_response("Dismiss librarian", err),
    })
}
