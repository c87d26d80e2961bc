use anyhow::{anyhow, bail, Context};
use reqwest::header::LOCATION;
use reqwest::{Response, StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;

use crate::api::{
    BookId, BookRecord, BookTitleAndId, CallerId, CallerIdRequest, ErrorResponse,
    GetAllBooksResponse, LibrariansResponse, LoanReceipt, PatronLoansResponse,
    RegisterBookRequest, RejectionKind, TitleLookup, TitleRequest, CALLER_ID_HEADER,
};

/// Outcome of a call the library may turn down
pub type Verdict<T> = Result<T, RejectionKind>;

pub struct LibraryClient {
    url: String,
    client: ClientWithMiddleware,
}

/// Splits a response into success, a library rejection, or a transport failure
async fn verdict<T: DeserializeOwned>(
    response: Response,
    operation: &str,
) -> anyhow::Result<Verdict<T>> {
    if response.status().is_success() {
        return Ok(Ok(response.json().await?));
    }
    rejection(response, operation).await.map(Err)
}

async fn rejection(response: Response, operation: &str) -> anyhow::Result<RejectionKind> {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(error) if status.is_client_error() => Ok(error.kind),
        _ => bail!("{} failed with status {}", operation, status),
    }
}

impl LibraryClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Builds an endpoint url from path segments, percent-encoding each of them
    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.url).context("Invalid library url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Library url {} cannot take a path", self.url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Calls POST /api/books endpoint
    /// Returns id of registered book taken from location header
    pub async fn register_book(
        &self,
        caller_id: &str,
        request: RegisterBookRequest,
    ) -> anyhow::Result<Verdict<BookId>> {
        let response = self
            .client
            .post(format!("{}/api/books", self.url))
            .header(CALLER_ID_HEADER, caller_id)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return rejection(response, "Register book").await.map(Err);
        }

        let location_header = response
            .headers()
            .get(LOCATION)
            .context("No location header")?;

        location_header
            .to_str()
            .context("Failed to convert header to str")?
            .strip_prefix("/api/book/")
            .context("Invalid location header")?
            .parse()
            .map(Ok)
            .context("Failed to parse book id")
    }

    /// Calls GET /api/book/{book_id} endpoint
    /// Returns None if book is not in the catalog
    pub async fn get_book(&self, book_id: BookId) -> anyhow::Result<Option<BookRecord>> {
        let response = self
            .client
            .get(format!("{}/api/book/{}", self.url, book_id))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            bail!("Failed to get book, status {}", response.status())
        }
    }

    /// Calls GET /api/books/lookup endpoint
    /// Returns None if title was never registered
    pub async fn lookup_title(&self, title: &str) -> anyhow::Result<Option<TitleLookup>> {
        let response = self
            .client
            .get(format!("{}/api/books/lookup", self.url))
            .query(&TitleRequest {
                title: title.to_string(),
            })
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(None)
        } else if response.status().is_success() {
            Ok(Some(response.json().await?))
        } else {
            bail!("Failed to lookup title, status {}", response.status())
        }
    }

    /// Calls GET /api/books endpoint
    pub async fn list_books(&self) -> anyhow::Result<Vec<BookTitleAndId>> {
        let response = self
            .client
            .get(format!("{}/api/books", self.url))
            .send()
            .await?;
        if response.status().is_success() {
            let books: GetAllBooksResponse = response.json().await?;
            Ok(books.books)
        } else {
            bail!("Failed to list books, status {}", response.status())
        }
    }

    /// Calls POST /api/loans endpoint as `patron_id`
    pub async fn borrow_book(
        &self,
        patron_id: &str,
        title: &str,
    ) -> anyhow::Result<Verdict<BookId>> {
        let response = self
            .client
            .post(format!("{}/api/loans", self.url))
            .header(CALLER_ID_HEADER, patron_id)
            .json(&TitleRequest {
                title: title.to_string(),
            })
            .send()
            .await?;
        let receipt: Verdict<LoanReceipt> = verdict(response, "Borrow book").await?;
        Ok(receipt.map(|receipt| receipt.book_id))
    }

    /// Calls POST /api/returns endpoint as `patron_id`
    pub async fn return_book(
        &self,
        patron_id: &str,
        title: &str,
    ) -> anyhow::Result<Verdict<BookId>> {
        let response = self
            .client
            .post(format!("{}/api/returns", self.url))
            .header(CALLER_ID_HEADER, patron_id)
            .json(&TitleRequest {
                title: title.to_string(),
            })
            .send()
            .await?;
        let receipt: Verdict<LoanReceipt> = verdict(response, "Return book").await?;
        Ok(receipt.map(|receipt| receipt.book_id))
    }

    /// Calls GET /api/patron/{patron_id}/loans endpoint
    pub async fn list_loans(&self, patron_id: &str) -> anyhow::Result<Vec<BookId>> {
        let response = self
            .client
            .get(self.endpoint(&["api", "patron", patron_id, "loans"])?)
            .send()
            .await?;
        if response.status().is_success() {
            let loans: PatronLoansResponse = response.json().await?;
            Ok(loans.loans)
        } else {
            bail!("Failed to list loans, status {}", response.status())
        }
    }

    /// Calls POST /api/librarians/transfer endpoint, handing the role of `caller_id` to `successor`
    pub async fn transfer_librarian(
        &self,
        caller_id: &str,
        successor: &str,
    ) -> anyhow::Result<Verdict<()>> {
        let response = self
            .client
            .post(format!("{}/api/librarians/transfer", self.url))
            .header(CALLER_ID_HEADER, caller_id)
            .json(&CallerIdRequest {
                caller_id: successor.to_string(),
            })
            .send()
            .await?;
        if response.status().is_success() {
            Ok(Ok(()))
        } else {
            rejection(response, "Transfer librarian").await.map(Err)
        }
    }

    /// Calls GET /api/librarians endpoint
    pub async fn list_librarians(&self) -> anyhow::Result<Vec<CallerId>> {
        let response = self
            .client
            .get(format!("{}/api/librarians", self.url))
            .send()
            .await?;
        if response.status().is_success() {
            let roster: LibrariansResponse = response.json().await?;
            Ok(roster.librarians)
        } else {
            bail!("Failed to list librarians, status {}", response.status())
        }
    }

    /// Calls POST /api/librarians endpoint, granting the role to `appointed` on behalf of `caller_id`
    pub async fn appoint_librarian(
        &self,
        caller_id: &str,
        appointed: &str,
    ) -> anyhow::Result<Verdict<()>> {
        let response = self
            .client
            .post(format!("{}/api/librarians", self.url))
            .header(CALLER_ID_HEADER, caller_id)
            .json(&CallerIdRequest {
                caller_id: appointed.to_string(),
            })
            .send()
            .await?;
        if response.status().is_success() {
            Ok(Ok(()))
        } else {
            rejection(response, "Appoint librarian").await.map(Err)
        }
    }

    /// Calls DELETE /api/librarian/{caller_id} endpoint
    /// Returns false if `dismissed` did not hold the role
    pub async fn dismiss_librarian(
        &self,
        caller_id: &str,
        dismissed: &str,
    ) -> anyhow::Result<Verdict<bool>> {
        let response = self
            .client
            .delete(self.endpoint(&["api", "librarian", dismissed])?)
            .header(CALLER_ID_HEADER, caller_id)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            Ok(Ok(false))
        } else if response.status().is_success() {
            Ok(Ok(true))
        } else {
            rejection(response, "Dismiss librarian").await.map(Err)
        }
    }
}
