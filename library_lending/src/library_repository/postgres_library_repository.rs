use anyhow::Context;
use serde_json::json;
use tokio_postgres::{Client, NoTls, Transaction};

use library_catalog::TitleAvailability;

use crate::api::{BookId, BookRecord, BookTitleAndId, RegisterBookRequest, TitleLookup};
use crate::error::LibraryError;
use crate::ledger::{decide_borrow, LendingError};
use crate::library_repository::LibraryRepository;

pub struct PostgresLibraryRepositoryConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

/// Mutations run in a transaction that locks the book row first,
/// which serializes borrow and return per identifier across server instances.
pub struct PostgresLibraryRepository {
    client: tokio::sync::Mutex<Client>,
}

impl PostgresLibraryRepository {
    pub async fn init(config: PostgresLibraryRepositoryConfig) -> anyhow::Result<Self> {
        let connection_str = format!(
            "postgresql://{}:{}@{}",
            config.username, config.password, config.hostname
        );
        tracing::info!("Connecting to postgres at {}", config.hostname);
        let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
            .await
            .context("Failed to start postgres")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Postgres connection error: {}", e);
            }
        });

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS books (
            id              BIGINT PRIMARY KEY,
            params          JSONB NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup books table")?;

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS titles (
            title           TEXT PRIMARY KEY,
            book_id         BIGINT NOT NULL
            )
        ",
            )
            .await
            .context("Failed to setup titles table")?;

        client
            .batch_execute(
                "
        CREATE TABLE IF NOT EXISTS loans (
            patron_id       TEXT NOT NULL,
            book_id         BIGINT NOT NULL,
            PRIMARY KEY (patron_id, book_id)
            )
        ",
            )
            .await
            .context("Failed to setup loans table")?;

        Ok(Self {
            client: tokio::sync::Mutex::new(client),
        })
    }
}

async fn find_title(
    transaction: &Transaction<'_>,
    title: &str,
) -> Result<Option<BookId>, LibraryError> {
    let row = transaction
        .query_opt("SELECT book_id FROM titles WHERE title = $1", &[&title])
        .await?;
    let book_id: Option<BookId> = row.map(|row| row.try_get(0)).transpose()?;
    Ok(book_id)
}

async fn lock_book(
    transaction: &Transaction<'_>,
    book_id: BookId,
) -> Result<Option<BookRecord>, LibraryError> {
    let row = transaction
        .query_opt(
            "SELECT params FROM books WHERE id = $1 FOR UPDATE",
            &[&book_id],
        )
        .await?;

    row.map(|row| -> Result<BookRecord, LibraryError> {
        let params: serde_json::Value = row.try_get(0)?;
        Ok(serde_json::from_value(params)?)
    })
    .transpose()
}

async fn store_book(
    transaction: &Transaction<'_>,
    record: &BookRecord,
) -> Result<(), LibraryError> {
    transaction
        .execute(
            "INSERT INTO books (id, params) VALUES ($1, $2)
             ON CONFLICT (id) DO UPDATE SET params = EXCLUDED.params",
            &[&record.book_id, &json!(record)],
        )
        .await?;
    Ok(())
}

#[async_trait::async_trait]
impl LibraryRepository for PostgresLibraryRepository {
    async fn register_book(
        &self,
        request: RegisterBookRequest,
    ) -> Result<Option<BookId>, LibraryError> {
        let record = BookRecord::new(request)?;

        let mut client = self.client.lock().await;
        let transaction = client.transaction().await?;

        lock_book(&transaction, record.book_id).await?;
        let previous = find_title(&transaction, &record.title)
            .await?
            .filter(|previous_id| *previous_id != record.book_id);

        store_book(&transaction, &record).await?;
        transaction
            .execute(
                "INSERT INTO titles (title, book_id) VALUES ($1, $2)
                 ON CONFLICT (title) DO UPDATE SET book_id = EXCLUDED.book_id",
                &[&record.title, &record.book_id],
            )
            .await?;
        transaction.commit().await?;

        if let Some(previous_id) = previous {
            tracing::warn!(
                "Title {:?} moved from book {} to book {}, old record is orphaned",
                record.title,
                previous_id,
                record.book_id
            );
        }
        Ok(previous)
    }

    async fn borrow_book(&self, patron_id: &str, title: &str) -> Result<BookId, LibraryError> {
        let mut client = self.client.lock().await;
        let transaction = client.transaction().await?;

        let book_id = find_title(&transaction, title).await?;
        let record = match book_id {
            Some(book_id) => lock_book(&transaction, book_id).await?,
            None => None,
        };
        let already_borrowed = match book_id {
            Some(book_id) => transaction
                .query_opt(
                    "SELECT 1 FROM loans WHERE patron_id = $1 AND book_id = $2",
                    &[&patron_id, &book_id],
                )
                .await?
                .is_some(),
            None => false,
        };
        let availability = TitleAvailability {
            book_id,
            available: record
                .as_ref()
                .map(|record| record.is_available_under(title))
                .unwrap_or_default(),
        };

        let book_id = decide_borrow(title, availability, already_borrowed)?;
        let mut record = record.ok_or(LibraryError::BookNotFound(book_id))?;
        record.check_out();

        store_book(&transaction, &record).await?;
        transaction
            .execute(
                "INSERT INTO loans (patron_id, book_id) VALUES ($1, $2)",
                &[&patron_id, &book_id],
            )
            .await?;
        transaction.commit().await?;
        Ok(book_id)
    }

    async fn return_book(&self, patron_id: &str, title: &str) -> Result<BookId, LibraryError> {
        let mut client = self.client.lock().await;
        let transaction = client.transaction().await?;

        let book_id = find_title(&transaction, title)
            .await?
            .ok_or_else(|| LendingError::NoActiveLoan(title.to_string()))?;
        let record = lock_book(&transaction, book_id).await?;

        let removed = transaction
            .execute(
                "DELETE FROM loans WHERE patron_id = $1 AND book_id = $2",
                &[&patron_id, &book_id],
            )
            .await?;
        if removed == 0 {
            return Err(LendingError::NoActiveLoan(title.to_string()).into());
        }

        let mut record = record.ok_or(LibraryError::BookNotFound(book_id))?;
        record.check_in();
        store_book(&transaction, &record).await?;
        transaction.commit().await?;
        Ok(book_id)
    }

    async fn get_book(&self, book_id: BookId) -> Result<BookRecord, LibraryError> {
        let client = self.client.lock().await;
        let rows = client
            .query("SELECT params FROM books WHERE id = $1", &[&book_id])
            .await?;

        let params: serde_json::Value = rows
            .first()
            .ok_or(LibraryError::BookNotFound(book_id))?
            .try_get(0)?;

        Ok(serde_json::from_value(params)?)
    }

    async fn lookup_title(&self, title: &str) -> Result<Option<TitleLookup>, LibraryError> {
        let client = self.client.lock().await;
        let row = client
            .query_opt(
                "SELECT titles.book_id, books.params FROM titles
                 LEFT JOIN books ON books.id = titles.book_id
                 WHERE titles.title = $1",
                &[&title],
            )
            .await?;

        row.map(|row| -> Result<TitleLookup, LibraryError> {
            let book_id: BookId = row.try_get(0)?;
            let params: Option<serde_json::Value> = row.try_get(1)?;
            let available = match params {
                Some(params) => {
                    serde_json::from_value::<BookRecord>(params)?.is_available_under(title)
                }
                None => false,
            };
            Ok(TitleLookup { book_id, available })
        })
        .transpose()
    }

    async fn list_books(&self) -> Result<Vec<BookTitleAndId>, LibraryError> {
        let client = self.client.lock().await;
        let rows = client
            .query("SELECT id, params->>'title' FROM books", &[])
            .await?;

        rows.iter()
            .map(|row| {
                Ok(BookTitleAndId {
                    book_id: row.try_get(0)?,
                    title: row.try_get(1)?,
                })
            })
            .collect()
    }

    async fn get_loans(&self, patron_id: &str) -> Result<Vec<BookId>, LibraryError> {
        let client = self.client.lock().await;
        let rows = client
            .query(
                "SELECT book_id FROM loans WHERE patron_id = $1 ORDER BY book_id",
                &[&patron_id],
            )
            .await?;
        rows.iter().map(|row| Ok(row.try_get(0)?)).collect()
    }
}

#[cfg(all(test, feature = "postgres_tests"))]
mod tests_postgres_library_repository {
    use serial_test::file_serial;
    use testcontainers::core::IntoContainerPort;
    use testcontainers::runners::AsyncRunner;
    use testcontainers::{ContainerAsync, GenericImage, ImageExt};

    use crate::api::AvailabilityState;

    use super::*;

    async fn start_postgres_container_and_init_repo(
    ) -> (ContainerAsync<GenericImage>, PostgresLibraryRepository) {
        let _pg_container = GenericImage::new("postgres", "latest")
            .with_mapped_port(5432, 5432.tcp())
            .with_env_var("POSTGRES_USER", "postgres")
            .with_env_var("POSTGRES_PASSWORD", "postgres")
            .start()
            .await
            .expect("Failed to start postgres");

        for _ in 0..10 {
            if let Ok(repo) = PostgresLibraryRepository::init(PostgresLibraryRepositoryConfig {
                hostname: "127.0.0.1".to_string(),
                username: "postgres".to_string(),
                password: "postgres".to_string(),
            })
            .await
            {
                return (_pg_container, repo);
            }
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        }
        panic!("Failed to setup postgres container")
    }

    fn dune(book_id: BookId, quantity: i64) -> RegisterBookRequest {
        RegisterBookRequest {
            book_id,
            title: "Dune".to_string(),
            release_year: 1965,
            quantity,
        }
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Catalog management
    /// Combined into big unit test to avoid duplicate setup
    /// 1. Unknown book is not found
    /// 2. Invalid registrations are rejected and nothing is stored
    /// 3. Registered book can be fetched, listed and looked up
    /// 4. Re-registration under a new id reports the previous one
    async fn test_catalog_management() {
        let (_container, repository) = start_postgres_container_and_init_repo().await;

        assert!(matches!(
            repository.get_book(100).await,
            Err(LibraryError::BookNotFound(..))
        ));
        assert!(matches!(
            repository.register_book(dune(100, 1)).await,
            Err(LibraryError::Catalog(..))
        ));
        assert!(matches!(
            repository.register_book(dune(0, 3)).await,
            Err(LibraryError::Catalog(..))
        ));
        assert_eq!(repository.list_books().await.unwrap(), vec![]);
        assert_eq!(repository.lookup_title("Dune").await.unwrap(), None);

        assert_eq!(repository.register_book(dune(100, 3)).await.unwrap(), None);
        let record = repository.get_book(100).await.unwrap();
        assert_eq!(record.copies_available, 3);
        assert_eq!(record.state, AvailabilityState::Available);
        assert_eq!(
            repository.list_books().await.unwrap(),
            vec![BookTitleAndId {
                book_id: 100,
                title: "Dune".to_string()
            }]
        );
        assert_eq!(
            repository.lookup_title("Dune").await.unwrap(),
            Some(TitleLookup {
                book_id: 100,
                available: true
            })
        );

        assert_eq!(
            repository.register_book(dune(200, 2)).await.unwrap(),
            Some(100)
        );
        assert_eq!(
            repository.lookup_title("Dune").await.unwrap().unwrap().book_id,
            200
        );
        assert_eq!(repository.get_book(100).await.unwrap().copies_available, 3);
    }

    #[tokio::test]
    #[file_serial(key, path => "../.pgtestslock")]
    /// Lending management
    /// Combined into big unit test to avoid duplicate setup
    /// 1. Borrow takes a copy, duplicate borrow is rejected
    /// 2. Second patron drains the title, third is rejected
    /// 3. Returns put copies back, double return is rejected
    async fn test_lending_management() {
        let (_container, repository) = start_postgres_container_and_init_repo().await;
        repository.register_book(dune(100, 2)).await.unwrap();

        assert_eq!(repository.borrow_book("patron_a", "Dune").await.unwrap(), 100);
        assert!(matches!(
            repository.borrow_book("patron_a", "Dune").await,
            Err(LibraryError::Lending(LendingError::AlreadyBorrowed(..)))
        ));
        assert_eq!(repository.get_book(100).await.unwrap().copies_available, 1);

        assert_eq!(repository.borrow_book("patron_b", "Dune").await.unwrap(), 100);
        let record = repository.get_book(100).await.unwrap();
        assert_eq!(record.copies_available, 0);
        assert_eq!(record.state, AvailabilityState::Borrowed);
        assert!(matches!(
            repository.borrow_book("patron_c", "Dune").await,
            Err(LibraryError::Lending(LendingError::BookUnavailable(..)))
        ));
        assert_eq!(
            repository.lookup_title("Dune").await.unwrap(),
            Some(TitleLookup {
                book_id: 100,
                available: false
            })
        );

        assert!(matches!(
            repository.return_book("patron_c", "Dune").await,
            Err(LibraryError::Lending(LendingError::NoActiveLoan(..)))
        ));
        assert_eq!(repository.return_book("patron_a", "Dune").await.unwrap(), 100);
        assert_eq!(repository.get_loans("patron_a").await.unwrap(), vec![]);
        assert_eq!(repository.get_loans("patron_b").await.unwrap(), vec![100]);
        assert!(matches!(
            repository.return_book("patron_a", "Dune").await,
            Err(LibraryError::Lending(LendingError::NoActiveLoan(..)))
        ));
        assert_eq!(repository.get_book(100).await.unwrap().copies_available, 1);
    }
}
