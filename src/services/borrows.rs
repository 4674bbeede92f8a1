//! Borrow/return workflow

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppResult,
    models::borrow::{BorrowRecord, BorrowRequest},
    repository::Repository,
};

use super::clock::Clock;

#[derive(Clone)]
pub struct BorrowsService {
    repository: Repository,
    clock: Arc<dyn Clock>,
}

impl BorrowsService {
    pub fn new(repository: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Lend a book to a subscriber
    pub async fn borrow(&self, request: BorrowRequest) -> AppResult<BorrowRecord> {
        request.validate()?;

        let record = self
            .repository
            .borrows
            .borrow(request.subscriber_id, request.book_id, self.clock.now())
            .await
            .map_err(|e| {
                tracing::info!(
                    subscriber_id = request.subscriber_id,
                    book_id = request.book_id,
                    "Borrow refused: {}",
                    e
                );
                e
            })?;

        tracing::info!(
            subscriber_id = record.subscriber_id,
            book_id = record.book_id,
            record_id = record.id,
            "Book borrowed"
        );
        Ok(record)
    }

    /// Take a book back from the subscriber holding it
    pub async fn return_book(&self, request: BorrowRequest) -> AppResult<BorrowRecord> {
        request.validate()?;

        let record = self
            .repository
            .borrows
            .return_book(request.subscriber_id, request.book_id, self.clock.now())
            .await
            .map_err(|e| {
                tracing::info!(
                    subscriber_id = request.subscriber_id,
                    book_id = request.book_id,
                    "Return refused: {}",
                    e
                );
                e
            })?;

        tracing::info!(
            subscriber_id = record.subscriber_id,
            book_id = record.book_id,
            record_id = record.id,
            "Book returned"
        );
        Ok(record)
    }

    /// Ledger of one book, open and closed records
    pub async fn history(&self, book_id: i32) -> AppResult<Vec<BorrowRecord>> {
        self.repository.books.get(book_id).await?;
        self.repository.borrows.list_for_book(book_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{author::CreateAuthor, book::CreateBook, subscriber::SubscriberInput},
        services::clock::ManualClock,
    };
    use chrono::{Duration, TimeZone, Utc};

    async fn setup() -> (Arc<ManualClock>, BorrowsService, i32, i32) {
        let repository = Repository::memory();
        let author_id = repository
            .authors
            .create(&CreateAuthor { firstname: "Frank".into(), lastname: "Herbert".into() })
            .await
            .unwrap();
        let book_id = repository
            .books
            .create(&CreateBook { title: "Dune".into(), author_id, details: String::new() })
            .await
            .unwrap();
        let subscriber_id = repository
            .subscribers
            .create(&SubscriberInput {
                firstname: "Paul".into(),
                lastname: "Atreides".into(),
                email: "paul@arrakis.org".into(),
            })
            .await
            .unwrap();

        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()));
        let service = BorrowsService::new(repository, clock.clone());
        (clock, service, subscriber_id, book_id)
    }

    #[tokio::test]
    async fn test_ledger_timestamps_follow_clock() {
        let (clock, service, subscriber_id, book_id) = setup().await;
        let request = BorrowRequest { subscriber_id, book_id };

        let opened = service.borrow(request).await.unwrap();
        assert_eq!(clock.now(), opened.date_of_borrow);

        clock.advance(Duration::days(14));
        let closed = service.return_book(request).await.unwrap();
        assert_eq!(Some(clock.now()), closed.return_date);
        assert_eq!(opened.date_of_borrow, closed.date_of_borrow);
    }

    #[tokio::test]
    async fn test_second_cycle_adds_a_record() {
        let (_, service, subscriber_id, book_id) = setup().await;
        let request = BorrowRequest { subscriber_id, book_id };

        for _ in 0..2 {
            service.borrow(request).await.unwrap();
            service.return_book(request).await.unwrap();
        }
        let history = service.history(book_id).await.unwrap();
        assert_eq!(2, history.len());
        assert!(history.iter().all(|r| !r.is_open()));
    }

    #[tokio::test]
    async fn test_zero_ids_are_rejected() {
        let (_, service, _, book_id) = setup().await;
        let err = service
            .borrow(BorrowRequest { subscriber_id: 0, book_id })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Missing required fields"));
    }

    #[tokio::test]
    async fn test_return_of_available_book_is_rejected() {
        let (_, service, subscriber_id, book_id) = setup().await;
        let err = service
            .return_book(BorrowRequest { subscriber_id, book_id })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "Book is not borrowed"));
    }

    #[tokio::test]
    async fn test_history_of_missing_book() {
        let (_, service, _, _) = setup().await;
        assert!(matches!(service.history(9999).await.unwrap_err(), AppError::NotFound(_)));
    }
}
