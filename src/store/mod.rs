//! Persistence seam for the controllers.
//!
//! - `postgres`: sqlx-backed store used by the server binary
//! - `memory`: in-process store used by tests and local experiments

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::models::{
    Deliveryman, NewOrder, NewRecipient, Order, OrderChanges, OrderDetail, OrderListItem,
    Recipient, RecipientChanges,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            if db_err.is_unique_violation() {
                return Self::UniqueViolation(constraint);
            }
            if db_err.is_foreign_key_violation() {
                return Self::ForeignKeyViolation(constraint);
            }
        }
        Self::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Data access used by the order and recipient controllers.
///
/// Lookups return `Ok(None)` for a missing row; mutations keyed by id do the
/// same when nothing matched.
#[async_trait]
pub trait Store: Send + Sync {
    /// All orders, newest first, with embedded summaries.
    async fn list_orders(&self) -> StoreResult<Vec<OrderListItem>>;

    async fn find_order_detail(&self, id: i32) -> StoreResult<Option<OrderDetail>>;

    async fn create_order(&self, order: &NewOrder) -> StoreResult<Order>;

    async fn update_order(&self, id: i32, changes: &OrderChanges) -> StoreResult<Option<Order>>;

    /// Stamp `canceled_at`. Does not look at `start_date`; the caller enforces that rule.
    async fn cancel_order(&self, id: i32, canceled_at: NaiveDateTime) -> StoreResult<Option<Order>>;

    /// Recipients whose name contains `filter` (case-insensitive), ordered by id.
    async fn list_recipients(&self, filter: &str, limit: i64, offset: i64) -> StoreResult<Vec<Recipient>>;

    async fn find_recipient(&self, id: i32) -> StoreResult<Option<Recipient>>;

    async fn find_recipient_by_name(&self, name: &str) -> StoreResult<Option<Recipient>>;

    async fn create_recipient(&self, recipient: &NewRecipient) -> StoreResult<Recipient>;

    async fn update_recipient(
        &self,
        id: i32,
        changes: &RecipientChanges,
    ) -> StoreResult<Option<Recipient>>;

    /// Returns `false` when no row was deleted.
    async fn delete_recipient(&self, id: i32) -> StoreResult<bool>;

    async fn find_deliveryman(&self, id: i32) -> StoreResult<Option<Deliveryman>>;
}
