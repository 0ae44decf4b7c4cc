use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::account::Account;
use crate::domain::cart::CartLine;
use crate::domain::catalog::Product;
use crate::domain::employee::EmployeeList;
use crate::domain::order::Order;

mod memory;
mod postgres;

pub use memory::{MemoryStore, SeedData};
pub use postgres::PgStore;

// ============================================================================
// Commerce Store - persistence seam
// ============================================================================
//
// Responsibilities:
// 1. Accounts, products, carts, employee lists and orders
// 2. Atomic order commits: every stock reservation is a conditional
//    decrement (`stock >= requested`) applied in the same unit of work as
//    the order inserts, so a short product writes nothing
// 3. Batch close: drop the employee list and the cart lines that were
//    ordered, and nothing uploaded or added since they were read
//
// ============================================================================

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Insufficient stock for product {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        product_name: String,
        requested: i64,
        available: i64,
    },

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Units of one product to take out of stock
#[derive(Debug, Clone, PartialEq)]
pub struct StockReservation {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i64,
}

/// What a finished batch consumed, as it was read
#[derive(Debug, Clone, PartialEq)]
pub struct BatchClose {
    /// The list is only deleted while its `uploaded_at` still matches
    pub roster_uploaded_at: DateTime<Utc>,
    /// Removed only where product and quantity still match
    pub cart_lines: Vec<CartLine>,
}

/// One atomic unit of work for order placement
#[derive(Debug, Clone)]
pub struct OrderCommit {
    pub account_id: Uuid,
    pub reservations: Vec<StockReservation>,
    pub orders: Vec<Order>,
    pub close_batch: Option<BatchClose>,
}

#[async_trait]
pub trait CommerceStore: Send + Sync {
    async fn account_by_token(&self, api_token: &str) -> StoreResult<Option<Account>>;

    async fn product(&self, product_id: Uuid) -> StoreResult<Option<Product>>;

    async fn cart_lines(&self, account_id: Uuid) -> StoreResult<Vec<CartLine>>;

    /// Quantity 0 removes the line
    async fn set_cart_line(&self, account_id: Uuid, line: CartLine) -> StoreResult<()>;

    async fn clear_cart(&self, account_id: Uuid) -> StoreResult<()>;

    /// Destructive: the previous list for the account is dropped
    async fn replace_employee_list(&self, list: EmployeeList) -> StoreResult<()>;

    async fn employee_list(&self, account_id: Uuid) -> StoreResult<Option<EmployeeList>>;

    async fn commit_orders(&self, commit: OrderCommit) -> StoreResult<()>;

    async fn close_batch(&self, account_id: Uuid, batch: &BatchClose) -> StoreResult<()>;

    /// Newest first
    async fn orders_for_account(&self, account_id: Uuid) -> StoreResult<Vec<Order>>;

    async fn order_by_tracking_token(&self, token: &str) -> StoreResult<Option<Order>>;
}
