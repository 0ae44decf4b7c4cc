use uuid::Uuid;

use crate::domain::catalog::PricingError;
use crate::store::StoreError;

// ============================================================================
// Bulk Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BulkOrderError {
    #[error("No employee list uploaded")]
    NoEmployeeList,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for product {product_name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_name: String,
        requested: i64,
        available: i64,
    },

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for BulkOrderError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::InsufficientStock {
                product_name,
                requested,
                available,
                ..
            } => BulkOrderError::InsufficientStock {
                product_name,
                requested,
                available,
            },
            StoreError::ProductNotFound(id) => BulkOrderError::ProductNotFound(id),
            other => BulkOrderError::Store(other),
        }
    }
}

impl BulkOrderError {
    /// Label for the bulk order outcome metric
    pub fn outcome(&self) -> &'static str {
        match self {
            BulkOrderError::NoEmployeeList | BulkOrderError::EmptyCart => "rejected",
            BulkOrderError::ProductNotFound(_) | BulkOrderError::Pricing(_) => "rejected",
            BulkOrderError::InsufficientStock { .. } => "insufficient_stock",
            BulkOrderError::Store(_) => "error",
        }
    }
}

/// Public tracking lookups
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrackingError {
    #[error("Order not found")]
    NotFound,

    #[error("Tracking link has expired")]
    Expired,
}
