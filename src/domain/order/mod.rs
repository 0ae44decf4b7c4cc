// ============================================================================
// Order Domain - corporate bulk orders and tracking
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (Order, OrderItem, ShippingAddress, TrackingToken)
// - Errors (BulkOrderError, TrackingError)
// - Settings (CommitMode, BulkOrderSettings)
// - Tracking (emailed links, public lookup)
// - Command Handler (BulkOrderCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod settings;
pub mod tracking;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use errors::*;
pub use settings::{BulkOrderSettings, CommitMode};
pub use tracking::{verify_tracking, TrackingView};
pub use command_handler::BulkOrderCommandHandler;
