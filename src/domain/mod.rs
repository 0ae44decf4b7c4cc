// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each area has its own subdirectory with:
// - Value objects
// - Errors
// - Business rules (pricing, roster parsing, bulk placement)
//
// Storage and transport live outside this layer (src/store, src/api).
//
// ============================================================================

pub mod account;
pub mod catalog;
pub mod cart;
pub mod employee;
pub mod order;
