// ============================================================================
// Catalog Domain - products, stock and tiered corporate pricing
// ============================================================================

pub mod value_objects;
pub mod pricing;

pub use value_objects::*;
pub use pricing::{quote, PricingError};
