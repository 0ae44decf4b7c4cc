use serde::Serialize;

use super::value_objects::{PriceTier, Product};

// ============================================================================
// Tiered Pricing
// ============================================================================
//
// Corporate accounts get the unit price of the first tier whose range holds
// the line quantity. Everyone else, and quantities outside every tier, pay
// the product's base price.
//
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PricingError {
    #[error("Quantity must be greater than zero")]
    ZeroQuantity,

    #[error("Price overflow for product {0}")]
    Overflow(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub tier_applied: bool,
}

pub fn find_tier(tiers: &[PriceTier], quantity: u32) -> Option<&PriceTier> {
    tiers.iter().find(|tier| tier.contains(quantity))
}

pub fn quote(product: &Product, quantity: u32, corporate: bool) -> Result<Quote, PricingError> {
    if quantity == 0 {
        return Err(PricingError::ZeroQuantity);
    }

    let tier = if corporate {
        find_tier(&product.corporate_tiers, quantity)
    } else {
        None
    };

    let unit_price_cents = tier.map_or(product.price_cents, |t| t.unit_price_cents);
    let total_cents = unit_price_cents
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| PricingError::Overflow(product.name.clone()))?;

    Ok(Quote {
        unit_price_cents,
        total_cents,
        tier_applied: tier.is_some(),
    })
}
