use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Catalog Value Objects
// ============================================================================

/// Corporate price tier. Both bounds are inclusive; an open upper bound
/// covers every larger quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTier {
    pub min_quantity: u32,
    #[serde(default)]
    pub max_quantity: Option<u32>,
    pub unit_price_cents: i64,
}

impl PriceTier {
    pub fn contains(&self, quantity: u32) -> bool {
        quantity >= self.min_quantity && self.max_quantity.map_or(true, |max| quantity <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub stock: i64,
    #[serde(default)]
    pub corporate_tiers: Vec<PriceTier>,
}

impl Product {
    pub fn new(name: impl Into<String>, price_cents: i64, stock: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price_cents,
            stock,
            corporate_tiers: Vec::new(),
        }
    }

    pub fn with_tier(mut self, min_quantity: u32, max_quantity: Option<u32>, unit_price_cents: i64) -> Self {
        self.corporate_tiers.push(PriceTier {
            min_quantity,
            max_quantity,
            unit_price_cents,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_bounds_are_inclusive() {
        let tier = PriceTier {
            min_quantity: 10,
            max_quantity: Some(49),
            unit_price_cents: 900,
        };

        assert!(!tier.contains(9));
        assert!(tier.contains(10));
        assert!(tier.contains(49));
        assert!(!tier.contains(50));
    }

    #[test]
    fn test_open_ended_tier() {
        let tier = PriceTier {
            min_quantity: 50,
            max_quantity: None,
            unit_price_cents: 700,
        };

        assert!(tier.contains(50));
        assert!(tier.contains(u32::MAX));
    }

    #[test]
    fn test_product_wire_format_is_camel_case() {
        let product = Product::new("Notebook", 1200, 30).with_tier(10, None, 1000);
        let json = serde_json::to_value(&product).unwrap();

        assert_eq!(json["priceCents"], 1200);
        assert_eq!(json["corporateTiers"][0]["unitPriceCents"], 1000);
        assert!(json["corporateTiers"][0]["maxQuantity"].is_null());
    }
}
