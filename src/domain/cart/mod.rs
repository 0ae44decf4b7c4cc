use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{pricing, PricingError, Product};
use crate::store::{CommerceStore, StoreError, StoreResult};

// ============================================================================
// Cart Domain
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

/// A cart line resolved against its product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub total_cents: i64,
}

impl PricedCart {
    pub fn build(entries: &[(CartLine, Product)], corporate: bool) -> Result<Self, PricingError> {
        let mut lines = Vec::with_capacity(entries.len());
        let mut total_cents: i64 = 0;

        for (line, product) in entries {
            let quote = pricing::quote(product, line.quantity, corporate)?;
            total_cents = total_cents
                .checked_add(quote.total_cents)
                .ok_or_else(|| PricingError::Overflow(product.name.clone()))?;

            lines.push(PricedLine {
                product_id: product.id,
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit_price_cents: quote.unit_price_cents,
                line_total_cents: quote.total_cents,
            });
        }

        Ok(Self { lines, total_cents })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart lines joined with their products, in cart order.
/// A line whose product has been removed is an error naming the product.
pub async fn load_cart(store: &dyn CommerceStore, account_id: Uuid) -> StoreResult<Vec<(CartLine, Product)>> {
    let lines = store.cart_lines(account_id).await?;
    let mut entries = Vec::with_capacity(lines.len());

    for line in lines {
        let product = store
            .product(line.product_id)
            .await?
            .ok_or(StoreError::ProductNotFound(line.product_id))?;
        entries.push((line, product));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_total_sums_tiered_lines() {
        let shirt = Product::new("Shirt", 2000, 50).with_tier(5, None, 1500);
        let cap = Product::new("Cap", 800, 50);

        let entries = vec![
            (CartLine { product_id: shirt.id, quantity: 5 }, shirt.clone()),
            (CartLine { product_id: cap.id, quantity: 2 }, cap.clone()),
        ];

        let cart = PricedCart::build(&entries, true).unwrap();
        assert_eq!(cart.lines[0].unit_price_cents, 1500);
        assert_eq!(cart.lines[0].line_total_cents, 7500);
        assert_eq!(cart.lines[1].line_total_cents, 1600);
        assert_eq!(cart.total_cents, 9100);
    }

    #[tokio::test]
    async fn test_load_cart_joins_products() {
        use crate::store::MemoryStore;

        let store = MemoryStore::new();
        let account_id = Uuid::new_v4();
        let shirt = Product::new("Shirt", 2000, 50);
        store.insert_product(shirt.clone()).await;
        store.set_cart_line(account_id, CartLine { product_id: shirt.id, quantity: 3 }).await.unwrap();

        let entries = load_cart(&store, account_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1.name, "Shirt");

        let ghost = Uuid::new_v4();
        store.set_cart_line(account_id, CartLine { product_id: ghost, quantity: 1 }).await.unwrap();
        assert!(matches!(
            load_cart(&store, account_id).await,
            Err(StoreError::ProductNotFound(id)) if id == ghost
        ));
    }

    #[test]
    fn test_empty_cart() {
        let cart = PricedCart::build(&[], true).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total_cents, 0);
    }
}
