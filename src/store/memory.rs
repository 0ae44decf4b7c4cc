use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{BatchClose, CommerceStore, OrderCommit, StoreError, StoreResult};
use crate::domain::account::Account;
use crate::domain::cart::CartLine;
use crate::domain::catalog::Product;
use crate::domain::employee::EmployeeList;
use crate::domain::order::Order;

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Used when no DATABASE_URL is configured, and by tests. One mutex guards
// the whole state, so every commit is atomic with respect to every other.
//
// ============================================================================

/// Accounts and products loaded at startup
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl SeedData {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    products: HashMap<Uuid, Product>,
    carts: HashMap<Uuid, Vec<CartLine>>,
    employee_lists: HashMap<Uuid, EmployeeList>,
    orders: Vec<Order>,
}

impl State {
    fn close_batch(&mut self, account_id: Uuid, batch: &BatchClose) {
        let roster_unchanged = self
            .employee_lists
            .get(&account_id)
            .is_some_and(|list| list.uploaded_at == batch.roster_uploaded_at);
        if roster_unchanged {
            self.employee_lists.remove(&account_id);
        }

        if let Some(cart) = self.carts.get_mut(&account_id) {
            cart.retain(|line| !batch.cart_lines.contains(line));
            if cart.is_empty() {
                self.carts.remove(&account_id);
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: SeedData) -> Self {
        let state = State {
            accounts: seed.accounts.into_iter().map(|a| (a.id, a)).collect(),
            products: seed.products.into_iter().map(|p| (p.id, p)).collect(),
            ..State::default()
        };

        Self {
            state: Mutex::new(state),
        }
    }

    #[cfg(test)]
    pub async fn insert_account(&self, account: Account) {
        self.state.lock().await.accounts.insert(account.id, account);
    }

    #[cfg(test)]
    pub async fn insert_product(&self, product: Product) {
        self.state.lock().await.products.insert(product.id, product);
    }

    #[cfg(test)]
    pub async fn stock_of(&self, product_id: Uuid) -> Option<i64> {
        self.state.lock().await.products.get(&product_id).map(|p| p.stock)
    }

    #[cfg(test)]
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl CommerceStore for MemoryStore {
    async fn account_by_token(&self, api_token: &str) -> StoreResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.values().find(|a| a.api_token == api_token).cloned())
    }

    async fn product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.state.lock().await.products.get(&product_id).cloned())
    }

    async fn cart_lines(&self, account_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let state = self.state.lock().await;
        Ok(state.carts.get(&account_id).cloned().unwrap_or_default())
    }

    async fn set_cart_line(&self, account_id: Uuid, line: CartLine) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let cart = state.carts.entry(account_id).or_default();

        if line.quantity == 0 {
            cart.retain(|l| l.product_id != line.product_id);
        } else if let Some(existing) = cart.iter_mut().find(|l| l.product_id == line.product_id) {
            existing.quantity = line.quantity;
        } else {
            cart.push(line);
        }

        Ok(())
    }

    async fn clear_cart(&self, account_id: Uuid) -> StoreResult<()> {
        self.state.lock().await.carts.remove(&account_id);
        Ok(())
    }

    async fn replace_employee_list(&self, list: EmployeeList) -> StoreResult<()> {
        self.state.lock().await.employee_lists.insert(list.account_id, list);
        Ok(())
    }

    async fn employee_list(&self, account_id: Uuid) -> StoreResult<Option<EmployeeList>> {
        Ok(self.state.lock().await.employee_lists.get(&account_id).cloned())
    }

    async fn commit_orders(&self, commit: OrderCommit) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        // Sum per product first so split reservations cannot overdraw
        let mut wanted: BTreeMap<Uuid, (i64, &str)> = BTreeMap::new();
        for r in &commit.reservations {
            let entry = wanted.entry(r.product_id).or_insert((0, r.product_name.as_str()));
            entry.0 = entry.0.saturating_add(r.quantity);
        }

        for (product_id, (requested, name)) in &wanted {
            let product = state
                .products
                .get(product_id)
                .ok_or(StoreError::ProductNotFound(*product_id))?;

            if product.stock < *requested {
                return Err(StoreError::InsufficientStock {
                    product_id: *product_id,
                    product_name: name.to_string(),
                    requested: *requested,
                    available: product.stock,
                });
            }
        }

        for (product_id, (requested, _)) in &wanted {
            if let Some(product) = state.products.get_mut(product_id) {
                product.stock -= requested;
            }
        }

        state.orders.extend(commit.orders);

        if let Some(batch) = &commit.close_batch {
            state.close_batch(commit.account_id, batch);
        }

        Ok(())
    }

    async fn close_batch(&self, account_id: Uuid, batch: &BatchClose) -> StoreResult<()> {
        self.state.lock().await.close_batch(account_id, batch);
        Ok(())
    }

    async fn orders_for_account(&self, account_id: Uuid) -> StoreResult<Vec<Order>> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.account_id == account_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn order_by_tracking_token(&self, token: &str) -> StoreResult<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .find(|o| o.tracking_token.as_str() == token)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StockReservation;

    fn reservation(product: &Product, quantity: i64) -> StockReservation {
        StockReservation {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_cart_line_upsert_and_remove() {
        let store = MemoryStore::new();
        let account = Uuid::new_v4();
        let product = Uuid::new_v4();

        store.set_cart_line(account, CartLine { product_id: product, quantity: 2 }).await.unwrap();
        store.set_cart_line(account, CartLine { product_id: product, quantity: 5 }).await.unwrap();
        assert_eq!(store.cart_lines(account).await.unwrap()[0].quantity, 5);

        store.set_cart_line(account, CartLine { product_id: product, quantity: 0 }).await.unwrap();
        assert!(store.cart_lines(account).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let plenty = Product::new("Pen", 100, 100);
        let scarce = Product::new("Lamp", 5000, 1);
        let store = MemoryStore::new();
        store.insert_product(plenty.clone()).await;
        store.insert_product(scarce.clone()).await;

        let result = store
            .commit_orders(OrderCommit {
                account_id: Uuid::new_v4(),
                reservations: vec![reservation(&plenty, 10), reservation(&scarce, 2)],
                orders: vec![],
                close_batch: None,
            })
            .await;

        assert!(matches!(
            result,
            Err(StoreError::InsufficientStock { ref product_name, requested: 2, available: 1, .. })
                if product_name == "Lamp"
        ));
        assert_eq!(store.stock_of(plenty.id).await, Some(100));
        assert_eq!(store.stock_of(scarce.id).await, Some(1));
    }

    #[tokio::test]
    async fn test_split_reservations_are_summed() {
        let product = Product::new("Pen", 100, 3);
        let store = MemoryStore::new();
        store.insert_product(product.clone()).await;

        let result = store
            .commit_orders(OrderCommit {
                account_id: Uuid::new_v4(),
                reservations: vec![reservation(&product, 2), reservation(&product, 2)],
                orders: vec![],
                close_batch: None,
            })
            .await;

        assert!(matches!(result, Err(StoreError::InsufficientStock { requested: 4, .. })));
        assert_eq!(store.stock_of(product.id).await, Some(3));
    }

    #[tokio::test]
    async fn test_unknown_product_in_commit() {
        let store = MemoryStore::new();
        let ghost = Product::new("Ghost", 1, 1);

        let result = store
            .commit_orders(OrderCommit {
                account_id: Uuid::new_v4(),
                reservations: vec![reservation(&ghost, 1)],
                orders: vec![],
                close_batch: None,
            })
            .await;

        assert!(matches!(result, Err(StoreError::ProductNotFound(id)) if id == ghost.id));
    }

    #[tokio::test]
    async fn test_close_batch_keeps_newer_roster_and_cart_lines() {
        use crate::domain::employee::DeliveryMode;

        let store = MemoryStore::new();
        let account = Uuid::new_v4();
        let pen = Uuid::new_v4();
        let lamp = Uuid::new_v4();

        let read = EmployeeList::new(account, DeliveryMode::Individual, vec![]);
        let mut newer = EmployeeList::new(account, DeliveryMode::Consolidated, vec![]);
        newer.uploaded_at = read.uploaded_at + chrono::Duration::seconds(1);
        store.replace_employee_list(newer.clone()).await.unwrap();

        store.set_cart_line(account, CartLine { product_id: pen, quantity: 2 }).await.unwrap();
        store.set_cart_line(account, CartLine { product_id: lamp, quantity: 1 }).await.unwrap();

        let batch = BatchClose {
            roster_uploaded_at: read.uploaded_at,
            cart_lines: vec![CartLine { product_id: pen, quantity: 2 }],
        };
        store.close_batch(account, &batch).await.unwrap();

        assert_eq!(store.employee_list(account).await.unwrap(), Some(newer.clone()));
        assert_eq!(
            store.cart_lines(account).await.unwrap(),
            vec![CartLine { product_id: lamp, quantity: 1 }]
        );

        let batch = BatchClose {
            roster_uploaded_at: newer.uploaded_at,
            cart_lines: vec![CartLine { product_id: lamp, quantity: 1 }],
        };
        store.close_batch(account, &batch).await.unwrap();

        assert!(store.employee_list(account).await.unwrap().is_none());
        assert!(store.cart_lines(account).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_and_token_lookup() {
        let account = Account::new("Acme", "ops@acme.test", true);
        let store = MemoryStore::from_seed(SeedData {
            accounts: vec![account.clone()],
            products: vec![],
        });

        assert_eq!(store.account_by_token(&account.api_token).await.unwrap(), Some(account));
        assert_eq!(store.account_by_token("nope").await.unwrap(), None);
    }

    #[test]
    fn test_seed_file_format() {
        let seed: SeedData = serde_json::from_str(
            r#"{
                "accounts": [{"id": "6f1c2a57-3c36-4d8e-9a4c-1d1f8f0a8b11", "name": "Acme",
                              "email": "ops@acme.test", "isCorporate": true, "apiToken": "t"}],
                "products": [{"id": "0b6e7f0e-4b0c-4a43-8a0a-2f7a6c1d9e22", "name": "Hoodie",
                              "priceCents": 4000, "stock": 10,
                              "corporateTiers": [{"minQuantity": 10, "unitPriceCents": 3500}]}]
            }"#,
        )
        .unwrap();

        assert!(seed.accounts[0].is_corporate);
        assert_eq!(seed.products[0].corporate_tiers[0].max_quantity, None);
    }
}
