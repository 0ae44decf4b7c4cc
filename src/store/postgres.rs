use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::types::Json;
use uuid::Uuid;

use super::{BatchClose, CommerceStore, OrderCommit, StockReservation, StoreError, StoreResult};
use crate::domain::account::Account;
use crate::domain::cart::CartLine;
use crate::domain::catalog::{PriceTier, Product};
use crate::domain::employee::{DeliveryMode, EmployeeList, EmployeeRecord};
use crate::domain::order::{Order, OrderItem, ShippingAddress, TrackingToken};

// ============================================================================
// PostgreSQL Store
// ============================================================================
//
// Stock is only ever decremented with a conditional UPDATE inside the
// order commit transaction; a reservation that matches no row rolls the
// whole commit back. Product rows are always locked in id order so two
// concurrent commits over the same products cannot deadlock.
//
// ============================================================================

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply embedded migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!(max_connections, "Connected to PostgreSQL and applied migrations");

        Ok(Self { pool })
    }
}

/// One reservation per product, ascending by product id
fn lock_order(reservations: &[StockReservation]) -> Vec<StockReservation> {
    let mut merged: BTreeMap<Uuid, StockReservation> = BTreeMap::new();
    for reservation in reservations {
        merged
            .entry(reservation.product_id)
            .and_modify(|r| r.quantity += reservation.quantity)
            .or_insert_with(|| reservation.clone());
    }
    merged.into_values().collect()
}

async fn delete_batch(conn: &mut PgConnection, account_id: Uuid, batch: &BatchClose) -> StoreResult<()> {
    sqlx::query("DELETE FROM employee_lists WHERE account_id = $1 AND uploaded_at = $2")
        .bind(account_id)
        .bind(batch.roster_uploaded_at)
        .execute(&mut *conn)
        .await?;

    for line in &batch.cart_lines {
        sqlx::query("DELETE FROM cart_lines WHERE account_id = $1 AND product_id = $2 AND quantity = $3")
            .bind(account_id)
            .bind(line.product_id)
            .bind(i64::from(line.quantity))
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    is_corporate: bool,
    api_token: String,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            is_corporate: row.is_corporate,
            api_token: row.api_token,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    price_cents: i64,
    stock: i64,
    corporate_tiers: Json<Vec<PriceTier>>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price_cents: row.price_cents,
            stock: row.stock,
            corporate_tiers: row.corporate_tiers.0,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EmployeeListRow {
    account_id: Uuid,
    delivery_mode: String,
    employees: Json<Vec<EmployeeRecord>>,
    uploaded_at: DateTime<Utc>,
}

impl TryFrom<EmployeeListRow> for EmployeeList {
    type Error = StoreError;

    fn try_from(row: EmployeeListRow) -> Result<Self, Self::Error> {
        Ok(Self {
            account_id: row.account_id,
            delivery_mode: parse_delivery_mode(&row.delivery_mode)?,
            employees: row.employees.0,
            uploaded_at: row.uploaded_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    account_id: Uuid,
    batch_id: Uuid,
    items: Json<Vec<OrderItem>>,
    shipping_address: Json<ShippingAddress>,
    employee_email: String,
    employee_name: String,
    delivery_mode: String,
    tracking_token: String,
    tracking_expires_at: DateTime<Utc>,
    total_amount_cents: i64,
    created_by_corporate: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            account_id: row.account_id,
            batch_id: row.batch_id,
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            employee_email: row.employee_email,
            employee_name: row.employee_name,
            delivery_mode: parse_delivery_mode(&row.delivery_mode)?,
            tracking_token: TrackingToken::from_stored(row.tracking_token),
            tracking_expires_at: row.tracking_expires_at,
            total_amount_cents: row.total_amount_cents,
            created_by_corporate: row.created_by_corporate,
            created_at: row.created_at,
        })
    }
}

fn parse_delivery_mode(raw: &str) -> Result<DeliveryMode, StoreError> {
    raw.parse()
        .map_err(|_| StoreError::Corrupt(format!("unknown delivery mode `{raw}`")))
}

const ORDER_COLUMNS: &str = "id, account_id, batch_id, items, shipping_address, employee_email, \
     employee_name, delivery_mode, tracking_token, tracking_expires_at, total_amount_cents, \
     created_by_corporate, created_at";

#[async_trait]
impl CommerceStore for PgStore {
    async fn account_by_token(&self, api_token: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, name, email, is_corporate, api_token FROM accounts WHERE api_token = $1",
        )
        .bind(api_token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
        let row: Option<ProductRow> = sqlx::query_as(
            "SELECT id, name, price_cents, stock, corporate_tiers FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    async fn cart_lines(&self, account_id: Uuid) -> StoreResult<Vec<CartLine>> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT product_id, quantity FROM cart_lines WHERE account_id = $1 ORDER BY added_at",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(product_id, quantity)| {
                let quantity = u32::try_from(quantity)
                    .map_err(|_| StoreError::Corrupt(format!("cart quantity {quantity} out of range")))?;
                Ok(CartLine { product_id, quantity })
            })
            .collect()
    }

    async fn set_cart_line(&self, account_id: Uuid, line: CartLine) -> StoreResult<()> {
        if line.quantity == 0 {
            sqlx::query("DELETE FROM cart_lines WHERE account_id = $1 AND product_id = $2")
                .bind(account_id)
                .bind(line.product_id)
                .execute(&self.pool)
                .await?;
            return Ok(());
        }

        sqlx::query(
            "INSERT INTO cart_lines (account_id, product_id, quantity) VALUES ($1, $2, $3)
             ON CONFLICT (account_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(account_id)
        .bind(line.product_id)
        .bind(i64::from(line.quantity))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_cart(&self, account_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM cart_lines WHERE account_id = $1")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace_employee_list(&self, list: EmployeeList) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO employee_lists (account_id, delivery_mode, employees, uploaded_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (account_id) DO UPDATE
             SET delivery_mode = EXCLUDED.delivery_mode,
                 employees = EXCLUDED.employees,
                 uploaded_at = EXCLUDED.uploaded_at",
        )
        .bind(list.account_id)
        .bind(list.delivery_mode.as_str())
        .bind(Json(&list.employees))
        .bind(list.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn employee_list(&self, account_id: Uuid) -> StoreResult<Option<EmployeeList>> {
        let row: Option<EmployeeListRow> = sqlx::query_as(
            "SELECT account_id, delivery_mode, employees, uploaded_at
             FROM employee_lists WHERE account_id = $1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(EmployeeList::try_from).transpose()
    }

    async fn commit_orders(&self, commit: OrderCommit) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        for reservation in &lock_order(&commit.reservations) {
            let updated = sqlx::query(
                "UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1",
            )
            .bind(reservation.quantity)
            .bind(reservation.product_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
                        .bind(reservation.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                // Dropping `tx` rolls back the earlier reservations
                return Err(match available {
                    None => StoreError::ProductNotFound(reservation.product_id),
                    Some(available) => StoreError::InsufficientStock {
                        product_id: reservation.product_id,
                        product_name: reservation.product_name.clone(),
                        requested: reservation.quantity,
                        available,
                    },
                });
            }
        }

        let insert = format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        );

        for order in &commit.orders {
            sqlx::query(&insert)
                .bind(order.id)
                .bind(order.account_id)
                .bind(order.batch_id)
                .bind(Json(&order.items))
                .bind(Json(&order.shipping_address))
                .bind(&order.employee_email)
                .bind(&order.employee_name)
                .bind(order.delivery_mode.as_str())
                .bind(order.tracking_token.as_str())
                .bind(order.tracking_expires_at)
                .bind(order.total_amount_cents)
                .bind(order.created_by_corporate)
                .bind(order.created_at)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(batch) = &commit.close_batch {
            delete_batch(&mut *tx, commit.account_id, batch).await?;
        }

        tx.commit().await?;

        tracing::debug!(
            account_id = %commit.account_id,
            orders = commit.orders.len(),
            reservations = commit.reservations.len(),
            "Committed orders"
        );

        Ok(())
    }

    async fn close_batch(&self, account_id: Uuid, batch: &BatchClose) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        delete_batch(&mut *tx, account_id, batch).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn orders_for_account(&self, account_id: Uuid) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE account_id = $1 ORDER BY created_at DESC"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn order_by_tracking_token(&self, token: &str) -> StoreResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tracking_token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }
}

// Note: the queries need a live PostgreSQL instance; only row conversions
// are covered here.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_row_conversion() {
        let now = Utc::now();
        let row = OrderRow {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            batch_id: Uuid::new_v4(),
            items: Json(vec![]),
            shipping_address: Json(ShippingAddress {
                full_name: "Ada".to_string(),
                address: "1 Main St".to_string(),
                city: "London".to_string(),
                state: "LDN".to_string(),
                postal_code: "E1".to_string(),
                country: "UK".to_string(),
                phone: None,
            }),
            employee_email: "ada@example.com".to_string(),
            employee_name: "Ada".to_string(),
            delivery_mode: "consolidated".to_string(),
            tracking_token: "ab".repeat(32),
            tracking_expires_at: now,
            total_amount_cents: 100,
            created_by_corporate: true,
            created_at: now,
        };

        let order = Order::try_from(row).unwrap();
        assert_eq!(order.delivery_mode, DeliveryMode::Consolidated);
        assert_eq!(order.tracking_token.as_str().len(), 64);
    }

    #[test]
    fn test_unknown_delivery_mode_is_corrupt() {
        assert!(matches!(parse_delivery_mode("teleport"), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_lock_order_sorts_and_merges() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        let reservation = |product_id, quantity| StockReservation {
            product_id,
            product_name: "Pen".to_string(),
            quantity,
        };

        let forward = lock_order(&[reservation(low, 2), reservation(high, 1)]);
        let backward = lock_order(&[reservation(high, 1), reservation(low, 2), reservation(high, 4)]);

        assert_eq!(forward, vec![reservation(low, 2), reservation(high, 1)]);
        assert_eq!(backward, vec![reservation(low, 2), reservation(high, 5)]);
    }
}
