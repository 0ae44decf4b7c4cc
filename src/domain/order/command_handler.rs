use std::sync::Arc;
use std::time::Instant;

use actix::Addr;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::errors::BulkOrderError;
use super::settings::{BulkOrderSettings, CommitMode};
use super::tracking::tracking_email;
use super::value_objects::Order;
use crate::domain::account::Account;
use crate::domain::cart::{load_cart, PricedCart};
use crate::domain::employee::EmployeeList;
use crate::metrics::Metrics;
use crate::notifications::{NotificationActor, SendEmail};
use crate::store::{BatchClose, CommerceStore, OrderCommit, StockReservation};

// ============================================================================
// Bulk Order Command Handler
// ============================================================================
//
// Orchestrates: Employee list + Cart → Orders → Stock → Tracking emails
//
// Every employee gets the whole cart. Stock is taken per unit ordered, so
// a cart line of quantity Q across K employees reserves Q×K units.
//
// Closing the batch only removes what was read here: a roster uploaded or
// a cart line changed while the batch was being placed is left alone.
//
// ============================================================================

/// Result of a bulk placement, returned to the caller as JSON
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkOrderReceipt {
    pub message: String,
    pub batch_id: Uuid,
    pub orders_created: usize,
    pub total_amount_cents: i64,
    /// Employees whose tracking email could not be sent
    pub failed_notifications: Vec<String>,
}

pub struct BulkOrderCommandHandler {
    store: Arc<dyn CommerceStore>,
    notifier: Addr<NotificationActor>,
    metrics: Arc<Metrics>,
    settings: BulkOrderSettings,
}

impl BulkOrderCommandHandler {
    pub fn new(
        store: Arc<dyn CommerceStore>,
        notifier: Addr<NotificationActor>,
        metrics: Arc<Metrics>,
        settings: BulkOrderSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            metrics,
            settings,
        }
    }

    pub async fn place(&self, account: &Account) -> Result<BulkOrderReceipt, BulkOrderError> {
        let started = Instant::now();
        let batch_id = Uuid::new_v4();

        let result = self.place_batch(account, batch_id).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(receipt) => {
                self.metrics.record_bulk_order("success", elapsed);
                tracing::info!(
                    account_id = %account.id,
                    batch_id = %batch_id,
                    orders = receipt.orders_created,
                    total_cents = receipt.total_amount_cents,
                    failed_notifications = receipt.failed_notifications.len(),
                    "Bulk order placed"
                );
            }
            Err(e) => {
                self.metrics.record_bulk_order(e.outcome(), elapsed);
                tracing::warn!(
                    account_id = %account.id,
                    batch_id = %batch_id,
                    error = %e,
                    "Bulk order failed"
                );
            }
        }

        result
    }

    async fn place_batch(&self, account: &Account, batch_id: Uuid) -> Result<BulkOrderReceipt, BulkOrderError> {
        let list = self
            .store
            .employee_list(account.id)
            .await?
            .filter(|list| !list.is_empty())
            .ok_or(BulkOrderError::NoEmployeeList)?;

        let entries = load_cart(self.store.as_ref(), account.id).await?;
        if entries.is_empty() {
            return Err(BulkOrderError::EmptyCart);
        }
        let cart = PricedCart::build(&entries, account.is_corporate)?;

        tracing::debug!(
            account_id = %account.id,
            batch_id = %batch_id,
            employees = list.len(),
            lines = cart.lines.len(),
            mode = ?self.settings.commit_mode,
            "Placing bulk order"
        );

        let orders = self.build_orders(account, batch_id, &list, &cart);
        let batch = BatchClose {
            roster_uploaded_at: list.uploaded_at,
            cart_lines: entries.into_iter().map(|(line, _)| line).collect(),
        };

        match self.settings.commit_mode {
            CommitMode::AllOrNothing => self.commit_all(account, batch_id, &cart, orders, batch).await,
            CommitMode::BestEffort => self.commit_each(account, batch_id, &cart, orders, batch).await,
        }
    }

    fn build_orders(&self, account: &Account, batch_id: Uuid, list: &EmployeeList, cart: &PricedCart) -> Vec<Order> {
        let now = Utc::now();
        list.employees
            .iter()
            .map(|employee| {
                Order::for_employee(
                    account.id,
                    batch_id,
                    employee,
                    list.delivery_mode,
                    cart,
                    now,
                    self.settings.tracking_ttl,
                )
            })
            .collect()
    }

    /// One commit covering every order, then one email per order
    async fn commit_all(
        &self,
        account: &Account,
        batch_id: Uuid,
        cart: &PricedCart,
        orders: Vec<Order>,
        batch: BatchClose,
    ) -> Result<BulkOrderReceipt, BulkOrderError> {
        let copies = orders.len() as i64;
        let reservations = reservations(cart, copies);

        self.store
            .commit_orders(OrderCommit {
                account_id: account.id,
                reservations,
                orders: orders.clone(),
                close_batch: Some(batch),
            })
            .await?;
        self.metrics.record_orders_created(orders.len());

        let mut failed_notifications = Vec::new();
        for order in &orders {
            if !self.notify(order).await {
                failed_notifications.push(order.employee_email.clone());
            }
        }

        Ok(receipt(batch_id, &orders, failed_notifications))
    }

    /// One commit per employee; a failure stops the batch and keeps what was
    /// already written, along with the cart and the employee list
    async fn commit_each(
        &self,
        account: &Account,
        batch_id: Uuid,
        cart: &PricedCart,
        orders: Vec<Order>,
        batch: BatchClose,
    ) -> Result<BulkOrderReceipt, BulkOrderError> {
        let mut failed_notifications = Vec::new();

        for (placed, order) in orders.iter().enumerate() {
            let commit = OrderCommit {
                account_id: account.id,
                reservations: reservations(cart, 1),
                orders: vec![order.clone()],
                close_batch: None,
            };

            if let Err(e) = self.store.commit_orders(commit).await {
                tracing::warn!(
                    batch_id = %batch_id,
                    placed,
                    remaining = orders.len() - placed,
                    "Bulk order stopped part way"
                );
                return Err(e.into());
            }
            self.metrics.record_orders_created(1);

            if !self.notify(order).await {
                failed_notifications.push(order.employee_email.clone());
            }
        }

        self.store.close_batch(account.id, &batch).await?;

        Ok(receipt(batch_id, &orders, failed_notifications))
    }

    /// Returns false when the email was not delivered
    async fn notify(&self, order: &Order) -> bool {
        let message = tracking_email(order, &self.settings.tracking_base_url);

        match self.notifier.send(SendEmail(message)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(order_id = %order.id, to = %order.employee_email, error = %e, "Tracking email not sent");
                false
            }
            Err(e) => {
                tracing::error!(order_id = %order.id, error = %e, "Notification actor unavailable");
                false
            }
        }
    }
}

fn reservations(cart: &PricedCart, copies: i64) -> Vec<StockReservation> {
    cart.lines
        .iter()
        .map(|line| StockReservation {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            quantity: i64::from(line.quantity).saturating_mul(copies),
        })
        .collect()
}

fn receipt(batch_id: Uuid, orders: &[Order], failed_notifications: Vec<String>) -> BulkOrderReceipt {
    BulkOrderReceipt {
        message: "Bulk orders created".to_string(),
        batch_id,
        orders_created: orders.len(),
        total_amount_cents: orders.iter().map(|o| o.total_amount_cents).sum(),
        failed_notifications,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
