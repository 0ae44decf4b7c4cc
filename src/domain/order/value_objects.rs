use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cart::PricedCart;
use crate::domain::employee::{DeliveryMode, EmployeeRecord};

// ============================================================================
// Order Value Objects
// ============================================================================

const TRACKING_TOKEN_BYTES: usize = 32;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl From<&EmployeeRecord> for ShippingAddress {
    fn from(employee: &EmployeeRecord) -> Self {
        Self {
            full_name: employee.full_name.clone(),
            address: employee.address.clone(),
            city: employee.city.clone(),
            state: employee.state.clone(),
            postal_code: employee.postal_code.clone(),
            country: employee.country.clone(),
            phone: employee.phone.clone(),
        }
    }
}

/// Unguessable identifier embedded in customer-facing tracking links.
/// Stable for the life of the order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TrackingToken(String);

impl TrackingToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TRACKING_TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    pub fn from_stored(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub account_id: Uuid,
    /// Groups the orders of one bulk placement
    pub batch_id: Uuid,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub employee_email: String,
    pub employee_name: String,
    pub delivery_mode: DeliveryMode,
    pub tracking_token: TrackingToken,
    pub tracking_expires_at: DateTime<Utc>,
    pub total_amount_cents: i64,
    pub created_by_corporate: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// One broadcast order: the whole cart, shipped to one employee
    pub fn for_employee(
        account_id: Uuid,
        batch_id: Uuid,
        employee: &EmployeeRecord,
        delivery_mode: DeliveryMode,
        cart: &PricedCart,
        created_at: DateTime<Utc>,
        tracking_ttl: Duration,
    ) -> Self {
        let items = cart
            .lines
            .iter()
            .map(|line| OrderItem {
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            account_id,
            batch_id,
            items,
            shipping_address: ShippingAddress::from(employee),
            employee_email: employee.email.clone(),
            employee_name: employee.full_name.clone(),
            delivery_mode,
            tracking_token: TrackingToken::generate(),
            tracking_expires_at: created_at + tracking_ttl,
            total_amount_cents: cart.total_cents,
            created_by_corporate: true,
            created_at,
        }
    }

    pub fn is_tracking_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.tracking_expires_at
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
