use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use super::errors::TrackingError;
use super::value_objects::{Order, OrderItem, ShippingAddress};
use crate::domain::employee::DeliveryMode;
use crate::notifications::EmailMessage;

// ============================================================================
// Order Tracking - emailed links and public lookups
// ============================================================================

pub const TRACKING_EMAIL_SUBJECT: &str = "Your order has been placed";

/// `<base>?token=<token>&email=<email>`, query-encoded
pub fn tracking_link(base: &Url, order: &Order) -> Url {
    let mut link = base.clone();
    link.query_pairs_mut()
        .append_pair("token", order.tracking_token.as_str())
        .append_pair("email", &order.employee_email);
    link
}

pub fn tracking_email(order: &Order, base: &Url) -> EmailMessage {
    let link = tracking_link(base, order);
    let lines: String = order
        .items
        .iter()
        .map(|item| {
            format!(
                "<li>{} &times; {}</li>",
                item.quantity,
                escape_html(&item.product_name)
            )
        })
        .collect();

    let html = format!(
        "<p>Hello {name},</p>\
         <p>An order has been placed for you.</p>\
         <ul>{lines}</ul>\
         <p>Order total: {total}</p>\
         <p><a href=\"{href}\">Track your order</a>. This link expires on {expires}.</p>",
        name = escape_html(&order.employee_name),
        total = format_cents(order.total_amount_cents),
        href = escape_html(link.as_str()),
        expires = order.tracking_expires_at.format("%Y-%m-%d %H:%M UTC"),
    );

    EmailMessage {
        to: order.employee_email.clone(),
        subject: TRACKING_EMAIL_SUBJECT.to_string(),
        html,
    }
}

/// Resolve a tracking request. Unknown tokens and mismatched emails are
/// indistinguishable to the caller.
pub fn verify_tracking(order: Option<Order>, email: &str, now: DateTime<Utc>) -> Result<Order, TrackingError> {
    let order = order
        .filter(|o| o.employee_email.eq_ignore_ascii_case(email.trim()))
        .ok_or(TrackingError::NotFound)?;

    if order.is_tracking_expired(now) {
        return Err(TrackingError::Expired);
    }

    Ok(order)
}

/// What the public tracking page gets to see
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
    pub order_id: Uuid,
    pub employee_name: String,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub delivery_mode: DeliveryMode,
    pub total_amount_cents: i64,
    pub created_at: DateTime<Utc>,
    pub tracking_expires_at: DateTime<Utc>,
}

impl From<Order> for TrackingView {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            employee_name: order.employee_name,
            items: order.items,
            shipping_address: order.shipping_address,
            delivery_mode: order.delivery_mode,
            total_amount_cents: order.total_amount_cents,
            created_at: order.created_at,
            tracking_expires_at: order.tracking_expires_at,
        }
    }
}

fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::{PricedCart, PricedLine};
    use crate::domain::employee::EmployeeRecord;
    use chrono::Duration;

    fn order(email: &str, name: &str) -> Order {
        let employee = EmployeeRecord {
            full_name: name.to_string(),
            email: email.to_string(),
            address: "1 Main St".to_string(),
            city: "London".to_string(),
            state: "LDN".to_string(),
            postal_code: "E1".to_string(),
            country: "UK".to_string(),
            phone: None,
        };
        let cart = PricedCart {
            lines: vec![PricedLine {
                product_id: Uuid::new_v4(),
                product_name: "Mug".to_string(),
                quantity: 1,
                unit_price_cents: 1250,
                line_total_cents: 1250,
            }],
            total_cents: 1250,
        };
        Order::for_employee(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &employee,
            DeliveryMode::Individual,
            &cart,
            Utc::now(),
            Duration::days(7),
        )
    }

    fn base() -> Url {
        Url::parse("https://shop.example.com/track-order").unwrap()
    }

    #[test]
    fn test_tracking_link_embeds_token_and_encoded_email() {
        let order = order("ada+team@example.com", "Ada");
        let link = tracking_link(&base(), &order);

        let pairs: Vec<(String, String)> = link.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("token".to_string(), order.tracking_token.as_str().to_string()));
        assert_eq!(pairs[1], ("email".to_string(), "ada+team@example.com".to_string()));
        assert!(link.as_str().contains("ada%2Bteam%40example.com"));
    }

    #[test]
    fn test_tracking_email_contents() {
        let order = order("ada@example.com", "Ada <script>");
        let email = tracking_email(&order, &base());

        assert_eq!(email.to, "ada@example.com");
        assert_eq!(email.subject, TRACKING_EMAIL_SUBJECT);
        assert!(email.html.contains(order.tracking_token.as_str()));
        assert!(email.html.contains("12.50"));
        assert!(email.html.contains("Ada &lt;script&gt;"));
        assert!(!email.html.contains("<script>"));
    }

    #[test]
    fn test_verify_matches_email_case_insensitively() {
        let order = order("Ada@Example.com", "Ada");
        let now = order.created_at;
        assert!(verify_tracking(Some(order), "ada@example.com", now).is_ok());
    }

    #[test]
    fn test_verify_rejects_wrong_email_and_missing_order() {
        let order = order("ada@example.com", "Ada");
        let now = order.created_at;
        assert_eq!(
            verify_tracking(Some(order), "eve@example.com", now).unwrap_err(),
            TrackingError::NotFound
        );
        assert_eq!(
            verify_tracking(None, "ada@example.com", now).unwrap_err(),
            TrackingError::NotFound
        );
    }

    #[test]
    fn test_verify_rejects_expired_link() {
        let order = order("ada@example.com", "Ada");
        let later = order.tracking_expires_at + Duration::minutes(1);
        assert_eq!(
            verify_tracking(Some(order), "ada@example.com", later).unwrap_err(),
            TrackingError::Expired
        );
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(105), "1.05");
        assert_eq!(format_cents(700_000), "7000.00");
    }
}
