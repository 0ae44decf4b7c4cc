use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::auth::AuthenticatedAccount;
use super::sealed::{reply, SealedJson};
use super::AppState;
use crate::domain::account::Account;
use crate::domain::cart::{load_cart, CartLine, PricedCart};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetCartItem {
    pub product_id: Uuid,
    pub quantity: u32,
}

async fn priced_cart(state: &AppState, account: &Account) -> Result<PricedCart, ApiError> {
    let entries = load_cart(state.store.as_ref(), account.id).await?;
    Ok(PricedCart::build(&entries, account.is_corporate)?)
}

/// GET /cart
pub async fn show(
    req: HttpRequest,
    state: web::Data<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<HttpResponse, ApiError> {
    let cart = priced_cart(&state, &account).await?;
    reply(&req, &state, StatusCode::OK, &cart)
}

/// PUT /cart/items; quantity 0 removes the line
pub async fn set_item(
    req: HttpRequest,
    state: web::Data<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    SealedJson(item): SealedJson<SetCartItem>,
) -> Result<HttpResponse, ApiError> {
    if item.quantity > 0 && state.store.product(item.product_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Product not found: {}", item.product_id)));
    }

    state
        .store
        .set_cart_line(
            account.id,
            CartLine {
                product_id: item.product_id,
                quantity: item.quantity,
            },
        )
        .await?;

    tracing::debug!(account_id = %account.id, product_id = %item.product_id, quantity = item.quantity, "Cart updated");

    let cart = priced_cart(&state, &account).await?;
    reply(&req, &state, StatusCode::OK, &cart)
}

/// DELETE /cart
pub async fn clear(
    req: HttpRequest,
    state: web::Data<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<HttpResponse, ApiError> {
    state.store.clear_cart(account.id).await?;
    reply(&req, &state, StatusCode::OK, &serde_json::json!({ "message": "Cart cleared" }))
}
