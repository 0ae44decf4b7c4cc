use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::auth::AuthenticatedAccount;
use super::sealed::reply;
use super::AppState;
use crate::domain::catalog::quote;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub quantity: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub product_id: Uuid,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub tier_applied: bool,
}

/// GET /products/{id}/price?quantity=N
pub async fn price(
    req: HttpRequest,
    state: web::Data<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
    path: web::Path<Uuid>,
    query: web::Query<PriceQuery>,
) -> Result<HttpResponse, ApiError> {
    let product_id = path.into_inner();
    let quantity = query.quantity.unwrap_or(1);

    let product = state
        .store
        .product(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {product_id}")))?;

    let quote = quote(&product, quantity, account.is_corporate)?;

    reply(
        &req,
        &state,
        StatusCode::OK,
        &PriceResponse {
            product_id,
            quantity,
            unit_price_cents: quote.unit_price_cents,
            total_cents: quote.total_cents,
            tier_applied: quote.tier_applied,
        },
    )
}
