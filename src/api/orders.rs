use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;

use super::auth::AuthenticatedAccount;
use super::sealed::reply;
use super::AppState;
use crate::domain::order::{verify_tracking, TrackingView};
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub token: String,
    pub email: String,
}

/// GET /orders, newest first
pub async fn list(
    req: HttpRequest,
    state: web::Data<AppState>,
    AuthenticatedAccount(account): AuthenticatedAccount,
) -> Result<HttpResponse, ApiError> {
    let orders = state.store.orders_for_account(account.id).await?;
    reply(&req, &state, StatusCode::OK, &orders)
}

/// GET /orders/track?token=&email= (public)
pub async fn track(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<TrackQuery>,
) -> Result<HttpResponse, ApiError> {
    let order = state.store.order_by_tracking_token(query.token.trim()).await?;
    let order = verify_tracking(order, &query.email, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "Tracking lookup refused");
        e
    })?;

    reply(&req, &state, StatusCode::OK, &TrackingView::from(order))
}
