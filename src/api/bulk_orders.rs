use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};

use super::auth::CorporateAccount;
use super::sealed::reply;
use super::AppState;
use crate::error::ApiError;

/// POST /corporate/orders/bulk
pub async fn place(
    req: HttpRequest,
    state: web::Data<AppState>,
    CorporateAccount(account): CorporateAccount,
) -> Result<HttpResponse, ApiError> {
    let receipt = state.bulk_orders.place(&account).await?;
    reply(&req, &state, StatusCode::CREATED, &receipt)
}
