use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;

use super::AppState;
use crate::domain::account::Account;
use crate::error::ApiError;

// ============================================================================
// Bearer Token Extractors
// ============================================================================

/// Any account resolved from `Authorization: Bearer <apiToken>`
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount(pub Account);

/// An authenticated account that is also a corporate buyer
#[derive(Debug, Clone)]
pub struct CorporateAccount(pub Account);

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

async fn resolve(state: Option<web::Data<AppState>>, token: Option<String>) -> Result<Account, ApiError> {
    let state = state.ok_or_else(|| ApiError::Internal("application state missing".to_string()))?;
    let token = token.ok_or(ApiError::Unauthorized)?;

    state
        .store
        .account_by_token(&token)
        .await?
        .ok_or(ApiError::Unauthorized)
}

impl FromRequest for AuthenticatedAccount {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move { resolve(state, token).await.map(AuthenticatedAccount) })
    }
}

impl FromRequest for CorporateAccount {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let account = resolve(state, token).await?;
            if !account.is_corporate {
                tracing::debug!(account_id = %account.id, "Corporate endpoint refused");
                return Err(ApiError::Forbidden);
            }
            Ok(CorporateAccount(account))
        })
    }
}
