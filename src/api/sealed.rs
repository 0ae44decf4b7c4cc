use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;
use crate::utils::{PayloadError, SealedEnvelope};

// ============================================================================
// Sealed JSON - optional AES-GCM envelope around request/response bodies
// ============================================================================

pub const SEALED_HEADER: &str = "X-Sealed-Payload";

pub fn wants_sealed(req: &HttpRequest) -> bool {
    req.headers()
        .get(SEALED_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "1")
}

/// JSON body that may arrive as `{"payload": "<hex>"}` when the request
/// carries the sealed header
#[derive(Debug)]
pub struct SealedJson<T>(pub T);

impl<T: DeserializeOwned + 'static> FromRequest for SealedJson<T> {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let body = web::Bytes::from_request(req, payload);
        let sealed = wants_sealed(req);
        let cipher = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.cipher.clone());

        Box::pin(async move {
            let bytes = body.await.map_err(|e| ApiError::BadRequest(e.to_string()))?;

            if !sealed {
                return serde_json::from_slice(&bytes)
                    .map(SealedJson)
                    .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")));
            }

            let cipher = cipher.ok_or(PayloadError::Disabled)?;
            let envelope: SealedEnvelope =
                serde_json::from_slice(&bytes).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
            Ok(SealedJson(cipher.open(&envelope)?))
        })
    }
}

/// JSON response, sealed when the request asked for it
pub fn reply<T: Serialize>(
    req: &HttpRequest,
    state: &AppState,
    status: StatusCode,
    body: &T,
) -> Result<HttpResponse, ApiError> {
    if !wants_sealed(req) {
        return Ok(HttpResponse::build(status).json(body));
    }

    let cipher = state.cipher.as_ref().ok_or(PayloadError::Disabled)?;
    Ok(HttpResponse::build(status)
        .insert_header((SEALED_HEADER, "1"))
        .json(cipher.seal(body)?))
}
