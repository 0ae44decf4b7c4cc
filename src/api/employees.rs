use actix_multipart::{Field, Multipart};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use futures_util::StreamExt;

use super::auth::CorporateAccount;
use super::sealed::reply;
use super::AppState;
use crate::domain::employee::{EmployeeUploadError, RosterUpload};
use crate::error::ApiError;

const MAX_TEXT_FIELD_BYTES: usize = 1024;

/// POST /corporate/employees/upload (multipart: `file`, `deliveryMode`)
pub async fn upload(
    req: HttpRequest,
    state: web::Data<AppState>,
    CorporateAccount(account): CorporateAccount,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let mut upload = RosterUpload::default();

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?;
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                upload.file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                    .map(str::to_string);
                upload.content_type = field.content_type().map(|mime| mime.essence_str().to_string());
                upload.bytes = Some(read_field(&mut field, state.max_upload_bytes).await?);
            }
            "deliveryMode" => {
                let raw = read_field(&mut field, MAX_TEXT_FIELD_BYTES).await?;
                upload.delivery_mode = Some(String::from_utf8_lossy(&raw).trim().to_string());
            }
            _ => {
                read_field(&mut field, state.max_upload_bytes).await?;
            }
        }
    }

    tracing::debug!(
        account_id = %account.id,
        file_name = ?upload.file_name,
        bytes = upload.bytes.as_ref().map(Vec::len),
        "Employee upload received"
    );

    let receipt = state.rosters.upload(account.id, upload).await?;
    reply(&req, &state, StatusCode::OK, &receipt)
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, ApiError> {
    let mut data = Vec::new();

    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?;
        if data.len() + chunk.len() > limit {
            return Err(EmployeeUploadError::TooLarge(limit).into());
        }
        data.extend_from_slice(&chunk);
    }

    Ok(data)
}
