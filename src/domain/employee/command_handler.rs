use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::errors::EmployeeUploadError;
use super::parser::{parse_roster, RosterFormat};
use super::value_objects::{DeliveryMode, EmployeeList};
use crate::metrics::Metrics;
use crate::store::CommerceStore;

// ============================================================================
// Roster Command Handler
// ============================================================================
//
// Orchestrates: Upload → Parse → Filter → Replace previous list
//
// ============================================================================

/// A roster file as received from the client
#[derive(Debug, Default)]
pub struct RosterUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Option<Vec<u8>>,
    pub delivery_mode: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterReceipt {
    pub message: String,
    pub count: usize,
    pub rows_read: usize,
    pub delivery_mode: DeliveryMode,
}

pub struct RosterCommandHandler {
    store: Arc<dyn CommerceStore>,
    metrics: Arc<Metrics>,
}

impl RosterCommandHandler {
    pub fn new(store: Arc<dyn CommerceStore>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    pub async fn upload(&self, account_id: Uuid, upload: RosterUpload) -> Result<RosterReceipt, EmployeeUploadError> {
        let result = self.replace_roster(account_id, upload).await;

        match &result {
            Ok(receipt) => {
                self.metrics.record_upload("accepted", receipt.count);
                tracing::info!(
                    account_id = %account_id,
                    count = receipt.count,
                    rows_read = receipt.rows_read,
                    delivery_mode = %receipt.delivery_mode,
                    "Employee list replaced"
                );
            }
            Err(e) => {
                self.metrics.record_upload("rejected", 0);
                tracing::warn!(account_id = %account_id, error = %e, "Employee upload rejected");
            }
        }

        result
    }

    async fn replace_roster(&self, account_id: Uuid, upload: RosterUpload) -> Result<RosterReceipt, EmployeeUploadError> {
        let bytes = upload.bytes.ok_or(EmployeeUploadError::MissingFile)?;
        let delivery_mode: DeliveryMode = upload
            .delivery_mode
            .as_deref()
            .ok_or(EmployeeUploadError::MissingDeliveryMode)?
            .parse()?;

        let format = RosterFormat::detect(upload.file_name.as_deref(), upload.content_type.as_deref())?;
        let parsed = parse_roster(format, &bytes)?;

        if parsed.employees.is_empty() {
            return Err(EmployeeUploadError::NoValidRows);
        }

        let count = parsed.employees.len();
        self.store
            .replace_employee_list(EmployeeList::new(account_id, delivery_mode, parsed.employees))
            .await?;

        Ok(RosterReceipt {
            message: "Employee list uploaded".to_string(),
            count,
            rows_read: parsed.rows_read,
            delivery_mode,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const HEADER: &str = "fullName,email,address,city,state,postalCode,country,phone\n";

    fn handler() -> (RosterCommandHandler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let handler = RosterCommandHandler::new(store.clone(), Arc::new(Metrics::new().unwrap()));
        (handler, store)
    }

    fn csv_upload(body: &str) -> RosterUpload {
        RosterUpload {
            file_name: Some("employees.csv".to_string()),
            content_type: Some("text/csv".to_string()),
            bytes: Some(format!("{HEADER}{body}").into_bytes()),
            delivery_mode: Some("individual".to_string()),
        }
    }

    #[tokio::test]
    async fn test_count_matches_complete_rows() {
        let (handler, store) = handler();
        let account_id = Uuid::new_v4();

        let receipt = handler
            .upload(
                account_id,
                csv_upload(
                    "Ada,ada@example.com,1 Main St,London,LDN,E1,UK,\n\
                     Bob,,2 Main St,London,LDN,E1,UK,\n\
                     Cy,cy@example.com,3 Main St,Leeds,WYK,LS1,UK,0113\n\
                     Di,di@example.com,4 Main St,,WYK,LS1,UK,\n",
                ),
            )
            .await
            .unwrap();

        assert_eq!(receipt.count, 2);
        assert_eq!(receipt.rows_read, 4);

        let stored = store.employee_list(account_id).await.unwrap().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.employees[1].full_name, "Cy");
    }

    #[tokio::test]
    async fn test_second_upload_replaces_first() {
        let (handler, store) = handler();
        let account_id = Uuid::new_v4();

        handler
            .upload(
                account_id,
                csv_upload(
                    "Ada,ada@example.com,1 Main St,London,LDN,E1,UK,\n\
                     Cy,cy@example.com,3 Main St,Leeds,WYK,LS1,UK,\n",
                ),
            )
            .await
            .unwrap();

        let mut second = csv_upload("Eve,eve@example.com,5 Main St,York,NYK,YO1,UK,\n");
        second.delivery_mode = Some("consolidated".to_string());
        handler.upload(account_id, second).await.unwrap();

        let stored = store.employee_list(account_id).await.unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.employees[0].email, "eve@example.com");
        assert_eq!(stored.delivery_mode, DeliveryMode::Consolidated);
    }

    #[tokio::test]
    async fn test_no_valid_rows_keeps_previous_list() {
        let (handler, store) = handler();
        let account_id = Uuid::new_v4();

        handler
            .upload(account_id, csv_upload("Ada,ada@example.com,1 Main St,London,LDN,E1,UK,\n"))
            .await
            .unwrap();

        let err = handler
            .upload(account_id, csv_upload("Bob,,2 Main St,London,LDN,E1,UK,\n"))
            .await
            .unwrap_err();

        assert!(matches!(err, EmployeeUploadError::NoValidRows));
        assert_eq!(store.employee_list(account_id).await.unwrap().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_and_delivery_mode() {
        let (handler, _) = handler();

        let err = handler.upload(Uuid::new_v4(), RosterUpload::default()).await.unwrap_err();
        assert!(matches!(err, EmployeeUploadError::MissingFile));

        let mut upload = csv_upload("Ada,ada@example.com,1 Main St,London,LDN,E1,UK,\n");
        upload.delivery_mode = None;
        let err = handler.upload(Uuid::new_v4(), upload).await.unwrap_err();
        assert!(matches!(err, EmployeeUploadError::MissingDeliveryMode));
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let (handler, _) = handler();
        let upload = RosterUpload {
            file_name: Some("employees.txt".to_string()),
            content_type: Some("text/plain".to_string()),
            bytes: Some(b"whatever".to_vec()),
            delivery_mode: Some("individual".to_string()),
        };

        let err = handler.upload(Uuid::new_v4(), upload).await.unwrap_err();
        assert!(matches!(err, EmployeeUploadError::UnsupportedFormat(_)));
    }
}
