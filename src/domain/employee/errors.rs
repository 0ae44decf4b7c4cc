use crate::store::StoreError;

// ============================================================================
// Employee Upload Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EmployeeUploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not read {format} file: {reason}")]
    Malformed { format: &'static str, reason: String },

    #[error("No valid employee records found in the uploaded file")]
    NoValidRows,

    #[error("deliveryMode is required")]
    MissingDeliveryMode,

    #[error("Invalid deliveryMode: {0}")]
    InvalidDeliveryMode(String),

    #[error("Upload exceeds the limit of {0} bytes")]
    TooLarge(usize),

    #[error(transparent)]
    Store(#[from] StoreError),
}
