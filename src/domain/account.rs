use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Account - the caller behind a bearer token
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// Bulk/business buyer: tiered pricing and bulk ordering
    #[serde(default)]
    pub is_corporate: bool,
    pub api_token: String,
}

impl Account {
    pub fn new(name: impl Into<String>, email: impl Into<String>, is_corporate: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            is_corporate,
            api_token: Uuid::new_v4().simple().to_string(),
        }
    }
}
