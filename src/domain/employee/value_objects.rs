use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::EmployeeUploadError;

// ============================================================================
// Employee Value Objects
// ============================================================================

/// One delivery recipient from an uploaded roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRecord {
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl EmployeeRecord {
    /// Build a record from a row keyed by normalized header names.
    /// Returns `None` when a required field is missing or blank.
    pub fn from_row(row: &HashMap<String, String>) -> Option<Self> {
        let field = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| row.get(*k))
                .map(|v| v.trim())
                .find(|v| !v.is_empty())
                .map(str::to_string)
        };

        Some(Self {
            full_name: field(&["fullname", "name", "employeename"])?,
            email: field(&["email", "emailaddress"])?,
            address: field(&["address", "streetaddress", "street"])?,
            city: field(&["city"])?,
            state: field(&["state", "province", "region"])?,
            postal_code: field(&["postalcode", "zipcode", "zip", "pincode"])?,
            country: field(&["country"])?,
            phone: field(&["phone", "phonenumber", "mobile"]),
        })
    }
}

/// How a corporate batch is shipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Each order ships to the employee's own address
    Individual,
    /// Orders are shipped together and handed out by the company
    Consolidated,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Individual => "individual",
            DeliveryMode::Consolidated => "consolidated",
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryMode {
    type Err = EmployeeUploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(DeliveryMode::Individual),
            "consolidated" => Ok(DeliveryMode::Consolidated),
            "" => Err(EmployeeUploadError::MissingDeliveryMode),
            other => Err(EmployeeUploadError::InvalidDeliveryMode(other.to_string())),
        }
    }
}

/// The active roster of a corporate account. At most one per account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeList {
    pub account_id: Uuid,
    pub delivery_mode: DeliveryMode,
    pub employees: Vec<EmployeeRecord>,
    pub uploaded_at: DateTime<Utc>,
}

impl EmployeeList {
    pub fn new(account_id: Uuid, delivery_mode: DeliveryMode, employees: Vec<EmployeeRecord>) -> Self {
        Self {
            account_id,
            delivery_mode,
            employees,
            uploaded_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}
