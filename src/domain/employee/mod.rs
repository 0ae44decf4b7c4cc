// ============================================================================
// Employee Domain - corporate delivery rosters
// ============================================================================
//
// - Value objects (EmployeeRecord, EmployeeList, DeliveryMode)
// - Roster parsing (CSV / XLSX / JSON)
// - Errors (EmployeeUploadError)
// - Command handler (RosterCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod parser;
pub mod errors;
pub mod command_handler;

pub use value_objects::*;
pub use errors::*;
pub use command_handler::{RosterCommandHandler, RosterUpload};
