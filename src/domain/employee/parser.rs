use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx, XlsxError};
use serde_json::Value;

use super::errors::EmployeeUploadError;
use super::value_objects::EmployeeRecord;

// ============================================================================
// Roster Parsing - CSV / XLSX / JSON into EmployeeRecord candidates
// ============================================================================
//
// Every format is first flattened into rows keyed by normalized header
// names, so required-field filtering is shared.
//
// ============================================================================

type Row = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Csv,
    Xlsx,
    Json,
}

impl RosterFormat {
    /// Pick the format from the file extension, then the part's content type
    pub fn detect(filename: Option<&str>, content_type: Option<&str>) -> Result<Self, EmployeeUploadError> {
        let extension = filename
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => return Ok(RosterFormat::Csv),
            Some("xlsx") => return Ok(RosterFormat::Xlsx),
            Some("json") => return Ok(RosterFormat::Json),
            _ => {}
        }

        let essence = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_ascii_lowercase());

        match essence.as_deref() {
            Some("text/csv") | Some("application/csv") => Ok(RosterFormat::Csv),
            Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet") => {
                Ok(RosterFormat::Xlsx)
            }
            Some("application/json") => Ok(RosterFormat::Json),
            _ => Err(EmployeeUploadError::UnsupportedFormat(
                extension
                    .or(essence)
                    .unwrap_or_else(|| "unknown".to_string()),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RosterFormat::Csv => "CSV",
            RosterFormat::Xlsx => "XLSX",
            RosterFormat::Json => "JSON",
        }
    }
}

#[derive(Debug)]
pub struct ParsedRoster {
    /// Data rows seen in the file, valid or not
    pub rows_read: usize,
    /// Rows with every required field present
    pub employees: Vec<EmployeeRecord>,
}

pub fn parse_roster(format: RosterFormat, bytes: &[u8]) -> Result<ParsedRoster, EmployeeUploadError> {
    let rows = match format {
        RosterFormat::Csv => csv_rows(bytes),
        RosterFormat::Xlsx => xlsx_rows(bytes),
        RosterFormat::Json => json_rows(bytes),
    }
    .map_err(|reason| EmployeeUploadError::Malformed {
        format: format.as_str(),
        reason,
    })?;

    let employees: Vec<EmployeeRecord> = rows.iter().filter_map(EmployeeRecord::from_row).collect();

    tracing::debug!(
        format = format.as_str(),
        rows_read = rows.len(),
        valid = employees.len(),
        "Parsed employee roster"
    );

    Ok(ParsedRoster {
        rows_read: rows.len(),
        employees,
    })
}

/// `Full Name`, `full_name` and `fullName` all become `fullname`
fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn zip_row(headers: &[String], cells: impl Iterator<Item = String>) -> Row {
    headers
        .iter()
        .zip(cells)
        .filter(|(h, _)| !h.is_empty())
        .map(|(h, v)| (h.clone(), v))
        .collect()
}

fn csv_rows(bytes: &[u8]) -> Result<Vec<Row>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        rows.push(zip_row(&headers, record.iter().map(str::to_string)));
    }

    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        // Postal codes and phone numbers come back as floats
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn xlsx_rows(bytes: &[u8]) -> Result<Vec<Row>, String> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).map_err(|e: XlsxError| e.to_string())?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no worksheets".to_string())?
        .map_err(|e| e.to_string())?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(header_row) => header_row.iter().map(|c| normalize_header(&cell_text(c))).collect(),
        None => return Ok(Vec::new()),
    };

    Ok(sheet_rows
        .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|cells| zip_row(&headers, cells.iter().map(cell_text)))
        .collect())
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn json_rows(bytes: &[u8]) -> Result<Vec<Row>, String> {
    let document: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("employees") {
            Some(Value::Array(entries)) => entries,
            _ => return Err("expected an array or an object with an `employees` array".to_string()),
        },
        _ => return Err("expected an array or an object with an `employees` array".to_string()),
    };

    Ok(entries
        .iter()
        .map(|entry| match entry {
            Value::Object(fields) => fields
                .iter()
                .map(|(k, v)| (normalize_header(k), json_text(v)))
                .collect(),
            _ => Row::new(),
        })
        .collect())
}

// ============================================================================
// Unit Tests
// ============================================================================
