//! Print Record Model

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One printed serial (打印记录), immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PrintRecord {
    pub id: i64,
    pub product_id: i64,
    pub serial_number: String,
    pub box_id: String,
    /// YYYY-MM-DD, chosen by the operator
    pub production_date: String,
    /// YYYY-MM-DD HH:MM:SS, local time at commit
    pub printed_at: String,
}

/// Insert payload
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrintRecord {
    pub product_id: i64,
    pub serial_number: String,
    pub box_id: String,
    pub production_date: NaiveDate,
    pub printed_at: NaiveDateTime,
}

/// Ledger row joined with product attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RecordRow {
    pub serial_number: String,
    pub box_id: String,
    pub production_date: String,
    pub printed_at: String,
    pub product_name: String,
    pub spec: String,
    pub barcode: String,
    pub sku: String,
}

/// Ledger query filter; both filters are substring matches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub serial: Option<String>,
    pub barcode: Option<String>,
}

impl RecordFilter {
    pub fn serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }
}
