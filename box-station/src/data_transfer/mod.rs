//! Spreadsheet import/export (xlsx)
//!
//! - [`catalog`] - 产品表导入/导出, fixed column order
//! - [`records`] - 打印记录导出

pub mod catalog;
pub mod records;

pub use catalog::{PRODUCT_HEADERS, export_products, import_products};
pub use records::{RECORD_HEADERS, export_records};

use calamine::Data;
use rust_xlsxwriter::{Format, Worksheet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("XLSX read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

pub type TransferResult<T> = Result<T, TransferError>;

/// Bold header row
fn write_header(sheet: &mut Worksheet, headers: &[&str]) -> TransferResult<()> {
    let bold = Format::new().set_bold();
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    Ok(())
}

/// Cell as text; whole floats lose the `.0` so numeric barcodes survive
fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Some(Data::Int(i)) => i.to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

fn cell_f64(cell: Option<&Data>) -> Option<f64> {
    match cell {
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(None), "");
        assert_eq!(cell_text(Some(&Data::Empty)), "");
        assert_eq!(cell_text(Some(&Data::String(" 1.7L ".into()))), "1.7L");
        assert_eq!(cell_text(Some(&Data::Float(6901234567892.0))), "6901234567892");
        assert_eq!(cell_text(Some(&Data::Float(7.5))), "7.5");
        assert_eq!(cell_text(Some(&Data::Int(12))), "12");
    }

    #[test]
    fn test_cell_f64() {
        assert_eq!(cell_f64(Some(&Data::Float(7.5))), Some(7.5));
        assert_eq!(cell_f64(Some(&Data::Int(6))), Some(6.0));
        assert_eq!(cell_f64(Some(&Data::String(" 6 ".into()))), Some(6.0));
        assert_eq!(cell_f64(Some(&Data::String("six".into()))), None);
        assert_eq!(cell_f64(Some(&Data::Empty)), None);
    }
}
