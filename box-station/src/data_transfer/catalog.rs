//! 产品表 xlsx
//!
//! Columns, in order: 名称, 规格, 型号, 颜色, SKU, 69码, 数量, 重量, 模板.
//! Import treats the first row as a header and skips rows without a name.

use super::{TransferError, TransferResult, cell_f64, cell_text, write_header};
use calamine::{Data, Reader, Xlsx, open_workbook};
use rust_xlsxwriter::Workbook;
use shared::models::{Product, ProductInput};
use std::path::Path;
use tracing::{info, warn};

pub const PRODUCT_HEADERS: [&str; 9] = [
    "名称", "规格", "型号", "颜色", "SKU", "69码", "数量", "重量", "模板",
];

/// Read products from the first worksheet
pub fn import_products(path: &Path) -> TransferResult<Vec<ProductInput>> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TransferError::InvalidFormat("Workbook contains no sheets".to_string()))?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let mut products = Vec::new();
    for (idx, row) in range.rows().enumerate().skip(1) {
        let Some(product) = parse_row(row) else {
            continue;
        };
        if product.case_quantity <= 0 {
            warn!(row = idx + 1, name = %product.name, "Imported product has no usable quantity");
        }
        products.push(product);
    }

    info!(path = %path.display(), count = products.len(), "Products imported from spreadsheet");
    Ok(products)
}

fn parse_row(row: &[Data]) -> Option<ProductInput> {
    let name = cell_text(row.first());
    if name.is_empty() {
        return None;
    }
    Some(ProductInput {
        name,
        spec: cell_text(row.get(1)),
        model: cell_text(row.get(2)),
        color: cell_text(row.get(3)),
        sku: cell_text(row.get(4)),
        barcode: cell_text(row.get(5)),
        case_quantity: cell_f64(row.get(6)).map(|q| q.round() as i64).unwrap_or(0),
        weight: cell_f64(row.get(7)).unwrap_or(0.0),
        template: cell_text(row.get(8)),
    })
}

/// Write the catalog with a header row
pub fn export_products(path: &Path, products: &[Product]) -> TransferResult<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("products")?;
    write_header(sheet, &PRODUCT_HEADERS)?;

    for (i, p) in products.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &p.name)?;
        sheet.write_string(row, 1, &p.spec)?;
        sheet.write_string(row, 2, &p.model)?;
        sheet.write_string(row, 3, &p.color)?;
        sheet.write_string(row, 4, &p.sku)?;
        // 69 码保持文本, 避免科学计数法
        sheet.write_string(row, 5, &p.barcode)?;
        sheet.write_number(row, 6, p.case_quantity as f64)?;
        sheet.write_number(row, 7, p.weight)?;
        sheet.write_string(row, 8, &p.template)?;
    }

    workbook.save(path)?;
    info!(path = %path.display(), count = products.len(), "Products exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, name: &str, barcode: &str) -> Product {
        Product {
            id,
            name: name.into(),
            spec: "1.7L".into(),
            model: "K-17".into(),
            color: "红".into(),
            sku: format!("SKU-{id}"),
            barcode: barcode.into(),
            case_quantity: 6,
            weight: 7.5,
            template: "carton".into(),
        }
    }

    #[test]
    fn test_export_then_import_keeps_products() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.xlsx");
        let products = vec![
            product(1, "Kettle", "6901234567892"),
            product(2, "Toaster", "0690000000001"),
        ];

        export_products(&path, &products).unwrap();
        let imported = import_products(&path).unwrap();

        let expected: Vec<ProductInput> = products.into_iter().map(ProductInput::from).collect();
        assert_eq!(imported, expected);
    }

    #[test]
    fn test_import_skips_header_and_nameless_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, title) in PRODUCT_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *title).unwrap();
        }
        sheet.write_string(1, 0, "Kettle").unwrap();
        sheet.write_number(1, 5, 6901234567892.0).unwrap();
        sheet.write_string(1, 6, "12").unwrap();
        sheet.write_string(2, 1, "orphan spec").unwrap();
        sheet.write_string(3, 0, "Toaster").unwrap();
        sheet.write_number(3, 6, 4.0).unwrap();
        sheet.write_number(3, 7, 3.25).unwrap();
        workbook.save(&path).unwrap();

        let imported = import_products(&path).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].name, "Kettle");
        assert_eq!(imported[0].barcode, "6901234567892");
        assert_eq!(imported[0].case_quantity, 12);
        assert_eq!(imported[1].name, "Toaster");
        assert_eq!(imported[1].case_quantity, 4);
        assert_eq!(imported[1].weight, 3.25);
        assert_eq!(imported[1].template, "");
    }

    #[test]
    fn test_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(import_products(&dir.path().join("nope.xlsx")).is_err());
    }
}
