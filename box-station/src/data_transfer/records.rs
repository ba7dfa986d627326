//! 打印记录导出

use super::{TransferResult, write_header};
use rust_xlsxwriter::Workbook;
use shared::models::RecordRow;
use std::path::Path;
use tracing::info;

pub const RECORD_HEADERS: [&str; 8] = [
    "SN", "箱号", "生产日期", "打印时间", "名称", "规格", "69码", "SKU",
];

pub fn export_records(path: &Path, rows: &[RecordRow]) -> TransferResult<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("records")?;
    write_header(sheet, &RECORD_HEADERS)?;

    for (i, r) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        let cells = [
            &r.serial_number,
            &r.box_id,
            &r.production_date,
            &r.printed_at,
            &r.product_name,
            &r.spec,
            &r.barcode,
            &r.sku,
        ];
        for (col, value) in cells.into_iter().enumerate() {
            sheet.write_string(row, col as u16, value)?;
        }
    }

    workbook.save(path)?;
    info!(path = %path.display(), count = rows.len(), "Print records exported");
    Ok(())
}
