//! Print Record Repository (ledger)
//!
//! Append-only: there is no update or delete path. Serial uniqueness is
//! enforced by the UNIQUE constraint on `serial_number`.

use super::{RepoError, RepoResult, is_unique_violation};
use shared::models::{NewPrintRecord, PrintRecord, RecordFilter, RecordRow};
use shared::util::{format_date, format_datetime};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

/// Append one record; fails with `Duplicate(serial)` if the serial is already recorded
pub async fn insert(pool: &SqlitePool, record: &NewPrintRecord) -> RepoResult<PrintRecord> {
    let id = insert_with(pool, record).await?;
    get(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to read print record after insert".into()))
}

/// Append all records of one box in a single transaction.
///
/// On the first duplicate serial the transaction is rolled back and nothing
/// from this batch is kept.
pub async fn insert_batch(pool: &SqlitePool, records: &[NewPrintRecord]) -> RepoResult<usize> {
    let mut tx = pool.begin().await?;
    for record in records {
        insert_with(&mut *tx, record).await?;
    }
    tx.commit().await?;
    Ok(records.len())
}

async fn insert_with<'e, E>(executor: E, record: &NewPrintRecord) -> RepoResult<i64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query_scalar::<_, i64>(
        "INSERT INTO print_record (product_id, serial_number, box_id, production_date, printed_at) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
    )
    .bind(record.product_id)
    .bind(&record.serial_number)
    .bind(&record.box_id)
    .bind(format_date(record.production_date))
    .bind(format_datetime(record.printed_at))
    .fetch_one(executor)
    .await;

    match result {
        Ok(id) => Ok(id),
        Err(e) if is_unique_violation(&e) => Err(RepoError::Duplicate(record.serial_number.clone())),
        Err(e) => Err(e.into()),
    }
}

pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<Option<PrintRecord>> {
    let record = sqlx::query_as::<_, PrintRecord>(
        "SELECT id, product_id, serial_number, box_id, production_date, printed_at FROM print_record WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}

/// Point lookup
pub async fn exists(pool: &SqlitePool, serial: &str) -> RepoResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM print_record WHERE serial_number = ?")
        .bind(serial)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Serials from `serials` that are already in the ledger, in input order
pub async fn find_existing(pool: &SqlitePool, serials: &[String]) -> RepoResult<Vec<String>> {
    if serials.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT serial_number FROM print_record WHERE serial_number IN (");
    let mut separated = qb.separated(", ");
    for serial in serials {
        separated.push_bind(serial);
    }
    separated.push_unseparated(")");

    let found: Vec<String> = qb.build_query_scalar().fetch_all(pool).await?;
    Ok(serials
        .iter()
        .filter(|s| found.contains(s))
        .cloned()
        .collect())
}

/// All records of one box
pub async fn list_by_box(pool: &SqlitePool, box_id: &str) -> RepoResult<Vec<PrintRecord>> {
    let records = sqlx::query_as::<_, PrintRecord>(
        "SELECT id, product_id, serial_number, box_id, production_date, printed_at FROM print_record WHERE box_id = ? ORDER BY id",
    )
    .bind(box_id)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM print_record")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Ledger rows joined with product attributes.
///
/// Filters are substring matches on serial and product barcode. Rows come back
/// in storage order; callers needing another order sort explicitly.
pub async fn query(pool: &SqlitePool, filter: &RecordFilter) -> RepoResult<Vec<RecordRow>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT r.serial_number, r.box_id, r.production_date, r.printed_at, p.name AS product_name, p.spec, p.barcode, p.sku FROM print_record r JOIN product p ON r.product_id = p.id WHERE 1 = 1",
    );

    if let Some(serial) = filter.serial.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND instr(r.serial_number, ").push_bind(serial).push(") > 0");
    }
    if let Some(barcode) = filter.barcode.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND instr(p.barcode, ").push_bind(barcode).push(") > 0");
    }
    qb.push(" ORDER BY r.id");

    let rows = qb.build_query_as::<RecordRow>().fetch_all(pool).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::product;
    use chrono::NaiveDate;
    use shared::models::ProductInput;

    async fn setup() -> (tempfile::TempDir, DbService, i64, i64) {
        let dir = tempfile::tempdir().unwrap();
        let db = DbService::new(&dir.path().join("test.db")).await.unwrap();
        let kettle = product::upsert(
            &db.pool,
            &ProductInput {
                name: "Kettle".into(),
                barcode: "6901110".into(),
                sku: "KT".into(),
                case_quantity: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let toaster = product::upsert(
            &db.pool,
            &ProductInput {
                name: "Toaster".into(),
                barcode: "6902220".into(),
                case_quantity: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (dir, db, kettle.id, toaster.id)
    }

    fn record(product_id: i64, serial: &str, box_id: &str) -> NewPrintRecord {
        NewPrintRecord {
            product_id,
            serial_number: serial.into(),
            box_id: box_id.into(),
            production_date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            printed_at: NaiveDate::from_ymd_opt(2024, 3, 6)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_exists() {
        let (_dir, db, kettle, _) = setup().await;

        let saved = insert(&db.pool, &record(kettle, "SN1", "BOX-1")).await.unwrap();
        assert_eq!(saved.production_date, "2024-03-05");
        assert_eq!(saved.printed_at, "2024-03-06 09:30:00");
        assert!(exists(&db.pool, "SN1").await.unwrap());
        assert!(!exists(&db.pool, "SN2").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_duplicate() {
        let (_dir, db, kettle, _) = setup().await;
        insert(&db.pool, &record(kettle, "SN1", "BOX-1")).await.unwrap();

        let err = insert(&db.pool, &record(kettle, "SN1", "BOX-2")).await.unwrap_err();
        assert!(matches!(err, RepoError::Duplicate(s) if s == "SN1"));
    }

    #[tokio::test]
    async fn test_insert_batch_is_all_or_nothing() {
        let (_dir, db, kettle, _) = setup().await;
        insert(&db.pool, &record(kettle, "SN2", "BOX-1")).await.unwrap();

        let err = insert_batch(
            &db.pool,
            &[record(kettle, "SN1", "BOX-2"), record(kettle, "SN2", "BOX-2")],
        )
        .await
        .unwrap_err();

        assert!(matches!(err, RepoError::Duplicate(s) if s == "SN2"));
        assert!(!exists(&db.pool, "SN1").await.unwrap());
        assert_eq!(count(&db.pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_existing_keeps_input_order() {
        let (_dir, db, kettle, _) = setup().await;
        insert_batch(
            &db.pool,
            &[record(kettle, "SN1", "BOX-1"), record(kettle, "SN3", "BOX-1")],
        )
        .await
        .unwrap();

        let serials = vec!["SN3".to_string(), "SN2".to_string(), "SN1".to_string()];
        let found = find_existing(&db.pool, &serials).await.unwrap();
        assert_eq!(found, vec!["SN3", "SN1"]);
        assert!(find_existing(&db.pool, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_filters() {
        let (_dir, db, kettle, toaster) = setup().await;
        insert_batch(
            &db.pool,
            &[
                record(kettle, "A-100", "BOX-1"),
                record(kettle, "A-101", "BOX-1"),
                record(toaster, "B-100", "BOX-2"),
                record(toaster, "B-101", "BOX-2"),
            ],
        )
        .await
        .unwrap();

        let all = query(&db.pool, &RecordFilter::default()).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].product_name, "Kettle");
        assert_eq!(all[0].sku, "KT");

        let by_serial = query(&db.pool, &RecordFilter::default().serial("100")).await.unwrap();
        let serials: Vec<_> = by_serial.iter().map(|r| r.serial_number.as_str()).collect();
        assert_eq!(serials, vec!["A-100", "B-100"]);

        let by_both = query(
            &db.pool,
            &RecordFilter::default().serial("100").barcode("222"),
        )
        .await
        .unwrap();
        assert_eq!(by_both.len(), 1);
        assert_eq!(by_both[0].serial_number, "B-100");
        assert_eq!(by_both[0].box_id, "BOX-2");

        assert_eq!(list_by_box(&db.pool, "BOX-1").await.unwrap().len(), 2);
    }
}
