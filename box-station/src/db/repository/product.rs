//! Product Repository (catalog)

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductInput};
use sqlx::{SqliteExecutor, SqlitePool};

const PRODUCT_SELECT: &str = "SELECT id, name, spec, model, color, sku, barcode, case_quantity, weight, template FROM product";

/// Outcome of a bulk upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub upserted: usize,
    /// Rows skipped for an empty name
    pub skipped: usize,
}

pub async fn list(pool: &SqlitePool) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} ORDER BY id"))
        .fetch_all(pool)
        .await?;
    Ok(products)
}

pub async fn get(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

pub async fn find_by_name(pool: &SqlitePool, name: &str) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE name = ?"))
        .bind(name.trim())
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

/// Products whose barcode contains `fragment` (empty fragment lists all)
pub async fn search_by_barcode(pool: &SqlitePool, fragment: &str) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!(
        "{PRODUCT_SELECT} WHERE instr(barcode, ?) > 0 OR ? = '' ORDER BY id"
    ))
    .bind(fragment.trim())
    .bind(fragment.trim())
    .fetch_all(pool)
    .await?;
    Ok(products)
}

/// Insert a product, or replace the attributes of the product with the same name
pub async fn upsert(pool: &SqlitePool, data: &ProductInput) -> RepoResult<Product> {
    if data.name.trim().is_empty() {
        return Err(RepoError::Validation("Product name must not be empty".into()));
    }

    let id = upsert_with(pool, data).await?;
    get(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to read product after upsert".into()))
}

/// Upsert many rows in one transaction, skipping rows with an empty name
pub async fn upsert_bulk(pool: &SqlitePool, rows: &[ProductInput]) -> RepoResult<UpsertSummary> {
    let mut summary = UpsertSummary::default();
    let mut tx = pool.begin().await?;

    for row in rows {
        if row.name.trim().is_empty() {
            summary.skipped += 1;
            continue;
        }
        upsert_with(&mut *tx, row).await?;
        summary.upserted += 1;
    }

    tx.commit().await?;
    tracing::info!(
        upserted = summary.upserted,
        skipped = summary.skipped,
        "Product catalog updated"
    );
    Ok(summary)
}

async fn upsert_with<'e, E>(executor: E, data: &ProductInput) -> RepoResult<i64>
where
    E: SqliteExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO product (name, spec, model, color, sku, barcode, case_quantity, weight, template) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) ON CONFLICT(name) DO UPDATE SET spec = excluded.spec, model = excluded.model, color = excluded.color, sku = excluded.sku, barcode = excluded.barcode, case_quantity = excluded.case_quantity, weight = excluded.weight, template = excluded.template RETURNING id",
    )
    .bind(data.name.trim())
    .bind(data.spec.trim())
    .bind(data.model.trim())
    .bind(data.color.trim())
    .bind(data.sku.trim())
    .bind(data.barcode.trim())
    .bind(data.case_quantity)
    .bind(data.weight)
    .bind(data.template.trim())
    .fetch_one(executor)
    .await?;
    Ok(id)
}
