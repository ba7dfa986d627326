//! Settings Repository (key/value)
//!
//! Holds the box-numbering rule and the box sequence counter.

use super::{RepoError, RepoResult};
use sqlx::SqlitePool;

pub const BOX_RULE_KEY: &str = "box_rule";
pub const BOX_SEQ_KEY: &str = "box_seq";

pub const DEFAULT_BOX_RULE: &str = "BOX-{YYYY}{MM}{DD}-{SEQ:0000}";

pub async fn get(pool: &SqlitePool, key: &str) -> RepoResult<Option<String>> {
    let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Current box rule, falling back to the default when unset or blank
pub async fn box_rule(pool: &SqlitePool) -> RepoResult<String> {
    Ok(get(pool, BOX_RULE_KEY)
        .await?
        .filter(|rule| !rule.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BOX_RULE.to_string()))
}

pub async fn set_box_rule(pool: &SqlitePool, rule: &str) -> RepoResult<()> {
    if rule.trim().is_empty() {
        return Err(RepoError::Validation("Box rule must not be empty".into()));
    }
    set(pool, BOX_RULE_KEY, rule.trim()).await
}

/// Last sequence value handed out (0 before the first box)
pub async fn current_sequence(pool: &SqlitePool) -> RepoResult<i64> {
    let value = sqlx::query_scalar::<_, i64>(
        "SELECT CAST(value AS INTEGER) FROM settings WHERE key = ?",
    )
    .bind(BOX_SEQ_KEY)
    .fetch_optional(pool)
    .await?;
    Ok(value.unwrap_or(0))
}

/// Atomically increment the box sequence and return the new value.
///
/// A single UPDATE ... RETURNING statement, so concurrent callers (other
/// connections or other stations on the same file) never observe the same value.
pub async fn next_sequence(pool: &SqlitePool) -> RepoResult<i64> {
    sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, '0')")
        .bind(BOX_SEQ_KEY)
        .execute(pool)
        .await?;

    let next = sqlx::query_scalar::<_, i64>(
        "UPDATE settings SET value = CAST(value AS INTEGER) + 1 WHERE key = ? RETURNING CAST(value AS INTEGER)",
    )
    .bind(BOX_SEQ_KEY)
    .fetch_one(pool)
    .await?;
    Ok(next)
}
