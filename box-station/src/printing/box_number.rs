//! Box identifier generation
//!
//! A rule string with placeholders is expanded against a date and the global
//! box sequence:
//!
//! | Placeholder | Expands to |
//! |-------------|------------|
//! | `{YYYY}` | 4-digit year |
//! | `{MM}` | 2-digit month |
//! | `{DD}` | 2-digit day |
//! | `{SEQ:0000}` | sequence, zero-padded to the number of zeros (minimum width) |
//! | `{SEQ}` | sequence, unpadded |
//!
//! The sequence is global and never resets; past 9999 `{SEQ:0000}` simply
//! produces 5 digits.

use crate::db::repository::{RepoResult, settings};
use chrono::{Datelike, NaiveDate};
use sqlx::SqlitePool;
use tracing::info;

/// A freshly allocated box identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxNumber {
    pub id: String,
    pub sequence: i64,
}

/// Expand `rule` for `date` and `sequence`
pub fn format_box_id(rule: &str, date: NaiveDate, sequence: i64) -> String {
    let expanded = rule
        .replace("{YYYY}", &format!("{:04}", date.year()))
        .replace("{MM}", &format!("{:02}", date.month()))
        .replace("{DD}", &format!("{:02}", date.day()));

    let mut out = String::with_capacity(expanded.len() + 8);
    let mut rest = expanded.as_str();

    while let Some(start) = rest.find("{SEQ") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        match parse_seq_token(tail) {
            Some((width, len)) => {
                out.push_str(&format!("{:0width$}", sequence, width = width));
                rest = &tail[len..];
            }
            None => {
                // Not a sequence token, keep it literally
                out.push_str("{SEQ");
                rest = &tail[4..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parse `{SEQ}` or `{SEQ:000}` at the start of `s`; returns (pad width, token length)
fn parse_seq_token(s: &str) -> Option<(usize, usize)> {
    let body = s.strip_prefix("{SEQ")?;
    if body.starts_with('}') {
        return Some((0, 5));
    }
    let pad = body.strip_prefix(':')?;
    let end = pad.find('}')?;
    let zeros = &pad[..end];
    if zeros.is_empty() || !zeros.chars().all(|c| c == '0') {
        return None;
    }
    Some((zeros.len(), 4 + 1 + end + 1))
}

/// Allocate the next box identifier: increment the persisted sequence and
/// expand the stored rule for `date`.
pub async fn next_box_id(pool: &SqlitePool, date: NaiveDate) -> RepoResult<BoxNumber> {
    let rule = settings::box_rule(pool).await?;
    let sequence = settings::next_sequence(pool).await?;
    let id = format_box_id(&rule, date, sequence);

    info!(box_id = %id, sequence, "Box number allocated");
    Ok(BoxNumber { id, sequence })
}

/// The identifier the next allocation would produce, without touching the
/// sequence
pub async fn peek_box_id(pool: &SqlitePool, date: NaiveDate) -> RepoResult<BoxNumber> {
    let rule = settings::box_rule(pool).await?;
    let sequence = settings::current_sequence(pool).await? + 1;
    Ok(BoxNumber {
        id: format_box_id(&rule, date, sequence),
        sequence,
    })
}
