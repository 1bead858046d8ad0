//! Same-day re-entry blacklist.
//!
//! Entries expire by date comparison; nothing is ever deleted.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};

/// Records a stop-out for `instrument_id` on `date`. Idempotent.
///
/// # Errors
/// Returns an error if the insert fails.
pub async fn add(
    pool: &PgPool,
    instrument_id: &str,
    date: NaiveDate,
    reason: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO blacklist (instrument_id, blocked_on, reason)
        VALUES ($1, $2, $3)
        ON CONFLICT (instrument_id, blocked_on) DO NOTHING
        ",
    )
    .bind(instrument_id)
    .bind(date)
    .bind(reason)
    .execute(pool)
    .await?;
    Ok(())
}

/// True if `instrument_id` stopped out on `date`.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn is_blacklisted(pool: &PgPool, instrument_id: &str, date: NaiveDate) -> Result<bool> {
    let row = sqlx::query(
        r"
        SELECT COUNT(*) AS n
        FROM blacklist
        WHERE instrument_id = $1 AND blocked_on = $2
        ",
    )
    .bind(instrument_id)
    .bind(date)
    .fetch_one(pool)
    .await?;
    let n: i64 = row.get("n");
    Ok(n > 0)
}
