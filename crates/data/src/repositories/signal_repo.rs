//! Signal record persistence.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};

use crate::models::SignalRecord;

/// Inserts a signal idempotently on (channel_id, message_id).
///
/// Returns the new row id, or `None` if the message was already stored.
///
/// # Errors
/// Returns an error if the insert fails.
pub async fn insert_signal(
    pool: &PgPool,
    channel_id: i64,
    message_id: i64,
    raw_text: &str,
    received_at: DateTime<Utc>,
) -> Result<Option<i64>> {
    let row = sqlx::query(
        r"
        INSERT INTO signals (channel_id, message_id, raw_text, received_at)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (channel_id, message_id) DO NOTHING
        RETURNING id
        ",
    )
    .bind(channel_id)
    .bind(message_id)
    .bind(raw_text)
    .bind(received_at)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.get("id")))
}

/// Unprocessed signals, oldest first, so the first-arriving signal wins a
/// contested instrument.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn fetch_unprocessed(pool: &PgPool, limit: i64) -> Result<Vec<SignalRecord>> {
    let rows = sqlx::query(
        r"
        SELECT id, channel_id, message_id, raw_text, received_at,
               processed, outcome, parsed_json
        FROM signals
        WHERE NOT processed
        ORDER BY received_at ASC, id ASC
        LIMIT $1
        ",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let mut signals = Vec::with_capacity(rows.len());
    for row in rows {
        signals.push(SignalRecord {
            id: row.get("id"),
            channel_id: row.get("channel_id"),
            message_id: row.get("message_id"),
            raw_text: row.get("raw_text"),
            received_at: row.get("received_at"),
            processed: row.get("processed"),
            outcome: row.get("outcome"),
            parsed_json: row.get("parsed_json"),
        });
    }
    Ok(signals)
}

/// Marks a signal terminally handled with its outcome marker and, when the
/// message was accepted, the parsed intent JSON.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn mark_processed(
    pool: &PgPool,
    id: i64,
    outcome: &str,
    parsed_json: Option<&JsonValue>,
) -> Result<()> {
    sqlx::query(
        r"
        UPDATE signals
        SET processed = TRUE, outcome = $2, parsed_json = $3
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(outcome)
    .bind(parsed_json)
    .execute(pool)
    .await?;
    Ok(())
}
