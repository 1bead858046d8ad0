//! Order record persistence.
//!
//! One row per broker order attempt. Rows are never deleted; only status
//! transitions mutate them.

use anyhow::Result;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

use crate::models::{OrderRecord, OrderRole, OrderStatus};

/// Inserts a PENDING order row and returns its id.
///
/// # Errors
/// Returns an error if the insert fails.
#[allow(clippy::too_many_arguments)]
pub async fn insert_pending(
    pool: &PgPool,
    signal_id: Option<i64>,
    instrument_id: &str,
    exchange: &str,
    role: OrderRole,
    side: &str,
    quantity: i64,
    price: Option<Decimal>,
    trigger_price: Option<Decimal>,
) -> Result<i64> {
    let row = sqlx::query(
        r"
        INSERT INTO orders
            (signal_id, instrument_id, exchange, role, side, quantity,
             price, trigger_price, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'PENDING')
        RETURNING id
        ",
    )
    .bind(signal_id)
    .bind(instrument_id)
    .bind(exchange)
    .bind(role.as_str())
    .bind(side)
    .bind(quantity)
    .bind(price)
    .bind(trigger_price)
    .fetch_one(pool)
    .await?;
    Ok(row.get("id"))
}

/// Records the broker-assigned id and moves the row to PLACED.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn mark_placed(pool: &PgPool, id: i64, broker_order_id: &str) -> Result<()> {
    sqlx::query(
        r"
        UPDATE orders
        SET status = 'PLACED', broker_order_id = $2, updated_at = NOW()
        WHERE id = $1
        ",
    )
    .bind(id)
    .bind(broker_order_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Applies a terminal or fill status transition.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn mark_status(pool: &PgPool, id: i64, status: OrderStatus) -> Result<()> {
    sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
    Ok(())
}

/// Updates the trigger price of a resting stop row after a trail.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn update_trigger(pool: &PgPool, id: i64, trigger: Decimal) -> Result<()> {
    sqlx::query("UPDATE orders SET trigger_price = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(trigger)
        .execute(pool)
        .await?;
    Ok(())
}

/// True if an entry order for this instrument is still in flight
/// (PENDING or PLACED). Catches the crash window between "order placed"
/// and "signal marked processed".
///
/// # Errors
/// Returns an error if the query fails.
pub async fn has_open_entry(pool: &PgPool, instrument_id: &str) -> Result<bool> {
    let row = sqlx::query(
        r"
        SELECT COUNT(*) AS n
        FROM orders
        WHERE instrument_id = $1
          AND role = 'ENTRY'
          AND status IN ('PENDING', 'PLACED')
        ",
    )
    .bind(instrument_id)
    .fetch_one(pool)
    .await?;
    let n: i64 = row.get("n");
    Ok(n > 0)
}

/// Cancels PENDING rows older than `cutoff` that never got a broker order
/// id. A crash between the insert and the placement result would otherwise
/// leave the row in flight forever and block the instrument through
/// `has_open_entry`. Returns the number of rows aged out.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn expire_stale_pending(
    pool: &PgPool,
    cutoff: chrono::DateTime<chrono::Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r"
        UPDATE orders
        SET status = 'CANCELLED', updated_at = NOW()
        WHERE status = 'PENDING'
          AND broker_order_id IS NULL
          AND created_at < $1
        ",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// All PLACED orders with the given role, oldest first. The lifecycle
/// loop walks these to sync broker fill state back into the store.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn placed_orders(pool: &PgPool, role: OrderRole) -> Result<Vec<OrderRecord>> {
    let rows = sqlx::query(
        r"
        SELECT id, signal_id, instrument_id, exchange, role, side, quantity,
               price, trigger_price, broker_order_id, status, created_at
        FROM orders
        WHERE role = $1 AND status = 'PLACED'
        ORDER BY created_at ASC
        ",
    )
    .bind(role.as_str())
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(record_from_row).collect())
}

/// The most recent entry order row for an instrument, if any.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn latest_entry(pool: &PgPool, instrument_id: &str) -> Result<Option<OrderRecord>> {
    let row = sqlx::query(
        r"
        SELECT id, signal_id, instrument_id, exchange, role, side, quantity,
               price, trigger_price, broker_order_id, status, created_at
        FROM orders
        WHERE instrument_id = $1 AND role = 'ENTRY'
        ORDER BY created_at DESC
        LIMIT 1
        ",
    )
    .bind(instrument_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(record_from_row))
}

/// The resting stop order row for an instrument, if one is PLACED.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn active_stop(pool: &PgPool, instrument_id: &str) -> Result<Option<OrderRecord>> {
    let row = sqlx::query(
        r"
        SELECT id, signal_id, instrument_id, exchange, role, side, quantity,
               price, trigger_price, broker_order_id, status, created_at
        FROM orders
        WHERE instrument_id = $1 AND role = 'STOP' AND status = 'PLACED'
        ORDER BY created_at DESC
        LIMIT 1
        ",
    )
    .bind(instrument_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(record_from_row))
}

/// The stop price declared in the signal that opened this instrument,
/// joined through the latest entry order row.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn declared_stop(pool: &PgPool, instrument_id: &str) -> Result<Option<Decimal>> {
    let row = sqlx::query(
        r"
        SELECT s.parsed_json->>'stop_price' AS stop_price
        FROM orders o
        JOIN signals s ON s.id = o.signal_id
        WHERE o.instrument_id = $1 AND o.role = 'ENTRY'
        ORDER BY o.created_at DESC
        LIMIT 1
        ",
    )
    .bind(instrument_id)
    .fetch_optional(pool)
    .await?;

    Ok(row
        .and_then(|r| r.get::<Option<String>, _>("stop_price"))
        .and_then(|s| s.parse::<Decimal>().ok()))
}

fn record_from_row(row: sqlx::postgres::PgRow) -> OrderRecord {
    let role: String = row.get("role");
    let status: String = row.get("status");
    OrderRecord {
        id: row.get("id"),
        signal_id: row.get("signal_id"),
        instrument_id: row.get("instrument_id"),
        exchange: row.get("exchange"),
        role: role.parse().unwrap_or(OrderRole::Entry),
        side: row.get("side"),
        quantity: row.get("quantity"),
        price: row.get("price"),
        trigger_price: row.get("trigger_price"),
        broker_order_id: row.get("broker_order_id"),
        status: status.parse().unwrap_or(OrderStatus::Pending),
        created_at: row.get("created_at"),
    }
}
