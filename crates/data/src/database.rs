use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

/// Connection handle for the shared durable store.
pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Connects to the specified `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the signal, order, and blacklist tables if absent so the
    /// binary is runnable against an empty database.
    ///
    /// # Errors
    /// Returns an error if a DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS signals (
                id BIGSERIAL PRIMARY KEY,
                channel_id BIGINT NOT NULL,
                message_id BIGINT NOT NULL,
                raw_text TEXT NOT NULL,
                received_at TIMESTAMPTZ NOT NULL,
                processed BOOLEAN NOT NULL DEFAULT FALSE,
                outcome TEXT,
                parsed_json JSONB,
                UNIQUE (channel_id, message_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS orders (
                id BIGSERIAL PRIMARY KEY,
                signal_id BIGINT REFERENCES signals(id),
                instrument_id TEXT NOT NULL,
                exchange TEXT NOT NULL,
                role TEXT NOT NULL,
                side TEXT NOT NULL,
                quantity BIGINT NOT NULL,
                price NUMERIC,
                trigger_price NUMERIC,
                broker_order_id TEXT,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS blacklist (
                instrument_id TEXT NOT NULL,
                blocked_on DATE NOT NULL,
                reason TEXT,
                PRIMARY KEY (instrument_id, blocked_on)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
