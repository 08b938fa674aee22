use sqlx::PgPool;

/// Create the document table for one collection, plus its indexes, if they
/// do not already exist.
///
/// `table` must already be a validated identifier.
pub async fn run_migrations(pool: &PgPool, table: &str) -> Result<(), sqlx::Error> {
    let create_table = format!(
        "
        CREATE TABLE IF NOT EXISTS {table} (
            id          TEXT PRIMARY KEY,
            seq         BIGSERIAL NOT NULL,
            data        JSONB NOT NULL DEFAULT '{{}}'::jsonb,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "
    );

    sqlx::query(&create_table).execute(pool).await?;

    let indexes = [
        format!("CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_seq ON {table} (seq)"),
        format!("CREATE INDEX IF NOT EXISTS idx_{table}_data ON {table} USING GIN (data)"),
    ];

    for idx in &indexes {
        sqlx::query(idx).execute(pool).await?;
    }

    Ok(())
}
