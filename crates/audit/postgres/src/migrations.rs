use sqlx::PgPool;
use tracing::{debug, info};

/// Run the audit table migration, creating the table and indexes if they do
/// not already exist.
pub async fn run_migrations(pool: &PgPool, prefix: &str) -> Result<(), sqlx::Error> {
    let table = format!("{prefix}audit");

    let create_table = format!(
        "
        CREATE TABLE IF NOT EXISTS {table} (
            id           TEXT PRIMARY KEY,
            user_id      TEXT NOT NULL,
            action       TEXT NOT NULL,
            entity_type  TEXT NOT NULL,
            entity_id    TEXT NOT NULL,
            old_data     JSONB,
            new_data     JSONB,
            recorded_at  TIMESTAMPTZ NOT NULL
        )
        "
    );

    sqlx::query(&create_table).execute(pool).await?;

    let indexes = [
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}audit_entity ON {table} (entity_type, entity_id, recorded_at DESC)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{prefix}audit_user ON {table} (user_id, recorded_at DESC)"
        ),
        format!("CREATE INDEX IF NOT EXISTS idx_{prefix}audit_time ON {table} (recorded_at DESC)"),
    ];

    for idx in &indexes {
        debug!(table = %table, statement = %idx, "ensuring audit index");
        sqlx::query(idx).execute(pool).await?;
    }

    info!(table = %table, "audit table ready");
    Ok(())
}
