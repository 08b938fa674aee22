use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::info;

use quire_core::{Entity, EntityId, Filter, ID_FIELD};
use quire_store::error::StoreError;
use quire_store::query::ListQuery;
use quire_store::store::{EntityStore, prepare_insert};

use crate::config::{PostgresStoreConfig, table_name};
use crate::migrations;
use crate::sql::{bind_values, render_order, render_where};

/// `PostgreSQL` error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Build `PgConnectOptions` from a [`PostgresStoreConfig`], applying SSL
/// settings when configured.
pub(crate) fn build_connect_options(
    config: &PostgresStoreConfig,
) -> Result<sqlx::postgres::PgConnectOptions, StoreError> {
    let mut options: sqlx::postgres::PgConnectOptions = config
        .url
        .parse()
        .map_err(|e: sqlx::Error| StoreError::Connection(e.to_string()))?;

    if let Some(ref mode) = config.ssl_mode {
        let ssl_mode = match mode.as_str() {
            "disable" => sqlx::postgres::PgSslMode::Disable,
            "prefer" => sqlx::postgres::PgSslMode::Prefer,
            "require" => sqlx::postgres::PgSslMode::Require,
            "verify-ca" => sqlx::postgres::PgSslMode::VerifyCa,
            "verify-full" => sqlx::postgres::PgSslMode::VerifyFull,
            other => {
                return Err(StoreError::Connection(format!("unknown ssl_mode: {other}")));
            }
        };
        options = options.ssl_mode(ssl_mode);
    }

    if let Some(ref path) = config.ssl_root_cert {
        options = options.ssl_root_cert(path);
    }

    if let Some(ref path) = config.ssl_cert {
        options = options.ssl_client_cert(path);
    }

    if let Some(ref path) = config.ssl_key {
        options = options.ssl_client_key(path);
    }

    Ok(options)
}

/// Open a connection pool for entity stores. One pool is normally shared by
/// the stores of every collection.
pub async fn connect_pool(config: &PostgresStoreConfig) -> Result<PgPool, StoreError> {
    let connect_options = build_connect_options(config)?;
    sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.pool_size)
        .connect_with(connect_options)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))
}

/// PostgreSQL-backed implementation of [`EntityStore`].
///
/// Each collection lives in its own table `{prefix}{collection}` holding the
/// key, a `BIGSERIAL` creation sequence, and the remaining fields as a
/// `JSONB` document. Updates merge the patch with `data || patch`, which is a
/// shallow top-level merge.
pub struct PostgresEntityStore {
    pool: PgPool,
    collection: String,
    table: String,
}

impl PostgresEntityStore {
    /// Connect to `PostgreSQL` and open the store for `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if pool creation fails, or
    /// [`StoreError::Backend`] if migrations fail.
    pub async fn new(
        config: &PostgresStoreConfig,
        collection: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let pool = connect_pool(config).await?;
        Self::from_pool(pool, &config.table_prefix, collection).await
    }

    /// Open the store for `collection` on an existing pool, creating its
    /// table if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if migrations fail.
    pub async fn from_pool(
        pool: PgPool,
        prefix: &str,
        collection: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let collection = collection.into();
        let table = table_name(prefix, &collection)?;

        migrations::run_migrations(&pool, &table)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        info!(collection = %collection, table = %table, "entity table ready");

        Ok(Self {
            pool,
            collection,
            table,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Internal row type for mapping database rows to [`Entity`].
#[derive(sqlx::FromRow)]
struct EntityRow {
    id: String,
    data: Value,
}

impl TryFrom<EntityRow> for Entity {
    type Error = StoreError;

    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        match row.data {
            Value::Object(fields) => Ok(Entity::new(EntityId::new(row.id), fields)),
            other => Err(StoreError::Serialization(format!(
                "row {} holds a non-object document: {other}",
                row.id
            ))),
        }
    }
}

fn backend(e: &sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn get(&self, id: &EntityId) -> Result<Option<Entity>, StoreError> {
        let sql = format!("SELECT id, data FROM {} WHERE id = $1", self.table);

        let row = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| backend(&e))?;

        row.map(Entity::try_from).transpose()
    }

    async fn list(&self, query: &ListQuery) -> Result<Vec<Entity>, StoreError> {
        let clause = render_where(query.filter.as_ref())?;
        let order = render_order(&query.sort)?;
        let limit_idx = clause.next_bind();
        let offset_idx = limit_idx + 1;
        let sql = format!(
            "SELECT id, data FROM {} {} ORDER BY {order} LIMIT ${limit_idx} OFFSET ${offset_idx}",
            self.table, clause.sql
        );

        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let rows: Vec<EntityRow> =
            bind_values!(sqlx::query_as::<_, EntityRow>(&sql), &clause.binds)
                .bind(i64::from(query.limit))
                .bind(offset)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| backend(&e))?;

        rows.into_iter().map(Entity::try_from).collect()
    }

    async fn count(&self, filter: Option<&Filter>) -> Result<u64, StoreError> {
        let clause = render_where(filter)?;
        let sql = format!("SELECT COUNT(*) FROM {} {}", self.table, clause.sql);

        let total: i64 = bind_values!(sqlx::query_scalar::<_, i64>(&sql), &clause.binds)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| backend(&e))?;

        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn insert(&self, data: Map<String, Value>) -> Result<Entity, StoreError> {
        let (id, fields) = prepare_insert(data)?;
        let sql = format!(
            "INSERT INTO {} (id, data) VALUES ($1, $2) RETURNING id, data",
            self.table
        );

        let row = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(id.as_str())
            .bind(Value::Object(fields))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                    StoreError::Conflict(id.to_string())
                }
                other => backend(&other),
            })?;

        Entity::try_from(row)
    }

    async fn update(
        &self,
        id: &EntityId,
        mut patch: Map<String, Value>,
    ) -> Result<Option<Entity>, StoreError> {
        patch.remove(ID_FIELD);
        let sql = format!(
            "UPDATE {} SET data = data || $2, updated_at = NOW() WHERE id = $1 RETURNING id, data",
            self.table
        );

        let row = sqlx::query_as::<_, EntityRow>(&sql)
            .bind(id.as_str())
            .bind(Value::Object(patch))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| backend(&e))?;

        row.map(Entity::try_from).transpose()
    }

    async fn delete(&self, id: &EntityId) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table);

        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| backend(&e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, id: &EntityId) -> Result<bool, StoreError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", self.table);

        sqlx::query_scalar::<_, bool>(&sql)
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| backend(&e))
    }
}
