use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{Postgres, Row, Transaction};
use tracing::{debug, info};

use super::ports::{
    Change, ChangeSet, DocumentBatch, DocumentQuery, DocumentSource, DocumentStore,
    StoreTransaction,
};
use crate::error::{AnnalsError, Result};

const DOCUMENTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS annals_documents (
    seq        BIGSERIAL   NOT NULL,
    kind       TEXT        NOT NULL,
    id         UUID        NOT NULL,
    body       JSONB       NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (kind, id)
)
"#;

const SELECT_KINDS: &str =
    "SELECT kind, body FROM annals_documents WHERE kind = ANY($1) ORDER BY seq";
const INSERT_DOCUMENT: &str =
    "INSERT INTO annals_documents (kind, id, body) VALUES ($1, $2, $3)";
const UPDATE_DOCUMENT: &str =
    "UPDATE annals_documents SET body = $3, updated_at = NOW() WHERE kind = $1 AND id = $2";
const DELETE_DOCUMENT: &str = "DELETE FROM annals_documents WHERE kind = $1 AND id = $2";

/// Document store on a single PostgreSQL table, one JSONB row per entity.
#[derive(Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
    max_connections: u32,
}

impl fmt::Debug for PostgresDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresDocumentStore")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl PostgresDocumentStore {
    pub async fn connect(connection_string: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .max_lifetime(Duration::from_secs(1800))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(connection_string)
            .await
            .map_err(|e| {
                AnnalsError::Internal(format!("Database connection failed: {e}"))
            })?;

        info!(
            "Document store pool initialized with max_connections={}",
            max_connections
        );

        Ok(Self {
            pool,
            max_connections,
        })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        let max_connections = pool.options().get_max_connections();
        Self {
            pool,
            max_connections,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the document table when it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(DOCUMENTS_DDL).execute(&self.pool).await?;
        info!("Document table ready");
        Ok(())
    }
}

fn batch_from_rows(
    query: &DocumentQuery,
    rows: Vec<sqlx::postgres::PgRow>,
) -> Result<DocumentBatch> {
    let kinds = query.kinds();
    let mut grouped: Vec<Vec<Value>> = vec![Vec::new(); kinds.len()];

    for row in rows {
        let kind: String = row.try_get("kind")?;
        let Json(body): Json<Value> = row.try_get("body")?;
        if let Some(slot) = kinds.iter().position(|k| *k == kind) {
            grouped[slot].push(body);
        }
    }

    let mut grouped = grouped.into_iter();
    let primary = grouped.next().unwrap_or_default();
    Ok(kinds
        .iter()
        .skip(1)
        .zip(grouped)
        .fold(DocumentBatch::new(query.kind(), primary), |batch, (kind, docs)| {
            batch.with_related(*kind, docs)
        }))
}

async fn apply_in(tx: &mut Transaction<'static, Postgres>, changes: &ChangeSet) -> Result<u64> {
    let mut affected = 0u64;
    for change in changes {
        let result = match change {
            Change::Insert { kind, id, body } => {
                sqlx::query(INSERT_DOCUMENT)
                    .bind(*kind)
                    .bind(*id)
                    .bind(Json(body))
                    .execute(&mut **tx)
                    .await?
            }
            Change::Update { kind, id, body } => {
                sqlx::query(UPDATE_DOCUMENT)
                    .bind(*kind)
                    .bind(*id)
                    .bind(Json(body))
                    .execute(&mut **tx)
                    .await?
            }
            Change::Delete { kind, id } => {
                sqlx::query(DELETE_DOCUMENT)
                    .bind(*kind)
                    .bind(*id)
                    .execute(&mut **tx)
                    .await?
            }
        };
        affected += result.rows_affected();
    }
    Ok(affected)
}

#[async_trait]
impl DocumentSource for PostgresDocumentStore {
    async fn fetch(&self, query: &DocumentQuery) -> Result<DocumentBatch> {
        let kinds: Vec<String> = query.kinds().iter().map(|k| k.to_string()).collect();
        debug!(kinds = ?kinds, "fetching documents");
        let rows = sqlx::query(SELECT_KINDS)
            .bind(kinds)
            .fetch_all(&self.pool)
            .await?;
        batch_from_rows(query, rows)
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn apply(&self, changes: &ChangeSet) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let affected = apply_in(&mut tx, changes).await?;
        tx.commit().await?;
        debug!(changes = changes.len(), affected, "applied change set");
        Ok(affected)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn execute_raw(&self, statement: &str) -> Result<u64> {
        info!("Executing raw statement");
        let result = sqlx::raw_sql(statement).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl fmt::Debug for PostgresTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresTransaction").finish_non_exhaustive()
    }
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn fetch(&mut self, query: &DocumentQuery) -> Result<DocumentBatch> {
        let kinds: Vec<String> = query.kinds().iter().map(|k| k.to_string()).collect();
        let rows = sqlx::query(SELECT_KINDS)
            .bind(kinds)
            .fetch_all(&mut *self.tx)
            .await?;
        batch_from_rows(query, rows)
    }

    async fn apply(&mut self, changes: &ChangeSet) -> Result<u64> {
        apply_in(&mut self.tx, changes).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
