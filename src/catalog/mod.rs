pub mod pg;
pub mod queries;
pub mod records;
pub mod remote;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::postgres::PgRow;

use crate::cli::DumpOptions;
use crate::error::{DumpError, QueryFailure};
use queries::CatalogQuery;
use records::{
    ColumnDescriptor, ForeignKeyRecord, FunctionRecord, IndexRecord, KeyColumnRecord,
    PolicyRecord, SequenceRecord, TableRecord, TriggerRecord, ViewRecord,
};

/// A row type every source can decode: a Postgres row or a JSON object.
pub trait CatalogRecord:
    for<'r> sqlx::FromRow<'r, PgRow> + DeserializeOwned + Send + Unpin + 'static
{
}

impl<T> CatalogRecord for T where
    T: for<'r> sqlx::FromRow<'r, PgRow> + DeserializeOwned + Send + Unpin + 'static
{
}

/// Something that can run a read-only catalog query and hand back typed rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    /// Human-readable origin for the dump header. Must not contain secrets.
    fn describe(&self) -> String;

    async fn fetch<T: CatalogRecord>(
        &self,
        query: &CatalogQuery,
        params: &[&str],
    ) -> Result<Vec<T>, QueryFailure>;
}

/// Catalog reader for one namespace over any [`RowSource`].
///
/// Queries run one at a time, each bounded by the configured timeout. An empty
/// result is never an error; a failed query always is.
pub struct Catalog<S> {
    source: S,
    namespace: String,
    timeout: Duration,
}

impl<S: RowSource> Catalog<S> {
    pub fn new(source: S, options: &DumpOptions) -> Self {
        Catalog {
            source,
            namespace: options.namespace.clone(),
            timeout: options.query_timeout,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn describe_source(&self) -> String {
        self.source.describe()
    }

    pub async fn tables(&self) -> Result<Vec<TableRecord>, DumpError> {
        self.run(&queries::TABLES, None).await
    }

    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, DumpError> {
        self.run(&queries::COLUMNS, Some(table)).await
    }

    pub async fn primary_key(&self, table: &str) -> Result<Vec<KeyColumnRecord>, DumpError> {
        self.run(&queries::PRIMARY_KEY, Some(table)).await
    }

    pub async fn unique_constraints(
        &self,
        table: &str,
    ) -> Result<Vec<KeyColumnRecord>, DumpError> {
        self.run(&queries::UNIQUE_CONSTRAINTS, Some(table)).await
    }

    pub async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyRecord>, DumpError> {
        self.run(&queries::FOREIGN_KEYS, Some(table)).await
    }

    pub async fn indexes(&self, table: &str) -> Result<Vec<IndexRecord>, DumpError> {
        self.run(&queries::INDEXES, Some(table)).await
    }

    pub async fn triggers(&self, table: &str) -> Result<Vec<TriggerRecord>, DumpError> {
        self.run(&queries::TRIGGERS, Some(table)).await
    }

    pub async fn sequences(&self) -> Result<Vec<SequenceRecord>, DumpError> {
        self.run(&queries::SEQUENCES, None).await
    }

    pub async fn views(&self) -> Result<Vec<ViewRecord>, DumpError> {
        self.run(&queries::VIEWS, None).await
    }

    pub async fn functions(&self) -> Result<Vec<FunctionRecord>, DumpError> {
        self.run(&queries::FUNCTIONS, None).await
    }

    pub async fn policies(&self) -> Result<Vec<PolicyRecord>, DumpError> {
        self.run(&queries::POLICIES, None).await
    }

    async fn run<T: CatalogRecord>(
        &self,
        query: &CatalogQuery,
        table: Option<&str>,
    ) -> Result<Vec<T>, DumpError> {
        let mut params = vec![self.namespace.as_str()];
        let object = match table {
            Some(table) => {
                params.push(table);
                format!("{}.{}", self.namespace, table)
            }
            None => self.namespace.clone(),
        };

        tracing::debug!(operation = query.operation, object = %object, "Running catalog query");

        let failure =
            match tokio::time::timeout(self.timeout, self.source.fetch::<T>(query, &params)).await
            {
                Ok(Ok(rows)) => return Ok(rows),
                Ok(Err(e)) => e,
                Err(_) => QueryFailure::Timeout(self.timeout),
            };

        Err(DumpError::CatalogQueryFailed {
            operation: query.operation,
            object,
            source: failure,
        })
    }
}
