use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::queries::CatalogQuery;
use super::{CatalogRecord, RowSource};
use crate::error::{DumpError, QueryFailure};

/// Direct catalog access over a single pooled PostgreSQL connection.
pub struct PgSource {
    pool: PgPool,
    description: String,
}

impl PgSource {
    pub fn new(pool: PgPool, url: &str) -> Self {
        PgSource {
            pool,
            description: redact_url(url),
        }
    }
}

#[async_trait]
impl RowSource for PgSource {
    fn describe(&self) -> String {
        self.description.clone()
    }

    async fn fetch<T: CatalogRecord>(
        &self,
        query: &CatalogQuery,
        params: &[&str],
    ) -> Result<Vec<T>, QueryFailure> {
        let mut q = sqlx::query_as::<_, T>(query.sql);
        for param in params {
            q = q.bind(param.to_string());
        }
        Ok(q.fetch_all(&self.pool).await?)
    }
}

/// Open the one connection a dump run uses.
pub async fn connect(url: &str, acquire_timeout: Duration) -> Result<PgPool, DumpError> {
    PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(acquire_timeout)
        .connect(url)
        .await
        .map_err(|e| DumpError::Connection(format!("{}: {e}", redact_url(url))))
}

/// Strip the password and query string from a connection URL.
pub fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            let _ = parsed.set_password(None);
            parsed.set_query(None);
            parsed.to_string()
        }
        Err(_) => url.split("://").next().unwrap_or("postgres").to_string(),
    }
}
