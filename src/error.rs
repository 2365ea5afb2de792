use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("Catalog query `{operation}` failed for {object}: {source}")]
    CatalogQueryFailed {
        operation: &'static str,
        object: String,
        #[source]
        source: QueryFailure,
    },

    #[error("Unsupported type descriptor: {raw_type:?}")]
    UnsupportedTypeDescriptor { raw_type: String },

    #[error("Namespace {0} contains no sequences, tables, views, functions, or policies")]
    EmptyNamespace(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single catalog query could not produce rows.
#[derive(Error, Debug)]
pub enum QueryFailure {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Query endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("Malformed catalog row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}
