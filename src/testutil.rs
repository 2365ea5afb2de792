use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use crate::catalog::queries::CatalogQuery;
use crate::catalog::records::{ColumnDescriptor, ForeignKeyRecord, KeyColumnRecord};
use crate::catalog::remote::decode_rows;
use crate::catalog::{CatalogRecord, RowSource};
use crate::cli::DumpOptions;
use crate::error::QueryFailure;
use crate::schema::{
    Column, PolicyEntity, SchemaSnapshot, SequenceEntity, TableEntity, ViewEntity,
};

/// Create a ColumnDescriptor with sensible defaults for testing.
/// Returns a non-nullable integer column with no default and no identity.
pub fn test_column(name: &str) -> ColumnDescriptor {
    ColumnDescriptor {
        column_name: name.to_string(),
        ordinal_position: 1,
        is_nullable: false,
        data_type: "integer".to_string(),
        udt_name: "int4".to_string(),
        character_maximum_length: None,
        numeric_precision: None,
        numeric_scale: None,
        column_default: None,
        identity_generation: None,
    }
}

pub fn test_options() -> DumpOptions {
    DumpOptions::default()
}

/// An empty snapshot of `public` with a fixed capture time.
pub fn test_snapshot() -> SchemaSnapshot {
    let captured_at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    SchemaSnapshot::new("public", "postgres://localhost/app", captured_at)
}

/// A table with a single non-nullable `id integer` column and nothing else.
pub fn test_table(name: &str) -> TableEntity {
    TableEntity {
        name: name.to_string(),
        columns: vec![Column {
            name: "id".to_string(),
            sql_type: "integer".to_string(),
            is_nullable: false,
            default: None,
            identity: None,
        }],
        constraints: Vec::new(),
        indexes: Vec::new(),
        triggers: Vec::new(),
        row_security: false,
    }
}

/// A `bigint` sequence with the backend's default bounds.
pub fn test_sequence(name: &str) -> SequenceEntity {
    SequenceEntity {
        name: name.to_string(),
        data_type: "bigint".to_string(),
        start: 1,
        min_value: 1,
        max_value: i64::MAX,
        increment: 1,
        cycle: false,
    }
}

pub fn test_view(name: &str) -> ViewEntity {
    ViewEntity {
        name: name.to_string(),
        definition: " SELECT 1;".to_string(),
    }
}

/// A permissive `FOR ALL` policy applying to every role, with no expressions.
pub fn test_policy(table: &str, name: &str) -> PolicyEntity {
    PolicyEntity {
        table: table.to_string(),
        name: name.to_string(),
        permissive: true,
        roles: Vec::new(),
        command: "ALL".to_string(),
        using: None,
        with_check: None,
    }
}

pub fn key_record(constraint: &str, column: &str) -> KeyColumnRecord {
    KeyColumnRecord {
        constraint_name: constraint.to_string(),
        column_name: column.to_string(),
    }
}

pub fn fk_record(
    constraint: &str,
    column: &str,
    ref_table: &str,
    ref_column: &str,
) -> ForeignKeyRecord {
    ForeignKeyRecord {
        constraint_name: constraint.to_string(),
        column_name: column.to_string(),
        ref_schema: "public".to_string(),
        ref_table: ref_table.to_string(),
        ref_column: ref_column.to_string(),
        update_rule: "NO ACTION".to_string(),
        delete_rule: "NO ACTION".to_string(),
    }
}

/// In-memory row source serving JSON rows per operation (and table).
#[derive(Default)]
pub struct FakeSource {
    rows: HashMap<(String, Option<String>), Vec<Value>>,
    failing: HashSet<String>,
    delay: Option<Duration>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows for a namespace-scoped operation such as `tables` or `views`.
    pub fn with_rows(mut self, operation: &str, rows: Vec<Value>) -> Self {
        self.rows.insert((operation.to_string(), None), rows);
        self
    }

    /// Rows for a table-scoped operation such as `columns` or `indexes`.
    pub fn with_table_rows(mut self, operation: &str, table: &str, rows: Vec<Value>) -> Self {
        self.rows
            .insert((operation.to_string(), Some(table.to_string())), rows);
        self
    }

    pub fn failing(mut self, operation: &str) -> Self {
        self.failing.insert(operation.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl RowSource for FakeSource {
    fn describe(&self) -> String {
        "fake://catalog".to_string()
    }

    async fn fetch<T: CatalogRecord>(
        &self,
        query: &CatalogQuery,
        params: &[&str],
    ) -> Result<Vec<T>, QueryFailure> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(query.operation) {
            return Err(QueryFailure::Endpoint {
                status: 503,
                body: "injected failure".to_string(),
            });
        }
        let key = (
            query.operation.to_string(),
            params.get(1).map(|table| table.to_string()),
        );
        let rows = self.rows.get(&key).cloned().unwrap_or_default();
        decode_rows(Value::Array(rows))
    }
}

/// `orders(id integer not null, total numeric(10,2), primary key(id))`.
pub fn orders_source() -> FakeSource {
    FakeSource::new()
        .with_rows(
            "tables",
            vec![json!({"table_name": "orders", "row_security": false})],
        )
        .with_table_rows(
            "columns",
            "orders",
            vec![
                json!({
                    "column_name": "id",
                    "ordinal_position": 1,
                    "is_nullable": false,
                    "data_type": "integer",
                    "udt_name": "int4",
                }),
                json!({
                    "column_name": "total",
                    "ordinal_position": 2,
                    "is_nullable": true,
                    "data_type": "numeric",
                    "udt_name": "numeric",
                    "numeric_precision": 10,
                    "numeric_scale": 2,
                }),
            ],
        )
        .with_table_rows(
            "primary_key",
            "orders",
            vec![json!({"constraint_name": "orders_pkey", "column_name": "id"})],
        )
}
