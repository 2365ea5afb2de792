//! Typed rows returned by catalog queries.
//!
//! Every record decodes from a PostgreSQL row (direct source) and from a JSON
//! object (remote query endpoint), so the field names here are the column
//! aliases used in [`super::queries`].

use serde::Deserialize;

#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct TableRecord {
    pub table_name: String,
    pub row_security: bool,
}

/// One column as the catalog describes it, before type mapping.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Deserialize)]
pub struct ColumnDescriptor {
    pub column_name: String,
    pub ordinal_position: i32,
    pub is_nullable: bool,
    pub data_type: String,
    pub udt_name: String,
    pub character_maximum_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
    pub column_default: Option<String>,
    pub identity_generation: Option<String>,
}

/// One column of a primary-key or unique constraint.
#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct KeyColumnRecord {
    pub constraint_name: String,
    pub column_name: String,
}

/// One local/referenced column pair of a foreign key.
#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct ForeignKeyRecord {
    pub constraint_name: String,
    pub column_name: String,
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_column: String,
    pub update_rule: String,
    pub delete_rule: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct IndexRecord {
    pub index_name: String,
    pub index_def: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct TriggerRecord {
    pub trigger_name: String,
    pub action_timing: String,
    pub event_manipulation: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct SequenceRecord {
    pub sequence_name: String,
    pub data_type: String,
    pub start_value: i64,
    pub minimum_value: i64,
    pub maximum_value: i64,
    pub increment: i64,
    pub cycle: bool,
}

#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct ViewRecord {
    pub view_name: String,
    pub definition: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct FunctionRecord {
    pub function_name: String,
    pub arguments: String,
    pub definition: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Deserialize)]
pub struct PolicyRecord {
    pub table_name: String,
    pub policy_name: String,
    pub permissive: bool,
    pub roles: Vec<String>,
    pub command: String,
    pub qual: Option<String>,
    pub with_check: Option<String>,
}
