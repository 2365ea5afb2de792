use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::DumpError;

/// Everything extracted from one namespace in a single run.
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    pub namespace: String,
    /// Where the metadata came from, with credentials removed.
    pub source: String,
    pub captured_at: DateTime<Utc>,
    pub sequences: Vec<SequenceEntity>,
    pub tables: Vec<TableEntity>,
    pub views: Vec<ViewEntity>,
    pub functions: Vec<FunctionEntity>,
    /// Ordered by owning table, then policy name.
    pub policies: Vec<PolicyEntity>,
    /// Entity kinds skipped in best-effort mode.
    pub omissions: Vec<Omission>,
}

impl SchemaSnapshot {
    pub fn new(namespace: &str, source: &str, captured_at: DateTime<Utc>) -> Self {
        SchemaSnapshot {
            namespace: namespace.to_string(),
            source: source.to_string(),
            captured_at,
            sequences: Vec::new(),
            tables: Vec::new(),
            views: Vec::new(),
            functions: Vec::new(),
            policies: Vec::new(),
            omissions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
            && self.tables.is_empty()
            && self.views.is_empty()
            && self.functions.is_empty()
            && self.policies.is_empty()
    }

    /// Return `EmptyNamespace` when nothing at all was found.
    ///
    /// An empty namespace still produces a valid (if trivial) document; this
    /// lets callers warn instead of treating it as a silent success.
    pub fn ensure_populated(&self) -> Result<(), DumpError> {
        if self.is_empty() {
            Err(DumpError::EmptyNamespace(self.namespace.clone()))
        } else {
            Ok(())
        }
    }
}

/// The object kinds a dump is made of, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Sequences,
    Tables,
    Views,
    Functions,
    Policies,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Sequences => "sequences",
            EntityKind::Tables => "tables",
            EntityKind::Views => "views",
            EntityKind::Functions => "functions",
            EntityKind::Policies => "policies",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Omission {
    pub kind: EntityKind,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct SequenceEntity {
    pub name: String,
    pub data_type: String,
    pub start: i64,
    pub min_value: i64,
    pub max_value: i64,
    pub increment: i64,
    pub cycle: bool,
}

/// Metadata for a single base table.
#[derive(Debug, Clone)]
pub struct TableEntity {
    pub name: String,
    pub columns: Vec<Column>,
    /// Primary key first, then unique constraints, then foreign keys.
    pub constraints: Vec<ConstraintDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub triggers: Vec<TriggerSummary>,
    /// Whether RLS was enabled in the source. Emission enables it regardless.
    pub row_security: bool,
}

/// A column after type mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
    pub is_nullable: bool,
    pub default: Option<String>,
    pub identity: Option<IdentityGeneration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityGeneration {
    Always,
    ByDefault,
}

impl IdentityGeneration {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ALWAYS" => Some(IdentityGeneration::Always),
            "BY DEFAULT" => Some(IdentityGeneration::ByDefault),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            IdentityGeneration::Always => "ALWAYS",
            IdentityGeneration::ByDefault => "BY DEFAULT",
        }
    }
}

/// Metadata for a constraint (PK, Unique, FK).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub columns: Vec<String>,
    /// For foreign keys: the referenced schema, table, and columns.
    pub foreign_key: Option<ForeignKeyInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    PrimaryKey,
    Unique,
    ForeignKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub ref_schema: String,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub delete_rule: String,
    pub update_rule: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    pub name: String,
    pub table: String,
    /// Backend-supplied `CREATE INDEX` statement, without a trailing `;`.
    pub definition: String,
}

/// Triggers are documented in the dump, not recreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSummary {
    pub name: String,
    pub timing: String,
    pub event: String,
}

#[derive(Debug, Clone)]
pub struct ViewEntity {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone)]
pub struct FunctionEntity {
    pub name: String,
    pub arguments: String,
    pub definition: String,
}

#[derive(Debug, Clone)]
pub struct PolicyEntity {
    pub table: String,
    pub name: String,
    pub permissive: bool,
    /// Empty means `public`.
    pub roles: Vec<String>,
    pub command: String,
    pub using: Option<String>,
    pub with_check: Option<String>,
}
