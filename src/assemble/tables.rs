use crate::catalog::records::{
    ColumnDescriptor, ForeignKeyRecord, IndexRecord, KeyColumnRecord, TableRecord, TriggerRecord,
};
use crate::catalog::{Catalog, RowSource};
use crate::error::DumpError;
use crate::schema::{
    Column, ConstraintDescriptor, ConstraintType, ForeignKeyInfo, IdentityGeneration,
    IndexDescriptor, TableEntity, TriggerSummary,
};
use crate::typemap::map_column_type;

/// Everything the catalog reports about one table, before joining.
#[derive(Debug, Default)]
pub struct TableRecords {
    pub name: String,
    pub row_security: bool,
    pub columns: Vec<ColumnDescriptor>,
    pub primary_key: Vec<KeyColumnRecord>,
    pub unique_constraints: Vec<KeyColumnRecord>,
    pub foreign_keys: Vec<ForeignKeyRecord>,
    pub indexes: Vec<IndexRecord>,
    pub triggers: Vec<TriggerRecord>,
}

impl TableRecords {
    /// Run the per-table queries, one at a time.
    pub async fn fetch<S: RowSource>(
        catalog: &Catalog<S>,
        table: TableRecord,
    ) -> Result<Self, DumpError> {
        let name = table.table_name;
        tracing::debug!("Reading table {name}");

        Ok(TableRecords {
            columns: catalog.columns(&name).await?,
            primary_key: catalog.primary_key(&name).await?,
            unique_constraints: catalog.unique_constraints(&name).await?,
            foreign_keys: catalog.foreign_keys(&name).await?,
            indexes: catalog.indexes(&name).await?,
            triggers: catalog.triggers(&name).await?,
            row_security: table.row_security,
            name,
        })
    }

    /// Join the records into one table entity.
    ///
    /// Columns keep catalog order. Constraints come out as primary key, then
    /// unique constraints, then foreign keys, each group in catalog order.
    pub fn assemble(self) -> Result<TableEntity, DumpError> {
        if self.columns.is_empty() {
            tracing::warn!("Table {} has no columns; emitting an empty body", self.name);
        }

        let columns = self
            .columns
            .iter()
            .map(build_column)
            .collect::<Result<Vec<_>, _>>()?;

        let mut constraints = key_constraints(ConstraintType::PrimaryKey, self.primary_key);
        constraints.extend(key_constraints(
            ConstraintType::Unique,
            self.unique_constraints,
        ));
        constraints.extend(foreign_key_constraints(self.foreign_keys));

        let indexes = self
            .indexes
            .into_iter()
            .map(|row| IndexDescriptor {
                name: row.index_name,
                table: self.name.clone(),
                definition: row.index_def,
            })
            .collect();

        Ok(TableEntity {
            columns,
            constraints,
            indexes,
            triggers: trigger_summaries(self.triggers),
            row_security: self.row_security,
            name: self.name,
        })
    }
}

fn build_column(desc: &ColumnDescriptor) -> Result<Column, DumpError> {
    Ok(Column {
        name: desc.column_name.clone(),
        sql_type: map_column_type(desc)?,
        is_nullable: desc.is_nullable,
        default: desc.column_default.clone(),
        identity: desc
            .identity_generation
            .as_deref()
            .and_then(IdentityGeneration::parse),
    })
}

/// Group key-column rows by constraint name, keeping first-seen order.
fn key_constraints(
    constraint_type: ConstraintType,
    rows: Vec<KeyColumnRecord>,
) -> Vec<ConstraintDescriptor> {
    let mut grouped: Vec<ConstraintDescriptor> = Vec::new();
    for row in rows {
        match grouped.iter_mut().find(|c| c.name == row.constraint_name) {
            Some(existing) => existing.columns.push(row.column_name),
            None => grouped.push(ConstraintDescriptor {
                name: row.constraint_name,
                constraint_type,
                columns: vec![row.column_name],
                foreign_key: None,
            }),
        }
    }
    grouped
}

fn foreign_key_constraints(rows: Vec<ForeignKeyRecord>) -> Vec<ConstraintDescriptor> {
    let mut grouped: Vec<ConstraintDescriptor> = Vec::new();
    for row in rows {
        if let Some(existing) = grouped.iter_mut().find(|c| c.name == row.constraint_name) {
            existing.columns.push(row.column_name);
            if let Some(ref mut fk) = existing.foreign_key {
                fk.ref_columns.push(row.ref_column);
            }
            continue;
        }
        grouped.push(ConstraintDescriptor {
            name: row.constraint_name,
            constraint_type: ConstraintType::ForeignKey,
            columns: vec![row.column_name],
            foreign_key: Some(ForeignKeyInfo {
                ref_schema: row.ref_schema,
                ref_table: row.ref_table,
                ref_columns: vec![row.ref_column],
                delete_rule: row.delete_rule,
                update_rule: row.update_rule,
            }),
        });
    }
    grouped
}

/// The catalog reports one row per trigger event; fold them into one summary.
fn trigger_summaries(rows: Vec<TriggerRecord>) -> Vec<TriggerSummary> {
    let mut summaries: Vec<TriggerSummary> = Vec::new();
    for row in rows {
        match summaries
            .iter_mut()
            .find(|t| t.name == row.trigger_name && t.timing == row.action_timing)
        {
            Some(existing) => {
                existing.event.push_str(" OR ");
                existing.event.push_str(&row.event_manipulation);
            }
            None => summaries.push(TriggerSummary {
                name: row.trigger_name,
                timing: row.action_timing,
                event: row.event_manipulation,
            }),
        }
    }
    summaries
}
