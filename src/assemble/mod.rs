mod tables;

use std::future::Future;

use chrono::Utc;

use crate::catalog::{Catalog, RowSource};
use crate::cli::DumpOptions;
use crate::error::DumpError;
use crate::schema::{
    EntityKind, FunctionEntity, Omission, PolicyEntity, SchemaSnapshot, SequenceEntity,
    TableEntity, ViewEntity,
};

use tables::TableRecords;

/// Read the whole namespace and assemble it into a snapshot.
///
/// Entity kinds are read in emission order, one query at a time. Without
/// `best_effort`, the first failed query aborts the run.
pub async fn extract<S: RowSource>(
    catalog: &Catalog<S>,
    options: &DumpOptions,
) -> Result<SchemaSnapshot, DumpError> {
    let mut snapshot =
        SchemaSnapshot::new(catalog.namespace(), &catalog.describe_source(), Utc::now());
    let mut omissions = Vec::new();
    let best_effort = options.best_effort;

    snapshot.sequences = tolerate(
        EntityKind::Sequences,
        best_effort,
        &mut omissions,
        extract_sequences(catalog),
    )
    .await?;
    snapshot.tables = tolerate(
        EntityKind::Tables,
        best_effort,
        &mut omissions,
        extract_tables(catalog),
    )
    .await?;
    snapshot.views = tolerate(
        EntityKind::Views,
        best_effort,
        &mut omissions,
        extract_views(catalog),
    )
    .await?;
    snapshot.functions = tolerate(
        EntityKind::Functions,
        best_effort,
        &mut omissions,
        extract_functions(catalog),
    )
    .await?;
    snapshot.policies = tolerate(
        EntityKind::Policies,
        best_effort,
        &mut omissions,
        extract_policies(catalog),
    )
    .await?;
    snapshot.omissions = omissions;

    tracing::debug!(
        sequences = snapshot.sequences.len(),
        tables = snapshot.tables.len(),
        views = snapshot.views.len(),
        functions = snapshot.functions.len(),
        policies = snapshot.policies.len(),
        "Extraction finished"
    );

    Ok(snapshot)
}

/// In best-effort mode, turn a failed entity kind into an omission note.
async fn tolerate<T, F>(
    kind: EntityKind,
    best_effort: bool,
    omissions: &mut Vec<Omission>,
    extraction: F,
) -> Result<Vec<T>, DumpError>
where
    F: Future<Output = Result<Vec<T>, DumpError>>,
{
    match extraction.await {
        Ok(items) => Ok(items),
        Err(e) if best_effort => {
            tracing::warn!("Omitting {kind} from the dump: {e}");
            omissions.push(Omission {
                kind,
                reason: e.to_string(),
            });
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

async fn extract_sequences<S: RowSource>(
    catalog: &Catalog<S>,
) -> Result<Vec<SequenceEntity>, DumpError> {
    let rows = catalog.sequences().await?;
    Ok(rows
        .into_iter()
        .map(|row| SequenceEntity {
            name: row.sequence_name,
            data_type: row.data_type,
            start: row.start_value,
            min_value: row.minimum_value,
            max_value: row.maximum_value,
            increment: row.increment,
            cycle: row.cycle,
        })
        .collect())
}

async fn extract_tables<S: RowSource>(
    catalog: &Catalog<S>,
) -> Result<Vec<TableEntity>, DumpError> {
    let rows = catalog.tables().await?;
    let mut tables = Vec::with_capacity(rows.len());
    for row in rows {
        let records = TableRecords::fetch(catalog, row).await?;
        tables.push(records.assemble()?);
    }
    Ok(tables)
}

async fn extract_views<S: RowSource>(catalog: &Catalog<S>) -> Result<Vec<ViewEntity>, DumpError> {
    let rows = catalog.views().await?;
    Ok(rows
        .into_iter()
        .map(|row| ViewEntity {
            name: row.view_name,
            definition: row.definition,
        })
        .collect())
}

async fn extract_functions<S: RowSource>(
    catalog: &Catalog<S>,
) -> Result<Vec<FunctionEntity>, DumpError> {
    let rows = catalog.functions().await?;
    Ok(rows
        .into_iter()
        .map(|row| FunctionEntity {
            name: row.function_name,
            arguments: row.arguments,
            definition: row.definition,
        })
        .collect())
}

async fn extract_policies<S: RowSource>(
    catalog: &Catalog<S>,
) -> Result<Vec<PolicyEntity>, DumpError> {
    let rows = catalog.policies().await?;
    Ok(rows
        .into_iter()
        .map(|row| PolicyEntity {
            table: row.table_name,
            name: row.policy_name,
            permissive: row.permissive,
            roles: row.roles,
            command: row.command,
            using: row.qual,
            with_check: row.with_check,
        })
        .collect())
}
