use std::collections::HashMap;

use crate::schema::{
    ConstraintDescriptor, ConstraintType, EntityKind, FunctionEntity, Omission, PolicyEntity,
    SchemaSnapshot, SequenceEntity, TableEntity, ViewEntity,
};

/// The order in which a snapshot is written out.
#[derive(Debug)]
pub struct EmissionPlan<'a> {
    pub sections: Vec<Section<'a>>,
}

#[derive(Debug)]
pub enum Section<'a> {
    Sequences(&'a [SequenceEntity]),
    Tables {
        tables: Vec<PlannedTable<'a>>,
        /// Foreign keys added after every table exists.
        deferred: Vec<DeferredForeignKey<'a>>,
    },
    Views(&'a [ViewEntity]),
    Functions(&'a [FunctionEntity]),
    Policies(Vec<PolicyGroup<'a>>),
    Omitted(&'a Omission),
}

/// A table together with the constraints rendered inside its `CREATE TABLE`.
#[derive(Debug)]
pub struct PlannedTable<'a> {
    pub entity: &'a TableEntity,
    pub constraints: Vec<&'a ConstraintDescriptor>,
}

#[derive(Debug)]
pub struct DeferredForeignKey<'a> {
    pub table: &'a str,
    pub constraint: &'a ConstraintDescriptor,
}

#[derive(Debug)]
pub struct PolicyGroup<'a> {
    pub table: &'a str,
    pub policies: Vec<&'a PolicyEntity>,
}

/// Lay out a snapshot: sequences, tables, views, functions, then policies.
///
/// Tables keep catalog order. Instead of sorting them by dependency, a foreign
/// key whose target table is created later (or not at all in this run) is
/// moved out of `CREATE TABLE` and added once all tables exist. Kinds with
/// nothing to emit are left out, except for best-effort omission notes.
pub fn plan(snapshot: &SchemaSnapshot) -> EmissionPlan<'_> {
    let mut sections = Vec::new();

    push_omissions(&mut sections, snapshot, EntityKind::Sequences);
    if !snapshot.sequences.is_empty() {
        sections.push(Section::Sequences(&snapshot.sequences));
    }

    push_omissions(&mut sections, snapshot, EntityKind::Tables);
    if !snapshot.tables.is_empty() {
        let (tables, deferred) = plan_tables(&snapshot.tables, &snapshot.namespace);
        sections.push(Section::Tables { tables, deferred });
    }

    push_omissions(&mut sections, snapshot, EntityKind::Views);
    if !snapshot.views.is_empty() {
        sections.push(Section::Views(&snapshot.views));
    }

    push_omissions(&mut sections, snapshot, EntityKind::Functions);
    if !snapshot.functions.is_empty() {
        sections.push(Section::Functions(&snapshot.functions));
    }

    push_omissions(&mut sections, snapshot, EntityKind::Policies);
    if !snapshot.policies.is_empty() {
        sections.push(Section::Policies(group_policies(&snapshot.policies)));
    }

    EmissionPlan { sections }
}

fn push_omissions<'a>(
    sections: &mut Vec<Section<'a>>,
    snapshot: &'a SchemaSnapshot,
    kind: EntityKind,
) {
    sections.extend(
        snapshot
            .omissions
            .iter()
            .filter(|o| o.kind == kind)
            .map(Section::Omitted),
    );
}

fn plan_tables<'a>(
    tables: &'a [TableEntity],
    namespace: &str,
) -> (Vec<PlannedTable<'a>>, Vec<DeferredForeignKey<'a>>) {
    let positions: HashMap<&str, usize> = tables
        .iter()
        .enumerate()
        .map(|(idx, t)| (t.name.as_str(), idx))
        .collect();

    let mut planned = Vec::with_capacity(tables.len());
    let mut deferred = Vec::new();

    for (idx, table) in tables.iter().enumerate() {
        let mut inline = Vec::with_capacity(table.constraints.len());
        for constraint in &table.constraints {
            if is_forward_reference(constraint, idx, &positions, namespace) {
                deferred.push(DeferredForeignKey {
                    table: &table.name,
                    constraint,
                });
            } else {
                inline.push(constraint);
            }
        }
        planned.push(PlannedTable {
            entity: table,
            constraints: inline,
        });
    }

    (planned, deferred)
}

/// A foreign key into this namespace whose target is not created yet.
/// Self-references and references to other namespaces stay inline.
fn is_forward_reference(
    constraint: &ConstraintDescriptor,
    position: usize,
    positions: &HashMap<&str, usize>,
    namespace: &str,
) -> bool {
    if constraint.constraint_type != ConstraintType::ForeignKey {
        return false;
    }
    let Some(fk) = &constraint.foreign_key else {
        return false;
    };
    if fk.ref_schema != namespace {
        return false;
    }
    match positions.get(fk.ref_table.as_str()) {
        Some(&target) => target > position,
        None => true,
    }
}

fn group_policies(policies: &[PolicyEntity]) -> Vec<PolicyGroup<'_>> {
    let mut groups: Vec<PolicyGroup<'_>> = Vec::new();
    for policy in policies {
        match groups.last_mut() {
            Some(group) if group.table == policy.table => group.policies.push(policy),
            _ => groups.push(PolicyGroup {
                table: &policy.table,
                policies: vec![policy],
            }),
        }
    }
    groups
}
