use crate::codegen::{join_idents, quote_ident, strip_terminator};
use crate::order::{DeferredForeignKey, PlannedTable};
use crate::schema::{
    Column, ConstraintDescriptor, ConstraintType, FunctionEntity, PolicyEntity, SequenceEntity,
    ViewEntity,
};

/// Referential action the catalog reports when none was declared.
const DEFAULT_RULE: &str = "NO ACTION";

pub fn render_sequence(seq: &SequenceEntity) -> String {
    let cycle = if seq.cycle { " CYCLE" } else { "" };
    format!(
        "CREATE SEQUENCE IF NOT EXISTS {} AS {} START WITH {} INCREMENT BY {} MINVALUE {} MAXVALUE {}{cycle};\n",
        quote_ident(&seq.name),
        seq.data_type,
        seq.start,
        seq.increment,
        seq.min_value,
        seq.max_value,
    )
}

/// Render the full block for one table: drop guard, definition, RLS switch,
/// index definitions, and trigger notes.
pub fn render_table(table: &PlannedTable<'_>, namespace: &str) -> String {
    let entity = table.entity;
    let name = quote_ident(&entity.name);

    let mut lines: Vec<String> = entity.columns.iter().map(render_column).collect();
    lines.extend(
        table
            .constraints
            .iter()
            .map(|c| render_constraint(c, namespace)),
    );

    let mut out = format!("DROP TABLE IF EXISTS {name} CASCADE;\n\n");
    out.push_str(&format!("CREATE TABLE {name} (\n"));
    if !lines.is_empty() {
        let body: Vec<String> = lines.iter().map(|l| format!("    {l}")).collect();
        out.push_str(&body.join(",\n"));
        out.push('\n');
    }
    out.push_str(");\n\n");
    out.push_str(&format!("ALTER TABLE {name} ENABLE ROW LEVEL SECURITY;\n"));

    if !entity.indexes.is_empty() {
        out.push_str("\n-- Indexes\n");
        for index in &entity.indexes {
            out.push_str(strip_terminator(&index.definition));
            out.push_str(";\n");
        }
    }

    // Trigger bodies are not reliably executable on their own.
    if !entity.triggers.is_empty() {
        out.push_str("\n-- Triggers (documented only, not recreated)\n");
        for trigger in &entity.triggers {
            out.push_str(&format!(
                "-- {}: {} {}\n",
                trigger.name, trigger.timing, trigger.event
            ));
        }
    }

    out
}

pub fn render_column(col: &Column) -> String {
    let mut line = format!("{} {}", quote_ident(&col.name), col.sql_type);
    if !col.is_nullable {
        line.push_str(" NOT NULL");
    }
    if let Some(ref default) = col.default {
        line.push_str(" DEFAULT ");
        line.push_str(default);
    }
    if let Some(identity) = col.identity {
        line.push_str(&format!(" GENERATED {} AS IDENTITY", identity.as_sql()));
    }
    line
}

pub fn render_constraint(constraint: &ConstraintDescriptor, namespace: &str) -> String {
    let columns = join_idents(&constraint.columns);
    match constraint.constraint_type {
        ConstraintType::PrimaryKey => format!("PRIMARY KEY ({columns})"),
        ConstraintType::Unique => format!("UNIQUE ({columns})"),
        ConstraintType::ForeignKey => {
            let mut line = format!(
                "CONSTRAINT {} FOREIGN KEY ({columns})",
                quote_ident(&constraint.name)
            );
            if let Some(ref fk) = constraint.foreign_key {
                let target = if fk.ref_schema == namespace {
                    quote_ident(&fk.ref_table)
                } else {
                    format!("{}.{}", quote_ident(&fk.ref_schema), quote_ident(&fk.ref_table))
                };
                line.push_str(&format!(
                    " REFERENCES {target} ({})",
                    join_idents(&fk.ref_columns)
                ));
                if fk.delete_rule != DEFAULT_RULE {
                    line.push_str(&format!(" ON DELETE {}", fk.delete_rule));
                }
                if fk.update_rule != DEFAULT_RULE {
                    line.push_str(&format!(" ON UPDATE {}", fk.update_rule));
                }
            }
            line
        }
    }
}

pub fn render_deferred_foreign_key(deferred: &DeferredForeignKey<'_>, namespace: &str) -> String {
    format!(
        "ALTER TABLE {} ADD {};\n",
        quote_ident(deferred.table),
        render_constraint(deferred.constraint, namespace)
    )
}

pub fn render_view(view: &ViewEntity) -> String {
    let name = quote_ident(&view.name);
    format!(
        "DROP VIEW IF EXISTS {name} CASCADE;\nCREATE VIEW {name} AS {};\n",
        strip_terminator(view.definition.trim_start())
    )
}

pub fn render_function(function: &FunctionEntity) -> String {
    format!(
        "-- Function: {}({})\n{};\n",
        function.name,
        function.arguments,
        strip_terminator(&function.definition)
    )
}

pub fn render_policy(policy: &PolicyEntity) -> String {
    let mode = if policy.permissive {
        "PERMISSIVE"
    } else {
        "RESTRICTIVE"
    };
    let roles = if policy.roles.is_empty() {
        "public".to_string()
    } else {
        join_idents(&policy.roles)
    };

    let mut stmt = format!(
        "CREATE POLICY {} ON {} AS {mode} FOR {} TO {roles}",
        quote_ident(&policy.name),
        quote_ident(&policy.table),
        policy.command,
    );
    if let Some(ref qual) = policy.using {
        stmt.push_str(&format!(" USING ({qual})"));
    }
    if let Some(ref check) = policy.with_check {
        stmt.push_str(&format!(" WITH CHECK ({check})"));
    }
    stmt.push_str(";\n");
    stmt
}
