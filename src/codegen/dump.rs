use crate::codegen::statements::{
    render_deferred_foreign_key, render_function, render_policy, render_sequence, render_table,
    render_view,
};
use crate::codegen::{quote_ident, single_line, Generator};
use crate::error::DumpError;
use crate::order::{plan, Section};
use crate::schema::{EntityKind, SchemaSnapshot};

const BANNER: &str = "-- ===============================================================";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";
const DEFAULT_NAMESPACE: &str = "public";

/// Writes the complete, replayable SQL document.
///
/// Output depends only on the snapshot, so the same snapshot always renders
/// to the same bytes.
pub struct SqlDumpGenerator;

impl Generator for SqlDumpGenerator {
    fn generate(&self, snapshot: &SchemaSnapshot) -> Result<String, DumpError> {
        let generated = snapshot.captured_at.format(TIMESTAMP_FORMAT).to_string();
        let namespace = &snapshot.namespace;
        let mut out = String::new();

        out.push_str(&format!(
            "{BANNER}\n\
             -- SCHEMA DUMP: {namespace}\n\
             -- Generated: {generated}\n\
             -- Source: {}\n\
             {BANNER}\n\
             -- This script recreates the schema structure from scratch.\n\
             -- Includes: sequences, tables, constraints, indexes, views, functions, and RLS policies.\n\
             -- Row data is not included.\n\
             {BANNER}\n\n",
            snapshot.source
        ));

        if namespace != DEFAULT_NAMESPACE {
            let ns = quote_ident(namespace);
            out.push_str(&format!(
                "CREATE SCHEMA IF NOT EXISTS {ns};\nSET search_path = {ns}, public;\n\n"
            ));
        }

        out.push_str("-- Disable foreign key checks during import\n");
        out.push_str("SET session_replication_role = replica;\n\n");

        for section in plan(snapshot).sections {
            match section {
                Section::Sequences(sequences) => {
                    push_banner(&mut out, "SEQUENCES");
                    for seq in sequences {
                        out.push_str(&render_sequence(seq));
                    }
                    out.push('\n');
                }
                Section::Tables { tables, deferred } => {
                    push_banner(&mut out, "TABLES");
                    for table in &tables {
                        out.push_str(&format!("-- TABLE: {}", table.entity.name));
                        if table.entity.row_security {
                            out.push_str(" (row level security enabled at source)");
                        }
                        out.push('\n');
                        out.push_str(&render_table(table, namespace));
                        out.push('\n');
                    }
                    if !deferred.is_empty() {
                        out.push_str("-- Foreign keys to tables created later in this script\n");
                        for fk in &deferred {
                            out.push_str(&render_deferred_foreign_key(fk, namespace));
                        }
                        out.push('\n');
                    }
                }
                Section::Views(views) => {
                    push_banner(&mut out, "VIEWS");
                    for view in views {
                        out.push_str(&render_view(view));
                        out.push('\n');
                    }
                }
                Section::Functions(functions) => {
                    push_banner(&mut out, "FUNCTIONS AND PROCEDURES");
                    for function in functions {
                        out.push_str(&render_function(function));
                        out.push('\n');
                    }
                }
                Section::Policies(groups) => {
                    push_banner(&mut out, "ROW LEVEL SECURITY POLICIES");
                    for group in &groups {
                        out.push_str(&format!("-- Policies for {}\n", group.table));
                        for policy in &group.policies {
                            out.push_str(&render_policy(policy));
                        }
                        out.push('\n');
                    }
                }
                Section::Omitted(omission) => {
                    push_banner(&mut out, &format!("{} (OMITTED)", section_title(omission.kind)));
                    out.push_str(&format!(
                        "-- NOTE: {} could not be read and are missing from this script.\n-- Cause: {}\n\n",
                        omission.kind,
                        single_line(&omission.reason)
                    ));
                }
            }
        }

        push_banner(&mut out, "FINALIZATION");
        out.push_str("-- Re-enable foreign key checks\n");
        out.push_str("SET session_replication_role = DEFAULT;\n\n");
        out.push_str("-- Grant permissions (customize as needed)\n");
        out.push_str(&format!(
            "-- GRANT USAGE ON SCHEMA {namespace} TO authenticated, anon;\n\
             -- GRANT ALL ON ALL TABLES IN SCHEMA {namespace} TO authenticated;\n\
             -- GRANT SELECT ON ALL TABLES IN SCHEMA {namespace} TO anon;\n\n"
        ));
        out.push_str(&format!(
            "{BANNER}\n-- END OF SCHEMA DUMP\n-- Generated: {generated}\n{BANNER}\n"
        ));

        Ok(out)
    }
}

fn push_banner(out: &mut String, title: &str) {
    out.push_str(&format!("{BANNER}\n-- {title}\n{BANNER}\n\n"));
}

fn section_title(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Sequences => "SEQUENCES",
        EntityKind::Tables => "TABLES",
        EntityKind::Views => "VIEWS",
        EntityKind::Functions => "FUNCTIONS AND PROCEDURES",
        EntityKind::Policies => "ROW LEVEL SECURITY POLICIES",
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::assemble::extract;
    use crate::catalog::Catalog;
    use crate::schema::{
        Column, ConstraintDescriptor, ConstraintType, ForeignKeyInfo, FunctionEntity, Omission,
    };
    use crate::testutil::{
        orders_source, test_options, test_policy, test_sequence, test_snapshot, test_table,
        test_view,
    };

    fn render(snapshot: &SchemaSnapshot) -> String {
        SqlDumpGenerator.generate(snapshot).unwrap()
    }

    fn position(doc: &str, needle: &str) -> usize {
        doc.find(needle)
            .unwrap_or_else(|| panic!("{needle:?} not found in:\n{doc}"))
    }

    fn orders_snapshot() -> SchemaSnapshot {
        let mut orders = test_table("orders");
        orders.columns.push(Column {
            name: "total".to_string(),
            sql_type: "NUMERIC(10,2)".to_string(),
            is_nullable: true,
            default: None,
            identity: None,
        });
        orders.constraints.push(ConstraintDescriptor {
            name: "orders_pkey".to_string(),
            constraint_type: ConstraintType::PrimaryKey,
            columns: vec!["id".to_string()],
            foreign_key: None,
        });
        let mut snapshot = test_snapshot();
        snapshot.tables.push(orders);
        snapshot
    }

    fn full_snapshot() -> SchemaSnapshot {
        let mut snapshot = orders_snapshot();
        snapshot.sequences.push(test_sequence("invoice_no_seq"));
        snapshot.views.push(test_view("open_orders"));
        snapshot.functions.push(FunctionEntity {
            name: "touch".to_string(),
            arguments: String::new(),
            definition: "CREATE OR REPLACE FUNCTION public.touch()\n RETURNS trigger\n LANGUAGE plpgsql\nAS $function$ BEGIN RETURN NEW; END $function$\n".to_string(),
        });
        snapshot.policies.push(test_policy("orders", "owner_only"));
        snapshot
    }

    #[test]
    fn test_orders_document() {
        let expected = indoc! {"
            -- ===============================================================
            -- SCHEMA DUMP: public
            -- Generated: 2026-01-02 03:04:05 UTC
            -- Source: postgres://localhost/app
            -- ===============================================================
            -- This script recreates the schema structure from scratch.
            -- Includes: sequences, tables, constraints, indexes, views, functions, and RLS policies.
            -- Row data is not included.
            -- ===============================================================

            -- Disable foreign key checks during import
            SET session_replication_role = replica;

            -- ===============================================================
            -- TABLES
            -- ===============================================================

            -- TABLE: orders
            DROP TABLE IF EXISTS orders CASCADE;

            CREATE TABLE orders (
                id integer NOT NULL,
                total NUMERIC(10,2),
                PRIMARY KEY (id)
            );

            ALTER TABLE orders ENABLE ROW LEVEL SECURITY;

            -- ===============================================================
            -- FINALIZATION
            -- ===============================================================

            -- Re-enable foreign key checks
            SET session_replication_role = DEFAULT;

            -- Grant permissions (customize as needed)
            -- GRANT USAGE ON SCHEMA public TO authenticated, anon;
            -- GRANT ALL ON ALL TABLES IN SCHEMA public TO authenticated;
            -- GRANT SELECT ON ALL TABLES IN SCHEMA public TO anon;

            -- ===============================================================
            -- END OF SCHEMA DUMP
            -- Generated: 2026-01-02 03:04:05 UTC
            -- ===============================================================
        "};
        let doc = render(&orders_snapshot());
        assert_eq!(doc, expected);
        assert!(!doc.contains("CREATE SEQUENCE"));
    }

    #[tokio::test]
    async fn test_extracted_orders_match_assembled_fixture() {
        let catalog = Catalog::new(orders_source(), &test_options());
        let mut snapshot = extract(&catalog, &test_options()).await.unwrap();
        snapshot.captured_at = test_snapshot().captured_at;
        snapshot.source = test_snapshot().source;
        assert_eq!(render(&snapshot), render(&orders_snapshot()));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let snapshot = full_snapshot();
        assert_eq!(render(&snapshot), render(&snapshot));
    }

    #[test]
    fn test_section_order() {
        let doc = render(&full_snapshot());
        let replica = position(&doc, "SET session_replication_role = replica;");
        let sequence = position(&doc, "CREATE SEQUENCE");
        let table = position(&doc, "CREATE TABLE");
        let view = position(&doc, "CREATE VIEW");
        let function = position(&doc, "CREATE OR REPLACE FUNCTION");
        let policy = position(&doc, "CREATE POLICY");
        let restore = position(&doc, "SET session_replication_role = DEFAULT;");

        assert!(replica < sequence);
        assert!(sequence < table);
        assert!(table < view);
        assert!(view < function);
        assert!(function < policy);
        assert!(policy < restore);
    }

    #[test]
    fn test_every_create_has_a_drop_guard() {
        let mut snapshot = full_snapshot();
        snapshot.tables.push(test_table("users"));
        snapshot.views.push(test_view("recent_users"));
        let doc = render(&snapshot);

        for table in &snapshot.tables {
            let drop = position(&doc, &format!("DROP TABLE IF EXISTS {} CASCADE;", table.name));
            let create = position(&doc, &format!("CREATE TABLE {} (", table.name));
            assert!(drop < create);
        }
        for view in &snapshot.views {
            let drop = position(&doc, &format!("DROP VIEW IF EXISTS {} CASCADE;", view.name));
            let create = position(&doc, &format!("CREATE VIEW {} AS", view.name));
            assert!(drop < create);
        }
    }

    #[test]
    fn test_forward_foreign_key_inside_integrity_bracket() {
        let mut accounts = test_table("accounts");
        accounts.constraints.push(ConstraintDescriptor {
            name: "accounts_owner_fkey".to_string(),
            constraint_type: ConstraintType::ForeignKey,
            columns: vec!["owner_id".to_string()],
            foreign_key: Some(ForeignKeyInfo {
                ref_schema: "public".to_string(),
                ref_table: "users".to_string(),
                ref_columns: vec!["id".to_string()],
                delete_rule: "CASCADE".to_string(),
                update_rule: "NO ACTION".to_string(),
            }),
        });
        let mut snapshot = test_snapshot();
        snapshot.tables.push(accounts);
        snapshot.tables.push(test_table("users"));

        let doc = render(&snapshot);
        let replica = position(&doc, "SET session_replication_role = replica;");
        let accounts = position(&doc, "CREATE TABLE accounts (");
        let users = position(&doc, "CREATE TABLE users (");
        let alter = position(
            &doc,
            "ALTER TABLE accounts ADD CONSTRAINT accounts_owner_fkey FOREIGN KEY (owner_id) REFERENCES users (id) ON DELETE CASCADE;",
        );
        let restore = position(&doc, "SET session_replication_role = DEFAULT;");

        assert!(replica < accounts);
        assert!(accounts < users);
        assert!(users < alter);
        assert!(alter < restore);
    }

    #[test]
    fn test_empty_namespace_document() {
        let snapshot = test_snapshot();
        let doc = render(&snapshot);

        assert!(doc.contains("SET session_replication_role = replica;"));
        assert!(doc.contains("SET session_replication_role = DEFAULT;"));
        assert!(doc.contains("-- END OF SCHEMA DUMP"));
        for header in ["-- SEQUENCES", "-- TABLES", "-- VIEWS", "-- FUNCTIONS", "-- ROW LEVEL"] {
            assert!(!doc.contains(header), "unexpected section {header}");
        }
        assert!(matches!(
            snapshot.ensure_populated(),
            Err(DumpError::EmptyNamespace(_))
        ));
    }

    #[test]
    fn test_policies_follow_their_tables() {
        let mut snapshot = orders_snapshot();
        snapshot.tables.push(test_table("users"));
        snapshot.policies.push(test_policy("orders", "a"));
        snapshot.policies.push(test_policy("users", "b"));
        let doc = render(&snapshot);

        assert!(
            position(&doc, "CREATE TABLE orders (") < position(&doc, "CREATE POLICY a ON orders")
        );
        assert!(
            position(&doc, "CREATE TABLE users (") < position(&doc, "CREATE POLICY b ON users")
        );
        assert!(position(&doc, "-- Policies for orders") < position(&doc, "-- Policies for users"));
    }

    #[test]
    fn test_omission_note() {
        let mut snapshot = orders_snapshot();
        snapshot.omissions.push(Omission {
            kind: EntityKind::Views,
            reason: "Catalog query `views` failed for public:\npermission denied".to_string(),
        });
        let doc = render(&snapshot);

        assert!(doc.contains("-- VIEWS (OMITTED)"));
        assert!(doc.contains(
            "-- NOTE: views could not be read and are missing from this script.\n\
             -- Cause: Catalog query `views` failed for public: permission denied\n"
        ));
    }

    #[test]
    fn test_table_header_notes_source_row_security() {
        let mut snapshot = orders_snapshot();
        let mut users = test_table("users");
        users.row_security = true;
        snapshot.tables.push(users);
        let doc = render(&snapshot);

        assert!(doc.contains("-- TABLE: orders\n"));
        assert!(doc.contains("-- TABLE: users (row level security enabled at source)\n"));
        assert!(doc.contains("ALTER TABLE orders ENABLE ROW LEVEL SECURITY;"));
        assert!(doc.contains("ALTER TABLE users ENABLE ROW LEVEL SECURITY;"));
    }

    #[test]
    fn test_non_default_namespace_sets_search_path() {
        let mut snapshot = orders_snapshot();
        snapshot.namespace = "billing".to_string();
        let doc = render(&snapshot);
        assert!(doc.contains(
            "CREATE SCHEMA IF NOT EXISTS billing;\nSET search_path = billing, public;\n"
        ));
        assert!(doc.contains("-- GRANT USAGE ON SCHEMA billing TO authenticated, anon;"));
        assert!(!render(&orders_snapshot()).contains("search_path"));
    }
}
