//! Catalog SQL shared by every row source.
//!
//! `$1` is always the namespace and `$2`, when present, the table name.

/// A named, read-only catalog query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogQuery {
    pub operation: &'static str,
    pub sql: &'static str,
}

pub const TABLES: CatalogQuery = CatalogQuery {
    operation: "tables",
    sql: r#"
        SELECT t.table_name::text AS table_name,
               COALESCE(c.relrowsecurity, false) AS row_security
        FROM information_schema.tables t
        LEFT JOIN pg_namespace n ON n.nspname = t.table_schema
        LEFT JOIN pg_class c ON c.relnamespace = n.oid AND c.relname = t.table_name
        WHERE t.table_schema = $1
          AND t.table_type = 'BASE TABLE'
        ORDER BY t.table_name
        "#,
};

pub const COLUMNS: CatalogQuery = CatalogQuery {
    operation: "columns",
    sql: r#"
        SELECT c.column_name::text AS column_name,
               c.ordinal_position::int4 AS ordinal_position,
               c.is_nullable = 'YES' AS is_nullable,
               c.data_type::text AS data_type,
               c.udt_name::text AS udt_name,
               c.character_maximum_length::int4 AS character_maximum_length,
               c.numeric_precision::int4 AS numeric_precision,
               c.numeric_scale::int4 AS numeric_scale,
               c.column_default::text AS column_default,
               c.identity_generation::text AS identity_generation
        FROM information_schema.columns c
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#,
};

pub const PRIMARY_KEY: CatalogQuery = CatalogQuery {
    operation: "primary_key",
    sql: r#"
        SELECT tc.constraint_name::text AS constraint_name,
               kcu.column_name::text AS column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_name = tc.constraint_name
            AND kcu.table_schema = tc.table_schema
            AND kcu.table_name = tc.table_name
        WHERE tc.table_schema = $1 AND tc.table_name = $2
            AND tc.constraint_type = 'PRIMARY KEY'
        ORDER BY kcu.ordinal_position
        "#,
};

pub const UNIQUE_CONSTRAINTS: CatalogQuery = CatalogQuery {
    operation: "unique_constraints",
    sql: r#"
        SELECT tc.constraint_name::text AS constraint_name,
               kcu.column_name::text AS column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON kcu.constraint_name = tc.constraint_name
            AND kcu.table_schema = tc.table_schema
            AND kcu.table_name = tc.table_name
        WHERE tc.table_schema = $1 AND tc.table_name = $2
            AND tc.constraint_type = 'UNIQUE'
        ORDER BY tc.constraint_name, kcu.ordinal_position
        "#,
};

// Keyed on the owning relation: constraint names are only unique per table.
// Each local column is paired with the referenced column at the same position.
pub const FOREIGN_KEYS: CatalogQuery = CatalogQuery {
    operation: "foreign_keys",
    sql: r#"
        SELECT con.conname::text AS constraint_name,
               att.attname::text AS column_name,
               rn.nspname::text AS ref_schema,
               rt.relname::text AS ref_table,
               ratt.attname::text AS ref_column,
               CASE con.confupdtype
                   WHEN 'r' THEN 'RESTRICT'
                   WHEN 'c' THEN 'CASCADE'
                   WHEN 'n' THEN 'SET NULL'
                   WHEN 'd' THEN 'SET DEFAULT'
                   ELSE 'NO ACTION'
               END AS update_rule,
               CASE con.confdeltype
                   WHEN 'r' THEN 'RESTRICT'
                   WHEN 'c' THEN 'CASCADE'
                   WHEN 'n' THEN 'SET NULL'
                   WHEN 'd' THEN 'SET DEFAULT'
                   ELSE 'NO ACTION'
               END AS delete_rule
        FROM pg_constraint con
        JOIN pg_class t ON t.oid = con.conrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        JOIN pg_class rt ON rt.oid = con.confrelid
        JOIN pg_namespace rn ON rn.oid = rt.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS k(attnum, ref_attnum, ord)
        JOIN pg_attribute att
            ON att.attrelid = con.conrelid AND att.attnum = k.attnum
        JOIN pg_attribute ratt
            ON ratt.attrelid = con.confrelid AND ratt.attnum = k.ref_attnum
        WHERE con.contype = 'f'
          AND n.nspname = $1 AND t.relname = $2
        ORDER BY con.conname, k.ord
        "#,
};

// Indexes owned by a primary-key or unique constraint are recreated by the
// constraint itself.
pub const INDEXES: CatalogQuery = CatalogQuery {
    operation: "indexes",
    sql: r#"
        SELECT i.relname::text AS index_name,
               pg_get_indexdef(ix.indexrelid) AS index_def
        FROM pg_index ix
        JOIN pg_class t ON t.oid = ix.indrelid
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_namespace n ON n.oid = t.relnamespace
        WHERE n.nspname = $1 AND t.relname = $2
          AND NOT ix.indisprimary
          AND NOT EXISTS (
              SELECT 1 FROM pg_constraint con
              WHERE con.conindid = ix.indexrelid
                AND con.conrelid = ix.indrelid
                AND con.contype IN ('p', 'u')
          )
        ORDER BY i.relname
        "#,
};

pub const TRIGGERS: CatalogQuery = CatalogQuery {
    operation: "triggers",
    sql: r#"
        SELECT tr.trigger_name::text AS trigger_name,
               tr.action_timing::text AS action_timing,
               tr.event_manipulation::text AS event_manipulation
        FROM information_schema.triggers tr
        WHERE tr.event_object_schema = $1 AND tr.event_object_table = $2
        ORDER BY tr.trigger_name, tr.event_manipulation
        "#,
};

// Identity sequences are recreated by their column's GENERATED clause.
pub const SEQUENCES: CatalogQuery = CatalogQuery {
    operation: "sequences",
    sql: r#"
        SELECT s.sequence_name::text AS sequence_name,
               s.data_type::text AS data_type,
               s.start_value::int8 AS start_value,
               s.minimum_value::int8 AS minimum_value,
               s.maximum_value::int8 AS maximum_value,
               s.increment::int8 AS increment,
               s.cycle_option = 'YES' AS cycle
        FROM information_schema.sequences s
        WHERE s.sequence_schema = $1
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend d
              JOIN pg_class c ON c.oid = d.objid
              JOIN pg_namespace n ON n.oid = c.relnamespace
              WHERE d.classid = 'pg_class'::regclass
                AND d.deptype = 'i'
                AND n.nspname = s.sequence_schema
                AND c.relname = s.sequence_name
          )
        ORDER BY s.sequence_name
        "#,
};

pub const VIEWS: CatalogQuery = CatalogQuery {
    operation: "views",
    sql: r#"
        SELECT v.viewname::text AS view_name, v.definition
        FROM pg_views v
        WHERE v.schemaname = $1
        ORDER BY v.viewname
        "#,
};

// Aggregates and window functions have no pg_get_functiondef output;
// extension members belong to CREATE EXTENSION.
pub const FUNCTIONS: CatalogQuery = CatalogQuery {
    operation: "functions",
    sql: r#"
        SELECT p.proname::text AS function_name,
               pg_get_function_identity_arguments(p.oid) AS arguments,
               pg_get_functiondef(p.oid) AS definition
        FROM pg_proc p
        JOIN pg_namespace n ON n.oid = p.pronamespace
        WHERE n.nspname = $1
          AND p.prokind IN ('f', 'p')
          AND NOT EXISTS (
              SELECT 1 FROM pg_depend d
              WHERE d.classid = 'pg_proc'::regclass
                AND d.objid = p.oid
                AND d.deptype = 'e'
          )
        ORDER BY p.proname, arguments
        "#,
};

pub const POLICIES: CatalogQuery = CatalogQuery {
    operation: "policies",
    sql: r#"
        SELECT p.tablename::text AS table_name,
               p.policyname::text AS policy_name,
               p.permissive = 'PERMISSIVE' AS permissive,
               p.roles::text[] AS roles,
               p.cmd AS command,
               p.qual,
               p.with_check
        FROM pg_policies p
        WHERE p.schemaname = $1
        ORDER BY p.tablename, p.policyname
        "#,
};
