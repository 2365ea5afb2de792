pub mod dump;
pub mod metadata;
pub mod statements;

use crate::error::DumpError;
use crate::schema::SchemaSnapshot;

/// Trait for document generators.
pub trait Generator {
    fn generate(&self, snapshot: &SchemaSnapshot) -> Result<String, DumpError>;
}

/// Keywords PostgreSQL will not accept as a bare column or table name.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric",
    "authorization", "binary", "both", "case", "cast", "check", "collate", "collation",
    "column", "concurrently", "constraint", "create", "cross", "current_catalog",
    "current_date", "current_role", "current_schema", "current_time", "current_timestamp",
    "current_user", "default", "deferrable", "desc", "distinct", "do", "else", "end",
    "except", "false", "fetch", "for", "foreign", "freeze", "from", "full", "grant",
    "group", "having", "ilike", "in", "initially", "inner", "intersect", "into", "is",
    "isnull", "join", "lateral", "leading", "left", "like", "limit", "localtime",
    "localtimestamp", "natural", "not", "notnull", "null", "offset", "on", "only", "or",
    "order", "outer", "overlaps", "placing", "primary", "references", "returning", "right",
    "select", "session_user", "similar", "some", "symmetric", "system_user", "table",
    "tablesample", "then", "to", "trailing", "true", "union", "unique", "user", "using",
    "variadic", "verbose", "when", "where", "window", "with",
];

/// Quote an identifier only when PostgreSQL would not read it back unchanged.
/// e.g. "orders" -> "orders"
/// e.g. "Order Items" -> "\"Order Items\""
/// e.g. "user" -> "\"user\""
pub fn quote_ident(ident: &str) -> String {
    let mut chars = ident.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$'
                })
        }
        None => false,
    };

    if plain && !RESERVED_WORDS.contains(&ident) {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

/// Quote and comma-join a column list.
pub fn join_idents(idents: &[String]) -> String {
    idents
        .iter()
        .map(|i| quote_ident(i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Trim trailing whitespace and statement terminators from catalog SQL text
/// so a single `;` can be appended.
/// e.g. " SELECT 1;\n" -> " SELECT 1"
pub fn strip_terminator(sql: &str) -> &str {
    sql.trim_end().trim_end_matches(';').trim_end()
}

/// Fold a multi-line message onto one comment line.
pub fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
