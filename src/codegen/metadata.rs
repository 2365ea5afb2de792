use serde::Serialize;

use crate::codegen::Generator;
use crate::error::DumpError;
use crate::schema::SchemaSnapshot;

/// JSON summary of what a dump contains, written next to the SQL script.
pub struct MetadataGenerator;

#[derive(Serialize)]
struct Summary<'a> {
    generated: String,
    namespace: &'a str,
    source: &'a str,
    tables: Vec<&'a str>,
    views: Vec<&'a str>,
    functions: Vec<FunctionSummary<'a>>,
    sequences: Vec<&'a str>,
    policies: Vec<PolicySummary<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    omitted: Vec<String>,
}

#[derive(Serialize)]
struct FunctionSummary<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Serialize)]
struct PolicySummary<'a> {
    table: &'a str,
    name: &'a str,
}

impl Generator for MetadataGenerator {
    fn generate(&self, snapshot: &SchemaSnapshot) -> Result<String, DumpError> {
        let summary = Summary {
            generated: snapshot.captured_at.to_rfc3339(),
            namespace: &snapshot.namespace,
            source: &snapshot.source,
            tables: snapshot.tables.iter().map(|t| t.name.as_str()).collect(),
            views: snapshot.views.iter().map(|v| v.name.as_str()).collect(),
            functions: snapshot
                .functions
                .iter()
                .map(|f| FunctionSummary {
                    name: &f.name,
                    arguments: &f.arguments,
                })
                .collect(),
            sequences: snapshot.sequences.iter().map(|s| s.name.as_str()).collect(),
            policies: snapshot
                .policies
                .iter()
                .map(|p| PolicySummary {
                    table: &p.table,
                    name: &p.name,
                })
                .collect(),
            omitted: snapshot
                .omissions
                .iter()
                .map(|o| o.kind.to_string())
                .collect(),
        };

        let mut out = serde_json::to_string_pretty(&summary)?;
        out.push('\n');
        Ok(out)
    }
}
