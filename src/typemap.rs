use crate::catalog::records::ColumnDescriptor;
use crate::error::DumpError;

/// Length used for `character varying` columns declared without one.
pub const DEFAULT_VARCHAR_LENGTH: i32 = 255;
/// Precision and scale used for `numeric` columns declared without them.
pub const DEFAULT_NUMERIC_PRECISION: i32 = 10;
pub const DEFAULT_NUMERIC_SCALE: i32 = 0;

/// Map a catalog column descriptor to the type token used in `CREATE TABLE`.
///
/// Keyed on `information_schema.columns.data_type`. Anything not special-cased
/// passes through unchanged, so the only failure is a blank type name.
pub fn map_column_type(col: &ColumnDescriptor) -> Result<String, DumpError> {
    let data_type = col.data_type.trim();
    if data_type.is_empty() {
        return Err(unsupported(col));
    }

    let mapped = match data_type {
        "character varying" => format!(
            "VARCHAR({})",
            col.character_maximum_length.unwrap_or(DEFAULT_VARCHAR_LENGTH)
        ),
        "timestamp without time zone" => "TIMESTAMP".to_string(),
        "timestamp with time zone" => "TIMESTAMPTZ".to_string(),
        "numeric" => format!(
            "NUMERIC({},{})",
            col.numeric_precision.unwrap_or(DEFAULT_NUMERIC_PRECISION),
            col.numeric_scale.unwrap_or(DEFAULT_NUMERIC_SCALE)
        ),
        // udt_name of an array is its element type prefixed with '_'
        "ARRAY" => {
            let element = col.udt_name.strip_prefix('_').unwrap_or(&col.udt_name);
            if element.is_empty() {
                return Err(unsupported(col));
            }
            format!("{element}[]")
        }
        "USER-DEFINED" => {
            if col.udt_name.is_empty() {
                return Err(unsupported(col));
            }
            col.udt_name.clone()
        }
        other => other.to_string(),
    };

    Ok(mapped)
}

fn unsupported(col: &ColumnDescriptor) -> DumpError {
    DumpError::UnsupportedTypeDescriptor {
        raw_type: format!("{} ({})", col.data_type, col.udt_name),
    }
}
