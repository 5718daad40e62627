//! Column type resolution.

use crate::model::Column;

const MAX: &str = "max";
const FIXED_DEFAULT_LENGTH: i32 = 50;
const DEFAULT_PRECISION: i32 = 18;
const MAX_PRECISION: i32 = 38;

/// How a type token takes its size parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    /// Variable length with a hard cap above which only `max` is allowed.
    Variable { cap: i32 },
    /// Fixed length with a hard cap; `max` is not allowed.
    Fixed { cap: i32 },
    /// Precision and scale.
    Decimal,
    /// Known type without parameters.
    Scalar,
    /// Anything else: emitted verbatim.
    Custom,
}

impl TypeFamily {
    /// Classify a lowercased type token.
    pub fn of(token: &str) -> Self {
        match token {
            "varchar" | "varbinary" => Self::Variable { cap: 8000 },
            "nvarchar" => Self::Variable { cap: 4000 },
            "char" => Self::Fixed { cap: 8000 },
            "nchar" => Self::Fixed { cap: 4000 },
            "decimal" | "numeric" => Self::Decimal,

            // Date/time
            "datetime" | "smalldatetime" | "date" | "time" | "datetime2" | "datetimeoffset"
            // Boolean and integers
            | "bit" | "int" | "bigint" | "smallint" | "tinyint"
            | "uniqueidentifier"
            // Legacy LOBs
            | "text" | "ntext" | "image"
            | "float" | "real" | "money" | "smallmoney"
            | "xml" | "geography" | "geometry" => Self::Scalar,

            _ => Self::Custom,
        }
    }
}

/// Resolve a column's type clause.
pub fn column_type(column: &Column) -> String {
    resolve_type(
        &column.data_type,
        column.length,
        column.precision,
        column.scale,
    )
}

/// Map a type token and its size parameters to a type clause.
///
/// Out-of-range parameters are clamped to defaults, never rejected.
pub fn resolve_type(
    data_type: &str,
    length: Option<i32>,
    precision: Option<i32>,
    scale: Option<i32>,
) -> String {
    let token = data_type.trim().to_lowercase();

    match TypeFamily::of(&token) {
        TypeFamily::Variable { cap } => {
            let len = match length {
                Some(n) if n > 0 && n <= cap => n.to_string(),
                _ => MAX.to_string(),
            };
            format!("{}({})", token, len)
        }
        TypeFamily::Fixed { cap } => {
            let len = match length {
                None => FIXED_DEFAULT_LENGTH,
                // anything that would have become `max`
                Some(n) if n <= 0 || n > cap => 1,
                Some(n) => n,
            };
            format!("{}({})", token, len)
        }
        TypeFamily::Decimal => {
            let precision = precision
                .filter(|p| (1..=MAX_PRECISION).contains(p))
                .unwrap_or(DEFAULT_PRECISION);
            let scale = scale
                .filter(|s| (0..=precision).contains(s))
                .unwrap_or(precision.min(2));
            format!("{}({},{})", token, precision, scale)
        }
        TypeFamily::Scalar => token,
        TypeFamily::Custom => data_type.to_string(),
    }
}
