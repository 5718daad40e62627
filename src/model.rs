//! Schema model consumed by the script generator.
//!
//! Plain data: the generator only ever reads it. Field names follow the
//! stored JSON representation (camelCase) so a snapshot deserializes straight
//! into these types.

use serde::{Deserialize, Serialize};

/// Built-in schema; always exists on the server.
pub const DEFAULT_SCHEMA: &str = "dbo";

/// `schema`, or `default_schema` when it is blank.
pub fn resolve_schema<'a>(schema: &'a str, default_schema: &'a str) -> &'a str {
    let schema = schema.trim();
    if schema.is_empty() {
        default_schema
    } else {
        schema
    }
}

fn one() -> i32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Blank means the generator's default schema.
    #[serde(default)]
    pub schema: String,
    pub name: String,
    /// Overrides the derived `PK_<table>` name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key_name: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub check_constraints: Vec<CheckConstraint>,
    #[serde(default)]
    pub unique_constraints: Vec<UniqueConstraint>,
}

impl Table {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            primary_key_name: None,
            columns: vec![],
            foreign_keys: vec![],
            indexes: vec![],
            check_constraints: vec![],
            unique_constraints: vec![],
        }
    }

    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_primary_key)
    }
}

/// How `Column::default_sql` is rendered into the DEFAULT clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefaultKind {
    #[default]
    None,
    /// Trusted SQL such as `GETDATE()` or `(1+2)`, emitted unchanged.
    RawExpression,
    /// A value; strings are quoted and escaped.
    Literal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    /// e.g. "int", "nvarchar", "decimal", "datetime2"
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<i32>,
    #[serde(default)]
    pub is_nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    /// Position within a composite key. Only read when `is_primary_key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key_order: Option<i32>,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default = "one")]
    pub identity_seed: i32,
    #[serde(default = "one")]
    pub identity_increment: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sql: Option<String>,
    #[serde(default)]
    pub default_kind: DefaultKind,
    #[serde(default)]
    pub is_unique: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            length: None,
            precision: None,
            scale: None,
            is_nullable: false,
            is_primary_key: false,
            primary_key_order: None,
            is_identity: false,
            identity_seed: 1,
            identity_increment: 1,
            default_sql: None,
            default_kind: DefaultKind::None,
            is_unique: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Blank means the generator's default schema.
    #[serde(default)]
    pub ref_schema: String,
    pub ref_table: String,
    /// "NO ACTION" | "CASCADE" | "SET NULL" | "SET DEFAULT"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete_action: Option<String>,
    #[serde(default)]
    pub columns: Vec<ForeignKeyColumn>,
}

impl ForeignKey {
    /// Lookup key of the referenced table.
    pub fn target(&self, default_schema: &str) -> TableKey {
        TableKey::new(&self.ref_schema, &self.ref_table, default_schema)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyColumn {
    pub column_name: String,
    pub ref_column_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub columns: Vec<IndexColumn>,
    /// Optional "ColA,ColB" list for the INCLUDE clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_columns_csv: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    pub column_name: String,
    #[serde(default)]
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns_csv: String,
}

/// Case-insensitive `(schema, name)` key a foreign key uses to find its
/// target table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableKey {
    pub schema: String,
    pub name: String,
}

impl TableKey {
    pub fn new(schema: &str, name: &str, default_schema: &str) -> Self {
        Self {
            schema: resolve_schema(schema, default_schema).to_lowercase(),
            name: name.trim().to_lowercase(),
        }
    }

    pub fn of(table: &Table, default_schema: &str) -> Self {
        Self::new(&table.schema, &table.name, default_schema)
    }
}

/// Split delimited column text ("A, B,,C") into trimmed, non-empty names.
pub fn split_column_list(csv: &str) -> Vec<&str> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
