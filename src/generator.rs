//! Renders a [`Project`] as a T-SQL drop-and-recreate script.
//!
//! The script is written in one pass and in a fixed order: header, schema
//! guards, one CREATE TABLE block per table, then every foreign key, then
//! every index. Foreign keys come after all tables so their targets exist,
//! and indexes last so they only reference declared columns.

use crate::literal::{encode_default, quote};
use crate::measure::ColumnAlignment;
use crate::model::{
    resolve_schema, split_column_list, Column, ForeignKey, Index, Project, Table, TableKey,
    DEFAULT_SCHEMA,
};
use crate::naming::{self, NameScope};
use crate::types::column_type;
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorOptions {
    /// Schema assumed for tables with a blank schema; never gets a CREATE
    /// SCHEMA guard.
    pub default_schema: String,
    /// Line ending every block.
    pub batch_separator: String,
    /// Project name and timestamp comment at the top.
    pub include_header: bool,
    /// Pad column names so types line up.
    pub align_columns: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            default_schema: DEFAULT_SCHEMA.to_string(),
            batch_separator: "GO".to_string(),
            include_header: true,
            align_columns: false,
        }
    }
}

/// Bracket-quote an identifier.
pub fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Keep user text on a single comment line.
fn comment_text(text: &str) -> String {
    text.split(char::is_control)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tables of one project keyed by `(schema, name)`, built once per call.
///
/// Blank schemas resolve to `default_schema`, the same rule the generator
/// renders names with.
pub struct TableLookup<'a> {
    tables: HashMap<TableKey, &'a Table>,
    default_schema: String,
}

impl<'a> TableLookup<'a> {
    pub fn new(project: &'a Project, default_schema: &str) -> Self {
        let tables = project
            .tables
            .iter()
            .map(|t| (TableKey::of(t, default_schema), t))
            .collect();
        Self {
            tables,
            default_schema: default_schema.to_string(),
        }
    }

    pub fn get(&self, key: &TableKey) -> Option<&'a Table> {
        self.tables.get(key).copied()
    }

    /// Table a foreign key points at, if it is part of the project.
    pub fn target(&self, fk: &ForeignKey) -> Option<&'a Table> {
        self.get(&fk.target(&self.default_schema))
    }

    /// Foreign keys whose target table is not part of the project.
    pub fn dangling(&self, project: &'a Project) -> Vec<DanglingForeignKey<'a>> {
        project
            .tables
            .iter()
            .flat_map(|t| t.foreign_keys.iter().map(move |fk| (t, fk)))
            .filter(|(_, fk)| self.target(fk).is_none())
            .map(|(table, foreign_key)| DanglingForeignKey { table, foreign_key })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DanglingForeignKey<'a> {
    pub table: &'a Table,
    pub foreign_key: &'a ForeignKey,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptGenerator {
    options: GeneratorOptions,
}

impl ScriptGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Foreign key targets resolved with this generator's default schema.
    pub fn lookup<'a>(&self, project: &'a Project) -> TableLookup<'a> {
        TableLookup::new(project, &self.options.default_schema)
    }

    /// Copy of `project` with every blank table and reference schema filled
    /// in, so names are scoped by the schema they are created in.
    pub fn resolve_schemas(&self, project: &Project) -> Project {
        let mut project = project.clone();
        for table in &mut project.tables {
            table.schema = self.schema_of(&table.schema).to_string();
            for fk in &mut table.foreign_keys {
                fk.ref_schema = self.schema_of(&fk.ref_schema).to_string();
            }
        }
        project
    }

    /// Render the script stamped with the current time.
    ///
    /// Unnamed foreign keys get random suffixes, so two calls on the same
    /// project differ in those names.
    pub fn generate(&self, project: &Project) -> String {
        self.generate_with(project, Utc::now(), &mut rand::thread_rng())
    }

    /// Render with an explicit clock value and name RNG.
    pub fn generate_with<R: Rng>(
        &self,
        project: &Project,
        generated_at: DateTime<Utc>,
        rng: &mut R,
    ) -> String {
        let _span = tracing::debug_span!("generate", project = %project.name).entered();

        let project = &self.resolve_schemas(project);
        let mut output = String::new();
        let mut scope = NameScope::new();
        let lookup = self.lookup(project);

        self.write_header(&mut output, project, generated_at);
        self.write_schemas(&mut output, project);

        for table in &project.tables {
            self.write_table(&mut output, table, &mut scope);
        }

        for table in &project.tables {
            for fk in &table.foreign_keys {
                self.write_foreign_key(&mut output, table, fk, &lookup, &mut scope, rng);
            }
        }

        for table in &project.tables {
            for index in &table.indexes {
                self.write_index(&mut output, table, index, &mut scope);
            }
        }

        tracing::debug!(
            tables = project.tables.len(),
            names = scope.len(),
            bytes = output.len(),
            "script generated"
        );
        output
    }

    fn schema_of<'t>(&'t self, schema: &'t str) -> &'t str {
        resolve_schema(schema, &self.options.default_schema)
    }

    fn full_name(&self, schema: &str, name: &str) -> String {
        format!("{}.{}", quote_ident(self.schema_of(schema)), quote_ident(name))
    }

    fn end_batch(&self, output: &mut String) {
        output.push_str(&self.options.batch_separator);
        output.push_str("\n\n");
    }

    fn write_header(&self, output: &mut String, project: &Project, generated_at: DateTime<Utc>) {
        if self.options.include_header {
            output.push_str(&format!(
                "-- SQL generated for project: {}\n",
                comment_text(&project.name)
            ));
            if let Some(description) = project.description.as_deref().filter(|d| !d.trim().is_empty()) {
                output.push_str(&format!("-- Description: {}\n", comment_text(description)));
            }
            output.push_str(&format!(
                "-- Generated at: {}\n",
                generated_at.to_rfc3339_opts(SecondsFormat::Micros, true)
            ));
        }
        output.push_str("SET ANSI_NULLS ON;\n");
        output.push_str("SET QUOTED_IDENTIFIER ON;\n");
        self.end_batch(output);
    }

    /// One guarded CREATE SCHEMA per distinct schema other than the default
    /// and the built-in `dbo`, first spelling wins.
    fn write_schemas(&self, output: &mut String, project: &Project) {
        let mut seen = HashSet::new();

        for table in &project.tables {
            let schema = self.schema_of(&table.schema);
            if schema.eq_ignore_ascii_case(&self.options.default_schema)
                || schema.eq_ignore_ascii_case(DEFAULT_SCHEMA)
            {
                continue;
            }
            if !seen.insert(schema.to_lowercase()) {
                continue;
            }

            let create = format!("CREATE SCHEMA {}", quote_ident(schema));
            output.push_str(&format!(
                "IF NOT EXISTS (SELECT * FROM sys.schemas WHERE name = N{})\n",
                quote(schema)
            ));
            output.push_str(&format!("    EXEC({});\n", quote(&create)));
            self.end_batch(output);
        }
    }

    fn write_table(&self, output: &mut String, table: &Table, scope: &mut NameScope) {
        tracing::debug!(
            table = %table.name,
            columns = table.columns.len(),
            checks = table.check_constraints.len(),
            uniques = table.unique_constraints.len(),
            "rendering table"
        );

        let full_name = self.full_name(&table.schema, &table.name);
        output.push_str(&format!("-- Table {}\n", comment_text(&full_name)));
        output.push_str(&format!(
            "IF OBJECT_ID(N{}, N'U') IS NOT NULL DROP TABLE {};\n",
            quote(&full_name),
            full_name
        ));
        self.end_batch(output);

        let quoted_names: Vec<String> = table.columns.iter().map(|c| quote_ident(&c.name)).collect();
        let alignment = if self.options.align_columns {
            ColumnAlignment::for_names(quoted_names.iter().map(String::as_str))
        } else {
            ColumnAlignment::default()
        };

        let pk_count = table.primary_key_columns().count();
        let mut lines: Vec<String> = table
            .columns
            .iter()
            .zip(&quoted_names)
            .map(|(column, quoted)| {
                let sole_pk = column.is_primary_key && pk_count == 1;
                self.column_line(table, column, &alignment.pad(quoted), sole_pk, scope)
            })
            .collect();

        if let Some(line) = self.primary_key_line(table, scope) {
            lines.push(line);
        }

        for check in &table.check_constraints {
            let name = naming::check_name(scope, table, check);
            lines.push(format!(
                "    CONSTRAINT {} CHECK ({})",
                quote_ident(&name),
                check.expression
            ));
        }

        for unique in &table.unique_constraints {
            let columns = split_column_list(&unique.columns_csv);
            if columns.is_empty() {
                tracing::warn!(table = %table.name, "skipping unique constraint without columns");
                continue;
            }
            let name = naming::unique_name(scope, table, unique);
            lines.push(format!(
                "    CONSTRAINT {} UNIQUE ({})",
                quote_ident(&name),
                quote_list(&columns)
            ));
        }

        output.push_str(&format!("CREATE TABLE {}\n", full_name));
        output.push_str("(\n");
        if !lines.is_empty() {
            output.push_str(&lines.join(",\n"));
            output.push('\n');
        }
        output.push_str(");\n");
        self.end_batch(output);
    }

    fn column_line(
        &self,
        table: &Table,
        column: &Column,
        quoted_name: &str,
        sole_pk: bool,
        scope: &mut NameScope,
    ) -> String {
        let mut line = format!("    {} {}", quoted_name, column_type(column));

        if column.is_identity {
            line.push_str(&format!(
                " IDENTITY({},{})",
                column.identity_seed, column.identity_increment
            ));
        }

        line.push_str(if column.is_nullable { " NULL" } else { " NOT NULL" });

        if let Some(expr) = encode_default(column.default_sql.as_deref(), column.default_kind) {
            let name = naming::default_name(scope, table, column);
            line.push_str(&format!(" CONSTRAINT {} DEFAULT ({})", quote_ident(&name), expr));
        }

        // a unique sole key is already unique
        if column.is_unique && !sole_pk {
            let name = naming::column_unique_name(scope, table, column);
            line.push_str(&format!(" CONSTRAINT {} UNIQUE", quote_ident(&name)));
        }

        line
    }

    /// Key columns by `primary_key_order`; unordered columns last, in
    /// declaration order.
    fn primary_key_line(&self, table: &Table, scope: &mut NameScope) -> Option<String> {
        let mut key: Vec<&Column> = table.primary_key_columns().collect();
        if key.is_empty() {
            return None;
        }
        key.sort_by_key(|c| (c.primary_key_order.is_none(), c.primary_key_order));

        let columns: Vec<String> = key
            .iter()
            .map(|c| format!("{} ASC", quote_ident(&c.name)))
            .collect();
        let name = naming::primary_key_name(scope, table);

        Some(format!(
            "    CONSTRAINT {} PRIMARY KEY ({})",
            quote_ident(&name),
            columns.join(", ")
        ))
    }

    fn write_foreign_key<R: Rng>(
        &self,
        output: &mut String,
        table: &Table,
        fk: &ForeignKey,
        lookup: &TableLookup,
        scope: &mut NameScope,
        rng: &mut R,
    ) {
        if fk.columns.is_empty() {
            tracing::warn!(table = %table.name, target = %fk.ref_table, "skipping foreign key without columns");
            return;
        }
        if lookup.target(fk).is_none() {
            tracing::debug!(
                table = %table.name,
                target = %fk.ref_table,
                "foreign key target is not part of the project"
            );
        }

        let name = naming::foreign_key_name(scope, table, fk, rng);
        let columns: Vec<&str> = fk.columns.iter().map(|c| c.column_name.as_str()).collect();
        let ref_columns: Vec<&str> = fk.columns.iter().map(|c| c.ref_column_name.as_str()).collect();

        let on_delete = fk
            .on_delete_action
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(|a| format!(" ON DELETE {}", a))
            .unwrap_or_default();

        output.push_str(&format!(
            "ALTER TABLE {} ADD CONSTRAINT {}\n",
            self.full_name(&table.schema, &table.name),
            quote_ident(&name)
        ));
        output.push_str(&format!(
            "    FOREIGN KEY ({}) REFERENCES {} ({}){};\n",
            quote_list(&columns),
            self.full_name(&fk.ref_schema, &fk.ref_table),
            quote_list(&ref_columns),
            on_delete
        ));
        self.end_batch(output);
    }

    fn write_index(&self, output: &mut String, table: &Table, index: &Index, scope: &mut NameScope) {
        if index.columns.is_empty() {
            tracing::warn!(table = %table.name, "skipping index without columns");
            return;
        }

        let name = naming::index_name(scope, table, index);
        let unique = if index.is_unique { "UNIQUE " } else { "" };
        let columns: Vec<String> = index
            .columns
            .iter()
            .map(|c| {
                let direction = if c.descending { "DESC" } else { "ASC" };
                format!("{} {}", quote_ident(&c.column_name), direction)
            })
            .collect();

        let include = index
            .include_columns_csv
            .as_deref()
            .map(split_column_list)
            .filter(|cols| !cols.is_empty())
            .map(|cols| format!(" INCLUDE ({})", quote_list(&cols)))
            .unwrap_or_default();

        output.push_str(&format!(
            "CREATE {}INDEX {} ON {} ({}){};\n",
            unique,
            quote_ident(&name),
            self.full_name(&table.schema, &table.name),
            columns.join(", "),
            include
        ));
        self.end_batch(output);
    }
}

fn quote_list(names: &[&str]) -> String {
    names
        .iter()
        .map(|n| quote_ident(n))
        .collect::<Vec<_>>()
        .join(", ")
}
