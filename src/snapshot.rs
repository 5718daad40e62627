//! Loading a project snapshot from its stored JSON form.
//!
//! The generator accepts any structurally valid model; this is where required
//! fields and length limits are enforced before a project reaches it.

use crate::model::Project;
use thiserror::Error;

const MAX_NAME_LEN: usize = 200;
const MAX_TYPE_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{path} is required")]
    Required { path: String },
    #[error("{path} exceeds {max} characters")]
    TooLong { path: String, max: usize },
}

/// Parse and validate a snapshot.
pub fn from_json(input: &str) -> Result<Project, SnapshotError> {
    let project: Project = serde_json::from_str(input)?;
    validate(&project)?;
    Ok(project)
}

pub fn to_json(project: &Project) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string_pretty(project)?)
}

fn required(path: impl FnOnce() -> String, value: &str) -> Result<(), SnapshotError> {
    if value.trim().is_empty() {
        return Err(SnapshotError::Required { path: path() });
    }
    Ok(())
}

fn bounded(
    path: impl Fn() -> String,
    value: &str,
    max: usize,
) -> Result<(), SnapshotError> {
    required(&path, value)?;
    if value.chars().count() > max {
        return Err(SnapshotError::TooLong { path: path(), max });
    }
    Ok(())
}

/// Check required fields and length limits. Reports the first violation.
pub fn validate(project: &Project) -> Result<(), SnapshotError> {
    bounded(|| "name".to_string(), &project.name, MAX_NAME_LEN)?;

    for (t, table) in project.tables.iter().enumerate() {
        let at = |field: &str| format!("tables[{}].{}", t, field);
        bounded(|| at("name"), &table.name, MAX_NAME_LEN)?;

        for (c, column) in table.columns.iter().enumerate() {
            bounded(|| at(&format!("columns[{}].name", c)), &column.name, MAX_NAME_LEN)?;
            bounded(
                || at(&format!("columns[{}].dataType", c)),
                &column.data_type,
                MAX_TYPE_LEN,
            )?;
        }

        for (f, fk) in table.foreign_keys.iter().enumerate() {
            required(|| at(&format!("foreignKeys[{}].refTable", f)), &fk.ref_table)?;
            for (i, pair) in fk.columns.iter().enumerate() {
                required(
                    || at(&format!("foreignKeys[{}].columns[{}].columnName", f, i)),
                    &pair.column_name,
                )?;
                required(
                    || at(&format!("foreignKeys[{}].columns[{}].refColumnName", f, i)),
                    &pair.ref_column_name,
                )?;
            }
        }

        for (x, index) in table.indexes.iter().enumerate() {
            for (i, column) in index.columns.iter().enumerate() {
                required(
                    || at(&format!("indexes[{}].columns[{}].columnName", x, i)),
                    &column.column_name,
                )?;
            }
        }

        for (k, check) in table.check_constraints.iter().enumerate() {
            required(|| at(&format!("checkConstraints[{}].expression", k)), &check.expression)?;
        }

        for (u, unique) in table.unique_constraints.iter().enumerate() {
            required(|| at(&format!("uniqueConstraints[{}].columnsCsv", u)), &unique.columns_csv)?;
        }
    }

    Ok(())
}

/// File name for a project's script: path-hostile characters become `_`.
pub fn script_file_name(project_name: &str) -> String {
    let sanitized: String = project_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let sanitized = sanitized.trim();
    if sanitized.is_empty() {
        "project.sql".to_string()
    } else {
        format!("{}.sql", sanitized)
    }
}
