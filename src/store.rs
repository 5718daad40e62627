//! Project persistence.
//!
//! The generator never loads anything itself; callers fetch a [`Project`]
//! through a [`ProjectStore`] and hand it over. Saving replaces a project's
//! whole structure.

use crate::model::Project;
use crate::snapshot::{self, SnapshotError};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Project not found: {0}")]
    NotFound(String),
    #[error("Invalid project id: {0:?}")]
    InvalidId(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Project {id}: {source}")]
    Snapshot {
        id: String,
        #[source]
        source: SnapshotError,
    },
}

/// Listing entry for one stored project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub tables_count: usize,
}

pub trait ProjectStore {
    fn list(&self) -> Result<Vec<ProjectSummary>, StoreError>;
    fn load(&self, id: &str) -> Result<Project, StoreError>;
    /// Create or replace.
    fn save(&self, id: &str, project: &Project) -> Result<(), StoreError>;
    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

/// One `<id>.json` snapshot per project in a directory.
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }

    fn io_error(path: &Path, source: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl ProjectStore for JsonDirStore {
    fn list(&self) -> Result<Vec<ProjectSummary>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| Self::io_error(&self.root, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Self::io_error(&self.root, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();

        let mut summaries = Vec::with_capacity(ids.len());
        for id in ids {
            match self.load(&id) {
                Ok(project) => summaries.push(ProjectSummary {
                    id,
                    name: project.name,
                    tables_count: project.tables.len(),
                }),
                Err(StoreError::InvalidId(_)) => continue,
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping unreadable project");
                }
            }
        }
        Ok(summaries)
    }

    fn load(&self, id: &str) -> Result<Project, StoreError> {
        let path = self.path_for(id)?;
        let content = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(Self::io_error(&path, e)),
        };
        snapshot::from_json(&content).map_err(|source| StoreError::Snapshot {
            id: id.to_string(),
            source,
        })
    }

    fn save(&self, id: &str, project: &Project) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        let snapshot_error = |source| StoreError::Snapshot {
            id: id.to_string(),
            source,
        };
        snapshot::validate(project).map_err(snapshot_error)?;
        let json = snapshot::to_json(project).map_err(snapshot_error)?;

        // readers only ever see the old or the new file
        let tmp = self.root.join(format!(".{}.json.tmp", id));
        fs::write(&tmp, json).map_err(|e| Self::io_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| Self::io_error(&path, e))?;

        tracing::info!(id, tables = project.tables.len(), "project saved");
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(id.to_string())),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }
}
