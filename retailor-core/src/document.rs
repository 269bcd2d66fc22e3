//! Persistent project records.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::{CoreError, CoreResult, Layer, Project, ProjectId};

/// Keyed record store for projects.
///
/// Implementations only guarantee per-call atomicity; serializing
/// read-modify-write sequences is the job of [`crate::ProjectStore`].
pub trait DocumentStore: Send + Sync + fmt::Debug {
    /// Fetch a project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProjectNotFound`] for unknown ids.
    fn get(&self, id: ProjectId) -> CoreResult<Project>;

    /// Store a new project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidArgument`] if the id is already taken.
    fn insert(&self, project: &Project) -> CoreResult<()>;

    /// Overwrite an existing project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProjectNotFound`] for unknown ids.
    fn replace(&self, project: &Project) -> CoreResult<()>;

    /// Append one layer to a stored project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProjectNotFound`] for unknown ids.
    fn append_layer(&self, id: ProjectId, layer: &Layer) -> CoreResult<()> {
        let mut project = self.get(id)?;
        project.layers.push(layer.clone());
        self.replace(&project)
    }

    /// Remove a project.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ProjectNotFound`] for unknown ids.
    fn delete(&self, id: ProjectId) -> CoreResult<()>;

    /// Ids of all stored projects.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] on I/O failure.
    fn list(&self) -> CoreResult<Vec<ProjectId>>;
}

/// In-memory document store.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    projects: RwLock<HashMap<ProjectId, Project>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, id: ProjectId) -> CoreResult<Project> {
        let projects = self
            .projects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        projects
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::ProjectNotFound(id.to_string()))
    }

    fn insert(&self, project: &Project) -> CoreResult<()> {
        let mut projects = self
            .projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if projects.contains_key(&project.id) {
            return Err(CoreError::invalid(format!(
                "project {} already exists",
                project.id
            )));
        }
        projects.insert(project.id, project.clone());
        Ok(())
    }

    fn replace(&self, project: &Project) -> CoreResult<()> {
        let mut projects = self
            .projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let slot = projects
            .get_mut(&project.id)
            .ok_or_else(|| CoreError::ProjectNotFound(project.id.to_string()))?;
        *slot = project.clone();
        Ok(())
    }

    fn append_layer(&self, id: ProjectId, layer: &Layer) -> CoreResult<()> {
        let mut projects = self
            .projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let project = projects
            .get_mut(&id)
            .ok_or_else(|| CoreError::ProjectNotFound(id.to_string()))?;
        project.layers.push(layer.clone());
        Ok(())
    }

    fn delete(&self, id: ProjectId) -> CoreResult<()> {
        let mut projects = self
            .projects
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        projects
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CoreError::ProjectNotFound(id.to_string()))
    }

    fn list(&self) -> CoreResult<Vec<ProjectId>> {
        let projects = self
            .projects
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut ids: Vec<_> = projects.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

/// Filesystem document store: one pretty-printed JSON file per project.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    dir: PathBuf,
}

impl FsDocumentStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Store`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, id: ProjectId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write through a temporary file so readers never see a torn document.
    fn write(&self, project: &Project) -> CoreResult<()> {
        let json = serde_json::to_string_pretty(project)?;
        let path = self.path(project.id);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl DocumentStore for FsDocumentStore {
    fn get(&self, id: ProjectId) -> CoreResult<Project> {
        let contents = match std::fs::read_to_string(self.path(id)) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::ProjectNotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Project::from_json(&contents)
    }

    fn insert(&self, project: &Project) -> CoreResult<()> {
        if self.path(project.id).exists() {
            return Err(CoreError::invalid(format!(
                "project {} already exists",
                project.id
            )));
        }
        self.write(project)
    }

    fn replace(&self, project: &Project) -> CoreResult<()> {
        if !self.path(project.id).exists() {
            return Err(CoreError::ProjectNotFound(project.id.to_string()));
        }
        self.write(project)
    }

    fn delete(&self, id: ProjectId) -> CoreResult<()> {
        match std::fs::remove_file(self.path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CoreError::ProjectNotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> CoreResult<Vec<ProjectId>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    match ProjectId::parse(stem) {
                        Ok(id) => ids.push(id),
                        Err(e) => tracing::warn!("Skipping {}: {e}", path.display()),
                    }
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
