//! Per-project serialized access to a [`DocumentStore`].
//!
//! Every project gets its own reader/writer gate. Mutations hold the write
//! gate across load, mutate and replace, so two concurrent undos can never
//! pop the same snapshot. Reads hold the read gate and always observe a
//! complete layer list.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::{CoreResult, DocumentStore, MemoryDocumentStore, Project, ProjectId};

/// Thread-safe project access shared by all request handlers.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    documents: Arc<dyn DocumentStore>,
    gates: Arc<Mutex<HashMap<ProjectId, Arc<RwLock<()>>>>>,
    history_limit: Option<usize>,
}

impl ProjectStore {
    /// Wrap a document store.
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            gates: Arc::new(Mutex::new(HashMap::new())),
            history_limit: None,
        }
    }

    /// A store backed by memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryDocumentStore::new()))
    }

    /// Cap the undo history kept by [`mutate`](Self::mutate).
    #[must_use]
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    /// The configured history cap, if any.
    #[must_use]
    pub fn history_limit(&self) -> Option<usize> {
        self.history_limit
    }

    fn gate(&self, id: ProjectId) -> Arc<RwLock<()>> {
        let mut gates = self
            .gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(gates.entry(id).or_default())
    }

    /// Persist a new project and return its id.
    ///
    /// # Errors
    ///
    /// Propagates document store failures.
    pub fn create(&self, project: &Project) -> CoreResult<ProjectId> {
        let gate = self.gate(project.id);
        let _guard = gate
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        self.documents.insert(project)?;
        tracing::debug!("Created project {}", project.id);
        Ok(project.id)
    }

    /// Load a consistent copy of a project.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProjectNotFound`] for unknown ids.
    pub fn get(&self, id: ProjectId) -> CoreResult<Project> {
        self.read(id, |project| Ok(project.clone()))
    }

    /// Run `f` against the stored project under the read gate.
    ///
    /// # Errors
    ///
    /// Propagates load failures and errors returned by `f`.
    pub fn read<T>(&self, id: ProjectId, f: impl FnOnce(&Project) -> CoreResult<T>) -> CoreResult<T> {
        let gate = self.gate(id);
        let _guard = gate
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let project = self.documents.get(id)?;
        f(&project)
    }

    /// Run `f` against the stored project under the write gate and persist
    /// the result. Nothing is written if `f` fails.
    ///
    /// # Errors
    ///
    /// Propagates load, persistence and closure errors.
    pub fn update<T>(
        &self,
        id: ProjectId,
        f: impl FnOnce(&mut Project) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let gate = self.gate(id);
        let _guard = gate
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut project = self.documents.get(id)?;
        let value = f(&mut project)?;
        self.documents.replace(&project)?;
        Ok(value)
    }

    /// Snapshot the project, then apply a structural mutation.
    ///
    /// The snapshot and the mutation are persisted together, and the
    /// history cap is enforced afterwards.
    ///
    /// # Errors
    ///
    /// Propagates load, persistence and closure errors.
    pub fn mutate<T>(
        &self,
        id: ProjectId,
        f: impl FnOnce(&mut Project) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let limit = self.history_limit;
        self.update(id, |project| {
            project.snapshot();
            let value = f(project)?;
            if let Some(limit) = limit {
                project.trim_history(limit);
            }
            Ok(value)
        })
    }

    /// Delete a project and forget its gate.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProjectNotFound`] for unknown ids.
    pub fn delete(&self, id: ProjectId) -> CoreResult<()> {
        let gate = self.gate(id);
        {
            let _guard = gate
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            self.documents.delete(id)?;
        }
        let mut gates = self
            .gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        gates.remove(&id);
        tracing::debug!("Deleted project {id}");
        Ok(())
    }

    /// Ids of all stored projects.
    ///
    /// # Errors
    ///
    /// Propagates document store failures.
    pub fn list(&self) -> CoreResult<Vec<ProjectId>> {
        self.documents.list()
    }
}
