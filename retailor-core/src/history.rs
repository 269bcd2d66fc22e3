//! Linear undo/redo over a project's layer list.
//!
//! Every structural mutation is preceded by [`Project::snapshot`], which
//! pushes a deep copy of the current layers and truncates the redo branch.
//! Undo and redo only move whole layer lists between `layers`, `history`
//! and `future`; they never mint new layer ids.

use crate::{CoreError, CoreResult, Layer, Project};

impl Project {
    /// Record the current layers on the undo stack and clear the redo stack.
    pub fn snapshot(&mut self) {
        self.history.push(self.layers.clone());
        self.future.clear();
    }

    /// Restore the most recent snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NothingToUndo`] if the history is empty.
    pub fn undo(&mut self) -> CoreResult<&[Layer]> {
        let previous = self.history.pop().ok_or(CoreError::NothingToUndo)?;
        let current = std::mem::replace(&mut self.layers, previous);
        self.future.push(current);
        Ok(&self.layers)
    }

    /// Re-apply the most recently undone state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NothingToRedo`] if the future is empty.
    pub fn redo(&mut self) -> CoreResult<&[Layer]> {
        let next = self.future.pop().ok_or(CoreError::NothingToRedo)?;
        let current = std::mem::replace(&mut self.layers, next);
        self.history.push(current);
        Ok(&self.layers)
    }

    /// Whether [`undo`](Self::undo) would succeed.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Whether [`redo`](Self::redo) would succeed.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Evict the oldest snapshots so at most `limit` remain.
    ///
    /// Returns the number of evicted snapshots.
    pub fn trim_history(&mut self, limit: usize) -> usize {
        let excess = self.history.len().saturating_sub(limit);
        if excess > 0 {
            self.history.drain(..excess);
            tracing::debug!("Evicted {excess} history snapshots from project {}", self.id);
        }
        excess
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{LayerPatch, Rgb};

    fn project() -> Project {
        Project::new(800, 600, Rgb::WHITE).expect("project")
    }

    fn add_text(p: &mut Project, text: &str) {
        p.snapshot();
        p.add_layer(Layer::text(text, 20, Rgb::BLACK)).expect("add");
    }

    #[test]
    fn test_undo_on_empty_history_fails() {
        let mut p = project();
        assert!(matches!(p.undo(), Err(CoreError::NothingToUndo)));
    }

    #[test]
    fn test_redo_on_empty_future_fails() {
        let mut p = project();
        assert!(matches!(p.redo(), Err(CoreError::NothingToRedo)));
    }

    #[test]
    fn test_undo_restores_previous_layers() {
        let mut p = project();
        add_text(&mut p, "one");
        add_text(&mut p, "two");
        assert_eq!(p.layer_count(), 2);

        let layers = p.undo().expect("undo").to_vec();
        assert_eq!(layers.len(), 1);
        assert_eq!(p.history.len(), 1);
        assert_eq!(p.future.len(), 1);
    }

    #[test]
    fn test_undo_then_redo_roundtrip() {
        let mut p = project();
        add_text(&mut p, "one");
        add_text(&mut p, "two");
        let after_last = p.layers.clone();

        p.undo().expect("undo");
        p.redo().expect("redo");
        assert_eq!(p.layers, after_last);
        assert!(!p.can_redo());
    }

    #[test]
    fn test_mutation_clears_future() {
        let mut p = project();
        add_text(&mut p, "one");
        p.undo().expect("undo");
        assert!(p.can_redo());

        add_text(&mut p, "branch");
        assert!(p.future.is_empty());
    }

    #[test]
    fn test_undo_restores_layer_ids() {
        let mut p = project();
        add_text(&mut p, "one");
        let id = p.layers[0].layer_id;
        p.snapshot();
        p.update_layer(
            id,
            &LayerPatch {
                x: Some(300),
                ..LayerPatch::default()
            },
        )
        .expect("update");
        p.undo().expect("undo");
        assert_eq!(p.layers[0].layer_id, id);
        assert_eq!(p.layers[0].x, 0);
    }

    #[test]
    fn test_trim_history_evicts_oldest() {
        let mut p = project();
        for i in 0..5 {
            add_text(&mut p, &format!("layer {i}"));
        }
        assert_eq!(p.trim_history(3), 2);
        assert_eq!(p.history.len(), 3);
        // The oldest remaining snapshot already contains two layers.
        assert_eq!(p.history[0].len(), 2);
        assert_eq!(p.trim_history(3), 0);
    }

    proptest! {
        #[test]
        fn prop_undo_redo_returns_to_last_mutation(count in 1usize..12, undos in 0usize..12) {
            let mut p = project();
            for i in 0..count {
                add_text(&mut p, &format!("t{i}"));
            }
            let after_last = p.layers.clone();
            let undos = undos.min(count);
            for _ in 0..undos {
                p.undo().expect("undo");
            }
            for _ in 0..undos {
                p.redo().expect("redo");
            }
            prop_assert_eq!(&p.layers, &after_last);
            prop_assert_eq!(p.history.len(), count);
            prop_assert!(p.future.is_empty());
        }
    }
}
