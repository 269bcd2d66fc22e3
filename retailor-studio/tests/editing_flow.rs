//! Editing and history integration tests.
//!
//! Covers the undo/redo stacks as seen through [`Studio`]:
//! - round trips and empty-stack errors
//! - branch truncation after a new edit
//! - concurrent undo from many threads
//! - templates as a single undoable step

use std::sync::atomic::{AtomicUsize, Ordering};

use retailor_core::{CoreError, Layer, LayerPatch, Rgb};
use retailor_studio::{Studio, StudioConfig, StudioError};

fn studio_with_text_layers(count: usize) -> (Studio, retailor_core::ProjectId) {
    let studio = Studio::in_memory();
    let project = studio
        .create_project(1080, 1080, Rgb::WHITE)
        .expect("create project");
    for i in 0..count {
        let y = i32::try_from(i).expect("small") * 40;
        studio
            .add_text_layer(project.id, Layer::text(format!("Line {i}"), 24, Rgb::BLACK).at(0, y))
            .expect("add text");
    }
    (studio, project.id)
}

// ============================================================================
// Undo / Redo
// ============================================================================

#[test]
fn test_undo_then_redo_restores_layers() {
    let (studio, id) = studio_with_text_layers(2);
    let before = studio.project(id).expect("get").layers;

    let undone = studio.undo(id).expect("undo");
    assert_eq!(undone.len(), 1);
    assert_eq!(undone[0], before[0]);

    let redone = studio.redo(id).expect("redo");
    assert_eq!(redone, before);
}

#[test]
fn test_empty_stacks_report_errors() {
    let (studio, id) = studio_with_text_layers(0);
    assert!(matches!(
        studio.undo(id),
        Err(StudioError::Core(CoreError::NothingToUndo))
    ));
    assert!(matches!(
        studio.redo(id),
        Err(StudioError::Core(CoreError::NothingToRedo))
    ));
}

#[test]
fn test_new_edit_clears_redo_branch() {
    let (studio, id) = studio_with_text_layers(2);
    studio.undo(id).expect("undo");
    assert!(studio.project(id).expect("get").can_redo());

    studio
        .add_text_layer(id, Layer::text("Fresh", 30, Rgb::BLACK))
        .expect("add");
    assert!(!studio.project(id).expect("get").can_redo());
    assert!(matches!(
        studio.redo(id),
        Err(StudioError::Core(CoreError::NothingToRedo))
    ));
}

#[test]
fn test_update_layer_is_undoable() {
    let (studio, id) = studio_with_text_layers(1);
    let layer_id = studio.project(id).expect("get").layers[0].layer_id;
    let patch = LayerPatch {
        x: Some(300),
        font_size: Some(64),
        ..LayerPatch::default()
    };

    let updated = studio.update_layer(id, layer_id, &patch).expect("update");
    assert_eq!(updated.x, 300);

    let restored = studio.undo(id).expect("undo");
    assert_eq!(restored[0].x, 0);
    assert_eq!(restored[0].layer_id, layer_id);
}

#[test]
fn test_failed_edit_leaves_history_alone() {
    let (studio, id) = studio_with_text_layers(1);
    let layer_id = studio.project(id).expect("get").layers[0].layer_id;
    let history_before = studio.project(id).expect("get").history.len();

    let bad = LayerPatch {
        opacity: Some(3.0),
        ..LayerPatch::default()
    };
    assert!(studio.update_layer(id, layer_id, &bad).is_err());
    assert_eq!(studio.project(id).expect("get").history.len(), history_before);
}

#[test]
fn test_history_limit_evicts_oldest() {
    let config = StudioConfig {
        max_history: Some(3),
        ..StudioConfig::in_memory()
    };
    let studio = Studio::open(config).expect("open");
    let project = studio.create_project(200, 200, Rgb::WHITE).expect("create");
    for i in 0..6 {
        studio
            .add_text_layer(project.id, Layer::text(format!("{i}"), 20, Rgb::BLACK))
            .expect("add");
    }
    let stored = studio.project(project.id).expect("get");
    assert_eq!(stored.history.len(), 3);
    // oldest surviving snapshot holds three layers
    assert_eq!(stored.history[0].len(), 3);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_undo_pops_each_snapshot_once() {
    const EDITS: usize = 16;
    const THREADS: usize = 32;

    let (studio, id) = studio_with_text_layers(EDITS);
    let succeeded = AtomicUsize::new(0);
    let exhausted = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| match studio.undo(id) {
                Ok(_) => {
                    succeeded.fetch_add(1, Ordering::SeqCst);
                }
                Err(StudioError::Core(CoreError::NothingToUndo)) => {
                    exhausted.fetch_add(1, Ordering::SeqCst);
                }
                Err(e) => panic!("unexpected error: {e}"),
            });
        }
    });

    assert_eq!(succeeded.load(Ordering::SeqCst), EDITS);
    assert_eq!(exhausted.load(Ordering::SeqCst), THREADS - EDITS);

    let project = studio.project(id).expect("get");
    assert!(project.layers.is_empty());
    assert!(project.history.is_empty());
    assert_eq!(project.future.len(), EDITS);
}

#[test]
fn test_concurrent_adds_are_all_kept() {
    let (studio, id) = studio_with_text_layers(0);

    std::thread::scope(|scope| {
        for i in 0..8 {
            let studio = &studio;
            scope.spawn(move || {
                studio
                    .add_text_layer(id, Layer::text(format!("T{i}"), 20, Rgb::BLACK))
                    .expect("add");
            });
        }
    });

    let project = studio.project(id).expect("get");
    assert_eq!(project.layers.len(), 8);
    assert_eq!(project.history.len(), 8);
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_template_is_one_undo_step() {
    let (studio, id) = studio_with_text_layers(0);
    let names: Vec<_> = studio.templates().iter().map(|t| t.name.clone()).collect();
    assert!(names.iter().any(|n| n == "Centered Hero"));

    let ids = studio.apply_template(id, "Centered Hero").expect("apply");
    assert!(!ids.is_empty());
    assert_eq!(studio.project(id).expect("get").layers.len(), ids.len());

    assert!(studio.undo(id).expect("undo").is_empty());
}

#[test]
fn test_unknown_template() {
    let (studio, id) = studio_with_text_layers(0);
    assert!(matches!(
        studio.apply_template(id, "Nope"),
        Err(StudioError::Core(CoreError::TemplateNotFound(_)))
    ));
    assert!(studio.project(id).expect("get").history.is_empty());
}
