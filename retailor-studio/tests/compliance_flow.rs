//! Rendering, compliance and autofix integration tests.

use retailor_compliance::{Fix, LayoutBrief, ViolationCode};
use retailor_core::{AssetId, Layer, LayerKind, ProjectId, Rgb, LOGO_ROLE};
use retailor_renderer::image::decode;
use retailor_renderer::{encode_png, RgbaImage};
use retailor_studio::Studio;

fn upload_solid(studio: &Studio, width: u32, height: u32, rgba: [u8; 4]) -> AssetId {
    let img = RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let bytes = encode_png(&img).expect("encode");
    studio
        .upload_asset(&bytes, "image/png")
        .expect("upload")
        .asset_id
}

fn codes(studio: &Studio, id: ProjectId, retailer: &str) -> Vec<ViolationCode> {
    studio
        .check(id, Some(retailer))
        .expect("check")
        .violations
        .into_iter()
        .map(|v| v.code)
        .collect()
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_is_deterministic() {
    let studio = Studio::in_memory();
    let project = studio.create_project(300, 200, Rgb::new(240, 230, 220)).expect("create");
    let asset = upload_solid(&studio, 40, 40, [200, 10, 10, 180]);
    studio
        .add_image_layer(
            project.id,
            Layer::image(asset, 120, 60)
                .at(20, 30)
                .with_rotation(30.0)
                .with_opacity(0.7),
        )
        .expect("add image");
    studio
        .add_text_layer(
            project.id,
            Layer::text("Deal", 24, Rgb::new(20, 40, 60)).at(150, 120),
        )
        .expect("add text");

    let first = studio.render(project.id).expect("render");
    let second = studio.render(project.id).expect("render");
    assert_eq!(first.asset_id, second.asset_id);
    assert_eq!(
        studio.asset(&first.asset_id).expect("bytes"),
        studio.asset(&second.asset_id).expect("bytes")
    );
}

#[test]
fn test_deleted_asset_does_not_abort_render() {
    let studio = Studio::in_memory();
    let project = studio.create_project(100, 100, Rgb::WHITE).expect("create");
    let red = upload_solid(&studio, 10, 10, [255, 0, 0, 255]);
    let blue = upload_solid(&studio, 10, 10, [0, 0, 255, 255]);
    studio
        .add_image_layer(project.id, Layer::image(red.clone(), 50, 50))
        .expect("add red");
    studio
        .add_image_layer(project.id, Layer::image(blue, 50, 50).at(50, 50))
        .expect("add blue");
    studio.delete_asset(&red).expect("delete");

    let rendered = studio.render(project.id).expect("render");
    let img = decode(&studio.asset(&rendered.asset_id).expect("bytes")).expect("decode");
    assert_eq!(img.get_pixel(10, 10).0, [255, 255, 255, 255]);
    assert_eq!(img.get_pixel(75, 75).0, [0, 0, 255, 255]);
}

// ============================================================================
// Compliance
// ============================================================================

#[test]
fn test_resolution_rule_follows_canvas_size() {
    let studio = Studio::in_memory();
    let small = studio.create_project(500, 500, Rgb::WHITE).expect("create");
    let large = studio.create_project(1080, 1080, Rgb::WHITE).expect("create");

    assert_eq!(
        codes(&studio, small.id, "RetailerA"),
        [ViolationCode::ResolutionLow]
    );
    assert!(codes(&studio, large.id, "RetailerA").is_empty());
}

#[test]
fn test_shop_now_white_on_white() {
    let studio = Studio::in_memory();
    let project = studio.create_project(1080, 1080, Rgb::WHITE).expect("create");
    studio
        .add_text_layer(project.id, Layer::text("Shop Now", 10, Rgb::WHITE))
        .expect("add");

    let report = studio.check(project.id, None).expect("check");
    assert_eq!(report.retailer, "RetailerA");
    assert!(!report.compliant);
    let codes: Vec<_> = report.violations.iter().map(|v| v.code).collect();
    assert_eq!(
        codes,
        [ViolationCode::FontTooSmall, ViolationCode::LowContrast]
    );
}

#[test]
fn test_image_overlap_threshold() {
    let studio = Studio::in_memory();
    let asset = upload_solid(&studio, 8, 8, [90, 90, 90, 255]);

    let quarter = studio.create_project(1080, 1080, Rgb::WHITE).expect("create");
    studio
        .add_image_layer(quarter.id, Layer::image(asset.clone(), 100, 100))
        .expect("add");
    studio
        .add_image_layer(quarter.id, Layer::image(asset.clone(), 100, 100).at(50, 50))
        .expect("add");
    assert!(codes(&studio, quarter.id, "RetailerA").is_empty());

    let most = studio.create_project(1080, 1080, Rgb::WHITE).expect("create");
    studio
        .add_image_layer(most.id, Layer::image(asset.clone(), 100, 100))
        .expect("add");
    studio
        .add_image_layer(most.id, Layer::image(asset, 100, 100).at(10, 10))
        .expect("add");
    assert_eq!(
        codes(&studio, most.id, "RetailerA"),
        [ViolationCode::ImageOverlap]
    );
}

#[test]
fn test_retailers_differ() {
    let studio = Studio::in_memory();
    let project = studio.create_project(700, 700, Rgb::WHITE).expect("create");
    studio
        .add_text_layer(project.id, Layer::text("Hello", 16, Rgb::BLACK).at(100, 100))
        .expect("add");

    let strict = codes(&studio, project.id, "RetailerA");
    assert!(strict.contains(&ViolationCode::ResolutionLow));
    assert!(strict.contains(&ViolationCode::FontTooSmall));
    assert!(codes(&studio, project.id, "RetailerB").is_empty());
}

// ============================================================================
// Autofix
// ============================================================================

#[test]
fn test_autofix_apply_then_recheck_is_clean() {
    let studio = Studio::in_memory();
    let project = studio.create_project(1080, 1080, Rgb::WHITE).expect("create");
    studio
        .add_text_layer(project.id, Layer::text("Shop Now", 10, Rgb::WHITE))
        .expect("add");

    let report = studio.autofix(project.id, None, true).expect("autofix");
    assert!(report.applied);
    assert!(matches!(report.changes[0].fix, Fix::IncreaseFont { from: 10, to: 18 }));
    assert!(studio.check(project.id, None).expect("check").compliant);

    let again = studio.autofix(project.id, None, true).expect("autofix");
    assert!(!again.applied);
    assert!(again.changes.is_empty());
}

#[test]
fn test_autofix_dry_run_leaves_project() {
    let studio = Studio::in_memory();
    let project = studio.create_project(1080, 1080, Rgb::WHITE).expect("create");
    studio
        .add_text_layer(project.id, Layer::text("Tiny", 8, Rgb::BLACK).at(200, 200))
        .expect("add");
    let before = studio.project(project.id).expect("get");

    let report = studio.autofix(project.id, None, false).expect("autofix");
    assert!(!report.applied);
    assert_eq!(report.changes.len(), 1);
    assert_eq!(studio.project(project.id).expect("get"), before);
}

#[test]
fn test_autofix_is_undoable() {
    let studio = Studio::in_memory();
    let project = studio.create_project(1080, 1080, Rgb::WHITE).expect("create");
    let logo = upload_solid(&studio, 20, 20, [0, 0, 0, 255]);
    studio
        .add_image_layer(
            project.id,
            Layer::image(logo, 100, 100).at(0, 0).with_role(LOGO_ROLE),
        )
        .expect("add logo");

    let report = studio.autofix(project.id, Some("RetailerA"), true).expect("autofix");
    assert!(report.applied);
    let moved = studio.project(project.id).expect("get").layers;
    assert_eq!((moved[0].x, moved[0].y), (54, 54));

    let restored = studio.undo(project.id).expect("undo");
    assert_eq!((restored[0].x, restored[0].y), (0, 0));
}

// ============================================================================
// Layout suggestions
// ============================================================================

fn suggested_text_colors(studio: &Studio, product: AssetId) -> Vec<Rgb> {
    studio
        .suggest_layouts(&LayoutBrief::new(product))
        .expect("suggest")
        .iter()
        .flat_map(|t| t.layers.clone())
        .filter_map(|l| match l.kind {
            LayerKind::Text { color, .. } => Some(color),
            LayerKind::Image { .. } => None,
        })
        .collect()
}

#[test]
fn test_dark_product_suggests_white_text() {
    let studio = Studio::in_memory();
    let product = upload_solid(&studio, 30, 30, [15, 25, 40, 255]);
    let colors = suggested_text_colors(&studio, product);
    assert!(!colors.is_empty());
    assert!(colors.iter().all(|c| *c == Rgb::WHITE));
}

#[test]
fn test_light_product_suggests_black_text() {
    let studio = Studio::in_memory();
    let product = upload_solid(&studio, 30, 30, [250, 240, 220, 255]);
    let colors = suggested_text_colors(&studio, product);
    assert!(!colors.is_empty());
    assert!(colors.iter().all(|c| *c == Rgb::BLACK));
}

#[test]
fn test_suggested_layout_applies_as_one_step() {
    let studio = Studio::in_memory();
    let project = studio.create_project(1080, 1080, Rgb::WHITE).expect("create");
    let product = upload_solid(&studio, 30, 30, [250, 240, 220, 255]);
    let logo = upload_solid(&studio, 10, 10, [0, 0, 0, 255]);

    let layouts = studio
        .suggest_layouts(&LayoutBrief::new(product).with_logo(logo))
        .expect("suggest");
    let full = layouts
        .iter()
        .find(|t| t.name == "Full Background")
        .expect("full background");
    let ids = studio.apply_layout(project.id, full).expect("apply");
    assert_eq!(ids.len(), 3);

    // the logo already sits inside the default retailer's margin
    let violations = codes(&studio, project.id, "RetailerA");
    assert!(!violations.contains(&ViolationCode::LogoMarginViolation));

    assert!(studio.undo(project.id).expect("undo").is_empty());
}

#[test]
fn test_suggest_needs_stored_product() {
    let studio = Studio::in_memory();
    assert!(studio
        .suggest_layouts(&LayoutBrief::new("missing"))
        .is_err());
}
