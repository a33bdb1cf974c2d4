use image::{Rgba, RgbaImage};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tree_core::config::Config;
use tree_core::palette::{LEAVES_OUTLINE, TRUNK_OUTLINE};
use tree_core::raster::covered_pixels;
use tree_core::render::pixelate;
use tree_core::tree::ROOT;
use tree_core::{Palette, PaletteBook, PaletteError, Plant};

const BACKGROUND: Rgba<u8> = Rgba([130, 170, 70, 255]);

#[test]
fn fifty_node_tree_grows_and_renders() {
    let mut plant = Plant::from_seed(Palette::green(), 50, 2024).unwrap();
    let mut last_count = plant.node_count();
    let mut ticks = 0;

    while plant.grow().unwrap() {
        ticks += 1;
        assert!(ticks < 10_000);

        let tree = plant.tree();
        assert!(plant.node_count() >= last_count);
        assert!(plant.node_count() <= last_count + 1);
        assert!(tree.counts_are_consistent());
        last_count = plant.node_count();
    }
    assert_eq!(plant.node_count(), 50);
    assert_eq!(plant.tree().len(), 50);

    let palette = Palette::green();
    let img = plant.composite();
    assert_eq!(img.dimensions(), (400, 600));
    for key in [TRUNK_OUTLINE, LEAVES_OUTLINE] {
        let color = palette.get(key).unwrap();
        assert!(img.pixels().any(|p| *p == color), "no {key} pixels");
    }
    // Branches and leaves are drawn in aligned 4×4 blocks; only the
    // translucent shadow is shifted off the grid.
    let opaque: RgbaImage = RgbaImage::from_fn(400, 600, |x, y| {
        let p = *img.get_pixel(x, y);
        if p.0[3] == 255 { p } else { Rgba([0, 0, 0, 0]) }
    });
    assert!(covered_pixels(&opaque) > 0);
    assert_eq!(pixelate(&opaque, 4), opaque);
}

#[test]
fn custom_config_is_honored() {
    let cfg = Config::from_json(
        r#"{
            "growth": { "start_branch_len": 50, "start_branch_angle": 100.0 },
            "render": { "children_for_leaves": 1 }
        }"#,
    )
    .unwrap();
    let plant = Plant::with_config(Palette::autumn(), 1, cfg, StdRng::seed_from_u64(3)).unwrap();
    let root = plant.tree().node(ROOT);
    assert_eq!(root.length, 50);
    assert_eq!(root.angle, 100.0);

    // No node is below the leaf threshold, so only branches and their outline remain.
    let leaves_outline = Palette::autumn().get(LEAVES_OUTLINE).unwrap();
    assert!(plant.composite().pixels().all(|p| *p != leaves_outline));
    assert!(covered_pixels(plant.composite()) > 0);
}

#[test]
fn palette_file_round_trip_feeds_a_plant() {
    let mut book = PaletteBook::builtin();
    let extra = PaletteBook::from_json(
        r#"{
            "night": {
                "trunk0": [60, 50, 70], "trunk1": [50, 40, 60], "trunk_outline": [20, 15, 30],
                "leaves0": [70, 90, 140], "leaves1": [60, 80, 130], "leaves2": [50, 70, 120],
                "leaves_outline": [25, 30, 60], "shadow_color": [10, 10, 30, 120]
            }
        }"#,
    )
    .unwrap();
    book.merge(extra);
    assert_eq!(book.len(), 4);

    let mut plant = Plant::from_seed(book.get("green").unwrap().clone(), 8, 5).unwrap();
    while plant.grow().unwrap() {}
    plant.change_color(book.get("night").unwrap().clone()).unwrap();

    let mut frame = RgbaImage::from_pixel(400, 600, BACKGROUND);
    plant.draw(&mut frame, 0, 0);
    let trunk_outline = Rgba([20, 15, 30, 255]);
    assert!(frame.pixels().any(|p| *p == trunk_outline));

    assert!(matches!(
        book.get("missing"),
        Err(PaletteError::UnknownPalette(_))
    ));
}
