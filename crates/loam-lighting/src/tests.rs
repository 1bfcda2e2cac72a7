use super::*;

use std::sync::Arc;

use loam_tiles::{Tile, TileRegistry};

const CATALOG: &str = r#"
[[tiles]]
name = "air"
id = 0
solid = false
hardness = 0.0

[[tiles]]
name = "stone"

[[tiles]]
name = "torch"
solid = false
light_level = 12
light_color = [255, 180, 80]

[[tiles]]
name = "beacon"
solid = false
light_level = 200
light_color = [255, 255, 255]

[[tiles]]
name = "water"
solid = false
liquid = true
"#;

fn registry() -> Arc<TileRegistry> {
    Arc::new(TileRegistry::from_toml_str(CATALOG).expect("catalog"))
}

fn world(chunks_x: i32, chunks_y: i32) -> loam_world::TileWorld {
    loam_world::TileWorld::new(chunks_x, chunks_y, registry())
}

fn named(world: &loam_world::TileWorld, name: &str) -> Tile {
    Tile::new(world.registry.id_by_name(name).expect("tile id"))
}

fn fill_rect(world: &mut loam_world::TileWorld, name: &str, x0: i32, y0: i32, x1: i32, y1: i32) {
    let t = named(world, name);
    for x in x0..=x1 {
        for y in y0..=y1 {
            world.set_tile(x, y, t);
        }
    }
}

fn engine_for(world: &loam_world::TileWorld) -> LightingEngine {
    LightingEngine::new(
        world.width_tiles(),
        world.height_tiles(),
        DEFAULT_RELAX_PASSES,
    )
}

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn approx_rgb(a: Rgb, b: Rgb, eps: f32) -> bool {
    approx(a.r, b.r, eps) && approx(a.g, b.g, eps) && approx(a.b, b.b, eps)
}

#[test]
fn noon_light_decays_down_an_open_column() {
    // Pure air world, one chunk wide and three tall.
    let mut w = world(1, 3);
    let mut engine = engine_for(&w);
    let stats = engine.update(&mut w, 0.5, 0.0);
    assert!(stats.recomputed && stats.full);

    // Top of the sky is the full daylight color.
    assert!(approx_rgb(engine.map().get(10, 0), Rgb::new(1.0, 0.98, 0.92), 1e-5));
    // Brightness shrinks strictly with depth; at 96 tiles it is still well
    // above the ambient floor (0.97^95 is about 0.055).
    for y in 0..95 {
        let above = engine.map().get(10, y).brightness();
        let below = engine.map().get(10, y + 1).brightness();
        assert!(below < above, "depth {} did not decay: {} vs {}", y, above, below);
    }
    assert!(engine.map().get(10, 95).brightness() > AMBIENT_FLOOR.brightness());
}

#[test]
fn deep_cave_rests_at_the_ambient_floor() {
    let mut w = world(1, 3);
    fill_rect(&mut w, "stone", 0, 40, 31, 95);
    let mut engine = engine_for(&w);
    engine.update(&mut w, 0.5, 0.0);

    // Just above the surface: plenty of sky light left.
    assert!(engine.map().get(10, 39).brightness() > 0.25);
    // Forty rows of stone extinguish the sun completely.
    assert!(approx_rgb(engine.map().get(10, 80), AMBIENT_FLOOR, 1e-6));
}

#[test]
fn buried_torch_glows_through_nearby_stone_at_night() {
    // Solid stone chunk with a single torch sealed in the middle.
    let mut w = world(1, 1);
    fill_rect(&mut w, "stone", 0, 0, 31, 31);
    let torch = named(&w, "torch");
    w.set_tile(16, 16, torch);
    let mut engine = engine_for(&w);
    engine.update(&mut w, 0.0, 0.0);

    // The torch tile carries its own emission: level 12 of 15 scales the
    // color [255, 180, 80] to about (0.80, 0.56, 0.25).
    let center = engine.map().get(16, 16);
    assert!(approx(center.r, 0.8, 1e-4));
    assert!(approx(center.g, 0.5647, 1e-3));
    assert!(approx(center.b, 0.2510, 1e-3));

    // Three tiles of stone in any direction: dimmed to 0.8 * 0.4^3, which
    // sits strictly between the ambient floor and the source.
    for (x, y) in [(16, 19), (16, 13), (13, 16), (19, 16)] {
        let v = engine.map().get(x, y);
        assert!(approx(v.r, 0.0512, 1e-3), "at ({x},{y}): {}", v.r);
        assert!(v.r > AMBIENT_FLOOR.r && v.r < center.r);
    }

    // Fourteen tiles away the glow is long gone; only the floor remains.
    assert!(approx_rgb(engine.map().get(16, 30), AMBIENT_FLOOR, 1e-6));
    // Outside the world there is no light at all.
    assert_eq!(engine.map().get(16, 36), Rgb::BLACK);
}

#[test]
fn thick_wall_blocks_a_point_light() {
    // Torch in open air at night, behind a six-tile wall spanning the
    // full world height.
    let mut w = world(2, 1);
    fill_rect(&mut w, "stone", 30, 0, 35, 31);
    let torch = named(&w, "torch");
    w.set_tile(20, 16, torch);
    let mut engine = engine_for(&w);
    engine.update(&mut w, 0.0, 0.0);

    // The lit face of the wall still sees the torch.
    assert!(engine.map().get(29, 16).r > 0.1);
    // Deep inside the wall the glow is extinguished below the floor.
    assert!(approx_rgb(engine.map().get(33, 16), AMBIENT_FLOOR, 1e-6));
    // The far side is fully shadowed.
    assert!(approx_rgb(engine.map().get(40, 16), AMBIENT_FLOOR, 1e-6));
}

#[test]
fn sealed_torch_escapes_only_through_a_one_tile_gap() {
    // Torch sealed in solid stone with a single one-tile air channel
    // running east; every other direction is an unbroken wall.
    let mut w = world(1, 1);
    fill_rect(&mut w, "stone", 0, 0, 31, 31);
    let torch = named(&w, "torch");
    w.set_tile(16, 16, torch);
    fill_rect(&mut w, "air", 17, 16, 22, 16);
    let mut engine = engine_for(&w);
    engine.update(&mut w, 0.0, 0.0);

    // Six tiles down the channel the glow is still strong.
    assert!(engine.map().get(22, 16).r > 0.2);
    // Six tiles into any unbroken wall, nothing but the floor remains.
    for (x, y) in [(10, 16), (16, 10), (16, 22)] {
        assert!(
            approx_rgb(engine.map().get(x, y), AMBIENT_FLOOR, 1e-6),
            "wall interior at ({x},{y}) should be floored"
        );
    }
}

#[test]
fn point_light_radius_is_capped() {
    // A level-200 source must not blanket the world; its reach stops at
    // MAX_LIGHT_DISTANCE hops.
    let mut w = world(8, 1);
    let beacon = named(&w, "beacon");
    w.set_tile(100, 16, beacon);
    let mut engine = engine_for(&w);
    engine.update(&mut w, 0.0, 0.0);

    assert!(engine.map().get(120, 16).r > AMBIENT_FLOOR.r);
    assert!(approx_rgb(engine.map().get(130, 16), AMBIENT_FLOOR, 1e-6));
}

#[test]
fn repeat_update_without_changes_is_free() {
    let mut w = world(1, 1);
    fill_rect(&mut w, "stone", 0, 16, 31, 31);
    let mut engine = engine_for(&w);
    let first = engine.update(&mut w, 0.5, 0.016);
    assert!(first.recomputed);
    let rev = engine.map_revision();
    let snapshot = engine.map().cells().to_vec();

    let second = engine.update(&mut w, 0.5, 0.016);
    assert!(!second.recomputed);
    assert_eq!(engine.map_revision(), rev);
    assert_eq!(engine.map().cells(), &snapshot[..]);
}

#[test]
fn forced_recompute_reproduces_the_same_map() {
    let mut w = world(1, 1);
    fill_rect(&mut w, "stone", 0, 16, 31, 31);
    let torch = named(&w, "torch");
    w.set_tile(8, 14, torch);
    let mut engine = engine_for(&w);
    engine.update(&mut w, 0.4, 0.0);
    let snapshot = engine.map().cells().to_vec();

    engine.force_full_update();
    let stats = engine.update(&mut w, 0.4, 0.0);
    assert!(stats.recomputed && stats.full);
    assert_eq!(engine.map().cells(), &snapshot[..]);
}

#[test]
fn band_relight_matches_a_full_recompute() {
    let build = || {
        let mut w = world(8, 2);
        fill_rect(&mut w, "stone", 0, 32, 255, 63);
        let torch = named(&w, "torch");
        w.set_tile(120, 20, torch);
        w.set_tile(30, 45, torch);
        w
    };

    // World A relights just the band around the edit.
    let mut wa = build();
    let mut ea = engine_for(&wa);
    ea.update(&mut wa, 0.3, 0.0);
    wa.set_tile(133, 40, Tile::AIR);
    let stats = ea.update(&mut wa, 0.3, 0.0);
    assert!(stats.recomputed && !stats.full);
    assert_eq!(stats.rect, Some(TileRect::new(104, 0, 183, 63)));

    // World B recomputes everything from scratch after the same edit.
    let mut wb = build();
    let mut eb = engine_for(&wb);
    eb.update(&mut wb, 0.3, 0.0);
    wb.set_tile(133, 40, Tile::AIR);
    eb.force_full_update();
    let stats = eb.update(&mut wb, 0.3, 0.0);
    assert!(stats.full);

    let ca = ea.map().cells();
    let cb = eb.map().cells();
    assert_eq!(ca.len(), cb.len());
    for (i, (a, b)) in ca.iter().zip(cb.iter()).enumerate() {
        assert!(
            approx_rgb(*a, *b, 1e-6),
            "cell {} diverged: {:?} vs {:?}",
            i,
            a,
            b
        );
    }
}

#[test]
fn flicker_touches_presentation_not_the_map() {
    let mut w = world(1, 1);
    let torch = named(&w, "torch");
    w.set_tile(10, 10, torch);
    let mut engine = engine_for(&w);
    engine.update(&mut w, 0.0, 0.0);
    let stored = engine.map().get(10, 10);
    let rev = engine.map_revision();

    // Clock 0: presentation equals the map scaled by the flicker factor.
    let f0 = flicker_at(10, 10, 0.0);
    assert!(approx_rgb(engine.light_color_at(&w, 10, 10), stored.scale(f0), 1e-6));

    // Advancing time without edits moves only the flicker phase.
    let stats = engine.update(&mut w, 0.0, 0.25);
    assert!(!stats.recomputed);
    assert_eq!(engine.map_revision(), rev);
    assert_eq!(engine.map().get(10, 10), stored);
    let f1 = flicker_at(10, 10, 0.25);
    assert!(approx_rgb(engine.light_color_at(&w, 10, 10), stored.scale(f1), 1e-6));

    // Non-emissive tiles never flicker.
    let air = engine.map().get(4, 4);
    assert_eq!(engine.light_color_at(&w, 4, 4), air);
}

#[test]
fn brightness_bytes_land_in_chunk_light() {
    let mut w = world(1, 1);
    fill_rect(&mut w, "stone", 0, 16, 31, 31);
    let mut engine = engine_for(&w);
    engine.update(&mut w, 0.5, 0.0);

    for (x, y) in [(5, 2), (5, 20), (20, 31)] {
        let expect = (engine.map().get(x, y).brightness().clamp(0.0, 1.0) * 255.0).round() as u8;
        assert_eq!(w.light_at(x, y), expect, "at ({x},{y})");
    }
}

#[test]
fn relax_pass_count_is_clamped() {
    assert_eq!(LightingEngine::new(32, 32, 0).relax_passes(), RELAX_PASSES_MIN);
    assert_eq!(LightingEngine::new(32, 32, 99).relax_passes(), RELAX_PASSES_MAX);
    assert_eq!(LightingEngine::new(32, 32, 5).relax_passes(), 5);
}

#[test]
fn edits_outside_the_world_are_ignored() {
    let mut w = world(1, 1);
    let mut engine = engine_for(&w);
    engine.update(&mut w, 0.5, 0.0);
    let rev = engine.map_revision();

    engine.mark_dirty(-100, -100, 2);
    let stats = engine.update(&mut w, 0.5, 0.0);
    assert!(!stats.recomputed);
    assert_eq!(engine.map_revision(), rev);
}

#[test]
fn day_cycle_floor_at_midnight_and_peak_at_noon() {
    let midnight = DayCycle::sample_at(0.0);
    assert!(approx(midnight.sun_intensity, NIGHT_SUN_FLOOR, 1e-6));
    assert!(approx_rgb(midnight.sun_color, Rgb::new(0.55, 0.62, 0.80), 1e-6));

    let noon = DayCycle::sample_at(0.5);
    assert!(approx(noon.sun_intensity, 1.0, 1e-4));
    assert!(approx_rgb(noon.sun_color, Rgb::new(1.0, 0.98, 0.92), 1e-4));

    // The instant of sunrise itself is still dark.
    let sunrise = DayCycle::sample_at(DAY_START);
    assert!(approx(sunrise.sun_intensity, NIGHT_SUN_FLOOR, 1e-6));
}

#[test]
fn day_cycle_is_symmetric_around_noon() {
    for d in [0.05f32, 0.1, 0.2] {
        let morning = DayCycle::sample_at(0.5 - d);
        let evening = DayCycle::sample_at(0.5 + d);
        assert!(approx(morning.sun_intensity, evening.sun_intensity, 1e-4));
    }
}

#[test]
fn day_cycle_warms_the_dawn() {
    // Shortly after sunrise the tint leans red over blue.
    let dawn = DayCycle::sample_at(0.27);
    assert!(dawn.sun_color.r > dawn.sun_color.b);
    // At noon it does not.
    let noon = DayCycle::sample_at(0.5);
    assert!(noon.sun_color.b > noon.sun_color.r - 0.1);
}

#[test]
fn advance_wraps_the_day_length() {
    let mut cycle = DayCycle::new(10.0);
    cycle.advance(25.0);
    assert!(approx(cycle.day_fraction(), 0.5, 1e-5));

    // Degenerate day lengths are clamped to one second.
    let mut short = DayCycle::new(0.0);
    short.advance(0.3);
    assert!(approx(short.day_fraction(), 0.3, 1e-5));
}
