//! Colored tile lighting: a sunlight sweep, bounded relaxation spread, and
//! BFS point lights, recomputed incrementally over dirty bands of the world.
#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::time::Instant;

use loam_geom::{Rgb, TileRect};
use loam_world::TileWorld;
use rayon::prelude::*;

mod day_cycle;
#[cfg(test)]
mod tests;

pub use day_cycle::{DAY_END, DAY_START, DayCycle, SunSample};

/// Per-row sunlight falloff through air and liquid.
pub const SUN_AIR_DECAY: f32 = 0.97;
/// Per-row sunlight falloff through solid matter.
pub const SUN_SOLID_DECAY: f32 = 0.88;
/// Relaxation falloff when the receiving tile is air or liquid.
pub const RELAX_AIR_DECAY: f32 = 0.82;
/// Relaxation falloff when the receiving tile is solid. Steep enough that
/// light entering a wall drops under the ambient floor within a few tiles.
pub const RELAX_SOLID_DECAY: f32 = 0.40;
/// Carried brightness at which a point-light BFS stops spreading.
pub const EMISSIVE_CUTOFF: f32 = 0.02;
/// Farthest any single light source or edit can influence, in tiles. Caps
/// the point-light radius and pads incremental recompute regions.
pub const MAX_LIGHT_DISTANCE: i32 = 24;
pub const DEFAULT_RELAX_PASSES: usize = 4;
pub const RELAX_PASSES_MIN: usize = 3;
pub const RELAX_PASSES_MAX: usize = 8;
/// Channel-wise floor written everywhere; no tile ever reads darker.
pub const AMBIENT_FLOOR: Rgb = Rgb::new(0.02, 0.02, 0.03);
/// Sunlight intensity never falls below this, even at midnight.
pub const NIGHT_SUN_FLOOR: f32 = 0.05;

/// Sun intensity drift that forces a whole-world recompute.
const SUN_EPSILON: f32 = 0.004;
/// Band recomputes covering at least this share of the world fall back to
/// a full recompute instead.
const FULL_RECOMPUTE_RATIO: f64 = 0.6;
const FLICKER_FREQ: f32 = 8.0;

fn hash2(x: i32, y: i32, seed: u32) -> u32 {
    let mut h = (x as u32).wrapping_mul(0x85eb_ca6b)
        ^ (y as u32).wrapping_mul(0xc2b2_ae35)
        ^ seed.wrapping_mul(0x27d4_eb2d);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

/// Flicker factor in `[0.7, 1.0]` for an emissive tile.
///
/// Pure in position and clock: the phase comes from a positional hash, so
/// neighboring sources drift out of step and replaying the same clock
/// reproduces the same value.
pub fn flicker_at(x: i32, y: i32, clock: f32) -> f32 {
    let h = hash2(x, y, 0x9e37_79b9);
    let phase = (h & 0xFFFF) as f32 / 65536.0 * std::f32::consts::TAU;
    0.85 + 0.15 * (clock * FLICKER_FREQ + phase).sin()
}

/// World-extent RGB light values.
///
/// Storage is column-major so every world column is one contiguous slice,
/// which is what the parallel sunlight sweep hands out per thread.
#[derive(Clone, Debug)]
pub struct LightMap {
    width: i32,
    height: i32,
    cells: Vec<Rgb>,
}

impl LightMap {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            cells: vec![Rgb::BLACK; (width as usize) * (height as usize)],
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    #[inline]
    fn idx(&self, x: i32, y: i32) -> usize {
        (x as usize) * (self.height as usize) + (y as usize)
    }

    /// Out-of-range reads are black.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Rgb {
        if !self.in_bounds(x, y) {
            return Rgb::BLACK;
        }
        self.cells[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, v: Rgb) {
        if !self.in_bounds(x, y) {
            return;
        }
        let i = self.idx(x, y);
        self.cells[i] = v;
    }

    /// Raises `(x, y)` to at least `v`, channel-wise.
    #[inline]
    pub fn max_in(&mut self, x: i32, y: i32, v: Rgb) {
        if !self.in_bounds(x, y) {
            return;
        }
        let i = self.idx(x, y);
        self.cells[i] = self.cells[i].max(v);
    }

    #[inline]
    pub fn cells(&self) -> &[Rgb] {
        &self.cells
    }
}

/// What one [`LightingEngine::update`] call did, with per-phase timings.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpdateStats {
    pub recomputed: bool,
    /// True when the whole world was recomputed rather than a band.
    pub full: bool,
    pub rect: Option<TileRect>,
    pub relax_passes: usize,
    pub emissive_sources: usize,
    pub t_sun_us: u64,
    pub t_relax_us: u64,
    pub t_emissive_us: u64,
    pub t_sync_us: u64,
}

/// Owns the light map and recomputes it as the world and the sun change.
///
/// A recompute runs four phases in order: sunlight columns, relaxation
/// sweeps, point-light BFS, then a scalar brightness write-back into the
/// world's per-chunk light cache. Point lights run after relaxation so BFS
/// light never leaks through walls by being relaxed a second time.
pub struct LightingEngine {
    map: LightMap,
    relax_passes: usize,
    dirty: Option<TileRect>,
    force_full: bool,
    clock: f32,
    last_sun_intensity: f32,
    map_revision: u64,
}

impl LightingEngine {
    pub fn new(width_tiles: i32, height_tiles: i32, relax_passes: usize) -> Self {
        Self {
            map: LightMap::new(width_tiles, height_tiles),
            relax_passes: relax_passes.clamp(RELAX_PASSES_MIN, RELAX_PASSES_MAX),
            dirty: None,
            force_full: false,
            clock: 0.0,
            // Below any reachable intensity so the first update always runs.
            last_sun_intensity: -1.0,
            map_revision: 0,
        }
    }

    #[inline]
    pub fn map(&self) -> &LightMap {
        &self.map
    }

    /// Bumped once per actual recompute; unchanged on no-op updates.
    #[inline]
    pub fn map_revision(&self) -> u64 {
        self.map_revision
    }

    #[inline]
    pub fn relax_passes(&self) -> usize {
        self.relax_passes
    }

    /// Queues the square of side `2 * radius + 1` around `(x, y)` for the
    /// next recompute.
    pub fn mark_dirty(&mut self, x: i32, y: i32, radius: i32) {
        let r = radius.max(0);
        self.mark_rect_dirty(TileRect::new(x - r, y - r, x + r, y + r));
    }

    pub fn mark_rect_dirty(&mut self, rect: TileRect) {
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(rect),
            None => rect,
        });
    }

    /// Forces the next update to recompute the whole world.
    pub fn force_full_update(&mut self) {
        self.force_full = true;
    }

    /// Advances the flicker clock and recomputes lighting if anything
    /// changed since the last call.
    ///
    /// Triggers are: a forced full update, tiles edited since the last
    /// recompute (either marked here or reported by the world), or the sun
    /// intensity drifting past a small epsilon. With no trigger this only
    /// advances the clock, so idle frames cost nothing.
    pub fn update(&mut self, world: &mut TileWorld, day_fraction: f32, dt: f32) -> UpdateStats {
        self.clock += dt;
        let sun = DayCycle::sample_at(day_fraction);
        let mut stats = UpdateStats {
            relax_passes: self.relax_passes,
            ..UpdateStats::default()
        };

        if let Some(r) = world.take_lighting_dirty() {
            self.mark_rect_dirty(r);
        }
        let sun_moved = (sun.sun_intensity - self.last_sun_intensity).abs() > SUN_EPSILON;
        if !self.force_full && !sun_moved && self.dirty.is_none() {
            return stats;
        }

        let world_rect = TileRect::new(0, 0, self.map.width - 1, self.map.height - 1);
        let mut full = self.force_full || sun_moved;
        let mut rect = world_rect;
        if !full {
            // A dirty band always spans the full column height: sunlight
            // influence travels the whole column, while sideways influence
            // dies out within MAX_LIGHT_DISTANCE tiles.
            let band = self.dirty.and_then(|d| {
                TileRect::new(
                    d.x0 - MAX_LIGHT_DISTANCE,
                    0,
                    d.x1 + MAX_LIGHT_DISTANCE,
                    world_rect.y1,
                )
                .clamp_to(self.map.width, self.map.height)
            });
            match band {
                Some(b) if (b.area() as f64) < FULL_RECOMPUTE_RATIO * (world_rect.area() as f64) => {
                    rect = b;
                }
                Some(_) => full = true,
                None => {
                    // Edits entirely outside the world; nothing to do.
                    self.dirty = None;
                    return stats;
                }
            }
        }

        let t = Instant::now();
        self.sunlight_pass(world, &sun, rect);
        stats.t_sun_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        for _ in 0..self.relax_passes {
            self.relaxation_pass(world, rect);
        }
        stats.t_relax_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        stats.emissive_sources = self.emissive_pass(world, rect);
        stats.t_emissive_us = t.elapsed().as_micros() as u64;

        let t = Instant::now();
        self.sync_pass(world, rect);
        stats.t_sync_us = t.elapsed().as_micros() as u64;

        self.dirty = None;
        self.force_full = false;
        self.last_sun_intensity = sun.sun_intensity;
        self.map_revision = self.map_revision.wrapping_add(1);
        stats.recomputed = true;
        stats.full = full;
        stats.rect = Some(rect);
        log::debug!(
            target: "perf",
            "light_update full={} rect=({},{})-({},{}) sources={} us_sun={} us_relax={} us_emissive={} us_sync={}",
            full,
            rect.x0,
            rect.y0,
            rect.x1,
            rect.y1,
            stats.emissive_sources,
            stats.t_sun_us,
            stats.t_relax_us,
            stats.t_emissive_us,
            stats.t_sync_us
        );
        stats
    }

    /// Light color for presentation. Emissive tiles get the deterministic
    /// flicker factor applied on read; the stored map never flickers.
    pub fn light_color_at(&self, world: &TileWorld, x: i32, y: i32) -> Rgb {
        let v = self.map.get(x, y);
        if world.registry.emission(world.tile(x, y)).is_some() {
            v.scale(flicker_at(x, y, self.clock))
        } else {
            v
        }
    }

    pub fn light_rgb8_at(&self, world: &TileWorld, x: i32, y: i32) -> [u8; 3] {
        self.light_color_at(world, x, y).to_bytes()
    }

    /// Overwrites every cell of `rect` with sun plus own-emission light.
    ///
    /// Each column is independent: intensity starts at the sky value and
    /// decays downward per tile, faster through solids. Emissive tiles
    /// merge their own glow in so a buried lamp survives the overwrite.
    fn sunlight_pass(&mut self, world: &TileWorld, sun: &SunSample, rect: TileRect) {
        let h = self.map.height as usize;
        let x0 = rect.x0;
        let start = (rect.x0 as usize) * h;
        let end = (rect.x1 as usize + 1) * h;
        self.map.cells[start..end]
            .par_chunks_mut(h)
            .enumerate()
            .for_each(|(i, column)| {
                let x = x0 + i as i32;
                let mut intensity = sun.sun_intensity;
                for (y, cell) in column.iter_mut().enumerate() {
                    let tile = world.tile(x, y as i32);
                    let props = world.registry.props(tile.id);
                    let mut v;
                    if props.is_solid {
                        // Surfaces take the already-attenuated value.
                        intensity *= SUN_SOLID_DECAY;
                        v = sun.sun_color.scale(intensity);
                    } else {
                        v = sun.sun_color.scale(intensity);
                        intensity *= SUN_AIR_DECAY;
                    }
                    if let Some((level, color)) = world.registry.emission(tile) {
                        v = v.max(color.scale((f32::from(level) / 15.0).min(1.0)));
                    }
                    *cell = v.max(AMBIENT_FLOOR);
                }
            });
    }

    /// One relaxation pass: a forward and a backward sweep over `rect`.
    ///
    /// Every cell rises to the brightest neighbor scaled by its own decay,
    /// never falls. Sweeping both directions lets light travel arbitrarily
    /// far along the sweep axes in a single pass, so a handful of passes
    /// settles the map. Reads outside `rect` see frozen values, which keeps
    /// band recomputes consistent with their surroundings.
    fn relaxation_pass(&mut self, world: &TileWorld, rect: TileRect) {
        for x in rect.x0..=rect.x1 {
            for y in rect.y0..=rect.y1 {
                self.relax_cell(world, x, y);
            }
        }
        for x in (rect.x0..=rect.x1).rev() {
            for y in (rect.y0..=rect.y1).rev() {
                self.relax_cell(world, x, y);
            }
        }
    }

    #[inline]
    fn relax_cell(&mut self, world: &TileWorld, x: i32, y: i32) {
        let decay = if world.is_solid(x, y) {
            RELAX_SOLID_DECAY
        } else {
            RELAX_AIR_DECAY
        };
        let brightest = self
            .map
            .get(x - 1, y)
            .max(self.map.get(x + 1, y))
            .max(self.map.get(x, y - 1))
            .max(self.map.get(x, y + 1));
        let i = self.map.idx(x, y);
        self.map.cells[i] = self.map.cells[i].max(brightest.scale(decay));
    }

    /// Re-injects every point light that can reach `rect`.
    ///
    /// Sources are scanned one pad beyond the rect because a light up to
    /// MAX_LIGHT_DISTANCE away can still shine into it. Writes are gated to
    /// the rect so nothing outside it changes.
    fn emissive_pass(&mut self, world: &TileWorld, rect: TileRect) -> usize {
        let scan = match rect
            .pad(MAX_LIGHT_DISTANCE)
            .clamp_to(self.map.width, self.map.height)
        {
            Some(s) => s,
            None => return 0,
        };
        let mut sources = 0usize;
        for x in scan.x0..=scan.x1 {
            for y in scan.y0..=scan.y1 {
                let Some((level, color)) = world.registry.emission(world.tile(x, y)) else {
                    continue;
                };
                sources += 1;
                self.inject_point_light(world, rect, x, y, level, color);
            }
        }
        sources
    }

    /// Floods one point light outward with a per-hop falloff chosen so the
    /// carried brightness hits the cutoff right at the light's radius.
    ///
    /// The BFS walks non-solid tiles only; walls block it completely. The
    /// source tile itself is always lit, even when buried.
    fn inject_point_light(
        &mut self,
        world: &TileWorld,
        rect: TileRect,
        sx: i32,
        sy: i32,
        level: u8,
        color: Rgb,
    ) {
        let radius = i32::from(level).min(MAX_LIGHT_DISTANCE);
        let per_hop = EMISSIVE_CUTOFF.powf(1.0 / radius as f32);
        let start = color.scale((f32::from(level) / 15.0).min(1.0));
        let side = (2 * radius + 1) as usize;
        let mut seen = vec![false; side * side];
        let seen_at = |dx: i32, dy: i32| ((dy + radius) as usize) * side + (dx + radius) as usize;

        if rect.contains(sx, sy) {
            self.map.max_in(sx, sy, start);
        }
        seen[seen_at(0, 0)] = true;
        let mut queue: VecDeque<(i32, i32, Rgb)> = VecDeque::new();
        queue.push_back((sx, sy, start));
        while let Some((x, y, carried)) = queue.pop_front() {
            let next = carried.scale(per_hop);
            if next.brightness() < EMISSIVE_CUTOFF {
                continue;
            }
            for (dx, dy) in [(-1i32, 0i32), (1, 0), (0, -1), (0, 1)] {
                let nx = x + dx;
                let ny = y + dy;
                let rdx = nx - sx;
                let rdy = ny - sy;
                if rdx.abs() > radius || rdy.abs() > radius {
                    continue;
                }
                if seen[seen_at(rdx, rdy)] {
                    continue;
                }
                seen[seen_at(rdx, rdy)] = true;
                if !world.in_bounds(nx, ny) || world.is_solid(nx, ny) {
                    continue;
                }
                if rect.contains(nx, ny) {
                    self.map.max_in(nx, ny, next);
                }
                queue.push_back((nx, ny, next));
            }
        }
    }

    /// Writes the scalar brightness of every rect cell back into the
    /// world's per-chunk light cache.
    fn sync_pass(&mut self, world: &mut TileWorld, rect: TileRect) {
        for x in rect.x0..=rect.x1 {
            for y in rect.y0..=rect.y1 {
                let b = self.map.get(x, y).brightness();
                world.set_light(x, y, (b.clamp(0.0, 1.0) * 255.0).round() as u8);
            }
        }
    }
}
