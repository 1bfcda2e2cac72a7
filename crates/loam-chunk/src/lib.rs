//! Chunk storage: tile/wall/light planes plus lazily derived shading caches.
#![forbid(unsafe_code)]

use loam_tiles::{Tile, TileRegistry};

pub mod payload;

pub use payload::ChunkPayloadError;

/// Chunk edge length in tiles.
pub const CHUNK_SIZE: usize = 32;
/// Tiles per chunk.
pub const CHUNK_AREA: usize = CHUNK_SIZE * CHUNK_SIZE;
/// Cache slots holding this value are recomputed on next read.
pub const CACHE_EMPTY: f32 = -1.0;

/// Weight of each solid diagonal neighbor in the occlusion sum.
pub const AO_DIAGONAL_WEIGHT: f32 = 0.3;
/// Weight of each solid orthogonal neighbor in the occlusion sum.
pub const AO_ORTHOGONAL_WEIGHT: f32 = 0.15;
/// Peak darkness of a cast shadow on a fully unlit tile.
pub const SHADOW_STRENGTH: f32 = 0.8;
/// How much the left/right neighbor average softens a shadow edge.
pub const SHADOW_NEIGHBOR_BLEND: f32 = 0.3;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dy = i64::from(self.cy - other.cy);
        dx * dx + dy * dy
    }
}

/// One 32x32 patch of the world. Tiles are the authoritative plane; walls
/// are cosmetic backdrop; `light` is the engine's scalar write-back; `ao`
/// and `shadow` are lazy caches keyed by `CACHE_EMPTY`.
#[derive(Clone, Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub tiles: Vec<Tile>,
    pub walls: Vec<u8>,
    pub light: Vec<u8>,
    pub ao: Vec<f32>,
    pub shadow: Vec<f32>,
    /// Player-visible edits since generation or the last restore.
    pub modified: bool,
    /// Set on any tile change; cleared by the lighting engine.
    pub lighting_dirty: bool,
    /// Tracked by the world once the chunk is materialized.
    pub loaded: bool,
}

impl Chunk {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            tiles: vec![Tile::AIR; CHUNK_AREA],
            walls: vec![0; CHUNK_AREA],
            light: vec![0; CHUNK_AREA],
            ao: vec![CACHE_EMPTY; CHUNK_AREA],
            shadow: vec![CACHE_EMPTY; CHUNK_AREA],
            modified: false,
            lighting_dirty: true,
            loaded: false,
        }
    }

    pub fn from_tiles(coord: ChunkCoord, tiles: Vec<Tile>) -> Self {
        let mut t = tiles;
        if t.len() != CHUNK_AREA {
            t.resize(CHUNK_AREA, Tile::AIR);
        }
        let mut c = Self::new(coord);
        c.tiles = t;
        c
    }

    #[inline]
    pub fn idx(x: usize, y: usize) -> usize {
        y * CHUNK_SIZE + x
    }

    #[inline]
    fn in_bounds(x: usize, y: usize) -> bool {
        x < CHUNK_SIZE && y < CHUNK_SIZE
    }

    /// Tile at local coords; anything out of range reads as air.
    #[inline]
    pub fn tile(&self, x: usize, y: usize) -> Tile {
        if !Self::in_bounds(x, y) {
            return Tile::AIR;
        }
        self.tiles[Self::idx(x, y)]
    }

    // Signed lookup for neighbor scans that step off the edge.
    #[inline]
    fn tile_signed(&self, x: i32, y: i32) -> Tile {
        if x < 0 || y < 0 {
            return Tile::AIR;
        }
        self.tile(x as usize, y as usize)
    }

    /// Store a tile. Writes that change nothing (same tile, or out of
    /// range) leave every flag untouched.
    pub fn set_tile(&mut self, x: usize, y: usize, t: Tile) {
        if !Self::in_bounds(x, y) {
            return;
        }
        let i = Self::idx(x, y);
        if self.tiles[i] == t {
            return;
        }
        self.tiles[i] = t;
        self.modified = true;
        self.lighting_dirty = true;
        self.invalidate_around(x, y);
    }

    #[inline]
    pub fn wall(&self, x: usize, y: usize) -> u8 {
        if !Self::in_bounds(x, y) {
            return 0;
        }
        self.walls[Self::idx(x, y)]
    }

    /// Walls are backdrop only: no lighting or cache effect, just `modified`.
    pub fn set_wall(&mut self, x: usize, y: usize, w: u8) {
        if !Self::in_bounds(x, y) {
            return;
        }
        let i = Self::idx(x, y);
        if self.walls[i] == w {
            return;
        }
        self.walls[i] = w;
        self.modified = true;
    }

    #[inline]
    pub fn light_at(&self, x: usize, y: usize) -> u8 {
        if !Self::in_bounds(x, y) {
            return 0;
        }
        self.light[Self::idx(x, y)]
    }

    /// Engine write-back of scalar brightness. Not an edit: `modified`
    /// stays put, but stale shadows over the touched column are dropped.
    pub fn set_light(&mut self, x: usize, y: usize, v: u8) {
        if !Self::in_bounds(x, y) {
            return;
        }
        let i = Self::idx(x, y);
        if self.light[i] == v {
            return;
        }
        self.light[i] = v;
        // Shadow reads its own and its horizontal neighbors' light.
        let x = x as i32;
        for nx in (x - 1)..=(x + 1) {
            if nx >= 0 && (nx as usize) < CHUNK_SIZE {
                self.shadow[Self::idx(nx as usize, y)] = CACHE_EMPTY;
            }
        }
    }

    /// Bulk-initialize every tile, e.g. from the generator.
    pub fn fill(&mut self, t: Tile) {
        self.tiles.fill(t);
        self.modified = true;
        self.lighting_dirty = true;
        self.ao.fill(CACHE_EMPTY);
        self.shadow.fill(CACHE_EMPTY);
    }

    fn invalidate_around(&mut self, x: usize, y: usize) {
        let (x, y) = (x as i32, y as i32);
        for ny in (y - 1)..=(y + 1) {
            for nx in (x - 1)..=(x + 1) {
                if nx >= 0 && ny >= 0 && Self::in_bounds(nx as usize, ny as usize) {
                    let i = Self::idx(nx as usize, ny as usize);
                    self.ao[i] = CACHE_EMPTY;
                    self.shadow[i] = CACHE_EMPTY;
                }
            }
        }
    }

    /// Corner darkening from solid 8-neighbors: diagonals weigh
    /// `AO_DIAGONAL_WEIGHT`, orthogonals `AO_ORTHOGONAL_WEIGHT`, clamped
    /// to [0,1]. Neighbors past the chunk edge count as air. Cached until
    /// a neighboring tile changes.
    pub fn ambient_occlusion_at(&mut self, x: usize, y: usize, reg: &TileRegistry) -> f32 {
        if !Self::in_bounds(x, y) {
            return 0.0;
        }
        let i = Self::idx(x, y);
        let cached = self.ao[i];
        if cached != CACHE_EMPTY {
            return cached;
        }
        let (xi, yi) = (x as i32, y as i32);
        let mut sum = 0.0f32;
        for dy in -1i32..=1 {
            for dx in -1i32..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if !reg.is_solid(self.tile_signed(xi + dx, yi + dy)) {
                    continue;
                }
                sum += if dx != 0 && dy != 0 {
                    AO_DIAGONAL_WEIGHT
                } else {
                    AO_ORTHOGONAL_WEIGHT
                };
            }
        }
        let v = sum.clamp(0.0, 1.0);
        self.ao[i] = v;
        v
    }

    // Shadow base for one tile: solid with air directly below, darker the
    // less lit it is. Everything else casts nothing.
    fn shadow_base(&self, x: i32, y: i32, reg: &TileRegistry) -> f32 {
        if !reg.is_solid(self.tile_signed(x, y)) || !self.tile_signed(x, y + 1).is_air() {
            return 0.0;
        }
        let light = if x >= 0 && y >= 0 && Self::in_bounds(x as usize, y as usize) {
            self.light[Self::idx(x as usize, y as usize)]
        } else {
            0
        };
        (1.0 - f32::from(light) / 255.0) * SHADOW_STRENGTH
    }

    /// Under-overhang shadow: the base value softened toward the average
    /// of left/right neighbors that also hang over air. Cached until a
    /// neighboring tile or the local light changes.
    pub fn cast_shadow_at(&mut self, x: usize, y: usize, reg: &TileRegistry) -> f32 {
        if !Self::in_bounds(x, y) {
            return 0.0;
        }
        let i = Self::idx(x, y);
        let cached = self.shadow[i];
        if cached != CACHE_EMPTY {
            return cached;
        }
        let (xi, yi) = (x as i32, y as i32);
        let base = self.shadow_base(xi, yi, reg);
        let v = if base > 0.0 {
            let mut acc = 0.0f32;
            let mut n = 0u32;
            for dx in [-1i32, 1] {
                let nv = self.shadow_base(xi + dx, yi, reg);
                if nv > 0.0 {
                    acc += nv;
                    n += 1;
                }
            }
            let blended = if n > 0 {
                base * (1.0 - SHADOW_NEIGHBOR_BLEND) + (acc / n as f32) * SHADOW_NEIGHBOR_BLEND
            } else {
                base
            };
            blended.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.shadow[i] = v;
        v
    }

    #[inline]
    pub fn has_non_air(&self) -> bool {
        self.tiles.iter().any(|t| !t.is_air())
    }
}
