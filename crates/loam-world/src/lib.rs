//! Bounded chunk grid and the world-space tile query surface.
#![forbid(unsafe_code)]

use std::sync::Arc;

use hashbrown::HashMap;
use loam_chunk::{CHUNK_SIZE, Chunk, ChunkCoord, ChunkPayloadError};
use loam_geom::TileRect;
use loam_tiles::{Tile, TileRegistry};

/// Fills a freshly created chunk with terrain. Implementations live
/// outside this crate; the world only drives them.
pub trait TerrainSource {
    fn populate(&mut self, coord: ChunkCoord, chunk: &mut Chunk);
}

/// A fixed `width_chunks x height_chunks` grid of chunks. World tile
/// coords are `i32` over `[0, width_tiles) x [0, height_tiles)`; reads
/// outside that range are air and writes are dropped.
pub struct TileWorld {
    pub width_chunks: i32,
    pub height_chunks: i32,
    pub registry: Arc<TileRegistry>,
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl TileWorld {
    pub fn new(width_chunks: i32, height_chunks: i32, registry: Arc<TileRegistry>) -> Self {
        Self {
            width_chunks: width_chunks.max(1),
            height_chunks: height_chunks.max(1),
            registry,
            chunks: HashMap::new(),
        }
    }

    #[inline]
    pub fn width_tiles(&self) -> i32 {
        self.width_chunks * CHUNK_SIZE as i32
    }

    #[inline]
    pub fn height_tiles(&self) -> i32 {
        self.height_chunks * CHUNK_SIZE as i32
    }

    #[inline]
    pub fn in_bounds(&self, wx: i32, wy: i32) -> bool {
        wx >= 0 && wy >= 0 && wx < self.width_tiles() && wy < self.height_tiles()
    }

    #[inline]
    fn chunk_key(wx: i32, wy: i32) -> ChunkCoord {
        ChunkCoord::new(
            wx.div_euclid(CHUNK_SIZE as i32),
            wy.div_euclid(CHUNK_SIZE as i32),
        )
    }

    #[inline]
    fn local(wx: i32, wy: i32) -> (usize, usize) {
        (
            wx.rem_euclid(CHUNK_SIZE as i32) as usize,
            wy.rem_euclid(CHUNK_SIZE as i32) as usize,
        )
    }

    pub fn tile(&self, wx: i32, wy: i32) -> Tile {
        if !self.in_bounds(wx, wy) {
            return Tile::AIR;
        }
        let (lx, ly) = Self::local(wx, wy);
        self.chunks
            .get(&Self::chunk_key(wx, wy))
            .map(|c| c.tile(lx, ly))
            .unwrap_or(Tile::AIR)
    }

    /// Write a tile, materializing its chunk if needed. A chunk created
    /// this way starts as all air and is never handed to the generator.
    pub fn set_tile(&mut self, wx: i32, wy: i32, t: Tile) {
        if !self.in_bounds(wx, wy) {
            return;
        }
        let key = Self::chunk_key(wx, wy);
        let (lx, ly) = Self::local(wx, wy);
        self.chunks
            .entry(key)
            .or_insert_with(|| materialized(key))
            .set_tile(lx, ly, t);
    }

    #[inline]
    pub fn is_solid(&self, wx: i32, wy: i32) -> bool {
        self.registry.is_solid(self.tile(wx, wy))
    }

    #[inline]
    pub fn is_liquid(&self, wx: i32, wy: i32) -> bool {
        self.registry.is_liquid(self.tile(wx, wy))
    }

    pub fn wall(&self, wx: i32, wy: i32) -> u8 {
        if !self.in_bounds(wx, wy) {
            return 0;
        }
        let (lx, ly) = Self::local(wx, wy);
        self.chunks
            .get(&Self::chunk_key(wx, wy))
            .map(|c| c.wall(lx, ly))
            .unwrap_or(0)
    }

    pub fn set_wall(&mut self, wx: i32, wy: i32, w: u8) {
        if !self.in_bounds(wx, wy) {
            return;
        }
        let key = Self::chunk_key(wx, wy);
        let (lx, ly) = Self::local(wx, wy);
        self.chunks
            .entry(key)
            .or_insert_with(|| materialized(key))
            .set_wall(lx, ly, w);
    }

    pub fn light_at(&self, wx: i32, wy: i32) -> u8 {
        if !self.in_bounds(wx, wy) {
            return 0;
        }
        let (lx, ly) = Self::local(wx, wy);
        self.chunks
            .get(&Self::chunk_key(wx, wy))
            .map(|c| c.light_at(lx, ly))
            .unwrap_or(0)
    }

    /// Engine write-back; silently dropped for tiles whose chunk was
    /// never materialized.
    pub fn set_light(&mut self, wx: i32, wy: i32, v: u8) {
        if !self.in_bounds(wx, wy) {
            return;
        }
        if let Some(c) = self.chunks.get_mut(&Self::chunk_key(wx, wy)) {
            let (lx, ly) = Self::local(wx, wy);
            c.set_light(lx, ly, v);
        }
    }

    pub fn ambient_occlusion_at(&mut self, wx: i32, wy: i32) -> f32 {
        if !self.in_bounds(wx, wy) {
            return 0.0;
        }
        let reg = Arc::clone(&self.registry);
        match self.chunks.get_mut(&Self::chunk_key(wx, wy)) {
            Some(c) => {
                let (lx, ly) = Self::local(wx, wy);
                c.ambient_occlusion_at(lx, ly, &reg)
            }
            None => 0.0,
        }
    }

    pub fn cast_shadow_at(&mut self, wx: i32, wy: i32) -> f32 {
        if !self.in_bounds(wx, wy) {
            return 0.0;
        }
        let reg = Arc::clone(&self.registry);
        match self.chunks.get_mut(&Self::chunk_key(wx, wy)) {
            Some(c) => {
                let (lx, ly) = Self::local(wx, wy);
                c.cast_shadow_at(lx, ly, &reg)
            }
            None => 0.0,
        }
    }

    /// Fetch-or-create a chunk, running the generator over it exactly
    /// once. Generated content is not an edit, so `modified` stays clear.
    pub fn ensure_chunk(&mut self, coord: ChunkCoord, source: &mut dyn TerrainSource) -> &mut Chunk {
        let c = self
            .chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(coord));
        if !c.loaded {
            source.populate(coord, c);
            c.loaded = true;
            c.modified = false;
            c.lighting_dirty = true;
            log::debug!("generated chunk ({},{})", coord.cx, coord.cy);
        }
        c
    }

    /// Drop every chunk further than `radius_chunks` from `center`,
    /// handing back payloads for the modified ones so the caller can
    /// persist them. Pristine chunks are dropped without a payload; the
    /// generator can always rebuild them.
    pub fn evict_outside(
        &mut self,
        center: ChunkCoord,
        radius_chunks: i32,
    ) -> Vec<(ChunkCoord, Vec<u8>)> {
        let r2 = i64::from(radius_chunks) * i64::from(radius_chunks);
        let before = self.chunks.len();
        let mut saved = Vec::new();
        self.chunks.retain(|&coord, chunk| {
            if coord.distance_sq(center) <= r2 {
                return true;
            }
            if chunk.modified {
                saved.push((coord, chunk.serialize()));
            }
            false
        });
        let dropped = before - self.chunks.len();
        if dropped > 0 {
            log::debug!(
                "evicted {} chunks around ({},{}), {} payloads kept",
                dropped,
                center.cx,
                center.cy,
                saved.len()
            );
        }
        saved
    }

    /// Rebuild a chunk from a payload returned by `evict_outside`.
    pub fn restore_chunk(
        &mut self,
        coord: ChunkCoord,
        bytes: &[u8],
    ) -> Result<(), ChunkPayloadError> {
        let mut c = Chunk::new(coord);
        c.deserialize(bytes)?;
        c.loaded = true;
        self.chunks.insert(coord, c);
        Ok(())
    }

    /// Union of the world-space bounds of every chunk flagged
    /// lighting-dirty, clearing the flags. `None` means nothing changed
    /// since the last call.
    pub fn take_lighting_dirty(&mut self) -> Option<TileRect> {
        let size = CHUNK_SIZE as i32;
        let mut acc: Option<TileRect> = None;
        for (coord, chunk) in self.chunks.iter_mut() {
            if !chunk.lighting_dirty {
                continue;
            }
            chunk.lighting_dirty = false;
            let x0 = coord.cx * size;
            let y0 = coord.cy * size;
            let rect = TileRect::new(x0, y0, x0 + size - 1, y0 + size - 1);
            acc = Some(match acc {
                Some(r) => r.union(rect),
                None => rect,
            });
        }
        acc
    }

    #[inline]
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    #[inline]
    pub fn loaded_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn for_each_loaded(&self, mut f: impl FnMut(ChunkCoord, &Chunk)) {
        for (coord, chunk) in self.chunks.iter() {
            f(*coord, chunk);
        }
    }
}

// Implicit creation outside the generator path.
fn materialized(coord: ChunkCoord) -> Chunk {
    let mut c = Chunk::new(coord);
    c.loaded = true;
    c
}
