use std::error::Error;

use fastnoise_lite::{FastNoiseLite, NoiseType};
use loam_chunk::{CHUNK_SIZE, Chunk, ChunkCoord};
use loam_tiles::{Tile, TileId, TileRegistry};
use loam_world::TerrainSource;

const CAVE_THRESHOLD: f32 = 0.58;
const TORCH_CHANCE: f32 = 0.02;
const ORE_CHANCE: f32 = 0.012;

/// Noise-driven demo landscape: rolling surface, dirt skin over stone,
/// carved caves with the odd torch, and a bedrock floor.
pub struct NoiseTerrain {
    height: FastNoiseLite,
    caves: FastNoiseLite,
    seed: i32,
    world_height: i32,
    water_row: i32,
    grass: TileId,
    dirt: TileId,
    sand: TileId,
    stone: TileId,
    bedrock: TileId,
    water: TileId,
    torch: TileId,
    glow_ore: TileId,
}

fn need(registry: &TileRegistry, name: &str) -> Result<TileId, Box<dyn Error>> {
    registry
        .id_by_name(name)
        .ok_or_else(|| format!("tile catalog is missing {name:?}").into())
}

impl NoiseTerrain {
    pub fn new(seed: i32, registry: &TileRegistry, world_height: i32) -> Result<Self, Box<dyn Error>> {
        let mut height = FastNoiseLite::with_seed(seed);
        height.set_noise_type(Some(NoiseType::OpenSimplex2));
        height.set_frequency(Some(0.012));
        let mut caves = FastNoiseLite::with_seed(seed ^ 41_337);
        caves.set_noise_type(Some(NoiseType::OpenSimplex2));
        caves.set_frequency(Some(0.05));
        let world_height = world_height.max(2);
        Ok(Self {
            height,
            caves,
            seed,
            world_height,
            water_row: (world_height as f32 * 0.52) as i32,
            grass: need(registry, "grass")?,
            dirt: need(registry, "dirt")?,
            sand: need(registry, "sand")?,
            stone: need(registry, "stone")?,
            bedrock: need(registry, "bedrock")?,
            water: need(registry, "water")?,
            torch: need(registry, "torch")?,
            glow_ore: need(registry, "glow_ore")?,
        })
    }

    /// Ground row for a world column; y grows downward, so a larger row is
    /// a deeper valley.
    pub fn surface_row(&self, wx: i32) -> i32 {
        let min_row = (self.world_height as f32 * 0.30) as i32;
        let max_row = (self.world_height as f32 * 0.60) as i32;
        let n = self.height.get_noise_2d(wx as f32, 0.0);
        let row = ((n + 1.0) * 0.5 * (max_row - min_row) as f32) as i32 + min_row;
        row.clamp(1, self.world_height - 1)
    }
}

impl TerrainSource for NoiseTerrain {
    fn populate(&mut self, coord: ChunkCoord, chunk: &mut Chunk) {
        let size = CHUNK_SIZE as i32;
        let base_x = coord.cx * size;
        let base_y = coord.cy * size;
        for lx in 0..CHUNK_SIZE {
            let wx = base_x + lx as i32;
            let surface = self.surface_row(wx);
            for ly in 0..CHUNK_SIZE {
                let wy = base_y + ly as i32;
                let depth = wy - surface;
                let tile = if wy >= self.world_height - 1 {
                    Tile::new(self.bedrock)
                } else if depth < 0 {
                    // Open sky, with water pooling in valleys below the
                    // waterline.
                    if wy >= self.water_row {
                        Tile::new(self.water)
                    } else {
                        Tile::AIR
                    }
                } else if depth == 0 {
                    if surface >= self.water_row {
                        Tile::new(self.sand)
                    } else {
                        Tile::new(self.grass)
                    }
                } else if depth <= 3 {
                    Tile::new(self.dirt)
                } else if self.caves.get_noise_2d(wx as f32, wy as f32) > CAVE_THRESHOLD {
                    if rand01(wx, wy, self.seed as u32 ^ 71_993) < TORCH_CHANCE {
                        Tile::new(self.torch)
                    } else {
                        Tile::AIR
                    }
                } else if rand01(wx, wy, self.seed as u32 ^ 19_777) < ORE_CHANCE {
                    Tile::new(self.glow_ore)
                } else {
                    Tile::new(self.stone)
                };

                // Background wall tracks the ground so carved caves keep a
                // backdrop; the sky has none.
                let wall = if depth == 0 {
                    if surface >= self.water_row { self.sand } else { self.grass }
                } else if (1..=3).contains(&depth) {
                    self.dirt
                } else if depth > 3 {
                    self.stone
                } else {
                    0
                };

                let i = Chunk::idx(lx, ly);
                chunk.tiles[i] = tile;
                chunk.walls[i] = wall;
            }
        }
    }
}

fn hash2(ix: i32, iy: i32, seed: u32) -> u32 {
    let mut h = (ix as u32).wrapping_mul(0x85eb_ca6b)
        ^ (iy as u32).wrapping_mul(0xc2b2_ae35)
        ^ seed.wrapping_mul(0x27d4_eb2d);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

fn rand01(ix: i32, iy: i32, seed: u32) -> f32 {
    (hash2(ix, iy, seed) & 0x00FF_FFFF) as f32 / 16_777_216.0
}
