//! Run-length chunk payloads for save files and eviction handoff.

use loam_tiles::Tile;

use super::{CACHE_EMPTY, CHUNK_AREA, Chunk, ChunkCoord};

#[derive(Debug, PartialEq, Eq)]
pub enum ChunkPayloadError {
    /// Payload ends before the header or a run pair completes.
    Truncated,
    /// Header coords don't match the chunk asked to load them.
    HeaderMismatch {
        expected: ChunkCoord,
        found: ChunkCoord,
    },
    /// A run byte of zero; `offset` is its byte position in the payload.
    ZeroRun { offset: usize },
    /// Runs summed to `cells`, not the full chunk area.
    CellCountMismatch { cells: usize },
    /// `extra` bytes remained after the runs covered the chunk.
    TrailingBytes { extra: usize },
}

impl std::fmt::Display for ChunkPayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkPayloadError::Truncated => write!(f, "chunk payload truncated"),
            ChunkPayloadError::HeaderMismatch { expected, found } => write!(
                f,
                "payload is for chunk ({},{}) but was handed to ({},{})",
                found.cx, found.cy, expected.cx, expected.cy
            ),
            ChunkPayloadError::ZeroRun { offset } => {
                write!(f, "zero-length run at byte {}", offset)
            }
            ChunkPayloadError::CellCountMismatch { cells } => {
                write!(f, "runs cover {} cells, expected {}", cells, CHUNK_AREA)
            }
            ChunkPayloadError::TrailingBytes { extra } => {
                write!(f, "{} trailing bytes after final run", extra)
            }
        }
    }
}

impl std::error::Error for ChunkPayloadError {}

impl Chunk {
    /// Encode coords plus the tile plane as `(id, run)` byte pairs in
    /// row-major order. Runs never exceed 255 and always cover exactly
    /// the chunk area. Walls, light, and caches are all derivable or
    /// cosmetic and stay out of the payload.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + CHUNK_AREA / 4);
        out.extend_from_slice(&self.coord.cx.to_le_bytes());
        out.extend_from_slice(&self.coord.cy.to_le_bytes());
        let mut i = 0usize;
        while i < CHUNK_AREA {
            let id = self.tiles[i].id;
            let mut run = 1usize;
            while run < 255 && i + run < CHUNK_AREA && self.tiles[i + run].id == id {
                run += 1;
            }
            out.push(id);
            out.push(run as u8);
            i += run;
        }
        out
    }

    /// Replace this chunk's tiles from a payload produced by `serialize`.
    /// The header must name this chunk's own coords. On success the
    /// shading caches are wiped, `modified` clears, and `lighting_dirty`
    /// is set; on any error the chunk is left untouched.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<(), ChunkPayloadError> {
        if bytes.len() < 8 {
            return Err(ChunkPayloadError::Truncated);
        }
        let cx = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let cy = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let found = ChunkCoord::new(cx, cy);
        if found != self.coord {
            return Err(ChunkPayloadError::HeaderMismatch {
                expected: self.coord,
                found,
            });
        }
        let body = &bytes[8..];
        if body.len() % 2 != 0 {
            return Err(ChunkPayloadError::Truncated);
        }
        let mut scratch = vec![Tile::AIR; CHUNK_AREA];
        let mut cells = 0usize;
        for (k, pair) in body.chunks_exact(2).enumerate() {
            if cells == CHUNK_AREA {
                return Err(ChunkPayloadError::TrailingBytes {
                    extra: body.len() - 2 * k,
                });
            }
            let id = pair[0];
            let run = pair[1] as usize;
            if run == 0 {
                return Err(ChunkPayloadError::ZeroRun { offset: 8 + 2 * k + 1 });
            }
            if cells + run > CHUNK_AREA {
                return Err(ChunkPayloadError::CellCountMismatch { cells: cells + run });
            }
            scratch[cells..cells + run].fill(Tile::new(id));
            cells += run;
        }
        if cells != CHUNK_AREA {
            return Err(ChunkPayloadError::CellCountMismatch { cells });
        }
        self.tiles = scratch;
        self.ao.fill(CACHE_EMPTY);
        self.shadow.fill(CACHE_EMPTY);
        self.modified = false;
        self.lighting_dirty = true;
        Ok(())
    }
}
