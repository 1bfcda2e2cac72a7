use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use loam_geom::Rgb;

use super::config::TilesConfig;
use super::types::{Tile, TileId};

/// Warm incandescent tint applied to emissive tiles that don't pick a color.
pub const DEFAULT_LIGHT_COLOR: [u8; 3] = [255, 214, 170];

/// Compiled per-tile attributes. Built once from config; never mutated.
#[derive(Clone, Debug)]
pub struct TileProps {
    pub name: String,
    pub is_solid: bool,
    pub is_liquid: bool,
    /// Mining time scale; `f32::INFINITY` marks an unbreakable tile.
    pub hardness: f32,
    /// Emission radius in tiles; 0 means the tile does not emit.
    pub light_level: u8,
    pub light_color: [u8; 3],
    pub is_animated: bool,
    /// Yield when broken. `Tile::AIR` drops nothing.
    pub drop: Tile,
}

#[derive(Debug)]
pub enum CatalogError {
    DuplicateId {
        id: TileId,
        first: String,
        second: String,
    },
    DuplicateName(String),
    UnknownDrop {
        tile: String,
        drop: String,
    },
    IdSpaceExhausted,
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::DuplicateId { id, first, second } => {
                write!(f, "duplicate tile id {}: {} and {}", id, first, second)
            }
            CatalogError::DuplicateName(name) => write!(f, "duplicate tile name: {}", name),
            CatalogError::UnknownDrop { tile, drop } => {
                write!(f, "tile {} drops undefined tile {}", tile, drop)
            }
            CatalogError::IdSpaceExhausted => write!(f, "tile id space exhausted (ids are u8)"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Immutable tile catalog. Ids index `tiles`; holes in the id space behave
/// like the inert unknown entry.
#[derive(Clone, Debug)]
pub struct TileRegistry {
    pub tiles: Vec<Option<TileProps>>,
    pub by_name: HashMap<String, TileId>,
    unknown: TileProps,
}

impl Default for TileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TileRegistry {
    pub fn new() -> Self {
        Self {
            tiles: Vec::new(),
            by_name: HashMap::new(),
            unknown: TileProps {
                name: "unknown".to_string(),
                is_solid: false,
                is_liquid: false,
                hardness: 1.0,
                light_level: 0,
                light_color: DEFAULT_LIGHT_COLOR,
                is_animated: false,
                drop: Tile::AIR,
            },
        }
    }

    #[inline]
    pub fn get(&self, id: TileId) -> Option<&TileProps> {
        self.tiles.get(id as usize).and_then(|slot| slot.as_ref())
    }

    /// Attribute lookup that never fails: catalog misses resolve to an inert
    /// unknown entry (non-solid, non-liquid, non-emissive, drops nothing).
    #[inline]
    pub fn props(&self, id: TileId) -> &TileProps {
        self.get(id).unwrap_or(&self.unknown)
    }

    pub fn id_by_name(&self, name: &str) -> Option<TileId> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn is_solid(&self, t: Tile) -> bool {
        self.props(t.id).is_solid
    }

    #[inline]
    pub fn is_liquid(&self, t: Tile) -> bool {
        self.props(t.id).is_liquid
    }

    /// Emission radius and color for `t`, or `None` for non-emissive tiles.
    pub fn emission(&self, t: Tile) -> Option<(u8, Rgb)> {
        let p = self.props(t.id);
        if p.light_level == 0 {
            return None;
        }
        Some((p.light_level, Rgb::from_bytes(p.light_color)))
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: TilesConfig = toml::from_str(toml_str)?;
        Self::from_config(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Compile a parsed config. Defaults for omitted fields: solid=true,
    /// liquid=false, hardness=1.0, light_level=0,
    /// light_color=`DEFAULT_LIGHT_COLOR`, animated=false, drop=self.
    /// Duplicate ids or names are load errors, as is a drop naming a tile
    /// the catalog never defines.
    pub fn from_config(cfg: TilesConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = TileRegistry::new();
        // Drops may reference tiles defined later, so resolve them after the
        // whole catalog is registered.
        let mut pending_drops: Vec<(TileId, String)> = Vec::new();
        for def in cfg.tiles.into_iter() {
            let id = match def.id {
                Some(v) => v,
                None => {
                    if reg.tiles.len() > TileId::MAX as usize {
                        return Err(CatalogError::IdSpaceExhausted.into());
                    }
                    reg.tiles.len() as TileId
                }
            };
            if reg.tiles.len() <= id as usize {
                reg.tiles.resize(id as usize + 1, None);
            }
            if let Some(prev) = &reg.tiles[id as usize] {
                return Err(CatalogError::DuplicateId {
                    id,
                    first: prev.name.clone(),
                    second: def.name,
                }
                .into());
            }
            if reg.by_name.contains_key(&def.name) {
                return Err(CatalogError::DuplicateName(def.name).into());
            }
            if let Some(drop_name) = def.drop {
                pending_drops.push((id, drop_name));
            }
            reg.by_name.insert(def.name.clone(), id);
            reg.tiles[id as usize] = Some(TileProps {
                name: def.name,
                is_solid: def.solid.unwrap_or(true),
                is_liquid: def.liquid.unwrap_or(false),
                hardness: def.hardness.unwrap_or(1.0),
                light_level: def.light_level.unwrap_or(0),
                light_color: def.light_color.unwrap_or(DEFAULT_LIGHT_COLOR),
                is_animated: def.animated.unwrap_or(false),
                drop: Tile::new(id),
            });
        }
        for (id, drop_name) in pending_drops {
            let Some(target) = reg.id_by_name(&drop_name) else {
                return Err(CatalogError::UnknownDrop {
                    tile: reg.props(id).name.clone(),
                    drop: drop_name,
                }
                .into());
            };
            if let Some(p) = reg.tiles[id as usize].as_mut() {
                p.drop = Tile::new(target);
            }
        }
        Ok(reg)
    }
}
