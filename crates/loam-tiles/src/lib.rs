//! Tile catalog crate: tile ids, per-tile attributes, and the registry.
#![forbid(unsafe_code)]

pub mod config;
pub mod registry;
pub mod types;

pub use config::{TileDef, TilesConfig};
pub use registry::{TileProps, TileRegistry};
pub use types::{Tile, TileId};
