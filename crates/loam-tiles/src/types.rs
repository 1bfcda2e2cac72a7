/// Catalog index of a tile kind. Id 0 is always air.
pub type TileId = u8;

/// One cell of terrain: just a catalog id. Attribute lookups go through
/// the registry.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Tile {
    pub id: TileId,
}

impl Tile {
    pub const AIR: Tile = Tile { id: 0 };

    #[inline]
    pub const fn new(id: TileId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self.id == 0
    }
}
