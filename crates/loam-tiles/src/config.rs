use serde::Deserialize;

/// Root of the tile catalog TOML: a `[[tiles]]` array.
#[derive(Debug, Clone, Deserialize)]
pub struct TilesConfig {
    pub tiles: Vec<TileDef>,
}

/// One `[[tiles]]` entry. Omitted fields take the defaults documented on
/// `TileRegistry::from_config`.
#[derive(Debug, Clone, Deserialize)]
pub struct TileDef {
    pub name: String,
    pub id: Option<u8>,
    pub solid: Option<bool>,
    pub liquid: Option<bool>,
    pub hardness: Option<f32>,
    pub light_level: Option<u8>,
    pub light_color: Option<[u8; 3]>,
    pub animated: Option<bool>,
    // Name of the tile yielded when this one breaks; "air" drops nothing.
    pub drop: Option<String>,
}
