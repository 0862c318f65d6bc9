use serde::{Deserialize, Serialize};

/// Default cap on the tile candidate lists: 128 MiB.
pub const DEFAULT_MAX_TILE_LIST_BYTES: u64 = 128 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
/// Rasterizer parameters.
pub struct RasterOptions {
    /// Linear RGB the compositor blends uncovered coverage against.
    pub background: [f32; 3],
    /// Upper bound on the size of the per-tile candidate lists. Tile
    /// capacity is reduced below the instance count to stay under it.
    pub max_tile_list_bytes: u64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            background: [1.0, 1.0, 1.0],
            max_tile_list_bytes: DEFAULT_MAX_TILE_LIST_BYTES,
        }
    }
}
