//! Per-frame scratch buffers whose sizes follow the tile grid and the
//! instance count.

use crate::raster::{PreparedInstance, TileGrid};

/// Bytes per output pixel (`vec4<f32>`).
const PIXEL_BYTES: u64 = 16;

/// Scratch buffers shared by the clear, bin and rasterize stages.
pub struct FrameBuffers {
    /// One [`PreparedInstance`] per record, written by the binner.
    pub prepared: wgpu::Buffer,
    /// One counter per tile.
    pub tile_counts: wgpu::Buffer,
    /// `tile_capacity` slots per tile.
    pub tile_slots: wgpu::Buffer,
    /// One RGBA pixel per output pixel, row-major.
    pub output: wgpu::Buffer,
    /// Grid the buffers were sized for.
    pub grid: TileGrid,
    /// Instance count the prepared buffer was sized for.
    pub instance_count: u32,
    /// Slots per tile list.
    pub tile_capacity: u32,
}

impl FrameBuffers {
    /// Allocate the buffers for `grid`, `instance_count` records and
    /// `tile_capacity` slots per tile.
    pub fn new(
        device: &wgpu::Device,
        grid: TileGrid,
        instance_count: u32,
        tile_capacity: u32,
    ) -> Self {
        let tiles = grid.tile_count().max(1) as u64;
        let prepared_bytes =
            u64::from(instance_count.max(1)) * size_of::<PreparedInstance>() as u64;

        Self {
            prepared: storage(device, "Prepared Instances", prepared_bytes, false),
            tile_counts: storage(device, "Tile Counts", tiles * 4, false),
            tile_slots: storage(
                device,
                "Tile Slots",
                tiles * u64::from(tile_capacity.max(1)) * 4,
                false,
            ),
            output: storage(
                device,
                "Raster Output",
                grid.pixel_count().max(1) as u64 * PIXEL_BYTES,
                true,
            ),
            grid,
            instance_count,
            tile_capacity,
        }
    }

    /// Whether these buffers fit the given frame shape.
    pub fn matches(&self, grid: TileGrid, instance_count: u32, tile_capacity: u32) -> bool {
        self.grid == grid
            && self.instance_count == instance_count
            && self.tile_capacity == tile_capacity
    }

    /// Size of the output buffer in bytes.
    pub fn output_bytes(&self) -> u64 {
        self.output.size()
    }
}

fn storage(device: &wgpu::Device, label: &str, size: u64, readable: bool) -> wgpu::Buffer {
    let mut usage = wgpu::BufferUsages::STORAGE;
    if readable {
        usage |= wgpu::BufferUsages::COPY_SRC;
    }
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}
