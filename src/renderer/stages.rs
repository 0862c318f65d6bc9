//! The three compute stages and their bind groups.
//!
//! All stages share one binding numbering so the WGSL modules can declare
//! buffers once:
//!
//! | binding | buffer          | clear | bin  | rasterize |
//! |---------|-----------------|-------|------|-----------|
//! | 0       | uniform         | r     | r    | r         |
//! | 1       | instance lanes  |       | r    | r         |
//! | 2       | prepared        |       | rw   | r         |
//! | 3       | tile counts     | rw    | rw   | r         |
//! | 4       | tile slots      |       | rw   | r         |
//! | 5       | output          | rw    |      | rw        |

use super::frame_buffers::FrameBuffers;
use crate::error::StrokeError;
use crate::gpu::pipeline_helpers::{
    buffer_bind_group, create_compute_pipeline, storage_buffer, uniform_buffer,
};
use crate::gpu::shader_composer::{
    ShaderComposer, ShaderSource, BIN_SHADER, CLEAR_SHADER, RASTERIZE_SHADER,
};

const UNIFORM: u32 = 0;
const INSTANCES: u32 = 1;
const PREPARED: u32 = 2;
const TILE_COUNTS: u32 = 3;
const TILE_SLOTS: u32 = 4;
const OUTPUT: u32 = 5;

/// Clear workgroup width.
pub const CLEAR_GROUP_SIZE: u32 = 256;
/// Bin workgroup width.
pub const BIN_GROUP_SIZE: u32 = 64;
/// Per-dimension dispatch limit guaranteed by wgpu's default limits.
const MAX_GROUPS_PER_DIM: u32 = 65_535;

/// Workgroup counts covering `items` invocations of `group_size`-wide
/// groups, spread over two dimensions once one would overflow.
///
/// The shaders flatten the dispatch as `x + y * groups_x * group_size`.
pub fn flat_dispatch(items: u32, group_size: u32) -> (u32, u32) {
    let groups = items.div_ceil(group_size).max(1);
    let x = groups.min(MAX_GROUPS_PER_DIM);
    (x, groups.div_ceil(x))
}

struct Stage {
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
}

impl Stage {
    fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        label: &str,
        shader: ShaderSource,
        entries: &[wgpu::BindGroupLayoutEntry],
    ) -> Result<Self, StrokeError> {
        let module = composer.compose(device, label, shader)?;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} Layout")),
            entries,
        });
        let pipeline = create_compute_pipeline(device, label, &module, "main", &layout);
        Ok(Self { pipeline, layout })
    }
}

/// Bind groups for one set of frame buffers.
pub struct StageBindGroups {
    clear: wgpu::BindGroup,
    bin: wgpu::BindGroup,
    rasterize: wgpu::BindGroup,
}

/// Pipelines for clear, bin and rasterize.
pub struct ComputeStages {
    clear: Stage,
    bin: Stage,
    rasterize: Stage,
}

impl ComputeStages {
    /// Compose the stage shaders and build their pipelines.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Shader`] if a stage shader fails to compose.
    pub fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
    ) -> Result<Self, StrokeError> {
        let compute = wgpu::ShaderStages::COMPUTE;
        let clear = Stage::new(
            device,
            composer,
            "Clear",
            CLEAR_SHADER,
            &[
                uniform_buffer(UNIFORM, compute),
                storage_buffer(TILE_COUNTS, compute, false),
                storage_buffer(OUTPUT, compute, false),
            ],
        )?;
        let bin = Stage::new(
            device,
            composer,
            "Bin",
            BIN_SHADER,
            &[
                uniform_buffer(UNIFORM, compute),
                storage_buffer(INSTANCES, compute, true),
                storage_buffer(PREPARED, compute, false),
                storage_buffer(TILE_COUNTS, compute, false),
                storage_buffer(TILE_SLOTS, compute, false),
            ],
        )?;
        let rasterize = Stage::new(
            device,
            composer,
            "Rasterize",
            RASTERIZE_SHADER,
            &[
                uniform_buffer(UNIFORM, compute),
                storage_buffer(INSTANCES, compute, true),
                storage_buffer(PREPARED, compute, true),
                storage_buffer(TILE_COUNTS, compute, true),
                storage_buffer(TILE_SLOTS, compute, true),
                storage_buffer(OUTPUT, compute, false),
            ],
        )?;
        Ok(Self {
            clear,
            bin,
            rasterize,
        })
    }

    /// Bind groups over the current uniform, instance and frame buffers.
    pub fn bind_groups(
        &self,
        device: &wgpu::Device,
        uniform: &wgpu::Buffer,
        instances: &wgpu::Buffer,
        frame: &FrameBuffers,
    ) -> StageBindGroups {
        StageBindGroups {
            clear: buffer_bind_group(
                device,
                "Clear Bind Group",
                &self.clear.layout,
                &[
                    (UNIFORM, uniform),
                    (TILE_COUNTS, &frame.tile_counts),
                    (OUTPUT, &frame.output),
                ],
            ),
            bin: buffer_bind_group(
                device,
                "Bin Bind Group",
                &self.bin.layout,
                &[
                    (UNIFORM, uniform),
                    (INSTANCES, instances),
                    (PREPARED, &frame.prepared),
                    (TILE_COUNTS, &frame.tile_counts),
                    (TILE_SLOTS, &frame.tile_slots),
                ],
            ),
            rasterize: buffer_bind_group(
                device,
                "Rasterize Bind Group",
                &self.rasterize.layout,
                &[
                    (UNIFORM, uniform),
                    (INSTANCES, instances),
                    (PREPARED, &frame.prepared),
                    (TILE_COUNTS, &frame.tile_counts),
                    (TILE_SLOTS, &frame.tile_slots),
                    (OUTPUT, &frame.output),
                ],
            ),
        }
    }

    /// Record clear → bin → rasterize into `encoder`.
    ///
    /// Each stage gets its own compute pass so the storage writes of one are
    /// visible to the next. Binning is skipped for an empty scene.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        groups: &StageBindGroups,
        frame: &FrameBuffers,
    ) {
        let grid = frame.grid;
        let clear_items = grid.pixel_count().max(grid.tile_count()) as u32;
        let (cx, cy) = flat_dispatch(clear_items, CLEAR_GROUP_SIZE);
        dispatch(encoder, "Clear Pass", &self.clear.pipeline, &groups.clear, (cx, cy, 1));

        if frame.instance_count > 0 {
            let (bx, by) = flat_dispatch(frame.instance_count, BIN_GROUP_SIZE);
            dispatch(encoder, "Bin Pass", &self.bin.pipeline, &groups.bin, (bx, by, 1));
        }

        dispatch(
            encoder,
            "Rasterize Pass",
            &self.rasterize.pipeline,
            &groups.rasterize,
            (grid.tiles_x, grid.tiles_y, 1),
        );
    }
}

fn dispatch(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    pipeline: &wgpu::ComputePipeline,
    bind_group: &wgpu::BindGroup,
    (x, y, z): (u32, u32, u32),
) {
    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some(label),
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.dispatch_workgroups(x, y, z);
}
