//! Frame orchestration on the GPU.
//!
//! [`StrokeRenderer`] owns every GPU resource the rasterizer needs and
//! records one frame as clear → bin → rasterize, followed by an optional
//! present pass in the same encoder. The output buffer stays available for
//! presentation and for blocking readback.

mod frame_buffers;
mod present;
mod stages;

use glam::Vec3;
use wgpu::util::DeviceExt;

use self::frame_buffers::FrameBuffers;
use self::present::PresentPass;
use self::stages::{ComputeStages, StageBindGroups};
use crate::camera::CameraMatrices;
use crate::encoding::InstanceRecord;
use crate::error::StrokeError;
use crate::export::Frame;
use crate::gpu::dynamic_buffer::TypedBuffer;
use crate::gpu::render_context::RenderContext;
use crate::gpu::shader_composer::ShaderComposer;
use crate::options::RasterOptions;
use crate::raster::{tile_capacity, TileGrid, TransformUniform};

pub use self::stages::flat_dispatch;

/// Initial instance buffer capacity, in records.
const INITIAL_INSTANCES: usize = 1024;

/// Tile-based compute rasterizer for encoded stroke instances.
pub struct StrokeRenderer {
    stages: ComputeStages,
    present: PresentPass,
    uniform_buffer: wgpu::Buffer,
    instances: TypedBuffer<InstanceRecord>,
    frame: FrameBuffers,
    bind_groups: StageBindGroups,
    uniform: TransformUniform,
    background: Vec3,
    max_tile_list_bytes: u64,
}

impl StrokeRenderer {
    /// Build pipelines and buffers sized for the context's current target.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Shader`] if any stage shader fails to compose.
    pub fn new(
        context: &RenderContext,
        composer: &mut ShaderComposer,
        options: &RasterOptions,
    ) -> Result<Self, StrokeError> {
        let device = &context.device;
        let stages = ComputeStages::new(device, composer)?;
        let mut present = PresentPass::new(device, composer, context.format())?;

        let (width, height) = context.size();
        let grid = TileGrid::new(width, height);
        let background = Vec3::from_array(options.background);
        let uniform = TransformUniform::new(grid, 0, 1, &CameraMatrices::default(), background);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transform Uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let instances = TypedBuffer::with_capacity(
            device,
            "Instance Records",
            INITIAL_INSTANCES,
            wgpu::BufferUsages::STORAGE,
        );
        let frame = FrameBuffers::new(device, grid, 0, 1);
        let bind_groups =
            stages.bind_groups(device, &uniform_buffer, instances.buffer(), &frame);
        present.rebind(device, &uniform_buffer, &frame.output);

        Ok(Self {
            stages,
            present,
            uniform_buffer,
            instances,
            frame,
            bind_groups,
            uniform,
            background,
            max_tile_list_bytes: options.max_tile_list_bytes,
        })
    }

    /// Apply new raster options. Takes effect on the next frame.
    pub fn set_options(&mut self, context: &RenderContext, options: &RasterOptions) {
        self.background = Vec3::from_array(options.background);
        if self.max_tile_list_bytes != options.max_tile_list_bytes {
            self.max_tile_list_bytes = options.max_tile_list_bytes;
            self.reconfigure(&context.device, false);
        }
    }

    /// Replace the instance set. The buffer grows as needed.
    pub fn upload_instances(&mut self, context: &RenderContext, records: &[InstanceRecord]) {
        let reallocated = self
            .instances
            .write(&context.device, &context.queue, records);
        self.reconfigure(&context.device, reallocated);
    }

    /// Resize the output to `width` x `height`. Zero sizes are ignored.
    pub fn resize(&mut self, context: &RenderContext, width: u32, height: u32) {
        let grid = TileGrid::new(width, height);
        if width == 0 || height == 0 || grid == self.frame.grid {
            return;
        }
        self.reconfigure_for(&context.device, grid, false);
    }

    /// Record clear → bin → rasterize for `camera` into `encoder`.
    ///
    /// The uniform block is written through the queue, so it lands before
    /// the encoder's commands execute.
    pub fn encode_frame(
        &mut self,
        context: &RenderContext,
        encoder: &mut wgpu::CommandEncoder,
        camera: &CameraMatrices,
    ) {
        self.uniform = TransformUniform::new(
            self.frame.grid,
            self.frame.instance_count,
            self.frame.tile_capacity,
            camera,
            self.background,
        );
        context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniform));
        self.stages.record(encoder, &self.bind_groups, &self.frame);
    }

    /// Draw the output buffer onto `target`, whose size must match the grid.
    pub fn present(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        self.present.render(encoder, target);
    }

    /// The rasterizer's output buffer: one `vec4<f32>` per pixel, row-major.
    #[must_use]
    pub fn output_buffer(&self) -> &wgpu::Buffer {
        &self.frame.output
    }

    /// Copy the output buffer to the host, blocking until the GPU is done.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::DeviceLost`] if the device is gone, or
    /// [`StrokeError::Readback`] if mapping fails.
    pub fn read_output(&self, context: &RenderContext) -> Result<Frame, StrokeError> {
        if let Some(reason) = context.device_lost() {
            return Err(StrokeError::DeviceLost(reason));
        }
        let size = self.frame.output_bytes();
        let staging = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Output Readback"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let mut encoder = context.create_encoder();
        encoder.copy_buffer_to_buffer(&self.frame.output, 0, &staging, 0, size);
        context.submit(encoder);

        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        let _ = context
            .device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| StrokeError::Readback(e.to_string()))?;
        receiver
            .recv()
            .map_err(|e| StrokeError::Readback(e.to_string()))?
            .map_err(|e| StrokeError::Readback(e.to_string()))?;

        let grid = self.frame.grid;
        let data = slice.get_mapped_range();
        let mut pixels = bytemuck::pod_collect_to_vec::<u8, [f32; 4]>(&data);
        drop(data);
        staging.unmap();
        pixels.truncate(grid.pixel_count());
        Frame::new(grid.width, grid.height, pixels)
    }

    /// Current tile grid.
    #[must_use]
    pub fn grid(&self) -> TileGrid {
        self.frame.grid
    }

    /// Slots per tile list in effect.
    #[must_use]
    pub fn tile_capacity(&self) -> u32 {
        self.frame.tile_capacity
    }

    /// Number of uploaded instance records.
    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.frame.instance_count
    }

    /// Uniform block of the last encoded frame.
    #[must_use]
    pub fn uniform(&self) -> &TransformUniform {
        &self.uniform
    }

    fn reconfigure(&mut self, device: &wgpu::Device, force_rebind: bool) {
        self.reconfigure_for(device, self.frame.grid, force_rebind);
    }

    /// Recreate the frame buffers if the grid, instance count or tile
    /// capacity changed, then refresh bind groups.
    fn reconfigure_for(&mut self, device: &wgpu::Device, grid: TileGrid, force_rebind: bool) {
        let count = u32::try_from(self.instances.count()).unwrap_or(u32::MAX);
        let max_bytes = self
            .max_tile_list_bytes
            .min(u64::from(device.limits().max_storage_buffer_binding_size))
            .min(device.limits().max_buffer_size);
        let (capacity, capped) = tile_capacity(grid, count, max_bytes);

        if self.frame.matches(grid, count, capacity) && !force_rebind {
            return;
        }
        if capped && !self.frame.matches(grid, count, capacity) {
            log::warn!(
                "tile lists capped at {capacity} of {count} slots ({} tiles, {max_bytes} byte budget); \
                 crowded tiles will drop instances",
                grid.tile_count()
            );
        }
        if !self.frame.matches(grid, count, capacity) {
            log::debug!(
                "frame buffers: {}x{} px, {} tiles, {count} instances, {capacity} slots/tile",
                grid.width,
                grid.height,
                grid.tile_count()
            );
            self.frame = FrameBuffers::new(device, grid, count, capacity);
        }
        self.rebind(device);
    }

    fn rebind(&mut self, device: &wgpu::Device) {
        self.bind_groups = self.stages.bind_groups(
            device,
            &self.uniform_buffer,
            self.instances.buffer(),
            &self.frame,
        );
        self.present.rebind(device, &self.uniform_buffer, &self.frame.output);
    }
}
