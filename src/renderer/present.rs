//! Present pass: copies the output buffer onto a color target with a
//! fullscreen triangle.

use crate::error::StrokeError;
use crate::gpu::pipeline_helpers::{
    buffer_bind_group, create_screen_space_pipeline, storage_buffer, uniform_buffer,
};
use crate::gpu::shader_composer::{ShaderComposer, PRESENT_SHADER};

/// Fullscreen copy of the rasterizer output.
pub struct PresentPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
}

impl PresentPass {
    /// Build the pipeline for targets of `format`.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Shader`] if the present shader fails to compose.
    pub fn new(
        device: &wgpu::Device,
        composer: &mut ShaderComposer,
        format: wgpu::TextureFormat,
    ) -> Result<Self, StrokeError> {
        let module = composer.compose(device, "Present Shader", PRESENT_SHADER)?;
        let fragment = wgpu::ShaderStages::FRAGMENT;
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Present Layout"),
                entries: &[uniform_buffer(0, fragment), storage_buffer(1, fragment, true)],
            });
        let pipeline = create_screen_space_pipeline(
            device,
            "Present",
            &module,
            format,
            &[&bind_group_layout],
        );
        Ok(Self {
            pipeline,
            bind_group_layout,
            bind_group: None,
        })
    }

    /// Point the pass at a new uniform and output buffer pair.
    pub fn rebind(
        &mut self,
        device: &wgpu::Device,
        uniform: &wgpu::Buffer,
        output: &wgpu::Buffer,
    ) {
        self.bind_group = Some(buffer_bind_group(
            device,
            "Present Bind Group",
            &self.bind_group_layout,
            &[(0, uniform), (1, output)],
        ));
    }

    /// Draw the output buffer into `target`. Does nothing before the first
    /// [`rebind`](Self::rebind).
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let Some(bind_group) = &self.bind_group else {
            return;
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Present Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
