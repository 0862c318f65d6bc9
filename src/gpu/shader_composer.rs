use std::borrow::Cow;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, ComposerError, NagaModuleDescriptor,
    ShaderLanguage, ShaderType,
};

use crate::error::StrokeError;

/// Wraps `naga_oil::compose::Composer` to provide shader composition with `#import` support.
///
/// Pre-loads the shared WGSL modules at construction time. Stage shaders use
/// `#import strokeraster::module::{items}` to pull in shared code. The
/// composer produces `naga::Module` IR directly, skipping a WGSL re-parse at
/// runtime.
pub struct ShaderComposer {
    composer: Composer,
}

/// A WGSL source and the path it is reported under.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource {
    /// WGSL text.
    pub source: &'static str,
    /// Path used in diagnostics.
    pub file_path: &'static str,
}

/// Shared modules, in dependency order.
const MODULES: &[ShaderSource] = &[
    ShaderSource {
        source: include_str!("../../assets/shaders/modules/uniforms.wgsl"),
        file_path: "modules/uniforms.wgsl",
    },
    ShaderSource {
        source: include_str!("../../assets/shaders/modules/matrix.wgsl"),
        file_path: "modules/matrix.wgsl",
    },
    ShaderSource {
        source: include_str!("../../assets/shaders/modules/instance.wgsl"),
        file_path: "modules/instance.wgsl",
    },
    ShaderSource {
        source: include_str!("../../assets/shaders/modules/shapes.wgsl"),
        file_path: "modules/shapes.wgsl",
    },
];

/// Clear stage.
pub const CLEAR_SHADER: ShaderSource = ShaderSource {
    source: include_str!("../../assets/shaders/compute/clear.wgsl"),
    file_path: "compute/clear.wgsl",
};

/// Bin stage.
pub const BIN_SHADER: ShaderSource = ShaderSource {
    source: include_str!("../../assets/shaders/compute/bin.wgsl"),
    file_path: "compute/bin.wgsl",
};

/// Rasterize stage.
pub const RASTERIZE_SHADER: ShaderSource = ShaderSource {
    source: include_str!("../../assets/shaders/compute/rasterize.wgsl"),
    file_path: "compute/rasterize.wgsl",
};

/// Output buffer → surface.
pub const PRESENT_SHADER: ShaderSource = ShaderSource {
    source: include_str!("../../assets/shaders/screen/present.wgsl"),
    file_path: "screen/present.wgsl",
};

fn composer_error(file_path: &str, e: &ComposerError) -> StrokeError {
    StrokeError::Shader(format!("{file_path}: {e}"))
}

impl ShaderComposer {
    /// Register every shared module.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Shader`] if a module fails to parse.
    pub fn new() -> Result<Self, StrokeError> {
        let mut composer = Composer::default();
        for m in MODULES {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| composer_error(m.file_path, &e))?;
        }
        Ok(Self { composer })
    }

    /// Compose a shader (which may contain `#import` directives) into a
    /// `wgpu::ShaderModule` ready for pipeline creation.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Shader`] if composition fails.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        shader: ShaderSource,
    ) -> Result<wgpu::ShaderModule, StrokeError> {
        let naga_module = self.compose_naga(shader)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose into a `naga::Module` without creating a wgpu shader module.
    /// Useful for testing shader composition without a GPU device.
    ///
    /// # Errors
    ///
    /// Returns [`StrokeError::Shader`] if composition fails.
    pub fn compose_naga(
        &mut self,
        shader: ShaderSource,
    ) -> Result<naga::Module, StrokeError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source: shader.source,
                file_path: shader.file_path,
                shader_type: ShaderType::Wgsl,
                ..Default::default()
            })
            .map_err(|e| composer_error(shader.file_path, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_shaders_compose_and_validate() {
        let mut composer = ShaderComposer::new().unwrap();
        for shader in [CLEAR_SHADER, BIN_SHADER, RASTERIZE_SHADER, PRESENT_SHADER] {
            let module = composer
                .compose_naga(shader)
                .unwrap_or_else(|e| panic!("{e}"));
            naga::valid::Validator::new(
                naga::valid::ValidationFlags::all(),
                naga::valid::Capabilities::default(),
            )
            .validate(&module)
            .unwrap_or_else(|e| {
                panic!("'{}' failed validation: {e:?}", shader.file_path)
            });
        }
    }

    #[test]
    fn compute_stages_export_main() {
        let mut composer = ShaderComposer::new().unwrap();
        for shader in [CLEAR_SHADER, BIN_SHADER, RASTERIZE_SHADER] {
            let module = composer.compose_naga(shader).unwrap();
            assert!(
                module
                    .entry_points
                    .iter()
                    .any(|ep| ep.name == "main"
                        && ep.stage == naga::ShaderStage::Compute),
                "{} has no compute main",
                shader.file_path
            );
        }
    }
}
