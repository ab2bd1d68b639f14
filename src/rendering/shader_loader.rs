use std::path::Path;

use anyhow::Context;
use wgpu::ShaderSource;

const SHADER_FOLDER: &str = "assets/shaders";

#[derive(Debug, Clone, Copy)]
pub struct ShaderDefinition {
    pub name: &'static str,
    pub path: &'static str,
}

/// Reads a WGSL file from the shader folder and compiles it. Shaders are
/// fixed for the lifetime of the process; a failed read is a startup error
/// like any other missing asset.
pub fn load_shader(
    device: &wgpu::Device,
    def: ShaderDefinition,
) -> anyhow::Result<wgpu::ShaderModule> {
    let path = Path::new(SHADER_FOLDER).join(def.path);
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read shader {}", path.display()))?;

    log::debug!("Compiling shader {} from {}", def.name, path.display());

    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(def.name),
        source: ShaderSource::Wgsl(source.into()),
    }))
}
