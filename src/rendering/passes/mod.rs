pub mod background_pass;
pub mod fxaa_pass;
pub mod output_pass;
pub mod scene_pass;
pub mod shadow_pass;

/// Half-float format for the offscreen stages of the post chain.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
