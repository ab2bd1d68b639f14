use winit::dpi::PhysicalSize;

use crate::environment;
use crate::light::SHADOW_MAP_SIZE;

pub struct Texture {
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    pub fn from_wgpu_texture(
        texture: wgpu::Texture,
        device: &wgpu::Device,
        sampler: wgpu::SamplerDescriptor,
    ) -> Self {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&sampler);

        Self {
            _texture: texture,
            view,
            sampler,
        }
    }
}

fn linear_clamp_sampler() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    }
}

/// Uploads the decoded HDR environment image as an equirectangular
/// Rgba32Float texture. Wraps horizontally so reflections don't seam.
pub fn create_environment_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &image::Rgb32FImage,
) -> Texture {
    let size = wgpu::Extent3d {
        width: image.width(),
        height: image.height(),
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Environment Map"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let mut pixels = Vec::with_capacity((image.width() * image.height() * 4) as usize);
    for pixel in image.pixels() {
        pixels.extend_from_slice(&[pixel.0[0], pixel.0[1], pixel.0[2], 1.0]);
    }

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&pixels),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(image.width() * 16),
            rows_per_image: Some(image.height()),
        },
        size,
    );

    Texture::from_wgpu_texture(
        texture,
        device,
        wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat,
            ..linear_clamp_sampler()
        },
    )
}

/// Uploads the procedural backdrop gradient.
pub fn create_gradient_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> Texture {
    let pixels = environment::gradient_pixels(
        environment::GRADIENT_FROM,
        environment::GRADIENT_TO,
        environment::GRADIENT_SIZE,
    );

    let size = wgpu::Extent3d {
        width: environment::GRADIENT_SIZE,
        height: environment::GRADIENT_SIZE,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Backdrop Gradient"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(environment::GRADIENT_SIZE * 4),
            rows_per_image: Some(environment::GRADIENT_SIZE),
        },
        size,
    );

    Texture::from_wgpu_texture(texture, device, linear_clamp_sampler())
}

pub struct DepthTexture {
    texture: Texture,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>, label: impl Into<String>) -> Self {
        let label: String = label.into();
        let texture = Self::create_wgpu_texture(device, size, &label);

        DepthTexture {
            texture: Texture::from_wgpu_texture(texture, device, linear_clamp_sampler()),
            label,
        }
    }

    fn create_wgpu_texture(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        label: &str,
    ) -> wgpu::Texture {
        let size = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };

        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        self.texture = Texture::from_wgpu_texture(
            Self::create_wgpu_texture(device, size, &self.label),
            device,
            linear_clamp_sampler(),
        );
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.texture.view
    }
}

/// The sun's depth map plus the comparison sampler the scene shader filters
/// it with.
pub struct ShadowMap {
    depth: DepthTexture,
    pub comparison_sampler: wgpu::Sampler,
}

impl ShadowMap {
    pub fn new(device: &wgpu::Device) -> Self {
        let depth = DepthTexture::new(
            device,
            PhysicalSize::new(SHADOW_MAP_SIZE, SHADOW_MAP_SIZE),
            "Shadow Map",
        );

        let comparison_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        Self {
            depth,
            comparison_sampler,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        self.depth.view()
    }
}

/// Offscreen color target for the post-processing chain.
pub struct ColorTarget {
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    label: String,
}

impl ColorTarget {
    pub fn new(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        format: wgpu::TextureFormat,
        label: impl Into<String>,
    ) -> Self {
        let label: String = label.into();
        let view = Self::create_view(device, size, format, &label);

        Self {
            view,
            format,
            label,
        }
    }

    fn create_view(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        self.view = Self::create_view(device, size, self.format, &self.label);
    }
}
