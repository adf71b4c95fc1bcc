use std::sync::Arc;
use winit::window::Window;

#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("failed to open device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface is not supported by the adapter")]
    UnsupportedSurface,
    #[error("out of device memory while allocating `{label}`: {message}")]
    Allocation { label: String, message: String },
    #[error("refusing to upload empty mesh `{0}`")]
    EmptyMesh(String),
}

pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,
    pub sample_count: u32,
    pub msaa_texture: Option<wgpu::TextureView>,
    pub depth_texture: wgpu::TextureView,
}

impl GpuContext {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub async fn new(window: Arc<Window>, sample_count: u32) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }).await.ok_or(GpuError::NoAdapter)?;
        log::info!("using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter.request_device(&wgpu::DeviceDescriptor::default(), None).await?;
        let mut config = surface
            .get_default_config(&adapter, size.width.max(1), size.height.max(1))
            .ok_or(GpuError::UnsupportedSurface)?;

        let caps = surface.get_capabilities(&adapter);
        if caps.present_modes.contains(&wgpu::PresentMode::Mailbox) {
            config.present_mode = wgpu::PresentMode::Mailbox;
        } else {
            config.present_mode = wgpu::PresentMode::Fifo;
        }
        surface.configure(&device, &config);

        let msaa_texture = Self::create_msaa(&device, &config, sample_count);
        let depth_texture = Self::create_depth(&device, &config, sample_count);

        Ok(Self { surface, device, queue, config, size, sample_count, msaa_texture, depth_texture })
    }

    fn create_depth(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, sample_count: u32) -> wgpu::TextureView {
        let desc = wgpu::TextureDescriptor {
            label: Some("Depth"), size: wgpu::Extent3d { width: config.width, height: config.height, depth_or_array_layers: 1 },
            mip_level_count: 1, sample_count, dimension: wgpu::TextureDimension::D2, format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT, view_formats: &[],
        };
        device.create_texture(&desc).create_view(&wgpu::TextureViewDescriptor::default())
    }

    fn create_msaa(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, sample_count: u32) -> Option<wgpu::TextureView> {
        if sample_count <= 1 {
            return None;
        }
        let desc = wgpu::TextureDescriptor {
            label: Some("MSAA"), size: wgpu::Extent3d { width: config.width, height: config.height, depth_or_array_layers: 1 },
            mip_level_count: 1, sample_count, dimension: wgpu::TextureDimension::D2, format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT, view_formats: &[],
        };
        Some(device.create_texture(&desc).create_view(&wgpu::TextureViewDescriptor::default()))
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.msaa_texture = Self::create_msaa(&self.device, &self.config, self.sample_count);
            self.depth_texture = Self::create_depth(&self.device, &self.config, self.sample_count);
        }
    }
}
