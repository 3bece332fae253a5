//! wgpu resources for the cloud pass: surface, program, noise texture,
//! uniform buffer and the fullscreen triangle.

use crate::error::{InitError, RenderError};
use crate::lifecycle::RenderBackend;
use crate::noise::NoiseImage;
use crate::uniforms::CloudUniforms;
use crate::viewport::Viewport;
use crate::CLOUDS_WGSL;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Raised by the device-lost callback and checked before each draw, so a
/// lost device is reported as [`RenderError::Lost`] instead of being drawn to.
#[derive(Clone, Debug, Default)]
pub struct DeviceLoss(Arc<AtomicBool>);

impl DeviceLoss {
    pub fn observe(&self, reason: wgpu::DeviceLostReason, message: &str) {
        // our own dispose() destroys the device
        if reason == wgpu::DeviceLostReason::Destroyed {
            return;
        }
        log::warn!("graphics device lost ({reason:?}): {message}");
        self.0.store(true, Ordering::Release);
    }

    pub fn is_lost(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

struct NoiseTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

pub struct GpuState<'a> {
    surface: wgpu::Surface<'a>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    noise: NoiseTexture,
    noise_sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    supports_alpha: bool,
    backend: wgpu::Backend,
    loss: DeviceLoss,
    disposed: bool,
}

impl<'a> GpuState<'a> {
    /// Build every resource for `surface`. The program is validated inside an
    /// error scope so a bad shader surfaces as [`InitError::ShaderCompile`]
    /// instead of a device panic.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: wgpu::Surface<'a>,
        viewport: Viewport,
        transparent: bool,
    ) -> Result<Self, InitError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| InitError::Unsupported("no compatible graphics adapter".into()))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    // downlevel limits keep WebGL2 adapters eligible
                    required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: Some("cloud_device"),
                },
                None,
            )
            .await
            .map_err(|e| InitError::Unsupported(format!("request_device: {e}")))?;
        device.on_uncaptured_error(Box::new(|e| {
            log::error!("wgpu error: {e}");
        }));
        let loss = DeviceLoss::default();
        let watcher = loss.clone();
        device.set_device_lost_callback(move |reason, message| watcher.observe(reason, &message));
        let backend = adapter.get_info().backend;

        let caps = surface.get_capabilities(&adapter);
        if caps.formats.is_empty() {
            return Err(InitError::Unsupported("surface reports no formats".into()));
        }
        // shader output is already display-ready; avoid a second sRGB encode
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let premultiplied = caps
            .alpha_modes
            .contains(&wgpu::CompositeAlphaMode::PreMultiplied);
        let supports_alpha = transparent && premultiplied;
        let alpha_mode = if supports_alpha {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            caps.alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };
        let max_dim = device.limits().max_texture_dimension_2d;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: viewport.width.clamp(1, max_dim),
            height: viewport.height.clamp(1, max_dim),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("clouds_shader"),
            source: wgpu::ShaderSource::Wgsl(CLOUDS_WGSL.into()),
        });
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("clouds_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    // uniforms
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<CloudUniforms>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    // noise
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    // sampler
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("clouds_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("clouds_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_fullscreen"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_clouds"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            cache: None,
            multiview: None,
        });
        if let Some(err) = device.pop_error_scope().await {
            return Err(InitError::ShaderCompile(err.to_string()));
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("clouds_uniforms"),
            size: std::mem::size_of::<CloudUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let noise_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("noise_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        // fallback until the asset arrives
        let noise = create_noise_texture(&device, &queue, &NoiseImage::fallback());
        let bind_group = create_bind_group(
            &device,
            &bind_group_layout,
            &uniform_buffer,
            &noise.view,
            &noise_sampler,
        );

        log::info!(
            "cloud renderer ready: {:?} {}x{} alpha={:?}",
            format,
            config.width,
            config.height,
            alpha_mode
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            noise,
            noise_sampler,
            bind_group,
            supports_alpha,
            backend,
            loss,
            disposed: false,
        })
    }

    /// Whether a lost device has to be rebuilt by the front-end; WebGL
    /// contexts announce their own restore instead.
    pub fn rebuilds_on_loss(&self) -> bool {
        self.backend != wgpu::Backend::Gl
    }
}

impl RenderBackend for GpuState<'_> {
    fn resize(&mut self, viewport: Viewport) {
        if self.disposed || viewport.is_empty() {
            return;
        }
        let max_dim = self.device.limits().max_texture_dimension_2d;
        let width = viewport.width.min(max_dim);
        let height = viewport.height.min(max_dim);
        if width == self.config.width && height == self.config.height {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
    }

    fn upload_noise(&mut self, image: &NoiseImage) {
        if self.disposed {
            return;
        }
        let noise = create_noise_texture(&self.device, &self.queue, image);
        self.bind_group = create_bind_group(
            &self.device,
            &self.bind_group_layout,
            &self.uniform_buffer,
            &noise.view,
            &self.noise_sampler,
        );
        let old = std::mem::replace(&mut self.noise, noise);
        old.texture.destroy();
        log::debug!("noise texture swapped: {}x{}", image.width(), image.height());
    }

    fn set_uniforms(&mut self, uniforms: &CloudUniforms) {
        if self.disposed {
            return;
        }
        self.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    fn draw(&mut self) -> Result<(), RenderError> {
        if self.disposed {
            return Ok(());
        }
        if self.loss.is_lost() {
            return Err(RenderError::Lost);
        }
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // swapchain only; the device is still good
                self.surface.configure(&self.device, &self.config);
                return Err(RenderError::Outdated);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(RenderError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(RenderError::OutOfMemory),
            Err(other) => return Err(RenderError::Other(other.to_string())),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clouds_encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("clouds_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.draw(0..3, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn supports_alpha(&self) -> bool {
        self.supports_alpha
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.noise.texture.destroy();
        self.uniform_buffer.destroy();
        self.device.destroy();
        log::debug!("cloud renderer resources released");
    }
}

fn create_noise_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &NoiseImage,
) -> NoiseTexture {
    let size = wgpu::Extent3d {
        width: image.width(),
        height: image.height(),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("noise_tex"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        // noise data, not color: no sRGB decode
        format: wgpu::TextureFormat::Rgba8Unorm,
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
        image.as_rgba8(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width()),
            rows_per_image: Some(image.height()),
        },
        size,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    NoiseTexture { texture, view }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniforms: &wgpu::Buffer,
    noise_view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("clouds_bg"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(noise_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
