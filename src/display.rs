use anyhow::{anyhow, Context as _};
use egui::{Color32, FullOutput};
use egui_wgpu_backend::{RenderPass as EguiRenderPass, ScreenDescriptor};
use egui_winit_platform::{Platform, PlatformDescriptor};
use wgpu::{
    include_wgsl, BindGroup, BindGroupLayout, CommandEncoder, Device, Queue, RenderPipeline,
    Sampler, Surface, Texture, TextureFormat, TextureUsages, TextureView,
};
use winit::{dpi::PhysicalSize, event::Event};

use gpu_scene_tracer::gpu::GpuContext;
use gpu_scene_tracer::Frame;

/// Window side of the program: copies finished frames to the screen and
/// draws the status overlay on top.
pub struct Display {
    surface: Surface<'static>,
    surface_config: wgpu::SurfaceConfiguration,
    blit: Blit,
    frame_texture: FrameTexture,
    platform: Platform,
    screen_descriptor: ScreenDescriptor,
    egui_rpass: EguiRenderPass,
}

impl Display {
    pub fn new(
        gpu: &GpuContext,
        surface: Surface<'static>,
        size: PhysicalSize<u32>,
        scale_factor: f64,
    ) -> anyhow::Result<Display> {
        let device = &gpu.device;
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));

        let capabilities = surface.get_capabilities(&gpu.adapter);
        // frames are already display-ready, so avoid a second sRGB encode
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| anyhow!("surface is not supported by the adapter"))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };

        surface.configure(device, &surface_config);

        let blit = Blit::new(device, format);
        let frame_texture = blit.frame_texture(device, size);

        let platform = Platform::new(PlatformDescriptor {
            physical_width: size.width,
            physical_height: size.height,
            scale_factor,
            font_definitions: Default::default(),
            style: Default::default(),
        });

        let screen_descriptor = ScreenDescriptor {
            physical_width: size.width,
            physical_height: size.height,
            scale_factor: scale_factor as f32,
        };

        let egui_rpass = EguiRenderPass::new(device, format, 1);

        Ok(Display {
            surface,
            surface_config,
            blit,
            frame_texture,
            platform,
            screen_descriptor,
            egui_rpass,
        })
    }

    /// Size the next frame has to be rendered at.
    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.surface_config.width, self.surface_config.height)
    }

    pub fn handle_event<T>(&mut self, event: &Event<T>) {
        self.platform.handle_event(event);
    }

    pub fn resize(&mut self, device: &Device, new_size: PhysicalSize<u32>) {
        let size = PhysicalSize::new(new_size.width.max(1), new_size.height.max(1));

        self.surface_config.width = size.width;
        self.surface_config.height = size.height;
        self.screen_descriptor.physical_width = size.width;
        self.screen_descriptor.physical_height = size.height;

        self.surface.configure(device, &self.surface_config);
        self.frame_texture = self.blit.frame_texture(device, size);
    }

    pub fn reconfigure(&mut self, device: &Device) {
        self.surface.configure(device, &self.surface_config);
    }

    /// Shows `frame` with the overlay lines on top.
    pub fn present(&mut self, gpu: &GpuContext, frame: &Frame, overlay: &[String]) -> anyhow::Result<()> {
        let device = &gpu.device;
        let queue = &gpu.queue;

        if !self.frame_texture.fits(frame) {
            self.frame_texture = self
                .blit
                .frame_texture(device, PhysicalSize::new(frame.width, frame.height));
        }

        self.frame_texture.upload(queue, frame);

        let surface_texture = match self.surface.get_current_texture() {
            Ok(surface_texture) => surface_texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost, reconfiguring");
                self.reconfigure(device);
                return Ok(());
            }
            Err(e) => return Err(e).context("cannot acquire the next window texture"),
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Blit Encoder"),
        });

        self.blit.draw(&mut encoder, &view, &self.frame_texture);

        let full_output = create_ui(&mut self.platform, overlay);

        let paint_jobs = self
            .platform
            .context()
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        self.egui_rpass
            .add_textures(device, queue, &full_output.textures_delta)
            .map_err(|e| anyhow!("cannot add overlay textures: {e:?}"))?;

        self.egui_rpass
            .update_buffers(device, queue, &paint_jobs, &self.screen_descriptor);

        self.egui_rpass
            .execute(&mut encoder, &view, &paint_jobs, &self.screen_descriptor, None)
            .map_err(|e| anyhow!("overlay render pass failed: {e:?}"))?;

        queue.submit(Some(encoder.finish()));
        surface_texture.present();

        self.egui_rpass
            .remove_textures(full_output.textures_delta)
            .map_err(|e| anyhow!("cannot remove overlay textures: {e:?}"))?;

        Ok(())
    }
}

// ######################### BLIT ########################################

/// Full-window quad that samples the frame texture.
struct Blit {
    layout: BindGroupLayout,
    sampler: Sampler,
    pipeline: RenderPipeline,
}

impl Blit {
    const TEXTURE_BINDING: u32 = 0;
    const SAMPLER_BINDING: u32 = 1;

    fn new(device: &Device, surface_format: TextureFormat) -> Blit {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Texture Layout"),
            entries: &[
                fragment_entry(
                    Self::TEXTURE_BINDING,
                    wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                ),
                fragment_entry(
                    Self::SAMPLER_BINDING,
                    wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                ),
            ],
        });

        // defaults clamp to edge with nearest filtering, one texel per pixel
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Frame Sampler"),
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Blit Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(include_wgsl!("../shaders/blit.wgsl"));

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Blit Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Blit {
            layout,
            sampler,
            pipeline,
        }
    }

    fn frame_texture(&self, device: &Device, size: PhysicalSize<u32>) -> FrameTexture {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Frame Texture"),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Texture Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: Self::TEXTURE_BINDING,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: Self::SAMPLER_BINDING,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        FrameTexture {
            texture,
            bind_group,
        }
    }

    fn draw(&self, encoder: &mut CommandEncoder, target: &TextureView, frame: &FrameTexture) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Blit Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
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
        pass.set_bind_group(0, &frame.bind_group, &[]);
        pass.draw(0..6, 0..1);
    }
}

fn fragment_entry(binding: u32, ty: wgpu::BindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty,
        count: None,
    }
}

/// GPU copy of the last frame, bound for the blit.
struct FrameTexture {
    texture: Texture,
    bind_group: BindGroup,
}

impl FrameTexture {
    fn fits(&self, frame: &Frame) -> bool {
        let size = self.texture.size();
        (size.width, size.height) == (frame.width, frame.height)
    }

    fn upload(&self, queue: &Queue, frame: &Frame) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &frame.pixels,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * frame.width),
                rows_per_image: Some(frame.height),
            },
            wgpu::Extent3d {
                width: frame.width,
                height: frame.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

// ######################### OVERLAY ########################################

fn create_ui(platform: &mut Platform, overlay: &[String]) -> FullOutput {
    platform.begin_frame();

    let egui_context = platform.context();

    let mut style = (*egui_context.style()).clone();
    style.visuals.override_text_color = Some(Color32::from_rgb(230, 230, 230));
    egui_context.set_style(style);

    let transparent_frame = egui::Frame::none()
        .fill(Color32::from_rgba_unmultiplied(0, 0, 0, 160))
        .inner_margin(6.0);

    egui::TopBottomPanel::top("status")
        .resizable(false)
        .show_separator_line(false)
        .frame(transparent_frame)
        .show(&egui_context, |ui| {
            for line in overlay {
                ui.label(line.as_str());
            }
        });

    egui_context.end_frame()
}
