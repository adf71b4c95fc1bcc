use winit::event::*;
use wgpu::util::DeviceExt;
use glam::{DVec2, Mat4, Vec3};
use crate::{
    camera::*, config::ViewerConfig, controller::{Controller, FrameActions}, drawable::Drawable,
    gpu::GpuContext, input::KeyboardState, mesh::{self, LoadError, Mesh}, scene::{FrameClock, SceneState},
    shader, vertex::Vertex,
};

/// Loads the scene and player meshes in parallel.
///
/// Unless `strict_assets` is set, a failed load is logged and replaced by an
/// empty mesh, which is never uploaded or drawn.
pub fn load_meshes(cfg: &ViewerConfig) -> Result<(Mesh, Mesh), LoadError> {
    let load = |path: &std::path::Path| match mesh::load_mesh(path) {
        Ok(m) => Ok(m),
        Err(e) if !cfg.strict_assets => {
            log::error!("{e}");
            Ok(Mesh::empty())
        }
        Err(e) => Err(e),
    };
    let (scene, player) = rayon::join(|| load(&cfg.scene_mesh), || load(&cfg.player_mesh));
    Ok((scene?, player?))
}

pub struct ViewerState {
    // Declared before `ctx` so GPU buffers are released before the device.
    scene_drawable: Option<Drawable>,
    player_drawable: Option<Drawable>,
    render_pipeline: wgpu::RenderPipeline,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    pub scene: SceneState,
    controller: Controller,
    pub keyboard: KeyboardState,
    pointer: DVec2,
    pub mouse_captured: bool,
    projection: Projection,
    clock: FrameClock,
    config: ViewerConfig,
    pub ctx: GpuContext,
}

impl ViewerState {
    pub fn new(ctx: GpuContext, config: ViewerConfig, scene_mesh: &Mesh, player_mesh: &Mesh) -> anyhow::Result<Self> {
        let projection = Projection::new(&config, ctx.config.width, ctx.config.height);
        let mut scene = SceneState::new(&config);
        let view = scene.follow_player(Vec3::from(config.camera_offset));
        let camera_uniform = CameraUniform::new(view, projection.matrix());

        let camera_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"), contents: bytemuck::cast_slice(&[camera_uniform]), usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0, visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer { ty: wgpu::BufferBindingType::Uniform, has_dynamic_offset: false, min_binding_size: None }, count: None,
            }], label: Some("Camera Layout"),
        });

        let camera_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout, entries: &[wgpu::BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() }], label: None,
        });

        let model_layout = Drawable::model_layout(&ctx.device);
        let shader_module = shader::compile(&ctx.device, "Scene Shader", shader::SCENE_SHADER)?;

        let render_pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None, bind_group_layouts: &[&camera_bind_group_layout, &model_layout], push_constant_ranges: &[],
        });

        let render_pipeline = shader::link(&ctx.device, "Render Pipeline", || {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("Render Pipeline"), layout: Some(&render_pipeline_layout),
                vertex: wgpu::VertexState { module: &shader_module, entry_point: "vs_main", buffers: &[Vertex::layout()] },
                fragment: Some(wgpu::FragmentState {
                    module: &shader_module, entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState { format: ctx.config.format, blend: Some(wgpu::BlendState::REPLACE), write_mask: wgpu::ColorWrites::ALL })],
                }),
                // OBJ winding is not guaranteed, so nothing is culled.
                primitive: wgpu::PrimitiveState { topology: wgpu::PrimitiveTopology::TriangleList, cull_mode: None, ..Default::default() },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: GpuContext::DEPTH_FORMAT, depth_write_enabled: true, depth_compare: wgpu::CompareFunction::Less, stencil: wgpu::StencilState::default(), bias: wgpu::DepthBiasState::default()
                }),
                multisample: wgpu::MultisampleState { count: ctx.sample_count, mask: !0, alpha_to_coverage_enabled: false },
                multiview: None,
            })
        })?;

        let upload = |label: &str, mesh: &Mesh| -> anyhow::Result<Option<Drawable>> {
            if mesh.is_empty() {
                log::warn!("`{label}` has no geometry and will not be drawn");
                return Ok(None);
            }
            Ok(Some(Drawable::upload(&ctx.device, &model_layout, label, mesh)?))
        };
        let scene_drawable = upload("Scene", scene_mesh)?;
        let player_drawable = upload("Player", player_mesh)?;

        Ok(Self {
            scene_drawable, player_drawable,
            render_pipeline, camera_buffer, camera_bind_group,
            scene, controller: Controller::from_config(&config),
            keyboard: KeyboardState::new(), pointer: DVec2::ZERO, mouse_captured: false,
            projection, clock: FrameClock::new(), config, ctx,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.ctx.resize(new_size);
        self.projection.resize(self.ctx.config.width, self.ctx.config.height);
    }

    pub fn input(&mut self, event: &WindowEvent) -> bool {
        self.keyboard.process_events(event)
    }

    /// Capturing the pointer re-arms the first-event guard of the look channel.
    pub fn set_mouse_captured(&mut self, captured: bool) {
        if captured && !self.mouse_captured {
            self.scene.cursor.reset();
        }
        self.mouse_captured = captured;
    }

    /// Relative device motion accumulates into an unbounded virtual cursor.
    pub fn pointer_moved(&mut self, delta: (f64, f64)) {
        if self.mouse_captured {
            self.pointer += DVec2::new(delta.0, delta.1);
            self.controller.look(&mut self.scene, self.pointer.x, self.pointer.y);
        }
    }

    pub fn focus_lost(&mut self) {
        self.keyboard.clear();
        self.set_mouse_captured(false);
    }

    pub fn update(&mut self) -> FrameActions {
        let dt = self.clock.tick();
        let actions = self.controller.update(&mut self.scene, &self.keyboard, dt);

        let view = self.scene.follow_player(Vec3::from(self.config.camera_offset));
        let camera_uniform = CameraUniform::new(view, self.projection.matrix());
        self.ctx.queue.write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[camera_uniform]));

        if let Some(drawable) = &self.scene_drawable {
            drawable.set_transform(&self.ctx.queue, Mat4::IDENTITY);
        }
        if let Some(drawable) = &self.player_drawable {
            drawable.set_transform(&self.ctx.queue, self.scene.player_transform(self.config.player_yaw_correction_deg));
        }
        actions
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.ctx.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        let [r, g, b] = self.config.clear_color;

        {
            let (target, resolve_target) = match &self.ctx.msaa_texture {
                Some(msaa) => (msaa, Some(&view)),
                None => (&view, None),
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target, resolve_target,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }), store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture,
                    depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None, occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);

            for drawable in [&self.scene_drawable, &self.player_drawable].into_iter().flatten() {
                drawable.draw(&mut render_pass);
            }
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}
