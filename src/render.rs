use crate::config::SceneConfig;
use crate::core::scene::{Particle, SceneCore};
use fnv::FnvHashMap;
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

// ===================== WebGPU state =====================

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    // rgb = color, a = intensity
    ambient: [f32; 4],
    light_color: [f32; 4],
    light_pos: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ObjectData {
    model: [[f32; 4]; 4],
    color: [f32; 4],
    // x = metalness, y = roughness
    material: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

/// GPU residency for one box part: geometry plus its per-object uniform.
struct MeshGpu {
    vertex_buf: wgpu::Buffer,
    index_buf: wgpu::Buffer,
    index_count: u32,
    uniform_buf: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// GPU residency for one particle, keyed by the particle id. The release
/// descriptor is decided here at creation; pruning never has to inspect the
/// renderable again.
struct ParticleGpu {
    vertex_buf: wgpu::Buffer,
    vertex_count: u32,
    uniform_buf: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct GpuState {
    cfg: &'static SceneConfig,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    mesh_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    globals_buf: wgpu::Buffer,
    globals_bg: wgpu::BindGroup,
    object_bgl: wgpu::BindGroupLayout,

    depth_tex: wgpu::Texture,
    depth_view: wgpu::TextureView,

    body: MeshGpu,
    lid: MeshGpu,
    particles: FnvHashMap<u64, ParticleGpu>,

    width: u32,
    height: u32,
    clear_color: wgpu::Color,
}

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

impl GpuState {
    pub async fn new(
        canvas: web_sys::HtmlCanvasElement,
        cfg: &'static SceneConfig,
    ) -> anyhow::Result<Self> {
        let width = canvas.width();
        let height = canvas.height();

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    // Default limits avoid passing unknown fields to older WebGPU impls
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .unwrap_or(caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let (depth_tex, depth_view) = create_depth(&device, width, height);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(crate::core::SCENE_WGSL.into()),
        });

        let globals_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let object_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pl"),
            bind_group_layouts: &[&globals_bgl, &object_bgl],
            push_constant_ranges: &[],
        });

        let depth_state = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };

        let mesh_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_mesh"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x3,
                            offset: 12,
                            shader_location: 1,
                        },
                    ],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            // The original renders the box double-sided
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: Some(depth_state.clone()),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_mesh"),
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
        let line_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("line_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_line"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    }],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: Some(depth_state),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_line"),
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

        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bg"),
            layout: &globals_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let b = &cfg.box_mesh;
        let body = build_mesh(&device, &object_bgl, "body", b.body[0], b.body[1], b.body[2]);
        let lid = build_mesh(
            &device,
            &object_bgl,
            "lid",
            b.lid.width,
            b.lid.height,
            b.lid.depth,
        );

        Ok(Self {
            cfg,
            surface,
            device,
            queue,
            config,
            mesh_pipeline,
            line_pipeline,
            globals_buf,
            globals_bg,
            object_bgl,
            depth_tex,
            depth_view,
            body,
            lid,
            particles: FnvHashMap::default(),
            width,
            height,
            clear_color: wgpu::Color {
                r: 0.09,
                g: 0.09,
                b: 0.11,
                a: 1.0,
            },
        })
    }

    /// Upload GPU resources for particles that have no residency yet.
    pub fn sync_particles(&mut self, particles: &[Particle]) {
        for p in particles {
            if self.particles.contains_key(&p.id) || p.segments.is_empty() {
                continue;
            }
            let vertex_buf = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("particle_vb"),
                    contents: bytemuck::cast_slice(&p.segments),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let uniform_buf = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("particle_ub"),
                size: std::mem::size_of::<ObjectData>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("particle_bg"),
                layout: &self.object_bgl,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buf.as_entire_binding(),
                }],
            });
            self.particles.insert(
                p.id,
                ParticleGpu {
                    vertex_buf,
                    vertex_count: p.segments.len() as u32,
                    uniform_buf,
                    bind_group,
                },
            );
        }
    }

    /// Release the GPU buffers of a pruned particle.
    pub fn release_particle(&mut self, id: u64) {
        if let Some(g) = self.particles.remove(&id) {
            g.vertex_buf.destroy();
            g.uniform_buf.destroy();
        }
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_tex.destroy();
            let (tex, view) = create_depth(&self.device, width, height);
            self.depth_tex = tex;
            self.depth_view = view;
        }
    }

    pub fn render(&mut self, scene: &SceneCore) -> Result<(), wgpu::SurfaceError> {
        let lights = &self.cfg.lights;
        let eye = scene.camera.eye;
        let globals = Globals {
            view_proj: scene.camera.view_proj().to_cols_array_2d(),
            camera_pos: [eye.x, eye.y, eye.z, 1.0],
            ambient: splat(lights.ambient_color, lights.ambient_intensity),
            light_color: splat(lights.directional_color, lights.directional_intensity),
            light_pos: splat(lights.directional_position, 0.0),
        };
        self.queue
            .write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));

        let b = &self.cfg.box_mesh;
        self.write_object(
            &self.body.uniform_buf,
            scene.body_model_matrix(),
            b.body_color,
            b.metalness,
            b.roughness,
        );
        self.write_object(
            &self.lid.uniform_buf,
            scene.lid_model_matrix(),
            b.lid_color,
            b.metalness,
            b.roughness,
        );
        for p in scene.particles() {
            if let Some(g) = self.particles.get(&p.id) {
                self.write_object(&g.uniform_buf, p.model_matrix(), p.color, 0.0, 1.0);
            }
        }

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            rpass.set_bind_group(0, &self.globals_bg, &[]);

            rpass.set_pipeline(&self.mesh_pipeline);
            for part in [&self.body, &self.lid] {
                rpass.set_bind_group(1, &part.bind_group, &[]);
                rpass.set_vertex_buffer(0, part.vertex_buf.slice(..));
                rpass.set_index_buffer(part.index_buf.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..part.index_count, 0, 0..1);
            }

            rpass.set_pipeline(&self.line_pipeline);
            for p in scene.particles() {
                if let Some(g) = self.particles.get(&p.id) {
                    rpass.set_bind_group(1, &g.bind_group, &[]);
                    rpass.set_vertex_buffer(0, g.vertex_buf.slice(..));
                    rpass.draw(0..g.vertex_count, 0..1);
                }
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn write_object(
        &self,
        buf: &wgpu::Buffer,
        model: Mat4,
        color: [f32; 3],
        metalness: f32,
        roughness: f32,
    ) {
        let data = ObjectData {
            model: model.to_cols_array_2d(),
            color: splat(color, 1.0),
            material: [metalness, roughness, 0.0, 0.0],
        };
        self.queue.write_buffer(buf, 0, bytemuck::bytes_of(&data));
    }

    /// Teardown: eagerly free every GPU resource this state owns. Consumes
    /// the state so nothing can render afterwards.
    pub fn destroy(self) {
        for (_, g) in self.particles {
            g.vertex_buf.destroy();
            g.uniform_buf.destroy();
        }
        for part in [self.body, self.lid] {
            part.vertex_buf.destroy();
            part.index_buf.destroy();
            part.uniform_buf.destroy();
        }
        self.globals_buf.destroy();
        self.depth_tex.destroy();
    }
}

fn splat(rgb: [f32; 3], w: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], w]
}

fn create_depth(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
    (tex, view)
}

fn build_mesh(
    device: &wgpu::Device,
    object_bgl: &wgpu::BindGroupLayout,
    label: &str,
    w: f32,
    h: f32,
    d: f32,
) -> MeshGpu {
    let (vertices, indices) = cuboid_mesh(w, h, d);
    let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<ObjectData>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout: object_bgl,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buf.as_entire_binding(),
        }],
    });
    MeshGpu {
        vertex_buf,
        index_buf,
        index_count: indices.len() as u32,
        uniform_buf,
        bind_group,
    }
}

fn cuboid_mesh(w: f32, h: f32, d: f32) -> (Vec<MeshVertex>, Vec<u16>) {
    let (hx, hy, hz) = (w * 0.5, h * 0.5, d * 0.5);
    // (normal, four CCW corners)
    let faces: [([f32; 3], [Vec3; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [
                Vec3::new(-hx, -hy, hz),
                Vec3::new(hx, -hy, hz),
                Vec3::new(hx, hy, hz),
                Vec3::new(-hx, hy, hz),
            ],
        ),
        (
            [0.0, 0.0, -1.0],
            [
                Vec3::new(hx, -hy, -hz),
                Vec3::new(-hx, -hy, -hz),
                Vec3::new(-hx, hy, -hz),
                Vec3::new(hx, hy, -hz),
            ],
        ),
        (
            [1.0, 0.0, 0.0],
            [
                Vec3::new(hx, -hy, hz),
                Vec3::new(hx, -hy, -hz),
                Vec3::new(hx, hy, -hz),
                Vec3::new(hx, hy, hz),
            ],
        ),
        (
            [-1.0, 0.0, 0.0],
            [
                Vec3::new(-hx, -hy, -hz),
                Vec3::new(-hx, -hy, hz),
                Vec3::new(-hx, hy, hz),
                Vec3::new(-hx, hy, -hz),
            ],
        ),
        (
            [0.0, 1.0, 0.0],
            [
                Vec3::new(-hx, hy, hz),
                Vec3::new(hx, hy, hz),
                Vec3::new(hx, hy, -hz),
                Vec3::new(-hx, hy, -hz),
            ],
        ),
        (
            [0.0, -1.0, 0.0],
            [
                Vec3::new(-hx, -hy, -hz),
                Vec3::new(hx, -hy, -hz),
                Vec3::new(hx, -hy, hz),
                Vec3::new(-hx, -hy, hz),
            ],
        ),
    ];
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u16;
        for c in corners {
            vertices.push(MeshVertex {
                position: c.to_array(),
                normal,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}
