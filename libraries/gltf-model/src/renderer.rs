use std::borrow::Cow;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use lib_geometry::{Camera, LightSet, Projection};
use wgpu::util::DeviceExt;

use crate::model::{Document, Vertex};

/// Uniforms shared by every model drawn in a frame.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct GlobalsUniform {
    camera: Mat4,
    projection: Mat4,
    light_view_proj: Mat4,
    light_direction: Vec4,
    ambient: Vec4,
    diffuse: Vec4,
}

/// Draws [`ModelInstance`]s: a lit, shadow-receiving main pass and a
/// depth-only pass that renders the same geometry into the shadow map.
pub struct GltfModelRenderer {
    pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    mesh_layout: wgpu::BindGroupLayout,
    globals_buf: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    shadow_globals_bind_group: wgpu::BindGroup,
}

/// GPU-resident copy of a [`Document`]'s meshes. The document stays with the
/// caller, which keeps animating the node tree; the instance only remembers
/// which node each mesh hangs off.
pub struct ModelInstance {
    meshes: Vec<GpuMesh>,
}

struct GpuMesh {
    vertex_buf: wgpu::Buffer,
    index_buf: wgpu::Buffer,
    index_count: u32,
    node: usize,
    world_buf: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GltfModelRenderer {
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        view_format: wgpu::TextureFormat,
        depth_stencil_state: wgpu::DepthStencilState,
        shadow_view: &wgpu::TextureView,
        shadow_sampler: &wgpu::Sampler,
    ) -> Self {
        let globals_binding = wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(size_of::<GlobalsUniform>() as u64),
            },
            count: None,
        };

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model globals bind group layout"),
            entries: &[
                globals_binding,
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        // the shadow pass renders *into* the shadow map, so its globals
        // group must not bind it
        let shadow_globals_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("model shadow globals bind group layout"),
                entries: &[globals_binding],
            });

        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("model mesh bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(64),
                },
                count: None,
            }],
        });

        let globals_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("model globals uniform buffer"),
            contents: &[0_u8; size_of::<GlobalsUniform>()],
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model globals bind group"),
            layout: &globals_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(shadow_sampler),
                },
            ],
        });

        let shadow_globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("model shadow globals bind group"),
            layout: &shadow_globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("model shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                "../shaders/model.wgsl"
            ))),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&globals_layout, &mesh_layout],
            push_constant_ranges: &[],
        });

        let shadow_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: None,
                bind_group_layouts: &[&shadow_globals_layout, &mesh_layout],
                push_constant_ranges: &[],
            });

        let vertex_buffers = [Vertex::buffer_layout()];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("model pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &vertex_buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(view_format.into())],
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(depth_stencil_state),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("model shadow pipeline"),
            layout: Some(&shadow_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_shadow",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &vertex_buffers,
            },
            // depth-only pass
            fragment: None,
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            shadow_pipeline,
            mesh_layout,
            globals_buf,
            globals_bind_group,
            shadow_globals_bind_group,
        }
    }

    pub fn write_globals(
        &self,
        queue: &wgpu::Queue,
        camera: &Camera,
        projection: &Projection,
        lights: &LightSet,
    ) {
        let globals = GlobalsUniform {
            camera: camera.matrix(),
            projection: projection.matrix(),
            light_view_proj: lights.directional.view_projection(),
            light_direction: (lights.directional.direction(), 0.0).into(),
            ambient: (lights.ambient.color * lights.ambient.intensity, 1.0).into(),
            diffuse: (lights.directional.color * lights.directional.intensity, 1.0).into(),
        };
        queue.write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));
    }

    /// Uploads a loaded document's meshes to the GPU.
    #[must_use]
    pub fn upload(&self, device: &wgpu::Device, document: &Document, label: &str) -> ModelInstance {
        let meshes = document
            .meshes
            .iter()
            .map(|mesh| {
                let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} vertex buffer")),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} index buffer")),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                let world_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{label} world matrix uniform buffer")),
                    contents: &[0_u8; size_of::<Mat4>()],
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{label} mesh bind group")),
                    layout: &self.mesh_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: world_buf.as_entire_binding(),
                    }],
                });

                GpuMesh {
                    vertex_buf,
                    index_buf,
                    index_count: u32::try_from(mesh.indices.len()).unwrap_or(u32::MAX),
                    node: mesh.node,
                    world_buf,
                    bind_group,
                }
            })
            .collect();

        ModelInstance { meshes }
    }

    pub fn render<'pipeline>(
        &'pipeline self,
        render_pass: &mut wgpu::RenderPass<'pipeline>,
        instances: &'pipeline [&'pipeline ModelInstance],
    ) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.globals_bind_group, &[]);
        for instance in instances {
            instance.draw(render_pass);
        }
    }

    pub fn render_shadow<'pipeline>(
        &'pipeline self,
        render_pass: &mut wgpu::RenderPass<'pipeline>,
        instances: &'pipeline [&'pipeline ModelInstance],
    ) {
        render_pass.set_pipeline(&self.shadow_pipeline);
        render_pass.set_bind_group(0, &self.shadow_globals_bind_group, &[]);
        for instance in instances {
            instance.draw(render_pass);
        }
    }
}

impl ModelInstance {
    /// Recomputes every node's world matrix under `model_matrix` and writes
    /// the per-mesh uniforms. Call after animating, before rendering.
    pub fn write_world_matrices(&self, queue: &wgpu::Queue, document: &Document, model_matrix: Mat4) {
        let globals = document.global_transforms();
        for mesh in &self.meshes {
            let world = model_matrix * globals[mesh.node];
            queue.write_buffer(&mesh.world_buf, 0, bytemuck::bytes_of(&world));
        }
    }

    fn draw<'pipeline>(&'pipeline self, render_pass: &mut wgpu::RenderPass<'pipeline>) {
        for mesh in &self.meshes {
            render_pass.set_bind_group(1, &mesh.bind_group, &[]);
            render_pass.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
            render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}
