mod floor;

use std::{
    f32::consts::PI,
    path::PathBuf,
    sync::mpsc::Receiver,
};

use catwalk_framework::FrameworkEvent;
use glam::{Mat4, Quat, Vec3};
use lib_geometry::{AmbientLight, DirectionalLight, LightSet, Projection};
use lib_gltf_model::{Document, GltfModelRenderer, ModelInstance};
use log::info;

use crate::{
    assets::Slot,
    frame_loop::FrameLoop,
    renderer::floor::FloorRenderer,
    scene_state::MotionPolicy,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Sky color behind the scene, already converted to linear space.
const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.514,
    g: 0.631,
    b: 0.783,
    a: 1.0,
};

const FIELD_OF_VIEW_Y: f32 = 75.0 * PI / 180.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 1000.0;

/// Fixed poses of the decorative props, on top of the floor slab.
const TREE_TRANSFORM: (Vec3, f32, f32) = (Vec3::new(-6.0, 0.5, -7.0), 0.8, 0.0);
const GRASS_TRANSFORM: (Vec3, f32, f32) = (Vec3::new(4.0, 0.5, -3.0), 0.5, 1.2);
const TOY_TRANSFORM: (Vec3, f32, f32) = (Vec3::new(2.5, 0.5, 2.0), 0.02, -0.6);

fn prop_matrix((position, scale, heading): (Vec3, f32, f32)) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(scale),
        Quat::from_rotation_y(heading),
        position,
    )
}

pub struct RendererBuilder {
    policy: MotionPolicy,
    events: Receiver<FrameworkEvent>,
    asset_root: PathBuf,
}

impl RendererBuilder {
    #[must_use]
    pub fn new(policy: MotionPolicy, events: Receiver<FrameworkEvent>, asset_root: PathBuf) -> Self {
        Self {
            policy,
            events,
            asset_root,
        }
    }
}

impl catwalk_framework::RendererBuilder for RendererBuilder {
    type Renderer = Renderer;

    fn build(
        self,
        _adapter: &wgpu::Adapter,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface: &wgpu::SurfaceConfiguration,
    ) -> Renderer {
        let lights = LightSet {
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: 0.2,
            },
            directional: DirectionalLight {
                color: Vec3::ONE,
                intensity: 1.0,
                position: Vec3::new(-30.0, 50.0, 30.0),
                shadow_map_size: 2048,
            },
        };

        let view_format = surface
            .view_formats
            .first()
            .copied()
            .unwrap_or(surface.format);

        let shadow_map = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow map"),
            size: wgpu::Extent3d {
                width: lights.directional.shadow_map_size,
                height: lights.directional.shadow_map_size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let shadow_view = shadow_map.create_view(&wgpu::TextureViewDescriptor::default());
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow comparison sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let depth_stencil_state = wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };

        let models = GltfModelRenderer::new(
            device,
            view_format,
            depth_stencil_state.clone(),
            &shadow_view,
            &shadow_sampler,
        );
        let floor = FloorRenderer::new(
            device,
            queue,
            view_format,
            depth_stencil_state,
            &shadow_view,
            &shadow_sampler,
        );

        Renderer {
            frame_loop: FrameLoop::new(self.policy, self.events, &self.asset_root),
            projection: Projection::new_perspective(
                (surface.width, surface.height),
                FIELD_OF_VIEW_Y,
                Z_NEAR..Z_FAR,
            ),
            lights,
            depth_view: create_depth_view(device, surface),
            _shadow_map: shadow_map,
            shadow_view,
            models,
            floor,
            carpet_applied: false,
            actor: None,
            tree: None,
            grass: None,
            toy: None,
        }
    }
}

/// Owns the whole scene: the frame loop that mutates it and the GPU
/// resources that draw it. Each frame renders two passes, the models into
/// the shadow map and then floor plus models into the surface.
pub struct Renderer {
    frame_loop: FrameLoop,
    projection: Projection,
    lights: LightSet,
    depth_view: wgpu::TextureView,
    _shadow_map: wgpu::Texture,
    shadow_view: wgpu::TextureView,
    models: GltfModelRenderer,
    floor: FloorRenderer,
    carpet_applied: bool,
    actor: Option<ModelInstance>,
    tree: Option<ModelInstance>,
    grass: Option<ModelInstance>,
    toy: Option<ModelInstance>,
}

impl Renderer {
    /// Uploads whatever finished loading since the last frame. Uploads need
    /// the device, so they happen here rather than in the frame loop.
    fn sync_uploads(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        fn upload_once(
            instance: &mut Option<ModelInstance>,
            slot: &Slot<Document>,
            models: &GltfModelRenderer,
            device: &wgpu::Device,
            label: &str,
        ) {
            if instance.is_none() {
                if let Some(document) = slot.get() {
                    *instance = Some(models.upload(device, document, label));
                    info!("{label} uploaded to the GPU");
                }
            }
        }

        let assets = &self.frame_loop.assets;
        upload_once(&mut self.actor, &assets.actor, &self.models, device, "cat");
        upload_once(&mut self.tree, &assets.tree, &self.models, device, "tree");
        upload_once(&mut self.grass, &assets.grass, &self.models, device, "grass");
        upload_once(&mut self.toy, &assets.toy, &self.models, device, "toy");

        if !self.carpet_applied {
            if let Some(image) = assets.floor_texture.get() {
                self.floor.set_texture(device, queue, image);
                self.carpet_applied = true;
            }
        }
    }

    /// Pairs every uploaded model with its current world matrix.
    fn visible_models(&self) -> Vec<(&ModelInstance, &Document, Mat4)> {
        let assets = &self.frame_loop.assets;
        let statics = [
            (&self.tree, &assets.tree, prop_matrix(TREE_TRANSFORM)),
            (&self.grass, &assets.grass, prop_matrix(GRASS_TRANSFORM)),
            (&self.toy, &assets.toy, prop_matrix(TOY_TRANSFORM)),
            (
                &self.actor,
                &assets.actor,
                self.frame_loop.state.actor.model_matrix(),
            ),
        ];

        statics
            .into_iter()
            .filter_map(|(instance, slot, matrix)| {
                Some((instance.as_ref()?, slot.get()?, matrix))
            })
            .collect()
    }
}

impl catwalk_framework::Renderer for Renderer {
    fn update(&mut self) {
        self.frame_loop.tick();
    }

    fn resize(
        &mut self,
        device: &wgpu::Device,
        _queue: &wgpu::Queue,
        surface: &wgpu::SurfaceConfiguration,
    ) {
        self.projection
            .set_surface_dimensions((surface.width, surface.height));
        self.depth_view = create_depth_view(device, surface);
    }

    fn render(&mut self, texture_view: &wgpu::TextureView, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.sync_uploads(device, queue);

        let camera = self.frame_loop.orbit.camera();
        self.models
            .write_globals(queue, &camera, &self.projection, &self.lights);
        self.floor
            .write_globals(queue, &camera, &self.projection, &self.lights);

        let visible = self.visible_models();
        for (instance, document, matrix) in &visible {
            instance.write_world_matrices(queue, document, *matrix);
        }
        let instances: Vec<&ModelInstance> =
            visible.iter().map(|(instance, _, _)| *instance).collect();

        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.models.render_shadow(&mut shadow_pass, &instances);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(BACKGROUND),
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
            self.floor.render(&mut render_pass);
            self.models.render(&mut render_pass, &instances);
        }

        queue.submit(Some(encoder.finish()));
    }
}

fn create_depth_view(
    device: &wgpu::Device,
    surface: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width: surface.width.max(1),
            height: surface.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    depth_texture.create_view(&wgpu::TextureViewDescriptor::default())
}
