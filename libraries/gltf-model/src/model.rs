use std::{fs::File, io::BufReader, mem::offset_of, path::Path};

use anyhow::{bail, Context};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use gltf::{buffer, mesh::util::ReadTexCoords, Gltf};
use log::debug;

use crate::animation::{clips_from_gltf, AnimationClip};

/// CPU-side contents of one loaded glTF asset: the node tree, the triangle
/// data of every mesh primitive and the embedded animation clips.
///
/// Loading is deliberately split from GPU upload so that it can run on a
/// background thread without a device handle; see
/// [`crate::GltfModelRenderer::upload`].
pub struct Document {
    pub nodes: Vec<Node>,
    pub meshes: Vec<MeshData>,
    pub clips: Vec<AnimationClip>,
}

/// One node of the scene fragment. Animation clips write into the
/// translation/rotation/scale fields; world matrices are derived on demand.
#[derive(Clone)]
pub struct Node {
    pub parent: Option<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Node {
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Triangle data of one mesh primitive, attached to its owning node.
pub struct MeshData {
    pub node: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Default)]
pub struct Vertex {
    // Geometric properties
    pub position: Vec4,
    // ---- 16 byte alignment
    pub normal: Vec4,
    // Material properties
    // ---- 16 byte alignment
    pub base_color_factor: Vec4,
    // ---- 16 byte alignment
    pub base_color_texture_coordinates: Vec2,
    pub _padding: Vec2,
}

impl Vertex {
    pub(crate) fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
                    shader_location: 0,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
                    shader_location: 1,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: offset_of!(Vertex, base_color_factor) as wgpu::BufferAddress,
                    shader_location: 2,
                },
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: offset_of!(Vertex, base_color_texture_coordinates)
                        as wgpu::BufferAddress,
                    shader_location: 3,
                },
            ],
        }
    }
}

impl Document {
    /// World matrix of every node, parents resolved before children.
    #[must_use]
    pub fn global_transforms(&self) -> Vec<Mat4> {
        fn resolve(nodes: &[Node], cache: &mut [Option<Mat4>], index: usize) -> Mat4 {
            if let Some(matrix) = cache[index] {
                return matrix;
            }
            let local = nodes[index].local_matrix();
            let global = match nodes[index].parent {
                Some(parent) => resolve(nodes, cache, parent) * local,
                None => local,
            };
            cache[index] = Some(global);
            global
        }

        let mut cache = vec![None; self.nodes.len()];
        (0..self.nodes.len())
            .map(|index| resolve(&self.nodes, &mut cache, index))
            .collect()
    }
}

/// Parses a `.gltf`/`.glb` file into a [`Document`].
///
/// # Errors
///
/// Fails when the file or one of its sibling buffer files cannot be read or
/// is not valid glTF.
pub fn load_document(model_path: &Path) -> anyhow::Result<Document> {
    let file = File::open(model_path)
        .with_context(|| format!("opening model file {}", model_path.display()))?;
    let gltf = Gltf::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing model file {}", model_path.display()))?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            buffer::Source::Bin => {
                let Some(blob) = gltf.blob.as_deref() else {
                    bail!("model file references a binary chunk but carries none");
                };
                buffer_data.push(blob.to_vec());
            }
            buffer::Source::Uri(uri) => {
                let path = model_path.with_file_name(uri);
                let bin = std::fs::read(&path)
                    .with_context(|| format!("reading model buffer {}", path.display()))?;
                buffer_data.push(bin);
            }
        }
    }

    let mut nodes = gltf
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            Node {
                parent: None,
                translation: Vec3::from(translation),
                rotation: Quat::from_array(rotation),
                scale: Vec3::from(scale),
            }
        })
        .collect::<Vec<_>>();

    for node in gltf.nodes() {
        for child in node.children() {
            nodes[child.index()].parent = Some(node.index());
        }
    }

    let mut meshes = Vec::new();
    for node in gltf.nodes() {
        let Some(mesh) = node.mesh() else {
            continue;
        };

        for primitive in mesh.primitives() {
            let base_color_factor =
                Vec4::from(primitive.material().pbr_metallic_roughness().base_color_factor());

            let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

            let mut positions = reader.read_positions();
            let mut normals = reader.read_normals();
            let mut tex_coords = reader.read_tex_coords(0).map(ReadTexCoords::into_f32);

            let vertex_count = [
                positions.as_ref().map(ExactSizeIterator::len),
                normals.as_ref().map(ExactSizeIterator::len),
                tex_coords.as_ref().map(ExactSizeIterator::len),
            ]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or_default();

            let vertices = (0..vertex_count)
                .map(|_| {
                    let position = positions
                        .as_mut()
                        .and_then(Iterator::next)
                        .unwrap_or_default();
                    let normal = normals
                        .as_mut()
                        .and_then(Iterator::next)
                        .unwrap_or_default();
                    let tex_coord = tex_coords
                        .as_mut()
                        .and_then(Iterator::next)
                        .unwrap_or_default();

                    Vertex {
                        position: (Vec3::from(position), 1.0).into(),
                        normal: (Vec3::from(normal), 0.0).into(),
                        base_color_factor,
                        base_color_texture_coordinates: tex_coord.into(),
                        _padding: Vec2::default(),
                    }
                })
                .collect::<Vec<_>>();

            let indices = match reader.read_indices() {
                Some(indices_raw) => indices_raw.into_u32().collect::<Vec<u32>>(),
                // non-indexed geometry: draw the vertices in order
                None => (0..u32::try_from(vertex_count)?).collect(),
            };

            meshes.push(MeshData {
                node: node.index(),
                vertices,
                indices,
            });
        }
    }

    let clips = clips_from_gltf(&gltf, &buffer_data);

    debug!(
        "loaded {}: {} nodes, {} mesh primitives, {} animation clips",
        model_path.display(),
        nodes.len(),
        meshes.len(),
        clips.len()
    );

    Ok(Document {
        nodes,
        meshes,
        clips,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_node(parent: Option<usize>, translation: Vec3) -> Node {
        Node {
            parent,
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    #[test]
    fn global_transforms_chain_parents() {
        let document = Document {
            nodes: vec![
                plain_node(None, Vec3::new(1.0, 0.0, 0.0)),
                plain_node(Some(0), Vec3::new(0.0, 2.0, 0.0)),
            ],
            meshes: Vec::new(),
            clips: Vec::new(),
        };

        let globals = document.global_transforms();
        let child_origin = globals[1].transform_point3(Vec3::ZERO);
        assert!((child_origin - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn global_transforms_resolve_children_listed_before_parents() {
        let document = Document {
            nodes: vec![
                plain_node(Some(1), Vec3::new(0.0, 0.0, 3.0)),
                plain_node(None, Vec3::new(5.0, 0.0, 0.0)),
            ],
            meshes: Vec::new(),
            clips: Vec::new(),
        };

        let globals = document.global_transforms();
        let child_origin = globals[0].transform_point3(Vec3::ZERO);
        assert!((child_origin - Vec3::new(5.0, 0.0, 3.0)).length() < 1e-6);
    }

    #[test]
    fn missing_model_file_is_an_error() {
        let result = load_document(Path::new("does/not/exist.gltf"));
        assert!(result.is_err());
    }
}
