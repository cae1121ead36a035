use std::path::Path;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use log::{error, info, warn};

use crate::{config::AssetsConfig, error::SceneError};

pub const BAKED: &str = "baked";
pub const PORTAL_LIGHT: &str = "portalLight";
pub const POLE_LIGHT_A: &str = "poleLightA";
pub const POLE_LIGHT_B: &str = "poleLightB";

#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Triangle list in scene space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Tightly packed RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct PortalMeshes {
    pub baked: MeshData,
    pub portal_light: MeshData,
    pub pole_light_a: MeshData,
    pub pole_light_b: MeshData,
}

#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub meshes: PortalMeshes,
    pub baked_texture: TextureData,
}

/// Loads the scene file and the baked texture concurrently; both must succeed.
pub async fn load(config: &AssetsConfig) -> Result<SceneAssets> {
    let scene_path = config.scene.clone();
    let texture_path = config.baked_texture.clone();

    let scene = tokio::task::spawn_blocking(move || load_scene(&scene_path));
    let texture = tokio::task::spawn_blocking(move || load_texture(&texture_path));

    let (meshes, baked_texture) = tokio::try_join!(
        async { scene.await.context("Scene loading task failed")? },
        async { texture.await.context("Texture loading task failed")? },
    )?;

    Ok(SceneAssets {
        meshes,
        baked_texture,
    })
}

fn load_scene(path: &Path) -> Result<PortalMeshes> {
    let (document, buffers, _) = gltf::import(path)
        .with_context(|| format!("Failed to load scene file {}", path.display()))?;
    let meshes = extract_meshes(&document, &buffers)?;
    info!(
        "Loaded {} ({} baked triangles)",
        path.display(),
        meshes.baked.indices.len() / 3
    );
    Ok(meshes)
}

fn load_texture(path: &Path) -> Result<TextureData> {
    let image = image::open(path)
        .with_context(|| format!("Failed to load texture {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    info!("Loaded {} ({}x{})", path.display(), width, height);

    // glTF UVs already have their origin at the top-left, so rows stay as decoded.
    Ok(TextureData {
        width,
        height,
        pixels: image.into_raw(),
    })
}

/// The four named top-level objects the scene is assembled from.
pub struct PortalNodes<'a> {
    pub baked: gltf::Node<'a>,
    pub portal_light: gltf::Node<'a>,
    pub pole_light_a: gltf::Node<'a>,
    pub pole_light_b: gltf::Node<'a>,
}

impl<'a> PortalNodes<'a> {
    pub fn locate(document: &'a gltf::Document) -> Result<Self, SceneError> {
        Ok(Self {
            baked: find_child(document, BAKED)?,
            portal_light: find_child(document, PORTAL_LIGHT)?,
            pole_light_a: find_child(document, POLE_LIGHT_A)?,
            pole_light_b: find_child(document, POLE_LIGHT_B)?,
        })
    }
}

fn find_child<'a>(document: &'a gltf::Document, name: &str) -> Result<gltf::Node<'a>, SceneError> {
    document
        .default_scene()
        .or_else(|| document.scenes().next())
        .into_iter()
        .flat_map(|scene| scene.nodes())
        .find(|node| node.name() == Some(name))
        .ok_or_else(|| {
            error!("Scene has no child named {:?}", name);
            SceneError::MissingAsset(name.to_owned())
        })
}

pub fn extract_meshes(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<PortalMeshes, SceneError> {
    let nodes = PortalNodes::locate(document)?;
    Ok(PortalMeshes {
        baked: extract_mesh(&nodes.baked, BAKED, buffers)?,
        portal_light: extract_mesh(&nodes.portal_light, PORTAL_LIGHT, buffers)?,
        pole_light_a: extract_mesh(&nodes.pole_light_a, POLE_LIGHT_A, buffers)?,
        pole_light_b: extract_mesh(&nodes.pole_light_b, POLE_LIGHT_B, buffers)?,
    })
}

fn extract_mesh(
    node: &gltf::Node,
    name: &str,
    buffers: &[gltf::buffer::Data],
) -> Result<MeshData, SceneError> {
    let mut mesh = MeshData::default();
    append_node(node, Mat4::IDENTITY, buffers, &mut mesh);
    if mesh.indices.is_empty() {
        error!("Scene child {:?} has no triangle geometry", name);
        return Err(SceneError::MissingAsset(name.to_owned()));
    }
    Ok(mesh)
}

fn append_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut MeshData,
) {
    let transform = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                warn!(
                    "Skipping {:?} primitive in mesh {:?}",
                    primitive.mode(),
                    mesh.name()
                );
                continue;
            }

            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));
            let positions: Vec<[f32; 3]> = match reader.read_positions() {
                Some(positions) => positions.collect(),
                None => continue,
            };
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|uvs| uvs.into_f32().collect())
                .unwrap_or_default();

            let base = out.vertices.len() as u32;
            out.vertices
                .extend(positions.iter().enumerate().map(|(i, &p)| MeshVertex {
                    position: transform.transform_point3(Vec3::from(p)).to_array(),
                    uv: uvs.get(i).copied().unwrap_or_default(),
                }));

            match reader.read_indices() {
                Some(indices) => out
                    .indices
                    .extend(indices.into_u32().map(|index| base + index)),
                None => out
                    .indices
                    .extend((0..positions.len() as u32).map(|index| base + index)),
            }
        }
    }

    for child in node.children() {
        append_node(&child, transform, buffers, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: &str) -> gltf::Document {
        gltf::Gltf::from_slice(json.as_bytes()).unwrap().document
    }

    const ALL_NAMED: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0, 1, 2, 3] }],
        "nodes": [
            { "name": "baked" },
            { "name": "portalLight" },
            { "name": "poleLightA" },
            { "name": "poleLightB" }
        ]
    }"#;

    #[test]
    fn locates_all_named_children() {
        let document = document(ALL_NAMED);
        let nodes = PortalNodes::locate(&document).unwrap();
        assert_eq!(nodes.baked.name(), Some(BAKED));
        assert_eq!(nodes.portal_light.name(), Some(PORTAL_LIGHT));
        assert_eq!(nodes.pole_light_a.name(), Some(POLE_LIGHT_A));
        assert_eq!(nodes.pole_light_b.name(), Some(POLE_LIGHT_B));
    }

    #[test]
    fn missing_child_is_reported_by_name() {
        let document = document(
            r#"{
                "asset": { "version": "2.0" },
                "scene": 0,
                "scenes": [{ "nodes": [0, 1, 2] }],
                "nodes": [
                    { "name": "baked" },
                    { "name": "portalLight" },
                    { "name": "poleLightA" }
                ]
            }"#,
        );
        assert_eq!(
            PortalNodes::locate(&document).err(),
            Some(SceneError::MissingAsset("poleLightB".to_owned()))
        );
    }

    #[test]
    fn nested_nodes_are_not_top_level_children() {
        let document = document(
            r#"{
                "asset": { "version": "2.0" },
                "scene": 0,
                "scenes": [{ "nodes": [0, 1, 2] }],
                "nodes": [
                    { "name": "baked", "children": [3] },
                    { "name": "portalLight" },
                    { "name": "poleLightA" },
                    { "name": "poleLightB" }
                ]
            }"#,
        );
        assert_eq!(
            PortalNodes::locate(&document).err(),
            Some(SceneError::MissingAsset("poleLightB".to_owned()))
        );
    }

    #[test]
    fn named_child_without_geometry_is_missing() {
        let document = document(ALL_NAMED);
        assert_eq!(
            extract_meshes(&document, &[]).err(),
            Some(SceneError::MissingAsset("baked".to_owned()))
        );
    }

    /// Packs a JSON chunk and a binary chunk into a GLB container.
    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }

    #[test]
    fn extracts_geometry_in_scene_space() {
        let triangle: [f32; 9] = [0., 0., 0., 1., 0., 0., 0., 1., 0.];
        let bytes = glb(
            r#"{
                "asset": { "version": "2.0" },
                "scene": 0,
                "scenes": [{ "nodes": [0, 1, 2, 3] }],
                "nodes": [
                    { "name": "baked", "mesh": 0, "translation": [1, 0, 0] },
                    { "name": "portalLight", "mesh": 0 },
                    { "name": "poleLightA", "mesh": 0 },
                    { "name": "poleLightB", "translation": [0, 0, 5], "children": [4] },
                    { "name": "bulb", "mesh": 0, "translation": [0, 2, 0] }
                ],
                "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }],
                "accessors": [{
                    "bufferView": 0,
                    "componentType": 5126,
                    "count": 3,
                    "type": "VEC3",
                    "min": [0, 0, 0],
                    "max": [1, 1, 0]
                }],
                "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
                "buffers": [{ "byteLength": 36 }]
            }"#,
            bytemuck::cast_slice(&triangle),
        );
        let gltf = gltf::Gltf::from_slice(&bytes).unwrap();
        let buffers = vec![gltf::buffer::Data(gltf.blob.clone().unwrap())];

        let meshes = extract_meshes(&gltf.document, &buffers).unwrap();

        assert_eq!(meshes.baked.indices, [0, 1, 2]);
        assert_eq!(meshes.baked.vertices[0].position, [1., 0., 0.]);
        assert_eq!(meshes.baked.vertices[1].position, [2., 0., 0.]);
        assert_eq!(meshes.baked.vertices[2].uv, [0., 0.]);
        assert_eq!(meshes.portal_light.vertices[2].position, [0., 1., 0.]);
        // Child transforms compose with their parent's.
        assert_eq!(meshes.pole_light_b.vertices[0].position, [0., 2., 5.]);
        assert_eq!(meshes.pole_light_b.indices.len(), 3);
    }
}
