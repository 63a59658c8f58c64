//! glTF model loading
//!
//! Produces a detached [`SceneGraph`] whose root stands for the glTF scene.
//! Every glTF node becomes a group carrying its TRS transform; each mesh
//! primitive becomes a mesh child of that group. Metallic-roughness materials
//! map to standard materials, `KHR_materials_unlit` to basic ones.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::AssetError;
use crate::foundation::math::{Quat, Quaternion, Transform, Vec3};
use crate::render::material::{BasicMaterial, Material, StandardMaterial};
use crate::render::mesh::{Mesh, Vertex};
use crate::scene::{Node, NodeId, SceneGraph};

/// Load a `.gltf` or `.glb` file into a detached scene graph
pub fn load_gltf(path: &Path) -> Result<SceneGraph, AssetError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("gltf" | "glb") => {}
        _ => return Err(AssetError::UnsupportedFormat { path: path.to_path_buf() }),
    }

    // Buffers only, images are never decoded
    let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(|e| import_error(path, e))?;
    let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(|e| import_error(path, e))?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| AssetError::InvalidData {
            path: path.to_path_buf(),
            reason: "file contains no scene".to_string(),
        })?;

    let root_name = scene
        .name()
        .map(str::to_string)
        .or_else(|| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "model".to_string());

    let mut builder = GraphBuilder {
        path,
        buffers: &buffers,
        graph: SceneGraph::new(root_name),
        geometry: HashMap::new(),
        mesh_nodes: 0,
    };

    let root = builder.graph.root();
    for node in scene.nodes() {
        builder.add_node(root, &node)?;
    }

    log::info!(
        "Loaded glTF {}: {} nodes, {} mesh primitives",
        path.display(),
        builder.graph.len(),
        builder.mesh_nodes
    );
    Ok(builder.graph)
}

struct GraphBuilder<'a> {
    path: &'a Path,
    buffers: &'a [gltf::buffer::Data],
    graph: SceneGraph,
    geometry: HashMap<(usize, usize), Arc<Mesh>>,
    mesh_nodes: usize,
}

impl GraphBuilder<'_> {
    fn add_node(&mut self, parent: NodeId, node: &gltf::Node) -> Result<(), AssetError> {
        let (translation, rotation, scale) = node.transform().decomposed();
        let transform = Transform {
            position: Vec3::from(translation),
            rotation: Quat::from_quaternion(Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2])),
            scale: Vec3::from(scale),
        };

        let name = node
            .name()
            .map_or_else(|| format!("node_{}", node.index()), str::to_string);
        let id = self
            .graph
            .add(parent, Node::group(name).with_transform(transform))
            .map_err(|e| self.invalid(e.to_string()))?;

        if let Some(mesh) = node.mesh() {
            let mesh_name = mesh.name().map_or_else(|| format!("mesh_{}", mesh.index()), str::to_string);
            for primitive in mesh.primitives() {
                let geometry = self.geometry_for(&mesh, &primitive)?;
                let material = convert_material(&primitive.material());
                let name = if primitive.index() == 0 {
                    mesh_name.clone()
                } else {
                    format!("{}_{}", mesh_name, primitive.index())
                };

                self.graph
                    .add(id, Node::mesh(name, geometry, material))
                    .map_err(|e| self.invalid(e.to_string()))?;
                self.mesh_nodes += 1;
            }
        }

        for child in node.children() {
            self.add_node(id, &child)?;
        }
        Ok(())
    }

    fn geometry_for(&mut self, mesh: &gltf::Mesh, primitive: &gltf::Primitive) -> Result<Arc<Mesh>, AssetError> {
        let key = (mesh.index(), primitive.index());
        if let Some(existing) = self.geometry.get(&key) {
            return Ok(Arc::clone(existing));
        }

        if primitive.mode() != gltf::mesh::Mode::Triangles {
            return Err(self.invalid(format!(
                "mesh {} primitive {} uses {:?}, only triangle lists are supported",
                mesh.index(),
                primitive.index(),
                primitive.mode()
            )));
        }

        let buffers = self.buffers;
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| self.invalid(format!("mesh {} has no positions", mesh.index())))?
            .collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let normals: Vec<[f32; 3]> = match reader.read_normals() {
            Some(normals) => normals.collect(),
            None => vertex_normals(&positions, &indices),
        };
        let tex_coords: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|coords| coords.into_f32().collect())
            .unwrap_or_default();

        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, position)| {
                Vertex::new(
                    *position,
                    normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                )
            })
            .collect();

        let geometry = Mesh::new(vertices, indices);
        if !geometry.is_valid() {
            return Err(self.invalid(format!("mesh {} has out-of-range indices", mesh.index())));
        }

        let geometry = Arc::new(geometry);
        self.geometry.insert(key, Arc::clone(&geometry));
        Ok(geometry)
    }

    fn invalid(&self, reason: String) -> AssetError {
        AssetError::InvalidData {
            path: self.path.to_path_buf(),
            reason,
        }
    }
}

fn convert_material(material: &gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, a] = pbr.base_color_factor();

    let converted = if material.unlit() {
        Material::basic(BasicMaterial {
            color: Vec3::new(r, g, b),
            opacity: a,
        })
    } else {
        Material::standard(StandardMaterial {
            color: Vec3::new(r, g, b),
            opacity: a,
            metalness: pbr.metallic_factor(),
            roughness: pbr.roughness_factor(),
            emissive: Vec3::from(material.emissive_factor()),
            ..StandardMaterial::default()
        })
    };

    match material.name() {
        Some(name) => converted.with_name(name),
        None => converted,
    }
}

/// Area-weighted smooth normals for meshes that ship without them
fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vec3::zeros(); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let (Some(pa), Some(pb), Some(pc)) = (positions.get(a), positions.get(b), positions.get(c)) else {
            continue;
        };
        let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
        let face = (pb - pa).cross(&(pc - pa));
        for index in [a, b, c] {
            accumulated[index] += face;
        }
    }

    accumulated
        .into_iter()
        .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y).into())
        .collect()
}

fn import_error(path: &Path, error: gltf::Error) -> AssetError {
    match error {
        gltf::Error::Io(source) => AssetError::from_io(path, source),
        other => AssetError::LoadFailed {
            path: path.to_path_buf(),
            cause: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::material::MaterialKind;
    use crate::scene::NodeKind;
    use crate::tests::fixtures::{scratch_dir, write_gltf};
    use approx::assert_relative_eq;

    #[test]
    fn test_hierarchy_and_materials() {
        let dir = scratch_dir("gltf_hierarchy");
        let path = write_gltf(&dir);
        let graph = load_gltf(&path).unwrap();

        let mut names = Vec::new();
        graph.traverse(|_, node| names.push(node.name.clone()));
        assert_eq!(names, ["Helmet", "Body", "body", "Lens", "lens"]);

        let body = graph.find_by_name("body").unwrap();
        match &graph.get(body).unwrap().kind {
            NodeKind::Mesh(mesh) => {
                assert_eq!(mesh.geometry.vertices.len(), 3);
                assert_eq!(mesh.geometry.indices, vec![0, 1, 2]);
                assert_relative_eq!(Vec3::from(mesh.geometry.vertices[0].normal), Vec3::z(), epsilon = 1e-6);
                let standard = mesh.material.as_standard().unwrap();
                assert_relative_eq!(standard.metalness, 0.2);
                assert_relative_eq!(standard.roughness, 0.7);
                assert_eq!(standard.env_map_intensity, 1.0);
                assert_eq!(mesh.material.name.as_deref(), Some("Leather"));
            }
            other => panic!("expected mesh, got {other:?}"),
        }

        let lens = graph.find_by_name("lens").unwrap();
        match &graph.get(lens).unwrap().kind {
            NodeKind::Mesh(mesh) => assert!(matches!(mesh.material.kind, MaterialKind::Basic(_))),
            other => panic!("expected mesh, got {other:?}"),
        }
    }

    #[test]
    fn test_node_transforms_compose() {
        let dir = scratch_dir("gltf_transforms");
        let graph = load_gltf(&write_gltf(&dir)).unwrap();
        let lens = graph.find_by_name("lens").unwrap();
        let world = graph.world_matrix(lens).unwrap();
        // Body translates by +1 on Y, Lens scales by 2
        let corner = world.transform_point(&nalgebra::Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(corner.coords, Vec3::new(2.0, 1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let dir = scratch_dir("gltf_missing");
        let result = load_gltf(&dir.join("absent.gltf"));
        assert!(matches!(result, Err(AssetError::NotFound { .. })));
    }

    #[test]
    fn test_images_are_not_read() {
        let dir = scratch_dir("gltf_images");
        let path = write_gltf(&dir);
        let json = std::fs::read_to_string(&path).unwrap();
        let json = json.replacen(
            r#""buffers":"#,
            r#""images": [{ "uri": "textures/absent.png" }],
  "buffers":"#,
            1,
        );
        std::fs::write(&path, json).unwrap();

        let graph = load_gltf(&path).unwrap();
        assert!(graph.find_by_name("body").is_some());
    }

    #[test]
    fn test_wrong_extension_is_unsupported() {
        assert!(matches!(
            load_gltf(Path::new("model.obj")),
            Err(AssetError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_malformed_json_fails_to_load() {
        let dir = scratch_dir("gltf_malformed");
        let path = dir.join("broken.gltf");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_gltf(&path), Err(AssetError::LoadFailed { .. })));
    }
}
