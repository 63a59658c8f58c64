//! Scene-level lighting environment and the environment-intensity pass

use std::sync::Arc;

use super::graph::SceneGraph;
use crate::assets::EnvironmentMap;
use crate::foundation::math::Vec3;

/// What is drawn behind the scene
#[derive(Debug, Clone)]
pub enum Background {
    /// Environment texture
    Texture(Arc<EnvironmentMap>),
    /// Flat linear RGB colour
    Color(Vec3),
}

/// Scene-wide environment settings
#[derive(Debug, Clone)]
pub struct SceneEnvironment {
    /// Background, `None` clears to black
    pub background: Option<Background>,
    /// Map standard materials reflect
    pub environment: Option<Arc<EnvironmentMap>>,
    /// Background blur (0.0 - 1.0)
    pub background_blurriness: f32,
    /// Background brightness multiplier (0.0 - 10.0)
    pub background_intensity: f32,
}

impl Default for SceneEnvironment {
    fn default() -> Self {
        Self {
            background: None,
            environment: None,
            background_blurriness: 0.0,
            background_intensity: 1.0,
        }
    }
}

impl SceneEnvironment {
    /// Use `map` both as background and as the reflected environment
    pub fn set_map(&mut self, map: Arc<EnvironmentMap>) {
        self.background = Some(Background::Texture(Arc::clone(&map)));
        self.environment = Some(map);
    }
}

/// Environment projected onto a ground disc so the model appears to stand on
/// the floor of the captured scene
#[derive(Debug, Clone)]
pub struct GroundProjectedSkybox {
    /// Projected map
    pub map: Arc<EnvironmentMap>,
    /// Radius of the projection sphere
    pub radius: f32,
    /// Height of the capture point above the ground
    pub height: f32,
}

/// Set `env_map_intensity` on every mesh with a standard material.
///
/// Walks the whole graph from the root. Nodes that are not meshes, and meshes
/// with non-standard materials, are left untouched. The value is written as
/// given; range checks belong to whoever produced it.
pub fn apply_environment_intensity(graph: &mut SceneGraph, intensity: f32) {
    let mut updated = 0usize;
    graph.traverse_mut(|_, node| {
        if let Some(material) = node.kind.standard_material_mut() {
            material.env_map_intensity = intensity;
            updated += 1;
        }
    });
    log::debug!("Applied environment intensity {} to {} materials", intensity, updated);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::material::{BasicMaterial, Material, PhysicalMaterial, StandardMaterial};
    use crate::render::mesh::Mesh;
    use crate::scene::graph::{Node, NodeId, NodeKind};

    fn standard_mesh(name: &str) -> Node {
        Node::mesh(name, Arc::new(Mesh::default()), Material::standard(StandardMaterial::default()))
    }

    fn basic_mesh(name: &str) -> Node {
        Node::mesh(name, Arc::new(Mesh::default()), Material::basic(BasicMaterial::default()))
    }

    fn intensity_of(graph: &SceneGraph, id: NodeId) -> Option<f32> {
        match &graph.get(id)?.kind {
            NodeKind::Mesh(mesh) => mesh.material.as_standard().map(|s| s.env_map_intensity),
            _ => None,
        }
    }

    fn materials(graph: &SceneGraph) -> Vec<Option<Material>> {
        let mut out = Vec::new();
        graph.traverse(|_, node| {
            out.push(match &node.kind {
                NodeKind::Mesh(mesh) => Some(mesh.material.clone()),
                _ => None,
            });
        });
        out
    }

    fn skybox_node() -> Node {
        Node::new(
            "skybox",
            NodeKind::Skybox(GroundProjectedSkybox {
                map: Arc::new(EnvironmentMap::neutral()),
                radius: 120.0,
                height: 11.0,
            }),
        )
    }

    fn mixed_graph() -> (SceneGraph, Vec<NodeId>, Vec<NodeId>) {
        let mut graph = SceneGraph::default();
        let model = graph.add_to_root(Node::group("model"));
        let standard = vec![
            graph.add_to_root(standard_mesh("knot")),
            graph.add(model, standard_mesh("lens")).unwrap(),
            graph
                .add(
                    model,
                    Node::mesh(
                        "visor",
                        Arc::new(Mesh::default()),
                        Material::physical(PhysicalMaterial::default()),
                    ),
                )
                .unwrap(),
        ];
        let others = vec![
            graph.add(model, basic_mesh("label")).unwrap(),
            model,
            graph.add_to_root(skybox_node()),
        ];
        (graph, standard, others)
    }

    #[test]
    fn test_every_standard_mesh_gets_the_value() {
        for value in [0.0, 0.5, 1.0, 3.2, 10.0] {
            let (mut graph, standard, _) = mixed_graph();
            apply_environment_intensity(&mut graph, value);
            for id in standard {
                assert_eq!(intensity_of(&graph, id), Some(value));
            }
        }
    }

    #[test]
    fn test_other_nodes_are_untouched() {
        let (mut graph, _, others) = mixed_graph();
        let basic_before = graph.get(others[0]).unwrap().kind.clone();

        apply_environment_intensity(&mut graph, 7.0);

        match (&basic_before, &graph.get(others[0]).unwrap().kind) {
            (NodeKind::Mesh(before), NodeKind::Mesh(after)) => assert_eq!(before.material, after.material),
            _ => panic!("label should stay a mesh"),
        }
        assert!(matches!(graph.get(others[1]).unwrap().kind, NodeKind::Group));
        match &graph.get(others[2]).unwrap().kind {
            NodeKind::Skybox(skybox) => {
                assert_eq!(skybox.radius, 120.0);
                assert_eq!(skybox.height, 11.0);
            }
            _ => panic!("skybox should stay a skybox"),
        }
    }

    #[test]
    fn test_applying_twice_equals_applying_once() {
        let (mut once, _, _) = mixed_graph();
        apply_environment_intensity(&mut once, 2.5);

        let (mut twice, _, _) = mixed_graph();
        apply_environment_intensity(&mut twice, 2.5);
        apply_environment_intensity(&mut twice, 2.5);

        assert_eq!(materials(&once), materials(&twice));
    }

    #[test]
    fn test_empty_graph_is_a_no_op() {
        let mut graph = SceneGraph::default();
        apply_environment_intensity(&mut graph, 4.0);
        assert!(graph.is_empty());
        assert!(matches!(graph.get(graph.root()).unwrap().kind, NodeKind::Group));
    }

    #[test]
    fn test_standard_and_basic_mesh_scenario() {
        let mut graph = SceneGraph::default();
        let standard = graph.add_to_root(standard_mesh("standard"));
        let other = graph.add_to_root(basic_mesh("other"));
        let other_before = materials(&graph)[2].clone();

        assert_eq!(intensity_of(&graph, standard), Some(1.0));
        apply_environment_intensity(&mut graph, 7.5);

        assert_eq!(intensity_of(&graph, standard), Some(7.5));
        assert_eq!(intensity_of(&graph, other), None);
        assert_eq!(materials(&graph)[2], other_before);
    }

    #[test]
    fn test_set_map_fills_background_and_environment() {
        let mut environment = SceneEnvironment::default();
        environment.set_map(Arc::new(EnvironmentMap::neutral()));
        assert!(matches!(environment.background, Some(Background::Texture(_))));
        assert!(environment.environment.is_some());
    }
}
