//! Frame renderer
//!
//! Owns the backend and the output surface state. Size and pixel-ratio
//! changes are recorded as dirty flags and pushed to the backend once, right
//! before the next frame is submitted.

use bitflags::bitflags;

use super::backend::{
    BackendResult, CameraUniforms, DrawItem, EnvironmentUniforms, FrameData, RenderBackend, SkyboxDraw,
};
use super::camera::PerspectiveCamera;
use super::viewport::MAX_PIXEL_RATIO;
use crate::assets::EnvironmentMap;
use crate::foundation::math::Mat4;
use crate::scene::{NodeKind, SceneEnvironment, SceneGraph};

bitflags! {
    /// Surface state the backend has not seen yet
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        /// Logical size changed
        const SIZE = 1 << 0;
        /// Pixel ratio changed
        const PIXEL_RATIO = 1 << 1;
    }
}

/// What one call to [`Renderer::render`] drew
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame index
    pub frame: u64,
    /// Mesh draws
    pub draw_calls: usize,
    /// Triangles across all mesh draws
    pub triangles: usize,
    /// Skybox draws
    pub skyboxes: usize,
}

/// Scene renderer
pub struct Renderer {
    backend: Box<dyn RenderBackend>,
    width: u32,
    height: u32,
    pixel_ratio: f32,
    dirty: DirtyFlags,
    frame: u64,
}

impl Renderer {
    /// Create a renderer drawing through `backend` at pixel ratio 1
    pub fn new(backend: Box<dyn RenderBackend>, width: u32, height: u32) -> Self {
        log::info!("Renderer using '{}' backend", backend.name());
        Self {
            backend,
            width,
            height,
            pixel_ratio: 1.0,
            dirty: DirtyFlags::SIZE | DirtyFlags::PIXEL_RATIO,
            frame: 0,
        }
    }

    /// Set the logical output size
    pub fn set_size(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.dirty |= DirtyFlags::SIZE;
        }
    }

    /// Set the pixel ratio, capped at [`MAX_PIXEL_RATIO`]. Non-positive or
    /// non-finite ratios fall back to 1.
    pub fn set_pixel_ratio(&mut self, ratio: f32) {
        let ratio = if ratio.is_finite() && ratio > 0.0 {
            ratio.min(MAX_PIXEL_RATIO)
        } else {
            1.0
        };
        if (ratio - self.pixel_ratio).abs() > f32::EPSILON {
            self.pixel_ratio = ratio;
            self.dirty |= DirtyFlags::PIXEL_RATIO;
        }
    }

    /// Logical output size
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Current pixel ratio
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Surface state not yet pushed to the backend
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Physical size of the drawing buffer
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let scale = |logical: u32| (logical as f32 * self.pixel_ratio).round() as u32;
        (scale(self.width), scale(self.height))
    }

    /// Backend in use
    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }

    /// Draw one frame.
    ///
    /// Returns `None` without touching the backend while the surface has no
    /// area (minimized window).
    pub fn render(
        &mut self,
        graph: &SceneGraph,
        environment: &SceneEnvironment,
        camera: &PerspectiveCamera,
    ) -> BackendResult<Option<FrameStats>> {
        let target_size = self.drawing_buffer_size();
        if target_size.0 == 0 || target_size.1 == 0 {
            return Ok(None);
        }

        if !self.dirty.is_empty() {
            self.backend.resize(target_size.0, target_size.1)?;
            self.dirty = DirtyFlags::empty();
        }

        let (draws, skyboxes) = collect_draws(graph);
        let frame = FrameData {
            frame: self.frame,
            target_size,
            camera: camera_uniforms(camera),
            environment_uniforms: environment_uniforms(environment),
            environment,
            draws,
            skyboxes,
        };

        self.backend.submit(&frame)?;

        let stats = FrameStats {
            frame: self.frame,
            draw_calls: frame.draws.len(),
            triangles: frame.draws.iter().map(|draw| draw.mesh.triangle_count()).sum(),
            skyboxes: frame.skyboxes.len(),
        };
        self.frame += 1;
        Ok(Some(stats))
    }
}

/// Visible meshes and skyboxes in pre-order with their world matrices
fn collect_draws(graph: &SceneGraph) -> (Vec<DrawItem<'_>>, Vec<SkyboxDraw>) {
    let mut draws = Vec::new();
    let mut skyboxes = Vec::new();
    let mut stack = vec![(graph.root(), Mat4::identity())];

    while let Some((id, parent_world)) = stack.pop() {
        let Some(node) = graph.get(id) else { continue };
        if !node.visible {
            continue;
        }

        let world = parent_world * node.transform.to_matrix();
        match &node.kind {
            NodeKind::Mesh(mesh) => draws.push(DrawItem {
                node: id,
                mesh: mesh.geometry.as_ref(),
                model: world,
                material: mesh.material.uniforms(),
            }),
            NodeKind::Skybox(skybox) => skyboxes.push(SkyboxDraw {
                node: id,
                model: world,
                radius: skybox.radius,
                height: skybox.height,
            }),
            NodeKind::Group => {}
        }

        stack.extend(node.children().iter().rev().map(|&child| (child, world)));
    }

    (draws, skyboxes)
}

fn camera_uniforms(camera: &PerspectiveCamera) -> CameraUniforms {
    CameraUniforms {
        view: camera.view_matrix().into(),
        projection: (*camera.projection_matrix()).into(),
        view_projection: camera.view_projection_matrix().into(),
        position: [camera.position.x, camera.position.y, camera.position.z, 1.0],
    }
}

fn environment_uniforms(environment: &SceneEnvironment) -> EnvironmentUniforms {
    EnvironmentUniforms {
        background_blurriness: environment.background_blurriness,
        background_intensity: environment.background_intensity,
        has_environment: u32::from(environment.environment.is_some()),
        cube_map: u32::from(matches!(
            environment.environment.as_deref(),
            Some(EnvironmentMap::Cube(_))
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::render::headless::HeadlessBackend;
    use crate::render::material::{BasicMaterial, Material, StandardMaterial};
    use crate::render::mesh::{Mesh, Vertex};
    use crate::scene::Node;

    fn triangle() -> Arc<Mesh> {
        Arc::new(Mesh::new(
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
                Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            ],
            vec![0, 1, 2],
        ))
    }

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(Vec3::new(4.0, 5.0, 4.0), 75.0, 1.0, 0.1, 100.0)
    }

    fn headless(renderer: &Renderer) -> &HeadlessBackend {
        renderer.backend().as_any().downcast_ref::<HeadlessBackend>().unwrap()
    }

    #[test]
    fn test_pixel_ratio_is_capped() {
        let mut renderer = Renderer::new(Box::<HeadlessBackend>::default(), 800, 600);
        renderer.set_pixel_ratio(3.0);
        assert_eq!(renderer.pixel_ratio(), 2.0);
        renderer.set_pixel_ratio(f32::NAN);
        assert_eq!(renderer.pixel_ratio(), 1.0);
    }

    #[test]
    fn test_drawing_buffer_scales_with_pixel_ratio() {
        let mut renderer = Renderer::new(Box::<HeadlessBackend>::default(), 800, 600);
        renderer.set_pixel_ratio(1.5);
        assert_eq!(renderer.drawing_buffer_size(), (1200, 900));
    }

    #[test]
    fn test_resize_reaches_backend_once() {
        let mut renderer = Renderer::new(Box::<HeadlessBackend>::default(), 1920, 1080);
        let graph = SceneGraph::default();
        let environment = SceneEnvironment::default();

        renderer.render(&graph, &environment, &camera()).unwrap();
        renderer.set_size(1920, 1080);
        renderer.render(&graph, &environment, &camera()).unwrap();
        assert_eq!(headless(&renderer).resize_count(), 1);

        renderer.set_size(800, 600);
        assert!(renderer.dirty().contains(DirtyFlags::SIZE));
        renderer.render(&graph, &environment, &camera()).unwrap();
        assert!(renderer.dirty().is_empty());
        assert_eq!(headless(&renderer).resize_count(), 2);
        assert_eq!(headless(&renderer).size(), (800, 600));
    }

    #[test]
    fn test_minimized_surface_skips_the_frame() {
        let mut renderer = Renderer::new(Box::<HeadlessBackend>::default(), 0, 0);
        let stats = renderer
            .render(&SceneGraph::default(), &SceneEnvironment::default(), &camera())
            .unwrap();
        assert!(stats.is_none());
        assert!(headless(&renderer).last_frame().is_none());
    }

    #[test]
    fn test_hidden_subtrees_are_not_drawn() {
        let mut graph = SceneGraph::default();
        let shown = graph.add_to_root(Node::group("shown").with_transform(Transform::from_position(Vec3::new(0.0, 2.0, 0.0))));
        let lit = graph
            .add(shown, Node::mesh("lit", triangle(), Material::standard(StandardMaterial::default())))
            .unwrap();
        graph
            .add(shown, Node::mesh("unlit", triangle(), Material::basic(BasicMaterial::default())))
            .unwrap();
        let mut hidden = Node::group("hidden");
        hidden.visible = false;
        let hidden = graph.add_to_root(hidden);
        graph
            .add(hidden, Node::mesh("ghost", triangle(), Material::standard(StandardMaterial::default())))
            .unwrap();

        let (draws, skyboxes) = collect_draws(&graph);
        assert_eq!(draws.len(), 2);
        assert!(skyboxes.is_empty());
        assert_eq!(draws[0].node, lit);
        assert_eq!(draws[0].model[(1, 3)], 2.0);
        assert_eq!(draws[1].material.unlit, 1);
    }

    #[test]
    fn test_frame_record_reflects_material_intensity() {
        let mut graph = SceneGraph::default();
        let mut material = StandardMaterial::default();
        material.env_map_intensity = 2.5;
        graph.add_to_root(Node::mesh("knot", triangle(), Material::standard(material)));
        graph.add_to_root(Node::mesh("label", triangle(), Material::basic(BasicMaterial::default())));

        let mut environment = SceneEnvironment::default();
        environment.background_intensity = 5.0;

        let mut renderer = Renderer::new(Box::<HeadlessBackend>::default(), 640, 480);
        let stats = renderer.render(&graph, &environment, &camera()).unwrap().unwrap();
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.triangles, 2);

        let record = headless(&renderer).last_frame().unwrap();
        assert_eq!(record.env_map_intensities, vec![2.5]);
        assert_eq!(record.background_intensity, 5.0);
        assert_eq!(record.target_size, (640, 480));
        assert_eq!(headless(&renderer).frames().count(), 1);
    }
}
