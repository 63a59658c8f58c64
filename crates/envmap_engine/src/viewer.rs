//! Environment-map scene viewer
//!
//! Owns the scene, the tuning record and everything that mutates them. The
//! binary feeds it window events and calls [`SceneViewer::tick`] once per
//! frame; background loads are polled at the start of each tick and attached
//! on the main thread.

use std::sync::Arc;

use thiserror::Error;

use crate::assets::{load_environment, load_gltf, AssetError, AssetLoader, EnvironmentMap, LoadStatus, LoadTask, RetryPolicy};
use crate::config::{ConfigError, EnvironmentSource, SkyboxConfig, TuningState, ViewerConfig};
use crate::config::{BACKGROUND_BLURRINESS_RANGE, BACKGROUND_INTENSITY_RANGE, ENV_MAP_INTENSITY_RANGE};
use crate::controls::{OrbitButton, OrbitControls};
use crate::events::{AppEvent, KeyCode, MouseButton};
use crate::foundation::frame_loop::{CancellationToken, FrameContext, FrameControl};
use crate::foundation::math::{Transform, Vec3};
use crate::render::{
    torus_knot, Material, PerspectiveCamera, RenderBackend, RenderError, Renderer, StandardMaterial, TorusKnotParams,
    Viewport, WindowError,
};
use crate::scene::{
    apply_environment_intensity, GroundProjectedSkybox, Node, NodeId, NodeKind, SceneEnvironment, SceneError,
    SceneGraph,
};
use crate::ui::{DebugPanel, PanelBinding, PanelChange, Slider};

/// Viewer errors
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Configuration could not be loaded or is invalid
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Scene graph operation failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Rendering failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Window could not be created
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// Asset failed to load
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Counters for what the viewer has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewerStats {
    /// Frames that reached the backend
    pub frames_rendered: u64,
    /// Times the environment intensity was applied to the scene
    pub material_passes: u64,
    /// Value of the most recent intensity pass
    pub last_applied_intensity: Option<f32>,
}

/// The environment-map viewer
pub struct SceneViewer {
    config: ViewerConfig,
    graph: SceneGraph,
    environment: SceneEnvironment,
    tuning: TuningState,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    renderer: Renderer,
    panel: DebugPanel,
    viewport: Viewport,
    cursor: (f32, f32),
    environment_task: Option<LoadTask<Option<EnvironmentMap>>>,
    model_task: Option<LoadTask<SceneGraph>>,
    model_root: Option<NodeId>,
    skybox: Option<NodeId>,
    failures: Vec<String>,
    stats: ViewerStats,
    token: CancellationToken,
    loader: AssetLoader,
}

impl SceneViewer {
    /// Build the scene and start loading the environment map and the model
    pub fn new(config: ViewerConfig, backend: Box<dyn RenderBackend>) -> Result<Self, ViewerError> {
        config.validate()?;
        log::info!("Starting viewer '{}'", config.window.title);

        let viewport = Viewport::new(config.window.width, config.window.height, 1.0);
        let tuning = TuningState::new(config.scene.environment_map_intensity);

        let target = Vec3::from(config.controls.target);
        let mut camera = PerspectiveCamera::new(
            Vec3::from(config.camera.position),
            config.camera.fov,
            viewport.aspect(),
            config.camera.near,
            config.camera.far,
        );
        camera.look_at(target);

        let mut controls = OrbitControls::new(target);
        controls.enable_damping = config.controls.enable_damping;
        controls.damping_factor = config.controls.damping_factor;

        let mut graph = SceneGraph::default();
        graph.add_to_root(torus_knot_node(&config, &tuning));

        let environment = SceneEnvironment {
            background_blurriness: config.scene.background_blurriness,
            background_intensity: config.scene.background_intensity,
            ..SceneEnvironment::default()
        };

        let mut renderer = Renderer::new(backend, viewport.width, viewport.height);
        renderer.set_pixel_ratio(viewport.pixel_ratio());

        let mut panel = DebugPanel::new();
        panel.add_slider(Slider::new(
            "backgroundBlurriness",
            PanelBinding::BackgroundBlurriness,
            BACKGROUND_BLURRINESS_RANGE.0,
            BACKGROUND_BLURRINESS_RANGE.1,
            environment.background_blurriness,
        ));
        panel.add_slider(Slider::new(
            "backgroundIntensity",
            PanelBinding::BackgroundIntensity,
            BACKGROUND_INTENSITY_RANGE.0,
            BACKGROUND_INTENSITY_RANGE.1,
            environment.background_intensity,
        ));
        panel.add_slider(Slider::new(
            "envMapIntensity",
            PanelBinding::EnvironmentMapIntensity,
            ENV_MAP_INTENSITY_RANGE.0,
            ENV_MAP_INTENSITY_RANGE.1,
            tuning.environment_map_intensity(),
        ));

        let loader = AssetLoader::new(config.assets.worker_threads);
        let policy = RetryPolicy::new(config.assets.max_attempts);

        let environment_task = match &config.environment {
            EnvironmentSource::None => None,
            source => {
                let source = source.clone();
                let root = config.assets.root.clone();
                Some(loader.spawn("environment map", move |token| {
                    policy.run("environment map", token, || load_environment(&source, &root))
                }))
            }
        };

        let model_task = if config.model.path.is_empty() {
            None
        } else {
            let path = config.asset_path(&config.model.path);
            Some(loader.spawn("model", move |token| policy.run("model", token, || load_gltf(&path))))
        };

        Ok(Self {
            config,
            graph,
            environment,
            tuning,
            camera,
            controls,
            renderer,
            panel,
            viewport,
            cursor: (0.0, 0.0),
            environment_task,
            model_task,
            model_root: None,
            skybox: None,
            failures: Vec::new(),
            stats: ViewerStats::default(),
            token: CancellationToken::new(),
            loader,
        })
    }

    /// React to one window event
    pub fn handle_event(&mut self, event: &AppEvent) -> FrameControl {
        match *event {
            AppEvent::WindowResized { width, height } => {
                self.resize(width, height, self.viewport.device_pixel_ratio);
            }
            AppEvent::ContentScaleChanged { scale } => {
                self.resize(self.viewport.width, self.viewport.height, scale);
            }
            AppEvent::WindowCloseRequested => return FrameControl::Stop,
            AppEvent::KeyInput { key, pressed: true } => return self.handle_key(key),
            AppEvent::KeyInput { pressed: false, .. } => {}
            AppEvent::MouseButton { button, pressed } => {
                if pressed {
                    let button = match button {
                        MouseButton::Left => OrbitButton::Primary,
                        MouseButton::Middle => OrbitButton::Middle,
                        MouseButton::Right => OrbitButton::Secondary,
                    };
                    self.controls.pointer_down(button, self.cursor.0, self.cursor.1);
                } else {
                    self.controls.pointer_up();
                }
            }
            AppEvent::MouseMoved { x, y } => {
                self.cursor = (x as f32, y as f32);
                self.controls
                    .pointer_move(self.cursor.0, self.cursor.1, &self.camera, self.viewport.height as f32);
            }
            AppEvent::MouseWheel { delta_y, .. } => self.controls.wheel(delta_y as f32),
        }
        FrameControl::Continue
    }

    fn handle_key(&mut self, key: KeyCode) -> FrameControl {
        let change = match key {
            KeyCode::Escape => return FrameControl::Stop,
            KeyCode::Tab => {
                self.panel.select_next();
                None
            }
            KeyCode::Left => self.panel.nudge(-1),
            KeyCode::Right => self.panel.nudge(1),
            KeyCode::Down => self.panel.nudge(-10),
            KeyCode::Up => self.panel.nudge(10),
            KeyCode::R => {
                self.reset_camera();
                None
            }
        };
        if let Some(change) = change {
            self.apply_panel_change(change);
        }
        FrameControl::Continue
    }

    /// The window changed size or moved to a monitor with another scale
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) {
        self.viewport = Viewport::new(width, height, device_pixel_ratio);

        if width > 0 && height > 0 {
            self.camera.set_aspect(self.viewport.aspect());
            self.camera.update_projection_matrix();
        }

        self.renderer.set_size(width, height);
        self.renderer.set_pixel_ratio(self.viewport.pixel_ratio());
    }

    /// Write a panel slider as if the user dragged it
    pub fn set_panel_value(&mut self, binding: PanelBinding, value: f32) -> Option<PanelChange> {
        let id = self.panel.find(binding)?;
        let change = self.panel.set_value(id, value)?;
        self.apply_panel_change(change);
        Some(change)
    }

    fn apply_panel_change(&mut self, change: PanelChange) {
        match change.binding {
            PanelBinding::BackgroundBlurriness => self.environment.background_blurriness = change.value,
            PanelBinding::BackgroundIntensity => self.environment.background_intensity = change.value,
            PanelBinding::EnvironmentMapIntensity => {
                self.tuning.set_environment_map_intensity(change.value);
                self.apply_tuned_intensity();
            }
            PanelBinding::SkyboxRadius | PanelBinding::SkyboxHeight => {
                let Some(NodeKind::Skybox(skybox)) = self
                    .skybox
                    .and_then(|id| self.graph.get_mut(id))
                    .map(|node| &mut node.kind)
                else {
                    return;
                };
                if change.binding == PanelBinding::SkyboxRadius {
                    skybox.radius = change.value;
                } else {
                    skybox.height = change.value;
                }
            }
        }
    }

    fn apply_tuned_intensity(&mut self) {
        let intensity = self.tuning.environment_map_intensity();
        apply_environment_intensity(&mut self.graph, intensity);
        self.stats.material_passes += 1;
        self.stats.last_applied_intensity = Some(intensity);
    }

    /// Attach whatever background loads have finished
    pub fn poll_loads(&mut self) -> Result<(), ViewerError> {
        if let Some(result) = take_ready(&mut self.environment_task) {
            self.on_environment_loaded(result);
        }
        if let Some(result) = take_ready(&mut self.model_task) {
            self.on_model_loaded(result)?;
        }
        Ok(())
    }

    /// Whether any background load is still outstanding
    pub fn loads_pending(&self) -> bool {
        self.environment_task.is_some() || self.model_task.is_some()
    }

    fn on_environment_loaded(&mut self, result: Result<Option<EnvironmentMap>, AssetError>) {
        let map = match result {
            Ok(Some(map)) => map,
            Ok(None) => return,
            Err(AssetError::Cancelled { .. }) => return,
            Err(error) => {
                log::warn!("Environment map failed to load, using a neutral fallback: {}", error);
                EnvironmentMap::neutral()
            }
        };
        let map = Arc::new(map);

        match &self.config.environment {
            EnvironmentSource::Hdr { skybox: Some(skybox), .. } => {
                let skybox = *skybox;
                self.environment.environment = Some(Arc::clone(&map));
                self.add_skybox(map, skybox);
            }
            _ => self.environment.set_map(map),
        }
    }

    fn add_skybox(&mut self, map: Arc<EnvironmentMap>, config: SkyboxConfig) {
        let node = Node::new(
            "skybox",
            NodeKind::Skybox(GroundProjectedSkybox {
                map,
                radius: config.radius,
                height: config.height,
            }),
        )
        .with_transform(Transform::identity().with_uniform_scale(config.scale));
        self.skybox = Some(self.graph.add_to_root(node));

        self.panel.add_slider(
            Slider::new("skybox radius", PanelBinding::SkyboxRadius, 1.0, 200.0, config.radius).with_step(0.1),
        );
        self.panel.add_slider(
            Slider::new("skybox height", PanelBinding::SkyboxHeight, 1.0, 100.0, config.height).with_step(0.1),
        );
        log::info!("Ground-projected skybox added (radius {}, height {})", config.radius, config.height);
    }

    fn on_model_loaded(&mut self, result: Result<SceneGraph, AssetError>) -> Result<(), ViewerError> {
        match result {
            Ok(model) => {
                let root = self.graph.root();
                let id = self.graph.attach(root, model)?;
                if let Some(node) = self.graph.get_mut(id) {
                    node.transform.set_uniform_scale(self.config.model.scale);
                    log::info!("Attached model '{}'", node.name);
                }
                self.model_root = Some(id);
                self.apply_tuned_intensity();
            }
            Err(AssetError::Cancelled { .. }) => {}
            Err(error) => {
                log::error!("Failed to load model {}: {}", self.config.model.path, error);
                self.failures.push(format!("model: {error}"));
            }
        }
        Ok(())
    }

    /// Run one frame: attach finished loads, move the camera, render
    pub fn tick(&mut self, context: &FrameContext) -> Result<FrameControl, ViewerError> {
        if self.token.is_cancelled() {
            return Ok(FrameControl::Stop);
        }

        self.poll_loads()?;
        self.controls.update(&mut self.camera);

        if let Some(stats) = self.renderer.render(&self.graph, &self.environment, &self.camera)? {
            self.stats.frames_rendered += 1;
            if context.frame % 600 == 0 {
                log::debug!(
                    "Frame {} ({:.1}s): {} draws, {} triangles",
                    context.frame,
                    context.elapsed,
                    stats.draw_calls,
                    stats.triangles
                );
            }
        }

        Ok(FrameControl::Continue)
    }

    fn reset_camera(&mut self) {
        self.controls.stop();
        self.controls.target = Vec3::from(self.config.controls.target);
        self.camera.position = Vec3::from(self.config.camera.position);
        self.camera.look_at(self.controls.target);
    }

    /// Window title: configured title, selected slider and any load failures
    pub fn title(&self) -> String {
        let mut title = format!("{} | {}", self.config.window.title, self.panel.summary());
        if !self.failures.is_empty() {
            title.push_str(" | load failed: ");
            title.push_str(&self.failures.join(", "));
        }
        title
    }

    /// Token that stops the frame loop; cancelled when the viewer is dropped
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Asset loads that failed
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Counters
    pub fn stats(&self) -> ViewerStats {
        self.stats
    }

    /// Configuration the viewer started with
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Background and environment
    pub fn environment(&self) -> &SceneEnvironment {
        &self.environment
    }

    /// Tuning record
    pub fn tuning(&self) -> &TuningState {
        &self.tuning
    }

    /// Camera
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Renderer
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Debug panel
    pub fn panel(&self) -> &DebugPanel {
        &self.panel
    }

    /// Root of the attached model, once loaded
    pub fn model_root(&self) -> Option<NodeId> {
        self.model_root
    }

    /// Ground-projected skybox node, once the map is loaded
    pub fn skybox(&self) -> Option<NodeId> {
        self.skybox
    }

    /// Background loader threads
    pub fn loader_threads(&self) -> usize {
        self.loader.worker_count()
    }
}

impl Drop for SceneViewer {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(task) = self.environment_task.as_mut() {
            task.cancel();
        }
        if let Some(task) = self.model_task.as_mut() {
            task.cancel();
        }
    }
}

fn take_ready<T>(slot: &mut Option<LoadTask<T>>) -> Option<Result<T, AssetError>> {
    let status = slot.as_mut()?.poll();
    match status {
        LoadStatus::Pending => None,
        LoadStatus::Ready(result) => {
            *slot = None;
            Some(result)
        }
        LoadStatus::Cancelled => {
            if let Some(task) = slot.take() {
                log::debug!("Load '{}' was cancelled", task.label());
            }
            None
        }
    }
}

fn torus_knot_node(config: &ViewerConfig, tuning: &TuningState) -> Node {
    let knot = &config.torus_knot;
    let geometry = torus_knot(&TorusKnotParams {
        radius: knot.radius,
        tube: knot.tube,
        tubular_segments: knot.tubular_segments,
        radial_segments: knot.radial_segments,
        p: knot.p,
        q: knot.q,
    });
    let material = Material::standard(StandardMaterial {
        color: Vec3::from(knot.color),
        roughness: knot.roughness,
        metalness: knot.metalness,
        env_map_intensity: tuning.environment_map_intensity(),
        ..StandardMaterial::default()
    });

    Node::mesh("torusKnot", Arc::new(geometry), material)
        .with_transform(Transform::from_position(Vec3::from(knot.position)))
}
