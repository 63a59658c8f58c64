//! Orbit camera controls
//!
//! The camera orbits `target` on a sphere. Pointer input accumulates
//! spherical, pan and dolly deltas; [`OrbitControls::update`] applies them
//! once per frame. With damping enabled only a fraction of the pending motion
//! is applied each frame and the rest decays, so the camera glides to a stop.

use std::f32::consts::{PI, TAU};

use crate::foundation::math::Vec3;
use crate::render::camera::PerspectiveCamera;

const EPS: f32 = 0.000_001;

/// Which button drives a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrbitButton {
    /// Rotate around the target
    Primary,
    /// Dolly toward or away from the target
    Middle,
    /// Pan the target
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragAction {
    Rotate,
    Dolly,
    Pan,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    action: DragAction,
    last: (f32, f32),
}

/// Orbit, dolly and pan around a target point
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Point the camera orbits
    pub target: Vec3,
    /// Glide to a stop instead of stopping immediately
    pub enable_damping: bool,
    /// Fraction of pending motion applied per frame
    pub damping_factor: f32,
    /// Rotation speed multiplier
    pub rotate_speed: f32,
    /// Dolly speed multiplier
    pub zoom_speed: f32,
    /// Pan speed multiplier
    pub pan_speed: f32,
    /// Closest allowed distance to the target
    pub min_distance: f32,
    /// Farthest allowed distance to the target
    pub max_distance: f32,
    /// Smallest polar angle, measured from +Y
    pub min_polar_angle: f32,
    /// Largest polar angle, measured from +Y
    pub max_polar_angle: f32,

    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vec3,
    drag: Option<Drag>,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(Vec3::zeros())
    }
}

impl OrbitControls {
    /// Controls orbiting `target` without damping
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::zeros(),
            drag: None,
        }
    }

    /// Start a drag at window position (x, y)
    pub fn pointer_down(&mut self, button: OrbitButton, x: f32, y: f32) {
        let action = match button {
            OrbitButton::Primary => DragAction::Rotate,
            OrbitButton::Middle => DragAction::Dolly,
            OrbitButton::Secondary => DragAction::Pan,
        };
        self.drag = Some(Drag { action, last: (x, y) });
    }

    /// End the current drag
    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Pointer moved to (x, y). Deltas are relative to the viewport height so
    /// a full-height drag rotates by one turn.
    pub fn pointer_move(&mut self, x: f32, y: f32, camera: &PerspectiveCamera, viewport_height: f32) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let (dx, dy) = (x - drag.last.0, y - drag.last.1);
        drag.last = (x, y);
        let action = drag.action;

        let height = viewport_height.max(1.0);
        match action {
            DragAction::Rotate => {
                self.rotate_left(TAU * dx / height * self.rotate_speed);
                self.rotate_up(TAU * dy / height * self.rotate_speed);
            }
            DragAction::Dolly => {
                if dy > 0.0 {
                    self.dolly_out(self.zoom_scale());
                } else if dy < 0.0 {
                    self.dolly_in(self.zoom_scale());
                }
            }
            DragAction::Pan => self.pan(dx * self.pan_speed, dy * self.pan_speed, camera, height),
        }
    }

    /// Scroll wheel; positive `delta` scrolls toward the scene
    pub fn wheel(&mut self, delta: f32) {
        if delta > 0.0 {
            self.dolly_in(self.zoom_scale());
        } else if delta < 0.0 {
            self.dolly_out(self.zoom_scale());
        }
    }

    /// Drop any pending or damped motion and end the current drag
    pub fn stop(&mut self) {
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vec3::zeros();
        self.drag = None;
    }

    /// Apply pending motion to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let previous_position = camera.position;
        let previous_target = self.target;

        let offset = camera.position - self.target;
        let mut radius = offset.norm();
        let (mut theta, mut phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, 0.0)
        };

        let step = if self.enable_damping { self.damping_factor } else { 1.0 };
        theta += self.theta_delta * step;
        phi += self.phi_delta * step;

        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * step;

        let sin_phi_radius = phi.sin() * radius;
        let offset = Vec3::new(sin_phi_radius * theta.sin(), phi.cos() * radius, sin_phi_radius * theta.cos());

        camera.position = self.target + offset;
        camera.look_at(self.target);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.theta_delta *= decay;
            self.phi_delta *= decay;
            self.pan_offset *= decay;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::zeros();
        }
        self.scale = 1.0;

        (camera.position - previous_position).norm_squared() > EPS
            || (self.target - previous_target).norm_squared() > EPS
    }

    fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    fn dolly_in(&mut self, dolly_scale: f32) {
        self.scale *= dolly_scale;
    }

    fn dolly_out(&mut self, dolly_scale: f32) {
        self.scale /= dolly_scale;
    }

    fn pan(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera, height: f32) {
        let offset = camera.position - self.target;
        // Half the visible height at the target's depth
        let target_distance = offset.norm() * (camera.fov_degrees.to_radians() * 0.5).tan();

        let forward = (self.target - camera.position).try_normalize(EPS).unwrap_or_else(|| -Vec3::z());
        let right = forward.cross(&camera.up).try_normalize(EPS).unwrap_or_else(Vec3::x);
        let up = right.cross(&forward);

        self.pan_offset -= right * (2.0 * dx * target_distance / height);
        self.pan_offset += up * (2.0 * dy * target_distance / height);
    }
}
