//! Headless debug panel
//!
//! A list of numeric sliders bound to scene values. The panel only stores
//! values and reports changes; the owner decides what a change does. Input
//! arrives as keyboard navigation (select a slider, nudge it one step) or as
//! direct writes.

use std::fmt::Write as _;

/// Scene value a slider drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelBinding {
    /// `SceneEnvironment::background_blurriness`
    BackgroundBlurriness,
    /// `SceneEnvironment::background_intensity`
    BackgroundIntensity,
    /// The tuned environment-map intensity
    EnvironmentMapIntensity,
    /// Ground-projected skybox radius
    SkyboxRadius,
    /// Ground-projected skybox height
    SkyboxHeight,
}

/// Handle to a slider in a [`DebugPanel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SliderId(usize);

/// Numeric slider
#[derive(Debug, Clone, PartialEq)]
pub struct Slider {
    /// Display label
    pub label: String,
    /// Bound scene value
    pub binding: PanelBinding,
    /// Smallest value
    pub min: f32,
    /// Largest value
    pub max: f32,
    /// Snap increment; `None` allows any value in range
    pub step: Option<f32>,
    value: f32,
}

impl Slider {
    /// Create a slider; `value` is clamped into range
    pub fn new(label: impl Into<String>, binding: PanelBinding, min: f32, max: f32, value: f32) -> Self {
        let mut slider = Self {
            label: label.into(),
            binding,
            min,
            max,
            step: None,
            value: min,
        };
        slider.value = slider.constrain(value).unwrap_or(min);
        slider
    }

    /// Builder: snap to multiples of `step` above `min`
    #[must_use]
    pub fn with_step(mut self, step: f32) -> Self {
        self.step = Some(step);
        self.value = self.constrain(self.value).unwrap_or(self.min);
        self
    }

    /// Current value
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Increment used by keyboard nudges
    pub fn nudge_step(&self) -> f32 {
        self.step.unwrap_or((self.max - self.min) / 100.0)
    }

    fn constrain(&self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        let clamped = value.clamp(self.min, self.max);
        Some(match self.step {
            Some(step) if step > 0.0 => {
                let snapped = self.min + ((clamped - self.min) / step).round() * step;
                snapped.clamp(self.min, self.max)
            }
            _ => clamped,
        })
    }
}

/// A slider value that actually changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelChange {
    /// Slider that changed
    pub slider: SliderId,
    /// Value it is bound to
    pub binding: PanelBinding,
    /// New value
    pub value: f32,
    /// Value before the change
    pub previous: f32,
}

/// Ordered collection of sliders with a keyboard selection
#[derive(Debug, Clone, Default)]
pub struct DebugPanel {
    sliders: Vec<Slider>,
    selected: usize,
}

impl DebugPanel {
    /// Create an empty panel
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slider; a second slider for the same binding replaces the first
    pub fn add_slider(&mut self, slider: Slider) -> SliderId {
        if let Some(existing) = self.find(slider.binding) {
            log::debug!("Replacing slider '{}'", slider.label);
            self.sliders[existing.0] = slider;
            return existing;
        }
        self.sliders.push(slider);
        SliderId(self.sliders.len() - 1)
    }

    /// Slider bound to `binding`
    pub fn find(&self, binding: PanelBinding) -> Option<SliderId> {
        self.sliders
            .iter()
            .position(|slider| slider.binding == binding)
            .map(SliderId)
    }

    /// Slider by handle
    pub fn slider(&self, id: SliderId) -> Option<&Slider> {
        self.sliders.get(id.0)
    }

    /// Number of sliders
    pub fn len(&self) -> usize {
        self.sliders.len()
    }

    /// Whether the panel has no sliders
    pub fn is_empty(&self) -> bool {
        self.sliders.is_empty()
    }

    /// Write a value. Returns the change when the stored value differs
    /// afterwards; out-of-range values are clamped and snapped first.
    pub fn set_value(&mut self, id: SliderId, value: f32) -> Option<PanelChange> {
        let slider = self.sliders.get_mut(id.0)?;
        let constrained = slider.constrain(value)?;
        if constrained == slider.value {
            return None;
        }

        let previous = slider.value;
        slider.value = constrained;
        log::debug!("Panel '{}': {} -> {}", slider.label, previous, constrained);
        Some(PanelChange {
            slider: id,
            binding: slider.binding,
            value: constrained,
            previous,
        })
    }

    /// Move the selected slider by `steps` nudge increments
    pub fn nudge(&mut self, steps: i32) -> Option<PanelChange> {
        let id = self.selected()?;
        let slider = self.slider(id)?;
        let target = slider.value + slider.nudge_step() * steps as f32;
        self.set_value(id, target)
    }

    /// Select the next slider, wrapping around
    pub fn select_next(&mut self) -> Option<SliderId> {
        if self.sliders.is_empty() {
            return None;
        }
        self.selected = (self.selected + 1) % self.sliders.len();
        self.selected()
    }

    /// Currently selected slider
    pub fn selected(&self) -> Option<SliderId> {
        (self.selected < self.sliders.len()).then_some(SliderId(self.selected))
    }

    /// One-line description of the selected slider
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if let Some(slider) = self.selected().and_then(|id| self.slider(id)) {
            let _ = write!(
                out,
                "[{}/{}] {} = {:.2}",
                self.selected + 1,
                self.sliders.len(),
                slider.label,
                slider.value
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn panel() -> DebugPanel {
        let mut panel = DebugPanel::new();
        panel.add_slider(Slider::new("backgroundBlurriness", PanelBinding::BackgroundBlurriness, 0.0, 1.0, 0.0));
        panel.add_slider(Slider::new("backgroundIntensity", PanelBinding::BackgroundIntensity, 0.0, 10.0, 1.0));
        panel.add_slider(Slider::new("envMapIntensity", PanelBinding::EnvironmentMapIntensity, 0.0, 10.0, 1.0));
        panel
    }

    #[test]
    fn test_set_value_reports_change() {
        let mut panel = panel();
        let id = panel.find(PanelBinding::EnvironmentMapIntensity).unwrap();
        let change = panel.set_value(id, 3.2).unwrap();
        assert_eq!(change.binding, PanelBinding::EnvironmentMapIntensity);
        assert_eq!(change.value, 3.2);
        assert_eq!(change.previous, 1.0);
    }

    #[test]
    fn test_unchanged_value_reports_nothing() {
        let mut panel = panel();
        let id = panel.find(PanelBinding::BackgroundIntensity).unwrap();
        assert!(panel.set_value(id, 1.0).is_none());
        assert!(panel.set_value(id, f32::NAN).is_none());
    }

    #[test]
    fn test_values_clamp_to_range() {
        let mut panel = panel();
        let id = panel.find(PanelBinding::BackgroundBlurriness).unwrap();
        assert_eq!(panel.set_value(id, 4.0).unwrap().value, 1.0);
        assert_eq!(panel.set_value(id, -4.0).unwrap().value, 0.0);
    }

    #[test]
    fn test_step_snaps_values() {
        let mut panel = DebugPanel::new();
        let id = panel.add_slider(Slider::new("skybox radius", PanelBinding::SkyboxRadius, 1.0, 200.0, 120.0).with_step(0.1));
        let change = panel.set_value(id, 57.234).unwrap();
        assert_relative_eq!(change.value, 57.2, epsilon = 1e-3);
    }

    #[test]
    fn test_keyboard_navigation() {
        let mut panel = panel();
        assert_eq!(panel.selected(), panel.find(PanelBinding::BackgroundBlurriness));
        panel.select_next();
        panel.select_next();
        assert_eq!(panel.selected(), panel.find(PanelBinding::EnvironmentMapIntensity));

        let change = panel.nudge(1).unwrap();
        assert_relative_eq!(change.value, 1.1, epsilon = 1e-5);
        assert!(panel.summary().contains("envMapIntensity = 1.10"));

        panel.select_next();
        assert_eq!(panel.selected(), panel.find(PanelBinding::BackgroundBlurriness));
    }

    #[test]
    fn test_same_binding_replaces_slider() {
        let mut panel = panel();
        let first = panel.add_slider(Slider::new("skybox height", PanelBinding::SkyboxHeight, 1.0, 100.0, 11.0));
        let again = panel.add_slider(Slider::new("skybox height", PanelBinding::SkyboxHeight, 1.0, 100.0, 20.0));
        assert_eq!(first, again);
        assert_eq!(panel.len(), 4);
        assert_eq!(panel.slider(again).unwrap().value(), 20.0);
    }

    #[test]
    fn test_empty_panel_has_no_selection() {
        let mut panel = DebugPanel::new();
        assert!(panel.select_next().is_none());
        assert!(panel.nudge(1).is_none());
        assert!(panel.summary().is_empty());
    }
}
