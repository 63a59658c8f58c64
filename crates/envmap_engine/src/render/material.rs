//! Material definitions
//!
//! A [`Material`] is a tagged union over the shading models the viewer knows.
//! Standard and physical materials both count as "standard": they shade with
//! the environment map and carry an `env_map_intensity`. Basic materials are
//! unlit and ignore the environment.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec3;

/// Physically based metallic-roughness parameters
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    /// Linear RGB base colour
    pub color: Vec3,
    /// Opacity (0.0 - 1.0)
    pub opacity: f32,
    /// Metalness (0.0 - 1.0)
    pub metalness: f32,
    /// Roughness (0.0 - 1.0)
    pub roughness: f32,
    /// Emissive colour
    pub emissive: Vec3,
    /// Multiplier on light received from the scene environment map
    pub env_map_intensity: f32,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            opacity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            emissive: Vec3::zeros(),
            env_map_intensity: 1.0,
        }
    }
}

/// Standard material plus clearcoat and transmission layers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PhysicalMaterial {
    /// Base layer
    pub standard: StandardMaterial,
    /// Clearcoat layer strength (0.0 - 1.0)
    pub clearcoat: f32,
    /// Clearcoat roughness (0.0 - 1.0)
    pub clearcoat_roughness: f32,
    /// Transmission (0.0 - 1.0)
    pub transmission: f32,
}

/// Unlit colour
#[derive(Debug, Clone, PartialEq)]
pub struct BasicMaterial {
    /// Linear RGB colour
    pub color: Vec3,
    /// Opacity (0.0 - 1.0)
    pub opacity: f32,
}

impl Default for BasicMaterial {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            opacity: 1.0,
        }
    }
}

/// Supported shading models
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKind {
    /// Metallic-roughness PBR
    Standard(StandardMaterial),
    /// PBR with extra layers
    Physical(PhysicalMaterial),
    /// Unlit
    Basic(BasicMaterial),
}

/// Material attached to a mesh node
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Shading model and parameters
    pub kind: MaterialKind,
    /// Optional name for debugging
    pub name: Option<String>,
}

impl Material {
    /// Create a standard material
    pub fn standard(params: StandardMaterial) -> Self {
        Self {
            kind: MaterialKind::Standard(params),
            name: None,
        }
    }

    /// Create a physical material
    pub fn physical(params: PhysicalMaterial) -> Self {
        Self {
            kind: MaterialKind::Physical(params),
            name: None,
        }
    }

    /// Create an unlit material
    pub fn basic(params: BasicMaterial) -> Self {
        Self {
            kind: MaterialKind::Basic(params),
            name: None,
        }
    }

    /// Set the material name for debugging
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Standard parameters when this material is standard-classified
    pub fn as_standard(&self) -> Option<&StandardMaterial> {
        match &self.kind {
            MaterialKind::Standard(standard) => Some(standard),
            MaterialKind::Physical(physical) => Some(&physical.standard),
            MaterialKind::Basic(_) => None,
        }
    }

    /// Mutable standard parameters when this material is standard-classified
    pub fn as_standard_mut(&mut self) -> Option<&mut StandardMaterial> {
        match &mut self.kind {
            MaterialKind::Standard(standard) => Some(standard),
            MaterialKind::Physical(physical) => Some(&mut physical.standard),
            MaterialKind::Basic(_) => None,
        }
    }

    /// Whether the material shades with the environment map
    pub fn is_standard(&self) -> bool {
        self.as_standard().is_some()
    }

    /// GPU-facing parameter block
    pub fn uniforms(&self) -> MaterialUniforms {
        match &self.kind {
            MaterialKind::Basic(basic) => MaterialUniforms {
                base_color: [basic.color.x, basic.color.y, basic.color.z, basic.opacity],
                metalness: 0.0,
                roughness: 1.0,
                env_map_intensity: 0.0,
                unlit: 1,
            },
            MaterialKind::Standard(standard) => MaterialUniforms::from_standard(standard),
            MaterialKind::Physical(physical) => MaterialUniforms::from_standard(&physical.standard),
        }
    }
}

/// Material parameters laid out for a uniform buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// RGB colour and opacity
    pub base_color: [f32; 4],
    /// Metalness
    pub metalness: f32,
    /// Roughness
    pub roughness: f32,
    /// Environment-map intensity
    pub env_map_intensity: f32,
    /// 1 when the material ignores lighting
    pub unlit: u32,
}

impl MaterialUniforms {
    fn from_standard(standard: &StandardMaterial) -> Self {
        Self {
            base_color: [standard.color.x, standard.color.y, standard.color.z, standard.opacity],
            metalness: standard.metalness,
            roughness: standard.roughness,
            env_map_intensity: standard.env_map_intensity,
            unlit: 0,
        }
    }
}
