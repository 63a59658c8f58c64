//! Textures and environment maps
//!
//! LDR images (PNG, JPEG) decode to 8-bit sRGB; Radiance HDR and OpenEXR
//! decode to 32-bit float linear. The file extension picks the decoder.

use std::path::Path;

use image::ImageFormat;

use super::AssetError;
use crate::config::EnvironmentSource;

/// Decoded pixel storage, always RGBA
#[derive(Debug, Clone, PartialEq)]
pub enum TexturePixels {
    /// 8 bits per channel
    Rgba8(Vec<u8>),
    /// 32-bit float per channel
    Rgba32F(Vec<f32>),
}

/// How stored colour values are encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Gamma-encoded sRGB
    Srgb,
    /// Linear
    Linear,
}

/// How a texture is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureMapping {
    /// Regular UV mapping
    Uv,
    /// Reflection lookup into an equirectangular panorama
    EquirectangularReflection,
    /// Reflection lookup into a cube map
    CubeReflection,
}

/// 2D texture
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel data
    pub pixels: TexturePixels,
    /// Encoding of the stored values
    pub color_space: ColorSpace,
    /// Sampling mode
    pub mapping: TextureMapping,
}

impl Texture {
    /// Load an image file, picking the decoder from its extension
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let format = supported_format(path)?;
        let bytes = std::fs::read(path).map_err(|e| AssetError::from_io(path, e))?;
        Self::decode(path, &bytes, format)
    }

    /// Decode in-memory bytes; `path` is only used for error reporting
    pub fn decode(path: &Path, bytes: &[u8], format: ImageFormat) -> Result<Self, AssetError> {
        let image = image::load_from_memory_with_format(bytes, format).map_err(|e| AssetError::LoadFailed {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;

        let texture = match format {
            ImageFormat::Hdr | ImageFormat::OpenExr => {
                let rgba = image.to_rgba32f();
                let (width, height) = rgba.dimensions();
                Self {
                    width,
                    height,
                    pixels: TexturePixels::Rgba32F(rgba.into_raw()),
                    color_space: ColorSpace::Linear,
                    mapping: TextureMapping::Uv,
                }
            }
            _ => {
                let rgba = image.to_rgba8();
                let (width, height) = rgba.dimensions();
                Self {
                    width,
                    height,
                    pixels: TexturePixels::Rgba8(rgba.into_raw()),
                    color_space: ColorSpace::Srgb,
                    mapping: TextureMapping::Uv,
                }
            }
        };

        log::debug!("Decoded {:?} image {}x{} from {}", format, texture.width, texture.height, path.display());
        Ok(texture)
    }

    /// Single-colour texture
    pub fn solid(width: u32, height: u32, color: [u8; 4], color_space: ColorSpace) -> Self {
        let pixel_count = (width * height) as usize;
        Self {
            width,
            height,
            pixels: TexturePixels::Rgba8(color.repeat(pixel_count)),
            color_space,
            mapping: TextureMapping::Uv,
        }
    }

    /// Builder: set the sampling mode
    #[must_use]
    pub fn with_mapping(mut self, mapping: TextureMapping) -> Self {
        self.mapping = mapping;
        self
    }

    /// Whether the pixels are floating point
    pub fn is_hdr(&self) -> bool {
        matches!(self.pixels, TexturePixels::Rgba32F(_))
    }

    /// RGBA of the pixel at (x, y) as floats, `None` outside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 4) as usize;
        match &self.pixels {
            TexturePixels::Rgba8(data) => {
                let p = data.get(offset..offset + 4)?;
                Some([p[0], p[1], p[2], p[3]].map(|c| f32::from(c) / 255.0))
            }
            TexturePixels::Rgba32F(data) => {
                let p = data.get(offset..offset + 4)?;
                Some([p[0], p[1], p[2], p[3]])
            }
        }
    }
}

/// Six square faces of equal size in +X, -X, +Y, -Y, +Z, -Z order
#[derive(Debug, Clone, PartialEq)]
pub struct CubeTexture {
    faces: [Texture; 6],
}

impl CubeTexture {
    /// Load six face images
    pub fn load(paths: &[impl AsRef<Path>; 6]) -> Result<Self, AssetError> {
        let mut faces = Vec::with_capacity(6);
        for path in paths {
            faces.push(Texture::load(path.as_ref())?);
        }
        let faces: [Texture; 6] = faces.try_into().map_err(|_| AssetError::InvalidData {
            path: paths[0].as_ref().to_path_buf(),
            reason: "cube map needs exactly six faces".to_string(),
        })?;
        Self::from_faces(faces, paths[0].as_ref())
    }

    /// Validate and wrap already-decoded faces
    pub fn from_faces(faces: [Texture; 6], origin: &Path) -> Result<Self, AssetError> {
        let size = faces[0].width;
        for (index, face) in faces.iter().enumerate() {
            if face.width != face.height {
                return Err(AssetError::InvalidData {
                    path: origin.to_path_buf(),
                    reason: format!("cube face {index} is {}x{}, faces must be square", face.width, face.height),
                });
            }
            if face.width != size {
                return Err(AssetError::InvalidData {
                    path: origin.to_path_buf(),
                    reason: format!("cube face {index} is {}px, expected {size}px", face.width),
                });
            }
        }
        Ok(Self { faces })
    }

    /// Edge length of every face
    pub fn size(&self) -> u32 {
        self.faces[0].width
    }
}

/// Map used for image-based lighting and backgrounds
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentMap {
    /// Equirectangular panorama
    Equirectangular(Texture),
    /// Cube map
    Cube(CubeTexture),
}

impl EnvironmentMap {
    /// 1x1 mid-grey panorama, used when the real map fails to load
    pub fn neutral() -> Self {
        Self::Equirectangular(
            Texture::solid(1, 1, [128, 128, 128, 255], ColorSpace::Srgb)
                .with_mapping(TextureMapping::EquirectangularReflection),
        )
    }

    /// Sampling mode of the map
    pub fn mapping(&self) -> TextureMapping {
        match self {
            Self::Equirectangular(texture) => texture.mapping,
            Self::Cube(_) => TextureMapping::CubeReflection,
        }
    }

    /// Width and height of the panorama, or face size twice for cubes
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::Equirectangular(texture) => (texture.width, texture.height),
            Self::Cube(cube) => (cube.size(), cube.size()),
        }
    }

    /// Whether the map holds floating-point radiance
    pub fn is_hdr(&self) -> bool {
        match self {
            Self::Equirectangular(texture) => texture.is_hdr(),
            Self::Cube(cube) => cube.faces[0].is_hdr(),
        }
    }
}

/// Load the configured environment map, resolving paths against `root`.
///
/// Returns `Ok(None)` for [`EnvironmentSource::None`].
pub fn load_environment(source: &EnvironmentSource, root: &Path) -> Result<Option<EnvironmentMap>, AssetError> {
    let resolve = |relative: &str| root.join(relative.trim_start_matches('/'));

    let map = match source {
        EnvironmentSource::Equirectangular { path }
        | EnvironmentSource::Hdr { path, .. }
        | EnvironmentSource::Exr { path } => {
            let texture = Texture::load(&resolve(path))?.with_mapping(TextureMapping::EquirectangularReflection);
            EnvironmentMap::Equirectangular(texture)
        }
        EnvironmentSource::Cube { faces } => {
            let paths = faces.clone().map(|face| resolve(&face));
            EnvironmentMap::Cube(CubeTexture::load(&paths)?)
        }
        EnvironmentSource::None => return Ok(None),
    };

    let (width, height) = map.dimensions();
    log::info!(
        "Loaded {} environment map {}x{}",
        if map.is_hdr() { "HDR" } else { "LDR" },
        width,
        height
    );
    Ok(Some(map))
}

fn supported_format(path: &Path) -> Result<ImageFormat, AssetError> {
    match ImageFormat::from_path(path) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Hdr | ImageFormat::OpenExr)) => Ok(format),
        _ => Err(AssetError::UnsupportedFormat { path: path.to_path_buf() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{scratch_dir, write_exr, write_hdr, write_png};
    use approx::assert_relative_eq;

    #[test]
    fn test_png_loads_as_srgb_rgba8() {
        let dir = scratch_dir("png");
        let path = dir.join("sky.png");
        write_png(&path, 4, 2, [255, 0, 0, 255]);

        let texture = Texture::load(&path).unwrap();
        assert_eq!((texture.width, texture.height), (4, 2));
        assert_eq!(texture.color_space, ColorSpace::Srgb);
        assert!(!texture.is_hdr());
        assert_eq!(texture.pixel(3, 1), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(texture.pixel(4, 0), None);
    }

    #[test]
    fn test_hdr_loads_as_linear_float() {
        let dir = scratch_dir("hdr");
        let path = dir.join("sky.hdr");
        write_hdr(&path);

        let texture = Texture::load(&path).unwrap();
        assert_eq!((texture.width, texture.height), (2, 1));
        assert_eq!(texture.color_space, ColorSpace::Linear);
        assert!(texture.is_hdr());
        let pixel = texture.pixel(1, 0).unwrap();
        assert_relative_eq!(pixel[0], 1.0, epsilon = 1e-4);
        assert_relative_eq!(pixel[3], 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_exr_loads_as_linear_float() {
        let dir = scratch_dir("exr");
        write_exr(&dir.join("studio.exr"), [2.5, 0.5, 0.25, 1.0]);

        let map = load_environment(&EnvironmentSource::Exr { path: "studio.exr".into() }, &dir)
            .unwrap()
            .unwrap();
        assert!(map.is_hdr());
        assert_eq!(map.dimensions(), (2, 2));
        assert_eq!(map.mapping(), TextureMapping::EquirectangularReflection);

        let EnvironmentMap::Equirectangular(texture) = map else {
            panic!("exr source should load as a panorama");
        };
        assert_eq!(texture.color_space, ColorSpace::Linear);
        let pixel = texture.pixel(1, 1).unwrap();
        assert_relative_eq!(pixel[0], 2.5, epsilon = 1e-3);
        assert_relative_eq!(pixel[2], 0.25, epsilon = 1e-3);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = scratch_dir("missing");
        let result = Texture::load(&dir.join("nope.jpg"));
        assert!(matches!(result, Err(AssetError::NotFound { .. })));
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let result = Texture::load(Path::new("sky.txt"));
        assert!(matches!(result, Err(AssetError::UnsupportedFormat { .. })));
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let dir = scratch_dir("garbage");
        let path = dir.join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(Texture::load(&path), Err(AssetError::LoadFailed { .. })));
    }

    #[test]
    fn test_cube_faces_must_match() {
        let dir = scratch_dir("cube");
        let names = ["px", "nx", "py", "ny", "pz", "nz"];
        let paths = names.map(|name| dir.join(format!("{name}.png")));
        for path in &paths {
            write_png(path, 4, 4, [10, 20, 30, 255]);
        }
        assert_eq!(CubeTexture::load(&paths).unwrap().size(), 4);

        write_png(&paths[3], 8, 8, [10, 20, 30, 255]);
        assert!(matches!(CubeTexture::load(&paths), Err(AssetError::InvalidData { .. })));

        write_png(&paths[3], 4, 2, [10, 20, 30, 255]);
        assert!(matches!(CubeTexture::load(&paths), Err(AssetError::InvalidData { .. })));
    }

    #[test]
    fn test_environment_sources() {
        let dir = scratch_dir("environment");
        write_png(&dir.join("ldr.png"), 8, 4, [200, 200, 200, 255]);
        write_hdr(&dir.join("sky.hdr"));

        let ldr = load_environment(&EnvironmentSource::Equirectangular { path: "/ldr.png".into() }, &dir)
            .unwrap()
            .unwrap();
        assert_eq!(ldr.mapping(), TextureMapping::EquirectangularReflection);
        assert!(!ldr.is_hdr());

        let hdr = load_environment(&EnvironmentSource::Hdr { path: "sky.hdr".into(), skybox: None }, &dir)
            .unwrap()
            .unwrap();
        assert!(hdr.is_hdr());

        assert!(load_environment(&EnvironmentSource::None, &dir).unwrap().is_none());
    }

    #[test]
    fn test_cube_source_uses_cube_reflection() {
        let dir = scratch_dir("cube_source");
        let faces = ["px", "nx", "py", "ny", "pz", "nz"].map(|name| format!("cube/{name}.png"));
        for face in &faces {
            write_png(&dir.join(face), 4, 4, [40, 80, 120, 255]);
        }

        let map = load_environment(&EnvironmentSource::Cube { faces }, &dir).unwrap().unwrap();
        assert_eq!(map.mapping(), TextureMapping::CubeReflection);
        assert_eq!(map.dimensions(), (4, 4));
        assert!(!map.is_hdr());
    }

    #[test]
    fn test_neutral_map_is_grey() {
        let EnvironmentMap::Equirectangular(texture) = EnvironmentMap::neutral() else {
            panic!("neutral map should be a panorama");
        };
        let pixel = texture.pixel(0, 0).unwrap();
        assert_relative_eq!(pixel[0], 128.0 / 255.0);
    }
}
