//! Serializable scene description
//!
//! A scene file names the shading programs, materials, textures, lights,
//! objects and skybox of a scene. Paths are relative to the assets directory.
//! Cross references (an object's program, material or texture) are by name
//! and are checked by [`SceneDescription::validate`] before anything is
//! loaded.
//!
//! ```ron
//! (
//!     programs: [(name: "basic_shading", path: "shader/basic_shading", camera: true)],
//!     materials: {"basic": Phong(ambient: (0.1, 0.1, 0.1), diffuse: (0.8, 0.8, 0.8),
//!                                specular: (1.0, 1.0, 1.0), shininess: 20.0)},
//!     objects: [(mesh: "teapot.obj", program: "basic_shading", material: Some("basic"),
//!                transform: [Translate((1.0, 0.0, 2.0)), Scale((0.3, 0.3, 0.3))])],
//! )
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::config::CameraConfig;
use crate::foundation::math::{mat4, to_radians, vec3, Mat4, Vec3, Vec4};
use crate::render::{Light, Material, TextureOptions};
use crate::scene::SceneError;

/// A shading program and the per-frame inputs it receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDesc {
    /// Name other entries refer to
    pub name: String,
    /// Directory holding `vertex.glsl` and `fragment.glsl`
    pub path: PathBuf,
    /// Receives camera matrices every frame
    #[serde(default)]
    pub camera: bool,
    /// Receives the camera direction every frame
    #[serde(default)]
    pub environment: bool,
}

/// Material source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialDesc {
    /// Explicit Phong parameters
    Phong {
        /// Emitted color
        #[serde(default)]
        emission: [f32; 3],
        /// Ambient reflectance
        ambient: [f32; 3],
        /// Diffuse reflectance
        diffuse: [f32; 3],
        /// Specular reflectance
        specular: [f32; 3],
        /// Specular exponent
        shininess: f32,
    },
    /// A named material from an MTL file, with optional overrides
    Mtl {
        /// MTL file
        file: PathBuf,
        /// `newmtl` name inside the file
        name: String,
        /// Replaces the file's ambient reflectance
        #[serde(default)]
        ambient: Option<[f32; 3]>,
        /// Replaces the file's diffuse reflectance
        #[serde(default)]
        diffuse: Option<[f32; 3]>,
    },
}

impl MaterialDesc {
    /// Material for the `Phong` variant, `None` for MTL references
    pub fn to_phong(&self) -> Option<Material> {
        match self {
            Self::Phong {
                emission,
                ambient,
                diffuse,
                specular,
                shininess,
            } => Some(Material::new(
                Vec3::from(*emission),
                Vec3::from(*ambient),
                Vec3::from(*diffuse),
                Vec3::from(*specular),
                *shininess,
            )),
            Self::Mtl { .. } => None,
        }
    }
}

/// Where texture pixels come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextureSource {
    /// An image file
    File(PathBuf),
    /// A single RGBA texel
    Solid([u8; 4]),
}

/// A texture and the unit it occupies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureDesc {
    /// Pixel source
    pub source: TextureSource,
    /// Texture unit
    pub unit: u32,
    /// Generate mipmaps
    #[serde(default)]
    pub mipmaps: bool,
    /// Use anisotropic filtering
    #[serde(default)]
    pub anisotropic: bool,
}

impl TextureDesc {
    /// Upload options
    pub fn options(&self) -> TextureOptions {
        TextureOptions {
            mipmaps: self.mipmaps,
            anisotropic: self.anisotropic,
        }
    }
}

/// A texture reference from an object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRef {
    /// Texture name
    pub name: String,
    /// Sampler uniform on the object's program
    pub sampler: String,
}

/// One step of an object's world transform. Steps post-multiply in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransformOp {
    /// Translate by an offset
    Translate([f32; 3]),
    /// Scale per axis
    Scale([f32; 3]),
    /// Rotate about an axis, in degrees
    Rotate {
        /// Angle in degrees
        degrees: f32,
        /// Rotation axis, normalized on use
        axis: [f32; 3],
    },
}

impl TransformOp {
    /// Post-multiply this step onto `world`
    pub fn apply(&self, world: &Mat4) -> Result<Mat4, SceneError> {
        match self {
            Self::Translate(offset) => Ok(mat4::translate(world, &Vec3::from(*offset))),
            Self::Scale(factors) => Ok(mat4::scale(world, &Vec3::from(*factors))),
            Self::Rotate { degrees, axis } => {
                let axis = vec3::try_normalized(&Vec3::from(*axis))
                    .ok_or_else(|| SceneError::InvalidTransform(format!("rotation axis {axis:?} has no direction")))?;
                Ok(mat4::rotate(world, to_radians(*degrees), &axis))
            }
        }
    }
}

/// A drawable object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDesc {
    /// OBJ file
    pub mesh: PathBuf,
    /// Program name
    pub program: String,
    /// Material name
    #[serde(default)]
    pub material: Option<String>,
    /// Texture sampled on every draw
    #[serde(default)]
    pub texture: Option<TextureRef>,
    /// World transform steps, applied to identity in order
    #[serde(default)]
    pub transform: Vec<TransformOp>,
    /// Draw in the blended pass
    #[serde(default)]
    pub blended: bool,
}

impl ObjectDesc {
    /// Fold the transform steps into a world matrix
    pub fn world_matrix(&self) -> Result<Mat4, SceneError> {
        self.transform
            .iter()
            .try_fold(mat4::identity(), |world, op| op.apply(&world))
    }
}

/// A light, in homogeneous form (`w = 0` directional, `w = 1` point)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightDesc {
    /// Position or direction
    pub position: [f32; 4],
    /// Ambient contribution
    pub ambient: [f32; 3],
    /// Diffuse contribution
    pub diffuse: [f32; 3],
    /// Specular contribution
    pub specular: [f32; 3],
}

impl From<&LightDesc> for Light {
    fn from(desc: &LightDesc) -> Self {
        Self::new(
            Vec4::from(desc.position),
            Vec3::from(desc.ambient),
            Vec3::from(desc.diffuse),
            Vec3::from(desc.specular),
        )
    }
}

/// Lights shared by a set of programs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightGroupDesc {
    /// Lights in slot order
    pub lights: Vec<LightDesc>,
    /// Program names
    pub programs: Vec<String>,
}

/// Sky sphere
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkyboxDesc {
    /// Sphere OBJ file
    pub mesh: PathBuf,
    /// Program name
    pub program: String,
    /// Texture name
    pub texture: String,
    /// Programs that also sample the sky texture
    #[serde(default)]
    pub share_with: Vec<String>,
}

/// Complete scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// Shading programs, compiled in order
    pub programs: Vec<ProgramDesc>,
    /// Materials by name
    pub materials: BTreeMap<String, MaterialDesc>,
    /// Textures by name
    pub textures: BTreeMap<String, TextureDesc>,
    /// Light groups
    pub light_groups: Vec<LightGroupDesc>,
    /// Objects in draw order
    pub objects: Vec<ObjectDesc>,
    /// Sky sphere
    pub skybox: Option<SkyboxDesc>,
    /// Camera placement; the application's camera configuration when absent
    pub camera: Option<CameraConfig>,
}

impl SceneDescription {
    /// Check that every name an entry refers to is defined
    pub fn validate(&self) -> Result<(), SceneError> {
        let mut programs = HashSet::new();
        for program in &self.programs {
            if !programs.insert(program.name.as_str()) {
                return Err(SceneError::DuplicateName(program.name.clone()));
            }
        }

        let check_program = |name: &String| {
            if programs.contains(name.as_str()) {
                Ok(())
            } else {
                Err(SceneError::UnknownProgram(name.clone()))
            }
        };
        let check_texture = |name: &String| {
            if self.textures.contains_key(name) {
                Ok(())
            } else {
                Err(SceneError::UnknownTexture(name.clone()))
            }
        };

        for object in &self.objects {
            check_program(&object.program)?;
            if let Some(material) = &object.material {
                if !self.materials.contains_key(material) {
                    return Err(SceneError::UnknownMaterial(material.clone()));
                }
            }
            if let Some(texture) = &object.texture {
                check_texture(&texture.name)?;
            }
        }

        for group in &self.light_groups {
            group.programs.iter().try_for_each(check_program)?;
        }

        if let Some(skybox) = &self.skybox {
            check_program(&skybox.program)?;
            check_texture(&skybox.texture)?;
            skybox.share_with.iter().try_for_each(check_program)?;
        }

        if let Some(camera) = &self.camera {
            camera.validate()?;
        }
        Ok(())
    }
}

impl Config for SceneDescription {}
