//! Scene setup from a [`SceneDescription`]
//!
//! Setup runs once, in a fixed order, before the first frame: programs,
//! camera, textures, materials, lights, objects, skybox. The first failure
//! aborts the whole setup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::assets::{ImageData, MtlData, MtlParser, ObjLoader, ShaderSource};
use crate::core::config::CameraConfig;
use crate::foundation::math::{to_radians, Vec3};
use crate::render::backend::{BufferHandle, ProgramHandle, RenderBackend};
use crate::render::mesh::VertexLayout;
use crate::render::{
    Camera, DrawableObject, Light, LightGroup, Material, RenderError, SharedMaterial, Skybox, Texture,
};
use crate::scene::description::{MaterialDesc, SceneDescription, TextureSource};
use crate::scene::{Scene, SceneError};

/// Loads scene assets relative to a root directory, parsing each file once
#[derive(Debug, Default)]
pub struct SceneAssets {
    root: PathBuf,
    mtl_files: HashMap<PathBuf, HashMap<String, MtlData>>,
}

impl SceneAssets {
    /// Resolve asset paths against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mtl_files: HashMap::new(),
        }
    }

    /// Asset root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of an asset
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Shader sources of a program directory
    pub fn shader(&self, dir: &Path) -> Result<ShaderSource, SceneError> {
        Ok(ShaderSource::load_dir(self.resolve(dir))?)
    }

    /// Pixels for a texture
    pub fn image(&self, source: &TextureSource) -> Result<ImageData, SceneError> {
        match source {
            TextureSource::File(path) => Ok(ImageData::from_file(self.resolve(path))?),
            TextureSource::Solid(color) => Ok(ImageData::solid_color(1, 1, *color)),
        }
    }

    /// A named material from an MTL file
    pub fn mtl_material(&mut self, file: &Path, name: &str) -> Result<&MtlData, SceneError> {
        if !self.mtl_files.contains_key(file) {
            let materials = MtlParser::load(self.resolve(file))?;
            self.mtl_files.insert(file.to_path_buf(), materials);
        }

        self.mtl_files
            .get(file)
            .and_then(|materials| materials.get(name))
            .ok_or_else(|| SceneError::MissingMtlMaterial {
                file: file.display().to_string(),
                name: name.to_string(),
            })
    }
}

/// Builds a [`Scene`] from a description
#[derive(Debug)]
pub struct SceneBuilder {
    assets: SceneAssets,
    camera: CameraConfig,
    aspect: f32,
    clear_color: [f32; 4],
    programs: HashMap<String, ProgramHandle>,
    meshes: HashMap<PathBuf, (BufferHandle, u32)>,
}

impl SceneBuilder {
    /// Create a builder
    ///
    /// # Arguments
    /// * `assets` - Loader for the files the description names
    /// * `camera` - Camera used when the description has none
    /// * `aspect` - Output width divided by height
    /// * `clear_color` - Color each frame is cleared to
    pub fn new(assets: SceneAssets, camera: CameraConfig, aspect: f32, clear_color: [f32; 4]) -> Self {
        Self {
            assets,
            camera,
            aspect,
            clear_color,
            programs: HashMap::new(),
            meshes: HashMap::new(),
        }
    }

    /// Compiled program by name, available once [`Self::build`] has run
    pub fn program(&self, name: &str) -> Option<ProgramHandle> {
        self.programs.get(name).copied()
    }

    fn lookup_program(&self, name: &str) -> Result<ProgramHandle, SceneError> {
        self.program(name)
            .ok_or_else(|| SceneError::UnknownProgram(name.to_string()))
    }

    /// Upload a mesh, reusing the buffer when the same file was loaded before
    fn mesh(&mut self, backend: &mut dyn RenderBackend, path: &Path) -> Result<(BufferHandle, u32), SceneError> {
        if let Some(mesh) = self.meshes.get(path) {
            return Ok(*mesh);
        }

        let geometry = ObjLoader::load(self.assets.resolve(path))?;
        let buffer = backend.create_vertex_buffer(geometry.as_floats(), VertexLayout::POSITION_TEX_NORMAL)?;
        let count = u32::try_from(geometry.vertex_count())
            .map_err(|_| RenderError::InvalidBuffer(format!("{} has too many vertices", path.display())))?;

        log::debug!("Uploaded {} ({count} vertices)", path.display());
        self.meshes.insert(path.to_path_buf(), (buffer, count));
        Ok((buffer, count))
    }

    fn camera(description: &SceneDescription, fallback: &CameraConfig, aspect: f32) -> Camera {
        let config = description.camera.as_ref().unwrap_or(fallback);
        let mut camera = Camera::new(config.near, config.far);
        camera.configure(
            &Vec3::from(config.eye),
            &Vec3::from(config.look),
            &Vec3::from(config.up),
            to_radians(config.fov_y_degrees),
            aspect,
        );
        camera
    }

    fn textures(
        &self,
        backend: &mut dyn RenderBackend,
        description: &SceneDescription,
    ) -> Result<HashMap<String, Texture>, SceneError> {
        let mut textures = HashMap::new();
        for (name, desc) in &description.textures {
            let image = self.assets.image(&desc.source)?;
            let texture = Texture::from_image(backend, &image, desc.unit, desc.options())?;
            log::debug!("Texture '{name}' on unit {}", desc.unit);
            textures.insert(name.clone(), texture);
        }
        Ok(textures)
    }

    fn materials(&mut self, description: &SceneDescription) -> Result<HashMap<String, SharedMaterial>, SceneError> {
        let mut materials = HashMap::new();
        for (name, desc) in &description.materials {
            let material = match desc {
                MaterialDesc::Phong { .. } => desc.to_phong(),
                MaterialDesc::Mtl {
                    file,
                    name: mtl_name,
                    ambient,
                    diffuse,
                } => {
                    let mut material = Material::from_mtl(self.assets.mtl_material(file, mtl_name)?);
                    if let Some(ambient) = ambient {
                        material = material.with_ambient(Vec3::from(*ambient));
                    }
                    if let Some(diffuse) = diffuse {
                        material = material.with_diffuse(Vec3::from(*diffuse));
                    }
                    Some(material)
                }
            };
            if let Some(material) = material {
                materials.insert(name.clone(), material.shared());
            }
        }
        Ok(materials)
    }

    /// Run the full setup. Programs stay available through
    /// [`Self::program`] afterwards.
    pub fn build(
        &mut self,
        backend: &mut dyn RenderBackend,
        description: &SceneDescription,
    ) -> Result<Scene, SceneError> {
        description.validate()?;

        for program in &description.programs {
            let source = self.assets.shader(&program.path)?;
            let handle = backend.create_program(&program.name, &source)?;
            self.programs.insert(program.name.clone(), handle);
        }
        log::info!("Compiled {} shading programs", self.programs.len());

        let mut scene = Scene::new(Self::camera(description, &self.camera, self.aspect), self.clear_color);
        for program in &description.programs {
            let handle = self.lookup_program(&program.name)?;
            if program.camera {
                scene.add_camera_program(handle);
            }
            if program.environment {
                scene.add_environment_program(handle);
            }
        }

        let textures = self.textures(backend, description)?;
        let materials = self.materials(description)?;

        for group in &description.light_groups {
            let lights = LightGroup::new(group.lights.iter().map(Light::from).collect());
            let programs = group
                .programs
                .iter()
                .map(|name| self.lookup_program(name))
                .collect::<Result<Vec<_>, _>>()?;
            scene.add_light_group(lights, programs);
        }

        for object in &description.objects {
            let program = self.lookup_program(&object.program)?;
            let (buffer, count) = self.mesh(backend, &object.mesh)?;
            let mut drawable = DrawableObject::new(program, buffer, count)
                .with_world_matrix(object.world_matrix()?)
                .with_blending(object.blended);

            if let Some(name) = &object.material {
                let material = materials
                    .get(name)
                    .ok_or_else(|| SceneError::UnknownMaterial(name.clone()))?;
                drawable = drawable.with_material(SharedMaterial::clone(material));
            }
            if let Some(binding) = &object.texture {
                let texture = textures
                    .get(&binding.name)
                    .ok_or_else(|| SceneError::UnknownTexture(binding.name.clone()))?;
                drawable = drawable.with_texture(*texture, binding.sampler.clone());
            }
            scene.add_object(drawable);
        }
        log::info!("Loaded {} objects", scene.object_count());

        if let Some(sky) = &description.skybox {
            let program = self.lookup_program(&sky.program)?;
            let (buffer, count) = self.mesh(backend, &sky.mesh)?;
            let texture = *textures
                .get(&sky.texture)
                .ok_or_else(|| SceneError::UnknownTexture(sky.texture.clone()))?;
            let skybox = Skybox::new(DrawableObject::new(program, buffer, count), texture);

            for name in &sky.share_with {
                skybox.share_texture(backend, self.lookup_program(name)?)?;
            }
            scene.set_skybox(skybox);
            log::info!("Skybox ready");
        }

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::CameraInput;
    use crate::render::backend::{RenderStateFlags, UniformValue};
    use crate::render::HeadlessBackend;
    use crate::scene::description::{
        LightDesc, LightGroupDesc, ObjectDesc, ProgramDesc, SkyboxDesc, TextureDesc, TextureRef, TransformOp,
    };
    use std::fs;

    const TRIANGLE_OBJ: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n";
    const QUAD_OBJ: &str = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
    const SHADER: &str = "void main() {}";

    /// A scratch asset directory removed on drop
    struct AssetDir(PathBuf);

    impl AssetDir {
        fn new(name: &str) -> Self {
            let root = std::env::temp_dir().join(format!("lumen_engine_{}_{name}", std::process::id()));
            for program in ["basic_shading", "sphere_mapping", "skybox"] {
                let dir = root.join("shader").join(program);
                fs::create_dir_all(&dir).unwrap();
                fs::write(dir.join("vertex.glsl"), SHADER).unwrap();
                fs::write(dir.join("fragment.glsl"), SHADER).unwrap();
            }
            fs::write(root.join("triangle.obj"), TRIANGLE_OBJ).unwrap();
            fs::write(root.join("quad.obj"), QUAD_OBJ).unwrap();
            fs::write(root.join("screen.mtl"), "newmtl Screen\nKa 0.5 0.5 0.5\nKd 0.1 0.1 0.1\nNs 8\n").unwrap();
            Self(root)
        }
    }

    impl Drop for AssetDir {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn program(name: &str, camera: bool, environment: bool) -> ProgramDesc {
        ProgramDesc {
            name: name.to_string(),
            path: PathBuf::from("shader").join(name),
            camera,
            environment,
        }
    }

    fn description() -> SceneDescription {
        let mut description = SceneDescription {
            programs: vec![
                program("basic_shading", true, false),
                program("sphere_mapping", true, true),
                program("skybox", true, false),
            ],
            ..SceneDescription::default()
        };
        description.materials.insert(
            "basic".to_string(),
            MaterialDesc::Phong {
                emission: [0.0; 3],
                ambient: [0.1; 3],
                diffuse: [0.8; 3],
                specular: [1.0; 3],
                shininess: 20.0,
            },
        );
        description.materials.insert(
            "screen".to_string(),
            MaterialDesc::Mtl {
                file: PathBuf::from("screen.mtl"),
                name: "Screen".to_string(),
                ambient: None,
                diffuse: Some([0.8; 3]),
            },
        );
        description.textures.insert(
            "sky".to_string(),
            TextureDesc {
                source: TextureSource::Solid([10, 20, 200, 255]),
                unit: 0,
                mipmaps: false,
                anisotropic: false,
            },
        );
        description.light_groups.push(LightGroupDesc {
            lights: vec![LightDesc {
                position: [0.0, 0.0, -1.0, 0.0],
                ambient: [1.0; 3],
                diffuse: [0.0, 0.0, 1.0],
                specular: [0.0, 0.0, 1.0],
            }],
            programs: vec!["basic_shading".to_string()],
        });
        for offset in [[1.0, 0.0, 2.0], [-3.0, 0.0, 5.0]] {
            description.objects.push(ObjectDesc {
                mesh: PathBuf::from("triangle.obj"),
                program: "basic_shading".to_string(),
                material: Some("basic".to_string()),
                texture: None,
                transform: vec![TransformOp::Translate(offset), TransformOp::Scale([0.3; 3])],
                blended: false,
            });
        }
        description.objects.push(ObjectDesc {
            mesh: PathBuf::from("quad.obj"),
            program: "basic_shading".to_string(),
            material: Some("screen".to_string()),
            texture: Some(TextureRef {
                name: "sky".to_string(),
                sampler: "u_texture".to_string(),
            }),
            transform: Vec::new(),
            blended: true,
        });
        description.skybox = Some(SkyboxDesc {
            mesh: PathBuf::from("triangle.obj"),
            program: "skybox".to_string(),
            texture: "sky".to_string(),
            share_with: vec!["sphere_mapping".to_string()],
        });
        description
    }

    fn builder(dir: &AssetDir) -> SceneBuilder {
        SceneBuilder::new(SceneAssets::new(&dir.0), CameraConfig::default(), 16.0 / 9.0, [0.8, 0.8, 0.8, 1.0])
    }

    #[test]
    fn test_build_and_render() {
        let dir = AssetDir::new("build_and_render");
        let mut backend = HeadlessBackend::new();
        let mut builder = builder(&dir);

        let mut scene = builder.build(&mut backend, &description()).unwrap();
        assert_eq!(scene.object_count(), 3);
        assert!(scene.camera().is_configured());
        assert!(scene.skybox().is_some());

        let mapping = builder.program("sphere_mapping").unwrap();
        assert_eq!(backend.uniform(mapping, "u_skybox"), Some(&UniformValue::Int(0)));

        backend.take_commands();
        scene.render(&mut backend, &CameraInput::default()).unwrap();

        // Skybox, two teapot stand-ins, then the blended screen
        let draws: Vec<_> = backend.draw_calls().collect();
        assert_eq!(draws.len(), 4);
        assert_eq!(draws[1].count, 3);
        assert_eq!(draws[3].count, 6);
        assert!(draws[3].state.contains(RenderStateFlags::BLEND));

        let basic = builder.program("basic_shading").unwrap();
        assert_eq!(backend.uniform(basic, "u_lightCount"), Some(&UniformValue::Int(1)));
        assert!(backend.uniform(mapping, "u_camDir").is_some());
        assert!(backend.uniform(basic, "u_camDir").is_none());
    }

    #[test]
    fn test_meshes_upload_once() {
        let dir = AssetDir::new("meshes_upload_once");
        let mut backend = HeadlessBackend::new();
        let mut scene = builder(&dir).build(&mut backend, &description()).unwrap();

        scene.render(&mut backend, &CameraInput::default()).unwrap();
        let draws: Vec<_> = backend.draw_calls().collect();
        // The skybox and both triangles share one buffer
        assert_eq!(draws[0].buffer, draws[1].buffer);
        assert_eq!(draws[1].buffer, draws[2].buffer);
        assert_ne!(draws[2].buffer, draws[3].buffer);
    }

    #[test]
    fn test_mtl_material_with_override() {
        let dir = AssetDir::new("mtl_override");
        let mut builder = builder(&dir);
        let materials = builder.materials(&description()).unwrap();

        let screen = materials["screen"].borrow();
        assert_eq!(screen.ambient, Vec3::repeat(0.5));
        assert_eq!(screen.diffuse, Vec3::repeat(0.8));
        assert!((screen.shininess - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_mtl_material() {
        let dir = AssetDir::new("missing_mtl");
        let mut assets = SceneAssets::new(&dir.0);
        assert!(matches!(
            assets.mtl_material(Path::new("screen.mtl"), "Glass"),
            Err(SceneError::MissingMtlMaterial { .. })
        ));
    }

    #[test]
    fn test_missing_shader_aborts_setup() {
        let dir = AssetDir::new("missing_shader");
        let mut description = description();
        description.programs.push(program("video", true, false));

        let mut backend = HeadlessBackend::new();
        let result = builder(&dir).build(&mut backend, &description);
        assert!(matches!(result, Err(SceneError::Asset(_))));
        assert!(backend.draw_calls().next().is_none());
    }
}
