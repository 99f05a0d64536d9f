//! Scene composition
//!
//! A [`Scene`] owns everything drawn in a frame: the camera, the drawable
//! objects, the light groups and an optional skybox. It also records which
//! programs need which per-frame inputs.
//!
//! ## Frame order
//!
//! ```text
//! clear
//!   -> camera view from base view + input (zoom, rotation)
//!   -> camera matrices to every camera program
//!   -> light groups to their programs
//!   -> camera direction to every environment program
//!   -> skybox
//!   -> opaque objects
//!   -> blended objects (blending on, depth writes off)
//! ```
//!
//! Objects are stored in a slot map so setup and animation code can hold an
//! [`ObjectKey`] and edit world matrices and materials between frames.

pub mod builder;
pub mod description;

use slotmap::SlotMap;

use crate::assets::AssetError;
use crate::config::ConfigError;
use crate::foundation::math::{mat4, Mat4, Vec3};
use crate::input::CameraInput;
use crate::render::backend::{ProgramHandle, RenderBackend, RenderStateFlags, UniformValue};
use crate::render::{Camera, DrawableObject, LightGroup, RenderError, RenderResult, Skybox};

pub use builder::{SceneAssets, SceneBuilder};
pub use description::SceneDescription;

/// Scene setup errors
#[derive(thiserror::Error, Debug)]
pub enum SceneError {
    /// An asset failed to load
    #[error(transparent)]
    Asset(#[from] AssetError),

    /// A backend resource could not be created
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The scene file could not be read or holds invalid values
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Two programs share a name
    #[error("Duplicate program name '{0}'")]
    DuplicateName(String),

    /// A reference to an undefined program
    #[error("Unknown program '{0}'")]
    UnknownProgram(String),

    /// A reference to an undefined material
    #[error("Unknown material '{0}'")]
    UnknownMaterial(String),

    /// A reference to an undefined texture
    #[error("Unknown texture '{0}'")]
    UnknownTexture(String),

    /// An MTL file lacks the requested material
    #[error("Material '{name}' not found in {file}")]
    MissingMtlMaterial {
        /// MTL file
        file: String,
        /// Requested `newmtl` name
        name: String,
    },

    /// A transform step cannot be applied
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),
}

/// Uniform receiving the camera direction on environment-mapping programs
pub const CAMERA_DIRECTION_UNIFORM: &str = "u_camDir";

slotmap::new_key_type! {
    /// Stable handle to an object in a [`Scene`]
    pub struct ObjectKey;
}

/// A light group and the programs it lights
#[derive(Debug, Clone, Default)]
pub struct LitPrograms {
    /// Lights in slot order
    pub lights: LightGroup,
    /// Programs receiving the lights each frame
    pub programs: Vec<ProgramHandle>,
}

/// Everything drawn in one frame
#[derive(Debug)]
pub struct Scene {
    camera: Camera,
    base_view: Mat4,
    has_base_view: bool,
    clear_color: [f32; 4],
    objects: SlotMap<ObjectKey, DrawableObject>,
    draw_order: Vec<ObjectKey>,
    camera_programs: Vec<ProgramHandle>,
    environment_programs: Vec<ProgramHandle>,
    light_groups: Vec<LitPrograms>,
    skybox: Option<Skybox>,
}

impl Scene {
    /// Create an empty scene. The camera's current view becomes the base
    /// view that per-frame input is applied on top of. A camera without a
    /// view keeps failing to apply until [`Scene::set_base_view`] is called.
    pub fn new(camera: Camera, clear_color: [f32; 4]) -> Self {
        let base_view = *camera.view_matrix();
        let has_base_view = camera.has_view();
        Self {
            camera,
            base_view,
            has_base_view,
            clear_color,
            objects: SlotMap::with_key(),
            draw_order: Vec::new(),
            camera_programs: Vec::new(),
            environment_programs: Vec::new(),
            light_groups: Vec::new(),
            skybox: None,
        }
    }

    /// Scene camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// View matrix before input is applied
    pub fn base_view(&self) -> &Mat4 {
        &self.base_view
    }

    /// Replace the base view
    pub fn set_base_view(&mut self, view: Mat4) {
        self.base_view = view;
        self.has_base_view = true;
    }

    /// Color the frame is cleared to
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Add an object; objects draw in insertion order within their pass
    pub fn add_object(&mut self, object: DrawableObject) -> ObjectKey {
        let key = self.objects.insert(object);
        self.draw_order.push(key);
        key
    }

    /// Remove an object
    pub fn remove_object(&mut self, key: ObjectKey) -> Option<DrawableObject> {
        let object = self.objects.remove(key)?;
        self.draw_order.retain(|k| *k != key);
        Some(object)
    }

    /// Look up an object
    pub fn object(&self, key: ObjectKey) -> Option<&DrawableObject> {
        self.objects.get(key)
    }

    /// Look up an object for editing
    pub fn object_mut(&mut self, key: ObjectKey) -> Option<&mut DrawableObject> {
        self.objects.get_mut(key)
    }

    /// Number of objects, not counting the skybox
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Send camera matrices to `program` every frame
    pub fn add_camera_program(&mut self, program: ProgramHandle) {
        if !self.camera_programs.contains(&program) {
            self.camera_programs.push(program);
        }
    }

    /// Send the camera direction to `program` every frame
    pub fn add_environment_program(&mut self, program: ProgramHandle) {
        if !self.environment_programs.contains(&program) {
            self.environment_programs.push(program);
        }
    }

    /// Light `programs` with `lights`; returns the group's index
    pub fn add_light_group(&mut self, lights: LightGroup, programs: Vec<ProgramHandle>) -> usize {
        self.light_groups.push(LitPrograms { lights, programs });
        self.light_groups.len() - 1
    }

    /// Light group at `index`
    pub fn light_group(&self, index: usize) -> Option<&LitPrograms> {
        self.light_groups.get(index)
    }

    /// Light group at `index`, for editing or reordering lights
    pub fn light_group_mut(&mut self, index: usize) -> Option<&mut LitPrograms> {
        self.light_groups.get_mut(index)
    }

    /// Install the skybox
    pub fn set_skybox(&mut self, skybox: Skybox) {
        self.skybox = Some(skybox);
    }

    /// Installed skybox
    pub fn skybox(&self) -> Option<&Skybox> {
        self.skybox.as_ref()
    }

    /// View matrix for the given input: the base view translated along `-Z`
    /// by the zoom, then rotated about `Y` by the rotation
    pub fn input_view(&self, input: &CameraInput) -> Mat4 {
        let zoomed = mat4::translate(&self.base_view, &Vec3::new(0.0, 0.0, -input.zoom()));
        mat4::rotate(&zoomed, input.rotation(), &Vec3::y())
    }

    /// Draw one frame into the currently bound render target
    pub fn render(&mut self, backend: &mut dyn RenderBackend, input: &CameraInput) -> RenderResult<()> {
        backend.clear(self.clear_color);

        if self.has_base_view {
            let view = self.input_view(input);
            self.camera.set_view(view);
        }
        for &program in &self.camera_programs {
            self.camera.apply(backend, program)?;
        }

        for group in &self.light_groups {
            for &program in &group.programs {
                group.lights.apply(backend, program)?;
            }
        }

        let direction = self.camera.direction();
        for &program in &self.environment_programs {
            backend.set_uniform(program, CAMERA_DIRECTION_UNIFORM, UniformValue::Vec3(direction))?;
        }

        if let Some(skybox) = &self.skybox {
            skybox.draw(backend)?;
        }

        let (blended, opaque): (Vec<&DrawableObject>, Vec<&DrawableObject>) = self
            .draw_order
            .iter()
            .filter_map(|key| self.objects.get(*key))
            .partition(|object| object.is_blended());

        for object in opaque {
            object.draw(backend, Some(&self.camera))?;
        }

        if !blended.is_empty() {
            backend.set_state(RenderStateFlags::BLEND, true);
            backend.set_state(RenderStateFlags::DEPTH_WRITE, false);

            let result = blended
                .into_iter()
                .try_for_each(|object| object.draw(backend, Some(&self.camera)));

            backend.set_state(RenderStateFlags::DEPTH_WRITE, true);
            backend.set_state(RenderStateFlags::BLEND, false);
            result?;
        }

        log::trace!("Scene rendered {} objects", self.objects.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{ImageData, ShaderSource};
    use crate::core::config::InputConfig;
    use crate::foundation::math::to_radians;
    use crate::input::CameraAction;
    use crate::render::backend::TextureOptions;
    use crate::render::headless::BackendCommand;
    use crate::render::mesh::{Geometry, Vertex};
    use crate::render::{HeadlessBackend, Light, RenderError, Texture};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn program(backend: &mut HeadlessBackend, name: &str) -> ProgramHandle {
        backend
            .create_program(name, &ShaderSource::new("void main() {}", "void main() {}"))
            .unwrap()
    }

    fn object(backend: &mut HeadlessBackend, program: ProgramHandle) -> DrawableObject {
        DrawableObject::from_geometry(backend, program, &Geometry::new(vec![Vertex::default(); 3])).unwrap()
    }

    fn camera() -> Camera {
        let mut camera = Camera::default();
        camera.configure(
            &Vec3::new(0.0, 2.0, -5.0),
            &Vec3::zeros(),
            &Vec3::new(0.0, 1.0, 0.0),
            to_radians(45.0),
            1.0,
        );
        camera
    }

    fn uniform_position(commands: &[BackendCommand], uniform: &str) -> usize {
        commands
            .iter()
            .position(|command| matches!(command, BackendCommand::SetUniform { name, .. } if name == uniform))
            .unwrap()
    }

    fn light() -> Light {
        Light::directional(Vec3::new(0.0, 0.0, -1.0), Vec3::repeat(1.0), Vec3::z(), Vec3::z())
    }

    #[test]
    fn test_frame_order() {
        let mut backend = HeadlessBackend::new();
        let basic = program(&mut backend, "basic_shading");
        let mapping = program(&mut backend, "sphere_mapping");
        let sky_program = program(&mut backend, "skybox");

        let mut scene = Scene::new(camera(), [0.8, 0.8, 0.8, 1.0]);
        scene.add_camera_program(basic);
        scene.add_camera_program(sky_program);
        scene.add_environment_program(mapping);
        scene.add_light_group(LightGroup::new(vec![light()]), vec![basic]);

        let sky_texture =
            Texture::from_image(&mut backend, &ImageData::solid_color(2, 2, [0; 4]), 0, TextureOptions::default())
                .unwrap();
        scene.set_skybox(Skybox::new(object(&mut backend, sky_program), sky_texture));
        let glass = object(&mut backend, basic).with_blending(true);
        scene.add_object(glass);
        scene.add_object(object(&mut backend, basic));
        backend.take_commands();

        scene.render(&mut backend, &CameraInput::default()).unwrap();

        let commands = backend.commands();
        assert!(matches!(commands[0], BackendCommand::Clear(_)));

        let camera_uniform = uniform_position(commands, "u_matView");
        let light_uniform = uniform_position(commands, "u_lightCount");
        let direction = uniform_position(commands, CAMERA_DIRECTION_UNIFORM);
        assert!(camera_uniform < light_uniform && light_uniform < direction);

        // Skybox, then the opaque object, then the blended one despite insertion order
        let draws: Vec<_> = backend.draw_calls().collect();
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[0].program, sky_program);
        assert!(!draws[0].state.contains(RenderStateFlags::DEPTH_TEST));
        assert!(!draws[1].state.contains(RenderStateFlags::BLEND));
        assert!(draws[2].state.contains(RenderStateFlags::BLEND));
        assert!(!draws[2].state.contains(RenderStateFlags::DEPTH_WRITE));
        assert_eq!(backend.state(), RenderStateFlags::STARTUP);
    }

    #[test]
    fn test_input_moves_view() {
        let scene = Scene::new(camera(), [0.0; 4]);
        let mut input = CameraInput::new(InputConfig::default());
        assert_relative_eq!(scene.input_view(&input), *scene.base_view(), epsilon = EPSILON);

        input.apply(CameraAction::ZoomIn);
        let expected = mat4::translate(scene.base_view(), &Vec3::new(0.0, 0.0, -0.1));
        assert_relative_eq!(scene.input_view(&input), expected, epsilon = EPSILON);

        input.apply(CameraAction::RotateLeft);
        let expected = mat4::rotate(&expected, input.rotation(), &Vec3::y());
        assert_relative_eq!(scene.input_view(&input), expected, epsilon = EPSILON);
    }

    #[test]
    fn test_render_broadcasts_updated_view() {
        let mut backend = HeadlessBackend::new();
        let basic = program(&mut backend, "basic_shading");
        let mut scene = Scene::new(camera(), [0.0; 4]);
        scene.add_camera_program(basic);

        let mut input = CameraInput::default();
        input.apply(CameraAction::RotateRight);
        scene.render(&mut backend, &input).unwrap();

        let expected = scene.input_view(&input);
        assert_eq!(backend.uniform(basic, "u_matView"), Some(&UniformValue::Mat4(expected)));
        assert_eq!(*scene.camera().view_matrix(), expected);
    }

    #[test]
    fn test_objects_are_editable_between_frames() {
        let mut backend = HeadlessBackend::new();
        let basic = program(&mut backend, "basic_shading");
        let mut scene = Scene::new(camera(), [0.0; 4]);
        let key = scene.add_object(object(&mut backend, basic));

        scene.object_mut(key).unwrap().translate(&Vec3::new(1.0, 0.0, 2.0));
        scene.render(&mut backend, &CameraInput::default()).unwrap();

        let world = match backend.uniform(basic, "u_matWorld") {
            Some(UniformValue::Mat4(m)) => *m,
            other => panic!("expected mat4, got {other:?}"),
        };
        assert_relative_eq!(world[(0, 3)], 1.0);
        assert_relative_eq!(world[(2, 3)], 2.0);

        assert!(scene.remove_object(key).is_some());
        assert!(scene.object(key).is_none());
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn test_unconfigured_camera_fails_frame() {
        let mut backend = HeadlessBackend::new();
        let basic = program(&mut backend, "basic_shading");
        let mut scene = Scene::new(Camera::default(), [0.0; 4]);
        scene.add_camera_program(basic);

        assert!(matches!(
            scene.render(&mut backend, &CameraInput::default()),
            Err(RenderError::CameraNotConfigured)
        ));
    }

    #[test]
    fn test_projection_only_camera_fails_frame() {
        let mut backend = HeadlessBackend::new();
        let basic = program(&mut backend, "basic_shading");
        let mut camera = Camera::default();
        camera.set_perspective(to_radians(45.0), 1.0);
        let mut scene = Scene::new(camera, [0.0; 4]);
        scene.add_camera_program(basic);

        assert!(matches!(
            scene.render(&mut backend, &CameraInput::default()),
            Err(RenderError::CameraNotConfigured)
        ));
        assert!(!scene.camera().is_configured());
        assert_eq!(backend.uniform(basic, "u_matViewNormal"), None);

        scene.set_base_view(mat4::look_at(&Vec3::new(0.0, 0.0, -5.0), &Vec3::zeros(), &Vec3::y()));
        scene.render(&mut backend, &CameraInput::default()).unwrap();
        assert!(scene.camera().is_configured());
    }
}
