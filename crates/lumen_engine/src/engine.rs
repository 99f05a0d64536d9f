//! Frame orchestration
//!
//! The engine owns the scene, the input state and the post-processing
//! passes. One [`Engine::frame`] renders the scene into a two-attachment
//! offscreen target (lit color and brightness), blurs the brightness
//! attachment and composites both into the default framebuffer.

use crate::config::{Config, ConfigError};
use crate::core::config::ApplicationConfig;
use crate::foundation::time::FrameTimer;
use crate::input::{CameraInput, InputManager, KeyBindings, KeyCode};
use crate::render::backend::{
    ProgramHandle, RenderBackend, RenderStateFlags, RenderTargetDesc, RenderTargetHandle, TextureHandle,
};
use crate::render::{BloomBlur, Compositor, RenderError};
use crate::scene::{Scene, SceneAssets, SceneBuilder, SceneDescription, SceneError};
use thiserror::Error;

/// Name of the blur program in the scene description
pub const BLOOM_PROGRAM: &str = "bloom";
/// Name of the final composite program in the scene description
pub const FINAL_PROGRAM: &str = "final";

/// Offscreen target the scene renders into
#[derive(Debug, Clone, Copy)]
struct SceneTarget {
    handle: RenderTargetHandle,
    color: TextureHandle,
    brightness: TextureHandle,
}

impl SceneTarget {
    fn create(backend: &mut dyn RenderBackend, width: u32, height: u32) -> Result<Self, EngineError> {
        let target = backend.create_render_target(&RenderTargetDesc {
            width,
            height,
            color_attachments: 2,
            depth: true,
        })?;

        match target.color[..] {
            [color, brightness] => Ok(Self {
                handle: target.handle,
                color,
                brightness,
            }),
            _ => Err(EngineError::InitializationFailed(format!(
                "scene target has {} color attachments, expected 2",
                target.color.len()
            ))),
        }
    }
}

/// Main engine struct
///
/// Coordinates the scene, input and post-processing and drives the frame loop.
#[derive(Debug)]
pub struct Engine {
    scene: Scene,
    input: InputManager,
    timer: FrameTimer,
    target: SceneTarget,
    blur: BloomBlur,
    compositor: Compositor,
    clear_color: [f32; 4],
    running: bool,
}

impl Engine {
    /// Create the engine around an already built scene
    ///
    /// # Arguments
    /// * `backend` - Backend the post-processing resources are created on
    /// * `scene` - Scene drawn every frame
    /// * `config` - Output size, input limits and post-processing settings
    /// * `bloom_program` / `final_program` - Compiled blur and composite programs
    pub fn new(
        backend: &mut dyn RenderBackend,
        scene: Scene,
        config: &ApplicationConfig,
        bloom_program: ProgramHandle,
        final_program: ProgramHandle,
    ) -> Result<Self, EngineError> {
        log::info!("Initializing engine...");
        config.validate()?;

        let (width, height) = (config.window.width, config.window.height);
        backend.set_state(RenderStateFlags::STARTUP, true);

        let target = SceneTarget::create(backend, width, height)?;
        let blur = BloomBlur::new(backend, bloom_program, width, height, config.post.blur_passes)?;
        let compositor = Compositor::new(backend, final_program)?;
        let input = InputManager::new(KeyBindings::default(), CameraInput::new(config.input.clone()));

        log::info!("Engine ready: {width}x{height}, {} blur passes", config.post.blur_passes);
        Ok(Self {
            scene,
            input,
            timer: FrameTimer::new(),
            target,
            blur,
            compositor,
            clear_color: config.post.clear_color,
            running: true,
        })
    }

    /// Load the scene named by `config` and create the engine around it.
    ///
    /// The scene description must define the `bloom` and `final` programs.
    pub fn load(backend: &mut dyn RenderBackend, config: &ApplicationConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let scene_path = config.assets.scene_path();
        log::info!("Loading scene {}", scene_path.display());
        let description = SceneDescription::load_from_file(&scene_path)?;

        let mut builder = SceneBuilder::new(
            SceneAssets::new(&config.assets.assets_dir),
            config.camera.clone(),
            config.window.aspect_ratio(),
            config.post.clear_color,
        );
        let scene = builder.build(backend, &description)?;

        let program = |name: &str| {
            builder
                .program(name)
                .ok_or_else(|| EngineError::from(SceneError::UnknownProgram(name.to_string())))
        };
        let (bloom, final_pass) = (program(BLOOM_PROGRAM)?, program(FINAL_PROGRAM)?);

        Self::new(backend, scene, config, bloom, final_pass)
    }

    /// Render one frame: scene into the offscreen target, blur the
    /// brightness attachment, composite into the default framebuffer
    pub fn frame(&mut self, backend: &mut dyn RenderBackend) -> Result<(), EngineError> {
        self.timer.begin_frame();

        backend.bind_render_target(Some(self.target.handle))?;
        self.scene.render(backend, self.input.camera())?;

        let blurred = self.blur.blur(backend, self.target.brightness)?;
        self.compositor
            .composite(backend, self.target.color, blurred, self.clear_color)?;

        let frame_time = self.timer.end_frame();
        log::trace!("Frame {} took {frame_time:?}", self.timer.frame_count());
        Ok(())
    }

    /// Render up to `frames` frames, stopping early on [`Self::quit`].
    /// Returns the number of frames rendered. The first failing frame stops
    /// the loop and its error is returned.
    pub fn run(&mut self, backend: &mut dyn RenderBackend, frames: u64) -> Result<u64, EngineError> {
        log::info!("Starting main loop...");
        let mut rendered = 0;
        while self.running && rendered < frames {
            self.frame(backend)?;
            rendered += 1;
        }

        log::info!(
            "Rendered {rendered} frames, average {:.1} fps",
            self.timer.average_fps()
        );
        Ok(rendered)
    }

    /// Handle key input. Escape requests shutdown; other keys go to the
    /// camera input.
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if key == KeyCode::Escape && pressed {
            self.quit();
            return;
        }
        self.input.handle_key_input(key, pressed);
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the loop keeps running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The scene
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the scene, for edits between frames
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Get the input manager
    pub fn input(&self) -> &InputManager {
        &self.input
    }

    /// Frame timing
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Initialization error
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Rendering error
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    /// Scene setup error
    #[error("Scene setup failed: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ShaderSource;
    use crate::foundation::math::{to_radians, Vec3};
    use crate::render::headless::BackendCommand;
    use crate::render::mesh::{Geometry, Vertex};
    use crate::render::post::{BLUR_TEXTURE_UNIT, SCENE_TEXTURE_UNIT};
    use crate::render::{Camera, DrawableObject, HeadlessBackend};

    fn program(backend: &mut HeadlessBackend, name: &str) -> ProgramHandle {
        backend
            .create_program(name, &ShaderSource::new("void main() {}", "void main() {}"))
            .unwrap()
    }

    fn small_config() -> ApplicationConfig {
        let mut config = ApplicationConfig::default();
        config.window.width = 64;
        config.window.height = 32;
        config.post.blur_passes = 2;
        config
    }

    fn engine(backend: &mut HeadlessBackend, camera: Camera) -> Engine {
        crate::foundation::logging::init_for_tests();
        let basic = program(backend, "basic_shading");
        let bloom = program(backend, "bloom");
        let final_pass = program(backend, "final");

        let mut scene = Scene::new(camera, [0.8, 0.8, 0.8, 1.0]);
        scene.add_camera_program(basic);
        let teapot = DrawableObject::from_geometry(backend, basic, &Geometry::new(vec![Vertex::default(); 3])).unwrap();
        scene.add_object(teapot);

        Engine::new(backend, scene, &small_config(), bloom, final_pass).unwrap()
    }

    fn configured_camera() -> Camera {
        let mut camera = Camera::default();
        camera.configure(
            &Vec3::new(0.0, 2.0, -5.0),
            &Vec3::zeros(),
            &Vec3::y(),
            to_radians(45.0),
            2.0,
        );
        camera
    }

    #[test]
    fn test_frame_pipeline_order() {
        let mut backend = HeadlessBackend::new();
        let mut engine = engine(&mut backend, configured_camera());
        backend.take_commands();

        engine.frame(&mut backend).unwrap();

        let commands = backend.commands();
        let scene_target = match &commands[0] {
            BackendCommand::BindRenderTarget(Some(target)) => *target,
            other => panic!("expected scene target bind, got {other:?}"),
        };
        assert!(matches!(commands[1], BackendCommand::Clear(_)));

        let draws: Vec<_> = backend.draw_calls().collect();
        // Scene object, two blur passes, final composite
        assert_eq!(draws.len(), 4);
        assert_eq!(draws[0].target, Some(scene_target));
        assert_ne!(draws[1].target, Some(scene_target));
        assert_eq!(draws[3].target, None);

        let bound: Vec<u32> = draws[3].textures.iter().map(|(unit, _)| *unit).collect();
        assert!(bound.contains(&SCENE_TEXTURE_UNIT));
        assert!(bound.contains(&BLUR_TEXTURE_UNIT));
        assert_eq!(engine.timer().frame_count(), 1);
    }

    #[test]
    fn test_run_counts_frames_and_honours_quit() {
        let mut backend = HeadlessBackend::new();
        let mut engine = engine(&mut backend, configured_camera());

        assert_eq!(engine.run(&mut backend, 3).unwrap(), 3);

        engine.handle_key_input(KeyCode::Escape, true);
        assert!(!engine.is_running());
        assert_eq!(engine.run(&mut backend, 3).unwrap(), 0);
    }

    #[test]
    fn test_keys_reach_camera_input() {
        let mut backend = HeadlessBackend::new();
        let mut engine = engine(&mut backend, configured_camera());

        engine.handle_key_input(KeyCode::A, true);
        engine.handle_key_input(KeyCode::A, false);
        assert!(engine.input().camera().rotation() > 0.0);
        assert!(engine.is_running());
    }

    #[test]
    fn test_frame_error_stops_run() {
        let mut backend = HeadlessBackend::new();
        let mut engine = engine(&mut backend, Camera::default());

        let result = engine.run(&mut backend, 5);
        assert!(matches!(
            result,
            Err(EngineError::Render(RenderError::CameraNotConfigured))
        ));
        assert_eq!(engine.timer().frame_count(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut backend = HeadlessBackend::new();
        let bloom = program(&mut backend, "bloom");
        let final_pass = program(&mut backend, "final");
        let mut config = small_config();
        config.window.width = 0;

        let result = Engine::new(&mut backend, Scene::new(configured_camera(), [0.0; 4]), &config, bloom, final_pass);
        assert!(matches!(result, Err(EngineError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn test_load_demo_scene() {
        let demo = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../teapot_app");
        let mut config = ApplicationConfig::load_from_file(demo.join("config.toml")).unwrap();
        config.assets.assets_dir = demo.join(&config.assets.assets_dir);
        config.window.width = 64;
        config.window.height = 36;

        let mut backend = HeadlessBackend::new();
        let mut engine = Engine::load(&mut backend, &config).unwrap();
        assert_eq!(engine.scene().object_count(), 7);
        assert!(engine.scene().skybox().is_some());

        engine.handle_key_input(KeyCode::W, true);
        engine.frame(&mut backend).unwrap();

        // Skybox, seven objects, ten blur passes, final composite
        assert_eq!(backend.draw_calls().count(), 1 + 7 + 10 + 1);
        let sphere_mapping = backend.program_by_name("sphere_mapping").unwrap();
        assert!(backend.uniform(sphere_mapping, "u_camDir").is_some());
    }
}
