//! # Lumen Engine
//!
//! A small forward renderer core: a column-major linear-algebra kernel, a
//! perspective camera, Phong materials and light groups, drawable objects
//! with flat world transforms, and a scene that pushes all of it to shading
//! programs as named uniforms every frame.
//!
//! ## Features
//!
//! - **Math Kernel**: 3-vector, 3x3 and 4x4 operations in the flat
//!   column-major layout shading programs expect
//! - **Scene Composition**: camera, lights, skybox, opaque and blended objects
//! - **Post-processing**: ping-pong bloom blur and a final composite pass
//! - **Assets**: OBJ, MTL, images and GLSL sources, described by a RON scene file
//! - **Backend Seam**: rendering goes through [`render::RenderBackend`];
//!   [`render::HeadlessBackend`] records every command for inspection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumen_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApplicationConfig::load_or_default("config.toml")?;
//!     lumen_engine::foundation::logging::init(&config.engine.log_level);
//!
//!     let mut backend = HeadlessBackend::new();
//!     let mut engine = Engine::load(&mut backend, &config)?;
//!     engine.handle_key_input(KeyCode::W, true);
//!     engine.run(&mut backend, 60)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;

pub mod assets;
pub mod foundation;
pub mod input;
pub mod render;
pub mod scene;

mod engine;

pub use engine::{Engine, EngineError, BLOOM_PROGRAM, FINAL_PROGRAM};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{AssetError, ImageData, ObjLoader, ShaderSource},
        config::Config,
        core::config::{ApplicationConfig, CameraConfig, EngineConfig, InputConfig, PostConfig},
        foundation::math::{mat3, mat4, to_radians, vec3, Mat3, Mat4, Vec3, Vec4},
        input::{CameraAction, CameraInput, InputManager, KeyBindings, KeyCode},
        render::{
            Camera, DrawableObject, HeadlessBackend, Light, LightGroup, Material, RenderBackend, RenderError,
            SharedMaterial, Skybox, Texture,
        },
        scene::{ObjectKey, Scene, SceneBuilder, SceneDescription, SceneError},
        Engine, EngineError,
    };
}
