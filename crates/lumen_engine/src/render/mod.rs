//! # Rendering System
//!
//! Scene-level rendering types layered over the [`RenderBackend`] seam.
//!
//! ## Architecture
//!
//! - **Camera**: view and projection matrices plus the derived view-normal matrix
//! - **Material / Light / LightGroup**: Phong parameter sets pushed as named uniforms
//! - **DrawableObject**: geometry handle, world matrix and optional material;
//!   derives its normal matrices on every draw
//! - **Skybox / BloomBlur / Compositor**: environment and post-processing passes
//! - **Backend**: the [`RenderBackend`] trait and the recording [`HeadlessBackend`]

pub mod backend;
pub mod camera;
pub mod drawable;
pub mod headless;
pub mod lighting;
pub mod material;
pub mod mesh;
pub mod post;
pub mod skybox;
pub mod texture;

pub use backend::{
    BackendResult, BufferHandle, PrimitiveTopology, ProgramHandle, RenderBackend, RenderStateFlags,
    RenderTarget, RenderTargetDesc, RenderTargetHandle, ShaderStage, TextureHandle, TextureOptions,
    UniformValue,
};
pub use camera::Camera;
pub use drawable::DrawableObject;
pub use headless::{BackendCommand, DrawCall, HeadlessBackend};
pub use lighting::{Light, LightGroup, MAX_LIGHTS};
pub use material::{Material, SharedMaterial};
pub use mesh::{Geometry, Vertex, VertexLayout};
pub use post::{BloomBlur, Compositor};
pub use skybox::Skybox;
pub use texture::Texture;

/// Rendering errors
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// A shader stage failed to compile
    #[error("Failed to compile {stage} shader of program '{program}': {message}")]
    ShaderCompilation {
        /// Program name
        program: String,
        /// Failing stage
        stage: ShaderStage,
        /// Compiler message
        message: String,
    },

    /// A handle does not name a live resource
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// Uploaded data does not match its declared layout
    #[error("Invalid buffer data: {0}")]
    InvalidBuffer(String),

    /// A draw reads past the end of its vertex buffer
    #[error("Draw of {requested} vertices exceeds buffer of {available}")]
    DrawOutOfRange {
        /// `first + count` of the draw
        requested: usize,
        /// Vertices in the buffer
        available: usize,
    },

    /// Texture unit outside the supported range
    #[error("Texture unit {0} out of range")]
    InvalidTextureUnit(u32),

    /// The camera was applied before both its view and projection were set
    #[error("Camera applied before view and projection were configured")]
    CameraNotConfigured,

    /// A light group holds more lights than shading programs declare
    #[error("Light group holds {count} lights, at most {max} are supported")]
    TooManyLights {
        /// Lights in the group
        count: usize,
        /// Supported maximum
        max: usize,
    },

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
