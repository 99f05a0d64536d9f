//! Backend abstraction for the rendering system
//!
//! Everything above this trait (camera, materials, lights, drawables, the
//! scene) talks to the GPU only through [`RenderBackend`]: named uniform
//! pushes, pipeline state toggles, texture unit bindings and `draw_arrays`.
//! Resources are referred to by small copyable handles.

use bitflags::bitflags;

use crate::assets::{ImageData, ShaderSource};
use crate::foundation::math::{Mat3, Mat4, Vec2, Vec3, Vec4};
use crate::render::mesh::VertexLayout;
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Number of texture units a backend exposes
pub const MAX_TEXTURE_UNITS: u32 = 32;

/// Handle to a linked shading program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Handle to an uploaded vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Handle to a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Handle to an offscreen render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderTargetHandle(pub u32);

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

/// A value pushed to a named uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `float`
    Float(f32),
    /// `int`, `bool` or sampler unit
    Int(i32),
    /// `vec2`
    Vec2(Vec2),
    /// `vec3`
    Vec3(Vec3),
    /// `vec4`
    Vec4(Vec4),
    /// `mat3`
    Mat3(Mat3),
    /// `mat4`
    Mat4(Mat4),
}

impl UniformValue {
    /// The value as the flat float sequence a shading program receives.
    /// Matrices are column-major.
    pub fn to_floats(&self) -> Vec<f32> {
        match self {
            Self::Float(v) => vec![*v],
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => vec![*v as f32],
            Self::Vec2(v) => v.as_slice().to_vec(),
            Self::Vec3(v) => v.as_slice().to_vec(),
            Self::Vec4(v) => v.as_slice().to_vec(),
            Self::Mat3(m) => m.as_slice().to_vec(),
            Self::Mat4(m) => m.as_slice().to_vec(),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for UniformValue {
    fn from(value: bool) -> Self {
        Self::Int(i32::from(value))
    }
}

impl From<Vec2> for UniformValue {
    fn from(value: Vec2) -> Self {
        Self::Vec2(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Vec4> for UniformValue {
    fn from(value: Vec4) -> Self {
        Self::Vec4(value)
    }
}

impl From<Mat3> for UniformValue {
    fn from(value: Mat3) -> Self {
        Self::Mat3(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

bitflags! {
    /// Toggleable fixed-function pipeline state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderStateFlags: u32 {
        /// Depth testing
        const DEPTH_TEST = 1 << 0;
        /// Back-face culling
        const CULL_FACE = 1 << 1;
        /// Alpha blending
        const BLEND = 1 << 2;
        /// Writes to the depth buffer
        const DEPTH_WRITE = 1 << 3;
    }
}

impl RenderStateFlags {
    /// State at startup: depth test, back-face culling and depth writes on,
    /// blending off
    pub const STARTUP: Self = Self::DEPTH_TEST
        .union(Self::CULL_FACE)
        .union(Self::DEPTH_WRITE);
}

/// How `draw_arrays` assembles vertices into triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Every three vertices form a triangle
    Triangles,
    /// Each vertex after the second forms a triangle with the previous two
    TriangleStrip,
}

/// Sampling options for an uploaded texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureOptions {
    /// Generate a mipmap chain and sample it trilinearly
    pub mipmaps: bool,
    /// Enable the maximum supported anisotropic filtering
    pub anisotropic: bool,
}

/// Offscreen render target description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTargetDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of RGBA8 color attachments
    pub color_attachments: u32,
    /// Whether a depth attachment is created
    pub depth: bool,
}

/// A created render target and the textures its color attachments render into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    /// Target handle
    pub handle: RenderTargetHandle,
    /// One texture per color attachment, in attachment order
    pub color: Vec<TextureHandle>,
}

/// Main rendering backend trait
///
/// Uniform pushes are addressed by program and uniform name. Pushing a
/// uniform the program does not declare is not an error; the value is
/// dropped the way a GPU driver drops writes to an inactive location.
pub trait RenderBackend {
    /// Compile and link a program from its vertex and fragment sources
    fn create_program(&mut self, name: &str, source: &ShaderSource) -> BackendResult<ProgramHandle>;

    /// Upload an interleaved float vertex buffer
    fn create_vertex_buffer(&mut self, data: &[f32], layout: VertexLayout) -> BackendResult<BufferHandle>;

    /// Upload an RGBA8 image as a 2D texture
    fn create_texture(&mut self, image: &ImageData, options: TextureOptions) -> BackendResult<TextureHandle>;

    /// Replace the contents of an existing texture
    fn update_texture(&mut self, texture: TextureHandle, image: &ImageData) -> BackendResult<()>;

    /// Create an offscreen render target
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> BackendResult<RenderTarget>;

    /// Direct subsequent draws into `target`, or the default framebuffer
    /// when `None`
    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>) -> BackendResult<()>;

    /// Bind a texture to a texture unit (`None` unbinds)
    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) -> BackendResult<()>;

    /// Set a named uniform on a program
    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) -> BackendResult<()>;

    /// Enable or disable pipeline state
    fn set_state(&mut self, flags: RenderStateFlags, enabled: bool);

    /// Clear the bound target's color and depth
    fn clear(&mut self, color: [f32; 4]);

    /// Draw `count` vertices starting at `first`
    fn draw_arrays(
        &mut self,
        program: ProgramHandle,
        buffer: BufferHandle,
        topology: PrimitiveTopology,
        first: u32,
        count: u32,
    ) -> BackendResult<()>;
}
