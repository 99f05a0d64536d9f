//! Drawable objects and their transform state
//!
//! Each object owns a flat world matrix (no parent/child inheritance). The
//! normal matrices derived from it are recomputed on every draw and never
//! cached, so edits to the world matrix between frames are always picked up.

use crate::foundation::math::{mat3, mat4, Mat3, Mat4, Vec3};
use crate::render::backend::{BufferHandle, PrimitiveTopology, ProgramHandle, RenderBackend, UniformValue};
use crate::render::camera::{Camera, VIEW_NORMAL_UNIFORM};
use crate::render::material::SharedMaterial;
use crate::render::mesh::{Geometry, VertexLayout};
use crate::render::texture::Texture;
use crate::render::{RenderError, RenderResult};

/// Uniform receiving the world matrix
pub const WORLD_UNIFORM: &str = "u_matWorld";
/// Uniform receiving the world-space normal matrix
pub const WORLD_NORMAL_UNIFORM: &str = "u_matWorldNormal";

/// A texture together with the sampler uniform it feeds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    /// Bound texture
    pub texture: Texture,
    /// Sampler uniform name
    pub sampler: String,
}

/// A piece of uploaded geometry drawn with one program
#[derive(Debug, Clone)]
pub struct DrawableObject {
    program: ProgramHandle,
    buffer: BufferHandle,
    vertex_count: u32,
    world: Mat4,
    material: Option<SharedMaterial>,
    texture: Option<TextureBinding>,
    blended: bool,
}

impl DrawableObject {
    /// Wrap an uploaded vertex buffer. The world matrix starts as identity.
    pub fn new(program: ProgramHandle, buffer: BufferHandle, vertex_count: u32) -> Self {
        Self {
            program,
            buffer,
            vertex_count,
            world: Mat4::identity(),
            material: None,
            texture: None,
            blended: false,
        }
    }

    /// Upload `geometry` and wrap it
    pub fn from_geometry(
        backend: &mut dyn RenderBackend,
        program: ProgramHandle,
        geometry: &Geometry,
    ) -> RenderResult<Self> {
        let vertex_count = u32::try_from(geometry.vertex_count())
            .map_err(|_| RenderError::InvalidBuffer(format!("{} vertices", geometry.vertex_count())))?;
        let buffer = backend.create_vertex_buffer(geometry.as_floats(), VertexLayout::POSITION_TEX_NORMAL)?;
        Ok(Self::new(program, buffer, vertex_count))
    }

    /// Attach a shared material
    pub fn with_material(mut self, material: SharedMaterial) -> Self {
        self.material = Some(material);
        self
    }

    /// Replace the world matrix
    pub fn with_world_matrix(mut self, world: Mat4) -> Self {
        self.world = world;
        self
    }

    /// Sample `texture` through `sampler` on every draw
    pub fn with_texture(mut self, texture: Texture, sampler: impl Into<String>) -> Self {
        self.texture = Some(TextureBinding {
            texture,
            sampler: sampler.into(),
        });
        self
    }

    /// Draw in the blended pass (blending on, depth writes off)
    pub fn with_blending(mut self, blended: bool) -> Self {
        self.blended = blended;
        self
    }

    /// Program this object draws with
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Number of vertices drawn
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Whether the object draws in the blended pass
    pub fn is_blended(&self) -> bool {
        self.blended
    }

    /// Current world matrix
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world
    }

    /// Replace the world matrix
    pub fn set_world_matrix(&mut self, world: Mat4) {
        self.world = world;
    }

    /// Post-multiply a translation onto the world matrix
    pub fn translate(&mut self, offset: &Vec3) {
        self.world = mat4::translate(&self.world, offset);
    }

    /// Post-multiply a scale onto the world matrix
    pub fn scale(&mut self, factors: &Vec3) {
        self.world = mat4::scale(&self.world, factors);
    }

    /// Post-multiply a rotation (radians, unit axis) onto the world matrix
    pub fn rotate(&mut self, radians: f32, axis: &Vec3) {
        self.world = mat4::rotate(&self.world, radians, axis);
    }

    /// Attached material, if any
    pub fn material(&self) -> Option<&SharedMaterial> {
        self.material.as_ref()
    }

    /// Attach or detach a material
    pub fn set_material(&mut self, material: Option<SharedMaterial>) {
        self.material = material;
    }

    /// Attached texture binding, if any
    pub fn texture(&self) -> Option<&TextureBinding> {
        self.texture.as_ref()
    }

    /// Inverse-transpose of the world matrix's upper-left 3x3
    pub fn world_normal_matrix(&self) -> Mat3 {
        mat3::inverse_transpose(&mat3::from_mat4_upper_left(&self.world))
    }

    /// Inverse-transpose of the upper-left 3x3 of `view · world`
    pub fn view_normal_matrix(&self, camera: &Camera) -> Mat3 {
        let world_view = mat4::multiply(camera.view_matrix(), &self.world);
        mat3::inverse_transpose(&mat3::from_mat4_upper_left(&world_view))
    }

    /// Push per-object uniforms and issue the draw call.
    ///
    /// Order: texture binding, material, `u_matWorld`, `u_matWorldNormal`,
    /// then `u_matViewNormal` when a camera is given, then the draw.
    pub fn draw(&self, backend: &mut dyn RenderBackend, camera: Option<&Camera>) -> RenderResult<()> {
        if let Some(binding) = &self.texture {
            binding.texture.bind(backend, self.program, &binding.sampler)?;
        }

        if let Some(material) = &self.material {
            material.borrow().apply(backend, self.program)?;
        }

        backend.set_uniform(self.program, WORLD_UNIFORM, UniformValue::Mat4(self.world))?;
        backend.set_uniform(
            self.program,
            WORLD_NORMAL_UNIFORM,
            UniformValue::Mat3(self.world_normal_matrix()),
        )?;

        if let Some(camera) = camera {
            backend.set_uniform(
                self.program,
                VIEW_NORMAL_UNIFORM,
                UniformValue::Mat3(self.view_normal_matrix(camera)),
            )?;
        }

        backend.draw_arrays(
            self.program,
            self.buffer,
            PrimitiveTopology::Triangles,
            0,
            self.vertex_count,
        )
    }
}
