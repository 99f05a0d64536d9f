//! Sky sphere
//!
//! A large textured sphere drawn first each frame with depth testing and
//! face culling disabled, so everything else draws over it and its inside
//! faces are visible.

use crate::render::backend::{ProgramHandle, RenderBackend, RenderStateFlags};
use crate::render::drawable::DrawableObject;
use crate::render::texture::Texture;
use crate::render::RenderResult;

/// Sampler uniform the sky texture is exposed through
pub const SKYBOX_SAMPLER: &str = "u_skybox";

/// Textured sky sphere
#[derive(Debug, Clone)]
pub struct Skybox {
    sphere: DrawableObject,
    texture: Texture,
}

impl Skybox {
    /// Create a skybox from an uploaded sphere and its texture
    pub fn new(sphere: DrawableObject, texture: Texture) -> Self {
        Self { sphere, texture }
    }

    /// Sky texture
    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    /// The sphere geometry
    pub fn sphere(&self) -> &DrawableObject {
        &self.sphere
    }

    /// Expose the sky texture to another program, such as an environment
    /// mapping program sampling reflections
    pub fn share_texture(&self, backend: &mut dyn RenderBackend, program: ProgramHandle) -> RenderResult<()> {
        self.texture.bind(backend, program, SKYBOX_SAMPLER)
    }

    /// Draw the sphere with depth testing and culling off, then turn them
    /// back on
    pub fn draw(&self, backend: &mut dyn RenderBackend) -> RenderResult<()> {
        let flags = RenderStateFlags::DEPTH_TEST | RenderStateFlags::CULL_FACE;
        backend.set_state(flags, false);

        let result = self
            .texture
            .bind(backend, self.sphere.program(), SKYBOX_SAMPLER)
            .and_then(|()| self.sphere.draw(backend, None));

        backend.set_state(flags, true);
        result
    }
}
