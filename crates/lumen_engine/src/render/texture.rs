//! Textures bound to a fixed texture unit

use crate::assets::ImageData;
use crate::render::backend::{
    ProgramHandle, RenderBackend, TextureHandle, TextureOptions, UniformValue, MAX_TEXTURE_UNITS,
};
use crate::render::{RenderError, RenderResult};

/// A texture that always samples from the same unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    handle: TextureHandle,
    unit: u32,
}

impl Texture {
    /// Upload `image` and reserve `unit` for it.
    ///
    /// Rows are flipped on upload so texture coordinate `v = 0` is the bottom
    /// of the image.
    pub fn from_image(
        backend: &mut dyn RenderBackend,
        image: &ImageData,
        unit: u32,
        options: TextureOptions,
    ) -> RenderResult<Self> {
        if unit >= MAX_TEXTURE_UNITS {
            return Err(RenderError::InvalidTextureUnit(unit));
        }
        let handle = backend.create_texture(&image.flipped_vertically(), options)?;
        Ok(Self { handle, unit })
    }

    /// Wrap an existing texture, such as a render target attachment
    pub fn from_handle(handle: TextureHandle, unit: u32) -> Self {
        Self { handle, unit }
    }

    /// Backend handle
    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    /// Texture unit this texture binds to
    pub fn unit(&self) -> u32 {
        self.unit
    }

    /// Replace the texture contents, e.g. with the next video frame
    pub fn update(&self, backend: &mut dyn RenderBackend, image: &ImageData) -> RenderResult<()> {
        backend.update_texture(self.handle, &image.flipped_vertically())
    }

    /// Bind to the texture unit and point `sampler` on `program` at it
    pub fn bind(&self, backend: &mut dyn RenderBackend, program: ProgramHandle, sampler: &str) -> RenderResult<()> {
        let unit = i32::try_from(self.unit).map_err(|_| RenderError::InvalidTextureUnit(self.unit))?;
        backend.bind_texture(self.unit, Some(self.handle))?;
        backend.set_uniform(program, sampler, UniformValue::Int(unit))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ShaderSource;
    use crate::render::HeadlessBackend;

    #[test]
    fn test_bind_sets_unit_and_sampler() {
        let mut backend = HeadlessBackend::new();
        let program = backend
            .create_program("texture_shading", &ShaderSource::new("void main() {}", "void main() {}"))
            .unwrap();
        let texture = Texture::from_image(
            &mut backend,
            &ImageData::solid_color(2, 2, [0, 255, 0, 255]),
            2,
            TextureOptions { mipmaps: true, anisotropic: true },
        )
        .unwrap();

        texture.bind(&mut backend, program, "u_sampler").unwrap();

        assert_eq!(backend.bound_texture(2), Some(texture.handle()));
        assert_eq!(backend.uniform(program, "u_sampler"), Some(&UniformValue::Int(2)));
        assert!(backend.texture_options(texture.handle()).unwrap().mipmaps);
    }

    #[test]
    fn test_unit_out_of_range() {
        let mut backend = HeadlessBackend::new();
        let result = Texture::from_image(
            &mut backend,
            &ImageData::solid_color(1, 1, [0; 4]),
            MAX_TEXTURE_UNITS,
            TextureOptions::default(),
        );
        assert!(matches!(result, Err(RenderError::InvalidTextureUnit(_))));
    }
}
