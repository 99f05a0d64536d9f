//! Post-processing passes
//!
//! The scene renders into two color attachments: the lit image and a
//! brightness image holding only the parts bright enough to glow.
//! [`BloomBlur`] blurs the brightness image with a separable Gaussian,
//! ping-ponging between two offscreen targets and alternating horizontal and
//! vertical passes. [`Compositor`] then draws the final image to the default
//! framebuffer from the lit scene and the blurred glow.

use crate::foundation::math::Vec2;
use crate::render::backend::{
    BufferHandle, PrimitiveTopology, ProgramHandle, RenderBackend, RenderTargetDesc, RenderTargetHandle,
    TextureHandle, UniformValue,
};
use crate::render::mesh::{VertexLayout, FULLSCREEN_QUAD};
use crate::render::{RenderError, RenderResult};

/// Texture unit the composite pass reads the lit scene from
pub const SCENE_TEXTURE_UNIT: u32 = 31;

/// Texture unit the composite pass reads the blurred glow from
pub const BLUR_TEXTURE_UNIT: u32 = 30;

/// Texture unit the blur pass samples its input from
pub const BLUR_INPUT_UNIT: u32 = 0;

/// Default number of blur passes
pub const DEFAULT_BLUR_PASSES: u32 = 10;

const QUAD_VERTICES: u32 = 4;

fn upload_quad(backend: &mut dyn RenderBackend) -> RenderResult<BufferHandle> {
    backend.create_vertex_buffer(&FULLSCREEN_QUAD, VertexLayout::POSITION_TEX)
}

/// One side of the ping-pong pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PingPongTarget {
    target: RenderTargetHandle,
    color: TextureHandle,
}

impl PingPongTarget {
    fn create(backend: &mut dyn RenderBackend, desc: &RenderTargetDesc) -> RenderResult<Self> {
        let target = backend.create_render_target(desc)?;
        let color = target
            .color
            .first()
            .copied()
            .ok_or_else(|| RenderError::Backend("blur target has no color attachment".to_string()))?;
        Ok(Self {
            target: target.handle,
            color,
        })
    }
}

/// Separable Gaussian blur over two ping-pong render targets
#[derive(Debug, Clone)]
pub struct BloomBlur {
    program: ProgramHandle,
    quad: BufferHandle,
    targets: [PingPongTarget; 2],
    passes: u32,
}

impl BloomBlur {
    /// Create the two blur targets and the full-screen quad.
    ///
    /// `u_size` is set once here; the blur program uses it to convert
    /// texel offsets to texture coordinates.
    pub fn new(
        backend: &mut dyn RenderBackend,
        program: ProgramHandle,
        width: u32,
        height: u32,
        passes: u32,
    ) -> RenderResult<Self> {
        let desc = RenderTargetDesc {
            width,
            height,
            color_attachments: 1,
            depth: false,
        };

        let targets = [
            PingPongTarget::create(backend, &desc)?,
            PingPongTarget::create(backend, &desc)?,
        ];

        #[allow(clippy::cast_precision_loss)]
        let size = Vec2::new(width as f32, height as f32);
        backend.set_uniform(program, "u_size", UniformValue::Vec2(size))?;

        log::debug!("Bloom blur ready: {width}x{height}, {passes} passes");
        Ok(Self {
            program,
            quad: upload_quad(backend)?,
            targets,
            passes,
        })
    }

    /// Number of passes per blur
    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Color textures of the two ping-pong targets
    pub fn target_textures(&self) -> [TextureHandle; 2] {
        [self.targets[0].color, self.targets[1].color]
    }

    /// Blur `source` and return the texture holding the result.
    ///
    /// Pass `i` writes the first target when horizontal and the second when
    /// vertical, starting horizontal. The first pass samples `source`; every
    /// later pass samples the other target, which the previous pass wrote.
    /// With zero passes `source` is returned unchanged.
    pub fn blur(&self, backend: &mut dyn RenderBackend, source: TextureHandle) -> RenderResult<TextureHandle> {
        let mut horizontal = true;
        let mut last_written = source;

        for pass in 0..self.passes {
            let (write, read) = if horizontal {
                (self.targets[0], self.targets[1])
            } else {
                (self.targets[1], self.targets[0])
            };
            let input = if pass == 0 { source } else { read.color };

            backend.bind_render_target(Some(write.target))?;
            backend.bind_texture(BLUR_INPUT_UNIT, Some(input))?;
            backend.set_uniform(self.program, "u_horizontal", UniformValue::from(horizontal))?;
            backend.draw_arrays(self.program, self.quad, PrimitiveTopology::TriangleStrip, 0, QUAD_VERTICES)?;

            last_written = write.color;
            horizontal = !horizontal;
        }

        backend.bind_render_target(None)?;
        backend.bind_texture(BLUR_INPUT_UNIT, None)?;
        Ok(last_written)
    }
}

/// Final full-screen pass combining the lit scene with the blurred glow
#[derive(Debug, Clone)]
pub struct Compositor {
    program: ProgramHandle,
    quad: BufferHandle,
}

impl Compositor {
    /// Create the quad and point the program's samplers at units 31 and 30
    pub fn new(backend: &mut dyn RenderBackend, program: ProgramHandle) -> RenderResult<Self> {
        backend.set_uniform(program, "u_sceneSampler", UniformValue::Int(SCENE_TEXTURE_UNIT as i32))?;
        backend.set_uniform(program, "u_blurSampler", UniformValue::Int(BLUR_TEXTURE_UNIT as i32))?;

        Ok(Self {
            program,
            quad: upload_quad(backend)?,
        })
    }

    /// Draw the final image into the default framebuffer
    pub fn composite(
        &self,
        backend: &mut dyn RenderBackend,
        scene: TextureHandle,
        blurred: TextureHandle,
        clear_color: [f32; 4],
    ) -> RenderResult<()> {
        backend.bind_render_target(None)?;
        backend.bind_texture(SCENE_TEXTURE_UNIT, Some(scene))?;
        backend.bind_texture(BLUR_TEXTURE_UNIT, Some(blurred))?;

        backend.clear(clear_color);
        backend.draw_arrays(self.program, self.quad, PrimitiveTopology::TriangleStrip, 0, QUAD_VERTICES)?;

        backend.bind_texture(SCENE_TEXTURE_UNIT, None)?;
        backend.bind_texture(BLUR_TEXTURE_UNIT, None)?;
        Ok(())
    }
}
