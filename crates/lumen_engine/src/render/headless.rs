//! Headless recording backend
//!
//! [`HeadlessBackend`] implements [`RenderBackend`] without a GPU. It performs
//! the same validation a driver would (shader sources, handle lookups, draw
//! ranges, texture units), keeps the most recent value of every uniform per
//! program and records each call as a [`BackendCommand`]. The demo binary
//! runs on it and the tests inspect it.

use std::collections::HashMap;

use crate::assets::{ImageData, ShaderSource};
use crate::render::backend::{
    BackendResult, BufferHandle, PrimitiveTopology, ProgramHandle, RenderBackend, RenderStateFlags,
    RenderTarget, RenderTargetDesc, RenderTargetHandle, ShaderStage, TextureHandle, TextureOptions,
    UniformValue, MAX_TEXTURE_UNITS,
};
use crate::render::mesh::VertexLayout;
use crate::render::RenderError;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// A uniform write
    SetUniform {
        /// Target program
        program: ProgramHandle,
        /// Uniform name
        name: String,
        /// Written value
        value: UniformValue,
    },
    /// A state toggle
    SetState {
        /// Affected flags
        flags: RenderStateFlags,
        /// New value
        enabled: bool,
    },
    /// A texture unit binding
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Bound texture, `None` to unbind
        texture: Option<TextureHandle>,
    },
    /// A render target switch
    BindRenderTarget(Option<RenderTargetHandle>),
    /// A texture content replacement
    UpdateTexture(TextureHandle),
    /// A clear of the bound target
    Clear([f32; 4]),
    /// A draw call, with the pipeline state it ran under
    Draw(DrawCall),
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    /// Program used
    pub program: ProgramHandle,
    /// Vertex buffer used
    pub buffer: BufferHandle,
    /// Primitive assembly
    pub topology: PrimitiveTopology,
    /// First vertex
    pub first: u32,
    /// Vertex count
    pub count: u32,
    /// Pipeline state at draw time
    pub state: RenderStateFlags,
    /// Render target at draw time, `None` for the default framebuffer
    pub target: Option<RenderTargetHandle>,
    /// Texture units bound at draw time as `(unit, texture)`
    pub textures: Vec<(u32, TextureHandle)>,
}

#[derive(Debug)]
struct ProgramRecord {
    name: String,
    uniforms: HashMap<String, UniformValue>,
}

#[derive(Debug)]
struct BufferRecord {
    vertex_count: usize,
}

#[derive(Debug)]
struct TextureRecord {
    width: u32,
    height: u32,
    options: TextureOptions,
}

/// GPU-less [`RenderBackend`] that validates and records every call
#[derive(Debug)]
pub struct HeadlessBackend {
    programs: Vec<ProgramRecord>,
    buffers: Vec<BufferRecord>,
    textures: Vec<TextureRecord>,
    targets: Vec<RenderTarget>,
    bound_target: Option<RenderTargetHandle>,
    texture_units: [Option<TextureHandle>; MAX_TEXTURE_UNITS as usize],
    state: RenderStateFlags,
    commands: Vec<BackendCommand>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Create a backend with no resources and the startup pipeline state
    pub fn new() -> Self {
        Self {
            programs: Vec::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
            targets: Vec::new(),
            bound_target: None,
            texture_units: [None; MAX_TEXTURE_UNITS as usize],
            state: RenderStateFlags::STARTUP,
            commands: Vec::new(),
        }
    }

    /// Latest value written to `name` on `program`
    pub fn uniform(&self, program: ProgramHandle, name: &str) -> Option<&UniformValue> {
        self.programs
            .get(program.0 as usize)
            .and_then(|record| record.uniforms.get(name))
    }

    /// Look up a program by the name it was created with
    pub fn program_by_name(&self, name: &str) -> Option<ProgramHandle> {
        self.programs
            .iter()
            .position(|record| record.name == name)
            .and_then(|index| u32::try_from(index).ok())
            .map(ProgramHandle)
    }

    /// Name a program was created with
    pub fn program_name(&self, program: ProgramHandle) -> Option<&str> {
        self.programs.get(program.0 as usize).map(|record| record.name.as_str())
    }

    /// Dimensions of a texture
    pub fn texture_size(&self, texture: TextureHandle) -> Option<(u32, u32)> {
        self.textures
            .get(texture.0 as usize)
            .map(|record| (record.width, record.height))
    }

    /// Sampling options a texture was created with
    pub fn texture_options(&self, texture: TextureHandle) -> Option<TextureOptions> {
        self.textures.get(texture.0 as usize).map(|record| record.options)
    }

    /// Current pipeline state
    pub fn state(&self) -> RenderStateFlags {
        self.state
    }

    /// Texture currently bound to `unit`
    pub fn bound_texture(&self, unit: u32) -> Option<TextureHandle> {
        self.texture_units.get(unit as usize).copied().flatten()
    }

    /// Currently bound render target
    pub fn bound_render_target(&self) -> Option<RenderTargetHandle> {
        self.bound_target
    }

    /// Every command recorded since creation or the last [`take_commands`]
    ///
    /// [`take_commands`]: HeadlessBackend::take_commands
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Drain the recorded command stream
    pub fn take_commands(&mut self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Recorded draw calls, in submission order
    pub fn draw_calls(&self) -> impl Iterator<Item = &DrawCall> {
        self.commands.iter().filter_map(|command| match command {
            BackendCommand::Draw(draw) => Some(draw),
            _ => None,
        })
    }

    fn program_mut(&mut self, program: ProgramHandle) -> BackendResult<&mut ProgramRecord> {
        self.programs
            .get_mut(program.0 as usize)
            .ok_or_else(|| RenderError::UnknownResource(format!("{program:?}")))
    }

    fn check_texture(&self, texture: TextureHandle) -> BackendResult<()> {
        if (texture.0 as usize) < self.textures.len() {
            Ok(())
        } else {
            Err(RenderError::UnknownResource(format!("{texture:?}")))
        }
    }

    fn next_handle(len: usize) -> BackendResult<u32> {
        u32::try_from(len).map_err(|_| RenderError::Backend("handle space exhausted".to_string()))
    }
}

fn validate_stage(program: &str, stage: ShaderStage, source: &str) -> BackendResult<()> {
    let message = if source.trim().is_empty() {
        "empty source"
    } else if !source.contains("main") {
        "no main entry point"
    } else {
        return Ok(());
    };

    Err(RenderError::ShaderCompilation {
        program: program.to_string(),
        stage,
        message: message.to_string(),
    })
}

impl RenderBackend for HeadlessBackend {
    fn create_program(&mut self, name: &str, source: &ShaderSource) -> BackendResult<ProgramHandle> {
        validate_stage(name, ShaderStage::Vertex, &source.vertex)?;
        validate_stage(name, ShaderStage::Fragment, &source.fragment)?;

        let handle = ProgramHandle(Self::next_handle(self.programs.len())?);
        self.programs.push(ProgramRecord {
            name: name.to_string(),
            uniforms: HashMap::new(),
        });
        log::debug!("Linked program '{name}' as {handle:?}");
        Ok(handle)
    }

    fn create_vertex_buffer(&mut self, data: &[f32], layout: VertexLayout) -> BackendResult<BufferHandle> {
        if data.len() % layout.stride as usize != 0 {
            return Err(RenderError::InvalidBuffer(format!(
                "{} floats is not a whole number of {}-float vertices",
                data.len(),
                layout.stride
            )));
        }

        let handle = BufferHandle(Self::next_handle(self.buffers.len())?);
        self.buffers.push(BufferRecord {
            vertex_count: layout.vertex_count(data.len()),
        });
        Ok(handle)
    }

    fn create_texture(&mut self, image: &ImageData, options: TextureOptions) -> BackendResult<TextureHandle> {
        let expected = image.width as usize * image.height as usize * ImageData::CHANNELS;
        if image.data.len() != expected {
            return Err(RenderError::InvalidBuffer(format!(
                "{}x{} image holds {} bytes, expected {expected}",
                image.width,
                image.height,
                image.data.len()
            )));
        }

        let handle = TextureHandle(Self::next_handle(self.textures.len())?);
        self.textures.push(TextureRecord {
            width: image.width,
            height: image.height,
            options,
        });
        Ok(handle)
    }

    fn update_texture(&mut self, texture: TextureHandle, image: &ImageData) -> BackendResult<()> {
        self.check_texture(texture)?;
        let record = &mut self.textures[texture.0 as usize];
        record.width = image.width;
        record.height = image.height;
        self.commands.push(BackendCommand::UpdateTexture(texture));
        Ok(())
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> BackendResult<RenderTarget> {
        let handle = RenderTargetHandle(Self::next_handle(self.targets.len())?);
        let mut color = Vec::new();
        for _ in 0..desc.color_attachments {
            color.push(TextureHandle(Self::next_handle(self.textures.len())?));
            self.textures.push(TextureRecord {
                width: desc.width,
                height: desc.height,
                options: TextureOptions::default(),
            });
        }

        let target = RenderTarget { handle, color };
        self.targets.push(target.clone());
        Ok(target)
    }

    fn bind_render_target(&mut self, target: Option<RenderTargetHandle>) -> BackendResult<()> {
        if let Some(handle) = target {
            if handle.0 as usize >= self.targets.len() {
                return Err(RenderError::UnknownResource(format!("{handle:?}")));
            }
        }
        self.bound_target = target;
        self.commands.push(BackendCommand::BindRenderTarget(target));
        Ok(())
    }

    fn bind_texture(&mut self, unit: u32, texture: Option<TextureHandle>) -> BackendResult<()> {
        if unit >= MAX_TEXTURE_UNITS {
            return Err(RenderError::InvalidTextureUnit(unit));
        }
        if let Some(handle) = texture {
            self.check_texture(handle)?;
        }
        self.texture_units[unit as usize] = texture;
        self.commands.push(BackendCommand::BindTexture { unit, texture });
        Ok(())
    }

    fn set_uniform(&mut self, program: ProgramHandle, name: &str, value: UniformValue) -> BackendResult<()> {
        self.program_mut(program)?.uniforms.insert(name.to_string(), value);
        self.commands.push(BackendCommand::SetUniform {
            program,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn set_state(&mut self, flags: RenderStateFlags, enabled: bool) {
        self.state.set(flags, enabled);
        self.commands.push(BackendCommand::SetState { flags, enabled });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(BackendCommand::Clear(color));
    }

    fn draw_arrays(
        &mut self,
        program: ProgramHandle,
        buffer: BufferHandle,
        topology: PrimitiveTopology,
        first: u32,
        count: u32,
    ) -> BackendResult<()> {
        self.program_mut(program)?;
        let available = self
            .buffers
            .get(buffer.0 as usize)
            .ok_or_else(|| RenderError::UnknownResource(format!("{buffer:?}")))?
            .vertex_count;

        let requested = first as usize + count as usize;
        if requested > available {
            return Err(RenderError::DrawOutOfRange { requested, available });
        }

        let textures = self
            .texture_units
            .iter()
            .enumerate()
            .filter_map(|(unit, texture)| Some((u32::try_from(unit).ok()?, (*texture)?)))
            .collect();

        log::trace!("draw {count} vertices with {program:?} from {buffer:?}");
        self.commands.push(BackendCommand::Draw(DrawCall {
            program,
            buffer,
            topology,
            first,
            count,
            state: self.state,
            target: self.bound_target,
            textures,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trivial_source() -> ShaderSource {
        ShaderSource::new("void main() {}", "void main() {}")
    }

    #[test]
    fn test_shader_validation() {
        let mut backend = HeadlessBackend::new();

        let empty = ShaderSource::new("", "void main() {}");
        match backend.create_program("broken", &empty) {
            Err(RenderError::ShaderCompilation { program, stage, .. }) => {
                assert_eq!(program, "broken");
                assert_eq!(stage, ShaderStage::Vertex);
            }
            other => panic!("expected compilation error, got {other:?}"),
        }

        let no_entry = ShaderSource::new("void main() {}", "float helper() { return 1.0; }");
        assert!(matches!(
            backend.create_program("no_entry", &no_entry),
            Err(RenderError::ShaderCompilation { stage: ShaderStage::Fragment, .. })
        ));

        let handle = backend.create_program("basic", &trivial_source()).unwrap();
        assert_eq!(backend.program_by_name("basic"), Some(handle));
    }

    #[test]
    fn test_uniform_keeps_latest_value() {
        let mut backend = HeadlessBackend::new();
        let program = backend.create_program("basic", &trivial_source()).unwrap();

        backend.set_uniform(program, "u_value", UniformValue::Float(1.0)).unwrap();
        backend.set_uniform(program, "u_value", UniformValue::Float(2.0)).unwrap();

        assert_eq!(backend.uniform(program, "u_value"), Some(&UniformValue::Float(2.0)));
        assert_eq!(backend.commands().len(), 2);
    }

    #[test]
    fn test_unknown_program_is_rejected() {
        let mut backend = HeadlessBackend::new();
        let result = backend.set_uniform(ProgramHandle(7), "u_value", UniformValue::Float(1.0));
        assert!(matches!(result, Err(RenderError::UnknownResource(_))));
    }

    #[test]
    fn test_draw_range_is_checked() {
        let mut backend = HeadlessBackend::new();
        let program = backend.create_program("basic", &trivial_source()).unwrap();
        let buffer = backend
            .create_vertex_buffer(&[0.0; 24], VertexLayout::POSITION_TEX_NORMAL)
            .unwrap();

        backend
            .draw_arrays(program, buffer, PrimitiveTopology::Triangles, 0, 3)
            .unwrap();
        assert!(matches!(
            backend.draw_arrays(program, buffer, PrimitiveTopology::Triangles, 1, 3),
            Err(RenderError::DrawOutOfRange { requested: 4, available: 3 })
        ));
    }

    #[test]
    fn test_ragged_vertex_buffer_is_rejected() {
        let mut backend = HeadlessBackend::new();
        let result = backend.create_vertex_buffer(&[0.0; 10], VertexLayout::POSITION_TEX_NORMAL);
        assert!(matches!(result, Err(RenderError::InvalidBuffer(_))));
    }

    #[test]
    fn test_draw_records_state_and_bindings() {
        let mut backend = HeadlessBackend::new();
        let program = backend.create_program("basic", &trivial_source()).unwrap();
        let buffer = backend.create_vertex_buffer(&[0.0; 8], VertexLayout::POSITION_TEX_NORMAL).unwrap();
        let texture = backend
            .create_texture(&ImageData::solid_color(2, 2, [255; 4]), TextureOptions::default())
            .unwrap();

        backend.bind_texture(3, Some(texture)).unwrap();
        backend.set_state(RenderStateFlags::DEPTH_TEST, false);
        backend.draw_arrays(program, buffer, PrimitiveTopology::Triangles, 0, 1).unwrap();

        let draw = backend.draw_calls().next().unwrap();
        assert!(!draw.state.contains(RenderStateFlags::DEPTH_TEST));
        assert!(draw.state.contains(RenderStateFlags::CULL_FACE));
        assert_eq!(draw.textures, vec![(3, texture)]);
        assert_eq!(draw.target, None);
    }

    #[test]
    fn test_texture_unit_bounds() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.bind_texture(31, None).is_ok());
        assert!(matches!(
            backend.bind_texture(MAX_TEXTURE_UNITS, None),
            Err(RenderError::InvalidTextureUnit(32))
        ));
    }

    #[test]
    fn test_render_target_owns_color_textures() {
        let mut backend = HeadlessBackend::new();
        let target = backend
            .create_render_target(&RenderTargetDesc {
                width: 64,
                height: 32,
                color_attachments: 2,
                depth: true,
            })
            .unwrap();

        assert_eq!(target.color.len(), 2);
        assert_eq!(backend.texture_size(target.color[1]), Some((64, 32)));

        backend.bind_render_target(Some(target.handle)).unwrap();
        assert_eq!(backend.bound_render_target(), Some(target.handle));
        assert!(backend.bind_render_target(Some(RenderTargetHandle(9))).is_err());
    }
}
