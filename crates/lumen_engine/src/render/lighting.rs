//! Lights and light groups
//!
//! A [`Light`] is a Phong light parameter set. Its position is homogeneous:
//! `w = 0` makes it a directional light shining along `xyz`, `w = 1` a point
//! light located at `xyz`.
//!
//! A [`LightGroup`] exposes its lights to shading programs as the indexed
//! uniform array `u_lights[i]`. A light's slot is its position in the group at
//! the moment the group is applied, so reordering the group reassigns slots.

use crate::foundation::math::{Vec3, Vec4};
use crate::render::backend::{ProgramHandle, RenderBackend, UniformValue};
use crate::render::{RenderError, RenderResult};

/// Maximum lights a group may expose. Shading programs size `u_lights`
/// to match.
pub const MAX_LIGHTS: usize = 8;

/// Uniform receiving the number of active lights of a group
pub const LIGHT_COUNT_UNIFORM: &str = "u_lightCount";

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Homogeneous position (`w = 1`) or direction (`w = 0`)
    pub position: Vec4,
    /// Ambient contribution
    pub ambient: Vec3,
    /// Diffuse contribution
    pub diffuse: Vec3,
    /// Specular contribution
    pub specular: Vec3,
}

impl Light {
    /// Create a light from a homogeneous position
    pub fn new(position: Vec4, ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        Self {
            position,
            ambient,
            diffuse,
            specular,
        }
    }

    /// Directional light shining along `direction`
    pub fn directional(direction: Vec3, ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        Self::new(direction.push(0.0), ambient, diffuse, specular)
    }

    /// Point light located at `position`
    pub fn point(position: Vec3, ambient: Vec3, diffuse: Vec3, specular: Vec3) -> Self {
        Self::new(position.push(1.0), ambient, diffuse, specular)
    }

    /// Whether this light has no position, only a direction
    pub fn is_directional(&self) -> bool {
        self.position.w == 0.0
    }

    /// Push this light as the standalone `u_lightPos`, `u_lightAmbient`,
    /// `u_lightDiffuse` and `u_lightSpecular` uniforms
    pub fn apply(&self, backend: &mut dyn RenderBackend, program: ProgramHandle) -> RenderResult<()> {
        backend.set_uniform(program, "u_lightPos", UniformValue::Vec4(self.position))?;
        backend.set_uniform(program, "u_lightAmbient", UniformValue::Vec3(self.ambient))?;
        backend.set_uniform(program, "u_lightDiffuse", UniformValue::Vec3(self.diffuse))?;
        backend.set_uniform(program, "u_lightSpecular", UniformValue::Vec3(self.specular))?;
        Ok(())
    }

    /// Push this light into slot `slot` of the `u_lights` array
    pub fn apply_to_slot(
        &self,
        backend: &mut dyn RenderBackend,
        program: ProgramHandle,
        slot: usize,
    ) -> RenderResult<()> {
        backend.set_uniform(program, &format!("u_lights[{slot}].position"), UniformValue::Vec4(self.position))?;
        backend.set_uniform(program, &format!("u_lights[{slot}].ambient"), UniformValue::Vec3(self.ambient))?;
        backend.set_uniform(program, &format!("u_lights[{slot}].diffuse"), UniformValue::Vec3(self.diffuse))?;
        backend.set_uniform(program, &format!("u_lights[{slot}].specular"), UniformValue::Vec3(self.specular))?;
        Ok(())
    }
}

/// Ordered collection of lights exposed as an indexed uniform array
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightGroup {
    lights: Vec<Light>,
}

impl LightGroup {
    /// Create a group from lights in slot order
    pub fn new(lights: Vec<Light>) -> Self {
        Self { lights }
    }

    /// Append a light; it takes the next slot
    pub fn push(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Remove and return the light at `index`; later lights move down a slot
    pub fn remove(&mut self, index: usize) -> Option<Light> {
        (index < self.lights.len()).then(|| self.lights.remove(index))
    }

    /// Lights in slot order
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Mutable access for reordering or editing lights between frames
    pub fn lights_mut(&mut self) -> &mut Vec<Light> {
        &mut self.lights
    }

    /// Number of lights
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Whether the group has no lights
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Push every light into its positional slot, then `u_lightCount`
    pub fn apply(&self, backend: &mut dyn RenderBackend, program: ProgramHandle) -> RenderResult<()> {
        if self.lights.len() > MAX_LIGHTS {
            return Err(RenderError::TooManyLights {
                count: self.lights.len(),
                max: MAX_LIGHTS,
            });
        }

        for (slot, light) in self.lights.iter().enumerate() {
            light.apply_to_slot(backend, program, slot)?;
        }

        let count = i32::try_from(self.lights.len()).unwrap_or(i32::MAX);
        backend.set_uniform(program, LIGHT_COUNT_UNIFORM, UniformValue::Int(count))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ShaderSource;
    use crate::render::HeadlessBackend;

    fn backend_with_program() -> (HeadlessBackend, ProgramHandle) {
        let mut backend = HeadlessBackend::new();
        let program = backend
            .create_program("basic", &ShaderSource::new("void main() {}", "void main() {}"))
            .unwrap();
        (backend, program)
    }

    fn main_light() -> Light {
        Light::directional(
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        )
    }

    fn red_point_light() -> Light {
        Light::point(
            Vec3::new(-1.0, 0.0, 3.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        )
    }

    #[test]
    fn test_light_kinds() {
        assert!(main_light().is_directional());
        assert!(!red_point_light().is_directional());
        assert_eq!(red_point_light().position, Vec4::new(-1.0, 0.0, 3.0, 1.0));
    }

    #[test]
    fn test_standalone_light_uniforms() {
        let (mut backend, program) = backend_with_program();
        red_point_light().apply(&mut backend, program).unwrap();

        assert_eq!(
            backend.uniform(program, "u_lightPos"),
            Some(&UniformValue::Vec4(Vec4::new(-1.0, 0.0, 3.0, 1.0)))
        );
        assert_eq!(
            backend.uniform(program, "u_lightDiffuse"),
            Some(&UniformValue::Vec3(Vec3::new(1.0, 0.0, 0.0)))
        );
    }

    #[test]
    fn test_group_assigns_positional_slots() {
        let (mut backend, program) = backend_with_program();
        let group = LightGroup::new(vec![main_light(), red_point_light()]);

        group.apply(&mut backend, program).unwrap();

        assert_eq!(
            backend.uniform(program, "u_lights[0].position"),
            Some(&UniformValue::Vec4(main_light().position))
        );
        assert_eq!(
            backend.uniform(program, "u_lights[1].diffuse"),
            Some(&UniformValue::Vec3(Vec3::new(1.0, 0.0, 0.0)))
        );
        assert_eq!(backend.uniform(program, LIGHT_COUNT_UNIFORM), Some(&UniformValue::Int(2)));
    }

    fn green_point_light() -> Light {
        Light::point(
            Vec3::new(2.0, 1.0, 0.0),
            Vec3::new(0.1, 0.1, 0.1),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )
    }

    fn slot_position(backend: &HeadlessBackend, program: ProgramHandle, slot: usize) -> Option<&UniformValue> {
        backend.uniform(program, &format!("u_lights[{slot}].position"))
    }

    #[test]
    fn test_reorder_reassigns_slots() {
        let (mut backend, program) = backend_with_program();
        let lights = [main_light(), red_point_light(), green_point_light()];
        let mut group = LightGroup::new(lights.to_vec());
        group.apply(&mut backend, program).unwrap();

        for (slot, light) in lights.iter().enumerate() {
            assert_eq!(slot_position(&backend, program, slot), Some(&UniformValue::Vec4(light.position)));
        }

        // [main, red, green] -> [red, green, main]
        group.lights_mut().rotate_left(1);
        group.apply(&mut backend, program).unwrap();

        let rotated = [red_point_light(), green_point_light(), main_light()];
        for (slot, light) in rotated.iter().enumerate() {
            assert_eq!(slot_position(&backend, program, slot), Some(&UniformValue::Vec4(light.position)));
        }
        assert_eq!(
            backend.uniform(program, "u_lights[1].diffuse"),
            Some(&UniformValue::Vec3(Vec3::new(0.0, 1.0, 0.0)))
        );
        assert_eq!(backend.uniform(program, LIGHT_COUNT_UNIFORM), Some(&UniformValue::Int(3)));
    }

    #[test]
    fn test_remove_shifts_later_lights() {
        let mut group = LightGroup::new(vec![main_light(), red_point_light()]);
        assert_eq!(group.remove(0), Some(main_light()));
        assert_eq!(group.lights()[0], red_point_light());
        assert_eq!(group.remove(5), None);
    }

    #[test]
    fn test_too_many_lights() {
        let (mut backend, program) = backend_with_program();
        let group = LightGroup::new(vec![main_light(); MAX_LIGHTS + 1]);

        assert!(matches!(
            group.apply(&mut backend, program),
            Err(RenderError::TooManyLights { count: 9, max: 8 })
        ));
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_empty_group_reports_zero_lights() {
        let (mut backend, program) = backend_with_program();
        LightGroup::default().apply(&mut backend, program).unwrap();
        assert_eq!(backend.uniform(program, LIGHT_COUNT_UNIFORM), Some(&UniformValue::Int(0)));
    }
}
