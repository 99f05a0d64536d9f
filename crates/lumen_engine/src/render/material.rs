//! Phong material parameters
//!
//! A material is a plain value holder. Objects share one instance through
//! [`SharedMaterial`], so changing a shared material between frames changes
//! every object that references it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::assets::MtlData;
use crate::foundation::math::Vec3;
use crate::render::backend::{ProgramHandle, RenderBackend, UniformValue};
use crate::render::RenderResult;

/// A material shared by reference between drawable objects
pub type SharedMaterial = Rc<RefCell<Material>>;

/// Phong surface parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Emitted color (`u_mtlEmission`)
    pub emission: Vec3,
    /// Ambient reflectance (`u_mtlAmbient`)
    pub ambient: Vec3,
    /// Diffuse reflectance (`u_mtlDiffuse`)
    pub diffuse: Vec3,
    /// Specular reflectance (`u_mtlSpecular`)
    pub specular: Vec3,
    /// Specular exponent (`u_mtlShininess`)
    pub shininess: f32,
}

impl Material {
    /// Create a material from its five parameters
    pub fn new(emission: Vec3, ambient: Vec3, diffuse: Vec3, specular: Vec3, shininess: f32) -> Self {
        Self {
            emission,
            ambient,
            diffuse,
            specular,
            shininess,
        }
    }

    /// Build a material from a parsed MTL record
    pub fn from_mtl(mtl: &MtlData) -> Self {
        Self::new(
            mtl.emission,
            mtl.ambient,
            mtl.diffuse,
            mtl.specular,
            mtl.specular_exponent,
        )
    }

    /// Set the ambient reflectance
    pub fn with_ambient(mut self, ambient: Vec3) -> Self {
        self.ambient = ambient;
        self
    }

    /// Set the diffuse reflectance
    pub fn with_diffuse(mut self, diffuse: Vec3) -> Self {
        self.diffuse = diffuse;
        self
    }

    /// Wrap into a [`SharedMaterial`]
    pub fn shared(self) -> SharedMaterial {
        Rc::new(RefCell::new(self))
    }

    /// Push the five material uniforms to `program`
    pub fn apply(&self, backend: &mut dyn RenderBackend, program: ProgramHandle) -> RenderResult<()> {
        backend.set_uniform(program, "u_mtlEmission", UniformValue::Vec3(self.emission))?;
        backend.set_uniform(program, "u_mtlAmbient", UniformValue::Vec3(self.ambient))?;
        backend.set_uniform(program, "u_mtlDiffuse", UniformValue::Vec3(self.diffuse))?;
        backend.set_uniform(program, "u_mtlSpecular", UniformValue::Vec3(self.specular))?;
        backend.set_uniform(program, "u_mtlShininess", UniformValue::Float(self.shininess))?;
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(
            Vec3::zeros(),
            Vec3::new(0.1, 0.1, 0.1),
            Vec3::new(0.8, 0.8, 0.8),
            Vec3::new(1.0, 1.0, 1.0),
            20.0,
        )
    }
}
