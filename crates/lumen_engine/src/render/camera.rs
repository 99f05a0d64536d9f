//! # Perspective Camera
//!
//! Holds the view and projection matrices every camera-aware program needs
//! and derives the view-normal matrix from the view on demand.
//!
//! ## Lifecycle
//!
//! A camera starts unconfigured, with zero-filled matrices. It becomes
//! configured once both a view and a projection have been set, either
//! together through [`Camera::configure`] or separately. Applying an
//! unconfigured camera is an error.
//!
//! ## Conventions
//!
//! Right-handed, Y-up. The camera looks down its local `-Z` axis (see
//! [`mat4::look_at`]). Clip depth follows the OpenGL `[-1, 1]` range.

use crate::foundation::math::{mat3, mat4, vec3, Mat3, Mat4, Vec3};
use crate::render::backend::{ProgramHandle, RenderBackend, UniformValue};
use crate::render::{RenderError, RenderResult};

/// Default near clipping distance
pub const DEFAULT_NEAR: f32 = 0.1;

/// Default far clipping distance
pub const DEFAULT_FAR: f32 = 1000.0;

/// Uniform receiving the view matrix
pub const VIEW_UNIFORM: &str = "u_matView";
/// Uniform receiving the projection matrix
pub const PROJECTION_UNIFORM: &str = "u_matProj";
/// Uniform receiving the view-normal matrix
pub const VIEW_NORMAL_UNIFORM: &str = "u_matViewNormal";

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    view: Mat4,
    projection: Mat4,
    has_view: bool,
    has_projection: bool,
    near: f32,
    far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(DEFAULT_NEAR, DEFAULT_FAR)
    }
}

impl Camera {
    /// Create an unconfigured camera with the given clip distances
    pub fn new(near: f32, far: f32) -> Self {
        Self {
            view: Mat4::zeros(),
            projection: Mat4::zeros(),
            has_view: false,
            has_projection: false,
            near,
            far,
        }
    }

    /// Set view and projection in one step
    ///
    /// # Arguments
    /// * `eye` - Camera position in world space
    /// * `look` - Point the camera looks at
    /// * `up` - Approximate up direction, must not be parallel to `look - eye`
    /// * `fov_y` - Vertical field of view in radians
    /// * `aspect` - Viewport width divided by height
    pub fn configure(&mut self, eye: &Vec3, look: &Vec3, up: &Vec3, fov_y: f32, aspect: f32) {
        self.look_at(eye, look, up);
        self.set_perspective(fov_y, aspect);
    }

    /// Build the view matrix from an eye position, target and up vector
    pub fn look_at(&mut self, eye: &Vec3, look: &Vec3, up: &Vec3) {
        self.set_view(mat4::look_at(eye, look, up));
    }

    /// Replace the view matrix
    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
        self.has_view = true;
    }

    /// Build the projection matrix using this camera's clip distances
    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32) {
        self.projection = mat4::perspective(fov_y, aspect, self.near, self.far);
        self.has_projection = true;
    }

    /// Whether a view matrix has been set
    pub fn has_view(&self) -> bool {
        self.has_view
    }

    /// Whether both view and projection have been set
    pub fn is_configured(&self) -> bool {
        self.has_view && self.has_projection
    }

    /// View matrix (zero until set)
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view
    }

    /// Projection matrix (zero until set)
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection
    }

    /// Near clipping distance
    pub fn near(&self) -> f32 {
        self.near
    }

    /// Far clipping distance
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Inverse-transpose of the view's rotation block, recomputed per call
    pub fn view_normal_matrix(&self) -> Mat3 {
        mat3::inverse_transpose(&mat3::from_mat4_upper_left(&self.view))
    }

    /// The view-space `+Z` axis expressed in world space.
    ///
    /// This points from the look target back toward the eye; environment
    /// mapping programs receive it as `u_camDir`.
    pub fn direction(&self) -> Vec3 {
        let inverse = mat3::inverse(&mat3::from_mat4_upper_left(&self.view));
        vec3::multiply_by_mat3(&Vec3::new(0.0, 0.0, 1.0), &inverse)
    }

    /// Push `u_matView`, `u_matProj` and `u_matViewNormal` to `program`
    pub fn apply(&self, backend: &mut dyn RenderBackend, program: ProgramHandle) -> RenderResult<()> {
        if !self.is_configured() {
            return Err(RenderError::CameraNotConfigured);
        }

        backend.set_uniform(program, VIEW_UNIFORM, UniformValue::Mat4(self.view))?;
        backend.set_uniform(program, PROJECTION_UNIFORM, UniformValue::Mat4(self.projection))?;
        backend.set_uniform(program, VIEW_NORMAL_UNIFORM, UniformValue::Mat3(self.view_normal_matrix()))?;
        Ok(())
    }
}
