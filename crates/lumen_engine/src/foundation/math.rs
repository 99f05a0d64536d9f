//! Linear algebra kernel
//!
//! Vector and matrix operations for the transform and lighting pipeline.
//!
//! ## Storage Convention
//!
//! Every matrix is column-major. `Mat4::as_slice()` yields the 16 floats in
//! the flat order shading programs consume, and element `(row, col)` lives at
//! flat index `col * N + row`. Every operation in this module (multiply,
//! translate, scale, rotate, look-at, perspective) encodes into that single
//! layout.
//!
//! ## Failure Policy
//!
//! Operations never return errors. Degenerate inputs (zero-length vectors,
//! singular matrices) propagate as NaN/Inf. Callers that need a guard use the
//! `try_*` variants.

pub use nalgebra::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type (positions, directions, colors)
pub type Vec3 = Vector3<f32>;

/// 4D vector type (homogeneous positions; `w = 0` marks a direction)
pub type Vec4 = Vector4<f32>;

/// 2x2 matrix type
pub type Mat2 = Matrix2<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Determinants at or below this magnitude are treated as singular by the
/// guarded inverse.
pub const SINGULAR_DETERMINANT: f32 = 1e-12;

/// Convert degrees to radians
pub fn to_radians(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Three-component vector operations
pub mod vec3 {
    use super::{Mat3, Vec3};

    /// Cross product `a × b`
    pub fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
        Vec3::new(
            a.y * b.z - a.z * b.y,
            a.z * b.x - a.x * b.z,
            a.x * b.y - a.y * b.x,
        )
    }

    /// Dot product
    pub fn dot(a: &Vec3, b: &Vec3) -> f32 {
        a.x * b.x + a.y * b.y + a.z * b.z
    }

    /// Divide `v` in place by its Euclidean norm.
    ///
    /// A zero-length vector becomes NaN. Guard with [`try_normalized`] when
    /// the input may collapse.
    pub fn normalize(v: &mut Vec3) {
        let length = dot(v, v).sqrt();
        v.x /= length;
        v.y /= length;
        v.z /= length;
    }

    /// Normalized copy of `v`, or `None` when `v` has no usable length
    pub fn try_normalized(v: &Vec3) -> Option<Vec3> {
        let length = dot(v, v).sqrt();
        if length > f32::EPSILON && length.is_finite() {
            Some(v / length)
        } else {
            None
        }
    }

    /// Rotate `point` about the vertical axis passing through `origin`
    pub fn rotate_around_y(point: &Vec3, origin: &Vec3, radians: f32) -> Vec3 {
        let relative = point - origin;
        let (sin, cos) = radians.sin_cos();

        Vec3::new(
            cos * relative.x + sin * relative.z + origin.x,
            point.y,
            -sin * relative.x + cos * relative.z + origin.z,
        )
    }

    /// Transform `v` by `m` (`m · v`, column vector convention)
    pub fn multiply_by_mat3(v: &Vec3, m: &Mat3) -> Vec3 {
        Vec3::new(
            v.x * m[0] + v.y * m[3] + v.z * m[6],
            v.x * m[1] + v.y * m[4] + v.z * m[7],
            v.x * m[2] + v.y * m[5] + v.z * m[8],
        )
    }
}

/// Two-by-two matrix operations
pub mod mat2 {
    use super::Mat2;

    /// Determinant of a 2x2 matrix
    pub fn determinant(m: &Mat2) -> f32 {
        m[0] * m[3] - m[2] * m[1]
    }
}

/// Three-by-three matrix operations
pub mod mat3 {
    use super::{mat2, Mat2, Mat3, Mat4, SINGULAR_DETERMINANT};

    /// Extract the rotation/scale block (upper-left 3x3) of a 4x4 matrix
    pub fn from_mat4_upper_left(m: &Mat4) -> Mat3 {
        m.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Identity matrix
    pub fn identity() -> Mat3 {
        Mat3::identity()
    }

    /// Determinant by the rule of Sarrus
    pub fn determinant(m: &Mat3) -> f32 {
        m[0] * m[4] * m[8] + m[3] * m[7] * m[2] + m[6] * m[1] * m[5]
            - m[2] * m[4] * m[6]
            - m[5] * m[7] * m[0]
            - m[8] * m[1] * m[3]
    }

    /// Determinant of the 2x2 minor left after deleting `row` and `col`.
    ///
    /// `row` and `col` are 1-indexed, as in the classical adjugate formula.
    pub fn adjugate_minor(m: &Mat3, row: usize, col: usize) -> f32 {
        debug_assert!((1..=3).contains(&row) && (1..=3).contains(&col));

        let mut minor = [0.0_f32; 4];
        let mut next = 0;
        for c in (0..3).filter(|&c| c != col - 1) {
            for r in (0..3).filter(|&r| r != row - 1) {
                minor[next] = m[(r, c)];
                next += 1;
            }
        }

        mat2::determinant(&Mat2::from_column_slice(&minor))
    }

    /// Inverse as adjugate over determinant.
    ///
    /// A singular input yields Inf/NaN entries; see [`try_inverse`].
    pub fn inverse(m: &Mat3) -> Mat3 {
        let inv_det = 1.0 / determinant(m);

        Mat3::from_fn(|r, c| {
            let sign = if (r + c) % 2 == 0 { 1.0 } else { -1.0 };
            sign * inv_det * adjugate_minor(m, c + 1, r + 1)
        })
    }

    /// Inverse, or `None` for a singular or non-finite matrix
    pub fn try_inverse(m: &Mat3) -> Option<Mat3> {
        let det = determinant(m);
        if det.abs() <= SINGULAR_DETERMINANT || !det.is_finite() {
            return None;
        }
        Some(inverse(m))
    }

    /// Transpose
    pub fn transpose(m: &Mat3) -> Mat3 {
        Mat3::from_fn(|r, c| m[(c, r)])
    }

    /// Inverse of the transpose, the matrix that carries surface normals
    /// through a transform with non-uniform scale
    pub fn inverse_transpose(m: &Mat3) -> Mat3 {
        transpose(&inverse(m))
    }

    /// Product `a · b`
    pub fn multiply(a: &Mat3, b: &Mat3) -> Mat3 {
        a * b
    }
}

/// Four-by-four matrix operations
pub mod mat4 {
    use super::{vec3, Mat4, Vec3};

    /// Product `a · b`.
    ///
    /// Transforming a column vector by the result applies `b` first, then `a`.
    pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
        Mat4::from_fn(|r, c| {
            a[(r, 0)] * b[(0, c)]
                + a[(r, 1)] * b[(1, c)]
                + a[(r, 2)] * b[(2, c)]
                + a[(r, 3)] * b[(3, c)]
        })
    }

    /// Identity matrix
    pub fn identity() -> Mat4 {
        Mat4::identity()
    }

    /// `a · T(v)`
    pub fn translate(a: &Mat4, v: &Vec3) -> Mat4 {
        multiply(a, &Mat4::new_translation(v))
    }

    /// `a · S(v)`
    pub fn scale(a: &Mat4, v: &Vec3) -> Mat4 {
        multiply(a, &Mat4::new_nonuniform_scaling(v))
    }

    /// `a · R(axis, radians)` using the Rodrigues axis-angle matrix.
    ///
    /// `axis` must be unit length.
    pub fn rotate(a: &Mat4, radians: f32, axis: &Vec3) -> Mat4 {
        let (s, c) = radians.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.x, axis.y, axis.z);

        #[rustfmt::skip]
        let rotation = Mat4::new(
            c + x * x * t,     x * y * t - z * s, x * z * t + y * s, 0.0,
            y * x * t + z * s, c + y * y * t,     y * z * t - x * s, 0.0,
            z * x * t - y * s, z * y * t + x * s, c + z * z * t,     0.0,
            0.0,               0.0,               0.0,               1.0,
        );

        multiply(a, &rotation)
    }

    /// Right-handed view matrix looking from `eye` toward `look`.
    ///
    /// Basis: `n = normalize(eye - look)` (camera looks down `-n`),
    /// `u = normalize(up × n)`, `v = normalize(n × u)`. The basis vectors
    /// form the rows of the rotation block and the translation column is
    /// `-(u·eye, v·eye, n·eye)`.
    pub fn look_at(eye: &Vec3, look: &Vec3, up: &Vec3) -> Mat4 {
        let mut n = eye - look;
        let mut u = vec3::cross(up, &n);
        let mut v = vec3::cross(&n, &u);

        vec3::normalize(&mut u);
        vec3::normalize(&mut v);
        vec3::normalize(&mut n);

        #[rustfmt::skip]
        let view = Mat4::new(
            u.x, u.y, u.z, -vec3::dot(&u, eye),
            v.x, v.y, v.z, -vec3::dot(&v, eye),
            n.x, n.y, n.z, -vec3::dot(&n, eye),
            0.0, 0.0, 0.0, 1.0,
        );
        view
    }

    /// Perspective projection from a vertical field of view (radians).
    ///
    /// This is the symmetric OpenGL frustum matrix with every entry divided
    /// by `near`, which is the same projective transform. Flat column-major
    /// entries: `[0] = 1/right`, `[5] = 1/top`, `[10] = -(f+n)/(f-n)/n`,
    /// `[11] = -1/n`, `[14] = -2f/(f-n)`, where `top = tan(fovy/2)·near` and
    /// `right = top·aspect`.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let top = (fov_y / 2.0).tan() * near;
        let bottom = -top;
        let right = top * aspect;
        let left = -right;

        let mut out = Mat4::zeros();
        out[(0, 0)] = 2.0 / (right - left);
        out[(1, 1)] = 2.0 / (top - bottom);
        out[(0, 2)] = (right + left) / (right - left) / near;
        out[(1, 2)] = (top + bottom) / (top - bottom) / near;
        out[(2, 2)] = -(far + near) / (far - near) / near;
        out[(3, 2)] = -1.0 / near;
        out[(2, 3)] = -2.0 * far / (far - near);
        out
    }
}
