//! OBJ file loader for 3D models
//!
//! Produces non-indexed triangle lists. Every face corner becomes a full
//! interleaved vertex; polygons with more than three corners are split into a
//! triangle fan around their first corner.

use std::path::Path;

use crate::assets::{read_text, AssetError};
use crate::render::mesh::{Geometry, Vertex};

/// Wavefront OBJ loader
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Geometry, AssetError> {
        let path = path.as_ref();
        let source = read_text(path)?;
        let geometry = Self::parse(&source, &path.display().to_string())?;

        log::debug!(
            "Loaded {} ({} vertices, {} triangles)",
            path.display(),
            geometry.vertex_count(),
            geometry.vertex_count() / 3
        );
        Ok(geometry)
    }

    /// Parse OBJ text. `origin` labels error messages.
    ///
    /// Corners without a texture coordinate get `(0, 0)`; corners without a
    /// normal get `(0, 0, 0)`.
    pub fn parse(source: &str, origin: &str) -> Result<Geometry, AssetError> {
        let mut positions: Vec<[f32; 3]> = Vec::new();
        let mut tex_coords: Vec<[f32; 2]> = Vec::new();
        let mut normals: Vec<[f32; 3]> = Vec::new();
        let mut vertices = Vec::new();

        for (index, line) in source.lines().enumerate() {
            let line_number = index + 1;
            let mut tokens = line.split_whitespace();

            match tokens.next() {
                Some("v") => positions.push(parse_floats(&mut tokens, origin, line_number)?),
                Some("vt") => tex_coords.push(parse_floats(&mut tokens, origin, line_number)?),
                Some("vn") => normals.push(parse_floats(&mut tokens, origin, line_number)?),
                Some("f") => {
                    let corners = tokens
                        .map(|corner| {
                            let refs = FaceCorner::parse(corner, origin, line_number)?;
                            refs.resolve(&positions, &tex_coords, &normals, origin, line_number)
                        })
                        .collect::<Result<Vec<_>, _>>()?;

                    if corners.len() < 3 {
                        return Err(AssetError::parse(
                            origin,
                            line_number,
                            format!("face needs at least 3 corners, found {}", corners.len()),
                        ));
                    }

                    for i in 1..corners.len() - 1 {
                        vertices.extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                    }
                }
                // Comments, groups, smoothing, material references
                _ => {}
            }
        }

        Ok(Geometry::new(vertices))
    }
}

/// Parse exactly `N` leading floats. Extra components (such as a `w` on `v`
/// or a third `vt` coordinate) are ignored.
fn parse_floats<'a, const N: usize>(
    tokens: &mut impl Iterator<Item = &'a str>,
    origin: &str,
    line: usize,
) -> Result<[f32; N], AssetError> {
    let mut values = [0.0; N];
    for value in &mut values {
        let token = tokens
            .next()
            .ok_or_else(|| AssetError::parse(origin, line, format!("expected {} components", N)))?;
        *value = token
            .parse()
            .map_err(|_| AssetError::parse(origin, line, format!("invalid number '{token}'")))?;
    }
    Ok(values)
}

/// Raw `v/t/n` references of one face corner, still 1-based or negative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FaceCorner {
    position: i64,
    tex_coord: Option<i64>,
    normal: Option<i64>,
}

impl FaceCorner {
    fn parse(corner: &str, origin: &str, line: usize) -> Result<Self, AssetError> {
        let mut parts = corner.split('/');
        let parse_index = |part: Option<&str>| -> Result<Option<i64>, AssetError> {
            match part {
                None | Some("") => Ok(None),
                Some(text) => text.parse().map(Some).map_err(|_| {
                    AssetError::parse(origin, line, format!("invalid index '{text}' in '{corner}'"))
                }),
            }
        };

        let position = parse_index(parts.next())?
            .ok_or_else(|| AssetError::parse(origin, line, format!("missing position index in '{corner}'")))?;
        let tex_coord = parse_index(parts.next())?;
        let normal = parse_index(parts.next())?;

        Ok(Self {
            position,
            tex_coord,
            normal,
        })
    }

    fn resolve(
        self,
        positions: &[[f32; 3]],
        tex_coords: &[[f32; 2]],
        normals: &[[f32; 3]],
        origin: &str,
        line: usize,
    ) -> Result<Vertex, AssetError> {
        let position = *lookup(positions, self.position, "position", origin, line)?;
        let tex_coord = match self.tex_coord {
            Some(index) => *lookup(tex_coords, index, "texture coordinate", origin, line)?,
            None => [0.0, 0.0],
        };
        let normal = match self.normal {
            Some(index) => *lookup(normals, index, "normal", origin, line)?,
            None => [0.0, 0.0, 0.0],
        };

        Ok(Vertex::new(position, tex_coord, normal))
    }
}

/// Resolve a 1-based (or negative, counted from the end) OBJ index
fn lookup<'a, T>(
    items: &'a [T],
    index: i64,
    kind: &str,
    origin: &str,
    line: usize,
) -> Result<&'a T, AssetError> {
    let resolved = match index {
        i if i > 0 => usize::try_from(i - 1).ok(),
        i if i < 0 => usize::try_from(i.unsigned_abs())
            .ok()
            .and_then(|back| items.len().checked_sub(back)),
        _ => None,
    };

    resolved.and_then(|i| items.get(i)).ok_or_else(|| {
        AssetError::parse(
            origin,
            line,
            format!("{kind} index {index} out of range (have {})", items.len()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# one triangle
v 0.0 0.0 0.0
v 1.0 0.0 0.0
v 0.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.0 1.0
vn 0.0 0.0 1.0
f 1/1/1 2/2/1 3/3/1
";

    #[test]
    fn test_parse_full_corners() {
        let geometry = ObjLoader::parse(TRIANGLE, "triangle.obj").unwrap();
        assert_eq!(geometry.vertex_count(), 3);

        let floats = geometry.as_floats();
        assert_eq!(floats.len(), 24);
        assert_eq!(&floats[8..16], &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_attributes_use_defaults() {
        let source = "v 1 2 3\nv 4 5 6\nv 7 8 9\nvn 0 1 0\nf 1 2//1 3\n";
        let geometry = ObjLoader::parse(source, "defaults.obj").unwrap();
        let vertices = geometry.vertices();

        assert_eq!(vertices[0], Vertex::new([1.0, 2.0, 3.0], [0.0, 0.0], [0.0, 0.0, 0.0]));
        assert_eq!(vertices[1].normal, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].tex_coord, [0.0, 0.0]);
    }

    #[test]
    fn test_quad_is_fan_triangulated() {
        let source = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let geometry = ObjLoader::parse(source, "quad.obj").unwrap();
        let positions: Vec<[f32; 3]> = geometry.vertices().iter().map(|v| v.position).collect();

        assert_eq!(
            positions,
            vec![
                [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0],
                [0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0],
            ]
        );
    }

    #[test]
    fn test_negative_indices_count_from_end() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\n";
        let geometry = ObjLoader::parse(source, "relative.obj").unwrap();
        assert_eq!(geometry.vertices()[2].position, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_out_of_range_index_reports_line() {
        let source = "v 0 0 0\nv 1 0 0\n\nf 1 2 3\n";
        match ObjLoader::parse(source, "broken.obj") {
            Err(AssetError::Parse { line, message, .. }) => {
                assert_eq!(line, 4);
                assert!(message.contains("position index 3"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_number_is_error() {
        let result = ObjLoader::parse("v 0 zero 0\n", "bad.obj");
        assert!(matches!(result, Err(AssetError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_degenerate_face_is_error() {
        let result = ObjLoader::parse("v 0 0 0\nv 1 0 0\nf 1 2\n", "line.obj");
        assert!(matches!(result, Err(AssetError::Parse { line: 3, .. })));
    }

    #[test]
    fn test_ignores_unknown_records() {
        let source = format!("mtllib scene.mtl\no Triangle\ns off\nusemtl Red\n{TRIANGLE}");
        let geometry = ObjLoader::parse(&source, "extras.obj").unwrap();
        assert_eq!(geometry.vertex_count(), 3);
    }
}
