//! MTL (Material Template Library) file parser
//!
//! Parses Wavefront .mtl files into Phong material records. Statements the
//! renderer has no use for are skipped.

use std::collections::HashMap;
use std::path::Path;
use std::str::SplitWhitespace;

use crate::assets::{read_text, AssetError};
use crate::foundation::math::Vec3;

/// Parsed MTL material data (Wavefront Phong model)
#[derive(Debug, Clone, PartialEq)]
pub struct MtlData {
    /// Material name
    pub name: String,
    /// Ambient color (Ka)
    pub ambient: Vec3,
    /// Diffuse color (Kd)
    pub diffuse: Vec3,
    /// Specular color (Ks)
    pub specular: Vec3,
    /// Emission color (Ke)
    pub emission: Vec3,
    /// Specular exponent (Ns)
    pub specular_exponent: f32,
    /// Opacity (d, or 1 - Tr)
    pub dissolve: f32,
    /// Illumination model (illum)
    pub illumination_model: u32,
    /// Diffuse texture map (map_Kd)
    pub diffuse_map: Option<String>,
}

impl Default for MtlData {
    fn default() -> Self {
        Self {
            name: String::new(),
            ambient: Vec3::new(0.2, 0.2, 0.2),
            diffuse: Vec3::new(0.8, 0.8, 0.8),
            specular: Vec3::new(1.0, 1.0, 1.0),
            emission: Vec3::zeros(),
            specular_exponent: 1.0,
            dissolve: 1.0,
            illumination_model: 2,
            diffuse_map: None,
        }
    }
}

/// MTL file parser
pub struct MtlParser;

impl MtlParser {
    /// Load and parse an MTL file
    pub fn load(path: impl AsRef<Path>) -> Result<HashMap<String, MtlData>, AssetError> {
        let path = path.as_ref();
        let materials = Self::parse(&read_text(path)?, &path.display().to_string())?;
        log::debug!("Loaded {} material(s) from {}", materials.len(), path.display());
        Ok(materials)
    }

    /// Parse MTL file contents into a map of material name -> MtlData
    ///
    /// # Arguments
    /// * `contents` - The text contents of the MTL file
    /// * `origin` - Label used in error messages
    pub fn parse(contents: &str, origin: &str) -> Result<HashMap<String, MtlData>, AssetError> {
        let mut materials = HashMap::new();
        let mut current: Option<MtlData> = None;

        for (index, line) in contents.lines().enumerate() {
            let line_number = index + 1;
            let mut tokens = line.split_whitespace();
            let Some(command) = tokens.next() else {
                continue;
            };

            if command == "newmtl" {
                if let Some(done) = current.take() {
                    materials.insert(done.name.clone(), done);
                }
                let name = tokens
                    .next()
                    .ok_or_else(|| AssetError::parse(origin, line_number, "newmtl missing material name"))?;
                current = Some(MtlData {
                    name: name.to_string(),
                    ..MtlData::default()
                });
                continue;
            }

            // Statements before the first newmtl have no material to land in
            let Some(material) = current.as_mut() else {
                continue;
            };

            let mut reader = StatementReader {
                tokens: &mut tokens,
                origin,
                line: line_number,
                command,
            };

            match command {
                "Ka" => material.ambient = reader.vec3()?,
                "Kd" => material.diffuse = reader.vec3()?,
                "Ks" => material.specular = reader.vec3()?,
                "Ke" => material.emission = reader.vec3()?,
                "Ns" => material.specular_exponent = reader.float()?,
                "d" => material.dissolve = reader.float()?,
                "Tr" => material.dissolve = 1.0 - reader.float()?,
                "illum" => material.illumination_model = reader.integer()?,
                "map_Kd" => material.diffuse_map = Some(reader.rest()?),
                _ => {}
            }
        }

        if let Some(done) = current {
            materials.insert(done.name.clone(), done);
        }

        Ok(materials)
    }
}

struct StatementReader<'t, 'a> {
    tokens: &'t mut SplitWhitespace<'a>,
    origin: &'t str,
    line: usize,
    command: &'a str,
}

impl<'a> StatementReader<'_, 'a> {
    fn next_token(&mut self) -> Result<&'a str, AssetError> {
        self.tokens.next().ok_or_else(|| {
            AssetError::parse(self.origin, self.line, format!("{} missing value", self.command))
        })
    }

    fn float(&mut self) -> Result<f32, AssetError> {
        let token = self.next_token()?;
        token.parse().map_err(|_| {
            AssetError::parse(
                self.origin,
                self.line,
                format!("{} invalid float value '{token}'", self.command),
            )
        })
    }

    fn integer(&mut self) -> Result<u32, AssetError> {
        let token = self.next_token()?;
        token.parse().map_err(|_| {
            AssetError::parse(
                self.origin,
                self.line,
                format!("{} invalid integer value '{token}'", self.command),
            )
        })
    }

    fn vec3(&mut self) -> Result<Vec3, AssetError> {
        Ok(Vec3::new(self.float()?, self.float()?, self.float()?))
    }

    /// Texture paths may contain spaces, so they take the rest of the line
    fn rest(&mut self) -> Result<String, AssetError> {
        let parts: Vec<&str> = self.tokens.by_ref().collect();
        if parts.is_empty() {
            return Err(AssetError::parse(
                self.origin,
                self.line,
                format!("{} missing texture path", self.command),
            ));
        }
        Ok(parts.join(" "))
    }
}
