//! Asset loading
//!
//! Loaders for the files a scene is built from: Wavefront OBJ geometry, MTL
//! material libraries, texture images and GLSL shader sources. Every loader
//! runs during scene setup, and every failure is fatal to that setup.

pub mod image_loader;
pub mod mtl_parser;
pub mod obj_loader;

use std::path::{Path, PathBuf};

pub use image_loader::ImageData;
pub use mtl_parser::{MtlData, MtlParser};
pub use obj_loader::ObjLoader;

/// File name of the vertex stage inside a program directory
pub const VERTEX_SHADER_FILE: &str = "vertex.glsl";

/// File name of the fragment stage inside a program directory
pub const FRAGMENT_SHADER_FILE: &str = "fragment.glsl";

/// Asset loading errors
#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    /// The file does not exist
    #[error("Asset not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Malformed text asset
    #[error("{origin}:{line}: {message}")]
    Parse {
        /// File (or label) the text came from
        origin: String,
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Image decoding failed
    #[error("Failed to decode image {origin}: {source}")]
    Image {
        /// File (or label) the bytes came from
        origin: String,
        /// Underlying decoder error
        #[source]
        source: image::ImageError,
    },
}

impl AssetError {
    pub(crate) fn parse(origin: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            origin: origin.to_string(),
            line,
            message: message.into(),
        }
    }
}

/// Read a whole text file, mapping a missing file to [`AssetError::NotFound`]
pub fn read_text(path: impl AsRef<Path>) -> Result<String, AssetError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            AssetError::NotFound(path.to_path_buf())
        } else {
            AssetError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Vertex and fragment source text of one shading program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    /// Vertex stage source
    pub vertex: String,
    /// Fragment stage source
    pub fragment: String,
}

impl ShaderSource {
    /// Create a shader source pair from in-memory text
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// Load `vertex.glsl` and `fragment.glsl` from a program directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, AssetError> {
        let dir = dir.as_ref();
        log::debug!("Loading shader sources from {}", dir.display());

        Ok(Self {
            vertex: read_text(dir.join(VERTEX_SHADER_FILE))?,
            fragment: read_text(dir.join(FRAGMENT_SHADER_FILE))?,
        })
    }
}
