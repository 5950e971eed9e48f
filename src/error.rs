//! Errors raised while assembling a scene and building its BVH.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The builder was handed nothing to partition
    #[error("cannot build a BVH over an empty primitive set")]
    EmptyPrimitiveSet,

    /// A mesh source produced no triangles
    #[error("mesh {mesh} yields no triangles")]
    EmptyMesh { mesh: String },

    /// Scene assembly ended without any triangle (spheres are not partitioned)
    #[error("scene has no triangles to build a BVH over")]
    NoTriangles,

    /// A primitive references a material missing from the material table
    #[error("material index {index} out of range (material count: {count})")]
    MaterialOutOfRange { index: u32, count: usize },

    /// Index buffer not made of whole triangles or pointing past the positions
    #[error("mesh {mesh} has malformed indices ({count} indices)")]
    MalformedIndices { mesh: String, count: usize },

    /// glTF import failed
    #[error("failed to import glTF {}: {error}", .path.display())]
    Gltf {
        path: PathBuf,
        #[source]
        error: gltf::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
