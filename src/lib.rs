//! Scene assembly and BVH construction for a GPU ray tracer.
//!
//! Triangles are partitioned into a bounding volume hierarchy that is flattened
//! into an index-linked array, ready to be uploaded next to the triangle,
//! material, light and sphere buffers.

pub mod aabb;
pub mod bvh;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gltf_to_scene;
pub mod gpu_models;
pub mod scene;

#[cfg(test)]
mod tests;

pub use crate::bvh::{create_bvh, validate_bvh, BvhStats};
pub use crate::config::{BvhConfig, SplitAxisPolicy};
pub use crate::error::{Error, Result};
pub use crate::scene::{Scene, SceneBuilder};
