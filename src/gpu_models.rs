//! Records uploaded verbatim into GPU storage buffers.
//!
//! Layouts follow std430: a `vec3` is 16-byte aligned and a scalar that follows
//! it fills the fourth lane. Padding is spelled out so every record is `Pod`.

use std::fs;
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::aabb::Aabb;
use crate::geometry::{Material, MaterialType, Sphere, Triangle, Vec3f};

/// Child/primitive index meaning "none".
pub const NO_INDEX: i32 = -1;

fn to_array(v: &Vec3f) -> [f32; 3] {
    [v.x, v.y, v.z]
}

/// 48 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuTriangle {
    pub v0: [f32; 3],
    pub _pad0: u32,
    pub v1: [f32; 3],
    pub _pad1: u32,
    pub v2: [f32; 3],
    pub material_index: u32,
}

/// 32 bytes. `kind` is the `MaterialType` discriminant.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub kind: u32,
    pub _pad0: [u32; 3],
    pub albedo: [f32; 3],
    pub _pad1: u32,
}

/// 32 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub center_and_radius: [f32; 4],
    pub material_index: u32,
    pub _pad: [u32; 3],
}

/// Node of the flattened BVH, 48 bytes.
///
/// Leaf: both child indices are `NO_INDEX` and `primitive_index` points into
/// the triangle array. Internal: two valid child indices, `primitive_index`
/// is `NO_INDEX`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuBvhNode {
    pub min: [f32; 3],
    pub _pad0: u32,
    pub max: [f32; 3],
    pub left_child_index: i32,
    pub right_child_index: i32,
    pub primitive_index: i32,
    pub _pad1: [u32; 2],
}

/// Emissive triangle for light sampling, 8 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub triangle_index: u32,
    pub area: f32,
}

const _: () = assert!(std::mem::size_of::<GpuTriangle>() == 48);
const _: () = assert!(std::mem::size_of::<GpuMaterial>() == 32);
const _: () = assert!(std::mem::size_of::<GpuSphere>() == 32);
const _: () = assert!(std::mem::size_of::<GpuBvhNode>() == 48);
const _: () = assert!(std::mem::size_of::<GpuLight>() == 8);

impl MaterialType {
    pub fn to_gpu(self) -> u32 {
        match self {
            MaterialType::LightSource => 0,
            MaterialType::Lambertian => 1,
            MaterialType::Metal => 2,
            MaterialType::Glass => 3,
        }
    }
}

impl From<&Triangle> for GpuTriangle {
    fn from(t: &Triangle) -> Self {
        GpuTriangle {
            v0: to_array(&t.v0),
            v1: to_array(&t.v1),
            v2: to_array(&t.v2),
            material_index: t.material_index,
            ..Zeroable::zeroed()
        }
    }
}

impl From<&Material> for GpuMaterial {
    fn from(m: &Material) -> Self {
        GpuMaterial {
            kind: m.kind.to_gpu(),
            albedo: to_array(&m.albedo),
            ..Zeroable::zeroed()
        }
    }
}

impl From<&Sphere> for GpuSphere {
    fn from(s: &Sphere) -> Self {
        let c = s.center_and_radius;
        GpuSphere {
            center_and_radius: [c.x, c.y, c.z, c.w],
            material_index: s.material_index,
            ..Zeroable::zeroed()
        }
    }
}

impl GpuBvhNode {
    pub fn new(
        aabb: &Aabb,
        left_child_index: i32,
        right_child_index: i32,
        primitive_index: i32,
    ) -> Self {
        GpuBvhNode {
            min: to_array(&aabb.min),
            max: to_array(&aabb.max),
            left_child_index,
            right_child_index,
            primitive_index,
            ..Zeroable::zeroed()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left_child_index == NO_INDEX && self.right_child_index == NO_INDEX
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(Vec3f::from(self.min), Vec3f::from(self.max))
    }
}

/// Every buffer the renderer uploads for a scene.
#[derive(Debug, Clone, Default)]
pub struct GpuSceneBuffers {
    pub triangles: Vec<GpuTriangle>,
    pub materials: Vec<GpuMaterial>,
    pub bvh_nodes: Vec<GpuBvhNode>,
    pub lights: Vec<GpuLight>,
    pub spheres: Vec<GpuSphere>,
}

impl GpuSceneBuffers {
    pub fn triangles_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.triangles)
    }

    pub fn materials_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.materials)
    }

    pub fn bvh_nodes_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.bvh_nodes)
    }

    pub fn lights_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.lights)
    }

    pub fn spheres_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.spheres)
    }

    /// Writes one raw blob per buffer into `dir`, which must exist.
    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<()> {
        let blobs = [
            ("triangles.bin", self.triangles_bytes()),
            ("materials.bin", self.materials_bytes()),
            ("bvh_nodes.bin", self.bvh_nodes_bytes()),
            ("lights.bin", self.lights_bytes()),
            ("spheres.bin", self.spheres_bytes()),
        ];
        for (name, bytes) in blobs {
            fs::write(dir.join(name), bytes)?;
            log::debug!("wrote {} bytes to {}", bytes.len(), name);
        }
        Ok(())
    }
}
