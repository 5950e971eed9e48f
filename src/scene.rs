use std::path::Path;

use crate::bvh::{create_bvh, index_triangles};
use crate::config::BvhConfig;
use crate::error::{Error, Result};
use crate::geometry::{Fp, Material, MaterialType, Sphere, Triangle, Vec3f};
use crate::gltf_to_scene::load_gltf_triangles;
use crate::gpu_models::{GpuBvhNode, GpuLight, GpuSceneBuffers};

/// Emissive triangle, sampled directly by the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub triangle_index: u32,
    pub area: Fp,
}

/// Fully assembled scene. Read-only once built.
#[derive(Debug)]
pub struct Scene {
    pub triangles: Vec<Triangle>,
    pub spheres: Vec<Sphere>,
    pub materials: Vec<Material>,
    pub lights: Vec<Light>,
    pub bvh_nodes: Vec<GpuBvhNode>,
}

/// Splits an indexed mesh into triangles; each consecutive index triple is one
/// triangle.
pub fn triangles_from_indexed_mesh(
    mesh: &str,
    positions: &[Vec3f],
    indices: &[u32],
    material_index: u32,
) -> Result<Vec<Triangle>> {
    let malformed = || Error::MalformedIndices {
        mesh: mesh.to_string(),
        count: indices.len(),
    };
    if indices.len() % 3 != 0 {
        return Err(malformed());
    }
    let mut triangles = Vec::with_capacity(indices.len() / 3);
    for triangle in indices.chunks_exact(3) {
        let vertex = |i: u32| positions.get(i as usize).copied().ok_or_else(malformed);
        triangles.push(Triangle::new(
            vertex(triangle[0])?,
            vertex(triangle[1])?,
            vertex(triangle[2])?,
            material_index,
        ));
    }
    if triangles.is_empty() {
        return Err(Error::EmptyMesh {
            mesh: mesh.to_string(),
        });
    }
    Ok(triangles)
}

#[derive(Debug, Default)]
pub struct SceneBuilder {
    triangles: Vec<Triangle>,
    spheres: Vec<Sphere>,
    materials: Vec<Material>,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_materials(materials: Vec<Material>) -> Self {
        SceneBuilder {
            materials,
            ..Default::default()
        }
    }

    /// Returns the index of the new material.
    pub fn add_material(&mut self, material: Material) -> u32 {
        self.materials.push(material);
        (self.materials.len() - 1) as u32
    }

    /// Appends triangles after everything added so far; their positions in the
    /// scene array follow insertion order.
    pub fn add_triangles(&mut self, triangles: impl IntoIterator<Item = Triangle>) -> &mut Self {
        self.triangles.extend(triangles);
        self
    }

    pub fn add_mesh(
        &mut self,
        mesh: &str,
        positions: &[Vec3f],
        indices: &[u32],
        material_index: u32,
    ) -> Result<&mut Self> {
        let triangles = triangles_from_indexed_mesh(mesh, positions, indices, material_index)?;
        log::debug!("mesh {}: {} triangles", mesh, triangles.len());
        Ok(self.add_triangles(triangles))
    }

    pub fn add_gltf(&mut self, path: &Path, material_index: u32) -> Result<&mut Self> {
        let triangles = load_gltf_triangles(path, material_index)?;
        log::info!("{}: {} triangles", path.display(), triangles.len());
        Ok(self.add_triangles(triangles))
    }

    pub fn add_sphere(&mut self, sphere: Sphere) -> &mut Self {
        self.spheres.push(sphere);
        self
    }

    fn check_material(&self, index: u32) -> Result<()> {
        if (index as usize) < self.materials.len() {
            Ok(())
        } else {
            Err(Error::MaterialOutOfRange {
                index,
                count: self.materials.len(),
            })
        }
    }

    /// Derives the light list and builds the BVH over the triangles.
    ///
    /// Spheres are kept out of the hierarchy, so a scene without triangles is
    /// rejected even if it has spheres.
    pub fn build(self, config: &BvhConfig) -> Result<Scene> {
        for t in &self.triangles {
            self.check_material(t.material_index)?;
        }
        for s in &self.spheres {
            self.check_material(s.material_index)?;
        }
        if self.triangles.is_empty() {
            return Err(Error::NoTriangles);
        }

        let lights: Vec<Light> = self
            .triangles
            .iter()
            .enumerate()
            .filter(|(_, t)| self.materials[t.material_index as usize].is_emissive())
            .map(|(i, t)| Light {
                triangle_index: i as u32,
                area: t.light_area(),
            })
            .collect();

        let bvh_nodes = create_bvh(index_triangles(&self.triangles), config)?;
        log::info!(
            "scene: {} triangles, {} spheres, {} materials, {} lights, {} BVH nodes",
            self.triangles.len(),
            self.spheres.len(),
            self.materials.len(),
            lights.len(),
            bvh_nodes.len()
        );
        if !self.spheres.is_empty() {
            log::debug!("{} spheres left out of the BVH", self.spheres.len());
        }

        Ok(Scene {
            triangles: self.triangles,
            spheres: self.spheres,
            materials: self.materials,
            lights,
            bvh_nodes,
        })
    }
}

pub fn demo_materials() -> Vec<Material> {
    vec![
        Material::new(MaterialType::Lambertian, Vec3f::new(0.3, 0.3, 0.3)),
        Material::new(MaterialType::Lambertian, Vec3f::new(0.9, 0.1, 0.1)),
        Material::new(MaterialType::Lambertian, Vec3f::new(0.1, 0.9, 0.1)),
        Material::new(MaterialType::LightSource, Vec3f::new(2.0, 2.0, 2.0)),
        Material::new(MaterialType::Metal, Vec3f::new(1.0, 1.0, 1.0)),
        Material::new(MaterialType::Glass, Vec3f::new(1.0, 1.0, 1.0)),
    ]
}

pub const GRAY: u32 = 0;
pub const RED: u32 = 1;
pub const GREEN: u32 = 2;
pub const WHITE_LIGHT: u32 = 3;
pub const METAL: u32 = 4;
pub const GLASS: u32 = 5;

/// Two triangles over the corners `a b c d`, given in winding order.
pub fn quad(a: Vec3f, b: Vec3f, c: Vec3f, d: Vec3f, material_index: u32) -> [Triangle; 2] {
    [
        Triangle::new(a, b, c, material_index),
        Triangle::new(a, c, d, material_index),
    ]
}

pub fn axis_aligned_box(min: Vec3f, max: Vec3f, material_index: u32) -> Vec<Triangle> {
    // bit 0 = x, bit 1 = y, bit 2 = z; a set bit takes the coordinate from max
    let corners: Vec<Vec3f> = (0..8)
        .map(|i| {
            Vec3f::new(
                if i & 1 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 4 != 0 { max.z } else { min.z },
            )
        })
        .collect();
    let faces: [[usize; 4]; 6] = [
        [0, 4, 6, 2], // -x
        [1, 3, 7, 5], // +x
        [0, 1, 5, 4], // -y
        [2, 6, 7, 3], // +y
        [0, 2, 3, 1], // -z
        [4, 5, 7, 6], // +z
    ];
    faces
        .iter()
        .flat_map(|[a, b, c, d]| {
            quad(corners[*a], corners[*b], corners[*c], corners[*d], material_index)
        })
        .collect()
}

impl Scene {
    /// Closed room lit by a ceiling panel: gray floor, ceiling and back wall,
    /// red right wall, green left wall, a metal box and a glass sphere.
    pub fn demo(config: &BvhConfig) -> Result<Scene> {
        let v = Vec3f::new;
        let (x0, x1, y0, y1, z0, z1) = (-2.0, 2.0, 0.0, 3.0, -3.0, 1.0);
        let mut builder = SceneBuilder::with_materials(demo_materials());
        builder
            .add_triangles(quad(v(x0, y0, z1), v(x1, y0, z1), v(x1, y0, z0), v(x0, y0, z0), GRAY))
            .add_triangles(quad(v(x0, y1, z0), v(x1, y1, z0), v(x1, y1, z1), v(x0, y1, z1), GRAY))
            .add_triangles(quad(v(x0, y0, z0), v(x1, y0, z0), v(x1, y1, z0), v(x0, y1, z0), GRAY))
            .add_triangles(quad(v(x1, y0, z0), v(x1, y0, z1), v(x1, y1, z1), v(x1, y1, z0), RED))
            .add_triangles(quad(v(x0, y0, z1), v(x0, y0, z0), v(x0, y1, z0), v(x0, y1, z1), GREEN))
            .add_triangles(axis_aligned_box(v(-1.4, 0.0, -2.2), v(-0.4, 1.6, -1.2), METAL))
            .add_triangles(quad(
                v(-0.5, y1 - 0.01, -1.5),
                v(0.5, y1 - 0.01, -1.5),
                v(0.5, y1 - 0.01, -0.5),
                v(-0.5, y1 - 0.01, -0.5),
                WHITE_LIGHT,
            ))
            .add_sphere(Sphere::new(v(0.6, 1.0, -1.0), 0.6, GLASS));
        builder.build(config)
    }

    pub fn gpu_buffers(&self) -> GpuSceneBuffers {
        GpuSceneBuffers {
            triangles: self.triangles.iter().map(Into::into).collect(),
            materials: self.materials.iter().map(Into::into).collect(),
            bvh_nodes: self.bvh_nodes.clone(),
            lights: self
                .lights
                .iter()
                .map(|l| GpuLight {
                    triangle_index: l.triangle_index,
                    area: l.area,
                })
                .collect(),
            spheres: self.spheres.iter().map(Into::into).collect(),
        }
    }
}
