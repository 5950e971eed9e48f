use nalgebra::{Vector3, Vector4};

use crate::aabb::{calculate_aabb_for_sphere, calculate_aabb_for_triangle, Aabb};

pub type Fp = f32;
pub type Vec3f = Vector3<Fp>;
pub type Vec4f = Vector4<Fp>;

pub const FP_INF: Fp = Fp::INFINITY;
pub const FP_NEG_INF: Fp = Fp::NEG_INFINITY;

// expansion applied to triangle boxes so flat primitives keep a volume
pub const EPS: Fp = 0.0001;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub v0: Vec3f,
    pub v1: Vec3f,
    pub v2: Vec3f,
    pub material_index: u32,
}

impl Triangle {
    pub fn new(v0: Vec3f, v1: Vec3f, v2: Vec3f, material_index: u32) -> Self {
        Triangle {
            v0,
            v1,
            v2,
            material_index,
        }
    }

    /// Area used for light importance sampling.
    ///
    /// Computed from the cross product of the first two vertex *positions*, not
    /// of the edge vectors, so it is only the geometric area when `v2` sits at
    /// the origin. Renderers consuming the light list expect this value.
    pub fn light_area(&self) -> Fp {
        self.v0.cross(&self.v1).norm() * 0.5
    }

    /// True geometric area, from the edge vectors.
    pub fn area(&self) -> Fp {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0)).norm() * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    /// xyz = center, w = radius
    pub center_and_radius: Vec4f,
    pub material_index: u32,
}

impl Sphere {
    pub fn new(center: Vec3f, radius: Fp, material_index: u32) -> Self {
        Sphere {
            center_and_radius: Vec4f::new(center.x, center.y, center.z, radius),
            material_index,
        }
    }

    pub fn center(&self) -> Vec3f {
        self.center_and_radius.xyz()
    }

    pub fn radius(&self) -> Fp {
        self.center_and_radius.w
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Triangle(Triangle),
    Sphere(Sphere),
}

impl Primitive {
    pub fn material_index(&self) -> u32 {
        match self {
            Primitive::Triangle(t) => t.material_index,
            Primitive::Sphere(s) => s.material_index,
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            Primitive::Triangle(t) => calculate_aabb_for_triangle(t),
            Primitive::Sphere(s) => calculate_aabb_for_sphere(s),
        }
    }
}

impl From<Triangle> for Primitive {
    fn from(triangle: Triangle) -> Self {
        Primitive::Triangle(triangle)
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialType {
    LightSource,
    Lambertian,
    Metal,
    Glass,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub kind: MaterialType,
    pub albedo: Vec3f,
}

impl Material {
    pub fn new(kind: MaterialType, albedo: Vec3f) -> Self {
        Material { kind, albedo }
    }

    pub fn is_emissive(&self) -> bool {
        self.kind == MaterialType::LightSource
    }
}
