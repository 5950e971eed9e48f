use rand::Rng;

use crate::bvh::IndexedPrimitive;
use crate::geometry::{Axis, Fp, Sphere, Triangle, Vec3f, EPS, FP_INF, FP_NEG_INF};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3f,
    pub max: Vec3f,
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::empty()
    }
}

impl Aabb {
    /// Identity of `extend_aabb`: merging it with any box yields that box.
    pub fn empty() -> Self {
        Aabb {
            min: Vec3f::new(FP_INF, FP_INF, FP_INF),
            max: Vec3f::new(FP_NEG_INF, FP_NEG_INF, FP_NEG_INF),
        }
    }

    pub fn new(min: Vec3f, max: Vec3f) -> Self {
        Aabb { min, max }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn extend_point(&self, point: &Vec3f) -> Aabb {
        Aabb {
            min: self.min.inf(point),
            max: self.max.sup(point),
        }
    }

    pub fn extend_aabb(&self, aabb: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&aabb.min),
            max: self.max.sup(&aabb.max),
        }
    }

    pub fn extent(&self) -> Vec3f {
        self.max - self.min
    }

    pub fn area(&self) -> Fp {
        let diff = self.extent();
        let x = diff.x;
        let y = diff.y;
        let z = diff.z;
        x * y + y * z + z * x
    }

    pub fn contains(&self, aabb: &Aabb) -> bool {
        for coord in 0..3 {
            if aabb.min[coord] < self.min[coord] {
                return false;
            }
            if aabb.max[coord] > self.max[coord] {
                return false;
            }
        }
        true
    }

    /// Axis with the strictly greatest extent, X when no axis beats both others.
    pub fn longest_axis(&self) -> Axis {
        let x = (self.max.x - self.min.x).abs();
        let y = (self.max.y - self.min.y).abs();
        let z = (self.max.z - self.min.z).abs();
        let mut longest = Axis::X;
        if y > x && y > z {
            longest = Axis::Y;
        }
        if z > x && z > y {
            longest = Axis::Z;
        }
        longest
    }

    pub fn random_axis<R: Rng + ?Sized>(rng: &mut R) -> Axis {
        Axis::ALL[rng.gen_range(0..Axis::ALL.len())]
    }
}

pub fn calculate_aabb_for_triangle(triangle: &Triangle) -> Aabb {
    let eps_vec = Vec3f::new(EPS, EPS, EPS);
    let Triangle { v0, v1, v2, .. } = triangle;
    Aabb {
        min: v0.inf(v1).inf(v2) - eps_vec,
        max: v0.sup(v1).sup(v2) + eps_vec,
    }
}

pub fn calculate_aabb_for_sphere(sphere: &Sphere) -> Aabb {
    let r = sphere.radius().abs();
    let r_vec = Vec3f::new(r, r, r);
    Aabb {
        min: sphere.center() - r_vec,
        max: sphere.center() + r_vec,
    }
}

pub fn calculate_aabb(slice: &[IndexedPrimitive]) -> Aabb {
    slice
        .iter()
        .fold(Aabb::empty(), |result, p| result.extend_aabb(&p.aabb))
}
