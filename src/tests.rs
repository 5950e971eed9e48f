use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::aabb::calculate_aabb_for_triangle;
use crate::bvh::{
    build_intermediate_nodes, bvh_stats, create_bvh, flatten_bvh, index_triangles,
    validate_bvh, LongestAxis, RandomAxis,
};
use crate::config::BvhConfig;
use crate::error::Error;
use crate::geometry::{Sphere, Triangle, Vec3f, EPS};
use crate::gpu_models::NO_INDEX;
use crate::scene::{demo_materials, SceneBuilder, GLASS, GRAY};

fn random_triangles(rng: &mut Xoshiro256PlusPlus, n: usize) -> Vec<Triangle> {
    (0..n)
        .map(|_| {
            let base = Vec3f::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            let mut offset = || {
                Vec3f::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                )
            };
            let (a, b) = (offset(), offset());
            Triangle::new(base, base + a, base + b, 0)
        })
        .collect()
}

// unit right triangles in the z = 0 plane at x = 0, 2, 4, 6
fn four_triangles_along_x() -> Vec<Triangle> {
    (0..4)
        .map(|i| {
            let x = i as f32 * 2.0;
            Triangle::new(
                Vec3f::new(x, 0.0, 0.0),
                Vec3f::new(x + 1.0, 0.0, 0.0),
                Vec3f::new(x, 1.0, 0.0),
                0,
            )
        })
        .collect()
}

#[test]
fn node_count_is_twice_leaves_minus_one() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2024);
    for n in 1..=64 {
        let triangles = random_triangles(&mut rng, n);
        let nodes = create_bvh(index_triangles(&triangles), &BvhConfig::seeded(n as u64)).unwrap();
        let stats = bvh_stats(&nodes);
        assert_eq!(nodes.len(), 2 * n - 1);
        assert_eq!(stats.leaf_count, n);
        assert_eq!(stats.internal_count, n - 1);
        assert_eq!(nodes.iter().filter(|node| node.is_leaf()).count(), n);
    }
}

#[test]
fn internal_nodes_link_two_distinct_later_nodes() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(1);
    let triangles = random_triangles(&mut rng, 100);
    let nodes = create_bvh(index_triangles(&triangles), &BvhConfig::seeded(9)).unwrap();
    for (i, node) in nodes.iter().enumerate() {
        if node.is_leaf() {
            assert!(node.primitive_index >= 0);
            continue;
        }
        let (l, r) = (node.left_child_index, node.right_child_index);
        assert_ne!(l, r);
        assert_ne!(l as usize, i);
        assert_ne!(r as usize, i);
        assert!(l >= 0 && (l as usize) < nodes.len());
        assert!(r >= 0 && (r as usize) < nodes.len());
        // children are created after their parent
        assert!(l as usize > i && r as usize > i);
        assert_eq!(r, l + 1);
        assert_eq!(node.primitive_index, NO_INDEX);
    }
}

#[test]
fn boxes_enclose_children_and_primitives() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(77);
    let triangles = random_triangles(&mut rng, 50);
    for seed in 0..8 {
        let nodes = create_bvh(index_triangles(&triangles), &BvhConfig::seeded(seed)).unwrap();
        for node in &nodes {
            let aabb = node.aabb();
            if node.is_leaf() {
                let t = &triangles[node.primitive_index as usize];
                assert_eq!(aabb, calculate_aabb_for_triangle(t));
            } else {
                assert!(aabb.contains(&nodes[node.left_child_index as usize].aabb()));
                assert!(aabb.contains(&nodes[node.right_child_index as usize].aabb()));
            }
        }
        assert!(validate_bvh(&nodes, &triangles).is_empty());
    }
}

#[test]
fn node_positions_match_creation_indices() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
    let triangles = random_triangles(&mut rng, 37);
    let mut chooser = RandomAxis(Xoshiro256PlusPlus::seed_from_u64(5));
    let nodes = build_intermediate_nodes(index_triangles(&triangles), &mut chooser).unwrap();
    let indices: HashSet<usize> = nodes.iter().map(|node| node.index).collect();
    assert_eq!(indices.len(), nodes.len());
    for (position, node) in nodes.iter().enumerate() {
        assert_eq!(node.index, position);
        // only leaves keep primitives
        assert_eq!(node.primitives.len(), usize::from(node.is_leaf()));
    }
    let flat = flatten_bvh(&nodes);
    for (node, gpu) in nodes.iter().zip(&flat) {
        assert_eq!(gpu.left_child_index, node.left.map_or(NO_INDEX, |i| i as i32));
        assert_eq!(gpu.right_child_index, node.right.map_or(NO_INDEX, |i| i as i32));
        assert_eq!(gpu.aabb(), node.aabb);
    }
}

#[test]
fn single_triangle_yields_single_leaf() {
    let triangle = Triangle::new(
        Vec3f::new(1.0, 2.0, 3.0),
        Vec3f::new(2.0, 2.0, 3.0),
        Vec3f::new(1.0, 4.0, 3.0),
        GRAY,
    );
    let mut builder = SceneBuilder::with_materials(demo_materials());
    builder.add_triangles([triangle]);
    let scene = builder.build(&BvhConfig::seeded(0)).unwrap();
    assert_eq!(scene.bvh_nodes.len(), 1);
    let root = scene.bvh_nodes[0];
    assert!(root.is_leaf());
    assert_eq!(root.primitive_index, 0);
    assert_eq!(root.aabb(), calculate_aabb_for_triangle(&triangle));
    assert_eq!(root.min, [1.0 - EPS, 2.0 - EPS, 3.0 - EPS]);
    assert_eq!(root.max, [2.0 + EPS, 4.0 + EPS, 3.0 + EPS]);
}

#[test]
fn four_triangles_on_x_axis() {
    let triangles = four_triangles_along_x();
    for seed in 0..16 {
        let nodes = create_bvh(index_triangles(&triangles), &BvhConfig::seeded(seed)).unwrap();
        assert_eq!(nodes.len(), 7);
        let stats = bvh_stats(&nodes);
        assert_eq!((stats.leaf_count, stats.internal_count), (4, 3));

        let root = nodes[0].aabb();
        assert_eq!(root.min, Vec3f::new(-EPS, -EPS, -EPS));
        assert_eq!(root.max, Vec3f::new(7.0 + EPS, 1.0 + EPS, EPS));

        let leaves: HashSet<i32> = nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(|node| node.primitive_index)
            .collect();
        assert_eq!(leaves, HashSet::from([0, 1, 2, 3]));
    }
}

#[test]
fn longest_axis_splits_four_triangles_in_order() {
    let triangles = four_triangles_along_x();
    let nodes = create_bvh(index_triangles(&triangles), &BvhConfig::longest_axis()).unwrap();
    // root -> (1, 2), node 2 -> (3, 4), node 1 -> (5, 6)
    assert_eq!((nodes[0].left_child_index, nodes[0].right_child_index), (1, 2));
    assert_eq!((nodes[1].left_child_index, nodes[1].right_child_index), (5, 6));
    assert_eq!((nodes[2].left_child_index, nodes[2].right_child_index), (3, 4));
    let leaf_primitives: Vec<i32> = [5, 6, 3, 4]
        .iter()
        .map(|&i| nodes[i].primitive_index)
        .collect();
    assert_eq!(leaf_primitives, vec![0, 1, 2, 3]);
    assert_eq!(nodes[1].max[0], 3.0 + EPS);
    assert_eq!(nodes[2].min[0], 4.0 - EPS);
}

#[test]
fn empty_triangle_set_is_rejected_even_with_spheres() {
    let mut builder = SceneBuilder::with_materials(demo_materials());
    builder.add_sphere(Sphere::new(Vec3f::new(0.6, 1.0, -1.0), 0.6, GLASS));
    assert!(matches!(
        builder.build(&BvhConfig::seeded(0)),
        Err(Error::NoTriangles)
    ));
    assert!(matches!(
        build_intermediate_nodes(vec![], &mut LongestAxis),
        Err(Error::EmptyPrimitiveSet)
    ));
}

#[test]
fn same_seed_builds_same_tree() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(31);
    let triangles = random_triangles(&mut rng, 200);
    let build = |config: &BvhConfig| create_bvh(index_triangles(&triangles), config).unwrap();
    assert_eq!(build(&BvhConfig::seeded(8)), build(&BvhConfig::seeded(8)));
    assert_eq!(
        build(&BvhConfig::longest_axis()),
        build(&BvhConfig::longest_axis())
    );
}

#[test]
fn median_split_depth_is_logarithmic() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
    for n in [1usize, 2, 3, 7, 8, 9, 100, 257] {
        let triangles = random_triangles(&mut rng, n);
        let nodes = create_bvh(index_triangles(&triangles), &BvhConfig::seeded(1)).unwrap();
        let expected = (n as f64).log2().ceil() as usize;
        assert_eq!(bvh_stats(&nodes).max_depth, expected, "n = {}", n);
    }
}

#[test]
fn spheres_stay_out_of_the_tree() {
    let mut builder = SceneBuilder::with_materials(demo_materials());
    builder
        .add_triangles(four_triangles_along_x())
        .add_sphere(Sphere::new(Vec3f::new(100.0, 0.0, 0.0), 1.0, GLASS));
    let scene = builder.build(&BvhConfig::seeded(4)).unwrap();
    assert_eq!(scene.bvh_nodes.len(), 7);
    assert!(scene.bvh_nodes[0].max[0] < 99.0);
    assert_eq!(scene.spheres.len(), 1);
}
