//! Bounding volume hierarchy over the scene triangles.
//!
//! The GPU walks the tree without recursion or pointers, so the result is a flat
//! array of [`GpuBvhNode`] linked by integer indices. Construction mirrors that:
//! nodes are produced from an explicit work stack and numbered in creation order.

use rand::Rng;

use crate::aabb::{calculate_aabb, calculate_aabb_for_triangle, Aabb};
use crate::config::{BvhConfig, SplitAxisPolicy};
use crate::error::{Error, Result};
use crate::geometry::{Axis, Triangle};
use crate::gpu_models::{GpuBvhNode, NO_INDEX};

/// A triangle together with its position in the scene triangle array.
///
/// The builder reorders its working copies freely; `index` is what ends up in
/// the leaves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexedPrimitive {
    pub index: u32,
    pub triangle: Triangle,
    pub aabb: Aabb,
}

impl IndexedPrimitive {
    pub fn new(index: u32, triangle: Triangle) -> Self {
        IndexedPrimitive {
            index,
            triangle,
            aabb: calculate_aabb_for_triangle(&triangle),
        }
    }
}

pub fn index_triangles(triangles: &[Triangle]) -> Vec<IndexedPrimitive> {
    triangles
        .iter()
        .enumerate()
        .map(|(i, t)| IndexedPrimitive::new(i as u32, *t))
        .collect()
}

/// Build-time node. `index` is assigned when the node is created and is the
/// node's final position in the flat array.
#[derive(Clone, Debug)]
pub struct IntermediateNode {
    pub aabb: Aabb,
    pub index: usize,
    pub left: Option<usize>,
    pub right: Option<usize>,
    /// Only leaves keep their (single) primitive.
    pub primitives: Vec<IndexedPrimitive>,
}

impl IntermediateNode {
    fn new(index: usize, primitives: Vec<IndexedPrimitive>) -> Self {
        IntermediateNode {
            aabb: Aabb::empty(),
            index,
            left: None,
            right: None,
            primitives,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn to_gpu_node(&self) -> GpuBvhNode {
        let to_gpu_index = |child: Option<usize>| child.map_or(NO_INDEX, |i| i as i32);
        let primitive_index = if self.is_leaf() {
            self.primitives
                .first()
                .map_or(NO_INDEX, |p| p.index as i32)
        } else {
            NO_INDEX
        };
        GpuBvhNode::new(
            &self.aabb,
            to_gpu_index(self.left),
            to_gpu_index(self.right),
            primitive_index,
        )
    }
}

pub trait AxisChooser {
    fn choose_axis(&mut self, aabb: &Aabb) -> Axis;
}

/// Uniformly random split axis, drawn per node. The default policy.
pub struct RandomAxis<R>(pub R);

impl<R: Rng> AxisChooser for RandomAxis<R> {
    fn choose_axis(&mut self, _: &Aabb) -> Axis {
        Aabb::random_axis(&mut self.0)
    }
}

pub struct LongestAxis;

impl AxisChooser for LongestAxis {
    fn choose_axis(&mut self, aabb: &Aabb) -> Axis {
        aabb.longest_axis()
    }
}

/// Median-split partition of `primitives` into a binary tree.
///
/// Returns the nodes sorted by index, so `result[i].index == i`. The root is
/// node 0 and every internal node has exactly two children.
pub fn build_intermediate_nodes<A: AxisChooser + ?Sized>(
    primitives: Vec<IndexedPrimitive>,
    axis_chooser: &mut A,
) -> Result<Vec<IntermediateNode>> {
    if primitives.is_empty() {
        return Err(Error::EmptyPrimitiveSet);
    }
    let mut intermediate = Vec::with_capacity(2 * primitives.len() - 1);
    let mut node_counter = 0usize;
    let mut node_stack = vec![IntermediateNode::new(node_counter, primitives)];
    node_counter += 1;

    while let Some(mut current_node) = node_stack.pop() {
        current_node.aabb = calculate_aabb(&current_node.primitives);

        let axis = axis_chooser.choose_axis(&current_node.aabb).index();
        // stable, so equal keys keep their relative order
        current_node
            .primitives
            .sort_by(|a, b| a.aabb.min[axis].total_cmp(&b.aabb.min[axis]));

        if current_node.primitives.len() <= 1 {
            intermediate.push(current_node);
            continue;
        }

        let mid = current_node.primitives.len() / 2;
        let right_primitives = current_node.primitives.split_off(mid);
        let left_primitives = std::mem::take(&mut current_node.primitives);

        let left_node = IntermediateNode::new(node_counter, left_primitives);
        node_counter += 1;
        let right_node = IntermediateNode::new(node_counter, right_primitives);
        node_counter += 1;

        current_node.left = Some(left_node.index);
        current_node.right = Some(right_node.index);
        node_stack.push(left_node);
        node_stack.push(right_node);
        intermediate.push(current_node);
    }

    intermediate.sort_by_key(|node| node.index);
    log::debug!(
        "built {} BVH nodes out of {} allocated indices",
        intermediate.len(),
        node_counter
    );
    Ok(intermediate)
}

/// Projects build-time nodes onto the GPU layout, position for position.
pub fn flatten_bvh(nodes: &[IntermediateNode]) -> Vec<GpuBvhNode> {
    let mut result = Vec::with_capacity(nodes.len());
    for (position, node) in nodes.iter().enumerate() {
        debug_assert_eq!(position, node.index);
        result.push(node.to_gpu_node());
    }
    result
}

pub fn create_bvh(
    primitives: Vec<IndexedPrimitive>,
    config: &BvhConfig,
) -> Result<Vec<GpuBvhNode>> {
    let intermediate = match config.split_axis {
        SplitAxisPolicy::Random => {
            build_intermediate_nodes(primitives, &mut RandomAxis(config.rng()))?
        }
        SplitAxisPolicy::Longest => build_intermediate_nodes(primitives, &mut LongestAxis)?,
    };
    Ok(flatten_bvh(&intermediate))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub node_count: usize,
    pub leaf_count: usize,
    pub internal_count: usize,
    /// Root alone has depth 0.
    pub max_depth: usize,
}

pub fn bvh_stats(nodes: &[GpuBvhNode]) -> BvhStats {
    let mut stats = BvhStats {
        node_count: nodes.len(),
        ..Default::default()
    };
    if nodes.is_empty() {
        return stats;
    }
    let mut visited = vec![false; nodes.len()];
    let mut stack = vec![(0usize, 0usize)];
    while let Some((node_index, depth)) = stack.pop() {
        let Some(node) = nodes.get(node_index) else {
            continue;
        };
        if std::mem::replace(&mut visited[node_index], true) {
            continue;
        }
        stats.max_depth = stats.max_depth.max(depth);
        if node.is_leaf() {
            stats.leaf_count += 1;
        } else {
            stats.internal_count += 1;
            for child in [node.left_child_index, node.right_child_index] {
                if child >= 0 {
                    stack.push((child as usize, depth + 1));
                }
            }
        }
    }
    stats
}

/// Checks the structural contract the GPU traversal relies on. Returns one
/// message per violation; an empty list means the array is a well-formed tree
/// over `triangles`.
pub fn validate_bvh(nodes: &[GpuBvhNode], triangles: &[Triangle]) -> Vec<String> {
    let mut violations = vec![];
    if nodes.is_empty() {
        violations.push("BVH has no nodes".to_string());
        return violations;
    }
    let in_range = |i: i32| i >= 0 && (i as usize) < nodes.len();
    let mut leaf_hits = vec![0usize; triangles.len()];

    for (i, node) in nodes.iter().enumerate() {
        let aabb = node.aabb();
        if node.is_leaf() {
            let p = node.primitive_index;
            if p < 0 || p as usize >= triangles.len() {
                violations.push(format!("leaf {} has invalid primitive index {}", i, p));
                continue;
            }
            leaf_hits[p as usize] += 1;
            if !aabb.contains(&calculate_aabb_for_triangle(&triangles[p as usize])) {
                violations.push(format!("leaf {} does not enclose primitive {}", i, p));
            }
            continue;
        }
        let (l, r) = (node.left_child_index, node.right_child_index);
        if !in_range(l) || !in_range(r) {
            violations.push(format!("node {} has out of range children ({}, {})", i, l, r));
            continue;
        }
        if l == r || l as usize == i || r as usize == i {
            violations.push(format!("node {} has degenerate children ({}, {})", i, l, r));
        }
        if node.primitive_index != NO_INDEX {
            violations.push(format!("internal node {} carries a primitive", i));
        }
        for child in [l, r] {
            if !aabb.contains(&nodes[child as usize].aabb()) {
                violations.push(format!("node {} does not enclose child {}", i, child));
            }
        }
    }

    // every node reached exactly once from the root
    let mut visits = vec![0usize; nodes.len()];
    let mut stack = vec![0usize];
    while let Some(i) = stack.pop() {
        visits[i] += 1;
        if visits[i] > 1 {
            violations.push(format!("node {} is reachable more than once", i));
            continue;
        }
        let node = &nodes[i];
        if !node.is_leaf() && in_range(node.left_child_index) && in_range(node.right_child_index) {
            stack.push(node.left_child_index as usize);
            stack.push(node.right_child_index as usize);
        }
    }
    for (i, count) in visits.iter().enumerate() {
        if *count == 0 {
            violations.push(format!("node {} is unreachable from the root", i));
        }
    }
    for (p, hits) in leaf_hits.iter().enumerate() {
        if *hits != 1 {
            violations.push(format!("primitive {} appears in {} leaves", p, hits));
        }
    }
    violations
}
