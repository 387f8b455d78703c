//! AABB hierarchy over triangle bounding boxes.
//!
//! Built with the surface-area heuristic; internal node boxes are the union
//! of their children.

use std::sync::Arc;

use kerf_geom::{Bbox, Point3, Projection, Surface};

use crate::TriangleIndex;

const NUM_BUCKETS: usize = 12;

#[derive(Debug)]
enum Node {
    Leaf {
        bb: Bbox,
        ids: Vec<u32>,
    },
    Internal {
        bb: Bbox,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn bb(&self) -> &Bbox {
        match self {
            Node::Leaf { bb, .. } => bb,
            Node::Internal { bb, .. } => bb,
        }
    }
}

/// A SAH-built AABB tree answering projected box-overlap queries.
#[derive(Debug)]
pub struct AabbTree {
    root: Option<Node>,
    surface: Arc<Surface>,
    proj: Projection,
}

impl AabbTree {
    /// Build the tree; `leaf_size` is the maximum leaf population.
    pub fn build(surface: Arc<Surface>, proj: Projection, leaf_size: usize) -> Self {
        let leaf_size = leaf_size.max(1);
        let mut items: Vec<(u32, Bbox, Point3)> = surface
            .triangles()
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let bb = *t.bbox();
                let centroid = Point3::new(bb.mid(0), bb.mid(1), bb.mid(2));
                (i as u32, bb, centroid)
            })
            .collect();
        let root = if items.is_empty() {
            None
        } else {
            Some(build_node(&mut items, leaf_size))
        };
        Self {
            root,
            surface,
            proj,
        }
    }
}

fn build_node(items: &mut [(u32, Bbox, Point3)], leaf_size: usize) -> Node {
    let mut bounds = Bbox::empty();
    for (_, bb, _) in items.iter() {
        bounds.extend_box(bb);
    }

    if items.len() <= leaf_size {
        return Node::Leaf {
            bb: bounds,
            ids: items.iter().map(|(id, _, _)| *id).collect(),
        };
    }

    let (best_axis, best_pos) = find_best_split(items, &bounds);
    let mid = partition(items, best_axis, best_pos);

    // degenerate partition: fall back to a middle split
    let mid = if mid == 0 || mid == items.len() {
        items.len() / 2
    } else {
        mid
    };

    let (left, right) = items.split_at_mut(mid);
    Node::Internal {
        bb: bounds,
        left: Box::new(build_node(left, leaf_size)),
        right: Box::new(build_node(right, leaf_size)),
    }
}

fn find_best_split(items: &[(u32, Bbox, Point3)], bounds: &Bbox) -> (usize, f64) {
    let mut best_cost = f64::INFINITY;
    let mut best_axis = 0;
    let mut best_pos = 0.0;

    for axis in 0..3 {
        let extent = bounds.extent(axis);
        if extent < 1e-10 {
            continue;
        }
        let axis_min = bounds.min[axis];

        let mut counts = [0usize; NUM_BUCKETS];
        let mut boxes = [Bbox::empty(); NUM_BUCKETS];
        for (_, bb, centroid) in items {
            let b = ((centroid[axis] - axis_min) / extent * NUM_BUCKETS as f64) as usize;
            let b = b.min(NUM_BUCKETS - 1);
            counts[b] += 1;
            boxes[b].extend_box(bb);
        }

        let total_area = half_area(bounds);
        for split in 1..NUM_BUCKETS {
            let mut left_count = 0;
            let mut left_bb = Bbox::empty();
            for i in 0..split {
                left_count += counts[i];
                left_bb.extend_box(&boxes[i]);
            }
            let mut right_count = 0;
            let mut right_bb = Bbox::empty();
            for i in split..NUM_BUCKETS {
                right_count += counts[i];
                right_bb.extend_box(&boxes[i]);
            }
            if left_count == 0 || right_count == 0 {
                continue;
            }
            let cost = 0.125
                + half_area(&left_bb) / total_area * left_count as f64
                + half_area(&right_bb) / total_area * right_count as f64;
            if cost < best_cost {
                best_cost = cost;
                best_axis = axis;
                best_pos = axis_min + (split as f64 / NUM_BUCKETS as f64) * extent;
            }
        }
    }

    (best_axis, best_pos)
}

fn partition(items: &mut [(u32, Bbox, Point3)], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = items.len();
    while left < right {
        if items[left].2[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            items.swap(left, right);
        }
    }
    left
}

fn half_area(bb: &Bbox) -> f64 {
    if bb.is_empty() {
        return 0.0;
    }
    let dx = bb.extent(0);
    let dy = bb.extent(1);
    let dz = bb.extent(2);
    dx * dy + dy * dz + dz * dx
}

fn query_node(node: &Node, query: &Bbox, proj: Projection, out: &mut Vec<u32>) {
    if !node.bb().overlaps(query, proj) {
        return;
    }
    match node {
        Node::Leaf { ids, .. } => out.extend_from_slice(ids),
        Node::Internal { left, right, .. } => {
            query_node(left, query, proj, out);
            query_node(right, query, proj, out);
        }
    }
}

impl TriangleIndex for AabbTree {
    fn surface(&self) -> &Arc<Surface> {
        &self.surface
    }

    fn projection(&self) -> Projection {
        self.proj
    }

    fn query_into(&self, query: &Bbox, out: &mut Vec<u32>) {
        if let Some(root) = &self.root {
            let before = out.len();
            query_node(root, query, self.proj, out);
            // leaves return their whole bucket; re-filter per triangle
            let surface = &self.surface;
            let proj = self.proj;
            let mut write = before;
            for read in before..out.len() {
                let id = out[read];
                if surface.triangle(id as usize).bbox().overlaps(query, proj) {
                    out[write] = id;
                    write += 1;
                }
            }
            out.truncate(write);
        }
    }
}
