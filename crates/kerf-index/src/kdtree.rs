//! Median-split KD-tree over triangle bounding boxes.

use std::sync::Arc;

use kerf_geom::{Bbox, Projection, Surface};

use crate::TriangleIndex;

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

/// A static KD-tree splitting at the median bounding-box midpoint along the
/// dominant axis of the current node's extent.
///
/// The split axis is restricted to the axes of the chosen projection plane;
/// the z spread of a surface does not influence an XY drop-cutter tree.
#[derive(Debug)]
pub struct KdTree {
    root: Option<Node>,
    surface: Arc<Surface>,
    proj: Projection,
    bucket_size: usize,
}

impl KdTree {
    /// Build the tree. `bucket_size` is the maximum leaf population (1 is
    /// valid).
    pub fn build(surface: Arc<Surface>, proj: Projection, bucket_size: usize) -> Self {
        let bucket_size = bucket_size.max(1);
        let mut ids: Vec<u32> = (0..surface.len() as u32).collect();
        let root = if ids.is_empty() {
            None
        } else {
            Some(build_node(&surface, &mut ids, proj, bucket_size))
        };
        Self {
            root,
            surface,
            proj,
            bucket_size,
        }
    }

    /// Maximum leaf population.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }
}

fn axes_of(proj: Projection) -> [usize; 2] {
    match proj {
        Projection::Xy | Projection::Xyz => [0, 1],
        Projection::Yz => [1, 2],
        Projection::Xz => [0, 2],
    }
}

fn build_node(surface: &Surface, ids: &mut [u32], proj: Projection, bucket: usize) -> Node {
    let mut bb = Bbox::empty();
    for &id in ids.iter() {
        bb.extend_box(surface.triangle(id as usize).bbox());
    }

    if ids.len() <= bucket {
        return Node::Leaf {
            bb,
            ids: ids.to_vec(),
        };
    }

    let [a0, a1] = axes_of(proj);
    let axis = if bb.extent(a0) >= bb.extent(a1) { a0 } else { a1 };

    let mid = ids.len() / 2;
    ids.select_nth_unstable_by(mid, |&a, &b| {
        let ma = surface.triangle(a as usize).bbox().mid(axis);
        let mb = surface.triangle(b as usize).bbox().mid(axis);
        ma.partial_cmp(&mb).unwrap_or(std::cmp::Ordering::Equal)
    });
    let (left_ids, right_ids) = ids.split_at_mut(mid);

    Node::Internal {
        bb,
        left: Box::new(build_node(surface, left_ids, proj, bucket)),
        right: Box::new(build_node(surface, right_ids, proj, bucket)),
    }
}

fn query_node(
    surface: &Surface,
    node: &Node,
    query: &Bbox,
    proj: Projection,
    out: &mut Vec<u32>,
) {
    if !node.bb().overlaps(query, proj) {
        return;
    }
    match node {
        Node::Leaf { ids, .. } => {
            for &id in ids {
                if surface.triangle(id as usize).bbox().overlaps(query, proj) {
                    out.push(id);
                }
            }
        }
        Node::Internal { left, right, .. } => {
            query_node(surface, left, query, proj, out);
            query_node(surface, right, query, proj, out);
        }
    }
}

impl TriangleIndex for KdTree {
    fn surface(&self) -> &Arc<Surface> {
        &self.surface
    }

    fn projection(&self) -> Projection {
        self.proj
    }

    fn query_into(&self, query: &Bbox, out: &mut Vec<u32>) {
        if let Some(root) = &self.root {
            query_node(&self.surface, root, query, self.proj, out);
        }
    }
}
