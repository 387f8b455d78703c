//! Cutter-location and cutter-contact points.

use serde::{Deserialize, Serialize};

use crate::triangle::Triangle;
use crate::Point3;

/// The type of cutter contact at a CC point.
///
/// Used for loop classification and for debugging. `Error` is reserved for
/// algorithmic assertions and must never escape to successful output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum CcType {
    None,
    Vertex,
    VertexCyl,
    Edge,
    EdgeHoriz,
    EdgeShaft,
    EdgeHorizCyl,
    EdgeHorizTor,
    EdgeBall,
    EdgePos,
    EdgeNeg,
    EdgeCyl,
    EdgeCone,
    EdgeConeBase,
    Facet,
    FacetTip,
    FacetCyl,
    Error,
}

impl CcType {
    /// True for any vertex-feature contact.
    pub fn is_vertex(self) -> bool {
        matches!(self, CcType::Vertex | CcType::VertexCyl)
    }

    /// True for any edge-feature contact.
    pub fn is_edge(self) -> bool {
        matches!(
            self,
            CcType::Edge
                | CcType::EdgeHoriz
                | CcType::EdgeShaft
                | CcType::EdgeHorizCyl
                | CcType::EdgeHorizTor
                | CcType::EdgeBall
                | CcType::EdgePos
                | CcType::EdgeNeg
                | CcType::EdgeCyl
                | CcType::EdgeCone
                | CcType::EdgeConeBase
        )
    }

    /// True for any facet-feature contact.
    pub fn is_facet(self) -> bool {
        matches!(self, CcType::Facet | CcType::FacetTip | CcType::FacetCyl)
    }

    /// Endpoint-survival priority: facet over edge over vertex.
    pub fn priority(self) -> u8 {
        if self.is_facet() {
            3
        } else if self.is_edge() {
            2
        } else if self.is_vertex() {
            1
        } else {
            0
        }
    }
}

impl std::fmt::Display for CcType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CcType::None => "NONE",
            CcType::Vertex => "VERTEX",
            CcType::VertexCyl => "VERTEX_CYL",
            CcType::Edge => "EDGE",
            CcType::EdgeHoriz => "EDGE_HORIZ",
            CcType::EdgeShaft => "EDGE_SHAFT",
            CcType::EdgeHorizCyl => "EDGE_HORIZ_CYL",
            CcType::EdgeHorizTor => "EDGE_HORIZ_TOR",
            CcType::EdgeBall => "EDGE_BALL",
            CcType::EdgePos => "EDGE_POS",
            CcType::EdgeNeg => "EDGE_NEG",
            CcType::EdgeCyl => "EDGE_CYL",
            CcType::EdgeCone => "EDGE_CONE",
            CcType::EdgeConeBase => "EDGE_CONE_BASE",
            CcType::Facet => "FACET",
            CcType::FacetTip => "FACET_TIP",
            CcType::FacetCyl => "FACET_CYL",
            CcType::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// A cutter-contact point: where on the workpiece the cutter touches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcPoint {
    /// Location of the contacted feature.
    pub pos: Point3,
    /// Which feature kind is touched.
    pub ctype: CcType,
}

impl CcPoint {
    /// Contact of type `ctype` at `pos`.
    pub fn new(pos: Point3, ctype: CcType) -> Self {
        Self { pos, ctype }
    }

    /// Placeholder contact for freshly created CL points.
    pub fn none() -> Self {
        Self {
            pos: Point3::origin(),
            ctype: CcType::None,
        }
    }
}

/// A cutter-location point.
///
/// Created by the caller with z set to a lower bound (often negative
/// infinity), raised by drop-cutter calls, never decreased by the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClPoint {
    /// Cutter reference-point position.
    pub pos: Point3,
    /// Contact responsible for the current z.
    pub cc: CcPoint,
}

impl ClPoint {
    /// CL point at (x, y, z) with no contact yet.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            pos: Point3::new(x, y, z),
            cc: CcPoint::none(),
        }
    }

    /// CL point with z at negative infinity, ready for dropping.
    pub fn at_xy(x: f64, y: f64) -> Self {
        Self::new(x, y, f64::NEG_INFINITY)
    }

    /// Raise z to `z` and record `cc`, if `z` is an improvement.
    ///
    /// Returns true iff the point moved. Non-finite candidates are ignored.
    pub fn lift(&mut self, z: f64, cc: CcPoint) -> bool {
        if z.is_finite() && z > self.pos.z {
            self.pos.z = z;
            self.cc = cc;
            true
        } else {
            false
        }
    }

    /// True if the CL point is below the triangle's bounding box top.
    ///
    /// A point already above the box cannot be lifted by that triangle.
    pub fn below(&self, t: &Triangle) -> bool {
        self.pos.z < t.bbox().max.z
    }
}
