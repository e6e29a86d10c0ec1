//! The 16-variant geometry tagged union (§3.3) built over
//! [`crate::pointarray::PointArray`], plus its construction, cloning,
//! dimension coercion, and the C4/C5 structural and bbox operations.
//!
//! Every virtual-dispatch site in the C source (`rtgeom.c`'s `RTGEOM`
//! vtable-by-hand) becomes a `match` on this enum's discriminant, per
//! `SPEC_FULL.md` §9.

use std::fmt;

use crate::coord::Coord4;
use crate::error::{Error, Result};
use crate::flags::Flags;
use crate::gbox::GBox;
use crate::kind::GeomKind;
use crate::pointarray::PointArray;

/// Fields shared by every geometry node (§3.3): dimensionality, SRID, and
/// the lazily-populated bbox cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub flags: Flags,
    pub srid: i32,
    pub bbox: Option<GBox>,
}

/// Sentinel SRID meaning "unknown", matching the source's `SRID_UNKNOWN`.
pub const SRID_UNKNOWN: i32 = 0;

impl Header {
    pub fn new(flags: Flags, srid: i32) -> Self {
        Header {
            flags,
            srid,
            bbox: None,
        }
    }
}

/// The geometry tagged union (§3.3). Collection-like variants hold an
/// ordered `Vec<Geometry>` of children; the parent/child compatibility
/// matrix (§4.2) is enforced at runtime by [`Geometry::add_geom`], exactly
/// as the source enforces it at runtime rather than through a richer type
/// per collection kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point {
        header: Header,
        points: PointArray,
    },
    LineString {
        header: Header,
        points: PointArray,
    },
    CircularString {
        header: Header,
        points: PointArray,
    },
    Polygon {
        header: Header,
        rings: Vec<PointArray>,
    },
    Triangle {
        header: Header,
        points: PointArray,
    },
    MultiPoint {
        header: Header,
        children: Vec<Geometry>,
    },
    MultiLineString {
        header: Header,
        children: Vec<Geometry>,
    },
    MultiPolygon {
        header: Header,
        children: Vec<Geometry>,
    },
    GeometryCollection {
        header: Header,
        children: Vec<Geometry>,
    },
    CompoundCurve {
        header: Header,
        children: Vec<Geometry>,
    },
    CurvePolygon {
        header: Header,
        children: Vec<Geometry>,
    },
    MultiCurve {
        header: Header,
        children: Vec<Geometry>,
    },
    MultiSurface {
        header: Header,
        children: Vec<Geometry>,
    },
    PolyhedralSurface {
        header: Header,
        children: Vec<Geometry>,
    },
    Tin {
        header: Header,
        children: Vec<Geometry>,
    },
}

impl Geometry {
    pub fn kind(&self) -> GeomKind {
        match self {
            Geometry::Point { .. } => GeomKind::Point,
            Geometry::LineString { .. } => GeomKind::LineString,
            Geometry::CircularString { .. } => GeomKind::CircularString,
            Geometry::Polygon { .. } => GeomKind::Polygon,
            Geometry::Triangle { .. } => GeomKind::Triangle,
            Geometry::MultiPoint { .. } => GeomKind::MultiPoint,
            Geometry::MultiLineString { .. } => GeomKind::MultiLineString,
            Geometry::MultiPolygon { .. } => GeomKind::MultiPolygon,
            Geometry::GeometryCollection { .. } => GeomKind::GeometryCollection,
            Geometry::CompoundCurve { .. } => GeomKind::CompoundCurve,
            Geometry::CurvePolygon { .. } => GeomKind::CurvePolygon,
            Geometry::MultiCurve { .. } => GeomKind::MultiCurve,
            Geometry::MultiSurface { .. } => GeomKind::MultiSurface,
            Geometry::PolyhedralSurface { .. } => GeomKind::PolyhedralSurface,
            Geometry::Tin { .. } => GeomKind::Tin,
        }
    }

    pub fn header(&self) -> &Header {
        match self {
            Geometry::Point { header, .. }
            | Geometry::LineString { header, .. }
            | Geometry::CircularString { header, .. }
            | Geometry::Polygon { header, .. }
            | Geometry::Triangle { header, .. }
            | Geometry::MultiPoint { header, .. }
            | Geometry::MultiLineString { header, .. }
            | Geometry::MultiPolygon { header, .. }
            | Geometry::GeometryCollection { header, .. }
            | Geometry::CompoundCurve { header, .. }
            | Geometry::CurvePolygon { header, .. }
            | Geometry::MultiCurve { header, .. }
            | Geometry::MultiSurface { header, .. }
            | Geometry::PolyhedralSurface { header, .. }
            | Geometry::Tin { header, .. } => header,
        }
    }

    pub fn header_mut(&mut self) -> &mut Header {
        match self {
            Geometry::Point { header, .. }
            | Geometry::LineString { header, .. }
            | Geometry::CircularString { header, .. }
            | Geometry::Polygon { header, .. }
            | Geometry::Triangle { header, .. }
            | Geometry::MultiPoint { header, .. }
            | Geometry::MultiLineString { header, .. }
            | Geometry::MultiPolygon { header, .. }
            | Geometry::GeometryCollection { header, .. }
            | Geometry::CompoundCurve { header, .. }
            | Geometry::CurvePolygon { header, .. }
            | Geometry::MultiCurve { header, .. }
            | Geometry::MultiSurface { header, .. }
            | Geometry::PolyhedralSurface { header, .. }
            | Geometry::Tin { header, .. } => header,
        }
    }

    pub fn flags(&self) -> Flags {
        self.header().flags
    }

    pub fn srid(&self) -> i32 {
        self.header().srid
    }

    pub fn set_srid(&mut self, srid: i32) {
        self.header_mut().srid = srid;
    }

    /// Children of a collection-like kind, empty slice otherwise.
    pub fn children(&self) -> &[Geometry] {
        match self {
            Geometry::MultiPoint { children, .. }
            | Geometry::MultiLineString { children, .. }
            | Geometry::MultiPolygon { children, .. }
            | Geometry::GeometryCollection { children, .. }
            | Geometry::CompoundCurve { children, .. }
            | Geometry::CurvePolygon { children, .. }
            | Geometry::MultiCurve { children, .. }
            | Geometry::MultiSurface { children, .. }
            | Geometry::PolyhedralSurface { children, .. }
            | Geometry::Tin { children, .. } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Geometry>> {
        match self {
            Geometry::MultiPoint { children, .. }
            | Geometry::MultiLineString { children, .. }
            | Geometry::MultiPolygon { children, .. }
            | Geometry::GeometryCollection { children, .. }
            | Geometry::CompoundCurve { children, .. }
            | Geometry::CurvePolygon { children, .. }
            | Geometry::MultiCurve { children, .. }
            | Geometry::MultiSurface { children, .. }
            | Geometry::PolyhedralSurface { children, .. }
            | Geometry::Tin { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn rings(&self) -> Option<&[PointArray]> {
        match self {
            Geometry::Polygon { rings, .. } => Some(rings),
            _ => None,
        }
    }

    pub fn points(&self) -> Option<&PointArray> {
        match self {
            Geometry::Point { points, .. }
            | Geometry::LineString { points, .. }
            | Geometry::CircularString { points, .. }
            | Geometry::Triangle { points, .. } => Some(points),
            _ => None,
        }
    }

    // ---- construction -------------------------------------------------

    pub fn empty_point(srid: i32, flags: Flags) -> Self {
        Geometry::Point {
            header: Header::new(flags, srid),
            points: PointArray::empty(flags, 0),
        }
    }

    pub fn empty_line_string(srid: i32, flags: Flags) -> Self {
        Geometry::LineString {
            header: Header::new(flags, srid),
            points: PointArray::empty(flags, 0),
        }
    }

    pub fn empty_collection(kind: GeomKind, srid: i32, flags: Flags) -> Result<Self> {
        let header = Header::new(flags, srid);
        Ok(match kind {
            GeomKind::MultiPoint => Geometry::MultiPoint {
                header,
                children: Vec::new(),
            },
            GeomKind::MultiLineString => Geometry::MultiLineString {
                header,
                children: Vec::new(),
            },
            GeomKind::MultiPolygon => Geometry::MultiPolygon {
                header,
                children: Vec::new(),
            },
            GeomKind::GeometryCollection => Geometry::GeometryCollection {
                header,
                children: Vec::new(),
            },
            GeomKind::CompoundCurve => Geometry::CompoundCurve {
                header,
                children: Vec::new(),
            },
            GeomKind::CurvePolygon => Geometry::CurvePolygon {
                header,
                children: Vec::new(),
            },
            GeomKind::MultiCurve => Geometry::MultiCurve {
                header,
                children: Vec::new(),
            },
            GeomKind::MultiSurface => Geometry::MultiSurface {
                header,
                children: Vec::new(),
            },
            GeomKind::PolyhedralSurface => Geometry::PolyhedralSurface {
                header,
                children: Vec::new(),
            },
            GeomKind::Tin => Geometry::Tin {
                header,
                children: Vec::new(),
            },
            other => return Err(Error::unsupported("empty_collection", other.name())),
        })
    }

    /// Appends `child`, taking ownership. Fails if `self`'s kind does not
    /// accept `child`'s kind (§4.2 matrix), if dimensionality disagrees, or
    /// (`CompoundCurve` only) if `child` is empty -- a curve cannot join to
    /// nothing.
    pub fn add_geom(&mut self, child: Geometry) -> Result<()> {
        let self_kind = self.kind();
        let child_kind = child.kind();
        if !self_kind.accepts_child(child_kind) {
            return Err(Error::invariant(format!(
                "{self_kind} cannot contain a child of kind {child_kind}"
            )));
        }
        if !self.flags().dimensionality_compatible(child.flags()) {
            return Err(Error::invariant(format!(
                "{self_kind} and its new {child_kind} child disagree on Z/M dimensionality"
            )));
        }
        if self_kind == GeomKind::CompoundCurve && child.is_empty() {
            return Err(Error::invariant(
                "CompoundCurve cannot join an empty component",
            ));
        }
        if self_kind == GeomKind::CompoundCurve {
            if let Some(prev) = self.children().last() {
                if let (Some(prev_end), Some(next_start)) = (prev.endpoint(), child.startpoint()) {
                    if !prev_end.exact_eq_2d(next_start) {
                        return Err(Error::invariant(
                            "CompoundCurve component does not join the previous one's endpoint",
                        ));
                    }
                }
            }
        }
        self.header_mut().bbox = None;
        match self.children_mut() {
            Some(children) => {
                children.push(child);
                Ok(())
            }
            None => Err(Error::invariant(format!(
                "{self_kind} is not a collection and cannot accept children"
            ))),
        }
    }

    // ---- structural queries --------------------------------------------

    pub fn is_empty(&self) -> bool {
        match self {
            Geometry::Point { points, .. }
            | Geometry::LineString { points, .. }
            | Geometry::CircularString { points, .. }
            | Geometry::Triangle { points, .. } => points.is_empty(),
            Geometry::Polygon { rings, .. } => rings.is_empty(),
            _ => self.children().iter().all(Geometry::is_empty),
        }
    }

    pub fn count_vertices(&self) -> usize {
        match self {
            Geometry::Point { points, .. }
            | Geometry::LineString { points, .. }
            | Geometry::CircularString { points, .. }
            | Geometry::Triangle { points, .. } => points.npoints(),
            Geometry::Polygon { rings, .. } => rings.iter().map(|r| r.npoints()).sum(),
            _ => self.children().iter().map(Geometry::count_vertices).sum(),
        }
    }

    /// Topological dimension: 0 (Point/MultiPoint), 1 (curves), 2
    /// (surfaces), or the max over a `GeometryCollection`'s children.
    pub fn dimension(&self) -> u8 {
        match self.kind() {
            GeomKind::Point | GeomKind::MultiPoint => 0,
            GeomKind::LineString
            | GeomKind::CircularString
            | GeomKind::MultiLineString
            | GeomKind::CompoundCurve
            | GeomKind::MultiCurve => 1,
            GeomKind::Polygon
            | GeomKind::Triangle
            | GeomKind::MultiPolygon
            | GeomKind::CurvePolygon
            | GeomKind::MultiSurface
            | GeomKind::PolyhedralSurface
            | GeomKind::Tin => 2,
            GeomKind::GeometryCollection => {
                self.children().iter().map(Geometry::dimension).max().unwrap_or(0)
            }
        }
    }

    pub fn startpoint(&self) -> Option<Coord4> {
        match self {
            Geometry::Point { points, .. }
            | Geometry::LineString { points, .. }
            | Geometry::CircularString { points, .. }
            | Geometry::Triangle { points, .. } => points.startpoint(),
            Geometry::Polygon { rings, .. } => rings.first().and_then(PointArray::startpoint),
            _ => self.children().first().and_then(Geometry::startpoint),
        }
    }

    pub fn endpoint(&self) -> Option<Coord4> {
        match self {
            Geometry::Point { points, .. }
            | Geometry::LineString { points, .. }
            | Geometry::CircularString { points, .. }
            | Geometry::Triangle { points, .. } => points.endpoint(),
            Geometry::Polygon { rings, .. } => rings.last().and_then(PointArray::endpoint),
            _ => self.children().last().and_then(Geometry::endpoint),
        }
    }

    /// `is_closed(g) == (startpoint(g) == endpoint(g))` (§8.1 invariant 5).
    pub fn is_closed(&self) -> bool {
        match self.kind() {
            GeomKind::Polygon | GeomKind::Triangle | GeomKind::CurvePolygon => true,
            GeomKind::PolyhedralSurface | GeomKind::Tin | GeomKind::MultiPolygon => true,
            _ => match (self.startpoint(), self.endpoint()) {
                (Some(a), Some(b)) => {
                    if self.flags().has_z {
                        a.exact_eq_3d(b)
                    } else {
                        a.exact_eq_2d(b)
                    }
                }
                _ => false,
            },
        }
    }

    pub fn clone_shallow(&self) -> Self {
        match self {
            Geometry::Point { header, points } => Geometry::Point {
                header: header.clone(),
                points: points.clone_shallow(),
            },
            Geometry::LineString { header, points } => Geometry::LineString {
                header: header.clone(),
                points: points.clone_shallow(),
            },
            Geometry::CircularString { header, points } => Geometry::CircularString {
                header: header.clone(),
                points: points.clone_shallow(),
            },
            Geometry::Triangle { header, points } => Geometry::Triangle {
                header: header.clone(),
                points: points.clone_shallow(),
            },
            Geometry::Polygon { header, rings } => Geometry::Polygon {
                header: header.clone(),
                rings: rings.iter().map(PointArray::clone_shallow).collect(),
            },
            _ => self.map_collection(Geometry::clone_shallow),
        }
    }

    pub fn clone_deep(&self) -> Self {
        match self {
            Geometry::Point { header, points } => Geometry::Point {
                header: header.clone(),
                points: points.clone_deep(),
            },
            Geometry::LineString { header, points } => Geometry::LineString {
                header: header.clone(),
                points: points.clone_deep(),
            },
            Geometry::CircularString { header, points } => Geometry::CircularString {
                header: header.clone(),
                points: points.clone_deep(),
            },
            Geometry::Triangle { header, points } => Geometry::Triangle {
                header: header.clone(),
                points: points.clone_deep(),
            },
            Geometry::Polygon { header, rings } => Geometry::Polygon {
                header: header.clone(),
                rings: rings.iter().map(PointArray::clone_deep).collect(),
            },
            _ => self.map_collection(Geometry::clone_deep),
        }
    }

    fn map_collection(&self, f: impl Fn(&Geometry) -> Geometry) -> Geometry {
        let header = self.header().clone();
        let mapped: Vec<Geometry> = self.children().iter().map(f).collect();
        rebuild_collection(self.kind(), header, mapped)
    }

    /// Dimension coercion (§3.3): ordinates added by raising `has_z`/
    /// `has_m` are `0.0`.
    pub fn force_dims(&self, has_z: bool, has_m: bool) -> Geometry {
        let new_flags = self.flags().with_z(has_z).with_m(has_m);
        match self {
            Geometry::Point { header, points } => Geometry::Point {
                header: Header::new(new_flags, header.srid),
                points: points.force_dims(has_z, has_m),
            },
            Geometry::LineString { header, points } => Geometry::LineString {
                header: Header::new(new_flags, header.srid),
                points: points.force_dims(has_z, has_m),
            },
            Geometry::CircularString { header, points } => Geometry::CircularString {
                header: Header::new(new_flags, header.srid),
                points: points.force_dims(has_z, has_m),
            },
            Geometry::Triangle { header, points } => Geometry::Triangle {
                header: Header::new(new_flags, header.srid),
                points: points.force_dims(has_z, has_m),
            },
            Geometry::Polygon { header, rings } => Geometry::Polygon {
                header: Header::new(new_flags, header.srid),
                rings: rings.iter().map(|r| r.force_dims(has_z, has_m)).collect(),
            },
            _ => {
                let header = Header::new(new_flags, self.header().srid);
                let mapped: Vec<Geometry> = self
                    .children()
                    .iter()
                    .map(|c| c.force_dims(has_z, has_m))
                    .collect();
                rebuild_collection(self.kind(), header, mapped)
            }
        }
    }

    /// Wraps a singleton in its multi-form when one exists; a value
    /// already a multi-form or without one (e.g. `GeometryCollection`) is
    /// returned unchanged. `count_vertices(as_multi(g)) == count_vertices(g)`
    /// (§8.1 invariant 3) since wrapping adds no vertices.
    pub fn as_multi(self) -> Geometry {
        let flags = self.flags();
        let srid = self.srid();
        match self.kind() {
            GeomKind::Point => {
                let mut multi =
                    Geometry::empty_collection(GeomKind::MultiPoint, srid, flags).unwrap();
                multi.add_geom(self).expect("Point fits MultiPoint");
                multi
            }
            GeomKind::LineString => {
                let mut multi =
                    Geometry::empty_collection(GeomKind::MultiLineString, srid, flags).unwrap();
                multi.add_geom(self).expect("LineString fits MultiLineString");
                multi
            }
            GeomKind::Polygon => {
                let mut multi =
                    Geometry::empty_collection(GeomKind::MultiPolygon, srid, flags).unwrap();
                multi.add_geom(self).expect("Polygon fits MultiPolygon");
                multi
            }
            GeomKind::CircularString | GeomKind::CompoundCurve => {
                let mut multi =
                    Geometry::empty_collection(GeomKind::MultiCurve, srid, flags).unwrap();
                multi.add_geom(self).expect("curve fits MultiCurve");
                multi
            }
            GeomKind::CurvePolygon => {
                let mut multi =
                    Geometry::empty_collection(GeomKind::MultiSurface, srid, flags).unwrap();
                multi.add_geom(self).expect("CurvePolygon fits MultiSurface");
                multi
            }
            _ => self,
        }
    }

    /// Promotes a linear kind to its curved-type tag (`LineString` ->
    /// `CompoundCurve`, `Polygon` -> `CurvePolygon`) without resampling any
    /// coordinates -- the inverse of stroking.
    pub fn as_curve(self) -> Geometry {
        match self {
            Geometry::LineString { header, points } => {
                let mut cc = Geometry::CompoundCurve {
                    header: header.clone(),
                    children: Vec::new(),
                };
                cc.add_geom(Geometry::LineString { header, points })
                    .expect("LineString fits CompoundCurve");
                cc
            }
            Geometry::Polygon { header, rings } => {
                let mut cp = Geometry::CurvePolygon {
                    header: header.clone(),
                    children: Vec::new(),
                };
                for ring in rings {
                    cp.add_geom(Geometry::LineString {
                        header: header.clone(),
                        points: ring,
                    })
                    .expect("ring fits CurvePolygon");
                }
                cp
            }
            other => other,
        }
    }

    /// `reverse(reverse(g)).equals(g)` (§8.1 invariant 6): reverses vertex
    /// order of every leaf array, recursing into collections. Ring order
    /// within a `Polygon` and component order within a `CompoundCurve`/
    /// `CurvePolygon` are preserved -- only each component's own vertex
    /// order flips, matching `ptarray_reverse` applied per ring/component
    /// in the source.
    pub fn reverse(&mut self) {
        match self {
            Geometry::Point { .. } => {}
            Geometry::LineString { points, .. }
            | Geometry::CircularString { points, .. }
            | Geometry::Triangle { points, .. } => points.reverse(),
            Geometry::Polygon { rings, .. } => {
                for ring in rings.iter_mut() {
                    ring.reverse();
                }
            }
            _ => {
                self.header_mut().bbox = None;
                if let Some(children) = self.children_mut() {
                    for child in children.iter_mut() {
                        child.reverse();
                    }
                }
            }
        }
    }

    /// Normalizes ring winding: the outer ring (first) becomes CCW
    /// (`signed_area > 0`), every hole CW (§8.3 property 8). Only
    /// meaningful for `Polygon`; other kinds are left unchanged.
    pub fn force_clockwise(&mut self) {
        if let Geometry::Polygon { rings, .. } = self {
            for (i, ring) in rings.iter_mut().enumerate() {
                let area = ring.signed_area();
                let want_ccw = i == 0;
                if (want_ccw && area < 0.0) || (!want_ccw && area > 0.0) {
                    ring.reverse();
                }
            }
        }
        self.header_mut().bbox = None;
    }
}

fn rebuild_collection(kind: GeomKind, header: Header, children: Vec<Geometry>) -> Geometry {
    match kind {
        GeomKind::MultiPoint => Geometry::MultiPoint { header, children },
        GeomKind::MultiLineString => Geometry::MultiLineString { header, children },
        GeomKind::MultiPolygon => Geometry::MultiPolygon { header, children },
        GeomKind::GeometryCollection => Geometry::GeometryCollection { header, children },
        GeomKind::CompoundCurve => Geometry::CompoundCurve { header, children },
        GeomKind::CurvePolygon => Geometry::CurvePolygon { header, children },
        GeomKind::MultiCurve => Geometry::MultiCurve { header, children },
        GeomKind::MultiSurface => Geometry::MultiSurface { header, children },
        GeomKind::PolyhedralSurface => Geometry::PolyhedralSurface { header, children },
        GeomKind::Tin => Geometry::Tin { header, children },
        other => unreachable!("{other} is not a collection kind"),
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[srid={}, vertices={}]",
            self.kind(),
            self.srid(),
            self.count_vertices()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;

    fn line(coords: &[(f64, f64)]) -> Geometry {
        let points = PointArray::from_coords(
            Flags::XY,
            &coords
                .iter()
                .map(|&(x, y)| Coord4::xy(x, y))
                .collect::<Vec<_>>(),
        );
        Geometry::LineString {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points,
        }
    }

    #[test]
    fn add_geom_rejects_incompatible_child() {
        let mut mp = Geometry::empty_collection(GeomKind::MultiPoint, 0, Flags::XY).unwrap();
        let bad_child = line(&[(0.0, 0.0), (1.0, 1.0)]);
        assert!(mp.add_geom(bad_child).is_err());
    }

    #[test]
    fn as_multi_preserves_vertex_count() {
        let g = line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let before = g.count_vertices();
        let multi = g.as_multi();
        assert_eq!(multi.count_vertices(), before);
        assert_eq!(multi.kind(), GeomKind::MultiLineString);
    }

    #[test]
    fn reverse_is_involutive() {
        let mut g = line(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let original = g.clone();
        g.reverse();
        g.reverse();
        assert_eq!(g, original);
    }

    #[test]
    fn compound_curve_rejects_unjoined_component() {
        let mut cc = Geometry::empty_collection(GeomKind::CompoundCurve, 0, Flags::XY).unwrap();
        cc.add_geom(line(&[(0.0, 0.0), (1.0, 0.0)])).unwrap();
        let unjoined = line(&[(5.0, 5.0), (6.0, 6.0)]);
        assert!(cc.add_geom(unjoined).is_err());
    }
}
