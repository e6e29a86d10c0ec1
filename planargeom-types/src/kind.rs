//! The 16-member discriminant of §3.3.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GeomKind {
    Point,
    LineString,
    Polygon,
    Triangle,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    CircularString,
    CompoundCurve,
    CurvePolygon,
    MultiCurve,
    MultiSurface,
    PolyhedralSurface,
    Tin,
}

impl GeomKind {
    pub const fn name(self) -> &'static str {
        match self {
            GeomKind::Point => "Point",
            GeomKind::LineString => "LineString",
            GeomKind::Polygon => "Polygon",
            GeomKind::Triangle => "Triangle",
            GeomKind::MultiPoint => "MultiPoint",
            GeomKind::MultiLineString => "MultiLineString",
            GeomKind::MultiPolygon => "MultiPolygon",
            GeomKind::GeometryCollection => "GeometryCollection",
            GeomKind::CircularString => "CircularString",
            GeomKind::CompoundCurve => "CompoundCurve",
            GeomKind::CurvePolygon => "CurvePolygon",
            GeomKind::MultiCurve => "MultiCurve",
            GeomKind::MultiSurface => "MultiSurface",
            GeomKind::PolyhedralSurface => "PolyhedralSurface",
            GeomKind::Tin => "Tin",
        }
    }

    pub const fn is_collection(self) -> bool {
        matches!(
            self,
            GeomKind::MultiPoint
                | GeomKind::MultiLineString
                | GeomKind::MultiPolygon
                | GeomKind::GeometryCollection
                | GeomKind::CompoundCurve
                | GeomKind::CurvePolygon
                | GeomKind::MultiCurve
                | GeomKind::MultiSurface
                | GeomKind::PolyhedralSurface
                | GeomKind::Tin
        )
    }

    pub const fn is_curved(self) -> bool {
        matches!(
            self,
            GeomKind::CircularString
                | GeomKind::CompoundCurve
                | GeomKind::CurvePolygon
                | GeomKind::MultiCurve
                | GeomKind::MultiSurface
        )
    }

    /// The parent/child compatibility matrix of §4.2.
    pub fn accepts_child(self, child: GeomKind) -> bool {
        match self {
            GeomKind::GeometryCollection => true,
            GeomKind::MultiPoint => child == GeomKind::Point,
            GeomKind::MultiLineString => child == GeomKind::LineString,
            GeomKind::MultiPolygon => child == GeomKind::Polygon,
            GeomKind::CompoundCurve => {
                matches!(child, GeomKind::LineString | GeomKind::CircularString)
            }
            GeomKind::CurvePolygon => matches!(
                child,
                GeomKind::LineString | GeomKind::CircularString | GeomKind::CompoundCurve
            ),
            GeomKind::MultiCurve => matches!(
                child,
                GeomKind::LineString | GeomKind::CircularString | GeomKind::CompoundCurve
            ),
            GeomKind::MultiSurface => {
                matches!(child, GeomKind::Polygon | GeomKind::CurvePolygon)
            }
            GeomKind::PolyhedralSurface => child == GeomKind::Polygon,
            GeomKind::Tin => child == GeomKind::Triangle,
            _ => false,
        }
    }
}

impl fmt::Display for GeomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_curve_rejects_polygon_child() {
        assert!(!GeomKind::CompoundCurve.accepts_child(GeomKind::Polygon));
        assert!(GeomKind::CompoundCurve.accepts_child(GeomKind::CircularString));
    }

    #[test]
    fn geometry_collection_accepts_anything() {
        assert!(GeomKind::GeometryCollection.accepts_child(GeomKind::Tin));
    }
}
