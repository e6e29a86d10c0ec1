//! Structural re-shaping operations that don't fit the "one coordinate
//! array at a time" model of [`crate::transform`]: SFS-compatibility
//! stroking and `GeometryCollection` homogenization (§4.2).

use planargeom_types::error::Result;
use planargeom_types::geometry::Geometry;
use planargeom_types::kind::GeomKind;

use crate::arc::{stroke, StrokeOptions};

/// Which OGC Simple Features Specification revision a geometry should be
/// coerced to. Neither revision has curve types, so both strip arcs the
/// same way here; the distinction is kept for callers who branch on it
/// (e.g. a future `PolyhedralSurface`/`Tin` restriction for 1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfsVersion {
    V1_1,
    V1_2,
}

/// Strokes every circular arc out of `g` so the result only uses the 7 SFS
/// base types, per the public surface's `force_sfs(version)` (§4.2).
pub fn force_sfs(g: &Geometry, _version: SfsVersion) -> Result<Geometry> {
    if g.kind().is_curved() {
        return stroke(g, StrokeOptions::default());
    }
    match g {
        Geometry::GeometryCollection { header, children } => {
            let mut out = Geometry::GeometryCollection {
                header: header.clone(),
                children: Vec::new(),
            };
            for child in children {
                out.add_geom(force_sfs(child, _version)?)?;
            }
            Ok(out)
        }
        other => Ok(other.clone_deep()),
    }
}

fn collection_kind_for(leaf: GeomKind) -> Option<GeomKind> {
    match leaf {
        GeomKind::Point => Some(GeomKind::MultiPoint),
        GeomKind::LineString => Some(GeomKind::MultiLineString),
        GeomKind::Polygon => Some(GeomKind::MultiPolygon),
        GeomKind::CircularString | GeomKind::CompoundCurve => Some(GeomKind::MultiCurve),
        GeomKind::CurvePolygon => Some(GeomKind::MultiSurface),
        GeomKind::Triangle => Some(GeomKind::Tin),
        GeomKind::MultiPoint
        | GeomKind::MultiLineString
        | GeomKind::MultiPolygon
        | GeomKind::MultiCurve
        | GeomKind::MultiSurface
        | GeomKind::PolyhedralSurface
        | GeomKind::Tin => Some(leaf), // already a collection kind: merge peers of the same kind
        GeomKind::GeometryCollection => None,
    }
}

/// Flattens `g`'s children one level, pulling any nested
/// `GeometryCollection`'s own (already-homogenized) children up to this
/// level.
fn flatten(children: &[Geometry]) -> Result<Vec<Geometry>> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match homogenize(child)? {
            Geometry::GeometryCollection { children: inner, .. } => out.extend(inner),
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Re-buckets a `GeometryCollection` into the tightest type it can be
/// (§4.2): a singleton if exactly one element remains after flattening, a
/// typed multi-form if every element shares a kind (or is itself the same
/// multi-kind, in which case peers are merged), else an anonymous
/// flattened `GeometryCollection`.
pub fn homogenize(g: &Geometry) -> Result<Geometry> {
    let Geometry::GeometryCollection { header, children } = g else {
        return Ok(g.clone_shallow());
    };

    let flat = flatten(children)?;
    if flat.is_empty() {
        return Ok(g.clone_shallow());
    }
    if flat.len() == 1 {
        return Ok(flat.into_iter().next().unwrap());
    }

    let kind0 = flat[0].kind();
    if !flat.iter().all(|c| c.kind() == kind0) {
        return Ok(Geometry::GeometryCollection {
            header: header.clone(),
            children: flat,
        });
    }

    let Some(multi_kind) = collection_kind_for(kind0) else {
        return Ok(Geometry::GeometryCollection {
            header: header.clone(),
            children: flat,
        });
    };

    if multi_kind == kind0 {
        // Already a collection kind: merge every peer's children together.
        let mut merged = Geometry::empty_collection(multi_kind, header.srid, header.flags)?;
        for peer in flat {
            for grandchild in peer.children() {
                merged.add_geom(grandchild.clone_shallow())?;
            }
        }
        Ok(merged)
    } else {
        let mut multi = Geometry::empty_collection(multi_kind, header.srid, header.flags)?;
        for leaf in flat {
            multi.add_geom(leaf)?;
        }
        Ok(multi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planargeom_types::coord::Coord4;
    use planargeom_types::flags::Flags;
    use planargeom_types::geometry::{Header, SRID_UNKNOWN};
    use planargeom_types::pointarray::PointArray;

    fn point(x: f64, y: f64) -> Geometry {
        Geometry::Point {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points: PointArray::from_coords(Flags::XY, &[Coord4::xy(x, y)]),
        }
    }

    #[test]
    fn homogenize_collapses_single_element() {
        let mut gc = Geometry::empty_collection(GeomKind::GeometryCollection, 0, Flags::XY).unwrap();
        gc.add_geom(point(1.0, 2.0)).unwrap();
        let h = homogenize(&gc).unwrap();
        assert_eq!(h.kind(), GeomKind::Point);
    }

    #[test]
    fn homogenize_buckets_same_kind_points_as_multipoint() {
        let mut gc = Geometry::empty_collection(GeomKind::GeometryCollection, 0, Flags::XY).unwrap();
        gc.add_geom(point(1.0, 2.0)).unwrap();
        gc.add_geom(point(3.0, 4.0)).unwrap();
        let h = homogenize(&gc).unwrap();
        assert_eq!(h.kind(), GeomKind::MultiPoint);
        assert_eq!(h.count_vertices(), 2);
    }

    #[test]
    fn homogenize_keeps_mixed_kinds_as_collection() {
        let mut gc = Geometry::empty_collection(GeomKind::GeometryCollection, 0, Flags::XY).unwrap();
        gc.add_geom(point(1.0, 2.0)).unwrap();
        let line = Geometry::LineString {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points: PointArray::from_coords(Flags::XY, &[Coord4::xy(0.0, 0.0), Coord4::xy(1.0, 1.0)]),
        };
        gc.add_geom(line).unwrap();
        let h = homogenize(&gc).unwrap();
        assert_eq!(h.kind(), GeomKind::GeometryCollection);
    }
}
