//! Area / perimeter / length dispatch (§4.2) over the 16-variant tagged
//! union. Curved kinds go through [`crate::arc::stroke`] first, matching
//! the source's "stroke then measure" strategy for anything built from
//! `CircularString` components.

use planargeom_types::geometry::Geometry;
use planargeom_types::pointarray::PointArray;

use crate::arc::{stroke, StrokeOptions};
use crate::kernels;

const DEFAULT_PER_QUAD: u32 = 32;

fn arc_length_closure(p1: planargeom_types::coord::Coord4, p2: planargeom_types::coord::Coord4, p3: planargeom_types::coord::Coord4) -> f64 {
    kernels::arc_length(p1, p2, p3)
}

/// 2D length of a curve-like geometry; zero for point/areal kinds.
pub fn length_2d(g: &Geometry) -> f64 {
    match g {
        Geometry::LineString { points, .. } => points.length_2d(),
        Geometry::CircularString { points, .. } => points.arc_length_2d(arc_length_closure),
        Geometry::Triangle { points, .. } => points.length_2d(),
        Geometry::Polygon { rings, .. } => rings.iter().map(PointArray::length_2d).sum(),
        Geometry::MultiLineString { children, .. }
        | Geometry::MultiCurve { children, .. }
        | Geometry::CompoundCurve { children, .. }
        | Geometry::GeometryCollection { children, .. } => children.iter().map(length_2d).sum(),
        _ => 0.0,
    }
}

/// 3D-aware length when `has_z`, else equal to [`length_2d`].
pub fn length(g: &Geometry) -> f64 {
    if !g.flags().has_z {
        return length_2d(g);
    }
    match g {
        Geometry::LineString { points, .. } | Geometry::Triangle { points, .. } => points.length(),
        Geometry::Polygon { rings, .. } => rings.iter().map(PointArray::length).sum(),
        Geometry::MultiLineString { children, .. }
        | Geometry::MultiCurve { children, .. }
        | Geometry::CompoundCurve { children, .. }
        | Geometry::GeometryCollection { children, .. } => children.iter().map(length).sum(),
        _ => length_2d(g),
    }
}

/// Perimeter of an areal geometry: the sum of all ring/boundary lengths.
pub fn perimeter(g: &Geometry) -> f64 {
    match g {
        Geometry::Polygon { rings, .. } => rings.iter().map(PointArray::length_2d).sum(),
        Geometry::Triangle { points, .. } => points.length_2d(),
        Geometry::MultiPolygon { children, .. }
        | Geometry::MultiSurface { children, .. }
        | Geometry::GeometryCollection { children, .. } => children.iter().map(perimeter).sum(),
        Geometry::CurvePolygon { .. } => {
            let opts = StrokeOptions {
                points_per_quadrant: DEFAULT_PER_QUAD,
            };
            stroke(g, opts).map(|s| perimeter(&s)).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Unsigned area (§4.2): `|signed_area(outer)| - sum(|signed_area(hole)|)`
/// for `Polygon`/`Triangle`; curved surfaces stroke first.
pub fn area(g: &Geometry) -> f64 {
    match g {
        Geometry::Polygon { rings, .. } => polygon_rings_area(rings),
        Geometry::Triangle { points, .. } => points.signed_area().abs(),
        Geometry::MultiPolygon { children, .. }
        | Geometry::MultiSurface { children, .. }
        | Geometry::GeometryCollection { children, .. } => children.iter().map(area).sum(),
        Geometry::CurvePolygon { .. } => {
            let opts = StrokeOptions {
                points_per_quadrant: DEFAULT_PER_QUAD,
            };
            stroke(g, opts).map(|s| area(&s)).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

fn polygon_rings_area(rings: &[PointArray]) -> f64 {
    let Some(outer) = rings.first() else {
        return 0.0;
    };
    let mut total = outer.signed_area().abs();
    for hole in &rings[1..] {
        total -= hole.signed_area().abs();
    }
    total.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use planargeom_types::coord::Coord4;
    use planargeom_types::flags::Flags;
    use planargeom_types::geometry::{Header, SRID_UNKNOWN};

    fn ring(coords: &[(f64, f64)]) -> PointArray {
        PointArray::from_coords(
            Flags::XY,
            &coords.iter().map(|&(x, y)| Coord4::xy(x, y)).collect::<Vec<_>>(),
        )
    }

    #[test]
    fn polygon_area_subtracts_hole() {
        let outer = ring(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ]);
        let hole = ring(&[
            (3.0, 3.0),
            (7.0, 3.0),
            (7.0, 7.0),
            (3.0, 7.0),
            (3.0, 3.0),
        ]);
        let g = Geometry::Polygon {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            rings: vec![outer, hole],
        };
        assert!((area(&g) - 84.0).abs() < 1e-9);
    }
}
