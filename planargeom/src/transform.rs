//! Grid/affine/substring/locate dispatch (C14): geometry-level wrappers
//! over the `PointArray` primitives of the same name, applied recursively
//! to every leaf coordinate array in a geometry tree.

use planargeom_types::coord::Coord4;
use planargeom_types::error::{Error, Result};
use planargeom_types::geometry::Geometry;
use planargeom_types::pointarray::{AffineMatrix, GridSpec, PointArray};

/// Applies `f` to every leaf `PointArray` in `g`, recursing through
/// collections and polygon rings, and invalidating any cached bbox.
fn map_points(g: &Geometry, f: &impl Fn(&PointArray) -> PointArray) -> Geometry {
    match g {
        Geometry::Point { header, points } => Geometry::Point {
            header: header.clone(),
            points: f(points),
        },
        Geometry::LineString { header, points } => Geometry::LineString {
            header: header.clone(),
            points: f(points),
        },
        Geometry::CircularString { header, points } => Geometry::CircularString {
            header: header.clone(),
            points: f(points),
        },
        Geometry::Triangle { header, points } => Geometry::Triangle {
            header: header.clone(),
            points: f(points),
        },
        Geometry::Polygon { header, rings } => Geometry::Polygon {
            header: header.clone(),
            rings: rings.iter().map(f).collect(),
        },
        _ => {
            let mut out = g.clone_shallow();
            out.header_mut().bbox = None;
            if let Some(children) = out.children_mut() {
                for child in children.iter_mut() {
                    *child = map_points(child, f);
                }
            }
            out
        }
    }
}

/// Inserts intermediate vertices so that no 2D segment exceeds `dist`
/// (§4.1), preserving every original vertex (§8.3 property 6).
pub fn segmentize_2d(g: &Geometry, dist: f64) -> Geometry {
    map_points(g, &|pa| pa.segmentize_2d(dist))
}

/// Snaps every coordinate to the nearest grid cell per axis (§4.1/C14); a
/// zero cell size on an axis disables snapping on that axis.
pub fn snap_to_grid(g: &Geometry, grid: GridSpec) -> Geometry {
    map_points(g, &|pa| pa.snap_to_grid(grid))
}

/// Applies a 3x3/4x4 affine matrix to every coordinate in place.
pub fn affine(g: &mut Geometry, matrix: &AffineMatrix) {
    *g = map_points(g, &|pa| {
        let mut cloned = pa.clone_deep();
        cloned.affine(matrix);
        cloned
    });
}

/// Scales every coordinate by `(fx, fy, fz)`.
pub fn scale(g: &mut Geometry, fx: f64, fy: f64, fz: f64) {
    *g = map_points(g, &|pa| {
        let mut cloned = pa.clone_deep();
        cloned.scale(fx, fy, fz);
        cloned
    });
}

/// Maps every `x` ordinate into `[-180, 180]` by shifting `+-360`.
pub fn longitude_shift(g: &mut Geometry) {
    *g = map_points(g, &|pa| {
        let mut cloned = pa.clone_deep();
        cloned.longitude_shift();
        cloned
    });
}

fn leaf_points(g: &Geometry, op: &'static str) -> Result<&PointArray> {
    g.points().ok_or_else(|| Error::unsupported(op, g.kind().name()))
}

/// Sub-polyline of `g` from fractional position `from` to `to` along its
/// cumulative 2D length (§4.1). Only defined for `LineString`.
pub fn substring(g: &Geometry, from: f64, to: f64, snap_tolerance: f64) -> Result<Geometry> {
    match g {
        Geometry::LineString { header, points } => Ok(Geometry::LineString {
            header: header.clone(),
            points: points.substring(from, to, snap_tolerance),
        }),
        other => Err(Error::unsupported("substring", other.kind().name())),
    }
}

/// Closest fraction along `g` to `query`, plus the projected 4D point and
/// distance (§4.1). Only defined for `LineString`.
pub fn locate_point(g: &Geometry, query: Coord4) -> Result<(f64, Coord4, f64)> {
    let points = leaf_points(g, "locate_point")?;
    Ok(points.locate_point(query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use planargeom_types::flags::Flags;
    use planargeom_types::geometry::{Header, SRID_UNKNOWN};

    fn line(coords: &[(f64, f64)]) -> Geometry {
        let points = PointArray::from_coords(
            Flags::XY,
            &coords.iter().map(|&(x, y)| Coord4::xy(x, y)).collect::<Vec<_>>(),
        );
        Geometry::LineString {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points,
        }
    }

    #[test]
    fn segmentize_preserves_original_vertices() {
        let g = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let out = segmentize_2d(&g, 3.0);
        assert!(out.count_vertices() >= 4);
        let pts = out.points().unwrap();
        assert!(pts.startpoint().unwrap().exact_eq_2d(Coord4::xy(0.0, 0.0)));
        assert!(pts.endpoint().unwrap().exact_eq_2d(Coord4::xy(10.0, 0.0)));
    }

    #[test]
    fn scale_multiplies_coordinates() {
        let mut g = line(&[(1.0, 2.0), (3.0, 4.0)]);
        scale(&mut g, 2.0, 2.0, 1.0);
        let pts = g.points().unwrap();
        assert_eq!(pts.get_point(0), Coord4::xy(2.0, 4.0));
        assert_eq!(pts.get_point(1), Coord4::xy(6.0, 8.0));
    }
}
