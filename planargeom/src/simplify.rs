//! Simplifiers (C8): geometry-level dispatch for Douglas-Peucker
//! ([`crate::simplify::simplify`], backed by
//! `PointArray::simplify_dp`) and Visvalingam effective-area elimination
//! ([`effective_area`]).
//!
//! Grounded on `original_source/effectivearea.c`'s min-heap elimination
//! order and `original_source/rtgeom_topo.c`'s `simplify` entry point.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use planargeom_types::coord::Coord4;
use planargeom_types::error::{Error, Result};
use planargeom_types::geometry::Geometry;
use planargeom_types::pointarray::PointArray;

fn triangle_area(a: Coord4, b: Coord4, c: Coord4) -> f64 {
    ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)).abs() / 2.0
}

#[derive(Debug)]
struct VScore {
    left: usize,
    current: usize,
    right: usize,
    area: f64,
}

impl PartialEq for VScore {
    fn eq(&self, other: &Self) -> bool {
        self.area == other.area
    }
}
impl Eq for VScore {}
impl PartialOrd for VScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for VScore {
    // Reversed so `BinaryHeap` (a max-heap) pops the smallest area first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.area.partial_cmp(&self.area).unwrap()
    }
}

/// Computes the Visvalingam "effective area" at which every interior vertex
/// would be eliminated (§8.3 property 2); the two endpoints are never
/// eliminated and carry `f64::INFINITY`.
///
/// The elimination order is by increasing area via a min-heap; each
/// vertex's recorded effective area is `max(its own triangle area, the
/// largest area eliminated so far)`, which is what makes the sequence
/// non-decreasing. The source panics if this invariant is violated; this
/// port keeps that assertion.
pub fn effective_areas(points: &PointArray) -> Vec<f64> {
    let n = points.npoints();
    let mut areas = vec![f64::INFINITY; n];
    if n < 3 {
        return areas;
    }
    let pts: Vec<Coord4> = points.iter().collect();
    let mut prev: Vec<usize> = (0..n).collect();
    let mut next: Vec<usize> = (0..n).collect();
    for i in 0..n {
        if i > 0 {
            prev[i] = i - 1;
        }
        if i + 1 < n {
            next[i] = i + 1;
        }
    }

    let mut heap = BinaryHeap::new();
    for i in 1..n - 1 {
        heap.push(VScore {
            left: i - 1,
            current: i,
            right: i + 1,
            area: triangle_area(pts[i - 1], pts[i], pts[i + 1]),
        });
    }

    let mut max_so_far = 0.0_f64;
    while let Some(VScore {
        left,
        current,
        right,
        area,
    }) = heap.pop()
    {
        if prev[current] != left || next[current] != right {
            continue; // stale entry: current's neighbors changed since this was pushed
        }
        let effective = area.max(max_so_far);
        assert!(
            effective + 1e-9 >= max_so_far,
            "visvalingam effective-area sequence must be non-decreasing"
        );
        max_so_far = effective;
        areas[current] = effective;
        next[left] = right;
        prev[right] = left;
        if left > 0 {
            heap.push(VScore {
                left: prev[left],
                current: left,
                right,
                area: triangle_area(pts[prev[left]], pts[left], pts[right]),
            });
        }
        if right < n - 1 {
            heap.push(VScore {
                left,
                current: right,
                right: next[right],
                area: triangle_area(pts[left], pts[right], pts[next[right]]),
            });
        }
    }
    areas
}

/// Visvalingam effective-area simplification of a single coordinate array.
///
/// When `set_m` is set, every input vertex is kept and its `m` ordinate is
/// overwritten with its computed effective area (callers can then filter
/// by `m` themselves). Otherwise vertices whose effective area is at or
/// below `threshold` are dropped, always keeping both endpoints.
pub fn effective_area_points(points: &PointArray, threshold: f64, set_m: bool) -> PointArray {
    let areas = effective_areas(points);
    if set_m {
        let coords: Vec<Coord4> = points
            .iter()
            .zip(areas.iter())
            .map(|(mut c, &a)| {
                c.m = a;
                c
            })
            .collect();
        PointArray::from_coords(points.flags().with_m(true), &coords)
    } else {
        let coords: Vec<Coord4> = points
            .iter()
            .zip(areas.iter())
            .filter(|(_, &a)| a > threshold)
            .map(|(c, _)| c)
            .collect();
        PointArray::from_coords(points.flags(), &coords)
    }
}

/// Geometry-level Visvalingam simplification (§4.1), recursing through
/// collections and polygon rings.
pub fn effective_area(g: &Geometry, threshold: f64, set_m: bool) -> Result<Geometry> {
    recurse_points(g, |pa| effective_area_points(pa, threshold, set_m))
}

fn recurse_points(g: &Geometry, f: impl Fn(&PointArray) -> PointArray + Copy) -> Result<Geometry> {
    Ok(match g {
        Geometry::Point { header, points } => Geometry::Point {
            header: header.clone(),
            points: points.clone_shallow(),
        },
        Geometry::LineString { header, points } => Geometry::LineString {
            header: header.clone(),
            points: f(points),
        },
        Geometry::Triangle { header, points } => Geometry::Triangle {
            header: header.clone(),
            points: points.clone_shallow(),
        },
        Geometry::Polygon { header, rings } => Geometry::Polygon {
            header: header.clone(),
            rings: rings.iter().map(|r| f(r)).collect(),
        },
        Geometry::MultiPoint { .. } | Geometry::MultiLineString { .. } | Geometry::MultiPolygon { .. }
        | Geometry::GeometryCollection { .. } => {
            let mut out = g.clone_shallow();
            if let Some(children) = out.children_mut() {
                for child in children.iter_mut() {
                    *child = recurse_points(child, f)?;
                }
            }
            out
        }
        other => {
            return Err(Error::unsupported("simplify", other.kind().name()));
        }
    })
}

/// Minimum vertex count a ring/linestring must keep (§8.2): 2 for open
/// curves, 4 for closed rings.
fn min_points_for(g: &Geometry) -> usize {
    match g {
        Geometry::Polygon { .. } | Geometry::Triangle { .. } => 4,
        _ => 2,
    }
}

/// Douglas-Peucker simplification (§4.1/§8.3) with the "preserve collapsed"
/// flag from the public surface (§6.4).
///
/// A LineString/ring is considered *collapsed* when simplification reduces
/// it to exactly its structural minimum (2 points for an open curve, 4 for
/// a ring) while the input had more than that minimum -- i.e. every
/// interior vertex was eliminated and the shape degenerated to a straight
/// segment (open curve) or a zero-area ring. With `preserve_collapsed =
/// false` a collapsed component is dropped (a collapsed hole is simply
/// omitted; a collapsed outer ring or top-level LineString makes the whole
/// call return `Ok(None)`), matching §8.4 scenario 4.
pub fn simplify(g: &Geometry, tolerance: f64, preserve_collapsed: bool) -> Result<Option<Geometry>> {
    match g {
        Geometry::Point { .. } | Geometry::MultiPoint { .. } => Ok(Some(g.clone_shallow())),
        Geometry::LineString { header, points } => {
            let min_points = min_points_for(g);
            let simplified = points.simplify_dp(tolerance, min_points);
            if !preserve_collapsed
                && points.npoints() > min_points
                && simplified.npoints() <= min_points
            {
                return Ok(None);
            }
            Ok(Some(Geometry::LineString {
                header: header.clone(),
                points: simplified,
            }))
        }
        Geometry::Polygon { header, rings } => {
            let mut out_rings = Vec::with_capacity(rings.len());
            for (i, ring) in rings.iter().enumerate() {
                let simplified = ring.simplify_dp(tolerance, 4);
                let collapsed = ring.npoints() > 4 && simplified.npoints() <= 4;
                if collapsed && !preserve_collapsed {
                    if i == 0 {
                        return Ok(None); // outer ring collapsed: whole polygon is discarded
                    }
                    continue; // a collapsed hole is simply dropped
                }
                out_rings.push(simplified);
            }
            Ok(Some(Geometry::Polygon {
                header: header.clone(),
                rings: out_rings,
            }))
        }
        Geometry::MultiLineString { .. } | Geometry::MultiPolygon { .. } | Geometry::GeometryCollection { .. } => {
            let mut out = g.clone_shallow();
            if let Some(children) = out.children_mut() {
                let mut kept = Vec::with_capacity(children.len());
                for child in children.drain(..) {
                    if let Some(simplified) = simplify(&child, tolerance, preserve_collapsed)? {
                        kept.push(simplified);
                    }
                }
                *children = kept;
            }
            Ok(Some(out))
        }
        other => Err(Error::unsupported("simplify", other.kind().name())),
    }
}

/// Geometry-level `remove_repeated_points` (§4.1), recursing through
/// collections and polygon rings.
pub fn remove_repeated_points(g: &Geometry, tolerance: f64) -> Result<Geometry> {
    let min_points = |gg: &Geometry| if matches!(gg, Geometry::Polygon { .. }) { 4 } else { 2 };
    recurse_points(g, |pa| pa.remove_repeated_points(tolerance, min_points(g)))
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
    fn effective_area_sequence_is_nondecreasing() {
        let points = PointArray::from_coords(
            Flags::XY,
            &[
                Coord4::xy(0.0, 0.0),
                Coord4::xy(1.0, 5.0),
                Coord4::xy(2.0, -1.0),
                Coord4::xy(3.0, 4.0),
                Coord4::xy(4.0, 0.0),
            ],
        );
        let areas = effective_areas(&points);
        let mut finite: Vec<f64> = areas.into_iter().filter(|a| a.is_finite()).collect();
        let sorted = {
            let mut s = finite.clone();
            s.sort_by(|a, b| a.partial_cmp(b).unwrap());
            s
        };
        finite.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(finite, sorted);
    }

    #[test]
    fn simplify_preserve_collapsed_keeps_endpoints() {
        let g = line(&[(0.0, 0.0), (1.0, 0.0001), (2.0, 0.0)]);
        let simplified = simplify(&g, 0.001, true).unwrap().unwrap();
        assert_eq!(simplified.count_vertices(), 2);
    }

    #[test]
    fn simplify_discards_collapsed_without_preserve() {
        let g = line(&[(0.0, 0.0), (1.0, 0.0001), (2.0, 0.0)]);
        let simplified = simplify(&g, 0.001, false).unwrap();
        assert!(simplified.is_none());
    }

    #[test]
    fn simplify_zero_tolerance_is_identity() {
        let g = line(&[(0.0, 0.0), (1.0, 5.0), (2.0, 0.0)]);
        let simplified = simplify(&g, 0.0, true).unwrap().unwrap();
        assert_eq!(simplified.count_vertices(), g.count_vertices());
    }
}
