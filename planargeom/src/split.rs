//! Splitter and subdivider (C10), grounded on the `rtline_split_by_point_to`
//! family and the subdivide-by-vertex-count recursion of §4.6.
//!
//! `split_by_point`/`split_by_multipoint`/`split_by_line` dispatch on the
//! blade's kind; [`split`] is the public entry point that picks among them.
//! `subdivide` recurses a geometry into bbox-sized pieces via an internal
//! rectangular clip (Sutherland-Hodgman for rings, Liang-Barsky for
//! polylines) rather than delegating to an external CG library.

use planargeom_types::coord::Coord4;
use planargeom_types::error::{Error, Result};
use planargeom_types::flags::Flags;
use planargeom_types::gbox::Box2D;
use planargeom_types::geometry::{Geometry, Header};
use planargeom_types::kind::GeomKind;
use planargeom_types::pointarray::{PointArray, PointPosition};

use crate::kernels::{segment_intersection_point, segment_intersects, IntersectionKind};

const SUBDIVIDE_MAX_DEPTH: u32 = 50;
const SUBDIVIDE_MIN_MAX_VERTICES: usize = 8;
const FP_TOLERANCE: f64 = 1e-12;

/// Splits `line` at `point` (§4.6). Returns zero pieces if `point` doesn't
/// lie on the line within tolerance, one (the line unchanged) if `point` is
/// exactly an endpoint, or two substrings otherwise.
pub fn split_by_point(line: &Geometry, point: Coord4) -> Result<Vec<Geometry>> {
    let (header, points) = match line {
        Geometry::LineString { header, points } => (header, points),
        other => return Err(Error::unsupported("split_by_point", other.kind().name())),
    };
    if points.npoints() < 2 {
        return Ok(Vec::new());
    }
    let length = points.length_2d();
    let (fraction, _projected, distance) = points.locate_point(point);
    let off_line_tolerance = (length * 1e-10).max(1e-10);
    if distance > off_line_tolerance {
        return Ok(Vec::new());
    }
    if fraction <= 0.0 || fraction >= 1.0 {
        return Ok(vec![line.clone_shallow()]);
    }
    let snap_tolerance = length / 1e14;
    let first = points.substring(0.0, fraction, snap_tolerance);
    let second = points.substring(fraction, 1.0, snap_tolerance);
    Ok(vec![
        Geometry::LineString {
            header: header.clone(),
            points: first,
        },
        Geometry::LineString {
            header: header.clone(),
            points: second,
        },
    ])
}

fn multipoint_coords(blade: &Geometry) -> Result<Vec<Coord4>> {
    match blade {
        Geometry::Point { points, .. } => {
            if points.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![points.get_point(0)])
            }
        }
        Geometry::MultiPoint { children, .. } => Ok(children
            .iter()
            .filter_map(|c| c.points())
            .filter(|p| !p.is_empty())
            .map(|p| p.get_point(0))
            .collect()),
        other => Err(Error::unsupported("split_by_multipoint", other.kind().name())),
    }
}

/// Splits `line` repeatedly by every point in `blade`: for each point, the
/// first current component it falls on is replaced by its two halves
/// (§4.6). Points that miss every component are simply skipped.
pub fn split_by_multipoint(line: &Geometry, blade: &Geometry) -> Result<Vec<Geometry>> {
    let mut components = vec![line.clone_shallow()];
    for pt in multipoint_coords(blade)? {
        for i in 0..components.len() {
            let pieces = split_by_point(&components[i], pt)?;
            if pieces.len() == 2 {
                components.splice(i..=i, pieces);
                break;
            }
        }
    }
    Ok(components)
}

fn blade_polyline(blade: &Geometry) -> Result<Vec<Coord4>> {
    match blade {
        Geometry::LineString { points, .. } => Ok(points.iter().collect()),
        other => Err(Error::unsupported("split_by_line", other.kind().name())),
    }
}

fn crossing(a: Coord4, b: Coord4, q1: Coord4, q2: Coord4) -> Option<Coord4> {
    match segment_intersects(a, b, q1, q2) {
        IntersectionKind::NoIntersection | IntersectionKind::Colinear => None,
        _ => segment_intersection_point(a, b, q1, q2),
    }
}

/// Splits a LineString or Polygon by a straight line blade (§4.6). A
/// LineString target is cut at every crossing, delegating to
/// [`split_by_multipoint`]. A Polygon target is only split when the blade
/// crosses its outer ring exactly twice (a single straight cut); anything
/// else is returned unchanged, since partitioning a polygon with holes
/// across an arbitrary blade is a planar-graph problem this splitter
/// doesn't attempt.
pub fn split_by_line(target: &Geometry, blade: &Geometry) -> Result<Vec<Geometry>> {
    let blade_points = blade_polyline(blade)?;
    match target {
        Geometry::LineString { header, points } => {
            let mut cuts = Vec::new();
            let n = points.npoints();
            for i in 0..n.saturating_sub(1) {
                let a = points.get_point(i);
                let b = points.get_point(i + 1);
                for w in blade_points.windows(2) {
                    if let Some(pt) = crossing(a, b, w[0], w[1]) {
                        cuts.push(pt);
                    }
                }
            }
            if cuts.is_empty() {
                return Ok(vec![target.clone_shallow()]);
            }
            let blade_multipoint = Geometry::MultiPoint {
                header: header.clone(),
                children: cuts
                    .into_iter()
                    .map(|c| Geometry::Point {
                        header: header.clone(),
                        points: PointArray::from_coords(header.flags, &[c]),
                    })
                    .collect(),
            };
            split_by_multipoint(target, &blade_multipoint)
        }
        Geometry::Polygon { header, rings } => split_polygon_by_line(header, rings, &blade_points),
        other => Err(Error::unsupported("split_by_line", other.kind().name())),
    }
}

fn split_polygon_by_line(header: &Header, rings: &[PointArray], blade: &[Coord4]) -> Result<Vec<Geometry>> {
    let unsplit = || {
        Ok(vec![Geometry::Polygon {
            header: header.clone(),
            rings: rings.to_vec(),
        }])
    };
    let outer = match rings.first() {
        Some(r) if r.npoints() >= 4 => r,
        _ => return unsplit(),
    };
    let n = outer.npoints();
    let mut hits: Vec<(usize, f64, Coord4)> = Vec::new();
    for i in 0..n - 1 {
        let a = outer.get_point(i);
        let b = outer.get_point(i + 1);
        for w in blade.windows(2) {
            if let Some(pt) = crossing(a, b, w[0], w[1]) {
                let seg_len = a.distance_2d(b);
                let t = if seg_len > 0.0 { a.distance_2d(pt) / seg_len } else { 0.0 };
                hits.push((i, t, pt));
            }
        }
    }
    if hits.len() != 2 {
        return unsplit();
    }
    hits.sort_by(|x, y| x.0.cmp(&y.0).then(x.1.partial_cmp(&y.1).unwrap()));
    let (i1, _, p1) = hits[0];
    let (i2, _, p2) = hits[1];
    if i1 == i2 {
        return unsplit();
    }

    let distinct = n - 1;
    let vertex = |i: usize| outer.get_point(i % distinct);

    let mut chain_a = vec![p1];
    for k in (i1 + 1)..=i2 {
        chain_a.push(vertex(k));
    }
    chain_a.push(p2);
    chain_a.push(p1);

    let mut chain_b = vec![p2];
    let mut k = i2 + 1;
    while k % distinct != (i1 + 1) % distinct {
        chain_b.push(vertex(k));
        k += 1;
    }
    chain_b.push(p1);
    chain_b.push(p2);

    let ring_a = PointArray::from_coords(header.flags, &chain_a);
    let ring_b = PointArray::from_coords(header.flags, &chain_b);

    let mut rings_a = vec![ring_a];
    let mut rings_b = vec![ring_b];
    for hole in rings.iter().skip(1) {
        if hole.is_empty() {
            continue;
        }
        let probe = hole.get_point(0);
        if matches!(rings_a[0].contains_point(probe), PointPosition::Inside) {
            rings_a.push(hole.clone_shallow());
        } else if matches!(rings_b[0].contains_point(probe), PointPosition::Inside) {
            rings_b.push(hole.clone_shallow());
        }
    }

    Ok(vec![
        Geometry::Polygon {
            header: header.clone(),
            rings: rings_a,
        },
        Geometry::Polygon {
            header: header.clone(),
            rings: rings_b,
        },
    ])
}

/// Dispatches on the blade's kind (§6.4's `split(geom, blade)`): a Point
/// blade splits by point, a MultiPoint blade splits by multipoint, a
/// LineString blade splits by line.
pub fn split(geom: &Geometry, blade: &Geometry) -> Result<Vec<Geometry>> {
    match blade {
        Geometry::Point { points, .. } if !points.is_empty() => split_by_point(geom, points.get_point(0)),
        Geometry::Point { .. } => Ok(vec![geom.clone_shallow()]),
        Geometry::MultiPoint { .. } => split_by_multipoint(geom, blade),
        Geometry::LineString { .. } => split_by_line(geom, blade),
        other => Err(Error::unsupported("split", other.kind().name())),
    }
}

fn lerp_x(a: Coord4, b: Coord4, x: f64) -> Coord4 {
    a.lerp(b, (x - a.x) / (b.x - a.x))
}

fn lerp_y(a: Coord4, b: Coord4, y: f64) -> Coord4 {
    a.lerp(b, (y - a.y) / (b.y - a.y))
}

fn clip_half_plane(poly: &[Coord4], inside: impl Fn(Coord4) -> bool, intersect: impl Fn(Coord4, Coord4) -> Coord4) -> Vec<Coord4> {
    if poly.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(poly.len() + 2);
    for i in 0..poly.len() {
        let curr = poly[i];
        let prev = poly[(i + poly.len() - 1) % poly.len()];
        let curr_in = inside(curr);
        let prev_in = inside(prev);
        if curr_in {
            if !prev_in {
                out.push(intersect(prev, curr));
            }
            out.push(curr);
        } else if prev_in {
            out.push(intersect(prev, curr));
        }
    }
    out
}

/// Sutherland-Hodgman clip of a closed ring against an axis-aligned
/// rectangle, used by `subdivide`'s recursive bisection.
fn clip_ring(ring: &[Coord4], rect: &Box2D) -> Vec<Coord4> {
    let mut poly = ring.to_vec();
    if poly.len() > 1 && poly.first().unwrap().exact_eq_2d(*poly.last().unwrap()) {
        poly.pop();
    }
    if poly.len() < 3 {
        return Vec::new();
    }
    poly = clip_half_plane(&poly, |p| p.x >= rect.xmin, |a, b| lerp_x(a, b, rect.xmin));
    poly = clip_half_plane(&poly, |p| p.x <= rect.xmax, |a, b| lerp_x(a, b, rect.xmax));
    poly = clip_half_plane(&poly, |p| p.y >= rect.ymin, |a, b| lerp_y(a, b, rect.ymin));
    poly = clip_half_plane(&poly, |p| p.y <= rect.ymax, |a, b| lerp_y(a, b, rect.ymax));
    poly
}

fn close_ring(mut coords: Vec<Coord4>, flags: Flags) -> PointArray {
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if !first.exact_eq_2d(last) {
            coords.push(first);
        }
    }
    PointArray::from_coords(flags, &coords)
}

/// Liang-Barsky clip of a single segment against an axis-aligned rectangle.
fn clip_segment(a: Coord4, b: Coord4, rect: &Box2D) -> Option<(Coord4, Coord4)> {
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let checks = [
        (-dx, a.x - rect.xmin),
        (dx, rect.xmax - a.x),
        (-dy, a.y - rect.ymin),
        (dy, rect.ymax - a.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }
    if t0 > t1 {
        return None;
    }
    Some((a.lerp(b, t0), a.lerp(b, t1)))
}

fn clip_polyline(points: &PointArray, rect: &Box2D) -> Vec<Vec<Coord4>> {
    let n = points.npoints();
    let mut chains: Vec<Vec<Coord4>> = Vec::new();
    for i in 0..n.saturating_sub(1) {
        let a = points.get_point(i);
        let b = points.get_point(i + 1);
        if let Some((ca, cb)) = clip_segment(a, b, rect) {
            match chains.last_mut() {
                Some(chain) if chain.last().is_some_and(|&p| p.exact_eq_2d(ca)) => chain.push(cb),
                _ => chains.push(vec![ca, cb]),
            }
        }
    }
    chains.into_iter().filter(|c| c.len() >= 2).collect()
}

fn add_clipped_child(out: &mut Geometry, clipped: Geometry) -> Result<()> {
    if out.kind().accepts_child(clipped.kind()) {
        out.add_geom(clipped)
    } else {
        for child in clipped.children().to_vec() {
            add_clipped_child(out, child)?;
        }
        Ok(())
    }
}

/// Clips a geometry to an axis-aligned rectangle, used internally by
/// `subdivide` (§4.6) in place of an external rectangular-clip
/// collaborator. Curved and solid kinds have no exact clip here: they pass
/// through unchanged as long as their bbox still meets the rectangle.
fn clip_to_box(geom: &Geometry, rect: &Box2D) -> Result<Option<Geometry>> {
    match geom {
        Geometry::Point { points, .. } => {
            if points.is_empty() {
                return Ok(None);
            }
            let p = points.get_point(0);
            Ok(rect.contains_point(p).then(|| geom.clone_shallow()))
        }
        Geometry::LineString { header, points } => {
            let chains = clip_polyline(points, rect);
            match chains.len() {
                0 => Ok(None),
                1 => Ok(Some(Geometry::LineString {
                    header: header.clone(),
                    points: PointArray::from_coords(header.flags, &chains[0]),
                })),
                _ => {
                    let mut out = Geometry::empty_collection(GeomKind::MultiLineString, header.srid, header.flags)?;
                    for c in chains {
                        out.add_geom(Geometry::LineString {
                            header: header.clone(),
                            points: PointArray::from_coords(header.flags, &c),
                        })?;
                    }
                    Ok(Some(out))
                }
            }
        }
        Geometry::Polygon { header, rings } => {
            let outer_coords: Vec<Coord4> = rings[0].iter().collect();
            let clipped_outer = clip_ring(&outer_coords, rect);
            if clipped_outer.len() < 3 {
                return Ok(None);
            }
            let mut out_rings = vec![close_ring(clipped_outer, header.flags)];
            for hole in rings.iter().skip(1) {
                let hole_coords: Vec<Coord4> = hole.iter().collect();
                let clipped_hole = clip_ring(&hole_coords, rect);
                if clipped_hole.len() >= 3 {
                    out_rings.push(close_ring(clipped_hole, header.flags));
                }
            }
            Ok(Some(Geometry::Polygon {
                header: header.clone(),
                rings: out_rings,
            }))
        }
        Geometry::MultiPoint { header, children }
        | Geometry::MultiLineString { header, children }
        | Geometry::MultiPolygon { header, children }
        | Geometry::GeometryCollection { header, children } => {
            let mut out = Geometry::empty_collection(geom.kind(), header.srid, header.flags)?;
            for child in children {
                if let Some(clipped) = clip_to_box(child, rect)? {
                    if !clipped.is_empty() {
                        add_clipped_child(&mut out, clipped)?;
                    }
                }
            }
            Ok((!out.children().is_empty()).then_some(out))
        }
        other => {
            let bbox = other.compute_bbox().as_2d();
            Ok(rect.overlaps(&bbox).then(|| other.clone_deep()))
        }
    }
}

/// Recursively bisects `geom` by vertex count (§4.6): pieces with at most
/// `max_vertices` vertices are emitted as-is; larger pieces are clipped to
/// each half of their bbox, bisected along the wider axis, and recursed
/// into. Depth is capped at 50 so the recursion always terminates, and
/// `max_vertices` is floored at 8.
pub fn subdivide(geom: &Geometry, max_vertices: usize) -> Result<Vec<Geometry>> {
    let max_vertices = max_vertices.max(SUBDIVIDE_MIN_MAX_VERTICES);
    let mut out = Vec::new();
    subdivide_recurse(geom, max_vertices, 0, &mut out)?;
    Ok(out)
}

fn subdivide_recurse(geom: &Geometry, max_vertices: usize, depth: u32, out: &mut Vec<Geometry>) -> Result<()> {
    if geom.is_empty() {
        return Ok(());
    }
    if geom.count_vertices() <= max_vertices || depth >= SUBDIVIDE_MAX_DEPTH {
        out.push(geom.clone_deep());
        return Ok(());
    }
    let rect = geom.compute_bbox().as_2d();
    let (left, right) = rect.bisect_wider_axis(FP_TOLERANCE);
    for half in [left, right] {
        if let Some(clipped) = clip_to_box(geom, &half)? {
            if !clipped.is_empty() {
                subdivide_recurse(&clipped, max_vertices, depth + 1, out)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use planargeom_types::geometry::SRID_UNKNOWN;

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

    fn square(side: f64) -> Geometry {
        let ring = PointArray::from_coords(
            Flags::XY,
            &[
                Coord4::xy(0.0, 0.0),
                Coord4::xy(side, 0.0),
                Coord4::xy(side, side),
                Coord4::xy(0.0, side),
                Coord4::xy(0.0, 0.0),
            ],
        );
        Geometry::Polygon {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            rings: vec![ring],
        }
    }

    #[test]
    fn split_by_point_splits_line_in_two() {
        let g = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let pieces = split_by_point(&g, Coord4::xy(4.0, 0.0)).unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].points().unwrap().endpoint().unwrap(), Coord4::xy(4.0, 0.0));
        assert_eq!(pieces[1].points().unwrap().startpoint().unwrap(), Coord4::xy(4.0, 0.0));
    }

    #[test]
    fn split_by_point_off_line_returns_nothing() {
        let g = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let pieces = split_by_point(&g, Coord4::xy(4.0, 5.0)).unwrap();
        assert!(pieces.is_empty());
    }

    #[test]
    fn split_by_point_at_endpoint_is_unsplit() {
        let g = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let pieces = split_by_point(&g, Coord4::xy(0.0, 0.0)).unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].count_vertices(), 2);
    }

    #[test]
    fn split_by_multipoint_splits_into_three() {
        let g = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let blade = Geometry::MultiPoint {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            children: vec![
                Geometry::Point {
                    header: Header::new(Flags::XY, SRID_UNKNOWN),
                    points: PointArray::from_coords(Flags::XY, &[Coord4::xy(3.0, 0.0)]),
                },
                Geometry::Point {
                    header: Header::new(Flags::XY, SRID_UNKNOWN),
                    points: PointArray::from_coords(Flags::XY, &[Coord4::xy(7.0, 0.0)]),
                },
            ],
        };
        let pieces = split_by_multipoint(&g, &blade).unwrap();
        assert_eq!(pieces.len(), 3);
    }

    #[test]
    fn split_by_line_cuts_crossing_linestring() {
        let g = line(&[(0.0, -5.0), (0.0, 5.0)]);
        let blade = line(&[(-5.0, 0.0), (5.0, 0.0)]);
        let pieces = split_by_line(&g, &blade).unwrap();
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn split_by_line_bisects_square() {
        let g = square(10.0);
        let blade = line(&[(5.0, -1.0), (5.0, 11.0)]);
        let pieces = split_by_line(&g, &blade).unwrap();
        assert_eq!(pieces.len(), 2);
        for p in &pieces {
            assert!(matches!(p, Geometry::Polygon { .. }));
        }
    }

    #[test]
    fn subdivide_respects_max_vertices() {
        let coords: Vec<(f64, f64)> = (0..40).map(|i| (i as f64, (i as f64).sin())).collect();
        let g = line(&coords);
        let pieces = subdivide(&g, 10).unwrap();
        assert!(pieces.len() > 1);
        for p in &pieces {
            assert!(p.count_vertices() <= 10 || p.count_vertices() == g.count_vertices());
        }
    }

    #[test]
    fn subdivide_floors_max_vertices_at_eight() {
        let g = square(10.0);
        let pieces = subdivide(&g, 1).unwrap();
        assert!(!pieces.is_empty());
    }

    #[test]
    fn subdivide_small_geometry_is_unchanged() {
        let g = line(&[(0.0, 0.0), (1.0, 1.0)]);
        let pieces = subdivide(&g, 100).unwrap();
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].count_vertices(), 2);
    }
}
