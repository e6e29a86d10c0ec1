//! Arc subsystem (C9): stroke (arc -> polyline) and unstroke (polyline ->
//! arc) plus the traversal needed to stroke `CompoundCurve`/`CurvePolygon`/
//! `MultiCurve`/`MultiSurface`.
//!
//! Grounded on `original_source/lwarc.h`/`lwstroke.c`'s per-quadrant
//! stepping and `lwgeom_unstroke`'s greedy arc-detection scan.

use planargeom_types::coord::Coord4;
use planargeom_types::error::{Error, Result};
use planargeom_types::flags::Flags;
use planargeom_types::geometry::{Geometry, Header};
use planargeom_types::pointarray::PointArray;

use crate::kernels::{self, ArcParams};

/// Stroke resolution: segments per quarter circle. SFS compatibility
/// defaults to 32 (§4.5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeOptions {
    pub points_per_quadrant: u32,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        StrokeOptions {
            points_per_quadrant: 32,
        }
    }
}

/// Tolerances governing how eagerly [`unstroke`] recognizes an arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnstrokeOptions {
    /// Max deviation (absolute) of a candidate vertex from the circle.
    pub radius_tolerance: f64,
    /// Max difference between consecutive angular steps.
    pub angle_tolerance: f64,
    /// Minimum number of polyline edges required per quadrant of sweep for
    /// a span to be accepted as an arc (§4.5).
    pub min_quad_edges: f64,
}

impl Default for UnstrokeOptions {
    fn default() -> Self {
        UnstrokeOptions {
            radius_tolerance: 1e-6,
            angle_tolerance: 1e-3,
            min_quad_edges: 2.0,
        }
    }
}

fn interpolate_half_arc(
    center: Coord4,
    p1: Coord4,
    p2: Coord4,
    p3: Coord4,
    theta: f64,
    ccw: bool,
) -> (f64, f64) {
    let sweep1 = kernels::angular_step(center, p1, p2, ccw);
    let sweep2 = kernels::angular_step(center, p2, p3, ccw);
    if theta <= sweep1 {
        let frac = if sweep1 > 0.0 { theta / sweep1 } else { 0.0 };
        (p1.z + (p2.z - p1.z) * frac, p1.m + (p2.m - p1.m) * frac)
    } else {
        let theta2 = theta - sweep1;
        let frac = if sweep2 > 0.0 { theta2 / sweep2 } else { 0.0 };
        (p2.z + (p3.z - p2.z) * frac, p2.m + (p3.m - p2.m) * frac)
    }
}

/// Strokes one arc triple `(p1, p2, p3)` into its polyline points,
/// inclusive of both endpoints.
pub fn stroke_triple(p1: Coord4, p2: Coord4, p3: Coord4, per_quad: u32) -> Vec<Coord4> {
    let Some(ArcParams { center, radius }) = kernels::arc_center(p1, p2, p3) else {
        // Colinear triple: emitted as a straight line (§4.5).
        return vec![p1, p3];
    };

    let dir = kernels::sweep_direction(p1, p2, p3);
    let ccw = dir >= 0;
    let total_sweep = kernels::arc_sweep_angle(center, p1, p2, p3);
    if total_sweep < 1e-12 {
        return vec![p1, p3];
    }

    let step = std::f64::consts::FRAC_PI_2 / per_quad.max(1) as f64;
    let n_steps = (total_sweep / step).round().max(1.0) as u64;
    let actual_step = total_sweep / n_steps as f64;
    let signed_step = if ccw { actual_step } else { -actual_step };

    let a1 = kernels::arc_angle(center, p1);
    let mut out = Vec::with_capacity(n_steps as usize + 1);
    out.push(p1);
    for t in 1..n_steps {
        let theta = signed_step * t as f64;
        let angle = a1 + theta;
        let x = center.x + radius * angle.cos();
        let y = center.y + radius * angle.sin();
        let (z, m) = interpolate_half_arc(center, p1, p2, p3, theta.abs(), ccw);
        out.push(Coord4::xyzm(x, y, z, m));
    }
    out.push(p3);
    out
}

fn stroke_circular_string(points: &PointArray, per_quad: u32) -> PointArray {
    let n = points.npoints();
    let mut result: Vec<Coord4> = Vec::new();
    let mut i = 0;
    while i + 2 < n {
        let p1 = points.get_point(i);
        let p2 = points.get_point(i + 1);
        let p3 = points.get_point(i + 2);
        let seg = stroke_triple(p1, p2, p3, per_quad);
        if result.last().map(|last| last.exact_eq_2d(seg[0])).unwrap_or(false) {
            result.extend(seg.into_iter().skip(1));
        } else {
            result.extend(seg);
        }
        i += 2;
    }
    PointArray::from_coords(points.flags(), &result)
}

fn as_linestring_points(g: &Geometry, per_quad: u32) -> Result<PointArray> {
    match g {
        Geometry::LineString { points, .. } => Ok(points.clone_shallow()),
        Geometry::CircularString { points, .. } => Ok(stroke_circular_string(points, per_quad)),
        other => Err(Error::unsupported("stroke component", other.kind().name())),
    }
}

fn stroke_curve_to_points(g: &Geometry, per_quad: u32) -> Result<PointArray> {
    match g {
        Geometry::LineString { .. } | Geometry::CircularString { .. } => {
            as_linestring_points(g, per_quad)
        }
        Geometry::CompoundCurve { children, .. } => {
            let mut out: Vec<Coord4> = Vec::new();
            for child in children {
                let seg = stroke_curve_to_points(child, per_quad)?;
                if out
                    .last()
                    .map(|last| seg.startpoint().map(|s| last.exact_eq_2d(s)).unwrap_or(false))
                    .unwrap_or(false)
                {
                    out.extend(seg.iter().skip(1));
                } else {
                    out.extend(seg.iter());
                }
            }
            Ok(PointArray::from_coords(g.flags(), &out))
        }
        other => Err(Error::unsupported("stroke curve", other.kind().name())),
    }
}

/// Replaces every circular arc in `g` with a polyline approximation at
/// `opts.points_per_quadrant` segments per quarter circle (§4.5).
pub fn stroke(g: &Geometry, opts: StrokeOptions) -> Result<Geometry> {
    let per_quad = opts.points_per_quadrant;
    match g {
        Geometry::Point { .. }
        | Geometry::LineString { .. }
        | Geometry::Polygon { .. }
        | Geometry::Triangle { .. }
        | Geometry::MultiPoint { .. }
        | Geometry::MultiLineString { .. }
        | Geometry::MultiPolygon { .. }
        | Geometry::PolyhedralSurface { .. }
        | Geometry::Tin { .. } => Ok(g.clone_deep()),
        Geometry::CircularString { header, points } => Ok(Geometry::LineString {
            header: header.clone(),
            points: stroke_circular_string(points, per_quad),
        }),
        Geometry::CompoundCurve { header, .. } => Ok(Geometry::LineString {
            header: header.clone(),
            points: stroke_curve_to_points(g, per_quad)?,
        }),
        Geometry::CurvePolygon { header, children } => {
            let rings = children
                .iter()
                .map(|ring| stroke_curve_to_points(ring, per_quad))
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::Polygon {
                header: header.clone(),
                rings,
            })
        }
        Geometry::MultiCurve { header, children } => {
            let mut multi = Geometry::MultiLineString {
                header: header.clone(),
                children: Vec::new(),
            };
            for child in children {
                let points = stroke_curve_to_points(child, per_quad)?;
                multi.add_geom(Geometry::LineString {
                    header: Header::new(header.flags, header.srid),
                    points,
                })?;
            }
            Ok(multi)
        }
        Geometry::MultiSurface { header, children } => {
            let mut multi = Geometry::MultiPolygon {
                header: header.clone(),
                children: Vec::new(),
            };
            for child in children {
                let stroked = stroke(child, opts)?;
                let rings = match stroked {
                    Geometry::Polygon { rings, .. } => rings,
                    other => return Err(Error::unsupported("stroke MultiSurface child", other.kind().name())),
                };
                multi.add_geom(Geometry::Polygon {
                    header: Header::new(header.flags, header.srid),
                    rings,
                })?;
            }
            Ok(multi)
        }
        Geometry::GeometryCollection { header, children } => {
            let mut out = Geometry::GeometryCollection {
                header: header.clone(),
                children: Vec::new(),
            };
            for child in children {
                out.add_geom(stroke(child, opts)?)?;
            }
            Ok(out)
        }
    }
}

/// Whether polyline vertex `candidate` continues the arc defined by the
/// circle through `(p0, p1, p2)` with running direction `ccw` and the most
/// recent angular step `prev_step`.
fn pt_continues_arc(
    params: &ArcParams,
    prev: Coord4,
    candidate: Coord4,
    prev_step: f64,
    ccw: bool,
    opts: &UnstrokeOptions,
) -> bool {
    let on_circle = (candidate.distance_2d(params.center) - params.radius).abs() < opts.radius_tolerance;
    if !on_circle {
        return false;
    }
    let step = kernels::angular_step(params.center, prev, candidate, ccw);
    (step - prev_step).abs() < opts.angle_tolerance
}

/// Detects arcs in a flat polyline (§4.5), returning alternating
/// `LineString`/`CircularString` components covering every input vertex.
fn unstroke_points(points: &PointArray, opts: UnstrokeOptions) -> Vec<Geometry> {
    let n = points.npoints();
    let flags = points.flags();
    let mut components = Vec::new();
    if n < 4 {
        if n >= 2 {
            components.push(Geometry::LineString {
                header: Header::new(flags, 0),
                points: points.clone_shallow(),
            });
        }
        return components;
    }

    let pts: Vec<Coord4> = points.iter().collect();
    let mut line_start = 0usize;
    let mut i = 0usize;

    while i + 2 < n {
        let (p0, p1, p2) = (pts[i], pts[i + 1], pts[i + 2]);
        if let Some(params) = kernels::arc_center(p0, p1, p2) {
            let dir = kernels::sweep_direction(p0, p1, p2);
            let ccw = dir >= 0;
            let mut end = i + 2;
            let mut prev_step = kernels::angular_step(params.center, p0, p1, ccw);
            let mut j = i + 3;
            while j < n {
                let step_ok = pt_continues_arc(&params, pts[j - 1], pts[j], prev_step, ccw, &opts);
                if !step_ok {
                    break;
                }
                prev_step = kernels::angular_step(params.center, pts[j - 1], pts[j], ccw);
                end = j;
                j += 1;
            }

            let edges = (end - i) as f64;
            let sweep = kernels::arc_sweep_angle(params.center, pts[i], pts[i + 1], pts[end]);
            let quadrants = (sweep / std::f64::consts::FRAC_PI_2).max(1e-9);
            if edges >= opts.min_quad_edges * quadrants {
                if i > line_start {
                    components.push(Geometry::LineString {
                        header: Header::new(flags, 0),
                        points: PointArray::from_coords(flags, &pts[line_start..=i]),
                    });
                }
                let mid_idx = pick_midpoint_index(&params, &pts, i, end, ccw);
                components.push(Geometry::CircularString {
                    header: Header::new(flags, 0),
                    points: PointArray::from_coords(flags, &[pts[i], pts[mid_idx], pts[end]]),
                });
                line_start = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }

    if line_start < n - 1 {
        components.push(Geometry::LineString {
            header: Header::new(flags, 0),
            points: PointArray::from_coords(flags, &pts[line_start..]),
        });
    }
    components
}

fn pick_midpoint_index(params: &ArcParams, pts: &[Coord4], start: usize, end: usize, ccw: bool) -> usize {
    let total = kernels::angular_step(params.center, pts[start], pts[end], ccw);
    let target = total / 2.0;
    let mut best = start + 1;
    let mut best_diff = f64::INFINITY;
    for idx in (start + 1)..end {
        let step = kernels::angular_step(params.center, pts[start], pts[idx], ccw);
        let diff = (step - target).abs();
        if diff < best_diff {
            best_diff = diff;
            best = idx;
        }
    }
    best
}

/// Recovers circular arcs from a polyline geometry (§4.5): the inverse of
/// [`stroke`], heuristic rather than exact.
pub fn unstroke(g: &Geometry) -> Result<Geometry> {
    unstroke_with(g, UnstrokeOptions::default())
}

pub fn unstroke_with(g: &Geometry, opts: UnstrokeOptions) -> Result<Geometry> {
    match g {
        Geometry::LineString { header, points } => {
            let components = unstroke_points(points, opts);
            Ok(wrap_components(header.clone(), components))
        }
        Geometry::Polygon { header, rings } => {
            let mut curve_poly = Geometry::CurvePolygon {
                header: header.clone(),
                children: Vec::new(),
            };
            for ring in rings {
                let components = unstroke_points(ring, opts);
                curve_poly.add_geom(wrap_components(header.clone(), components))?;
            }
            Ok(curve_poly)
        }
        other => Ok(other.clone_deep()),
    }
}

fn wrap_components(header: Header, mut components: Vec<Geometry>) -> Geometry {
    if components.len() == 1 {
        return components.pop().unwrap();
    }
    let mut cc = Geometry::CompoundCurve {
        header,
        children: Vec::new(),
    };
    for c in components {
        cc.add_geom(c).expect("unstroke emits end-to-start joined components");
    }
    cc
}

#[cfg(test)]
mod tests {
    use super::*;
    use planargeom_types::flags::Flags;
    use planargeom_types::geometry::SRID_UNKNOWN;
    use planargeom_types::kind::GeomKind;

    fn circular_string(coords: &[(f64, f64)]) -> Geometry {
        let points = PointArray::from_coords(
            Flags::XY,
            &coords.iter().map(|&(x, y)| Coord4::xy(x, y)).collect::<Vec<_>>(),
        );
        Geometry::CircularString {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points,
        }
    }

    #[test]
    fn stroke_half_circle_yields_33_points() {
        let g = circular_string(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let stroked = stroke(&g, StrokeOptions::default()).unwrap();
        match stroked {
            Geometry::LineString { points, .. } => assert_eq!(points.npoints(), 33),
            _ => panic!("expected LineString"),
        }
    }

    #[test]
    fn stroke_then_unstroke_round_trips_endpoints() {
        let g = circular_string(&[(0.0, 0.0), (1.0, 1.0), (2.0, 0.0)]);
        let stroked = stroke(&g, StrokeOptions::default()).unwrap();
        let recovered = unstroke(&stroked).unwrap();
        assert_eq!(recovered.kind(), GeomKind::CircularString);
        let pts = recovered.points().unwrap();
        assert!(pts.startpoint().unwrap().exact_eq_2d(Coord4::xy(0.0, 0.0)));
        assert!(pts.endpoint().unwrap().exact_eq_2d(Coord4::xy(2.0, 0.0)));
        let mid = pts.get_point(1);
        assert!((mid.x - 1.0).abs() < 1e-6);
        assert!((mid.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn colinear_triple_strokes_to_a_line() {
        let p1 = Coord4::xy(0.0, 0.0);
        let p2 = Coord4::xy(1.0, 0.0);
        let p3 = Coord4::xy(2.0, 0.0);
        assert_eq!(stroke_triple(p1, p2, p3, 32), vec![p1, p3]);
    }
}
