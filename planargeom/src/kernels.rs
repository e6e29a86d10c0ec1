//! Analytic kernels (C6): segment side, arc center/length/sweep, point-in-arc,
//! and the segment/segment, segment/arc, and arc/arc intersection
//! classifiers used throughout the distance engine (C7) and the arc
//! subsystem (C9).
//!
//! Grounded on `original_source/measures.c`'s side-of-chord/distance
//! routines and `original_source/src/rtalgorithm.c`'s circumscribed-circle
//! solve.

use planargeom_types::coord::{self, Coord4, EPSILON_SQLMM};

/// Sign of `q` relative to the directed segment `p1 -> p2`: negative is
/// right of the segment, positive is left, zero is colinear.
pub fn segment_side(p1: Coord4, p2: Coord4, q: Coord4) -> i32 {
    let side = (q.x - p1.x) * (p2.y - p1.y) - (p2.x - p1.x) * (q.y - p1.y);
    if coord::abs(side) < EPSILON_SQLMM {
        0
    } else if side < 0.0 {
        -1
    } else {
        1
    }
}

/// The circumscribed circle of three arc-defining points (§4.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcParams {
    pub center: Coord4,
    pub radius: f64,
}

/// Computes the center/radius of the arc through `p1, p2, p3`.
///
/// Returns `None` when the three points are colinear (no unique circle).
/// When `p1 == p3` the three points describe a full circle; the center is
/// the midpoint of `p1` and `p2` per the source's degenerate-case handling.
pub fn arc_center(p1: Coord4, p2: Coord4, p3: Coord4) -> Option<ArcParams> {
    if p1.exact_eq_2d(p3) {
        let center = Coord4::xy((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
        let radius = center.distance_2d(p1);
        return Some(ArcParams { center, radius });
    }

    let cross = (p2.x - p1.x) * (p3.y - p1.y) - (p3.x - p1.x) * (p2.y - p1.y);
    if coord::abs(cross) < EPSILON_SQLMM {
        return None;
    }

    let x1 = p1.x;
    let y1 = p1.y;
    let x2 = p2.x;
    let y2 = p2.y;
    let x3 = p3.x;
    let y3 = p3.y;

    let a = x2 - x1;
    let b = y2 - y1;
    let c = x3 - x1;
    let d = y3 - y1;
    let e = a * (x1 + x2) + b * (y1 + y2);
    let f = c * (x1 + x3) + d * (y1 + y3);
    let g = 2.0 * (a * (y3 - y2) - b * (x3 - x2));

    if coord::abs(g) < EPSILON_SQLMM {
        return None;
    }

    let cx = (d * e - b * f) / g;
    let cy = (a * f - c * e) / g;
    let center = Coord4::xy(cx, cy);
    let radius = center.distance_2d(p1);
    Some(ArcParams { center, radius })
}

/// Angle (radians, `atan2` range) of `p` about `center`.
pub fn arc_angle(center: Coord4, p: Coord4) -> f64 {
    (p.y - center.y).atan2(p.x - center.x)
}

/// Sweep direction: `1` if `p2` is left of chord `p1 -> p3` (CCW sweep),
/// `-1` if right (CW sweep). Zero only for the degenerate colinear case,
/// which callers must rule out before calling this.
pub fn sweep_direction(p1: Coord4, p2: Coord4, p3: Coord4) -> i32 {
    segment_side(p1, p3, p2)
}

/// Total angular sweep (radians, always positive) from `p1` to `p3` going
/// through `p2`, for the arc centered at `center`.
pub fn arc_sweep_angle(center: Coord4, p1: Coord4, p2: Coord4, p3: Coord4) -> f64 {
    if p1.exact_eq_2d(p3) {
        return std::f64::consts::TAU;
    }
    let a1 = arc_angle(center, p1);
    let a2 = arc_angle(center, p2);
    let a3 = arc_angle(center, p3);
    let dir = sweep_direction(p1, p2, p3);
    let norm = |from: f64, to: f64, ccw: bool| -> f64 {
        let mut delta = to - from;
        if ccw {
            while delta < 0.0 {
                delta += std::f64::consts::TAU;
            }
        } else {
            while delta > 0.0 {
                delta -= std::f64::consts::TAU;
            }
        }
        delta.abs()
    };
    let ccw = dir >= 0;
    norm(a1, a2, ccw) + norm(a2, a3, ccw)
}

/// Angular step from `from` to `to` about `center`, measured going forward
/// in the direction `ccw` indicates (wrapping through zero as needed). Used
/// by `unstroke` to check that consecutive polyline vertices advance by a
/// similar angle, the signature of a stroked arc.
pub fn angular_step(center: Coord4, from: Coord4, to: Coord4, ccw: bool) -> f64 {
    let a_from = arc_angle(center, from);
    let a_to = arc_angle(center, to);
    let mut delta = a_to - a_from;
    if ccw {
        while delta < 0.0 {
            delta += std::f64::consts::TAU;
        }
    } else {
        while delta > 0.0 {
            delta -= std::f64::consts::TAU;
        }
    }
    delta.abs()
}

/// Arc length of the circular arc through `p1, p2, p3` (§4.3): circumference
/// times sweep fraction. Colinear triples have zero radius/length.
pub fn arc_length(p1: Coord4, p2: Coord4, p3: Coord4) -> f64 {
    match arc_center(p1, p2, p3) {
        Some(params) => params.radius * arc_sweep_angle(params.center, p1, p2, p3),
        None => p1.distance_2d(p2) + p2.distance_2d(p3),
    }
}

/// Whether `p` lies on the open arc defined by `p1, p2, p3`: on the circle,
/// within tolerance, and on the same side of chord `p1 -> p3` as `p2` (or
/// exactly at an endpoint).
pub fn point_on_arc(p: Coord4, p1: Coord4, p2: Coord4, p3: Coord4) -> bool {
    let Some(params) = arc_center(p1, p2, p3) else {
        return false;
    };
    if (p.distance_2d(params.center) - params.radius).abs() > EPSILON_SQLMM {
        return false;
    }
    if p.exact_eq_2d(p1) || p.exact_eq_2d(p3) {
        return true;
    }
    if p1.exact_eq_2d(p3) {
        return true;
    }
    let side_p2 = segment_side(p1, p3, p2);
    let side_p = segment_side(p1, p3, p);
    side_p2 == 0 || side_p == side_p2
}

/// Result of classifying two directed segments against one another (§4.3).
/// "Touch" from the *second* endpoint of either segment is folded into
/// `NoIntersection` by the caller to avoid double-counting along a chain of
/// segments that share an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntersectionKind {
    NoIntersection,
    Colinear,
    CrossLeft,
    CrossRight,
    TouchLeft,
    TouchRight,
}

fn segment_bbox_overlap(p1: Coord4, p2: Coord4, q1: Coord4, q2: Coord4) -> bool {
    let (p_xmin, p_xmax) = (coord::min(p1.x, p2.x), coord::max(p1.x, p2.x));
    let (p_ymin, p_ymax) = (coord::min(p1.y, p2.y), coord::max(p1.y, p2.y));
    let (q_xmin, q_xmax) = (coord::min(q1.x, q2.x), coord::max(q1.x, q2.x));
    let (q_ymin, q_ymax) = (coord::min(q1.y, q2.y), coord::max(q1.y, q2.y));
    p_xmin <= q_xmax && p_xmax >= q_xmin && p_ymin <= q_ymax && p_ymax >= q_ymin
}

/// Classifies the intersection between directed segments `p1 -> p2` and
/// `q1 -> q2` using the sign pattern of the four side tests (§4.3).
pub fn segment_intersects(p1: Coord4, p2: Coord4, q1: Coord4, q2: Coord4) -> IntersectionKind {
    if !segment_bbox_overlap(p1, p2, q1, q2) {
        return IntersectionKind::NoIntersection;
    }

    let s_q1 = segment_side(p1, p2, q1);
    let s_q2 = segment_side(p1, p2, q2);
    let s_p1 = segment_side(q1, q2, p1);
    let s_p2 = segment_side(q1, q2, p2);

    if s_q1 == 0 && s_q2 == 0 && s_p1 == 0 && s_p2 == 0 {
        return IntersectionKind::Colinear;
    }

    if s_q1 == s_q2 || s_p1 == s_p2 {
        // Both endpoints of one segment fall on the same side of the
        // other: no crossing, though one endpoint might still touch.
        if s_q1 == 0 && s_q2 != 0 {
            return if s_p1 != s_p2 {
                IntersectionKind::TouchLeft
            } else {
                IntersectionKind::NoIntersection
            };
        }
        if s_p1 == 0 && s_p2 != 0 {
            return IntersectionKind::NoIntersection; // touch from the second endpoint's side
        }
        return IntersectionKind::NoIntersection;
    }

    // The two sides disagree on both tests: a proper crossing, unless one
    // of the four values is exactly zero (a touch).
    if s_q1 == 0 || s_q2 == 0 || s_p1 == 0 || s_p2 == 0 {
        return if s_q2 == 0 || s_p2 == 0 {
            // Touch attributed to the *second* endpoint: treat as no
            // intersection to avoid double-counting along a chain.
            IntersectionKind::NoIntersection
        } else if s_p1 > 0 {
            IntersectionKind::TouchLeft
        } else {
            IntersectionKind::TouchRight
        };
    }

    if s_p1 > 0 {
        IntersectionKind::CrossLeft
    } else {
        IntersectionKind::CrossRight
    }
}

/// Closest-point result between a segment and an analytic primitive: the
/// minimum 2D distance plus the witnessing point on each side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPair {
    pub distance: f64,
    pub on_a: Coord4,
    pub on_b: Coord4,
}

/// Closest point on segment `p1 -> p2` to `q`, and the distance to it.
pub fn closest_point_on_segment(p1: Coord4, p2: Coord4, q: Coord4) -> (Coord4, f64) {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let len2 = dx * dx + dy * dy;
    if len2 < EPSILON_SQLMM {
        return (p1, p1.distance_2d(q));
    }
    let t = (((q.x - p1.x) * dx + (q.y - p1.y) * dy) / len2).clamp(0.0, 1.0);
    let on = p1.lerp(p2, t);
    (on, on.distance_2d(q))
}

/// Minimum distance between segments `p1->p2` and `q1->q2`, with the
/// witnessing point pair.
pub fn segment_segment_distance(p1: Coord4, p2: Coord4, q1: Coord4, q2: Coord4) -> ClosestPair {
    if segment_intersects(p1, p2, q1, q2) != IntersectionKind::NoIntersection {
        if let Some(pt) = segment_intersection_point(p1, p2, q1, q2) {
            return ClosestPair {
                distance: 0.0,
                on_a: pt,
                on_b: pt,
            };
        }
    }
    let candidates = [
        {
            let (on, d) = closest_point_on_segment(p1, p2, q1);
            ClosestPair {
                distance: d,
                on_a: on,
                on_b: q1,
            }
        },
        {
            let (on, d) = closest_point_on_segment(p1, p2, q2);
            ClosestPair {
                distance: d,
                on_a: on,
                on_b: q2,
            }
        },
        {
            let (on, d) = closest_point_on_segment(q1, q2, p1);
            ClosestPair {
                distance: d,
                on_a: p1,
                on_b: on,
            }
        },
        {
            let (on, d) = closest_point_on_segment(q1, q2, p2);
            ClosestPair {
                distance: d,
                on_a: p2,
                on_b: on,
            }
        },
    ];
    candidates
        .into_iter()
        .min_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap())
        .unwrap()
}

/// Exact intersection point of two (already known to cross or touch)
/// segments, via the standard parametric line-line solution.
pub fn segment_intersection_point(p1: Coord4, p2: Coord4, q1: Coord4, q2: Coord4) -> Option<Coord4> {
    let d1x = p2.x - p1.x;
    let d1y = p2.y - p1.y;
    let d2x = q2.x - q1.x;
    let d2y = q2.y - q1.y;
    let denom = d1x * d2y - d1y * d2x;
    if coord::abs(denom) < EPSILON_SQLMM {
        return None;
    }
    let t = ((q1.x - p1.x) * d2y - (q1.y - p1.y) * d2x) / denom;
    Some(p1.lerp(p2, t.clamp(0.0, 1.0)))
}

/// Minimum distance between segment `p1->p2` and the arc `a1, a2, a3`, used
/// by the distance engine (§4.3 seg/arc).
///
/// Solves the analytic circle/line intersection; if either candidate lies
/// within both the segment and the arc's sweep, distance is zero. Otherwise
/// falls back to the minimum of endpoint-to-segment and endpoint-to-arc
/// distances, matching the source's documented fallback.
pub fn segment_arc_distance(p1: Coord4, p2: Coord4, a1: Coord4, a2: Coord4, a3: Coord4) -> ClosestPair {
    if let Some(params) = arc_center(a1, a2, a3) {
        if let Some((i1, i2)) = line_circle_intersections(p1, p2, params.center, params.radius) {
            for cand in [i1, i2] {
                let t_in_seg = point_on_segment_span(p1, p2, cand);
                if t_in_seg && point_on_arc(cand, a1, a2, a3) {
                    return ClosestPair {
                        distance: 0.0,
                        on_a: cand,
                        on_b: cand,
                    };
                }
            }
        }
    }

    let mut best: Option<ClosestPair> = None;
    let mut consider = |on_a: Coord4, on_b: Coord4| {
        let d = on_a.distance_2d(on_b);
        if best.map(|b| d < b.distance).unwrap_or(true) {
            best = Some(ClosestPair {
                distance: d,
                on_a,
                on_b,
            });
        }
    };
    let (on, _) = closest_point_on_segment(p1, p2, a1);
    consider(on, a1);
    let (on, _) = closest_point_on_segment(p1, p2, a3);
    consider(on, a3);
    for endpoint in [p1, p2] {
        consider(endpoint, closest_point_on_arc(endpoint, a1, a2, a3));
    }
    best.unwrap()
}

fn point_on_segment_span(p1: Coord4, p2: Coord4, pt: Coord4) -> bool {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let len2 = dx * dx + dy * dy;
    if len2 < EPSILON_SQLMM {
        return pt.exact_eq_2d(p1);
    }
    let t = ((pt.x - p1.x) * dx + (pt.y - p1.y) * dy) / len2;
    (-EPSILON_SQLMM..=1.0 + EPSILON_SQLMM).contains(&t)
}

/// Closest point on the full circle through `a1,a2,a3` to `p`, clamped to
/// the arc's sweep by falling back to the nearer endpoint when the
/// geometric closest point on the circle falls outside the sweep.
pub fn closest_point_on_arc(p: Coord4, a1: Coord4, a2: Coord4, a3: Coord4) -> Coord4 {
    let Some(params) = arc_center(a1, a2, a3) else {
        let (on, _) = closest_point_on_segment(a1, a3, p);
        return on;
    };
    let dir = Coord4::xy(p.x - params.center.x, p.y - params.center.y);
    let len = (dir.x * dir.x + dir.y * dir.y).sqrt();
    if len < EPSILON_SQLMM {
        return a1;
    }
    let candidate = Coord4::xy(
        params.center.x + dir.x / len * params.radius,
        params.center.y + dir.y / len * params.radius,
    );
    if point_on_arc(candidate, a1, a2, a3) {
        candidate
    } else if p.distance_2d(a1) <= p.distance_2d(a3) {
        a1
    } else {
        a3
    }
}

/// Up to two intersection points of line `p1->p2` (extended infinitely)
/// with the circle centered at `center` with the given `radius`.
pub fn line_circle_intersections(
    p1: Coord4,
    p2: Coord4,
    center: Coord4,
    radius: f64,
) -> Option<(Coord4, Coord4)> {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let fx = p1.x - center.x;
    let fy = p1.y - center.y;

    let a = dx * dx + dy * dy;
    if a < EPSILON_SQLMM {
        return None;
    }
    let b = 2.0 * (fx * dx + fy * dy);
    let c = fx * fx + fy * fy - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let t1 = (-b - sq) / (2.0 * a);
    let t2 = (-b + sq) / (2.0 * a);
    Some((p1.lerp(p2, t1), p1.lerp(p2, t2)))
}

/// Minimum distance between two arcs `(a1,a2,a3)` and `(b1,b2,b3)` (§4.3
/// arc/arc), classified by comparing the center-center distance to the sum
/// and difference of radii.
pub fn arc_arc_distance(
    a1: Coord4,
    a2: Coord4,
    a3: Coord4,
    b1: Coord4,
    b2: Coord4,
    b3: Coord4,
) -> ClosestPair {
    let (Some(pa), Some(pb)) = (arc_center(a1, a2, a3), arc_center(b1, b2, b3)) else {
        // One or both triples are colinear: treat as a pair of segments.
        return segment_segment_distance(a1, a3, b1, b3);
    };

    let d = pa.center.distance_2d(pb.center);
    let sum = pa.radius + pb.radius;
    let diff = (pa.radius - pb.radius).abs();

    if d < EPSILON_SQLMM && (pa.radius - pb.radius).abs() < EPSILON_SQLMM {
        // Concentric, equal-radius circles: fall back to endpoint sampling.
        return sample_arc_pair_endpoints(a1, a2, a3, b1, b2, b3);
    }

    let dir = if d > EPSILON_SQLMM {
        Coord4::xy(
            (pb.center.x - pa.center.x) / d,
            (pb.center.y - pa.center.y) / d,
        )
    } else {
        Coord4::xy(1.0, 0.0)
    };

    if (d - sum).abs() < EPSILON_SQLMM {
        let pt = Coord4::xy(
            pa.center.x + dir.x * pa.radius,
            pa.center.y + dir.y * pa.radius,
        );
        if point_on_arc(pt, a1, a2, a3) && point_on_arc(pt, b1, b2, b3) {
            return ClosestPair {
                distance: 0.0,
                on_a: pt,
                on_b: pt,
            };
        }
    } else if d > sum || d < diff {
        let (ta, tb) = if d > sum {
            (pa.radius, -pb.radius)
        } else if pa.radius >= pb.radius {
            (pa.radius, pa.radius - d)
        } else {
            (-pa.radius, d - pa.radius)
        };
        let on_a = Coord4::xy(pa.center.x + dir.x * ta, pa.center.y + dir.y * ta);
        let on_b = Coord4::xy(pa.center.x + dir.x * tb, pa.center.y + dir.y * tb);
        if point_on_arc(on_a, a1, a2, a3) && point_on_arc(on_b, b1, b2, b3) {
            return ClosestPair {
                distance: on_a.distance_2d(on_b),
                on_a,
                on_b,
            };
        }
    } else {
        // Two circles genuinely intersect: chord-offset formula.
        let a = (d * d + pa.radius * pa.radius - pb.radius * pb.radius) / (2.0 * d);
        let h2 = pa.radius * pa.radius - a * a;
        if h2 >= 0.0 {
            let h = h2.sqrt();
            let mid = Coord4::xy(pa.center.x + dir.x * a, pa.center.y + dir.y * a);
            let perp = Coord4::xy(-dir.y, dir.x);
            for pt in [
                Coord4::xy(mid.x + perp.x * h, mid.y + perp.y * h),
                Coord4::xy(mid.x - perp.x * h, mid.y - perp.y * h),
            ] {
                if point_on_arc(pt, a1, a2, a3) && point_on_arc(pt, b1, b2, b3) {
                    return ClosestPair {
                        distance: 0.0,
                        on_a: pt,
                        on_b: pt,
                    };
                }
            }
        }
    }

    sample_arc_pair_endpoints(a1, a2, a3, b1, b2, b3)
}

fn sample_arc_pair_endpoints(
    a1: Coord4,
    a2: Coord4,
    a3: Coord4,
    b1: Coord4,
    b2: Coord4,
    b3: Coord4,
) -> ClosestPair {
    let mut best: Option<ClosestPair> = None;
    let mut consider = |on_a: Coord4, on_b: Coord4| {
        let d = on_a.distance_2d(on_b);
        if best.map(|p| d < p.distance).unwrap_or(true) {
            best = Some(ClosestPair {
                distance: d,
                on_a,
                on_b,
            });
        }
    };
    for endpoint in [a1, a3] {
        consider(endpoint, closest_point_on_arc(endpoint, b1, b2, b3));
    }
    for endpoint in [b1, b3] {
        consider(closest_point_on_arc(endpoint, a1, a2, a3), endpoint);
    }
    best.unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_side_signs() {
        let p1 = Coord4::xy(0.0, 0.0);
        let p2 = Coord4::xy(1.0, 0.0);
        assert_eq!(segment_side(p1, p2, Coord4::xy(0.5, 1.0)), 1);
        assert_eq!(segment_side(p1, p2, Coord4::xy(0.5, -1.0)), -1);
        assert_eq!(segment_side(p1, p2, Coord4::xy(0.5, 0.0)), 0);
    }

    #[test]
    fn arc_center_of_unit_half_circle() {
        let p1 = Coord4::xy(0.0, 0.0);
        let p2 = Coord4::xy(1.0, 1.0);
        let p3 = Coord4::xy(2.0, 0.0);
        let params = arc_center(p1, p2, p3).unwrap();
        approx::assert_relative_eq!(params.center, Coord4::xy(1.0, 0.0), epsilon = 1e-9);
        assert!((params.radius - 1.0).abs() < 1e-9);
    }

    #[test]
    fn colinear_triple_has_no_arc_center() {
        let p1 = Coord4::xy(0.0, 0.0);
        let p2 = Coord4::xy(1.0, 0.0);
        let p3 = Coord4::xy(2.0, 0.0);
        assert!(arc_center(p1, p2, p3).is_none());
    }

    #[test]
    fn crossing_segments_are_classified() {
        let p1 = Coord4::xy(0.0, 0.0);
        let p2 = Coord4::xy(2.0, 2.0);
        let q1 = Coord4::xy(0.0, 2.0);
        let q2 = Coord4::xy(2.0, 0.0);
        let kind = segment_intersects(p1, p2, q1, q2);
        assert!(matches!(
            kind,
            IntersectionKind::CrossLeft | IntersectionKind::CrossRight
        ));
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        let p1 = Coord4::xy(0.0, 0.0);
        let p2 = Coord4::xy(1.0, 0.0);
        let q1 = Coord4::xy(0.0, 5.0);
        let q2 = Coord4::xy(1.0, 5.0);
        assert_eq!(
            segment_intersects(p1, p2, q1, q2),
            IntersectionKind::NoIntersection
        );
    }

    #[test]
    fn arc_to_segment_distance_matches_scenario_3() {
        // CIRCULARSTRING(0 0, 1 1, 2 0) to LINESTRING(3 0, 3 2).
        let a1 = Coord4::xy(0.0, 0.0);
        let a2 = Coord4::xy(1.0, 1.0);
        let a3 = Coord4::xy(2.0, 0.0);
        let p1 = Coord4::xy(3.0, 0.0);
        let p2 = Coord4::xy(3.0, 2.0);
        let result = segment_arc_distance(p1, p2, a1, a2, a3);
        assert!((result.distance - 1.0).abs() < 1e-9);
    }
}
