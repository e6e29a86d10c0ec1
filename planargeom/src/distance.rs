//! Distance engine (C7): recursive min/max 2D distance between any two
//! geometries, dispatching through collections down to the 5x5 primitive
//! matrix (Point, LineString, Polygon, CircularString, CurvePolygon) and
//! from there to the analytic kernels of [`crate::kernels`].
//!
//! Grounded on `original_source/measures.c`'s `rt_dist2d` entry point and
//! its `DISTPTS` accumulator (here, [`DistResult`]).
//!
//! ## The "fast path" (§4.4)
//!
//! MIN distance between two disjoint linear primitives (`LineString` or a
//! `Polygon`/`Triangle`'s outer ring -- `rt_dist2d_distribute_fast` never
//! looks at holes either) is accelerated by the sort-and-sweep of
//! `rt_dist2d_fast_ptarray_ptarray`/`rt_dist2d_pre_seg_seg` in
//! `original_source/measures.c`: project every vertex onto the perpendicular
//! of the vector joining the two bbox centers, sort each side by that
//! projection, then sweep inward from the extreme end of one side only
//! comparing against the window of the other side the running best distance
//! still allows (see [`fast_ptarray_ptarray`]). Collection recursion keeps
//! its own, coarser prune ([`best_beats_bbox`]) for skipping whole children
//! by bbox gap before ever reaching a primitive pair.

use planargeom_types::coord::Coord4;
use planargeom_types::error::{Error, Result};
use planargeom_types::gbox::GBox;
use planargeom_types::geometry::Geometry;
use planargeom_types::kind::GeomKind;
use planargeom_types::pointarray::{PointArray, PointPosition};

use num_traits::Float;

use crate::kernels::{self, ClosestPair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Min,
    Max,
}

/// One measurement result: a distance and the witnessing point on each
/// side, with `p1`/`p2` always bound to the first/second argument
/// respectively regardless of recursion order (the source's `twisted`
/// bookkeeping, done here simply by never swapping arguments instead of
/// threading a sign through the recursion; see `SPEC_FULL.md` §9).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistResult {
    pub distance: f64,
    pub p1: Coord4,
    pub p2: Coord4,
}

impl DistResult {
    fn from_pair(pair: ClosestPair) -> Self {
        DistResult {
            distance: pair.distance,
            p1: pair.on_a,
            p2: pair.on_b,
        }
    }

    fn swapped(self) -> Self {
        DistResult {
            distance: self.distance,
            p1: self.p2,
            p2: self.p1,
        }
    }
}

fn better(mode: Mode, a: DistResult, b: DistResult) -> DistResult {
    match mode {
        Mode::Min => {
            if b.distance < a.distance {
                b
            } else {
                a
            }
        }
        Mode::Max => {
            if b.distance > a.distance {
                b
            } else {
                a
            }
        }
    }
}

fn extend(mode: Mode, best: Option<DistResult>, candidate: DistResult) -> DistResult {
    match best {
        Some(b) => better(mode, b, candidate),
        None => candidate,
    }
}

/// Minimum 2D distance between `a` and `b` (§4.4 public entry `mindistance2d`).
pub fn mindistance_2d(a: &Geometry, b: &Geometry) -> Result<f64> {
    Ok(dist2d(a, b, Mode::Min, None)?.distance)
}

/// Maximum 2D distance ("furthest distance") between `a` and `b`.
pub fn maxdistance_2d(a: &Geometry, b: &Geometry) -> Result<f64> {
    Ok(dist2d(a, b, Mode::Max, None)?.distance)
}

/// `true` iff `mindistance(a, b) <= tolerance` (§8.3 property 4), computed
/// as a short-circuiting predicate: the search returns as soon as a pair
/// within tolerance is found rather than continuing to the true minimum.
pub fn dwithin_2d(a: &Geometry, b: &Geometry, tolerance: f64) -> Result<bool> {
    Ok(dist2d(a, b, Mode::Min, Some(tolerance))?.distance <= tolerance)
}

/// The closest point on `b` to the closest approach with `a`, as a `Point`
/// geometry sharing `a`'s SRID/flags.
pub fn closest_point(a: &Geometry, b: &Geometry) -> Result<Geometry> {
    let r = dist2d(a, b, Mode::Min, None)?;
    Ok(Geometry::Point {
        header: planargeom_types::geometry::Header::new(a.flags(), a.srid()),
        points: PointArray::from_coords(a.flags(), &[r.p1]),
    })
}

/// The two-point `LineString` connecting the closest approach between `a`
/// and `b`.
pub fn closest_line(a: &Geometry, b: &Geometry) -> Result<Geometry> {
    let r = dist2d(a, b, Mode::Min, None)?;
    Ok(Geometry::LineString {
        header: planargeom_types::geometry::Header::new(a.flags(), a.srid()),
        points: PointArray::from_coords(a.flags(), &[r.p1, r.p2]),
    })
}

fn is_collection_like(g: &Geometry) -> bool {
    g.kind().is_collection()
}

/// Recursive dispatch (§4.4 step 1-2): expands collections (including the
/// curve-composite kinds, which are collections of their own components)
/// before falling to the primitive 5x5 matrix.
fn dist2d(a: &Geometry, b: &Geometry, mode: Mode, tolerance: Option<f64>) -> Result<DistResult> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::invalid("distance is undefined for an empty geometry"));
    }
    dist2d_inner(a, b, mode, tolerance)?.ok_or_else(|| Error::invalid("no measurable geometry pair found"))
}

fn dist2d_inner(a: &Geometry, b: &Geometry, mode: Mode, tolerance: Option<f64>) -> Result<Option<DistResult>> {
    if is_collection_like(a) {
        let other_bbox = bbox_of(b);
        let mut best: Option<DistResult> = None;
        for child in a.children() {
            if child.is_empty() {
                continue;
            }
            if mode == Mode::Min && best_beats_bbox(best.as_ref(), &bbox_of(child), &other_bbox) {
                continue;
            }
            if let Some(r) = dist2d_inner(child, b, mode, tolerance)? {
                best = Some(extend(mode, best, r));
                if let Some(t) = tolerance {
                    if mode == Mode::Min && r.distance <= t {
                        return Ok(Some(r));
                    }
                }
            }
        }
        return Ok(best);
    }
    if is_collection_like(b) {
        let other_bbox = bbox_of(a);
        let mut best: Option<DistResult> = None;
        for child in b.children() {
            if child.is_empty() {
                continue;
            }
            if mode == Mode::Min && best_beats_bbox(best.as_ref(), &other_bbox, &bbox_of(child)) {
                continue;
            }
            if let Some(r) = dist2d_inner(a, child, mode, tolerance)? {
                best = Some(extend(mode, best, r));
                if let Some(t) = tolerance {
                    if mode == Mode::Min && r.distance <= t {
                        return Ok(Some(r));
                    }
                }
            }
        }
        return Ok(best);
    }
    Ok(Some(primitive_distance(a, b, mode)?))
}

/// `true` when `best` already beats the best *possible* MIN distance
/// between two bboxes (the straight-line gap between the rectangles,
/// zero if they overlap), so the pair they bound can be skipped outright.
/// This is the bbox short-circuit the module doc describes: it only ever
/// skips children that provably cannot improve on the running best, so it
/// agrees with the unpruned brute force by construction (§8.3 property 5).
fn best_beats_bbox(best: Option<&DistResult>, bbox_a: &GBox, bbox_b: &GBox) -> bool {
    match best {
        Some(r) => r.distance <= bbox_gap_2d(bbox_a, bbox_b),
        None => false,
    }
}

fn bbox_gap_2d(a: &GBox, b: &GBox) -> f64 {
    let dx = (a.xmin - b.xmax).max(b.xmin - a.xmax).max(0.0);
    let dy = (a.ymin - b.ymax).max(b.ymin - a.ymax).max(0.0);
    (dx * dx + dy * dy).sqrt()
}

// ---- primitive extraction --------------------------------------------

fn primitive_segments(g: &Geometry) -> Vec<(Coord4, Coord4)> {
    let mut out = Vec::new();
    let mut push_ring = |pa: &PointArray| {
        for i in 0..pa.npoints().saturating_sub(1) {
            out.push((pa.get_point(i), pa.get_point(i + 1)));
        }
    };
    match g {
        Geometry::LineString { points, .. } | Geometry::Triangle { points, .. } => push_ring(points),
        Geometry::Polygon { rings, .. } => {
            for ring in rings {
                push_ring(ring);
            }
        }
        _ => {}
    }
    out
}

fn primitive_arcs(g: &Geometry) -> Vec<(Coord4, Coord4, Coord4)> {
    match g {
        Geometry::CircularString { points, .. } => {
            let mut out = Vec::new();
            let mut i = 0;
            while i + 2 < points.npoints() {
                out.push((points.get_point(i), points.get_point(i + 1), points.get_point(i + 2)));
                i += 2;
            }
            out
        }
        _ => Vec::new(),
    }
}

fn primitive_rings(g: &Geometry) -> Option<Vec<&PointArray>> {
    match g {
        Geometry::Polygon { rings, .. } => Some(rings.iter().collect()),
        Geometry::Triangle { points, .. } => Some(vec![points]),
        _ => None,
    }
}

fn as_point(g: &Geometry) -> Option<Coord4> {
    match g {
        Geometry::Point { points, .. } => points.startpoint(),
        _ => None,
    }
}

fn bbox_of(g: &Geometry) -> GBox {
    g.points()
        .map(PointArray::bbox)
        .or_else(|| primitive_rings(g).and_then(|rings| {
            let mut b = GBox::empty(g.flags());
            for ring in rings {
                b.merge(&ring.bbox());
            }
            Some(b)
        }))
        .unwrap_or_else(|| GBox::empty(g.flags()))
}

/// Point-in-ring-set containment used by the MIN-only short circuit (§4.4):
/// inside the outer ring and outside every hole.
fn point_in_rings(rings: &[&PointArray], p: Coord4) -> PointPosition {
    let Some(outer) = rings.first() else {
        return PointPosition::Outside;
    };
    match outer.contains_point(p) {
        PointPosition::Outside => return PointPosition::Outside,
        PointPosition::Boundary => return PointPosition::Boundary,
        PointPosition::Inside => {}
    }
    for hole in &rings[1..] {
        if hole.contains_point(p) == PointPosition::Inside {
            return PointPosition::Outside;
        }
    }
    PointPosition::Inside
}

fn farthest_point_on_segment(p1: Coord4, p2: Coord4, q: Coord4) -> (Coord4, f64) {
    let d1 = p1.distance_2d(q);
    let d2 = p2.distance_2d(q);
    if d1 >= d2 {
        (p1, d1)
    } else {
        (p2, d2)
    }
}

fn farthest_point_on_arc(q: Coord4, a1: Coord4, a2: Coord4, a3: Coord4) -> Coord4 {
    let Some(params) = kernels::arc_center(a1, a2, a3) else {
        let (p, _) = farthest_point_on_segment(a1, a3, q);
        return p;
    };
    let dir = Coord4::xy(params.center.x - q.x, params.center.y - q.y);
    let len = (dir.x * dir.x + dir.y * dir.y).sqrt();
    if len < 1e-12 {
        return a1;
    }
    let candidate = Coord4::xy(
        params.center.x + dir.x / len * params.radius,
        params.center.y + dir.y / len * params.radius,
    );
    if kernels::point_on_arc(candidate, a1, a2, a3) {
        candidate
    } else if q.distance_2d(a1) >= q.distance_2d(a3) {
        a1
    } else {
        a3
    }
}

fn point_vs_primitive(p: Coord4, g: &Geometry, mode: Mode) -> DistResult {
    if mode == Mode::Min {
        if let Some(rings) = primitive_rings(g) {
            if point_in_rings(&rings, p) != PointPosition::Outside {
                return DistResult {
                    distance: 0.0,
                    p1: p,
                    p2: p,
                };
            }
        }
    }

    let segs = primitive_segments(g);
    let arcs = primitive_arcs(g);
    let mut best: Option<DistResult> = None;
    let mut consider = |pt: Coord4, d: f64| {
        let candidate = DistResult {
            distance: d,
            p1: p,
            p2: pt,
        };
        best = Some(match best {
            Some(b) => better(mode, b, candidate),
            None => candidate,
        });
    };
    match mode {
        Mode::Min => {
            for (s1, s2) in &segs {
                let (on, d) = kernels::closest_point_on_segment(*s1, *s2, p);
                consider(on, d);
            }
            for (a1, a2, a3) in &arcs {
                let on = kernels::closest_point_on_arc(p, *a1, *a2, *a3);
                consider(on, on.distance_2d(p));
            }
        }
        Mode::Max => {
            for (s1, s2) in &segs {
                let (on, d) = farthest_point_on_segment(*s1, *s2, p);
                consider(on, d);
            }
            for (a1, a2, a3) in &arcs {
                let on = farthest_point_on_arc(p, *a1, *a2, *a3);
                consider(on, on.distance_2d(p));
            }
        }
    }
    best.unwrap_or(DistResult {
        distance: 0.0,
        p1: p,
        p2: p,
    })
}

/// Polygon-vs-polygon ordering from §4.4: MAX only compares outer rings;
/// MIN checks containment of either first vertex before falling back to
/// outer-ring-to-outer-ring distance.
fn polygon_vs_polygon(a: &Geometry, b: &Geometry, mode: Mode) -> DistResult {
    let rings_a = primitive_rings(a).unwrap();
    let rings_b = primitive_rings(b).unwrap();
    let outer_a = *rings_a.first().unwrap();
    let outer_b = *rings_b.first().unwrap();

    if mode == Mode::Max {
        return ring_vs_ring(outer_a, outer_b, mode);
    }

    if let Some(p) = outer_b.startpoint() {
        if point_in_rings(&rings_a, p) != PointPosition::Outside {
            for hole in &rings_a[1..] {
                if hole.contains_point(p) == PointPosition::Inside {
                    return ring_vs_ring(outer_a, hole, mode);
                }
            }
            return DistResult {
                distance: 0.0,
                p1: p,
                p2: p,
            };
        }
    }
    if let Some(p) = outer_a.startpoint() {
        if point_in_rings(&rings_b, p) != PointPosition::Outside {
            for hole in &rings_b[1..] {
                if hole.contains_point(p) == PointPosition::Inside {
                    return ring_vs_ring(hole, outer_b, mode).swapped();
                }
            }
            return DistResult {
                distance: 0.0,
                p1: p,
                p2: p,
            };
        }
    }
    ring_vs_ring(outer_a, outer_b, mode)
}

fn ring_vs_ring(a: &PointArray, b: &PointArray, mode: Mode) -> DistResult {
    let mut best: Option<DistResult> = None;
    for i in 0..a.npoints().saturating_sub(1) {
        for j in 0..b.npoints().saturating_sub(1) {
            let pair = match mode {
                Mode::Min => kernels::segment_segment_distance(
                    a.get_point(i),
                    a.get_point(i + 1),
                    b.get_point(j),
                    b.get_point(j + 1),
                ),
                Mode::Max => farthest_segment_pair(
                    a.get_point(i),
                    a.get_point(i + 1),
                    b.get_point(j),
                    b.get_point(j + 1),
                ),
            };
            let candidate = DistResult::from_pair(pair);
            best = Some(match best {
                Some(x) => better(mode, x, candidate),
                None => candidate,
            });
        }
    }
    best.unwrap()
}

fn farthest_segment_pair(p1: Coord4, p2: Coord4, q1: Coord4, q2: Coord4) -> ClosestPair {
    [p1, p2]
        .into_iter()
        .flat_map(|p| [q1, q2].into_iter().map(move |q| (p, q)))
        .map(|(p, q)| ClosestPair {
            distance: p.distance_2d(q),
            on_a: p,
            on_b: q,
        })
        .max_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap())
        .unwrap()
}

/// The point array a linear primitive presents to the fast path:
/// `rt_dist2d_distribute_fast` takes a `LINETYPE`'s own points or a
/// `POLYGONTYPE`'s `rings[0]` -- never a hole, and never an arc.
fn fast_path_ptarray(g: &Geometry) -> Option<&PointArray> {
    match g {
        Geometry::LineString { points, .. } | Geometry::Triangle { points, .. } => Some(points),
        Geometry::Polygon { rings, .. } => rings.first(),
        _ => None,
    }
}

/// Index of `pa[i]`'s neighbor in direction `r` (`-1` or `1`), with the
/// closed-ring wraparound `rt_dist2d_pre_seg_seg` uses: stepping off either
/// end of a *closed* array (first point bit-equal to last) continues from
/// the other end, skipping the duplicated closing vertex; stepping off the
/// end of an *open* array clamps to `i` itself, so the caller sees a
/// degenerate segment and skips it rather than inventing a phantom closing
/// edge.
fn fast_path_neighbor(pa: &PointArray, i: usize, r: i64) -> usize {
    let n = pa.npoints();
    let closed = n > 1
        && pa
            .startpoint()
            .zip(pa.endpoint())
            .is_some_and(|(s, e)| s.exact_eq_2d(e));
    let stepped = i as i64 + r;
    if stepped < 0 {
        if closed {
            n - 2
        } else {
            i
        }
    } else if stepped as usize >= n {
        if closed {
            1
        } else {
            i
        }
    } else {
        stepped as usize
    }
}

/// One measure's worth of sweep window (`maxmeasure` in the source): the
/// z-projected coordinate gap a true 2D distance of `dist` could possibly
/// span, given the projection's own slope `k`. Generic over [`Float`] the
/// same way `geo`'s own `polygon_distance_fast_path` keeps its fast-path
/// arithmetic trait-bound rather than hard-coded to `f64`.
fn fast_path_window<T: Float>(dist: T, k: T) -> T {
    (dist * dist + dist * dist * k * k).sqrt()
}

/// `rt_dist2d_pre_seg_seg`: sweep `list1` from its highest-measure end,
/// comparing each vertex's neighbor segments against the window of `list2`
/// the running best distance still allows. `list1`/`list2` are each sorted
/// ascending by projected measure, paired with their index into `pa1`/`pa2`.
fn fast_path_sweep(
    pa1: &PointArray,
    list1: &[(f64, usize)],
    pa2: &PointArray,
    list2: &[(f64, usize)],
    k: f64,
) -> DistResult {
    let p1 = pa1.get_point(list1[0].1);
    let p3 = pa2.get_point(list2[0].1);
    let mut best = DistResult {
        distance: p1.distance_2d(p3),
        p1,
        p2: p3,
    };
    let mut maxmeasure = fast_path_window(best.distance, k);

    let mut i = list1.len() as i64 - 1;
    while i >= 0 {
        let (measure1, pnr1) = list1[i as usize];
        if list2[0].0 - measure1 > maxmeasure {
            break;
        }
        for r1 in [-1i64, 1i64] {
            let pnr2 = fast_path_neighbor(pa1, pnr1, r1);
            if pnr2 == pnr1 {
                continue;
            }
            let (a1, a2) = (pa1.get_point(pnr1), pa1.get_point(pnr2));
            for &(measure2, pnr3) in list2 {
                if measure2 - measure1 >= maxmeasure {
                    break;
                }
                for r2 in [-1i64, 1i64] {
                    let pnr4 = fast_path_neighbor(pa2, pnr3, r2);
                    if pnr4 == pnr3 {
                        continue;
                    }
                    let (b1, b2) = (pa2.get_point(pnr3), pa2.get_point(pnr4));
                    let pair = kernels::segment_segment_distance(a1, a2, b1, b2);
                    if pair.distance < best.distance {
                        best = DistResult::from_pair(pair);
                        maxmeasure = fast_path_window(best.distance, k);
                    }
                }
            }
        }
        i -= 1;
    }
    best
}

/// `rt_dist2d_fast_ptarray_ptarray`: builds the two projected, sorted vertex
/// lists and picks which side sweeps, then hands off to
/// [`fast_path_sweep`]. Returns `None` for a degenerate (empty) array.
fn fast_ptarray_ptarray(pa1: &PointArray, pa2: &PointArray, box1: &GBox, box2: &GBox) -> Option<DistResult> {
    if pa1.npoints() == 0 || pa2.npoints() == 0 {
        return None;
    }
    let c1 = Coord4::xy((box1.xmin + box1.xmax) / 2.0, (box1.ymin + box1.ymax) / 2.0);
    let c2 = Coord4::xy((box2.xmin + box2.xmax) / 2.0, (box2.ymin + box2.ymax) / 2.0);
    let delta_x = c2.x - c1.x;
    let delta_y = c2.y - c1.y;

    let (k, measure): (f64, fn(f64, f64, f64) -> f64) = if delta_x * delta_x < delta_y * delta_y {
        let k = if delta_y == 0.0 { 0.0 } else { -delta_x / delta_y };
        (k, |x: f64, y: f64, k: f64| y - k * x)
    } else {
        let k = if delta_x == 0.0 { 0.0 } else { -delta_y / delta_x };
        (k, |x: f64, y: f64, k: f64| x - k * y)
    };

    let mut list1: Vec<(f64, usize)> = (0..pa1.npoints())
        .map(|i| {
            let p = pa1.get_point(i);
            (measure(p.x, p.y, k), i)
        })
        .collect();
    let mut list2: Vec<(f64, usize)> = (0..pa2.npoints())
        .map(|i| {
            let p = pa2.get_point(i);
            (measure(p.x, p.y, k), i)
        })
        .collect();
    list1.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
    list2.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

    let c1m = measure(c1.x, c1.y, k);
    let c2m = measure(c2.x, c2.y, k);

    Some(if c1m < c2m {
        fast_path_sweep(pa1, &list1, pa2, &list2, k)
    } else {
        fast_path_sweep(pa2, &list2, pa1, &list1, k).swapped()
    })
}

/// Generic brute-force primitive-pair distance: every segment/segment,
/// segment/arc, and arc/arc pair between `a` and `b` (§4.4 brute force).
fn generic_primitive_distance(a: &Geometry, b: &Geometry, mode: Mode) -> DistResult {
    let segs_a = primitive_segments(a);
    let arcs_a = primitive_arcs(a);
    let segs_b = primitive_segments(b);
    let arcs_b = primitive_arcs(b);

    let mut best: Option<DistResult> = None;
    let mut consider = |pair: ClosestPair| {
        let candidate = DistResult::from_pair(pair);
        best = Some(match best {
            Some(x) => better(mode, x, candidate),
            None => candidate,
        });
    };

    match mode {
        Mode::Min => {
            for &(a1, a2) in &segs_a {
                for &(b1, b2) in &segs_b {
                    consider(kernels::segment_segment_distance(a1, a2, b1, b2));
                }
                for &(c1, c2, c3) in &arcs_b {
                    consider(kernels::segment_arc_distance(a1, a2, c1, c2, c3));
                }
            }
            for &(a1, a2, a3) in &arcs_a {
                for &(b1, b2) in &segs_b {
                    let pair = kernels::segment_arc_distance(b1, b2, a1, a2, a3);
                    consider(pair.swap());
                }
                for &(b1, b2, b3) in &arcs_b {
                    consider(kernels::arc_arc_distance(a1, a2, a3, b1, b2, b3));
                }
            }
        }
        Mode::Max => {
            for &(a1, a2) in &segs_a {
                for &(b1, b2) in &segs_b {
                    consider(farthest_segment_pair(a1, a2, b1, b2));
                }
            }
            for &(a1, a2, a3) in &arcs_a {
                for &(b1, b2) in &segs_b {
                    consider(farthest_segment_pair(a1, a3, b1, b2));
                }
                for &(b1, b2, b3) in &arcs_b {
                    consider(farthest_segment_pair(a1, a3, b1, b3));
                }
            }
        }
    }
    best.unwrap_or(DistResult {
        distance: 0.0,
        p1: Coord4::default(),
        p2: Coord4::default(),
    })
}

impl ClosestPair {
    fn swap(self) -> ClosestPair {
        ClosestPair {
            distance: self.distance,
            on_a: self.on_b,
            on_b: self.on_a,
        }
    }
}

/// Leaf-level dispatch (§4.4 step 2-3): the 5x5 primitive matrix, plus the
/// bbox-overlap consultation that lets MIN distance short-circuit on
/// disjoint linear pairs.
fn primitive_distance(a: &Geometry, b: &Geometry, mode: Mode) -> Result<DistResult> {
    if let Some(p) = as_point(a) {
        if let Some(q) = as_point(b) {
            return Ok(DistResult {
                distance: p.distance_2d(q),
                p1: p,
                p2: q,
            });
        }
        return Ok(point_vs_primitive(p, b, mode));
    }
    if let Some(q) = as_point(b) {
        return Ok(point_vs_primitive(q, a, mode).swapped());
    }

    if matches!(a.kind(), GeomKind::Polygon | GeomKind::Triangle)
        && matches!(b.kind(), GeomKind::Polygon | GeomKind::Triangle)
    {
        return Ok(polygon_vs_polygon(a, b, mode));
    }

    if mode == Mode::Min {
        if let (Some(pa1), Some(pa2)) = (fast_path_ptarray(a), fast_path_ptarray(b)) {
            let (box1, box2) = (bbox_of(a), bbox_of(b));
            if !box1.overlaps_2d(&box2) {
                if let Some(r) = fast_ptarray_ptarray(pa1, pa2, &box1, &box2) {
                    return Ok(r);
                }
            }
        }
    }

    Ok(generic_primitive_distance(a, b, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use planargeom_types::flags::Flags;
    use planargeom_types::geometry::{Header, SRID_UNKNOWN};

    fn point(x: f64, y: f64) -> Geometry {
        Geometry::Point {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points: PointArray::from_coords(Flags::XY, &[Coord4::xy(x, y)]),
        }
    }

    fn line(coords: &[(f64, f64)]) -> Geometry {
        Geometry::LineString {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points: PointArray::from_coords(
                Flags::XY,
                &coords.iter().map(|&(x, y)| Coord4::xy(x, y)).collect::<Vec<_>>(),
            ),
        }
    }

    fn polygon_with_hole() -> Geometry {
        let outer = PointArray::from_coords(
            Flags::XY,
            &[
                Coord4::xy(0.0, 0.0),
                Coord4::xy(10.0, 0.0),
                Coord4::xy(10.0, 10.0),
                Coord4::xy(0.0, 10.0),
                Coord4::xy(0.0, 0.0),
            ],
        );
        let hole = PointArray::from_coords(
            Flags::XY,
            &[
                Coord4::xy(3.0, 3.0),
                Coord4::xy(7.0, 3.0),
                Coord4::xy(7.0, 7.0),
                Coord4::xy(3.0, 7.0),
                Coord4::xy(3.0, 3.0),
            ],
        );
        Geometry::Polygon {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            rings: vec![outer, hole],
        }
    }

    #[test]
    fn point_inside_polygon_has_zero_distance() {
        let poly = polygon_with_hole();
        let p = point(1.0, 1.0);
        assert_eq!(mindistance_2d(&p, &poly).unwrap(), 0.0);
    }

    #[test]
    fn point_in_hole_is_outside_the_polygon() {
        let poly = polygon_with_hole();
        let p = point(5.0, 5.0);
        assert!(mindistance_2d(&p, &poly).unwrap() > 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = line(&[(0.0, 0.0), (1.0, 1.0)]);
        let b = line(&[(5.0, 5.0), (6.0, 6.0)]);
        assert_eq!(mindistance_2d(&a, &b).unwrap(), mindistance_2d(&b, &a).unwrap());
    }

    #[test]
    fn dwithin_matches_mindistance() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(0.0, 2.0), (1.0, 2.0)]);
        let d = mindistance_2d(&a, &b).unwrap();
        assert!(dwithin_2d(&a, &b, d + 0.001).unwrap());
        assert!(!dwithin_2d(&a, &b, d - 0.001).unwrap());
    }

    #[test]
    fn disjoint_segments_min_distance() {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(0.0, 5.0), (1.0, 5.0)]);
        assert!((mindistance_2d(&a, &b).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn fast_path_agrees_with_brute_force_on_disjoint_linestrings() {
        let a = line(&[(0.0, 0.0), (3.0, 1.0), (6.0, 0.0), (9.0, 2.0)]);
        let b = line(&[(1.0, 10.0), (4.0, 8.0), (7.0, 11.0), (10.0, 9.0)]);
        let fast = primitive_distance(&a, &b, Mode::Min).unwrap();
        let brute = generic_primitive_distance(&a, &b, Mode::Min);
        assert!((fast.distance - brute.distance).abs() < 1e-9);
    }

    #[test]
    fn fast_path_handles_closed_ring_wraparound() {
        let ring = Geometry::Polygon {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            rings: vec![PointArray::from_coords(
                Flags::XY,
                &[
                    Coord4::xy(0.0, 0.0),
                    Coord4::xy(4.0, 0.0),
                    Coord4::xy(4.0, 4.0),
                    Coord4::xy(0.0, 4.0),
                    Coord4::xy(0.0, 0.0),
                ],
            )],
        };
        let far_line = line(&[(10.0, -1.0), (10.0, 5.0)]);
        let fast = primitive_distance(&far_line, &ring, Mode::Min).unwrap();
        let brute = generic_primitive_distance(&far_line, &ring, Mode::Min);
        assert!((fast.distance - brute.distance).abs() < 1e-9);
        assert!((fast.distance - 6.0).abs() < 1e-9);
    }

    #[test]
    fn fast_path_matches_brute_force_when_sweep_side_is_swapped() {
        // b's bbox center projects lower than a's, exercising the c1m > c2m swap.
        let a = line(&[(20.0, 0.0), (23.0, 3.0), (26.0, -1.0)]);
        let b = line(&[(0.0, 0.0), (2.0, 1.0), (4.0, -1.0)]);
        let fast = primitive_distance(&a, &b, Mode::Min).unwrap();
        let brute = generic_primitive_distance(&a, &b, Mode::Min);
        assert!((fast.distance - brute.distance).abs() < 1e-9);
    }
}
