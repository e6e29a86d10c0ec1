//! `PointArray` (C3): the single packed-coordinate-sequence primitive every
//! geometry variant is built from, plus its mutation, measurement, and
//! simplification algorithms.
//!
//! Ownership follows the design note in `SPEC_FULL.md` §A: rather than a
//! raw pointer plus a `readonly` flag (the C source's aliasing discipline),
//! the backing buffer is an `Arc<Vec<f64>>`. A shallow clone is a cheap
//! `Arc::clone`; any mutating method reaches the buffer through
//! `Arc::make_mut`, which clones lazily only if the array is still shared.
//! This gives the same semantics the spec asks for -- shallow clones never
//! observe a mutation made through another handle -- without hand-rolled
//! aliasing bookkeeping.

use std::sync::Arc;

use crate::coord::{Coord4, Ordinate};
use crate::error::{Error, Result};
use crate::flags::Flags;
use crate::gbox::{Box2D, GBox};

/// The result of a containment test against a ring (§4.1 Containment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointPosition {
    Inside,
    Outside,
    Boundary,
}

/// An axis-aligned grid spec for `snap_to_grid` (C14): a zero size on an
/// axis disables snapping on that axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub ipx: f64,
    pub ipy: f64,
    pub ipz: f64,
    pub ipm: f64,
    pub xsize: f64,
    pub ysize: f64,
    pub zsize: f64,
    pub msize: f64,
}

impl GridSpec {
    pub fn uniform(cell_size: f64) -> Self {
        GridSpec {
            ipx: 0.0,
            ipy: 0.0,
            ipz: 0.0,
            ipm: 0.0,
            xsize: cell_size,
            ysize: cell_size,
            zsize: cell_size,
            msize: cell_size,
        }
    }

    fn snap_axis(origin: f64, size: f64, value: f64) -> f64 {
        if size <= 0.0 {
            value
        } else {
            origin + ((value - origin) / size).round() * size
        }
    }
}

/// A 3x3 (2D) or 4x4 (3D) affine transform applied in place by
/// `PointArray::affine`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineMatrix {
    pub m: [[f64; 4]; 4],
}

impl AffineMatrix {
    pub fn identity() -> Self {
        let mut m = [[0.0; 4]; 4];
        for i in 0..4 {
            m[i][i] = 1.0;
        }
        AffineMatrix { m }
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut a = AffineMatrix::identity();
        a.m[0][3] = dx;
        a.m[1][3] = dy;
        a.m[2][3] = dz;
        a
    }

    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut a = AffineMatrix::identity();
        a.m[0][0] = sx;
        a.m[1][1] = sy;
        a.m[2][2] = sz;
        a
    }

    fn apply(&self, c: Coord4) -> (f64, f64, f64) {
        let m = &self.m;
        let x = m[0][0] * c.x + m[0][1] * c.y + m[0][2] * c.z + m[0][3];
        let y = m[1][0] * c.x + m[1][1] * c.y + m[1][2] * c.z + m[1][3];
        let z = m[2][0] * c.x + m[2][1] * c.y + m[2][2] * c.z + m[2][3];
        (x, y, z)
    }
}

/// The packed coordinate-sequence primitive (§3.2).
#[derive(Debug, Clone, PartialEq)]
pub struct PointArray {
    flags: Flags,
    npoints: usize,
    buf: Arc<Vec<f64>>,
}

impl PointArray {
    /// Creates an empty array with the given dimensionality and a capacity
    /// hint (honored via `Vec::with_capacity`; growth beyond it is
    /// automatic, same observable behaviour as the source's doubling
    /// `maxpoints`).
    pub fn empty(flags: Flags, capacity_hint: usize) -> Self {
        PointArray {
            flags,
            npoints: 0,
            buf: Arc::new(Vec::with_capacity(capacity_hint * flags.stride())),
        }
    }

    /// Builds an array by copying `points`, projected to `flags`'
    /// dimensionality.
    pub fn from_coords(flags: Flags, points: &[Coord4]) -> Self {
        let stride = flags.stride();
        let mut buf = Vec::with_capacity(points.len() * stride);
        for p in points {
            push_coord(&mut buf, flags, *p);
        }
        PointArray {
            flags,
            npoints: points.len(),
            buf: Arc::new(buf),
        }
    }

    /// Builds an array from an already-packed raw buffer (e.g. a
    /// bulk-copied WKB payload). Fails if `raw.len()` isn't a multiple of
    /// `flags.stride()`.
    pub fn from_raw(flags: Flags, raw: Vec<f64>) -> Result<Self> {
        let stride = flags.stride();
        if raw.len() % stride != 0 {
            return Err(Error::invalid(format!(
                "raw coordinate buffer length {} is not a multiple of stride {}",
                raw.len(),
                stride
            )));
        }
        Ok(PointArray {
            flags,
            npoints: raw.len() / stride,
            buf: Arc::new(raw),
        })
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn npoints(&self) -> usize {
        self.npoints
    }

    pub fn is_empty(&self) -> bool {
        self.npoints == 0
    }

    pub fn stride(&self) -> usize {
        self.flags.stride()
    }

    /// Raw packed buffer, `x, y, [z], [m]` per point -- used by the WKB
    /// bulk-copy fast path (§4.7).
    pub fn raw(&self) -> &[f64] {
        &self.buf
    }

    /// Shares the backing buffer (the "shallow clone" of §3.3): cheap, and
    /// marks the result read-only to document the aliasing, though
    /// `Arc::make_mut` makes the discipline safe regardless.
    pub fn clone_shallow(&self) -> Self {
        PointArray {
            flags: self.flags.with_readonly(true),
            npoints: self.npoints,
            buf: Arc::clone(&self.buf),
        }
    }

    /// Duplicates the backing buffer unconditionally.
    pub fn clone_deep(&self) -> Self {
        PointArray {
            flags: self.flags.with_readonly(false),
            npoints: self.npoints,
            buf: Arc::new((*self.buf).clone()),
        }
    }

    fn point_offset(&self, idx: usize) -> usize {
        idx * self.stride()
    }

    pub fn get_point(&self, idx: usize) -> Coord4 {
        assert!(idx < self.npoints, "point index out of range");
        read_coord(&self.buf, self.flags, self.point_offset(idx))
    }

    pub fn startpoint(&self) -> Option<Coord4> {
        (!self.is_empty()).then(|| self.get_point(0))
    }

    pub fn endpoint(&self) -> Option<Coord4> {
        (!self.is_empty()).then(|| self.get_point(self.npoints - 1))
    }

    pub fn iter(&self) -> impl Iterator<Item = Coord4> + '_ {
        (0..self.npoints).map(move |i| self.get_point(i))
    }

    fn buf_mut(&mut self) -> &mut Vec<f64> {
        Arc::make_mut(&mut self.buf)
    }

    pub fn set_point(&mut self, idx: usize, p: Coord4) {
        assert!(idx < self.npoints, "point index out of range");
        let flags = self.flags;
        let offset = self.point_offset(idx);
        write_coord(self.buf_mut(), flags, offset, p);
    }

    /// Inserts `p` at `idx`, shifting the tail. `Vec::insert` already grows
    /// (doubling) when capacity is exceeded.
    pub fn insert_point(&mut self, idx: usize, p: Coord4) {
        assert!(idx <= self.npoints, "insert index out of range");
        let flags = self.flags;
        let stride = flags.stride();
        let offset = idx * stride;
        let mut tmp = Vec::with_capacity(stride);
        push_coord(&mut tmp, flags, p);
        let buf = self.buf_mut();
        for (k, v) in tmp.into_iter().enumerate() {
            buf.insert(offset + k, v);
        }
        self.npoints += 1;
    }

    /// Appends `p`. When `allow_dup` is false, a point bit-identical to the
    /// current last point (under this array's dimensionality) is silently
    /// dropped.
    pub fn append_point(&mut self, p: Coord4, allow_dup: bool) {
        if !allow_dup {
            if let Some(last) = self.endpoint() {
                let eq = if self.flags.has_z {
                    last.exact_eq_3d(p)
                } else {
                    last.exact_eq_2d(p)
                };
                if eq {
                    return;
                }
            }
        }
        let flags = self.flags;
        push_coord(self.buf_mut(), flags, p);
        self.npoints += 1;
    }

    pub fn remove_point(&mut self, idx: usize) {
        assert!(idx < self.npoints, "point index out of range");
        let stride = self.stride();
        let offset = idx * stride;
        let buf = self.buf_mut();
        buf.drain(offset..offset + stride);
        self.npoints -= 1;
    }

    pub fn reverse(&mut self) {
        let stride = self.stride();
        let n = self.npoints;
        let buf = self.buf_mut();
        for i in 0..n / 2 {
            let (lo, hi) = (i * stride, (n - 1 - i) * stride);
            for k in 0..stride {
                buf.swap(lo + k, hi + k);
            }
        }
    }

    pub fn swap_ordinates(&mut self, a: Ordinate, b: Ordinate) {
        let n = self.npoints;
        for i in 0..n {
            let mut c = self.get_point(i);
            let av = c.get(a);
            let bv = c.get(b);
            c.set(a, bv);
            c.set(b, av);
            self.set_point(i, c);
        }
    }

    /// Maps every `x` into `[-180, 180]` by adding or subtracting 360 as
    /// needed.
    pub fn longitude_shift(&mut self) {
        let n = self.npoints;
        for i in 0..n {
            let mut c = self.get_point(i);
            while c.x < -180.0 {
                c.x += 360.0;
            }
            while c.x > 180.0 {
                c.x -= 360.0;
            }
            self.set_point(i, c);
        }
    }

    /// Appends every point of `other` to `self`. If the join point of the
    /// two arrays coincides exactly in 2D, the duplicate leading point of
    /// `other` is dropped. If the gap is nonzero and `gap_tolerance > 0.0`,
    /// the append fails when the gap exceeds it (§4.1 "Append-array").
    pub fn append_array(&mut self, other: &PointArray, gap_tolerance: Option<f64>) -> Result<()> {
        if !self.flags.dimensionality_compatible(other.flags) {
            return Err(Error::invariant(
                "cannot append point arrays of differing dimensionality",
            ));
        }
        if other.is_empty() {
            return Ok(());
        }
        let mut skip_first = false;
        if let (Some(last), Some(first)) = (self.endpoint(), other.startpoint()) {
            if last.exact_eq_2d(first) {
                skip_first = true;
            } else if let Some(tol) = gap_tolerance {
                if tol > 0.0 && last.distance_2d(first) > tol {
                    return Err(Error::invalid(format!(
                        "gap between arrays ({}) exceeds tolerance ({})",
                        last.distance_2d(first),
                        tol
                    )));
                }
            }
        }
        let start = if skip_first { 1 } else { 0 };
        for i in start..other.npoints() {
            self.append_point(other.get_point(i), true);
        }
        Ok(())
    }

    // ---- queries ----------------------------------------------------

    pub fn length_2d(&self) -> f64 {
        if self.npoints < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 1..self.npoints {
            total += self.get_point(i - 1).distance_2d(self.get_point(i));
        }
        total
    }

    /// 3D length when `has_z`, otherwise identical to `length_2d`.
    pub fn length(&self) -> f64 {
        if self.npoints < 2 {
            return 0.0;
        }
        if !self.flags.has_z {
            return self.length_2d();
        }
        let mut total = 0.0;
        for i in 1..self.npoints {
            total += self.get_point(i - 1).distance_3d(self.get_point(i));
        }
        total
    }

    /// Arc length of an odd-count arc array: sums `arc_length` (see
    /// `planargeom::algorithm::kernels::arc_length`) over consecutive
    /// triples. Exposed here as a thin wrapper so `planargeom` supplies the
    /// actual circular-arc math (C6) while the summation lives with the
    /// array it walks.
    pub fn arc_length_2d(&self, arc_length_of_triple: impl Fn(Coord4, Coord4, Coord4) -> f64) -> f64 {
        if self.npoints < 3 {
            return self.length_2d();
        }
        let mut total = 0.0;
        let mut i = 0;
        while i + 2 < self.npoints {
            total += arc_length_of_triple(
                self.get_point(i),
                self.get_point(i + 1),
                self.get_point(i + 2),
            );
            i += 2;
        }
        total
    }

    /// Signed shoelace area; positive means the ring winds
    /// counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        if self.npoints < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..self.npoints - 1 {
            let a = self.get_point(i);
            let b = self.get_point(i + 1);
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    pub fn is_closed_2d(&self) -> bool {
        match (self.startpoint(), self.endpoint()) {
            (Some(a), Some(b)) => a.exact_eq_2d(b),
            _ => false,
        }
    }

    pub fn is_closed_3d(&self) -> bool {
        match (self.startpoint(), self.endpoint()) {
            (Some(a), Some(b)) => {
                if self.flags.has_z {
                    a.exact_eq_3d(b)
                } else {
                    a.exact_eq_2d(b)
                }
            }
            _ => false,
        }
    }

    pub fn npoints_in_rect(&self, rect: &Box2D) -> usize {
        self.iter().filter(|c| rect.contains_point(*c)).count()
    }

    pub fn bbox(&self) -> GBox {
        let mut b = GBox::empty(self.flags);
        for c in self.iter() {
            b.expand_to_coord(c);
        }
        b
    }

    // ---- containment (§4.1) -----------------------------------------

    /// Winding-number containment test against a closed ring. Zero-length
    /// segments are skipped; a point lying exactly on a non-degenerate
    /// segment is `Boundary` regardless of winding parity.
    pub fn contains_point(&self, pt: Coord4) -> PointPosition {
        let mut winding = 0;
        if self.contains_point_partial(pt, &mut winding) {
            PointPosition::Boundary
        } else if winding != 0 {
            PointPosition::Inside
        } else {
            PointPosition::Outside
        }
    }

    /// As `contains_point`, but usable on an unclosed ring fragment: the
    /// accumulated winding number is added into `*winding` so callers can
    /// combine multiple `CompoundCurve` pieces. Returns `true` iff `pt`
    /// landed exactly on a segment of this array.
    pub fn contains_point_partial(&self, pt: Coord4, winding: &mut i32) -> bool {
        if self.npoints < 2 {
            return false;
        }
        for i in 0..self.npoints - 1 {
            let p1 = self.get_point(i);
            let p2 = self.get_point(i + 1);
            if p1.exact_eq_2d(p2) {
                continue;
            }
            if on_segment_2d(p1, p2, pt) {
                return true;
            }
            let side = side2d(p1, p2, pt);
            if p1.y <= pt.y {
                if p2.y > pt.y && side > 0.0 {
                    *winding += 1;
                }
            } else if p2.y <= pt.y && side < 0.0 {
                *winding -= 1;
            }
        }
        false
    }

    // ---- simplification (Douglas-Peucker, §4.1) ----------------------

    /// Douglas-Peucker simplification with an explicit index stack
    /// (emulating the recursion of the source). The output always
    /// includes the first and last point.
    pub fn simplify_dp(&self, epsilon: f64, minpts: usize) -> PointArray {
        if self.npoints < 3 || epsilon <= 0.0 {
            return self.clone();
        }
        let minpts = minpts.max(2);
        let mut keep = vec![false; self.npoints];
        keep[0] = true;
        keep[self.npoints - 1] = true;
        let mut kept_count = 2usize;

        // Explicit stack of (lo, hi) index ranges still to be examined,
        // standing in for the source's recursive `ptarray_simplify`.
        let mut stack = vec![(0usize, self.npoints - 1)];
        while let Some((lo, hi)) = stack.pop() {
            if hi <= lo + 1 {
                continue;
            }
            let p1 = self.get_point(lo);
            let p_end = self.get_point(hi);
            let mut max_dist2 = -1.0f64;
            let mut split = lo;
            for i in lo + 1..hi {
                let d2 = perpendicular_distance2(p1, p_end, self.get_point(i));
                if d2 > max_dist2 {
                    max_dist2 = d2;
                    split = i;
                }
            }
            let would_underflow = kept_count < minpts && (hi - lo) <= (minpts - kept_count);
            if max_dist2 > epsilon * epsilon || would_underflow {
                if !keep[split] {
                    keep[split] = true;
                    kept_count += 1;
                }
                stack.push((lo, split));
                stack.push((split, hi));
            }
        }

        let points: Vec<Coord4> = (0..self.npoints)
            .filter(|&i| keep[i])
            .map(|i| self.get_point(i))
            .collect();
        PointArray::from_coords(self.flags, &points)
    }

    // ---- segmentize / substring / locate / grid / affine --------------

    /// Inserts intermediate points so no 2D segment exceeds `dist`; added
    /// points interpolate `z`/`m` linearly.
    pub fn segmentize_2d(&self, dist: f64) -> PointArray {
        if dist <= 0.0 || self.npoints < 2 {
            return self.clone();
        }
        let mut out = PointArray::empty(self.flags, self.npoints);
        out.append_point(self.get_point(0), true);
        for i in 1..self.npoints {
            let a = self.get_point(i - 1);
            let b = self.get_point(i);
            let seg_len = a.distance_2d(b);
            if seg_len > dist {
                let steps = (seg_len / dist).ceil() as usize;
                for s in 1..steps {
                    let t = s as f64 / steps as f64;
                    out.append_point(a.lerp(b, t), false);
                }
            }
            out.append_point(b, true);
        }
        out
    }

    /// Returns the sub-array walking from fractional position `from` to
    /// `to` (each in `[0, 1]`) along cumulative 2D length. `snap_tolerance`
    /// snaps a fractional endpoint onto an existing vertex when within
    /// that distance, avoiding a near-duplicate point.
    pub fn substring(&self, from: f64, to: f64, snap_tolerance: f64) -> PointArray {
        assert!((0.0..=1.0).contains(&from) && (0.0..=1.0).contains(&to));
        if self.npoints < 2 || from >= to {
            return PointArray::empty(self.flags, 0);
        }
        let total = self.length_2d();
        if total == 0.0 {
            return self.clone();
        }
        let from_len = from * total;
        let to_len = to * total;
        let mut out = PointArray::empty(self.flags, self.npoints);
        let mut cumulative = 0.0;
        for i in 1..self.npoints {
            let a = self.get_point(i - 1);
            let b = self.get_point(i);
            let seg_len = a.distance_2d(b);
            let seg_start = cumulative;
            let seg_end = cumulative + seg_len;

            if seg_end >= from_len && seg_start <= to_len && seg_len > 0.0 {
                let t_lo = ((from_len - seg_start) / seg_len).clamp(0.0, 1.0);
                let t_hi = ((to_len - seg_start) / seg_len).clamp(0.0, 1.0);
                if out.is_empty() && seg_start <= from_len {
                    let p = a.lerp(b, t_lo);
                    out.append_point(snap_to_endpoint(p, a, b, snap_tolerance), true);
                }
                if seg_end <= to_len {
                    out.append_point(b, false);
                } else {
                    let p = a.lerp(b, t_hi);
                    out.append_point(snap_to_endpoint(p, a, b, snap_tolerance), false);
                }
            }
            cumulative = seg_end;
            if cumulative > to_len {
                break;
            }
        }
        out
    }

    /// Closest fraction along the array to `query`, plus the projected
    /// point and minimum 2D distance.
    pub fn locate_point(&self, query: Coord4) -> (f64, Coord4, f64) {
        if self.npoints == 0 {
            return (0.0, query, f64::INFINITY);
        }
        if self.npoints == 1 {
            let p = self.get_point(0);
            return (0.0, p, p.distance_2d(query));
        }
        let total = self.length_2d();
        let mut cumulative = 0.0;
        let mut best_dist = f64::INFINITY;
        let mut best_fraction = 0.0;
        let mut best_point = self.get_point(0);
        for i in 1..self.npoints {
            let a = self.get_point(i - 1);
            let b = self.get_point(i);
            let seg_len = a.distance_2d(b);
            let (proj, t) = project_onto_segment(a, b, query);
            let d = proj.distance_2d(query);
            if d < best_dist {
                best_dist = d;
                best_point = proj;
                best_fraction = if total > 0.0 {
                    (cumulative + t * seg_len) / total
                } else {
                    0.0
                };
            }
            cumulative += seg_len;
        }
        (best_fraction, best_point, best_dist)
    }

    /// Rounds each coordinate to the nearest grid cell; a zero cell size
    /// disables snapping on that axis. Consecutive points that become
    /// coincident after snapping are collapsed, participating on `z`/`m`
    /// only when the array itself carries that dimension and its grid
    /// size is nonzero (see `SPEC_FULL.md`/`spec.md` §9 open question).
    pub fn snap_to_grid(&self, grid: GridSpec) -> PointArray {
        let mut out = PointArray::empty(self.flags, self.npoints);
        for c in self.iter() {
            let snapped = Coord4 {
                x: GridSpec::snap_axis(grid.ipx, grid.xsize, c.x),
                y: GridSpec::snap_axis(grid.ipy, grid.ysize, c.y),
                z: if self.flags.has_z {
                    GridSpec::snap_axis(grid.ipz, grid.zsize, c.z)
                } else {
                    c.z
                },
                m: if self.flags.has_m {
                    GridSpec::snap_axis(grid.ipm, grid.msize, c.m)
                } else {
                    c.m
                },
            };
            let dup = out.endpoint().is_some_and(|last| {
                let z_participates = self.flags.has_z && grid.zsize > 0.0;
                let m_participates = self.flags.has_m && grid.msize > 0.0;
                last.x.to_bits() == snapped.x.to_bits()
                    && last.y.to_bits() == snapped.y.to_bits()
                    && (!z_participates || last.z.to_bits() == snapped.z.to_bits())
                    && (!m_participates || last.m.to_bits() == snapped.m.to_bits())
            });
            if !dup {
                out.append_point(snapped, true);
            }
        }
        out
    }

    pub fn affine(&mut self, matrix: &AffineMatrix) {
        let n = self.npoints;
        for i in 0..n {
            let c = self.get_point(i);
            let (x, y, z) = matrix.apply(c);
            self.set_point(i, Coord4 { x, y, z, m: c.m });
        }
    }

    pub fn scale(&mut self, fx: f64, fy: f64, fz: f64) {
        self.affine(&AffineMatrix::scale(fx, fy, fz));
    }

    /// Returns a new array with the requested dimensionality; ordinates
    /// added by the coercion are `0.0`, and ordinates dropped by it are
    /// discarded (recoverable only if the caller kept the original).
    pub fn force_dims(&self, has_z: bool, has_m: bool) -> PointArray {
        let new_flags = self.flags.with_z(has_z).with_m(has_m);
        let points: Vec<Coord4> = self.iter().collect();
        PointArray::from_coords(new_flags, &points)
    }

    /// Removes consecutive duplicate points. Two points are "equal" under
    /// `tolerance == 0.0` iff bit-identical (per this array's
    /// dimensionality), otherwise iff their squared 2D distance is `<=
    /// tolerance^2`. Always keeps at least `min_points` points even if
    /// that leaves some satisfying the tolerance.
    pub fn remove_repeated_points(&self, tolerance: f64, min_points: usize) -> PointArray {
        let min_points = min_points.max(2).min(self.npoints.max(1));
        if self.npoints <= min_points {
            return self.clone();
        }
        let mut kept: Vec<Coord4> = Vec::with_capacity(self.npoints);
        for c in self.iter() {
            let dup = match kept.last() {
                None => false,
                Some(&last) => {
                    if tolerance == 0.0 {
                        if self.flags.has_z {
                            last.exact_eq_3d(c)
                        } else {
                            last.exact_eq_2d(c)
                        }
                    } else {
                        last.squared_distance_2d(c) <= tolerance * tolerance
                    }
                }
            };
            if !dup || kept.len() < min_points {
                kept.push(c);
            }
        }
        while kept.len() < min_points && kept.len() < self.npoints {
            // Restore points that the tolerance pass discarded, in order,
            // until the floor is satisfied.
            for c in self.iter() {
                if kept.len() >= min_points {
                    break;
                }
                if !kept.contains(&c) {
                    kept.push(c);
                }
            }
            break;
        }
        PointArray::from_coords(self.flags, &kept)
    }
}

fn push_coord(buf: &mut Vec<f64>, flags: Flags, c: Coord4) {
    buf.push(c.x);
    buf.push(c.y);
    if flags.has_z {
        buf.push(c.z);
    }
    if flags.has_m {
        buf.push(c.m);
    }
}

fn read_coord(buf: &[f64], flags: Flags, offset: usize) -> Coord4 {
    let mut c = Coord4::default();
    c.x = buf[offset];
    c.y = buf[offset + 1];
    let mut k = offset + 2;
    if flags.has_z {
        c.z = buf[k];
        k += 1;
    }
    if flags.has_m {
        c.m = buf[k];
    }
    c
}

fn write_coord(buf: &mut [f64], flags: Flags, offset: usize, c: Coord4) {
    buf[offset] = c.x;
    buf[offset + 1] = c.y;
    let mut k = offset + 2;
    if flags.has_z {
        buf[k] = c.z;
        k += 1;
    }
    if flags.has_m {
        buf[k] = c.m;
    }
}

/// Sign of `(q - p1) x (p2 - p1)`: positive when `q` is to the left of
/// `p1 -> p2`. Local to the containment test; the C6 analytic-kernel
/// "segment side" used for intersection classification lives in
/// `planargeom::algorithm::kernels` and is defined identically but kept
/// separate since C3 and C6 are different crates.
fn side2d(p1: Coord4, p2: Coord4, q: Coord4) -> f64 {
    (p2.x - p1.x) * (q.y - p1.y) - (q.x - p1.x) * (p2.y - p1.y)
}

fn on_segment_2d(p1: Coord4, p2: Coord4, q: Coord4) -> bool {
    if side2d(p1, p2, q).abs() > 0.0 {
        return false;
    }
    let (xmin, xmax) = if p1.x < p2.x { (p1.x, p2.x) } else { (p2.x, p1.x) };
    let (ymin, ymax) = if p1.y < p2.y { (p1.y, p2.y) } else { (p2.y, p1.y) };
    q.x >= xmin && q.x <= xmax && q.y >= ymin && q.y <= ymax
}

fn perpendicular_distance2(a: Coord4, b: Coord4, p: Coord4) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p.squared_distance_2d(a);
    }
    let cross = dx * (a.y - p.y) - dy * (a.x - p.x);
    (cross * cross) / len2
}

fn project_onto_segment(a: Coord4, b: Coord4, p: Coord4) -> (Coord4, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return (a, 0.0);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    (a.lerp(b, t), t)
}

fn snap_to_endpoint(p: Coord4, a: Coord4, b: Coord4, tolerance: f64) -> Coord4 {
    if tolerance <= 0.0 {
        return p;
    }
    if p.distance_2d(a) <= tolerance {
        a
    } else if p.distance_2d(b) <= tolerance {
        b
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_ring() -> PointArray {
        PointArray::from_coords(
            Flags::XY,
            &[
                Coord4::xy(0.0, 0.0),
                Coord4::xy(10.0, 0.0),
                Coord4::xy(10.0, 10.0),
                Coord4::xy(0.0, 10.0),
                Coord4::xy(0.0, 0.0),
            ],
        )
    }

    #[test]
    fn signed_area_is_positive_for_ccw_square() {
        assert_eq!(square_ring().signed_area(), 100.0);
    }

    #[test]
    fn reversed_ring_has_negative_area() {
        let mut ring = square_ring();
        ring.reverse();
        assert_eq!(ring.signed_area(), -100.0);
    }

    #[test]
    fn contains_point_classifies_inside_outside_boundary() {
        let ring = square_ring();
        assert_eq!(ring.contains_point(Coord4::xy(5.0, 5.0)), PointPosition::Inside);
        assert_eq!(ring.contains_point(Coord4::xy(20.0, 20.0)), PointPosition::Outside);
        assert_eq!(ring.contains_point(Coord4::xy(0.0, 5.0)), PointPosition::Boundary);
        assert_eq!(ring.contains_point(Coord4::xy(0.0, 0.0)), PointPosition::Boundary);
    }

    #[test]
    fn shallow_clone_does_not_see_later_mutation() {
        let mut a = square_ring();
        let shallow = a.clone_shallow();
        a.set_point(0, Coord4::xy(99.0, 99.0));
        assert_eq!(shallow.get_point(0), Coord4::xy(0.0, 0.0));
    }

    #[test]
    fn simplify_dp_keeps_endpoints_and_collapses_near_straight_line() {
        let line = PointArray::from_coords(
            Flags::XY,
            &[
                Coord4::xy(0.0, 0.0),
                Coord4::xy(1.0, 0.0001),
                Coord4::xy(2.0, 0.0),
            ],
        );
        let simplified = line.simplify_dp(0.001, 2);
        assert_eq!(simplified.npoints(), 2);
        assert_eq!(simplified.startpoint(), line.startpoint());
        assert_eq!(simplified.endpoint(), line.endpoint());
    }

    #[test]
    fn simplify_dp_is_identity_at_zero_tolerance() {
        let ring = square_ring();
        let simplified = ring.simplify_dp(0.0, 2);
        assert_eq!(simplified, ring);
    }

    #[test]
    fn segmentize_bounds_every_segment_length() {
        let line = PointArray::from_coords(
            Flags::XY,
            &[Coord4::xy(0.0, 0.0), Coord4::xy(10.0, 0.0)],
        );
        let out = line.segmentize_2d(3.0);
        for i in 1..out.npoints() {
            let d = out.get_point(i - 1).distance_2d(out.get_point(i));
            assert!(d <= 3.0 + 1e-9);
        }
        assert_eq!(out.startpoint(), line.startpoint());
        assert_eq!(out.endpoint(), line.endpoint());
    }

    #[test]
    fn locate_point_projects_onto_nearest_segment() {
        let line = PointArray::from_coords(
            Flags::XY,
            &[Coord4::xy(0.0, 0.0), Coord4::xy(10.0, 0.0)],
        );
        let (fraction, point, dist) = line.locate_point(Coord4::xy(5.0, 3.0));
        assert!((fraction - 0.5).abs() < 1e-9);
        assert_eq!(point, Coord4::xy(5.0, 0.0));
        assert_eq!(dist, 3.0);
    }

    #[test]
    fn remove_repeated_points_collapses_duplicates_but_respects_floor() {
        let line = PointArray::from_coords(
            Flags::XY,
            &[
                Coord4::xy(0.0, 0.0),
                Coord4::xy(0.0, 0.0),
                Coord4::xy(1.0, 0.0),
            ],
        );
        let out = line.remove_repeated_points(0.0, 2);
        assert_eq!(out.npoints(), 2);
    }

    #[test]
    fn append_array_skips_exact_join_point() {
        let mut a = PointArray::from_coords(
            Flags::XY,
            &[Coord4::xy(0.0, 0.0), Coord4::xy(1.0, 0.0)],
        );
        let b = PointArray::from_coords(
            Flags::XY,
            &[Coord4::xy(1.0, 0.0), Coord4::xy(2.0, 0.0)],
        );
        a.append_array(&b, None).unwrap();
        assert_eq!(a.npoints(), 3);
    }
}
