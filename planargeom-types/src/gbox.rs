//! The axis-aligned bounding box engine (C5): `GBox`, plus the 2D-only
//! `Box2D` fast path kept from `original_source/box2d.c` for the stroke and
//! distance-engine code that only ever needs planar overlap tests.

use crate::coord::{self, Coord4};
use crate::flags::Flags;

/// Axis-aligned bounding box carrying its own [`Flags`]; ordinates the
/// flags mark absent are left at `0.0` and ignored by every method here.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GBox {
    pub flags: Flags,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub zmin: f64,
    pub zmax: f64,
    pub mmin: f64,
    pub mmax: f64,
}

impl GBox {
    pub fn empty(flags: Flags) -> Self {
        GBox {
            flags,
            xmin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymin: f64::INFINITY,
            ymax: f64::NEG_INFINITY,
            zmin: f64::INFINITY,
            zmax: f64::NEG_INFINITY,
            mmin: f64::INFINITY,
            mmax: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.xmin > self.xmax
    }

    pub fn expand_to_coord(&mut self, c: Coord4) {
        if c.x < self.xmin {
            self.xmin = c.x;
        }
        if c.x > self.xmax {
            self.xmax = c.x;
        }
        if c.y < self.ymin {
            self.ymin = c.y;
        }
        if c.y > self.ymax {
            self.ymax = c.y;
        }
        if self.flags.has_z {
            if c.z < self.zmin {
                self.zmin = c.z;
            }
            if c.z > self.zmax {
                self.zmax = c.z;
            }
        }
        if self.flags.has_m {
            if c.m < self.mmin {
                self.mmin = c.m;
            }
            if c.m > self.mmax {
                self.mmax = c.m;
            }
        }
    }

    pub fn merge(&mut self, other: &GBox) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }
        self.xmin = coord::min(self.xmin, other.xmin);
        self.xmax = coord::max(self.xmax, other.xmax);
        self.ymin = coord::min(self.ymin, other.ymin);
        self.ymax = coord::max(self.ymax, other.ymax);
        if self.flags.has_z {
            self.zmin = coord::min(self.zmin, other.zmin);
            self.zmax = coord::max(self.zmax, other.zmax);
        }
        if self.flags.has_m {
            self.mmin = coord::min(self.mmin, other.mmin);
            self.mmax = coord::max(self.mmax, other.mmax);
        }
    }

    /// Pad every present axis by `distance`, used before testing a
    /// tolerance-based overlap (the distance engine's `dwithin` fast path).
    pub fn expand_by(&self, distance: f64) -> GBox {
        let mut b = *self;
        b.xmin -= distance;
        b.xmax += distance;
        b.ymin -= distance;
        b.ymax += distance;
        if b.flags.has_z {
            b.zmin -= distance;
            b.zmax += distance;
        }
        if b.flags.has_m {
            b.mmin -= distance;
            b.mmax += distance;
        }
        b
    }

    /// 2D-only overlap test (Z/M are never consulted, matching
    /// `box2d.c`'s rectangle intersection used by the fast distance path).
    pub fn overlaps_2d(&self, other: &GBox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.xmin <= other.xmax
            && self.xmax >= other.xmin
            && self.ymin <= other.ymax
            && self.ymax >= other.ymin
    }

    pub fn contains_2d(&self, other: &GBox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.xmin <= other.xmin
            && self.xmax >= other.xmax
            && self.ymin <= other.ymin
            && self.ymax >= other.ymax
    }

    pub fn contains_point_2d(&self, c: Coord4) -> bool {
        !self.is_empty() && c.x >= self.xmin && c.x <= self.xmax && c.y >= self.ymin && c.y <= self.ymax
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn as_2d(&self) -> Box2D {
        Box2D {
            xmin: self.xmin,
            xmax: self.xmax,
            ymin: self.ymin,
            ymax: self.ymax,
        }
    }
}

/// A bare 2D rectangle with none of [`GBox`]'s Z/M bookkeeping, grounded on
/// `original_source/box2d.c`. Used internally wherever only planar overlap
/// matters: the distance-engine fast path (§4.4) and the stroke/subdivide
/// bisection (§4.6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box2D {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
}

impl Box2D {
    pub fn empty() -> Self {
        Box2D {
            xmin: f64::INFINITY,
            xmax: f64::NEG_INFINITY,
            ymin: f64::INFINITY,
            ymax: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.xmin > self.xmax
    }

    pub fn expand_to_coord(&mut self, c: Coord4) {
        self.xmin = self.xmin.min(c.x);
        self.xmax = self.xmax.max(c.x);
        self.ymin = self.ymin.min(c.y);
        self.ymax = self.ymax.max(c.y);
    }

    pub fn overlaps(&self, other: &Box2D) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.xmin <= other.xmax
            && self.xmax >= other.xmin
            && self.ymin <= other.ymax
            && self.ymax >= other.ymin
    }

    pub fn contains_point(&self, c: Coord4) -> bool {
        !self.is_empty() && c.x >= self.xmin && c.x <= self.xmax && c.y >= self.ymin && c.y <= self.ymax
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Split into two halves along the wider axis (used by `subdivide`,
    /// §4.6). Degenerate axes are inflated by `FP_TOLERANCE` first so the
    /// bisection always makes progress.
    pub fn bisect_wider_axis(&self, tolerance: f64) -> (Box2D, Box2D) {
        let mut b = *self;
        if b.width() <= 0.0 {
            b.xmin -= tolerance;
            b.xmax += tolerance;
        }
        if b.height() <= 0.0 {
            b.ymin -= tolerance;
            b.ymax += tolerance;
        }
        if b.width() >= b.height() {
            let mid = (b.xmin + b.xmax) / 2.0;
            (
                Box2D {
                    xmax: mid,
                    ..b
                },
                Box2D {
                    xmin: mid,
                    ..b
                },
            )
        } else {
            let mid = (b.ymin + b.ymax) / 2.0;
            (
                Box2D {
                    ymax: mid,
                    ..b
                },
                Box2D {
                    ymin: mid,
                    ..b
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_overlaps_nothing() {
        let a = GBox::empty(Flags::XY);
        let mut b = GBox::empty(Flags::XY);
        b.expand_to_coord(Coord4::xy(0.0, 0.0));
        assert!(!a.overlaps_2d(&b));
    }

    #[test]
    fn bisect_picks_wider_axis() {
        let wide = Box2D {
            xmin: 0.0,
            xmax: 10.0,
            ymin: 0.0,
            ymax: 2.0,
        };
        let (left, right) = wide.bisect_wider_axis(1e-9);
        assert_eq!(left.xmax, 5.0);
        assert_eq!(right.xmin, 5.0);
    }
}
