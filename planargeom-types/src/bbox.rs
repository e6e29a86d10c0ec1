//! C5: the bbox engine. Every geometry optionally carries a [`GBox`] that
//! is invalidated by mutation and recomputed lazily on request.

use crate::gbox::GBox;
use crate::geometry::Geometry;

impl Geometry {
    /// Returns the cached bbox if present, else computes, caches, and
    /// returns it. An empty geometry yields an empty `GBox`
    /// (`GBox::is_empty() == true`).
    pub fn bbox(&mut self) -> GBox {
        if let Some(b) = self.header().bbox {
            return b;
        }
        let b = self.compute_bbox();
        self.header_mut().bbox = Some(b);
        b
    }

    /// Computes the bbox without consulting or populating the cache.
    pub fn compute_bbox(&self) -> GBox {
        let flags = self.flags();
        let mut b = GBox::empty(flags);
        match self {
            Geometry::Point { points, .. }
            | Geometry::LineString { points, .. }
            | Geometry::CircularString { points, .. }
            | Geometry::Triangle { points, .. } => b.merge(&points.bbox()),
            Geometry::Polygon { rings, .. } => {
                if let Some(outer) = rings.first() {
                    b.merge(&outer.bbox());
                }
            }
            _ => {
                for child in self.children() {
                    b.merge(&child.compute_bbox());
                }
            }
        }
        b
    }

    /// Drops the cached bbox; `has_bbox` tracks the cache's presence so
    /// the two never disagree.
    pub fn drop_bbox(&mut self) {
        self.header_mut().bbox = None;
    }

    pub fn has_cached_bbox(&self) -> bool {
        self.header().bbox.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coord4;
    use crate::flags::Flags;
    use crate::geometry::Header;
    use crate::pointarray::PointArray;

    #[test]
    fn bbox_covers_all_points_and_is_cached() {
        let mut g = Geometry::LineString {
            header: Header::new(Flags::XY, 0),
            points: PointArray::from_coords(
                Flags::XY,
                &[Coord4::xy(0.0, 0.0), Coord4::xy(3.0, 4.0)],
            ),
        };
        assert!(!g.has_cached_bbox());
        let b = g.bbox();
        assert_eq!(b.xmax, 3.0);
        assert_eq!(b.ymax, 4.0);
        assert!(g.has_cached_bbox());
    }
}
