//! A flattening iterator over every coordinate of an arbitrarily nested
//! geometry, in traversal order. Grounded on `original_source/rtiterator.c`
//! and mirroring `geo`'s own `CoordsIter` trait.

use crate::coord::Coord4;
use crate::geometry::Geometry;

impl Geometry {
    /// Every coordinate of this geometry and its descendants, depth-first,
    /// in the order the source's `RTITERATOR` would visit them.
    pub fn coords_iter(&self) -> CoordsIter<'_> {
        let mut stack = vec![self];
        stack.reverse();
        CoordsIter {
            geom_stack: stack,
            current: None,
            index: 0,
        }
    }
}

pub struct CoordsIter<'a> {
    geom_stack: Vec<&'a Geometry>,
    current: Option<&'a Geometry>,
    index: usize,
}

impl<'a> Iterator for CoordsIter<'a> {
    type Item = Coord4;

    fn next(&mut self) -> Option<Coord4> {
        loop {
            if let Some(g) = self.current {
                if let Some(points) = g.points() {
                    if self.index < points.npoints() {
                        let c = points.get_point(self.index);
                        self.index += 1;
                        return Some(c);
                    }
                } else if let Some(rings) = g.rings() {
                    // Walk ring-by-ring by tracking a flattened offset.
                    let mut remaining = self.index;
                    for ring in rings {
                        if remaining < ring.npoints() {
                            let c = ring.get_point(remaining);
                            self.index += 1;
                            return Some(c);
                        }
                        remaining -= ring.npoints();
                    }
                }
                // Exhausted this node's own points; move to its children.
                for child in g.children().iter().rev() {
                    self.geom_stack.push(child);
                }
                self.current = None;
            }
            match self.geom_stack.pop() {
                Some(next) => {
                    self.current = Some(next);
                    self.index = 0;
                }
                None => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coord4;
    use crate::flags::Flags;
    use crate::geometry::Header;
    use crate::kind::GeomKind;
    use crate::pointarray::PointArray;

    #[test]
    fn flattens_nested_collection() {
        let line = Geometry::LineString {
            header: Header::new(Flags::XY, 0),
            points: PointArray::from_coords(
                Flags::XY,
                &[Coord4::xy(0.0, 0.0), Coord4::xy(1.0, 1.0)],
            ),
        };
        let mut collection =
            Geometry::empty_collection(GeomKind::GeometryCollection, 0, Flags::XY).unwrap();
        collection.add_geom(line).unwrap();
        let coords: Vec<Coord4> = collection.coords_iter().collect();
        assert_eq!(coords, vec![Coord4::xy(0.0, 0.0), Coord4::xy(1.0, 1.0)]);
    }
}
