//! A `summary()` dump of a geometry's structure, grounded on
//! `original_source/rtgeom_debug.c`'s `rtgeom_summary`.

use crate::geometry::Geometry;

impl Geometry {
    /// A one-line-per-level structural dump: kind, SRID, flags, and vertex
    /// counts per sub-part. Intended for diagnostics, not for display to
    /// end users.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        self.summary_into(&mut out, 0);
        out
    }

    fn summary_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        let flags = self.flags();
        out.push_str(&format!(
            "{indent}{kind} srid={srid} z={z} m={m} vertices={vertices}\n",
            kind = self.kind(),
            srid = self.srid(),
            z = flags.has_z,
            m = flags.has_m,
            vertices = self.count_vertices(),
        ));
        for child in self.children() {
            child.summary_into(out, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::kind::GeomKind;

    #[test]
    fn summary_reports_kind_and_vertex_count() {
        let g = Geometry::empty_point(4326, Flags::XYZ);
        assert!(g.summary().contains("Point"));
        assert!(g.summary().contains("srid=4326"));
    }

    #[test]
    fn summary_recurses_into_children() {
        let mut mp = Geometry::empty_collection(GeomKind::MultiPoint, 0, Flags::XY).unwrap();
        mp.add_geom(Geometry::empty_point(0, Flags::XY)).unwrap();
        let text = mp.summary();
        assert_eq!(text.lines().count(), 2);
    }
}
