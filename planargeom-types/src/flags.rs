//! Packed attribute bits shared by [`crate::pointarray::PointArray`] and
//! every [`crate::geometry::Geometry`] variant.

/// `has_z` / `has_m` / `has_bbox` / `is_geodetic` / `is_readonly`, kept as a
/// small `Copy` struct rather than a true bitset: there are only five bits
/// and none of the call sites need bitwise composition, so a struct of
/// `bool`s reads better than `u8` masking at every use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flags {
    pub has_z: bool,
    pub has_m: bool,
    pub has_bbox: bool,
    pub is_geodetic: bool,
    pub is_readonly: bool,
}

impl Flags {
    pub const fn new(has_z: bool, has_m: bool) -> Self {
        Flags {
            has_z,
            has_m,
            has_bbox: false,
            is_geodetic: false,
            is_readonly: false,
        }
    }

    pub const XY: Flags = Flags::new(false, false);
    pub const XYZ: Flags = Flags::new(true, false);
    pub const XYM: Flags = Flags::new(false, true);
    pub const XYZM: Flags = Flags::new(true, true);

    /// Number of `f64` ordinates per point: 2, 3, 3, or 4.
    pub const fn stride(self) -> usize {
        2 + self.has_z as usize + self.has_m as usize
    }

    /// Topological dimension implied by Z presence: 2 or 3.
    pub const fn coord_dimension(self) -> usize {
        if self.has_z {
            3
        } else {
            2
        }
    }

    /// Two arrays/geometries are dimensionality-compatible iff `has_z` and
    /// `has_m` agree; `has_bbox`/`is_geodetic`/`is_readonly` never gate
    /// compatibility.
    pub const fn dimensionality_compatible(self, other: Flags) -> bool {
        self.has_z == other.has_z && self.has_m == other.has_m
    }

    pub const fn with_bbox(self, has_bbox: bool) -> Self {
        Flags { has_bbox, ..self }
    }

    pub const fn with_readonly(self, is_readonly: bool) -> Self {
        Flags {
            is_readonly,
            ..self
        }
    }

    pub const fn with_z(self, has_z: bool) -> Self {
        Flags { has_z, ..self }
    }

    pub const fn with_m(self, has_m: bool) -> Self {
        Flags { has_m, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_matches_dimension_count() {
        assert_eq!(Flags::XY.stride(), 2);
        assert_eq!(Flags::XYZ.stride(), 3);
        assert_eq!(Flags::XYM.stride(), 3);
        assert_eq!(Flags::XYZM.stride(), 4);
    }

    #[test]
    fn compatibility_ignores_bbox_and_readonly() {
        let a = Flags::XYZ.with_bbox(true);
        let b = Flags::XYZ.with_readonly(true);
        assert!(a.dimensionality_compatible(b));
        assert!(!a.dimensionality_compatible(Flags::XYM));
    }
}
