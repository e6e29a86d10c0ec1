//! WKT writer (§4.8/§6.4): coordinate-to-text formatting plus the
//! geometry-to-text serializer in its three variants (SFSQL, ISO,
//! Extended).
//!
//! Grounded on `original_source/rtout_wkt.c`: a tag, an optional dimension
//! qualifier, then parenthesized coordinate lists assembled with a
//! `stringbuffer.h`-style append (here, a plain `String` the write
//! functions push onto). Ordinate formatting is grounded on
//! `original_source/rtutil.c`'s `trim_trailing_zeros`: format with a fixed
//! number of digits after the decimal point, then trim trailing `0`s (and
//! the `.` itself if nothing is left after it). Large magnitudes switch to
//! exponential notation past
//! [`planargeom_types::coord::MAX_DOUBLE_PRINTED_VERBATIM`], matching
//! §6.2's "max absolute double printed verbatim" rule.

use planargeom_types::coord::{Coord4, DEFAULT_OUTPUT_DIGITS, MAX_DOUBLE_PRINTED_VERBATIM};
use planargeom_types::flags::Flags;
use planargeom_types::geometry::{Geometry, SRID_UNKNOWN};
use planargeom_types::kind::GeomKind;
use planargeom_types::pointarray::PointArray;

/// Renders `value` the way the WKT writer wants a single ordinate printed:
/// fixed-point with `digits` fractional digits, trailing zeros (and a bare
/// trailing `.`) trimmed, falling back to `{:e}` for magnitudes past
/// [`MAX_DOUBLE_PRINTED_VERBATIM`].
pub fn format_ordinate(value: f64, digits: i32) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }
    if value.abs() >= MAX_DOUBLE_PRINTED_VERBATIM {
        return format!("{value:e}");
    }
    let raw = format!("{value:.*}", digits.max(0) as usize);
    trim_trailing_zeros(&raw)
}

/// Renders an ordinate at the default precision (§6.2,
/// [`DEFAULT_OUTPUT_DIGITS`]).
pub fn format_default(value: f64) -> String {
    format_ordinate(value, DEFAULT_OUTPUT_DIGITS)
}

/// Port of `rtutil.c`'s `trim_trailing_zeros`: find the first `.`, then
/// walk back from the end of the string dropping `0` characters; if the
/// walk reaches back to the character right after the dot, drop the dot
/// too.
fn trim_trailing_zeros(s: &str) -> String {
    let Some(dot) = s.find('.') else {
        return s.to_string();
    };
    let bytes = s.as_bytes();
    let mut end = bytes.len();
    while end > dot + 1 && bytes[end - 1] == b'0' {
        end -= 1;
    }
    if end == dot + 1 {
        end = dot;
    }
    s[..end].to_string()
}

/// Which text dialect [`to_wkt`] emits (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WktVariant {
    /// `POINT(x y)`. Always 2D; Z/M ordinates are dropped even if present.
    Sfsql,
    /// `POINT Z (x y z)` / `POINT M (x y m)` / `POINT ZM (x y z m)`: a
    /// space-separated dimension qualifier between the tag and the body.
    Iso,
    /// PostGIS-style "EWKT": ordinate count alone carries Z/ZM, a fused
    /// `POINTM` tag (no space) disambiguates the M-only case, and
    /// `SRID=n;` is allowed as a prefix on the root geometry.
    Extended,
}

/// Serializes `geom` to WKT text (§4.8/§6.4). When `variant` is
/// [`WktVariant::Extended`] and `geom` carries a known SRID, the output is
/// prefixed with `SRID=n;` -- never on nested children, matching the
/// reader's rule that SRID is root-only (§4.2).
pub fn to_wkt(geom: &Geometry, variant: WktVariant) -> String {
    let mut out = String::new();
    if variant == WktVariant::Extended && geom.srid() != SRID_UNKNOWN {
        out.push_str("SRID=");
        out.push_str(&geom.srid().to_string());
        out.push(';');
    }
    write_tagged(&mut out, geom, variant);
    out
}

/// `(write_z, write_m)`: SFSQL always strips both; ISO and Extended honor
/// whatever the geometry's own flags carry.
fn effective_dims(flags: Flags, variant: WktVariant) -> (bool, bool) {
    match variant {
        WktVariant::Sfsql => (false, false),
        WktVariant::Iso | WktVariant::Extended => (flags.has_z, flags.has_m),
    }
}

fn dim_suffix(flags: Flags, variant: WktVariant) -> &'static str {
    match variant {
        WktVariant::Sfsql | WktVariant::Extended => "",
        WktVariant::Iso => match (flags.has_z, flags.has_m) {
            (true, true) => " ZM",
            (true, false) => " Z",
            (false, true) => " M",
            (false, false) => "",
        },
    }
}

/// `kind.name()` upper-cased, with the Extended variant's fused `M` suffix
/// (`POINTM`) appended when the geometry is M-only.
fn tag_name(kind: GeomKind, flags: Flags, variant: WktVariant) -> String {
    let base = kind.name().to_ascii_uppercase();
    if variant == WktVariant::Extended && flags.has_m && !flags.has_z {
        format!("{base}M")
    } else {
        base
    }
}

fn write_coord(out: &mut String, c: Coord4, write_z: bool, write_m: bool) {
    out.push_str(&format_default(c.x));
    out.push(' ');
    out.push_str(&format_default(c.y));
    if write_z {
        out.push(' ');
        out.push_str(&format_default(c.z));
    }
    if write_m {
        out.push(' ');
        out.push_str(&format_default(c.m));
    }
}

fn write_coord_list(out: &mut String, points: &PointArray, write_z: bool, write_m: bool) {
    for (i, c) in points.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_coord(out, c, write_z, write_m);
    }
}

fn write_ring_list(out: &mut String, rings: &[PointArray], write_z: bool, write_m: bool) {
    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('(');
        write_coord_list(out, ring, write_z, write_m);
        out.push(')');
    }
}

/// Writes a collection child's body with no tag of its own: a bare
/// coordinate list for point/curve-shaped children, a bare ring list for
/// polygon-shaped ones. This is how MultiLineString/MultiPolygon/
/// PolyhedralSurface/Tin children, and the untagged components of
/// CompoundCurve/CurvePolygon/MultiCurve/MultiSurface, are printed.
fn write_bare_body(out: &mut String, child: &Geometry, write_z: bool, write_m: bool) {
    match child.kind() {
        GeomKind::Point | GeomKind::LineString | GeomKind::CircularString | GeomKind::Triangle => {
            if child.is_empty() {
                out.push_str("EMPTY");
                return;
            }
            out.push('(');
            write_coord_list(out, child.points().expect("point-shaped kind"), write_z, write_m);
            out.push(')');
        }
        GeomKind::Polygon => {
            if child.is_empty() {
                out.push_str("EMPTY");
                return;
            }
            out.push('(');
            write_ring_list(out, child.rings().expect("Polygon has rings"), write_z, write_m);
            out.push(')');
        }
        other => unreachable!("write_bare_body called on non-patch kind {other}"),
    }
}

fn write_tagged(out: &mut String, geom: &Geometry, variant: WktVariant) {
    let flags = geom.flags();
    let (write_z, write_m) = effective_dims(flags, variant);
    out.push_str(&tag_name(geom.kind(), flags, variant));
    let suffix = dim_suffix(flags, variant);
    out.push_str(suffix);
    if geom.is_empty() {
        out.push_str(" EMPTY");
        return;
    }
    if !suffix.is_empty() {
        out.push(' ');
    }
    out.push('(');
    write_body(out, geom, variant, write_z, write_m);
    out.push(')');
}

/// A curve/surface component is printed bare (no tag) when it's the
/// "default" child kind for its container -- a straight `LineString`
/// segment of a curve, a straight `Polygon` patch of a surface -- and
/// fully tagged (recursing through [`write_tagged`]) otherwise, matching
/// `parser.rs`'s `parse_curve_component`/`parse_surface_component` duals.
fn write_body(out: &mut String, geom: &Geometry, variant: WktVariant, write_z: bool, write_m: bool) {
    match geom.kind() {
        GeomKind::Point | GeomKind::LineString | GeomKind::CircularString | GeomKind::Triangle => {
            write_coord_list(out, geom.points().expect("point-shaped kind"), write_z, write_m);
        }
        GeomKind::Polygon => {
            write_ring_list(out, geom.rings().expect("Polygon has rings"), write_z, write_m);
        }
        GeomKind::MultiPoint => {
            for (i, child) in geom.children().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match child.points().and_then(PointArray::startpoint) {
                    Some(c) => write_coord(out, c, write_z, write_m),
                    None => out.push_str("EMPTY"),
                }
            }
        }
        GeomKind::MultiLineString
        | GeomKind::MultiPolygon
        | GeomKind::PolyhedralSurface
        | GeomKind::Tin => {
            for (i, child) in geom.children().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_bare_body(out, child, write_z, write_m);
            }
        }
        GeomKind::GeometryCollection => {
            for (i, child) in geom.children().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_tagged(out, child, variant);
            }
        }
        GeomKind::CompoundCurve | GeomKind::MultiCurve => {
            for (i, child) in geom.children().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match child.kind() {
                    GeomKind::LineString => write_bare_body(out, child, write_z, write_m),
                    _ => write_tagged(out, child, variant),
                }
            }
        }
        GeomKind::CurvePolygon => {
            for (i, child) in geom.children().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match child.kind() {
                    GeomKind::LineString => write_bare_body(out, child, write_z, write_m),
                    _ => write_tagged(out, child, variant),
                }
            }
        }
        GeomKind::MultiSurface => {
            for (i, child) in geom.children().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match child.kind() {
                    GeomKind::Polygon => write_bare_body(out, child, write_z, write_m),
                    _ => write_tagged(out, child, variant),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_zeros_but_keeps_significant_digits() {
        assert_eq!(format_ordinate(1.5, 15), "1.5");
        assert_eq!(format_ordinate(1.100, 15), "1.1");
    }

    #[test]
    fn trims_dot_entirely_for_whole_numbers() {
        assert_eq!(format_ordinate(3.0, 15), "3");
        assert_eq!(format_ordinate(-4.0, 15), "-4");
    }

    #[test]
    fn zero_renders_as_bare_zero() {
        assert_eq!(format_ordinate(0.0, 15), "0");
        assert_eq!(format_ordinate(-0.0, 15), "0");
    }

    #[test]
    fn large_magnitude_switches_to_exponential() {
        let rendered = format_ordinate(1e20, 15);
        assert!(rendered.contains('e'));
    }

    #[test]
    fn preserves_negative_sign() {
        assert_eq!(format_ordinate(-1.25, 15), "-1.25");
    }

    fn parse(text: &str) -> Geometry {
        crate::parser::parse(text).unwrap()
    }

    #[test]
    fn sfsql_point_is_always_2d() {
        let g = parse("POINT Z (1 2 3)");
        assert_eq!(to_wkt(&g, WktVariant::Sfsql), "POINT(1 2)");
    }

    #[test]
    fn iso_point_carries_dimension_qualifier() {
        let g = parse("POINT ZM (1 2 3 4)");
        assert_eq!(to_wkt(&g, WktVariant::Iso), "POINT ZM (1 2 3 4)");
        let g = parse("POINT M (1 2 9)");
        assert_eq!(to_wkt(&g, WktVariant::Iso), "POINT M (1 2 9)");
    }

    #[test]
    fn extended_m_only_fuses_tag_and_leaves_z_and_zm_bare() {
        let g = parse("POINTM(1 2 9)");
        assert_eq!(to_wkt(&g, WktVariant::Extended), "POINTM(1 2 9)");
        let g = parse("POINT Z (1 2 3)");
        assert_eq!(to_wkt(&g, WktVariant::Extended), "POINT(1 2 3)");
        let g = parse("POINT ZM (1 2 3 4)");
        assert_eq!(to_wkt(&g, WktVariant::Extended), "POINT(1 2 3 4)");
    }

    #[test]
    fn extended_srid_prefix_only_on_root() {
        let g = parse("SRID=4326;POINT(1 2)");
        assert_eq!(to_wkt(&g, WktVariant::Extended), "SRID=4326;POINT(1 2)");
        assert_eq!(to_wkt(&g, WktVariant::Sfsql), "POINT(1 2)");
    }

    #[test]
    fn srid_unknown_omits_prefix() {
        let g = parse("POINT(1 2)");
        assert_eq!(to_wkt(&g, WktVariant::Extended), "POINT(1 2)");
    }

    #[test]
    fn empty_geometry_renders_tag_empty() {
        let g = parse("LINESTRING EMPTY");
        assert_eq!(to_wkt(&g, WktVariant::Sfsql), "LINESTRING EMPTY");
        let g = parse("MULTIPOLYGON EMPTY");
        assert_eq!(to_wkt(&g, WktVariant::Sfsql), "MULTIPOLYGON EMPTY");
    }

    #[test]
    fn multipoint_has_no_inner_parens() {
        let g = parse("MULTIPOINT((0 0), 1 1)");
        assert_eq!(to_wkt(&g, WktVariant::Sfsql), "MULTIPOINT(0 0, 1 1)");
    }

    #[test]
    fn multipolygon_children_are_bare_ring_lists() {
        let g = parse("MULTIPOLYGON(((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))");
        assert_eq!(
            to_wkt(&g, WktVariant::Sfsql),
            "MULTIPOLYGON(((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))"
        );
    }

    #[test]
    fn geometrycollection_children_keep_their_own_tags() {
        let g = parse("GEOMETRYCOLLECTION(POINT(0 0), LINESTRING(0 0, 1 1))");
        assert_eq!(
            to_wkt(&g, WktVariant::Sfsql),
            "GEOMETRYCOLLECTION(POINT(0 0), LINESTRING(0 0, 1 1))"
        );
    }

    #[test]
    fn compoundcurve_prints_linestring_bare_and_arc_tagged() {
        let g = parse("COMPOUNDCURVE(CIRCULARSTRING(0 0, 1 1, 2 0), (2 0, 3 0))");
        assert_eq!(
            to_wkt(&g, WktVariant::Sfsql),
            "COMPOUNDCURVE(CIRCULARSTRING(0 0, 1 1, 2 0), (2 0, 3 0))"
        );
    }

    #[test]
    fn curvepolygon_mixes_bare_and_tagged_rings() {
        let g = parse(
            "CURVEPOLYGON(CIRCULARSTRING(0 0, 2 0, 4 0, 2 2, 0 0), (1 1, 2 1, 1 2, 1 1))",
        );
        assert_eq!(
            to_wkt(&g, WktVariant::Sfsql),
            "CURVEPOLYGON(CIRCULARSTRING(0 0, 2 0, 4 0, 2 2, 0 0), (1 1, 2 1, 1 2, 1 1))"
        );
    }

    #[test]
    fn round_trips_through_the_parser() {
        let text = "SRID=4326;POLYGON((0 0, 4 0, 4 4, 0 4, 0 0), (1 1, 2 1, 2 2, 1 2, 1 1))";
        let g = parse(text);
        assert_eq!(to_wkt(&g, WktVariant::Extended), text);
    }
}
