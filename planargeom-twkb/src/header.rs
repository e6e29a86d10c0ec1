//! TWKB header byte layout (§4.9), grounded on
//! `original_source/rtout_twkb.h`'s `TYPE_PREC_SET_TYPE`/`TYPE_PREC_SET_PREC`
//! and `FIRST_BYTE_SET_*`/`HIGHER_DIM_SET_*` bit macros.
//!
//! The type nibble is 4 bits wide (0-15); all 15 `GeomKind` variants fit
//! exactly, unlike WKB's 1..17 numbering which needs a full `u32`.

use planargeom_types::error::{Error, ParseError, Result};
use planargeom_types::kind::GeomKind;

pub const FLAG_BBOX: u8 = 0x01;
pub const FLAG_SIZE: u8 = 0x02;
pub const FLAG_IDLIST: u8 = 0x04;
pub const FLAG_EXTENDED: u8 = 0x08;
pub const FLAG_EMPTY: u8 = 0x10;

pub fn twkb_type(kind: GeomKind) -> u8 {
    match kind {
        GeomKind::Point => 1,
        GeomKind::LineString => 2,
        GeomKind::Polygon => 3,
        GeomKind::MultiPoint => 4,
        GeomKind::MultiLineString => 5,
        GeomKind::MultiPolygon => 6,
        GeomKind::GeometryCollection => 7,
        GeomKind::CircularString => 8,
        GeomKind::CompoundCurve => 9,
        GeomKind::CurvePolygon => 10,
        GeomKind::MultiCurve => 11,
        GeomKind::MultiSurface => 12,
        GeomKind::Triangle => 13,
        GeomKind::PolyhedralSurface => 14,
        GeomKind::Tin => 15,
    }
}

pub fn kind_from_twkb_type(code: u8, offset: usize) -> Result<GeomKind> {
    Ok(match code {
        1 => GeomKind::Point,
        2 => GeomKind::LineString,
        3 => GeomKind::Polygon,
        4 => GeomKind::MultiPoint,
        5 => GeomKind::MultiLineString,
        6 => GeomKind::MultiPolygon,
        7 => GeomKind::GeometryCollection,
        8 => GeomKind::CircularString,
        9 => GeomKind::CompoundCurve,
        10 => GeomKind::CurvePolygon,
        11 => GeomKind::MultiCurve,
        12 => GeomKind::MultiSurface,
        13 => GeomKind::Triangle,
        14 => GeomKind::PolyhedralSurface,
        15 => GeomKind::Tin,
        other => {
            return Err(Error::from(ParseError::new(
                offset,
                format!("unrecognized TWKB geometry type code {other}"),
            )))
        }
    })
}

/// Packs a signed precision (typically `-7..=7`) into a 4-bit two's
/// complement nibble, as `TYPE_PREC_SET_PREC` does in the source.
pub fn pack_signed_nibble(v: i8) -> u8 {
    (v as u8) & 0x0F
}

pub fn unpack_signed_nibble(n: u8) -> i8 {
    let n = n & 0x0F;
    if n & 0x08 != 0 {
        (n as i8) - 16
    } else {
        n as i8
    }
}

/// Packs an unsigned 0..=7 precision into a 3-bit field, as
/// `HIGHER_DIM_SET_PRECZ`/`HIGHER_DIM_SET_PRECM` do.
pub fn pack_unsigned_3bit(v: u8) -> u8 {
    v & 0x07
}

/// Resolves an Open Question left by §4.9: the real-world TWKB format only
/// ever defines the basic 7 OGC kinds, whose `Multi*` children are always a
/// single implied kind, so a child is written "headerless" (just its body,
/// sharing the parent's delta accumulator). This port's `GeomKind` adds
/// curved and mixed-kind collections (`CompoundCurve`, `CurvePolygon`,
/// `MultiCurve`, `MultiSurface`) whose children are *not* all the same
/// kind -- a headerless child would be undecodable. Those collections (and
/// `GeometryCollection`, which was already headered in the source) get a
/// full nested TWKB geometry (own header, own precision, own accumulator)
/// per child instead. See `DESIGN.md` for the written-down rationale.
pub fn owns_child_header(kind: GeomKind) -> bool {
    matches!(
        kind,
        GeomKind::GeometryCollection
            | GeomKind::CompoundCurve
            | GeomKind::CurvePolygon
            | GeomKind::MultiCurve
            | GeomKind::MultiSurface
    )
}

/// The single implied child kind for a homogeneous `Multi*`/surface
/// collection (every kind for which [`owns_child_header`] is `false`).
pub fn implied_child_kind(parent: GeomKind) -> GeomKind {
    match parent {
        GeomKind::MultiPoint => GeomKind::Point,
        GeomKind::MultiLineString => GeomKind::LineString,
        GeomKind::MultiPolygon => GeomKind::Polygon,
        GeomKind::PolyhedralSurface => GeomKind::Polygon,
        GeomKind::Tin => GeomKind::Triangle,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_code_round_trips_for_every_kind() {
        let kinds = [
            GeomKind::Point,
            GeomKind::LineString,
            GeomKind::Polygon,
            GeomKind::MultiPoint,
            GeomKind::MultiLineString,
            GeomKind::MultiPolygon,
            GeomKind::GeometryCollection,
            GeomKind::CircularString,
            GeomKind::CompoundCurve,
            GeomKind::CurvePolygon,
            GeomKind::MultiCurve,
            GeomKind::MultiSurface,
            GeomKind::Triangle,
            GeomKind::PolyhedralSurface,
            GeomKind::Tin,
        ];
        for kind in kinds {
            let code = twkb_type(kind);
            assert!(code <= 15);
            assert_eq!(kind_from_twkb_type(code, 0).unwrap(), kind);
        }
    }

    #[test]
    fn signed_nibble_round_trips_negative_precision() {
        for v in -7i8..=7 {
            assert_eq!(unpack_signed_nibble(pack_signed_nibble(v)), v);
        }
    }
}
