//! WKB type-word encoding/decoding (§4.7): the base 1..17 geometry codes
//! shared by all three variants, plus the ISO +1000/+2000/+3000 offsets and
//! the Extended (EWKB) `Z`/`M`/`SRID` high-bit flags.

use planargeom_types::error::{Error, ParseError, Result};
use planargeom_types::kind::GeomKind;

pub const EWKB_Z: u32 = 0x8000_0000;
pub const EWKB_M: u32 = 0x4000_0000;
pub const EWKB_SRID: u32 = 0x2000_0000;

pub fn base_code(kind: GeomKind) -> u32 {
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
        GeomKind::PolyhedralSurface => 15,
        GeomKind::Tin => 16,
        GeomKind::Triangle => 17,
    }
}

pub fn kind_from_code(code: u32, offset: usize) -> Result<GeomKind> {
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
        15 => GeomKind::PolyhedralSurface,
        16 => GeomKind::Tin,
        17 => GeomKind::Triangle,
        other => {
            return Err(Error::from(ParseError::new(
                offset,
                format!("unrecognized WKB geometry type code {other}"),
            )))
        }
    })
}

/// Decodes a raw WKB type word into its geometry kind and dimensionality,
/// auto-detecting which of the three variants produced it (§4.7): the
/// Extended flag bits take priority, then the ISO `+1000/+2000/+3000`
/// offset, falling back to a bare SFSQL/ISO-2D base code.
pub fn decode_type_word(word: u32, offset: usize) -> Result<(GeomKind, bool, bool, bool)> {
    let has_srid = word & EWKB_SRID != 0;
    let ext_z = word & EWKB_Z != 0;
    let ext_m = word & EWKB_M != 0;
    if has_srid || ext_z || ext_m {
        let base = word & !(EWKB_Z | EWKB_M | EWKB_SRID);
        let kind = kind_from_code(base, offset)?;
        return Ok((kind, ext_z, ext_m, has_srid));
    }
    let iso_offset = word / 1000;
    let base = word % 1000;
    let (has_z, has_m) = match iso_offset {
        0 => (false, false),
        1 => (true, false),
        2 => (false, true),
        3 => (true, true),
        _ => {
            return Err(Error::from(ParseError::new(
                offset,
                format!("unrecognized WKB type word {word}"),
            )))
        }
    };
    let kind = kind_from_code(base, offset)?;
    Ok((kind, has_z, has_m, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_offset_round_trips() {
        let word = base_code(GeomKind::LineString) + 3000;
        let (kind, has_z, has_m, has_srid) = decode_type_word(word, 0).unwrap();
        assert_eq!(kind, GeomKind::LineString);
        assert!(has_z && has_m && !has_srid);
    }

    #[test]
    fn extended_flags_decode() {
        let word = base_code(GeomKind::Polygon) | EWKB_Z | EWKB_SRID;
        let (kind, has_z, has_m, has_srid) = decode_type_word(word, 0).unwrap();
        assert_eq!(kind, GeomKind::Polygon);
        assert!(has_z && !has_m && has_srid);
    }

    #[test]
    fn plain_base_code_is_2d() {
        let word = base_code(GeomKind::Point);
        let (kind, has_z, has_m, has_srid) = decode_type_word(word, 0).unwrap();
        assert_eq!(kind, GeomKind::Point);
        assert!(!has_z && !has_m && !has_srid);
    }
}
