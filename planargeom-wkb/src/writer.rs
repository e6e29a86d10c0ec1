//! WKB writer: the mirror image of [`crate::reader`], emitting one of the
//! three framings of §4.7. SRID is only ever written at the top level and
//! only for the Extended variant; children of a collection are written as
//! bare sub-geometries (§4.7: "Children of collections are fully-framed
//! WKB sub-geometries without SRID").

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use planargeom_types::error::Result;
use planargeom_types::flags::Flags;
use planargeom_types::geometry::{Geometry, SRID_UNKNOWN};
use planargeom_types::kind::GeomKind;
use planargeom_types::pointarray::PointArray;

use crate::codes::{base_code, EWKB_M, EWKB_SRID, EWKB_Z};
use crate::{Endian, WkbVariant};

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Writer { buf: Vec::new() }
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.write_u8(v).expect("writing to Vec<u8> cannot fail");
    }

    fn write_u32(&mut self, endian: Endian, v: u32) {
        match endian {
            Endian::Big => self.buf.write_u32::<BigEndian>(v),
            Endian::Little => self.buf.write_u32::<LittleEndian>(v),
        }
        .expect("writing to Vec<u8> cannot fail");
    }

    fn write_i32(&mut self, endian: Endian, v: i32) {
        match endian {
            Endian::Big => self.buf.write_i32::<BigEndian>(v),
            Endian::Little => self.buf.write_i32::<LittleEndian>(v),
        }
        .expect("writing to Vec<u8> cannot fail");
    }

    fn write_f64(&mut self, endian: Endian, v: f64) {
        match endian {
            Endian::Big => self.buf.write_f64::<BigEndian>(v),
            Endian::Little => self.buf.write_f64::<LittleEndian>(v),
        }
        .expect("writing to Vec<u8> cannot fail");
    }

    fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }
}

fn write_endian_byte(w: &mut Writer, endian: Endian) {
    w.write_u8(match endian {
        Endian::Big => 0,
        Endian::Little => 1,
    });
}

/// Encodes `geom` as WKB in the requested variant. `endian` defaults to the
/// platform's native order when `None` (matching the reader's bulk-copy
/// fast path, which only triggers on a native-order buffer).
pub fn to_wkb(geom: &Geometry, variant: WkbVariant, endian: Option<Endian>) -> Result<Vec<u8>> {
    let endian = endian.unwrap_or_else(Endian::native);
    let mut w = Writer::new();
    write_geometry(&mut w, geom, variant, endian, true)?;
    Ok(w.buf)
}

fn output_flags(flags: Flags, variant: WkbVariant) -> Flags {
    match variant {
        WkbVariant::Sfsql => Flags::XY,
        _ => Flags::new(flags.has_z, flags.has_m),
    }
}

fn type_word(kind: GeomKind, out_flags: Flags, variant: WkbVariant, with_srid: bool) -> u32 {
    let base = base_code(kind);
    match variant {
        WkbVariant::Sfsql => base,
        WkbVariant::Iso => {
            let offset = match (out_flags.has_z, out_flags.has_m) {
                (false, false) => 0,
                (true, false) => 1000,
                (false, true) => 2000,
                (true, true) => 3000,
            };
            base + offset
        }
        WkbVariant::Extended => {
            let mut word = base;
            if out_flags.has_z {
                word |= EWKB_Z;
            }
            if out_flags.has_m {
                word |= EWKB_M;
            }
            if with_srid {
                word |= EWKB_SRID;
            }
            word
        }
    }
}

fn write_geometry(w: &mut Writer, geom: &Geometry, variant: WkbVariant, endian: Endian, top_level: bool) -> Result<()> {
    let header = geom.header();
    let kind = geom.kind();
    let out_flags = output_flags(header.flags, variant);
    let with_srid = top_level && variant == WkbVariant::Extended && header.srid != SRID_UNKNOWN;

    write_endian_byte(w, endian);
    w.write_u32(endian, type_word(kind, out_flags, variant, with_srid));
    if with_srid {
        w.write_i32(endian, header.srid);
    }

    match geom {
        Geometry::Point { points, .. } => write_point(w, points, out_flags, endian),
        Geometry::LineString { points, .. } | Geometry::CircularString { points, .. } => {
            write_linestring(w, points, out_flags, endian)
        }
        Geometry::Triangle { points, .. } => {
            w.write_u32(endian, if points.is_empty() { 0 } else { 1 });
            if !points.is_empty() {
                write_ring(w, points, out_flags, endian);
            }
        }
        Geometry::Polygon { rings, .. } => {
            w.write_u32(endian, rings.len() as u32);
            for ring in rings {
                write_ring(w, ring, out_flags, endian);
            }
        }
        _ => {
            let children = geom.children();
            w.write_u32(endian, children.len() as u32);
            for child in children {
                write_geometry(w, child, variant, endian, false)?;
            }
        }
    }
    Ok(())
}

/// A point's payload has no `npoints` prefix, so an empty `Point` can't
/// carry a zero-length marker the way the other geometry kinds do. It is
/// instead written as an all-NaN coordinate, the sentinel PostGIS and most
/// real-world WKB readers already treat as "empty point" (§4.7).
fn write_point(w: &mut Writer, points: &PointArray, out_flags: Flags, endian: Endian) {
    let c = if points.is_empty() {
        planargeom_types::coord::Coord4::xyzm(f64::NAN, f64::NAN, f64::NAN, f64::NAN)
    } else {
        points.get_point(0)
    };
    w.write_f64(endian, c.x);
    w.write_f64(endian, c.y);
    if out_flags.has_z {
        w.write_f64(endian, c.z);
    }
    if out_flags.has_m {
        w.write_f64(endian, c.m);
    }
}

fn write_linestring(w: &mut Writer, points: &PointArray, out_flags: Flags, endian: Endian) {
    w.write_u32(endian, points.npoints() as u32);
    write_ring(w, points, out_flags, endian);
}

/// Bulk-copy fast path (§4.7): when the requested endian is native and the
/// output dimensionality matches the array's own, the raw `f64` buffer is
/// copied byte-for-byte instead of re-serialized `Coord4` by `Coord4`.
fn write_ring(w: &mut Writer, points: &PointArray, out_flags: Flags, endian: Endian) {
    if points.is_empty() {
        return;
    }
    if endian == Endian::native() && out_flags == points.flags() {
        for v in points.raw() {
            w.write_raw(&v.to_ne_bytes());
        }
        return;
    }
    for c in points.iter() {
        w.write_f64(endian, c.x);
        w.write_f64(endian, c.y);
        if out_flags.has_z {
            w.write_f64(endian, c.z);
        }
        if out_flags.has_m {
            w.write_f64(endian, c.m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::from_wkb;
    use planargeom_types::coord::Coord4;
    use planargeom_types::geometry::Header;

    #[test]
    fn sfsql_drops_z() {
        let points = PointArray::from_coords(Flags::XYZ, &[Coord4::xyz(1.0, 2.0, 3.0)]);
        let geom = Geometry::Point {
            header: Header::new(Flags::XYZ, SRID_UNKNOWN),
            points,
        };
        let bytes = to_wkb(&geom, WkbVariant::Sfsql, Some(Endian::Little)).unwrap();
        assert_eq!(bytes[1..5], base_code(GeomKind::Point).to_le_bytes());
        let back = from_wkb(&bytes).unwrap();
        assert!(!back.header().flags.has_z);
    }

    #[test]
    fn iso_offset_encodes_z() {
        let points = PointArray::from_coords(Flags::XYZ, &[Coord4::xyz(1.0, 2.0, 3.0)]);
        let geom = Geometry::Point {
            header: Header::new(Flags::XYZ, SRID_UNKNOWN),
            points,
        };
        let bytes = to_wkb(&geom, WkbVariant::Iso, Some(Endian::Little)).unwrap();
        let word = u32::from_le_bytes(bytes[1..5].try_into().unwrap());
        assert_eq!(word, base_code(GeomKind::Point) + 1000);
    }

    #[test]
    fn extended_emits_srid_only_at_top_level() {
        let inner = Geometry::Point {
            header: Header::new(Flags::XY, 4326),
            points: PointArray::from_coords(Flags::XY, &[Coord4::xy(1.0, 1.0)]),
        };
        let mut geom = Geometry::empty_collection(GeomKind::MultiPoint, 4326, Flags::XY).unwrap();
        geom.add_geom(inner).unwrap();
        let bytes = to_wkb(&geom, WkbVariant::Extended, Some(Endian::Little)).unwrap();
        let back = from_wkb(&bytes).unwrap();
        assert_eq!(back.header().srid, 4326);
        assert_eq!(back.children()[0].header().srid, 4326);
    }

    #[test]
    fn empty_point_round_trips() {
        let geom = Geometry::empty_point(SRID_UNKNOWN, Flags::XY);
        let bytes = to_wkb(&geom, WkbVariant::Extended, Some(Endian::Little)).unwrap();
        let back = from_wkb(&bytes).unwrap();
        match back {
            Geometry::Point { points, .. } => assert!(points.is_empty()),
            _ => panic!("expected point"),
        }
    }
}
