//! WKB reader: parses the `u8 endian / u32 type / [u32 srid] / payload`
//! framing of §4.7, auto-detecting the variant from the type word via
//! [`crate::codes::decode_type_word`] rather than requiring the caller to
//! know it in advance (a WKB buffer is self-describing).

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::Cursor;

use planargeom_types::coord::Coord4;
use planargeom_types::error::{Error, ParseError, Result};
use planargeom_types::flags::Flags;
use planargeom_types::geometry::{Geometry, Header, SRID_UNKNOWN};
use planargeom_types::kind::GeomKind;
use planargeom_types::pointarray::PointArray;

use crate::codes::decode_type_word;
use crate::Endian;

struct Reader<'a> {
    cur: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { cur: Cursor::new(buf) }
    }

    fn pos(&self) -> usize {
        self.cur.position() as usize
    }

    fn err(&self, message: impl Into<String>) -> Error {
        ParseError::new(self.pos(), message.into()).into()
    }

    fn read_u8(&mut self) -> Result<u8> {
        let pos = self.pos();
        self.cur.read_u8().map_err(|e| Error::from(ParseError::new(pos, e.to_string())))
    }

    fn read_u32(&mut self, endian: Endian) -> Result<u32> {
        let pos = self.pos();
        let r = match endian {
            Endian::Big => self.cur.read_u32::<BigEndian>(),
            Endian::Little => self.cur.read_u32::<LittleEndian>(),
        };
        r.map_err(|e| Error::from(ParseError::new(pos, e.to_string())))
    }

    fn read_i32(&mut self, endian: Endian) -> Result<i32> {
        let pos = self.pos();
        let r = match endian {
            Endian::Big => self.cur.read_i32::<BigEndian>(),
            Endian::Little => self.cur.read_i32::<LittleEndian>(),
        };
        r.map_err(|e| Error::from(ParseError::new(pos, e.to_string())))
    }

    fn read_f64(&mut self, endian: Endian) -> Result<f64> {
        let pos = self.pos();
        let r = match endian {
            Endian::Big => self.cur.read_f64::<BigEndian>(),
            Endian::Little => self.cur.read_f64::<LittleEndian>(),
        };
        r.map_err(|e| Error::from(ParseError::new(pos, e.to_string())))
    }

    fn remaining_slice(&self) -> &'a [u8] {
        let pos = self.cur.position() as usize;
        &self.cur.get_ref()[pos..]
    }

    fn advance(&mut self, n: usize) {
        self.cur.set_position(self.cur.position() + n as u64);
    }
}

fn read_endian(r: &mut Reader) -> Result<Endian> {
    match r.read_u8()? {
        0 => Ok(Endian::Big),
        1 => Ok(Endian::Little),
        other => Err(r.err(format!("invalid WKB byte-order flag {other}"))),
    }
}

/// Parses a complete WKB geometry, including a possible top-level SRID
/// (§4.7). Children of a collection never carry their own SRID on the
/// wire, matching the writer.
pub fn from_wkb(bytes: &[u8]) -> Result<Geometry> {
    let mut r = Reader::new(bytes);
    read_geometry(&mut r, SRID_UNKNOWN, true)
}

fn read_geometry(r: &mut Reader, inherited_srid: i32, top_level: bool) -> Result<Geometry> {
    let endian = read_endian(r)?;
    let type_pos = r.pos();
    let type_word = r.read_u32(endian)?;
    let (kind, has_z, has_m, has_srid) = decode_type_word(type_word, type_pos)?;

    let srid = if has_srid && top_level {
        r.read_i32(endian)?
    } else {
        inherited_srid
    };
    let flags = Flags::new(has_z, has_m);
    let header = Header::new(flags, srid);

    match kind {
        GeomKind::Point => read_point(r, endian, flags, header),
        GeomKind::LineString | GeomKind::CircularString => {
            read_linestring(r, endian, flags, header, kind)
        }
        GeomKind::Polygon | GeomKind::Triangle => read_polygon(r, endian, flags, header, kind),
        _ if kind.is_collection() => read_collection(r, endian, header, kind, srid),
        _ => Err(r.err(format!("unsupported WKB geometry kind {kind}"))),
    }
}

fn read_coord(r: &mut Reader, endian: Endian, flags: Flags) -> Result<Coord4> {
    let x = r.read_f64(endian)?;
    let y = r.read_f64(endian)?;
    let z = if flags.has_z { r.read_f64(endian)? } else { 0.0 };
    let m = if flags.has_m { r.read_f64(endian)? } else { 0.0 };
    Ok(Coord4 { x, y, z, m })
}

fn read_point(r: &mut Reader, endian: Endian, flags: Flags, header: Header) -> Result<Geometry> {
    let c = read_coord(r, endian, flags)?;
    let points = if c.x.is_nan() && c.y.is_nan() {
        PointArray::empty(flags, 0)
    } else {
        PointArray::from_coords(flags, &[c])
    };
    Ok(Geometry::Point { header, points })
}

/// Bulk-copy fast path (§4.7): when the on-wire dimensionality matches
/// `flags` and the buffer is already in native byte order, the coordinate
/// payload is a raw `f64` array and can be copied straight into the
/// backing buffer instead of being re-assembled `Coord4` by `Coord4`.
fn read_coords_bulk(r: &mut Reader, endian: Endian, flags: Flags, npoints: usize) -> Result<PointArray> {
    let stride = flags.stride();
    let nbytes = npoints * stride * 8;
    if endian == Endian::native() {
        let slice = r.remaining_slice();
        if slice.len() < nbytes {
            return Err(r.err("truncated coordinate payload"));
        }
        let mut raw = Vec::with_capacity(npoints * stride);
        for chunk in slice[..nbytes].chunks_exact(8) {
            raw.push(f64::from_ne_bytes(chunk.try_into().unwrap()));
        }
        r.advance(nbytes);
        return PointArray::from_raw(flags, raw);
    }
    let mut coords = Vec::with_capacity(npoints);
    for _ in 0..npoints {
        coords.push(read_coord(r, endian, flags)?);
    }
    Ok(PointArray::from_coords(flags, &coords))
}

fn read_ring_count_prefixed(r: &mut Reader, endian: Endian, flags: Flags) -> Result<PointArray> {
    let npoints = r.read_u32(endian)? as usize;
    read_coords_bulk(r, endian, flags, npoints)
}

fn read_linestring(r: &mut Reader, endian: Endian, flags: Flags, header: Header, kind: GeomKind) -> Result<Geometry> {
    let points = read_ring_count_prefixed(r, endian, flags)?;
    Ok(match kind {
        GeomKind::CircularString => Geometry::CircularString { header, points },
        _ => Geometry::LineString { header, points },
    })
}

fn read_polygon(r: &mut Reader, endian: Endian, flags: Flags, header: Header, kind: GeomKind) -> Result<Geometry> {
    let nrings = r.read_u32(endian)? as usize;
    let mut rings = Vec::with_capacity(nrings);
    for _ in 0..nrings {
        rings.push(read_ring_count_prefixed(r, endian, flags)?);
    }
    Ok(match kind {
        GeomKind::Triangle => Geometry::Triangle {
            header,
            points: rings.into_iter().next().unwrap_or_else(|| PointArray::empty(flags, 0)),
        },
        _ => Geometry::Polygon { header, rings },
    })
}

fn read_collection(r: &mut Reader, endian: Endian, header: Header, kind: GeomKind, srid: i32) -> Result<Geometry> {
    let ngeoms = r.read_u32(endian)? as usize;
    let mut out = Geometry::empty_collection(kind, srid, header.flags)?;
    for _ in 0..ngeoms {
        let child = read_geometry(r, srid, false)?;
        out.add_geom(child)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::to_wkb;
    use crate::WkbVariant;

    fn le_header(code: u32) -> Vec<u8> {
        let mut v = vec![1u8];
        v.extend_from_slice(&code.to_le_bytes());
        v
    }

    #[test]
    fn reads_plain_2d_point() {
        let mut buf = le_header(1);
        buf.extend_from_slice(&1.5f64.to_le_bytes());
        buf.extend_from_slice(&2.5f64.to_le_bytes());
        let geom = from_wkb(&buf).unwrap();
        match geom {
            Geometry::Point { points, .. } => {
                assert_eq!(points.npoints(), 1);
                assert_eq!(points.raw(), &[1.5, 2.5]);
            }
            _ => panic!("expected point"),
        }
    }

    #[test]
    fn reads_empty_point_as_nan_sentinel() {
        let mut buf = le_header(1);
        buf.extend_from_slice(&f64::NAN.to_le_bytes());
        buf.extend_from_slice(&f64::NAN.to_le_bytes());
        let geom = from_wkb(&buf).unwrap();
        match geom {
            Geometry::Point { points, .. } => assert_eq!(points.npoints(), 0),
            _ => panic!("expected point"),
        }
    }

    #[test]
    fn rejects_unknown_type_code() {
        let buf = le_header(999);
        assert!(from_wkb(&buf).is_err());
    }

    #[test]
    fn rejects_truncated_buffer() {
        let buf = le_header(1);
        assert!(from_wkb(&buf).is_err());
    }

    #[test]
    fn round_trips_through_writer_for_linestring() {
        use planargeom_types::coord::Coord4;
        let points = PointArray::from_coords(
            Flags::XY,
            &[Coord4::xy(0.0, 0.0), Coord4::xy(1.0, 1.0), Coord4::xy(2.0, 0.0)],
        );
        let geom = Geometry::LineString {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points,
        };
        let bytes = to_wkb(&geom, WkbVariant::Extended, None).unwrap();
        let back = from_wkb(&bytes).unwrap();
        match back {
            Geometry::LineString { points, .. } => assert_eq!(points.raw(), &[0.0, 0.0, 1.0, 1.0, 2.0, 0.0]),
            _ => panic!("expected linestring"),
        }
    }

    #[test]
    fn round_trips_srid_on_extended_variant() {
        let geom = Geometry::Point {
            header: Header::new(Flags::XY, 4326),
            points: PointArray::from_coords(Flags::XY, &[planargeom_types::coord::Coord4::xy(1.0, 2.0)]),
        };
        let bytes = to_wkb(&geom, WkbVariant::Extended, None).unwrap();
        let back = from_wkb(&bytes).unwrap();
        assert_eq!(back.header().srid, 4326);
    }
}
