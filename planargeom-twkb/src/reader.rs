//! TWKB reader: the dual of [`crate::writer`]. Self-describing except for
//! the id-list's contents, which this port's `Geometry` model has nowhere
//! to keep -- they are parsed (to stay byte-aligned with the rest of the
//! stream) and discarded, matching how `original_source/rtin_twkb.c`
//! treats an id list when the caller didn't ask to keep it.

use planargeom_types::coord::Coord4;
use planargeom_types::error::{Error, ParseError, Result};
use planargeom_types::flags::Flags;
use planargeom_types::gbox::GBox;
use planargeom_types::geometry::{Geometry, Header, SRID_UNKNOWN};
use planargeom_types::kind::GeomKind;
use planargeom_types::pointarray::PointArray;

use crate::header::{implied_child_kind, kind_from_twkb_type, owns_child_header, unpack_signed_nibble, FLAG_BBOX, FLAG_EMPTY, FLAG_EXTENDED, FLAG_IDLIST, FLAG_SIZE};
use crate::varint::{read_svarint, read_uvarint};

#[derive(Debug, Clone, Copy)]
struct Precision {
    xy: i8,
    z: u8,
    m: u8,
}

impl Precision {
    fn factor_xy(self) -> f64 {
        10f64.powi(self.xy as i32)
    }
    fn factor_z(self) -> f64 {
        10f64.powi(self.z as i32)
    }
    fn factor_m(self) -> f64 {
        10f64.powi(self.m as i32)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Accum {
    x: i64,
    y: i64,
    z: i64,
    m: i64,
}

/// Parses a complete TWKB geometry from the start of `bytes`. Trailing
/// bytes after a geometry are not flagged as an error -- callers reading a
/// stream of concatenated geometries are expected to track their own
/// offsets the way [`from_twkb_prefix`] does.
pub fn from_twkb(bytes: &[u8]) -> Result<Geometry> {
    let mut pos = 0;
    let geom = decode_top_level(bytes, &mut pos)?;
    Ok(geom)
}

/// Parses one TWKB geometry starting at `*pos`, advancing `*pos` past it.
/// Useful for a caller that packs several TWKB geometries back to back.
pub fn from_twkb_prefix(bytes: &[u8], pos: &mut usize) -> Result<Geometry> {
    decode_top_level(bytes, pos)
}

fn err_at(pos: usize, message: impl Into<String>) -> Error {
    ParseError::new(pos, message.into()).into()
}

fn read_u8(bytes: &[u8], pos: &mut usize) -> Result<u8> {
    let b = *bytes.get(*pos).ok_or_else(|| err_at(*pos, "truncated TWKB header"))?;
    *pos += 1;
    Ok(b)
}

fn decode_top_level(bytes: &[u8], pos: &mut usize) -> Result<Geometry> {
    let header_byte = read_u8(bytes, pos)?;
    let type_code = header_byte & 0x0F;
    let precision_xy = unpack_signed_nibble((header_byte >> 4) & 0x0F);
    let kind = kind_from_twkb_type(type_code, *pos)?;

    let metadata = read_u8(bytes, pos)?;
    let has_bbox = metadata & FLAG_BBOX != 0;
    let has_size = metadata & FLAG_SIZE != 0;
    let has_idlist = metadata & FLAG_IDLIST != 0;
    let has_extended = metadata & FLAG_EXTENDED != 0;
    let is_empty = metadata & FLAG_EMPTY != 0;

    let (has_z, has_m, prec_z, prec_m) = if has_extended {
        let ext = read_u8(bytes, pos)?;
        (ext & 0x01 != 0, ext & 0x02 != 0, (ext >> 2) & 0x07, (ext >> 5) & 0x07)
    } else {
        (false, false, 0, 0)
    };
    let flags = Flags::new(has_z, has_m);
    let prec = Precision {
        xy: precision_xy,
        z: prec_z,
        m: prec_m,
    };

    if is_empty {
        return build_empty(kind, flags);
    }

    let bbox = if has_bbox {
        Some(read_bbox(bytes, pos, flags, prec)?)
    } else {
        None
    };

    let declared_size = if has_size {
        Some(read_uvarint(bytes, pos, "TWKB size field")? as usize)
    } else {
        None
    };
    let body_start = *pos;

    let mut accum = Accum::default();
    let mut geom = decode_body(bytes, pos, kind, flags, prec, &mut accum, has_idlist)?;

    if let Some(declared) = declared_size {
        let consumed = *pos - body_start;
        if consumed != declared {
            return Err(err_at(
                *pos,
                format!("TWKB size field declared {declared} bytes but body consumed {consumed}"),
            ));
        }
    }

    if let Some(bbox) = bbox {
        geom.header_mut().bbox = Some(bbox);
    }
    Ok(geom)
}

fn build_empty(kind: GeomKind, flags: Flags) -> Result<Geometry> {
    Ok(match kind {
        GeomKind::Point => Geometry::empty_point(SRID_UNKNOWN, flags),
        GeomKind::LineString => Geometry::empty_line_string(SRID_UNKNOWN, flags),
        GeomKind::CircularString => Geometry::CircularString {
            header: Header::new(flags, SRID_UNKNOWN),
            points: PointArray::empty(flags, 0),
        },
        GeomKind::Polygon => Geometry::Polygon {
            header: Header::new(flags, SRID_UNKNOWN),
            rings: Vec::new(),
        },
        GeomKind::Triangle => Geometry::Triangle {
            header: Header::new(flags, SRID_UNKNOWN),
            points: PointArray::empty(flags, 0),
        },
        other if other.is_collection() => Geometry::empty_collection(other, SRID_UNKNOWN, flags)?,
        other => return Err(Error::unsupported("from_twkb (empty)", other.name())),
    })
}

fn read_bbox(bytes: &[u8], pos: &mut usize, flags: Flags, prec: Precision) -> Result<GBox> {
    let mut b = GBox::empty(flags);
    let (xmin, xmax) = read_bbox_axis(bytes, pos, prec.factor_xy())?;
    let (ymin, ymax) = read_bbox_axis(bytes, pos, prec.factor_xy())?;
    b.xmin = xmin;
    b.xmax = xmax;
    b.ymin = ymin;
    b.ymax = ymax;
    if flags.has_z {
        let (zmin, zmax) = read_bbox_axis(bytes, pos, prec.factor_z())?;
        b.zmin = zmin;
        b.zmax = zmax;
    }
    if flags.has_m {
        let (mmin, mmax) = read_bbox_axis(bytes, pos, prec.factor_m())?;
        b.mmin = mmin;
        b.mmax = mmax;
    }
    Ok(b)
}

fn read_bbox_axis(bytes: &[u8], pos: &mut usize, factor: f64) -> Result<(f64, f64)> {
    let min_scaled = read_svarint(bytes, pos, "TWKB bbox min")?;
    let extent_scaled = read_svarint(bytes, pos, "TWKB bbox extent")?;
    let min = min_scaled as f64 / factor;
    let max = (min_scaled + extent_scaled) as f64 / factor;
    Ok((min, max))
}

fn decode_body(
    bytes: &[u8],
    pos: &mut usize,
    kind: GeomKind,
    flags: Flags,
    prec: Precision,
    accum: &mut Accum,
    has_idlist: bool,
) -> Result<Geometry> {
    match kind {
        GeomKind::Point => {
            let c = read_coord(bytes, pos, flags, prec, accum)?;
            Ok(Geometry::Point {
                header: Header::new(flags, SRID_UNKNOWN),
                points: PointArray::from_coords(flags, &[c]),
            })
        }
        GeomKind::LineString | GeomKind::CircularString => {
            let points = read_point_array(bytes, pos, flags, prec, accum)?;
            Ok(match kind {
                GeomKind::CircularString => Geometry::CircularString {
                    header: Header::new(flags, SRID_UNKNOWN),
                    points,
                },
                _ => Geometry::LineString {
                    header: Header::new(flags, SRID_UNKNOWN),
                    points,
                },
            })
        }
        GeomKind::Triangle => {
            let nrings = read_uvarint(bytes, pos, "TWKB triangle ring count")?;
            let points = if nrings == 0 {
                PointArray::empty(flags, 0)
            } else {
                read_point_array(bytes, pos, flags, prec, accum)?
            };
            Ok(Geometry::Triangle {
                header: Header::new(flags, SRID_UNKNOWN),
                points,
            })
        }
        GeomKind::Polygon => {
            let nrings = read_uvarint(bytes, pos, "TWKB ring count")? as usize;
            let mut rings = Vec::with_capacity(nrings);
            for _ in 0..nrings {
                rings.push(read_point_array(bytes, pos, flags, prec, accum)?);
            }
            Ok(Geometry::Polygon {
                header: Header::new(flags, SRID_UNKNOWN),
                rings,
            })
        }
        other => {
            let nchildren = read_uvarint(bytes, pos, "TWKB child count")? as usize;
            if has_idlist {
                for _ in 0..nchildren {
                    read_svarint(bytes, pos, "TWKB id list entry")?;
                }
            }
            let mut collection = Geometry::empty_collection(other, SRID_UNKNOWN, flags)?;
            let child_kind = implied_child_kind(other);
            for _ in 0..nchildren {
                let child = if owns_child_header(other) {
                    decode_top_level(bytes, pos)?
                } else {
                    decode_body(bytes, pos, child_kind, flags, prec, accum, false)?
                };
                collection.add_geom(child)?;
            }
            Ok(collection)
        }
    }
}

fn read_point_array(bytes: &[u8], pos: &mut usize, flags: Flags, prec: Precision, accum: &mut Accum) -> Result<PointArray> {
    let npoints = read_uvarint(bytes, pos, "TWKB point count")? as usize;
    let mut coords = Vec::with_capacity(npoints);
    for _ in 0..npoints {
        coords.push(read_coord(bytes, pos, flags, prec, accum)?);
    }
    Ok(PointArray::from_coords(flags, &coords))
}

fn read_coord(bytes: &[u8], pos: &mut usize, flags: Flags, prec: Precision, accum: &mut Accum) -> Result<Coord4> {
    accum.x += read_svarint(bytes, pos, "TWKB x delta")?;
    accum.y += read_svarint(bytes, pos, "TWKB y delta")?;
    let z = if flags.has_z {
        accum.z += read_svarint(bytes, pos, "TWKB z delta")?;
        accum.z as f64 / prec.factor_z()
    } else {
        0.0
    };
    let m = if flags.has_m {
        accum.m += read_svarint(bytes, pos, "TWKB m delta")?;
        accum.m as f64 / prec.factor_m()
    } else {
        0.0
    };
    Ok(Coord4 {
        x: accum.x as f64 / prec.factor_xy(),
        y: accum.y as f64 / prec.factor_xy(),
        z,
        m,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{to_twkb, TwkbOptions};

    #[test]
    fn round_trips_simple_point() {
        let geom = Geometry::Point {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points: PointArray::from_coords(Flags::XY, &[Coord4::xy(1.5, -2.25)]),
        };
        let bytes = to_twkb(&geom, &TwkbOptions::with_precision(2)).unwrap();
        let back = from_twkb(&bytes).unwrap();
        match back {
            Geometry::Point { points, .. } => {
                assert_eq!(points.get_point(0).x, 1.5);
                assert_eq!(points.get_point(0).y, -2.25);
            }
            _ => panic!("expected point"),
        }
    }

    #[test]
    fn round_trips_empty_linestring() {
        let geom = Geometry::empty_line_string(SRID_UNKNOWN, Flags::XY);
        let bytes = to_twkb(&geom, &TwkbOptions::default()).unwrap();
        let back = from_twkb(&bytes).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.kind(), GeomKind::LineString);
    }

    #[test]
    fn rejects_unrecognized_type_code() {
        let bad = vec![0x00, FLAG_EMPTY]; // type nibble 0 is unused
        assert!(from_twkb(&bad).is_err());
    }
}
