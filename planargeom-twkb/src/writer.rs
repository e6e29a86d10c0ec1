//! TWKB writer (§4.9): header/metadata/[extended-precision] bytes, then an
//! optional bbox, optional size, optional id-list, and finally the
//! delta-varint coordinate stream.
//!
//! Grounded on `original_source/rtout_twkb.h`'s `TWKB_GLOBALS`/`TWKB_STATE`
//! split: `TwkbOptions` below is the "set once at the start" globals, the
//! `Accum` is the per-dimension running delta the source calls
//! `accum_rels`.

use planargeom_types::coord::Coord4;
use planargeom_types::error::Result;
use planargeom_types::flags::Flags;
use planargeom_types::geometry::Geometry;
use planargeom_types::pointarray::PointArray;

use crate::header::{
    owns_child_header, pack_signed_nibble, pack_unsigned_3bit, twkb_type, FLAG_BBOX, FLAG_EMPTY, FLAG_EXTENDED,
    FLAG_IDLIST, FLAG_SIZE,
};
use crate::varint::{write_svarint, write_uvarint};

/// Encode-time options (§4.9 header fields). `precision_xy` is the signed
/// decimal scale applied to x/y; `precision_z`/`precision_m` are the
/// unsigned 0..=7 scale applied to z/m when present.
#[derive(Debug, Clone)]
pub struct TwkbOptions {
    pub precision_xy: i8,
    pub precision_z: u8,
    pub precision_m: u8,
    pub include_bbox: bool,
    pub include_size: bool,
    /// Id list for a top-level collection's immediate children (§4.9). Only
    /// consulted when the top-level geometry is a collection kind; its
    /// length must equal the child count or encoding fails.
    pub ids: Option<Vec<i64>>,
}

impl Default for TwkbOptions {
    fn default() -> Self {
        TwkbOptions {
            precision_xy: 5,
            precision_z: 0,
            precision_m: 0,
            include_bbox: false,
            include_size: false,
            ids: None,
        }
    }
}

impl TwkbOptions {
    pub fn with_precision(precision_xy: i8) -> Self {
        TwkbOptions {
            precision_xy,
            ..Default::default()
        }
    }

    fn factor_xy(&self) -> f64 {
        10f64.powi(self.precision_xy as i32)
    }

    fn factor_z(&self) -> f64 {
        10f64.powi(self.precision_z as i32)
    }

    fn factor_m(&self) -> f64 {
        10f64.powi(self.precision_m as i32)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Accum {
    x: i64,
    y: i64,
    z: i64,
    m: i64,
}

impl Accum {
    fn delta_x(&mut self, scaled: i64) -> i64 {
        let d = scaled - self.x;
        self.x = scaled;
        d
    }
    fn delta_y(&mut self, scaled: i64) -> i64 {
        let d = scaled - self.y;
        self.y = scaled;
        d
    }
    fn delta_z(&mut self, scaled: i64) -> i64 {
        let d = scaled - self.z;
        self.z = scaled;
        d
    }
    fn delta_m(&mut self, scaled: i64) -> i64 {
        let d = scaled - self.m;
        self.m = scaled;
        d
    }
}

fn scale_round(value: f64, factor: f64) -> i64 {
    (value * factor).round() as i64
}

/// Encodes `geom` to TWKB. `opts.ids` is only meaningful when `geom` is a
/// collection kind; it is silently ignored otherwise (the header's
/// `has_idlist` bit is only ever set for collection-like top-level kinds).
pub fn to_twkb(geom: &Geometry, opts: &TwkbOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_top_level(geom, opts, &mut out)?;
    Ok(out)
}

fn encode_top_level(geom: &Geometry, opts: &TwkbOptions, out: &mut Vec<u8>) -> Result<()> {
    let flags = geom.flags();
    let kind = geom.kind();
    let is_empty = geom.is_empty();
    let has_extended = flags.has_z || flags.has_m;
    let has_idlist = opts.ids.is_some() && kind.is_collection() && !is_empty;
    let has_bbox = opts.include_bbox && !is_empty;

    let header_byte = (twkb_type(kind) & 0x0F) | (pack_signed_nibble(opts.precision_xy) << 4);
    out.push(header_byte);

    let mut metadata = 0u8;
    if has_bbox {
        metadata |= FLAG_BBOX;
    }
    if opts.include_size && !is_empty {
        metadata |= FLAG_SIZE;
    }
    if has_idlist {
        metadata |= FLAG_IDLIST;
    }
    if has_extended {
        metadata |= FLAG_EXTENDED;
    }
    if is_empty {
        metadata |= FLAG_EMPTY;
    }
    out.push(metadata);

    if has_extended {
        let mut ext = 0u8;
        if flags.has_z {
            ext |= 0x01;
        }
        if flags.has_m {
            ext |= 0x02;
        }
        ext |= pack_unsigned_3bit(opts.precision_z) << 2;
        ext |= pack_unsigned_3bit(opts.precision_m) << 5;
        out.push(ext);
    }

    if is_empty {
        return Ok(());
    }

    let mut rest = Vec::new();
    if has_bbox {
        write_bbox(geom, flags, opts, &mut rest);
    }

    let mut tail = Vec::new();
    let mut accum = Accum::default();
    let ids = if has_idlist { opts.ids.as_deref() } else { None };
    encode_body(geom, flags, opts, &mut accum, &mut tail, ids)?;

    if opts.include_size {
        write_uvarint(&mut rest, tail.len() as u64);
        rest.extend_from_slice(&tail);
    } else {
        rest.extend_from_slice(&tail);
    }

    out.extend_from_slice(&rest);
    Ok(())
}

fn write_bbox(geom: &Geometry, flags: Flags, opts: &TwkbOptions, out: &mut Vec<u8>) {
    let bbox = geom.compute_bbox();
    write_bbox_axis(out, bbox.xmin, bbox.xmax, opts.factor_xy());
    write_bbox_axis(out, bbox.ymin, bbox.ymax, opts.factor_xy());
    if flags.has_z {
        write_bbox_axis(out, bbox.zmin, bbox.zmax, opts.factor_z());
    }
    if flags.has_m {
        write_bbox_axis(out, bbox.mmin, bbox.mmax, opts.factor_m());
    }
}

fn write_bbox_axis(out: &mut Vec<u8>, min: f64, max: f64, factor: f64) {
    let min_scaled = scale_round(min, factor);
    let extent_scaled = scale_round(max, factor) - min_scaled;
    write_svarint(out, min_scaled);
    write_svarint(out, extent_scaled);
}

fn encode_body(
    geom: &Geometry,
    flags: Flags,
    opts: &TwkbOptions,
    accum: &mut Accum,
    out: &mut Vec<u8>,
    ids: Option<&[i64]>,
) -> Result<()> {
    match geom {
        Geometry::Point { points, .. } => {
            if !points.is_empty() {
                write_coord(out, points.get_point(0), flags, opts, accum);
            }
            Ok(())
        }
        Geometry::LineString { points, .. } | Geometry::CircularString { points, .. } => {
            write_point_array(out, points, flags, opts, accum);
            Ok(())
        }
        Geometry::Triangle { points, .. } => {
            write_uvarint(out, if points.is_empty() { 0 } else { 1 });
            if !points.is_empty() {
                write_point_array(out, points, flags, opts, accum);
            }
            Ok(())
        }
        Geometry::Polygon { rings, .. } => {
            write_uvarint(out, rings.len() as u64);
            for ring in rings {
                write_point_array(out, ring, flags, opts, accum);
            }
            Ok(())
        }
        _ => {
            let kind = geom.kind();
            let children = geom.children();
            write_uvarint(out, children.len() as u64);
            if let Some(ids) = ids {
                if ids.len() != children.len() {
                    return Err(planargeom_types::error::Error::invalid(format!(
                        "TWKB id list has {} entries but geometry has {} children",
                        ids.len(),
                        children.len()
                    )));
                }
                for &id in ids {
                    write_svarint(out, id);
                }
            }
            for child in children {
                if owns_child_header(kind) {
                    encode_top_level(child, opts, out)?;
                } else {
                    encode_body(child, flags, opts, accum, out, None)?;
                }
            }
            Ok(())
        }
    }
}

fn write_point_array(out: &mut Vec<u8>, points: &PointArray, flags: Flags, opts: &TwkbOptions, accum: &mut Accum) {
    write_uvarint(out, points.npoints() as u64);
    for c in points.iter() {
        write_coord(out, c, flags, opts, accum);
    }
}

fn write_coord(out: &mut Vec<u8>, c: Coord4, flags: Flags, opts: &TwkbOptions, accum: &mut Accum) {
    let xs = scale_round(c.x, opts.factor_xy());
    let ys = scale_round(c.y, opts.factor_xy());
    write_svarint(out, accum.delta_x(xs));
    write_svarint(out, accum.delta_y(ys));
    if flags.has_z {
        let zs = scale_round(c.z, opts.factor_z());
        write_svarint(out, accum.delta_z(zs));
    }
    if flags.has_m {
        let ms = scale_round(c.m, opts.factor_m());
        write_svarint(out, accum.delta_m(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planargeom_types::geometry::{Header, SRID_UNKNOWN};

    #[test]
    fn empty_point_encodes_header_only() {
        let geom = Geometry::empty_point(SRID_UNKNOWN, Flags::XY);
        let bytes = to_twkb(&geom, &TwkbOptions::default()).unwrap();
        assert_eq!(bytes.len(), 2);
        assert_eq!(bytes[1] & FLAG_EMPTY, FLAG_EMPTY);
    }

    #[test]
    fn simple_point_encodes_two_deltas() {
        let geom = Geometry::Point {
            header: Header::new(Flags::XY, SRID_UNKNOWN),
            points: PointArray::from_coords(Flags::XY, &[Coord4::xy(1.0, 2.0)]),
        };
        let bytes = to_twkb(&geom, &TwkbOptions::with_precision(0)).unwrap();
        // header, metadata, then zigzag(1)=2, zigzag(2)=4
        assert_eq!(bytes, vec![0x01, 0x00, 2, 4]);
    }
}
