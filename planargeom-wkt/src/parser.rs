//! Recursive-descent WKT parser (§4.8): dispatches on the upper-cased tag
//! and its dimension qualifier, then builds the geometry honouring the
//! declared dimensionality.

use planargeom_types::coord::Coord4;
use planargeom_types::error::{Error, ParseError, Result};
use planargeom_types::flags::Flags;
use planargeom_types::geometry::{Geometry, Header, SRID_UNKNOWN};
use planargeom_types::kind::GeomKind;
use planargeom_types::pointarray::PointArray;

use crate::tokenizer::{Spanned, Token, Tokenizer};

struct Parser {
    tokens: std::iter::Peekable<std::vec::IntoIter<Spanned>>,
}

pub fn parse(text: &str) -> Result<Geometry> {
    let mut spanned = Vec::new();
    for r in Tokenizer::new(text) {
        match r {
            Ok(s) => spanned.push(s),
            Err((column, message)) => return Err(ParseError::new(column, message).into()),
        }
    }
    let mut p = Parser {
        tokens: spanned.into_iter().peekable(),
    };

    let srid = p.read_optional_srid()?;
    let geom = p.parse_tagged_geometry(srid)?;
    if let Some(extra) = p.tokens.next() {
        return Err(ParseError::new(extra.column, "unexpected trailing input").into());
    }
    Ok(geom)
}

const BASE_TAGS: &[(&str, GeomKind)] = &[
    ("POINT", GeomKind::Point),
    ("LINESTRING", GeomKind::LineString),
    ("CIRCULARSTRING", GeomKind::CircularString),
    ("POLYGON", GeomKind::Polygon),
    ("TRIANGLE", GeomKind::Triangle),
    ("MULTIPOINT", GeomKind::MultiPoint),
    ("MULTILINESTRING", GeomKind::MultiLineString),
    ("MULTIPOLYGON", GeomKind::MultiPolygon),
    ("GEOMETRYCOLLECTION", GeomKind::GeometryCollection),
    ("COMPOUNDCURVE", GeomKind::CompoundCurve),
    ("CURVEPOLYGON", GeomKind::CurvePolygon),
    ("MULTICURVE", GeomKind::MultiCurve),
    ("MULTISURFACE", GeomKind::MultiSurface),
    ("POLYHEDRALSURFACE", GeomKind::PolyhedralSurface),
    ("TIN", GeomKind::Tin),
];

fn lookup_kind(tag: &str) -> Option<GeomKind> {
    BASE_TAGS.iter().find(|(name, _)| *name == tag).map(|(_, k)| *k)
}

fn split_tag_dims(word: &str) -> (&str, bool, bool) {
    for (suffix, z, m) in [("ZM", true, true), ("Z", true, false), ("M", false, true)] {
        if let Some(prefix) = word.strip_suffix(suffix) {
            if lookup_kind(prefix).is_some() {
                return (prefix, z, m);
            }
        }
    }
    (word, false, false)
}

impl Parser {
    fn peek(&mut self) -> Option<&Spanned> {
        self.tokens.peek()
    }

    fn next(&mut self) -> Result<Spanned> {
        self.tokens.next().ok_or_else(|| ParseError::new(0, "unexpected end of input").into())
    }

    fn expect(&mut self, want: &Token) -> Result<Spanned> {
        let s = self.next()?;
        if &s.token == want {
            Ok(s)
        } else {
            Err(ParseError::new(s.column, format!("expected {want:?}, found {:?}", s.token)).into())
        }
    }

    fn expect_word(&mut self) -> Result<(String, usize)> {
        let s = self.next()?;
        match s.token {
            Token::Word(w) => Ok((w, s.column)),
            other => Err(ParseError::new(s.column, format!("expected a word, found {other:?}")).into()),
        }
    }

    fn expect_number(&mut self) -> Result<f64> {
        let s = self.next()?;
        match s.token {
            Token::Number(n) => Ok(n),
            other => Err(ParseError::new(s.column, format!("expected a number, found {other:?}")).into()),
        }
    }

    fn peek_is(&mut self, want: &Token) -> bool {
        matches!(self.peek(), Some(s) if &s.token == want)
    }

    fn read_optional_srid(&mut self) -> Result<i32> {
        if let Some(s) = self.peek() {
            if let Token::Word(w) = &s.token {
                if w == "SRID" {
                    self.next()?;
                    self.expect(&Token::Equals)?;
                    let n = self.expect_number()?;
                    self.expect(&Token::Semicolon)?;
                    return Ok(n as i32);
                }
            }
        }
        Ok(SRID_UNKNOWN)
    }

    fn read_dimension_qualifier(&mut self, fused_z: bool, fused_m: bool) -> Result<(bool, bool)> {
        if fused_z || fused_m {
            return Ok((fused_z, fused_m));
        }
        if let Some(s) = self.peek() {
            if let Token::Word(w) = &s.token {
                match w.as_str() {
                    "ZM" => {
                        self.next()?;
                        return Ok((true, true));
                    }
                    "Z" => {
                        self.next()?;
                        return Ok((true, false));
                    }
                    "M" => {
                        self.next()?;
                        return Ok((false, true));
                    }
                    _ => {}
                }
            }
        }
        Ok((false, false))
    }

    /// Parses `TAG [Z|M|ZM] (body)` or `TAG [Z|M|ZM] EMPTY`. `srid` is only
    /// threaded onto the root geometry; recursive calls for children pass
    /// `SRID_UNKNOWN` (§4.2: children never carry their own SRID).
    fn parse_tagged_geometry(&mut self, srid: i32) -> Result<Geometry> {
        let (word, column) = self.expect_word()?;
        let (base, fused_z, fused_m) = split_tag_dims(&word);
        let kind = lookup_kind(base)
            .ok_or_else(|| ParseError::new(column, format!("unrecognized WKT tag '{word}'")))?;
        let (has_z, has_m) = self.read_dimension_qualifier(fused_z, fused_m)?;
        let flags = Flags::new(has_z, has_m);

        if self.peek_is(&Token::Word("EMPTY".to_string())) {
            self.next()?;
            return empty_geometry(kind, srid, flags);
        }

        match kind {
            GeomKind::Point => self.parse_point(srid, flags),
            GeomKind::LineString => self.parse_linestring(srid, flags),
            GeomKind::CircularString => self.parse_circularstring(srid, flags),
            GeomKind::Polygon => self.parse_polygon(srid, flags),
            GeomKind::Triangle => self.parse_triangle(srid, flags),
            GeomKind::MultiPoint => self.parse_multipoint(srid, flags),
            GeomKind::MultiLineString => self.parse_multilinestring(srid, flags),
            GeomKind::MultiPolygon => self.parse_multipolygon(srid, flags),
            GeomKind::GeometryCollection => self.parse_geometrycollection(srid, flags),
            GeomKind::CompoundCurve => self.parse_compoundcurve(srid, flags),
            GeomKind::CurvePolygon => self.parse_curvepolygon(srid, flags),
            GeomKind::MultiCurve => self.parse_multicurve(srid, flags),
            GeomKind::MultiSurface => self.parse_multisurface(srid, flags),
            GeomKind::PolyhedralSurface => self.parse_polyhedralsurface(srid, flags),
            GeomKind::Tin => self.parse_tin(srid, flags),
        }
    }

    fn parse_coord(&mut self, flags: Flags) -> Result<Coord4> {
        let x = self.expect_number()?;
        let y = self.expect_number()?;
        let z = if flags.has_z { self.expect_number()? } else { 0.0 };
        let m = if flags.has_m { self.expect_number()? } else { 0.0 };
        Ok(Coord4 { x, y, z, m })
    }

    fn parse_coord_list(&mut self, flags: Flags) -> Result<Vec<Coord4>> {
        let mut coords = vec![self.parse_coord(flags)?];
        while self.peek_is(&Token::Comma) {
            self.next()?;
            coords.push(self.parse_coord(flags)?);
        }
        Ok(coords)
    }

    fn parse_point(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let c = self.parse_coord(flags)?;
        self.expect(&Token::ParenClose)?;
        Ok(Geometry::Point {
            header: Header::new(flags, srid),
            points: PointArray::from_coords(flags, &[c]),
        })
    }

    fn parse_ring(&mut self, flags: Flags) -> Result<PointArray> {
        self.expect(&Token::ParenOpen)?;
        let coords = self.parse_coord_list(flags)?;
        self.expect(&Token::ParenClose)?;
        Ok(PointArray::from_coords(flags, &coords))
    }

    fn parse_linestring_points(&mut self, flags: Flags, min_points: usize) -> Result<PointArray> {
        let start_column = self.peek().map(|s| s.column).unwrap_or(0);
        self.expect(&Token::ParenOpen)?;
        let coords = self.parse_coord_list(flags)?;
        self.expect(&Token::ParenClose)?;
        if coords.len() < min_points {
            return Err(ParseError::new(
                start_column,
                format!("expected at least {min_points} points, found {}", coords.len()),
            )
            .into());
        }
        Ok(PointArray::from_coords(flags, &coords))
    }

    fn parse_linestring(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        let points = self.parse_linestring_points(flags, 2)?;
        Ok(Geometry::LineString { header: Header::new(flags, srid), points })
    }

    fn parse_circularstring(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        let start_column = self.peek().map(|s| s.column).unwrap_or(0);
        let points = self.parse_linestring_points(flags, 3)?;
        if points.npoints() % 2 == 0 {
            return Err(ParseError::new(start_column, "CIRCULARSTRING needs an odd number of points").into());
        }
        Ok(Geometry::CircularString { header: Header::new(flags, srid), points })
    }

    fn check_closed_ring(&self, column: usize, points: &PointArray, min_points: usize) -> Result<()> {
        if points.npoints() < min_points {
            return Err(ParseError::new(
                column,
                format!("ring needs at least {min_points} points, found {}", points.npoints()),
            )
            .into());
        }
        let first = points.get_point(0);
        let last = points.get_point(points.npoints() - 1);
        if !first.exact_eq_2d(last) {
            return Err(ParseError::new(column, "ring is not closed").into());
        }
        Ok(())
    }

    fn parse_polygon_rings(&mut self, flags: Flags) -> Result<Vec<PointArray>> {
        self.expect(&Token::ParenOpen)?;
        let mut rings = Vec::new();
        loop {
            let column = self.peek().map(|s| s.column).unwrap_or(0);
            let ring = self.parse_ring(flags)?;
            self.check_closed_ring(column, &ring, 4)?;
            rings.push(ring);
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(rings)
    }

    fn parse_polygon(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        let rings = self.parse_polygon_rings(flags)?;
        Ok(Geometry::Polygon { header: Header::new(flags, srid), rings })
    }

    fn parse_triangle(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        let column = self.peek().map(|s| s.column).unwrap_or(0);
        let mut rings = self.parse_polygon_rings(flags)?;
        if rings.len() != 1 || rings[0].npoints() != 4 {
            return Err(ParseError::new(column, "TRIANGLE needs exactly one closed 4-point ring").into());
        }
        Ok(Geometry::Triangle { header: Header::new(flags, srid), points: rings.remove(0) })
    }

    fn parse_multipoint(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut coords = Vec::new();
        loop {
            if self.peek_is(&Token::ParenOpen) {
                self.next()?;
                coords.push(self.parse_coord(flags)?);
                self.expect(&Token::ParenClose)?;
            } else {
                coords.push(self.parse_coord(flags)?);
            }
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        let mut out = Geometry::empty_collection(GeomKind::MultiPoint, srid, flags)?;
        for c in coords {
            out.add_geom(Geometry::Point {
                header: Header::new(flags, SRID_UNKNOWN),
                points: PointArray::from_coords(flags, &[c]),
            })?;
        }
        Ok(out)
    }

    fn parse_multilinestring(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut out = Geometry::empty_collection(GeomKind::MultiLineString, srid, flags)?;
        loop {
            let points = self.parse_linestring_points(flags, 2)?;
            out.add_geom(Geometry::LineString { header: Header::new(flags, SRID_UNKNOWN), points })?;
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(out)
    }

    fn parse_multipolygon(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut out = Geometry::empty_collection(GeomKind::MultiPolygon, srid, flags)?;
        loop {
            let rings = self.parse_polygon_rings(flags)?;
            out.add_geom(Geometry::Polygon { header: Header::new(flags, SRID_UNKNOWN), rings })?;
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(out)
    }

    fn parse_geometrycollection(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut out = Geometry::empty_collection(GeomKind::GeometryCollection, srid, flags)?;
        loop {
            let child = self.parse_tagged_geometry(SRID_UNKNOWN)?;
            out.add_geom(child)?;
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(out)
    }

    /// A curve component is either a bare, untagged coordinate list (an
    /// implicit `LINESTRING`) or a tagged `CIRCULARSTRING`/`COMPOUNDCURVE`.
    fn parse_curve_component(&mut self, flags: Flags) -> Result<Geometry> {
        if self.peek_is(&Token::ParenOpen) {
            let points = self.parse_linestring_points(flags, 2)?;
            Ok(Geometry::LineString { header: Header::new(flags, SRID_UNKNOWN), points })
        } else {
            self.parse_tagged_geometry(SRID_UNKNOWN)
        }
    }

    fn parse_compoundcurve(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut out = Geometry::empty_collection(GeomKind::CompoundCurve, srid, flags)?;
        loop {
            let child = self.parse_curve_component(flags)?;
            out.add_geom(child)?;
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(out)
    }

    /// A curve-polygon ring is a bare coordinate list, a tagged
    /// `CIRCULARSTRING`, or a tagged `COMPOUNDCURVE`.
    fn parse_curvepolygon_ring(&mut self, flags: Flags) -> Result<Geometry> {
        self.parse_curve_component(flags)
    }

    fn parse_curvepolygon(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut out = Geometry::empty_collection(GeomKind::CurvePolygon, srid, flags)?;
        loop {
            let ring = self.parse_curvepolygon_ring(flags)?;
            out.add_geom(ring)?;
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(out)
    }

    fn parse_multicurve(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut out = Geometry::empty_collection(GeomKind::MultiCurve, srid, flags)?;
        loop {
            let child = self.parse_curve_component(flags)?;
            out.add_geom(child)?;
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(out)
    }

    /// A multi-surface component is either a bare polygon body
    /// (untagged ring list) or a tagged `CURVEPOLYGON`.
    fn parse_surface_component(&mut self, flags: Flags) -> Result<Geometry> {
        if self.peek_is(&Token::ParenOpen) {
            let rings = self.parse_polygon_rings(flags)?;
            Ok(Geometry::Polygon { header: Header::new(flags, SRID_UNKNOWN), rings })
        } else {
            self.parse_tagged_geometry(SRID_UNKNOWN)
        }
    }

    fn parse_multisurface(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut out = Geometry::empty_collection(GeomKind::MultiSurface, srid, flags)?;
        loop {
            let child = self.parse_surface_component(flags)?;
            out.add_geom(child)?;
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(out)
    }

    fn parse_polyhedralsurface(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut out = Geometry::empty_collection(GeomKind::PolyhedralSurface, srid, flags)?;
        loop {
            let rings = self.parse_polygon_rings(flags)?;
            out.add_geom(Geometry::Polygon { header: Header::new(flags, SRID_UNKNOWN), rings })?;
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(out)
    }

    fn parse_tin(&mut self, srid: i32, flags: Flags) -> Result<Geometry> {
        self.expect(&Token::ParenOpen)?;
        let mut out = Geometry::empty_collection(GeomKind::Tin, srid, flags)?;
        loop {
            let column = self.peek().map(|s| s.column).unwrap_or(0);
            let mut rings = self.parse_polygon_rings(flags)?;
            if rings.len() != 1 || rings[0].npoints() != 4 {
                return Err(ParseError::new(column, "TIN patch needs exactly one closed 4-point ring").into());
            }
            out.add_geom(Geometry::Triangle { header: Header::new(flags, SRID_UNKNOWN), points: rings.remove(0) })?;
            if self.peek_is(&Token::Comma) {
                self.next()?;
            } else {
                break;
            }
        }
        self.expect(&Token::ParenClose)?;
        Ok(out)
    }
}

fn empty_geometry(kind: GeomKind, srid: i32, flags: Flags) -> Result<Geometry> {
    Ok(match kind {
        GeomKind::Point => Geometry::empty_point(srid, flags),
        GeomKind::LineString | GeomKind::CircularString => Geometry::empty_line_string(srid, flags),
        GeomKind::Polygon => Geometry::Polygon { header: Header::new(flags, srid), rings: Vec::new() },
        GeomKind::Triangle => Geometry::Triangle { header: Header::new(flags, srid), points: PointArray::empty(flags, 0) },
        other if other.is_collection() => Geometry::empty_collection(other, srid, flags)?,
        other => return Err(Error::unsupported("EMPTY", other.name())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_point() {
        let g = parse("POINT (1 2)").unwrap();
        match g {
            Geometry::Point { points, header } => {
                assert_eq!(points.raw(), &[1.0, 2.0]);
                assert!(!header.flags.has_z);
            }
            _ => panic!("expected point"),
        }
    }

    #[test]
    fn parses_iso_z_point() {
        let g = parse("POINT Z (1 2 3)").unwrap();
        match g {
            Geometry::Point { points, header } => {
                assert!(header.flags.has_z);
                assert_eq!(points.raw(), &[1.0, 2.0, 3.0]);
            }
            _ => panic!("expected point"),
        }
    }

    #[test]
    fn parses_extended_m_point_without_space() {
        let g = parse("POINTM(1 2 9)").unwrap();
        match g {
            Geometry::Point { points, header } => {
                assert!(!header.flags.has_z && header.flags.has_m);
                assert_eq!(points.get_point(0).m, 9.0);
            }
            _ => panic!("expected point"),
        }
    }

    #[test]
    fn parses_srid_prefix() {
        let g = parse("SRID=4326;POINT(1 2)").unwrap();
        assert_eq!(g.header().srid, 4326);
    }

    #[test]
    fn parses_empty_linestring() {
        let g = parse("LINESTRING EMPTY").unwrap();
        match g {
            Geometry::LineString { points, .. } => assert!(points.is_empty()),
            _ => panic!("expected linestring"),
        }
    }

    #[test]
    fn rejects_linestring_with_one_point() {
        assert!(parse("LINESTRING(0 0)").is_err());
    }

    #[test]
    fn rejects_unclosed_polygon_ring() {
        assert!(parse("POLYGON((0 0, 1 0, 1 1, 2 2))").is_err());
    }

    #[test]
    fn parses_multipoint_with_and_without_parens() {
        let g = parse("MULTIPOINT((0 0), 1 1)").unwrap();
        match g {
            Geometry::MultiPoint { children, .. } => assert_eq!(children.len(), 2),
            _ => panic!("expected multipoint"),
        }
    }

    #[test]
    fn parses_compoundcurve_mixed_components() {
        let g = parse("COMPOUNDCURVE(CIRCULARSTRING(0 0, 1 1, 2 0), (2 0, 3 0))").unwrap();
        match g {
            Geometry::CompoundCurve { children, .. } => assert_eq!(children.len(), 2),
            _ => panic!("expected compoundcurve"),
        }
    }

    #[test]
    fn rejects_compoundcurve_not_joined_end_to_start() {
        assert!(parse("COMPOUNDCURVE(CIRCULARSTRING(0 0, 1 1, 2 0), (5 5, 6 6))").is_err());
    }

    #[test]
    fn parses_geometrycollection() {
        let g = parse("GEOMETRYCOLLECTION(POINT(0 0), LINESTRING(0 0, 1 1))").unwrap();
        match g {
            Geometry::GeometryCollection { children, .. } => assert_eq!(children.len(), 2),
            _ => panic!("expected collection"),
        }
    }
}
