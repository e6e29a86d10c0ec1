//! TWKB codec (C13): the compact delta-encoded binary form of §4.9,
//! sitting alongside `planargeom-wkb`/`planargeom-wkt` the way `georust/wkt`
//! sits alongside a binary codec in a full GIS stack.
//!
//! Grounded directly on `original_source/rtout_twkb.h` (`TWKB_GLOBALS`/
//! `TWKB_STATE`, the header/metadata bit layout) and `original_source/src/varint.h`
//! (the LEB128-style varint + zig-zag encoding). No TWKB crate exists in the
//! example pack to imitate the surface of, so this crate's shape mirrors
//! `planargeom-wkb` -- a `to_twkb`/`from_twkb` pair, options struct for the
//! writer, self-describing reader -- rather than inventing a new one.

mod header;
mod reader;
mod varint;
mod writer;

pub use reader::{from_twkb, from_twkb_prefix};
pub use writer::{to_twkb, TwkbOptions};
