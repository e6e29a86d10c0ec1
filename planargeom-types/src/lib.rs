//! Geospatial primitive data types for the `planargeom` family: the
//! coordinate-array primitive, the 16-variant tagged geometry union, the
//! bbox engine, and the process-wide `Context`/error types they share.
//!
//! In most cases you will only need this crate directly if you're
//! implementing a codec or algorithm crate against it (as `planargeom`,
//! `planargeom-wkb`, `planargeom-wkt`, and `planargeom-twkb` do). Otherwise
//! use the `planargeom` crate, which re-exports these types and adds the
//! analytic kernels, distance engine, simplifiers, and arc subsystem.
//!
//! ## Types
//!
//! - **[`pointarray::PointArray`]**: a packed sequence of `x, y, [z], [m]`
//!   coordinates -- the single storage primitive every geometry is built
//!   from.
//! - **[`geometry::Geometry`]**: the 16-member tagged union (`Point`,
//!   `LineString`, `Polygon`, `CircularString`, `CompoundCurve`,
//!   `CurvePolygon`, the `Multi*` collections, `PolyhedralSurface`, `Tin`,
//!   `GeometryCollection`, ...).
//! - **[`gbox::GBox`]** / **[`gbox::Box2D`]**: axis-aligned bounding boxes.
//! - **[`context::Context`]**: the allocator/reporter/interrupt-flag handle
//!   threaded through every long-running operation.
//!
//! See `SPEC_FULL.md` at the repository root for the full module map.

pub mod bbox;
pub mod context;
pub mod coord;
pub mod debug;
pub mod error;
pub mod flags;
pub mod gbox;
pub mod geometry;
pub mod iter;
pub mod kind;
pub mod pointarray;

pub use context::Context;
pub use coord::{Coord4, Ordinate};
pub use error::{Error, ParseError, Result};
pub use flags::Flags;
pub use gbox::{Box2D, GBox};
pub use geometry::{Geometry, Header, SRID_UNKNOWN};
pub use kind::GeomKind;
pub use pointarray::{AffineMatrix, GridSpec, PointArray, PointPosition};
