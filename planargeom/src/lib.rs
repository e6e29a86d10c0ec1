//! Analytic kernels (C6), distance engine (C7), simplifiers (C8), arc
//! subsystem (C9), splitter/subdivider (C10), and the grid/affine/
//! substring/locate dispatch (C14) built on top of [`planargeom_types`].
//!
//! `planargeom-types` defines the data model; this crate is where the
//! algorithms that make it a geometry *engine* live, the way `geo` adds
//! algorithms over the plain structs in `geo-types`.

pub mod arc;
pub mod distance;
pub mod kernels;
pub mod measure;
pub mod simplify;
pub mod split;
pub mod structural;
pub mod transform;

pub use planargeom_types::*;

pub use arc::{stroke, unstroke, StrokeOptions, UnstrokeOptions};
pub use distance::{closest_line, closest_point, dwithin_2d, maxdistance_2d, mindistance_2d};
pub use kernels::{ArcParams, IntersectionKind};
pub use measure::{area, length, length_2d, perimeter};
pub use simplify::{effective_area, remove_repeated_points, simplify};
pub use split::{split, split_by_line, split_by_multipoint, split_by_point, subdivide};
pub use structural::{force_sfs, homogenize};
pub use transform::{affine, locate_point, longitude_shift, scale, segmentize_2d, snap_to_grid, substring};
