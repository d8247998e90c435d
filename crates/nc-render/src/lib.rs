//! Renderer-facing functions for notecanvas: everything a presentation
//! layer needs to draw and pick the board, without owning any drawing
//! backend.

pub mod anchor;
pub mod connector;
pub mod hit;
pub mod raster;

pub use anchor::{EditTarget, resolve_anchor_client_rect, resolve_anchor_screen_rect};
pub use connector::{ConnectionGeometry, all_connection_geometry, connection_geometry};
pub use hit::{Hit, hit_test, hit_test_stack};
pub use raster::{Bitmap, RasterCache, RasterCacheConfig, RasterKey, RasterRequest, Rasterizer};
