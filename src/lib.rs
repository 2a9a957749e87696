//! Procedural tiled background textures: noise fields, line and dash
//! patterns, polygons, and repeated motifs, painted onto a raster surface in
//! a single synchronous pass and serialized to an embeddable image URL.

pub mod color;
pub mod config;
pub mod math;
pub mod mixins;
pub mod painter;
pub mod rand;
pub mod surface;
