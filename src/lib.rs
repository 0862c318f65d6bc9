// -- Lint policy ---------------------------------------------------------
// Rustc and rustdoc lint levels live in Cargo.toml; clippy policy lives here.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Tests may unwrap and panic freely.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

//! Tile-based GPU compute rasterizer for analytic volumetric strokes.
//!
//! A scene of authored strokes (ellipsoids, boxes, polyhedra, capsules,
//! cylinders, round cubes, bezier sweeps and shape mixtures) is encoded into
//! a flat arena of fixed-stride instance records. Each frame runs three
//! compute stages over that arena: a clear, a binner that inverts every
//! instance transform and appends the instance to the screen tiles its
//! conservative bound touches, and a per-tile rasterizer that intersects
//! pixel rays with the candidate shapes and composites the hits front to
//! back.
//!
//! # Key entry points
//!
//! - [`encoding::encode_scene`] - scene JSON to instance records
//! - [`engine::StrokeRenderEngine`] - GPU context, renderer, camera and
//!   background scene loading
//! - [`renderer::StrokeRenderer`] - the clear / bin / rasterize / present
//!   passes
//! - [`raster`] - CPU ports of the compute kernels, used for testing
//! - [`options::Options`] - TOML configuration
//!
//! # Architecture
//!
//! Scene files are parsed and encoded on a background thread and handed to
//! the render loop through a lock-free triple buffer. The render loop asks
//! a [`camera::CameraProvider`] for the frame's matrices, records the three
//! compute stages plus a fullscreen present pass into one command encoder,
//! and submits. Headless export swaps the orbit camera for recorded pose
//! playback and reads each frame back into a [`export::FrameSink`].

pub mod camera;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod export;
pub mod gpu;
pub mod input;
pub mod options;
pub mod raster;
pub mod renderer;
pub mod scene;
pub mod util;
#[cfg(feature = "viewer")]
mod viewer;

#[cfg(feature = "viewer")]
pub use viewer::{Viewer, ViewerBuilder};
