//! Core geometry types for the printability pipeline.
//!
//! This crate provides the foundational types shared by the loader and the
//! analysis crates:
//!
//! - [`Triangle`] - A concrete triangle with vertex positions
//! - [`Facet`] - A triangle paired with its unit normal (one soup record)
//! - [`Aabb`] - Axis-aligned bounding box
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//!
//! # Units
//!
//! Coordinates are `f64`. Downstream crates assume millimeters.
//!
//! # Coordinate System
//!
//! Uses a **right-handed coordinate system** with Z up. The build plate is
//! the `z = 0` plane.
//!
//! Face winding is **counter-clockwise (CCW) when viewed from outside**.
//! Normals point outward by the right-hand rule.
//!
//! # Triangle Soup
//!
//! Meshes are handled as an unstructured list of [`Facet`]s. No adjacency,
//! half-edge or winding information is built.
//!
//! ```
//! use mesh_types::{Facet, MeshBounds, Triangle};
//!
//! let facets = vec![Facet::from_triangle(Triangle::from_arrays(
//!     [0.0, 0.0, 0.0],
//!     [10.0, 0.0, 0.0],
//!     [0.0, 10.0, 5.0],
//! ))];
//!
//! let bounds = facets.bounds();
//! assert!((bounds.size().z - 5.0).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod facet;
mod traits;
mod triangle;

pub use bounds::Aabb;
pub use facet::{DEFAULT_NORMAL, Facet};
pub use traits::MeshBounds;
pub use triangle::Triangle;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, UnitQuaternion, Vector3};
