//! A topology kernel for **interactive polygon mesh editing**, built around an
//! [`EditableMesh`]: one vertex buffer, faces that each own their vertices,
//! and [shared-vertex tables](mesh::shared) tying coincident positions (and
//! coincident UVs) back together.
//!
//! Operators cover delete, merge, weld, split, connect and subdivide,
//! extrude, bevel, triangulate, hole detection and filling, and normal
//! conformance. Adjacency comes from a [winged-edge graph](mesh::winged_edge)
//! rebuilt on demand; new geometry is staged as
//! [`FaceRebuildData`](mesh::rebuild::FaceRebuildData) and committed in one
//! pass.
//!
//! # Features
//! #### Default
//! - **f64**: use f64 as Real
//!
//! #### Optional
//! - **f32**: use f32 as Real, this conflicts with f64
//!
//! The geometric tolerance defaults per float width and can be baked in at
//! build time through the `POLYEDIT_TOLERANCE` environment variable or set once
//! at runtime with [`float_types::set_tolerance`].

#![forbid(unsafe_code)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod errors;
pub mod float_types;
pub mod math;
pub mod mesh;
pub mod ops;
pub mod traits;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use errors::{MeshError, MeshResult};
pub use mesh::edge::Edge;
pub use mesh::face::Face;
pub use mesh::vertex::Vertex;
pub use mesh::{EditableMesh, MeshSnapshot, Submesh};
pub use ops::connect::SplitPoint;
pub use ops::extrude::ExtrudeMethod;
pub use traits::MeshSink;
