//! Topology operators. Each submodule adds methods to
//! [`EditableMesh`](crate::mesh::EditableMesh); all of them stage new
//! geometry as [`FaceRebuildData`](crate::mesh::rebuild::FaceRebuildData) and
//! check their inputs before the first write.

pub mod bevel;
pub mod connect;
pub mod delete;
pub mod extrude;
pub mod holes;
pub mod merge;
pub mod normals;
pub mod selection;
pub mod split;
pub mod triangulate;
pub mod validation;
pub mod weld;
