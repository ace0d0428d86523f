//! Mesh editing errors

use crate::mesh::edge::Edge;

/// Everything a topology operator can refuse to do.
///
/// Operators validate their arguments and geometric feasibility before they
/// touch any buffer, so receiving one of these means the mesh is unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// (IndexOutOfRange) A vertex index points past the end of the vertex buffer
    #[error("(IndexOutOfRange) vertex index {index} is out of range (vertex count {count})")]
    IndexOutOfRange { index: usize, count: usize },
    /// (FaceOutOfRange) A face index points past the end of the face list
    #[error("(FaceOutOfRange) face index {index} is out of range (face count {count})")]
    FaceOutOfRange { index: usize, count: usize },
    /// (MalformedFace) A face index list is not made of whole triangles
    #[error("(MalformedFace) face {face} has {len} indices, expected a non-zero multiple of 3")]
    MalformedFace { face: usize, len: usize },
    /// (EmptyInput) An operator was handed nothing to work on
    #[error("(EmptyInput) no {0} supplied")]
    EmptyInput(&'static str),
    /// (DuplicateGroupMember) A host-supplied shared table lists a vertex twice
    #[error("(DuplicateGroupMember) vertex {0} belongs to more than one shared group")]
    DuplicateGroupMember(usize),
    /// (GroupOutOfRange) A shared group id does not exist
    #[error("(GroupOutOfRange) shared group {group} is out of range (group count {count})")]
    GroupOutOfRange { group: usize, count: usize },
    /// (VertexInUse) Deleting a vertex that a face still references
    #[error("(VertexInUse) vertex {0} is still referenced by a face")]
    VertexInUse(usize),
    /// (InsufficientSurface) The clamped bevel distance collapsed to nothing
    #[error("(InsufficientSurface) bevel distance > available surface")]
    InsufficientSurface,
    /// (OpenEdges) None of the selected edges has a neighbouring face
    #[error("(OpenEdges) cannot bevel open edges")]
    OpenEdges,
    /// (NotAnEdge) The edge is not part of any face perimeter
    #[error("(NotAnEdge) edge {0:?} is not on any face perimeter")]
    NotAnEdge(Edge),
    /// (Triangulation) The polygon triangulator rejected the contour
    #[error("(Triangulation) {0}")]
    Triangulation(String),
    /// (TooFewPoints) A polygon needs at least three points
    #[error("(TooFewPoints) polygon has {0} points, at least 3 are required")]
    TooFewPoints(usize),
    /// (NoHolesFound) Hole detection found no closed open-edge loop
    #[error("(NoHolesFound) no holes found")]
    NoHolesFound,
    /// (InvalidArgument) In general, anything else
    #[error("(InvalidArgument) {0}")]
    InvalidArgument(String),
}

/// Result alias used by every operator in the crate.
pub type MeshResult<T> = Result<T, MeshError>;
