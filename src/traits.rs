use crate::mesh::MeshSnapshot;

/// The host-side renderable resource a mesh is committed to.
///
/// The kernel never renders or lays out GPU buffers itself; `upload` receives
/// a read-only snapshot of the finalized vertices, faces and shared tables
/// and converts it into whatever the host needs.
pub trait MeshSink<S: Clone> {
    type Error;

    fn upload(&mut self, snapshot: MeshSnapshot<'_, S>) -> Result<(), Self::Error>;
}
