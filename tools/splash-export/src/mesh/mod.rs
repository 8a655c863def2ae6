//! Mesh readers (OBJ -> splash mesh)

mod obj;

// Re-export public API
pub use obj::{DEFAULT_MESH_SCALE, FaceIndexing, ObjOptions, parse_obj, read_obj_mesh};
