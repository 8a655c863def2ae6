//! splash-export library
//!
//! OBJ reading and mesh preview rendering for the `splash-export` tool.
//! Firmware layout and binary I/O live in `splash-common`.

pub mod mesh;
pub mod preview;

// Re-export the firmware side so callers need a single dependency
pub use splash_common::{
    FirmwareLayout, SplashError, SplashMesh, read_firmware_mesh, write_firmware_mesh,
};

pub use mesh::{FaceIndexing, ObjOptions, read_obj_mesh};
pub use preview::{MeshCanvas, PngCanvas, ViewTransform, draw_mesh};
