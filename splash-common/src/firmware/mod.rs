//! Splash mesh regions of a firmware image
//!
//! The mesh lives in pre-allocated regions at fixed offsets (see
//! [`FirmwareLayout`]). Reading always returns every slot; writing fills
//! unused slots with zeros and never changes the image length.

mod reader;
mod writer;


pub use reader::{FirmwareReader, PaletteSlot};
pub use writer::FirmwareWriter;

use crate::error::SplashError;
use crate::layout::FirmwareLayout;
use crate::mesh::SplashMesh;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Read the mesh stored in the image at `path`
pub fn read_firmware_mesh(path: &Path, layout: &FirmwareLayout) -> Result<SplashMesh, SplashError> {
    let file = File::open(path)?;
    FirmwareReader::new(BufReader::new(file), layout).read_mesh()
}

/// Patch `mesh` into the existing image at `path`.
///
/// The file is opened for in-place update; it is never created, truncated,
/// or grown.
pub fn write_firmware_mesh(
    path: &Path,
    layout: &FirmwareLayout,
    mesh: &SplashMesh,
) -> Result<(), SplashError> {
    let file = OpenOptions::new().read(true).write(true).open(path)?;
    FirmwareWriter::new(BufWriter::new(file), layout).write_mesh(mesh)
}
