//! Splash-Common: firmware splash mesh layout, model, and binary I/O
//!
//! A firmware image carries its boot splash as a wireframe mesh stored in
//! fixed, pre-allocated regions. This crate knows where those regions are
//! ([`FirmwareLayout`]), what a mesh looks like in memory ([`SplashMesh`]),
//! and how to move one in and out of an image ([`FirmwareReader`],
//! [`FirmwareWriter`]).
//!
//! # Usage
//!
//! ```ignore
//! use splash_common::{FirmwareLayout, read_firmware_mesh, write_firmware_mesh};
//!
//! let layout = FirmwareLayout::cerbios();
//! let mesh = read_firmware_mesh("bios.bin".as_ref(), &layout)?;
//! write_firmware_mesh("patched.bin".as_ref(), &layout, &mesh)?;
//! ```

pub mod error;
pub mod firmware;
pub mod layout;
pub mod mesh;

pub use error::{CapacityKind, SplashError};
pub use firmware::{
    FirmwareReader, FirmwareWriter, PaletteSlot, read_firmware_mesh,
    write_firmware_mesh,
};
pub use layout::{FirmwareLayout, LayoutConfig, RunBoundsSlot};
pub use mesh::{ColorCounts, ColorGroups, ColorTag, SplashMesh, Triangle, Vertex};
