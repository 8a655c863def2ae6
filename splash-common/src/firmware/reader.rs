//! Firmware image mesh reader
//!
//! Reads the fixed triangle and vertex regions back into a flat mesh. The
//! firmware does not store color groupings, so the mesh has no colors; the
//! palette can be inspected separately.

use crate::error::SplashError;
use crate::layout::{CODE_PATCH, FirmwareLayout};
use crate::mesh::{SplashMesh, Triangle, Vertex};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read, Seek, SeekFrom};

/// One color slot as currently stored in an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteSlot {
    /// Raw color table word (low 24 bits = RGB)
    pub color: u32,
    /// Run start in shorts, if the slot's start is patched
    pub run_start: Option<u32>,
    /// Run length in shorts, if the slot's length is patched
    pub run_length: Option<u32>,
}

impl PaletteSlot {
    pub fn rgb(&self) -> u32 {
        self.color & 0x00ff_ffff
    }
}

/// Reader for the splash mesh regions of a firmware image
pub struct FirmwareReader<'a, R: Read + Seek> {
    reader: R,
    layout: &'a FirmwareLayout,
}

impl<'a, R: Read + Seek> FirmwareReader<'a, R> {
    /// Create a new firmware reader
    pub fn new(reader: R, layout: &'a FirmwareLayout) -> Self {
        Self { reader, layout }
    }

    /// Read every triangle and vertex slot.
    ///
    /// The result always holds exactly `triangle_capacity()` triangles and
    /// `vertex_capacity` vertices, unused slots included.
    pub fn read_mesh(&mut self) -> Result<SplashMesh, SplashError> {
        let triangles = self.read_triangles()?;
        let vertices = self.read_vertices()?;
        tracing::debug!(
            "Read {} triangles, {} vertices from image",
            triangles.len(),
            vertices.len()
        );
        Ok(SplashMesh::new(vertices, triangles))
    }

    fn read_triangles(&mut self) -> io::Result<Vec<Triangle>> {
        let count = self.layout.triangle_capacity();
        self.reader
            .seek(SeekFrom::Start(self.layout.triangle_offset))?;

        let mut triangles = Vec::with_capacity(count);
        for _ in 0..count {
            let a = self.reader.read_u16::<LittleEndian>()?;
            let b = self.reader.read_u16::<LittleEndian>()?;
            let c = self.reader.read_u16::<LittleEndian>()?;
            triangles.push([a as u32, b as u32, c as u32]);
        }
        Ok(triangles)
    }

    fn read_vertices(&mut self) -> io::Result<Vec<Vertex>> {
        let count = self.layout.vertex_capacity;
        self.reader.seek(SeekFrom::Start(self.layout.vertex_offset))?;

        let mut vertices = Vec::with_capacity(count);
        for _ in 0..count {
            let x = self.reader.read_i16::<LittleEndian>()?;
            let y = self.reader.read_i16::<LittleEndian>()?;
            vertices.push(Vertex::from([x, y]));
        }
        Ok(vertices)
    }

    /// Read the color table and run bounds of every color slot
    pub fn read_palette(&mut self) -> Result<Vec<PaletteSlot>, SplashError> {
        let layout = self.layout;
        let mut slots = Vec::with_capacity(layout.color_table.len());
        for (slot, &color_offset) in layout.color_table.iter().enumerate() {
            let color = self.read_u32_at(color_offset)?;
            let bounds = layout.run_bounds.get(slot).copied();
            let run_start = match bounds {
                Some(b) if b.start != 0 => Some(self.read_u32_at(b.start)?),
                _ => None,
            };
            let run_length = match bounds {
                Some(b) if b.count != 0 => Some(self.read_u32_at(b.count)?),
                _ => None,
            };
            slots.push(PaletteSlot {
                color,
                run_start,
                run_length,
            });
        }
        Ok(slots)
    }

    /// Whether the safe-mode branch has been replaced with no-ops
    pub fn code_patch_applied(&mut self) -> Result<bool, SplashError> {
        self.reader
            .seek(SeekFrom::Start(self.layout.code_patch_offset))?;
        let mut bytes = [0u8; CODE_PATCH.len()];
        self.reader.read_exact(&mut bytes)?;
        Ok(bytes == CODE_PATCH)
    }

    fn read_u32_at(&mut self, offset: u64) -> io::Result<u32> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.read_u32::<LittleEndian>()
    }
}
