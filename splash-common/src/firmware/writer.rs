//! Firmware image mesh writer
//!
//! Patches a splash mesh into an existing image in place. Every capacity
//! and range check runs before the first byte is written; an I/O error
//! after that point leaves the image partially patched.

use crate::error::{CapacityKind, SplashError};
use crate::layout::{CODE_PATCH, FirmwareLayout, SHORTS_PER_TRIANGLE};
use crate::mesh::{ColorGroups, SplashMesh, Triangle};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Seek, SeekFrom, Write};

/// Writer for the splash mesh regions of a firmware image
pub struct FirmwareWriter<'a, W: Write + Seek> {
    writer: W,
    layout: &'a FirmwareLayout,
}

impl<'a, W: Write + Seek> FirmwareWriter<'a, W> {
    /// Create a new firmware writer
    pub fn new(writer: W, layout: &'a FirmwareLayout) -> Self {
        Self { writer, layout }
    }

    /// Write a mesh into the image.
    ///
    /// When the mesh carries color groups the code patch, color table and
    /// run bounds are patched as well; otherwise only geometry is written.
    pub fn write_mesh(&mut self, mesh: &SplashMesh) -> Result<(), SplashError> {
        let vertices = self.check(mesh)?;
        self.check_image_len()?;

        self.write_triangles(&mesh.triangles)?;
        self.write_vertices(&vertices)?;
        if !mesh.colors.is_empty() {
            self.write_palette(&mesh.colors)?;
        }
        self.writer.flush()?;

        tracing::debug!(
            "Wrote {} triangles, {} vertices, {} colors",
            mesh.triangles.len(),
            vertices.len(),
            mesh.colors.len()
        );
        Ok(())
    }

    /// Validate the mesh against the layout and convert vertices to i16
    fn check(&self, mesh: &SplashMesh) -> Result<Vec<[i16; 2]>, SplashError> {
        let layout = self.layout;
        layout.validate()?;
        ensure_capacity(CapacityKind::Vertex, mesh.vertices.len(), layout.vertex_capacity)?;
        ensure_capacity(
            CapacityKind::Triangle,
            mesh.triangles.len(),
            layout.triangle_capacity(),
        )?;
        if !mesh.colors.is_empty() {
            ensure_capacity(CapacityKind::Color, mesh.colors.len(), layout.color_slots())?;

            // Run bounds must cover exactly the triangle region that is written
            let colored = mesh.colors.total_triangles();
            if colored != mesh.triangles.len() {
                return Err(SplashError::ColorRunMismatch {
                    colored,
                    triangles: mesh.triangles.len(),
                });
            }
        }

        for (triangle, indices) in mesh.triangles.iter().enumerate() {
            if let Some(&index) = indices
                .iter()
                .find(|&&i| i as usize >= mesh.vertices.len())
            {
                return Err(SplashError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count: mesh.vertices.len(),
                });
            }
        }

        mesh.vertices
            .iter()
            .enumerate()
            .map(|(vertex, v)| {
                v.to_fixed()
                    .map_err(|value| SplashError::CoordinateOutOfRange { vertex, value })
            })
            .collect()
    }

    /// Refuse images a write would extend
    fn check_image_len(&mut self) -> Result<(), SplashError> {
        let actual = self.writer.seek(SeekFrom::End(0))?;
        let required = self.layout.required_image_len();
        if actual < required {
            return Err(SplashError::ImageTooSmall { required, actual });
        }
        Ok(())
    }

    /// Write triangles, zero-filling unused slots
    fn write_triangles(&mut self, triangles: &[Triangle]) -> io::Result<()> {
        self.writer
            .seek(SeekFrom::Start(self.layout.triangle_offset))?;

        for triangle in triangles {
            for &index in triangle {
                // Bounded by vertex_capacity, checked against u16 in validate()
                self.writer.write_u16::<LittleEndian>(index as u16)?;
            }
        }
        let unused = self.layout.triangle_capacity() - triangles.len();
        for _ in 0..unused * SHORTS_PER_TRIANGLE as usize {
            self.writer.write_u16::<LittleEndian>(0)?;
        }
        Ok(())
    }

    /// Write vertices, zero-filling unused slots
    fn write_vertices(&mut self, vertices: &[[i16; 2]]) -> io::Result<()> {
        self.writer.seek(SeekFrom::Start(self.layout.vertex_offset))?;

        for &[x, y] in vertices {
            self.writer.write_i16::<LittleEndian>(x)?;
            self.writer.write_i16::<LittleEndian>(y)?;
        }
        let unused = self.layout.vertex_capacity - vertices.len();
        for _ in 0..unused {
            self.writer.write_i16::<LittleEndian>(0)?;
            self.writer.write_i16::<LittleEndian>(0)?;
        }
        Ok(())
    }

    /// Patch the code branch, color table and per-color run bounds
    fn write_palette(&mut self, colors: &ColorGroups) -> io::Result<()> {
        let layout = self.layout;

        // NOP out the single-color branch
        self.writer
            .seek(SeekFrom::Start(layout.code_patch_offset))?;
        self.writer.write_all(&CODE_PATCH)?;

        let mut triangle_index = 0u32;
        for (slot, (tag, counts)) in colors.iter().enumerate() {
            let bounds = layout.run_bounds[slot];
            let triangle_count = counts.triangle_count as u32;

            self.write_u32_at(layout.color_table[slot], tag.rgb())?;
            if bounds.start != 0 {
                self.write_u32_at(bounds.start, triangle_index * SHORTS_PER_TRIANGLE)?;
            }
            if bounds.count != 0 {
                self.write_u32_at(bounds.count, triangle_count * SHORTS_PER_TRIANGLE)?;
            }
            tracing::debug!(
                "Color slot {}: {} triangles {}..{}",
                slot,
                tag,
                triangle_index,
                triangle_index + triangle_count
            );
            triangle_index += triangle_count;
        }

        // Unused slots draw zero triangles
        for bounds in &layout.run_bounds[colors.len()..layout.color_slots()] {
            if bounds.count != 0 {
                self.write_u32_at(bounds.count, 0)?;
            }
        }
        Ok(())
    }

    fn write_u32_at(&mut self, offset: u64, value: u32) -> io::Result<()> {
        self.writer.seek(SeekFrom::Start(offset))?;
        self.writer.write_u32::<LittleEndian>(value)
    }
}

fn ensure_capacity(kind: CapacityKind, count: usize, max: usize) -> Result<(), SplashError> {
    if count > max {
        return Err(SplashError::CapacityExceeded { kind, count, max });
    }
    Ok(())
}
