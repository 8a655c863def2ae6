//! Firmware layout descriptor
//!
//! Describes where the splash mesh lives inside a firmware image. Every
//! offset here is a file offset; addresses taken from a disassembler are
//! converted by subtracting the image base when the layout is built.
//!
//! # Regions
//! ```text
//! triangles:  short_count x u16 LE   (3 shorts per triangle)
//! vertices:   vertex_capacity x (i16 LE, i16 LE)
//! code patch: 2 bytes, 0x90 0x90 when multi-color data is written
//! colors:     one u32 LE per slot, low 24 bits = RGB
//! run bounds: (start, count) u32 LE pairs, measured in shorts; 0 = not patched
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::SplashError;

/// Load address of the Cerbios image (as seen in a disassembler)
pub const CERBIOS_IMAGE_BASE: u64 = 0x8001_0000;

/// Two x86 `nop` instructions
pub const CODE_PATCH: [u8; 2] = [0x90, 0x90];

/// Bytes per triangle record (3 x u16)
pub const TRIANGLE_RECORD_SIZE: u64 = 6;

/// Bytes per vertex record (2 x i16)
pub const VERTEX_RECORD_SIZE: u64 = 4;

/// Bytes per color table entry and per run bound field (u32)
pub const WORD_SIZE: u64 = 4;

/// Shorts written per triangle; run bounds are measured in shorts
pub const SHORTS_PER_TRIANGLE: u32 = 3;

/// File offsets of one color slot's run start and run length.
///
/// Either offset may be `0`, meaning that bound is implicit for the slot
/// and is never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBoundsSlot {
    pub start: u64,
    pub count: u64,
}

impl RunBoundsSlot {
    pub const fn new(start: u64, count: u64) -> Self {
        Self { start, count }
    }
}

/// Immutable description of the mesh regions of one firmware variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirmwareLayout {
    /// Offset of the triangle index array
    pub triangle_offset: u64,
    /// Number of u16 values in the triangle index array
    pub triangle_short_count: usize,
    /// Offset of the vertex array
    pub vertex_offset: u64,
    /// Number of vertex records
    pub vertex_capacity: usize,
    /// Offset of the 2-byte safe-mode branch
    pub code_patch_offset: u64,
    /// Color table entries, in slot order
    pub color_table: Vec<u64>,
    /// Run bound fields, in slot order
    pub run_bounds: Vec<RunBoundsSlot>,
    /// Number of color groups the firmware can draw
    pub max_colors: usize,
}

impl Default for FirmwareLayout {
    fn default() -> Self {
        Self::cerbios()
    }
}

impl FirmwareLayout {
    /// Layout of the Cerbios splash logo
    pub fn cerbios() -> Self {
        let at = |address: u64| address - CERBIOS_IMAGE_BASE;
        Self {
            triangle_offset: at(0x8007_5bb0),
            triangle_short_count: 4536,
            vertex_offset: at(0x8007_7f20),
            vertex_capacity: 948,
            code_patch_offset: at(0x8007_25f6),
            color_table: vec![
                at(0x8004_4373), // text
                at(0x8004_4377), // safe mode
                at(0x8004_437f),
                at(0x8004_437b),
                at(0x8004_4383),
                // Unusable: the triangle budget runs out before this slot
                at(0x8004_4387),
            ],
            run_bounds: vec![
                RunBoundsSlot::new(0, at(0x8007_25f2)),
                RunBoundsSlot::new(at(0x8007_25f2), at(0x8007_2606)),
                RunBoundsSlot::new(at(0x8007_2668), at(0x8007_2663)),
                RunBoundsSlot::new(at(0x8007_264b), at(0x8007_2646)),
                RunBoundsSlot::new(at(0x8007_2685), at(0x8007_2680)),
            ],
            max_colors: 5,
        }
    }

    /// Load a layout from a TOML file
    pub fn load(path: &Path) -> Result<Self, SplashError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse a layout from TOML text (see [`LayoutConfig`])
    pub fn from_toml_str(text: &str) -> Result<Self, SplashError> {
        let config: LayoutConfig = toml::from_str(text)?;
        config.resolve()
    }

    /// Maximum number of triangles
    pub fn triangle_capacity(&self) -> usize {
        self.triangle_short_count / SHORTS_PER_TRIANGLE as usize
    }

    /// Size in bytes of the triangle index array
    pub fn triangle_region_len(&self) -> u64 {
        self.triangle_capacity() as u64 * TRIANGLE_RECORD_SIZE
    }

    /// Size in bytes of the vertex array
    pub fn vertex_region_len(&self) -> u64 {
        self.vertex_capacity as u64 * VERTEX_RECORD_SIZE
    }

    /// Color slots that can actually be written
    pub fn color_slots(&self) -> usize {
        self.max_colors
            .min(self.color_table.len())
            .min(self.run_bounds.len())
    }

    /// Smallest image length that contains every region
    pub fn required_image_len(&self) -> u64 {
        let fields = self
            .color_table
            .iter()
            .chain(self.run_bounds.iter().flat_map(|b| [&b.start, &b.count]))
            .filter(|&&offset| offset != 0)
            .map(|&offset| offset + WORD_SIZE);

        [
            self.triangle_offset + self.triangle_region_len(),
            self.vertex_offset + self.vertex_region_len(),
            self.code_patch_offset + CODE_PATCH.len() as u64,
        ]
        .into_iter()
        .chain(fields)
        .max()
        .unwrap_or(0)
    }

    /// Check the layout for inconsistencies that would corrupt an image
    pub fn validate(&self) -> Result<(), SplashError> {
        if self.triangle_short_count % SHORTS_PER_TRIANGLE as usize != 0 {
            return Err(SplashError::InvalidLayout(format!(
                "triangle short count {} is not a multiple of {}",
                self.triangle_short_count, SHORTS_PER_TRIANGLE
            )));
        }
        if self.vertex_capacity > u16::MAX as usize + 1 {
            return Err(SplashError::InvalidLayout(format!(
                "vertex capacity {} cannot be addressed by u16 indices",
                self.vertex_capacity
            )));
        }
        if self.max_colors > self.color_table.len() || self.max_colors > self.run_bounds.len() {
            return Err(SplashError::InvalidLayout(format!(
                "max_colors {} exceeds {} color table entries / {} run bound slots",
                self.max_colors,
                self.color_table.len(),
                self.run_bounds.len()
            )));
        }

        let tri = self.triangle_offset..self.triangle_offset + self.triangle_region_len();
        let vert = self.vertex_offset..self.vertex_offset + self.vertex_region_len();
        if tri.start < vert.end && vert.start < tri.end {
            return Err(SplashError::InvalidLayout(
                "triangle and vertex regions overlap".to_string(),
            ));
        }
        Ok(())
    }
}

/// On-disk layout description.
///
/// Addresses are given as the disassembler shows them and are converted to
/// file offsets by subtracting `image_base`. A run bound address of `0`
/// stays `0`.
///
/// ```toml
/// image_base = 0x80010000
/// max_colors = 5
///
/// [triangles]
/// address = 0x80075bb0
/// short_count = 4536
///
/// [vertices]
/// address = 0x80077f20
/// count = 948
///
/// [code_patch]
/// address = 0x800725f6
///
/// [colors]
/// table = [0x80044373, 0x80044377]
/// run_bounds = [[0, 0x800725f2], [0x800725f2, 0x80072606]]
/// ```
#[derive(Debug, Deserialize)]
pub struct LayoutConfig {
    #[serde(default)]
    pub image_base: u64,
    pub max_colors: usize,
    pub triangles: TriangleSection,
    pub vertices: VertexSection,
    pub code_patch: CodePatchSection,
    pub colors: ColorSection,
}

#[derive(Debug, Deserialize)]
pub struct TriangleSection {
    pub address: u64,
    pub short_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct VertexSection {
    pub address: u64,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CodePatchSection {
    pub address: u64,
}

#[derive(Debug, Deserialize)]
pub struct ColorSection {
    pub table: Vec<u64>,
    pub run_bounds: Vec<(u64, u64)>,
}

impl LayoutConfig {
    /// Convert addresses to file offsets and validate the result
    pub fn resolve(&self) -> Result<FirmwareLayout, SplashError> {
        let base = self.image_base;
        let offset = |what: &str, address: u64| {
            address.checked_sub(base).ok_or_else(|| {
                SplashError::InvalidLayout(format!(
                    "{what} address {address:#x} is below image base {base:#x}"
                ))
            })
        };
        let bound = |what: &str, address: u64| {
            if address == 0 {
                Ok(0)
            } else {
                offset(what, address)
            }
        };

        let layout = FirmwareLayout {
            triangle_offset: offset("triangle", self.triangles.address)?,
            triangle_short_count: self.triangles.short_count,
            vertex_offset: offset("vertex", self.vertices.address)?,
            vertex_capacity: self.vertices.count,
            code_patch_offset: offset("code patch", self.code_patch.address)?,
            color_table: self
                .colors
                .table
                .iter()
                .map(|&a| offset("color table", a))
                .collect::<Result<_, _>>()?,
            run_bounds: self
                .colors
                .run_bounds
                .iter()
                .map(|&(start, count)| {
                    Ok(RunBoundsSlot::new(
                        bound("run start", start)?,
                        bound("run count", count)?,
                    ))
                })
                .collect::<Result<_, SplashError>>()?,
            max_colors: self.max_colors,
        };

        layout.validate()?;
        Ok(layout)
    }
}
