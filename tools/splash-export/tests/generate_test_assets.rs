//! Test asset generation
//!
//! Writes small OBJ meshes and blank firmware images for integration tests.

use splash_common::FirmwareLayout;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Byte used to fill blank images so untouched regions are recognizable
pub const FILL: u8 = 0x5a;

/// Blank image just large enough for the layout
pub fn generate_blank_image(path: &Path, layout: &FirmwareLayout) -> std::io::Result<()> {
    fs::write(path, vec![FILL; layout.required_image_len() as usize])
}

/// Two-color logo: a red body and a blue wing, one triangle each
pub fn generate_two_color_obj(path: &Path) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;

    writeln!(file, "# Two colored parts")?;
    writeln!(file, "o body_#ff0000")?;
    writeln!(file, "v 0.00 0.0 0.00")?;
    writeln!(file, "v 0.05 0.0 0.00")?;
    writeln!(file, "v 0.00 0.0 0.05")?;
    writeln!(file, "vn 0 1 0")?;
    writeln!(file, "f 1//1 2//1 3//1")?;
    writeln!(file, "o wing_#0000FF")?;
    writeln!(file, "v -0.10 0.0 -0.10")?;
    writeln!(file, "v -0.05 0.0 -0.10")?;
    writeln!(file, "v -0.10 0.0 -0.05")?;
    writeln!(file, "f 4//1 5//1 6//1")?;
    Ok(())
}

/// Single-color strip with `vertex_count` vertices
pub fn generate_strip_obj(path: &Path, vertex_count: usize) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;

    writeln!(file, "o strip_#ffffff")?;
    for i in 0..vertex_count {
        writeln!(file, "v {} 0 {}", i as f32 * 0.001, (i % 2) as f32 * 0.01)?;
    }
    for i in 1..vertex_count.saturating_sub(1) {
        writeln!(file, "f {} {} {}", i, i + 1, i + 2)?;
    }
    Ok(())
}
