//! Wireframe preview of a splash mesh
//!
//! Draws every vertex as a dot and every triangle as three edges through
//! the [`MeshCanvas`] trait. [`PngCanvas`] rasterizes into an image file.

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use splash_common::{Triangle, Vertex};
use std::path::Path;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Default preview size in pixels (square)
pub const CANVAS_SIZE: u32 = 1000;

/// Drawing surface for [`draw_mesh`]
pub trait MeshCanvas {
    /// Draw a filled dot centered at `center`
    fn draw_point(&mut self, center: (f32, f32), radius: f32);

    /// Draw a line segment
    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32));
}

/// Mapping from firmware coordinates to canvas pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Canvas position of the firmware origin
    pub center: (f32, f32),
    /// Pixels per firmware unit
    pub scale: f32,
    /// Dot radius for vertices
    pub point_radius: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        let half = CANVAS_SIZE as f32 / 2.0;
        Self {
            center: (half, half),
            scale: 2.0,
            point_radius: 1.0,
        }
    }
}

impl ViewTransform {
    /// Firmware y grows upward and x is mirrored relative to the canvas
    pub fn apply(&self, vertex: Vertex) -> (f32, f32) {
        (
            self.center.0 - vertex.x as f32 * self.scale,
            self.center.1 - vertex.y as f32 * self.scale,
        )
    }
}

/// Draw all vertices and triangle edges.
///
/// Returns the number of triangles skipped because they reference a
/// vertex that does not exist.
pub fn draw_mesh<C: MeshCanvas + ?Sized>(
    canvas: &mut C,
    vertices: &[Vertex],
    triangles: &[Triangle],
    view: &ViewTransform,
) -> usize {
    for &vertex in vertices {
        canvas.draw_point(view.apply(vertex), view.point_radius);
    }

    let mut skipped = 0;
    for triangle in triangles {
        let corners: Option<Vec<(f32, f32)>> = triangle
            .iter()
            .map(|&i| vertices.get(i as usize).map(|&v| view.apply(v)))
            .collect();
        let Some(corners) = corners else {
            skipped += 1;
            continue;
        };
        for edge in 0..3 {
            canvas.draw_line(corners[edge], corners[(edge + 1) % 3]);
        }
    }

    if skipped > 0 {
        tracing::warn!("Skipped {} triangles with out-of-range vertices", skipped);
    }
    skipped
}

/// Black-on-white raster canvas
pub struct PngCanvas {
    image: RgbaImage,
}

impl PngCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, WHITE),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Save as PNG
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write preview: {:?}", path))
    }
}

impl MeshCanvas for PngCanvas {
    fn draw_point(&mut self, center: (f32, f32), radius: f32) {
        draw_filled_circle_mut(
            &mut self.image,
            (center.0.round() as i32, center.1.round() as i32),
            radius.round() as i32,
            BLACK,
        );
    }

    fn draw_line(&mut self, from: (f32, f32), to: (f32, f32)) {
        draw_line_segment_mut(&mut self.image, from, to, BLACK);
    }
}

/// Render a mesh with the default view and save it as a PNG
pub fn render_png(vertices: &[Vertex], triangles: &[Triangle], output: &Path) -> Result<()> {
    let mut canvas = PngCanvas::new(CANVAS_SIZE, CANVAS_SIZE);
    draw_mesh(&mut canvas, vertices, triangles, &ViewTransform::default());
    canvas.save(output)?;
    tracing::info!(
        "Rendered preview: {} vertices, {} triangles -> {:?}",
        vertices.len(),
        triangles.len(),
        output
    );
    Ok(())
}
