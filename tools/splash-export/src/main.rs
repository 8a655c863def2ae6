//! splash-export - firmware splash mesh tool
//!
//! Reads a splash mesh from an OBJ file or a firmware image, optionally
//! patches it into a firmware image and renders a wireframe preview.

use anyhow::{Context, Result};
use clap::{Args, Parser};
use splash_common::{FirmwareLayout, FirmwareReader, SplashMesh};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use splash_export::mesh::{FaceIndexing, ObjOptions, read_obj_mesh};
use splash_export::{preview, read_firmware_mesh, write_firmware_mesh};

#[derive(Parser)]
#[command(name = "splash-export")]
#[command(about = "Utility for viewing and patching firmware splash meshes")]
#[command(version)]
struct Cli {
    /// A firmware image or a Wavefront OBJ file
    input: PathBuf,

    #[command(flatten)]
    source: Source,

    /// Patch the mesh into this firmware image (modified in place)
    #[arg(short, long)]
    output_to_bios: Option<PathBuf>,

    /// Render a wireframe preview of the input mesh to this PNG file
    #[arg(short, long, value_name = "PNG")]
    visualize: Option<PathBuf>,

    /// Scale factor for OBJ input; compare the preview against the stock logo for sizing
    #[arg(short = 's', long, default_value_t = 800)]
    mesh_scale: i32,

    /// How OBJ face indices are interpreted
    #[arg(long, value_enum, default_value_t = FaceIndexing::Global)]
    face_indexing: FaceIndexing,

    /// Layout TOML overriding the built-in Cerbios layout
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Print mesh statistics and color slots
    #[arg(long)]
    info: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// Input is a firmware image
    #[arg(short, long)]
    bios: bool,

    /// Input is a Wavefront OBJ file
    #[arg(short, long)]
    mesh: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let layout = match &cli.layout {
        Some(path) => FirmwareLayout::load(path)
            .with_context(|| format!("Failed to load layout: {:?}", path))?,
        None => FirmwareLayout::cerbios(),
    };

    let mesh = if cli.source.bios {
        tracing::info!("Reading firmware image {:?}", cli.input);
        read_firmware_mesh(&cli.input, &layout)
            .with_context(|| format!("Failed to read firmware image: {:?}", cli.input))?
    } else {
        tracing::info!("Reading OBJ {:?}", cli.input);
        let options = ObjOptions {
            scale: cli.mesh_scale as f64,
            face_indexing: cli.face_indexing,
        };
        read_obj_mesh(&cli.input, &options)
            .with_context(|| format!("Failed to read OBJ: {:?}", cli.input))?
    };

    tracing::info!(
        "Mesh: {}/{} vertices, {}/{} triangles, {} colors",
        mesh.vertices.len(),
        layout.vertex_capacity,
        mesh.triangles.len(),
        layout.triangle_capacity(),
        mesh.colors.len()
    );

    if cli.info {
        print_info(&mesh, &layout, cli.source.bios.then_some(cli.input.as_path()))?;
    }

    if let Some(output) = &cli.output_to_bios {
        write_firmware_mesh(output, &layout, &mesh)
            .with_context(|| format!("Failed to patch firmware image: {:?}", output))?;
        tracing::info!("Patched {:?}", output);
    }

    if let Some(png) = &cli.visualize {
        preview::render_png(&mesh.vertices, &mesh.triangles, png)?;
    }

    Ok(())
}

/// Print color groups (OBJ input) or the image's color slots (firmware input)
fn print_info(mesh: &SplashMesh, layout: &FirmwareLayout, image: Option<&Path>) -> Result<()> {
    println!(
        "vertices:  {} (max {})",
        mesh.vertices.len(),
        layout.vertex_capacity
    );
    println!(
        "triangles: {} (max {})",
        mesh.triangles.len(),
        layout.triangle_capacity()
    );

    let Some(image) = image else {
        println!("colors:    {} (max {})", mesh.colors.len(), layout.color_slots());
        for (slot, (tag, counts)) in mesh.colors.iter().enumerate() {
            println!(
                "  slot {}: {} {} vertices, {} triangles",
                slot, tag, counts.vertex_count, counts.triangle_count
            );
        }
        return Ok(());
    };

    let file = File::open(image).with_context(|| format!("Failed to open: {:?}", image))?;
    let mut reader = FirmwareReader::new(BufReader::new(file), layout);
    let palette = reader.read_palette()?;
    let patched = reader.code_patch_applied()?;

    println!("code patch: {}", if patched { "applied" } else { "original" });
    for (slot, entry) in palette.iter().enumerate() {
        let bound = |value: Option<u32>| match value {
            Some(shorts) => (shorts / 3).to_string(),
            None => "-".to_string(),
        };
        println!(
            "  slot {}: #{:06x} start {} count {}",
            slot,
            entry.rgb(),
            bound(entry.run_start),
            bound(entry.run_length)
        );
    }
    Ok(())
}
