//! Error types for splash mesh reading and writing

use std::fmt;
use std::io;

use thiserror::Error;

/// Which fixed capacity a mesh overflowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityKind {
    Vertex,
    Triangle,
    Color,
}

impl fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertices"),
            Self::Triangle => write!(f, "triangles"),
            Self::Color => write!(f, "color groups"),
        }
    }
}

/// Errors that can occur when parsing, reading, or writing splash meshes
#[derive(Debug, Error)]
pub enum SplashError {
    /// Malformed interchange (OBJ) record
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Object name is missing its `_#rrggbb` suffix or the suffix is malformed
    #[error(
        "{object} with color '{tag}' is not a valid color, expects color in the format of 'NAME_#xxxxxx'"
    )]
    InvalidColorFormat { object: String, tag: String },

    /// Mesh does not fit one of the fixed regions of the image
    #[error("mesh has {count} {kind}, only a maximum of {max} are allowed")]
    CapacityExceeded {
        kind: CapacityKind,
        count: usize,
        max: usize,
    },

    /// Triangle references a vertex past the end of the vertex list
    #[error("triangle {triangle} references vertex {index}, mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    /// Vertex coordinate does not fit a signed 16-bit integer after rounding
    #[error("vertex {vertex} coordinate {value} does not fit in a signed 16-bit integer")]
    CoordinateOutOfRange { vertex: usize, value: f64 },

    /// Color group triangle counts do not add up to the triangle list
    #[error("color groups cover {colored} triangles, mesh has {triangles}")]
    ColorRunMismatch { colored: usize, triangles: usize },

    /// Image is too short to hold every region of the layout
    #[error("image is {actual} bytes, layout requires at least {required}")]
    ImageTooSmall { required: u64, actual: u64 },

    /// Layout description is internally inconsistent
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    /// Layout file could not be parsed
    #[error("layout config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SplashError {
    /// Shorthand for a parse error at a 1-based line number
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            SplashError::CapacityExceeded {
                kind: CapacityKind::Vertex,
                count: 949,
                max: 948,
            }
            .to_string(),
            "mesh has 949 vertices, only a maximum of 948 are allowed"
        );
        assert_eq!(
            SplashError::parse(12, "expected 3 face indices").to_string(),
            "line 12: expected 3 face indices"
        );
        assert_eq!(
            SplashError::ImageTooSmall {
                required: 16,
                actual: 8
            }
            .to_string(),
            "image is 8 bytes, layout requires at least 16"
        );
    }
}
