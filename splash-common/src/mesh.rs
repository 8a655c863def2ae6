//! In-memory splash mesh model

use std::fmt;

/// 2D vertex in firmware coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Round to the nearest integer (ties to even) and narrow to i16.
    ///
    /// Returns the first component that does not fit on failure.
    pub fn to_fixed(self) -> Result<[i16; 2], f64> {
        Ok([round_i16(self.x)?, round_i16(self.y)?])
    }
}

impl From<[i16; 2]> for Vertex {
    fn from([x, y]: [i16; 2]) -> Self {
        Self::new(x as f64, y as f64)
    }
}

fn round_i16(value: f64) -> Result<i16, f64> {
    let rounded = value.round_ties_even();
    if rounded.is_finite() && rounded >= i16::MIN as f64 && rounded <= i16::MAX as f64 {
        Ok(rounded as i16)
    } else {
        Err(value)
    }
}

/// Three 0-based indices into the flattened vertex list
pub type Triangle = [u32; 3];

/// Lower-case `#rrggbb` color tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorTag(String);

impl ColorTag {
    /// Parse a `#rrggbb` tag, case-insensitive
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.to_lowercase();
        let hex = tag.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self(tag))
    }

    /// 24-bit RGB value
    pub fn rgb(&self) -> u32 {
        // Validated in parse()
        u32::from_str_radix(&self.0[1..], 16).unwrap_or(0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vertex and triangle totals of one color group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorCounts {
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// Color groups in order of first appearance.
///
/// The firmware assigns color slots by position, so iteration order must be
/// insertion order. Adding to an existing tag accumulates in place and does
/// not move it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorGroups {
    groups: Vec<(ColorTag, ColorCounts)>,
}

impl ColorGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate counts for `tag`, appending it if unseen
    pub fn add(&mut self, tag: ColorTag, vertex_count: usize, triangle_count: usize) {
        let index = match self.groups.iter().position(|(t, _)| *t == tag) {
            Some(index) => index,
            None => {
                self.groups.push((tag, ColorCounts::default()));
                self.groups.len() - 1
            }
        };
        let counts = &mut self.groups[index].1;
        counts.vertex_count += vertex_count;
        counts.triangle_count += triangle_count;
    }

    pub fn get(&self, tag: &str) -> Option<&ColorCounts> {
        self.groups
            .iter()
            .find(|(t, _)| t.as_str() == tag)
            .map(|(_, counts)| counts)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColorTag, &ColorCounts)> {
        self.groups.iter().map(|(tag, counts)| (tag, counts))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sum of triangle counts across all groups, saturating at `usize::MAX`
    pub fn total_triangles(&self) -> usize {
        self.groups
            .iter()
            .fold(0, |sum, (_, c)| sum.saturating_add(c.triangle_count))
    }
}

/// Flattened mesh ready to be written into (or just read from) an image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplashMesh {
    /// Vertices in original declaration order
    pub vertices: Vec<Vertex>,
    /// Triangles ordered by color group
    pub triangles: Vec<Triangle>,
    /// Empty when the mesh came from a firmware image
    pub colors: ColorGroups,
}

impl SplashMesh {
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<Triangle>) -> Self {
        Self {
            vertices,
            triangles,
            colors: ColorGroups::new(),
        }
    }

    pub fn with_colors(mut self, colors: ColorGroups) -> Self {
        self.colors = colors;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> ColorTag {
        ColorTag::parse(s).unwrap()
    }

    #[test]
    fn test_color_tag_parse() {
        assert_eq!(tag("#FF00aa").as_str(), "#ff00aa");
        assert_eq!(tag("#ff00aa").rgb(), 0xff00aa);
        assert!(ColorTag::parse("ff00aa").is_none());
        assert!(ColorTag::parse("#ff00a").is_none());
        assert!(ColorTag::parse("#ff00aa0").is_none());
        assert!(ColorTag::parse("#gg0000").is_none());
        assert!(ColorTag::parse("").is_none());
    }

    #[test]
    fn test_color_groups_keep_first_insertion_order() {
        let mut groups = ColorGroups::new();
        groups.add(tag("#00ff00"), 3, 1);
        groups.add(tag("#0000ff"), 4, 2);
        groups.add(tag("#00ff00"), 5, 3);
        groups.add(tag("#ff0000"), 1, 1);

        let order: Vec<&str> = groups.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(order, ["#00ff00", "#0000ff", "#ff0000"]);
        assert_eq!(
            groups.get("#00ff00"),
            Some(&ColorCounts {
                vertex_count: 8,
                triangle_count: 4
            })
        );
        assert_eq!(groups.total_triangles(), 7);
    }

    #[test]
    fn test_vertex_rounding() {
        assert_eq!(Vertex::new(1.5, -1.5).to_fixed(), Ok([2, -2]));
        assert_eq!(Vertex::new(2.5, -0.5).to_fixed(), Ok([2, 0]));
        assert_eq!(Vertex::new(3.5, 0.5).to_fixed(), Ok([4, 0]));
        assert_eq!(Vertex::new(-2.5, 2.51).to_fixed(), Ok([-2, 3]));
        assert_eq!(Vertex::new(0.49, -0.49).to_fixed(), Ok([0, 0]));
        assert_eq!(Vertex::new(32767.4, -32768.0).to_fixed(), Ok([32767, -32768]));
        assert_eq!(Vertex::new(40000.0, 0.0).to_fixed(), Err(40000.0));
        assert!(Vertex::new(0.0, f64::NAN).to_fixed().is_err());
    }
}
