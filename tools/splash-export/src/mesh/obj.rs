//! OBJ splash mesh reader
//!
//! Each `o NAME_#rrggbb` object carries one color. Vertices keep their
//! declaration order; triangles are regrouped so every color is one
//! contiguous run, in order of first appearance.

use splash_common::{ColorGroups, ColorTag, SplashError, SplashMesh, Triangle, Vertex};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Default mesh scale, sized against the stock Cerbios logo
pub const DEFAULT_MESH_SCALE: f64 = 800.0;

/// Flips both axes into firmware screen space
const AXIS_FLIP: f64 = -1.0;

/// What a face index is relative to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FaceIndexing {
    /// Index into every vertex declared so far in the file (standard OBJ)
    #[default]
    Global,
    /// Index into the current object's own vertices; rebased on flattening
    ObjectLocal,
}

/// Options for reading an OBJ mesh
#[derive(Debug, Clone, Copy)]
pub struct ObjOptions {
    /// Multiplier applied to every coordinate
    pub scale: f64,
    pub face_indexing: FaceIndexing,
}

impl Default for ObjOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_MESH_SCALE,
            face_indexing: FaceIndexing::Global,
        }
    }
}

/// One `o` block
#[derive(Debug)]
struct ObjObject {
    color: ColorTag,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
}

/// Read an OBJ file into a flattened, color-grouped mesh
pub fn read_obj_mesh(input: &Path, options: &ObjOptions) -> Result<SplashMesh, SplashError> {
    let file = File::open(input)?;
    parse_obj(BufReader::new(file), options)
}

/// Parse OBJ text into a flattened, color-grouped mesh
pub fn parse_obj<R: BufRead>(reader: R, options: &ObjOptions) -> Result<SplashMesh, SplashError> {
    let objects = parse_objects(reader, options)?;
    Ok(flatten(objects, options.face_indexing))
}

fn parse_objects<R: BufRead>(
    reader: R,
    options: &ObjOptions,
) -> Result<Vec<ObjObject>, SplashError> {
    let mut objects: Vec<ObjObject> = Vec::new();
    let mut declared_vertices = 0usize;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "o" => {
                let name = line[1..].trim();
                let color = parse_object_color(name)?;
                tracing::info!("Loading {}", name);
                objects.push(ObjObject {
                    color,
                    vertices: Vec::new(),
                    triangles: Vec::new(),
                });
            }
            "v" => {
                let object = current_object(&mut objects, line_no, "vertex")?;
                if parts.len() < 4 {
                    return Err(SplashError::parse(line_no, "vertex needs 3 coordinates"));
                }
                let x = parse_coord(parts[1], line_no)?;
                parse_coord(parts[2], line_no)?;
                // The OBJ z axis is the firmware's y axis
                let y = parse_coord(parts[3], line_no)?;
                object.vertices.push(Vertex::new(
                    x * options.scale * AXIS_FLIP,
                    y * options.scale * AXIS_FLIP,
                ));
                declared_vertices += 1;
            }
            "f" => {
                let object = current_object(&mut objects, line_no, "face")?;
                if parts.len() != 4 {
                    return Err(SplashError::parse(
                        line_no,
                        format!(
                            "face has {} vertices, only triangles are supported",
                            parts.len() - 1
                        ),
                    ));
                }
                let available = match options.face_indexing {
                    FaceIndexing::Global => declared_vertices,
                    FaceIndexing::ObjectLocal => object.vertices.len(),
                };
                let mut triangle = [0u32; 3];
                for (slot, part) in triangle.iter_mut().zip(&parts[1..]) {
                    *slot = parse_face_index(part, available, line_no)?;
                }
                object.triangles.push(triangle);
            }
            // vt, vn, s, g, usemtl, mtllib, ...
            _ => {}
        }
    }

    Ok(objects)
}

/// Color tag is everything after the first underscore of the object name
fn parse_object_color(name: &str) -> Result<ColorTag, SplashError> {
    let tag = name.split_once('_').map(|(_, tag)| tag).unwrap_or("");
    ColorTag::parse(tag).ok_or_else(|| SplashError::InvalidColorFormat {
        object: name.to_string(),
        tag: tag.to_string(),
    })
}

fn current_object<'a>(
    objects: &'a mut [ObjObject],
    line_no: usize,
    what: &str,
) -> Result<&'a mut ObjObject, SplashError> {
    objects
        .last_mut()
        .ok_or_else(|| SplashError::parse(line_no, format!("{what} declared before any object")))
}

fn parse_coord(field: &str, line_no: usize) -> Result<f64, SplashError> {
    field
        .parse()
        .map_err(|_| SplashError::parse(line_no, format!("invalid coordinate '{field}'")))
}

/// Parse "v", "v/vt", "v/vt/vn" or "v//vn", keeping only the 0-based position index
fn parse_face_index(field: &str, available: usize, line_no: usize) -> Result<u32, SplashError> {
    let position = field.split('/').next().unwrap_or(field);
    let index: u32 = position
        .parse()
        .map_err(|_| SplashError::parse(line_no, format!("invalid face index '{field}'")))?;
    let index = index
        .checked_sub(1)
        .ok_or_else(|| SplashError::parse(line_no, "face indices are 1-based"))?;
    if index as usize >= available {
        return Err(SplashError::parse(
            line_no,
            format!(
                "face references vertex {} but only {} are declared",
                index + 1,
                available
            ),
        ));
    }
    Ok(index)
}

/// Concatenate vertices in declaration order and triangles by color group
fn flatten(objects: Vec<ObjObject>, face_indexing: FaceIndexing) -> SplashMesh {
    let mut vertices = Vec::new();
    let mut bases = Vec::with_capacity(objects.len());
    let mut colors = ColorGroups::new();
    for object in &objects {
        bases.push(vertices.len() as u32);
        vertices.extend_from_slice(&object.vertices);
        colors.add(
            object.color.clone(),
            object.vertices.len(),
            object.triangles.len(),
        );
    }

    let mut triangles = Vec::with_capacity(colors.total_triangles());
    for (tag, _) in colors.iter() {
        for (object, &base) in objects.iter().zip(&bases) {
            if object.color != *tag {
                continue;
            }
            let base = match face_indexing {
                FaceIndexing::Global => 0,
                FaceIndexing::ObjectLocal => base,
            };
            triangles.extend(object.triangles.iter().map(|t| t.map(|i| i + base)));
        }
    }

    tracing::debug!(
        "Flattened {} objects: {} vertices, {} triangles, {} colors",
        objects.len(),
        vertices.len(),
        triangles.len(),
        colors.len()
    );
    SplashMesh {
        vertices,
        triangles,
        colors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splash_common::ColorCounts;

    fn parse(text: &str) -> Result<SplashMesh, SplashError> {
        parse_obj(text.as_bytes(), &ObjOptions::default())
    }

    fn parse_with(text: &str, scale: f64, face_indexing: FaceIndexing) -> SplashMesh {
        parse_obj(
            text.as_bytes(),
            &ObjOptions {
                scale,
                face_indexing,
            },
        )
        .unwrap()
    }

    const TWO_OBJECTS: &str = "\
# two colored parts
o body_#112233
v 0 0 0
v 1 0 0
v 0 0 1
f 1/1/1 2/2/1 3/3/1
o wing_#445566
v 2 0 0
v 3 0 0
v 2 0 1
f 4//2 5//2 6//2
";

    #[test]
    fn test_two_objects_grouped_by_color() {
        let mesh = parse_with(TWO_OBJECTS, 1.0, FaceIndexing::Global);

        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.vertices[0], Vertex::new(-0.0, -0.0));
        assert_eq!(mesh.vertices[3], Vertex::new(-2.0, -0.0));
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [3, 4, 5]]);

        let order: Vec<&str> = mesh.colors.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(order, ["#112233", "#445566"]);
        let expected = ColorCounts {
            vertex_count: 3,
            triangle_count: 1,
        };
        assert_eq!(mesh.colors.get("#112233"), Some(&expected));
        assert_eq!(mesh.colors.get("#445566"), Some(&expected));
    }

    #[test]
    fn test_axis_transform() {
        let mesh = parse_with("o a_#000000\nv 2.0 5.0 -3.0\n", 10.0, FaceIndexing::Global);
        assert_eq!(mesh.vertices, vec![Vertex::new(-20.0, 30.0)]);
    }

    #[test]
    fn test_half_units_round_to_even() {
        let text = "o a_#000000\nv -2.5 0 -3.5\nv 0.5 0 1.5\n";
        let mesh = parse_with(text, 1.0, FaceIndexing::Global);
        assert_eq!(mesh.vertices[0].to_fixed(), Ok([2, 4]));
        assert_eq!(mesh.vertices[1].to_fixed(), Ok([0, -2]));
    }

    #[test]
    fn test_shared_color_runs_are_contiguous() {
        // red, blue, red: the second red object joins the first red run,
        // vertices stay in declaration order
        let text = "\
o a_#ff0000
v 0 0 0
v 1 0 0
v 0 0 1
f 1 2 3
o b_#0000ff
v 5 0 5
v 6 0 5
v 5 0 6
f 4 5 6
o c_#FF0000
v 9 0 9
v 8 0 9
v 9 0 8
f 7 8 9
f 9 8 7
";
        let mesh = parse_with(text, 1.0, FaceIndexing::Global);

        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.vertices[6], Vertex::new(-9.0, -9.0));
        assert_eq!(
            mesh.triangles,
            vec![[0, 1, 2], [6, 7, 8], [8, 7, 6], [3, 4, 5]]
        );
        let order: Vec<&str> = mesh.colors.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(order, ["#ff0000", "#0000ff"]);
        assert_eq!(
            mesh.colors.get("#ff0000"),
            Some(&ColorCounts {
                vertex_count: 6,
                triangle_count: 3
            })
        );
        // Every triangle still lands on the vertices its face named
        assert_eq!(mesh.vertices[mesh.triangles[1][0] as usize], Vertex::new(-9.0, -9.0));
    }

    #[test]
    fn test_object_local_indices_rebased() {
        let text = "\
o a_#ff0000
v 0 0 0
v 1 0 0
v 0 0 1
f 1 2 3
o b_#0000ff
v 5 0 5
v 6 0 5
v 5 0 6
f 1 2 3
o c_#ff0000
v 9 0 9
v 8 0 9
v 9 0 8
f 3 2 1
";
        let mesh = parse_with(text, 1.0, FaceIndexing::ObjectLocal);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [8, 7, 6], [3, 4, 5]]);
    }

    #[test]
    fn test_object_local_index_past_object_rejected() {
        let text = "o a_#ff0000\nv 0 0 0\nv 1 0 0\no b_#00ff00\nv 0 0 0\nf 1 2 3\n";
        let err = parse_obj(
            text.as_bytes(),
            &ObjOptions {
                scale: 1.0,
                face_indexing: FaceIndexing::ObjectLocal,
            },
        )
        .unwrap_err();
        assert!(matches!(err, SplashError::Parse { line: 6, .. }), "{err}");
    }

    #[test]
    fn test_missing_color_tag() {
        let err = parse("o wingred\nv 0 0 0\n").unwrap_err();
        match err {
            SplashError::InvalidColorFormat { object, tag } => {
                assert_eq!(object, "wingred");
                assert_eq!(tag, "");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_color_tags() {
        for name in ["wing_ff00aa", "wing_#ff00a", "wing_#ff00zz", "wing_#ff00aa_left", "o"] {
            let err = parse(&format!("o {name}\n")).unwrap_err();
            assert!(
                matches!(err, SplashError::InvalidColorFormat { .. }),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_malformed_vertex() {
        let err = parse("o a_#000000\nv 1.0 abc 2.0\n").unwrap_err();
        assert!(matches!(err, SplashError::Parse { line: 2, .. }), "{err}");

        let err = parse("o a_#000000\nv 1.0 2.0\n").unwrap_err();
        assert!(matches!(err, SplashError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_malformed_faces() {
        let base = "o a_#000000\nv 0 0 0\nv 1 0 0\nv 0 0 1\nv 1 0 1\n";
        for face in ["f 1 2", "f 1 2 3 4", "f 0 1 2", "f 1 x 3", "f 1 2 5", "f -1 2 3"] {
            let err = parse(&format!("{base}{face}\n")).unwrap_err();
            assert!(
                matches!(err, SplashError::Parse { line: 6, .. }),
                "{face}: {err}"
            );
        }
    }

    #[test]
    fn test_records_before_object_rejected() {
        let err = parse("v 0 0 0\n").unwrap_err();
        assert!(matches!(err, SplashError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_ignored_records() {
        let text = "\
mtllib logo.mtl
o a_#abcdef
v 0 0 0
vt 0 0
vn 0 1 0
v 1 0 0
v 0 0 1
usemtl none
s off
f 1/1/1 2/1/1 3/1/1
";
        let mesh = parse_with(text, 1.0, FaceIndexing::Global);
        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(mesh.triangles, vec![[0, 1, 2]]);
        assert_eq!(mesh.colors.len(), 1);
    }

    #[test]
    fn test_empty_file() {
        let mesh = parse("").unwrap();
        assert!(mesh.vertices.is_empty());
        assert!(mesh.triangles.is_empty());
        assert!(mesh.colors.is_empty());
    }
}
