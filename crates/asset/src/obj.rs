//! Wavefront OBJ parser producing per-material geometry groups.
//!
//! Faces are expanded into non-indexed triangle lists (fan triangulation from
//! the first vertex). Indices are 1-based; negative indices count back from
//! the attributes declared so far (`-1` is the latest). Index `0` and indices
//! outside the declared range are rejected instead of being clamped.

use crate::{
    error::{ParseError, ParseErrorKind},
    mesh::{DEFAULT_NORMAL, DEFAULT_TEXCOORD, VertexStreams},
    text::{directives, parse_floats, parse_vec, require_arg},
};

const DEFAULT_NAME: &str = "default";

/// One mesh chunk, tagged with the object, groups and material that were
/// active when its first face was declared.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub object: String,
    pub groups: Vec<String>,
    pub material: String,
    pub data: VertexStreams,
}

/// Parsed OBJ file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjModel {
    /// Every `v` declared in the file, whether or not a face uses it.
    pub positions: Vec<[f32; 3]>,
    /// Geometry groups in declaration order. Never contains an empty group.
    pub geometries: Vec<Geometry>,
    /// `mtllib` arguments, verbatim and in order.
    pub material_libs: Vec<String>,
}

impl ObjModel {
    pub fn triangle_count(&self) -> usize {
        self.geometries
            .iter()
            .map(|g| g.data.vertex_count() / 3)
            .sum()
    }
}

/// Parse OBJ text.
pub fn parse_obj(text: &str) -> Result<ObjModel, ParseError> {
    let mut parser = ObjParser::default();
    for (line, keyword, args) in directives(text) {
        parser.directive(line, keyword, args)?;
    }
    Ok(parser.finish())
}

#[derive(Clone, Copy, Debug)]
struct FaceVertex {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

struct ObjParser {
    positions: Vec<[f32; 3]>,
    colors: Vec<Option<[f32; 3]>>,
    normals: Vec<[f32; 3]>,
    texcoords: Vec<[f32; 2]>,

    geometries: Vec<Geometry>,
    /// Index into `geometries` of the group faces are appended to.
    open: Option<usize>,
    object: String,
    groups: Vec<String>,
    material: String,
    material_libs: Vec<String>,
}

impl Default for ObjParser {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            colors: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            geometries: Vec::new(),
            open: None,
            object: DEFAULT_NAME.to_owned(),
            groups: vec![DEFAULT_NAME.to_owned()],
            material: DEFAULT_NAME.to_owned(),
            material_libs: Vec::new(),
        }
    }
}

impl ObjParser {
    fn directive(&mut self, line: usize, keyword: &str, args: &str) -> Result<(), ParseError> {
        match keyword {
            "v" => {
                let values = parse_floats(args, line)?;
                if values.len() < 3 {
                    return Err(ParseError::new(
                        line,
                        ParseErrorKind::MissingValue {
                            keyword: "v",
                            what: "coordinate",
                        },
                    ));
                }
                self.positions.push([values[0], values[1], values[2]]);
                // `v x y z w` carries a weight, not a colour.
                let color = (values.len() >= 6).then(|| [values[3], values[4], values[5]]);
                self.colors.push(color);
            }
            "vn" => self.normals.push(parse_vec::<3>(args, line, "vn")?),
            "vt" => self.texcoords.push(parse_vec::<2>(args, line, "vt")?),
            "f" => self.face(line, args)?,
            "s" => {}
            "mtllib" => {
                let file = require_arg(args, line, "mtllib", "filename")?;
                self.material_libs.push(file.to_owned());
            }
            "usemtl" => {
                self.material = require_arg(args, line, "usemtl", "material name")?.to_owned();
                self.close_geometry();
            }
            "o" => {
                self.object = require_arg(args, line, "o", "object name")?.to_owned();
                self.close_geometry();
            }
            "g" => {
                self.groups = args.split_whitespace().map(str::to_owned).collect();
                if self.groups.is_empty() {
                    self.groups.push(DEFAULT_NAME.to_owned());
                }
                self.close_geometry();
            }
            other => {
                log::warn!("Ignoring unhandled OBJ keyword '{}' on line {}", other, line);
            }
        }
        Ok(())
    }

    fn face(&mut self, line: usize, args: &str) -> Result<(), ParseError> {
        // Resolve every vertex before touching the geometry so a bad record
        // leaves nothing half-written.
        let verts = args
            .split_whitespace()
            .map(|token| self.face_vertex(token, line))
            .collect::<Result<Vec<_>, _>>()?;
        if verts.len() < 3 {
            return Err(ParseError::new(
                line,
                ParseErrorKind::IncompleteFace { count: verts.len() },
            ));
        }

        let index = self.open_geometry();
        // Fan triangulation: (v0, vi, vi+1).
        for tri in 1..(verts.len() - 1) {
            for v in [verts[0], verts[tri], verts[tri + 1]] {
                self.push_vertex(index, v);
            }
        }
        Ok(())
    }

    fn face_vertex(&self, token: &str, line: usize) -> Result<FaceVertex, ParseError> {
        let mut split = token.split('/');
        let position = match split.next() {
            Some(value) if !value.is_empty() => resolve_index(value, self.positions.len(), line)?,
            _ => {
                return Err(ParseError::new(
                    line,
                    ParseErrorKind::InvalidIndex {
                        token: token.to_owned(),
                    },
                ));
            }
        };
        let texcoord = match split.next() {
            Some(value) if !value.is_empty() => {
                Some(resolve_index(value, self.texcoords.len(), line)?)
            }
            _ => None,
        };
        let normal = match split.next() {
            Some(value) if !value.is_empty() => {
                Some(resolve_index(value, self.normals.len(), line)?)
            }
            _ => None,
        };
        Ok(FaceVertex {
            position,
            texcoord,
            normal,
        })
    }

    fn open_geometry(&mut self) -> usize {
        if let Some(index) = self.open {
            return index;
        }
        self.geometries.push(Geometry {
            object: self.object.clone(),
            groups: self.groups.clone(),
            material: self.material.clone(),
            data: VertexStreams::default(),
        });
        let index = self.geometries.len() - 1;
        self.open = Some(index);
        index
    }

    fn close_geometry(&mut self) {
        self.open = None;
    }

    fn push_vertex(&mut self, geometry: usize, v: FaceVertex) {
        let data = &mut self.geometries[geometry].data;
        data.position.extend_from_slice(&self.positions[v.position]);
        let count = data.vertex_count();
        push_attribute(
            &mut data.texcoord,
            v.texcoord.map(|t| self.texcoords[t]),
            DEFAULT_TEXCOORD,
            count,
        );
        push_attribute(
            &mut data.normal,
            v.normal.map(|n| self.normals[n]),
            DEFAULT_NORMAL,
            count,
        );
        if let Some(color) = self.colors[v.position] {
            data.color.extend_from_slice(&color);
        }
    }

    fn finish(self) -> ObjModel {
        ObjModel {
            positions: self.positions,
            geometries: self.geometries,
            material_libs: self.material_libs,
        }
    }
}

/// Append one vertex's attribute. Once a geometry has the attribute at all,
/// earlier and later vertices without it get `default`, so the stream stays
/// aligned with the positions.
fn push_attribute<const N: usize>(
    stream: &mut Vec<f32>,
    value: Option<[f32; N]>,
    default: [f32; N],
    vertex_count: usize,
) {
    match value {
        Some(value) => {
            while stream.len() < (vertex_count - 1) * N {
                stream.extend_from_slice(&default);
            }
            stream.extend_from_slice(&value);
        }
        None if !stream.is_empty() => stream.extend_from_slice(&default),
        None => {}
    }
}

fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize, ParseError> {
    let raw = match token.parse::<i64>() {
        Ok(raw) if raw != 0 => raw,
        _ => {
            return Err(ParseError::new(
                line,
                ParseErrorKind::InvalidIndex {
                    token: token.to_owned(),
                },
            ));
        }
    };

    let idx = if raw > 0 { raw - 1 } else { len as i64 + raw };
    if idx < 0 || idx >= len as i64 {
        return Err(ParseError::new(
            line,
            ParseErrorKind::IndexOutOfRange { index: raw, len },
        ));
    }
    Ok(idx as usize)
}
