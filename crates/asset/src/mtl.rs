//! Wavefront MTL material library parser.
//!
//! Transparency: `d` is read as opacity (1 = opaque). `Tr` is read as
//! transparency and stored inverted (`opacity = 1 - Tr`). Whichever of the two
//! appears last in a record wins.

use std::collections::HashMap;

use crate::{
    error::{ParseError, ParseErrorKind},
    text::{directives, parse_f32, parse_vec, require_arg},
};

pub const DEFAULT_DIFFUSE: [f32; 3] = [1.0, 1.0, 1.0];
pub const DEFAULT_AMBIENT: [f32; 3] = [0.0, 0.0, 0.0];
pub const DEFAULT_SPECULAR: [f32; 3] = [1.0, 1.0, 1.0];
pub const DEFAULT_EMISSIVE: [f32; 3] = [0.0, 0.0, 0.0];
pub const DEFAULT_SHININESS: f32 = 400.0;
pub const DEFAULT_OPACITY: f32 = 1.0;

/// Keywords that set a property on the current `newmtl` record.
const PROPERTY_KEYWORDS: &[&str] = &[
    "Kd", "Ka", "Ks", "Ke", "Ns", "Ni", "d", "Tr", "illum", "map_Kd", "map_Ns", "map_Bump",
    "bump",
];

/// Surface properties as written in the file; unset properties stay `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub diffuse: Option<[f32; 3]>,
    pub ambient: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub emissive: Option<[f32; 3]>,
    pub shininess: Option<f32>,
    pub opacity: Option<f32>,
    pub optical_density: Option<f32>,
    pub illum: Option<u32>,
    pub diffuse_map: Option<String>,
    pub specular_map: Option<String>,
    pub normal_map: Option<String>,
}

impl Material {
    /// Material used for geometry whose `usemtl` name is not in the library.
    pub fn fallback() -> Self {
        Self {
            diffuse: Some(DEFAULT_DIFFUSE),
            ambient: Some(DEFAULT_AMBIENT),
            specular: Some(DEFAULT_SPECULAR),
            shininess: Some(DEFAULT_SHININESS),
            opacity: Some(DEFAULT_OPACITY),
            ..Default::default()
        }
    }
}

/// Materials keyed by `newmtl` name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialLibrary {
    materials: HashMap<String, Material>,
}

impl MaterialLibrary {
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Insert or replace `name`.
    pub fn insert(&mut self, name: impl Into<String>, material: Material) {
        self.materials.insert(name.into(), material);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Material)> {
        self.materials.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Parse MTL text. Several libraries may be concatenated into one text; a
/// name defined twice keeps its last definition.
pub fn parse_mtl(text: &str) -> Result<MaterialLibrary, ParseError> {
    let mut library = MaterialLibrary::default();
    let mut current: Option<(String, Material)> = None;

    for (line, keyword, args) in directives(text) {
        if keyword == "newmtl" {
            let name = require_arg(args, line, "newmtl", "material name")?;
            if let Some((name, material)) = current.take() {
                library.insert(name, material);
            }
            current = Some((name.to_owned(), Material::default()));
            continue;
        }

        if !PROPERTY_KEYWORDS.contains(&keyword) {
            log::warn!("Ignoring unhandled MTL keyword '{}' on line {}", keyword, line);
            continue;
        }

        let (_, material) = current.as_mut().ok_or_else(|| {
            ParseError::new(
                line,
                ParseErrorKind::NoActiveMaterial {
                    keyword: keyword.to_owned(),
                },
            )
        })?;
        apply_property(material, keyword, args, line)?;
    }

    if let Some((name, material)) = current {
        library.insert(name, material);
    }
    Ok(library)
}

fn apply_property(
    material: &mut Material,
    keyword: &str,
    args: &str,
    line: usize,
) -> Result<(), ParseError> {
    match keyword {
        "Kd" => material.diffuse = Some(parse_vec::<3>(args, line, "Kd")?),
        "Ka" => material.ambient = Some(parse_vec::<3>(args, line, "Ka")?),
        "Ks" => material.specular = Some(parse_vec::<3>(args, line, "Ks")?),
        "Ke" => material.emissive = Some(parse_vec::<3>(args, line, "Ke")?),
        "Ns" => material.shininess = Some(parse_vec::<1>(args, line, "Ns")?[0]),
        "Ni" => material.optical_density = Some(parse_vec::<1>(args, line, "Ni")?[0]),
        "d" => material.opacity = Some(parse_vec::<1>(args, line, "d")?[0]),
        "Tr" => material.opacity = Some(1.0 - parse_vec::<1>(args, line, "Tr")?[0]),
        "illum" => {
            let token = require_arg(args, line, "illum", "model")?;
            let model = token.parse::<u32>().map_err(|_| {
                ParseError::new(
                    line,
                    ParseErrorKind::InvalidNumber {
                        token: token.to_owned(),
                    },
                )
            })?;
            material.illum = Some(model);
        }
        "map_Kd" => material.diffuse_map = Some(map_filename(args, line, "map_Kd")?),
        "map_Ns" => material.specular_map = Some(map_filename(args, line, "map_Ns")?),
        "map_Bump" | "bump" => material.normal_map = Some(map_filename(args, line, "map_Bump")?),
        _ => log::warn!("Ignoring unhandled MTL keyword '{}' on line {}", keyword, line),
    }
    Ok(())
}

/// Texture map filename with any leading option flags (`-bm 1`, `-s 1 1 1`)
/// dropped. Without options the whole argument is the name, spaces included.
fn map_filename(args: &str, line: usize, keyword: &'static str) -> Result<String, ParseError> {
    let args = require_arg(args, line, keyword, "filename")?;
    let name = if args.starts_with('-') {
        let last = args.split_whitespace().last().unwrap_or(args);
        // A trailing number means the options consumed everything.
        if parse_f32(last, line).is_ok() {
            return Err(ParseError::new(
                line,
                ParseErrorKind::MissingValue {
                    keyword,
                    what: "filename",
                },
            ));
        }
        last
    } else {
        args
    };
    Ok(name.to_owned())
}
