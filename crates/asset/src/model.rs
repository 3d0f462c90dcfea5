//! One-shot model loading: OBJ, its material libraries and diffuse textures.

use std::collections::HashMap;

use futures::future::{join_all, try_join_all};

use crate::{
    error::LoadError,
    mtl::{MaterialLibrary, parse_mtl},
    obj::{ObjModel, parse_obj},
    source::{AssetSource, resolve_relative},
    texture::TextureData,
};

/// Everything needed to assemble a scene, fully fetched and parsed.
#[derive(Clone, Debug, Default)]
pub struct LoadedModel {
    pub obj: ObjModel,
    pub materials: MaterialLibrary,
    /// Decoded diffuse maps keyed by material name. Materials without a map,
    /// or whose map failed to load, have no entry.
    pub textures: HashMap<String, TextureData>,
}

/// Fetch and parse `obj_path` and everything it references.
///
/// All `mtllib` files are fetched concurrently and joined before parsing;
/// any fetch or parse failure aborts the load. Diffuse textures are then
/// fetched concurrently too, but a texture that cannot be fetched or decoded
/// only leaves its material untextured.
pub async fn load_model<S: AssetSource>(
    source: &S,
    obj_path: &str,
) -> Result<LoadedModel, LoadError> {
    let text = fetch_text(source, obj_path).await?;
    let obj = parse_obj(&text).map_err(|source| LoadError::Parse {
        path: obj_path.to_owned(),
        source,
    })?;
    log::info!(
        "Parsed {}: {} vertices, {} geometries, {} triangles",
        obj_path,
        obj.positions.len(),
        obj.geometries.len(),
        obj.triangle_count()
    );

    let lib_paths: Vec<String> = obj
        .material_libs
        .iter()
        .map(|file| resolve_relative(obj_path, file))
        .collect();
    let lib_texts = try_join_all(lib_paths.iter().map(|path| fetch_text(source, path))).await?;
    let materials = parse_mtl(&lib_texts.join("\n")).map_err(|source| LoadError::Parse {
        path: lib_paths.join(", "),
        source,
    })?;
    log::info!("Loaded {} materials from {:?}", materials.len(), lib_paths);

    let pending = materials.iter().filter_map(|(name, material)| match &material.diffuse_map {
        Some(map) => Some(load_texture(source, name, resolve_relative(obj_path, map))),
        None => {
            log::info!("Material {} does not have a diffuse map, using solid color.", name);
            None
        }
    });
    let textures = join_all(pending).await.into_iter().flatten().collect();

    Ok(LoadedModel {
        obj,
        materials,
        textures,
    })
}

async fn fetch_text<S: AssetSource>(source: &S, path: &str) -> Result<String, LoadError> {
    let bytes = source.fetch(path).await.map_err(|err| LoadError::Fetch {
        path: path.to_owned(),
        source: err,
    })?;
    String::from_utf8(bytes).map_err(|_| LoadError::Encoding {
        path: path.to_owned(),
    })
}

async fn load_texture<S: AssetSource>(
    source: &S,
    material: &str,
    path: String,
) -> Option<(String, TextureData)> {
    let bytes = match source.fetch(&path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            log::info!(
                "Material {}: texture {} unavailable ({}), using solid color.",
                material,
                path,
                err
            );
            return None;
        }
    };
    match TextureData::decode(&bytes) {
        Ok(texture) => {
            log::info!(
                "Material {}: loaded {}x{} texture {}",
                material,
                texture.width,
                texture.height,
                path
            );
            Some((material.to_owned(), texture))
        }
        Err(err) => {
            log::info!(
                "Material {}: cannot decode {} ({}), using solid color.",
                material,
                path,
                err
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{error::FetchError, texture::encode_png};

    #[derive(Default)]
    struct MemorySource {
        files: HashMap<String, Vec<u8>>,
        fetched: RefCell<Vec<String>>,
    }

    impl MemorySource {
        fn with(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
            self.files.insert(path.to_owned(), bytes.into());
            self
        }
    }

    impl AssetSource for MemorySource {
        async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
            self.fetched.borrow_mut().push(path.to_owned());
            self.files.get(path).cloned().ok_or_else(|| FetchError::NotFound {
                path: path.into(),
            })
        }
    }

    const OBJ: &str = "
        mtllib body.mtl
        mtllib extra.mtl
        v 0 0 0
        v 1 0 0
        v 0 1 0
        usemtl skin
        f 1 2 3
        usemtl plate
        f 1 3 2
    ";

    fn model_source() -> MemorySource {
        MemorySource::default()
            .with("m/knight.obj", OBJ)
            .with("m/body.mtl", "newmtl skin\nKd 1 0.5 0.5\nmap_Kd skin.png\n")
            .with("m/extra.mtl", "newmtl plate\nKd 0.5 0.5 0.5\nmap_Kd missing.png\n")
            .with("m/skin.png", encode_png(2, 2, [255, 0, 0, 255]))
    }

    #[test]
    fn loads_obj_materials_and_textures() {
        let source = model_source();
        let model = pollster::block_on(load_model(&source, "m/knight.obj")).unwrap();

        assert_eq!(model.obj.geometries.len(), 2);
        assert_eq!(model.materials.len(), 2);
        assert_eq!(model.materials.get("skin").unwrap().diffuse, Some([1.0, 0.5, 0.5]));

        // The missing map is tolerated: "plate" just stays untextured.
        assert_eq!(model.textures.len(), 1);
        assert_eq!(model.textures["skin"].width, 2);
        assert!(!model.textures.contains_key("plate"));

        let fetched = source.fetched.borrow();
        assert_eq!(&fetched[..3], &["m/knight.obj", "m/body.mtl", "m/extra.mtl"]);
        assert!(fetched.contains(&"m/missing.png".to_string()));
    }

    #[test]
    fn missing_material_library_aborts() {
        let source = MemorySource::default().with("knight.obj", OBJ).with("body.mtl", "newmtl a\n");
        let err = pollster::block_on(load_model(&source, "knight.obj")).unwrap_err();
        assert!(matches!(err, LoadError::Fetch { ref path, .. } if path == "extra.mtl"));
    }

    #[test]
    fn missing_obj_aborts() {
        let err = pollster::block_on(load_model(&MemorySource::default(), "knight.obj")).unwrap_err();
        assert!(matches!(err, LoadError::Fetch { .. }));
    }

    #[test]
    fn obj_parse_error_names_the_file() {
        let source = MemorySource::default().with("bad.obj", "v 1 2\n");
        let err = pollster::block_on(load_model(&source, "bad.obj")).unwrap_err();
        match err {
            LoadError::Parse { path, source } => {
                assert_eq!(path, "bad.obj");
                assert_eq!(source.line, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn undecodable_texture_is_not_fatal() {
        let source = MemorySource::default()
            .with("a.obj", "mtllib a.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl a\nf 1 2 3\n")
            .with("a.mtl", "newmtl a\nmap_Kd a.png\n")
            .with("a.png", b"garbage".to_vec());
        let model = pollster::block_on(load_model(&source, "a.obj")).unwrap();
        assert!(model.textures.is_empty());
    }

    #[test]
    fn obj_without_libraries_has_empty_library() {
        let source = MemorySource::default().with("a.obj", "v 0 0 0\n");
        let model = pollster::block_on(load_model(&source, "a.obj")).unwrap();
        assert!(model.materials.is_empty());
        assert_eq!(model.obj.positions.len(), 1);
    }
}
