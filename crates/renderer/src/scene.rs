//! Scene assembly: resolves materials, uploads one buffer per geometry group
//! and measures the model.

use std::collections::HashMap;

use asset::{
    LoadedModel,
    mesh::{ColorSource, VertexStreams},
    mtl::{DEFAULT_DIFFUSE, Material, MaterialLibrary},
};
use corelib::Extents;

use crate::{
    backend::{BackendError, BufferHandle, GraphicsBackend, ProgramHandle, TextureHandle},
    shader::{MeshUpload, ShaderSources},
};

/// One renderable unit. Immutable once assembled.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawPart {
    pub material: Material,
    pub buffer: BufferHandle,
    /// `None` when the material has no loaded diffuse map; such parts are
    /// drawn without binding any texture.
    pub texture: Option<TextureHandle>,
    pub vertex_count: usize,
}

/// Everything the render loop draws, in geometry declaration order.
#[derive(Debug)]
pub struct Scene {
    program: ProgramHandle,
    parts: Vec<DrawPart>,
    extents: Extents,
}

impl Scene {
    /// Compile the program and upload every geometry group of `model`.
    pub fn assemble<B: GraphicsBackend>(
        backend: &mut B,
        model: &LoadedModel,
    ) -> Result<Self, BackendError> {
        let program = backend.create_program(&ShaderSources::PHONG)?;

        // `None` records a material whose upload already failed.
        let mut uploaded: HashMap<&str, Option<TextureHandle>> = HashMap::new();
        let mut parts = Vec::with_capacity(model.obj.geometries.len());
        let mut extents = Extents::EMPTY;

        for geometry in &model.obj.geometries {
            let material = resolve_material(&model.materials, &geometry.material);
            let data = &geometry.data;

            let buffer = backend.upload_mesh(&MeshUpload {
                position: &data.position,
                normal: &data.normal,
                texcoord: &data.texcoord,
                color: color_source(data, material),
            })?;

            let texture = match model.textures.get_key_value(geometry.material.as_str()) {
                Some((name, image)) => match uploaded.get(name.as_str()) {
                    Some(&handle) => handle,
                    None => {
                        let handle = match backend.upload_texture(image) {
                            Ok(handle) => Some(handle),
                            Err(err) => {
                                log::info!(
                                    "Material {}: texture upload failed ({}), using solid color.",
                                    name,
                                    err
                                );
                                None
                            }
                        };
                        uploaded.insert(name.as_str(), handle);
                        handle
                    }
                },
                None => None,
            };

            extents.include_positions(&data.position);
            parts.push(DrawPart {
                material: material.clone(),
                buffer,
                texture,
                vertex_count: data.vertex_count(),
            });
        }

        log::info!(
            "Assembled {} draw parts ({} textured), extents {:?}..{:?}",
            parts.len(),
            parts.iter().filter(|p| p.texture.is_some()).count(),
            extents.min,
            extents.max
        );
        if !extents.is_finite() {
            log::warn!("Model has no faces; nothing will be visible");
        }

        Ok(Self {
            program,
            parts,
            extents,
        })
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    pub fn parts(&self) -> &[DrawPart] {
        &self.parts
    }

    pub fn extents(&self) -> &Extents {
        &self.extents
    }
}

/// The library entry for `name`, or the fallback material if there is none.
pub fn resolve_material<'a>(library: &'a MaterialLibrary, name: &str) -> &'a Material {
    static FALLBACK: std::sync::OnceLock<Material> = std::sync::OnceLock::new();
    library
        .get(name)
        .unwrap_or_else(|| FALLBACK.get_or_init(Material::fallback))
}

/// Per-vertex colours when every vertex has one; otherwise the material's
/// diffuse colour (opaque) for the whole part.
pub fn color_source(data: &VertexStreams, material: &Material) -> ColorSource {
    if data.has_vertex_colors() {
        ColorSource::PerVertex {
            components: 3,
            data: data.color.clone(),
        }
    } else {
        let [r, g, b] = material.diffuse.unwrap_or(DEFAULT_DIFFUSE);
        ColorSource::Constant([r, g, b, 1.0])
    }
}

#[cfg(test)]
mod tests {
    use asset::{parse_mtl, parse_obj, texture::TextureData};

    use super::*;
    use crate::recording::{Call, RecordingBackend};

    fn model(obj: &str, mtl: &str) -> LoadedModel {
        LoadedModel {
            obj: parse_obj(obj).unwrap(),
            materials: parse_mtl(mtl).unwrap(),
            textures: HashMap::new(),
        }
    }

    const TRI: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\n";

    #[test]
    fn undefined_material_resolves_to_fallback() {
        let library = parse_mtl("newmtl red\nKd 1 0 0\n").unwrap();
        let m = resolve_material(&library, "nope");
        assert_eq!(m.diffuse, Some([1.0, 1.0, 1.0]));
        assert_eq!(m.opacity, Some(1.0));
        assert_eq!(resolve_material(&library, "red").diffuse, Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn constant_color_comes_from_diffuse() {
        let data = VertexStreams {
            position: vec![0.0; 9],
            ..Default::default()
        };
        let material = Material {
            diffuse: Some([0.2, 0.4, 0.6]),
            ..Default::default()
        };
        assert_eq!(
            color_source(&data, &material),
            ColorSource::Constant([0.2, 0.4, 0.6, 1.0])
        );
        assert_eq!(
            color_source(&data, &Material::default()),
            ColorSource::Constant([1.0, 1.0, 1.0, 1.0])
        );
    }

    #[test]
    fn mismatched_vertex_colors_fall_back_to_material() {
        let data = VertexStreams {
            position: vec![0.0; 9],
            color: vec![1.0; 6],
            ..Default::default()
        };
        let material = Material {
            diffuse: Some([0.0, 1.0, 0.0]),
            ..Default::default()
        };
        assert_eq!(
            color_source(&data, &material),
            ColorSource::Constant([0.0, 1.0, 0.0, 1.0])
        );
    }

    #[test]
    fn vertex_colors_are_used_when_complete() {
        let obj = "v 0 0 0 1 0 0\nv 1 0 0 0 1 0\nv 0 1 0 0 0 1\nf 1 2 3\n";
        let mut backend = RecordingBackend::new(4, 4);
        Scene::assemble(&mut backend, &model(obj, "")).unwrap();
        assert!(backend.calls.iter().any(|c| matches!(
            c,
            Call::UploadMesh {
                color: ColorSource::PerVertex { components: 3, .. },
                ..
            }
        )));
    }

    #[test]
    fn parts_keep_geometry_order() {
        let obj = format!("{TRI}usemtl b\nf 1 2 3\nusemtl a\nf 1 3 2\nusemtl b\nf 2 3 1\n");
        let mtl = "newmtl a\nKd 1 0 0\nnewmtl b\nKd 0 0 1\n";
        let mut backend = RecordingBackend::new(4, 4);
        let scene = Scene::assemble(&mut backend, &model(&obj, mtl)).unwrap();

        let diffuse: Vec<_> = scene.parts().iter().map(|p| p.material.diffuse).collect();
        assert_eq!(
            diffuse,
            vec![Some([0.0, 0.0, 1.0]), Some([1.0, 0.0, 0.0]), Some([0.0, 0.0, 1.0])]
        );
        let buffers: Vec<_> = scene.parts().iter().map(|p| p.buffer.0).collect();
        assert_eq!(buffers, vec![0, 1, 2]);
        assert_eq!(backend.count(|c| matches!(c, Call::CreateProgram)), 1);
    }

    #[test]
    fn textures_are_uploaded_once_per_material() {
        let obj = format!("{TRI}usemtl skin\nf 1 2 3\nusemtl bare\nf 1 3 2\nusemtl skin\nf 2 3 1\n");
        let mut m = model(&obj, "newmtl skin\nmap_Kd skin.png\nnewmtl bare\n");
        m.textures.insert(
            "skin".into(),
            TextureData::new_rgba8(1, 1, vec![255, 255, 255, 255]),
        );

        let mut backend = RecordingBackend::new(4, 4);
        let scene = Scene::assemble(&mut backend, &m).unwrap();

        assert_eq!(backend.count(|c| matches!(c, Call::UploadTexture { .. })), 1);
        let textures: Vec<_> = scene.parts().iter().map(|p| p.texture).collect();
        assert_eq!(
            textures,
            vec![Some(TextureHandle(0)), None, Some(TextureHandle(0))]
        );
    }

    #[test]
    fn failed_texture_upload_leaves_part_untextured() {
        let obj = format!("{TRI}usemtl skin\nf 1 2 3\nusemtl skin\nf 1 3 2\n");
        let mut m = model(&obj, "newmtl skin\nKd 0.3 0.3 0.3\nmap_Kd skin.png\n");
        m.textures.insert(
            "skin".into(),
            TextureData::new_rgba8(4, 4, vec![255; 4 * 4 * 4]),
        );

        let mut backend = RecordingBackend::new(4, 4);
        backend.set_max_texture_size(2);
        let scene = Scene::assemble(&mut backend, &m).unwrap();

        assert_eq!(scene.parts().len(), 2);
        assert!(scene.parts().iter().all(|p| p.texture.is_none()));
        assert_eq!(backend.count(|c| matches!(c, Call::UploadTexture { .. })), 0);
        assert_eq!(backend.count(|c| matches!(c, Call::UploadMesh { .. })), 2);
    }

    #[test]
    fn extents_cover_all_geometry() {
        let obj = "v -1 0 0\nv 1 2 0\nv 0 0 3\nv 9 9 9\nf 1 2 3\n";
        let mut backend = RecordingBackend::new(4, 4);
        let scene = Scene::assemble(&mut backend, &model(obj, "")).unwrap();
        // The unused vertex does not widen the box.
        assert_eq!(scene.extents().min, corelib::vec3(-1.0, 0.0, 0.0));
        assert_eq!(scene.extents().max, corelib::vec3(1.0, 2.0, 3.0));
    }

    #[test]
    fn empty_model_has_non_finite_extents() {
        let mut backend = RecordingBackend::new(4, 4);
        let scene = Scene::assemble(&mut backend, &model(TRI, "")).unwrap();
        assert!(scene.parts().is_empty());
        assert!(!scene.extents().is_finite());
    }
}
