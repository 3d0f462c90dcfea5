use std::path::PathBuf;

use asset::{load_model, source::DirSource};
use corelib::{CameraFrame, vec3};
use renderer::{Call, RecordingBackend, Scene, render_frame, run};

const CUBE_OBJ: &str = "\
mtllib cube.mtl
o cube
v -0.5 -0.5 -0.5
v  0.5 -0.5 -0.5
v  0.5  0.5 -0.5
v -0.5  0.5 -0.5
v -0.5 -0.5  0.5
v  0.5 -0.5  0.5
v  0.5  0.5  0.5
v -0.5  0.5  0.5
usemtl red
f 5 6 7 8
f 2 1 4 3
f 4 8 7 3
f 1 2 6 5
f 1 5 8 4
f 2 3 7 6
";

struct ModelDir(PathBuf);

impl ModelDir {
    fn new(name: &str, files: &[(&str, &str)]) -> Self {
        let dir = std::env::temp_dir().join(format!("objview-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for (file, contents) in files {
            std::fs::write(dir.join(file), contents).unwrap();
        }
        Self(dir)
    }

    fn load(&self, obj: &str) -> asset::LoadedModel {
        pollster::block_on(load_model(&DirSource::new(&self.0), obj)).unwrap()
    }
}

impl Drop for ModelDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

#[test]
fn red_cube_from_disk_to_draw_calls() {
    let dir = ModelDir::new(
        "cube",
        &[("cube.obj", CUBE_OBJ), ("cube.mtl", "newmtl red\nKd 1 0 0\n")],
    );
    let model = dir.load("cube.obj");

    let mut backend = RecordingBackend::new(640, 480);
    let scene = Scene::assemble(&mut backend, &model).unwrap();

    assert_eq!(scene.parts().len(), 1);
    let part = &scene.parts()[0];
    assert_eq!(part.material.diffuse, Some([1.0, 0.0, 0.0]));
    assert_eq!(part.vertex_count, 36);
    assert_eq!(part.texture, None);
    assert_eq!(scene.extents().min, vec3(-0.5, -0.5, -0.5));
    assert_eq!(scene.extents().max, vec3(0.5, 0.5, 0.5));

    let frame = CameraFrame::from_extents(scene.extents());
    assert_eq!(frame.offset, vec3(0.0, 0.0, 0.0));

    backend.clear();
    render_frame(&mut backend, &scene, &frame, 0.5).unwrap();
    assert_eq!(backend.count(|c| matches!(c, Call::Draw(_))), 1);
    let material = backend
        .calls
        .iter()
        .find_map(|c| match c {
            Call::MaterialUniforms(u) => Some(*u),
            _ => None,
        })
        .unwrap();
    assert_eq!(material.diffuse, [1.0, 0.0, 0.0]);
}

#[test]
fn missing_texture_draws_untextured() {
    let obj = CUBE_OBJ.replace("usemtl red", "usemtl skin");
    let dir = ModelDir::new(
        "notex",
        &[
            ("cube.obj", obj.as_str()),
            ("cube.mtl", "newmtl skin\nKd 0.8 0.8 0.8\nmap_Kd skin.png\n"),
        ],
    );
    let model = dir.load("cube.obj");
    assert!(model.textures.is_empty());

    let mut backend = RecordingBackend::new(640, 480);
    let scene = Scene::assemble(&mut backend, &model).unwrap();
    assert_eq!(scene.parts()[0].texture, None);

    let frame = CameraFrame::from_extents(scene.extents());
    let frames = run(&mut backend, &scene, &frame, [0.0, 0.1].into_iter()).unwrap();
    assert_eq!(frames, 2);
    assert_eq!(backend.count(|c| matches!(c, Call::UploadTexture { .. })), 0);
    assert_eq!(backend.count(|c| matches!(c, Call::BindTexture(_))), 0);
    assert_eq!(backend.count(|c| matches!(c, Call::Draw(_))), 2);
}
