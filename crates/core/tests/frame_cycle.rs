//! End-to-end frame cycle on the headless device: shader files on disk,
//! mesh upload, technique dispatch, shader reload and teardown.

use std::fs;
use std::path::Path;

use glam::{Mat4, Vec3};
use raster_core::gpu::{HeadlessDevice, HeadlessHandle, Uniform};
use raster_core::shader::generate_shader_file;
use raster_core::{
    EngineConfig, Frame, FrameOutcome, MeshGenerator, NoShadows, Rasterizer, RenderMethodTable,
    Scene, SceneObject,
};

const FLAT: &str = "Flat/flat";

fn write_program(root: &Path, name: &str, vs: &str, fs_src: &str) {
    let vs_path = root.join(format!("{name}.vs"));
    fs::create_dir_all(vs_path.parent().unwrap()).unwrap();
    fs::write(vs_path, vs).unwrap();
    fs::write(root.join(format!("{name}.fs")), fs_src).unwrap();
}

fn render_flat(frame: &mut Frame<'_, HeadlessDevice>) {
    if !frame.use_shader(FLAT) {
        return;
    }
    let scene = frame.scene();
    frame.set("viewMat", scene.camera.view);
    for object in &scene.objects {
        frame.set("modelMat", object.transform.matrix());
        frame.draw(object);
    }
}

fn methods() -> RenderMethodTable<HeadlessDevice> {
    RenderMethodTable::new().with("RenderFlat", render_flat)
}

fn setup(root: &Path) -> (Rasterizer<HeadlessDevice>, Scene<HeadlessHandle>) {
    let config = EngineConfig {
        shader_root: root.to_path_buf(),
        ..EngineConfig::default()
    };
    let mut raster = Rasterizer::new(HeadlessDevice::new(), config, methods);
    raster.init();
    raster.apply_pipeline_state();

    let mut scene = Scene::new("RenderFlat");
    for (name, mesh) in [
        ("sphere", MeshGenerator::sphere(8, 4, 1.0)),
        ("cube", MeshGenerator::cube(1.0)),
    ] {
        let mut object = SceneObject::new(name, mesh);
        raster.init_gpu_data(&mut object).unwrap();
        scene.objects.push(object);
    }
    (raster, scene)
}

#[test]
fn technique_builds_shader_and_draws_every_object() {
    let dir = tempfile::tempdir().unwrap();
    write_program(dir.path(), FLAT, "vertex", "fragment");
    let (mut raster, scene) = setup(dir.path());

    let outcome = raster.render(&scene, &mut NoShadows, 1.0 / 60.0);
    assert_eq!(
        outcome,
        FrameOutcome::Rendered {
            technique: "RenderFlat".into(),
            draw_calls: 2
        }
    );

    let program = raster.active_program_handle().unwrap();
    let device = raster.device();
    assert!(device.draw_calls().iter().all(|d| d.program == Some(program)));
    assert_eq!(device.draw_calls()[0].index_count, 8 * 4 * 2 * 3);
    assert_eq!(
        device.uniform(program, "modelMat"),
        Some(Uniform::Mat4(Mat4::IDENTITY))
    );
}

#[test]
fn rendering_many_frames_compiles_shader_once() {
    let dir = tempfile::tempdir().unwrap();
    write_program(dir.path(), FLAT, "vertex", "fragment");
    let (mut raster, scene) = setup(dir.path());

    for _ in 0..5 {
        raster.render(&scene, &mut NoShadows, 1.0 / 60.0);
    }
    assert_eq!(raster.device().compile_count(), 1);
    assert_eq!(raster.shaders().len(), 1);
    assert_eq!(raster.device().draw_calls().len(), 10);
}

#[test]
fn broken_shader_skips_draws_without_panicking() {
    let dir = tempfile::tempdir().unwrap();
    write_program(dir.path(), FLAT, "vertex", "#error not yet written");
    let (mut raster, scene) = setup(dir.path());

    let outcome = raster.render(&scene, &mut NoShadows, 1.0 / 60.0);
    assert_eq!(
        outcome,
        FrameOutcome::Rendered {
            technique: "RenderFlat".into(),
            draw_calls: 0
        }
    );
    assert!(raster.shaders().is_empty());
}

#[test]
fn failed_reload_keeps_rendering_with_previous_program() {
    let dir = tempfile::tempdir().unwrap();
    write_program(dir.path(), FLAT, "vertex", "fragment v1");
    let (mut raster, scene) = setup(dir.path());
    raster.render(&scene, &mut NoShadows, 0.0);
    let before = raster.active_program_handle();

    fs::write(dir.path().join("Flat/flat.fs"), "#error typo").unwrap();
    assert!(raster.reload_shader(FLAT).is_err());
    assert_eq!(raster.active_program_handle(), before);

    raster.device_mut().take_draw_calls();
    raster.render(&scene, &mut NoShadows, 0.0);
    assert_eq!(raster.device().draw_calls().len(), 2);
    assert!(raster
        .device()
        .draw_calls()
        .iter()
        .all(|d| d.program == before));
}

#[test]
fn switching_technique_to_unknown_name_skips_frame() {
    let dir = tempfile::tempdir().unwrap();
    write_program(dir.path(), FLAT, "vertex", "fragment");
    let (mut raster, mut scene) = setup(dir.path());

    scene.render_method = "RenderVoxels".into();
    let outcome = raster.render(&scene, &mut NoShadows, 0.0);
    assert_eq!(outcome, FrameOutcome::MissingTechnique("RenderVoxels".into()));
    assert!(raster.device().draw_calls().is_empty());
}

#[test]
fn generated_shader_is_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("Flat")).unwrap();
    fs::write(root.join("shared.glsl"), "vec3 tint() { return vec3(1.0); }").unwrap();
    fs::write(
        root.join("Flat/main.fs"),
        "#version 450\n#import:\"shared.glsl\"#\nvoid main() {}\n",
    )
    .unwrap();
    fs::write(root.join("Flat/flat.vs"), "#version 450\nvoid main() {}\n").unwrap();

    generate_shader_file(root, &root.join("Flat/flat.fs"), &root.join("Flat/main.fs")).unwrap();
    let (mut raster, scene) = setup(root);
    raster.render(&scene, &mut NoShadows, 0.0);

    let program = raster.active_program_handle().unwrap();
    let (_, fragment) = raster.device().program_sources(program).unwrap();
    assert!(fragment.contains("vec3 tint()"));
    assert!(!fragment.contains("#import"));
}

#[test]
fn clear_releases_everything() {
    let dir = tempfile::tempdir().unwrap();
    write_program(dir.path(), FLAT, "vertex", "fragment");
    let (mut raster, mut scene) = setup(dir.path());
    raster.render(&scene, &mut NoShadows, 0.0);

    raster.clear();
    let device = raster.device();
    assert_eq!(device.live_buffers(), 0);
    assert_eq!(device.live_vertex_arrays(), 0);
    assert_eq!(device.live_programs(), 0);

    // Stale bindings on the scene are skipped, not drawn.
    raster.init();
    let outcome = raster.render(&scene, &mut NoShadows, 0.0);
    assert!(matches!(outcome, FrameOutcome::Rendered { draw_calls: 0, .. }));

    for object in &mut scene.objects {
        object.transform.position = Vec3::X;
        raster.init_gpu_data(object).unwrap();
    }
    raster.device_mut().take_draw_calls();
    raster.render(&scene, &mut NoShadows, 0.0);
    assert_eq!(raster.device().draw_calls().len(), 2);
}
