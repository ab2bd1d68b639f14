//! Decodes the shipped asset files when they are present. The assets are
//! not checked in everywhere, so absence skips rather than fails.

use std::path::Path;

const MODEL_PATH: &str = "assets/models/door.glb";
const ENVIRONMENT_PATH: &str = "assets/img/inner.hdr";

#[test]
fn shipped_model_imports() {
    let path = Path::new(MODEL_PATH);
    if !path.exists() {
        eprintln!("skipping: {} not present", path.display());
        return;
    }

    let (document, buffers, _images) = gltf::import(path).unwrap();
    assert!(document.meshes().len() > 0, "model has no meshes");
    assert!(!buffers.is_empty());

    let scene = document.scenes().next().expect("model has no scenes");
    assert!(scene.nodes().len() > 0, "scene has no nodes");
}

#[test]
fn shipped_environment_decodes() {
    let path = Path::new(ENVIRONMENT_PATH);
    if !path.exists() {
        eprintln!("skipping: {} not present", path.display());
        return;
    }

    let image = image::open(path).unwrap().into_rgb32f();
    assert!(image.width() > 0 && image.height() > 0);
}
