//! Startup asset loading.
//!
//! Both assets load concurrently on blocking tasks and the results are
//! joined; the first failure fails the whole load. There is no retry and no
//! partial bundle, scene construction only ever sees a complete `Assets`.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;

/// Model bundle path, relative to the asset directory.
pub const MODEL_PATH: &str = "models/door.glb";
/// Environment image path, relative to the asset directory.
pub const ENVIRONMENT_PATH: &str = "img/inner.hdr";

pub struct ModelAsset {
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
}

pub struct EnvironmentAsset {
    pub image: image::Rgb32FImage,
}

/// The two named resources scene construction requires.
pub struct Assets {
    pub model: ModelAsset,
    pub environment: EnvironmentAsset,
}

pub fn load_model(path: &Path) -> Result<ModelAsset> {
    let (document, buffers, _images) = gltf::import(path)
        .with_context(|| format!("Failed to load model from {}", path.display()))?;

    Ok(ModelAsset { document, buffers })
}

pub fn load_environment(path: &Path) -> Result<EnvironmentAsset> {
    let image = image::open(path)
        .with_context(|| format!("Failed to load environment map from {}", path.display()))?
        .into_rgb32f();

    Ok(EnvironmentAsset { image })
}

async fn join_load<T>(task: JoinHandle<Result<T>>) -> Result<T> {
    task.await.context("Asset load task panicked")?
}

/// Loads the model and the environment image concurrently and resolves once
/// both are in, or fails on the first error.
pub async fn load_all(asset_dir: &Path) -> Result<Assets> {
    let model_path = asset_dir.join(MODEL_PATH);
    let environment_path = asset_dir.join(ENVIRONMENT_PATH);

    let model_task = tokio::task::spawn_blocking(move || load_model(&model_path));
    let environment_task =
        tokio::task::spawn_blocking(move || load_environment(&environment_path));

    let (model, environment) =
        tokio::try_join!(join_load(model_task), join_load(environment_task))?;

    log::info!(
        "Loaded assets: {} meshes, {}x{} environment map",
        model.document.meshes().len(),
        environment.image.width(),
        environment.image.height()
    );

    Ok(Assets { model, environment })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    /// A 2x2 Radiance HDR file with flat (non-RLE) RGBE pixels.
    fn write_test_hdr(path: &Path) {
        let mut bytes = b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 2 +X 2\n".to_vec();
        for _ in 0..4 {
            bytes.extend_from_slice(&[128, 128, 128, 128]);
        }
        fs::write(path, bytes).unwrap();
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("vitrine-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("img")).unwrap();
        fs::create_dir_all(dir.join("models")).unwrap();
        dir
    }

    #[tokio::test]
    async fn missing_assets_fail_the_load() {
        let result = load_all(Path::new("/nonexistent/assets")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn one_bad_asset_yields_no_partial_bundle() {
        let dir = scratch_dir("partial");
        write_test_hdr(&dir.join(ENVIRONMENT_PATH));
        // Environment is valid, the model file is absent.
        let result = load_all(&dir).await;
        assert!(result.is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn environment_loader_decodes_hdr() {
        let dir = scratch_dir("hdr");
        let path = dir.join(ENVIRONMENT_PATH);
        write_test_hdr(&path);

        let environment = load_environment(&path).unwrap();
        assert_eq!(environment.image.width(), 2);
        assert_eq!(environment.image.height(), 2);
        // RGBE (128, 128, 128, 128) decodes to a positive mid value.
        let pixel = environment.image.get_pixel(0, 0);
        assert!(pixel.0[0] > 0.0);

        let _ = fs::remove_dir_all(&dir);
    }
}
