//! Scene construction and the two user-facing scale controls.

use anyhow::Context;
use glam::{Quat, Vec3, Vec4};
use std::f32::consts::{FRAC_PI_2, PI};

use crate::assets::Assets;
use crate::camera::{Camera, OrbitControls};
use crate::light::DirectionalLight;
use crate::material::{Material, MaterialKind};
use crate::primitives;
use crate::scene_graph::object3d::ObjectId;
use crate::scene_graph::scene::Scene;

pub const SCALE_MIN: f32 = 0.5;
pub const SCALE_MAX: f32 = 2.0;

const CONE_RADIUS: f32 = 25.0;
const CONE_HEIGHT: f32 = 100.0;
const CONE_SEGMENTS: u32 = 64;
/// Horizontal gap between the model's bounds and the cone.
const CONE_GAP: f32 = 60.0;
const CONE_DEPTH: f32 = -50.0;
const SPHERE_RADIUS: f32 = 25.0;
const FLOOR_SIZE: f32 = 1000.0;
const CAMERA_DISTANCE: f32 = 200.0;
const MODEL_ENV_INTENSITY: f32 = 0.2;

/// Slider state for the model's per-axis scale.
#[derive(Debug, Clone, Copy)]
pub struct ScaleSettings {
    pub x: f32,
    pub y: f32,
}

impl Default for ScaleSettings {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// The whole decorative composition: scene graph, camera, light and the
/// slider state, with the layout recompute that keeps dependent placement
/// consistent with the model's current bounds.
pub struct Viewer {
    pub scene: Scene,
    pub camera: Camera,
    pub controls: OrbitControls,
    pub sun: DirectionalLight,
    pub settings: ScaleSettings,
    door: ObjectId,
    cone: ObjectId,
    floor: ObjectId,
}

fn glass_material() -> Material {
    Material {
        base_color: Vec4::ONE,
        metallic: 0.0,
        roughness: 0.0,
        env_intensity: 2.0,
        ior: 2.4,
        kind: MaterialKind::Glass,
    }
}

fn cone_material() -> Material {
    Material {
        base_color: Vec4::ONE,
        metallic: 0.5,
        roughness: 1.0,
        env_intensity: 0.2,
        kind: MaterialKind::Standard,
        ..Material::default()
    }
}

fn floor_material() -> Material {
    let grey = 0x77 as f32 / 255.0;
    Material {
        base_color: Vec4::new(grey, grey, grey, 1.0),
        metallic: 0.0,
        roughness: 1.0,
        env_intensity: 1.0,
        kind: MaterialKind::Standard,
        ..Material::default()
    }
}

impl Viewer {
    pub fn new(assets: &Assets) -> anyhow::Result<Self> {
        let mut scene = Scene::new();

        let gltf_scene = assets
            .model
            .document
            .scenes()
            .next()
            .context("No scenes in glTF document")?;
        let door = scene
            .spawn_gltf_scene(&assets.model.buffers, &gltf_scene)?
            .context("glTF scene has no nodes")?;

        // Center the model geometry about the origin and tone down its
        // environment reflections.
        for (_, scene_model) in &mut scene.models {
            scene_model.model.recenter();
            for primitive in &mut scene_model.model.primitives {
                primitive.material.env_intensity = MODEL_ENV_INTENSITY;
            }
        }

        if let Some(object) = scene.get_object_mut(door) {
            object.transform.set_rotation(Quat::from_rotation_y(PI));
        }

        Ok(Self::from_scene(scene, door))
    }

    /// Builds the props, light and camera around an already-spawned model.
    fn from_scene(mut scene: Scene, door: ObjectId) -> Self {
        let cone = scene.spawn_model(
            "cone",
            primitives::cone(CONE_RADIUS, CONE_HEIGHT, CONE_SEGMENTS, cone_material()),
        );

        let sphere = scene.spawn_model(
            "sphere",
            primitives::sphere(SPHERE_RADIUS, 64, 32, glass_material()),
        );
        scene.set_object_parent(sphere, Some(cone));
        if let Some(object) = scene.get_object_mut(sphere) {
            object.casts_shadow = false;
        }

        let floor = scene.spawn_model(
            "floor",
            primitives::plane(FLOOR_SIZE, FLOOR_SIZE, floor_material()),
        );
        if let Some(object) = scene.get_object_mut(floor) {
            object
                .transform
                .set_rotation(Quat::from_rotation_x(-FRAC_PI_2));
            object.casts_shadow = false;
        }

        let sun = DirectionalLight::new(Vec3::new(-200.0, 150.0, 200.0));
        let camera = Camera::new(Vec3::new(0.0, 0.0, CAMERA_DISTANCE), Vec3::ZERO);
        let controls = OrbitControls::new(CAMERA_DISTANCE);

        let mut viewer = Self {
            scene,
            camera,
            controls,
            sun,
            settings: ScaleSettings::default(),
            door,
            cone,
            floor,
        };
        viewer.relayout();
        viewer
    }

    pub fn door(&self) -> ObjectId {
        self.door
    }

    pub fn cone(&self) -> ObjectId {
        self.cone
    }

    pub fn floor(&self) -> ObjectId {
        self.floor
    }

    /// Horizontal model scale. Does not affect placement of anything else.
    pub fn set_scale_x(&mut self, value: f32) {
        let value = value.clamp(SCALE_MIN, SCALE_MAX);
        self.settings.x = value;
        self.scene.set_object_scale_x(self.door, value);
    }

    /// Vertical model scale. Dependent placement follows the new bounds.
    pub fn set_scale_y(&mut self, value: f32) {
        let value = value.clamp(SCALE_MIN, SCALE_MAX);
        self.settings.y = value;
        self.scene.set_object_scale_y(self.door, value);
        self.relayout();
    }

    /// Recomputes placement derived from the model's world bounds: the cone
    /// sits beside the model with its base on the model's floor line, and
    /// the floor plane sits at the bounds minimum.
    pub fn relayout(&mut self) {
        self.scene.update_transforms();
        let bounds = self.scene.world_bounds(self.door);
        if bounds.is_empty() {
            return;
        }

        self.scene.set_object_translation(
            self.cone,
            Vec3::new(
                bounds.max.x + CONE_GAP,
                bounds.min.y + CONE_HEIGHT * 0.5,
                CONE_DEPTH,
            ),
        );
        self.scene
            .set_object_translation(self.floor, Vec3::new(0.0, bounds.min.y, 0.0));
        self.scene.update_transforms();
    }

    /// Per-frame update: derive the camera eye from the orbit state and
    /// flush any dirty world matrices.
    pub fn update(&mut self) {
        self.controls.apply_to(&mut self.camera);
        self.scene.update_transforms();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::math::bounds::Aabb;

    /// A viewer whose "door" is a 40x80x10 box-ish stand-in (a scaled cone
    /// works; bounds are all that matter to layout).
    fn test_viewer() -> Viewer {
        let mut scene = Scene::new();
        let door = scene.spawn_model("door", {
            let mut model = primitives::cone(20.0, 80.0, 8, Material::default());
            model.recenter();
            model
        });
        Viewer::from_scene(scene, door)
    }

    fn door_bounds(viewer: &Viewer) -> Aabb {
        viewer.scene.world_bounds(viewer.door())
    }

    fn cone_position(viewer: &Viewer) -> Vec3 {
        viewer
            .scene
            .get_object(viewer.cone())
            .unwrap()
            .transform
            .translation()
    }

    #[test]
    fn scale_x_leaves_vertical_scale_unchanged() {
        let mut viewer = test_viewer();

        for value in [0.5, 0.75, 1.3, 2.0] {
            viewer.set_scale_x(value);
            let scale = viewer
                .scene
                .get_object(viewer.door())
                .unwrap()
                .transform
                .scale();
            assert_eq!(scale.x, value);
            assert_eq!(scale.y, 1.0);
        }
    }

    #[test]
    fn scale_values_are_clamped_to_slider_range() {
        let mut viewer = test_viewer();
        viewer.set_scale_x(5.0);
        assert_eq!(viewer.settings.x, SCALE_MAX);
        viewer.set_scale_y(0.1);
        assert_eq!(viewer.settings.y, SCALE_MIN);
    }

    #[test]
    fn cone_base_tracks_scaled_model_bounds() {
        let mut viewer = test_viewer();

        for value in [0.5, 1.0, 1.5, 2.0] {
            viewer.set_scale_y(value);
            let bounds = door_bounds(&viewer);
            let cone = cone_position(&viewer);
            assert!((cone.y - (bounds.min.y + 50.0)).abs() < 1e-3);
            assert!((cone.x - (bounds.max.x + 60.0)).abs() < 1e-3);
            assert_eq!(cone.z, -50.0);
        }
    }

    #[test]
    fn floor_sits_at_bounds_minimum() {
        let mut viewer = test_viewer();
        viewer.set_scale_y(2.0);

        let bounds = door_bounds(&viewer);
        let floor = viewer
            .scene
            .get_object(viewer.floor())
            .unwrap()
            .transform
            .translation();
        assert!((floor.y - bounds.min.y).abs() < 1e-3);
    }

    #[test]
    fn sphere_follows_cone_placement() {
        let mut viewer = test_viewer();
        viewer.set_scale_y(1.8);

        let cone_object = viewer.scene.get_object(viewer.cone()).unwrap();
        let sphere_id = cone_object.child_ids[0];
        let sphere_world = *viewer
            .scene
            .get_object(sphere_id)
            .unwrap()
            .transform
            .get_world_matrix();
        assert!(
            sphere_world
                .transform_point3(Vec3::ZERO)
                .distance(cone_position(&viewer))
                < 1e-3
        );
    }
}
