use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use std::collections::HashMap;

use crate::math::bounds::Aabb;
use crate::model::{Buffers, Model};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    gltf_mesh_to_model: HashMap<usize, SceneModelId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    /// Spawns an object rendering `model`, returning the object's id.
    pub fn spawn_model(&mut self, name: impl Into<String>, model: Model) -> ObjectId {
        let model_id = self.add_model(SceneModel::new(model));
        let mut object = Object3D::named(name);
        object.model_id = Some(model_id);
        self.add_object(object)
    }

    /// Spawns every root node of the glTF scene under a fresh group object
    /// and returns the group's id, so rotating or scaling the returned
    /// object affects the whole model.
    pub fn spawn_gltf_scene(
        &mut self,
        buffers: Buffers,
        scene: &gltf::Scene,
    ) -> anyhow::Result<Option<ObjectId>> {
        let mut root_ids = Vec::new();
        for node in scene.nodes() {
            root_ids.push(self.spawn_gltf_node(buffers, &node, None)?);
        }

        if root_ids.is_empty() {
            return Ok(None);
        }

        let group = self.add_object(Object3D::named(scene.name().unwrap_or("Scene")));
        for root_id in root_ids {
            self.set_object_parent(root_id, Some(group));
        }

        Ok(Some(group))
    }

    fn spawn_gltf_node(
        &mut self,
        buffers: Buffers,
        node: &gltf::Node,
        parent: Option<ObjectId>,
    ) -> anyhow::Result<ObjectId> {
        let mut object = Object3D::default();
        let node_name = node.name().unwrap_or("Unnamed").to_string();
        object.name = node_name.clone();
        let (translation, rotation, scale) = node.transform().decomposed();

        object.transform.set_transform(
            translation.into(),
            Quat::from_array(rotation),
            Vec3::from(scale),
        );

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let mesh_id = match self.gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(mesh_id) => mesh_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    let model = Model::from_gltf(mesh_name, mesh, buffers)?;
                    let mesh_id = self.add_model(SceneModel::new(model));
                    self.gltf_mesh_to_model.insert(mesh_index, mesh_id);

                    mesh_id
                }
            };

            object.model_id = Some(mesh_id);
        }

        let object_id = self.add_object(object);

        if let Some(parent_id) = parent {
            self.set_object_parent(object_id, Some(parent_id));
        }

        for child in node.children() {
            self.spawn_gltf_node(buffers, &child, Some(object_id))?;
        }

        Ok(object_id)
    }

    /// Updates all object world transforms in hierarchical order.
    pub fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                let world_matrix = parent_world_matrix * local_matrix;
                object.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants.
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships.
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_scale_x(&mut self, object_id: ObjectId, scale_x: f32) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale_x(scale_x);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_scale_y(&mut self, object_id: ObjectId, scale_y: f32) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_scale_y(scale_y);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    /// World-space bounds of an object and its descendants, from the models'
    /// local bounds pushed through current world matrices. Call
    /// [`Scene::update_transforms`] first.
    pub fn world_bounds(&self, object_id: ObjectId) -> Aabb {
        let mut bounds = Aabb::EMPTY;
        self.accumulate_bounds(object_id, &mut bounds);
        bounds
    }

    fn accumulate_bounds(&self, object_id: ObjectId, bounds: &mut Aabb) {
        let Some(object) = self.objects.get(object_id) else {
            return;
        };

        if let Some(model_id) = object.model_id {
            if let Some(scene_model) = self.models.get(model_id) {
                let world_matrix = *object.transform.get_world_matrix();
                let model_bounds = scene_model.model.bounds.transformed(&world_matrix);
                *bounds = bounds.union(&model_bounds);
            }
        }

        for &child_id in &object.child_ids {
            self.accumulate_bounds(child_id, bounds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives;

    fn unit_cube_scene() -> (Scene, ObjectId) {
        let mut scene = Scene::new();
        // A plane is flat; use a cone for a volume with known extents.
        let id = scene.spawn_model("cone", primitives::cone(1.0, 2.0, 8, Default::default()));
        (scene, id)
    }

    #[test]
    fn world_bounds_track_scale() {
        let (mut scene, id) = unit_cube_scene();
        scene.update_transforms();
        let bounds = scene.world_bounds(id);
        assert!((bounds.min.y - -1.0).abs() < 1e-5);
        assert!((bounds.max.y - 1.0).abs() < 1e-5);

        scene.set_object_scale_y(id, 2.0);
        scene.update_transforms();
        let scaled = scene.world_bounds(id);
        assert!((scaled.min.y - -2.0).abs() < 1e-5);
        assert!((scaled.max.y - 2.0).abs() < 1e-5);
        // X extents untouched by the Y scale.
        assert!((scaled.min.x - bounds.min.x).abs() < 1e-5);
    }

    #[test]
    fn child_world_matrix_follows_parent() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::named("parent"));
        let child = scene.add_object(Object3D::named("child"));
        scene.set_object_parent(child, Some(parent));

        scene.set_object_translation(parent, Vec3::new(0.0, 5.0, 0.0));
        scene.update_transforms();

        let child_world = *scene
            .get_object(child)
            .unwrap()
            .transform
            .get_world_matrix();
        assert_eq!(
            child_world.transform_point3(Vec3::ZERO),
            Vec3::new(0.0, 5.0, 0.0)
        );
    }

    /// A GLB whose scene has two root nodes sharing one triangle mesh,
    /// the second translated to x = 100.
    fn build_two_root_glb() -> Vec<u8> {
        let positions: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let normals: [[f32; 3]; 3] = [[0.0, 0.0, 1.0]; 3];
        let indices: [u16; 3] = [0, 1, 2];

        let mut bin: Vec<u8> = Vec::new();
        bin.extend_from_slice(bytemuck::cast_slice(&positions));
        bin.extend_from_slice(bytemuck::cast_slice(&normals));
        bin.extend_from_slice(bytemuck::cast_slice(&indices));
        let buffer_length = bin.len();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let json = format!(
            concat!(
                r#"{{"asset":{{"version":"2.0"}},"scene":0,"#,
                r#""scenes":[{{"nodes":[0,1]}}],"#,
                r#""nodes":[{{"mesh":0,"name":"left"}},"#,
                r#"{{"mesh":0,"name":"right","translation":[100.0,0.0,0.0]}}],"#,
                r#""meshes":[{{"name":"tri","primitives":[{{"attributes":{{"POSITION":0,"NORMAL":1}},"indices":2}}]}}],"#,
                r#""accessors":[{{"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0.0,0.0,0.0],"max":[4.0,2.0,0.0]}},"#,
                r#"{{"bufferView":1,"componentType":5126,"count":3,"type":"VEC3"}},"#,
                r#"{{"bufferView":2,"componentType":5123,"count":3,"type":"SCALAR"}}],"#,
                r#""bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":36}},"#,
                r#"{{"buffer":0,"byteOffset":36,"byteLength":36}},"#,
                r#"{{"buffer":0,"byteOffset":72,"byteLength":6}}],"#,
                r#""buffers":[{{"byteLength":{}}}]}}"#
            ),
            buffer_length
        );
        let mut json = json.into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb: Vec<u8> = Vec::with_capacity(total);
        glb.extend_from_slice(&0x4654_6C67_u32.to_le_bytes());
        glb.extend_from_slice(&2_u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x4E4F_534A_u32.to_le_bytes());
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x004E_4942_u32.to_le_bytes());
        glb.extend_from_slice(&bin);
        glb
    }

    #[test]
    fn gltf_group_spans_every_root_node() {
        let glb = build_two_root_glb();
        let (document, buffers, _images) = gltf::import_slice(&glb).unwrap();
        let gltf_scene = document.scenes().next().unwrap();

        let mut scene = Scene::new();
        let group = scene
            .spawn_gltf_scene(&buffers, &gltf_scene)
            .unwrap()
            .unwrap();

        // Bounds cover both roots, not just the last one spawned.
        scene.update_transforms();
        let bounds = scene.world_bounds(group);
        assert_eq!(bounds.min.x, 0.0);
        assert_eq!(bounds.max.x, 104.0);

        // Scaling the group scales every root.
        scene.set_object_scale_y(group, 2.0);
        scene.update_transforms();
        let scaled = scene.world_bounds(group);
        assert_eq!(scaled.max.y, 4.0);
        assert_eq!(scaled.max.x, 104.0);

        // The shared mesh is deduplicated.
        assert_eq!(scene.models.len(), 1);
        assert_eq!(scene.get_object(group).unwrap().child_ids.len(), 2);
    }

    #[test]
    fn reparenting_removes_old_child_link() {
        let mut scene = Scene::new();
        let a = scene.add_object(Object3D::named("a"));
        let b = scene.add_object(Object3D::named("b"));
        let child = scene.add_object(Object3D::named("child"));

        scene.set_object_parent(child, Some(a));
        scene.set_object_parent(child, Some(b));

        assert!(scene.get_object(a).unwrap().child_ids.is_empty());
        assert_eq!(scene.get_object(b).unwrap().child_ids, vec![child]);
    }
}
