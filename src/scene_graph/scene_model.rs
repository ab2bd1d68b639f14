use id_arena::Id;

use crate::model::Model;
use crate::rendering::render_model::RenderModelId;

pub type SceneModelId = Id<SceneModel>;

/// CPU-side model plus the id of its GPU counterpart once uploaded.
pub struct SceneModel {
    pub name: String,
    pub model: Model,
    pub render_model: Option<RenderModelId>,
}

impl SceneModel {
    pub fn new(model: Model) -> Self {
        Self {
            name: model.name.clone(),
            model,
            render_model: None,
        }
    }
}
