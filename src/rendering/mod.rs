pub mod passes;
pub mod render_model;
pub mod renderer;
pub mod shader_loader;
pub mod texture;
