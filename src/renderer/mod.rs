mod basic;
mod fireflies;
mod mesh;
mod portal;
mod postprocessing;
mod render_target;
#[allow(clippy::module_inception)]
mod renderer;
mod samplers;

pub use renderer::Renderer;
