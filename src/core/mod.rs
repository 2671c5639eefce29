//! Platform-pure scene logic. No `web_sys` or GPU types in here; host-side
//! tests under `tests/` compile these sources natively.

pub mod font;
pub mod scene;

pub use font::Typeface;
pub use scene::{BoxState, Camera, Particle, ParticleSeed, SceneCore};

// Shaders bundled as string constants
pub static SCENE_WGSL: &str = include_str!("../../shaders/scene.wgsl");
