pub mod buffers;
pub mod camera;
pub mod config;
pub mod define_scene;
pub mod error;
pub mod gpu;
pub mod input;
pub mod kernel;
pub mod logging;
pub mod math;
pub mod renderer;
pub mod scene;
pub mod snapshot;
pub mod triangle_object;

pub use camera::{Control, FrameState, RotationState};
pub use define_scene::SceneMode;
pub use error::{TracerError, TracerResult};
pub use renderer::{Frame, Renderer};
