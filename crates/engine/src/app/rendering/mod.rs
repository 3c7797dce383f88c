mod canvas;
mod compose;
mod overlay;
mod renderer;
mod transform;

pub use canvas::{Canvas, SourceRect};
pub(crate) use compose::draw_frame;
pub use overlay::DebugOverlays;
pub use renderer::Renderer;
pub use transform::{screen_to_world, world_to_screen, SpriteTransform, Viewport};
