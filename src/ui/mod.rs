/// UI module
///
/// - Applying a development parameter vector to pixels (render.rs)
/// - The wall canvas: drawing and drag handling (wall_canvas.rs)

pub mod render;
pub mod wall_canvas;
