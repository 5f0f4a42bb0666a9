/// Camera capture module
///
/// - Live feed ownership and frame access (source.rs)
/// - Turning a live frame into a fixed-size still (still.rs)

pub mod source;
pub mod still;
