// Query engine - independent of any front-end

pub mod core;
pub mod presets;
pub mod validate;
pub mod x264;

pub use core::*;
