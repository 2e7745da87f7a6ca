pub mod family;
pub mod image;
pub mod model_ref;
pub mod prediction;

pub use family::*;
pub use image::*;
pub use model_ref::*;
pub use prediction::*;
