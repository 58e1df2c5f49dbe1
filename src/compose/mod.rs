pub mod mask;
pub mod paste;
pub mod watermark;

pub use mask::BinaryMask;
pub use paste::{mask_out, paste_in};
pub use watermark::Stamper;
