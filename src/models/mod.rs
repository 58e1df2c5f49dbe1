pub mod common;
pub mod frame;
pub mod request;

pub use common::*;
pub use frame::*;
pub use request::*;
