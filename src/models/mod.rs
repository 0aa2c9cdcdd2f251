pub mod artifact;
pub mod context;
pub mod render;
pub mod request;

pub use artifact::*;
pub use context::*;
pub use render::*;
pub use request::*;
