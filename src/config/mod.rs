pub mod loader;
pub mod registry;
pub mod types;

pub use loader::*;
pub use registry::*;
pub use types::*;
