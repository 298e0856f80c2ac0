pub mod config;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod resolver;

pub use config::Config;
pub use error::ResolveError;
pub use resolver::{IterativeResolver, Resolve};
