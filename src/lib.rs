pub mod config;
mod error;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod patch;
pub mod paths;
pub mod pipeline;
pub mod sniff;
pub mod strip;

pub use error::{Result, VitrineError};
