pub mod config;
pub mod node;
mod version;

pub use version::Version;
