//! Plugin system for parley-bot
//!
//! The plugin trait, the extension registry and the bundled plugins.

pub mod greet;
pub mod memo;
pub mod registry;
pub mod seen;
pub mod trait_def;

pub use registry::Registry;
pub use trait_def::{Plugin, Reply};
