//! Protocol adapters
//!
//! The wire-level chat protocol is an external collaborator; the console
//! adapter stands in for it during development.

pub mod console;

pub use console::ConsoleAdapter;
