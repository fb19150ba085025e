//! parley-bot - an extensible chat-protocol bot core
//!
//! The crate is split into layers:
//! - `domain`: core structures (prefix tree, events, commands) with no
//!   infrastructure dependencies
//! - `application`: errors and the messaging pipeline (parser, dispatcher,
//!   command resolver)
//! - `plugins`: the plugin contract, the extension registry and the
//!   bundled plugins
//! - `infrastructure`: configuration, adapters and the sandboxed evaluator

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
