//! Plugin trait definitions

use crate::application::errors::BotError;
use crate::domain::entities::Event;
use crate::domain::traits::Bot;

/// Core plugin trait that all plugins must implement.
///
/// A plugin is notified of every protocol event, in registration order.
/// Return values are ignored except for the `command` event, where a
/// non-`None` reply claims the command and suppresses the registry lookup.
/// Plugins run inside the synchronous dispatch loop and keep their state
/// behind interior mutability; a fault is an `Err` return, which the
/// dispatcher logs without disturbing the other plugins.
pub trait Plugin: Send + Sync {
    /// Unique identifier for the plugin
    fn name(&self) -> &str;

    /// Commands this plugin answers via the `command` event, as
    /// `(name, help text)` pairs. They are pre-registered as doc-only
    /// placeholders so `help` can describe them.
    fn commands(&self) -> Vec<(&str, &str)> {
        Vec::new()
    }

    /// React to a protocol event.
    fn handle(&self, bot: &dyn Bot, event: &Event) -> Result<Option<Reply>, BotError>;
}

/// A plugin's answer to a `command` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Lines(Vec<String>),
}

impl Reply {
    /// Appends this reply's lines to an aggregate.
    pub fn append_to(self, lines: &mut Vec<String>) {
        match self {
            Reply::Text(line) => lines.push(line),
            Reply::Lines(more) => lines.extend(more),
        }
    }
}

impl From<String> for Reply {
    fn from(line: String) -> Self {
        Reply::Text(line)
    }
}

impl From<&str> for Reply {
    fn from(line: &str) -> Self {
        Reply::Text(line.to_string())
    }
}
