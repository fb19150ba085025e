//! Protocol events delivered to plugins.
//!
//! The wire-level chat protocol lives in an external client library; by the
//! time an event reaches this crate it is already parsed into one of these
//! variants. Every variant carries the fixed field set of its event.

/// How a chat line was uttered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Say,
    Action,
    Notice,
}

/// A protocol event, as delivered to every registered plugin.
///
/// `channel` is `None` on message-like events received in private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Delivered once to each plugin right after registration.
    Init,
    /// Delivered roughly once per second.
    Tick,
    Connect {
        host: String,
    },
    Message {
        channel: Option<String>,
        user: String,
        text: String,
        kind: MessageKind,
    },
    Join {
        channel: String,
        user: String,
    },
    Part {
        channel: String,
        user: String,
    },
    Kick {
        channel: String,
        kicker: String,
        kickee: String,
        reason: String,
    },
    Nick {
        old: String,
        new: String,
    },
    Mode {
        channel: String,
        user: String,
        set: bool,
        modes: String,
        args: Vec<String>,
    },
    Topic {
        channel: String,
        user: String,
        topic: String,
    },
    Quit {
        user: String,
        message: String,
    },
    /// A chat line recognized as a command invocation. `args` is `None`
    /// when no text followed the command token.
    Command {
        channel: Option<String>,
        user: String,
        cmd: String,
        args: Option<String>,
    },
}

impl Event {
    /// The wire-level name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Init => "init",
            Event::Tick => "tick",
            Event::Connect { .. } => "connect",
            Event::Message { kind, .. } => match kind {
                MessageKind::Say => "message",
                MessageKind::Action => "action",
                MessageKind::Notice => "notice",
            },
            Event::Join { .. } => "join",
            Event::Part { .. } => "part",
            Event::Kick { .. } => "kick",
            Event::Nick { .. } => "nick",
            Event::Mode { .. } => "mode",
            Event::Topic { .. } => "topic",
            Event::Quit { .. } => "quit",
            Event::Command { .. } => "command",
        }
    }

    pub fn is_command(&self) -> bool {
        matches!(self, Event::Command { .. })
    }
}
